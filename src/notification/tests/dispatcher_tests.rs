//! Unit tests for the notification dispatcher.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::DefaultClock;
use mockall::mock;
use rstest::{fixture, rstest};

use crate::identity::domain::EmailAddress;
use crate::live::EventStream;
use crate::notification::{
    adapters::memory::InMemoryNotificationRepository,
    domain::{Notification, NotificationId, NotificationKind},
    ports::{
        NotificationEvent, NotificationRepository, NotificationRepositoryError,
        NotificationRepositoryResult,
    },
    services::{DispatchError, NotificationDispatcher},
};
use crate::profile::{
    adapters::memory::InMemoryProfileRepository,
    domain::{ProfileDomainError, RatingRole},
    services::ProfileService,
};
use crate::quest::{
    adapters::memory::InMemoryQuestRepository,
    services::{CreateQuestRequest, QuestLifecycleService},
};
use chrono::{Duration, Utc};

mock! {
    pub UnreliableNotifications {}

    #[async_trait]
    impl NotificationRepository for UnreliableNotifications {
        async fn insert(&self, notification: &Notification) -> NotificationRepositoryResult<()>;
        async fn find_by_id(
            &self,
            id: NotificationId,
        ) -> NotificationRepositoryResult<Option<Notification>>;
        async fn mark_read(&self, id: NotificationId) -> NotificationRepositoryResult<()>;
        async fn delete(&self, id: NotificationId) -> NotificationRepositoryResult<()>;
        async fn list_for(
            &self,
            recipient: &EmailAddress,
        ) -> NotificationRepositoryResult<Vec<Notification>>;
        async fn ids_for(
            &self,
            recipient: &EmailAddress,
        ) -> NotificationRepositoryResult<Vec<NotificationId>>;
        async fn delete_many(
            &self,
            ids: &[NotificationId],
        ) -> NotificationRepositoryResult<usize>;
        fn watch(&self) -> EventStream<NotificationEvent>;
    }
}

fn email(address: &str) -> EmailAddress {
    EmailAddress::new(address).expect("valid test email")
}

fn store_down() -> NotificationRepositoryError {
    NotificationRepositoryError::persistence(std::io::Error::other("store down"))
}

type MemoryDispatcher =
    NotificationDispatcher<InMemoryNotificationRepository, InMemoryProfileRepository, DefaultClock>;

struct Ctx {
    profiles: Arc<InMemoryProfileRepository>,
    dispatcher: MemoryDispatcher,
}

#[fixture]
fn ctx() -> Ctx {
    let notifications = Arc::new(InMemoryNotificationRepository::new());
    let profiles = Arc::new(InMemoryProfileRepository::new());
    let dispatcher = NotificationDispatcher::new(
        notifications,
        Arc::clone(&profiles),
        Arc::new(DefaultClock),
    );
    Ctx {
        profiles,
        dispatcher,
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn send_swallows_store_failures(ctx: Ctx) {
    let mut failing = MockUnreliableNotifications::new();
    failing.expect_insert().returning(|_| Err(store_down()));
    let dispatcher = NotificationDispatcher::new(
        Arc::new(failing),
        Arc::clone(&ctx.profiles),
        Arc::new(DefaultClock),
    );

    let delivered = dispatcher
        .send(
            &email("poster@iitj.ac.in"),
            "You have an applicant",
            NotificationKind::General,
        )
        .await;

    assert!(delivered.is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn a_dead_notification_store_never_fails_the_lifecycle(ctx: Ctx) {
    let mut failing = MockUnreliableNotifications::new();
    failing.expect_insert().returning(|_| Err(store_down()));

    let quests = Arc::new(InMemoryQuestRepository::new());
    let clock = Arc::new(DefaultClock);
    let dispatcher = NotificationDispatcher::new(
        Arc::new(failing),
        Arc::clone(&ctx.profiles),
        Arc::clone(&clock),
    );
    let lifecycle = QuestLifecycleService::new(
        Arc::clone(&quests),
        Arc::clone(&ctx.profiles),
        dispatcher,
        clock,
    );

    let creator = email("poster@iitj.ac.in");
    let quest = lifecycle
        .create(CreateQuestRequest::new(
            creator,
            "Library pickup",
            "Grab the reserved book",
            "Central Library",
            30,
            Utc::now() + Duration::days(1),
        ))
        .await
        .expect("create succeeds");

    let applied = lifecycle
        .apply(quest.id(), &email("runner@iitj.ac.in"))
        .await
        .expect("apply succeeds despite the dead notification store");
    assert_eq!(applied.applicants().len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn mark_read_is_idempotent(ctx: Ctx) {
    let recipient = email("poster@iitj.ac.in");
    let id = ctx
        .dispatcher
        .send(&recipient, "First applicant", NotificationKind::General)
        .await
        .expect("delivery succeeds");

    ctx.dispatcher.mark_read(id).await.expect("first mark");
    ctx.dispatcher.mark_read(id).await.expect("second mark");

    let inbox = ctx.dispatcher.inbox_for(&recipient).await.expect("inbox");
    assert!(inbox.iter().all(Notification::is_read));

    // Marking a vanished notification is equally silent.
    ctx.dispatcher.delete(id).await.expect("delete");
    ctx.dispatcher.mark_read(id).await.expect("mark after delete");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_is_idempotent(ctx: Ctx) {
    let recipient = email("poster@iitj.ac.in");
    let id = ctx
        .dispatcher
        .send(&recipient, "First applicant", NotificationKind::General)
        .await
        .expect("delivery succeeds");

    ctx.dispatcher.delete(id).await.expect("first delete");
    ctx.dispatcher.delete(id).await.expect("second delete");

    let inbox = ctx.dispatcher.inbox_for(&recipient).await.expect("inbox");
    assert!(inbox.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn clear_all_reports_the_removed_count(ctx: Ctx) {
    let recipient = email("poster@iitj.ac.in");
    let bystander = email("bystander@iitj.ac.in");
    for _ in 0..3 {
        ctx.dispatcher
            .send(&recipient, "ping", NotificationKind::General)
            .await
            .expect("delivery succeeds");
    }
    ctx.dispatcher
        .send(&bystander, "ping", NotificationKind::General)
        .await
        .expect("delivery succeeds");

    let removed = ctx
        .dispatcher
        .clear_all(&recipient)
        .await
        .expect("clear succeeds");

    assert_eq!(removed, 3);
    assert!(ctx
        .dispatcher
        .inbox_for(&recipient)
        .await
        .expect("inbox")
        .is_empty());
    assert_eq!(
        ctx.dispatcher
            .inbox_for(&bystander)
            .await
            .expect("inbox")
            .len(),
        1
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn record_rating_validates_the_scale(ctx: Ctx) {
    let profiles = ProfileService::new(Arc::clone(&ctx.profiles), Arc::new(DefaultClock));
    let rated = profiles
        .register(email("runner@iitj.ac.in"), "runner")
        .await
        .expect("registration succeeds");

    for bad in [0, 6] {
        let result = ctx
            .dispatcher
            .record_rating(rated.email(), RatingRole::Voyager, bad)
            .await;
        assert!(matches!(
            result,
            Err(DispatchError::InvalidRating(
                ProfileDomainError::RatingOutOfRange(_)
            ))
        ));
    }

    ctx.dispatcher
        .record_rating(rated.email(), RatingRole::Voyager, 4)
        .await
        .expect("valid rating records");
}
