//! Shared fixtures for the in-memory integration suites.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use mockable::DefaultClock;

use campus_quest::identity::domain::EmailAddress;
use campus_quest::notification::{
    adapters::memory::InMemoryNotificationRepository, services::NotificationDispatcher,
};
use campus_quest::profile::{
    adapters::memory::InMemoryProfileRepository, services::ProfileService,
};
use campus_quest::quest::{
    adapters::memory::InMemoryQuestRepository,
    domain::Quest,
    services::{CreateQuestRequest, QuestLifecycleService},
};

pub type Lifecycle = QuestLifecycleService<
    InMemoryQuestRepository,
    InMemoryNotificationRepository,
    InMemoryProfileRepository,
    DefaultClock,
>;

pub type Dispatcher = NotificationDispatcher<
    InMemoryNotificationRepository,
    InMemoryProfileRepository,
    DefaultClock,
>;

pub type Profiles = ProfileService<InMemoryProfileRepository, DefaultClock>;

/// One wired-up marketplace over fresh in-memory stores.
pub struct World {
    pub quests: Arc<InMemoryQuestRepository>,
    pub lifecycle: Lifecycle,
    pub dispatcher: Dispatcher,
    pub profiles: Profiles,
}

pub fn world() -> World {
    let quests = Arc::new(InMemoryQuestRepository::new());
    let notifications = Arc::new(InMemoryNotificationRepository::new());
    let profile_store = Arc::new(InMemoryProfileRepository::new());
    let clock = Arc::new(DefaultClock);

    let dispatcher = NotificationDispatcher::new(
        notifications,
        Arc::clone(&profile_store),
        Arc::clone(&clock),
    );
    let lifecycle = QuestLifecycleService::new(
        Arc::clone(&quests),
        Arc::clone(&profile_store),
        dispatcher.clone(),
        Arc::clone(&clock),
    );
    let profiles = ProfileService::new(profile_store, clock);

    World {
        quests,
        lifecycle,
        dispatcher,
        profiles,
    }
}

pub fn email(address: &str) -> EmailAddress {
    EmailAddress::new(address).expect("valid test email")
}

pub fn tomorrow() -> DateTime<Utc> {
    Utc::now() + Duration::days(1)
}

/// Posts a quest with sensible defaults through the lifecycle service.
pub async fn post_quest(world: &World, creator: &EmailAddress, title: &str) -> Quest {
    world
        .lifecycle
        .create(CreateQuestRequest::new(
            creator.clone(),
            title,
            "Pick up the parcel from the post room and drop it at my hostel",
            "Post Room",
            50,
            tomorrow(),
        ))
        .await
        .expect("quest creation should succeed")
}
