//! Shared fixtures for quest tests.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use mockable::DefaultClock;

use crate::identity::domain::EmailAddress;
use crate::notification::{
    adapters::memory::InMemoryNotificationRepository, services::NotificationDispatcher,
};
use crate::profile::adapters::memory::InMemoryProfileRepository;
use crate::quest::{
    adapters::memory::InMemoryQuestRepository,
    domain::{Quest, QuestDescription, QuestDraft, QuestTitle, Reward, Venue},
    services::{CreateQuestRequest, QuestLifecycleService},
};

pub type TestService = QuestLifecycleService<
    InMemoryQuestRepository,
    InMemoryNotificationRepository,
    InMemoryProfileRepository,
    DefaultClock,
>;

pub struct Harness {
    pub quests: Arc<InMemoryQuestRepository>,
    pub lifecycle: TestService,
}

pub fn harness() -> Harness {
    let quests = Arc::new(InMemoryQuestRepository::new());
    let notifications = Arc::new(InMemoryNotificationRepository::new());
    let profiles = Arc::new(InMemoryProfileRepository::new());
    let clock = Arc::new(DefaultClock);
    let dispatcher = NotificationDispatcher::new(
        notifications,
        Arc::clone(&profiles),
        Arc::clone(&clock),
    );
    let lifecycle = QuestLifecycleService::new(Arc::clone(&quests), profiles, dispatcher, clock);
    Harness { quests, lifecycle }
}

pub fn email(address: &str) -> EmailAddress {
    EmailAddress::new(address).expect("valid test email")
}

pub fn tomorrow() -> DateTime<Utc> {
    Utc::now() + Duration::days(1)
}

pub fn yesterday() -> DateTime<Utc> {
    Utc::now() - Duration::days(1)
}

pub fn create_request(creator: &EmailAddress, title: &str) -> CreateQuestRequest {
    CreateQuestRequest::new(
        creator.clone(),
        title,
        "Collect the printout from the library desk",
        "Central Library",
        50,
        tomorrow(),
    )
}

/// Builds an open quest aggregate directly, bypassing the service.
pub fn open_quest(creator: &EmailAddress, title: &str) -> Quest {
    Quest::post(
        QuestDraft {
            creator: creator.clone(),
            title: QuestTitle::new(title).expect("valid title"),
            description: QuestDescription::new("Drop off a parcel at the hostel gate")
                .expect("valid description"),
            venue: Venue::new("Hostel Gate 2").expect("valid venue"),
            reward: Reward::new(40).expect("valid reward"),
            deadline: tomorrow(),
        },
        &DefaultClock,
    )
}
