//! Application services for quest lifecycle orchestration.

mod lifecycle;

pub use lifecycle::{
    AssignQuestRequest, CreateQuestRequest, OpenQuestView, QuestHistory, QuestLifecycleError,
    QuestLifecycleResult, QuestLifecycleService, UpdateQuestRequest,
};
