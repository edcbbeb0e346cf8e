//! Error types for quest domain validation and state transitions.

use super::{QuestId, QuestStatus};
use crate::identity::domain::EmailAddress;
use thiserror::Error;

/// Errors returned while validating quest field values.
///
/// Validation runs before any write; a rejected value never reaches the
/// store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QuestValidationError {
    /// The title is empty or longer than 100 characters.
    #[error("title must be 1-100 characters, got {0}")]
    TitleLength(usize),

    /// The description is empty or longer than 500 characters.
    #[error("description must be 1-500 characters, got {0}")]
    DescriptionLength(usize),

    /// The venue is empty after trimming.
    #[error("venue must not be empty")]
    EmptyVenue,

    /// The reward is outside the accepted range.
    #[error("reward must be between 1 and 10000, got {0}")]
    RewardOutOfRange(u32),

    /// The deadline is not strictly in the future.
    #[error("deadline must be later than the current time")]
    DeadlineNotInFuture,
}

/// Errors returned when a lifecycle transition's preconditions no longer
/// hold.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QuestTransitionError {
    /// The quest is no longer open for applications.
    #[error("quest {quest_id} is not accepting applications ({status})")]
    NotAcceptingApplications {
        /// Quest the application targeted.
        quest_id: QuestId,
        /// Status that blocked the application.
        status: QuestStatus,
    },

    /// The creator tried to apply to their own quest.
    #[error("the creator cannot apply to their own quest {0}")]
    SelfApplication(QuestId),

    /// The applicant has already applied.
    #[error("{applicant} has already applied to quest {quest_id}")]
    DuplicateApplication {
        /// Quest the application targeted.
        quest_id: QuestId,
        /// Principal who applied twice.
        applicant: EmailAddress,
    },

    /// The quest has already been assigned.
    #[error("quest {0} has already been assigned")]
    AlreadyAssigned(QuestId),

    /// The chosen principal never applied to the quest.
    #[error("{applicant} has not applied to quest {quest_id}")]
    NotAnApplicant {
        /// Quest being assigned.
        quest_id: QuestId,
        /// Principal who was not among the applicants.
        applicant: EmailAddress,
    },

    /// Completion was requested before the quest was assigned.
    #[error("quest {0} has no assignee yet, nothing to complete")]
    NotAssigned(QuestId),

    /// The quest has already reached its terminal state.
    #[error("quest {0} is already completed")]
    AlreadyCompleted(QuestId),
}

/// Error returned while parsing quest statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown quest status: {0}")]
pub struct ParseQuestStatusError(pub String);
