//! Repository port for quest persistence, conditional writes, and queries.

use crate::identity::domain::EmailAddress;
use crate::live::EventStream;
use crate::quest::domain::{Quest, QuestId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for quest repository operations.
pub type QuestRepositoryResult<T> = Result<T, QuestRepositoryError>;

/// Quest collection change pushed by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestEvent {
    /// A quest was created.
    Created {
        /// Affected quest.
        quest_id: QuestId,
    },
    /// A quest changed (applicants, status, descriptive fields).
    Updated {
        /// Affected quest.
        quest_id: QuestId,
    },
    /// A quest was removed.
    Removed {
        /// Affected quest.
        quest_id: QuestId,
    },
}

/// Quest persistence contract.
///
/// `update` is a conditional write: it commits only when the stored
/// revision still equals the revision the caller read, so two racing
/// writers cannot silently overwrite each other. Services retry on
/// [`QuestRepositoryError::VersionConflict`].
#[async_trait]
pub trait QuestRepository: Send + Sync {
    /// Stores a new quest.
    ///
    /// # Errors
    ///
    /// Returns [`QuestRepositoryError::DuplicateQuest`] when the identifier
    /// already exists.
    async fn insert(&self, quest: &Quest) -> QuestRepositoryResult<()>;

    /// Finds a quest by identifier.
    ///
    /// Returns `None` when the quest does not exist.
    async fn find_by_id(&self, id: QuestId) -> QuestRepositoryResult<Option<Quest>>;

    /// Commits a mutated aggregate if its read revision is still current,
    /// returning the stored aggregate at its new revision.
    ///
    /// # Errors
    ///
    /// Returns [`QuestRepositoryError::VersionConflict`] when another
    /// writer committed first and [`QuestRepositoryError::NotFound`] when
    /// the quest no longer exists.
    async fn update(&self, quest: &Quest) -> QuestRepositoryResult<Quest>;

    /// Removes a quest.
    ///
    /// # Errors
    ///
    /// Returns [`QuestRepositoryError::NotFound`] when the quest does not
    /// exist.
    async fn delete(&self, id: QuestId) -> QuestRepositoryResult<()>;

    /// Returns all open quests, newest first.
    async fn list_open(&self) -> QuestRepositoryResult<Vec<Quest>>;

    /// Returns all quests posted by the creator, newest first, any status.
    async fn list_by_creator(
        &self,
        creator: &EmailAddress,
    ) -> QuestRepositoryResult<Vec<Quest>>;

    /// Returns all quests assigned to the principal, newest first, any
    /// status.
    async fn list_by_assignee(
        &self,
        assignee: &EmailAddress,
    ) -> QuestRepositoryResult<Vec<Quest>>;

    /// Opens a stream of quest collection change events.
    fn watch(&self) -> EventStream<QuestEvent>;
}

/// Errors returned by quest repository implementations.
#[derive(Debug, Clone, Error)]
pub enum QuestRepositoryError {
    /// A quest with the same identifier already exists.
    #[error("duplicate quest identifier: {0}")]
    DuplicateQuest(QuestId),

    /// The quest was not found.
    #[error("quest not found: {0}")]
    NotFound(QuestId),

    /// The conditional write lost to a concurrent writer.
    #[error("revision {expected} of quest {quest_id} is no longer current")]
    VersionConflict {
        /// Quest being written.
        quest_id: QuestId,
        /// Revision the caller read.
        expected: u64,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl QuestRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
