//! Repository port for notification persistence and inbox queries.

use crate::identity::domain::EmailAddress;
use crate::live::EventStream;
use crate::notification::domain::{Notification, NotificationId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Largest number of documents one bulk mutation may touch.
///
/// The external store commits batched writes of at most this many
/// documents; callers chunk larger operations and commit chunk by chunk so
/// partial progress survives a mid-operation failure.
pub const MAX_MUTATION_BATCH: usize = 500;

/// Result type for notification repository operations.
pub type NotificationRepositoryResult<T> = Result<T, NotificationRepositoryError>;

/// Inbox change pushed by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    /// A notification was delivered to the recipient.
    Delivered {
        /// Inbox owner.
        recipient: EmailAddress,
    },
    /// A notification in the recipient's inbox changed (read flag).
    Updated {
        /// Inbox owner.
        recipient: EmailAddress,
    },
    /// One or more notifications left the recipient's inbox.
    Removed {
        /// Inbox owner.
        recipient: EmailAddress,
    },
}

impl NotificationEvent {
    /// Returns the inbox owner the event concerns.
    #[must_use]
    pub const fn recipient(&self) -> &EmailAddress {
        match self {
            Self::Delivered { recipient }
            | Self::Updated { recipient }
            | Self::Removed { recipient } => recipient,
        }
    }
}

/// Notification persistence contract.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Stores a new notification.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationRepositoryError::DuplicateNotification`] when
    /// the identifier already exists.
    async fn insert(&self, notification: &Notification) -> NotificationRepositoryResult<()>;

    /// Finds a notification by identifier.
    ///
    /// Returns `None` when it does not exist.
    async fn find_by_id(
        &self,
        id: NotificationId,
    ) -> NotificationRepositoryResult<Option<Notification>>;

    /// Marks a notification read. Idempotent: marking a missing or
    /// already-read notification succeeds without effect.
    async fn mark_read(&self, id: NotificationId) -> NotificationRepositoryResult<()>;

    /// Deletes a notification. Idempotent: deleting a missing notification
    /// succeeds without effect.
    async fn delete(&self, id: NotificationId) -> NotificationRepositoryResult<()>;

    /// Returns the recipient's notifications, newest first.
    async fn list_for(
        &self,
        recipient: &EmailAddress,
    ) -> NotificationRepositoryResult<Vec<Notification>>;

    /// Returns the identifiers of the recipient's notifications.
    async fn ids_for(
        &self,
        recipient: &EmailAddress,
    ) -> NotificationRepositoryResult<Vec<NotificationId>>;

    /// Deletes the given notifications in one committed batch and returns
    /// how many existed.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationRepositoryError::BatchTooLarge`] when more
    /// than [`MAX_MUTATION_BATCH`] identifiers are passed.
    async fn delete_many(
        &self,
        ids: &[NotificationId],
    ) -> NotificationRepositoryResult<usize>;

    /// Opens a stream of inbox change events.
    fn watch(&self) -> EventStream<NotificationEvent>;
}

/// Errors returned by notification repository implementations.
#[derive(Debug, Clone, Error)]
pub enum NotificationRepositoryError {
    /// A notification with the same identifier already exists.
    #[error("duplicate notification identifier: {0}")]
    DuplicateNotification(NotificationId),

    /// A bulk mutation exceeded the store's batch limit.
    #[error("batch of {requested} exceeds the store limit of {MAX_MUTATION_BATCH}")]
    BatchTooLarge {
        /// Number of documents the caller asked to mutate at once.
        requested: usize,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl NotificationRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
