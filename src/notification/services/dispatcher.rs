//! Notification dispatcher: best-effort delivery, inbox bookkeeping, and
//! rating capture.

use crate::fault::ErrorCategory;
use crate::identity::domain::EmailAddress;
use crate::live::Subscription;
use crate::notification::{
    domain::{Notification, NotificationId, NotificationKind},
    ports::{NotificationRepository, NotificationRepositoryError, MAX_MUTATION_BATCH},
};
use crate::profile::{
    domain::{ProfileDomainError, RatingRole, RatingValue},
    ports::{ProfileRepository, ProfileRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Service-level errors for notification operations.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Rating validation failed.
    #[error(transparent)]
    InvalidRating(#[from] ProfileDomainError),
    /// Notification store operation failed.
    #[error(transparent)]
    Notifications(#[from] NotificationRepositoryError),
    /// Profile store operation failed.
    #[error(transparent)]
    Profiles(#[from] ProfileRepositoryError),
}

impl DispatchError {
    /// Returns the caller-facing category of this failure.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidRating(_) => ErrorCategory::InvalidInput,
            Self::Notifications(err) => match err {
                NotificationRepositoryError::DuplicateNotification(_) => ErrorCategory::Conflict,
                NotificationRepositoryError::BatchTooLarge { .. } => ErrorCategory::InvalidInput,
                NotificationRepositoryError::Persistence(_) => ErrorCategory::Unavailable,
            },
            Self::Profiles(err) => match err {
                ProfileRepositoryError::DuplicateProfile(_) => ErrorCategory::Conflict,
                ProfileRepositoryError::NotFound(_) => ErrorCategory::NotFound,
                ProfileRepositoryError::Persistence(_) => ErrorCategory::Unavailable,
            },
        }
    }
}

/// Result type for notification service operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Notification dispatcher service.
///
/// Invoked by the quest lifecycle as a side effect of state transitions and
/// by UI wiring for inbox bookkeeping. Delivery is advisory: [`send`]
/// swallows store failures so a failed notification can never roll back or
/// fail the transition that produced it.
///
/// [`send`]: NotificationDispatcher::send
pub struct NotificationDispatcher<N, P, C>
where
    N: NotificationRepository,
    P: ProfileRepository,
    C: Clock + Send + Sync,
{
    notifications: Arc<N>,
    profiles: Arc<P>,
    clock: Arc<C>,
}

impl<N, P, C> Clone for NotificationDispatcher<N, P, C>
where
    N: NotificationRepository,
    P: ProfileRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            notifications: Arc::clone(&self.notifications),
            profiles: Arc::clone(&self.profiles),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<N, P, C> NotificationDispatcher<N, P, C>
where
    N: NotificationRepository + 'static,
    P: ProfileRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new dispatcher.
    #[must_use]
    pub const fn new(notifications: Arc<N>, profiles: Arc<P>, clock: Arc<C>) -> Self {
        Self {
            notifications,
            profiles,
            clock,
        }
    }

    /// Delivers a notification, best-effort.
    ///
    /// Returns the stored identifier, or `None` when delivery failed; the
    /// failure is logged and deliberately not surfaced, so enclosing
    /// lifecycle operations cannot be failed by a lost notification.
    pub async fn send(
        &self,
        recipient: &EmailAddress,
        message: impl Into<String>,
        kind: NotificationKind,
    ) -> Option<NotificationId> {
        let notification =
            Notification::new(recipient.clone(), message, kind, &*self.clock);
        let id = notification.id();
        match self.notifications.insert(&notification).await {
            Ok(()) => Some(id),
            Err(err) => {
                warn!(
                    recipient = %recipient,
                    kind = notification.kind().as_str(),
                    error = %err,
                    "notification delivery failed, dropping"
                );
                None
            }
        }
    }

    /// Marks a notification read. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Notifications`] on store failure; a missing
    /// notification is not an error.
    pub async fn mark_read(&self, id: NotificationId) -> DispatchResult<()> {
        Ok(self.notifications.mark_read(id).await?)
    }

    /// Deletes a notification. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Notifications`] on store failure; a missing
    /// notification is not an error.
    pub async fn delete(&self, id: NotificationId) -> DispatchResult<()> {
        Ok(self.notifications.delete(id).await?)
    }

    /// Returns the recipient's inbox, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Notifications`] on store failure.
    pub async fn inbox_for(
        &self,
        recipient: &EmailAddress,
    ) -> DispatchResult<Vec<Notification>> {
        Ok(self.notifications.list_for(recipient).await?)
    }

    /// Deletes every notification owned by the recipient and returns the
    /// number removed.
    ///
    /// Deletion is chunked at the store's batch limit and committed chunk
    /// by chunk, so a mid-operation failure keeps the chunks already
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Notifications`] on store failure; chunks
    /// deleted before the failure stay deleted.
    pub async fn clear_all(&self, recipient: &EmailAddress) -> DispatchResult<usize> {
        let ids = self.notifications.ids_for(recipient).await?;
        let mut removed = 0;
        for chunk in ids.chunks(MAX_MUTATION_BATCH) {
            removed += self.notifications.delete_many(chunk).await?;
        }
        Ok(removed)
    }

    /// Appends a rating to the target user's sequence for the given role.
    ///
    /// This does not consume the prompting notification; callers mark it
    /// read separately and are responsible for not re-showing the prompt,
    /// since a second submission would append a second rating.
    ///
    /// # Errors
    ///
    /// Fails with [`DispatchError::InvalidRating`] when the value is
    /// outside the 1-5 scale and with [`DispatchError::Profiles`] when the
    /// target has no profile or the store is unavailable.
    pub async fn record_rating(
        &self,
        target: &EmailAddress,
        role: RatingRole,
        value: u8,
    ) -> DispatchResult<()> {
        let rating = RatingValue::new(value)?;
        self.profiles.append_rating(target, role, rating).await?;
        Ok(())
    }

    /// Opens a live view over the recipient's inbox.
    ///
    /// The callback receives the full inbox snapshot immediately and again
    /// after every change to it, newest first. Must be called within a
    /// tokio runtime. Delivery stops when the returned handle is
    /// cancelled.
    pub fn watch_inbox<F>(&self, recipient: EmailAddress, mut callback: F) -> Subscription
    where
        F: FnMut(Vec<Notification>) + Send + 'static,
    {
        let notifications = Arc::clone(&self.notifications);
        let mut events = self.notifications.watch();
        Subscription::spawn(async move {
            loop {
                match notifications.list_for(&recipient).await {
                    Ok(inbox) => callback(inbox),
                    Err(err) => {
                        warn!(recipient = %recipient, error = %err, "inbox refresh failed");
                    }
                }

                loop {
                    match events.next().await {
                        None => return,
                        Some(event) if event.recipient() == &recipient => break,
                        Some(_) => {}
                    }
                }
            }
        })
    }
}
