//! In-memory repository for notification tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::identity::domain::EmailAddress;
use crate::live::{ChangeFeed, EventStream};
use crate::notification::{
    domain::{Notification, NotificationId},
    ports::{
        NotificationEvent, NotificationRepository, NotificationRepositoryError,
        NotificationRepositoryResult, MAX_MUTATION_BATCH,
    },
};

/// Thread-safe in-memory notification repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationRepository {
    state: Arc<RwLock<HashMap<NotificationId, Notification>>>,
    feed: ChangeFeed<NotificationEvent>,
}

impl InMemoryNotificationRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl std::fmt::Display) -> NotificationRepositoryError {
    NotificationRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn insert(&self, notification: &Notification) -> NotificationRepositoryResult<()> {
        {
            let mut state = self.state.write().map_err(lock_error)?;
            if state.contains_key(&notification.id()) {
                return Err(NotificationRepositoryError::DuplicateNotification(
                    notification.id(),
                ));
            }
            state.insert(notification.id(), notification.clone());
        }
        self.feed.publish(NotificationEvent::Delivered {
            recipient: notification.recipient().clone(),
        });
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: NotificationId,
    ) -> NotificationRepositoryResult<Option<Notification>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.get(&id).cloned())
    }

    async fn mark_read(&self, id: NotificationId) -> NotificationRepositoryResult<()> {
        let recipient = {
            let mut state = self.state.write().map_err(lock_error)?;
            match state.get_mut(&id) {
                Some(notification) => {
                    notification.mark_read();
                    Some(notification.recipient().clone())
                }
                None => None,
            }
        };
        if let Some(recipient) = recipient {
            self.feed.publish(NotificationEvent::Updated { recipient });
        }
        Ok(())
    }

    async fn delete(&self, id: NotificationId) -> NotificationRepositoryResult<()> {
        let removed = {
            let mut state = self.state.write().map_err(lock_error)?;
            state.remove(&id)
        };
        if let Some(notification) = removed {
            self.feed.publish(NotificationEvent::Removed {
                recipient: notification.recipient().clone(),
            });
        }
        Ok(())
    }

    async fn list_for(
        &self,
        recipient: &EmailAddress,
    ) -> NotificationRepositoryResult<Vec<Notification>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut inbox: Vec<Notification> = state
            .values()
            .filter(|notification| notification.recipient() == recipient)
            .cloned()
            .collect();
        inbox.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(inbox)
    }

    async fn ids_for(
        &self,
        recipient: &EmailAddress,
    ) -> NotificationRepositoryResult<Vec<NotificationId>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .values()
            .filter(|notification| notification.recipient() == recipient)
            .map(Notification::id)
            .collect())
    }

    async fn delete_many(
        &self,
        ids: &[NotificationId],
    ) -> NotificationRepositoryResult<usize> {
        if ids.len() > MAX_MUTATION_BATCH {
            return Err(NotificationRepositoryError::BatchTooLarge {
                requested: ids.len(),
            });
        }

        let mut touched: HashSet<EmailAddress> = HashSet::new();
        let removed = {
            let mut state = self.state.write().map_err(lock_error)?;
            let mut removed = 0;
            for id in ids {
                if let Some(notification) = state.remove(id) {
                    touched.insert(notification.recipient().clone());
                    removed += 1;
                }
            }
            removed
        };

        for recipient in touched {
            self.feed.publish(NotificationEvent::Removed { recipient });
        }
        Ok(removed)
    }

    fn watch(&self) -> EventStream<NotificationEvent> {
        self.feed.subscribe()
    }
}
