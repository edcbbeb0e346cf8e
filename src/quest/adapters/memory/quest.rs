//! In-memory repository for quest lifecycle tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::identity::domain::EmailAddress;
use crate::live::{ChangeFeed, EventStream};
use crate::quest::{
    domain::{Quest, QuestId, QuestStatus},
    ports::{QuestEvent, QuestRepository, QuestRepositoryError, QuestRepositoryResult},
};

/// Thread-safe in-memory quest repository.
///
/// Conditional writes compare-and-swap on the document revision under one
/// lock, which makes this adapter the reference semantics for the store's
/// atomic update contract.
#[derive(Debug, Clone, Default)]
pub struct InMemoryQuestRepository {
    state: Arc<RwLock<HashMap<QuestId, Quest>>>,
    feed: ChangeFeed<QuestEvent>,
}

impl InMemoryQuestRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl std::fmt::Display) -> QuestRepositoryError {
    QuestRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

fn sorted_newest_first(mut quests: Vec<Quest>) -> Vec<Quest> {
    quests.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    quests
}

#[async_trait]
impl QuestRepository for InMemoryQuestRepository {
    async fn insert(&self, quest: &Quest) -> QuestRepositoryResult<()> {
        {
            let mut state = self.state.write().map_err(lock_error)?;
            if state.contains_key(&quest.id()) {
                return Err(QuestRepositoryError::DuplicateQuest(quest.id()));
            }
            state.insert(quest.id(), quest.clone());
        }
        self.feed.publish(QuestEvent::Created {
            quest_id: quest.id(),
        });
        Ok(())
    }

    async fn find_by_id(&self, id: QuestId) -> QuestRepositoryResult<Option<Quest>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.get(&id).cloned())
    }

    async fn update(&self, quest: &Quest) -> QuestRepositoryResult<Quest> {
        let stored = {
            let mut state = self.state.write().map_err(lock_error)?;
            let current = state
                .get(&quest.id())
                .ok_or(QuestRepositoryError::NotFound(quest.id()))?;
            if current.revision() != quest.revision() {
                return Err(QuestRepositoryError::VersionConflict {
                    quest_id: quest.id(),
                    expected: quest.revision(),
                });
            }

            let committed = quest.clone().with_revision(quest.revision() + 1);
            state.insert(quest.id(), committed.clone());
            committed
        };

        self.feed.publish(QuestEvent::Updated {
            quest_id: stored.id(),
        });
        Ok(stored)
    }

    async fn delete(&self, id: QuestId) -> QuestRepositoryResult<()> {
        {
            let mut state = self.state.write().map_err(lock_error)?;
            if state.remove(&id).is_none() {
                return Err(QuestRepositoryError::NotFound(id));
            }
        }
        self.feed.publish(QuestEvent::Removed { quest_id: id });
        Ok(())
    }

    async fn list_open(&self) -> QuestRepositoryResult<Vec<Quest>> {
        let state = self.state.read().map_err(lock_error)?;
        let open = state
            .values()
            .filter(|quest| quest.status() == QuestStatus::Open)
            .cloned()
            .collect();
        Ok(sorted_newest_first(open))
    }

    async fn list_by_creator(
        &self,
        creator: &EmailAddress,
    ) -> QuestRepositoryResult<Vec<Quest>> {
        let state = self.state.read().map_err(lock_error)?;
        let posted = state
            .values()
            .filter(|quest| quest.creator() == creator)
            .cloned()
            .collect();
        Ok(sorted_newest_first(posted))
    }

    async fn list_by_assignee(
        &self,
        assignee: &EmailAddress,
    ) -> QuestRepositoryResult<Vec<Quest>> {
        let state = self.state.read().map_err(lock_error)?;
        let undertaken = state
            .values()
            .filter(|quest| quest.assigned_to() == Some(assignee))
            .cloned()
            .collect();
        Ok(sorted_newest_first(undertaken))
    }

    fn watch(&self) -> EventStream<QuestEvent> {
        self.feed.subscribe()
    }
}
