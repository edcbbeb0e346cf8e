//! `PostgreSQL` repository implementation for quest lifecycle storage.

use super::{
    models::{NewQuestRow, QuestChangeset, QuestRow},
    schema::quests,
};
use crate::identity::domain::EmailAddress;
use crate::live::{ChangeFeed, EventStream};
use crate::quest::{
    domain::{
        PersistedQuestData, Quest, QuestDescription, QuestId, QuestStatus, QuestTitle, Reward,
        Venue,
    },
    ports::{QuestEvent, QuestRepository, QuestRepositoryError, QuestRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by quest adapters.
pub type QuestPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed quest repository.
///
/// The conditional write is one guarded `UPDATE` keyed on `(id, revision)`;
/// zero affected rows distinguishes a vanished quest from a lost race by a
/// follow-up existence check. Change events cover mutations performed
/// through this repository instance.
#[derive(Debug, Clone)]
pub struct PostgresQuestRepository {
    pool: QuestPgPool,
    feed: ChangeFeed<QuestEvent>,
}

impl PostgresQuestRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub fn new(pool: QuestPgPool) -> Self {
        Self {
            pool,
            feed: ChangeFeed::new(),
        }
    }

    async fn run_blocking<F, T>(&self, f: F) -> QuestRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> QuestRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(QuestRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(QuestRepositoryError::persistence)?
    }

    async fn load_where<F>(&self, build: F) -> QuestRepositoryResult<Vec<Quest>>
    where
        F: FnOnce(&mut PgConnection) -> QueryResult<Vec<QuestRow>> + Send + 'static,
    {
        self.run_blocking(move |connection| {
            let rows = build(connection).map_err(QuestRepositoryError::persistence)?;
            rows.into_iter().map(row_to_quest).collect()
        })
        .await
    }
}

#[async_trait]
impl QuestRepository for PostgresQuestRepository {
    async fn insert(&self, quest: &Quest) -> QuestRepositoryResult<()> {
        let quest_id = quest.id();
        let new_row = to_new_row(quest)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(quests::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        QuestRepositoryError::DuplicateQuest(quest_id)
                    }
                    _ => QuestRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await?;

        self.feed.publish(QuestEvent::Created { quest_id });
        Ok(())
    }

    async fn find_by_id(&self, id: QuestId) -> QuestRepositoryResult<Option<Quest>> {
        self.run_blocking(move |connection| {
            let row = quests::table
                .filter(quests::id.eq(id.into_inner()))
                .select(QuestRow::as_select())
                .first::<QuestRow>(connection)
                .optional()
                .map_err(QuestRepositoryError::persistence)?;
            row.map(row_to_quest).transpose()
        })
        .await
    }

    async fn update(&self, quest: &Quest) -> QuestRepositoryResult<Quest> {
        let quest_id = quest.id();
        let expected = to_persisted_revision(quest.revision())?;
        let next_revision = expected
            .checked_add(1)
            .ok_or_else(|| QuestRepositoryError::persistence(RevisionOverflow(quest_id)))?;
        let changes = to_changeset(quest, next_revision)?;

        self
            .run_blocking(move |connection| {
                let affected = diesel::update(
                    quests::table
                        .filter(quests::id.eq(quest_id.into_inner()))
                        .filter(quests::revision.eq(expected)),
                )
                .set(&changes)
                .execute(connection)
                .map_err(QuestRepositoryError::persistence)?;

                if affected == 0 {
                    let exists = quests::table
                        .filter(quests::id.eq(quest_id.into_inner()))
                        .select(quests::id)
                        .first::<uuid::Uuid>(connection)
                        .optional()
                        .map_err(QuestRepositoryError::persistence)?;
                    return match exists {
                        None => Err(QuestRepositoryError::NotFound(quest_id)),
                        Some(_) => Err(QuestRepositoryError::VersionConflict {
                            quest_id,
                            expected: from_persisted_revision(expected)?,
                        }),
                    };
                }
                Ok(())
            })
            .await?;

        let committed = quest.clone().with_revision(from_persisted_revision(next_revision)?);
        self.feed.publish(QuestEvent::Updated { quest_id });
        Ok(committed)
    }

    async fn delete(&self, id: QuestId) -> QuestRepositoryResult<()> {
        self.run_blocking(move |connection| {
            let removed = diesel::delete(quests::table.filter(quests::id.eq(id.into_inner())))
                .execute(connection)
                .map_err(QuestRepositoryError::persistence)?;
            if removed == 0 {
                return Err(QuestRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await?;

        self.feed.publish(QuestEvent::Removed { quest_id: id });
        Ok(())
    }

    async fn list_open(&self) -> QuestRepositoryResult<Vec<Quest>> {
        self.load_where(|connection| {
            quests::table
                .filter(quests::status.eq(QuestStatus::Open.as_str()))
                .order(quests::created_at.desc())
                .select(QuestRow::as_select())
                .load::<QuestRow>(connection)
        })
        .await
    }

    async fn list_by_creator(
        &self,
        creator: &EmailAddress,
    ) -> QuestRepositoryResult<Vec<Quest>> {
        let owner = creator.as_str().to_owned();
        self.load_where(move |connection| {
            quests::table
                .filter(quests::creator.eq(&owner))
                .order(quests::created_at.desc())
                .select(QuestRow::as_select())
                .load::<QuestRow>(connection)
        })
        .await
    }

    async fn list_by_assignee(
        &self,
        assignee: &EmailAddress,
    ) -> QuestRepositoryResult<Vec<Quest>> {
        let owner = assignee.as_str().to_owned();
        self.load_where(move |connection| {
            quests::table
                .filter(quests::assigned_to.eq(&owner))
                .order(quests::created_at.desc())
                .select(QuestRow::as_select())
                .load::<QuestRow>(connection)
        })
        .await
    }

    fn watch(&self) -> EventStream<QuestEvent> {
        self.feed.subscribe()
    }
}

/// Marker error for a revision counter that outgrew the schema column.
#[derive(Debug, thiserror::Error)]
#[error("revision counter overflow for quest {0}")]
struct RevisionOverflow(QuestId);

fn to_persisted_revision(revision: u64) -> QuestRepositoryResult<i64> {
    i64::try_from(revision).map_err(QuestRepositoryError::persistence)
}

fn from_persisted_revision(revision: i64) -> QuestRepositoryResult<u64> {
    u64::try_from(revision).map_err(QuestRepositoryError::persistence)
}

fn applicants_to_value(quest: &Quest) -> QuestRepositoryResult<serde_json::Value> {
    serde_json::to_value(quest.applicants()).map_err(QuestRepositoryError::persistence)
}

fn to_new_row(quest: &Quest) -> QuestRepositoryResult<NewQuestRow> {
    Ok(NewQuestRow {
        id: quest.id().into_inner(),
        creator: quest.creator().as_str().to_owned(),
        title: quest.title().as_str().to_owned(),
        description: quest.description().as_str().to_owned(),
        venue: quest.venue().as_str().to_owned(),
        reward: i32::try_from(quest.reward().value()).map_err(QuestRepositoryError::persistence)?,
        applicants: applicants_to_value(quest)?,
        status: quest.status().as_str().to_owned(),
        assigned_to: quest.assigned_to().map(|email| email.as_str().to_owned()),
        created_at: quest.created_at(),
        deadline: quest.deadline(),
        assigned_at: quest.assigned_at(),
        completed_at: quest.completed_at(),
        updated_at: quest.updated_at(),
        revision: to_persisted_revision(quest.revision())?,
    })
}

fn to_changeset(quest: &Quest, next_revision: i64) -> QuestRepositoryResult<QuestChangeset> {
    Ok(QuestChangeset {
        title: quest.title().as_str().to_owned(),
        description: quest.description().as_str().to_owned(),
        venue: quest.venue().as_str().to_owned(),
        reward: i32::try_from(quest.reward().value()).map_err(QuestRepositoryError::persistence)?,
        applicants: applicants_to_value(quest)?,
        status: quest.status().as_str().to_owned(),
        assigned_to: quest.assigned_to().map(|email| email.as_str().to_owned()),
        deadline: quest.deadline(),
        assigned_at: quest.assigned_at(),
        completed_at: quest.completed_at(),
        updated_at: quest.updated_at(),
        revision: next_revision,
    })
}

fn row_to_quest(row: QuestRow) -> QuestRepositoryResult<Quest> {
    let QuestRow {
        id,
        creator,
        title,
        description,
        venue,
        reward,
        applicants,
        status,
        assigned_to,
        created_at,
        deadline,
        assigned_at,
        completed_at,
        updated_at,
        revision,
    } = row;

    let creator = EmailAddress::new(creator).map_err(QuestRepositoryError::persistence)?;
    let title = QuestTitle::new(title).map_err(QuestRepositoryError::persistence)?;
    let description =
        QuestDescription::new(description).map_err(QuestRepositoryError::persistence)?;
    let venue = Venue::new(venue).map_err(QuestRepositoryError::persistence)?;
    let reward_value = u32::try_from(reward).map_err(QuestRepositoryError::persistence)?;
    let reward = Reward::new(reward_value).map_err(QuestRepositoryError::persistence)?;
    let applicants = serde_json::from_value::<Vec<EmailAddress>>(applicants)
        .map_err(QuestRepositoryError::persistence)?;
    let status = QuestStatus::try_from(status.as_str())
        .map_err(QuestRepositoryError::persistence)?;
    let assigned_to = assigned_to
        .map(EmailAddress::new)
        .transpose()
        .map_err(QuestRepositoryError::persistence)?;

    Ok(Quest::from_persisted(PersistedQuestData {
        id: QuestId::from_uuid(id),
        creator,
        title,
        description,
        venue,
        reward,
        applicants,
        status,
        assigned_to,
        created_at,
        deadline,
        assigned_at,
        completed_at,
        updated_at,
        revision: from_persisted_revision(revision)?,
    }))
}
