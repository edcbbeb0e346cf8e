//! `PostgreSQL` repository implementation for notification storage.

use super::{
    models::{NewNotificationRow, NotificationRow},
    schema::notifications,
};
use crate::identity::domain::EmailAddress;
use crate::live::{ChangeFeed, EventStream};
use crate::notification::{
    domain::{Notification, NotificationId, NotificationKind, PersistedNotificationData},
    ports::{
        NotificationEvent, NotificationRepository, NotificationRepositoryError,
        NotificationRepositoryResult, MAX_MUTATION_BATCH,
    },
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by notification adapters.
pub type NotificationPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed notification repository.
///
/// Change events cover mutations performed through this repository
/// instance; cross-process fan-out would be layered on `LISTEN`/`NOTIFY`
/// without touching the port.
#[derive(Debug, Clone)]
pub struct PostgresNotificationRepository {
    pool: NotificationPgPool,
    feed: ChangeFeed<NotificationEvent>,
}

impl PostgresNotificationRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub fn new(pool: NotificationPgPool) -> Self {
        Self {
            pool,
            feed: ChangeFeed::new(),
        }
    }

    async fn run_blocking<F, T>(&self, f: F) -> NotificationRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> NotificationRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool
                .get()
                .map_err(NotificationRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(NotificationRepositoryError::persistence)?
    }
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    async fn insert(&self, notification: &Notification) -> NotificationRepositoryResult<()> {
        let id = notification.id();
        let recipient = notification.recipient().clone();
        let new_row = to_new_row(notification)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(notifications::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        NotificationRepositoryError::DuplicateNotification(id)
                    }
                    _ => NotificationRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await?;

        self.feed.publish(NotificationEvent::Delivered { recipient });
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: NotificationId,
    ) -> NotificationRepositoryResult<Option<Notification>> {
        self.run_blocking(move |connection| {
            let row = notifications::table
                .filter(notifications::id.eq(id.into_inner()))
                .select(NotificationRow::as_select())
                .first::<NotificationRow>(connection)
                .optional()
                .map_err(NotificationRepositoryError::persistence)?;
            row.map(row_to_notification).transpose()
        })
        .await
    }

    async fn mark_read(&self, id: NotificationId) -> NotificationRepositoryResult<()> {
        let recipient = self
            .run_blocking(move |connection| {
                let recipient = notifications::table
                    .filter(notifications::id.eq(id.into_inner()))
                    .select(notifications::recipient)
                    .first::<String>(connection)
                    .optional()
                    .map_err(NotificationRepositoryError::persistence)?;

                if recipient.is_some() {
                    diesel::update(
                        notifications::table.filter(notifications::id.eq(id.into_inner())),
                    )
                    .set(notifications::read.eq(true))
                    .execute(connection)
                    .map_err(NotificationRepositoryError::persistence)?;
                }
                Ok(recipient)
            })
            .await?;

        if let Some(recipient) = recipient {
            let recipient =
                EmailAddress::new(recipient).map_err(NotificationRepositoryError::persistence)?;
            self.feed.publish(NotificationEvent::Updated { recipient });
        }
        Ok(())
    }

    async fn delete(&self, id: NotificationId) -> NotificationRepositoryResult<()> {
        let recipient = self
            .run_blocking(move |connection| {
                let recipient = notifications::table
                    .filter(notifications::id.eq(id.into_inner()))
                    .select(notifications::recipient)
                    .first::<String>(connection)
                    .optional()
                    .map_err(NotificationRepositoryError::persistence)?;

                if recipient.is_some() {
                    diesel::delete(
                        notifications::table.filter(notifications::id.eq(id.into_inner())),
                    )
                    .execute(connection)
                    .map_err(NotificationRepositoryError::persistence)?;
                }
                Ok(recipient)
            })
            .await?;

        if let Some(recipient) = recipient {
            let recipient =
                EmailAddress::new(recipient).map_err(NotificationRepositoryError::persistence)?;
            self.feed.publish(NotificationEvent::Removed { recipient });
        }
        Ok(())
    }

    async fn list_for(
        &self,
        recipient: &EmailAddress,
    ) -> NotificationRepositoryResult<Vec<Notification>> {
        let owner = recipient.as_str().to_owned();
        self.run_blocking(move |connection| {
            let rows = notifications::table
                .filter(notifications::recipient.eq(&owner))
                .order(notifications::created_at.desc())
                .select(NotificationRow::as_select())
                .load::<NotificationRow>(connection)
                .map_err(NotificationRepositoryError::persistence)?;
            rows.into_iter().map(row_to_notification).collect()
        })
        .await
    }

    async fn ids_for(
        &self,
        recipient: &EmailAddress,
    ) -> NotificationRepositoryResult<Vec<NotificationId>> {
        let owner = recipient.as_str().to_owned();
        self.run_blocking(move |connection| {
            let ids = notifications::table
                .filter(notifications::recipient.eq(&owner))
                .select(notifications::id)
                .load::<uuid::Uuid>(connection)
                .map_err(NotificationRepositoryError::persistence)?;
            Ok(ids.into_iter().map(NotificationId::from_uuid).collect())
        })
        .await
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

        let uuids: Vec<uuid::Uuid> = ids.iter().map(|id| id.into_inner()).collect();
        let (removed, owners) = self
            .run_blocking(move |connection| {
                let owners = notifications::table
                    .filter(notifications::id.eq_any(&uuids))
                    .select(notifications::recipient)
                    .distinct()
                    .load::<String>(connection)
                    .map_err(NotificationRepositoryError::persistence)?;

                let removed =
                    diesel::delete(notifications::table.filter(notifications::id.eq_any(&uuids)))
                        .execute(connection)
                        .map_err(NotificationRepositoryError::persistence)?;
                Ok((removed, owners))
            })
            .await?;

        for owner in owners {
            let recipient =
                EmailAddress::new(owner).map_err(NotificationRepositoryError::persistence)?;
            self.feed.publish(NotificationEvent::Removed { recipient });
        }
        Ok(removed)
    }

    fn watch(&self) -> EventStream<NotificationEvent> {
        self.feed.subscribe()
    }
}

fn to_new_row(notification: &Notification) -> NotificationRepositoryResult<NewNotificationRow> {
    let kind = serde_json::to_value(notification.kind())
        .map_err(NotificationRepositoryError::persistence)?;

    Ok(NewNotificationRow {
        id: notification.id().into_inner(),
        recipient: notification.recipient().as_str().to_owned(),
        message: notification.message().to_owned(),
        kind,
        read: notification.is_read(),
        created_at: notification.created_at(),
    })
}

fn row_to_notification(row: NotificationRow) -> NotificationRepositoryResult<Notification> {
    let NotificationRow {
        id,
        recipient,
        message,
        kind,
        read,
        created_at,
    } = row;

    let recipient =
        EmailAddress::new(recipient).map_err(NotificationRepositoryError::persistence)?;
    let kind = serde_json::from_value::<NotificationKind>(kind)
        .map_err(NotificationRepositoryError::persistence)?;

    Ok(Notification::from_persisted(PersistedNotificationData {
        id: NotificationId::from_uuid(id),
        recipient,
        message,
        kind,
        read,
        created_at,
    }))
}
