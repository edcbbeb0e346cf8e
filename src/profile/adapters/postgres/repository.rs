//! `PostgreSQL` repository implementation for profile storage.

use super::{
    models::{NewProfileRow, ProfileRow},
    schema::profiles,
};
use crate::identity::domain::EmailAddress;
use crate::profile::{
    domain::{PersistedProfileData, RatingRole, RatingValue, UserProfile, Username},
    ports::{ProfileRepository, ProfileRepositoryError, ProfileRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by profile adapters.
pub type ProfilePgPool = Pool<ConnectionManager<PgConnection>>;

const APPEND_QUESTMASTER_RATING: &str = concat!(
    "UPDATE profiles SET questmaster_ratings = questmaster_ratings || $1::jsonb ",
    "WHERE email = $2",
);
const APPEND_VOYAGER_RATING: &str = concat!(
    "UPDATE profiles SET voyager_ratings = voyager_ratings || $1::jsonb ",
    "WHERE email = $2",
);

/// `PostgreSQL`-backed profile repository.
#[derive(Debug, Clone)]
pub struct PostgresProfileRepository {
    pool: ProfilePgPool,
}

impl PostgresProfileRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: ProfilePgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> ProfileRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> ProfileRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(ProfileRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(ProfileRepositoryError::persistence)?
    }
}

#[async_trait]
impl ProfileRepository for PostgresProfileRepository {
    async fn insert(&self, profile: &UserProfile) -> ProfileRepositoryResult<()> {
        let email = profile.email().clone();
        let new_row = to_new_row(profile)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(profiles::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        ProfileRepositoryError::DuplicateProfile(email.clone())
                    }
                    _ => ProfileRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> ProfileRepositoryResult<Option<UserProfile>> {
        let lookup = email.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = profiles::table
                .filter(profiles::email.eq(&lookup))
                .select(ProfileRow::as_select())
                .first::<ProfileRow>(connection)
                .optional()
                .map_err(ProfileRepositoryError::persistence)?;
            row.map(row_to_profile).transpose()
        })
        .await
    }

    async fn set_username(
        &self,
        email: &EmailAddress,
        username: &Username,
    ) -> ProfileRepositoryResult<()> {
        let target = email.clone();
        let new_name = username.as_str().to_owned();
        self.run_blocking(move |connection| {
            let updated =
                diesel::update(profiles::table.filter(profiles::email.eq(target.as_str())))
                    .set(profiles::username.eq(&new_name))
                    .execute(connection)
                    .map_err(ProfileRepositoryError::persistence)?;
            if updated == 0 {
                return Err(ProfileRepositoryError::NotFound(target.clone()));
            }
            Ok(())
        })
        .await
    }

    async fn append_rating(
        &self,
        email: &EmailAddress,
        role: RatingRole,
        value: RatingValue,
    ) -> ProfileRepositoryResult<()> {
        let target = email.clone();
        let payload = serde_json::json!([value.value()]);
        let sql = match role {
            RatingRole::Questmaster => APPEND_QUESTMASTER_RATING,
            RatingRole::Voyager => APPEND_VOYAGER_RATING,
        };

        self.run_blocking(move |connection| {
            let updated = diesel::sql_query(sql)
                .bind::<diesel::sql_types::Jsonb, _>(&payload)
                .bind::<diesel::sql_types::Text, _>(target.as_str())
                .execute(connection)
                .map_err(ProfileRepositoryError::persistence)?;
            if updated == 0 {
                return Err(ProfileRepositoryError::NotFound(target.clone()));
            }
            Ok(())
        })
        .await
    }
}

fn to_new_row(profile: &UserProfile) -> ProfileRepositoryResult<NewProfileRow> {
    let questmaster_ratings = serde_json::to_value(profile.ratings(RatingRole::Questmaster))
        .map_err(ProfileRepositoryError::persistence)?;
    let voyager_ratings = serde_json::to_value(profile.ratings(RatingRole::Voyager))
        .map_err(ProfileRepositoryError::persistence)?;

    Ok(NewProfileRow {
        email: profile.email().as_str().to_owned(),
        username: profile.username().as_str().to_owned(),
        questmaster_ratings,
        voyager_ratings,
        created_at: profile.created_at(),
    })
}

fn row_to_profile(row: ProfileRow) -> ProfileRepositoryResult<UserProfile> {
    let ProfileRow {
        email,
        username,
        questmaster_ratings,
        voyager_ratings,
        created_at,
    } = row;

    let email = EmailAddress::new(email).map_err(ProfileRepositoryError::persistence)?;
    let username = Username::new(username).map_err(ProfileRepositoryError::persistence)?;
    let questmaster_ratings = serde_json::from_value::<Vec<RatingValue>>(questmaster_ratings)
        .map_err(ProfileRepositoryError::persistence)?;
    let voyager_ratings = serde_json::from_value::<Vec<RatingValue>>(voyager_ratings)
        .map_err(ProfileRepositoryError::persistence)?;

    Ok(UserProfile::from_persisted(PersistedProfileData {
        email,
        username,
        questmaster_ratings,
        voyager_ratings,
        created_at,
    }))
}
