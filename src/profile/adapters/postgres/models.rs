//! Diesel row models for profile persistence.

use super::schema::profiles;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for profile records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProfileRow {
    /// Principal email address.
    pub email: String,
    /// Display username.
    pub username: String,
    /// Questmaster rating sequence payload.
    pub questmaster_ratings: Value,
    /// Voyager rating sequence payload.
    pub voyager_ratings: Value,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for profile records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = profiles)]
pub struct NewProfileRow {
    /// Principal email address.
    pub email: String,
    /// Display username.
    pub username: String,
    /// Questmaster rating sequence payload.
    pub questmaster_ratings: Value,
    /// Voyager rating sequence payload.
    pub voyager_ratings: Value,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}
