//! Diesel row models for quest persistence.

use super::schema::quests;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for quest records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = quests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct QuestRow {
    /// Quest identifier.
    pub id: uuid::Uuid,
    /// Creator email address.
    pub creator: String,
    /// Quest title.
    pub title: String,
    /// Quest description.
    pub description: String,
    /// Venue free text.
    pub venue: String,
    /// Reward in whole currency units.
    pub reward: i32,
    /// Applicant set payload.
    pub applicants: Value,
    /// Lifecycle status.
    pub status: String,
    /// Assignee email address, if assigned.
    pub assigned_to: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Deadline.
    pub deadline: DateTime<Utc>,
    /// Assignment timestamp, if assigned.
    pub assigned_at: Option<DateTime<Utc>>,
    /// Completion timestamp, if completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// Last lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
    /// Document revision.
    pub revision: i64,
}

/// Insert model for quest records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = quests)]
pub struct NewQuestRow {
    /// Quest identifier.
    pub id: uuid::Uuid,
    /// Creator email address.
    pub creator: String,
    /// Quest title.
    pub title: String,
    /// Quest description.
    pub description: String,
    /// Venue free text.
    pub venue: String,
    /// Reward in whole currency units.
    pub reward: i32,
    /// Applicant set payload.
    pub applicants: Value,
    /// Lifecycle status.
    pub status: String,
    /// Assignee email address, if assigned.
    pub assigned_to: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Deadline.
    pub deadline: DateTime<Utc>,
    /// Assignment timestamp, if assigned.
    pub assigned_at: Option<DateTime<Utc>>,
    /// Completion timestamp, if completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// Last lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
    /// Document revision.
    pub revision: i64,
}

/// Changeset for committing a conditional write.
///
/// Identifier, creator, and creation timestamp are immutable and deliberately
/// absent. `None` values overwrite their column with `NULL`.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = quests)]
#[diesel(treat_none_as_null = true)]
pub struct QuestChangeset {
    /// Quest title.
    pub title: String,
    /// Quest description.
    pub description: String,
    /// Venue free text.
    pub venue: String,
    /// Reward in whole currency units.
    pub reward: i32,
    /// Applicant set payload.
    pub applicants: Value,
    /// Lifecycle status.
    pub status: String,
    /// Assignee email address, if assigned.
    pub assigned_to: Option<String>,
    /// Deadline.
    pub deadline: DateTime<Utc>,
    /// Assignment timestamp, if assigned.
    pub assigned_at: Option<DateTime<Utc>>,
    /// Completion timestamp, if completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// Last lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
    /// Document revision after the write.
    pub revision: i64,
}
