//! `PostgreSQL` adapters for quest persistence.

mod models;
mod repository;
mod schema;

pub use repository::{PostgresQuestRepository, QuestPgPool};
