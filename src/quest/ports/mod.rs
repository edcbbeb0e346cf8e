//! Port contracts for quest persistence.
//!
//! Ports define infrastructure-agnostic interfaces used by quest services.

pub mod repository;

pub use repository::{QuestEvent, QuestRepository, QuestRepositoryError, QuestRepositoryResult};
