//! Port contracts for notification persistence.

pub mod repository;

pub use repository::{
    NotificationEvent, NotificationRepository, NotificationRepositoryError,
    NotificationRepositoryResult, MAX_MUTATION_BATCH,
};
