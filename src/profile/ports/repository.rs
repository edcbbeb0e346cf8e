//! Repository port for profile persistence and rating appends.

use crate::identity::domain::EmailAddress;
use crate::profile::domain::{RatingRole, RatingValue, UserProfile, Username};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for profile repository operations.
pub type ProfileRepositoryResult<T> = Result<T, ProfileRepositoryError>;

/// Profile persistence contract.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Stores a new profile.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileRepositoryError::DuplicateProfile`] when a profile
    /// already exists for the email address.
    async fn insert(&self, profile: &UserProfile) -> ProfileRepositoryResult<()>;

    /// Finds a profile by email address.
    ///
    /// Returns `None` when no profile exists.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> ProfileRepositoryResult<Option<UserProfile>>;

    /// Replaces the profile's username.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileRepositoryError::NotFound`] when the profile does
    /// not exist.
    async fn set_username(
        &self,
        email: &EmailAddress,
        username: &Username,
    ) -> ProfileRepositoryResult<()>;

    /// Atomically appends a rating to the role's sequence.
    ///
    /// The append must be a single store-side operation (or equivalent);
    /// two concurrent appends both land, in some order, without either
    /// overwriting the other.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileRepositoryError::NotFound`] when the profile does
    /// not exist.
    async fn append_rating(
        &self,
        email: &EmailAddress,
        role: RatingRole,
        value: RatingValue,
    ) -> ProfileRepositoryResult<()>;
}

/// Errors returned by profile repository implementations.
#[derive(Debug, Clone, Error)]
pub enum ProfileRepositoryError {
    /// A profile already exists for the email address.
    #[error("profile already exists for {0}")]
    DuplicateProfile(EmailAddress),

    /// The profile was not found.
    #[error("no profile for {0}")]
    NotFound(EmailAddress),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ProfileRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
