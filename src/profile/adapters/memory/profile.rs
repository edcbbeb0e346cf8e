//! In-memory repository for profile tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::identity::domain::EmailAddress;
use crate::profile::{
    domain::{RatingRole, RatingValue, UserProfile, Username},
    ports::{ProfileRepository, ProfileRepositoryError, ProfileRepositoryResult},
};

/// Thread-safe in-memory profile repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProfileRepository {
    state: Arc<RwLock<HashMap<EmailAddress, UserProfile>>>,
}

impl InMemoryProfileRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl std::fmt::Display) -> ProfileRepositoryError {
    ProfileRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn insert(&self, profile: &UserProfile) -> ProfileRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.contains_key(profile.email()) {
            return Err(ProfileRepositoryError::DuplicateProfile(
                profile.email().clone(),
            ));
        }
        state.insert(profile.email().clone(), profile.clone());
        Ok(())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> ProfileRepositoryResult<Option<UserProfile>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.get(email).cloned())
    }

    async fn set_username(
        &self,
        email: &EmailAddress,
        username: &Username,
    ) -> ProfileRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        let profile = state
            .get_mut(email)
            .ok_or_else(|| ProfileRepositoryError::NotFound(email.clone()))?;
        profile.rename(username.clone());
        Ok(())
    }

    async fn append_rating(
        &self,
        email: &EmailAddress,
        role: RatingRole,
        value: RatingValue,
    ) -> ProfileRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        let profile = state
            .get_mut(email)
            .ok_or_else(|| ProfileRepositoryError::NotFound(email.clone()))?;
        profile.record_rating(role, value);
        Ok(())
    }
}
