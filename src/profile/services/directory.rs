//! Service layer for profile registration, renaming, and display summaries.

use crate::fault::ErrorCategory;
use crate::identity::domain::EmailAddress;
use crate::profile::{
    domain::{ProfileDomainError, ProfileSummary, UserProfile, Username},
    ports::{ProfileRepository, ProfileRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Institution email domain accepted by default.
pub const DEFAULT_INSTITUTION_DOMAIN: &str = "iitj.ac.in";

/// Service-level errors for profile operations.
#[derive(Debug, Error)]
pub enum ProfileServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] ProfileDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] ProfileRepositoryError),
}

impl ProfileServiceError {
    /// Returns the caller-facing category of this failure.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(_) => ErrorCategory::InvalidInput,
            Self::Repository(err) => match err {
                ProfileRepositoryError::DuplicateProfile(_) => ErrorCategory::Conflict,
                ProfileRepositoryError::NotFound(_) => ErrorCategory::NotFound,
                ProfileRepositoryError::Persistence(_) => ErrorCategory::Unavailable,
            },
        }
    }
}

/// Result type for profile service operations.
pub type ProfileServiceResult<T> = Result<T, ProfileServiceError>;

/// Profile directory service.
pub struct ProfileService<R, C>
where
    R: ProfileRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    institution_domain: String,
}

impl<R, C> Clone for ProfileService<R, C>
where
    R: ProfileRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
            institution_domain: self.institution_domain.clone(),
        }
    }
}

impl<R, C> ProfileService<R, C>
where
    R: ProfileRepository,
    C: Clock + Send + Sync,
{
    /// Creates a profile service restricted to [`DEFAULT_INSTITUTION_DOMAIN`].
    #[must_use]
    pub fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self::with_institution_domain(repository, clock, DEFAULT_INSTITUTION_DOMAIN)
    }

    /// Creates a profile service restricted to the given email domain.
    #[must_use]
    pub fn with_institution_domain(
        repository: Arc<R>,
        clock: Arc<C>,
        institution_domain: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            clock,
            institution_domain: institution_domain.into(),
        }
    }

    /// Registers a profile for a principal.
    ///
    /// # Errors
    ///
    /// Fails with [`ProfileDomainError::OutsideInstitution`] for addresses
    /// outside the institution domain, [`ProfileDomainError::UsernameTooShort`]
    /// for short usernames, and a repository conflict when the address is
    /// already registered.
    pub async fn register(
        &self,
        email: EmailAddress,
        username: &str,
    ) -> ProfileServiceResult<UserProfile> {
        if email.domain() != self.institution_domain {
            return Err(ProfileDomainError::OutsideInstitution {
                domain: email.domain().to_owned(),
                required: self.institution_domain.clone(),
            }
            .into());
        }

        let display_name = Username::new(username)?;
        let profile = UserProfile::new(email, display_name, &*self.clock);
        self.repository.insert(&profile).await?;
        Ok(profile)
    }

    /// Renames an existing profile.
    ///
    /// # Errors
    ///
    /// Fails with [`ProfileDomainError::UsernameTooShort`] for invalid
    /// names and with a repository error when the profile is missing.
    pub async fn update_username(
        &self,
        email: &EmailAddress,
        username: &str,
    ) -> ProfileServiceResult<()> {
        let display_name = Username::new(username)?;
        self.repository.set_username(email, &display_name).await?;
        Ok(())
    }

    /// Retrieves a profile by email address.
    ///
    /// Returns `Ok(None)` when no profile exists.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileServiceError::Repository`] when the lookup fails.
    pub async fn find(&self, email: &EmailAddress) -> ProfileServiceResult<Option<UserProfile>> {
        Ok(self.repository.find_by_email(email).await?)
    }

    /// Returns the display summary for a principal.
    ///
    /// Principals without a profile document get a synthesised summary:
    /// the email local part as display name and zeroed averages.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileServiceError::Repository`] when the lookup fails.
    pub async fn summary_for(&self, email: &EmailAddress) -> ProfileServiceResult<ProfileSummary> {
        let summary = self
            .repository
            .find_by_email(email)
            .await?
            .map_or_else(|| ProfileSummary::fallback(email), |profile| ProfileSummary::from_profile(&profile));
        Ok(summary)
    }
}
