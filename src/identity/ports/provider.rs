//! Port for the external authentication collaborator.

use crate::identity::domain::{EmailAddress, Principal};
use crate::live::EventStream;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for identity provider operations.
pub type IdentityResult<T> = Result<T, IdentityProviderError>;

/// Auth-state change pushed by the identity collaborator.
///
/// `SignedIn` carries only usable principals: accounts that exist but have
/// not verified their mailbox are reported as signed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// A verified principal signed in.
    SignedIn(Principal),
    /// The current principal signed out (or an unverified sign-in was
    /// rejected).
    SignedOut,
}

/// Identity collaborator contract.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Returns the current usable principal, if any.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityProviderError::Unavailable`] when the collaborator
    /// cannot be reached.
    async fn current(&self) -> IdentityResult<Option<Principal>>;

    /// Opens a stream of auth-state changes.
    fn watch(&self) -> EventStream<AuthEvent>;
}

/// Errors returned by identity provider implementations.
#[derive(Debug, Clone, Error)]
pub enum IdentityProviderError {
    /// The principal exists but has not verified their mailbox.
    #[error("{0} has not verified their email address")]
    Unverified(EmailAddress),

    /// Collaborator-layer failure.
    #[error("identity collaborator unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl IdentityProviderError {
    /// Wraps a collaborator failure.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
