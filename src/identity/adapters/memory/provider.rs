//! In-memory identity provider for tests and local development.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::identity::{
    domain::Principal,
    ports::{AuthEvent, IdentityProvider, IdentityProviderError, IdentityResult},
};
use crate::live::{ChangeFeed, EventStream};

/// Thread-safe in-memory identity provider.
///
/// Holds at most one signed-in principal and publishes an [`AuthEvent`] on
/// every change, mimicking the auth-state hook of the managed identity
/// service.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdentityProvider {
    state: Arc<RwLock<Option<Principal>>>,
    feed: ChangeFeed<AuthEvent>,
}

impl InMemoryIdentityProvider {
    /// Creates a provider with nobody signed in.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signs a principal in and publishes [`AuthEvent::SignedIn`].
    ///
    /// # Errors
    ///
    /// Returns [`IdentityProviderError::Unverified`] when the principal has
    /// not verified their mailbox; the sign-in is rejected and the provider
    /// stays signed out, matching the verification gate of the real
    /// collaborator.
    pub fn sign_in(&self, principal: Principal) -> IdentityResult<()> {
        if !principal.is_usable() {
            return Err(IdentityProviderError::Unverified(principal.email().clone()));
        }

        let mut state = self
            .state
            .write()
            .map_err(|err| IdentityProviderError::unavailable(std::io::Error::other(err.to_string())))?;
        *state = Some(principal.clone());
        drop(state);

        self.feed.publish(AuthEvent::SignedIn(principal));
        Ok(())
    }

    /// Signs the current principal out and publishes [`AuthEvent::SignedOut`].
    ///
    /// Signing out while already signed out is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityProviderError::Unavailable`] when internal state is
    /// poisoned.
    pub fn sign_out(&self) -> IdentityResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| IdentityProviderError::unavailable(std::io::Error::other(err.to_string())))?;
        let was_signed_in = state.take().is_some();
        drop(state);

        if was_signed_in {
            self.feed.publish(AuthEvent::SignedOut);
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn current(&self) -> IdentityResult<Option<Principal>> {
        let state = self
            .state
            .read()
            .map_err(|err| IdentityProviderError::unavailable(std::io::Error::other(err.to_string())))?;
        Ok(state.clone())
    }

    fn watch(&self) -> EventStream<AuthEvent> {
        self.feed.subscribe()
    }
}
