//! Port contracts for the identity collaborator.

pub mod provider;

pub use provider::{AuthEvent, IdentityProvider, IdentityProviderError, IdentityResult};
