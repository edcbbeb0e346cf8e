//! Error types for identity domain validation.

use thiserror::Error;

/// Errors returned while constructing identity domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityDomainError {
    /// The value is not a structurally valid email address.
    #[error("invalid principal email address: {0}")]
    InvalidEmailAddress(String),
}
