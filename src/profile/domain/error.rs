//! Error types for profile domain validation.

use thiserror::Error;

/// Errors returned while constructing profile domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProfileDomainError {
    /// The username is shorter than the minimum length.
    #[error("username must be at least 3 characters long, got {0}")]
    UsernameTooShort(usize),

    /// The rating value is outside the 1-5 scale.
    #[error("rating must be between 1 and 5, got {0}")]
    RatingOutOfRange(u8),

    /// The email address does not belong to the institution.
    #[error("only {required} accounts may register, got domain {domain}")]
    OutsideInstitution {
        /// Domain of the rejected address.
        domain: String,
        /// Required institution domain.
        required: String,
    },
}
