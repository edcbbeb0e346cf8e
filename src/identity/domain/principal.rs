//! Validated principal identifiers and the authenticated principal model.

use super::IdentityDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized email address identifying a principal.
///
/// Addresses are trimmed and lowercased on construction, so two spellings
/// of the same mailbox compare equal. Structural validation only: exactly
/// one `@`, a non-empty local part and domain, and no whitespace. Whether
/// the domain belongs to the institution is a profile-registration rule,
/// not an identity rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated, normalized email address.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityDomainError::InvalidEmailAddress`] when the value
    /// is not structurally an email address.
    pub fn new(value: impl Into<String>) -> Result<Self, IdentityDomainError> {
        let raw = value.into();
        let normalized = raw.trim().to_ascii_lowercase();
        let Some((local, domain)) = normalized.split_once('@') else {
            return Err(IdentityDomainError::InvalidEmailAddress(raw));
        };

        let is_valid = !local.is_empty()
            && !domain.is_empty()
            && !domain.contains('@')
            && !normalized.chars().any(char::is_whitespace);
        if !is_valid {
            return Err(IdentityDomainError::InvalidEmailAddress(raw));
        }

        Ok(Self(normalized))
    }

    /// Returns the address as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the part before the `@`, used as a display-name fallback.
    #[must_use]
    pub fn local_part(&self) -> &str {
        self.0.split_once('@').map_or(self.0.as_str(), |(local, _)| local)
    }

    /// Returns the part after the `@`.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.split_once('@').map_or("", |(_, domain)| domain)
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = IdentityDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for EmailAddress {
    type Error = IdentityDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An authenticated principal as reported by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    email: EmailAddress,
    email_verified: bool,
}

impl Principal {
    /// Creates a principal record.
    #[must_use]
    pub const fn new(email: EmailAddress, email_verified: bool) -> Self {
        Self {
            email,
            email_verified,
        }
    }

    /// Returns the principal's email address.
    #[must_use]
    pub const fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Returns `true` when the mailbox has been verified.
    #[must_use]
    pub const fn email_verified(&self) -> bool {
        self.email_verified
    }

    /// Returns `true` when this principal may act in the marketplace.
    ///
    /// Unverified accounts exist at the identity collaborator but are not
    /// usable by this core.
    #[must_use]
    pub const fn is_usable(&self) -> bool {
        self.email_verified
    }
}
