//! Rating roles and validated rating values.

use super::ProfileDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Marketplace role a rating applies to.
///
/// A completed quest produces one rating in each direction: the voyager
/// rates the creator as questmaster, the creator rates the assignee as
/// voyager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingRole {
    /// The poster/creator side of a quest.
    Questmaster,
    /// The assignee side of a quest.
    Voyager,
}

impl RatingRole {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Questmaster => "questmaster",
            Self::Voyager => "voyager",
        }
    }

    /// Returns the opposite role.
    #[must_use]
    pub const fn counterpart(self) -> Self {
        match self {
            Self::Questmaster => Self::Voyager,
            Self::Voyager => Self::Questmaster,
        }
    }
}

impl fmt::Display for RatingRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single star rating on the 1-5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct RatingValue(u8);

impl RatingValue {
    /// Smallest accepted rating.
    pub const MIN: u8 = 1;
    /// Largest accepted rating.
    pub const MAX: u8 = 5;

    /// Creates a validated rating value.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileDomainError::RatingOutOfRange`] when the value is
    /// outside the 1-5 scale.
    pub const fn new(value: u8) -> Result<Self, ProfileDomainError> {
        if value < Self::MIN || value > Self::MAX {
            return Err(ProfileDomainError::RatingOutOfRange(value));
        }
        Ok(Self(value))
    }

    /// Returns the underlying star count.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for RatingValue {
    type Error = ProfileDomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RatingValue> for u8 {
    fn from(value: RatingValue) -> Self {
        value.0
    }
}

impl fmt::Display for RatingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
