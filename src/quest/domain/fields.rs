//! Validated field types for quest records.

use super::QuestValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Quest title, 1-100 characters after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QuestTitle(String);

impl QuestTitle {
    /// Maximum title length in characters.
    pub const MAX_CHARS: usize = 100;

    /// Creates a validated quest title.
    ///
    /// # Errors
    ///
    /// Returns [`QuestValidationError::TitleLength`] when the trimmed value
    /// is empty or longer than 100 characters.
    pub fn new(value: impl Into<String>) -> Result<Self, QuestValidationError> {
        let trimmed = value.into().trim().to_owned();
        let length = trimmed.chars().count();
        if length == 0 || length > Self::MAX_CHARS {
            return Err(QuestValidationError::TitleLength(length));
        }
        Ok(Self(trimmed))
    }

    /// Returns the title as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for QuestTitle {
    type Error = QuestValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<QuestTitle> for String {
    fn from(value: QuestTitle) -> Self {
        value.0
    }
}

impl fmt::Display for QuestTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Quest description, 1-500 characters after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QuestDescription(String);

impl QuestDescription {
    /// Maximum description length in characters.
    pub const MAX_CHARS: usize = 500;

    /// Creates a validated quest description.
    ///
    /// # Errors
    ///
    /// Returns [`QuestValidationError::DescriptionLength`] when the trimmed
    /// value is empty or longer than 500 characters.
    pub fn new(value: impl Into<String>) -> Result<Self, QuestValidationError> {
        let trimmed = value.into().trim().to_owned();
        let length = trimmed.chars().count();
        if length == 0 || length > Self::MAX_CHARS {
            return Err(QuestValidationError::DescriptionLength(length));
        }
        Ok(Self(trimmed))
    }

    /// Returns the description as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for QuestDescription {
    type Error = QuestValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<QuestDescription> for String {
    fn from(value: QuestDescription) -> Self {
        value.0
    }
}

impl fmt::Display for QuestDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Free-text venue, required and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Venue(String);

impl Venue {
    /// Creates a validated venue.
    ///
    /// # Errors
    ///
    /// Returns [`QuestValidationError::EmptyVenue`] when the trimmed value
    /// is empty.
    pub fn new(value: impl Into<String>) -> Result<Self, QuestValidationError> {
        let trimmed = value.into().trim().to_owned();
        if trimmed.is_empty() {
            return Err(QuestValidationError::EmptyVenue);
        }
        Ok(Self(trimmed))
    }

    /// Returns the venue as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Venue {
    type Error = QuestValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Venue> for String {
    fn from(value: Venue) -> Self {
        value.0
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reward in whole currency units, 1-10000.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Reward(u32);

impl Reward {
    /// Smallest accepted reward.
    pub const MIN: u32 = 1;
    /// Largest accepted reward.
    pub const MAX: u32 = 10_000;

    /// Creates a validated reward.
    ///
    /// # Errors
    ///
    /// Returns [`QuestValidationError::RewardOutOfRange`] when the value is
    /// outside 1-10000.
    pub const fn new(value: u32) -> Result<Self, QuestValidationError> {
        if value < Self::MIN || value > Self::MAX {
            return Err(QuestValidationError::RewardOutOfRange(value));
        }
        Ok(Self(value))
    }

    /// Returns the reward amount.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Returns the display tier this reward falls into.
    #[must_use]
    pub const fn tier(self) -> RewardTier {
        if self.0 > 100 {
            RewardTier::Legendary
        } else if self.0 >= 50 {
            RewardTier::Gold
        } else if self.0 >= 20 {
            RewardTier::Silver
        } else {
            RewardTier::Bronze
        }
    }
}

impl TryFrom<u32> for Reward {
    type Error = QuestValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Reward> for u32 {
    fn from(value: Reward) -> Self {
        value.0
    }
}

impl fmt::Display for Reward {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display tier badge derived from the reward amount.
///
/// Purely presentational; never affects lifecycle rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RewardTier {
    /// Rewards below 20.
    Bronze,
    /// Rewards of 20-49.
    Silver,
    /// Rewards of 50-100.
    Gold,
    /// Rewards above 100.
    Legendary,
}

impl RewardTier {
    /// Returns the badge label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bronze => "Bronze",
            Self::Silver => "Silver",
            Self::Gold => "Gold",
            Self::Legendary => "Legendary",
        }
    }
}

impl fmt::Display for RewardTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
