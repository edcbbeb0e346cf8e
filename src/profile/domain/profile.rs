//! User profile aggregate and derived rating summaries.

use super::{ProfileDomainError, RatingRole, RatingValue};
use crate::identity::domain::EmailAddress;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Validated display username.
///
/// At least three characters after trimming; there is no upper bound in the
/// marketplace rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Minimum username length in characters.
    pub const MIN_CHARS: usize = 3;

    /// Creates a validated username.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileDomainError::UsernameTooShort`] when the trimmed
    /// value has fewer than three characters.
    pub fn new(value: impl Into<String>) -> Result<Self, ProfileDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        let length = trimmed.chars().count();
        if length < Self::MIN_CHARS {
            return Err(ProfileDomainError::UsernameTooShort(length));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the username as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Username {
    type Error = ProfileDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// User profile aggregate root.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    email: EmailAddress,
    username: Username,
    questmaster_ratings: Vec<RatingValue>,
    voyager_ratings: Vec<RatingValue>,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted profile.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedProfileData {
    /// Persisted email address.
    pub email: EmailAddress,
    /// Persisted username.
    pub username: Username,
    /// Persisted questmaster rating sequence.
    pub questmaster_ratings: Vec<RatingValue>,
    /// Persisted voyager rating sequence.
    pub voyager_ratings: Vec<RatingValue>,
    /// Persisted registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Creates a fresh profile with empty rating sequences.
    #[must_use]
    pub fn new(email: EmailAddress, username: Username, clock: &impl Clock) -> Self {
        Self {
            email,
            username,
            questmaster_ratings: Vec::new(),
            voyager_ratings: Vec::new(),
            created_at: clock.utc(),
        }
    }

    /// Reconstructs a profile from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedProfileData) -> Self {
        Self {
            email: data.email,
            username: data.username,
            questmaster_ratings: data.questmaster_ratings,
            voyager_ratings: data.voyager_ratings,
            created_at: data.created_at,
        }
    }

    /// Returns the profile's email address.
    #[must_use]
    pub const fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Returns the display username.
    #[must_use]
    pub const fn username(&self) -> &Username {
        &self.username
    }

    /// Returns the registration timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the rating sequence for the given role, oldest first.
    #[must_use]
    pub fn ratings(&self, role: RatingRole) -> &[RatingValue] {
        match role {
            RatingRole::Questmaster => &self.questmaster_ratings,
            RatingRole::Voyager => &self.voyager_ratings,
        }
    }

    /// Renames the profile.
    pub fn rename(&mut self, username: Username) {
        self.username = username;
    }

    /// Appends a rating to the sequence for the given role.
    pub fn record_rating(&mut self, role: RatingRole, value: RatingValue) {
        match role {
            RatingRole::Questmaster => self.questmaster_ratings.push(value),
            RatingRole::Voyager => self.voyager_ratings.push(value),
        }
    }

    /// Returns the arithmetic mean of the role's ratings, 0.0 when empty.
    #[must_use]
    pub fn average(&self, role: RatingRole) -> f64 {
        mean(self.ratings(role))
    }

    /// Returns the questmaster rating average.
    #[must_use]
    pub fn questmaster_average(&self) -> f64 {
        self.average(RatingRole::Questmaster)
    }

    /// Returns the voyager rating average.
    #[must_use]
    pub fn voyager_average(&self) -> f64 {
        self.average(RatingRole::Voyager)
    }
}

/// Display summary of a principal, resolvable even without a profile.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSummary {
    /// Name to render for the principal.
    pub display_name: String,
    /// Questmaster rating average, 0.0 when unrated.
    pub questmaster_average: f64,
    /// Voyager rating average, 0.0 when unrated.
    pub voyager_average: f64,
}

impl ProfileSummary {
    /// Summarises an existing profile.
    #[must_use]
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            display_name: profile.username().as_str().to_owned(),
            questmaster_average: profile.questmaster_average(),
            voyager_average: profile.voyager_average(),
        }
    }

    /// Synthesises a summary for a principal with no profile document:
    /// the email local part as display name and zeroed averages.
    #[must_use]
    pub fn fallback(email: &EmailAddress) -> Self {
        Self {
            display_name: email.local_part().to_owned(),
            questmaster_average: 0.0,
            voyager_average: 0.0,
        }
    }
}

#[expect(
    clippy::cast_precision_loss,
    clippy::float_arithmetic,
    reason = "rating sequences are tiny and values are 1-5; the mean is exact well past any realistic length"
)]
fn mean(ratings: &[RatingValue]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: u32 = ratings.iter().map(|rating| u32::from(rating.value())).sum();
    f64::from(sum) / ratings.len() as f64
}
