//! Notification record, identifier, and kind variants.

use crate::identity::domain::EmailAddress;
use crate::profile::domain::RatingRole;
use crate::quest::domain::QuestId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a notification record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(Uuid);

impl NotificationId {
    /// Creates a new random notification identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a notification identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for NotificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a notification is about.
///
/// Each variant carries exactly the fields its kind needs; the historical
/// open bag of optional properties is decoded into this union at the store
/// boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationKind {
    /// Someone applied to the recipient's quest; prompts an assignment.
    Application {
        /// Quest the application targets.
        quest_id: QuestId,
        /// Principal who applied.
        applicant: EmailAddress,
    },
    /// The recipient was assigned a quest.
    Assignment {
        /// Quest that was assigned.
        quest_id: QuestId,
    },
    /// The recipient's application was passed over.
    Rejection {
        /// Quest that went to someone else.
        quest_id: QuestId,
    },
    /// One-shot prompt to rate the counterpart of a completed quest.
    #[serde(rename = "rate")]
    RatingPrompt {
        /// Quest that completed.
        quest_id: QuestId,
        /// Role the recipient is asked to rate.
        role: RatingRole,
        /// Principal to be rated.
        rate_target: EmailAddress,
    },
    /// Free-form informational notice.
    General,
}

impl NotificationKind {
    /// Returns the canonical kind label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Application { .. } => "application",
            Self::Assignment { .. } => "assignment",
            Self::Rejection { .. } => "rejection",
            Self::RatingPrompt { .. } => "rate",
            Self::General => "general",
        }
    }

    /// Returns the referenced quest, if the kind references one.
    ///
    /// The quest may have been deleted since; callers must tolerate the
    /// reference dangling.
    #[must_use]
    pub const fn quest_id(&self) -> Option<QuestId> {
        match self {
            Self::Application { quest_id, .. }
            | Self::Assignment { quest_id }
            | Self::Rejection { quest_id }
            | Self::RatingPrompt { quest_id, .. } => Some(*quest_id),
            Self::General => None,
        }
    }
}

/// Notification aggregate root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    id: NotificationId,
    recipient: EmailAddress,
    message: String,
    kind: NotificationKind,
    read: bool,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedNotificationData {
    /// Persisted notification identifier.
    pub id: NotificationId,
    /// Persisted recipient address.
    pub recipient: EmailAddress,
    /// Persisted human-readable message.
    pub message: String,
    /// Persisted kind payload.
    pub kind: NotificationKind,
    /// Persisted read flag.
    pub read: bool,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Creates a fresh unread notification.
    #[must_use]
    pub fn new(
        recipient: EmailAddress,
        message: impl Into<String>,
        kind: NotificationKind,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            recipient,
            message: message.into(),
            kind,
            read: false,
            created_at: clock.utc(),
        }
    }

    /// Reconstructs a notification from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedNotificationData) -> Self {
        Self {
            id: data.id,
            recipient: data.recipient,
            message: data.message,
            kind: data.kind,
            read: data.read,
            created_at: data.created_at,
        }
    }

    /// Returns the notification identifier.
    #[must_use]
    pub const fn id(&self) -> NotificationId {
        self.id
    }

    /// Returns the recipient address.
    #[must_use]
    pub const fn recipient(&self) -> &EmailAddress {
        &self.recipient
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the kind payload.
    #[must_use]
    pub const fn kind(&self) -> &NotificationKind {
        &self.kind
    }

    /// Returns `true` once the recipient has seen the notification.
    #[must_use]
    pub const fn is_read(&self) -> bool {
        self.read
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Flips the read flag. Idempotent.
    pub fn mark_read(&mut self) {
        self.read = true;
    }
}
