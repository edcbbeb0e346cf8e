//! Quest aggregate root and lifecycle state machine.

use super::{
    ParseQuestStatusError, QuestDescription, QuestId, QuestTitle, QuestTransitionError, Reward,
    Venue,
};
use crate::identity::domain::EmailAddress;
use chrono::{DateTime, Utc};
use mockable::Clock;

/// Quest lifecycle status.
///
/// Assignment and closure are one transition: `closed` means an applicant
/// has been assigned but the work is not yet done. There is no separate
/// `assigned` status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestStatus {
    /// Accepting applications.
    Open,
    /// Assigned to one applicant, awaiting completion.
    Closed,
    /// Work confirmed done; the record is immutable from here.
    Completed,
}

impl QuestStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Completed => "completed",
        }
    }

    /// Returns `true` when no further transition may leave this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns `true` when the state machine permits the transition.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Open, Self::Closed) | (Self::Closed, Self::Completed)
        )
    }
}

impl std::fmt::Display for QuestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for QuestStatus {
    type Error = ParseQuestStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseQuestStatusError(value.to_owned())),
        }
    }
}

/// Validated input for posting a quest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestDraft {
    /// Principal posting the quest.
    pub creator: EmailAddress,
    /// Quest title.
    pub title: QuestTitle,
    /// Quest description.
    pub description: QuestDescription,
    /// Where the task happens.
    pub venue: Venue,
    /// Reward in whole currency units.
    pub reward: Reward,
    /// When the work is due.
    pub deadline: DateTime<Utc>,
}

/// Validated replacement values for the descriptive fields of a quest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestEdit {
    /// New title.
    pub title: QuestTitle,
    /// New description.
    pub description: QuestDescription,
    /// New venue.
    pub venue: Venue,
    /// New reward.
    pub reward: Reward,
    /// New deadline.
    pub deadline: DateTime<Utc>,
}

/// Quest aggregate root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quest {
    id: QuestId,
    creator: EmailAddress,
    title: QuestTitle,
    description: QuestDescription,
    venue: Venue,
    reward: Reward,
    applicants: Vec<EmailAddress>,
    status: QuestStatus,
    assigned_to: Option<EmailAddress>,
    created_at: DateTime<Utc>,
    deadline: DateTime<Utc>,
    assigned_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
    revision: u64,
}

/// Parameter object for reconstructing a persisted quest aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedQuestData {
    /// Persisted quest identifier.
    pub id: QuestId,
    /// Persisted creator address.
    pub creator: EmailAddress,
    /// Persisted title.
    pub title: QuestTitle,
    /// Persisted description.
    pub description: QuestDescription,
    /// Persisted venue.
    pub venue: Venue,
    /// Persisted reward.
    pub reward: Reward,
    /// Persisted applicant set, in application order.
    pub applicants: Vec<EmailAddress>,
    /// Persisted lifecycle status.
    pub status: QuestStatus,
    /// Persisted assignee, if any.
    pub assigned_to: Option<EmailAddress>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted deadline.
    pub deadline: DateTime<Utc>,
    /// Persisted assignment timestamp, if any.
    pub assigned_at: Option<DateTime<Utc>>,
    /// Persisted completion timestamp, if any.
    pub completed_at: Option<DateTime<Utc>>,
    /// Persisted latest lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
    /// Persisted document revision.
    pub revision: u64,
}

impl Quest {
    /// Posts a new quest from validated draft fields.
    #[must_use]
    pub fn post(draft: QuestDraft, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: QuestId::new(),
            creator: draft.creator,
            title: draft.title,
            description: draft.description,
            venue: draft.venue,
            reward: draft.reward,
            applicants: Vec::new(),
            status: QuestStatus::Open,
            assigned_to: None,
            created_at: timestamp,
            deadline: draft.deadline,
            assigned_at: None,
            completed_at: None,
            updated_at: timestamp,
            revision: 0,
        }
    }

    /// Reconstructs a quest from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedQuestData) -> Self {
        Self {
            id: data.id,
            creator: data.creator,
            title: data.title,
            description: data.description,
            venue: data.venue,
            reward: data.reward,
            applicants: data.applicants,
            status: data.status,
            assigned_to: data.assigned_to,
            created_at: data.created_at,
            deadline: data.deadline,
            assigned_at: data.assigned_at,
            completed_at: data.completed_at,
            updated_at: data.updated_at,
            revision: data.revision,
        }
    }

    /// Returns the quest identifier.
    #[must_use]
    pub const fn id(&self) -> QuestId {
        self.id
    }

    /// Returns the creator's address.
    #[must_use]
    pub const fn creator(&self) -> &EmailAddress {
        &self.creator
    }

    /// Returns the title.
    #[must_use]
    pub const fn title(&self) -> &QuestTitle {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub const fn description(&self) -> &QuestDescription {
        &self.description
    }

    /// Returns the venue.
    #[must_use]
    pub const fn venue(&self) -> &Venue {
        &self.venue
    }

    /// Returns the reward.
    #[must_use]
    pub const fn reward(&self) -> Reward {
        self.reward
    }

    /// Returns the applicants in application order.
    #[must_use]
    pub fn applicants(&self) -> &[EmailAddress] {
        &self.applicants
    }

    /// Returns `true` when the principal has applied.
    #[must_use]
    pub fn has_applicant(&self, applicant: &EmailAddress) -> bool {
        self.applicants.contains(applicant)
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> QuestStatus {
        self.status
    }

    /// Returns the assignee, present exactly while the status is `closed`
    /// or `completed`.
    #[must_use]
    pub const fn assigned_to(&self) -> Option<&EmailAddress> {
        self.assigned_to.as_ref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the deadline.
    #[must_use]
    pub const fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    /// Returns the assignment timestamp, if assigned.
    #[must_use]
    pub const fn assigned_at(&self) -> Option<DateTime<Utc>> {
        self.assigned_at
    }

    /// Returns the completion timestamp, if completed.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the latest lifecycle timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the document revision this aggregate was read at.
    ///
    /// Conditional writes name this revision; the store rejects the write
    /// when the stored revision has moved on.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns a copy of this aggregate at the given revision.
    ///
    /// Used by store adapters when committing a conditional write.
    #[must_use]
    pub fn with_revision(mut self, revision: u64) -> Self {
        self.revision = revision;
        self
    }

    /// Returns `true` when the quest completed after its deadline.
    ///
    /// A derived display fact; lateness never blocks completion.
    #[must_use]
    pub fn completed_late(&self) -> bool {
        self.completed_at
            .is_some_and(|completed_at| completed_at > self.deadline)
    }

    /// Records an application.
    ///
    /// # Errors
    ///
    /// Fails when the quest is not open, the applicant is the creator, or
    /// the applicant has already applied. The aggregate is unchanged on
    /// failure.
    pub fn apply(
        &mut self,
        applicant: &EmailAddress,
        clock: &impl Clock,
    ) -> Result<(), QuestTransitionError> {
        if self.status != QuestStatus::Open {
            return Err(QuestTransitionError::NotAcceptingApplications {
                quest_id: self.id,
                status: self.status,
            });
        }
        if applicant == &self.creator {
            return Err(QuestTransitionError::SelfApplication(self.id));
        }
        if self.has_applicant(applicant) {
            return Err(QuestTransitionError::DuplicateApplication {
                quest_id: self.id,
                applicant: applicant.clone(),
            });
        }

        self.applicants.push(applicant.clone());
        self.touch(clock);
        Ok(())
    }

    /// Assigns the quest to one of its applicants, closing it.
    ///
    /// # Errors
    ///
    /// Fails when the quest is not open or the principal never applied.
    /// The aggregate is unchanged on failure.
    pub fn assign(
        &mut self,
        applicant: &EmailAddress,
        clock: &impl Clock,
    ) -> Result<(), QuestTransitionError> {
        match self.status {
            QuestStatus::Open => {}
            QuestStatus::Closed => return Err(QuestTransitionError::AlreadyAssigned(self.id)),
            QuestStatus::Completed => return Err(QuestTransitionError::AlreadyCompleted(self.id)),
        }
        if !self.has_applicant(applicant) {
            return Err(QuestTransitionError::NotAnApplicant {
                quest_id: self.id,
                applicant: applicant.clone(),
            });
        }

        self.status = QuestStatus::Closed;
        self.assigned_to = Some(applicant.clone());
        self.assigned_at = Some(clock.utc());
        self.touch(clock);
        Ok(())
    }

    /// Marks the assigned work done, completing the quest.
    ///
    /// # Errors
    ///
    /// Fails when the quest has no assignee yet or is already completed.
    /// The aggregate is unchanged on failure.
    pub fn complete(&mut self, clock: &impl Clock) -> Result<(), QuestTransitionError> {
        match self.status {
            QuestStatus::Closed => {}
            QuestStatus::Open => return Err(QuestTransitionError::NotAssigned(self.id)),
            QuestStatus::Completed => return Err(QuestTransitionError::AlreadyCompleted(self.id)),
        }

        self.status = QuestStatus::Completed;
        self.completed_at = Some(clock.utc());
        self.touch(clock);
        Ok(())
    }

    /// Replaces the descriptive fields.
    ///
    /// # Errors
    ///
    /// Fails once the quest is completed; completed records are immutable.
    pub fn edit(
        &mut self,
        changes: QuestEdit,
        clock: &impl Clock,
    ) -> Result<(), QuestTransitionError> {
        if self.status == QuestStatus::Completed {
            return Err(QuestTransitionError::AlreadyCompleted(self.id));
        }

        self.title = changes.title;
        self.description = changes.description;
        self.venue = changes.venue;
        self.reward = changes.reward;
        self.deadline = changes.deadline;
        self.touch(clock);
        Ok(())
    }

    /// Checks that the quest may still be deleted.
    ///
    /// # Errors
    ///
    /// Fails once the quest is completed.
    pub const fn ensure_deletable(&self) -> Result<(), QuestTransitionError> {
        if self.status.is_terminal() {
            return Err(QuestTransitionError::AlreadyCompleted(self.id));
        }
        Ok(())
    }

    /// Updates the `updated_at` timestamp to the current clock time.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
