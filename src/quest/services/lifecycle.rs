//! Service layer for quest creation, application, assignment, completion,
//! and live views.

use crate::fault::ErrorCategory;
use crate::identity::domain::EmailAddress;
use crate::live::Subscription;
use crate::notification::{
    domain::{NotificationId, NotificationKind},
    ports::NotificationRepository,
    services::NotificationDispatcher,
};
use crate::profile::{
    domain::{ProfileSummary, RatingRole},
    ports::{ProfileRepository, ProfileRepositoryError},
};
use crate::quest::{
    domain::{
        Quest, QuestDescription, QuestDraft, QuestEdit, QuestId, QuestTitle,
        QuestTransitionError, QuestValidationError, Reward, Venue,
    },
    ports::{QuestRepository, QuestRepositoryError},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// How often a conditional write is retried before the service gives up.
const MAX_WRITE_ATTEMPTS: u32 = 5;

/// Request payload for posting a quest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateQuestRequest {
    creator: EmailAddress,
    title: String,
    description: String,
    venue: String,
    reward: u32,
    deadline: DateTime<Utc>,
}

impl CreateQuestRequest {
    /// Creates a request with all posting fields.
    #[must_use]
    pub fn new(
        creator: EmailAddress,
        title: impl Into<String>,
        description: impl Into<String>,
        venue: impl Into<String>,
        reward: u32,
        deadline: DateTime<Utc>,
    ) -> Self {
        Self {
            creator,
            title: title.into(),
            description: description.into(),
            venue: venue.into(),
            reward,
            deadline,
        }
    }
}

/// Request payload for editing a quest's descriptive fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateQuestRequest {
    quest_id: QuestId,
    editor: EmailAddress,
    title: String,
    description: String,
    venue: String,
    reward: u32,
    deadline: DateTime<Utc>,
}

impl UpdateQuestRequest {
    /// Creates a request replacing every descriptive field.
    #[must_use]
    pub fn new(
        quest_id: QuestId,
        editor: EmailAddress,
        title: impl Into<String>,
        description: impl Into<String>,
        venue: impl Into<String>,
        reward: u32,
        deadline: DateTime<Utc>,
    ) -> Self {
        Self {
            quest_id,
            editor,
            title: title.into(),
            description: description.into(),
            venue: venue.into(),
            reward,
            deadline,
        }
    }
}

/// Request payload for assigning a quest to an applicant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignQuestRequest {
    quest_id: QuestId,
    assigner: EmailAddress,
    applicant: EmailAddress,
    triggering_notification: Option<NotificationId>,
}

impl AssignQuestRequest {
    /// Creates an assignment request.
    #[must_use]
    pub const fn new(
        quest_id: QuestId,
        assigner: EmailAddress,
        applicant: EmailAddress,
    ) -> Self {
        Self {
            quest_id,
            assigner,
            applicant,
            triggering_notification: None,
        }
    }

    /// Names the application notification that prompted the assignment, to
    /// be consumed once the assignment commits.
    #[must_use]
    pub const fn with_triggering_notification(mut self, id: NotificationId) -> Self {
        self.triggering_notification = Some(id);
        self
    }
}

/// One open quest augmented with the display facts a listing needs.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenQuestView {
    /// The quest itself.
    pub quest: Quest,
    /// Creator's username, falling back to their email local part.
    pub creator_display: String,
    /// Creator's questmaster rating average, 0.0 when unrated.
    pub creator_questmaster_average: f64,
    /// `true` when the viewer posted this quest.
    pub viewer_is_creator: bool,
    /// `true` when the viewer has already applied.
    pub viewer_has_applied: bool,
}

/// A principal's quest history, both sides of the marketplace.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuestHistory {
    /// Quests the principal posted, newest first, any status.
    pub posted: Vec<Quest>,
    /// Quests assigned to the principal, newest first, any status.
    pub undertaken: Vec<Quest>,
}

/// Service-level errors for quest lifecycle operations.
#[derive(Debug, Error)]
pub enum QuestLifecycleError {
    /// Field validation failed; nothing was written.
    #[error(transparent)]
    Validation(#[from] QuestValidationError),

    /// A state-machine precondition no longer holds.
    #[error(transparent)]
    Conflict(#[from] QuestTransitionError),

    /// The acting principal is not the quest creator.
    #[error("only the quest creator may {action} quest {quest_id}")]
    NotCreator {
        /// Quest the action targeted.
        quest_id: QuestId,
        /// Action that was refused.
        action: &'static str,
    },

    /// The acting principal is not the quest assignee.
    #[error("only the assignee may complete quest {quest_id}")]
    NotAssignee {
        /// Quest the completion targeted.
        quest_id: QuestId,
    },

    /// The quest no longer exists.
    #[error("quest not found: {0}")]
    NotFound(QuestId),

    /// The conditional write kept losing to concurrent writers.
    #[error("quest {quest_id} kept changing underneath us, gave up after {attempts} attempts")]
    Contention {
        /// Quest being written.
        quest_id: QuestId,
        /// Attempts made before giving up.
        attempts: u32,
    },

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] QuestRepositoryError),

    /// Profile lookup behind a listing failed.
    #[error(transparent)]
    Profiles(#[from] ProfileRepositoryError),
}

impl QuestLifecycleError {
    /// Returns the caller-facing category of this failure.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) => ErrorCategory::InvalidInput,
            Self::Conflict(_) => ErrorCategory::Conflict,
            Self::NotCreator { .. } | Self::NotAssignee { .. } => ErrorCategory::NotAllowed,
            Self::NotFound(_) => ErrorCategory::NotFound,
            Self::Contention { .. } => ErrorCategory::Unavailable,
            Self::Repository(err) => match err {
                QuestRepositoryError::DuplicateQuest(_)
                | QuestRepositoryError::VersionConflict { .. } => ErrorCategory::Conflict,
                QuestRepositoryError::NotFound(_) => ErrorCategory::NotFound,
                QuestRepositoryError::Persistence(_) => ErrorCategory::Unavailable,
            },
            Self::Profiles(err) => match err {
                ProfileRepositoryError::DuplicateProfile(_) => ErrorCategory::Conflict,
                ProfileRepositoryError::NotFound(_) => ErrorCategory::NotFound,
                ProfileRepositoryError::Persistence(_) => ErrorCategory::Unavailable,
            },
        }
    }
}

/// Result type for quest lifecycle service operations.
pub type QuestLifecycleResult<T> = Result<T, QuestLifecycleError>;

/// Quest lifecycle orchestration service.
///
/// Validates locally, commits revision-checked conditional writes, and
/// feeds the notification dispatcher as a best-effort side effect of each
/// transition. Transient store failures propagate to the caller untried;
/// only revision conflicts are retried, and only a bounded number of
/// times.
pub struct QuestLifecycleService<Q, N, P, C>
where
    Q: QuestRepository,
    N: NotificationRepository,
    P: ProfileRepository,
    C: Clock + Send + Sync,
{
    quests: Arc<Q>,
    profiles: Arc<P>,
    notifier: NotificationDispatcher<N, P, C>,
    clock: Arc<C>,
}

impl<Q, N, P, C> Clone for QuestLifecycleService<Q, N, P, C>
where
    Q: QuestRepository,
    N: NotificationRepository,
    P: ProfileRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            quests: Arc::clone(&self.quests),
            profiles: Arc::clone(&self.profiles),
            notifier: self.notifier.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<Q, N, P, C> QuestLifecycleService<Q, N, P, C>
where
    Q: QuestRepository + 'static,
    N: NotificationRepository + 'static,
    P: ProfileRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a new quest lifecycle service.
    #[must_use]
    pub const fn new(
        quests: Arc<Q>,
        profiles: Arc<P>,
        notifier: NotificationDispatcher<N, P, C>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            quests,
            profiles,
            notifier,
            clock,
        }
    }

    /// Posts a new quest.
    ///
    /// All fields are validated before anything is written; a rejected
    /// request never partially writes.
    ///
    /// # Errors
    ///
    /// Returns [`QuestLifecycleError::Validation`] naming the first failing
    /// field, or a repository error when the write fails.
    pub async fn create(&self, request: CreateQuestRequest) -> QuestLifecycleResult<Quest> {
        let title = QuestTitle::new(request.title)?;
        let description = QuestDescription::new(request.description)?;
        let venue = Venue::new(request.venue)?;
        let reward = Reward::new(request.reward)?;
        if request.deadline <= self.clock.utc() {
            return Err(QuestValidationError::DeadlineNotInFuture.into());
        }

        let quest = Quest::post(
            QuestDraft {
                creator: request.creator,
                title,
                description,
                venue,
                reward,
                deadline: request.deadline,
            },
            &*self.clock,
        );
        self.quests.insert(&quest).await?;
        Ok(quest)
    }

    /// Applies to an open quest.
    ///
    /// The applicant append is a conditional write: two simultaneous
    /// applications from different principals both land. The quest creator
    /// receives an application notification, best-effort.
    ///
    /// # Errors
    ///
    /// Fails with a conflict for self-application, duplicate application,
    /// or a quest that is no longer open, and with
    /// [`QuestLifecycleError::NotFound`] when the quest does not exist.
    pub async fn apply(
        &self,
        quest_id: QuestId,
        applicant: &EmailAddress,
    ) -> QuestLifecycleResult<Quest> {
        let clock = Arc::clone(&self.clock);
        let by = applicant.clone();
        let quest = self
            .commit_with_retry(quest_id, move |quest| Ok(quest.apply(&by, &*clock)?))
            .await?;

        self.notifier
            .send(
                quest.creator(),
                format!(
                    "{} has applied to your task: \"{}\"",
                    applicant,
                    quest.title()
                ),
                NotificationKind::Application {
                    quest_id,
                    applicant: applicant.clone(),
                },
            )
            .await;
        Ok(quest)
    }

    /// Assigns an open quest to one of its applicants, closing it.
    ///
    /// Side effects, in order, all best-effort and none rolling back the
    /// assignment: the triggering application notification is marked read,
    /// the assignee is congratulated, every other applicant gets a
    /// rejection notice, and the creator gets a confirmation.
    ///
    /// # Errors
    ///
    /// Fails with [`QuestLifecycleError::NotCreator`] when the assigner
    /// did not post the quest, and with a conflict when the quest is no
    /// longer open or the chosen principal never applied.
    pub async fn assign(&self, request: AssignQuestRequest) -> QuestLifecycleResult<Quest> {
        let AssignQuestRequest {
            quest_id,
            assigner,
            applicant,
            triggering_notification,
        } = request;

        let clock = Arc::clone(&self.clock);
        let chosen = applicant.clone();
        let quest = self
            .commit_with_retry(quest_id, move |quest| {
                if quest.creator() != &assigner {
                    return Err(QuestLifecycleError::NotCreator {
                        quest_id,
                        action: "assign",
                    });
                }
                Ok(quest.assign(&chosen, &*clock)?)
            })
            .await?;

        if let Some(notification_id) = triggering_notification {
            if let Err(err) = self.notifier.mark_read(notification_id).await {
                warn!(%notification_id, error = %err, "could not consume triggering notification");
            }
        }

        self.notifier
            .send(
                &applicant,
                format!(
                    "Congratulations! You have been assigned the task: \"{}\". Reward: \u{20b9}{}",
                    quest.title(),
                    quest.reward()
                ),
                NotificationKind::Assignment { quest_id },
            )
            .await;

        for rejected in quest.applicants().iter().filter(|entry| **entry != applicant) {
            self.notifier
                .send(
                    rejected,
                    format!(
                        "The task \"{}\" has been assigned to another applicant.",
                        quest.title()
                    ),
                    NotificationKind::Rejection { quest_id },
                )
                .await;
        }

        self.notifier
            .send(
                quest.creator(),
                format!(
                    "Task \"{}\" has been assigned to {}",
                    quest.title(),
                    applicant
                ),
                NotificationKind::General,
            )
            .await;

        Ok(quest)
    }

    /// Marks an assigned quest done. Only the assignee may complete.
    ///
    /// Both parties receive a rating prompt naming the counterpart and the
    /// role to rate, best-effort. Completing after the deadline is allowed;
    /// lateness is a derived display fact.
    ///
    /// # Errors
    ///
    /// Fails with [`QuestLifecycleError::NotAssignee`] when the caller is
    /// not the assignee and with a conflict when the quest is not in the
    /// assigned state.
    pub async fn complete(
        &self,
        quest_id: QuestId,
        completer: &EmailAddress,
    ) -> QuestLifecycleResult<Quest> {
        let clock = Arc::clone(&self.clock);
        let by = completer.clone();
        let quest = self
            .commit_with_retry(quest_id, move |quest| {
                match quest.assigned_to() {
                    Some(assignee) if assignee == &by => {}
                    Some(_) => return Err(QuestLifecycleError::NotAssignee { quest_id }),
                    None => return Err(QuestTransitionError::NotAssigned(quest_id).into()),
                }
                Ok(quest.complete(&*clock)?)
            })
            .await?;

        if let Some(assignee) = quest.assigned_to() {
            self.notifier
                .send(
                    assignee,
                    format!("Please rate your Questmaster for \"{}\"", quest.title()),
                    NotificationKind::RatingPrompt {
                        quest_id,
                        role: RatingRole::Questmaster,
                        rate_target: quest.creator().clone(),
                    },
                )
                .await;
            self.notifier
                .send(
                    quest.creator(),
                    format!("Please rate the Voyager for \"{}\"", quest.title()),
                    NotificationKind::RatingPrompt {
                        quest_id,
                        role: RatingRole::Voyager,
                        rate_target: assignee.clone(),
                    },
                )
                .await;
        }

        Ok(quest)
    }

    /// Replaces the descriptive fields of a quest. Creator only; rejected
    /// once the quest is completed.
    ///
    /// # Errors
    ///
    /// Fails with validation errors for malformed fields,
    /// [`QuestLifecycleError::NotCreator`] for non-creators, and a
    /// conflict for completed quests.
    pub async fn update_details(
        &self,
        request: UpdateQuestRequest,
    ) -> QuestLifecycleResult<Quest> {
        let UpdateQuestRequest {
            quest_id,
            editor,
            title,
            description,
            venue,
            reward,
            deadline,
        } = request;

        let edit = QuestEdit {
            title: QuestTitle::new(title)?,
            description: QuestDescription::new(description)?,
            venue: Venue::new(venue)?,
            reward: Reward::new(reward)?,
            deadline,
        };
        if deadline <= self.clock.utc() {
            return Err(QuestValidationError::DeadlineNotInFuture.into());
        }

        let clock = Arc::clone(&self.clock);
        self.commit_with_retry(quest_id, move |quest| {
            if quest.creator() != &editor {
                return Err(QuestLifecycleError::NotCreator {
                    quest_id,
                    action: "edit",
                });
            }
            Ok(quest.edit(edit.clone(), &*clock)?)
        })
        .await
    }

    /// Removes a quest. Creator only; completed quests are immutable and
    /// cannot be deleted.
    ///
    /// Notifications referencing the quest are left in place; readers
    /// tolerate the dangling reference.
    ///
    /// # Errors
    ///
    /// Fails with [`QuestLifecycleError::NotCreator`] for non-creators and
    /// a conflict for completed quests.
    pub async fn delete(
        &self,
        quest_id: QuestId,
        requester: &EmailAddress,
    ) -> QuestLifecycleResult<()> {
        let quest = self
            .quests
            .find_by_id(quest_id)
            .await?
            .ok_or(QuestLifecycleError::NotFound(quest_id))?;
        if quest.creator() != requester {
            return Err(QuestLifecycleError::NotCreator {
                quest_id,
                action: "delete",
            });
        }
        quest.ensure_deletable()?;

        match self.quests.delete(quest_id).await {
            Ok(()) | Err(QuestRepositoryError::NotFound(_)) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Returns every open quest, newest first, augmented with creator
    /// display facts and viewer affordance flags.
    ///
    /// Viewer identity never filters the listing; it only fills the
    /// `viewer_*` flags.
    ///
    /// # Errors
    ///
    /// Returns a repository error when a lookup fails.
    pub async fn list_open_for(
        &self,
        viewer: &EmailAddress,
    ) -> QuestLifecycleResult<Vec<OpenQuestView>> {
        build_open_views(self.quests.as_ref(), self.profiles.as_ref(), viewer).await
    }

    /// Returns the viewer's quest history: quests they posted and quests
    /// assigned to them, each newest first, any status.
    ///
    /// # Errors
    ///
    /// Returns a repository error when a lookup fails.
    pub async fn history_for(&self, viewer: &EmailAddress) -> QuestLifecycleResult<QuestHistory> {
        build_history(self.quests.as_ref(), viewer).await
    }

    /// Opens a live view over the open-quest listing.
    ///
    /// The callback receives the full listing immediately and again after
    /// every quest collection change; a quest leaving `open` disappears
    /// without manual refresh. Must be called within a tokio runtime.
    /// Delivery stops when the returned handle is cancelled.
    pub fn watch_open_for<F>(&self, viewer: EmailAddress, mut callback: F) -> Subscription
    where
        F: FnMut(Vec<OpenQuestView>) + Send + 'static,
    {
        let quests = Arc::clone(&self.quests);
        let profiles = Arc::clone(&self.profiles);
        let mut events = self.quests.watch();
        Subscription::spawn(async move {
            loop {
                match build_open_views(quests.as_ref(), profiles.as_ref(), &viewer).await {
                    Ok(views) => callback(views),
                    Err(err) => warn!(error = %err, "open quest view refresh failed"),
                }
                if events.next().await.is_none() {
                    break;
                }
            }
        })
    }

    /// Opens a live view over the viewer's quest history.
    ///
    /// Same delivery contract as [`watch_open_for`].
    ///
    /// [`watch_open_for`]: Self::watch_open_for
    pub fn watch_history_for<F>(&self, viewer: EmailAddress, mut callback: F) -> Subscription
    where
        F: FnMut(QuestHistory) + Send + 'static,
    {
        let quests = Arc::clone(&self.quests);
        let mut events = self.quests.watch();
        Subscription::spawn(async move {
            loop {
                match build_history(quests.as_ref(), &viewer).await {
                    Ok(history) => callback(history),
                    Err(err) => warn!(error = %err, "quest history refresh failed"),
                }
                if events.next().await.is_none() {
                    break;
                }
            }
        })
    }

    /// Fetch-mutate-commit loop around the repository's conditional write.
    ///
    /// The mutation closure validates preconditions against the freshly
    /// read aggregate and fails fast without writing; only a revision
    /// conflict on commit re-enters the loop.
    async fn commit_with_retry<M>(
        &self,
        quest_id: QuestId,
        mut mutate: M,
    ) -> QuestLifecycleResult<Quest>
    where
        M: FnMut(&mut Quest) -> QuestLifecycleResult<()>,
    {
        for _ in 0..MAX_WRITE_ATTEMPTS {
            let mut quest = self
                .quests
                .find_by_id(quest_id)
                .await?
                .ok_or(QuestLifecycleError::NotFound(quest_id))?;
            mutate(&mut quest)?;

            match self.quests.update(&quest).await {
                Ok(stored) => return Ok(stored),
                Err(QuestRepositoryError::VersionConflict { .. }) => {}
                Err(QuestRepositoryError::NotFound(id)) => {
                    return Err(QuestLifecycleError::NotFound(id));
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(QuestLifecycleError::Contention {
            quest_id,
            attempts: MAX_WRITE_ATTEMPTS,
        })
    }
}

async fn build_open_views<Q, P>(
    quests: &Q,
    profiles: &P,
    viewer: &EmailAddress,
) -> QuestLifecycleResult<Vec<OpenQuestView>>
where
    Q: QuestRepository,
    P: ProfileRepository,
{
    let open = quests.list_open().await?;
    let mut views = Vec::with_capacity(open.len());
    for quest in open {
        let summary = profiles
            .find_by_email(quest.creator())
            .await?
            .map_or_else(
                || ProfileSummary::fallback(quest.creator()),
                |profile| ProfileSummary::from_profile(&profile),
            );
        views.push(OpenQuestView {
            viewer_is_creator: quest.creator() == viewer,
            viewer_has_applied: quest.has_applicant(viewer),
            creator_display: summary.display_name,
            creator_questmaster_average: summary.questmaster_average,
            quest,
        });
    }
    Ok(views)
}

async fn build_history<Q>(quests: &Q, viewer: &EmailAddress) -> QuestLifecycleResult<QuestHistory>
where
    Q: QuestRepository,
{
    let posted = quests.list_by_creator(viewer).await?;
    let undertaken = quests.list_by_assignee(viewer).await?;
    Ok(QuestHistory { posted, undertaken })
}
