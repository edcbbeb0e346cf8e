//! Integration tests for the quest lifecycle state machine.

use crate::helpers::{email, post_quest, world};
use campus_quest::notification::domain::NotificationKind;
use campus_quest::profile::domain::RatingRole;
use campus_quest::quest::{
    domain::{Quest, QuestStatus, QuestTransitionError},
    services::{AssignQuestRequest, QuestLifecycleError},
};

#[tokio::test(flavor = "multi_thread")]
async fn happy_path_from_posting_to_mutual_rating_prompts() {
    let ctx = world();
    let creator = email("poster@iitj.ac.in");
    let runner = email("runner@iitj.ac.in");

    // Post.
    let quest = post_quest(&ctx, &creator, "Collect courier").await;
    assert_eq!(quest.status(), QuestStatus::Open);
    assert_eq!(quest.reward().value(), 50);

    // Apply.
    let applied = ctx
        .lifecycle
        .apply(quest.id(), &runner)
        .await
        .expect("application should succeed");
    assert_eq!(applied.applicants(), [runner.clone()]);

    let creator_inbox = ctx
        .dispatcher
        .inbox_for(&creator)
        .await
        .expect("inbox lookup should succeed");
    let application = creator_inbox
        .iter()
        .find(|notification| {
            matches!(notification.kind(), NotificationKind::Application { .. })
        })
        .expect("creator should be told about the application");
    assert_eq!(
        application.kind().quest_id(),
        Some(quest.id()),
        "application notification should reference the quest"
    );

    // Assign, consuming the application notification.
    let assigned = ctx
        .lifecycle
        .assign(
            AssignQuestRequest::new(quest.id(), creator.clone(), runner.clone())
                .with_triggering_notification(application.id()),
        )
        .await
        .expect("assignment should succeed");
    assert_eq!(assigned.status(), QuestStatus::Closed);
    assert_eq!(assigned.assigned_to(), Some(&runner));
    assert!(assigned.assigned_at().is_some());

    let consumed = ctx
        .dispatcher
        .inbox_for(&creator)
        .await
        .expect("inbox lookup should succeed")
        .into_iter()
        .find(|notification| notification.id() == application.id())
        .expect("triggering notification should still exist");
    assert!(consumed.is_read(), "triggering notification is consumed");

    let runner_inbox = ctx
        .dispatcher
        .inbox_for(&runner)
        .await
        .expect("inbox lookup should succeed");
    assert!(
        runner_inbox
            .iter()
            .any(|n| matches!(n.kind(), NotificationKind::Assignment { .. })),
        "assignee should be congratulated"
    );

    // Complete.
    let completed = ctx
        .lifecycle
        .complete(quest.id(), &runner)
        .await
        .expect("completion should succeed");
    assert_eq!(completed.status(), QuestStatus::Completed);
    assert!(completed.completed_at().is_some());

    let runner_prompt = ctx
        .dispatcher
        .inbox_for(&runner)
        .await
        .expect("inbox lookup should succeed")
        .into_iter()
        .find_map(|n| match n.kind() {
            NotificationKind::RatingPrompt {
                role, rate_target, ..
            } => Some((*role, rate_target.clone())),
            _ => None,
        })
        .expect("assignee should be prompted to rate");
    assert_eq!(runner_prompt, (RatingRole::Questmaster, creator.clone()));

    let creator_prompt = ctx
        .dispatcher
        .inbox_for(&creator)
        .await
        .expect("inbox lookup should succeed")
        .into_iter()
        .find_map(|n| match n.kind() {
            NotificationKind::RatingPrompt {
                role, rate_target, ..
            } => Some((*role, rate_target.clone())),
            _ => None,
        })
        .expect("creator should be prompted to rate");
    assert_eq!(creator_prompt, (RatingRole::Voyager, runner));
}

#[tokio::test(flavor = "multi_thread")]
async fn self_application_always_conflicts() {
    let ctx = world();
    let creator = email("poster@iitj.ac.in");
    let quest = post_quest(&ctx, &creator, "Collect courier").await;

    let result = ctx.lifecycle.apply(quest.id(), &creator).await;

    assert!(matches!(
        result,
        Err(QuestLifecycleError::Conflict(
            QuestTransitionError::SelfApplication(_)
        ))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn second_application_conflicts_and_first_survives() {
    let ctx = world();
    let creator = email("poster@iitj.ac.in");
    let runner = email("runner@iitj.ac.in");
    let quest = post_quest(&ctx, &creator, "Collect courier").await;

    ctx.lifecycle
        .apply(quest.id(), &runner)
        .await
        .expect("first application should succeed");
    let result = ctx.lifecycle.apply(quest.id(), &runner).await;

    assert!(matches!(
        result,
        Err(QuestLifecycleError::Conflict(
            QuestTransitionError::DuplicateApplication { .. }
        ))
    ));
    let stored = ctx
        .quests
        .find_by_id(quest.id())
        .await
        .expect("lookup should succeed")
        .expect("quest should exist");
    assert_eq!(stored.applicants(), [runner]);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_applications_both_land() {
    let ctx = world();
    let creator = email("poster@iitj.ac.in");
    let first = email("first@iitj.ac.in");
    let second = email("second@iitj.ac.in");
    let quest = post_quest(&ctx, &creator, "Collect courier").await;

    let (left, right) = tokio::join!(
        ctx.lifecycle.apply(quest.id(), &first),
        ctx.lifecycle.apply(quest.id(), &second),
    );
    left.expect("first concurrent application should succeed");
    right.expect("second concurrent application should succeed");

    let stored = ctx
        .quests
        .find_by_id(quest.id())
        .await
        .expect("lookup should succeed")
        .expect("quest should exist");
    assert_eq!(stored.applicants().len(), 2, "no application may be lost");
    assert!(stored.has_applicant(&first));
    assert!(stored.has_applicant(&second));

    let applications = ctx
        .dispatcher
        .inbox_for(&creator)
        .await
        .expect("inbox lookup should succeed")
        .into_iter()
        .filter(|n| matches!(n.kind(), NotificationKind::Application { .. }))
        .count();
    assert_eq!(applications, 2, "one notification per application");
}

#[tokio::test(flavor = "multi_thread")]
async fn double_assignment_conflicts_and_keeps_the_first_assignee() {
    let ctx = world();
    let creator = email("poster@iitj.ac.in");
    let first = email("first@iitj.ac.in");
    let second = email("second@iitj.ac.in");
    let quest = post_quest(&ctx, &creator, "Collect courier").await;
    ctx.lifecycle
        .apply(quest.id(), &first)
        .await
        .expect("application should succeed");
    ctx.lifecycle
        .apply(quest.id(), &second)
        .await
        .expect("application should succeed");

    ctx.lifecycle
        .assign(AssignQuestRequest::new(
            quest.id(),
            creator.clone(),
            first.clone(),
        ))
        .await
        .expect("first assignment should succeed");

    let result = ctx
        .lifecycle
        .assign(AssignQuestRequest::new(
            quest.id(),
            creator.clone(),
            second,
        ))
        .await;

    assert!(matches!(
        result,
        Err(QuestLifecycleError::Conflict(
            QuestTransitionError::AlreadyAssigned(_)
        ))
    ));
    let stored = ctx
        .quests
        .find_by_id(quest.id())
        .await
        .expect("lookup should succeed")
        .expect("quest should exist");
    assert_eq!(stored.assigned_to(), Some(&first));
}

#[tokio::test(flavor = "multi_thread")]
async fn assigning_a_non_applicant_conflicts() {
    let ctx = world();
    let creator = email("poster@iitj.ac.in");
    let quest = post_quest(&ctx, &creator, "Collect courier").await;

    let result = ctx
        .lifecycle
        .assign(AssignQuestRequest::new(
            quest.id(),
            creator,
            email("stranger@iitj.ac.in"),
        ))
        .await;

    assert!(matches!(
        result,
        Err(QuestLifecycleError::Conflict(
            QuestTransitionError::NotAnApplicant { .. }
        ))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_quest_leaves_its_notifications_orphaned_but_readable() {
    let ctx = world();
    let creator = email("poster@iitj.ac.in");
    let runner = email("runner@iitj.ac.in");
    let quest = post_quest(&ctx, &creator, "Collect courier").await;
    ctx.lifecycle
        .apply(quest.id(), &runner)
        .await
        .expect("application should succeed");

    ctx.lifecycle
        .delete(quest.id(), &creator)
        .await
        .expect("creator deletion should succeed");

    let inbox = ctx
        .dispatcher
        .inbox_for(&creator)
        .await
        .expect("inbox lookup should succeed");
    let orphan = inbox
        .iter()
        .find(|n| matches!(n.kind(), NotificationKind::Application { .. }))
        .expect("application notification should survive the quest");
    assert_eq!(orphan.kind().quest_id(), Some(quest.id()));
    assert!(
        ctx.quests
            .find_by_id(quest.id())
            .await
            .expect("lookup should succeed")
            .is_none(),
        "the referenced quest is gone"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn open_listing_resolves_creator_display_and_average() {
    let ctx = world();
    let creator = email("b23cs1234@iitj.ac.in");
    let viewer = email("viewer@iitj.ac.in");
    ctx.profiles
        .register(creator.clone(), "questfan")
        .await
        .expect("registration should succeed");
    let quest = post_quest(&ctx, &creator, "Collect courier").await;
    ctx.dispatcher
        .record_rating(&creator, RatingRole::Questmaster, 4)
        .await
        .expect("rating should record");

    let listing = ctx
        .lifecycle
        .list_open_for(&viewer)
        .await
        .expect("listing should succeed");

    let entry = listing
        .iter()
        .find(|view| view.quest.id() == quest.id())
        .expect("quest should be listed while open");
    assert_eq!(entry.creator_display, "questfan");
    assert_eq!(entry.creator_questmaster_average, 4.0);
    assert!(!entry.viewer_is_creator);
    assert!(!entry.viewer_has_applied);
}

#[tokio::test(flavor = "multi_thread")]
async fn unregistered_creators_fall_back_to_their_email_local_part() {
    let ctx = world();
    let creator = email("ghostwriter@iitj.ac.in");
    post_quest(&ctx, &creator, "Collect courier").await;

    let listing = ctx
        .lifecycle
        .list_open_for(&creator)
        .await
        .expect("listing should succeed");

    let entry = listing.first().expect("quest should be listed");
    assert_eq!(entry.creator_display, "ghostwriter");
    assert_eq!(entry.creator_questmaster_average, 0.0);
    assert!(entry.viewer_is_creator);
}

#[tokio::test(flavor = "multi_thread")]
async fn history_splits_posted_and_undertaken() {
    let ctx = world();
    let poster = email("poster@iitj.ac.in");
    let runner = email("runner@iitj.ac.in");

    let posted = post_quest(&ctx, &poster, "Posted by me").await;
    let undertaken = post_quest(&ctx, &runner, "Posted by them").await;
    ctx.lifecycle
        .apply(undertaken.id(), &poster)
        .await
        .expect("application should succeed");
    ctx.lifecycle
        .assign(AssignQuestRequest::new(
            undertaken.id(),
            runner.clone(),
            poster.clone(),
        ))
        .await
        .expect("assignment should succeed");

    let history = ctx
        .lifecycle
        .history_for(&poster)
        .await
        .expect("history should succeed");

    assert_eq!(history.posted.len(), 1);
    assert_eq!(history.posted.first().map(Quest::id), Some(posted.id()));
    assert_eq!(history.undertaken.len(), 1);
    assert_eq!(
        history.undertaken.first().map(Quest::id),
        Some(undertaken.id())
    );
}
