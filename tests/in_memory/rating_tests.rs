//! Integration tests for rating capture after quest completion.

use crate::helpers::{email, post_quest, world};
use campus_quest::notification::domain::NotificationKind;
use campus_quest::profile::domain::RatingRole;
use campus_quest::quest::services::AssignQuestRequest;

#[tokio::test(flavor = "multi_thread")]
async fn rating_round_trip_appends_and_recomputes_the_average() {
    let ctx = world();
    let runner = email("runner@iitj.ac.in");
    ctx.profiles
        .register(runner.clone(), "runner")
        .await
        .expect("registration should succeed");

    ctx.dispatcher
        .record_rating(&runner, RatingRole::Voyager, 5)
        .await
        .expect("first rating should record");
    ctx.dispatcher
        .record_rating(&runner, RatingRole::Voyager, 4)
        .await
        .expect("second rating should record");

    let profile = ctx
        .profiles
        .find(&runner)
        .await
        .expect("lookup should succeed")
        .expect("profile exists");
    let ratings: Vec<u8> = profile
        .ratings(RatingRole::Voyager)
        .iter()
        .map(|value| value.value())
        .collect();
    assert_eq!(ratings, [5, 4], "new value appended at the end");
    assert_eq!(profile.voyager_average(), 4.5);
    assert_eq!(profile.questmaster_average(), 0.0);
}

#[tokio::test(flavor = "multi_thread")]
async fn completing_a_quest_prompts_both_parties_then_ratings_flow_back() {
    let ctx = world();
    let creator = email("poster@iitj.ac.in");
    let runner = email("runner@iitj.ac.in");
    ctx.profiles
        .register(creator.clone(), "poster")
        .await
        .expect("registration should succeed");
    ctx.profiles
        .register(runner.clone(), "runner")
        .await
        .expect("registration should succeed");

    let quest = post_quest(&ctx, &creator, "Collect courier").await;
    ctx.lifecycle
        .apply(quest.id(), &runner)
        .await
        .expect("application should succeed");
    ctx.lifecycle
        .assign(AssignQuestRequest::new(
            quest.id(),
            creator.clone(),
            runner.clone(),
        ))
        .await
        .expect("assignment should succeed");
    ctx.lifecycle
        .complete(quest.id(), &runner)
        .await
        .expect("completion should succeed");

    // The runner rates the questmaster through their prompt.
    let runner_prompt = ctx
        .dispatcher
        .inbox_for(&runner)
        .await
        .expect("inbox lookup should succeed")
        .into_iter()
        .find(|n| matches!(n.kind(), NotificationKind::RatingPrompt { .. }))
        .expect("runner has a rating prompt");
    let (role, target) = match runner_prompt.kind() {
        NotificationKind::RatingPrompt {
            role, rate_target, ..
        } => (*role, rate_target.clone()),
        _ => panic!("prompt kind checked above"),
    };
    assert_eq!(role, RatingRole::Questmaster);
    assert_eq!(target, creator);

    ctx.dispatcher
        .record_rating(&target, role, 5)
        .await
        .expect("rating should record");
    ctx.dispatcher
        .mark_read(runner_prompt.id())
        .await
        .expect("prompt consumption should succeed");

    let rated = ctx
        .profiles
        .find(&creator)
        .await
        .expect("lookup should succeed")
        .expect("profile exists");
    assert_eq!(rated.questmaster_average(), 5.0);
    assert_eq!(rated.ratings(RatingRole::Questmaster).len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn rating_an_unregistered_principal_reports_not_found() {
    let ctx = world();
    let result = ctx
        .dispatcher
        .record_rating(&email("nobody@iitj.ac.in"), RatingRole::Voyager, 3)
        .await;
    assert!(result.is_err());
}
