//! Integration tests for notification fan-out and bulk inbox clearing.

use crate::helpers::{email, post_quest, world};
use campus_quest::notification::{domain::NotificationKind, ports::MAX_MUTATION_BATCH};
use campus_quest::quest::services::AssignQuestRequest;

#[tokio::test(flavor = "multi_thread")]
async fn assignment_fans_out_to_every_party() {
    let ctx = world();
    let creator = email("poster@iitj.ac.in");
    let winner = email("winner@iitj.ac.in");
    let losers = [
        email("second@iitj.ac.in"),
        email("third@iitj.ac.in"),
    ];
    let quest = post_quest(&ctx, &creator, "Collect courier").await;
    ctx.lifecycle
        .apply(quest.id(), &winner)
        .await
        .expect("application should succeed");
    for loser in &losers {
        ctx.lifecycle
            .apply(quest.id(), loser)
            .await
            .expect("application should succeed");
    }

    ctx.lifecycle
        .assign(AssignQuestRequest::new(
            quest.id(),
            creator.clone(),
            winner.clone(),
        ))
        .await
        .expect("assignment should succeed");

    let winner_inbox = ctx
        .dispatcher
        .inbox_for(&winner)
        .await
        .expect("inbox lookup should succeed");
    assert!(
        winner_inbox
            .iter()
            .any(|n| matches!(n.kind(), NotificationKind::Assignment { .. })),
        "winner gets an assignment notification"
    );
    assert!(
        !winner_inbox
            .iter()
            .any(|n| matches!(n.kind(), NotificationKind::Rejection { .. })),
        "winner never gets a rejection"
    );

    for loser in &losers {
        let inbox = ctx
            .dispatcher
            .inbox_for(loser)
            .await
            .expect("inbox lookup should succeed");
        assert!(
            inbox
                .iter()
                .any(|n| matches!(n.kind(), NotificationKind::Rejection { .. })),
            "every other applicant gets a rejection"
        );
    }

    let confirmation = ctx
        .dispatcher
        .inbox_for(&creator)
        .await
        .expect("inbox lookup should succeed")
        .into_iter()
        .filter(|n| matches!(n.kind(), NotificationKind::General))
        .count();
    assert_eq!(confirmation, 1, "creator gets one confirmation");
}

#[tokio::test(flavor = "multi_thread")]
async fn assignment_messages_carry_the_quest_facts() {
    let ctx = world();
    let creator = email("poster@iitj.ac.in");
    let winner = email("winner@iitj.ac.in");
    let quest = post_quest(&ctx, &creator, "Collect courier").await;
    ctx.lifecycle
        .apply(quest.id(), &winner)
        .await
        .expect("application should succeed");
    ctx.lifecycle
        .assign(AssignQuestRequest::new(
            quest.id(),
            creator,
            winner.clone(),
        ))
        .await
        .expect("assignment should succeed");

    let assignment = ctx
        .dispatcher
        .inbox_for(&winner)
        .await
        .expect("inbox lookup should succeed")
        .into_iter()
        .find(|n| matches!(n.kind(), NotificationKind::Assignment { .. }))
        .expect("assignment notification exists");
    assert!(assignment.message().contains("Collect courier"));
    assert!(assignment.message().contains("\u{20b9}50"));
}

#[tokio::test(flavor = "multi_thread")]
async fn clear_all_removes_inboxes_larger_than_one_batch() {
    let ctx = world();
    let recipient = email("hoarder@iitj.ac.in");
    let total = (MAX_MUTATION_BATCH * 2) + 200;
    for _ in 0..total {
        ctx.dispatcher
            .send(&recipient, "ping", NotificationKind::General)
            .await
            .expect("delivery should succeed");
    }

    let removed = ctx
        .dispatcher
        .clear_all(&recipient)
        .await
        .expect("clear should succeed");

    assert_eq!(removed, total);
    assert!(
        ctx.dispatcher
            .inbox_for(&recipient)
            .await
            .expect("inbox lookup should succeed")
            .is_empty()
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn clear_all_of_an_empty_inbox_removes_nothing() {
    let ctx = world();
    let removed = ctx
        .dispatcher
        .clear_all(&email("nobody@iitj.ac.in"))
        .await
        .expect("clear should succeed");
    assert_eq!(removed, 0);
}
