//! Integration tests for live views and subscription teardown.

use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::timeout;

use crate::helpers::{email, post_quest, world};
use campus_quest::identity::{
    adapters::memory::InMemoryIdentityProvider,
    domain::Principal,
    ports::{AuthEvent, IdentityProvider},
};
use campus_quest::live::SubscriptionSet;
use campus_quest::notification::domain::NotificationKind;
use campus_quest::quest::services::AssignQuestRequest;

const SNAPSHOT_DEADLINE: Duration = Duration::from_secs(5);

async fn wait_until<T, F>(rx: &mut UnboundedReceiver<T>, condition: F) -> T
where
    F: Fn(&T) -> bool,
{
    loop {
        let snapshot = timeout(SNAPSHOT_DEADLINE, rx.recv())
            .await
            .expect("snapshot should arrive before the deadline")
            .expect("view should still be delivering");
        if condition(&snapshot) {
            return snapshot;
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn open_listing_live_view_re_derives_membership() {
    let ctx = world();
    let creator = email("poster@iitj.ac.in");
    let runner = email("runner@iitj.ac.in");
    let viewer = email("viewer@iitj.ac.in");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = ctx.lifecycle.watch_open_for(viewer, move |views| {
        let _ = tx.send(views);
    });

    // Initial snapshot arrives without any mutation.
    wait_until(&mut rx, |views| views.is_empty()).await;

    let quest = post_quest(&ctx, &creator, "Collect courier").await;
    let listed = wait_until(&mut rx, |views| {
        views.iter().any(|view| view.quest.id() == quest.id())
    })
    .await;
    assert!(listed.iter().all(|view| !view.viewer_is_creator));

    // Assignment closes the quest; it must vanish without a manual refresh.
    ctx.lifecycle
        .apply(quest.id(), &runner)
        .await
        .expect("application should succeed");
    ctx.lifecycle
        .assign(AssignQuestRequest::new(quest.id(), creator, runner))
        .await
        .expect("assignment should succeed");
    wait_until(&mut rx, |views| {
        views.iter().all(|view| view.quest.id() != quest.id())
    })
    .await;

    assert!(subscription.is_active());
    subscription.cancel();
}

#[tokio::test(flavor = "multi_thread")]
async fn cancelled_views_stop_delivering() {
    let ctx = world();
    let viewer = email("viewer@iitj.ac.in");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = ctx.lifecycle.watch_open_for(viewer, move |views| {
        let _ = tx.send(views);
    });
    wait_until(&mut rx, |_| true).await;

    subscription.cancel();

    // The aborted forwarder drops its sender; once drained, the channel
    // closes instead of carrying further snapshots.
    let drained = timeout(SNAPSHOT_DEADLINE, async {
        while rx.recv().await.is_some() {}
    })
    .await;
    assert!(drained.is_ok(), "channel should close after cancellation");

    post_quest(&ctx, &email("poster@iitj.ac.in"), "Unwatched quest").await;
    assert!(rx.recv().await.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn inbox_live_view_tracks_only_its_recipient() {
    let ctx = world();
    let watcher = email("watcher@iitj.ac.in");
    let other = email("other@iitj.ac.in");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = ctx.dispatcher.watch_inbox(watcher.clone(), move |inbox| {
        let _ = tx.send(inbox);
    });
    wait_until(&mut rx, Vec::is_empty).await;

    ctx.dispatcher
        .send(&watcher, "first ping", NotificationKind::General)
        .await
        .expect("delivery should succeed");
    wait_until(&mut rx, |inbox| inbox.len() == 1).await;

    ctx.dispatcher
        .send(&other, "not for the watcher", NotificationKind::General)
        .await
        .expect("delivery should succeed");
    ctx.dispatcher
        .send(&watcher, "second ping", NotificationKind::General)
        .await
        .expect("delivery should succeed");

    let inbox = wait_until(&mut rx, |inbox| inbox.len() == 2).await;
    assert!(
        inbox
            .iter()
            .all(|notification| notification.recipient() == &watcher),
        "snapshots never leak another recipient's notifications"
    );

    subscription.cancel();
}

#[tokio::test(flavor = "multi_thread")]
async fn sign_out_tears_down_the_session_subscriptions() {
    let ctx = world();
    let provider = InMemoryIdentityProvider::new();
    let mut auth_events = provider.watch();
    let account = email("b23cs1234@iitj.ac.in");

    provider
        .sign_in(Principal::new(account.clone(), true))
        .expect("verified sign-in should succeed");
    let signed_in = timeout(SNAPSHOT_DEADLINE, auth_events.next())
        .await
        .expect("auth event should arrive");
    assert_eq!(signed_in, Some(AuthEvent::SignedIn(Principal::new(account.clone(), true))));

    // UI wiring opens the session's live views and parks their handles in
    // one owned set instead of module-level globals.
    let (quests_tx, mut quests_rx) = mpsc::unbounded_channel();
    let (inbox_tx, mut inbox_rx) = mpsc::unbounded_channel();
    let mut session = SubscriptionSet::new();
    session.insert(ctx.lifecycle.watch_open_for(account.clone(), move |views| {
        let _ = quests_tx.send(views);
    }));
    session.insert(ctx.dispatcher.watch_inbox(account.clone(), move |inbox| {
        let _ = inbox_tx.send(inbox);
    }));
    wait_until(&mut quests_rx, |_| true).await;
    wait_until(&mut inbox_rx, |_| true).await;
    assert_eq!(session.len(), 2);

    provider.sign_out().expect("sign-out should succeed");
    let signed_out = timeout(SNAPSHOT_DEADLINE, auth_events.next())
        .await
        .expect("auth event should arrive");
    assert_eq!(signed_out, Some(AuthEvent::SignedOut));

    session.cancel_all();
    assert!(session.is_empty());

    let quests_closed = timeout(SNAPSHOT_DEADLINE, async {
        while quests_rx.recv().await.is_some() {}
    })
    .await;
    let inbox_closed = timeout(SNAPSHOT_DEADLINE, async {
        while inbox_rx.recv().await.is_some() {}
    })
    .await;
    assert!(quests_closed.is_ok());
    assert!(inbox_closed.is_ok());
}
