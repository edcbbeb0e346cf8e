//! Change feeds and cancellable subscriptions for live views.
//!
//! The external document store pushes change events; this module provides
//! the in-process plumbing that adapters use to re-publish those events and
//! that services use to drive live view refreshes. Events are informational
//! only: subscribers re-derive their snapshot from the authoritative store
//! on every event rather than patching local state.
//!
//! Subscription handles are owned values returned to whichever component
//! opened the view. Cancellation is explicit: the component that opened a
//! view calls [`Subscription::cancel`] when the view is torn down (for
//! example on sign-out), which stops all further delivery.

use std::fmt::Debug;
use std::future::Future;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Maximum number of change events buffered per feed. Slow subscribers
/// that fall further behind skip ahead and re-derive from the store.
const EVENT_BUFFER_SIZE: usize = 100;

/// Broadcast publisher for store change events.
///
/// Adapters hold one feed per collection and publish an event after every
/// committed mutation. Publishing never blocks and never fails: with no
/// subscribers the event is dropped.
#[derive(Debug, Clone)]
pub struct ChangeFeed<E> {
    tx: broadcast::Sender<E>,
}

impl<E> ChangeFeed<E>
where
    E: Clone + Debug + Send + 'static,
{
    /// Creates a feed with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self { tx }
    }

    /// Publishes an event to all current subscribers.
    pub fn publish(&self, event: E) {
        match self.tx.send(event) {
            Ok(receivers) => debug!(receivers, "published change event"),
            Err(broadcast::error::SendError(dropped)) => {
                debug!(event = ?dropped, "no subscribers for change event");
            }
        }
    }

    /// Opens a stream over all future events.
    #[must_use]
    pub fn subscribe(&self) -> EventStream<E> {
        EventStream {
            rx: self.tx.subscribe(),
        }
    }
}

impl<E> Default for ChangeFeed<E>
where
    E: Clone + Debug + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of a [`ChangeFeed`].
#[derive(Debug)]
pub struct EventStream<E> {
    rx: broadcast::Receiver<E>,
}

impl<E> EventStream<E>
where
    E: Clone + Debug + Send + 'static,
{
    /// Waits for the next event.
    ///
    /// Returns `None` once the publishing side has gone away. A lagged
    /// stream (more than the buffer size of unobserved events) skips the
    /// missed events and keeps going; callers re-derive full snapshots, so
    /// a skipped event at most coalesces two refreshes into one.
    pub async fn next(&mut self) -> Option<E> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event stream lagged, skipping ahead");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Cancellation handle for a live view.
///
/// Returned by every `watch_*` operation. Dropping the handle leaves the
/// view running; delivery stops only when [`Subscription::cancel`] is
/// called, mirroring the contract that view teardown is the opener's
/// responsibility.
#[derive(Debug)]
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    /// Spawns the forwarding task behind a live view.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            task: tokio::spawn(future),
        }
    }

    /// Stops the view. No callback is invoked after this returns.
    pub fn cancel(self) {
        self.task.abort();
    }

    /// Returns `true` while the view is still delivering.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

/// Owner for the subscriptions of one signed-in session.
///
/// UI wiring holds one set per session and cancels everything in it on
/// sign-out, replacing the ambient module-level unsubscribe globals of the
/// historical client.
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
        }
    }

    /// Adds a subscription to the set.
    pub fn insert(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    /// Returns the number of held subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Returns `true` when the set holds no subscriptions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Cancels and discards every held subscription.
    pub fn cancel_all(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.cancel();
        }
    }
}
