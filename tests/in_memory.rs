//! In-memory integration suites for the marketplace core.
//!
//! Every suite drives the public services against the in-memory store
//! adapters, which carry the reference semantics of the external document
//! store (conditional writes, batched deletes, change feeds).

mod helpers;

mod live_view_tests;
mod notification_flow_tests;
mod quest_lifecycle_tests;
mod rating_tests;
