//! Notifications for Campus Quest.
//!
//! Notifications are advisory event records derived from quest lifecycle
//! transitions: they prompt the creator to assign an applicant, tell
//! applicants the outcome, and ask both parties for a rating after
//! completion. Delivery is best-effort and never transactionally linked to
//! the transition that produced it. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
