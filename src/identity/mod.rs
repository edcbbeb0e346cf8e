//! Principal identity for Campus Quest.
//!
//! Principals are students identified by institutional email address. The
//! authentication service itself (passwords, sessions, verification mail)
//! is an opaque external collaborator reached through the
//! [`ports::IdentityProvider`] port; this module owns only the validated
//! principal model and the verified-email gate that decides when a signed-in
//! account becomes usable by the rest of the crate. The module follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;
