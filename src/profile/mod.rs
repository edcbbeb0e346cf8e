//! User profiles for Campus Quest.
//!
//! Every principal has one profile document: a display username and two
//! rating sequences, one per marketplace role (questmaster when posting,
//! voyager when undertaking). Registration is restricted to the
//! institution's email domain. The module follows hexagonal architecture:
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
