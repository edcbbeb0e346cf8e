//! Application services for profile management.

mod directory;

pub use directory::{ProfileService, ProfileServiceError, ProfileServiceResult, DEFAULT_INSTITUTION_DOMAIN};
