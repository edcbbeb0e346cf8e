//! Application services for notification dispatch and inbox bookkeeping.

mod dispatcher;

pub use dispatcher::{DispatchError, DispatchResult, NotificationDispatcher};
