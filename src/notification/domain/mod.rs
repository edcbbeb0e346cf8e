//! Domain model for notification records.

mod notification;

pub use notification::{
    Notification, NotificationId, NotificationKind, PersistedNotificationData,
};
