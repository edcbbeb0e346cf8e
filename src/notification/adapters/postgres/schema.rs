//! Diesel schema for notification persistence.

diesel::table! {
    /// Notification records owned by their recipient.
    notifications (id) {
        /// Notification identifier.
        id -> Uuid,
        /// Recipient email address.
        #[max_length = 255]
        recipient -> Varchar,
        /// Human-readable message.
        message -> Text,
        /// Kind payload as tagged JSON.
        kind -> Jsonb,
        /// Read flag.
        read -> Bool,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}
