//! Diesel schema for profile persistence.

diesel::table! {
    /// Profile records keyed by institutional email address.
    profiles (email) {
        /// Principal email address.
        #[max_length = 255]
        email -> Varchar,
        /// Display username.
        #[max_length = 255]
        username -> Varchar,
        /// Questmaster rating sequence as a JSON array of integers.
        questmaster_ratings -> Jsonb,
        /// Voyager rating sequence as a JSON array of integers.
        voyager_ratings -> Jsonb,
        /// Registration timestamp.
        created_at -> Timestamptz,
    }
}
