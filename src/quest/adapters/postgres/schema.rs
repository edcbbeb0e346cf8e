//! Diesel schema for quest persistence.

diesel::table! {
    /// Quest records with lifecycle status and applicant set.
    quests (id) {
        /// Quest identifier.
        id -> Uuid,
        /// Creator email address.
        #[max_length = 255]
        creator -> Varchar,
        /// Quest title.
        #[max_length = 100]
        title -> Varchar,
        /// Quest description.
        #[max_length = 500]
        description -> Varchar,
        /// Venue free text.
        #[max_length = 255]
        venue -> Varchar,
        /// Reward in whole currency units.
        reward -> Int4,
        /// Applicant email addresses as a JSON array, in application order.
        applicants -> Jsonb,
        /// Lifecycle status.
        #[max_length = 20]
        status -> Varchar,
        /// Assignee email address, set while closed or completed.
        #[max_length = 255]
        assigned_to -> Nullable<Varchar>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Deadline.
        deadline -> Timestamptz,
        /// Assignment timestamp.
        assigned_at -> Nullable<Timestamptz>,
        /// Completion timestamp.
        completed_at -> Nullable<Timestamptz>,
        /// Last lifecycle timestamp.
        updated_at -> Timestamptz,
        /// Document revision for conditional writes.
        revision -> Int8,
    }
}
