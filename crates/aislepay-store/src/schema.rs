//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Escrow account records, keyed by `escrow_id`.
    pub const ESCROWS: &str = "escrows";

    /// Unique index enforcing one escrow per booking, keyed by
    /// `booking_id`. Value is the owning `escrow_id` (16 bytes).
    pub const ESCROWS_BY_BOOKING: &str = "escrows_by_booking";

    /// Index: escrows by participant, keyed by `user_id || escrow_id`.
    /// Written for both the payer and the vendor. Value is empty.
    pub const ESCROWS_BY_PARTICIPANT: &str = "escrows_by_participant";

    /// Ledger transactions, keyed by `transaction_id` (ULID).
    pub const TRANSACTIONS: &str = "transactions";

    /// Index: transactions by escrow, keyed by
    /// `escrow_id || transaction_id`. Value is empty (index only).
    pub const TRANSACTIONS_BY_ESCROW: &str = "transactions_by_escrow";

    /// Booking records, keyed by `booking_id`.
    pub const BOOKINGS: &str = "bookings";

    /// Gateway payment records, keyed by the gateway payment id string.
    pub const PAYMENTS: &str = "payments";

    /// Notifications, keyed by `user_id || notification_id` so one prefix
    /// scan lists a user's notifications in time order.
    pub const NOTIFICATIONS: &str = "notifications";

    /// Processed webhook deliveries for idempotency, keyed by event id.
    pub const WEBHOOK_EVENTS: &str = "webhook_events";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::ESCROWS,
        cf::ESCROWS_BY_BOOKING,
        cf::ESCROWS_BY_PARTICIPANT,
        cf::TRANSACTIONS,
        cf::TRANSACTIONS_BY_ESCROW,
        cf::BOOKINGS,
        cf::PAYMENTS,
        cf::NOTIFICATIONS,
        cf::WEBHOOK_EVENTS,
    ]
}
