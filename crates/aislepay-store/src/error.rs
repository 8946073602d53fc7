//! Error types for AislePay storage.

use aislepay_core::EscrowError;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of record.
        entity: &'static str,
        /// The identifier that was looked up.
        id: String,
    },

    /// An escrow account already exists for the booking (1:1 constraint).
    #[error("escrow account already exists for booking {booking_id}")]
    EscrowExists {
        /// The booking that is already escrowed.
        booking_id: String,
    },

    /// Webhook event already processed (idempotency check).
    #[error("duplicate webhook event: {event_id}")]
    DuplicateEvent {
        /// The event ID that was replayed.
        event_id: String,
    },

    /// A domain rule rejected the mutation (wrong state, insufficient
    /// balance, bad amount). The underlying account was left untouched.
    #[error(transparent)]
    Domain(#[from] EscrowError),
}
