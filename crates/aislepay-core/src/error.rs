//! Error types for AislePay domain operations.

use crate::escrow::EscrowStatus;
use crate::ids::IdError;

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, EscrowError>;

/// Errors that can occur when driving the escrow state machine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EscrowError {
    /// The requested amount is zero or negative.
    #[error("invalid amount: {0} paise")]
    InvalidAmount(i64),

    /// The account is not in a state that permits the operation.
    #[error("escrow is {status:?}, cannot {operation}")]
    InvalidState {
        /// The operation that was attempted.
        operation: &'static str,
        /// The current account status.
        status: EscrowStatus,
    },

    /// The requested amount exceeds the available balance.
    #[error("insufficient escrow balance: available={available_paise}, requested={requested_paise}")]
    InsufficientFunds {
        /// Remaining held amount in paise.
        available_paise: i64,
        /// Amount that was requested in paise.
        requested_paise: i64,
    },

    /// Escrow terms are outside their permitted bounds.
    #[error("invalid escrow terms: {field} {message}")]
    InvalidTerms {
        /// The offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}
