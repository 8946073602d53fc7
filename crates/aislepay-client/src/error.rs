//! Client error types.

/// Errors returned by the AislePay client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The requested amount exceeds the available escrow balance.
    #[error("insufficient escrow balance: available={available_paise}, requested={requested_paise}")]
    InsufficientFunds {
        /// Remaining held amount in paise.
        available_paise: i64,
        /// Amount that was requested.
        requested_paise: i64,
    },

    /// The booking already has an escrow account.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Authenticated but not permitted.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Any other API error.
    #[error("api error {status}: {code}: {message}")]
    Api {
        /// Machine-readable error code.
        code: String,
        /// Human-readable message.
        message: String,
        /// HTTP status code.
        status: u16,
    },
}
