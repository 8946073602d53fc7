//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use aislepay_core::EscrowError;
use aislepay_store::StoreError;

/// One field-level validation problem, surfaced in the error details list.
#[derive(Debug, Clone, Serialize)]
pub struct FieldIssue {
    /// The offending request field.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl FieldIssue {
    /// Build an issue for `field`.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Forbidden - valid credentials but insufficient permissions.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed or out-of-range input, with field details.
    #[error("validation failed")]
    Validation(Vec<FieldIssue>),

    /// The entity is in the wrong state for the requested transition.
    #[error("{0}")]
    BusinessRule(String),

    /// The requested amount exceeds the available escrow balance.
    #[error("insufficient escrow balance: available={available_paise}, requested={requested_paise}")]
    InsufficientFunds {
        /// Remaining held amount in paise.
        available_paise: i64,
        /// Amount that was requested.
        requested_paise: i64,
    },

    /// Conflict - resource already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// External service error.
    #[error("external service error: {0}")]
    ExternalService(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
            ),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone(), None),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::Validation(issues) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                "Request validation failed".to_string(),
                Some(serde_json::json!(issues)),
            ),
            Self::BusinessRule(msg) => (
                StatusCode::BAD_REQUEST,
                "business_rule_violation",
                msg.clone(),
                None,
            ),
            Self::InsufficientFunds {
                available_paise,
                requested_paise,
            } => (
                StatusCode::BAD_REQUEST,
                "insufficient_funds",
                self.to_string(),
                Some(serde_json::json!({
                    "available_paise": available_paise,
                    "requested_paise": requested_paise
                })),
            ),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone(), None),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            Self::ExternalService(msg) => (
                StatusCode::BAD_GATEWAY,
                "external_service_error",
                msg.clone(),
                None,
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound(format!("{entity} not found: {id}")),
            StoreError::EscrowExists { booking_id } => Self::Conflict(format!(
                "An escrow account already exists for booking {booking_id}"
            )),
            StoreError::DuplicateEvent { event_id } => {
                Self::Conflict(format!("Event {event_id} already processed"))
            }
            StoreError::Domain(domain) => domain.into(),
            StoreError::Database(msg) | StoreError::Serialization(msg) => Self::Internal(msg),
        }
    }
}

impl From<EscrowError> for ApiError {
    fn from(err: EscrowError) -> Self {
        match err {
            EscrowError::InsufficientFunds {
                available_paise,
                requested_paise,
            } => Self::InsufficientFunds {
                available_paise,
                requested_paise,
            },
            EscrowError::InvalidAmount(amount) => Self::Validation(vec![FieldIssue::new(
                "amount_paise",
                format!("must be a positive amount, got {amount}"),
            )]),
            EscrowError::InvalidTerms { field, message } => {
                Self::Validation(vec![FieldIssue::new(field, message)])
            }
            EscrowError::InvalidId(e) => {
                Self::Validation(vec![FieldIssue::new("id", e.to_string())])
            }
            EscrowError::InvalidState { .. } => Self::BusinessRule(err.to_string()),
        }
    }
}
