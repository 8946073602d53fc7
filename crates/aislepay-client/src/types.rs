//! Wire types for the AislePay API.
//!
//! These mirror the service's JSON bodies; amounts are integer paise.

use serde::{Deserialize, Serialize};

// ============================================================================
// Requests
// ============================================================================

/// Register a booking.
#[derive(Debug, Clone, Serialize)]
pub struct CreateBookingRequest {
    /// The vendor being booked.
    pub vendor_id: String,
    /// The service being booked.
    pub service: String,
    /// Event date, `YYYY-MM-DD`.
    pub event_date: String,
    /// Agreed price in paise.
    pub total_paise: i64,
}

/// Create the escrow account for a booking.
#[derive(Debug, Clone, Serialize)]
pub struct CreateEscrowRequest {
    /// The booking to escrow.
    pub booking_id: String,
    /// Expected vendor; must match the booking when provided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<String>,
    /// Total held amount in paise.
    pub total_paise: i64,
    /// Advance percentage (10-100, default 30).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advance_percent: Option<u8>,
    /// Commission percentage (0-30, default 10).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission_percent: Option<u8>,
    /// Days until auto-release (1-90, default 7).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_release_days: Option<i64>,
}

/// Release held funds to the vendor.
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseRequest {
    /// The account to release from.
    pub escrow_id: String,
    /// Amount to release, in paise.
    pub amount_paise: i64,
    /// Operator notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Bank/gateway transfer reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_transfer_id: Option<String>,
}

/// Refund held funds to the customer.
#[derive(Debug, Clone, Serialize)]
pub struct RefundRequest {
    /// The account to refund from.
    pub escrow_id: String,
    /// Amount to refund, in paise.
    pub amount_paise: i64,
    /// Why the refund is happening (min 10 characters).
    pub reason: String,
    /// Gateway refund reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_refund_id: Option<String>,
}

// ============================================================================
// Responses
// ============================================================================

/// A booking as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct Booking {
    /// Booking ID.
    pub id: String,
    /// The paying customer.
    pub user_id: String,
    /// The vendor providing the service.
    pub vendor_id: String,
    /// The booked service.
    pub service: String,
    /// Event date (ISO 8601).
    pub event_date: String,
    /// Agreed price in paise.
    pub total_paise: i64,
    /// Lifecycle status.
    pub status: String,
    /// Payment progress.
    pub payment_status: String,
    /// Cancellation reason, if cancelled.
    pub cancellation_reason: Option<String>,
    /// Created timestamp (RFC 3339).
    pub created_at: String,
}

/// An escrow account as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct Escrow {
    /// Account ID.
    pub id: String,
    /// The owning booking.
    pub booking_id: String,
    /// The paying customer.
    pub user_id: String,
    /// The vendor being paid.
    pub vendor_id: String,
    /// Total held amount in paise.
    pub total_paise: i64,
    /// Amount released so far.
    pub released_paise: i64,
    /// Amount refunded so far.
    pub refunded_paise: i64,
    /// Remaining held amount.
    pub available_paise: i64,
    /// Advance portion.
    pub advance_paise: i64,
    /// Balance after the advance.
    pub balance_paise: i64,
    /// Platform commission.
    pub commission_paise: i64,
    /// Currency code.
    pub currency: String,
    /// Account status.
    pub status: String,
    /// Auto-release deadline (RFC 3339).
    pub auto_release_at: String,
    /// Set when the account reached `released`.
    pub released_at: Option<String>,
    /// Created timestamp (RFC 3339).
    pub created_at: String,
}

/// A ledger entry as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct Transaction {
    /// Entry ID.
    pub id: String,
    /// The escrow account.
    pub escrow_id: String,
    /// `release` or `refund`.
    pub kind: String,
    /// Amount moved, in paise.
    pub amount_paise: i64,
    /// Description.
    pub description: String,
    /// Who initiated the movement.
    pub created_by: String,
    /// When the movement was applied (RFC 3339).
    pub processed_at: String,
}

/// A notification as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationItem {
    /// Notification ID.
    pub id: String,
    /// What it is about.
    pub kind: String,
    /// Headline.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Created timestamp (RFC 3339).
    pub created_at: String,
}

/// `{booking}` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingEnvelope {
    /// The booking.
    pub booking: Booking,
}

/// `{escrow}` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct EscrowEnvelope {
    /// The account.
    pub escrow: Escrow,
}

/// `{escrow, message}` envelope for fund movements.
#[derive(Debug, Clone, Deserialize)]
pub struct MutationEnvelope {
    /// The updated account.
    pub escrow: Escrow,
    /// Human-readable outcome.
    pub message: String,
}

/// `{escrows}` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct EscrowListEnvelope {
    /// Matching accounts.
    pub escrows: Vec<Escrow>,
}

/// `{transactions}` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerEnvelope {
    /// Ledger entries, newest first.
    pub transactions: Vec<Transaction>,
}

/// `{notifications}` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationListEnvelope {
    /// Notifications, newest first.
    pub notifications: Vec<NotificationItem>,
}

// ============================================================================
// Error envelope
// ============================================================================

/// `{"error": {...}}` envelope returned on failures.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    /// The error body.
    pub error: ApiErrorBody,
}

/// Error body with machine-readable code and optional details.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Structured details (validation issues, balances).
    pub details: Option<serde_json::Value>,
}
