//! Payment-gateway records driven by webhook deliveries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::BookingId;

/// Status of a payment as reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayPaymentStatus {
    /// Order created, payment not yet captured.
    Created,

    /// Payment captured; funds are with the platform.
    Captured,

    /// Payment attempt failed.
    Failed,

    /// The gateway refunded the payment.
    Refunded,
}

/// A payment record mirroring the gateway's view, keyed by the gateway's
/// own payment id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayPayment {
    /// Gateway payment id (e.g. `pay_...`). Primary key.
    pub payment_id: String,

    /// Gateway order id (e.g. `order_...`), when present.
    pub order_id: Option<String>,

    /// The booking the payment is for, carried in the gateway notes.
    pub booking_id: Option<BookingId>,

    /// Amount in paise.
    pub amount_paise: i64,

    /// Current status.
    pub status: GatewayPaymentStatus,

    /// Payment method reported by the gateway (card, upi, netbanking, ...).
    pub method: Option<String>,

    /// Failure description, for failed payments.
    pub error_reason: Option<String>,

    /// When the record was first seen.
    pub created_at: DateTime<Utc>,

    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl GatewayPayment {
    /// Build a record from webhook fields.
    #[must_use]
    pub fn new(
        payment_id: String,
        order_id: Option<String>,
        booking_id: Option<BookingId>,
        amount_paise: i64,
        status: GatewayPaymentStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            payment_id,
            order_id,
            booking_id,
            amount_paise,
            status,
            method: None,
            error_reason: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A processed webhook delivery, persisted so replays are applied at most
/// once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// The gateway's event id (idempotency key).
    pub event_id: String,

    /// The event type (`payment.captured`, `refund.created`, ...).
    pub event_type: String,

    /// When the delivery was first processed.
    pub received_at: DateTime<Utc>,
}

impl WebhookEvent {
    /// Record a delivery seen now.
    #[must_use]
    pub fn new(event_id: String, event_type: String) -> Self {
        Self {
            event_id,
            event_type,
            received_at: Utc::now(),
        }
    }
}
