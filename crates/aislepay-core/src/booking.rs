//! Booking records referenced by escrow accounts.
//!
//! Bookings are owned by the wider marketplace; the escrow core only needs
//! enough of them to verify ownership preconditions and to apply the side
//! effects of terminal escrow states (`Released` completes the booking,
//! `Refunded` cancels it).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{BookingId, UserId};

/// Lifecycle status of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Confirmed and awaiting the event.
    Confirmed,

    /// Fully paid out; the event is settled.
    Completed,

    /// Cancelled; funds were refunded.
    Cancelled,
}

/// How much of the booking has been paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingPaymentStatus {
    /// No payment captured yet.
    Unpaid,

    /// The advance has been captured.
    AdvancePaid,

    /// The full amount has been captured or released.
    FullyPaid,
}

/// A wedding-service booking between a customer and a vendor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    /// Unique booking identifier.
    pub id: BookingId,

    /// The customer who made the booking.
    pub user_id: UserId,

    /// The vendor providing the service.
    pub vendor_id: UserId,

    /// The service being booked (free text, e.g. "banquet hall").
    pub service: String,

    /// Date of the event.
    pub event_date: NaiveDate,

    /// Agreed price in paise.
    pub total_paise: i64,

    /// Lifecycle status.
    pub status: BookingStatus,

    /// Payment progress.
    pub payment_status: BookingPaymentStatus,

    /// Reason recorded when the booking was cancelled.
    pub cancellation_reason: Option<String>,

    /// When the booking was cancelled.
    pub cancelled_at: Option<DateTime<Utc>>,

    /// When the booking was completed.
    pub completed_at: Option<DateTime<Utc>>,

    /// When the booking was created.
    pub created_at: DateTime<Utc>,

    /// When the booking was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Create a confirmed, unpaid booking.
    #[must_use]
    pub fn new(
        user_id: UserId,
        vendor_id: UserId,
        service: String,
        event_date: NaiveDate,
        total_paise: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: BookingId::generate(),
            user_id,
            vendor_id,
            service,
            event_date,
            total_paise,
            status: BookingStatus::Confirmed,
            payment_status: BookingPaymentStatus::Unpaid,
            cancellation_reason: None,
            cancelled_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the given user is the customer or the vendor on this booking.
    #[must_use]
    pub fn is_participant(&self, user: &UserId) -> bool {
        self.user_id == *user || self.vendor_id == *user
    }

    /// Mark the booking completed and fully paid (escrow fully released).
    pub fn mark_completed(&mut self, now: DateTime<Utc>) {
        self.status = BookingStatus::Completed;
        self.payment_status = BookingPaymentStatus::FullyPaid;
        self.completed_at = Some(now);
        self.updated_at = now;
    }

    /// Mark the booking cancelled with a reason (escrow refunded).
    pub fn mark_cancelled(&mut self, reason: String, now: DateTime<Utc>) {
        self.status = BookingStatus::Cancelled;
        self.cancellation_reason = Some(reason);
        self.cancelled_at = Some(now);
        self.updated_at = now;
    }
}
