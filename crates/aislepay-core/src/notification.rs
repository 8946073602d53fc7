//! User-facing notification records.
//!
//! Notifications are a fire-and-forget sink: escrow operations insert them
//! on a best-effort basis and an unspecified UI layer consumes them. A
//! failed insert must never fail the operation that triggered it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{NotificationId, UserId};

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// An escrow account was created for one of the user's bookings.
    EscrowCreated,

    /// A payment was captured and the escrow funded.
    EscrowFunded,

    /// Held funds were released to the vendor.
    FundsReleased,

    /// Held funds were refunded to the customer.
    FundsRefunded,

    /// A payment attempt failed.
    PaymentFailed,

    /// An escrow account was placed under dispute.
    DisputeOpened,
}

/// A single notification for one recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Unique id (ULID, time-ordered).
    pub id: NotificationId,

    /// The recipient.
    pub user_id: UserId,

    /// What this notification is about.
    pub kind: NotificationKind,

    /// Short headline.
    pub title: String,

    /// Body text.
    pub body: String,

    /// When the notification was created.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Create a notification for `user_id`.
    #[must_use]
    pub fn new(user_id: UserId, kind: NotificationKind, title: String, body: String) -> Self {
        Self {
            id: NotificationId::generate(),
            user_id,
            kind,
            title,
            body,
            created_at: Utc::now(),
        }
    }
}
