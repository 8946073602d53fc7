//! HTTP request handlers.

pub mod bookings;
pub mod escrow;
pub mod health;
pub mod notifications;
pub mod webhooks;

use aislepay_core::Notification;
use aislepay_store::EscrowStore;

use crate::state::AppState;

/// Insert a notification, logging and swallowing failures.
///
/// Notification delivery is best-effort: the primary state change has
/// already committed, so a failed insert must not fail the request.
pub(crate) fn notify_best_effort(state: &AppState, notification: Notification) {
    if let Err(e) = state.store.put_notification(&notification) {
        tracing::warn!(
            user_id = %notification.user_id,
            kind = ?notification.kind,
            error = %e,
            "Failed to deliver notification"
        );
    }
}
