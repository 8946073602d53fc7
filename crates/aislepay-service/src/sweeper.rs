//! Auto-release sweeper.
//!
//! A single background task per process scans for escrow accounts whose
//! hold period has expired while funds remain held, and releases the
//! remaining balance to the vendor attributed to `system`. Sweeps go
//! through the same serialized store operation as the HTTP release path,
//! which makes them idempotent (a swept account leaves the sweepable set)
//! and safe to retry on the next tick after any failure.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;

use aislepay_core::{Notification, NotificationKind};
use aislepay_store::{EscrowStore, StoreError};

use crate::handlers::notify_best_effort;
use crate::state::AppState;

/// Spawn the sweeper task, unless disabled by configuration.
pub fn spawn(state: Arc<AppState>) -> Option<JoinHandle<()>> {
    let interval_seconds = state.config.auto_release_interval_seconds;
    if interval_seconds == 0 {
        tracing::info!("Auto-release sweeper disabled");
        return None;
    }

    tracing::info!(interval_seconds, "Auto-release sweeper started");
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_seconds));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match sweep_once(&state) {
                Ok(0) => {}
                Ok(released) => {
                    tracing::info!(released, "Auto-release sweep completed");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Auto-release sweep failed; retrying next tick");
                }
            }
        }
    }))
}

/// Run one sweep: release the remaining balance of every account past its
/// auto-release deadline. Returns how many accounts were released.
///
/// # Errors
///
/// Returns an error only when the due-account scan itself fails;
/// per-account failures are logged and left for the next tick.
pub fn sweep_once(state: &AppState) -> Result<usize, StoreError> {
    let now = Utc::now();
    let due = state.store.list_due_auto_release(now)?;
    let mut released = 0;

    for account in due {
        let amount = account.available_paise();
        match state.store.release(
            &account.id,
            amount,
            "Automatic release after hold period".to_string(),
            "system".to_string(),
            None,
        ) {
            Ok((updated, tx)) => {
                released += 1;
                tracing::info!(
                    escrow_id = %updated.id,
                    amount_paise = %amount,
                    transaction_id = %tx.id,
                    "Escrow auto-released"
                );
                notify_best_effort(
                    state,
                    Notification::new(
                        updated.vendor_id,
                        NotificationKind::FundsReleased,
                        "Escrow auto-released".into(),
                        format!("{amount} paise released to you after the hold period"),
                    ),
                );
                notify_best_effort(
                    state,
                    Notification::new(
                        updated.user_id,
                        NotificationKind::FundsReleased,
                        "Escrow auto-released".into(),
                        format!("{amount} paise released to the vendor after the hold period"),
                    ),
                );
            }
            // A concurrent release/refund/dispute beat the sweep; the next
            // scan sees the account's new state.
            Err(StoreError::Domain(e)) => {
                tracing::debug!(escrow_id = %account.id, error = %e, "Auto-release skipped");
            }
            Err(e) => {
                tracing::warn!(escrow_id = %account.id, error = %e, "Auto-release failed");
            }
        }
    }

    Ok(released)
}
