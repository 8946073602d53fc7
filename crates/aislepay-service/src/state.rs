//! Application state.

use std::sync::Arc;

use aislepay_store::RocksStore;

use crate::config::ServiceConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<RocksStore>,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<RocksStore>, config: ServiceConfig) -> Self {
        if config.razorpay_webhook_secret.is_none() {
            tracing::warn!(
                "Razorpay webhook secret not configured - signature verification disabled"
            );
        }
        if config.admin_api_key.is_none() {
            tracing::warn!("Admin API key not configured - operator endpoints unavailable");
        }

        Self { store, config }
    }
}
