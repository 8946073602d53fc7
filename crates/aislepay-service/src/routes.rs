//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{bookings, escrow, health, notifications, webhooks};
use crate::state::AppState;

/// Maximum concurrent requests for API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Bookings (JWT / admin auth)
/// - `POST /v1/bookings` - Register a booking
/// - `GET /v1/bookings/:id` - Fetch a booking
///
/// ## Escrow (JWT / admin auth)
/// - `POST /v1/escrow` - Create the escrow account for a booking
/// - `GET /v1/escrow` - List accounts the requester participates in
/// - `POST /v1/escrow/release` - Release held funds to the vendor
/// - `POST /v1/escrow/refund` - Refund held funds to the customer
/// - `POST /v1/escrow/:id/dispute` - Place an account under dispute
/// - `GET /v1/escrow/:id/transactions` - Ledger listing
///
/// ## Notifications (JWT auth)
/// - `GET /v1/notifications` - The requester's notifications
///
/// ## Webhooks (signature verification)
/// - `POST /webhooks/razorpay` - Payment gateway events
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let api_routes = Router::new()
        // Bookings
        .route("/bookings", post(bookings::create_booking))
        .route("/bookings/:id", get(bookings::get_booking))
        // Escrow
        .route("/escrow", post(escrow::create_escrow))
        .route("/escrow", get(escrow::list_escrows))
        .route("/escrow/release", post(escrow::release))
        .route("/escrow/refund", post(escrow::refund))
        .route("/escrow/:id/dispute", post(escrow::open_dispute))
        .route("/escrow/:id/transactions", get(escrow::list_transactions))
        // Notifications
        .route("/notifications", get(notifications::list_notifications))
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        // API v1 routes (rate limited)
        .nest("/v1", api_routes)
        // Webhooks (no rate limit - delivery cadence is the gateway's)
        .route("/webhooks/razorpay", post(webhooks::razorpay_webhook))
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
