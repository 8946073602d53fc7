//! Common test utilities for aislepay integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use serde_json::json;
use tempfile::TempDir;

use aislepay_core::UserId;
use aislepay_service::{create_router, AppState, ServiceConfig};
use aislepay_store::RocksStore;

/// Webhook signing secret used across the tests.
pub const WEBHOOK_SECRET: &str = "test-webhook-secret";

/// Admin API key used across the tests.
pub const ADMIN_KEY: &str = "test-admin-key";

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Application state, for direct store access and the sweeper.
    pub state: Arc<AppState>,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// A customer (payer) for authenticated requests.
    pub customer: UserId,
    /// A vendor (payee) for authenticated requests.
    pub vendor: UserId,
}

impl TestHarness {
    /// Create a new test harness with a fresh database.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = RocksStore::open(temp_dir.path()).expect("Failed to open store");

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            auth_base_url: "http://localhost".into(),
            auth_audience: "aislepay".into(),
            admin_api_key: Some(ADMIN_KEY.to_string()),
            razorpay_key_id: None,
            razorpay_webhook_secret: Some(WEBHOOK_SECRET.to_string()),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            auto_release_interval_seconds: 0,
        };

        let state = Arc::new(AppState::new(Arc::new(store), config));
        let router: Router = create_router(state.as_ref().clone());

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            state,
            _temp_dir: temp_dir,
            customer: UserId::generate(),
            vendor: UserId::generate(),
        }
    }

    /// Get the authorization header value for a user.
    pub fn auth(user: &UserId) -> String {
        format!("Bearer test-token:{user}")
    }

    /// Register a booking for `customer` with `vendor` and return its id.
    pub async fn create_booking(&self, total_paise: i64) -> String {
        let response = self
            .server
            .post("/v1/bookings")
            .add_header("authorization", Self::auth(&self.customer))
            .json(&json!({
                "vendor_id": self.vendor.to_string(),
                "service": "banquet hall",
                "event_date": "2026-11-21",
                "total_paise": total_paise
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        body["booking"]["id"].as_str().unwrap().to_string()
    }

    /// Create the escrow account for a booking and return its id.
    pub async fn create_escrow(&self, booking_id: &str, total_paise: i64) -> String {
        let response = self
            .server
            .post("/v1/escrow")
            .add_header("authorization", Self::auth(&self.customer))
            .json(&json!({
                "booking_id": booking_id,
                "total_paise": total_paise
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        body["escrow"]["id"].as_str().unwrap().to_string()
    }

    /// Fund an escrow account by delivering a signed `payment.captured`
    /// webhook for its booking.
    pub async fn fund_escrow(&self, booking_id: &str, amount_paise: i64) {
        let payment_id = format!("pay_{}", &booking_id[..8]);
        let event_id = format!("evt_fund_{payment_id}");
        let response = self
            .post_webhook(
                &json!({
                    "entity": "event",
                    "event": "payment.captured",
                    "payload": {
                        "payment": {
                            "entity": {
                                "id": payment_id,
                                "order_id": format!("order_{}", &booking_id[..8]),
                                "amount": amount_paise,
                                "method": "upi",
                                "notes": { "booking_id": booking_id }
                            }
                        }
                    }
                }),
                Some(&event_id),
            )
            .await;
        response.assert_status_ok();
    }

    /// Deliver a webhook with a valid signature.
    pub async fn post_webhook(
        &self,
        payload: &serde_json::Value,
        event_id: Option<&str>,
    ) -> axum_test::TestResponse {
        let body = serde_json::to_string(payload).unwrap();
        let signature = sign(&body);

        let mut request = self
            .server
            .post("/webhooks/razorpay")
            .add_header("x-razorpay-signature", signature);
        if let Some(event_id) = event_id {
            request = request.add_header("x-razorpay-event-id", event_id.to_string());
        }
        request.text(body).await
    }

    /// Fetch an escrow account as the customer.
    pub async fn get_escrow(&self, escrow_id: &str) -> serde_json::Value {
        let response = self
            .server
            .get("/v1/escrow")
            .add_query_param("escrow_id", escrow_id)
            .add_header("authorization", Self::auth(&self.customer))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        body["escrows"][0].clone()
    }

    /// Fetch a booking as the customer.
    pub async fn get_booking(&self, booking_id: &str) -> serde_json::Value {
        let response = self
            .server
            .get(&format!("/v1/bookings/{booking_id}"))
            .add_header("authorization", Self::auth(&self.customer))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        body["booking"].clone()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute the webhook signature the way the gateway does.
pub fn sign(body: &str) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes())
        .expect("HMAC-SHA256 accepts any key size");
    mac.update(body.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
