//! Booking endpoint integration tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::json;

use aislepay_core::UserId;

#[tokio::test]
async fn create_and_fetch_booking() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/bookings")
        .add_header("authorization", TestHarness::auth(&harness.customer))
        .json(&json!({
            "vendor_id": harness.vendor.to_string(),
            "service": "wedding photography",
            "event_date": "2026-12-05",
            "total_paise": 250_000
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    let booking = &body["booking"];
    assert_eq!(booking["user_id"], harness.customer.to_string());
    assert_eq!(booking["vendor_id"], harness.vendor.to_string());
    assert_eq!(booking["status"], "confirmed");
    assert_eq!(booking["payment_status"], "unpaid");

    let booking_id = booking["id"].as_str().unwrap();

    // The vendor can read it too.
    let response = harness
        .server
        .get(&format!("/v1/bookings/{booking_id}"))
        .add_header("authorization", TestHarness::auth(&harness.vendor))
        .await;
    response.assert_status_ok();

    // A stranger cannot.
    let response = harness
        .server
        .get(&format!("/v1/bookings/{booking_id}"))
        .add_header("authorization", TestHarness::auth(&UserId::generate()))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    // An admin can.
    let response = harness
        .server
        .get(&format!("/v1/bookings/{booking_id}"))
        .add_header("x-admin-key", common::ADMIN_KEY)
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn booking_validation_reports_each_field() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/bookings")
        .add_header("authorization", TestHarness::auth(&harness.customer))
        .json(&json!({
            "vendor_id": harness.vendor.to_string(),
            "service": "  ",
            "event_date": "not-a-date",
            "total_paise": -5
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "validation_error");
    let fields: Vec<&str> = body["error"]["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"service"));
    assert!(fields.contains(&"event_date"));
    assert!(fields.contains(&"total_paise"));
}

#[tokio::test]
async fn booking_yourself_is_rejected() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/bookings")
        .add_header("authorization", TestHarness::auth(&harness.customer))
        .json(&json!({
            "vendor_id": harness.customer.to_string(),
            "service": "makeup artist",
            "event_date": "2026-12-05",
            "total_paise": 10_000
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_booking_is_not_found() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get(&format!("/v1/bookings/{}", UserId::generate()))
        .add_header("authorization", TestHarness::auth(&harness.customer))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn wrong_admin_key_is_unauthorized() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get(&format!("/v1/bookings/{}", UserId::generate()))
        .add_header("x-admin-key", "not-the-key")
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn garbage_bearer_token_is_unauthorized() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/v1/escrow")
        .add_header("authorization", "Bearer not.a.jwt")
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}
