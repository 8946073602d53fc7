//! Escrow lifecycle integration tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::json;

use aislepay_core::UserId;

// ============================================================================
// Creation
// ============================================================================

#[tokio::test]
async fn create_escrow_derives_amounts() {
    let harness = TestHarness::new();
    let booking_id = harness.create_booking(100_000).await;

    let response = harness
        .server
        .post("/v1/escrow")
        .add_header("authorization", TestHarness::auth(&harness.customer))
        .json(&json!({
            "booking_id": booking_id,
            "total_paise": 100_000
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    let escrow = &body["escrow"];

    assert_eq!(escrow["status"], "pending");
    assert_eq!(escrow["currency"], "INR");
    assert_eq!(escrow["total_paise"], 100_000);
    assert_eq!(escrow["advance_paise"], 30_000);
    assert_eq!(escrow["balance_paise"], 70_000);
    assert_eq!(escrow["commission_paise"], 10_000);
    assert_eq!(escrow["available_paise"], 100_000);
    assert_eq!(escrow["user_id"], harness.customer.to_string());
    assert_eq!(escrow["vendor_id"], harness.vendor.to_string());
}

#[tokio::test]
async fn create_escrow_requires_authentication() {
    let harness = TestHarness::new();
    let booking_id = harness.create_booking(100_000).await;

    let response = harness
        .server
        .post("/v1/escrow")
        .json(&json!({ "booking_id": booking_id, "total_paise": 100_000 }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_escrow_rejects_non_owner() {
    let harness = TestHarness::new();
    let booking_id = harness.create_booking(100_000).await;

    // The vendor does not own the booking and cannot escrow it.
    let response = harness
        .server
        .post("/v1/escrow")
        .add_header("authorization", TestHarness::auth(&harness.vendor))
        .json(&json!({ "booking_id": booking_id, "total_paise": 100_000 }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn create_escrow_missing_booking_is_not_found() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/escrow")
        .add_header("authorization", TestHarness::auth(&harness.customer))
        .json(&json!({
            "booking_id": UserId::generate().to_string(),
            "total_paise": 100_000
        }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_escrow_is_a_conflict_regardless_of_requester() {
    let harness = TestHarness::new();
    let booking_id = harness.create_booking(100_000).await;
    harness.create_escrow(&booking_id, 100_000).await;

    // Same requester.
    let response = harness
        .server
        .post("/v1/escrow")
        .add_header("authorization", TestHarness::auth(&harness.customer))
        .json(&json!({ "booking_id": booking_id, "total_paise": 100_000 }))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    // Admin hits the same uniqueness rule.
    let response = harness
        .server
        .post("/v1/escrow")
        .add_header("x-admin-key", common::ADMIN_KEY)
        .json(&json!({ "booking_id": booking_id, "total_paise": 100_000 }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn create_escrow_validates_terms() {
    let harness = TestHarness::new();
    let booking_id = harness.create_booking(100_000).await;

    let response = harness
        .server
        .post("/v1/escrow")
        .add_header("authorization", TestHarness::auth(&harness.customer))
        .json(&json!({
            "booking_id": booking_id,
            "total_paise": 100_000,
            "advance_percent": 5
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "validation_error");
    assert_eq!(body["error"]["details"][0]["field"], "advance_percent");
}

// ============================================================================
// Release
// ============================================================================

#[tokio::test]
async fn two_releases_complete_the_booking() {
    let harness = TestHarness::new();
    let booking_id = harness.create_booking(100_000).await;
    let escrow_id = harness.create_escrow(&booking_id, 100_000).await;
    harness.fund_escrow(&booking_id, 30_000).await;

    // Release the advance.
    let response = harness
        .server
        .post("/v1/escrow/release")
        .add_header("authorization", TestHarness::auth(&harness.customer))
        .json(&json!({ "escrow_id": escrow_id, "amount_paise": 30_000 }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["escrow"]["status"], "partial_released");
    assert_eq!(body["escrow"]["released_paise"], 30_000);
    assert_eq!(body["escrow"]["available_paise"], 70_000);
    assert!(body["escrow"]["released_at"].is_null());

    // Release the remainder.
    let response = harness
        .server
        .post("/v1/escrow/release")
        .add_header("authorization", TestHarness::auth(&harness.customer))
        .json(&json!({ "escrow_id": escrow_id, "amount_paise": 70_000 }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["escrow"]["status"], "released");
    assert_eq!(body["escrow"]["available_paise"], 0);
    assert!(body["escrow"]["released_at"].is_string());

    // The booking completed as a side effect.
    let booking = harness.get_booking(&booking_id).await;
    assert_eq!(booking["status"], "completed");
    assert_eq!(booking["payment_status"], "fully_paid");

    // The ledger carries both entries, newest first.
    let response = harness
        .server
        .get(&format!("/v1/escrow/{escrow_id}/transactions"))
        .add_header("authorization", TestHarness::auth(&harness.customer))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let transactions = body["transactions"].as_array().unwrap();
    assert_eq!(transactions.len(), 2);
    assert_eq!(transactions[0]["amount_paise"], 70_000);
    assert_eq!(transactions[1]["amount_paise"], 30_000);
}

#[tokio::test]
async fn over_release_reports_available_and_mutates_nothing() {
    let harness = TestHarness::new();
    let booking_id = harness.create_booking(50_000).await;
    let escrow_id = harness.create_escrow(&booking_id, 50_000).await;
    harness.fund_escrow(&booking_id, 15_000).await;

    let response = harness
        .server
        .post("/v1/escrow/release")
        .add_header("authorization", TestHarness::auth(&harness.customer))
        .json(&json!({ "escrow_id": escrow_id, "amount_paise": 60_000 }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "insufficient_funds");
    assert_eq!(body["error"]["details"]["available_paise"], 50_000);
    assert_eq!(body["error"]["details"]["requested_paise"], 60_000);

    let escrow = harness.get_escrow(&escrow_id).await;
    assert_eq!(escrow["released_paise"], 0);
    assert_eq!(escrow["status"], "funded");
}

#[tokio::test]
async fn release_rejected_while_pending() {
    let harness = TestHarness::new();
    let booking_id = harness.create_booking(50_000).await;
    let escrow_id = harness.create_escrow(&booking_id, 50_000).await;

    // No payment captured yet.
    let response = harness
        .server
        .post("/v1/escrow/release")
        .add_header("authorization", TestHarness::auth(&harness.customer))
        .json(&json!({ "escrow_id": escrow_id, "amount_paise": 10_000 }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "business_rule_violation");
}

#[tokio::test]
async fn vendor_cannot_release_but_admin_can() {
    let harness = TestHarness::new();
    let booking_id = harness.create_booking(50_000).await;
    let escrow_id = harness.create_escrow(&booking_id, 50_000).await;
    harness.fund_escrow(&booking_id, 15_000).await;

    let response = harness
        .server
        .post("/v1/escrow/release")
        .add_header("authorization", TestHarness::auth(&harness.vendor))
        .json(&json!({ "escrow_id": escrow_id, "amount_paise": 10_000 }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = harness
        .server
        .post("/v1/escrow/release")
        .add_header("x-admin-key", common::ADMIN_KEY)
        .json(&json!({ "escrow_id": escrow_id, "amount_paise": 10_000 }))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn release_unknown_account_is_not_found() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/escrow/release")
        .add_header("authorization", TestHarness::auth(&harness.customer))
        .json(&json!({
            "escrow_id": UserId::generate().to_string(),
            "amount_paise": 10_000
        }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

// ============================================================================
// Refund
// ============================================================================

#[tokio::test]
async fn full_refund_cancels_the_booking() {
    let harness = TestHarness::new();
    let booking_id = harness.create_booking(50_000).await;
    let escrow_id = harness.create_escrow(&booking_id, 50_000).await;
    harness.fund_escrow(&booking_id, 50_000).await;

    let response = harness
        .server
        .post("/v1/escrow/refund")
        .add_header("authorization", TestHarness::auth(&harness.customer))
        .json(&json!({
            "escrow_id": escrow_id,
            "amount_paise": 50_000,
            "reason": "vendor withdrew from the event"
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["escrow"]["status"], "refunded");
    assert_eq!(body["escrow"]["refunded_paise"], 50_000);

    let booking = harness.get_booking(&booking_id).await;
    assert_eq!(booking["status"], "cancelled");
    assert_eq!(
        booking["cancellation_reason"],
        "vendor withdrew from the event"
    );
}

#[tokio::test]
async fn refund_reason_must_be_meaningful() {
    let harness = TestHarness::new();
    let booking_id = harness.create_booking(50_000).await;
    let escrow_id = harness.create_escrow(&booking_id, 50_000).await;
    harness.fund_escrow(&booking_id, 15_000).await;

    let response = harness
        .server
        .post("/v1/escrow/refund")
        .add_header("authorization", TestHarness::auth(&harness.customer))
        .json(&json!({
            "escrow_id": escrow_id,
            "amount_paise": 10_000,
            "reason": "too short"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "validation_error");
    assert_eq!(body["error"]["details"][0]["field"], "reason");
}

#[tokio::test]
async fn vendor_may_authorize_a_refund() {
    let harness = TestHarness::new();
    let booking_id = harness.create_booking(50_000).await;
    let escrow_id = harness.create_escrow(&booking_id, 50_000).await;
    harness.fund_escrow(&booking_id, 15_000).await;

    let response = harness
        .server
        .post("/v1/escrow/refund")
        .add_header("authorization", TestHarness::auth(&harness.vendor))
        .json(&json!({
            "escrow_id": escrow_id,
            "amount_paise": 20_000,
            "reason": "goodwill partial refund"
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    // Partial refund leaves the account open.
    assert_eq!(body["escrow"]["status"], "funded");
    assert_eq!(body["escrow"]["refunded_paise"], 20_000);
    assert_eq!(body["escrow"]["available_paise"], 30_000);
}

#[tokio::test]
async fn refund_covering_remainder_closes_partially_released_account() {
    let harness = TestHarness::new();
    let booking_id = harness.create_booking(100_000).await;
    let escrow_id = harness.create_escrow(&booking_id, 100_000).await;
    harness.fund_escrow(&booking_id, 30_000).await;

    harness
        .server
        .post("/v1/escrow/release")
        .add_header("authorization", TestHarness::auth(&harness.customer))
        .json(&json!({ "escrow_id": escrow_id, "amount_paise": 40_000 }))
        .await
        .assert_status_ok();

    let response = harness
        .server
        .post("/v1/escrow/refund")
        .add_header("authorization", TestHarness::auth(&harness.customer))
        .json(&json!({
            "escrow_id": escrow_id,
            "amount_paise": 60_000,
            "reason": "remaining services not delivered"
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["escrow"]["status"], "refunded");
    assert_eq!(body["escrow"]["released_paise"], 40_000);
    assert_eq!(body["escrow"]["refunded_paise"], 60_000);
    assert_eq!(body["escrow"]["available_paise"], 0);

    let booking = harness.get_booking(&booking_id).await;
    assert_eq!(booking["status"], "cancelled");
}

// ============================================================================
// Dispute
// ============================================================================

#[tokio::test]
async fn disputed_account_blocks_release_allows_refund() {
    let harness = TestHarness::new();
    let booking_id = harness.create_booking(50_000).await;
    let escrow_id = harness.create_escrow(&booking_id, 50_000).await;
    harness.fund_escrow(&booking_id, 15_000).await;

    let response = harness
        .server
        .post(&format!("/v1/escrow/{escrow_id}/dispute"))
        .add_header("authorization", TestHarness::auth(&harness.customer))
        .json(&json!({ "reason": "vendor did not show up" }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["escrow"]["status"], "disputed");

    // Releases are paused, even for the payer.
    harness
        .server
        .post("/v1/escrow/release")
        .add_header("authorization", TestHarness::auth(&harness.customer))
        .json(&json!({ "escrow_id": escrow_id, "amount_paise": 10_000 }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    // Refunds remain possible.
    let response = harness
        .server
        .post("/v1/escrow/refund")
        .add_header("x-admin-key", common::ADMIN_KEY)
        .json(&json!({
            "escrow_id": escrow_id,
            "amount_paise": 50_000,
            "reason": "dispute resolved in customer's favour"
        }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["escrow"]["status"], "refunded");
}

// ============================================================================
// Listing and visibility
// ============================================================================

#[tokio::test]
async fn listing_is_scoped_to_participants() {
    let harness = TestHarness::new();
    let booking_id = harness.create_booking(50_000).await;
    let escrow_id = harness.create_escrow(&booking_id, 50_000).await;

    // Both participants see the account.
    for user in [&harness.customer, &harness.vendor] {
        let response = harness
            .server
            .get("/v1/escrow")
            .add_header("authorization", TestHarness::auth(user))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["escrows"].as_array().unwrap().len(), 1);
        assert_eq!(body["escrows"][0]["id"], escrow_id);
    }

    // A stranger sees nothing.
    let response = harness
        .server
        .get("/v1/escrow")
        .add_header("authorization", TestHarness::auth(&UserId::generate()))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body["escrows"].as_array().unwrap().is_empty());

    // Filters narrow the listing.
    let response = harness
        .server
        .get("/v1/escrow")
        .add_query_param("booking_id", UserId::generate().to_string())
        .add_header("authorization", TestHarness::auth(&harness.customer))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body["escrows"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn ledger_is_participant_only() {
    let harness = TestHarness::new();
    let booking_id = harness.create_booking(50_000).await;
    let escrow_id = harness.create_escrow(&booking_id, 50_000).await;

    let response = harness
        .server
        .get(&format!("/v1/escrow/{escrow_id}/transactions"))
        .add_header("authorization", TestHarness::auth(&UserId::generate()))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

// ============================================================================
// Notifications
// ============================================================================

#[tokio::test]
async fn escrow_operations_notify_both_parties() {
    let harness = TestHarness::new();
    let booking_id = harness.create_booking(50_000).await;
    let escrow_id = harness.create_escrow(&booking_id, 50_000).await;
    harness.fund_escrow(&booking_id, 15_000).await;

    harness
        .server
        .post("/v1/escrow/release")
        .add_header("authorization", TestHarness::auth(&harness.customer))
        .json(&json!({ "escrow_id": escrow_id, "amount_paise": 10_000 }))
        .await
        .assert_status_ok();

    // Vendor: escrow_created + escrow_funded + funds_released.
    let response = harness
        .server
        .get("/v1/notifications")
        .add_header("authorization", TestHarness::auth(&harness.vendor))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let kinds: Vec<&str> = body["notifications"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["kind"].as_str().unwrap())
        .collect();
    assert!(kinds.contains(&"escrow_created"));
    assert!(kinds.contains(&"escrow_funded"));
    assert!(kinds.contains(&"funds_released"));

    // Customer: escrow_funded + funds_released.
    let response = harness
        .server
        .get("/v1/notifications")
        .add_header("authorization", TestHarness::auth(&harness.customer))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let kinds: Vec<&str> = body["notifications"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["kind"].as_str().unwrap())
        .collect();
    assert!(kinds.contains(&"escrow_funded"));
    assert!(kinds.contains(&"funds_released"));
}
