//! Payment-gateway webhook handlers.
//!
//! Razorpay signs each delivery with HMAC-SHA256 over the raw body; the
//! hex digest travels in `x-razorpay-signature` and the delivery id in
//! `x-razorpay-event-id`. A bad signature is rejected with `401` before
//! any state is touched; a replayed event id is acknowledged without
//! re-applying its effects.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use aislepay_core::{
    BookingId, GatewayPayment, GatewayPaymentStatus, Notification, NotificationKind, WebhookEvent,
};
use aislepay_store::{EscrowStore, StoreError};

use crate::crypto::{constant_time_eq, hmac_sha256_hex};
use crate::error::{ApiError, FieldIssue};
use crate::handlers::notify_best_effort;
use crate::state::AppState;

/// Razorpay webhook envelope (simplified).
#[derive(Debug, Deserialize)]
pub struct RazorpayWebhook {
    /// Event type (`payment.captured`, `refund.created`, ...).
    pub event: String,
    /// Event payload; shape varies per event type.
    pub payload: serde_json::Value,
}

/// Webhook response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Whether the webhook was accepted.
    pub received: bool,
}

/// Handle Razorpay webhooks.
pub async fn razorpay_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WebhookResponse>, ApiError> {
    // Verify signature if a webhook secret is configured
    if let Some(secret) = &state.config.razorpay_webhook_secret {
        let signature = headers
            .get("x-razorpay-signature")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                tracing::warn!("Webhook delivery without a signature header");
                ApiError::Unauthorized
            })?;

        let expected = hmac_sha256_hex(secret, &body);
        if !constant_time_eq(&expected, signature) {
            tracing::warn!("Invalid webhook signature");
            return Err(ApiError::Unauthorized);
        }
    } else {
        // No secret configured - skip verification (development mode)
        tracing::warn!("Razorpay webhook secret not configured - skipping signature verification");
    }

    // Parse webhook payload
    let webhook: RazorpayWebhook = serde_json::from_str(&body).map_err(|e| {
        ApiError::Validation(vec![FieldIssue::new("body", e.to_string())])
    })?;

    let header_event_id = headers
        .get("x-razorpay-event-id")
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);

    tracing::info!(
        event = %webhook.event,
        event_id = ?header_event_id,
        "Received Razorpay webhook"
    );

    // Handle different event types
    match webhook.event.as_str() {
        "payment.captured" => {
            handle_payment_captured(&state, header_event_id, &webhook).await?;
        }
        "order.paid" => {
            handle_order_paid(&state, header_event_id, &webhook).await?;
        }
        "payment.failed" => {
            handle_payment_failed(&state, header_event_id, &webhook).await?;
        }
        "refund.created" => {
            handle_refund_created(&state, header_event_id, &webhook).await?;
        }
        _ => {
            tracing::debug!(event = %webhook.event, "Unhandled Razorpay event");
        }
    }

    Ok(Json(WebhookResponse { received: true }))
}

// ============================================================================
// Event handlers
// ============================================================================

async fn handle_payment_captured(
    state: &AppState,
    header_event_id: Option<String>,
    webhook: &RazorpayWebhook,
) -> Result<(), ApiError> {
    let entity = payment_entity(webhook)?;
    let payment = parse_payment(&entity, GatewayPaymentStatus::Captured)?;
    let event_id = resolve_event_id(header_event_id, &webhook.event, &payment.payment_id);
    let event = WebhookEvent::new(event_id, webhook.event.clone());

    let funded = match state.store.record_payment_captured(&event, &payment) {
        Ok(funded) => funded,
        Err(StoreError::DuplicateEvent { event_id }) => {
            tracing::info!(event_id = %event_id, "Webhook replay ignored");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(account) = funded {
        tracing::info!(
            escrow_id = %account.id,
            payment_id = %payment.payment_id,
            "Escrow account funded by captured payment"
        );
        notify_best_effort(
            state,
            Notification::new(
                account.user_id,
                NotificationKind::EscrowFunded,
                "Payment received".into(),
                format!(
                    "Your payment of {} paise is held in escrow",
                    payment.amount_paise
                ),
            ),
        );
        notify_best_effort(
            state,
            Notification::new(
                account.vendor_id,
                NotificationKind::EscrowFunded,
                "Booking funded".into(),
                format!(
                    "{} paise is now held in escrow for your booking",
                    payment.amount_paise
                ),
            ),
        );
    }

    Ok(())
}

async fn handle_order_paid(
    state: &AppState,
    header_event_id: Option<String>,
    webhook: &RazorpayWebhook,
) -> Result<(), ApiError> {
    let entity = payment_entity(webhook)?;
    let payment = parse_payment(&entity, GatewayPaymentStatus::Captured)?;
    let event_id = resolve_event_id(header_event_id, &webhook.event, &payment.payment_id);
    let event = WebhookEvent::new(event_id, webhook.event.clone());

    match state.store.record_order_paid(&event, &payment) {
        Ok(()) => {
            tracing::info!(
                payment_id = %payment.payment_id,
                order_id = ?payment.order_id,
                "Order marked paid"
            );
            Ok(())
        }
        Err(StoreError::DuplicateEvent { event_id }) => {
            tracing::info!(event_id = %event_id, "Webhook replay ignored");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn handle_payment_failed(
    state: &AppState,
    header_event_id: Option<String>,
    webhook: &RazorpayWebhook,
) -> Result<(), ApiError> {
    let entity = payment_entity(webhook)?;
    let mut payment = parse_payment(&entity, GatewayPaymentStatus::Failed)?;
    payment.error_reason = entity
        .get("error_description")
        .and_then(|v| v.as_str())
        .map(String::from);

    let event_id = resolve_event_id(header_event_id, &webhook.event, &payment.payment_id);
    let event = WebhookEvent::new(event_id, webhook.event.clone());

    match state.store.record_payment_failed(&event, &payment) {
        Ok(()) => {}
        Err(StoreError::DuplicateEvent { event_id }) => {
            tracing::info!(event_id = %event_id, "Webhook replay ignored");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    tracing::warn!(
        payment_id = %payment.payment_id,
        reason = ?payment.error_reason,
        "Payment failed"
    );

    // Tell the payer, when the payment names its booking.
    if let Some(booking_id) = payment.booking_id {
        if let Ok(Some(booking)) = state.store.get_booking(&booking_id) {
            notify_best_effort(
                state,
                Notification::new(
                    booking.user_id,
                    NotificationKind::PaymentFailed,
                    "Payment failed".into(),
                    "Your booking payment failed; please try again".into(),
                ),
            );
        }
    }

    Ok(())
}

async fn handle_refund_created(
    state: &AppState,
    header_event_id: Option<String>,
    webhook: &RazorpayWebhook,
) -> Result<(), ApiError> {
    let entity = webhook
        .payload
        .get("refund")
        .and_then(|r| r.get("entity"))
        .cloned()
        .ok_or_else(|| {
            ApiError::Validation(vec![FieldIssue::new("payload", "missing refund entity")])
        })?;

    let refund_id = entity
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            ApiError::Validation(vec![FieldIssue::new("payload", "missing refund id")])
        })?;
    let payment_id = entity
        .get("payment_id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            ApiError::Validation(vec![FieldIssue::new("payload", "missing payment_id")])
        })?;

    let event_id = resolve_event_id(header_event_id, &webhook.event, refund_id);
    let event = WebhookEvent::new(event_id, webhook.event.clone());

    let updated = match state.store.record_refund_created(&event, payment_id) {
        Ok(updated) => updated,
        Err(StoreError::DuplicateEvent { event_id }) => {
            tracing::info!(event_id = %event_id, "Webhook replay ignored");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(
        refund_id = %refund_id,
        payment_id = %payment_id,
        "Gateway refund recorded"
    );

    if let Some(payment) = updated {
        if let Some(booking_id) = payment.booking_id {
            if let Ok(Some(booking)) = state.store.get_booking(&booking_id) {
                notify_best_effort(
                    state,
                    Notification::new(
                        booking.user_id,
                        NotificationKind::FundsRefunded,
                        "Refund on its way".into(),
                        "The payment gateway has created your refund".into(),
                    ),
                );
            }
        }
    }

    Ok(())
}

// ============================================================================
// Payload helpers
// ============================================================================

/// Extract the `payload.payment.entity` object.
fn payment_entity(webhook: &RazorpayWebhook) -> Result<serde_json::Value, ApiError> {
    webhook
        .payload
        .get("payment")
        .and_then(|p| p.get("entity"))
        .cloned()
        .ok_or_else(|| {
            ApiError::Validation(vec![FieldIssue::new("payload", "missing payment entity")])
        })
}

/// Build a `GatewayPayment` from a payment entity.
fn parse_payment(
    entity: &serde_json::Value,
    status: GatewayPaymentStatus,
) -> Result<GatewayPayment, ApiError> {
    let payment_id = entity
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            ApiError::Validation(vec![FieldIssue::new("payload", "missing payment id")])
        })?
        .to_string();

    let order_id = entity
        .get("order_id")
        .and_then(|v| v.as_str())
        .map(String::from);

    let amount_paise = entity
        .get("amount")
        .and_then(serde_json::Value::as_i64)
        .unwrap_or(0);

    // The checkout flow writes the booking id into the gateway notes.
    let booking_id = entity
        .get("notes")
        .and_then(|n| n.get("booking_id"))
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<BookingId>().ok());

    let mut payment = GatewayPayment::new(payment_id, order_id, booking_id, amount_paise, status);
    payment.method = entity
        .get("method")
        .and_then(|v| v.as_str())
        .map(String::from);

    Ok(payment)
}

/// Prefer the gateway's delivery id; fall back to a deterministic
/// per-entity key for older payloads.
fn resolve_event_id(header: Option<String>, event: &str, entity_id: &str) -> String {
    header.unwrap_or_else(|| format!("{event}:{entity_id}"))
}
