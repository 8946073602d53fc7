//! Booking handlers.
//!
//! Bookings belong to the wider marketplace; this service registers just
//! enough of them for escrow preconditions (ownership, existence) to bind
//! to real rows.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use aislepay_core::{Booking, BookingId, UserId};
use aislepay_store::EscrowStore;

use crate::auth::Actor;
use crate::error::{ApiError, FieldIssue};
use crate::policy;
use crate::state::AppState;

/// Booking representation returned by the API.
#[derive(Debug, Serialize)]
pub struct BookingResponse {
    /// Booking ID.
    pub id: String,
    /// The paying customer.
    pub user_id: String,
    /// The vendor providing the service.
    pub vendor_id: String,
    /// The booked service.
    pub service: String,
    /// Event date (ISO 8601).
    pub event_date: String,
    /// Agreed price in paise.
    pub total_paise: i64,
    /// Lifecycle status.
    pub status: aislepay_core::BookingStatus,
    /// Payment progress.
    pub payment_status: aislepay_core::BookingPaymentStatus,
    /// Cancellation reason, if cancelled.
    pub cancellation_reason: Option<String>,
    /// Created timestamp (RFC 3339).
    pub created_at: String,
}

impl From<&Booking> for BookingResponse {
    fn from(booking: &Booking) -> Self {
        Self {
            id: booking.id.to_string(),
            user_id: booking.user_id.to_string(),
            vendor_id: booking.vendor_id.to_string(),
            service: booking.service.clone(),
            event_date: booking.event_date.to_string(),
            total_paise: booking.total_paise,
            status: booking.status,
            payment_status: booking.payment_status,
            cancellation_reason: booking.cancellation_reason.clone(),
            created_at: booking.created_at.to_rfc3339(),
        }
    }
}

/// Create booking request.
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    /// The vendor being booked.
    pub vendor_id: String,
    /// The service being booked.
    pub service: String,
    /// Event date, `YYYY-MM-DD`.
    pub event_date: String,
    /// Agreed price in paise.
    pub total_paise: i64,
}

/// Wrapper for single-booking responses.
#[derive(Debug, Serialize)]
pub struct BookingEnvelope {
    /// The booking.
    pub booking: BookingResponse,
}

/// Register a booking. The authenticated user becomes the payer.
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(body): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingEnvelope>), ApiError> {
    let user_id = actor.require_user()?;

    let mut issues = Vec::new();
    let vendor_id = body.vendor_id.parse::<UserId>().map_err(|_| {
        ApiError::Validation(vec![FieldIssue::new("vendor_id", "must be a valid UUID")])
    })?;
    if vendor_id == user_id {
        issues.push(FieldIssue::new("vendor_id", "cannot book yourself"));
    }
    if body.service.trim().is_empty() {
        issues.push(FieldIssue::new("service", "must not be empty"));
    }
    if body.total_paise <= 0 {
        issues.push(FieldIssue::new("total_paise", "must be positive"));
    }
    let event_date = match body.event_date.parse::<NaiveDate>() {
        Ok(date) => date,
        Err(_) => {
            issues.push(FieldIssue::new("event_date", "must be an ISO date (YYYY-MM-DD)"));
            NaiveDate::MIN
        }
    };
    if !issues.is_empty() {
        return Err(ApiError::Validation(issues));
    }

    let booking = Booking::new(
        user_id,
        vendor_id,
        body.service.trim().to_string(),
        event_date,
        body.total_paise,
    );
    state.store.put_booking(&booking)?;

    tracing::info!(
        booking_id = %booking.id,
        user_id = %user_id,
        vendor_id = %vendor_id,
        total_paise = %booking.total_paise,
        "Booking registered"
    );

    Ok((
        StatusCode::CREATED,
        Json(BookingEnvelope {
            booking: BookingResponse::from(&booking),
        }),
    ))
}

/// Fetch a booking. Participants and admins only.
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<Json<BookingEnvelope>, ApiError> {
    let booking_id = id.parse::<BookingId>().map_err(|_| {
        ApiError::Validation(vec![FieldIssue::new("id", "must be a valid UUID")])
    })?;

    let booking = state
        .store
        .get_booking(&booking_id)?
        .ok_or_else(|| ApiError::NotFound(format!("booking not found: {booking_id}")))?;

    policy::authorize_booking_view(&actor, &booking)?;

    Ok(Json(BookingEnvelope {
        booking: BookingResponse::from(&booking),
    }))
}
