//! Escrow account handlers: create, list, release, refund, dispute, ledger.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use aislepay_core::{
    BookingId, EscrowAccount, EscrowId, EscrowStatus, EscrowTerms, EscrowTransaction, Notification,
    NotificationKind, TransactionKind,
};
use aislepay_store::EscrowStore;

use crate::auth::Actor;
use crate::error::{ApiError, FieldIssue};
use crate::handlers::notify_best_effort;
use crate::policy::{self, EscrowAction};
use crate::state::AppState;

/// Minimum length for refund/dispute reasons.
const MIN_REASON_CHARS: usize = 10;

// ============================================================================
// Responses
// ============================================================================

/// Escrow account representation returned by the API.
#[derive(Debug, Serialize)]
pub struct EscrowResponse {
    /// Account ID.
    pub id: String,
    /// The owning booking.
    pub booking_id: String,
    /// The paying customer.
    pub user_id: String,
    /// The vendor being paid.
    pub vendor_id: String,
    /// Total held amount in paise.
    pub total_paise: i64,
    /// Amount released so far.
    pub released_paise: i64,
    /// Amount refunded so far.
    pub refunded_paise: i64,
    /// Remaining held amount.
    pub available_paise: i64,
    /// Advance portion.
    pub advance_paise: i64,
    /// Balance after the advance.
    pub balance_paise: i64,
    /// Platform commission.
    pub commission_paise: i64,
    /// Commission percentage applied at creation.
    pub commission_percent: u8,
    /// Currency code.
    pub currency: String,
    /// Account status.
    pub status: EscrowStatus,
    /// Auto-release deadline (RFC 3339).
    pub auto_release_at: String,
    /// Set when the account reached `released`.
    pub released_at: Option<String>,
    /// Audit notes.
    pub notes: String,
    /// Created timestamp (RFC 3339).
    pub created_at: String,
}

impl From<&EscrowAccount> for EscrowResponse {
    fn from(account: &EscrowAccount) -> Self {
        Self {
            id: account.id.to_string(),
            booking_id: account.booking_id.to_string(),
            user_id: account.user_id.to_string(),
            vendor_id: account.vendor_id.to_string(),
            total_paise: account.total_paise,
            released_paise: account.released_paise,
            refunded_paise: account.refunded_paise,
            available_paise: account.available_paise(),
            advance_paise: account.advance_paise,
            balance_paise: account.balance_paise,
            commission_paise: account.commission_paise,
            commission_percent: account.commission_percent,
            currency: account.currency.clone(),
            status: account.status,
            auto_release_at: account.auto_release_at.to_rfc3339(),
            released_at: account.released_at.map(|t| t.to_rfc3339()),
            notes: account.notes.clone(),
            created_at: account.created_at.to_rfc3339(),
        }
    }
}

/// Wrapper for single-account responses.
#[derive(Debug, Serialize)]
pub struct EscrowEnvelope {
    /// The account.
    pub escrow: EscrowResponse,
}

/// Response for fund-movement operations.
#[derive(Debug, Serialize)]
pub struct MutationResponse {
    /// The updated account.
    pub escrow: EscrowResponse,
    /// Human-readable outcome.
    pub message: String,
}

/// Ledger entry representation.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Entry ID.
    pub id: String,
    /// The escrow account.
    pub escrow_id: String,
    /// Release or refund.
    pub kind: TransactionKind,
    /// Amount moved, in paise.
    pub amount_paise: i64,
    /// Funds moved away from this party.
    pub from_user: String,
    /// Funds moved to this party.
    pub to_user: String,
    /// Description.
    pub description: String,
    /// Who initiated the movement.
    pub created_by: String,
    /// Gateway reference, if any.
    pub external_reference: Option<String>,
    /// When the movement was applied (RFC 3339).
    pub processed_at: String,
}

impl From<&EscrowTransaction> for TransactionResponse {
    fn from(tx: &EscrowTransaction) -> Self {
        Self {
            id: tx.id.to_string(),
            escrow_id: tx.escrow_id.to_string(),
            kind: tx.kind,
            amount_paise: tx.amount_paise,
            from_user: tx.from_user.to_string(),
            to_user: tx.to_user.to_string(),
            description: tx.description.clone(),
            created_by: tx.created_by.clone(),
            external_reference: tx.external_reference.clone(),
            processed_at: tx.processed_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Create
// ============================================================================

/// Create escrow request.
#[derive(Debug, Deserialize)]
pub struct CreateEscrowRequest {
    /// The booking to escrow.
    pub booking_id: String,
    /// Expected vendor; must match the booking when provided.
    pub vendor_id: Option<String>,
    /// Total held amount in paise.
    pub total_paise: i64,
    /// Advance percentage (10-100, default 30).
    pub advance_percent: Option<u8>,
    /// Commission percentage (0-30, default 10).
    pub commission_percent: Option<u8>,
    /// Days until the remaining balance auto-releases (1-90, default 7).
    pub auto_release_days: Option<i64>,
}

/// Create the escrow account for a booking.
///
/// Checks, in order: authentication, booking existence, booking ownership,
/// escrow uniqueness.
pub async fn create_escrow(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(body): Json<CreateEscrowRequest>,
) -> Result<(StatusCode, Json<EscrowEnvelope>), ApiError> {
    let booking_id = body.booking_id.parse::<BookingId>().map_err(|_| {
        ApiError::Validation(vec![FieldIssue::new("booking_id", "must be a valid UUID")])
    })?;

    let booking = state
        .store
        .get_booking(&booking_id)?
        .ok_or_else(|| ApiError::NotFound(format!("booking not found: {booking_id}")))?;

    // Only the booking owner (or an operator) may escrow it.
    if !actor.is_admin && !actor.is_user(&booking.user_id) {
        return Err(ApiError::Forbidden(
            "Only the booking owner can create its escrow account".into(),
        ));
    }

    if let Some(vendor_id) = &body.vendor_id {
        if vendor_id != &booking.vendor_id.to_string() {
            return Err(ApiError::Validation(vec![FieldIssue::new(
                "vendor_id",
                "does not match the booking's vendor",
            )]));
        }
    }

    let terms = EscrowTerms {
        advance_percent: body.advance_percent.unwrap_or(aislepay_core::DEFAULT_ADVANCE_PERCENT),
        commission_percent: body
            .commission_percent
            .unwrap_or(aislepay_core::DEFAULT_COMMISSION_PERCENT),
        auto_release_days: body
            .auto_release_days
            .unwrap_or(aislepay_core::DEFAULT_AUTO_RELEASE_DAYS),
    };

    let account = EscrowAccount::new(
        booking_id,
        booking.user_id,
        booking.vendor_id,
        body.total_paise,
        terms,
    )?;

    state.store.create_escrow(&account)?;

    tracing::info!(
        escrow_id = %account.id,
        booking_id = %booking_id,
        total_paise = %account.total_paise,
        created_by = %actor.label(),
        "Escrow account created"
    );

    notify_best_effort(
        &state,
        Notification::new(
            account.vendor_id,
            NotificationKind::EscrowCreated,
            "Escrow account created".into(),
            format!(
                "An escrow account holding {} paise was opened for your {} booking",
                account.total_paise, booking.service
            ),
        ),
    );

    Ok((
        StatusCode::CREATED,
        Json(EscrowEnvelope {
            escrow: EscrowResponse::from(&account),
        }),
    ))
}

// ============================================================================
// List
// ============================================================================

/// Query filters for the listing endpoint.
#[derive(Debug, Deserialize)]
pub struct ListEscrowQuery {
    /// Filter by booking.
    pub booking_id: Option<String>,
    /// Filter by account id.
    pub escrow_id: Option<String>,
}

/// Listing response.
#[derive(Debug, Serialize)]
pub struct ListEscrowResponse {
    /// Matching accounts, newest first.
    pub escrows: Vec<EscrowResponse>,
}

/// List escrow accounts visible to the requester, optionally filtered.
pub async fn list_escrows(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Query(query): Query<ListEscrowQuery>,
) -> Result<Json<ListEscrowResponse>, ApiError> {
    let booking_filter = query
        .booking_id
        .as_deref()
        .map(str::parse::<BookingId>)
        .transpose()
        .map_err(|_| {
            ApiError::Validation(vec![FieldIssue::new("booking_id", "must be a valid UUID")])
        })?;
    let escrow_filter = query
        .escrow_id
        .as_deref()
        .map(str::parse::<EscrowId>)
        .transpose()
        .map_err(|_| {
            ApiError::Validation(vec![FieldIssue::new("escrow_id", "must be a valid UUID")])
        })?;

    let accounts = if let Some(user_id) = actor.user_id {
        state.store.list_escrows_for_user(&user_id)?
    } else {
        // Operators address accounts directly rather than listing the world.
        match (escrow_filter, booking_filter) {
            (Some(escrow_id), _) => state.store.get_escrow(&escrow_id)?.into_iter().collect(),
            (None, Some(booking_id)) => state
                .store
                .get_escrow_by_booking(&booking_id)?
                .into_iter()
                .collect(),
            (None, None) => {
                return Err(ApiError::Validation(vec![FieldIssue::new(
                    "escrow_id",
                    "admin listing requires an escrow_id or booking_id filter",
                )]))
            }
        }
    };

    let escrows = accounts
        .iter()
        .filter(|a| booking_filter.map_or(true, |b| a.booking_id == b))
        .filter(|a| escrow_filter.map_or(true, |e| a.id == e))
        .map(EscrowResponse::from)
        .collect();

    Ok(Json(ListEscrowResponse { escrows }))
}

// ============================================================================
// Release
// ============================================================================

/// Release request.
#[derive(Debug, Deserialize)]
pub struct ReleaseRequest {
    /// The account to release from.
    pub escrow_id: String,
    /// Amount to release, in paise.
    pub amount_paise: i64,
    /// Operator notes recorded on the ledger entry.
    pub notes: Option<String>,
    /// Bank/gateway transfer reference.
    pub external_transfer_id: Option<String>,
}

/// Release held funds to the vendor.
pub async fn release(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(body): Json<ReleaseRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let escrow_id = body.escrow_id.parse::<EscrowId>().map_err(|_| {
        ApiError::Validation(vec![FieldIssue::new("escrow_id", "must be a valid UUID")])
    })?;

    let account = state
        .store
        .get_escrow(&escrow_id)?
        .ok_or_else(|| ApiError::NotFound(format!("escrow account not found: {escrow_id}")))?;

    policy::authorize_escrow(&actor, EscrowAction::Release, &account)?;

    let description = body
        .notes
        .unwrap_or_else(|| "Funds released to vendor".to_string());

    let (updated, tx) = state.store.release(
        &escrow_id,
        body.amount_paise,
        description,
        actor.label(),
        body.external_transfer_id,
    )?;

    tracing::info!(
        escrow_id = %escrow_id,
        amount_paise = %body.amount_paise,
        status = ?updated.status,
        transaction_id = %tx.id,
        released_by = %actor.label(),
        "Escrow funds released"
    );

    notify_best_effort(
        &state,
        Notification::new(
            updated.vendor_id,
            NotificationKind::FundsReleased,
            "Escrow funds released".into(),
            format!("{} paise released to you from escrow", body.amount_paise),
        ),
    );
    notify_best_effort(
        &state,
        Notification::new(
            updated.user_id,
            NotificationKind::FundsReleased,
            "Escrow funds released".into(),
            format!("{} paise released to the vendor", body.amount_paise),
        ),
    );

    let message = if updated.status == EscrowStatus::Released {
        "Escrow fully released; booking completed".to_string()
    } else {
        format!(
            "Released {} paise; {} paise still held",
            body.amount_paise,
            updated.available_paise()
        )
    };

    Ok(Json(MutationResponse {
        escrow: EscrowResponse::from(&updated),
        message,
    }))
}

// ============================================================================
// Refund
// ============================================================================

/// Refund request.
#[derive(Debug, Deserialize)]
pub struct RefundRequest {
    /// The account to refund from.
    pub escrow_id: String,
    /// Amount to refund, in paise.
    pub amount_paise: i64,
    /// Why the refund is happening (min 10 characters).
    pub reason: String,
    /// Gateway refund reference.
    pub external_refund_id: Option<String>,
}

/// Refund held funds to the customer.
pub async fn refund(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(body): Json<RefundRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let escrow_id = body.escrow_id.parse::<EscrowId>().map_err(|_| {
        ApiError::Validation(vec![FieldIssue::new("escrow_id", "must be a valid UUID")])
    })?;

    if body.reason.trim().chars().count() < MIN_REASON_CHARS {
        return Err(ApiError::Validation(vec![FieldIssue::new(
            "reason",
            format!("must be at least {MIN_REASON_CHARS} characters"),
        )]));
    }

    let account = state
        .store
        .get_escrow(&escrow_id)?
        .ok_or_else(|| ApiError::NotFound(format!("escrow account not found: {escrow_id}")))?;

    policy::authorize_escrow(&actor, EscrowAction::Refund, &account)?;

    let (updated, tx) = state.store.refund(
        &escrow_id,
        body.amount_paise,
        body.reason.trim().to_string(),
        actor.label(),
        body.external_refund_id,
    )?;

    tracing::info!(
        escrow_id = %escrow_id,
        amount_paise = %body.amount_paise,
        status = ?updated.status,
        transaction_id = %tx.id,
        refunded_by = %actor.label(),
        "Escrow funds refunded"
    );

    notify_best_effort(
        &state,
        Notification::new(
            updated.user_id,
            NotificationKind::FundsRefunded,
            "Escrow refund issued".into(),
            format!("{} paise refunded to you from escrow", body.amount_paise),
        ),
    );
    notify_best_effort(
        &state,
        Notification::new(
            updated.vendor_id,
            NotificationKind::FundsRefunded,
            "Escrow refund issued".into(),
            format!("{} paise refunded to the customer", body.amount_paise),
        ),
    );

    let message = if updated.status == EscrowStatus::Refunded {
        "Escrow refunded; booking cancelled".to_string()
    } else {
        format!(
            "Refunded {} paise; {} paise still held",
            body.amount_paise,
            updated.available_paise()
        )
    };

    Ok(Json(MutationResponse {
        escrow: EscrowResponse::from(&updated),
        message,
    }))
}

// ============================================================================
// Dispute
// ============================================================================

/// Dispute request.
#[derive(Debug, Deserialize)]
pub struct DisputeRequest {
    /// Why the dispute is being opened (min 10 characters).
    pub reason: String,
}

/// Place an escrow account under dispute.
pub async fn open_dispute(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
    Json(body): Json<DisputeRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let escrow_id = id.parse::<EscrowId>().map_err(|_| {
        ApiError::Validation(vec![FieldIssue::new("id", "must be a valid UUID")])
    })?;

    if body.reason.trim().chars().count() < MIN_REASON_CHARS {
        return Err(ApiError::Validation(vec![FieldIssue::new(
            "reason",
            format!("must be at least {MIN_REASON_CHARS} characters"),
        )]));
    }

    let account = state
        .store
        .get_escrow(&escrow_id)?
        .ok_or_else(|| ApiError::NotFound(format!("escrow account not found: {escrow_id}")))?;

    policy::authorize_escrow(&actor, EscrowAction::Dispute, &account)?;

    let updated = state
        .store
        .open_dispute(&escrow_id, body.reason.trim(), &actor.label())?;

    tracing::info!(
        escrow_id = %escrow_id,
        opened_by = %actor.label(),
        "Escrow dispute opened"
    );

    // Tell the other side; the opener already knows.
    let counterparty = if actor.is_user(&updated.user_id) {
        updated.vendor_id
    } else {
        updated.user_id
    };
    notify_best_effort(
        &state,
        Notification::new(
            counterparty,
            NotificationKind::DisputeOpened,
            "Escrow dispute opened".into(),
            "The escrow account for your booking is under dispute; releases are paused".into(),
        ),
    );

    Ok(Json(MutationResponse {
        escrow: EscrowResponse::from(&updated),
        message: "Escrow placed under dispute".to_string(),
    }))
}

// ============================================================================
// Ledger
// ============================================================================

/// Pagination for the ledger listing.
#[derive(Debug, Deserialize)]
pub struct LedgerQuery {
    /// Maximum entries to return (default 50).
    pub limit: Option<usize>,
    /// Entries to skip (default 0).
    pub offset: Option<usize>,
}

/// Ledger listing response.
#[derive(Debug, Serialize)]
pub struct LedgerResponse {
    /// Ledger entries, newest first.
    pub transactions: Vec<TransactionResponse>,
}

/// List the ledger of an escrow account.
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
    Query(query): Query<LedgerQuery>,
) -> Result<Json<LedgerResponse>, ApiError> {
    let escrow_id = id.parse::<EscrowId>().map_err(|_| {
        ApiError::Validation(vec![FieldIssue::new("id", "must be a valid UUID")])
    })?;

    let account = state
        .store
        .get_escrow(&escrow_id)?
        .ok_or_else(|| ApiError::NotFound(format!("escrow account not found: {escrow_id}")))?;

    policy::authorize_escrow(&actor, EscrowAction::View, &account)?;

    let transactions = state.store.list_transactions_by_escrow(
        &escrow_id,
        query.limit.unwrap_or(50),
        query.offset.unwrap_or(0),
    )?;

    Ok(Json(LedgerResponse {
        transactions: transactions.iter().map(TransactionResponse::from).collect(),
    }))
}
