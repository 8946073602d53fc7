//! Authorization policy.
//!
//! One capability check consulted by every handler, instead of role
//! lookups repeated per route. The rules:
//!
//! | action  | payer | vendor | admin |
//! |---------|-------|--------|-------|
//! | view    |  yes  |  yes   |  yes  |
//! | release |  yes  |  no    |  yes  |
//! | refund  |  yes  |  yes   |  yes  |
//! | dispute |  yes  |  yes   |  yes  |
//!
//! The vendor may authorize refunding their own pending funds but may never
//! release funds to themselves.

use aislepay_core::{Booking, EscrowAccount};

use crate::auth::Actor;
use crate::error::ApiError;

/// What an actor wants to do to an escrow account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscrowAction {
    /// Read the account or its ledger.
    View,
    /// Move held funds to the vendor.
    Release,
    /// Move held funds back to the customer.
    Refund,
    /// Place the account under dispute.
    Dispute,
}

/// Check whether `actor` may perform `action` on `account`.
///
/// # Errors
///
/// Returns `ApiError::Forbidden` when the actor lacks the capability.
pub fn authorize_escrow(
    actor: &Actor,
    action: EscrowAction,
    account: &EscrowAccount,
) -> Result<(), ApiError> {
    if actor.is_admin {
        return Ok(());
    }

    let is_payer = actor.is_user(&account.user_id);
    let is_vendor = actor.is_user(&account.vendor_id);

    let allowed = match action {
        EscrowAction::View | EscrowAction::Refund | EscrowAction::Dispute => is_payer || is_vendor,
        EscrowAction::Release => is_payer,
    };

    if allowed {
        Ok(())
    } else if is_vendor && action == EscrowAction::Release {
        Err(ApiError::Forbidden(
            "Vendors cannot release escrow funds to themselves".into(),
        ))
    } else {
        Err(ApiError::Forbidden(
            "Not a participant of this escrow account".into(),
        ))
    }
}

/// Check whether `actor` may read `booking`.
///
/// # Errors
///
/// Returns `ApiError::Forbidden` for non-participants.
pub fn authorize_booking_view(actor: &Actor, booking: &Booking) -> Result<(), ApiError> {
    if actor.is_admin || actor.user_id.is_some_and(|u| booking.is_participant(&u)) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "Not a participant of this booking".into(),
        ))
    }
}
