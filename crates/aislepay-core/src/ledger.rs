//! Append-only ledger entries for escrow fund movements.
//!
//! Every accepted release or refund records exactly one
//! [`EscrowTransaction`]; entries are never mutated afterwards. Because the
//! store appends the entry in the same atomic write that moves the
//! accumulator, the ledger always reconciles with the account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::escrow::EscrowAccount;
use crate::ids::{EscrowId, TransactionId, UserId};

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Held funds moved to the vendor.
    Release,

    /// Held funds moved back to the customer.
    Refund,
}

/// A single movement of held funds, recorded once and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowTransaction {
    /// Unique transaction ID (ULID for time-ordering).
    pub id: TransactionId,

    /// The escrow account this entry belongs to.
    pub escrow_id: EscrowId,

    /// Release or refund.
    pub kind: TransactionKind,

    /// Amount moved, in paise. Always positive.
    pub amount_paise: i64,

    /// The party funds moved away from.
    pub from_user: UserId,

    /// The party funds moved to.
    pub to_user: UserId,

    /// Human-readable description (operator notes or refund reason).
    pub description: String,

    /// Who initiated the movement: a user id, `admin`, or `system`.
    pub created_by: String,

    /// Optional transfer/refund reference at the payment gateway.
    pub external_reference: Option<String>,

    /// When the movement was applied.
    pub processed_at: DateTime<Utc>,

    /// When the entry was created.
    pub created_at: DateTime<Utc>,
}

impl EscrowTransaction {
    /// Record a release: customer-held funds to the vendor.
    #[must_use]
    pub fn release(
        account: &EscrowAccount,
        amount_paise: i64,
        description: String,
        created_by: String,
        external_reference: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TransactionId::generate(),
            escrow_id: account.id,
            kind: TransactionKind::Release,
            amount_paise,
            from_user: account.user_id,
            to_user: account.vendor_id,
            description,
            created_by,
            external_reference,
            processed_at: now,
            created_at: now,
        }
    }

    /// Record a refund: held funds back to the customer.
    #[must_use]
    pub fn refund(
        account: &EscrowAccount,
        amount_paise: i64,
        reason: String,
        created_by: String,
        external_reference: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TransactionId::generate(),
            escrow_id: account.id,
            kind: TransactionKind::Refund,
            amount_paise,
            from_user: account.vendor_id,
            to_user: account.user_id,
            description: reason,
            created_by,
            external_reference,
            processed_at: now,
            created_at: now,
        }
    }
}
