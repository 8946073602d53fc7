//! Escrow account types and the held-funds state machine.
//!
//! An [`EscrowAccount`] holds a customer's payment for one booking until it
//! is released to the vendor or refunded to the customer. The account owns
//! three amounts: the immutable `total_paise` fixed at creation, and two
//! monotonically non-decreasing accumulators `released_paise` and
//! `refunded_paise`. The status is derived from those numbers; all
//! transitions go through the fallible methods here so every caller (HTTP
//! handlers, the auto-release sweeper, tests) enforces identical rules.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EscrowError, Result};
use crate::ids::{BookingId, EscrowId, UserId};

// ============================================================================
// Constants
// ============================================================================

/// Default advance payment percentage of the booking total.
pub const DEFAULT_ADVANCE_PERCENT: u8 = 30;

/// Minimum permitted advance percentage.
pub const MIN_ADVANCE_PERCENT: u8 = 10;

/// Maximum permitted advance percentage.
pub const MAX_ADVANCE_PERCENT: u8 = 100;

/// Default platform commission percentage.
pub const DEFAULT_COMMISSION_PERCENT: u8 = 10;

/// Maximum permitted commission percentage.
pub const MAX_COMMISSION_PERCENT: u8 = 30;

/// Default hold period before the remaining balance auto-releases.
pub const DEFAULT_AUTO_RELEASE_DAYS: i64 = 7;

/// Minimum permitted hold period in days.
pub const MIN_AUTO_RELEASE_DAYS: i64 = 1;

/// Maximum permitted hold period in days.
pub const MAX_AUTO_RELEASE_DAYS: i64 = 90;

/// All escrow accounts are denominated in Indian rupees.
pub const CURRENCY: &str = "INR";

/// Status of an escrow account.
///
/// Terminal states are `Released` and `Refunded`. `Disputed` is entered
/// manually, outside the normal flow, and still accepts refunds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscrowStatus {
    /// Created, awaiting payment capture from the gateway.
    Pending,

    /// Payment captured; the full amount is held.
    Funded,

    /// Part of the total has been released to the vendor.
    PartialReleased,

    /// The full total has been released to the vendor.
    Released,

    /// The unreleased remainder has been refunded to the customer.
    Refunded,

    /// Under dispute; releases are blocked, refunds remain possible.
    Disputed,
}

impl EscrowStatus {
    /// Whether the account can accept a release.
    #[must_use]
    pub const fn releasable(self) -> bool {
        matches!(self, Self::Funded | Self::PartialReleased)
    }

    /// Whether the account can accept a refund.
    #[must_use]
    pub const fn refundable(self) -> bool {
        matches!(self, Self::Funded | Self::PartialReleased | Self::Disputed)
    }

    /// Whether no further fund movement is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Released | Self::Refunded)
    }
}

/// Commercial terms applied when an escrow account is created.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EscrowTerms {
    /// Advance payment percentage (10–100).
    pub advance_percent: u8,

    /// Platform commission percentage (0–30).
    pub commission_percent: u8,

    /// Days until the remaining balance auto-releases (1–90).
    pub auto_release_days: i64,
}

impl Default for EscrowTerms {
    fn default() -> Self {
        Self {
            advance_percent: DEFAULT_ADVANCE_PERCENT,
            commission_percent: DEFAULT_COMMISSION_PERCENT,
            auto_release_days: DEFAULT_AUTO_RELEASE_DAYS,
        }
    }
}

impl EscrowTerms {
    /// Check all terms against their permitted bounds.
    ///
    /// # Errors
    ///
    /// Returns `EscrowError::InvalidTerms` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_ADVANCE_PERCENT..=MAX_ADVANCE_PERCENT).contains(&self.advance_percent) {
            return Err(EscrowError::InvalidTerms {
                field: "advance_percent",
                message: format!(
                    "must be between {MIN_ADVANCE_PERCENT} and {MAX_ADVANCE_PERCENT}, got {}",
                    self.advance_percent
                ),
            });
        }
        if self.commission_percent > MAX_COMMISSION_PERCENT {
            return Err(EscrowError::InvalidTerms {
                field: "commission_percent",
                message: format!(
                    "must be at most {MAX_COMMISSION_PERCENT}, got {}",
                    self.commission_percent
                ),
            });
        }
        if !(MIN_AUTO_RELEASE_DAYS..=MAX_AUTO_RELEASE_DAYS).contains(&self.auto_release_days) {
            return Err(EscrowError::InvalidTerms {
                field: "auto_release_days",
                message: format!(
                    "must be between {MIN_AUTO_RELEASE_DAYS} and {MAX_AUTO_RELEASE_DAYS}, got {}",
                    self.auto_release_days
                ),
            });
        }
        Ok(())
    }
}

/// A held-funds ledger associated 1:1 with a booking, mediating between the
/// paying customer and the paid vendor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowAccount {
    /// Unique account identifier.
    pub id: EscrowId,

    /// The owning booking (exactly one escrow account per booking).
    pub booking_id: BookingId,

    /// The paying customer.
    pub user_id: UserId,

    /// The vendor being paid.
    pub vendor_id: UserId,

    /// Total held amount in paise. Fixed at creation; never changes.
    pub total_paise: i64,

    /// Amount released to the vendor so far. Monotone non-decreasing.
    pub released_paise: i64,

    /// Amount refunded to the customer so far. Monotone non-decreasing.
    pub refunded_paise: i64,

    /// Advance portion of the total, derived from the advance percentage.
    pub advance_paise: i64,

    /// Remainder due after the advance.
    pub balance_paise: i64,

    /// Platform commission, derived from the commission percentage.
    pub commission_paise: i64,

    /// Commission percentage used at creation.
    pub commission_percent: u8,

    /// Currency code; always `INR`.
    pub currency: String,

    /// Deadline after which the remaining balance auto-releases.
    pub auto_release_at: DateTime<Utc>,

    /// Current account status.
    pub status: EscrowStatus,

    /// Free-text audit trail; each release/refund appends one line.
    pub notes: String,

    /// Set once, when the account reaches `Released`.
    pub released_at: Option<DateTime<Utc>>,

    /// When the account was created.
    pub created_at: DateTime<Utc>,

    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl EscrowAccount {
    /// Create a new account in `Pending` with the derived amounts filled in.
    ///
    /// # Errors
    ///
    /// Returns `EscrowError::InvalidAmount` for a non-positive total and
    /// `EscrowError::InvalidTerms` for out-of-bounds terms.
    pub fn new(
        booking_id: BookingId,
        user_id: UserId,
        vendor_id: UserId,
        total_paise: i64,
        terms: EscrowTerms,
    ) -> Result<Self> {
        if total_paise <= 0 {
            return Err(EscrowError::InvalidAmount(total_paise));
        }
        terms.validate()?;

        let advance_paise = total_paise * i64::from(terms.advance_percent) / 100;
        let commission_paise = total_paise * i64::from(terms.commission_percent) / 100;
        let now = Utc::now();

        Ok(Self {
            id: EscrowId::generate(),
            booking_id,
            user_id,
            vendor_id,
            total_paise,
            released_paise: 0,
            refunded_paise: 0,
            advance_paise,
            balance_paise: total_paise - advance_paise,
            commission_paise,
            commission_percent: terms.commission_percent,
            currency: CURRENCY.to_string(),
            auto_release_at: now + Duration::days(terms.auto_release_days),
            status: EscrowStatus::Pending,
            notes: String::new(),
            released_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// The amount still held: `total - released - refunded`.
    #[must_use]
    pub const fn available_paise(&self) -> i64 {
        self.total_paise - self.released_paise - self.refunded_paise
    }

    /// Whether the auto-release deadline has passed while funds remain held.
    #[must_use]
    pub fn auto_release_due(&self, now: DateTime<Utc>) -> bool {
        self.status.releasable() && now >= self.auto_release_at && self.available_paise() > 0
    }

    /// Mark the account funded after the gateway captures the payment.
    ///
    /// # Errors
    ///
    /// Returns `EscrowError::InvalidState` unless the account is `Pending`.
    pub fn mark_funded(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.status != EscrowStatus::Pending {
            return Err(EscrowError::InvalidState {
                operation: "fund",
                status: self.status,
            });
        }
        self.status = EscrowStatus::Funded;
        self.updated_at = now;
        Ok(())
    }

    /// Move `amount_paise` from held to released.
    ///
    /// On success the status becomes `Released` when the full total has been
    /// released (setting `released_at`), otherwise `PartialReleased`.
    /// Returns `true` when this call made the account fully released.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` for a non-positive amount.
    /// - `InvalidState` unless the status is `Funded` or `PartialReleased`.
    /// - `InsufficientFunds` when the amount exceeds the available balance;
    ///   the account is left untouched.
    pub fn try_release(
        &mut self,
        amount_paise: i64,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        if amount_paise <= 0 {
            return Err(EscrowError::InvalidAmount(amount_paise));
        }
        if !self.status.releasable() {
            return Err(EscrowError::InvalidState {
                operation: "release",
                status: self.status,
            });
        }
        let available = self.available_paise();
        if amount_paise > available {
            return Err(EscrowError::InsufficientFunds {
                available_paise: available,
                requested_paise: amount_paise,
            });
        }

        self.released_paise += amount_paise;
        let fully_released = self.released_paise >= self.total_paise;
        if fully_released {
            self.status = EscrowStatus::Released;
            self.released_at = Some(now);
        } else {
            self.status = EscrowStatus::PartialReleased;
        }
        self.append_note(now, &format!("released {amount_paise} paise by {actor}"));
        self.updated_at = now;
        Ok(fully_released)
    }

    /// Move `amount_paise` from held back to the customer.
    ///
    /// The status becomes `Refunded` once refunds cover the unreleased
    /// remainder (`refunded >= total - released`); otherwise it is left
    /// unchanged. Returns `true` when this call closed the account.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::try_release`], except `Disputed`
    /// accounts are also refundable.
    pub fn try_refund(
        &mut self,
        amount_paise: i64,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        if amount_paise <= 0 {
            return Err(EscrowError::InvalidAmount(amount_paise));
        }
        if !self.status.refundable() {
            return Err(EscrowError::InvalidState {
                operation: "refund",
                status: self.status,
            });
        }
        let available = self.available_paise();
        if amount_paise > available {
            return Err(EscrowError::InsufficientFunds {
                available_paise: available,
                requested_paise: amount_paise,
            });
        }

        self.refunded_paise += amount_paise;
        let fully_refunded = self.refunded_paise >= self.total_paise - self.released_paise;
        if fully_refunded {
            self.status = EscrowStatus::Refunded;
        }
        self.append_note(now, &format!("refunded {amount_paise} paise by {actor}"));
        self.updated_at = now;
        Ok(fully_refunded)
    }

    /// Place the account under dispute.
    ///
    /// # Errors
    ///
    /// Returns `EscrowError::InvalidState` unless the status is `Funded` or
    /// `PartialReleased`.
    pub fn open_dispute(&mut self, actor: &str, now: DateTime<Utc>) -> Result<()> {
        if !self.status.releasable() {
            return Err(EscrowError::InvalidState {
                operation: "dispute",
                status: self.status,
            });
        }
        self.status = EscrowStatus::Disputed;
        self.append_note(now, &format!("dispute opened by {actor}"));
        self.updated_at = now;
        Ok(())
    }

    fn append_note(&mut self, now: DateTime<Utc>, line: &str) {
        if !self.notes.is_empty() {
            self.notes.push('\n');
        }
        self.notes
            .push_str(&format!("[{}] {line}", now.format("%Y-%m-%d %H:%M:%S UTC")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn funded_account(total_paise: i64) -> EscrowAccount {
        let mut account = EscrowAccount::new(
            BookingId::generate(),
            UserId::generate(),
            UserId::generate(),
            total_paise,
            EscrowTerms::default(),
        )
        .unwrap();
        account.mark_funded(Utc::now()).unwrap();
        account
    }

    #[test]
    fn new_account_derives_amounts() {
        let account = EscrowAccount::new(
            BookingId::generate(),
            UserId::generate(),
            UserId::generate(),
            100_000,
            EscrowTerms::default(),
        )
        .unwrap();

        assert_eq!(account.status, EscrowStatus::Pending);
        assert_eq!(account.advance_paise, 30_000);
        assert_eq!(account.balance_paise, 70_000);
        assert_eq!(account.commission_paise, 10_000);
        assert_eq!(account.currency, "INR");
        assert_eq!(account.available_paise(), 100_000);
    }

    #[test]
    fn new_account_rejects_bad_terms() {
        let result = EscrowAccount::new(
            BookingId::generate(),
            UserId::generate(),
            UserId::generate(),
            100_000,
            EscrowTerms {
                advance_percent: 5,
                ..EscrowTerms::default()
            },
        );
        assert!(matches!(
            result,
            Err(EscrowError::InvalidTerms {
                field: "advance_percent",
                ..
            })
        ));

        let result = EscrowAccount::new(
            BookingId::generate(),
            UserId::generate(),
            UserId::generate(),
            0,
            EscrowTerms::default(),
        );
        assert_eq!(result.unwrap_err(), EscrowError::InvalidAmount(0));
    }

    #[test]
    fn release_all_in_two_steps() {
        let mut account = funded_account(100_000);

        let closed = account.try_release(30_000, "customer", Utc::now()).unwrap();
        assert!(!closed);
        assert_eq!(account.status, EscrowStatus::PartialReleased);
        assert_eq!(account.available_paise(), 70_000);
        assert!(account.released_at.is_none());

        let closed = account.try_release(70_000, "customer", Utc::now()).unwrap();
        assert!(closed);
        assert_eq!(account.status, EscrowStatus::Released);
        assert_eq!(account.available_paise(), 0);
        assert!(account.released_at.is_some());
    }

    #[test]
    fn over_release_is_rejected_without_mutation() {
        let mut account = funded_account(50_000);
        let before = account.clone();

        let err = account.try_release(60_000, "customer", Utc::now()).unwrap_err();
        assert_eq!(
            err,
            EscrowError::InsufficientFunds {
                available_paise: 50_000,
                requested_paise: 60_000,
            }
        );
        assert_eq!(account.released_paise, before.released_paise);
        assert_eq!(account.status, before.status);
        assert_eq!(account.notes, before.notes);
    }

    #[test]
    fn full_refund_closes_the_account() {
        let mut account = funded_account(50_000);
        let closed = account.try_refund(50_000, "vendor", Utc::now()).unwrap();
        assert!(closed);
        assert_eq!(account.status, EscrowStatus::Refunded);
        assert_eq!(account.available_paise(), 0);
    }

    #[test]
    fn refund_covers_the_unreleased_remainder() {
        let mut account = funded_account(100_000);
        account.try_release(40_000, "customer", Utc::now()).unwrap();

        // A partial refund leaves the status alone.
        let closed = account.try_refund(10_000, "customer", Utc::now()).unwrap();
        assert!(!closed);
        assert_eq!(account.status, EscrowStatus::PartialReleased);

        // Covering the remaining 50_000 closes it.
        let closed = account.try_refund(50_000, "customer", Utc::now()).unwrap();
        assert!(closed);
        assert_eq!(account.status, EscrowStatus::Refunded);
        assert_eq!(
            account.released_paise + account.refunded_paise,
            account.total_paise
        );
    }

    #[test]
    fn invariant_holds_across_mixed_operations() {
        let mut account = funded_account(90_000);
        account.try_release(20_000, "a", Utc::now()).unwrap();
        account.try_refund(30_000, "b", Utc::now()).unwrap();
        account.try_release(15_000, "a", Utc::now()).unwrap();
        assert!(account.released_paise + account.refunded_paise <= account.total_paise);
        assert_eq!(account.available_paise(), 25_000);
    }

    #[test]
    fn disputed_blocks_release_allows_refund() {
        let mut account = funded_account(10_000);
        account.open_dispute("customer", Utc::now()).unwrap();
        assert_eq!(account.status, EscrowStatus::Disputed);

        let err = account.try_release(1_000, "customer", Utc::now()).unwrap_err();
        assert!(matches!(err, EscrowError::InvalidState { operation: "release", .. }));

        account.try_refund(10_000, "admin", Utc::now()).unwrap();
        assert_eq!(account.status, EscrowStatus::Refunded);
    }

    #[test]
    fn pending_account_rejects_release() {
        let mut account = EscrowAccount::new(
            BookingId::generate(),
            UserId::generate(),
            UserId::generate(),
            10_000,
            EscrowTerms::default(),
        )
        .unwrap();

        let err = account.try_release(1_000, "customer", Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            EscrowError::InvalidState {
                operation: "release",
                status: EscrowStatus::Pending,
            }
        ));
    }

    #[test]
    fn auto_release_due_respects_status_and_deadline() {
        let mut account = funded_account(10_000);
        assert!(!account.auto_release_due(Utc::now()));
        assert!(account.auto_release_due(account.auto_release_at + Duration::hours(1)));

        account.open_dispute("customer", Utc::now()).unwrap();
        assert!(!account.auto_release_due(account.auto_release_at + Duration::hours(1)));
    }

    #[test]
    fn notes_accumulate_audit_lines() {
        let mut account = funded_account(10_000);
        account.try_release(2_000, "customer", Utc::now()).unwrap();
        account.try_refund(1_000, "vendor", Utc::now()).unwrap();
        let lines: Vec<&str> = account.notes.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("released 2000 paise by customer"));
        assert!(lines[1].contains("refunded 1000 paise by vendor"));
    }
}
