//! `RocksDB` storage layer for AislePay.
//!
//! This crate provides persistent storage for escrow accounts, ledger
//! transactions, bookings, gateway payments, notifications, and processed
//! webhook events, using `RocksDB` with column families for indexing.
//!
//! # Atomicity
//!
//! Every compound mutation (escrow creation, release, refund, dispute,
//! webhook event processing) runs under a store-level mutation lock and
//! commits through a single `WriteBatch`. The availability check, the
//! accumulator update, the ledger append, the booking side effect, and the
//! idempotency record therefore land together or not at all — two
//! concurrent releases can never both observe the same `released_paise`.
//!
//! # Example
//!
//! ```no_run
//! use aislepay_store::{EscrowStore, RocksStore};
//! use aislepay_core::{Booking, EscrowAccount, EscrowTerms, UserId};
//! use chrono::NaiveDate;
//!
//! let store = RocksStore::open("/tmp/aislepay-db").unwrap();
//!
//! let customer = UserId::generate();
//! let vendor = UserId::generate();
//! let booking = Booking::new(
//!     customer,
//!     vendor,
//!     "banquet hall".into(),
//!     NaiveDate::from_ymd_opt(2026, 12, 5).unwrap(),
//!     500_000,
//! );
//! store.put_booking(&booking).unwrap();
//!
//! let account =
//!     EscrowAccount::new(booking.id, customer, vendor, 500_000, EscrowTerms::default()).unwrap();
//! store.create_escrow(&account).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;

use chrono::{DateTime, Utc};

use aislepay_core::{
    Booking, BookingId, EscrowAccount, EscrowId, EscrowTransaction, GatewayPayment, Notification,
    UserId, WebhookEvent,
};

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different
/// implementations (e.g. `RocksDB`, in-memory for testing).
pub trait EscrowStore: Send + Sync {
    // =========================================================================
    // Booking Operations
    // =========================================================================

    /// Insert or update a booking record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_booking(&self, booking: &Booking) -> Result<()>;

    /// Get a booking by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_booking(&self, booking_id: &BookingId) -> Result<Option<Booking>>;

    // =========================================================================
    // Escrow Account Operations
    // =========================================================================

    /// Create an escrow account, enforcing one account per booking.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::EscrowExists` if the booking already has an
    /// escrow account.
    fn create_escrow(&self, account: &EscrowAccount) -> Result<()>;

    /// Get an escrow account by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_escrow(&self, escrow_id: &EscrowId) -> Result<Option<EscrowAccount>>;

    /// Get the escrow account owning a booking, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_escrow_by_booking(&self, booking_id: &BookingId) -> Result<Option<EscrowAccount>>;

    /// List all escrow accounts the user participates in (as payer or
    /// vendor), newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_escrows_for_user(&self, user_id: &UserId) -> Result<Vec<EscrowAccount>>;

    /// Release held funds to the vendor.
    ///
    /// Atomically: re-checks status and the available balance, moves the
    /// accumulator, appends the ledger entry, and — when the account
    /// reaches `Released` — completes the booking. Returns the updated
    /// account and the ledger entry.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the account doesn't exist.
    /// - `StoreError::Domain` if the amount or status rejects the release;
    ///   nothing is written in that case.
    fn release(
        &self,
        escrow_id: &EscrowId,
        amount_paise: i64,
        description: String,
        created_by: String,
        external_reference: Option<String>,
    ) -> Result<(EscrowAccount, EscrowTransaction)>;

    /// Refund held funds to the customer.
    ///
    /// Atomically symmetric to [`Self::release`]; when the account reaches
    /// `Refunded` the booking is cancelled with the given reason.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::release`].
    fn refund(
        &self,
        escrow_id: &EscrowId,
        amount_paise: i64,
        reason: String,
        created_by: String,
        external_reference: Option<String>,
    ) -> Result<(EscrowAccount, EscrowTransaction)>;

    /// Place an escrow account under dispute.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the account doesn't exist.
    /// - `StoreError::Domain` if the current status forbids disputing.
    fn open_dispute(
        &self,
        escrow_id: &EscrowId,
        reason: &str,
        created_by: &str,
    ) -> Result<EscrowAccount>;

    /// List escrow accounts whose auto-release deadline has passed while
    /// funds remain held.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_due_auto_release(&self, now: DateTime<Utc>) -> Result<Vec<EscrowAccount>>;

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    /// List ledger entries for an escrow account, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_transactions_by_escrow(
        &self,
        escrow_id: &EscrowId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<EscrowTransaction>>;

    // =========================================================================
    // Gateway Payment / Webhook Operations
    // =========================================================================

    /// Get a gateway payment by the provider's payment id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_payment(&self, payment_id: &str) -> Result<Option<GatewayPayment>>;

    /// Check whether a webhook event has already been processed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn has_webhook_event(&self, event_id: &str) -> Result<bool>;

    /// Process a `payment.captured` delivery: record the payment, fund the
    /// booking's pending escrow account if one exists, advance the
    /// booking's payment status, and persist the event id — atomically.
    ///
    /// Returns the newly funded escrow account, if any.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateEvent` for a replayed event id; no
    /// state is touched in that case.
    fn record_payment_captured(
        &self,
        event: &WebhookEvent,
        payment: &GatewayPayment,
    ) -> Result<Option<EscrowAccount>>;

    /// Process an `order.paid` delivery: record the payment and mark the
    /// booking fully paid, atomically with the event id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateEvent` for a replayed event id.
    fn record_order_paid(&self, event: &WebhookEvent, payment: &GatewayPayment) -> Result<()>;

    /// Process a `payment.failed` delivery: record the failed payment,
    /// atomically with the event id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateEvent` for a replayed event id.
    fn record_payment_failed(&self, event: &WebhookEvent, payment: &GatewayPayment) -> Result<()>;

    /// Process a `refund.created` delivery: mark the referenced payment
    /// refunded, atomically with the event id.
    ///
    /// Returns the updated payment, if it was known.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateEvent` for a replayed event id.
    fn record_refund_created(
        &self,
        event: &WebhookEvent,
        payment_id: &str,
    ) -> Result<Option<GatewayPayment>>;

    // =========================================================================
    // Notification Operations
    // =========================================================================

    /// Insert a notification record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_notification(&self, notification: &Notification) -> Result<()>;

    /// List a user's notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_notifications_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Notification>>;
}
