//! Core types and utilities for AislePay.
//!
//! This crate provides the foundational types used throughout the AislePay
//! escrow platform:
//!
//! - **Identifiers**: `UserId`, `BookingId`, `EscrowId`, `TransactionId`,
//!   `NotificationId`
//! - **Escrow**: `EscrowAccount`, `EscrowStatus`, `EscrowTerms` — the
//!   held-funds state machine
//! - **Ledger**: `EscrowTransaction`, `TransactionKind`
//! - **Bookings**: `Booking`, `BookingStatus`, `BookingPaymentStatus`
//! - **Payments**: `GatewayPayment`, `WebhookEvent`
//! - **Notifications**: `Notification`, `NotificationKind`
//!
//! # Money
//!
//! **All amounts are integer paise** (1 INR = 100 paise), stored as `i64`
//! to avoid floating point precision issues:
//!
//! - A booking worth ₹1,00,000 carries `total_paise = 10_000_000`
//! - Releasing ₹30,000 moves `released_paise` by `3_000_000`

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod booking;
pub mod error;
pub mod escrow;
pub mod ids;
pub mod ledger;
pub mod notification;
pub mod payment;

pub use booking::{Booking, BookingPaymentStatus, BookingStatus};
pub use error::{EscrowError, Result};
pub use escrow::{
    EscrowAccount, EscrowStatus, EscrowTerms, CURRENCY, DEFAULT_ADVANCE_PERCENT,
    DEFAULT_AUTO_RELEASE_DAYS, DEFAULT_COMMISSION_PERCENT, MAX_ADVANCE_PERCENT,
    MAX_AUTO_RELEASE_DAYS, MAX_COMMISSION_PERCENT, MIN_ADVANCE_PERCENT, MIN_AUTO_RELEASE_DAYS,
};
pub use ids::{BookingId, EscrowId, IdError, NotificationId, TransactionId, UserId};
pub use ledger::{EscrowTransaction, TransactionKind};
pub use notification::{Notification, NotificationKind};
pub use payment::{GatewayPayment, GatewayPaymentStatus, WebhookEvent};
