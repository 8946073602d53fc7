//! Key encoding utilities for `RocksDB`.
//!
//! This module provides functions for encoding and decoding keys used in
//! column families. Entity keys are raw UUID/ULID bytes; index keys are
//! `parent_id (16 bytes) || child_id (16 bytes)` so a prefix scan over the
//! parent yields children in ULID (time) order.

use aislepay_core::{BookingId, EscrowId, NotificationId, TransactionId, UserId};

/// Create an escrow account key from an escrow ID.
#[must_use]
pub fn escrow_key(escrow_id: &EscrowId) -> Vec<u8> {
    escrow_id.as_bytes().to_vec()
}

/// Create a booking key from a booking ID.
#[must_use]
pub fn booking_key(booking_id: &BookingId) -> Vec<u8> {
    booking_id.as_bytes().to_vec()
}

/// Create the unique escrow-per-booking index key.
#[must_use]
pub fn escrow_by_booking_key(booking_id: &BookingId) -> Vec<u8> {
    booking_id.as_bytes().to_vec()
}

/// Create a participant index key.
///
/// Format: `user_id (16 bytes) || escrow_id (16 bytes)`.
#[must_use]
pub fn participant_escrow_key(user_id: &UserId, escrow_id: &EscrowId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(escrow_id.as_bytes());
    key
}

/// Create a prefix for iterating all escrows a user participates in.
#[must_use]
pub fn participant_prefix(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Extract the escrow ID from a participant index key.
///
/// # Panics
///
/// Panics if the key is not at least 32 bytes.
#[must_use]
pub fn extract_escrow_id_from_participant_key(key: &[u8]) -> EscrowId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[16..32]);
    EscrowId::from_bytes(bytes)
}

/// Create a transaction key from a transaction ID.
#[must_use]
pub fn transaction_key(transaction_id: &TransactionId) -> Vec<u8> {
    transaction_id.to_bytes().to_vec()
}

/// Create an escrow-transaction index key.
///
/// Format: `escrow_id (16 bytes) || transaction_id (16 bytes)`.
///
/// Since ULIDs are time-ordered, an escrow's ledger entries sort by time.
#[must_use]
pub fn escrow_transaction_key(escrow_id: &EscrowId, transaction_id: &TransactionId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(escrow_id.as_bytes());
    key.extend_from_slice(&transaction_id.to_bytes());
    key
}

/// Create a prefix for iterating all transactions of an escrow account.
#[must_use]
pub fn escrow_transactions_prefix(escrow_id: &EscrowId) -> Vec<u8> {
    escrow_id.as_bytes().to_vec()
}

/// Extract the transaction ID from an escrow-transaction index key.
///
/// # Panics
///
/// Panics if the key is not at least 32 bytes.
#[must_use]
pub fn extract_transaction_id_from_escrow_key(key: &[u8]) -> TransactionId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[16..32]);
    TransactionId::from_bytes(bytes).expect("valid ULID bytes")
}

/// Create a notification key.
///
/// Format: `user_id (16 bytes) || notification_id (16 bytes)`.
#[must_use]
pub fn notification_key(user_id: &UserId, notification_id: &NotificationId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&notification_id.to_bytes());
    key
}

/// Create a prefix for iterating all notifications of a user.
#[must_use]
pub fn user_notifications_prefix(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Create a gateway payment key from the provider's payment id.
#[must_use]
pub fn payment_key(payment_id: &str) -> Vec<u8> {
    payment_id.as_bytes().to_vec()
}

/// Create a webhook event key from the provider's event id.
#[must_use]
pub fn webhook_event_key(event_id: &str) -> Vec<u8> {
    event_id.as_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escrow_key_length() {
        let escrow_id = EscrowId::generate();
        let key = escrow_key(&escrow_id);
        assert_eq!(key.len(), 16);
    }

    #[test]
    fn participant_key_format() {
        let user_id = UserId::generate();
        let escrow_id = EscrowId::generate();
        let key = participant_escrow_key(&user_id, &escrow_id);

        assert_eq!(key.len(), 32);
        assert_eq!(&key[..16], user_id.as_bytes());
        assert_eq!(&key[16..], escrow_id.as_bytes());
        assert_eq!(extract_escrow_id_from_participant_key(&key), escrow_id);
    }

    #[test]
    fn escrow_transaction_key_roundtrip() {
        let escrow_id = EscrowId::generate();
        let tx_id = TransactionId::generate();
        let key = escrow_transaction_key(&escrow_id, &tx_id);

        assert_eq!(key.len(), 32);
        assert_eq!(extract_transaction_id_from_escrow_key(&key), tx_id);
    }

    #[test]
    fn notification_keys_sort_by_time_within_user() {
        let user_id = UserId::generate();
        let a = NotificationId::generate();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = NotificationId::generate();

        assert!(notification_key(&user_id, &a) < notification_key(&user_id, &b));
    }
}
