//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the
//! [`EscrowStore`] trait.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use aislepay_core::{
    Booking, BookingId, BookingPaymentStatus, EscrowAccount, EscrowId, EscrowTransaction,
    GatewayPayment, GatewayPaymentStatus, Notification, UserId, WebhookEvent,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::EscrowStore;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,

    /// Serializes compound read-modify-write mutations. `RocksDB` makes a
    /// `WriteBatch` atomic on disk but does not stop two writers from
    /// reading the same account state first; this lock does.
    mutation_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            mutation_lock: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn lock_mutations(&self) -> std::sync::MutexGuard<'_, ()> {
        // A poisoned lock only means another thread panicked mid-mutation;
        // the batch it was building was never committed.
        self.mutation_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn get_cf_value<T: serde::de::DeserializeOwned>(
        &self,
        cf_name: &str,
        key: &[u8],
    ) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn commit(&self, batch: WriteBatch) -> Result<()> {
        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    /// Fetch an escrow account or fail with `NotFound`.
    fn require_escrow(&self, escrow_id: &EscrowId) -> Result<EscrowAccount> {
        self.get_escrow(escrow_id)?.ok_or(StoreError::NotFound {
            entity: "escrow account",
            id: escrow_id.to_string(),
        })
    }

    /// Stage an updated escrow account into a batch.
    fn stage_escrow(&self, batch: &mut WriteBatch, account: &EscrowAccount) -> Result<()> {
        let cf = self.cf(cf::ESCROWS)?;
        batch.put_cf(&cf, keys::escrow_key(&account.id), Self::serialize(account)?);
        Ok(())
    }

    /// Stage a ledger entry and its escrow index into a batch.
    fn stage_transaction(&self, batch: &mut WriteBatch, tx: &EscrowTransaction) -> Result<()> {
        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        let cf_by_escrow = self.cf(cf::TRANSACTIONS_BY_ESCROW)?;
        batch.put_cf(&cf_tx, keys::transaction_key(&tx.id), Self::serialize(tx)?);
        batch.put_cf(
            &cf_by_escrow,
            keys::escrow_transaction_key(&tx.escrow_id, &tx.id),
            [],
        );
        Ok(())
    }

    /// Stage a booking update into a batch.
    fn stage_booking(&self, batch: &mut WriteBatch, booking: &Booking) -> Result<()> {
        let cf = self.cf(cf::BOOKINGS)?;
        batch.put_cf(
            &cf,
            keys::booking_key(&booking.id),
            Self::serialize(booking)?,
        );
        Ok(())
    }

    /// Stage a gateway payment into a batch.
    fn stage_payment(&self, batch: &mut WriteBatch, payment: &GatewayPayment) -> Result<()> {
        let cf = self.cf(cf::PAYMENTS)?;
        batch.put_cf(
            &cf,
            keys::payment_key(&payment.payment_id),
            Self::serialize(payment)?,
        );
        Ok(())
    }

    /// Check-and-stage a webhook event id. Fails on replay.
    fn stage_webhook_event(&self, batch: &mut WriteBatch, event: &WebhookEvent) -> Result<()> {
        if self.has_webhook_event(&event.event_id)? {
            return Err(StoreError::DuplicateEvent {
                event_id: event.event_id.clone(),
            });
        }
        let cf = self.cf(cf::WEBHOOK_EVENTS)?;
        batch.put_cf(
            &cf,
            keys::webhook_event_key(&event.event_id),
            Self::serialize(event)?,
        );
        Ok(())
    }

    /// Merge an incoming payment with any stored record, keeping the
    /// original `created_at`.
    fn merged_payment(&self, incoming: &GatewayPayment) -> Result<GatewayPayment> {
        let mut payment = incoming.clone();
        if let Some(existing) = self.get_payment(&incoming.payment_id)? {
            payment.created_at = existing.created_at;
            if payment.booking_id.is_none() {
                payment.booking_id = existing.booking_id;
            }
            if payment.order_id.is_none() {
                payment.order_id = existing.order_id;
            }
        }
        payment.updated_at = Utc::now();
        Ok(payment)
    }
}

impl EscrowStore for RocksStore {
    // =========================================================================
    // Booking Operations
    // =========================================================================

    fn put_booking(&self, booking: &Booking) -> Result<()> {
        let cf = self.cf(cf::BOOKINGS)?;
        self.db
            .put_cf(&cf, keys::booking_key(&booking.id), Self::serialize(booking)?)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn get_booking(&self, booking_id: &BookingId) -> Result<Option<Booking>> {
        self.get_cf_value(cf::BOOKINGS, &keys::booking_key(booking_id))
    }

    // =========================================================================
    // Escrow Account Operations
    // =========================================================================

    fn create_escrow(&self, account: &EscrowAccount) -> Result<()> {
        let _guard = self.lock_mutations();

        let cf_by_booking = self.cf(cf::ESCROWS_BY_BOOKING)?;
        let booking_key = keys::escrow_by_booking_key(&account.booking_id);

        // One escrow account per booking, regardless of requester.
        let exists = self
            .db
            .get_cf(&cf_by_booking, &booking_key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .is_some();
        if exists {
            return Err(StoreError::EscrowExists {
                booking_id: account.booking_id.to_string(),
            });
        }

        let cf_participants = self.cf(cf::ESCROWS_BY_PARTICIPANT)?;

        let mut batch = WriteBatch::default();
        self.stage_escrow(&mut batch, account)?;
        batch.put_cf(&cf_by_booking, &booking_key, account.id.as_bytes());
        batch.put_cf(
            &cf_participants,
            keys::participant_escrow_key(&account.user_id, &account.id),
            [],
        );
        batch.put_cf(
            &cf_participants,
            keys::participant_escrow_key(&account.vendor_id, &account.id),
            [],
        );
        self.commit(batch)
    }

    fn get_escrow(&self, escrow_id: &EscrowId) -> Result<Option<EscrowAccount>> {
        self.get_cf_value(cf::ESCROWS, &keys::escrow_key(escrow_id))
    }

    fn get_escrow_by_booking(&self, booking_id: &BookingId) -> Result<Option<EscrowAccount>> {
        let cf = self.cf(cf::ESCROWS_BY_BOOKING)?;
        let escrow_id_bytes = self
            .db
            .get_cf(&cf, keys::escrow_by_booking_key(booking_id))
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let Some(escrow_id_bytes) = escrow_id_bytes else {
            return Ok(None);
        };
        let mut bytes = [0u8; 16];
        if escrow_id_bytes.len() != 16 {
            return Err(StoreError::Database("corrupt booking index entry".into()));
        }
        bytes.copy_from_slice(&escrow_id_bytes);
        self.get_escrow(&EscrowId::from_bytes(bytes))
    }

    fn list_escrows_for_user(&self, user_id: &UserId) -> Result<Vec<EscrowAccount>> {
        let cf = self.cf(cf::ESCROWS_BY_PARTICIPANT)?;
        let prefix = keys::participant_prefix(user_id);

        let iter = self.db.iterator_cf(
            &cf,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        let mut escrow_ids = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            escrow_ids.push(keys::extract_escrow_id_from_participant_key(&key));
        }

        let mut accounts = Vec::with_capacity(escrow_ids.len());
        for escrow_id in escrow_ids {
            if let Some(account) = self.get_escrow(&escrow_id)? {
                accounts.push(account);
            }
        }
        // Newest first.
        accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(accounts)
    }

    fn release(
        &self,
        escrow_id: &EscrowId,
        amount_paise: i64,
        description: String,
        created_by: String,
        external_reference: Option<String>,
    ) -> Result<(EscrowAccount, EscrowTransaction)> {
        let _guard = self.lock_mutations();

        let now = Utc::now();
        let mut account = self.require_escrow(escrow_id)?;
        let fully_released = account.try_release(amount_paise, &created_by, now)?;

        let tx = EscrowTransaction::release(
            &account,
            amount_paise,
            description,
            created_by,
            external_reference,
        );

        let mut batch = WriteBatch::default();
        self.stage_escrow(&mut batch, &account)?;
        self.stage_transaction(&mut batch, &tx)?;

        if fully_released {
            if let Some(mut booking) = self.get_booking(&account.booking_id)? {
                booking.mark_completed(now);
                self.stage_booking(&mut batch, &booking)?;
            } else {
                tracing::warn!(
                    escrow_id = %account.id,
                    booking_id = %account.booking_id,
                    "Escrow fully released but its booking is missing"
                );
            }
        }

        self.commit(batch)?;
        Ok((account, tx))
    }

    fn refund(
        &self,
        escrow_id: &EscrowId,
        amount_paise: i64,
        reason: String,
        created_by: String,
        external_reference: Option<String>,
    ) -> Result<(EscrowAccount, EscrowTransaction)> {
        let _guard = self.lock_mutations();

        let now = Utc::now();
        let mut account = self.require_escrow(escrow_id)?;
        let fully_refunded = account.try_refund(amount_paise, &created_by, now)?;

        let tx = EscrowTransaction::refund(
            &account,
            amount_paise,
            reason.clone(),
            created_by,
            external_reference,
        );

        let mut batch = WriteBatch::default();
        self.stage_escrow(&mut batch, &account)?;
        self.stage_transaction(&mut batch, &tx)?;

        if fully_refunded {
            if let Some(mut booking) = self.get_booking(&account.booking_id)? {
                booking.mark_cancelled(reason, now);
                self.stage_booking(&mut batch, &booking)?;
            } else {
                tracing::warn!(
                    escrow_id = %account.id,
                    booking_id = %account.booking_id,
                    "Escrow fully refunded but its booking is missing"
                );
            }
        }

        self.commit(batch)?;
        Ok((account, tx))
    }

    fn open_dispute(
        &self,
        escrow_id: &EscrowId,
        reason: &str,
        created_by: &str,
    ) -> Result<EscrowAccount> {
        let _guard = self.lock_mutations();

        let now = Utc::now();
        let mut account = self.require_escrow(escrow_id)?;
        account.open_dispute(created_by, now)?;
        if !account.notes.is_empty() {
            account.notes.push('\n');
        }
        account
            .notes
            .push_str(&format!("[{}] dispute reason: {reason}", now.format("%Y-%m-%d %H:%M:%S UTC")));

        let mut batch = WriteBatch::default();
        self.stage_escrow(&mut batch, &account)?;
        self.commit(batch)?;
        Ok(account)
    }

    fn list_due_auto_release(&self, now: DateTime<Utc>) -> Result<Vec<EscrowAccount>> {
        // Full scan; the sweepable set is small (funded accounts past their
        // deadline leave it on the next sweep).
        let cf = self.cf(cf::ESCROWS)?;
        let mut due = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            let account: EscrowAccount = Self::deserialize(&value)?;
            if account.auto_release_due(now) {
                due.push(account);
            }
        }
        Ok(due)
    }

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    fn list_transactions_by_escrow(
        &self,
        escrow_id: &EscrowId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<EscrowTransaction>> {
        let cf_by_escrow = self.cf(cf::TRANSACTIONS_BY_ESCROW)?;
        let prefix = keys::escrow_transactions_prefix(escrow_id);

        let iter = self.db.iterator_cf(
            &cf_by_escrow,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        // Collect matching keys; ULID suffixes make them time-ordered.
        let mut all_keys: Vec<Vec<u8>> = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            all_keys.push(key.to_vec());
        }

        // Reverse to get newest first.
        all_keys.reverse();

        let mut transactions = Vec::new();
        for key in all_keys.into_iter().skip(offset) {
            if transactions.len() >= limit {
                break;
            }
            let tx_id = keys::extract_transaction_id_from_escrow_key(&key);
            if let Some(tx) =
                self.get_cf_value::<EscrowTransaction>(cf::TRANSACTIONS, &keys::transaction_key(&tx_id))?
            {
                transactions.push(tx);
            }
        }

        Ok(transactions)
    }

    // =========================================================================
    // Gateway Payment / Webhook Operations
    // =========================================================================

    fn get_payment(&self, payment_id: &str) -> Result<Option<GatewayPayment>> {
        self.get_cf_value(cf::PAYMENTS, &keys::payment_key(payment_id))
    }

    fn has_webhook_event(&self, event_id: &str) -> Result<bool> {
        let cf = self.cf(cf::WEBHOOK_EVENTS)?;
        let exists = self
            .db
            .get_cf(&cf, keys::webhook_event_key(event_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .is_some();
        Ok(exists)
    }

    fn record_payment_captured(
        &self,
        event: &WebhookEvent,
        payment: &GatewayPayment,
    ) -> Result<Option<EscrowAccount>> {
        let _guard = self.lock_mutations();

        let now = Utc::now();
        let mut batch = WriteBatch::default();
        self.stage_webhook_event(&mut batch, event)?;

        let payment = self.merged_payment(payment)?;
        self.stage_payment(&mut batch, &payment)?;

        // Fund the booking's pending escrow account, if there is one.
        let mut funded = None;
        if let Some(booking_id) = payment.booking_id {
            if let Some(mut account) = self.get_escrow_by_booking(&booking_id)? {
                if account.mark_funded(now).is_ok() {
                    self.stage_escrow(&mut batch, &account)?;
                    funded = Some(account);
                } else {
                    tracing::debug!(
                        escrow_id = %account.id,
                        status = ?account.status,
                        "Payment captured for an already-funded escrow account"
                    );
                }
            }

            if let Some(mut booking) = self.get_booking(&booking_id)? {
                if booking.payment_status == BookingPaymentStatus::Unpaid {
                    booking.payment_status = BookingPaymentStatus::AdvancePaid;
                    booking.updated_at = now;
                    self.stage_booking(&mut batch, &booking)?;
                }
            }
        }

        self.commit(batch)?;
        Ok(funded)
    }

    fn record_order_paid(&self, event: &WebhookEvent, payment: &GatewayPayment) -> Result<()> {
        let _guard = self.lock_mutations();

        let now = Utc::now();
        let mut batch = WriteBatch::default();
        self.stage_webhook_event(&mut batch, event)?;

        let payment = self.merged_payment(payment)?;
        self.stage_payment(&mut batch, &payment)?;

        if let Some(booking_id) = payment.booking_id {
            if let Some(mut booking) = self.get_booking(&booking_id)? {
                booking.payment_status = BookingPaymentStatus::FullyPaid;
                booking.updated_at = now;
                self.stage_booking(&mut batch, &booking)?;
            }
        }

        self.commit(batch)
    }

    fn record_payment_failed(&self, event: &WebhookEvent, payment: &GatewayPayment) -> Result<()> {
        let _guard = self.lock_mutations();

        let mut batch = WriteBatch::default();
        self.stage_webhook_event(&mut batch, event)?;

        let payment = self.merged_payment(payment)?;
        self.stage_payment(&mut batch, &payment)?;

        self.commit(batch)
    }

    fn record_refund_created(
        &self,
        event: &WebhookEvent,
        payment_id: &str,
    ) -> Result<Option<GatewayPayment>> {
        let _guard = self.lock_mutations();

        let mut batch = WriteBatch::default();
        self.stage_webhook_event(&mut batch, event)?;

        let updated = if let Some(mut payment) = self.get_payment(payment_id)? {
            payment.status = GatewayPaymentStatus::Refunded;
            payment.updated_at = Utc::now();
            self.stage_payment(&mut batch, &payment)?;
            Some(payment)
        } else {
            tracing::debug!(payment_id = %payment_id, "Refund created for an unknown payment");
            None
        };

        self.commit(batch)?;
        Ok(updated)
    }

    // =========================================================================
    // Notification Operations
    // =========================================================================

    fn put_notification(&self, notification: &Notification) -> Result<()> {
        let cf = self.cf(cf::NOTIFICATIONS)?;
        self.db
            .put_cf(
                &cf,
                keys::notification_key(&notification.user_id, &notification.id),
                Self::serialize(notification)?,
            )
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn list_notifications_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Notification>> {
        let cf = self.cf(cf::NOTIFICATIONS)?;
        let prefix = keys::user_notifications_prefix(user_id);

        let iter = self.db.iterator_cf(
            &cf,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        let mut all: Vec<Notification> = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            all.push(Self::deserialize(&value)?);
        }

        // Reverse to get newest first.
        all.reverse();
        Ok(all.into_iter().skip(offset).take(limit).collect())
    }
}
