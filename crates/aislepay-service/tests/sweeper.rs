//! Auto-release sweeper integration tests.

mod common;

use chrono::{Duration, Utc};
use common::TestHarness;

use aislepay_core::{EscrowStatus, EscrowTerms};
use aislepay_service::sweeper;
use aislepay_store::EscrowStore;

/// Seed a funded escrow account whose hold period already expired.
async fn seed_past_due(harness: &TestHarness, total_paise: i64) -> aislepay_core::EscrowId {
    let booking_id = harness.create_booking(total_paise).await;

    let mut account = aislepay_core::EscrowAccount::new(
        booking_id.parse().unwrap(),
        harness.customer,
        harness.vendor,
        total_paise,
        EscrowTerms::default(),
    )
    .unwrap();
    account.mark_funded(Utc::now()).unwrap();
    account.auto_release_at = Utc::now() - Duration::hours(1);
    harness.state.store.create_escrow(&account).unwrap();
    account.id
}

#[tokio::test]
async fn sweep_releases_past_due_accounts_once() {
    let harness = TestHarness::new();
    let escrow_id = seed_past_due(&harness, 50_000).await;

    let released = sweeper::sweep_once(&harness.state).unwrap();
    assert_eq!(released, 1);

    let account = harness.state.store.get_escrow(&escrow_id).unwrap().unwrap();
    assert_eq!(account.status, EscrowStatus::Released);
    assert_eq!(account.available_paise(), 0);
    assert!(account.notes.contains("released 50000 paise by system"));

    let booking = harness
        .state
        .store
        .get_booking(&account.booking_id)
        .unwrap()
        .unwrap();
    assert_eq!(booking.status, aislepay_core::BookingStatus::Completed);

    let ledger = harness
        .state
        .store
        .list_transactions_by_escrow(&escrow_id, 10, 0)
        .unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].created_by, "system");

    // A second sweep finds nothing to do.
    let released = sweeper::sweep_once(&harness.state).unwrap();
    assert_eq!(released, 0);
    let ledger = harness
        .state
        .store
        .list_transactions_by_escrow(&escrow_id, 10, 0)
        .unwrap();
    assert_eq!(ledger.len(), 1);
}

#[tokio::test]
async fn sweep_releases_only_the_remaining_balance() {
    let harness = TestHarness::new();
    let escrow_id = seed_past_due(&harness, 100_000).await;

    // Part of the total was already released by hand.
    harness
        .state
        .store
        .release(&escrow_id, 30_000, String::new(), "admin".into(), None)
        .unwrap();

    let released = sweeper::sweep_once(&harness.state).unwrap();
    assert_eq!(released, 1);

    let account = harness.state.store.get_escrow(&escrow_id).unwrap().unwrap();
    assert_eq!(account.status, EscrowStatus::Released);
    assert_eq!(account.released_paise, 100_000);
}

#[tokio::test]
async fn sweep_skips_disputed_and_unexpired_accounts() {
    let harness = TestHarness::new();

    // Past due but disputed.
    let disputed_id = seed_past_due(&harness, 40_000).await;
    harness
        .state
        .store
        .open_dispute(&disputed_id, "services not delivered", "customer")
        .unwrap();

    // Funded but inside the hold period.
    let booking_id = harness.create_booking(60_000).await;
    let escrow_id = harness.create_escrow(&booking_id, 60_000).await;
    harness.fund_escrow(&booking_id, 18_000).await;

    let released = sweeper::sweep_once(&harness.state).unwrap();
    assert_eq!(released, 0);

    let disputed = harness.state.store.get_escrow(&disputed_id).unwrap().unwrap();
    assert_eq!(disputed.status, EscrowStatus::Disputed);

    let fresh = harness
        .state
        .store
        .get_escrow(&escrow_id.parse().unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(fresh.status, EscrowStatus::Funded);
    assert_eq!(fresh.released_paise, 0);
}
