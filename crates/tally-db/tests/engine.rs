//! End-to-end engine tests against an in-memory database.
//!
//! These exercise whole lifecycles (add → checkout → refund, hold → resume)
//! and verify the inventory ledger stays consistent at every step.

use chrono::Utc;

use tally_core::{CoreError, Money, StockItem, TxnStatus};
use tally_db::engine::{delete_transaction, ledger, refund};
use tally_db::{Authorizer, Database, DbConfig, ElevatedAction, OrderSession};

// =============================================================================
// Fixtures
// =============================================================================

struct AllowAll;

impl Authorizer for AllowAll {
    fn allow_elevated(&self, _operator_id: &str, _action: ElevatedAction) -> bool {
        true
    }
}

struct DenyAll;

impl Authorizer for DenyAll {
    fn allow_elevated(&self, _operator_id: &str, _action: ElevatedAction) -> bool {
        false
    }
}

async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

async fn seed_item(db: &Database, sku: &str, price_cents: i64, cost_cents: i64, on_hand: i64) -> String {
    let now = Utc::now();
    let item = StockItem {
        id: tally_db::repository::item::generate_item_id(),
        sku: sku.to_string(),
        name: format!("Item {sku}"),
        category: "GEN".to_string(),
        unit_cost_cents: cost_cents,
        retail_price_cents: price_cents,
        on_hand,
        reserved: 0,
        supplier: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.items().insert(&item).await.unwrap();
    item.id
}

async fn level(db: &Database, item_id: &str) -> (i64, i64) {
    let l = ledger::peek(db, item_id).await.unwrap();
    (l.on_hand, l.reserved)
}

// =============================================================================
// Full Lifecycle
// =============================================================================

/// The canonical worked example: 100 on hand at $10.00, two units sold for
/// exact cash, then refunded.
#[tokio::test]
async fn test_sale_and_refund_lifecycle() {
    let db = test_db().await;
    let item_id = seed_item(&db, "MED001", 1000, 600, 100).await;

    let mut session = OrderSession::new(db.clone(), "op-1");
    assert_eq!(session.add_item(&item_id).await.unwrap(), 1);
    assert_eq!(session.add_item(&item_id).await.unwrap(), 2);

    // Two adds merge into one line; stock is reserved, not yet spent
    assert_eq!(session.cart().lines().len(), 1);
    assert_eq!(session.cart().subtotal().cents(), 2000);
    assert_eq!(level(&db, &item_id).await, (100, 2));
    assert_eq!(
        ledger::peek(&db, &item_id).await.unwrap().available(),
        98
    );

    let txn = session.checkout(Money::from_cents(2000)).await.unwrap();
    assert_eq!(txn.status, TxnStatus::Completed);
    assert_eq!(txn.total_cents, 2000);
    assert_eq!(txn.change_cents, 0);
    assert!(session.cart().is_empty());

    // Checkout consumed the reservation: physical stock dropped with it
    assert_eq!(level(&db, &item_id).await, (98, 0));

    let lines = db.transactions().get_lines(&txn.id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 2);
    assert_eq!(lines[0].unit_price_cents, 1000);
    assert_eq!(lines[0].sku_snapshot, "MED001");

    let refunded = refund::refund(&db, &txn.id, &AllowAll, "mgr-1").await.unwrap();
    assert_eq!(refunded.status, TxnStatus::Returned);
    assert_eq!(level(&db, &item_id).await, (100, 0));

    // A second refund of the same transaction is refused
    assert!(matches!(
        refund::refund(&db, &txn.id, &AllowAll, "mgr-1").await,
        Err(CoreError::AlreadyReturned(_))
    ));
}

#[tokio::test]
async fn test_checkout_change_and_audit() {
    let db = test_db().await;
    let item_id = seed_item(&db, "BEV001", 350, 180, 10).await;

    let mut session = OrderSession::new(db.clone(), "op-1");
    session.add_item(&item_id).await.unwrap();

    let txn = session.checkout(Money::from_cents(500)).await.unwrap();
    assert_eq!(txn.change_cents, 150);

    let recent = db.audit().recent(10).await.unwrap();
    assert!(recent.iter().any(|e| e.action == "CHECKOUT" && e.actor == "op-1"));
}

#[tokio::test]
async fn test_empty_cart_cannot_checkout_or_hold() {
    let db = test_db().await;
    let mut session = OrderSession::new(db.clone(), "op-1");

    assert!(matches!(
        session.checkout(Money::from_cents(100)).await,
        Err(CoreError::EmptyCart)
    ));
    assert!(matches!(session.hold().await, Err(CoreError::EmptyCart)));
}

// =============================================================================
// Payment Validation
// =============================================================================

/// An underpaid checkout must leave everything exactly as it was.
#[tokio::test]
async fn test_insufficient_payment_mutates_nothing() {
    let db = test_db().await;
    let item_id = seed_item(&db, "MED001", 1000, 600, 100).await;

    let mut session = OrderSession::new(db.clone(), "op-1");
    session.add_item(&item_id).await.unwrap();
    session.add_item(&item_id).await.unwrap();

    let err = session.checkout(Money::from_cents(1500)).await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::InsufficientPayment {
            required_cents: 2000,
            tendered_cents: 1500,
        }
    ));

    // Cart intact, reservation intact, no transaction written
    assert_eq!(session.cart().unit_count(), 2);
    assert_eq!(level(&db, &item_id).await, (100, 2));
    assert_eq!(
        db.transactions().count_by_status(TxnStatus::Completed).await.unwrap(),
        0
    );

    // Topping up the payment completes normally
    let txn = session.checkout(Money::from_cents(2000)).await.unwrap();
    assert_eq!(txn.total_cents, 2000);
}

// =============================================================================
// Reservations
// =============================================================================

#[tokio::test]
async fn test_out_of_stock_fails_fast() {
    let db = test_db().await;
    let item_id = seed_item(&db, "SNK001", 200, 90, 1).await;

    let mut session = OrderSession::new(db.clone(), "op-1");
    session.add_item(&item_id).await.unwrap();

    let err = session.add_item(&item_id).await.unwrap_err();
    match err {
        CoreError::OutOfStock {
            sku,
            available,
            requested,
        } => {
            assert_eq!(sku, "SNK001");
            assert_eq!(available, 0);
            assert_eq!(requested, 1);
        }
        other => panic!("expected OutOfStock, got {other:?}"),
    }

    // The failed add didn't disturb the existing line
    assert_eq!(session.cart().line_quantity(&item_id), 1);
    assert_eq!(level(&db, &item_id).await, (1, 1));
}

#[tokio::test]
async fn test_two_sessions_compete_for_stock() {
    let db = test_db().await;
    let item_id = seed_item(&db, "SNK002", 250, 120, 3).await;

    let mut a = OrderSession::new(db.clone(), "op-a");
    let mut b = OrderSession::new(db.clone(), "op-b");

    a.add_item(&item_id).await.unwrap();
    a.add_item(&item_id).await.unwrap();
    b.add_item(&item_id).await.unwrap();

    // All three units are claimed across the two carts
    assert!(matches!(
        b.add_item(&item_id).await,
        Err(CoreError::OutOfStock { available: 0, .. })
    ));

    // A clearing its cart frees stock for B again
    a.clear().await.unwrap();
    assert_eq!(b.add_item(&item_id).await.unwrap(), 2);
    assert_eq!(level(&db, &item_id).await, (3, 2));
}

#[tokio::test]
async fn test_set_quantity_settles_reservation_delta() {
    let db = test_db().await;
    let item_id = seed_item(&db, "BEV002", 350, 180, 10).await;

    let mut session = OrderSession::new(db.clone(), "op-1");
    session.add_item(&item_id).await.unwrap();

    session.set_quantity(&item_id, 5).await.unwrap();
    assert_eq!(level(&db, &item_id).await, (10, 5));

    session.set_quantity(&item_id, 2).await.unwrap();
    assert_eq!(level(&db, &item_id).await, (10, 2));

    // Raising past available stock fails and changes nothing
    assert!(matches!(
        session.set_quantity(&item_id, 11).await,
        Err(CoreError::OutOfStock { .. })
    ));
    assert_eq!(session.cart().line_quantity(&item_id), 2);
    assert_eq!(level(&db, &item_id).await, (10, 2));

    // Zero removes the line and frees everything
    session.set_quantity(&item_id, 0).await.unwrap();
    assert!(session.cart().is_empty());
    assert_eq!(level(&db, &item_id).await, (10, 0));
}

#[tokio::test]
async fn test_void_round_trip_conserves_stock() {
    let db = test_db().await;
    let item_id = seed_item(&db, "MED002", 850, 450, 20).await;

    let mut session = OrderSession::new(db.clone(), "op-1");
    for _ in 0..3 {
        session.add_item(&item_id).await.unwrap();
    }
    assert_eq!(level(&db, &item_id).await, (20, 3));

    session.void_line(&item_id, &AllowAll, "mgr-1").await.unwrap();
    assert!(session.cart().is_empty());
    assert_eq!(level(&db, &item_id).await, (20, 0));

    let recent = db.audit().recent(10).await.unwrap();
    assert!(recent.iter().any(|e| e.action == "VOID_LINE"));
}

#[tokio::test]
async fn test_void_requires_authorization() {
    let db = test_db().await;
    let item_id = seed_item(&db, "MED001", 1000, 600, 10).await;

    let mut session = OrderSession::new(db.clone(), "op-1");
    session.add_item(&item_id).await.unwrap();

    assert!(matches!(
        session.void_line(&item_id, &DenyAll, "op-1").await,
        Err(CoreError::Unauthorized { .. })
    ));
    // Denied void leaves the line and its reservation alone
    assert_eq!(session.cart().line_quantity(&item_id), 1);
    assert_eq!(level(&db, &item_id).await, (10, 1));
}

// =============================================================================
// Discount
// =============================================================================

#[tokio::test]
async fn test_discount_requires_authorization() {
    let db = test_db().await;
    let item_id = seed_item(&db, "MED001", 10000, 600, 10).await;

    let mut session = OrderSession::new(db.clone(), "op-1");
    session.add_item(&item_id).await.unwrap();

    assert!(matches!(
        session.apply_discount(1000, &DenyAll, "op-1"),
        Err(CoreError::Unauthorized { .. })
    ));
    assert_eq!(session.cart().total().cents(), 10000);

    session.apply_discount(1000, &AllowAll, "mgr-1").unwrap();
    assert_eq!(session.cart().total().cents(), 9000);

    let txn = session.checkout(Money::from_cents(9000)).await.unwrap();
    assert_eq!(txn.total_cents, 9000);
    assert_eq!(txn.change_cents, 0);
}

// =============================================================================
// Hold / Resume
// =============================================================================

#[tokio::test]
async fn test_hold_resume_round_trip() {
    let db = test_db().await;
    let item_id = seed_item(&db, "MED001", 1000, 600, 100).await;

    let mut session = OrderSession::new(db.clone(), "op-1");
    session.add_item(&item_id).await.unwrap();
    session.add_item(&item_id).await.unwrap();

    let held = session.hold().await.unwrap();
    assert_eq!(held.status, TxnStatus::Held);
    assert!(session.cart().is_empty());

    // Holding keeps the claim on stock
    assert_eq!(level(&db, &item_id).await, (100, 2));
    assert_eq!(db.transactions().list_held().await.unwrap().len(), 1);

    let mut resumed = OrderSession::resume(db.clone(), &held.id, "op-2").await.unwrap();
    assert_eq!(resumed.cart().line_quantity(&item_id), 2);
    assert_eq!(resumed.cart().subtotal().cents(), 2000);
    assert_eq!(level(&db, &item_id).await, (100, 2));

    // The held row is gone; resuming it again fails
    assert!(db.transactions().list_held().await.unwrap().is_empty());
    assert!(matches!(
        OrderSession::resume(db.clone(), &held.id, "op-2").await,
        Err(CoreError::TransactionNotFound(_))
    ));

    let txn = resumed.checkout(Money::from_cents(2000)).await.unwrap();
    assert_eq!(txn.status, TxnStatus::Completed);
    assert_eq!(level(&db, &item_id).await, (98, 0));
}

/// Line order is display-significant: a resumed cart (and the receipt
/// renderer's line reads) must come back in the order the operator rang
/// the items up, not in id order.
#[tokio::test]
async fn test_resume_preserves_line_order() {
    let db = test_db().await;

    let mut item_ids = Vec::new();
    for sku in ["GRN001", "DRY014", "MED007", "BEV003", "SNK009", "FRZ002"] {
        item_ids.push(seed_item(&db, sku, 500, 200, 10).await);
    }

    let mut session = OrderSession::new(db.clone(), "op-1");
    for id in &item_ids {
        session.add_item(id).await.unwrap();
    }
    let held = session.hold().await.unwrap();

    let stored_order: Vec<String> = db
        .transactions()
        .get_lines(&held.id)
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.item_id)
        .collect();
    assert_eq!(stored_order, item_ids);

    let resumed = OrderSession::resume(db.clone(), &held.id, "op-1").await.unwrap();
    let resumed_order: Vec<&str> = resumed
        .cart()
        .lines()
        .iter()
        .map(|l| l.item_id.as_str())
        .collect();
    assert_eq!(resumed_order, item_ids);
}

/// A held order's claim is validated against its own tracked reservation,
/// so other sessions selling through the remaining stock cannot spuriously
/// reject the resume.
#[tokio::test]
async fn test_resume_survives_intervening_sale() {
    let db = test_db().await;
    let item_id = seed_item(&db, "SNK002", 250, 120, 3).await;

    let mut holder = OrderSession::new(db.clone(), "op-1");
    holder.add_item(&item_id).await.unwrap();
    holder.add_item(&item_id).await.unwrap();
    let held = holder.hold().await.unwrap();
    assert_eq!(level(&db, &item_id).await, (3, 2));

    // Another terminal sells the last available unit while the order sits
    let mut other = OrderSession::new(db.clone(), "op-2");
    other.add_item(&item_id).await.unwrap();
    other.checkout(Money::from_cents(250)).await.unwrap();
    assert_eq!(level(&db, &item_id).await, (2, 2));

    // Raw on-hand (2) equals the held quantity only because the reservation
    // is still tracked; resume must succeed against that baseline
    let mut resumed = OrderSession::resume(db.clone(), &held.id, "op-1").await.unwrap();
    assert_eq!(resumed.cart().line_quantity(&item_id), 2);

    let txn = resumed.checkout(Money::from_cents(500)).await.unwrap();
    assert_eq!(txn.total_cents, 500);
    assert_eq!(level(&db, &item_id).await, (0, 0));
}

/// Resume rebuilds lines with the price frozen at add time, not the
/// current retail price.
#[tokio::test]
async fn test_resume_keeps_snapshot_price() {
    let db = test_db().await;
    let item_id = seed_item(&db, "MED001", 1000, 600, 100).await;

    let mut session = OrderSession::new(db.clone(), "op-1");
    session.add_item(&item_id).await.unwrap();
    let held = session.hold().await.unwrap();

    // Price hike while the order sits on hold
    let mut item = db.items().get_by_id(&item_id).await.unwrap().unwrap();
    item.retail_price_cents = 9999;
    db.items().update(&item).await.unwrap();

    let resumed = OrderSession::resume(db.clone(), &held.id, "op-1").await.unwrap();
    assert_eq!(resumed.cart().subtotal().cents(), 1000);
}

#[tokio::test]
async fn test_resume_rejects_completed_transaction() {
    let db = test_db().await;
    let item_id = seed_item(&db, "MED001", 1000, 600, 10).await;

    let mut session = OrderSession::new(db.clone(), "op-1");
    session.add_item(&item_id).await.unwrap();
    let txn = session.checkout(Money::from_cents(1000)).await.unwrap();

    assert!(matches!(
        OrderSession::resume(db.clone(), &txn.id, "op-1").await,
        Err(CoreError::InvalidStatus { .. })
    ));
}

// =============================================================================
// Transaction IDs
// =============================================================================

#[tokio::test]
async fn test_checkout_ids_unique_and_monotonic() {
    let db = test_db().await;
    let item_id = seed_item(&db, "BEV001", 120, 40, 100).await;

    let mut ids = Vec::new();
    for _ in 0..5 {
        let mut session = OrderSession::new(db.clone(), "op-1");
        session.add_item(&item_id).await.unwrap();
        ids.push(session.checkout(Money::from_cents(120)).await.unwrap().id);
    }

    let mut sorted = ids.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted.len(), 5);
    // Same month, so lexicographic order matches allocation order
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn test_concurrent_checkouts_never_collide() {
    let db = test_db().await;
    let item_id = seed_item(&db, "BEV001", 120, 40, 100).await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let db = db.clone();
        let item_id = item_id.clone();
        handles.push(tokio::spawn(async move {
            let mut session = OrderSession::new(db, format!("op-{i}"));
            session.add_item(&item_id).await.unwrap();
            session.checkout(Money::from_cents(120)).await.unwrap().id
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 8);

    assert_eq!(level(&db, &item_id).await, (92, 0));
}

// =============================================================================
// Edit
// =============================================================================

#[tokio::test]
async fn test_edit_adjusts_stock_and_totals() {
    let db = test_db().await;
    let item_id = seed_item(&db, "MED001", 1000, 600, 100).await;

    let mut session = OrderSession::new(db.clone(), "op-1");
    session.add_item(&item_id).await.unwrap();
    session.add_item(&item_id).await.unwrap();
    let txn = session.checkout(Money::from_cents(5000)).await.unwrap();
    assert_eq!(level(&db, &item_id).await, (98, 0));

    // Raise 2 → 3: one more unit leaves stock
    let edited = refund::edit(&db, &txn.id, &[(item_id.clone(), 3)], Money::from_cents(5000), "mgr-1")
        .await
        .unwrap();
    assert_eq!(edited.total_cents, 3000);
    assert_eq!(edited.change_cents, 2000);
    assert_eq!(level(&db, &item_id).await, (97, 0));

    // Lower 3 → 1: two units come back
    let edited = refund::edit(&db, &txn.id, &[(item_id.clone(), 1)], Money::from_cents(1000), "mgr-1")
        .await
        .unwrap();
    assert_eq!(edited.total_cents, 1000);
    assert_eq!(edited.change_cents, 0);
    assert_eq!(level(&db, &item_id).await, (99, 0));

    let lines = db.transactions().get_lines(&txn.id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 1);
}

/// Profit adjustments use the cost frozen on the line at checkout, so a
/// supplier cost change between checkout and edit cannot skew the rollup.
#[tokio::test]
async fn test_edit_profit_uses_checkout_time_cost() {
    let db = test_db().await;
    let item_id = seed_item(&db, "MED001", 1000, 600, 100).await;

    let mut session = OrderSession::new(db.clone(), "op-1");
    session.add_item(&item_id).await.unwrap();
    session.add_item(&item_id).await.unwrap();
    let txn = session.checkout(Money::from_cents(2000)).await.unwrap();

    let today = Utc::now().date_naive();
    let agg = db.aggregates().for_date(today).await.unwrap().unwrap();
    assert_eq!(agg.net_profit_cents, 800);

    // Supplier reprices the item after the sale
    let mut item = db.items().get_by_id(&item_id).await.unwrap().unwrap();
    item.unit_cost_cents = 100;
    db.items().update(&item).await.unwrap();

    refund::edit(&db, &txn.id, &[(item_id.clone(), 1)], Money::from_cents(1000), "mgr-1")
        .await
        .unwrap();

    // One unit at the original margin (1000 − 600) remains booked
    let agg = db.aggregates().for_date(today).await.unwrap().unwrap();
    assert_eq!(agg.net_profit_cents, 400);
    assert_eq!(agg.total_sales_cents, 1000);
    assert_eq!(agg.unit_sales, 1);

    let lines = db.transactions().get_lines(&txn.id).await.unwrap();
    assert_eq!(lines[0].unit_cost_cents, 600);
}

#[tokio::test]
async fn test_edit_rejects_non_completed() {
    let db = test_db().await;
    let item_id = seed_item(&db, "MED001", 1000, 600, 10).await;

    let mut session = OrderSession::new(db.clone(), "op-1");
    session.add_item(&item_id).await.unwrap();
    let held = session.hold().await.unwrap();

    assert!(matches!(
        refund::edit(&db, &held.id, &[(item_id.clone(), 2)], Money::from_cents(2000), "mgr-1").await,
        Err(CoreError::InvalidStatus { .. })
    ));
}

// =============================================================================
// Refund Rules
// =============================================================================

#[tokio::test]
async fn test_refund_requires_authorization() {
    let db = test_db().await;
    let item_id = seed_item(&db, "MED001", 1000, 600, 10).await;

    let mut session = OrderSession::new(db.clone(), "op-1");
    session.add_item(&item_id).await.unwrap();
    let txn = session.checkout(Money::from_cents(1000)).await.unwrap();

    assert!(matches!(
        refund::refund(&db, &txn.id, &DenyAll, "op-1").await,
        Err(CoreError::Unauthorized { .. })
    ));
    // Denied refund changes nothing
    assert_eq!(level(&db, &item_id).await, (9, 0));
}

#[tokio::test]
async fn test_refund_of_held_order_refused() {
    let db = test_db().await;
    let item_id = seed_item(&db, "MED001", 1000, 600, 10).await;

    let mut session = OrderSession::new(db.clone(), "op-1");
    session.add_item(&item_id).await.unwrap();
    let held = session.hold().await.unwrap();

    assert!(matches!(
        refund::refund(&db, &held.id, &AllowAll, "mgr-1").await,
        Err(CoreError::InvalidStatus { .. })
    ));
}

// =============================================================================
// Daily Aggregates
// =============================================================================

#[tokio::test]
async fn test_aggregates_accumulate_and_track_refunds() {
    let db = test_db().await;
    let item_id = seed_item(&db, "MED001", 1000, 600, 100).await;

    let first = {
        let mut s = OrderSession::new(db.clone(), "op-1");
        s.add_item(&item_id).await.unwrap();
        s.add_item(&item_id).await.unwrap();
        s.checkout(Money::from_cents(2000)).await.unwrap()
    };
    {
        let mut s = OrderSession::new(db.clone(), "op-2");
        s.add_item(&item_id).await.unwrap();
        s.checkout(Money::from_cents(1000)).await.unwrap();
    }

    let today = Utc::now().date_naive();
    let agg = db.aggregates().for_date(today).await.unwrap().unwrap();
    assert_eq!(agg.total_sales_cents, 3000);
    assert_eq!(agg.unit_sales, 3);
    // Profit: (1000 − 600) × 3
    assert_eq!(agg.net_profit_cents, 1200);
    assert_eq!(agg.refund_total_cents, 0);

    refund::refund(&db, &first.id, &AllowAll, "mgr-1").await.unwrap();

    // Gross stays; the refund accumulates separately
    let agg = db.aggregates().for_date(today).await.unwrap().unwrap();
    assert_eq!(agg.total_sales_cents, 3000);
    assert_eq!(agg.refund_total_cents, 2000);
    assert_eq!(agg.net_sales().cents(), 1000);
}

// =============================================================================
// Crash Recovery
// =============================================================================

/// A reservation with no surviving owner (its cart died with the process)
/// is handed back by reconciliation; held orders keep theirs.
#[tokio::test]
async fn test_reconcile_frees_stranded_reservations() {
    let db = test_db().await;
    let orphan = seed_item(&db, "MED001", 1000, 600, 50).await;
    let held_item = seed_item(&db, "MED002", 850, 450, 50).await;

    // Simulates a crashed session: reserved, owner gone
    ledger::reserve(&db, &orphan, 4).await.unwrap();

    let mut session = OrderSession::new(db.clone(), "op-1");
    session.add_item(&held_item).await.unwrap();
    session.hold().await.unwrap();

    let corrected = db.reconcile_reservations().await.unwrap();
    assert_eq!(corrected, 1);

    assert_eq!(level(&db, &orphan).await, (50, 0));
    assert_eq!(level(&db, &held_item).await, (50, 1));
}

// =============================================================================
// Administration
// =============================================================================

#[tokio::test]
async fn test_delete_transaction_rules() {
    let db = test_db().await;
    let item_id = seed_item(&db, "MED001", 1000, 600, 10).await;

    let mut session = OrderSession::new(db.clone(), "op-1");
    session.add_item(&item_id).await.unwrap();
    let held = session.hold().await.unwrap();

    // Held orders own live reservations and cannot be deleted
    assert!(matches!(
        delete_transaction(&db, &held.id, &AllowAll, "mgr-1").await,
        Err(CoreError::InvalidStatus { .. })
    ));

    let mut resumed = OrderSession::resume(db.clone(), &held.id, "op-1").await.unwrap();
    let txn = resumed.checkout(Money::from_cents(1000)).await.unwrap();

    assert!(matches!(
        delete_transaction(&db, &txn.id, &DenyAll, "op-1").await,
        Err(CoreError::Unauthorized { .. })
    ));

    delete_transaction(&db, &txn.id, &AllowAll, "mgr-1").await.unwrap();
    assert!(db.transactions().get_by_id(&txn.id).await.unwrap().is_none());
    // Lines cascade with the row
    assert!(db.transactions().get_lines(&txn.id).await.unwrap().is_empty());
}
