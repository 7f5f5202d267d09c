//! # Hold / Resume
//!
//! Suspends a cart as a durable `held` transaction and later revives it.
//!
//! ## Reservation Continuity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  cart (in memory)          held row (durable)         cart again    │
//! │      reserved: 2   ──hold──►   reserved: 2   ──resume──► reserved: 2│
//! │                                                                     │
//! │  The ledger never moves: the reservation simply changes owners.     │
//! │  Stock a held order claims stays claimed across restarts.           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Resume deletes the held row inside the same database transaction that
//! records the audit entry, so a resumed order can never be resumed twice.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::engine::allocator;
use crate::error::DbError;
use crate::pool::Database;
use crate::repository::{audit, transaction};
use tally_core::{
    manifest, Cart, CartLine, CoreError, CoreResult, Transaction, TransactionLine, TxnStatus,
};

/// Suspends `cart` as a held transaction and returns it.
///
/// Inventory is untouched: the cart's reservations transfer to the held row
/// and are handed back when it is resumed.
pub(crate) async fn suspend(
    db: &Database,
    cart: &Cart,
    now: DateTime<Utc>,
) -> CoreResult<Transaction> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let mut tx = db.pool().begin().await.map_err(DbError::from)?;

    let id = allocator::allocate_id(&mut tx, now).await?;

    let txn = Transaction {
        id: id.clone(),
        manifest: manifest::encode(&cart.manifest_entries()),
        total_cents: cart.total().cents(),
        cash_tendered_cents: 0,
        change_cents: 0,
        status: TxnStatus::Held,
        payment_method: cart.payment_method(),
        customer_id: cart.customer_id().map(String::from),
        operator_id: cart.operator_id().to_string(),
        created_at: now,
        updated_at: now,
    };
    transaction::insert_with(&mut tx, &txn).await?;

    for line in cart.lines() {
        // Cost at hold time, for completeness; the authoritative cost is
        // re-read when the resumed order reaches checkout
        let cost: Option<i64> =
            sqlx::query_scalar("SELECT unit_cost_cents FROM stock_items WHERE id = ?1")
                .bind(&line.item_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(DbError::from)?;

        let snapshot = TransactionLine {
            id: transaction::generate_line_id(),
            transaction_id: id.clone(),
            item_id: line.item_id.clone(),
            sku_snapshot: line.sku.clone(),
            name_snapshot: line.name.clone(),
            unit_price_cents: line.unit_price_cents,
            unit_cost_cents: cost.unwrap_or(0),
            quantity: line.quantity,
            line_total_cents: line.line_total().cents(),
            created_at: now,
        };
        transaction::insert_line_with(&mut tx, &snapshot).await?;
    }

    audit::append_with(
        &mut tx,
        audit::actions::HOLD,
        &format!("{id} ({} units)", cart.unit_count()),
        cart.operator_id(),
        now,
    )
    .await?;

    tx.commit().await.map_err(DbError::from)?;

    info!(id = %id, "Order held");

    Ok(txn)
}

/// Revives a held transaction as a live cart owned by `operator_id`.
///
/// The held row is deleted; its line snapshots rebuild the cart with their
/// original frozen prices, and its still-tracked reservations carry over.
///
/// ## Returns
/// * `Err(CoreError::TransactionNotFound)` - no such transaction
/// * `Err(CoreError::InvalidStatus)` - transaction exists but is not held
pub(crate) async fn revive(
    db: &Database,
    id: &str,
    operator_id: &str,
    now: DateTime<Utc>,
) -> CoreResult<Cart> {
    let mut tx = db.pool().begin().await.map_err(DbError::from)?;

    let held = transaction::get_with(&mut tx, id)
        .await?
        .ok_or_else(|| CoreError::TransactionNotFound(id.to_string()))?;

    if held.status != TxnStatus::Held {
        return Err(CoreError::InvalidStatus {
            id: id.to_string(),
            status: held.status.as_str().to_string(),
        });
    }

    let lines = transaction::lines_with(&mut tx, id).await?;

    // Sanity: the ledger must still carry this order's reservations.
    for line in &lines {
        let reserved: Option<i64> =
            sqlx::query_scalar("SELECT reserved FROM stock_items WHERE id = ?1")
                .bind(&line.item_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(DbError::from)?;

        if reserved.unwrap_or(0) < line.quantity {
            return Err(CoreError::Storage(format!(
                "held order {id} expects {} reserved of item {} but the ledger disagrees",
                line.quantity, line.item_id
            )));
        }
    }

    transaction::delete_with(&mut tx, id).await?;

    audit::append_with(&mut tx, audit::actions::RESUME, id, operator_id, now).await?;

    tx.commit().await.map_err(DbError::from)?;

    info!(id = %id, "Order resumed");

    let cart_lines = lines
        .into_iter()
        .map(|l| CartLine {
            item_id: l.item_id,
            sku: l.sku_snapshot,
            name: l.name_snapshot,
            quantity: l.quantity,
            unit_price_cents: l.unit_price_cents,
        })
        .collect();

    let mut cart = Cart::from_lines(operator_id, cart_lines);
    cart.set_customer(held.customer_id);
    cart.set_payment_method(held.payment_method);
    Ok(cart)
}
