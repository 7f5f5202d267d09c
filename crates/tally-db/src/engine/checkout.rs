//! # Checkout Processor
//!
//! Turns a cart into a completed transaction.
//!
//! ## One Atomic Unit
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                              │
//! │    1. consume each line's reservation  (stock leaves circulation)   │
//! │    2. allocate the transaction id      (rolls back with the rest)   │
//! │    3. insert transaction + line snapshots                           │
//! │    4. fold the sale into the daily aggregate                        │
//! │    5. append the audit entry                                        │
//! │  COMMIT                                                             │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Payment validation happens before any database work: an underpaid cart is
//! rejected with nothing written and the cart untouched.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::engine::{allocator, ledger};
use crate::error::DbError;
use crate::pool::Database;
use crate::repository::{aggregate, audit, transaction};
use tally_core::{manifest, Cart, CoreError, CoreResult, Money, PaymentMethod, Transaction, TransactionLine, TxnStatus};

/// Finalizes `cart` as a completed sale.
///
/// For cash payments `tendered` must cover the total; change is computed from
/// the difference. Other payment methods settle externally and record the
/// exact total with zero change.
///
/// ## Returns
/// * `Err(CoreError::EmptyCart)` - nothing to sell
/// * `Err(CoreError::InsufficientPayment)` - cash tendered below the total
/// * `Err(CoreError::OutOfStock)` - a line's reservation no longer covers it
pub(crate) async fn finalize(
    db: &Database,
    cart: &Cart,
    tendered: Money,
    now: DateTime<Utc>,
) -> CoreResult<Transaction> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let total = cart.total();

    let (tendered_cents, change_cents) = match cart.payment_method() {
        PaymentMethod::Cash => {
            if tendered < total {
                return Err(CoreError::InsufficientPayment {
                    required_cents: total.cents(),
                    tendered_cents: tendered.cents(),
                });
            }
            (tendered.cents(), (tendered - total).cents())
        }
        // Card/mobile settle externally for the exact amount
        _ => (total.cents(), 0),
    };

    let mut tx = db.pool().begin().await.map_err(DbError::from)?;

    // Consume reservations. Unit cost is read at checkout time (not at add
    // time) and frozen onto the line so later edits net out exactly.
    let mut profit_cents: i64 = 0;
    let mut line_costs = Vec::with_capacity(cart.lines().len());
    for line in cart.lines() {
        ledger::consume_with(&mut tx, &line.item_id, line.quantity).await?;

        let cost: Option<i64> =
            sqlx::query_scalar("SELECT unit_cost_cents FROM stock_items WHERE id = ?1")
                .bind(&line.item_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(DbError::from)?;
        let cost = cost.ok_or_else(|| CoreError::ItemNotFound(line.item_id.clone()))?;

        profit_cents += (line.unit_price_cents - cost) * line.quantity;
        line_costs.push(cost);
    }

    let id = allocator::allocate_id(&mut tx, now).await?;

    let txn = Transaction {
        id: id.clone(),
        manifest: manifest::encode(&cart.manifest_entries()),
        total_cents: total.cents(),
        cash_tendered_cents: tendered_cents,
        change_cents,
        status: TxnStatus::Completed,
        payment_method: cart.payment_method(),
        customer_id: cart.customer_id().map(String::from),
        operator_id: cart.operator_id().to_string(),
        created_at: now,
        updated_at: now,
    };
    transaction::insert_with(&mut tx, &txn).await?;

    for (line, cost) in cart.lines().iter().zip(&line_costs) {
        let snapshot = TransactionLine {
            id: transaction::generate_line_id(),
            transaction_id: id.clone(),
            item_id: line.item_id.clone(),
            sku_snapshot: line.sku.clone(),
            name_snapshot: line.name.clone(),
            unit_price_cents: line.unit_price_cents,
            unit_cost_cents: *cost,
            quantity: line.quantity,
            line_total_cents: line.line_total().cents(),
            created_at: now,
        };
        transaction::insert_line_with(&mut tx, &snapshot).await?;
    }

    aggregate::record_sale_with(
        &mut tx,
        now.date_naive(),
        total.cents(),
        cart.unit_count(),
        profit_cents,
    )
    .await?;

    audit::append_with(
        &mut tx,
        audit::actions::CHECKOUT,
        &format!("{id} total {total} ({} units)", cart.unit_count()),
        cart.operator_id(),
        now,
    )
    .await?;

    tx.commit().await.map_err(DbError::from)?;

    info!(id = %id, total = %total, "Checkout completed");

    Ok(txn)
}
