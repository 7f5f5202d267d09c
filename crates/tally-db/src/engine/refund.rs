//! # Refund and Post-Sale Edit
//!
//! The two ways a completed sale changes after the fact.
//!
//! ## Refund
//! Marks the sale `returned`, restocks every line and accumulates the amount
//! into the day the sale originally landed on. Gross aggregate figures are
//! never decremented, so reports keep both gross bookings and net sales.
//!
//! ## Edit
//! Rewrites the line set of a completed sale in place: quantity deltas settle
//! against the inventory ledger (increases draw from available stock,
//! decreases restock), line snapshots and money columns are rewritten, and
//! the original sale day's aggregate absorbs the difference.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::info;

use crate::engine::{ledger, Authorizer, ElevatedAction};
use crate::error::DbError;
use crate::pool::Database;
use crate::repository::{aggregate, audit, transaction};
use tally_core::{
    manifest, CoreError, CoreResult, Money, Transaction, TransactionLine, TxnStatus,
};

/// Refunds a completed transaction in full.
///
/// Authorization-gated: `operator_id` must pass the [`Authorizer`] for
/// [`ElevatedAction::Refund`].
///
/// ## Returns
/// * `Err(CoreError::Unauthorized)` - authorizer declined
/// * `Err(CoreError::TransactionNotFound)` - no such transaction
/// * `Err(CoreError::AlreadyReturned)` - refunded before
/// * `Err(CoreError::InvalidStatus)` - held orders cannot be refunded
pub async fn refund(
    db: &Database,
    id: &str,
    authorizer: &dyn Authorizer,
    operator_id: &str,
) -> CoreResult<Transaction> {
    if !authorizer.allow_elevated(operator_id, ElevatedAction::Refund) {
        return Err(CoreError::Unauthorized {
            action: ElevatedAction::Refund.to_string(),
        });
    }

    let now = Utc::now();
    let mut tx = db.pool().begin().await.map_err(DbError::from)?;

    let mut txn = transaction::get_with(&mut tx, id)
        .await?
        .ok_or_else(|| CoreError::TransactionNotFound(id.to_string()))?;

    match txn.status {
        TxnStatus::Completed => {}
        TxnStatus::Returned => return Err(CoreError::AlreadyReturned(id.to_string())),
        TxnStatus::Held => {
            return Err(CoreError::InvalidStatus {
                id: id.to_string(),
                status: txn.status.as_str().to_string(),
            })
        }
    }

    for line in transaction::lines_with(&mut tx, id).await? {
        ledger::restock_with(&mut tx, &line.item_id, line.quantity).await?;
    }

    transaction::set_status_with(&mut tx, id, TxnStatus::Returned, now).await?;

    // Refunds land on the sale's original day, not today
    aggregate::record_refund_with(&mut tx, txn.created_at.date_naive(), txn.total_cents).await?;

    audit::append_with(
        &mut tx,
        audit::actions::REFUND,
        &format!("{id} amount {}", txn.total()),
        operator_id,
        now,
    )
    .await?;

    tx.commit().await.map_err(DbError::from)?;

    info!(id = %id, amount = %txn.total(), "Transaction refunded");

    txn.status = TxnStatus::Returned;
    txn.updated_at = now;
    Ok(txn)
}

/// Rewrites a completed transaction's lines to `new_entries`
/// (`(item_id, quantity)` pairs) with `new_tendered` as the corrected cash
/// amount.
///
/// Quantity increases draw from available stock and fail with `OutOfStock`
/// if it doesn't cover them; decreases and removed lines restock. Lines kept
/// from the original keep their frozen price; newly added items snapshot the
/// current retail price.
///
/// ## Returns
/// * `Err(CoreError::TransactionNotFound)` - no such transaction
/// * `Err(CoreError::InvalidStatus)` - only completed sales can be edited
/// * `Err(CoreError::EmptyCart)` - an edit may not remove every line
/// * `Err(CoreError::InsufficientPayment)` - new cash below the new total
pub async fn edit(
    db: &Database,
    id: &str,
    new_entries: &[(String, i64)],
    new_tendered: Money,
    operator_id: &str,
) -> CoreResult<Transaction> {
    if new_entries.is_empty() {
        return Err(CoreError::EmptyCart);
    }
    for (item_id, qty) in new_entries {
        if *qty < 1 {
            return Err(CoreError::InvalidQuantity { requested: *qty });
        }
        if new_entries.iter().filter(|(i, _)| i == item_id).count() > 1 {
            return Err(tally_core::ValidationError::Duplicate {
                field: "item_id".to_string(),
                value: item_id.clone(),
            }
            .into());
        }
    }

    let now = Utc::now();
    let mut tx = db.pool().begin().await.map_err(DbError::from)?;

    let txn = transaction::get_with(&mut tx, id)
        .await?
        .ok_or_else(|| CoreError::TransactionNotFound(id.to_string()))?;

    if txn.status != TxnStatus::Completed {
        return Err(CoreError::InvalidStatus {
            id: id.to_string(),
            status: txn.status.as_str().to_string(),
        });
    }

    let old_lines = transaction::lines_with(&mut tx, id).await?;
    let old_by_item: HashMap<&str, &TransactionLine> =
        old_lines.iter().map(|l| (l.item_id.as_str(), l)).collect();

    // Settle inventory deltas first; a shortfall aborts with nothing applied
    for (item_id, new_qty) in new_entries {
        let old_qty = old_by_item.get(item_id.as_str()).map(|l| l.quantity).unwrap_or(0);
        let delta = new_qty - old_qty;
        if delta > 0 {
            ledger::take_available_with(&mut tx, item_id, delta).await?;
        } else if delta < 0 {
            ledger::restock_with(&mut tx, item_id, -delta).await?;
        }
    }
    for line in &old_lines {
        if !new_entries.iter().any(|(i, _)| i == &line.item_id) {
            ledger::restock_with(&mut tx, &line.item_id, line.quantity).await?;
        }
    }

    // Rebuild the line snapshots
    transaction::delete_lines_with(&mut tx, id).await?;

    let mut new_total = Money::zero();
    let mut new_units: i64 = 0;
    let mut new_profit: i64 = 0;
    for (item_id, qty) in new_entries {
        let (sku, name, unit_price, cost) = match old_by_item.get(item_id.as_str()) {
            // Kept lines keep both frozen prices and the frozen cost
            Some(old) => (
                old.sku_snapshot.clone(),
                old.name_snapshot.clone(),
                old.unit_price_cents,
                old.unit_cost_cents,
            ),
            None => {
                let row: Option<(String, String, i64, i64)> = sqlx::query_as(
                    "SELECT sku, name, retail_price_cents, unit_cost_cents \
                     FROM stock_items WHERE id = ?1 AND is_active = 1",
                )
                .bind(item_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(DbError::from)?;
                let (sku, name, price, cost) =
                    row.ok_or_else(|| CoreError::ItemNotFound(item_id.clone()))?;
                (sku, name, price, cost)
            }
        };

        let line = TransactionLine {
            id: transaction::generate_line_id(),
            transaction_id: id.to_string(),
            item_id: item_id.clone(),
            sku_snapshot: sku,
            name_snapshot: name,
            unit_price_cents: unit_price,
            unit_cost_cents: cost,
            quantity: *qty,
            line_total_cents: unit_price * qty,
            created_at: now,
        };
        transaction::insert_line_with(&mut tx, &line).await?;

        new_total += Money::from_cents(line.line_total_cents);
        new_units += qty;
        new_profit += (unit_price - cost) * qty;
    }

    // Old contribution from the frozen snapshots, so the delta nets out
    // exactly even if the item's cost changed since checkout
    let mut old_total = Money::zero();
    let mut old_units: i64 = 0;
    let mut old_profit: i64 = 0;
    for line in &old_lines {
        old_total += Money::from_cents(line.line_total_cents);
        old_units += line.quantity;
        old_profit += (line.unit_price_cents - line.unit_cost_cents) * line.quantity;
    }

    // The original sale day absorbs the delta
    aggregate::record_sale_with(
        &mut tx,
        txn.created_at.date_naive(),
        new_total.cents() - old_total.cents(),
        new_units - old_units,
        new_profit - old_profit,
    )
    .await?;

    if txn.payment_method == tally_core::PaymentMethod::Cash && new_tendered < new_total {
        return Err(CoreError::InsufficientPayment {
            required_cents: new_total.cents(),
            tendered_cents: new_tendered.cents(),
        });
    }
    let (new_tendered_cents, new_change) = match txn.payment_method {
        tally_core::PaymentMethod::Cash => {
            (new_tendered.cents(), (new_tendered - new_total).cents())
        }
        _ => (new_total.cents(), 0),
    };

    let new_manifest = manifest::encode(new_entries);
    transaction::rewrite_with(
        &mut tx,
        id,
        &new_manifest,
        new_total.cents(),
        new_tendered_cents,
        new_change,
        now,
    )
    .await?;

    audit::append_with(
        &mut tx,
        audit::actions::EDIT,
        &format!("{id} total {} -> {}", txn.total(), new_total),
        operator_id,
        now,
    )
    .await?;

    tx.commit().await.map_err(DbError::from)?;

    info!(id = %id, old_total = %txn.total(), new_total = %new_total, "Transaction edited");

    Ok(Transaction {
        manifest: new_manifest,
        total_cents: new_total.cents(),
        cash_tendered_cents: new_tendered_cents,
        change_cents: new_change,
        updated_at: now,
        ..txn
    })
}
