//! # Inventory Ledger
//!
//! The only component allowed to mutate stock quantities.
//!
//! ## Reservation Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │               on_hand          reserved         available           │
//! │               ───────          ────────         ─────────           │
//! │  start           100                 0               100            │
//! │  reserve 2       100                 2                98            │
//! │  hold            100                 2                98  (kept)    │
//! │  checkout         98                 0                98  (spent)   │
//! │  refund          100                 0               100            │
//! │                                                                     │
//! │  Conservation: on_hand − reserved never changes except at           │
//! │  checkout (consume), refund (restock) and supplier receipt.         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every mutation is a single guarded UPDATE: the WHERE clause proves the
//! invariant still holds at write time, so interleaved sessions cannot
//! drive stock negative. Zero rows affected means the guard failed and the
//! caller gets a typed error with nothing applied.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbError;
use crate::pool::Database;
use tally_core::{CoreError, CoreResult, LOW_STOCK_THRESHOLD};

// =============================================================================
// Peek
// =============================================================================

/// Read-only stock level for UI display and low-stock warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLevel {
    pub on_hand: i64,
    pub reserved: i64,
}

impl StockLevel {
    /// Quantity a new reservation may draw from.
    #[inline]
    pub fn available(&self) -> i64 {
        self.on_hand - self.reserved
    }

    /// Whether available stock is at or below the warning threshold.
    #[inline]
    pub fn is_low(&self, threshold: i64) -> bool {
        self.available() <= threshold
    }
}

/// Reads an item's current stock level.
pub async fn peek(db: &Database, item_id: &str) -> CoreResult<StockLevel> {
    let row: Option<(i64, i64)> =
        sqlx::query_as("SELECT on_hand, reserved FROM stock_items WHERE id = ?1 AND is_active = 1")
            .bind(item_id)
            .fetch_optional(db.pool())
            .await
            .map_err(DbError::from)?;

    let (on_hand, reserved) = row.ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))?;
    Ok(StockLevel { on_hand, reserved })
}

/// Convenience: peek with the default low-stock threshold applied.
pub async fn is_low_stock(db: &Database, item_id: &str) -> CoreResult<bool> {
    Ok(peek(db, item_id).await?.is_low(LOW_STOCK_THRESHOLD))
}

// =============================================================================
// Reserve / Release (public, self-contained transactions)
// =============================================================================

/// Reserves `qty` units: fails with `OutOfStock` if `qty` exceeds available
/// stock, otherwise atomically raises the reservation.
///
/// This is the only path by which stock is committed to an order.
pub async fn reserve(db: &Database, item_id: &str, qty: i64) -> CoreResult<()> {
    let mut tx = db.pool().begin().await.map_err(DbError::from)?;
    reserve_with(&mut tx, item_id, qty).await?;
    tx.commit().await.map_err(DbError::from)?;
    Ok(())
}

/// Releases `qty` previously reserved units back to availability.
/// Used to undo a reservation: void, cart clear, quantity decrease.
pub async fn release(db: &Database, item_id: &str, qty: i64) -> CoreResult<()> {
    let mut tx = db.pool().begin().await.map_err(DbError::from)?;
    release_with(&mut tx, item_id, qty).await?;
    tx.commit().await.map_err(DbError::from)?;
    Ok(())
}

// =============================================================================
// Connection variants (composed into larger engine transactions)
// =============================================================================

pub(crate) async fn reserve_with(
    conn: &mut SqliteConnection,
    item_id: &str,
    qty: i64,
) -> CoreResult<()> {
    if qty < 1 {
        return Err(CoreError::InvalidQuantity { requested: qty });
    }

    debug!(item_id = %item_id, qty = %qty, "Reserving stock");

    let result = sqlx::query(
        "UPDATE stock_items \
         SET reserved = reserved + ?2, updated_at = datetime('now') \
         WHERE id = ?1 AND is_active = 1 AND on_hand - reserved >= ?2",
    )
    .bind(item_id)
    .bind(qty)
    .execute(&mut *conn)
    .await
    .map_err(DbError::from)?;

    if result.rows_affected() == 0 {
        return Err(shortfall_error(conn, item_id, qty).await);
    }

    Ok(())
}

pub(crate) async fn release_with(
    conn: &mut SqliteConnection,
    item_id: &str,
    qty: i64,
) -> CoreResult<()> {
    if qty < 1 {
        return Err(CoreError::InvalidQuantity { requested: qty });
    }

    debug!(item_id = %item_id, qty = %qty, "Releasing reservation");

    let result = sqlx::query(
        "UPDATE stock_items \
         SET reserved = reserved - ?2, updated_at = datetime('now') \
         WHERE id = ?1 AND reserved >= ?2",
    )
    .bind(item_id)
    .bind(qty)
    .execute(&mut *conn)
    .await
    .map_err(DbError::from)?;

    if result.rows_affected() == 0 {
        // Releasing more than is reserved means the ledger and the caller's
        // bookkeeping have diverged; surface it loudly rather than clamp.
        return Err(CoreError::Storage(format!(
            "release of {qty} exceeds outstanding reservation for item {item_id}"
        )));
    }

    Ok(())
}

/// Spends a reservation at checkout: physical stock and the reservation
/// drop together, leaving availability unchanged.
pub(crate) async fn consume_with(
    conn: &mut SqliteConnection,
    item_id: &str,
    qty: i64,
) -> CoreResult<()> {
    debug!(item_id = %item_id, qty = %qty, "Consuming reservation");

    let result = sqlx::query(
        "UPDATE stock_items \
         SET on_hand = on_hand - ?2, reserved = reserved - ?2, updated_at = datetime('now') \
         WHERE id = ?1 AND reserved >= ?2 AND on_hand >= ?2",
    )
    .bind(item_id)
    .bind(qty)
    .execute(&mut *conn)
    .await
    .map_err(DbError::from)?;

    if result.rows_affected() == 0 {
        return Err(CoreError::Storage(format!(
            "checkout consume of {qty} not covered by reservation for item {item_id}"
        )));
    }

    Ok(())
}

/// Returns `qty` units to physical stock (refund, edit decrease).
pub(crate) async fn restock_with(
    conn: &mut SqliteConnection,
    item_id: &str,
    qty: i64,
) -> CoreResult<()> {
    debug!(item_id = %item_id, qty = %qty, "Restocking");

    let result = sqlx::query(
        "UPDATE stock_items \
         SET on_hand = on_hand + ?2, updated_at = datetime('now') \
         WHERE id = ?1",
    )
    .bind(item_id)
    .bind(qty)
    .execute(&mut *conn)
    .await
    .map_err(DbError::from)?;

    if result.rows_affected() == 0 {
        return Err(CoreError::ItemNotFound(item_id.to_string()));
    }

    Ok(())
}

/// Takes `qty` units straight out of available stock (edit increase on an
/// already-completed transaction: reserve and consume in one step).
pub(crate) async fn take_available_with(
    conn: &mut SqliteConnection,
    item_id: &str,
    qty: i64,
) -> CoreResult<()> {
    debug!(item_id = %item_id, qty = %qty, "Taking available stock");

    let result = sqlx::query(
        "UPDATE stock_items \
         SET on_hand = on_hand - ?2, updated_at = datetime('now') \
         WHERE id = ?1 AND is_active = 1 AND on_hand - reserved >= ?2",
    )
    .bind(item_id)
    .bind(qty)
    .execute(&mut *conn)
    .await
    .map_err(DbError::from)?;

    if result.rows_affected() == 0 {
        return Err(shortfall_error(conn, item_id, qty).await);
    }

    Ok(())
}

/// Distinguishes "no such item" from "not enough stock" after a guarded
/// UPDATE touched zero rows.
async fn shortfall_error(conn: &mut SqliteConnection, item_id: &str, requested: i64) -> CoreError {
    let row: Result<Option<(String, i64, i64)>, sqlx::Error> = sqlx::query_as(
        "SELECT sku, on_hand, reserved FROM stock_items WHERE id = ?1 AND is_active = 1",
    )
    .bind(item_id)
    .fetch_optional(&mut *conn)
    .await;

    match row {
        Ok(Some((sku, on_hand, reserved))) => CoreError::OutOfStock {
            sku,
            available: on_hand - reserved,
            requested,
        },
        Ok(None) => CoreError::ItemNotFound(item_id.to_string()),
        Err(e) => DbError::from(e).into(),
    }
}

// =============================================================================
// Crash Recovery
// =============================================================================

/// Rebuilds every item's `reserved` from held-transaction lines.
///
/// Open carts live only in memory; after a crash their reservations would
/// stay in the ledger forever. Held transactions are durable, so the correct
/// post-crash reservation for an item is exactly the sum of held-line
/// quantities. Returns the number of items corrected.
pub(crate) async fn reconcile_reservations(pool: &SqlitePool) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE stock_items SET \
            reserved = COALESCE(( \
                SELECT SUM(tl.quantity) FROM transaction_lines tl \
                JOIN transactions t ON t.id = tl.transaction_id \
                WHERE t.status = 'held' AND tl.item_id = stock_items.id \
            ), 0), \
            updated_at = datetime('now') \
         WHERE reserved <> COALESCE(( \
                SELECT SUM(tl.quantity) FROM transaction_lines tl \
                JOIN transactions t ON t.id = tl.transaction_id \
                WHERE t.status = 'held' AND tl.item_id = stock_items.id \
            ), 0)",
    )
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        tracing::info!(
            items = result.rows_affected(),
            "Reconciled stranded reservations"
        );
    }

    Ok(result.rows_affected())
}
