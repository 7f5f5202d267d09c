//! # Stock Item Repository
//!
//! CRUD and lookups for stock items. Quantity mutations are deliberately
//! absent here: `on_hand`/`reserved` change only through the inventory
//! ledger (`engine::ledger`), which is the single path by which stock
//! enters or leaves circulation.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tally_core::StockItem;

const ITEM_COLUMNS: &str = "id, sku, name, category, unit_cost_cents, retail_price_cents, \
     on_hand, reserved, supplier, is_active, created_at, updated_at";

/// Repository for stock item database operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Gets an item by its UUID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<StockItem>> {
        let item = sqlx::query_as::<_, StockItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM stock_items WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Gets an item by its SKU (e.g. "MED001").
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<StockItem>> {
        let item = sqlx::query_as::<_, StockItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM stock_items WHERE sku = ?1"
        ))
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Lists active items sorted by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<StockItem>> {
        let items = sqlx::query_as::<_, StockItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM stock_items \
             WHERE is_active = 1 ORDER BY name LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists active items whose available stock is at or below `threshold`.
    ///
    /// Available means on-hand minus reserved: stock sitting in open carts
    /// already counts as gone for warning purposes.
    pub async fn list_low_stock(&self, threshold: i64) -> DbResult<Vec<StockItem>> {
        let items = sqlx::query_as::<_, StockItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM stock_items \
             WHERE is_active = 1 AND on_hand - reserved <= ?1 \
             ORDER BY on_hand - reserved, name"
        ))
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Inserts a new item.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn insert(&self, item: &StockItem) -> DbResult<()> {
        debug!(sku = %item.sku, "Inserting stock item");

        sqlx::query(
            "INSERT INTO stock_items ( \
                id, sku, name, category, unit_cost_cents, retail_price_cents, \
                on_hand, reserved, supplier, is_active, created_at, updated_at \
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )
        .bind(&item.id)
        .bind(&item.sku)
        .bind(&item.name)
        .bind(&item.category)
        .bind(item.unit_cost_cents)
        .bind(item.retail_price_cents)
        .bind(item.on_hand)
        .bind(item.reserved)
        .bind(&item.supplier)
        .bind(item.is_active)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an item's descriptive fields and pricing.
    ///
    /// `on_hand` and `reserved` are NOT touched; use the ledger for those.
    pub async fn update(&self, item: &StockItem) -> DbResult<()> {
        debug!(id = %item.id, "Updating stock item");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE stock_items SET \
                sku = ?2, name = ?3, category = ?4, \
                unit_cost_cents = ?5, retail_price_cents = ?6, \
                supplier = ?7, is_active = ?8, updated_at = ?9 \
             WHERE id = ?1",
        )
        .bind(&item.id)
        .bind(&item.sku)
        .bind(&item.name)
        .bind(&item.category)
        .bind(item.unit_cost_cents)
        .bind(item.retail_price_cents)
        .bind(&item.supplier)
        .bind(item.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("StockItem", &item.id));
        }

        Ok(())
    }

    /// Receives stock from a supplier: raises on-hand by `qty`.
    ///
    /// Restocking is additive and cannot conflict with reservations, so it
    /// lives here rather than in the ledger's guarded paths.
    pub async fn receive_stock(&self, id: &str, qty: i64) -> DbResult<()> {
        debug!(id = %id, qty = %qty, "Receiving stock");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE stock_items SET on_hand = on_hand + ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(qty)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("StockItem", id));
        }

        Ok(())
    }

    /// Counts active items (for diagnostics and the seed binary).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_items WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Connection helpers (composed into engine transactions)
// =============================================================================

/// Soft-deletes an item inside an existing transaction.
///
/// Historical transaction lines still reference the row, so deletion is a
/// visibility flag, never a DELETE.
pub(crate) async fn soft_delete_with(conn: &mut sqlx::SqliteConnection, id: &str) -> DbResult<()> {
    let now = Utc::now();

    let result =
        sqlx::query("UPDATE stock_items SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(now)
            .execute(&mut *conn)
            .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("StockItem", id));
    }

    Ok(())
}

/// Helper to generate a new stock item id.
pub fn generate_item_id() -> String {
    Uuid::new_v4().to_string()
}
