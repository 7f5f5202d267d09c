//! # Transaction Repository
//!
//! Reads for transactions and their line snapshots, plus the connection
//! helpers the engine composes into atomic checkout/hold/refund/edit units.
//!
//! ## Transaction Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     Transaction Lifecycle                           │
//! │                                                                     │
//! │  Cart ──checkout──► { status: completed } ──refund──► { returned }  │
//! │    │                      │       ▲                                 │
//! │    │                      └─edit──┘  (manifest/total rewritten)     │
//! │    │                                                                │
//! │    └──hold──► { status: held } ──resume──► row deleted, Cart again  │
//! │                                                                     │
//! │  Administrative delete: non-held rows only, authorization-gated.    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::error::DbResult;
use tally_core::{Transaction, TransactionLine, TxnStatus};

const TXN_COLUMNS: &str = "id, manifest, total_cents, cash_tendered_cents, change_cents, \
     status, payment_method, customer_id, operator_id, created_at, updated_at";

const LINE_COLUMNS: &str = "id, transaction_id, item_id, sku_snapshot, name_snapshot, \
     unit_price_cents, unit_cost_cents, quantity, line_total_cents, created_at";

/// Repository for transaction reads.
///
/// The receipt renderer consumes [`get_by_id`](Self::get_by_id) and
/// [`get_lines`](Self::get_lines); report dialogs consume the listings.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Gets a transaction by its allocated id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Transaction>> {
        let txn = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {TXN_COLUMNS} FROM transactions WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(txn)
    }

    /// Gets the line snapshots for a transaction, in insertion order.
    ///
    /// Lines written in one batch share a timestamp, so ordering leans on
    /// SQLite's rowid: strictly increasing with insertion.
    pub async fn get_lines(&self, transaction_id: &str) -> DbResult<Vec<TransactionLine>> {
        let lines = sqlx::query_as::<_, TransactionLine>(&format!(
            "SELECT {LINE_COLUMNS} FROM transaction_lines \
             WHERE transaction_id = ?1 ORDER BY rowid"
        ))
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Lists held transactions, oldest first (the "suspended orders" screen).
    pub async fn list_held(&self) -> DbResult<Vec<Transaction>> {
        let txns = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {TXN_COLUMNS} FROM transactions \
             WHERE status = 'held' ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(txns)
    }

    /// Lists all transactions created on a calendar day, newest first.
    pub async fn list_by_day(&self, day: NaiveDate) -> DbResult<Vec<Transaction>> {
        let txns = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {TXN_COLUMNS} FROM transactions \
             WHERE date(created_at) = ?1 ORDER BY created_at DESC"
        ))
        .bind(day)
        .fetch_all(&self.pool)
        .await?;

        Ok(txns)
    }

    /// Counts transactions by status (for diagnostics).
    pub async fn count_by_status(&self, status: TxnStatus) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE status = ?1")
                .bind(status)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

// =============================================================================
// Connection helpers (composed into engine transactions)
// =============================================================================

/// Fetches a transaction inside an existing database transaction, so the
/// status the engine decides on cannot change before its write lands.
pub(crate) async fn get_with(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Transaction>> {
    let txn = sqlx::query_as::<_, Transaction>(&format!(
        "SELECT {TXN_COLUMNS} FROM transactions WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(txn)
}

/// Fetches line snapshots inside an existing database transaction,
/// in insertion (rowid) order.
pub(crate) async fn lines_with(
    conn: &mut SqliteConnection,
    transaction_id: &str,
) -> DbResult<Vec<TransactionLine>> {
    let lines = sqlx::query_as::<_, TransactionLine>(&format!(
        "SELECT {LINE_COLUMNS} FROM transaction_lines \
         WHERE transaction_id = ?1 ORDER BY rowid"
    ))
    .bind(transaction_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(lines)
}

/// Inserts a transaction row.
pub(crate) async fn insert_with(conn: &mut SqliteConnection, txn: &Transaction) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO transactions ( \
            id, manifest, total_cents, cash_tendered_cents, change_cents, \
            status, payment_method, customer_id, operator_id, created_at, updated_at \
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    )
    .bind(&txn.id)
    .bind(&txn.manifest)
    .bind(txn.total_cents)
    .bind(txn.cash_tendered_cents)
    .bind(txn.change_cents)
    .bind(txn.status)
    .bind(txn.payment_method)
    .bind(&txn.customer_id)
    .bind(&txn.operator_id)
    .bind(txn.created_at)
    .bind(txn.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Inserts one line snapshot.
pub(crate) async fn insert_line_with(
    conn: &mut SqliteConnection,
    line: &TransactionLine,
) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO transaction_lines ( \
            id, transaction_id, item_id, sku_snapshot, name_snapshot, \
            unit_price_cents, unit_cost_cents, quantity, line_total_cents, created_at \
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )
    .bind(&line.id)
    .bind(&line.transaction_id)
    .bind(&line.item_id)
    .bind(&line.sku_snapshot)
    .bind(&line.name_snapshot)
    .bind(line.unit_price_cents)
    .bind(line.unit_cost_cents)
    .bind(line.quantity)
    .bind(line.line_total_cents)
    .bind(line.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Sets a transaction's status (refund: completed → returned).
pub(crate) async fn set_status_with(
    conn: &mut SqliteConnection,
    id: &str,
    status: TxnStatus,
    now: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query("UPDATE transactions SET status = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(id)
        .bind(status)
        .bind(now)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Rewrites a transaction's manifest and money columns in place (edit).
pub(crate) async fn rewrite_with(
    conn: &mut SqliteConnection,
    id: &str,
    manifest: &str,
    total_cents: i64,
    cash_tendered_cents: i64,
    change_cents: i64,
    now: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        "UPDATE transactions SET \
            manifest = ?2, total_cents = ?3, cash_tendered_cents = ?4, \
            change_cents = ?5, updated_at = ?6 \
         WHERE id = ?1",
    )
    .bind(id)
    .bind(manifest)
    .bind(total_cents)
    .bind(cash_tendered_cents)
    .bind(change_cents)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Deletes a transaction's line snapshots (edit rewrites them wholesale).
pub(crate) async fn delete_lines_with(
    conn: &mut SqliteConnection,
    transaction_id: &str,
) -> DbResult<()> {
    sqlx::query("DELETE FROM transaction_lines WHERE transaction_id = ?1")
        .bind(transaction_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Deletes a transaction row; lines cascade.
/// Used by resume (held rows) and the administrative delete.
pub(crate) async fn delete_with(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
    sqlx::query("DELETE FROM transactions WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Generates a new transaction line id.
pub fn generate_line_id() -> String {
    Uuid::new_v4().to_string()
}
