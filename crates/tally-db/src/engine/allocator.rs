//! # Transaction ID Allocator
//!
//! Produces the human-readable transaction id: `"{MM-YYYY}-{seq}"` with the
//! sequence zero-padded to 5 digits and scoped to the calendar month.
//!
//! ## Why a Counter Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  ❌ RACY: count-then-insert                                          │
//! │     seq = SELECT COUNT(*) FROM transactions WHERE month = ?  + 1    │
//! │     (two concurrent checkouts read the same count → duplicate id)   │
//! │                                                                     │
//! │  ✅ ATOMIC: one counter row per month                                │
//! │     INSERT .. ON CONFLICT(month) DO UPDATE SET seq = seq + 1        │
//! │     RETURNING seq                                                   │
//! │     (SQLite serializes the write; each caller sees a distinct seq)  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The bump runs on the caller's connection, inside the same SQLite
//! transaction that inserts the transaction row, so a failed checkout rolls
//! the allocation back and the id is never burned onto two records.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::error::DbResult;

/// Width of the zero-padded sequence component.
const SEQ_WIDTH: usize = 5;

/// Allocates the next id for the month containing `at`.
///
/// Ids are unique and strictly increasing within a month, even under
/// concurrent checkouts. Held transactions draw from the same sequence.
pub(crate) async fn allocate_id(
    conn: &mut SqliteConnection,
    at: DateTime<Utc>,
) -> DbResult<String> {
    let month = month_key(at);

    let seq: i64 = sqlx::query_scalar(
        "INSERT INTO txn_sequences (month, seq) VALUES (?1, 1) \
         ON CONFLICT(month) DO UPDATE SET seq = seq + 1 \
         RETURNING seq",
    )
    .bind(&month)
    .fetch_one(&mut *conn)
    .await?;

    Ok(format!("{month}-{seq:0width$}", width = SEQ_WIDTH))
}

/// The month component, e.g. "08-2026".
fn month_key(at: DateTime<Utc>) -> String {
    at.format("%m-%Y").to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::TimeZone;

    #[test]
    fn test_month_key() {
        let at = Utc.with_ymd_and_hms(2026, 8, 23, 12, 0, 0).unwrap();
        assert_eq!(month_key(at), "08-2026");
    }

    #[tokio::test]
    async fn test_ids_are_strictly_increasing_within_month() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let at = Utc.with_ymd_and_hms(2026, 8, 1, 9, 0, 0).unwrap();

        let mut previous = String::new();
        for expected in 1..=3 {
            let mut tx = db.pool().begin().await.unwrap();
            let id = allocate_id(&mut tx, at).await.unwrap();
            tx.commit().await.unwrap();

            assert_eq!(id, format!("08-2026-{expected:05}"));
            assert!(id > previous);
            previous = id;
        }
    }

    #[tokio::test]
    async fn test_months_count_independently() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let aug = Utc.with_ymd_and_hms(2026, 8, 1, 9, 0, 0).unwrap();
        let sep = Utc.with_ymd_and_hms(2026, 9, 1, 9, 0, 0).unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        assert_eq!(allocate_id(&mut tx, aug).await.unwrap(), "08-2026-00001");
        assert_eq!(allocate_id(&mut tx, sep).await.unwrap(), "09-2026-00001");
        assert_eq!(allocate_id(&mut tx, aug).await.unwrap(), "08-2026-00002");
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_rolled_back_allocation_is_reused() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let at = Utc.with_ymd_and_hms(2026, 8, 1, 9, 0, 0).unwrap();

        // Allocation inside a rolled-back transaction must not burn the seq
        let mut tx = db.pool().begin().await.unwrap();
        let id = allocate_id(&mut tx, at).await.unwrap();
        assert_eq!(id, "08-2026-00001");
        tx.rollback().await.unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        let id = allocate_id(&mut tx, at).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(id, "08-2026-00001");
    }
}
