//! # Daily Aggregate Repository
//!
//! Reads for the per-day sales rollup, plus the upsert helpers checkout and
//! refund compose into their transactions.
//!
//! Gross figures are only ever incremented; refunds accumulate separately in
//! `refund_total_cents` so reports can show gross bookings and net realized
//! sales side by side.

use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::DbResult;
use tally_core::DailyAggregate;

const AGG_COLUMNS: &str =
    "date, total_sales_cents, unit_sales, net_profit_cents, refund_total_cents";

/// Repository for daily aggregate reads.
#[derive(Debug, Clone)]
pub struct AggregateRepository {
    pool: SqlitePool,
}

impl AggregateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AggregateRepository { pool }
    }

    /// Gets the rollup for one calendar day, if any sales landed on it.
    pub async fn for_date(&self, date: NaiveDate) -> DbResult<Option<DailyAggregate>> {
        let agg = sqlx::query_as::<_, DailyAggregate>(&format!(
            "SELECT {AGG_COLUMNS} FROM daily_aggregates WHERE date = ?1"
        ))
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(agg)
    }

    /// Lists rollups for an inclusive date range, oldest first.
    /// Days with no sales simply have no row.
    pub async fn range(&self, from: NaiveDate, to: NaiveDate) -> DbResult<Vec<DailyAggregate>> {
        let aggs = sqlx::query_as::<_, DailyAggregate>(&format!(
            "SELECT {AGG_COLUMNS} FROM daily_aggregates \
             WHERE date >= ?1 AND date <= ?2 ORDER BY date"
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(aggs)
    }
}

// =============================================================================
// Connection helpers (composed into engine transactions)
// =============================================================================

/// Folds a completed sale into the day's rollup (insert-or-accumulate).
pub(crate) async fn record_sale_with(
    conn: &mut SqliteConnection,
    date: NaiveDate,
    total_cents: i64,
    units: i64,
    profit_cents: i64,
) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO daily_aggregates \
            (date, total_sales_cents, unit_sales, net_profit_cents, refund_total_cents) \
         VALUES (?1, ?2, ?3, ?4, 0) \
         ON CONFLICT(date) DO UPDATE SET \
            total_sales_cents = total_sales_cents + ?2, \
            unit_sales = unit_sales + ?3, \
            net_profit_cents = net_profit_cents + ?4",
    )
    .bind(date)
    .bind(total_cents)
    .bind(units)
    .bind(profit_cents)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Accumulates a refund against the day the sale originally landed on.
/// Gross columns stay untouched.
pub(crate) async fn record_refund_with(
    conn: &mut SqliteConnection,
    date: NaiveDate,
    refund_cents: i64,
) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO daily_aggregates \
            (date, total_sales_cents, unit_sales, net_profit_cents, refund_total_cents) \
         VALUES (?1, 0, 0, 0, ?2) \
         ON CONFLICT(date) DO UPDATE SET \
            refund_total_cents = refund_total_cents + ?2",
    )
    .bind(date)
    .bind(refund_cents)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
