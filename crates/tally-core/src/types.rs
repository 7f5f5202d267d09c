//! # Domain Types
//!
//! Core domain types used throughout tally-pos.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                          Domain Types                               │
//! │                                                                     │
//! │  ┌────────────────┐  ┌─────────────────┐  ┌──────────────────┐     │
//! │  │   StockItem    │  │   Transaction   │  │ TransactionLine  │     │
//! │  │  ────────────  │  │  ─────────────  │  │  ──────────────  │     │
//! │  │  id (UUID)     │  │  id (MM-YYYY-#) │  │  id (UUID)       │     │
//! │  │  sku (business)│  │  status         │  │  txn_id (FK)     │     │
//! │  │  on_hand       │  │  manifest       │  │  price snapshot  │     │
//! │  │  reserved      │  │  total_cents    │  │  quantity        │     │
//! │  └────────────────┘  └─────────────────┘  └──────────────────┘     │
//! │                                                                     │
//! │  ┌────────────────┐  ┌─────────────────┐  ┌──────────────────┐     │
//! │  │   TxnStatus    │  │ PaymentMethod   │  │  DailyAggregate  │     │
//! │  │  Held          │  │  Cash           │  │  AuditLogEntry   │     │
//! │  │  Completed     │  │  Card           │  └──────────────────┘     │
//! │  │  Returned      │  │  Mobile         │                           │
//! │  └────────────────┘  └─────────────────┘                           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Stock items carry a UUID (`id`, immutable, used for relations) and a
//! business id (`sku`, human-readable). Transactions use their human-readable
//! allocated id directly since it is already unique and immutable.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::LOW_STOCK_THRESHOLD;

// =============================================================================
// Stock Item
// =============================================================================

/// A stock-keeping item available for sale.
///
/// ## Reservation Ledger
/// `on_hand` is the physical quantity; `reserved` is the portion committed to
/// open carts and held transactions. `available = on_hand - reserved` is what
/// a new reservation may draw from. Stock leaves circulation only when a
/// checkout consumes its reservation (both columns drop together).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockItem {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Display name shown to the operator and on receipts.
    pub name: String,

    /// Category for reporting and browsing.
    pub category: String,

    /// Acquisition cost in cents (for profit calculations).
    pub unit_cost_cents: i64,

    /// Retail price in cents.
    pub retail_price_cents: i64,

    /// Physical quantity on hand. Never negative.
    pub on_hand: i64,

    /// Quantity committed to open carts and held transactions.
    pub reserved: i64,

    /// Supplier reference.
    pub supplier: Option<String>,

    /// Whether the item is active (soft delete).
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockItem {
    /// Retail price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.retail_price_cents)
    }

    /// Unit cost as Money.
    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.unit_cost_cents)
    }

    /// Quantity a new reservation may draw from.
    #[inline]
    pub fn available(&self) -> i64 {
        self.on_hand - self.reserved
    }

    /// Whether available stock has dropped to the warning threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.available() <= LOW_STOCK_THRESHOLD
    }
}

// =============================================================================
// Transaction Status
// =============================================================================

/// Lifecycle state of a persisted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum TxnStatus {
    /// Suspended cart awaiting resume. Its reservations are still tracked.
    Held,
    /// Finalized sale. Immutable except through the explicit edit operation.
    Completed,
    /// Refunded sale. Stock was released back to on-hand.
    Returned,
}

impl TxnStatus {
    /// Lowercase label matching the stored form (for error messages).
    pub fn as_str(&self) -> &'static str {
        match self {
            TxnStatus::Held => "held",
            TxnStatus::Completed => "completed",
            TxnStatus::Returned => "returned",
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a transaction was (or will be) paid.
///
/// Only `Cash` participates in the tendered/change arithmetic; other methods
/// settle externally and record zero change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Mobile,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A persisted transaction: a completed sale, a suspended (held) cart, or a
/// returned sale.
///
/// The `manifest` column keeps the source-compatible `itemId:qty;...` string;
/// `TransactionLine` rows carry the authoritative per-line price snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Transaction {
    /// Allocated id in `MM-YYYY-NNNNN` form, unique and monotonic per month.
    pub id: String,

    /// Semicolon-separated `itemId:qty` pairs (see [`crate::manifest`]).
    pub manifest: String,

    pub total_cents: i64,
    pub cash_tendered_cents: i64,
    pub change_cents: i64,
    pub status: TxnStatus,
    pub payment_method: PaymentMethod,
    pub customer_id: Option<String>,
    pub operator_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn change(&self) -> Money {
        Money::from_cents(self.change_cents)
    }
}

// =============================================================================
// Transaction Line
// =============================================================================

/// A line item belonging to a transaction.
///
/// Uses the snapshot pattern: sku, name, unit price and unit cost are frozen
/// at the moment the line entered a cart, so historical records survive later
/// item edits and resume rebuilds carts with their original prices.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TransactionLine {
    pub id: String,
    pub transaction_id: String,
    pub item_id: String,
    /// SKU at the time the line was created (frozen).
    pub sku_snapshot: String,
    /// Display name at the time the line was created (frozen).
    pub name_snapshot: String,
    /// Unit price in cents at the time the line was created (frozen).
    pub unit_price_cents: i64,
    /// Acquisition cost in cents at the time the line was created (frozen),
    /// so profit adjustments after a later cost change still net out exactly.
    pub unit_cost_cents: i64,
    pub quantity: i64,
    /// unit_price × quantity.
    pub line_total_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl TransactionLine {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Daily Aggregate
// =============================================================================

/// Per-day rollup of completed sales, maintained incrementally at checkout.
///
/// Gross figures (`total_sales_cents`, `unit_sales`, `net_profit_cents`) are
/// never decremented by refunds; `refund_total_cents` accumulates instead so
/// both gross bookings and net realized sales are available.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub total_sales_cents: i64,
    pub unit_sales: i64,
    /// Σ (retail − unit cost) × qty over the day's completed lines,
    /// with unit cost read at checkout time.
    pub net_profit_cents: i64,
    pub refund_total_cents: i64,
}

impl DailyAggregate {
    /// Gross bookings for the day.
    #[inline]
    pub fn gross_sales(&self) -> Money {
        Money::from_cents(self.total_sales_cents)
    }

    /// Gross minus refunds issued against the day's transactions.
    #[inline]
    pub fn net_sales(&self) -> Money {
        Money::from_cents(self.total_sales_cents - self.refund_total_cents)
    }
}

// =============================================================================
// Audit Log
// =============================================================================

/// Append-only record of an elevated or state-changing action.
/// Never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AuditLogEntry {
    pub id: String,
    /// Action type, e.g. "CHECKOUT", "REFUND", "VOID_LINE".
    pub action: String,
    /// Free-text detail.
    pub detail: String,
    pub ts: DateTime<Utc>,
    /// Acting operator.
    pub actor: String,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(on_hand: i64, reserved: i64) -> StockItem {
        let now = Utc::now();
        StockItem {
            id: "id".into(),
            sku: "MED001".into(),
            name: "Paracetamol 500mg".into(),
            category: "MED".into(),
            unit_cost_cents: 600,
            retail_price_cents: 1000,
            on_hand,
            reserved,
            supplier: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_available_subtracts_reservations() {
        let i = item(100, 2);
        assert_eq!(i.available(), 98);
        assert!(!i.is_low_stock());
    }

    #[test]
    fn test_low_stock_uses_available() {
        // 15 on hand but 5 reserved → available 10 → low
        assert!(item(15, 5).is_low_stock());
        assert!(!item(15, 0).is_low_stock());
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(TxnStatus::Held.as_str(), "held");
        assert_eq!(TxnStatus::Completed.as_str(), "completed");
        assert_eq!(TxnStatus::Returned.as_str(), "returned");
    }

    #[test]
    fn test_aggregate_net_sales() {
        let agg = DailyAggregate {
            date: NaiveDate::from_ymd_opt(2026, 8, 23).unwrap(),
            total_sales_cents: 10000,
            unit_sales: 12,
            net_profit_cents: 4000,
            refund_total_cents: 2500,
        };
        assert_eq!(agg.gross_sales().cents(), 10000);
        assert_eq!(agg.net_sales().cents(), 7500);
    }
}
