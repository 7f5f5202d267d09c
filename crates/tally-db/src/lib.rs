//! # tally-db: Database Layer + Order Engine for tally-pos
//!
//! SQLite persistence and the order lifecycle engine built on top of it.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     tally-pos Architecture                          │
//! │                                                                     │
//! │  ┌───────────────────────────────────────────────────────────────┐ │
//! │  │          POS UI (login, item entry, receipts, reports)        │ │
//! │  └───────────────────────────────┬───────────────────────────────┘ │
//! │                                  │                                  │
//! │  ┌───────────────────────────────▼───────────────────────────────┐ │
//! │  │                ★ tally-db (THIS CRATE) ★                      │ │
//! │  │                                                               │ │
//! │  │   ┌──────────────────────┐  ┌─────────────────────────────┐  │ │
//! │  │   │  engine              │  │  repository                 │  │ │
//! │  │   │  ledger • session    │  │  item • transaction         │  │ │
//! │  │   │  checkout • hold     │  │  aggregate • audit          │  │ │
//! │  │   │  refund • admin      │  │                             │  │ │
//! │  │   └──────────┬───────────┘  └──────────────┬──────────────┘  │ │
//! │  │              └───────────┬────────────────-┘                 │ │
//! │  │                  ┌───────▼────────┐                          │ │
//! │  │                  │  pool (SQLite) │  WAL • busy_timeout      │ │
//! │  │                  └────────────────┘  embedded migrations     │ │
//! │  └───────────────────────────────┬───────────────────────────────┘ │
//! │                                  │                                  │
//! │  ┌───────────────────────────────▼───────────────────────────────┐ │
//! │  │              tally-core (pure business logic)                 │ │
//! │  └───────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use tally_db::{Database, DbConfig, OrderSession};
//! use tally_core::Money;
//!
//! let db = Database::new(DbConfig::new("tally.db")).await?;
//! db.reconcile_reservations().await?;
//!
//! let mut session = OrderSession::new(db.clone(), "op-1");
//! session.add_item(&item_id).await?;
//! let receipt = session.checkout(Money::from_cents(2000)).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod engine;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use engine::{Authorizer, ElevatedAction, OrderSession, StockLevel};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
