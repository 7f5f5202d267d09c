//! # Repository Module
//!
//! Database repository implementations.
//!
//! ## Two Kinds of Method
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Pool methods (&self)                Connection helpers (fns)       │
//! │  ─────────────────────               ────────────────────────       │
//! │  reads and standalone CRUD,          take &mut SqliteConnection so  │
//! │  each statement its own unit         the engine can compose several │
//! │                                      writes into ONE transaction    │
//! │                                                                     │
//! │  db.items().get_by_sku("MED001")     transaction::insert_with(&mut  │
//! │  db.transactions().list_held()           *tx, &txn)                 │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine owns every transaction boundary; repositories never call
//! `begin()` themselves.
//!
//! ## Available Repositories
//!
//! - [`item::ItemRepository`] - stock item CRUD and lookups
//! - [`transaction::TransactionRepository`] - transaction and line reads
//! - [`aggregate::AggregateRepository`] - daily rollup reads
//! - [`audit::AuditRepository`] - audit trail reads

pub mod aggregate;
pub mod audit;
pub mod item;
pub mod transaction;
