//! # tally-core: Pure Business Logic for tally-pos
//!
//! This crate is the heart of the order lifecycle engine. It contains all
//! business rules as pure functions with zero I/O dependencies.
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
//! │  │                  tally-db (engine + storage)                  │ │
//! │  │   ledger • sessions • checkout • hold/resume • refund/edit    │ │
//! │  └───────────────────────────────┬───────────────────────────────┘ │
//! │                                  │                                  │
//! │  ┌───────────────────────────────▼───────────────────────────────┐ │
//! │  │                ★ tally-core (THIS CRATE) ★                    │ │
//! │  │                                                               │ │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐           │ │
//! │  │   │  types  │ │  money  │ │  cart   │ │ manifest │           │ │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └──────────┘           │ │
//! │  │                                                               │ │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS          │ │
//! │  └───────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (StockItem, Transaction, DailyAggregate, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - In-memory working order: lines, discount gating, totals
//! - [`manifest`] - The `itemId:qty;...` wire form for transaction contents
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input, same output - always
//! 2. **No I/O**: database, network and file system access are FORBIDDEN here
//! 3. **Integer Money**: all monetary values are cents (i64), never floats
//! 4. **Explicit Errors**: typed error enums, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod manifest;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Stock level at or below which the UI shows a low-stock warning.
///
/// The warning threshold compares against *available* stock
/// (on-hand minus reserved), not raw on-hand, so quantities sitting in
/// open carts already count as gone.
pub const LOW_STOCK_THRESHOLD: i64 = 10;

/// Maximum number of distinct lines allowed in a single cart.
///
/// Prevents runaway carts and keeps receipts printable.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single item in a cart line.
///
/// Prevents accidental over-ordering (e.g. typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;
