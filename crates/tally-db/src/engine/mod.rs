//! # Order Engine
//!
//! The order lifecycle and inventory consistency engine.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  UI ──► OrderSession ──► ledger (reserve/release)                   │
//! │              │                                                      │
//! │              ├──checkout──► allocator ─► transactions + aggregates  │
//! │              ├──hold──────► transactions (status: held)             │
//! │              └──resume────► back to a live OrderSession             │
//! │                                                                     │
//! │  refund / edit / admin re-enter the same ledger and store           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every mutation here runs inside a single SQLite transaction owned by the
//! engine, never by the UI layer: a failure after an id was allocated rolls
//! the allocation back with everything else.

pub mod allocator;
pub mod checkout;
pub mod hold;
pub mod ledger;
pub mod refund;
pub mod session;

mod admin;

pub use admin::{delete_item, delete_transaction};
pub use ledger::StockLevel;
pub use session::OrderSession;

use std::fmt;

// =============================================================================
// Authorization Seam
// =============================================================================

/// Elevated actions that require a second pair of eyes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElevatedAction {
    ApplyDiscount,
    VoidLine,
    VoidOrder,
    Refund,
    DeleteTransaction,
    DeleteItem,
}

impl fmt::Display for ElevatedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ElevatedAction::ApplyDiscount => "apply discount",
            ElevatedAction::VoidLine => "void line",
            ElevatedAction::VoidOrder => "void order",
            ElevatedAction::Refund => "refund",
            ElevatedAction::DeleteTransaction => "delete transaction",
            ElevatedAction::DeleteItem => "delete item",
        };
        f.write_str(label)
    }
}

/// The external authentication/authorization collaborator.
///
/// The engine calls this as an opaque predicate before any elevated
/// operation; how the decision is made (PIN pad, manager card, role table)
/// is entirely the implementor's business.
///
/// ## Example
/// ```rust
/// use tally_db::engine::{Authorizer, ElevatedAction};
///
/// struct ManagersOnly;
///
/// impl Authorizer for ManagersOnly {
///     fn allow_elevated(&self, operator_id: &str, _action: ElevatedAction) -> bool {
///         operator_id.starts_with("mgr-")
///     }
/// }
/// ```
pub trait Authorizer: Send + Sync {
    /// Returns true if `operator_id` may perform `action`.
    fn allow_elevated(&self, operator_id: &str, action: ElevatedAction) -> bool;
}
