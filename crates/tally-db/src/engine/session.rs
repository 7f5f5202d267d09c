//! # Order Session
//!
//! The per-operator working order: one live [`Cart`] plus the database handle
//! that settles every cart change against the inventory ledger.
//!
//! ## Reservation Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  add item        ─►  reserve 1        ─►  bump cart line            │
//! │  raise quantity  ─►  reserve diff     ─►  set cart quantity         │
//! │  lower quantity  ─►  release diff     ─►  set cart quantity         │
//! │  void line       ─►  release all      ─►  drop cart line  (+audit)  │
//! │                                                                     │
//! │  Ledger FIRST, cart SECOND: a failed reservation leaves the cart    │
//! │  exactly as it was, and the cart never claims stock it doesn't own. │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Checkout, hold and resume delegate to their engine modules; on success the
//! session's cart resets and the operator starts the next order.

use tracing::{debug, warn};

use crate::engine::{checkout, hold, ledger, Authorizer, ElevatedAction};
use crate::error::DbError;
use crate::pool::Database;
use crate::repository::audit;
use tally_core::{
    Cart, CoreError, CoreResult, Money, PaymentMethod, StockItem, Transaction,
    MAX_CART_LINES, MAX_LINE_QUANTITY,
};

/// A live order owned by one operator.
///
/// Not shared between operators; cross-session consistency comes from the
/// ledger's guarded updates, not from locking the session.
pub struct OrderSession {
    db: Database,
    cart: Cart,
}

impl OrderSession {
    /// Opens a fresh session with an empty cart.
    pub fn new(db: Database, operator_id: impl Into<String>) -> Self {
        OrderSession {
            db,
            cart: Cart::new(operator_id),
        }
    }

    /// Resumes a held transaction as a live session owned by `operator_id`.
    ///
    /// The held row is deleted and its reservations carry over; see
    /// [`hold`](crate::engine::hold).
    pub async fn resume(
        db: Database,
        held_id: &str,
        operator_id: &str,
    ) -> CoreResult<OrderSession> {
        let cart = hold::revive(&db, held_id, operator_id, chrono::Utc::now()).await?;
        Ok(OrderSession { db, cart })
    }

    /// The current cart, for display.
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn operator_id(&self) -> &str {
        self.cart.operator_id()
    }

    // -------------------------------------------------------------------------
    // Line Mutation
    // -------------------------------------------------------------------------

    /// Adds one unit of an item, reserving it first.
    ///
    /// Returns the line's new quantity.
    ///
    /// ## Returns
    /// * `Err(CoreError::ItemNotFound)` - unknown or inactive item
    /// * `Err(CoreError::OutOfStock)` - no available stock left
    pub async fn add_item(&mut self, item_id: &str) -> CoreResult<i64> {
        let item = self.load_active_item(item_id).await?;

        // Cart capacity checks run before the ledger is touched
        let current = self.cart.line_quantity(item_id);
        if current + 1 > MAX_LINE_QUANTITY {
            return Err(CoreError::InvalidQuantity {
                requested: current + 1,
            });
        }
        if current == 0 && self.cart.lines().len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        ledger::reserve(&self.db, item_id, 1).await?;

        match self.cart.add_unit(&item) {
            Ok(qty) => {
                debug!(item_id = %item_id, qty = %qty, "Line updated");
                Ok(qty)
            }
            Err(e) => {
                // Pre-checks make this unreachable; hand the unit back anyway
                ledger::release(&self.db, item_id, 1).await?;
                Err(e)
            }
        }
    }

    /// Sets a line's quantity, settling the reservation delta first.
    /// Zero removes the line.
    pub async fn set_quantity(&mut self, item_id: &str, new_qty: i64) -> CoreResult<()> {
        if new_qty < 0 || new_qty > MAX_LINE_QUANTITY {
            return Err(CoreError::InvalidQuantity { requested: new_qty });
        }
        if self.cart.line(item_id).is_none() {
            return Err(CoreError::ItemNotFound(item_id.to_string()));
        }

        let current = self.cart.line_quantity(item_id);
        let delta = new_qty - current;
        if delta > 0 {
            ledger::reserve(&self.db, item_id, delta).await?;
        } else if delta < 0 {
            ledger::release(&self.db, item_id, -delta).await?;
        }

        self.cart.set_quantity(item_id, new_qty)
    }

    /// Removes a line entirely. Authorization-gated and audited.
    pub async fn void_line(
        &mut self,
        item_id: &str,
        authorizer: &dyn Authorizer,
        approver_id: &str,
    ) -> CoreResult<()> {
        if !authorizer.allow_elevated(approver_id, ElevatedAction::VoidLine) {
            warn!(item_id = %item_id, approver = %approver_id, "Void line denied");
            return Err(CoreError::Unauthorized {
                action: ElevatedAction::VoidLine.to_string(),
            });
        }

        let qty = self.cart.line_quantity(item_id);
        if qty == 0 {
            return Err(CoreError::ItemNotFound(item_id.to_string()));
        }

        let now = chrono::Utc::now();
        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;
        ledger::release_with(&mut tx, item_id, qty).await?;
        audit::append_with(
            &mut tx,
            audit::actions::VOID_LINE,
            &format!("item {item_id} qty {qty}"),
            approver_id,
            now,
        )
        .await?;
        tx.commit().await.map_err(DbError::from)?;

        self.cart.remove_line(item_id);
        Ok(())
    }

    /// Abandons the whole order. Authorization-gated and audited.
    pub async fn void_order(
        &mut self,
        authorizer: &dyn Authorizer,
        approver_id: &str,
    ) -> CoreResult<()> {
        if !authorizer.allow_elevated(approver_id, ElevatedAction::VoidOrder) {
            warn!(approver = %approver_id, "Void order denied");
            return Err(CoreError::Unauthorized {
                action: ElevatedAction::VoidOrder.to_string(),
            });
        }

        let now = chrono::Utc::now();
        let units = self.cart.unit_count();
        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;
        for line in self.cart.lines() {
            ledger::release_with(&mut tx, &line.item_id, line.quantity).await?;
        }
        audit::append_with(
            &mut tx,
            audit::actions::VOID_ORDER,
            &format!("{units} units released"),
            approver_id,
            now,
        )
        .await?;
        tx.commit().await.map_err(DbError::from)?;

        self.cart.reset();
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Order Metadata
    // -------------------------------------------------------------------------

    /// Applies a discount rate (basis points). Authorization-gated.
    pub fn apply_discount(
        &mut self,
        rate_bps: u32,
        authorizer: &dyn Authorizer,
        approver_id: &str,
    ) -> CoreResult<()> {
        if !authorizer.allow_elevated(approver_id, ElevatedAction::ApplyDiscount) {
            warn!(rate_bps = %rate_bps, approver = %approver_id, "Discount denied");
            return Err(CoreError::Unauthorized {
                action: ElevatedAction::ApplyDiscount.to_string(),
            });
        }
        self.cart.set_discount(rate_bps, true)
    }

    pub fn set_customer(&mut self, customer_id: Option<String>) {
        self.cart.set_customer(customer_id);
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.cart.set_payment_method(method);
    }

    // -------------------------------------------------------------------------
    // Terminal Operations
    // -------------------------------------------------------------------------

    /// Finalizes the cart as a completed sale; see
    /// [`checkout`](crate::engine::checkout). The cart resets on success.
    pub async fn checkout(&mut self, tendered: Money) -> CoreResult<Transaction> {
        let txn = checkout::finalize(&self.db, &self.cart, tendered, chrono::Utc::now()).await?;
        self.cart.reset();
        Ok(txn)
    }

    /// Suspends the cart as a held transaction; see
    /// [`hold`](crate::engine::hold). The cart resets on success.
    pub async fn hold(&mut self) -> CoreResult<Transaction> {
        let txn = hold::suspend(&self.db, &self.cart, chrono::Utc::now()).await?;
        self.cart.reset();
        Ok(txn)
    }

    /// Discards the cart, releasing every reservation. Not audited: the
    /// operator abandoning their own unfinished order is routine.
    pub async fn clear(&mut self) -> CoreResult<()> {
        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;
        for line in self.cart.lines() {
            ledger::release_with(&mut tx, &line.item_id, line.quantity).await?;
        }
        tx.commit().await.map_err(DbError::from)?;

        self.cart.reset();
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Internal
    // -------------------------------------------------------------------------

    async fn load_active_item(&self, item_id: &str) -> CoreResult<StockItem> {
        let item = self
            .db
            .items()
            .get_by_id(item_id)
            .await
            .map_err(CoreError::from)?
            .filter(|i| i.is_active)
            .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))?;
        Ok(item)
    }
}
