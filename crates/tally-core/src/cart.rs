//! # Cart Module
//!
//! The in-memory working order: an ordered sequence of lines plus discount,
//! customer and payment metadata, owned by one operator.
//!
//! ## Division of Labor
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  tally-db OrderSession          tally-core Cart (THIS MODULE)       │
//! │  ─────────────────────          ──────────────────────────────      │
//! │  reserves/releases stock   ◄──► pure line bookkeeping               │
//! │  authorization checks           totals / discount math              │
//! │  transaction boundaries         snapshot prices                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cart never touches the inventory ledger itself; the session adjusts
//! reservations first and only then records the change here. That ordering
//! means a failed reservation leaves the cart untouched.
//!
//! Lines merge by item: adding an item that is already in the cart bumps the
//! existing line's quantity, keeping the unit price snapshotted at first add.
//! A line is therefore addressed by its item id.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{PaymentMethod, StockItem};
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// One line of a cart: an item reference, a quantity and a price snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub item_id: String,
    /// SKU at the time the line was created (frozen).
    pub sku: String,
    /// Display name at the time the line was created (frozen).
    pub name: String,
    /// Always >= 1; a line that would reach 0 is removed instead.
    pub quantity: i64,
    /// Unit price in cents captured when the line was created - a snapshot,
    /// not a live read of the item's retail price.
    pub unit_price_cents: i64,
}

impl CartLine {
    /// quantity × snapshotted unit price.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Cart
// =============================================================================

/// An in-progress order. Created empty at session start, terminated by
/// checkout, hold or an explicit clear.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
    /// Discount rate in basis points (1000 = 10%).
    discount_bps: u32,
    /// The discount only affects totals once elevated authorization passed.
    discount_authorized: bool,
    customer_id: Option<String>,
    payment_method: PaymentMethod,
    operator_id: String,
}

impl Cart {
    /// Creates an empty cart owned by `operator_id`.
    pub fn new(operator_id: impl Into<String>) -> Self {
        Cart {
            lines: Vec::new(),
            discount_bps: 0,
            discount_authorized: false,
            customer_id: None,
            payment_method: PaymentMethod::Cash,
            operator_id: operator_id.into(),
        }
    }

    /// Rebuilds a cart from previously frozen lines (used by resume).
    pub fn from_lines(operator_id: impl Into<String>, lines: Vec<CartLine>) -> Self {
        let mut cart = Cart::new(operator_id);
        cart.lines = lines;
        cart
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn operator_id(&self) -> &str {
        &self.operator_id
    }

    /// Lines in insertion order (significant for display only).
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, item_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.item_id == item_id)
    }

    /// Current quantity for an item, 0 if absent.
    pub fn line_quantity(&self, item_id: &str) -> i64 {
        self.line(item_id).map(|l| l.quantity).unwrap_or(0)
    }

    pub fn customer_id(&self) -> Option<&str> {
        self.customer_id.as_deref()
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn discount_bps(&self) -> u32 {
        self.discount_bps
    }

    pub fn discount_authorized(&self) -> bool {
        self.discount_authorized
    }

    // -------------------------------------------------------------------------
    // Mutation (pure bookkeeping - reservations are the session's job)
    // -------------------------------------------------------------------------

    /// Adds one unit of `item`, merging into an existing line or snapshotting
    /// a new one. Returns the line's new quantity.
    pub fn add_unit(&mut self, item: &StockItem) -> CoreResult<i64> {
        if let Some(line) = self.lines.iter_mut().find(|l| l.item_id == item.id) {
            if line.quantity + 1 > MAX_LINE_QUANTITY {
                return Err(CoreError::InvalidQuantity {
                    requested: line.quantity + 1,
                });
            }
            line.quantity += 1;
            return Ok(line.quantity);
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        self.lines.push(CartLine {
            item_id: item.id.clone(),
            sku: item.sku.clone(),
            name: item.name.clone(),
            quantity: 1,
            unit_price_cents: item.retail_price_cents,
        });
        Ok(1)
    }

    /// Sets a line's quantity. Zero removes the line.
    ///
    /// The caller must have already settled the reservation delta with the
    /// ledger; this only records the outcome.
    pub fn set_quantity(&mut self, item_id: &str, new_qty: i64) -> CoreResult<()> {
        if new_qty < 0 || new_qty > MAX_LINE_QUANTITY {
            return Err(CoreError::InvalidQuantity { requested: new_qty });
        }

        let idx = self
            .lines
            .iter()
            .position(|l| l.item_id == item_id)
            .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))?;

        if new_qty == 0 {
            self.lines.remove(idx);
        } else {
            self.lines[idx].quantity = new_qty;
        }
        Ok(())
    }

    /// Removes a line outright, returning it for reservation release.
    pub fn remove_line(&mut self, item_id: &str) -> Option<CartLine> {
        let idx = self.lines.iter().position(|l| l.item_id == item_id)?;
        Some(self.lines.remove(idx))
    }

    /// Stores the discount rate and whether it has been authorized.
    /// An unauthorized rate is remembered but contributes nothing to totals.
    pub fn set_discount(&mut self, rate_bps: u32, authorized: bool) -> CoreResult<()> {
        crate::validation::validate_discount_bps(rate_bps)?;
        self.discount_bps = rate_bps;
        self.discount_authorized = authorized;
        Ok(())
    }

    pub fn set_customer(&mut self, customer_id: Option<String>) {
        self.customer_id = customer_id;
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.payment_method = method;
    }

    /// Drops all lines and metadata, keeping the owning operator.
    pub fn reset(&mut self) {
        self.lines.clear();
        self.discount_bps = 0;
        self.discount_authorized = false;
        self.customer_id = None;
        self.payment_method = PaymentMethod::Cash;
    }

    // -------------------------------------------------------------------------
    // Totals
    // -------------------------------------------------------------------------

    /// Σ line totals.
    pub fn subtotal(&self) -> Money {
        self.lines
            .iter()
            .fold(Money::zero(), |acc, l| acc + l.line_total())
    }

    /// Discount amount: `subtotal × rate` when authorized, zero otherwise.
    pub fn discount_amount(&self) -> Money {
        if self.discount_authorized {
            self.subtotal().percentage(self.discount_bps)
        } else {
            Money::zero()
        }
    }

    /// `subtotal − discount`, clamped at zero.
    pub fn total(&self) -> Money {
        self.subtotal().saturating_sub_zero(self.discount_amount())
    }

    /// Σ quantities across all lines.
    pub fn unit_count(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// `(item_id, quantity)` pairs for manifest serialization.
    pub fn manifest_entries(&self) -> Vec<(String, i64)> {
        self.lines
            .iter()
            .map(|l| (l.item_id.clone(), l.quantity))
            .collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn stock_item(id: &str, price_cents: i64) -> StockItem {
        let now = Utc::now();
        StockItem {
            id: id.into(),
            sku: format!("SKU-{id}"),
            name: format!("Item {id}"),
            category: "GEN".into(),
            unit_cost_cents: price_cents / 2,
            retail_price_cents: price_cents,
            on_hand: 100,
            reserved: 0,
            supplier: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_add_unit_merges_lines() {
        let item = stock_item("a", 1000);
        let mut cart = Cart::new("op-1");

        assert_eq!(cart.add_unit(&item).unwrap(), 1);
        assert_eq!(cart.add_unit(&item).unwrap(), 2);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.subtotal().cents(), 2000);
        assert_eq!(cart.unit_count(), 2);
    }

    #[test]
    fn test_snapshot_price_survives_item_change() {
        let mut item = stock_item("a", 1000);
        let mut cart = Cart::new("op-1");
        cart.add_unit(&item).unwrap();

        // Price hike after the line was created
        item.retail_price_cents = 9999;
        cart.add_unit(&item).unwrap();

        // Both units keep the price captured at first add
        assert_eq!(cart.subtotal().cents(), 2000);
    }

    #[test]
    fn test_set_quantity_zero_removes_line() {
        let item = stock_item("a", 500);
        let mut cart = Cart::new("op-1");
        cart.add_unit(&item).unwrap();

        cart.set_quantity("a", 0).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_rejects_negative() {
        let item = stock_item("a", 500);
        let mut cart = Cart::new("op-1");
        cart.add_unit(&item).unwrap();

        assert!(matches!(
            cart.set_quantity("a", -1),
            Err(CoreError::InvalidQuantity { requested: -1 })
        ));
        // Line unchanged on failure
        assert_eq!(cart.line_quantity("a"), 1);
    }

    #[test]
    fn test_unauthorized_discount_contributes_nothing() {
        let item = stock_item("a", 10000);
        let mut cart = Cart::new("op-1");
        cart.add_unit(&item).unwrap();

        cart.set_discount(1000, false).unwrap();
        assert_eq!(cart.discount_amount().cents(), 0);
        assert_eq!(cart.total().cents(), 10000);

        cart.set_discount(1000, true).unwrap();
        assert_eq!(cart.discount_amount().cents(), 1000);
        assert_eq!(cart.total().cents(), 9000);
    }

    #[test]
    fn test_total_clamped_at_zero() {
        let item = stock_item("a", 100);
        let mut cart = Cart::new("op-1");
        cart.add_unit(&item).unwrap();

        // 100% discount
        cart.set_discount(10000, true).unwrap();
        assert_eq!(cart.total().cents(), 0);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut cart = Cart::new("op-1");
        for id in ["c", "a", "b"] {
            cart.add_unit(&stock_item(id, 100)).unwrap();
        }
        let order: Vec<&str> = cart.lines().iter().map(|l| l.item_id.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_reset_keeps_operator() {
        let mut cart = Cart::new("op-1");
        cart.add_unit(&stock_item("a", 100)).unwrap();
        cart.set_discount(500, true).unwrap();
        cart.reset();

        assert!(cart.is_empty());
        assert_eq!(cart.discount_bps(), 0);
        assert_eq!(cart.operator_id(), "op-1");
    }
}
