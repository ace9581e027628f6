//! # Cart Pricing Engine
//!
//! Maintains the line items of one in-progress sale ("transaction tab"),
//! applies per-line and cart-wide discounts, and produces deterministic
//! totals.
//!
//! ## Invariants
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  For every line:   0 <= line_discount <= unit_price × quantity          │
//! │                                                                         │
//! │  gross        = Σ unit_price_i × quantity_i                             │
//! │  subtotal     = gross − Σ line_discount_i                               │
//! │  vat          = subtotal × rate      (zero when tax disabled)           │
//! │  grand total  = subtotal + vat                                          │
//! │                                                                         │
//! │  Totals are always recomputed, never stored. Rounding happens only      │
//! │  when a derived amount is produced (vat, proportional shares).          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every mutating operation is all-or-nothing: on error the cart is left
//! exactly as it was.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::money::Money;
use crate::types::{CatalogItem, TaxConfig};
use crate::validation;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Line Item
// =============================================================================

/// One product/service/ad-hoc entry in a cart.
///
/// Catalog-backed lines freeze the price and stock ceiling at the moment
/// they are added; ad-hoc lines have no catalog backing (and no inventory
/// effects).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Stable line id (fresh UUID per line).
    pub id: String,

    /// Catalog id for stock lines, None for ad-hoc items.
    pub catalog_id: Option<String>,

    /// Name at time of adding (frozen).
    pub name: String,

    /// Unit price at time of adding (frozen).
    pub unit_price: Money,

    /// Quantity in cart. Always positive.
    pub quantity: i64,

    /// Per-line discount. Never exceeds `unit_price × quantity`.
    pub line_discount: Money,

    /// True for items with no catalog backing.
    pub is_ad_hoc: bool,

    /// Optional free-text note shown on the receipt.
    pub note: Option<String>,

    /// Stock available when the line was added; None when the catalog item
    /// does not track inventory (or the line is ad-hoc). The authoritative
    /// check happens again at commit via a conditional stock update.
    pub stock_ceiling: Option<i64>,

    /// When this line was added.
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl LineItem {
    /// Gross line amount before discount: unit price × quantity.
    #[inline]
    pub fn gross(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    /// Line total after discount.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.gross() - self.line_discount
    }

    /// Remaining discount headroom on this line.
    #[inline]
    pub fn discount_headroom(&self) -> Money {
        self.gross() - self.line_discount
    }

    fn from_catalog(item: &CatalogItem, quantity: i64) -> Self {
        LineItem {
            id: Uuid::new_v4().to_string(),
            catalog_id: Some(item.id.clone()),
            name: item.name.clone(),
            unit_price: item.price(),
            quantity,
            line_discount: Money::zero(),
            is_ad_hoc: false,
            note: None,
            stock_ceiling: item.track_inventory.then_some(item.stock_quantity),
            added_at: Utc::now(),
        }
    }
}

// =============================================================================
// Cart Discounts
// =============================================================================

/// A cart-wide discount, distributed proportionally across lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum CartDiscount {
    /// Percentage of the current subtotal in basis points (1-10000, so
    /// 1250 = 12.5%). Fractional percentages stay exact; no floats.
    Percentage(u32),
    /// Fixed amount off the current subtotal.
    Fixed(Money),
}

// =============================================================================
// Cart
// =============================================================================

/// One in-progress, not-yet-committed sale.
///
/// Lines keep insertion order (irrelevant to totals). The customer link is
/// an id lookup, not ownership - many carts may reference one customer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Tab id (fresh UUID per tab).
    pub id: String,

    /// Ordered line items.
    pub items: Vec<LineItem>,

    /// Linked customer, if any (weak reference - id only).
    pub customer_id: Option<String>,

    /// When the cart was created/last cleared.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            id: Uuid::new_v4().to_string(),
            items: Vec::new(),
            customer_id: None,
            created_at: Utc::now(),
        }
    }

    // -------------------------------------------------------------------------
    // Line operations
    // -------------------------------------------------------------------------

    /// Adds a catalog item, merging into an existing non-ad-hoc line for the
    /// same catalog id.
    ///
    /// ## Errors
    /// - `OutOfStock` when the item tracks inventory and available stock is
    ///   below the post-increment quantity (zero stock always fails)
    /// - `Validation` for non-positive or oversized quantities
    ///
    /// On failure the cart is unchanged.
    ///
    /// ## Returns
    /// The id of the affected line.
    pub fn add_item(&mut self, item: &CatalogItem, quantity: i64) -> EngineResult<String> {
        validation::validate_quantity(quantity)?;

        if let Some(line) = self
            .items
            .iter_mut()
            .find(|l| !l.is_ad_hoc && l.catalog_id.as_deref() == Some(item.id.as_str()))
        {
            let new_qty = line.quantity + quantity;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(EngineError::invalid_input(format!(
                    "quantity would exceed maximum of {MAX_ITEM_QUANTITY}"
                )));
            }
            if !item.can_sell(new_qty) {
                return Err(EngineError::OutOfStock {
                    name: item.name.clone(),
                    available: item.stock_quantity,
                    requested: new_qty,
                });
            }
            line.quantity = new_qty;
            line.stock_ceiling = item.track_inventory.then_some(item.stock_quantity);
            return Ok(line.id.clone());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(EngineError::invalid_input(format!(
                "cart cannot have more than {MAX_CART_ITEMS} items"
            )));
        }

        if !item.can_sell(quantity) {
            return Err(EngineError::OutOfStock {
                name: item.name.clone(),
                available: item.stock_quantity,
                requested: quantity,
            });
        }

        let line = LineItem::from_catalog(item, quantity);
        let id = line.id.clone();
        self.items.push(line);
        Ok(id)
    }

    /// Adds an ad-hoc ("misc") item with no catalog backing.
    ///
    /// Never merges with existing lines. Requires a non-empty name and a
    /// strictly positive price.
    pub fn add_ad_hoc_item(&mut self, name: &str, unit_price: Money) -> EngineResult<String> {
        validation::validate_item_name(name)?;
        validation::validate_unit_price(unit_price)?;

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(EngineError::invalid_input(format!(
                "cart cannot have more than {MAX_CART_ITEMS} items"
            )));
        }

        let line = LineItem {
            id: Uuid::new_v4().to_string(),
            catalog_id: None,
            name: name.trim().to_string(),
            unit_price,
            quantity: 1,
            line_discount: Money::zero(),
            is_ad_hoc: true,
            note: None,
            stock_ceiling: None,
            added_at: Utc::now(),
        };
        let id = line.id.clone();
        self.items.push(line);
        Ok(id)
    }

    /// Sets the quantity of a line. A quantity of zero or less removes the
    /// line (equivalent to [`Cart::remove_item`]).
    ///
    /// ## Errors
    /// - `OutOfStock` when the new quantity exceeds the line's stock ceiling
    /// - `InvalidInput` when the line does not exist
    ///
    /// If the smaller quantity would leave the line discount above the new
    /// line gross, the discount is reduced to the new gross so the line
    /// invariant keeps holding.
    pub fn set_quantity(&mut self, line_id: &str, quantity: i64) -> EngineResult<()> {
        if quantity <= 0 {
            self.remove_item(line_id);
            return Ok(());
        }

        if quantity > MAX_ITEM_QUANTITY {
            return Err(EngineError::invalid_input(format!(
                "quantity cannot exceed {MAX_ITEM_QUANTITY}"
            )));
        }

        let line = self
            .items
            .iter_mut()
            .find(|l| l.id == line_id)
            .ok_or_else(|| EngineError::invalid_input(format!("line {line_id} not in cart")))?;

        if let Some(ceiling) = line.stock_ceiling {
            if quantity > ceiling {
                return Err(EngineError::OutOfStock {
                    name: line.name.clone(),
                    available: ceiling,
                    requested: quantity,
                });
            }
        }

        line.quantity = quantity;
        let gross = line.gross();
        if line.line_discount > gross {
            line.line_discount = gross;
        }
        Ok(())
    }

    /// Removes a line unconditionally. Idempotent - no error if absent.
    pub fn remove_item(&mut self, line_id: &str) {
        self.items.retain(|l| l.id != line_id);
    }

    /// Replaces a line's price, discount, and note atomically.
    ///
    /// ## Errors
    /// `InvalidInput` when the price is not positive, the discount is
    /// negative, or the discount exceeds `price × quantity`. Nothing is
    /// changed on failure (all-or-nothing).
    pub fn edit_line(
        &mut self,
        line_id: &str,
        unit_price: Money,
        line_discount: Money,
        note: Option<String>,
    ) -> EngineResult<()> {
        validation::validate_unit_price(unit_price)?;
        validation::validate_discount(line_discount)?;

        let line = self
            .items
            .iter_mut()
            .find(|l| l.id == line_id)
            .ok_or_else(|| EngineError::invalid_input(format!("line {line_id} not in cart")))?;

        let new_gross = unit_price.multiply_quantity(line.quantity);
        if line_discount > new_gross {
            return Err(EngineError::invalid_input(format!(
                "discount {line_discount} exceeds line total {new_gross}"
            )));
        }

        line.unit_price = unit_price;
        line.line_discount = line_discount;
        line.note = note;
        Ok(())
    }

    /// Links a customer to this cart (id lookup, not ownership).
    pub fn link_customer(&mut self, customer_id: impl Into<String>) {
        self.customer_id = Some(customer_id.into());
    }

    /// Removes the customer link.
    pub fn unlink_customer(&mut self) {
        self.customer_id = None;
    }

    /// Empties all lines and clears the linked customer. Always succeeds.
    pub fn clear(&mut self) {
        self.items.clear();
        self.customer_id = None;
        self.created_at = Utc::now();
    }

    // -------------------------------------------------------------------------
    // Cart-wide discount
    // -------------------------------------------------------------------------

    /// Applies a cart-wide discount, distributed across lines in proportion
    /// to each line's share of the gross subtotal and **added** to each
    /// line's existing discount.
    ///
    /// This is the one nontrivial algorithm in the engine:
    ///
    /// 1. The requested amount is split over gross line weights with
    ///    [`Money::split_proportional`]; the rounding residual lands on the
    ///    last line so the deltas reconcile exactly.
    /// 2. Each delta is capped at the line's remaining headroom
    ///    (`gross − existing discount`); capped spill is re-distributed to
    ///    lines that still have headroom. Because the amount is validated
    ///    against the current subtotal (= total headroom) the spill always
    ///    finds a home.
    ///
    /// ## Errors
    /// `InvalidInput` when the value is not positive, a percentage exceeds
    /// 10000 basis points, the cart subtotal is zero (nothing to distribute
    /// over), or the amount exceeds the current subtotal.
    ///
    /// ## Returns
    /// The per-line deltas actually applied, in line order. Their sum equals
    /// the requested amount exactly; no delta is negative.
    pub fn apply_cart_discount(&mut self, discount: CartDiscount) -> EngineResult<Vec<Money>> {
        let subtotal = self.subtotal();
        if !subtotal.is_positive() {
            return Err(EngineError::invalid_input(
                "cart subtotal is zero, nothing to discount",
            ));
        }

        let amount = match discount {
            CartDiscount::Percentage(bps) => {
                validation::validate_discount_bps(bps)?;
                subtotal.percentage_bps(bps)
            }
            CartDiscount::Fixed(amount) => {
                if !amount.is_positive() {
                    return Err(EngineError::invalid_input("discount must be positive"));
                }
                amount
            }
        };

        if amount > subtotal {
            return Err(EngineError::invalid_input(format!(
                "discount {amount} exceeds cart subtotal {subtotal}"
            )));
        }

        // Pass 1: proportional shares over gross weights.
        let weights: Vec<i64> = self.items.iter().map(|l| l.gross().cents()).collect();
        let shares = amount.split_proportional(&weights);

        // Pass 2: cap at headroom, collect spill.
        let mut deltas: Vec<Money> = Vec::with_capacity(self.items.len());
        let mut spill = Money::zero();
        for (line, share) in self.items.iter().zip(shares) {
            let headroom = line.discount_headroom();
            let delta = share.min(headroom);
            spill += share - delta;
            deltas.push(delta);
        }

        // Pass 3: place spill on lines that still have headroom, starting
        // from the back so the residual stays on the last eligible line.
        if spill.is_positive() {
            for (line, delta) in self.items.iter().zip(deltas.iter_mut()).rev() {
                if !spill.is_positive() {
                    break;
                }
                let headroom = line.discount_headroom() - *delta;
                let extra = spill.min(headroom);
                *delta += extra;
                spill -= extra;
            }
        }
        debug_assert!(spill.is_zero());

        for (line, delta) in self.items.iter_mut().zip(&deltas) {
            line.line_discount += *delta;
        }

        Ok(deltas)
    }

    // -------------------------------------------------------------------------
    // Derived totals
    // -------------------------------------------------------------------------

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of lines in the cart.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|l| l.quantity).sum()
    }

    /// Gross amount before any discount.
    pub fn gross(&self) -> Money {
        self.items.iter().map(|l| l.gross()).sum()
    }

    /// Sum of all line discounts.
    pub fn discount_total(&self) -> Money {
        self.items.iter().map(|l| l.line_discount).sum()
    }

    /// Subtotal after discounts, before tax.
    pub fn subtotal(&self) -> Money {
        self.gross() - self.discount_total()
    }

    /// VAT on the post-discount subtotal; zero when tax is disabled.
    pub fn vat(&self, tax: TaxConfig) -> Money {
        if !tax.enabled {
            return Money::zero();
        }
        self.subtotal().calculate_tax(tax.rate)
    }

    /// Grand total: subtotal + VAT.
    pub fn grand_total(&self, tax: TaxConfig) -> Money {
        self.subtotal() + self.vat(tax)
    }

    /// All derived figures in one struct, for API responses.
    pub fn totals(&self, tax: TaxConfig) -> CartTotals {
        CartTotals {
            item_count: self.item_count(),
            total_quantity: self.total_quantity(),
            gross_cents: self.gross().cents(),
            discount_cents: self.discount_total().cents(),
            subtotal_cents: self.subtotal().cents(),
            vat_cents: self.vat(tax).cents(),
            total_cents: self.grand_total(tax).cents(),
        }
    }
}

impl Default for Cart {
    fn default() -> Self {
        Cart::new()
    }
}

/// Cart totals summary for API responses.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub gross_cents: i64,
    pub discount_cents: i64,
    pub subtotal_cents: i64,
    pub vat_cents: i64,
    pub total_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
