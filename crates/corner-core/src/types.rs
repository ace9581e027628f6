//! # Domain Types
//!
//! Core domain types used throughout Corner POS.
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business identity where one exists (barcode, receipt number)
//!
//! ## Snapshot Pattern
//! A committed transaction embeds a frozen copy of its lines (name, price,
//! quantity, discount, line total). Later catalog price changes must never
//! retroactively alter historical transaction totals, so the snapshot is
//! never re-derived from the catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 2000 bps = 20% (UK VAT standard rate)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate(crate::DEFAULT_TAX_RATE_BPS)
    }
}

/// Tax configuration applied to cart totals.
///
/// When `enabled` is false the computed tax is always zero, regardless of
/// the configured rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxConfig {
    pub enabled: bool,
    pub rate: TaxRate,
}

impl TaxConfig {
    /// Tax disabled; the rate is retained but inert.
    pub fn disabled() -> Self {
        TaxConfig {
            enabled: false,
            rate: TaxRate::default(),
        }
    }

    /// Tax enabled at the given rate.
    pub fn enabled(rate: TaxRate) -> Self {
        TaxConfig {
            enabled: true,
            rate,
        }
    }

    /// The rate actually charged: zero when disabled.
    pub fn effective_rate(&self) -> TaxRate {
        if self.enabled {
            self.rate
        } else {
            TaxRate::zero()
        }
    }
}

impl Default for TaxConfig {
    fn default() -> Self {
        TaxConfig::enabled(TaxRate::default())
    }
}

// =============================================================================
// Catalog Item
// =============================================================================

/// A product or service available for sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CatalogItem {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to staff and on receipts.
    pub name: String,

    /// Barcode (EAN-13, UPC-A, etc.), if the item has one.
    pub barcode: Option<String>,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Whether to track inventory for this item.
    /// Services (salon treatments etc.) typically don't.
    pub track_inventory: bool,

    /// Current stock level. Meaningless when `track_inventory` is false.
    pub stock_quantity: i64,

    /// Whether the item is active (soft delete).
    pub is_active: bool,

    /// When the item was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// When the item was last updated.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl CatalogItem {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether `quantity` units can be sold right now.
    pub fn can_sell(&self, quantity: i64) -> bool {
        if !self.track_inventory {
            return true;
        }
        self.stock_quantity >= quantity
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer with an optional prepaid store-credit balance.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,

    /// Prepaid store-credit balance in cents. May go negative only when the
    /// business explicitly permits it.
    pub balance_cents: i64,

    /// Loyalty points accumulated across sales.
    pub loyalty_points: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Returns the store-credit balance as Money.
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_cents(self.balance_cents)
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a sale was settled.
///
/// A tagged union with exhaustive matching at the settlement boundary -
/// never string-keyed conditionals.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash.
    Cash,
    /// Card on an external terminal.
    Card,
    /// Customer's prepaid store-credit balance.
    StoreCredit,
    /// More than one instrument on a single sale.
    Split,
}

/// How a refund is paid back to the customer.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RefundMethod {
    Cash,
    Card,
    StoreCredit,
}

/// Per-instrument amounts recorded with a committed transaction.
///
/// Persisted as the `payment_details` JSON column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentBreakdown {
    pub cash_cents: i64,
    pub card_cents: i64,
    pub store_credit_cents: i64,
    /// Change handed back for cash overtender.
    pub change_cents: i64,
    /// Card terminal authorisation reference, when a card was involved.
    pub card_reference: Option<String>,
}

// =============================================================================
// Transaction Record (frozen sale snapshot)
// =============================================================================

/// One line of a committed sale, frozen at the moment of sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotLine {
    /// Line id within the cart at sale time.
    pub line_id: String,
    /// Catalog id, or None for ad-hoc (misc) items with no catalog backing.
    pub catalog_id: Option<String>,
    /// Name at time of sale (frozen).
    pub name: String,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Quantity sold.
    pub quantity: i64,
    /// Discount applied to this line, in cents.
    pub discount_cents: i64,
    /// Line total after discount: unit_price × quantity − discount.
    pub line_total_cents: i64,
}

impl SnapshotLine {
    /// Line total after discount, as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

/// A committed, immutable sale record.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: String,
    pub receipt_number: String,
    pub staff_id: String,
    pub customer_id: Option<String>,

    pub subtotal_cents: i64,
    pub vat_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,

    /// VAT rate charged at sale time, in bps. Zero when tax was disabled.
    pub tax_rate_bps: u32,

    pub payment_method: PaymentMethod,
    pub payment: PaymentBreakdown,

    /// Frozen point-in-time item snapshot.
    pub items: Vec<SnapshotLine>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Whether tax was charged on this sale.
    #[inline]
    pub fn tax_charged(&self) -> bool {
        self.tax_rate_bps > 0
    }

    /// Finds a snapshot line by its line id.
    pub fn line(&self, line_id: &str) -> Option<&SnapshotLine> {
        self.items.iter().find(|l| l.line_id == line_id)
    }
}

// =============================================================================
// Return Record
// =============================================================================

/// Quantity returned against one snapshot line.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReturnedLine {
    pub line_id: String,
    pub quantity: i64,
    /// Refund attributable to this line, in cents (before VAT).
    pub refund_cents: i64,
}

/// A committed return against a prior sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRecord {
    pub id: String,
    pub transaction_id: String,
    pub staff_id: String,
    pub items: Vec<ReturnedLine>,
    pub refund_cents: i64,
    pub refund_method: RefundMethod,
    pub reason: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Appointments
// =============================================================================

/// Appointment lifecycle status.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Booked,
    Completed,
    Cancelled,
    NoShow,
}

/// A booked appointment (salon/service businesses).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Appointment {
    pub id: String,
    pub customer_id: String,
    pub staff_id: String,
    /// Free-text service description ("Cut & blow dry").
    pub service: String,
    pub status: AppointmentStatus,
    #[ts(as = "String")]
    pub starts_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub ends_at: DateTime<Utc>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Business Settings
// =============================================================================

/// Business-level configuration persisted in the settings table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BusinessSettings {
    pub shop_name: String,
    pub shop_address: Vec<String>,

    /// Currency symbol for display ("£", "$", "€").
    pub currency_symbol: String,

    /// Whether VAT is charged at all.
    pub tax_enabled: bool,

    /// Configured VAT rate in basis points.
    pub tax_rate_bps: u32,

    /// Whether a customer balance may go negative when paying with
    /// store credit.
    pub allow_negative_balance: bool,

    /// Free text printed at the top of receipts.
    pub receipt_header: String,

    /// Free text printed at the bottom of receipts.
    pub receipt_footer: String,
}

impl BusinessSettings {
    /// Tax configuration derived from these settings.
    pub fn tax_config(&self) -> TaxConfig {
        TaxConfig {
            enabled: self.tax_enabled,
            rate: TaxRate::from_bps(self.tax_rate_bps),
        }
    }

    /// Formats a cent amount with the configured currency symbol.
    pub fn format_currency(&self, cents: i64) -> String {
        let m = Money::from_cents(cents);
        format!(
            "{}{}{}",
            if cents < 0 { "-" } else { "" },
            self.currency_symbol,
            m.abs()
        )
    }
}

impl Default for BusinessSettings {
    fn default() -> Self {
        BusinessSettings {
            shop_name: "Corner Shop".to_string(),
            shop_address: Vec::new(),
            currency_symbol: "£".to_string(),
            tax_enabled: true,
            tax_rate_bps: crate::DEFAULT_TAX_RATE_BPS,
            allow_negative_balance: false,
            receipt_header: String::new(),
            receipt_footer: "Thank you for your custom".to_string(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
