//! # corner-core: Pure Business Logic for Corner POS
//!
//! This crate is the **heart** of Corner POS. It contains the pricing and
//! settlement engine as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Corner POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Frontend (browser, TypeScript)                 │   │
//! │  │    Catalog UI ──► Cart UI ──► Tender UI ──► Receipt UI          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    corner-terminal                              │   │
//! │  │    sessions, checkout, returns, printer / card terminal         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ corner-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌───────────┐  │   │
//! │  │   │   money   │  │   cart    │  │ settlement │  │  refund   │  │   │
//! │  │   │   Money   │  │ LineItem  │  │   Split    │  │  Return   │  │   │
//! │  │   │  TaxCalc  │  │ Discounts │  │ Allocation │  │   Calc    │  │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (CatalogItem, Customer, TransactionRecord, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - Cart engine: line items, per-line and cart-wide discounts
//! - [`settlement`] - Split-payment allocation and completeness validation
//! - [`refund`] - Return/refund calculation over frozen sale snapshots
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use corner_core::money::Money;
//! use corner_core::types::TaxRate;
//!
//! // Create money from cents (never from floats!)
//! let subtotal = Money::from_cents(1548); // 15.48
//!
//! // VAT at the default 20% rate
//! let rate = TaxRate::from_bps(corner_core::DEFAULT_TAX_RATE_BPS);
//! let vat = subtotal.calculate_tax(rate);
//!
//! assert_eq!(vat.cents(), 310); // 3.10
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod refund;
pub mod settlement;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use corner_core::Money` instead of
// `use corner_core::money::Money`

pub use cart::{Cart, CartDiscount, CartTotals, LineItem};
pub use error::{EngineError, EngineResult, ValidationError};
pub use money::Money;
pub use refund::{compute_refund, RefundComputation, RefundLine, ReturnSelection};
pub use settlement::{Settlement, SplitAllocation};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum items allowed in a single cart.
///
/// ## Business Reason
/// Prevents runaway carts and ensures reasonable transaction sizes.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single item in a cart.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Default VAT rate in basis points (20%).
///
/// Applied when a business enables tax but has not configured a rate.
pub const DEFAULT_TAX_RATE_BPS: u32 = 2000;

/// Settlement tolerance in cents.
///
/// A split allocation is accepted when the unallocated remainder is within
/// this amount. Legacy terminals produced float allocations, so a one-cent
/// tolerance is part of the settlement contract.
pub const SETTLEMENT_TOLERANCE_CENTS: i64 = 1;
