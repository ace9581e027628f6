//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  In many retail systems:                                                │
//! │    10.00 / 3 = 3.33 (×3 = 9.99)  → Lost 0.01!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    1000 cents / 3 = 333 cents (×3 = 999 cents)                          │
//! │    We KNOW we lost 1 cent, and handle it explicitly: the proportional   │
//! │    allocator below assigns every leftover cent to a concrete line.      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (pence/cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for refunds and balance deltas
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (pounds/dollars) portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Returns the larger of two values.
    #[inline]
    pub fn max(self, other: Self) -> Self {
        Money(self.0.max(other.0))
    }

    /// Returns the smaller of two values.
    #[inline]
    pub fn min(self, other: Self) -> Self {
        Money(self.0.min(other.0))
    }

    /// Calculates tax on this amount, rounding to the nearest cent.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`. The `+5000` provides
    /// round-half-up at the cent boundary; rounding happens exactly once,
    /// when the derived amount is produced.
    ///
    /// ## Example
    /// ```rust
    /// use corner_core::money::Money;
    /// use corner_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_cents(1548); // 15.48
    /// let rate = TaxRate::from_bps(2000);     // 20%
    ///
    /// // 15.48 × 20% = 3.096 → rounds to 3.10
    /// assert_eq!(subtotal.calculate_tax(rate).cents(), 310);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        // i128 to prevent overflow on large amounts
        let tax_cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(tax_cents as i64)
    }

    /// Multiplies money by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Computes a fraction of this amount in basis points, rounding to the
    /// nearest cent.
    ///
    /// ## Arguments
    /// * `bps` - Basis points (1000 = 10%, 1250 = 12.5%)
    pub fn percentage_bps(&self, bps: u32) -> Money {
        let cents = (self.0 as i128 * bps as i128 + 5000) / 10000;
        Money::from_cents(cents as i64)
    }

    /// Splits this amount across `weights` in proportion to each weight.
    ///
    /// This is the proportional allocator behind cart-wide discounts: each
    /// entry receives `floor(amount * weight / total_weight)` and the
    /// accumulated rounding remainder is assigned to the **last** entry with
    /// a positive weight, so the parts always sum to the whole exactly.
    ///
    /// Zero weights receive zero. A zero total weight returns all zeros;
    /// callers are expected to reject that case before allocating.
    ///
    /// ## Example
    /// ```rust
    /// use corner_core::money::Money;
    ///
    /// // £10.00 across £20/£30 gross lines → £4.00 and £6.00
    /// let parts = Money::from_cents(1000).split_proportional(&[2000, 3000]);
    /// assert_eq!(parts[0].cents(), 400);
    /// assert_eq!(parts[1].cents(), 600);
    /// ```
    pub fn split_proportional(&self, weights: &[i64]) -> Vec<Money> {
        let total: i128 = weights.iter().map(|w| (*w).max(0) as i128).sum();
        if total == 0 {
            return vec![Money::zero(); weights.len()];
        }

        let mut parts: Vec<Money> = Vec::with_capacity(weights.len());
        let mut allocated: i64 = 0;
        for w in weights {
            let w = (*w).max(0) as i128;
            let share = (self.0 as i128 * w / total) as i64;
            allocated += share;
            parts.push(Money::from_cents(share));
        }

        // Residual cents go to the last positive-weight entry so the
        // distributed parts reconcile exactly with the requested amount.
        let residual = self.0 - allocated;
        if residual != 0 {
            if let Some(last) = weights
                .iter()
                .rposition(|w| *w > 0)
                .and_then(|i| parts.get_mut(i))
            {
                *last += Money::from_cents(residual);
            }
        }

        parts
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for debugging and logs. Receipt formatting goes through the
/// configured currency symbol in corner-terminal.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
    }

    #[test]
    fn test_tax_calculation_basic() {
        // 10.00 at 20% = 2.00
        let amount = Money::from_cents(1000);
        let tax = amount.calculate_tax(TaxRate::from_bps(2000));
        assert_eq!(tax.cents(), 200);
    }

    #[test]
    fn test_tax_calculation_with_rounding() {
        // 15.48 at 20% = 3.096 → 3.10 (rounded at the cent boundary)
        let amount = Money::from_cents(1548);
        let tax = amount.calculate_tax(TaxRate::from_bps(2000));
        assert_eq!(tax.cents(), 310);
    }

    #[test]
    fn test_percentage_bps() {
        assert_eq!(Money::from_cents(5000).percentage_bps(1000).cents(), 500);
        // 33% of 9.99 = 3.2967 → 3.30
        assert_eq!(Money::from_cents(999).percentage_bps(3300).cents(), 330);
        // 12.5% of 10.00 = 1.25
        assert_eq!(Money::from_cents(1000).percentage_bps(1250).cents(), 125);
    }

    #[test]
    fn test_split_proportional_exact() {
        // £10.00 over £20/£30 → 4.00 / 6.00
        let parts = Money::from_cents(1000).split_proportional(&[2000, 3000]);
        assert_eq!(parts.iter().map(|m| m.cents()).collect::<Vec<_>>(), vec![400, 600]);
    }

    #[test]
    fn test_split_proportional_residual_on_last() {
        // 10.00 over three equal weights: 333 + 333 + 334
        let parts = Money::from_cents(1000).split_proportional(&[1, 1, 1]);
        assert_eq!(parts.iter().map(|m| m.cents()).collect::<Vec<_>>(), vec![333, 333, 334]);
        let sum: Money = parts.into_iter().sum();
        assert_eq!(sum.cents(), 1000);
    }

    #[test]
    fn test_split_proportional_skips_zero_weights() {
        let parts = Money::from_cents(999).split_proportional(&[100, 0, 50]);
        assert_eq!(parts[1], Money::zero());
        // Residual lands on the last positive weight, not the zero line
        let sum: Money = parts.iter().copied().sum();
        assert_eq!(sum.cents(), 999);
    }

    #[test]
    fn test_split_proportional_zero_total() {
        let parts = Money::from_cents(500).split_proportional(&[0, 0]);
        assert!(parts.iter().all(|m| m.is_zero()));
    }

    #[test]
    fn test_split_proportional_never_negative() {
        for amount in [1, 7, 99, 1000, 12345] {
            let parts = Money::from_cents(amount).split_proportional(&[599, 1198, 350]);
            assert!(parts.iter().all(|m| !m.is_negative()));
            let sum: Money = parts.into_iter().sum();
            assert_eq!(sum.cents(), amount);
        }
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let negative = Money::from_cents(-100);
        assert!(negative.is_negative());
        assert_eq!(negative.abs().cents(), 100);
    }
}
