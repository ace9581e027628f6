//! # Settlement Module
//!
//! Split-payment allocation and commit validation for a sale.
//!
//! A settlement holds the grand total owed and the tender allocation across
//! cash, card, and store credit. Nothing here performs the charge or touches
//! a balance; the orchestration layer does that after
//! [`Settlement::validate_for_commit`] passes.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  grand_total = 18.58                                                    │
//! │                                                                         │
//! │  set_allocation(cash: 10.00, card: 8.58, credit: 0)                     │
//! │    remaining = 0        → validate_for_commit() = Ok                    │
//! │                                                                         │
//! │  set_allocation(cash: 10.00, card: 8.00, credit: 0)                     │
//! │    remaining = 0.58     → IncompleteAllocation { remaining: 58 }        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{EngineError, EngineResult};
use crate::money::Money;
use crate::types::PaymentMethod;
use crate::SETTLEMENT_TOLERANCE_CENTS;

// =============================================================================
// Split Allocation
// =============================================================================

/// How a sale's total is divided across tender types.
///
/// All fields are non-negative once stored; [`Settlement::set_allocation`]
/// rejects negative input before anything is recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SplitAllocation {
    pub cash: Money,
    pub card: Money,
    pub store_credit: Money,
}

impl SplitAllocation {
    /// Sum of all allocated portions.
    pub fn sum(&self) -> Money {
        self.cash + self.card + self.store_credit
    }

    /// Derives the payment method label from which portions are non-zero.
    ///
    /// A single non-zero portion yields that method; more than one yields
    /// `Split`. An all-zero allocation (a fully discounted, zero-total sale)
    /// records as cash.
    pub fn payment_method(&self) -> PaymentMethod {
        let used = [self.cash, self.card, self.store_credit]
            .iter()
            .filter(|m| m.is_positive())
            .count();
        match used {
            0 => PaymentMethod::Cash,
            1 if self.cash.is_positive() => PaymentMethod::Cash,
            1 if self.card.is_positive() => PaymentMethod::Card,
            1 => PaymentMethod::StoreCredit,
            _ => PaymentMethod::Split,
        }
    }
}

// =============================================================================
// Settlement
// =============================================================================

/// The settlement state for one sale awaiting commit.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    /// The amount owed, frozen from the cart's grand total.
    grand_total: Money,
    /// Current tender allocation.
    allocation: SplitAllocation,
}

impl Settlement {
    /// Creates a settlement for the given grand total with nothing allocated.
    pub fn new(grand_total: Money) -> Self {
        Settlement {
            grand_total,
            allocation: SplitAllocation::default(),
        }
    }

    /// The amount owed.
    pub fn grand_total(&self) -> Money {
        self.grand_total
    }

    /// The current allocation.
    pub fn allocation(&self) -> SplitAllocation {
        self.allocation
    }

    /// Records a tender allocation.
    ///
    /// Deliberately stricter than "record whatever the till sends": beyond
    /// rejecting negatives, a combined card + store-credit portion above the
    /// grand total is refused here rather than at commit, because neither
    /// instrument can give change. Only cash may overtender; the excess
    /// comes back as [`Settlement::change_due`].
    ///
    /// ## Errors
    /// `InvalidInput` when any portion is negative or the card/store-credit
    /// portions together exceed the grand total. On error the previous
    /// allocation is retained.
    pub fn set_allocation(
        &mut self,
        cash: Money,
        card: Money,
        store_credit: Money,
    ) -> EngineResult<()> {
        if cash.is_negative() || card.is_negative() || store_credit.is_negative() {
            return Err(EngineError::invalid_input(
                "allocation amounts cannot be negative",
            ));
        }
        if card + store_credit > self.grand_total {
            return Err(EngineError::invalid_input(
                "card and store credit cannot exceed the amount owed",
            ));
        }

        self.allocation = SplitAllocation {
            cash,
            card,
            store_credit,
        };
        Ok(())
    }

    /// Amount still owed: `max(0, grand_total − allocated)`.
    pub fn remaining(&self) -> Money {
        (self.grand_total - self.allocation.sum()).max(Money::zero())
    }

    /// Change due on cash overtender: `max(0, allocated − grand_total)`.
    pub fn change_due(&self) -> Money {
        (self.allocation.sum() - self.grand_total).max(Money::zero())
    }

    /// Checks that the allocation covers the total within a one-cent
    /// rounding tolerance.
    ///
    /// ## Errors
    /// `IncompleteAllocation` carrying the uncovered remainder.
    pub fn validate_for_commit(&self) -> EngineResult<()> {
        let remaining = self.remaining();
        if remaining.cents() > SETTLEMENT_TOLERANCE_CENTS {
            return Err(EngineError::IncompleteAllocation {
                remaining_cents: remaining.cents(),
            });
        }
        Ok(())
    }

    /// Checks the store-credit portion against the customer's balance.
    ///
    /// This is the pre-commit courtesy check; the balance may change between
    /// here and commit, so the data store repeats it as an atomic conditional
    /// update.
    ///
    /// ## Errors
    /// `InsufficientBalance` when the portion exceeds the balance and
    /// negative balances are not permitted.
    pub fn validate_store_credit(
        &self,
        balance: Money,
        allow_negative: bool,
    ) -> EngineResult<()> {
        let requested = self.allocation.store_credit;
        if requested.is_positive() && requested > balance && !allow_negative {
            return Err(EngineError::InsufficientBalance {
                balance_cents: balance.cents(),
                requested_cents: requested.cents(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_allocation_validates() {
        // 18.58 owed: 10.00 cash + 8.58 card covers it exactly
        let mut s = Settlement::new(Money::from_cents(1858));
        s.set_allocation(
            Money::from_cents(1000),
            Money::from_cents(858),
            Money::zero(),
        )
        .unwrap();

        assert_eq!(s.remaining(), Money::zero());
        assert!(s.validate_for_commit().is_ok());
    }

    #[test]
    fn test_incomplete_allocation_reports_remainder() {
        let mut s = Settlement::new(Money::from_cents(1858));
        s.set_allocation(
            Money::from_cents(1000),
            Money::from_cents(800),
            Money::zero(),
        )
        .unwrap();

        assert_eq!(s.remaining().cents(), 58);
        let err = s.validate_for_commit().unwrap_err();
        assert!(matches!(
            err,
            EngineError::IncompleteAllocation { remaining_cents: 58 }
        ));
    }

    #[test]
    fn test_one_cent_tolerance() {
        let mut s = Settlement::new(Money::from_cents(1858));
        s.set_allocation(Money::from_cents(1857), Money::zero(), Money::zero())
            .unwrap();
        assert!(s.validate_for_commit().is_ok());

        s.set_allocation(Money::from_cents(1856), Money::zero(), Money::zero())
            .unwrap();
        assert!(s.validate_for_commit().is_err());
    }

    #[test]
    fn test_negative_input_keeps_prior_allocation() {
        let mut s = Settlement::new(Money::from_cents(1000));
        s.set_allocation(Money::from_cents(1000), Money::zero(), Money::zero())
            .unwrap();

        let err = s
            .set_allocation(Money::from_cents(-100), Money::zero(), Money::zero())
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput { .. }));
        // prior state retained
        assert_eq!(s.allocation().cash.cents(), 1000);
        assert!(s.validate_for_commit().is_ok());
    }

    #[test]
    fn test_non_cash_overtender_rejected() {
        let mut s = Settlement::new(Money::from_cents(1000));
        let err = s
            .set_allocation(Money::zero(), Money::from_cents(1200), Money::zero())
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput { .. }));
    }

    #[test]
    fn test_cash_overtender_yields_change() {
        let mut s = Settlement::new(Money::from_cents(1858));
        s.set_allocation(Money::from_cents(2000), Money::zero(), Money::zero())
            .unwrap();

        assert!(s.validate_for_commit().is_ok());
        assert_eq!(s.change_due().cents(), 142);
        assert_eq!(s.remaining(), Money::zero());
    }

    #[test]
    fn test_store_credit_balance_check() {
        let mut s = Settlement::new(Money::from_cents(1000));
        s.set_allocation(Money::from_cents(500), Money::zero(), Money::from_cents(500))
            .unwrap();

        assert!(s
            .validate_store_credit(Money::from_cents(500), false)
            .is_ok());

        let err = s
            .validate_store_credit(Money::from_cents(300), false)
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::InsufficientBalance {
                balance_cents: 300,
                requested_cents: 500
            }
        ));

        // negative balances permitted by settings
        assert!(s
            .validate_store_credit(Money::from_cents(300), true)
            .is_ok());
    }

    #[test]
    fn test_payment_method_derivation() {
        let cash_only = SplitAllocation {
            cash: Money::from_cents(100),
            ..Default::default()
        };
        assert_eq!(cash_only.payment_method(), PaymentMethod::Cash);

        let card_only = SplitAllocation {
            card: Money::from_cents(100),
            ..Default::default()
        };
        assert_eq!(card_only.payment_method(), PaymentMethod::Card);

        let credit_only = SplitAllocation {
            store_credit: Money::from_cents(100),
            ..Default::default()
        };
        assert_eq!(credit_only.payment_method(), PaymentMethod::StoreCredit);

        let split = SplitAllocation {
            cash: Money::from_cents(100),
            card: Money::from_cents(100),
            ..Default::default()
        };
        assert_eq!(split.payment_method(), PaymentMethod::Split);

        // zero-total sale records as cash
        assert_eq!(SplitAllocation::default().payment_method(), PaymentMethod::Cash);
    }
}
