//! # Refund Calculator
//!
//! Computes the refund owed for a (possibly partial) return against a
//! committed sale.
//!
//! The calculation works exclusively from the transaction's frozen item
//! snapshot. Catalog prices may have changed since the sale; they are
//! irrelevant here.
//!
//! ## Rules
//! - Per-line refund = line total after discount × returned qty / sold qty,
//!   rounded to the cent. A customer who got a discount gets the discounted
//!   amount back, never the shelf price.
//! - Rounding is remainder-aware across returns on the same line: each
//!   return refunds the difference between the cumulative share after and
//!   before it, so the refunds for a fully returned line always sum to the
//!   line total exactly, whichever way it is split up.
//! - VAT is refunded proportionally at the business's **currently configured**
//!   rate when the original sale charged tax, clamped so the cumulative
//!   payout never exceeds the sale's original total.
//! - A net refund that would push the cumulative total past the sale's
//!   original total is rejected.
//!
//! Side effects (persisting the return, restocking, crediting balances) live
//! in the orchestration layer; this module only computes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{EngineError, EngineResult};
use crate::money::Money;
use crate::types::{TaxConfig, TransactionRecord};
use crate::validation;

// =============================================================================
// Inputs
// =============================================================================

/// One line the customer is returning, by snapshot line id.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReturnSelection {
    pub line_id: String,
    pub quantity: i64,
}

// =============================================================================
// Output
// =============================================================================

/// Per-line share of a computed refund.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RefundLine {
    pub line_id: String,
    pub catalog_id: Option<String>,
    pub name: String,
    pub quantity: i64,
    /// Pre-VAT refund for this line, in cents.
    pub net_refund_cents: i64,
}

/// The result of a refund computation, ready for the orchestration layer to
/// act on.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RefundComputation {
    pub lines: Vec<RefundLine>,
    /// Pre-VAT refund total.
    pub net_refund: Money,
    /// VAT portion refunded on top.
    pub vat_refund: Money,
    /// What the customer receives: net + VAT.
    pub total_refund: Money,
}

// =============================================================================
// Computation
// =============================================================================

/// Computes the refund for returning `selections` against `txn`.
///
/// ## Arguments
/// * `txn` - the committed sale (frozen snapshot)
/// * `selections` - lines and quantities being returned; duplicates for the
///   same line are aggregated
/// * `already_returned` - per-line quantities returned by prior returns
/// * `already_refunded` - total amount refunded by prior returns
/// * `reason` - required free-text reason for the audit trail
/// * `tax` - the business's current tax configuration
///
/// ## Errors
/// - `InvalidInput` for empty selections, blank reason, unknown line ids,
///   or when the cumulative refund would exceed the sale's original total
/// - `ExceedsAvailableQuantity` when a selection exceeds the quantity still
///   refundable on its line
pub fn compute_refund(
    txn: &TransactionRecord,
    selections: &[ReturnSelection],
    already_returned: &HashMap<String, i64>,
    already_refunded: Money,
    reason: &str,
    tax: TaxConfig,
) -> EngineResult<RefundComputation> {
    if selections.is_empty() {
        return Err(EngineError::invalid_input("nothing selected to return"));
    }
    validation::validate_reason(reason)?;

    // Aggregate duplicate selections per line before checking availability.
    let mut requested: HashMap<&str, i64> = HashMap::new();
    for sel in selections {
        validation::validate_quantity(sel.quantity)?;
        *requested.entry(sel.line_id.as_str()).or_insert(0) += sel.quantity;
    }

    let mut lines = Vec::with_capacity(requested.len());
    let mut net_refund = Money::zero();

    // Iterate snapshot order so the output is stable.
    for snapshot in &txn.items {
        let Some(qty) = requested.remove(snapshot.line_id.as_str()) else {
            continue;
        };

        let prior = already_returned
            .get(&snapshot.line_id)
            .copied()
            .unwrap_or(0);
        let available = snapshot.quantity - prior;
        if qty > available {
            return Err(EngineError::ExceedsAvailableQuantity {
                line_id: snapshot.line_id.clone(),
                available: available.max(0),
                requested: qty,
            });
        }

        // Proportional share of the discounted line total. Computed as the
        // difference of cumulative rounded shares so rounding telescopes:
        // returning an odd-cent line one unit at a time still sums to the
        // line total exactly, and never a cent over.
        let den = snapshot.quantity as i128;
        let cumulative = |units: i64| -> i128 {
            (snapshot.line_total_cents as i128 * units as i128 + den / 2) / den
        };
        let line_refund = Money::from_cents((cumulative(prior + qty) - cumulative(prior)) as i64);

        net_refund += line_refund;
        lines.push(RefundLine {
            line_id: snapshot.line_id.clone(),
            catalog_id: snapshot.catalog_id.clone(),
            name: snapshot.name.clone(),
            quantity: qty,
            net_refund_cents: line_refund.cents(),
        });
    }

    // Anything left over referenced a line the sale never had.
    if let Some(line_id) = requested.keys().next() {
        return Err(EngineError::invalid_input(format!(
            "line {line_id} is not part of this sale"
        )));
    }

    // Sale-level guard: cumulative refunds can never exceed the original
    // total, whatever the per-line arithmetic says.
    let remaining = txn.total() - already_refunded;
    if net_refund > remaining {
        return Err(EngineError::invalid_input(format!(
            "refund {net_refund} plus prior refunds {already_refunded} \
             exceeds sale total {}",
            txn.total()
        )));
    }

    // VAT back at the configured rate, only when the sale charged tax.
    // Clamped to the refundable headroom: per-return VAT rounding can
    // over-count the sale's VAT by a cent across split returns.
    let vat_refund = if txn.tax_charged() {
        net_refund
            .calculate_tax(tax.effective_rate())
            .min(remaining - net_refund)
    } else {
        Money::zero()
    };
    let total_refund = net_refund + vat_refund;

    Ok(RefundComputation {
        lines,
        net_refund,
        vat_refund,
        total_refund,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PaymentBreakdown, PaymentMethod, SnapshotLine, TaxRate};
    use chrono::Utc;

    fn snapshot_line(
        line_id: &str,
        unit_price: i64,
        qty: i64,
        discount: i64,
    ) -> SnapshotLine {
        SnapshotLine {
            line_id: line_id.to_string(),
            catalog_id: Some(format!("cat-{line_id}")),
            name: format!("Line {line_id}"),
            unit_price_cents: unit_price,
            quantity: qty,
            discount_cents: discount,
            line_total_cents: unit_price * qty - discount,
        }
    }

    fn sale(items: Vec<SnapshotLine>, tax_rate_bps: u32) -> TransactionRecord {
        let subtotal: i64 = items.iter().map(|l| l.line_total_cents).sum();
        let vat = Money::from_cents(subtotal)
            .calculate_tax(TaxRate::from_bps(tax_rate_bps))
            .cents();
        TransactionRecord {
            id: "txn-1".to_string(),
            receipt_number: "R-0001".to_string(),
            staff_id: "staff-1".to_string(),
            customer_id: None,
            subtotal_cents: subtotal,
            vat_cents: vat,
            discount_cents: items.iter().map(|l| l.discount_cents).sum(),
            total_cents: subtotal + vat,
            tax_rate_bps,
            payment_method: PaymentMethod::Cash,
            payment: PaymentBreakdown::default(),
            items,
            created_at: Utc::now(),
        }
    }

    fn tax_20() -> TaxConfig {
        TaxConfig::enabled(TaxRate::from_bps(2000))
    }

    fn select(line_id: &str, qty: i64) -> ReturnSelection {
        ReturnSelection {
            line_id: line_id.to_string(),
            quantity: qty,
        }
    }

    #[test]
    fn test_full_line_refund_with_vat() {
        // 5.99 × 2 sold, both returned: net 11.98, VAT 2.40
        let txn = sale(vec![snapshot_line("a", 599, 2, 0)], 2000);

        let result = compute_refund(
            &txn,
            &[select("a", 2)],
            &HashMap::new(),
            Money::zero(),
            "faulty",
            tax_20(),
        )
        .unwrap();

        assert_eq!(result.net_refund.cents(), 1198);
        assert_eq!(result.vat_refund.cents(), 240);
        assert_eq!(result.total_refund.cents(), 1438);
    }

    #[test]
    fn test_partial_refund_is_proportional_to_discounted_total() {
        // 3 sold at 10.00 with a 6.00 line discount: line total 24.00.
        // Returning 1 refunds 8.00, not the 10.00 shelf price.
        let txn = sale(vec![snapshot_line("a", 1000, 3, 600)], 0);

        let result = compute_refund(
            &txn,
            &[select("a", 1)],
            &HashMap::new(),
            Money::zero(),
            "changed mind",
            tax_20(),
        )
        .unwrap();

        assert_eq!(result.net_refund.cents(), 800);
        // sale charged no tax: nothing re-applied
        assert_eq!(result.vat_refund, Money::zero());
    }

    #[test]
    fn test_partial_refund_rounds_to_cent() {
        // line total 9.99 over 2 units: one unit = 4.995 → 5.00
        let txn = sale(vec![snapshot_line("a", 500, 2, 1)], 0);

        let result = compute_refund(
            &txn,
            &[select("a", 1)],
            &HashMap::new(),
            Money::zero(),
            "damaged",
            tax_20(),
        )
        .unwrap();

        assert_eq!(result.net_refund.cents(), 500);
    }

    #[test]
    fn test_odd_cent_line_fully_refundable_in_two_steps() {
        // line total 9.99 over 2 units, no tax. The first unit rounds up to
        // 5.00; the second must refund the remaining 4.99 so the pair sums
        // to the line total instead of tripping the sale-total guard.
        let txn = sale(vec![snapshot_line("a", 500, 2, 1)], 0);

        let first = compute_refund(
            &txn,
            &[select("a", 1)],
            &HashMap::new(),
            Money::zero(),
            "damaged",
            tax_20(),
        )
        .unwrap();
        assert_eq!(first.total_refund.cents(), 500);

        let mut prior = HashMap::new();
        prior.insert("a".to_string(), 1);
        let second = compute_refund(
            &txn,
            &[select("a", 1)],
            &prior,
            first.total_refund,
            "damaged",
            tax_20(),
        )
        .unwrap();
        assert_eq!(second.total_refund.cents(), 499);
        assert_eq!(
            first.total_refund + second.total_refund,
            txn.total()
        );
    }

    #[test]
    fn test_split_return_vat_clamped_to_sale_total() {
        // 0.10 line over 2 units at 10%: the sale charged 0.01 VAT, but each
        // half-line's VAT rounds 0.005 up to 0.01. Unclamped the two payouts
        // would come to 0.12 against an 0.11 sale; the second return's VAT
        // clamps to zero instead.
        let txn = sale(vec![snapshot_line("a", 5, 2, 0)], 1000);
        assert_eq!(txn.total_cents, 11);

        let tax = TaxConfig::enabled(TaxRate::from_bps(1000));
        let first = compute_refund(
            &txn,
            &[select("a", 1)],
            &HashMap::new(),
            Money::zero(),
            "damaged",
            tax,
        )
        .unwrap();
        assert_eq!(first.total_refund.cents(), 6);

        let mut prior = HashMap::new();
        prior.insert("a".to_string(), 1);
        let second = compute_refund(
            &txn,
            &[select("a", 1)],
            &prior,
            first.total_refund,
            "damaged",
            tax,
        )
        .unwrap();
        assert_eq!(second.vat_refund, Money::zero());
        assert_eq!(first.total_refund + second.total_refund, txn.total());
    }

    #[test]
    fn test_vat_refund_uses_configured_rate() {
        // Sold when the rate was 20%; configured rate is now 5%.
        let txn = sale(vec![snapshot_line("a", 1000, 1, 0)], 2000);

        let result = compute_refund(
            &txn,
            &[select("a", 1)],
            &HashMap::new(),
            Money::zero(),
            "faulty",
            TaxConfig::enabled(TaxRate::from_bps(500)),
        )
        .unwrap();

        assert_eq!(result.vat_refund.cents(), 50);
    }

    #[test]
    fn test_exceeds_available_quantity() {
        let txn = sale(vec![snapshot_line("a", 599, 3, 0)], 0);
        let mut prior = HashMap::new();
        prior.insert("a".to_string(), 2);

        let err = compute_refund(
            &txn,
            &[select("a", 2)],
            &prior,
            Money::zero(),
            "faulty",
            tax_20(),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            EngineError::ExceedsAvailableQuantity {
                available: 1,
                requested: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_duplicate_selections_aggregate() {
        let txn = sale(vec![snapshot_line("a", 599, 2, 0)], 0);

        // 1 + 2 aggregates to 3, over the 2 sold
        let err = compute_refund(
            &txn,
            &[select("a", 1), select("a", 2)],
            &HashMap::new(),
            Money::zero(),
            "faulty",
            tax_20(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::ExceedsAvailableQuantity { .. }));
    }

    #[test]
    fn test_cumulative_refund_capped_at_sale_total() {
        // 30.00 sale, 25.00 already refunded: only 5.00 remains refundable.
        let txn = sale(vec![snapshot_line("a", 1000, 3, 0)], 0);
        assert_eq!(txn.total_cents, 3000);

        let err = compute_refund(
            &txn,
            &[select("a", 1)], // would refund 10.00
            &HashMap::new(),
            Money::from_cents(2500),
            "faulty",
            tax_20(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput { .. }));
    }

    #[test]
    fn test_refund_up_to_exact_total_allowed() {
        let txn = sale(vec![snapshot_line("a", 1000, 3, 0)], 0);

        let result = compute_refund(
            &txn,
            &[select("a", 1)],
            &HashMap::new(),
            Money::from_cents(2000),
            "faulty",
            tax_20(),
        )
        .unwrap();
        assert_eq!(result.total_refund.cents(), 1000);
    }

    #[test]
    fn test_rejects_empty_and_unknown() {
        let txn = sale(vec![snapshot_line("a", 599, 1, 0)], 0);

        assert!(compute_refund(
            &txn,
            &[],
            &HashMap::new(),
            Money::zero(),
            "faulty",
            tax_20()
        )
        .is_err());

        assert!(compute_refund(
            &txn,
            &[select("a", 1)],
            &HashMap::new(),
            Money::zero(),
            "   ",
            tax_20()
        )
        .is_err());

        let err = compute_refund(
            &txn,
            &[select("nope", 1)],
            &HashMap::new(),
            Money::zero(),
            "faulty",
            tax_20(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput { .. }));
    }

    #[test]
    fn test_multi_line_return() {
        let txn = sale(
            vec![snapshot_line("a", 599, 2, 0), snapshot_line("b", 350, 1, 0)],
            2000,
        );

        let result = compute_refund(
            &txn,
            &[select("a", 1), select("b", 1)],
            &HashMap::new(),
            Money::zero(),
            "wrong items",
            tax_20(),
        )
        .unwrap();

        assert_eq!(result.lines.len(), 2);
        assert_eq!(result.net_refund.cents(), 599 + 350);
        // 9.49 × 20% = 1.898 → 1.90
        assert_eq!(result.vat_refund.cents(), 190);
    }
}
