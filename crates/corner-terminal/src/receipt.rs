//! # Receipt Building
//!
//! Turns a committed transaction plus the business settings into a payload
//! the printer contract understands. Pure formatting; nothing here touches
//! the database or the device.

use serde::{Deserialize, Serialize};

use corner_core::{BusinessSettings, PaymentMethod, TransactionRecord};

/// One printable receipt line item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: i64,
    pub unit_price: String,
    pub line_total: String,
    /// Present only when the line carried a discount.
    pub discount: Option<String>,
}

/// Everything the printer needs for one receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptPayload {
    pub shop_name: String,
    pub shop_address: Vec<String>,
    pub header: String,
    pub receipt_number: String,
    pub issued_at: String,

    pub lines: Vec<ReceiptLine>,

    pub subtotal: String,
    /// Present only when a cart-level or line discount applied.
    pub discount: Option<String>,
    /// Present only when the sale charged tax.
    pub vat: Option<String>,
    pub total: String,

    pub payment_method: String,
    /// Present only on cash overtender.
    pub change: Option<String>,

    pub footer: String,
}

impl ReceiptPayload {
    /// Builds the receipt for a committed sale.
    pub fn for_sale(settings: &BusinessSettings, txn: &TransactionRecord) -> Self {
        let lines = txn
            .items
            .iter()
            .map(|item| ReceiptLine {
                name: item.name.clone(),
                quantity: item.quantity,
                unit_price: settings.format_currency(item.unit_price_cents),
                line_total: settings.format_currency(item.line_total_cents),
                discount: (item.discount_cents > 0)
                    .then(|| settings.format_currency(item.discount_cents)),
            })
            .collect();

        ReceiptPayload {
            shop_name: settings.shop_name.clone(),
            shop_address: settings.shop_address.clone(),
            header: settings.receipt_header.clone(),
            receipt_number: txn.receipt_number.clone(),
            issued_at: txn.created_at.format("%d/%m/%Y %H:%M").to_string(),
            lines,
            subtotal: settings.format_currency(txn.subtotal_cents),
            discount: (txn.discount_cents > 0)
                .then(|| settings.format_currency(txn.discount_cents)),
            vat: txn
                .tax_charged()
                .then(|| settings.format_currency(txn.vat_cents)),
            total: settings.format_currency(txn.total_cents),
            payment_method: method_label(txn.payment_method).to_string(),
            change: (txn.payment.change_cents > 0)
                .then(|| settings.format_currency(txn.payment.change_cents)),
            footer: settings.receipt_footer.clone(),
        }
    }
}

fn method_label(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Cash => "CASH",
        PaymentMethod::Card => "CARD",
        PaymentMethod::StoreCredit => "STORE CREDIT",
        PaymentMethod::Split => "SPLIT",
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use corner_core::{PaymentBreakdown, SnapshotLine};

    // The canonical test print: 5.99 × 2 + 3.50, 20% VAT.
    fn worked_example() -> TransactionRecord {
        TransactionRecord {
            id: "txn-1".to_string(),
            receipt_number: "R-000042".to_string(),
            staff_id: "staff-1".to_string(),
            customer_id: None,
            subtotal_cents: 1548,
            vat_cents: 310,
            discount_cents: 0,
            total_cents: 1858,
            tax_rate_bps: 2000,
            payment_method: PaymentMethod::Split,
            payment: PaymentBreakdown {
                cash_cents: 1000,
                card_cents: 858,
                store_credit_cents: 0,
                change_cents: 0,
                card_reference: None,
            },
            items: vec![
                SnapshotLine {
                    line_id: "l1".to_string(),
                    catalog_id: Some("p1".to_string()),
                    name: "Shampoo 250ml".to_string(),
                    unit_price_cents: 599,
                    quantity: 2,
                    discount_cents: 0,
                    line_total_cents: 1198,
                },
                SnapshotLine {
                    line_id: "l2".to_string(),
                    catalog_id: Some("p2".to_string()),
                    name: "Nail Polish Red".to_string(),
                    unit_price_cents: 350,
                    quantity: 1,
                    discount_cents: 0,
                    line_total_cents: 350,
                },
            ],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_worked_example_receipt() {
        let settings = BusinessSettings::default();
        let receipt = ReceiptPayload::for_sale(&settings, &worked_example());

        assert_eq!(receipt.subtotal, "£15.48");
        assert_eq!(receipt.vat.as_deref(), Some("£3.10"));
        assert_eq!(receipt.total, "£18.58");
        assert_eq!(receipt.payment_method, "SPLIT");
        assert_eq!(receipt.lines.len(), 2);
        assert_eq!(receipt.lines[0].line_total, "£11.98");
        assert!(receipt.discount.is_none());
        assert!(receipt.change.is_none());
        assert_eq!(receipt.footer, "Thank you for your custom");
    }

    #[test]
    fn test_no_vat_line_when_untaxed() {
        let mut txn = worked_example();
        txn.tax_rate_bps = 0;
        txn.vat_cents = 0;
        txn.total_cents = txn.subtotal_cents;

        let receipt = ReceiptPayload::for_sale(&BusinessSettings::default(), &txn);
        assert!(receipt.vat.is_none());
        assert_eq!(receipt.total, "£15.48");
    }

    #[test]
    fn test_change_shown_on_cash_overtender() {
        let mut txn = worked_example();
        txn.payment_method = PaymentMethod::Cash;
        txn.payment = PaymentBreakdown {
            cash_cents: 2000,
            card_cents: 0,
            store_credit_cents: 0,
            change_cents: 142,
            card_reference: None,
        };

        let receipt = ReceiptPayload::for_sale(&BusinessSettings::default(), &txn);
        assert_eq!(receipt.change.as_deref(), Some("£1.42"));
        assert_eq!(receipt.payment_method, "CASH");
    }
}
