//! # Checkout Service
//!
//! The commit path: turns a cart plus a tender allocation into a committed,
//! immutable transaction.
//!
//! ## Commit Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. validate allocation completeness        (engine, pure)              │
//! │  2. pre-check store credit balance          (engine, pure)              │
//! │  3. reserve tracked stock                   (atomic conditional UPDATE) │
//! │  4. charge the card portion                 (card terminal)             │
//! │  5. deduct store credit                     (atomic conditional UPDATE) │
//! │  6. persist the transaction snapshot                                    │
//! │  7. print receipt + kick drawer             (best effort, never fatal)  │
//! │                                                                         │
//! │  Failure before step 6 releases any reserved stock and leaves the       │
//! │  cart untouched for retry. The sale record exists only after every      │
//! │  payment instrument has succeeded.                                      │
//! │                                                                         │
//! │  If the balance deduction fails AFTER the card was charged, the error   │
//! │  carries the card authorisation reference so the till can void or       │
//! │  follow up manually.                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use corner_core::{
    Cart, Money, PaymentBreakdown, Settlement, SnapshotLine, TransactionRecord,
};
use corner_db::Database;

use crate::error::{ErrorCode, ServiceError, ServiceResult};
use crate::hardware::{CardTerminal, ChargeOutcome, ReceiptPrinter};
use crate::receipt::ReceiptPayload;

/// What the till gets back from a committed sale.
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub transaction: TransactionRecord,
    /// Change due on cash overtender.
    pub change_cents: i64,
    /// False when the receipt failed to print (sale still stands;
    /// offer a reprint).
    pub printed: bool,
}

/// Orchestrates the commit flow over engine, database, and hardware.
pub struct CheckoutService {
    db: Database,
    printer: Arc<dyn ReceiptPrinter>,
    card_terminal: Arc<dyn CardTerminal>,
}

impl CheckoutService {
    /// Creates a checkout service over the given database and peripherals.
    pub fn new(
        db: Database,
        printer: Arc<dyn ReceiptPrinter>,
        card_terminal: Arc<dyn CardTerminal>,
    ) -> Self {
        CheckoutService {
            db,
            printer,
            card_terminal,
        }
    }

    /// Commits a sale.
    ///
    /// `cart` is a snapshot of the tab being settled; on success the caller
    /// clears or closes the tab. On any error the cart is untouched and no
    /// sale record exists.
    pub async fn commit(
        &self,
        cart: &Cart,
        cash: Money,
        card: Money,
        store_credit: Money,
        staff_id: &str,
    ) -> ServiceResult<CheckoutOutcome> {
        if cart.is_empty() {
            return Err(ServiceError::invalid_input("cannot commit an empty cart"));
        }

        let settings = self.db.settings().get().await?;
        let tax = settings.tax_config();
        let totals = cart.totals(tax);

        // 1-2: pure validation before anything irreversible
        let mut settlement = Settlement::new(Money::from_cents(totals.total_cents));
        settlement.set_allocation(cash, card, store_credit)?;
        settlement.validate_for_commit()?;

        if store_credit.is_positive() {
            let customer_id = cart.customer_id.as_deref().ok_or_else(|| {
                ServiceError::invalid_input("store credit requires a linked customer")
            })?;
            let customer = self
                .db
                .customers()
                .get(customer_id)
                .await?
                .ok_or_else(|| ServiceError::not_found(format!("customer {customer_id}")))?;
            settlement.validate_store_credit(customer.balance(), settings.allow_negative_balance)?;
        }

        // 3: reserve tracked stock, releasing on any later failure
        let reserved = self.reserve_stock(cart).await?;

        // 4: card portion
        let card_reference = if card.is_positive() {
            match self.card_terminal.process_payment(card).await {
                Ok(ChargeOutcome::Approved { reference }) => {
                    info!(reference = %reference, amount = card.cents(), "Card approved");
                    Some(reference)
                }
                Ok(ChargeOutcome::Declined { reason }) => {
                    self.release_stock(&reserved).await;
                    return Err(ServiceError::new(
                        ErrorCode::PaymentError,
                        format!("card declined: {reason}"),
                    ));
                }
                Err(hw) => {
                    self.release_stock(&reserved).await;
                    return Err(hw.into());
                }
            }
        } else {
            None
        };

        // 5: store credit, re-validated atomically at the data store
        let transaction_id = Uuid::new_v4().to_string();
        if store_credit.is_positive() {
            // linked customer checked above
            let customer_id = cart.customer_id.as_deref().unwrap_or_default();
            let reference = format!("sale:{transaction_id}");
            if let Err(db_err) = self
                .db
                .customers()
                .deduct_balance(
                    customer_id,
                    store_credit.cents(),
                    settings.allow_negative_balance,
                    &reference,
                )
                .await
            {
                self.release_stock(&reserved).await;
                let mut err = ServiceError::from(db_err);
                if let Some(auth) = &card_reference {
                    // card already went through; the till must void it
                    err.message = format!("{} (card charge {auth} needs manual void)", err.message);
                }
                return Err(err);
            }
        }

        // 6: persist the frozen snapshot
        let receipt_number = self.db.transactions().next_receipt_number().await?;
        let record = TransactionRecord {
            id: transaction_id,
            receipt_number,
            staff_id: staff_id.to_string(),
            customer_id: cart.customer_id.clone(),
            subtotal_cents: totals.subtotal_cents,
            vat_cents: totals.vat_cents,
            discount_cents: totals.discount_cents,
            total_cents: totals.total_cents,
            tax_rate_bps: tax.effective_rate().bps(),
            payment_method: settlement.allocation().payment_method(),
            payment: PaymentBreakdown {
                cash_cents: cash.cents(),
                card_cents: card.cents(),
                store_credit_cents: store_credit.cents(),
                change_cents: settlement.change_due().cents(),
                card_reference,
            },
            items: cart.items.iter().map(snapshot_line).collect(),
            created_at: Utc::now(),
        };
        self.db.transactions().insert(&record).await?;

        info!(
            id = %record.id,
            receipt = %record.receipt_number,
            total = record.total_cents,
            "Sale committed"
        );

        // 7: best-effort hardware; a dead printer never un-commits a sale
        let payload = ReceiptPayload::for_sale(&settings, &record);
        let printed = match self.printer.print(&payload).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, receipt = %record.receipt_number, "Receipt print failed");
                false
            }
        };
        if cash.is_positive() {
            if let Err(e) = self.printer.open_cash_drawer().await {
                warn!(error = %e, "Cash drawer kick failed");
            }
        }

        Ok(CheckoutOutcome {
            change_cents: record.payment.change_cents,
            transaction: record,
            printed,
        })
    }

    /// Reserves stock for every tracked line; on failure releases what was
    /// already taken and reports which item ran out.
    async fn reserve_stock(&self, cart: &Cart) -> ServiceResult<Vec<(String, i64)>> {
        let mut reserved: Vec<(String, i64)> = Vec::new();

        for line in &cart.items {
            let (Some(catalog_id), Some(_)) = (&line.catalog_id, line.stock_ceiling) else {
                continue;
            };

            if let Err(db_err) = self
                .db
                .products()
                .reserve_stock(catalog_id, line.quantity)
                .await
            {
                self.release_stock(&reserved).await;
                return Err(db_err.into());
            }
            reserved.push((catalog_id.clone(), line.quantity));
        }

        Ok(reserved)
    }

    /// Returns previously reserved stock after a failed commit.
    async fn release_stock(&self, reserved: &[(String, i64)]) {
        for (catalog_id, quantity) in reserved {
            if let Err(e) = self.db.products().adjust_stock(catalog_id, *quantity).await {
                // nothing sensible to do mid-unwind; leave a trail instead
                warn!(product = %catalog_id, error = %e, "Failed to release reserved stock");
            }
        }
    }
}

fn snapshot_line(line: &corner_core::LineItem) -> SnapshotLine {
    SnapshotLine {
        line_id: line.id.clone(),
        catalog_id: line.catalog_id.clone(),
        name: line.name.clone(),
        unit_price_cents: line.unit_price.cents(),
        quantity: line.quantity,
        discount_cents: line.line_discount.cents(),
        line_total_cents: line.line_total().cents(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::{MockCardTerminal, NullPrinter};
    use corner_core::{CatalogItem, Customer, PaymentMethod};
    use corner_db::DbConfig;

    async fn service_with(
        printer: Arc<NullPrinter>,
        terminal: Arc<MockCardTerminal>,
    ) -> (CheckoutService, Database) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let service = CheckoutService::new(db.clone(), printer, terminal);
        (service, db)
    }

    async fn seed_product(db: &Database, name: &str, price: i64, stock: Option<i64>) -> CatalogItem {
        let item = CatalogItem {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            barcode: None,
            price_cents: price,
            track_inventory: stock.is_some(),
            stock_quantity: stock.unwrap_or(0),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        db.products().insert(&item).await.unwrap();
        item
    }

    async fn seed_customer(db: &Database, balance: i64) -> Customer {
        let c = Customer {
            id: Uuid::new_v4().to_string(),
            name: "Alice".to_string(),
            email: None,
            phone: None,
            balance_cents: 0,
            loyalty_points: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        db.customers().insert(&c).await.unwrap();
        if balance > 0 {
            db.customers()
                .credit_balance(&c.id, balance, "topup")
                .await
                .unwrap();
        }
        c
    }

    fn cents(v: i64) -> Money {
        Money::from_cents(v)
    }

    // The worked example: 5.99 × 2 + 3.50 at 20% VAT → 18.58 owed.
    async fn worked_example_cart(db: &Database) -> Cart {
        let shampoo = seed_product(db, "Shampoo 250ml", 599, Some(10)).await;
        let polish = seed_product(db, "Nail Polish", 350, Some(5)).await;

        let mut cart = Cart::new();
        cart.add_item(&shampoo, 2).unwrap();
        cart.add_item(&polish, 1).unwrap();
        cart
    }

    #[tokio::test]
    async fn test_split_commit_happy_path() {
        let printer = Arc::new(NullPrinter::new());
        let terminal = Arc::new(MockCardTerminal::approving());
        let (service, db) = service_with(printer.clone(), terminal.clone()).await;
        let cart = worked_example_cart(&db).await;

        let outcome = service
            .commit(&cart, cents(1000), cents(858), Money::zero(), "staff-1")
            .await
            .unwrap();

        assert_eq!(outcome.transaction.total_cents, 1858);
        assert_eq!(outcome.transaction.vat_cents, 310);
        assert_eq!(outcome.transaction.payment_method, PaymentMethod::Split);
        assert!(outcome.transaction.payment.card_reference.is_some());
        assert_eq!(outcome.change_cents, 0);
        assert!(outcome.printed);

        // card charged exactly its portion
        assert_eq!(terminal.charges(), vec![858]);
        // drawer kicked because cash was involved
        assert!(printer.drawer_opened());

        // stock decremented
        let shampoo_id = &cart.items[0].catalog_id.clone().unwrap();
        let after = db.products().get(shampoo_id).await.unwrap().unwrap();
        assert_eq!(after.stock_quantity, 8);

        // persisted and findable
        let loaded = db
            .transactions()
            .get(&outcome.transaction.id)
            .await
            .unwrap();
        assert!(loaded.is_some());
    }

    #[tokio::test]
    async fn test_incomplete_allocation_rejected_before_side_effects() {
        let (service, db) = service_with(
            Arc::new(NullPrinter::new()),
            Arc::new(MockCardTerminal::approving()),
        )
        .await;
        let cart = worked_example_cart(&db).await;

        let err = service
            .commit(&cart, cents(1000), cents(800), Money::zero(), "staff-1")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::IncompleteAllocation);
        assert!(err.message.contains("58"));

        // nothing persisted, stock untouched
        assert!(db.transactions().list_recent(10).await.unwrap().is_empty());
        let shampoo_id = cart.items[0].catalog_id.clone().unwrap();
        let after = db.products().get(&shampoo_id).await.unwrap().unwrap();
        assert_eq!(after.stock_quantity, 10);
    }

    #[tokio::test]
    async fn test_stock_race_lost_at_commit() {
        let (service, db) = service_with(
            Arc::new(NullPrinter::new()),
            Arc::new(MockCardTerminal::approving()),
        )
        .await;

        let item = seed_product(&db, "Shampoo", 599, Some(5)).await;
        let mut cart = Cart::new();
        cart.add_item(&item, 3).unwrap();

        // another till sells 4 units between add and commit
        db.products().reserve_stock(&item.id, 4).await.unwrap();

        let total = cents(cart.totals(Default::default()).total_cents);
        let err = service
            .commit(&cart, total, Money::zero(), Money::zero(), "staff-1")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::OutOfStock);
        assert!(db.transactions().list_recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_card_decline_releases_stock() {
        let terminal = Arc::new(MockCardTerminal::declining());
        let (service, db) =
            service_with(Arc::new(NullPrinter::new()), terminal.clone()).await;
        let cart = worked_example_cart(&db).await;

        let err = service
            .commit(&cart, Money::zero(), cents(1858), Money::zero(), "staff-1")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentError);

        // reservation rolled back
        let shampoo_id = cart.items[0].catalog_id.clone().unwrap();
        let after = db.products().get(&shampoo_id).await.unwrap().unwrap();
        assert_eq!(after.stock_quantity, 10);
        assert!(db.transactions().list_recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_credit_requires_customer() {
        let (service, db) = service_with(
            Arc::new(NullPrinter::new()),
            Arc::new(MockCardTerminal::approving()),
        )
        .await;
        let cart = worked_example_cart(&db).await;

        let err = service
            .commit(&cart, cents(858), Money::zero(), cents(1000), "staff-1")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }

    #[tokio::test]
    async fn test_store_credit_commit_deducts_with_ledger() {
        let (service, db) = service_with(
            Arc::new(NullPrinter::new()),
            Arc::new(MockCardTerminal::approving()),
        )
        .await;
        let customer = seed_customer(&db, 2500).await;
        let mut cart = worked_example_cart(&db).await;
        cart.link_customer(customer.id.clone());

        let outcome = service
            .commit(&cart, Money::zero(), Money::zero(), cents(1858), "staff-1")
            .await
            .unwrap();
        assert_eq!(
            outcome.transaction.payment_method,
            PaymentMethod::StoreCredit
        );

        let after = db.customers().get(&customer.id).await.unwrap().unwrap();
        assert_eq!(after.balance_cents, 2500 - 1858);

        let ledger = db.customers().balance_history(&customer.id, 10).await.unwrap();
        assert_eq!(ledger[0].delta_cents, -1858);
        assert_eq!(
            ledger[0].reference,
            format!("sale:{}", outcome.transaction.id)
        );
    }

    #[tokio::test]
    async fn test_insufficient_balance_pre_check() {
        let (service, db) = service_with(
            Arc::new(NullPrinter::new()),
            Arc::new(MockCardTerminal::approving()),
        )
        .await;
        let customer = seed_customer(&db, 500).await;
        let mut cart = worked_example_cart(&db).await;
        cart.link_customer(customer.id.clone());

        let err = service
            .commit(&cart, Money::zero(), Money::zero(), cents(1858), "staff-1")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientBalance);

        // balance untouched, stock untouched, nothing persisted
        let after = db.customers().get(&customer.id).await.unwrap().unwrap();
        assert_eq!(after.balance_cents, 500);
        assert!(db.transactions().list_recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_print_failure_does_not_unseat_sale() {
        let printer = Arc::new(NullPrinter::new());
        printer.set_failing(true);
        let (service, db) = service_with(printer, Arc::new(MockCardTerminal::approving())).await;
        let cart = worked_example_cart(&db).await;

        let outcome = service
            .commit(&cart, cents(1858), Money::zero(), Money::zero(), "staff-1")
            .await
            .unwrap();

        assert!(!outcome.printed);
        assert!(db
            .transactions()
            .get(&outcome.transaction.id)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_cash_overtender_change() {
        let (service, db) = service_with(
            Arc::new(NullPrinter::new()),
            Arc::new(MockCardTerminal::approving()),
        )
        .await;
        let cart = worked_example_cart(&db).await;

        let outcome = service
            .commit(&cart, cents(2000), Money::zero(), Money::zero(), "staff-1")
            .await
            .unwrap();

        assert_eq!(outcome.change_cents, 142);
        assert_eq!(outcome.transaction.payment_method, PaymentMethod::Cash);
    }
}
