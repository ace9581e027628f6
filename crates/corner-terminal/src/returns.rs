//! # Return Service
//!
//! Processes returns against committed sales: computes the refund from the
//! frozen snapshot, persists the return, restocks tracked items, and credits
//! the customer's balance when the refund goes to store credit.
//!
//! ## Idempotence
//! The caller supplies the return id. Submitting the same id twice (a till
//! retry after a dropped response) replays the stored record instead of
//! refunding again.

use chrono::Utc;
use tracing::{info, warn};

use corner_core::{compute_refund, Money, RefundMethod, ReturnRecord, ReturnSelection, ReturnedLine};
use corner_db::Database;

use crate::error::{ServiceError, ServiceResult};

/// One return submission from the till.
#[derive(Debug, Clone)]
pub struct ReturnRequest {
    /// Client-generated id; the idempotency key for retries.
    pub return_id: String,
    pub transaction_id: String,
    pub staff_id: String,
    pub selections: Vec<ReturnSelection>,
    pub refund_method: RefundMethod,
    pub reason: String,
}

/// Orchestrates returns over the engine and the database.
pub struct ReturnService {
    db: Database,
}

impl ReturnService {
    pub fn new(db: Database) -> Self {
        ReturnService { db }
    }

    /// Processes a return.
    ///
    /// Replaying a `return_id` already on file returns the stored record
    /// without touching stock or balances again.
    pub async fn process(&self, req: &ReturnRequest) -> ServiceResult<ReturnRecord> {
        if let Some(existing) = self.db.returns().get(&req.return_id).await? {
            info!(id = %req.return_id, "Replaying already-processed return");
            return Ok(existing);
        }

        let txn = self.db.transactions().require(&req.transaction_id).await?;

        // Store-credit refunds need somewhere to put the money; check before
        // any write.
        if req.refund_method == RefundMethod::StoreCredit && txn.customer_id.is_none() {
            return Err(ServiceError::invalid_input(
                "store credit refund requires a sale with a linked customer",
            ));
        }

        let prior_quantities = self.db.returns().returned_quantities(&txn.id).await?;
        let already_refunded = self.db.transactions().total_refunded(&txn.id).await?;
        let settings = self.db.settings().get().await?;

        let computation = compute_refund(
            &txn,
            &req.selections,
            &prior_quantities,
            Money::from_cents(already_refunded),
            &req.reason,
            settings.tax_config(),
        )?;

        let record = ReturnRecord {
            id: req.return_id.clone(),
            transaction_id: txn.id.clone(),
            staff_id: req.staff_id.clone(),
            items: computation
                .lines
                .iter()
                .map(|line| ReturnedLine {
                    line_id: line.line_id.clone(),
                    quantity: line.quantity,
                    refund_cents: line.net_refund_cents,
                })
                .collect(),
            refund_cents: computation.total_refund.cents(),
            refund_method: req.refund_method,
            reason: req.reason.trim().to_string(),
            created_at: Utc::now(),
        };
        self.db.returns().insert(&record).await?;

        info!(
            id = %record.id,
            transaction = %record.transaction_id,
            refund = record.refund_cents,
            method = ?record.refund_method,
            "Return committed"
        );

        // Restock tracked items. An item deleted from the catalog since the
        // sale is skipped; the refund already stands.
        for line in &computation.lines {
            let Some(catalog_id) = &line.catalog_id else {
                continue;
            };
            match self.db.products().get(catalog_id).await? {
                Some(product) if product.track_inventory => {
                    self.db
                        .products()
                        .adjust_stock(catalog_id, line.quantity)
                        .await?;
                }
                Some(_) => {}
                None => {
                    warn!(product = %catalog_id, "Returned item no longer in catalog; not restocked");
                }
            }
        }

        if req.refund_method == RefundMethod::StoreCredit {
            // presence checked above
            let customer_id = txn.customer_id.as_deref().unwrap_or_default();
            let reference = format!("return:{}", record.id);
            self.db
                .customers()
                .credit_balance(customer_id, record.refund_cents, &reference)
                .await?;
        }

        Ok(record)
    }

    /// Returns already recorded against one sale, oldest first.
    pub async fn history(&self, transaction_id: &str) -> ServiceResult<Vec<ReturnRecord>> {
        Ok(self
            .db
            .returns()
            .list_for_transaction(transaction_id)
            .await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
