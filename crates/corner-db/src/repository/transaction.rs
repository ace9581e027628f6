//! # Transaction Repository
//!
//! Persistence for committed sales.
//!
//! ## Snapshot Storage
//! A committed sale embeds its line items and payment breakdown as JSON
//! columns. The snapshot is written once at commit and never updated;
//! catalog price changes must not retroactively alter history. Reads
//! deserialize back into `corner_core` types.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use corner_core::{PaymentBreakdown, PaymentMethod, SnapshotLine, TransactionRecord};

/// Raw row shape for the `transactions` table; JSON columns are expanded
/// into typed fields on the way out.
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: String,
    receipt_number: String,
    staff_id: String,
    customer_id: Option<String>,
    subtotal_cents: i64,
    vat_cents: i64,
    discount_cents: i64,
    total_cents: i64,
    tax_rate_bps: u32,
    payment_method: PaymentMethod,
    payment_details: String,
    items: String,
    created_at: DateTime<Utc>,
}

impl TransactionRow {
    fn into_record(self) -> DbResult<TransactionRecord> {
        let payment: PaymentBreakdown = serde_json::from_str(&self.payment_details)?;
        let items: Vec<SnapshotLine> = serde_json::from_str(&self.items)?;

        Ok(TransactionRecord {
            id: self.id,
            receipt_number: self.receipt_number,
            staff_id: self.staff_id,
            customer_id: self.customer_id,
            subtotal_cents: self.subtotal_cents,
            vat_cents: self.vat_cents,
            discount_cents: self.discount_cents,
            total_cents: self.total_cents,
            tax_rate_bps: self.tax_rate_bps,
            payment_method: self.payment_method,
            payment,
            items,
            created_at: self.created_at,
        })
    }
}

const SELECT_COLUMNS: &str = "id, receipt_number, staff_id, customer_id, \
     subtotal_cents, vat_cents, discount_cents, total_cents, tax_rate_bps, \
     payment_method, payment_details, items, created_at";

/// Repository for committed-sale database operations.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Inserts a committed sale.
    ///
    /// ## Errors
    /// `UniqueViolation` on a duplicate receipt number.
    pub async fn insert(&self, record: &TransactionRecord) -> DbResult<()> {
        info!(
            id = %record.id,
            receipt = %record.receipt_number,
            total = record.total_cents,
            "Persisting transaction"
        );

        let payment_details = serde_json::to_string(&record.payment)?;
        let items = serde_json::to_string(&record.items)?;

        sqlx::query(
            "INSERT INTO transactions (\
                id, receipt_number, staff_id, customer_id, \
                subtotal_cents, vat_cents, discount_cents, total_cents, \
                tax_rate_bps, payment_method, payment_details, items, \
                created_at\
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        )
        .bind(&record.id)
        .bind(&record.receipt_number)
        .bind(&record.staff_id)
        .bind(&record.customer_id)
        .bind(record.subtotal_cents)
        .bind(record.vat_cents)
        .bind(record.discount_cents)
        .bind(record.total_cents)
        .bind(record.tax_rate_bps)
        .bind(record.payment_method)
        .bind(&payment_details)
        .bind(&items)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a sale by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<TransactionRecord>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM transactions WHERE id = ?1");
        let row = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TransactionRow::into_record).transpose()
    }

    /// Gets a sale by receipt number (the number printed on the receipt
    /// the customer brings back for a return).
    pub async fn get_by_receipt(&self, receipt_number: &str) -> DbResult<Option<TransactionRecord>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM transactions WHERE receipt_number = ?1");
        let row = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(receipt_number)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TransactionRow::into_record).transpose()
    }

    /// Lists the most recent sales.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<TransactionRecord>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM transactions \
             ORDER BY created_at DESC LIMIT ?1"
        );
        let rows = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(TransactionRow::into_record).collect()
    }

    /// Allocates the next receipt number ("R-000001", sequential).
    pub async fn next_receipt_number(&self) -> DbResult<String> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;

        Ok(format!("R-{:06}", count + 1))
    }

    /// Total already refunded against a sale, across all prior returns.
    pub async fn total_refunded(&self, transaction_id: &str) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(refund_cents) FROM transaction_returns WHERE transaction_id = ?1",
        )
        .bind(transaction_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }

    /// Requires a sale to exist, for return flows.
    pub async fn require(&self, id: &str) -> DbResult<TransactionRecord> {
        debug!(id = %id, "Loading transaction");
        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Transaction", id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
