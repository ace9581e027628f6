//! # Return Repository
//!
//! Persistence for returns/refunds against prior sales.
//!
//! Returns are append-only; a return is computed in corner-core, committed
//! once here, and never modified. The per-line quantities stored with each
//! return feed back into the next return's availability check.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;
use corner_core::{RefundMethod, ReturnRecord, ReturnedLine};

#[derive(Debug, sqlx::FromRow)]
struct ReturnRow {
    id: String,
    transaction_id: String,
    staff_id: String,
    items: String,
    refund_cents: i64,
    refund_method: RefundMethod,
    reason: String,
    created_at: DateTime<Utc>,
}

impl ReturnRow {
    fn into_record(self) -> DbResult<ReturnRecord> {
        let items: Vec<ReturnedLine> = serde_json::from_str(&self.items)?;
        Ok(ReturnRecord {
            id: self.id,
            transaction_id: self.transaction_id,
            staff_id: self.staff_id,
            items,
            refund_cents: self.refund_cents,
            refund_method: self.refund_method,
            reason: self.reason,
            created_at: self.created_at,
        })
    }
}

const SELECT_COLUMNS: &str =
    "id, transaction_id, staff_id, items, refund_cents, refund_method, reason, created_at";

/// Repository for return database operations.
#[derive(Debug, Clone)]
pub struct ReturnRepository {
    pool: SqlitePool,
}

impl ReturnRepository {
    /// Creates a new ReturnRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReturnRepository { pool }
    }

    /// Inserts a committed return.
    pub async fn insert(&self, record: &ReturnRecord) -> DbResult<()> {
        info!(
            id = %record.id,
            transaction = %record.transaction_id,
            refund = record.refund_cents,
            "Persisting return"
        );

        let items = serde_json::to_string(&record.items)?;

        sqlx::query(
            "INSERT INTO transaction_returns (\
                id, transaction_id, staff_id, items, refund_cents, \
                refund_method, reason, created_at\
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&record.id)
        .bind(&record.transaction_id)
        .bind(&record.staff_id)
        .bind(&items)
        .bind(record.refund_cents)
        .bind(record.refund_method)
        .bind(&record.reason)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a return by its ID. Used to make return submission idempotent:
    /// a replayed return id is answered with the already-committed record.
    pub async fn get(&self, id: &str) -> DbResult<Option<ReturnRecord>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM transaction_returns WHERE id = ?1");
        let row = sqlx::query_as::<_, ReturnRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(ReturnRow::into_record).transpose()
    }

    /// Lists all returns against a sale, oldest first.
    pub async fn list_for_transaction(&self, transaction_id: &str) -> DbResult<Vec<ReturnRecord>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM transaction_returns \
             WHERE transaction_id = ?1 ORDER BY created_at ASC"
        );
        let rows = sqlx::query_as::<_, ReturnRow>(&sql)
            .bind(transaction_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(ReturnRow::into_record).collect()
    }

    /// Aggregates per-line quantities already returned against a sale.
    /// This feeds the refund calculator's availability check.
    pub async fn returned_quantities(
        &self,
        transaction_id: &str,
    ) -> DbResult<HashMap<String, i64>> {
        let returns = self.list_for_transaction(transaction_id).await?;

        let mut quantities = HashMap::new();
        for ret in returns {
            for line in ret.items {
                *quantities.entry(line.line_id).or_insert(0) += line.quantity;
            }
        }

        Ok(quantities)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
