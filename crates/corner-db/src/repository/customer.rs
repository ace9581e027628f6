//! # Customer Repository
//!
//! Database operations for customers and their store-credit balances.
//!
//! ## Balance Movements
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every balance change is two writes in ONE database transaction:        │
//! │                                                                         │
//! │    1. UPDATE customers SET balance_cents = balance_cents ± delta        │
//! │    2. INSERT INTO balance_entries (delta, balance_after, reference)     │
//! │                                                                         │
//! │  Deductions add a condition to the UPDATE so the balance check and      │
//! │  the decrement are atomic. A courtesy check happens earlier at the      │
//! │  engine layer, but the balance may change between tills in between;     │
//! │  this is the authoritative one.                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use corner_core::Customer;

const SELECT_COLUMNS: &str =
    "id, name, email, phone, balance_cents, loyalty_points, created_at, updated_at";

/// One row of the store-credit audit ledger.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BalanceEntry {
    pub id: String,
    pub customer_id: String,
    /// Signed delta in cents: negative for spend, positive for credit.
    pub delta_cents: i64,
    /// Balance after applying the delta.
    pub balance_after_cents: i64,
    /// What caused the movement ("sale:<id>", "return:<id>", "topup").
    pub reference: String,
    pub created_at: DateTime<Utc>,
}

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Gets a customer by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Customer>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM customers WHERE id = ?1");
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    /// Searches customers by name substring.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Customer>> {
        let pattern = format!("%{}%", query.trim());
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM customers \
             WHERE name LIKE ?1 ORDER BY name LIMIT ?2"
        );
        let customers = sqlx::query_as::<_, Customer>(&sql)
            .bind(&pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(customers)
    }

    /// Inserts a new customer.
    pub async fn insert(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, name = %customer.name, "Inserting customer");

        sqlx::query(
            "INSERT INTO customers (\
                id, name, email, phone, balance_cents, loyalty_points, \
                created_at, updated_at\
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(customer.balance_cents)
        .bind(customer.loyalty_points)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates customer contact details. Balance is never written through
    /// here; it only moves via [`CustomerRepository::deduct_balance`] and
    /// [`CustomerRepository::credit_balance`].
    pub async fn update(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, "Updating customer");

        let result = sqlx::query(
            "UPDATE customers SET \
                name = ?2, email = ?3, phone = ?4, loyalty_points = ?5, \
                updated_at = ?6 \
             WHERE id = ?1",
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(customer.loyalty_points)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", &customer.id));
        }

        Ok(())
    }

    /// Atomically deducts store credit for a sale.
    ///
    /// Check and decrement are a single conditional UPDATE; when
    /// `allow_negative` is false and the balance is short, nothing changes
    /// and the current balance is reported. The ledger row is written in
    /// the same database transaction.
    ///
    /// ## Errors
    /// - `InsufficientBalance` when the condition fails
    /// - `NotFound` when the customer doesn't exist
    pub async fn deduct_balance(
        &self,
        id: &str,
        amount_cents: i64,
        allow_negative: bool,
        reference: &str,
    ) -> DbResult<()> {
        debug!(id = %id, amount = %amount_cents, "Deducting store credit");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE customers SET \
                balance_cents = balance_cents - ?2, updated_at = ?3 \
             WHERE id = ?1 AND (?4 OR balance_cents >= ?2)",
        )
        .bind(id)
        .bind(amount_cents)
        .bind(Utc::now())
        .bind(allow_negative)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Fetch the balance on the same connection; tx dropped on
            // return rolls back (nothing written yet)
            let balance: Option<i64> =
                sqlx::query_scalar("SELECT balance_cents FROM customers WHERE id = ?1")
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await?;
            return match balance {
                None => Err(DbError::not_found("Customer", id)),
                Some(balance_cents) => Err(DbError::InsufficientBalance {
                    customer_id: id.to_string(),
                    balance_cents,
                    requested_cents: amount_cents,
                }),
            };
        }

        let balance_after: i64 =
            sqlx::query_scalar("SELECT balance_cents FROM customers WHERE id = ?1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        Self::write_ledger(&mut tx, id, -amount_cents, balance_after, reference).await?;
        tx.commit().await?;

        Ok(())
    }

    /// Credits store credit (refunds, top-ups) with an audit ledger row in
    /// the same database transaction.
    pub async fn credit_balance(
        &self,
        id: &str,
        amount_cents: i64,
        reference: &str,
    ) -> DbResult<()> {
        debug!(id = %id, amount = %amount_cents, "Crediting store credit");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE customers SET \
                balance_cents = balance_cents + ?2, updated_at = ?3 \
             WHERE id = ?1",
        )
        .bind(id)
        .bind(amount_cents)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        let balance_after: i64 =
            sqlx::query_scalar("SELECT balance_cents FROM customers WHERE id = ?1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        Self::write_ledger(&mut tx, id, amount_cents, balance_after, reference).await?;
        tx.commit().await?;

        Ok(())
    }

    /// Lists the store-credit ledger for a customer, newest first.
    pub async fn balance_history(&self, id: &str, limit: u32) -> DbResult<Vec<BalanceEntry>> {
        let entries = sqlx::query_as::<_, BalanceEntry>(
            "SELECT id, customer_id, delta_cents, balance_after_cents, \
                    reference, created_at \
             FROM balance_entries \
             WHERE customer_id = ?1 ORDER BY created_at DESC LIMIT ?2",
        )
        .bind(id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn write_ledger(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        customer_id: &str,
        delta_cents: i64,
        balance_after_cents: i64,
        reference: &str,
    ) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO balance_entries (\
                id, customer_id, delta_cents, balance_after_cents, \
                reference, created_at\
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(customer_id)
        .bind(delta_cents)
        .bind(balance_after_cents)
        .bind(reference)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn customer(name: &str, balance: i64) -> Customer {
        Customer {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: None,
            phone: None,
            balance_cents: balance,
            loyalty_points: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        let c = customer("Alice Smith", 2500);
        repo.insert(&c).await.unwrap();

        let found = repo.get(&c.id).await.unwrap().unwrap();
        assert_eq!(found.name, "Alice Smith");
        assert_eq!(found.balance_cents, 2500);
    }

    #[tokio::test]
    async fn test_deduct_balance_sufficient() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        let c = customer("Alice", 2500);
        repo.insert(&c).await.unwrap();

        repo.deduct_balance(&c.id, 1000, false, "sale:txn-1")
            .await
            .unwrap();

        let after = repo.get(&c.id).await.unwrap().unwrap();
        assert_eq!(after.balance_cents, 1500);

        let ledger = repo.balance_history(&c.id, 10).await.unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].delta_cents, -1000);
        assert_eq!(ledger[0].balance_after_cents, 1500);
        assert_eq!(ledger[0].reference, "sale:txn-1");
    }

    #[tokio::test]
    async fn test_deduct_balance_insufficient_changes_nothing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        let c = customer("Alice", 500);
        repo.insert(&c).await.unwrap();

        let err = repo
            .deduct_balance(&c.id, 1000, false, "sale:txn-1")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::InsufficientBalance {
                balance_cents: 500,
                requested_cents: 1000,
                ..
            }
        ));

        let after = repo.get(&c.id).await.unwrap().unwrap();
        assert_eq!(after.balance_cents, 500);
        assert!(repo.balance_history(&c.id, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deduct_balance_negative_permitted() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        let c = customer("Alice", 500);
        repo.insert(&c).await.unwrap();

        repo.deduct_balance(&c.id, 1000, true, "sale:txn-1")
            .await
            .unwrap();

        let after = repo.get(&c.id).await.unwrap().unwrap();
        assert_eq!(after.balance_cents, -500);
    }

    #[tokio::test]
    async fn test_credit_balance_writes_ledger() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        let c = customer("Alice", 0);
        repo.insert(&c).await.unwrap();

        repo.credit_balance(&c.id, 1438, "return:ret-1").await.unwrap();

        let after = repo.get(&c.id).await.unwrap().unwrap();
        assert_eq!(after.balance_cents, 1438);

        let ledger = repo.balance_history(&c.id, 10).await.unwrap();
        assert_eq!(ledger[0].delta_cents, 1438);
        assert_eq!(ledger[0].reference, "return:ret-1");
    }
}
