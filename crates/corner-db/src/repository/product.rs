//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Key Operations
//! - Name / barcode search
//! - CRUD operations
//! - Stock adjustment (delta updates)
//! - Atomic stock reservation at commit time
//!
//! ## Stock Reservation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  The cart checks stock against a snapshot taken when the line was       │
//! │  added. Another till may sell the same item in between, so commit       │
//! │  repeats the check as ONE conditional statement:                        │
//! │                                                                         │
//! │    UPDATE products SET stock_quantity = stock_quantity - ?              │
//! │    WHERE id = ? AND stock_quantity >= ?                                 │
//! │                                                                         │
//! │  Zero rows affected = somebody got there first. No window between       │
//! │  check and decrement.                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use corner_core::CatalogItem;

const SELECT_COLUMNS: &str = "id, name, barcode, price_cents, track_inventory, \
     stock_quantity, is_active, created_at, updated_at";

/// Repository for catalog database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Searches active products by name or barcode.
    ///
    /// An empty query lists active products sorted by name. A non-empty
    /// query matches name substrings and barcode prefixes.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<CatalogItem>> {
        let query = query.trim();

        debug!(query = %query, limit = %limit, "Searching products");

        if query.is_empty() {
            return self.list_active(limit).await;
        }

        let pattern = format!("%{query}%");
        let barcode_pattern = format!("{query}%");

        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM products \
             WHERE is_active = 1 AND (name LIKE ?1 OR barcode LIKE ?2) \
             ORDER BY name LIMIT ?3"
        );
        let products = sqlx::query_as::<_, CatalogItem>(&sql)
            .bind(&pattern)
            .bind(&barcode_pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Lists active products (no search filter), sorted by name.
    async fn list_active(&self, limit: u32) -> DbResult<Vec<CatalogItem>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM products \
             WHERE is_active = 1 ORDER BY name LIMIT ?1"
        );
        let products = sqlx::query_as::<_, CatalogItem>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Gets a product by its ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<CatalogItem>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, CatalogItem>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by an exact barcode scan.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<CatalogItem>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM products \
             WHERE barcode = ?1 AND is_active = 1"
        );
        let product = sqlx::query_as::<_, CatalogItem>(&sql)
            .bind(barcode)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Inserts a new product.
    ///
    /// ## Errors
    /// `UniqueViolation` when the barcode is already taken.
    pub async fn insert(&self, item: &CatalogItem) -> DbResult<()> {
        debug!(id = %item.id, name = %item.name, "Inserting product");

        sqlx::query(
            "INSERT INTO products (\
                id, name, barcode, price_cents, track_inventory, \
                stock_quantity, is_active, created_at, updated_at\
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(&item.barcode)
        .bind(item.price_cents)
        .bind(item.track_inventory)
        .bind(item.stock_quantity)
        .bind(item.is_active)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing product.
    pub async fn update(&self, item: &CatalogItem) -> DbResult<()> {
        debug!(id = %item.id, "Updating product");

        let result = sqlx::query(
            "UPDATE products SET \
                name = ?2, barcode = ?3, price_cents = ?4, \
                track_inventory = ?5, stock_quantity = ?6, is_active = ?7, \
                updated_at = ?8 \
             WHERE id = ?1",
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(&item.barcode)
        .bind(item.price_cents)
        .bind(item.track_inventory)
        .bind(item.stock_quantity)
        .bind(item.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &item.id));
        }

        Ok(())
    }

    /// Adjusts stock by a signed delta (negative for sales, positive for
    /// restocking and returns). Unconditional; use
    /// [`ProductRepository::reserve_stock`] when the decrement must not
    /// drive stock negative.
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> DbResult<()> {
        debug!(id = %id, delta = %delta, "Adjusting stock");

        let result = sqlx::query(
            "UPDATE products SET \
                stock_quantity = stock_quantity + ?2, updated_at = ?3 \
             WHERE id = ?1",
        )
        .bind(id)
        .bind(delta)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Atomically reserves `quantity` units of stock for a sale.
    ///
    /// The decrement and the availability check are one statement; when the
    /// condition fails nothing is changed and the current availability is
    /// reported.
    ///
    /// ## Errors
    /// - `InsufficientStock` when the product tracks inventory and has
    ///   fewer than `quantity` units
    /// - `NotFound` when the product doesn't exist
    pub async fn reserve_stock(&self, id: &str, quantity: i64) -> DbResult<()> {
        debug!(id = %id, quantity = %quantity, "Reserving stock");

        let result = sqlx::query(
            "UPDATE products SET \
                stock_quantity = stock_quantity - ?2, updated_at = ?3 \
             WHERE id = ?1 AND track_inventory = 1 AND stock_quantity >= ?2",
        )
        .bind(id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Distinguish missing product from insufficient stock
            return match self.get(id).await? {
                None => Err(DbError::not_found("Product", id)),
                Some(item) if !item.track_inventory => Ok(()), // untracked: nothing to reserve
                Some(item) => Err(DbError::InsufficientStock {
                    product_id: id.to_string(),
                    available: item.stock_quantity,
                    requested: quantity,
                }),
            };
        }

        Ok(())
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// Historical sales still reference the product, so rows are never
    /// physically deleted.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query(
            "UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn item(name: &str, price: i64, stock: Option<i64>) -> CatalogItem {
        CatalogItem {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            barcode: None,
            price_cents: price,
            track_inventory: stock.is_some(),
            stock_quantity: stock.unwrap_or(0),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let p = item("Shampoo 250ml", 899, Some(10));
        repo.insert(&p).await.unwrap();

        let found = repo.get(&p.id).await.unwrap().unwrap();
        assert_eq!(found.name, "Shampoo 250ml");
        assert_eq!(found.price_cents, 899);
        assert_eq!(found.stock_quantity, 10);
        assert!(found.track_inventory);
    }

    #[tokio::test]
    async fn test_search_by_name() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&item("Shampoo 250ml", 899, None)).await.unwrap();
        repo.insert(&item("Conditioner", 799, None)).await.unwrap();

        let results = repo.search("sham", 20).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Shampoo 250ml");

        // empty query lists everything active
        let all = repo.search("", 20).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_reserve_stock_conditional() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let p = item("Shampoo", 899, Some(3));
        repo.insert(&p).await.unwrap();

        repo.reserve_stock(&p.id, 2).await.unwrap();

        // only 1 left: reserving 2 must fail and change nothing
        let err = repo.reserve_stock(&p.id, 2).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::InsufficientStock {
                available: 1,
                requested: 2,
                ..
            }
        ));

        let after = repo.get(&p.id).await.unwrap().unwrap();
        assert_eq!(after.stock_quantity, 1);
    }

    #[tokio::test]
    async fn test_reserve_stock_untracked_is_noop() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let p = item("Blow dry", 2500, None);
        repo.insert(&p).await.unwrap();

        repo.reserve_stock(&p.id, 5).await.unwrap();
        let after = repo.get(&p.id).await.unwrap().unwrap();
        assert_eq!(after.stock_quantity, 0);
    }

    #[tokio::test]
    async fn test_adjust_stock_restock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let p = item("Shampoo", 899, Some(1));
        repo.insert(&p).await.unwrap();

        repo.adjust_stock(&p.id, 2).await.unwrap();
        let after = repo.get(&p.id).await.unwrap().unwrap();
        assert_eq!(after.stock_quantity, 3);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_search() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let p = item("Shampoo", 899, None);
        repo.insert(&p).await.unwrap();
        repo.soft_delete(&p.id).await.unwrap();

        assert!(repo.search("sham", 20).await.unwrap().is_empty());
        // still reachable by id for history
        assert!(repo.get(&p.id).await.unwrap().is_some());
    }
}
