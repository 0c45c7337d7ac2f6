//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - Paged listing for the dashboard and the product picker
//! - Full-text search using FTS5
//! - CRUD operations
//!
//! ## FTS5 Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How FTS5 Search Works                                │
//! │                                                                         │
//! │  User types: "green te"                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  fts_query → "green"* "te"*   (every token, prefix match, AND)         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  products_fts MATCH over sku, name, category                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  TEA-250 | Green Tea 250g | Beverages   ← MATCH                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use stockline_core::picker::{Page, PageRequest};
use stockline_core::{new_id, validation, Product, ProductInput, MAX_PAGE_SIZE};

use super::{load_products, PRODUCT_COLUMNS};
use crate::error::{with_duplicate_value, DbError, DbResult};

/// Turns free text into an FTS5 query of quoted prefix terms.
///
/// Quotes inside tokens are dropped so user input can never break out
/// of the string literal.
pub(crate) fn fts_query(query: &str) -> Option<String> {
    let terms: Vec<String> = query
        .split_whitespace()
        .map(|token| token.replace('"', ""))
        .filter(|token| !token.is_empty())
        .map(|token| format!("\"{}\"*", token))
        .collect();
    (!terms.is_empty()).then(|| terms.join(" "))
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
/// let page = repo.list(PageRequest::new(2, 25)).await?;
/// let hits = repo.search("tea", 20).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// One page of products ordered by name.
    pub async fn list(&self, request: PageRequest) -> DbResult<Page<Product>> {
        let request = request.clamped(MAX_PAGE_SIZE);
        debug!(page = request.page, page_size = request.page_size, "Listing products");

        let total = self.count().await?;
        let sql = format!(
            "SELECT {} FROM products ORDER BY name COLLATE NOCASE, sku LIMIT ?1 OFFSET ?2",
            PRODUCT_COLUMNS
        );
        let items = sqlx::query_as::<_, Product>(&sql)
            .bind(request.limit() as i64)
            .bind(request.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            items,
            total: total as u64,
            page: request.page,
            page_size: request.page_size,
        })
    }

    /// Searches products by sku, name or category.
    ///
    /// Every whitespace-separated token must prefix-match some word.
    /// An empty query returns the first `limit` products by name.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = validation::validate_search_query(query)?;
        let limit = limit.clamp(1, MAX_PAGE_SIZE);

        debug!(query = %query, limit = limit, "Searching products");

        let Some(fts) = fts_query(&query) else {
            return Ok(self.list(PageRequest::new(1, limit)).await?.items);
        };

        let sql = format!(
            "SELECT {} FROM products p \
             INNER JOIN products_fts ON p.rowid = products_fts.rowid \
             WHERE products_fts MATCH ?1 \
             ORDER BY products_fts.rank \
             LIMIT ?2",
            PRODUCT_COLUMNS
                .split(", ")
                .map(|c| format!("p.{}", c.trim()))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(fts)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Every product, ordered by name. Used by reports and exports.
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products ORDER BY name COLLATE NOCASE, sku",
            PRODUCT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
        Ok(sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Like [`get_by_id`](Self::get_by_id) but a miss is `NotFound`.
    pub async fn get(&self, id: &str) -> DbResult<Product> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE sku = ?1", PRODUCT_COLUMNS);
        Ok(sqlx::query_as::<_, Product>(&sql)
            .bind(sku.trim())
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Products keyed by id. Unknown ids are left out.
    pub async fn get_many(&self, ids: &[String]) -> DbResult<HashMap<String, Product>> {
        let mut conn = self.pool.acquire().await?;
        load_products(&mut conn, ids.iter().map(String::as_str)).await
    }

    /// Validates input and inserts a new product. Stored stock starts at
    /// the opening stock.
    pub async fn create(&self, input: &ProductInput) -> DbResult<Product> {
        let product = Product::from_input(new_id(), input, Utc::now())?;
        self.insert(&product).await
    }

    /// Inserts a fully built product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        info!(sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, category, description, unit,
                opening_stock, stock, reorder_point,
                purchase_price_cents, sell_price_cents, status,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.description)
        .bind(&product.unit)
        .bind(product.opening_stock)
        .bind(product.stock)
        .bind(product.reorder_point)
        .bind(product.purchase_price_cents)
        .bind(product.sell_price_cents)
        .bind(product.status)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| with_duplicate_value(e.into(), "sku", &product.sku))?;

        Ok(product.clone())
    }

    /// Applies an edit.
    ///
    /// The stored stock is shifted in SQL by the change in opening stock,
    /// never overwritten, so concurrent transaction writes are kept.
    pub async fn update(&self, id: &str, input: &ProductInput) -> DbResult<Product> {
        let mut product = self.get(id).await?;
        product.apply_input(input, Utc::now())?;

        info!(id = %id, sku = %product.sku, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                stock = stock + (?2 - opening_stock),
                opening_stock = ?2,
                sku = ?3,
                name = ?4,
                category = ?5,
                description = ?6,
                unit = ?7,
                reorder_point = ?8,
                purchase_price_cents = ?9,
                sell_price_cents = ?10,
                status = ?11,
                updated_at = ?12
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(product.opening_stock)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.description)
        .bind(&product.unit)
        .bind(product.reorder_point)
        .bind(product.purchase_price_cents)
        .bind(product.sell_price_cents)
        .bind(product.status)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| with_duplicate_value(e.into(), "sku", &product.sku))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get(id).await
    }

    /// Deletes a product.
    ///
    /// Refused with `ForeignKeyViolation` while any transaction still
    /// references it; deactivate it instead.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        info!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts all products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
