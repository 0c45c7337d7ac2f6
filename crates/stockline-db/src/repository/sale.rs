//! # Sale Repository
//!
//! Database operations for single-product sales.
//!
//! ## Stock Effect
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  insert  →  stock − quantity                                            │
//! │  update  →  stock + old quantity (old product) − new quantity (new)     │
//! │  delete  →  stock + quantity                                            │
//! │                                                                         │
//! │  Each in one transaction with the row write.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use stockline_core::picker::{Page, PageRequest};
use stockline_core::report::DateRange;
use stockline_core::stock::delta_for_sale;
use stockline_core::{new_id, Sale, SaleInput, ValidationError, MAX_PAGE_SIZE};

use super::{apply_deltas, require_product};
use crate::error::{DbError, DbResult};

const SALE_COLUMNS: &str = "id, reference, product_id, customer_id, customer_name, quantity, \
     unit_price_cents, discount_cents, total_cents, sale_date, notes, created_at, updated_at";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Newest first.
    pub async fn list(&self, request: PageRequest) -> DbResult<Page<Sale>> {
        let request = request.clamped(MAX_PAGE_SIZE);
        debug!(page = request.page, "Listing sales");

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;
        let sql = format!(
            "SELECT {} FROM sales ORDER BY sale_date DESC, created_at DESC LIMIT ?1 OFFSET ?2",
            SALE_COLUMNS
        );
        let items = sqlx::query_as::<_, Sale>(&sql)
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

    /// Sales dated within the range, oldest first.
    pub async fn list_range(&self, range: &DateRange) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {} FROM sales \
             WHERE (?1 IS NULL OR sale_date >= ?1) AND (?2 IS NULL OR sale_date <= ?2) \
             ORDER BY sale_date, created_at",
            SALE_COLUMNS
        );
        Ok(sqlx::query_as::<_, Sale>(&sql)
            .bind(range.from)
            .bind(range.to)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn get(&self, id: &str) -> DbResult<Sale> {
        let mut conn = self.pool.acquire().await?;
        fetch_sale(&mut conn, id).await
    }

    /// Records a sale and issues its quantity from stock.
    pub async fn insert(&self, input: &SaleInput) -> DbResult<Sale> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let product = require_product(&mut tx, &input.product_id).await?;
        let sale = Sale::from_input(new_id(), input, &product, now.date_naive(), now)?;

        info!(
            id = %sale.id,
            product_id = %sale.product_id,
            quantity = sale.quantity,
            "Inserting sale"
        );

        write_sale(&mut tx, &sale, true).await?;
        apply_deltas(&mut tx, [delta_for_sale(&sale)], now).await?;

        tx.commit().await?;
        Ok(sale)
    }

    /// Rewrites a sale, moving stock by the difference.
    ///
    /// A sale that already has returns keeps its product and cannot drop
    /// below the returned quantity.
    pub async fn update(&self, id: &str, input: &SaleInput) -> DbResult<Sale> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let old = fetch_sale(&mut tx, id).await?;
        let product = require_product(&mut tx, &input.product_id).await?;
        let mut sale = old.clone();
        sale.apply_input(input, &product, now)?;

        let returned = returned_quantity(&mut tx, id).await?;
        if returned > 0 {
            if sale.product_id != old.product_id {
                return Err(ValidationError::invalid(
                    "product",
                    "cannot change the product of a sale with returns",
                )
                .into());
            }
            if sale.quantity < returned {
                return Err(ValidationError::OutOfRange {
                    field: "quantity".to_string(),
                    min: returned,
                    max: stockline_core::MAX_ITEM_QUANTITY,
                }
                .into());
            }
        }

        info!(id = %id, quantity = sale.quantity, "Updating sale");

        write_sale(&mut tx, &sale, false).await?;
        apply_deltas(
            &mut tx,
            [delta_for_sale(&old).reversed(), delta_for_sale(&sale)],
            now,
        )
        .await?;

        tx.commit().await?;
        Ok(sale)
    }

    /// Deletes a sale and puts its quantity back.
    ///
    /// Refused while returns reference the sale.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let sale = fetch_sale(&mut tx, id).await?;
        info!(id = %id, "Deleting sale");

        sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        apply_deltas(&mut tx, [delta_for_sale(&sale).reversed()], now).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Units already returned against a sale.
    pub async fn returned_quantity(&self, sale_id: &str) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        returned_quantity(&mut conn, sale_id).await
    }
}

pub(crate) async fn fetch_sale(conn: &mut SqliteConnection, id: &str) -> DbResult<Sale> {
    let sql = format!("SELECT {} FROM sales WHERE id = ?1", SALE_COLUMNS);
    sqlx::query_as::<_, Sale>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Sale", id))
}

pub(crate) async fn returned_quantity(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<i64> {
    let total: i64 =
        sqlx::query_scalar("SELECT COALESCE(SUM(quantity), 0) FROM sales_returns WHERE sale_id = ?1")
            .bind(sale_id)
            .fetch_one(&mut *conn)
            .await?;
    Ok(total)
}

async fn write_sale(conn: &mut SqliteConnection, sale: &Sale, insert: bool) -> DbResult<()> {
    let sql = if insert {
        r#"
        INSERT INTO sales (
            id, reference, product_id, customer_id, customer_name, quantity,
            unit_price_cents, discount_cents, total_cents, sale_date, notes,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        "#
    } else {
        r#"
        UPDATE sales SET
            reference = ?2, product_id = ?3, customer_id = ?4, customer_name = ?5,
            quantity = ?6, unit_price_cents = ?7, discount_cents = ?8, total_cents = ?9,
            sale_date = ?10, notes = ?11, created_at = ?12, updated_at = ?13
        WHERE id = ?1
        "#
    };

    sqlx::query(sql)
        .bind(&sale.id)
        .bind(&sale.reference)
        .bind(&sale.product_id)
        .bind(&sale.customer_id)
        .bind(&sale.customer_name)
        .bind(sale.quantity)
        .bind(sale.unit_price_cents)
        .bind(sale.discount_cents)
        .bind(sale.total_cents)
        .bind(sale.sale_date)
        .bind(&sale.notes)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
