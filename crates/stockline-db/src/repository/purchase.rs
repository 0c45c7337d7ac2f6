//! # Purchase Repository
//!
//! Purchase lines and the purchase orders they form.
//!
//! A purchase order is not a table: it is every `purchases` row sharing an
//! `order_id`. Only `received` lines count towards stock, so status
//! changes move stock the same way quantity edits do.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use stockline_core::picker::{Page, PageRequest};
use stockline_core::report::DateRange;
use stockline_core::stock::delta_for_purchase;
use stockline_core::{
    group_purchase_orders, new_id, Purchase, PurchaseOrder, PurchaseOrderInput, PurchaseStatus,
    PurchaseUpdate, ValidationError, MAX_ITEM_QUANTITY, MAX_PAGE_SIZE,
};

use super::{apply_deltas, load_products, require_product};
use crate::error::{DbError, DbResult};

const PURCHASE_COLUMNS: &str = "id, order_id, product_id, supplier_id, quantity, \
     unit_cost_cents, total_cents, status, purchase_date, notes, created_at, updated_at";

/// Repository for purchase database operations.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Purchase lines, newest first.
    pub async fn list(&self, request: PageRequest) -> DbResult<Page<Purchase>> {
        let request = request.clamped(MAX_PAGE_SIZE);
        debug!(page = request.page, "Listing purchases");

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM purchases")
            .fetch_one(&self.pool)
            .await?;
        let sql = format!(
            "SELECT {} FROM purchases \
             ORDER BY purchase_date DESC, created_at DESC, order_id LIMIT ?1 OFFSET ?2",
            PURCHASE_COLUMNS
        );
        let items = sqlx::query_as::<_, Purchase>(&sql)
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

    /// Lines dated within the range, oldest first.
    pub async fn list_range(&self, range: &DateRange) -> DbResult<Vec<Purchase>> {
        let sql = format!(
            "SELECT {} FROM purchases \
             WHERE (?1 IS NULL OR purchase_date >= ?1) AND (?2 IS NULL OR purchase_date <= ?2) \
             ORDER BY purchase_date, created_at, rowid",
            PURCHASE_COLUMNS
        );
        Ok(sqlx::query_as::<_, Purchase>(&sql)
            .bind(range.from)
            .bind(range.to)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn get(&self, id: &str) -> DbResult<Purchase> {
        let mut conn = self.pool.acquire().await?;
        fetch_purchase(&mut conn, id).await
    }

    /// Every line of one order.
    pub async fn list_order(&self, order_id: &str) -> DbResult<PurchaseOrder> {
        let mut conn = self.pool.acquire().await?;
        fetch_order(&mut conn, order_id).await
    }

    /// Orders with at least one line in the range, newest first.
    pub async fn list_orders(&self, range: &DateRange) -> DbResult<Vec<PurchaseOrder>> {
        let mut orders = group_purchase_orders(self.list_range(range).await?);
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date));
        Ok(orders)
    }

    /// Creates a purchase order: one row per line under a fresh order id.
    /// Received lines add to stock immediately.
    pub async fn insert_order(&self, input: &PurchaseOrderInput) -> DbResult<PurchaseOrder> {
        let now = Utc::now();
        let order_id = new_id();
        let mut tx = self.pool.begin().await?;

        let products =
            load_products(&mut tx, input.lines.iter().map(|l| l.product_id.as_str())).await?;
        let lines = Purchase::lines_from_order(&order_id, input, &products, now.date_naive(), now)?;

        info!(
            order_id = %order_id,
            lines = lines.len(),
            "Inserting purchase order"
        );

        for line in &lines {
            write_purchase(&mut tx, line, true).await?;
        }
        apply_deltas(&mut tx, lines.iter().filter_map(delta_for_purchase), now).await?;

        let order = fetch_order(&mut tx, &order_id).await?;
        tx.commit().await?;
        Ok(order)
    }

    /// Edits one line, moving stock by the difference (quantity, product
    /// or status).
    pub async fn update(&self, id: &str, update: &PurchaseUpdate) -> DbResult<Purchase> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let old = fetch_purchase(&mut tx, id).await?;
        let product = require_product(&mut tx, &update.product_id).await?;
        let mut purchase = old.clone();
        purchase.apply_update(update, &product, now)?;

        let returned = returned_quantity(&mut tx, id).await?;
        if returned > 0 {
            if purchase.product_id != old.product_id {
                return Err(ValidationError::invalid(
                    "product",
                    "cannot change the product of a purchase with returns",
                )
                .into());
            }
            if purchase.status != PurchaseStatus::Received {
                return Err(ValidationError::invalid(
                    "status",
                    "a purchase with returns must stay received",
                )
                .into());
            }
            if purchase.quantity < returned {
                return Err(ValidationError::OutOfRange {
                    field: "quantity".to_string(),
                    min: returned,
                    max: MAX_ITEM_QUANTITY,
                }
                .into());
            }
        }

        info!(
            id = %id,
            quantity = purchase.quantity,
            status = purchase.status.as_str(),
            "Updating purchase"
        );

        write_purchase(&mut tx, &purchase, false).await?;
        let deltas = delta_for_purchase(&old)
            .map(|d| d.reversed())
            .into_iter()
            .chain(delta_for_purchase(&purchase));
        apply_deltas(&mut tx, deltas, now).await?;

        tx.commit().await?;
        Ok(purchase)
    }

    /// Pending → received, adding the quantity to stock.
    pub async fn receive(&self, id: &str) -> DbResult<Purchase> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut purchase = fetch_purchase(&mut tx, id).await?;
        purchase.receive(now)?;

        info!(id = %id, order_id = %purchase.order_id, "Receiving purchase");

        write_purchase(&mut tx, &purchase, false).await?;
        apply_deltas(&mut tx, delta_for_purchase(&purchase), now).await?;

        tx.commit().await?;
        Ok(purchase)
    }

    /// Receives every pending line of an order. Other lines are left alone.
    pub async fn receive_order(&self, order_id: &str) -> DbResult<PurchaseOrder> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let order = fetch_order(&mut tx, order_id).await?;
        let mut received = Vec::new();
        for mut line in order.lines {
            if line.status == PurchaseStatus::Pending {
                line.receive(now)?;
                write_purchase(&mut tx, &line, false).await?;
                received.push(line);
            }
        }

        info!(order_id = %order_id, lines = received.len(), "Receiving purchase order");

        apply_deltas(&mut tx, received.iter().filter_map(delta_for_purchase), now).await?;
        let order = fetch_order(&mut tx, order_id).await?;
        tx.commit().await?;
        Ok(order)
    }

    /// Deletes a line, taking back its stock if it was received.
    ///
    /// Refused while returns reference the line.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let purchase = fetch_purchase(&mut tx, id).await?;
        info!(id = %id, "Deleting purchase");

        sqlx::query("DELETE FROM purchases WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        apply_deltas(
            &mut tx,
            delta_for_purchase(&purchase).map(|d| d.reversed()),
            now,
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Units already returned to the supplier against a line.
    pub async fn returned_quantity(&self, purchase_id: &str) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        returned_quantity(&mut conn, purchase_id).await
    }
}

pub(crate) async fn fetch_purchase(conn: &mut SqliteConnection, id: &str) -> DbResult<Purchase> {
    let sql = format!("SELECT {} FROM purchases WHERE id = ?1", PURCHASE_COLUMNS);
    sqlx::query_as::<_, Purchase>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Purchase", id))
}

async fn fetch_order(conn: &mut SqliteConnection, order_id: &str) -> DbResult<PurchaseOrder> {
    let sql = format!(
        "SELECT {} FROM purchases WHERE order_id = ?1 ORDER BY rowid",
        PURCHASE_COLUMNS
    );
    let lines = sqlx::query_as::<_, Purchase>(&sql)
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;

    group_purchase_orders(lines)
        .pop()
        .ok_or_else(|| DbError::not_found("Purchase order", order_id))
}

pub(crate) async fn returned_quantity(
    conn: &mut SqliteConnection,
    purchase_id: &str,
) -> DbResult<i64> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(quantity), 0) FROM purchase_returns WHERE purchase_id = ?1",
    )
    .bind(purchase_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(total)
}

async fn write_purchase(conn: &mut SqliteConnection, p: &Purchase, insert: bool) -> DbResult<()> {
    let sql = if insert {
        r#"
        INSERT INTO purchases (
            id, order_id, product_id, supplier_id, quantity, unit_cost_cents,
            total_cents, status, purchase_date, notes, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#
    } else {
        r#"
        UPDATE purchases SET
            order_id = ?2, product_id = ?3, supplier_id = ?4, quantity = ?5,
            unit_cost_cents = ?6, total_cents = ?7, status = ?8, purchase_date = ?9,
            notes = ?10, created_at = ?11, updated_at = ?12
        WHERE id = ?1
        "#
    };

    sqlx::query(sql)
        .bind(&p.id)
        .bind(&p.order_id)
        .bind(&p.product_id)
        .bind(&p.supplier_id)
        .bind(p.quantity)
        .bind(p.unit_cost_cents)
        .bind(p.total_cents)
        .bind(p.status)
        .bind(p.purchase_date)
        .bind(&p.notes)
        .bind(p.created_at)
        .bind(p.updated_at)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
