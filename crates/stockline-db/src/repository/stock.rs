//! # Stock Repository
//!
//! Derives calculated stock from transaction history and compares it with
//! the stored `products.stock` column.
//!
//! ```text
//! purchases (received)        ─┐
//! purchase voucher items (posted)
//! sales returns               ─┤  UNION ALL, summed per product and kind
//! sales                       ─┤          │
//! sales voucher items (posted) │          ▼
//! purchase returns            ─┘     StockLedger ──► StockSnapshot
//! ```
//!
//! The arithmetic itself lives in `stockline_core::stock`; this module only
//! gathers the totals.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use stockline_core::stock::{MovementKind, StockLedger, StockMovements, StockSnapshot};

use super::{require_product, PRODUCT_COLUMNS};
use crate::error::{DbError, DbResult};

/// One aggregate per movement source. `{filter}` is replaced with an
/// optional product condition.
const MOVEMENT_SOURCES: &[(&str, &str)] = &[
    (
        "purchase",
        "SELECT product_id, SUM(quantity) FROM purchases \
         WHERE status = 'received' {filter} GROUP BY product_id",
    ),
    (
        "voucher_purchase",
        "SELECT i.product_id, SUM(i.quantity) FROM purchase_voucher_items i \
         JOIN purchase_vouchers v ON v.id = i.voucher_id \
         WHERE v.status = 'posted' {filter} GROUP BY i.product_id",
    ),
    (
        "sales_return",
        "SELECT product_id, SUM(quantity) FROM sales_returns \
         WHERE 1 = 1 {filter} GROUP BY product_id",
    ),
    (
        "sale",
        "SELECT product_id, SUM(quantity) FROM sales \
         WHERE 1 = 1 {filter} GROUP BY product_id",
    ),
    (
        "voucher_sale",
        "SELECT i.product_id, SUM(i.quantity) FROM sales_voucher_items i \
         JOIN sales_vouchers v ON v.id = i.voucher_id \
         WHERE v.status = 'posted' {filter} GROUP BY i.product_id",
    ),
    (
        "purchase_return",
        "SELECT product_id, SUM(quantity) FROM purchase_returns \
         WHERE 1 = 1 {filter} GROUP BY product_id",
    ),
];

fn movement_kind(tag: &str) -> Option<MovementKind> {
    match tag {
        "purchase" => Some(MovementKind::Purchase),
        "voucher_purchase" => Some(MovementKind::VoucherPurchase),
        "sales_return" => Some(MovementKind::SalesReturn),
        "sale" => Some(MovementKind::Sale),
        "voucher_sale" => Some(MovementKind::VoucherSale),
        "purchase_return" => Some(MovementKind::PurchaseReturn),
        _ => None,
    }
}

fn movements_sql(for_product: bool) -> String {
    MOVEMENT_SOURCES
        .iter()
        .map(|(tag, select)| {
            let filter = match (for_product, select.contains("i.product_id")) {
                (false, _) => "",
                (true, true) => "AND i.product_id = ?1",
                (true, false) => "AND product_id = ?1",
            };
            let select = select.replacen("SELECT ", &format!("SELECT '{}' AS kind, ", tag), 1);
            select.replace("{filter}", filter)
        })
        .collect::<Vec<_>>()
        .join(" UNION ALL ")
}

pub(crate) async fn load_ledger(conn: &mut SqliteConnection, product_id: Option<&str>) -> DbResult<StockLedger> {
    let sql = movements_sql(product_id.is_some());
    let mut query = sqlx::query_as::<_, (String, String, i64)>(&sql);
    if let Some(id) = product_id {
        query = query.bind(id);
    }
    let rows = query.fetch_all(&mut *conn).await?;

    let mut ledger = StockLedger::new();
    for (tag, product_id, quantity) in rows {
        let kind = movement_kind(&tag)
            .ok_or_else(|| DbError::Internal(format!("unknown movement kind '{}'", tag)))?;
        ledger.record(&product_id, kind, quantity);
    }
    Ok(ledger)
}

#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Movement totals of one product, opening stock included.
    pub async fn movements_for(&self, product_id: &str) -> DbResult<StockMovements> {
        let mut conn = self.pool.acquire().await?;
        let product = require_product(&mut conn, product_id).await?;
        let ledger = load_ledger(&mut conn, Some(product_id)).await?;
        Ok(ledger.movements(product_id, product.opening_stock))
    }

    /// Movement totals of every product.
    pub async fn movements_all(&self) -> DbResult<StockLedger> {
        let mut conn = self.pool.acquire().await?;
        load_ledger(&mut conn, None).await
    }

    pub async fn snapshot(&self, product_id: &str) -> DbResult<StockSnapshot> {
        let mut conn = self.pool.acquire().await?;
        let product = require_product(&mut conn, product_id).await?;
        let ledger = load_ledger(&mut conn, Some(product_id)).await?;
        Ok(ledger.snapshot(&product))
    }

    /// Snapshots of all products, ordered by SKU.
    pub async fn snapshots(&self) -> DbResult<Vec<StockSnapshot>> {
        debug!("Computing stock snapshots");

        let mut conn = self.pool.acquire().await?;
        let sql = format!("SELECT {} FROM products ORDER BY sku", PRODUCT_COLUMNS);
        let products = sqlx::query_as::<_, stockline_core::Product>(&sql)
            .fetch_all(&mut *conn)
            .await?;
        let ledger = load_ledger(&mut conn, None).await?;

        Ok(products.iter().map(|p| ledger.snapshot(p)).collect())
    }

    /// Overwrites the stored stock with the calculated value.
    pub async fn reconcile(&self, product_id: &str) -> DbResult<StockSnapshot> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut product = require_product(&mut tx, product_id).await?;
        let before = load_ledger(&mut tx, Some(product_id)).await?.snapshot(&product);

        info!(
            product_id = %product_id,
            stored = before.stored,
            calculated = before.calculated,
            diff = before.diff,
            "Reconciling stock"
        );

        if !before.is_consistent() {
            sqlx::query("UPDATE products SET stock = ?1, updated_at = ?2 WHERE id = ?3")
                .bind(before.calculated)
                .bind(now)
                .bind(product_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        product.stock = before.calculated;
        Ok(StockSnapshot::new(&product, before.movements))
    }
}
