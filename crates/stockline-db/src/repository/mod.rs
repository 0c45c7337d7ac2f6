//! # Repository Module
//!
//! Database repository implementations for Stockline.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  axum handler                                                          │
//! │       │                                                                 │
//! │       │  db.sales().insert(&input)                                     │
//! │       ▼                                                                 │
//! │  SaleRepository                                                        │
//! │  ├── BEGIN                                                             │
//! │  ├── INSERT INTO sales ...                                             │
//! │  ├── apply_deltas(-quantity)  → UPDATE products SET stock = stock + ?  │
//! │  └── COMMIT                                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`] - Product CRUD, paging and FTS search
//! - [`SaleRepository`] / [`PurchaseRepository`] - single-product transactions
//! - [`SalesReturnRepository`] / [`PurchaseReturnRepository`] - returns
//! - [`VoucherRepository`] - multi-line sales and purchase vouchers
//! - [`CompanyRepository`] - customers and suppliers
//! - [`UserProfileRepository`] - dashboard users
//! - [`StockRepository`] - calculated stock and reconciliation
//! - [`ReportRepository`] - loads report inputs for a date range

pub mod company;
pub mod product;
pub mod purchase;
pub mod report;
pub mod returns;
pub mod sale;
pub mod stock;
pub mod user;
pub mod voucher;

pub use company::CompanyRepository;
pub use product::ProductRepository;
pub use purchase::PurchaseRepository;
pub use report::ReportRepository;
pub use returns::{PurchaseReturnRepository, SalesReturnRepository};
pub use sale::SaleRepository;
pub use stock::StockRepository;
pub use user::UserProfileRepository;
pub use voucher::VoucherRepository;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use stockline_core::stock::{net_deltas, StockDelta};
use stockline_core::Product;

use crate::error::{DbError, DbResult};

/// Column list matching [`Product`]'s `FromRow` layout.
pub(crate) const PRODUCT_COLUMNS: &str = "id, sku, name, category, description, unit, \
     opening_stock, stock, reorder_point, purchase_price_cents, sell_price_cents, \
     status, created_at, updated_at";

/// Adjusts `products.stock` by each delta, netted per product.
///
/// Must run on the same connection (transaction) as the row write that
/// produced the deltas. A delta against a missing product is an error,
/// which rolls the whole transaction back.
pub async fn apply_deltas(
    conn: &mut SqliteConnection,
    deltas: impl IntoIterator<Item = StockDelta>,
    now: DateTime<Utc>,
) -> DbResult<()> {
    for delta in net_deltas(deltas) {
        debug!(product_id = %delta.product_id, delta = delta.quantity, "Adjusting stock");

        let result = sqlx::query(
            "UPDATE products SET stock = stock + ?1, updated_at = ?2 WHERE id = ?3",
        )
        .bind(delta.quantity)
        .bind(now)
        .bind(&delta.product_id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &delta.product_id));
        }
    }
    Ok(())
}

/// Loads products by id on an open connection.
///
/// Unknown ids are simply absent from the map; callers turn that into
/// `ProductNotFound` through the core builders.
pub(crate) async fn load_products<'a>(
    conn: &mut SqliteConnection,
    ids: impl IntoIterator<Item = &'a str>,
) -> DbResult<HashMap<String, Product>> {
    let mut ids: Vec<&str> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!(
        "SELECT {} FROM products WHERE id IN ({})",
        PRODUCT_COLUMNS, placeholders
    );
    let mut query = sqlx::query_as::<_, Product>(&sql);
    for id in &ids {
        query = query.bind(*id);
    }
    let products = query.fetch_all(&mut *conn).await?;

    Ok(products.into_iter().map(|p| (p.id.clone(), p)).collect())
}

/// Loads one product or fails with `NotFound`.
pub(crate) async fn require_product(conn: &mut SqliteConnection, id: &str) -> DbResult<Product> {
    let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
    sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Product", id))
}

// =============================================================================
// Test Fixtures
// =============================================================================

#[cfg(test)]
pub(crate) mod test_support {
    use stockline_core::{AmountInput, Product, ProductInput};

    use crate::{Database, DbConfig};

    pub async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub fn product_input(sku: &str, opening: i64) -> ProductInput {
        ProductInput {
            sku: sku.to_string(),
            name: format!("Product {}", sku),
            category: "General".to_string(),
            description: None,
            unit: None,
            opening_stock: opening,
            reorder_point: 5,
            purchase_price: Some(AmountInput::Cents(400)),
            sell_price: Some(AmountInput::Cents(650)),
            status: None,
        }
    }

    pub async fn product(db: &Database, sku: &str, opening: i64) -> Product {
        db.products().create(&product_input(sku, opening)).await.unwrap()
    }

    pub async fn stock_of(db: &Database, id: &str) -> i64 {
        db.products().get_by_id(id).await.unwrap().unwrap().stock
    }
}
