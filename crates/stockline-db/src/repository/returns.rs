//! # Return Repositories
//!
//! Sales returns (goods back from a customer, stock up) and purchase
//! returns (goods back to a supplier, stock down).
//!
//! A return may point at the original sale / purchase line. When it does,
//! the product must match, the quantity is capped by what is left to
//! return, and the default refund / credit uses the original price.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use stockline_core::picker::{Page, PageRequest};
use stockline_core::report::DateRange;
use stockline_core::stock::{delta_for_purchase_return, delta_for_sales_return};
use stockline_core::{
    check_returnable, new_id, CoreError, PurchaseReturn, PurchaseReturnInput, PurchaseStatus,
    SalesReturn, SalesReturnInput, ValidationError, MAX_PAGE_SIZE,
};

use super::purchase::{fetch_purchase, returned_quantity as purchase_returned};
use super::sale::{fetch_sale, returned_quantity as sale_returned};
use super::{apply_deltas, require_product};
use crate::error::{DbError, DbResult};

const SALES_RETURN_COLUMNS: &str =
    "id, sale_id, product_id, quantity, refund_cents, reason, return_date, created_at";

const PURCHASE_RETURN_COLUMNS: &str = "id, purchase_id, product_id, supplier_id, quantity, \
     credit_cents, reason, return_date, created_at";

fn product_mismatch() -> DbError {
    ValidationError::invalid("product", "does not match the original line").into()
}

// =============================================================================
// Sales Returns
// =============================================================================

#[derive(Debug, Clone)]
pub struct SalesReturnRepository {
    pool: SqlitePool,
}

impl SalesReturnRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SalesReturnRepository { pool }
    }

    pub async fn list(&self, request: PageRequest) -> DbResult<Page<SalesReturn>> {
        let request = request.clamped(MAX_PAGE_SIZE);
        debug!(page = request.page, "Listing sales returns");

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales_returns")
            .fetch_one(&self.pool)
            .await?;
        let sql = format!(
            "SELECT {} FROM sales_returns \
             ORDER BY return_date DESC, created_at DESC LIMIT ?1 OFFSET ?2",
            SALES_RETURN_COLUMNS
        );
        let items = sqlx::query_as::<_, SalesReturn>(&sql)
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

    pub async fn list_range(&self, range: &DateRange) -> DbResult<Vec<SalesReturn>> {
        let sql = format!(
            "SELECT {} FROM sales_returns \
             WHERE (?1 IS NULL OR return_date >= ?1) AND (?2 IS NULL OR return_date <= ?2) \
             ORDER BY return_date, created_at",
            SALES_RETURN_COLUMNS
        );
        Ok(sqlx::query_as::<_, SalesReturn>(&sql)
            .bind(range.from)
            .bind(range.to)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn get(&self, id: &str) -> DbResult<SalesReturn> {
        let sql = format!("SELECT {} FROM sales_returns WHERE id = ?1", SALES_RETURN_COLUMNS);
        sqlx::query_as::<_, SalesReturn>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Sales return", id))
    }

    /// Records a customer return and puts the goods back in stock.
    pub async fn insert(&self, input: &SalesReturnInput) -> DbResult<SalesReturn> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let product = require_product(&mut tx, &input.product_id).await?;
        let unit_price_cents = match input.sale_id.as_deref() {
            Some(sale_id) => {
                let sale = fetch_sale(&mut tx, sale_id).await?;
                if sale.product_id != product.id {
                    return Err(product_mismatch());
                }
                let returned = sale_returned(&mut tx, sale_id).await?;
                check_returnable(sale.quantity, returned, input.quantity)?;
                sale.unit_price_cents
            }
            None => product.sell_price_cents,
        };

        let ret = SalesReturn::from_input(new_id(), input, unit_price_cents, now.date_naive(), now)?;

        info!(
            id = %ret.id,
            product_id = %ret.product_id,
            quantity = ret.quantity,
            "Inserting sales return"
        );

        sqlx::query(
            r#"
            INSERT INTO sales_returns (
                id, sale_id, product_id, quantity, refund_cents, reason, return_date, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&ret.id)
        .bind(&ret.sale_id)
        .bind(&ret.product_id)
        .bind(ret.quantity)
        .bind(ret.refund_cents)
        .bind(&ret.reason)
        .bind(ret.return_date)
        .bind(ret.created_at)
        .execute(&mut *tx)
        .await?;
        apply_deltas(&mut tx, [delta_for_sales_return(&ret)], now).await?;

        tx.commit().await?;
        Ok(ret)
    }

    /// Deletes a return and issues the goods again.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();
        let ret = self.get(id).await?;
        let mut tx = self.pool.begin().await?;

        info!(id = %id, "Deleting sales return");

        let result = sqlx::query("DELETE FROM sales_returns WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sales return", id));
        }
        apply_deltas(&mut tx, [delta_for_sales_return(&ret).reversed()], now).await?;

        tx.commit().await?;
        Ok(())
    }
}

// =============================================================================
// Purchase Returns
// =============================================================================

#[derive(Debug, Clone)]
pub struct PurchaseReturnRepository {
    pool: SqlitePool,
}

impl PurchaseReturnRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseReturnRepository { pool }
    }

    pub async fn list(&self, request: PageRequest) -> DbResult<Page<PurchaseReturn>> {
        let request = request.clamped(MAX_PAGE_SIZE);
        debug!(page = request.page, "Listing purchase returns");

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM purchase_returns")
            .fetch_one(&self.pool)
            .await?;
        let sql = format!(
            "SELECT {} FROM purchase_returns \
             ORDER BY return_date DESC, created_at DESC LIMIT ?1 OFFSET ?2",
            PURCHASE_RETURN_COLUMNS
        );
        let items = sqlx::query_as::<_, PurchaseReturn>(&sql)
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

    pub async fn list_range(&self, range: &DateRange) -> DbResult<Vec<PurchaseReturn>> {
        let sql = format!(
            "SELECT {} FROM purchase_returns \
             WHERE (?1 IS NULL OR return_date >= ?1) AND (?2 IS NULL OR return_date <= ?2) \
             ORDER BY return_date, created_at",
            PURCHASE_RETURN_COLUMNS
        );
        Ok(sqlx::query_as::<_, PurchaseReturn>(&sql)
            .bind(range.from)
            .bind(range.to)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn get(&self, id: &str) -> DbResult<PurchaseReturn> {
        let sql = format!(
            "SELECT {} FROM purchase_returns WHERE id = ?1",
            PURCHASE_RETURN_COLUMNS
        );
        sqlx::query_as::<_, PurchaseReturn>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Purchase return", id))
    }

    /// Records goods sent back to a supplier and removes them from stock.
    ///
    /// Only received purchase lines can be returned against.
    pub async fn insert(&self, input: &PurchaseReturnInput) -> DbResult<PurchaseReturn> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let product = require_product(&mut tx, &input.product_id).await?;
        let mut input = input.clone();
        let unit_cost_cents = match input.purchase_id.as_deref() {
            Some(purchase_id) => {
                let purchase = fetch_purchase(&mut tx, purchase_id).await?;
                if purchase.product_id != product.id {
                    return Err(product_mismatch());
                }
                if purchase.status != PurchaseStatus::Received {
                    return Err(CoreError::InvalidPurchaseStatus {
                        purchase_id: purchase.id,
                        current_status: purchase.status.as_str().to_string(),
                        operation: "return".to_string(),
                    }
                    .into());
                }
                let returned = purchase_returned(&mut tx, purchase_id).await?;
                check_returnable(purchase.quantity, returned, input.quantity)?;
                if input.supplier_id.is_none() {
                    input.supplier_id = purchase.supplier_id.clone();
                }
                purchase.unit_cost_cents
            }
            None => product.purchase_price_cents,
        };

        let ret =
            PurchaseReturn::from_input(new_id(), &input, unit_cost_cents, now.date_naive(), now)?;

        info!(
            id = %ret.id,
            product_id = %ret.product_id,
            quantity = ret.quantity,
            "Inserting purchase return"
        );

        sqlx::query(
            r#"
            INSERT INTO purchase_returns (
                id, purchase_id, product_id, supplier_id, quantity, credit_cents,
                reason, return_date, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&ret.id)
        .bind(&ret.purchase_id)
        .bind(&ret.product_id)
        .bind(&ret.supplier_id)
        .bind(ret.quantity)
        .bind(ret.credit_cents)
        .bind(&ret.reason)
        .bind(ret.return_date)
        .bind(ret.created_at)
        .execute(&mut *tx)
        .await?;
        apply_deltas(&mut tx, [delta_for_purchase_return(&ret)], now).await?;

        tx.commit().await?;
        Ok(ret)
    }

    /// Deletes a return and takes the goods back into stock.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();
        let ret = self.get(id).await?;
        let mut tx = self.pool.begin().await?;

        info!(id = %id, "Deleting purchase return");

        let result = sqlx::query("DELETE FROM purchase_returns WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Purchase return", id));
        }
        apply_deltas(&mut tx, [delta_for_purchase_return(&ret).reversed()], now).await?;

        tx.commit().await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{db, product, stock_of};
    use stockline_core::{
        AmountInput, PurchaseLineInput, PurchaseOrderInput, SaleInput,
    };

    fn sale_input(product_id: &str, quantity: i64) -> SaleInput {
        SaleInput {
            reference: None,
            product_id: product_id.to_string(),
            customer_id: None,
            customer_name: None,
            quantity,
            unit_price: Some(AmountInput::Cents(500)),
            discount: None,
            sale_date: None,
            notes: None,
        }
    }

    fn sales_return(sale_id: Option<&str>, product_id: &str, quantity: i64) -> SalesReturnInput {
        SalesReturnInput {
            sale_id: sale_id.map(str::to_string),
            product_id: product_id.to_string(),
            quantity,
            refund: None,
            reason: Some("damaged".to_string()),
            return_date: None,
        }
    }

    fn purchase_return(
        purchase_id: Option<&str>,
        product_id: &str,
        quantity: i64,
    ) -> PurchaseReturnInput {
        PurchaseReturnInput {
            purchase_id: purchase_id.map(str::to_string),
            product_id: product_id.to_string(),
            supplier_id: None,
            quantity,
            credit: None,
            reason: None,
            return_date: None,
        }
    }

    async fn received_line(db: &crate::Database, product_id: &str, status: PurchaseStatus) -> String {
        let order = db
            .purchases()
            .insert_order(&PurchaseOrderInput {
                supplier_id: None,
                purchase_date: None,
                status: Some(status),
                notes: None,
                lines: vec![PurchaseLineInput {
                    product_id: product_id.to_string(),
                    quantity: 6,
                    unit_cost: Some(AmountInput::Cents(300)),
                }],
            })
            .await
            .unwrap();
        order.lines[0].id.clone()
    }

    #[tokio::test]
    async fn test_sales_return_against_sale() {
        let db = db().await;
        let p = product(&db, "A", 10).await;
        let sale = db.sales().insert(&sale_input(&p.id, 4)).await.unwrap();

        let ret = db
            .sales_returns()
            .insert(&sales_return(Some(&sale.id), &p.id, 3))
            .await
            .unwrap();
        assert_eq!(ret.refund_cents, 1_500);
        assert_eq!(stock_of(&db, &p.id).await, 9);

        let err = db
            .sales_returns()
            .insert(&sales_return(Some(&sale.id), &p.id, 2))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(_)));
        assert_eq!(stock_of(&db, &p.id).await, 9);

        db.sales_returns().delete(&ret.id).await.unwrap();
        assert_eq!(stock_of(&db, &p.id).await, 6);
    }

    #[tokio::test]
    async fn test_sales_return_without_sale_uses_sell_price() {
        let db = db().await;
        let p = product(&db, "A", 0).await;

        let ret = db
            .sales_returns()
            .insert(&sales_return(None, &p.id, 2))
            .await
            .unwrap();
        assert_eq!(ret.refund_cents, 1_300);
        assert_eq!(stock_of(&db, &p.id).await, 2);
    }

    #[tokio::test]
    async fn test_sales_return_product_must_match_sale() {
        let db = db().await;
        let a = product(&db, "A", 10).await;
        let b = product(&db, "B", 10).await;
        let sale = db.sales().insert(&sale_input(&a.id, 4)).await.unwrap();

        assert!(db
            .sales_returns()
            .insert(&sales_return(Some(&sale.id), &b.id, 1))
            .await
            .is_err());
        assert_eq!(stock_of(&db, &b.id).await, 10);
    }

    #[tokio::test]
    async fn test_purchase_return_against_received_line() {
        let db = db().await;
        let p = product(&db, "A", 0).await;
        let line = received_line(&db, &p.id, PurchaseStatus::Received).await;

        let ret = db
            .purchase_returns()
            .insert(&purchase_return(Some(&line), &p.id, 2))
            .await
            .unwrap();
        assert_eq!(ret.credit_cents, 600);
        assert_eq!(stock_of(&db, &p.id).await, 4);
        assert_eq!(db.purchases().returned_quantity(&line).await.unwrap(), 2);

        assert!(db
            .purchase_returns()
            .insert(&purchase_return(Some(&line), &p.id, 5))
            .await
            .is_err());

        db.purchase_returns().delete(&ret.id).await.unwrap();
        assert_eq!(stock_of(&db, &p.id).await, 6);
    }

    #[tokio::test]
    async fn test_purchase_return_requires_received() {
        let db = db().await;
        let p = product(&db, "A", 5).await;
        let line = received_line(&db, &p.id, PurchaseStatus::Pending).await;

        let err = db
            .purchase_returns()
            .insert(&purchase_return(Some(&line), &p.id, 1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidPurchaseStatus { .. })
        ));
        assert_eq!(stock_of(&db, &p.id).await, 5);
    }

    #[tokio::test]
    async fn test_list_and_range() {
        let db = db().await;
        let p = product(&db, "A", 10).await;
        db.sales_returns()
            .insert(&sales_return(None, &p.id, 1))
            .await
            .unwrap();
        db.purchase_returns()
            .insert(&purchase_return(None, &p.id, 1))
            .await
            .unwrap();

        assert_eq!(db.sales_returns().list(PageRequest::default()).await.unwrap().total, 1);
        assert_eq!(
            db.purchase_returns()
                .list_range(&DateRange::all())
                .await
                .unwrap()
                .len(),
            1
        );
        assert!(matches!(
            db.sales_returns().delete("missing").await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }
}
