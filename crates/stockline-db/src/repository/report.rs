//! # Report Repository
//!
//! Gathers the rows a report is computed from. The figures themselves are
//! computed in `stockline_core::report`.

use sqlx::SqlitePool;
use tracing::debug;

use stockline_core::report::{DateRange, ReportData};
use stockline_core::VoucherKind;

use super::{
    ProductRepository, PurchaseRepository, PurchaseReturnRepository, SaleRepository,
    SalesReturnRepository, VoucherRepository,
};
use crate::error::DbResult;

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// All products plus every transaction dated within `range`.
    pub async fn load(&self, range: &DateRange) -> DbResult<ReportData> {
        debug!(from = ?range.from, to = ?range.to, "Loading report data");

        let products = ProductRepository::new(self.pool.clone()).list_all().await?;
        let sales = SaleRepository::new(self.pool.clone()).list_range(range).await?;
        let purchases = PurchaseRepository::new(self.pool.clone())
            .list_range(range)
            .await?;
        let sales_returns = SalesReturnRepository::new(self.pool.clone())
            .list_range(range)
            .await?;
        let purchase_returns = PurchaseReturnRepository::new(self.pool.clone())
            .list_range(range)
            .await?;

        let mut vouchers = VoucherRepository::new(self.pool.clone(), VoucherKind::Sales)
            .list_range(range)
            .await?;
        vouchers.extend(
            VoucherRepository::new(self.pool.clone(), VoucherKind::Purchase)
                .list_range(range)
                .await?,
        );

        Ok(ReportData {
            products,
            sales,
            purchases,
            sales_returns,
            purchase_returns,
            vouchers,
        })
    }
}
