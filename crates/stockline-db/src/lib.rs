//! SQLite storage for Stockline.
//!
//! [`Database`] owns the pool and hands out one repository per table
//! family. Writes that move goods (sales, purchases, returns, voucher
//! posts and cancels) run in a single transaction that also updates
//! `products.stock` through [`repository::apply_deltas`]. The stored
//! figure therefore tracks the calculated stock from
//! [`StockRepository`]; `reconcile` repairs rows touched by imports or
//! manual SQL.
//!
//! ```rust,ignore
//! use stockline_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("stockline.db")).await?;
//! let snapshots = db.stock().snapshots().await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::{
    CompanyRepository, ProductRepository, PurchaseRepository, PurchaseReturnRepository,
    ReportRepository, SaleRepository, SalesReturnRepository, StockRepository,
    UserProfileRepository, VoucherRepository,
};
