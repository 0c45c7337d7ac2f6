//! Inventory rules for Stockline, with no I/O.
//!
//! `stockline-db` persists what this crate computes and `apps/api` serves
//! it. Anything that decides a number (calculated stock, cart totals,
//! report figures) lives here so both layers agree on it.
//!
//! - [`types`]: products, parties, sales, purchases, returns, vouchers, users
//! - [`money`]: integer-cent [`Money`] and the single amount parser
//! - [`stock`]: calculated stock from movements, stock deltas
//! - [`picker`]: `Page`/`PageRequest` for every list route, and the
//!   [`picker::ProductPicker`] merge a client runs over pages and search hits
//! - [`pos`]: point-of-sale cart
//! - [`report`]: summaries, CSV export, plain-text invoices
//! - [`validation`]: field checks shared by every input type
//!
//! ```rust
//! use stockline_core::stock::{calculated_stock, StockMovements};
//!
//! let movements = StockMovements {
//!     opening: 10,
//!     purchased: 5,
//!     sales_returned: 1,
//!     sold: 4,
//!     voucher_sold: 2,
//!     ..Default::default()
//! };
//! assert_eq!(calculated_stock(&movements), 10);
//! ```

pub mod error;
pub mod money;
pub mod picker;
pub mod pos;
pub mod report;
pub mod stock;
pub mod types;
pub mod validation;

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

/// Rows per page when the caller does not ask.
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Larger page sizes are clamped to this.
pub const MAX_PAGE_SIZE: u32 = 200;

/// Per cart or voucher.
pub const MAX_LINE_ITEMS: usize = 100;

/// Upper bound on one line's quantity; catches an extra zero typed on entry.
pub const MAX_ITEM_QUANTITY: i64 = 100_000;

/// Largest price, discount or refund accepted on input (one billion in
/// major units). With [`MAX_ITEM_QUANTITY`] and [`MAX_LINE_ITEMS`] every
/// document total stays far inside `i64`.
pub const MAX_AMOUNT_CENTS: i64 = 100_000_000_000;

/// Fresh UUID v4 for a new row.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
