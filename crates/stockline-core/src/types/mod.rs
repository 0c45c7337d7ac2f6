//! # Domain Types
//!
//! Core domain types used throughout Stockline.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌───────────────┐      product_id       ┌─────────────────────────┐   │
//! │  │   Product     │◄──────────────────────│ Sale / Purchase         │   │
//! │  │ ───────────── │                       │ SalesReturn             │   │
//! │  │ sku           │                       │ PurchaseReturn          │   │
//! │  │ opening_stock │                       │ VoucherItem             │   │
//! │  │ stock         │                       └───────────┬─────────────┘   │
//! │  │ reorder_point │                                   │ party_id        │
//! │  └───────────────┘                       ┌───────────▼─────────────┐   │
//! │                                          │ Company (customer /     │   │
//! │  ┌───────────────┐                       │          supplier)      │   │
//! │  │ UserProfile   │ role-based access     └─────────────────────────┘   │
//! │  └───────────────┘                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every entity has a UUID `id`; products also carry a business key (`sku`)
//! and vouchers a document number. Rows serialize as camelCase for the
//! dashboard.

mod company;
mod input;
mod product;
mod transaction;
mod user;
mod voucher;

pub use company::{Company, CompanyInput, CompanyKind};
pub use input::AmountInput;
pub use product::{Product, ProductInput, ProductStatus};
pub use transaction::{
    check_returnable, group_purchase_orders, OrderStatus, Purchase, PurchaseLineInput, PurchaseOrder,
    PurchaseOrderInput, PurchaseReturn, PurchaseReturnInput, PurchaseStatus, PurchaseUpdate, Sale,
    SaleInput, SalesReturn, SalesReturnInput,
};
pub use user::{Permission, Role, UserInput, UserProfile, UserUpdate, MIN_PASSWORD_LEN};
pub use voucher::{
    format_voucher_number, Voucher, VoucherInput, VoucherItem, VoucherKind, VoucherLineInput,
    VoucherStatus, VoucherWithItems,
};
