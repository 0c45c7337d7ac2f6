//! # Stock Derivation
//!
//! The one place that knows how transactions move stock.
//!
//! ## Ledger Identity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   calculated = opening                                                  │
//! │              + purchased          (received purchases)                  │
//! │              + voucher_purchased  (posted purchase-voucher items)       │
//! │              + sales_returned                                           │
//! │              − sold                                                     │
//! │              − voucher_sold       (posted sales-voucher items)          │
//! │              − purchase_returned                                        │
//! │                                                                         │
//! │   diff = stored (products.stock) − calculated                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The persisted `stock` column is kept in step by applying a
//! [`StockDelta`] for every written row. [`calculated_stock`] recomputes
//! the same number from history, so a non-zero diff means the column
//! drifted and can be reconciled.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{
    Product, Purchase, PurchaseReturn, Sale, SalesReturn, VoucherKind, VoucherWithItems,
};

// =============================================================================
// Movements
// =============================================================================

/// Movement totals for one product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockMovements {
    pub opening: i64,
    pub purchased: i64,
    pub voucher_purchased: i64,
    pub sales_returned: i64,
    pub sold: i64,
    pub voucher_sold: i64,
    pub purchase_returned: i64,
}

impl StockMovements {
    /// Stock-increasing movements, excluding opening stock.
    pub fn receipts(&self) -> i64 {
        self.purchased + self.voucher_purchased + self.sales_returned
    }

    /// Stock-decreasing movements.
    pub fn issuances(&self) -> i64 {
        self.sold + self.voucher_sold + self.purchase_returned
    }
}

/// Recomputes stock from movement totals.
pub fn calculated_stock(movements: &StockMovements) -> i64 {
    movements.opening + movements.receipts() - movements.issuances()
}

// =============================================================================
// Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

impl StockStatus {
    pub fn label(&self) -> &'static str {
        match self {
            StockStatus::InStock => "In Stock",
            StockStatus::LowStock => "Low Stock",
            StockStatus::OutOfStock => "Out of Stock",
        }
    }
}

/// Out of stock at zero or below; low when strictly under the reorder point.
///
/// ```rust
/// use stockline_core::stock::{stock_status, StockStatus};
///
/// assert_eq!(stock_status(0, 5), StockStatus::OutOfStock);
/// assert_eq!(stock_status(4, 5), StockStatus::LowStock);
/// assert_eq!(stock_status(5, 5), StockStatus::InStock);
/// ```
pub fn stock_status(stock: i64, reorder_point: i64) -> StockStatus {
    if stock <= 0 {
        StockStatus::OutOfStock
    } else if stock < reorder_point {
        StockStatus::LowStock
    } else {
        StockStatus::InStock
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// Stored versus calculated stock for one product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockSnapshot {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub stored: i64,
    pub calculated: i64,
    /// `stored − calculated`.
    pub diff: i64,
    pub reorder_point: i64,
    /// Evaluated on the calculated value.
    pub status: StockStatus,
    pub movements: StockMovements,
}

impl StockSnapshot {
    /// `movements.opening` is taken from the product.
    pub fn new(product: &Product, movements: StockMovements) -> Self {
        let movements = StockMovements {
            opening: product.opening_stock,
            ..movements
        };
        let calculated = calculated_stock(&movements);
        StockSnapshot {
            product_id: product.id.clone(),
            sku: product.sku.clone(),
            name: product.name.clone(),
            stored: product.stock,
            calculated,
            diff: product.stock - calculated,
            reorder_point: product.reorder_point,
            status: stock_status(calculated, product.reorder_point),
            movements,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.diff == 0
    }
}

// =============================================================================
// Deltas
// =============================================================================

/// Signed effect of one row on a product's stored stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockDelta {
    pub product_id: String,
    pub quantity: i64,
}

impl StockDelta {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        StockDelta {
            product_id: product_id.into(),
            quantity,
        }
    }

    /// The delta that undoes this one.
    pub fn reversed(&self) -> Self {
        StockDelta::new(self.product_id.clone(), -self.quantity)
    }
}

pub fn delta_for_sale(sale: &Sale) -> StockDelta {
    StockDelta::new(&sale.product_id, -sale.quantity)
}

/// `None` unless the purchase is received.
pub fn delta_for_purchase(purchase: &Purchase) -> Option<StockDelta> {
    purchase
        .status
        .affects_stock()
        .then(|| StockDelta::new(&purchase.product_id, purchase.quantity))
}

pub fn delta_for_sales_return(ret: &SalesReturn) -> StockDelta {
    StockDelta::new(&ret.product_id, ret.quantity)
}

pub fn delta_for_purchase_return(ret: &PurchaseReturn) -> StockDelta {
    StockDelta::new(&ret.product_id, -ret.quantity)
}

/// One delta per item; empty unless the voucher is posted.
pub fn deltas_for_voucher(voucher: &VoucherWithItems) -> Vec<StockDelta> {
    if !voucher.voucher.status.affects_stock() {
        return Vec::new();
    }
    let sign = match voucher.voucher.kind {
        VoucherKind::Sales => -1,
        VoucherKind::Purchase => 1,
    };
    voucher
        .items
        .iter()
        .map(|item| StockDelta::new(&item.product_id, sign * item.quantity))
        .collect()
}

/// Sums deltas per product in first-seen order, dropping zero nets.
pub fn net_deltas(deltas: impl IntoIterator<Item = StockDelta>) -> Vec<StockDelta> {
    let mut order: Vec<String> = Vec::new();
    let mut totals: HashMap<String, i64> = HashMap::new();
    for delta in deltas {
        let total = totals.entry(delta.product_id.clone()).or_insert_with(|| {
            order.push(delta.product_id.clone());
            0
        });
        *total += delta.quantity;
    }
    order
        .into_iter()
        .filter_map(|product_id| {
            let quantity = totals.get(&product_id).copied().unwrap_or(0);
            (quantity != 0).then(|| StockDelta::new(product_id, quantity))
        })
        .collect()
}

// =============================================================================
// Ledger
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementKind {
    Purchase,
    VoucherPurchase,
    SalesReturn,
    Sale,
    VoucherSale,
    PurchaseReturn,
}

/// Movement totals for many products, accumulated from transaction rows.
#[derive(Debug, Clone, Default)]
pub struct StockLedger {
    totals: HashMap<String, StockMovements>,
}

impl StockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a ledger from in-memory rows, honouring status rules.
    pub fn from_transactions(
        sales: &[Sale],
        purchases: &[Purchase],
        sales_returns: &[SalesReturn],
        purchase_returns: &[PurchaseReturn],
        vouchers: &[VoucherWithItems],
    ) -> Self {
        let mut ledger = StockLedger::new();
        for sale in sales {
            ledger.record(&sale.product_id, MovementKind::Sale, sale.quantity);
        }
        for purchase in purchases.iter().filter(|p| p.status.affects_stock()) {
            ledger.record(&purchase.product_id, MovementKind::Purchase, purchase.quantity);
        }
        for ret in sales_returns {
            ledger.record(&ret.product_id, MovementKind::SalesReturn, ret.quantity);
        }
        for ret in purchase_returns {
            ledger.record(&ret.product_id, MovementKind::PurchaseReturn, ret.quantity);
        }
        for voucher in vouchers
            .iter()
            .filter(|v| v.voucher.status.affects_stock())
        {
            let kind = match voucher.voucher.kind {
                VoucherKind::Sales => MovementKind::VoucherSale,
                VoucherKind::Purchase => MovementKind::VoucherPurchase,
            };
            for item in &voucher.items {
                ledger.record(&item.product_id, kind, item.quantity);
            }
        }
        ledger
    }

    pub fn record(&mut self, product_id: &str, kind: MovementKind, quantity: i64) {
        let totals = self.totals.entry(product_id.to_string()).or_default();
        let slot = match kind {
            MovementKind::Purchase => &mut totals.purchased,
            MovementKind::VoucherPurchase => &mut totals.voucher_purchased,
            MovementKind::SalesReturn => &mut totals.sales_returned,
            MovementKind::Sale => &mut totals.sold,
            MovementKind::VoucherSale => &mut totals.voucher_sold,
            MovementKind::PurchaseReturn => &mut totals.purchase_returned,
        };
        *slot += quantity;
    }

    /// Totals for a product; all-zero when it never moved.
    pub fn movements(&self, product_id: &str, opening: i64) -> StockMovements {
        StockMovements {
            opening,
            ..self.totals.get(product_id).copied().unwrap_or_default()
        }
    }

    pub fn snapshot(&self, product: &Product) -> StockSnapshot {
        StockSnapshot::new(product, self.movements(&product.id, product.opening_stock))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        AmountInput, ProductInput, PurchaseStatus, Voucher, VoucherItem, VoucherStatus,
    };
    use chrono::{NaiveDate, Utc};

    fn product(opening: i64, reorder: i64) -> Product {
        let input = ProductInput {
            sku: "TEA-250".to_string(),
            name: "Green Tea".to_string(),
            category: "Beverages".to_string(),
            description: None,
            unit: None,
            opening_stock: opening,
            reorder_point: reorder,
            purchase_price: Some(AmountInput::Cents(100)),
            sell_price: Some(AmountInput::Cents(250)),
            status: None,
        };
        Product::from_input("p1".to_string(), &input, Utc::now()).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    fn sale(qty: i64) -> Sale {
        Sale {
            id: crate::new_id(),
            reference: None,
            product_id: "p1".to_string(),
            customer_id: None,
            customer_name: None,
            quantity: qty,
            unit_price_cents: 250,
            discount_cents: 0,
            total_cents: 250 * qty,
            sale_date: date(),
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn purchase(qty: i64, status: PurchaseStatus) -> Purchase {
        Purchase {
            id: crate::new_id(),
            order_id: "po-1".to_string(),
            product_id: "p1".to_string(),
            supplier_id: None,
            quantity: qty,
            unit_cost_cents: 100,
            total_cents: 100 * qty,
            status,
            purchase_date: date(),
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn voucher(kind: VoucherKind, status: VoucherStatus, qty: i64) -> VoucherWithItems {
        VoucherWithItems {
            voucher: Voucher {
                id: "v1".to_string(),
                kind,
                voucher_number: "SV-1".to_string(),
                party_id: None,
                party_name: None,
                voucher_date: date(),
                status,
                subtotal_cents: 0,
                discount_cents: 0,
                tax_cents: 0,
                total_cents: 0,
                notes: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            items: vec![VoucherItem {
                id: "i1".to_string(),
                voucher_id: "v1".to_string(),
                product_id: "p1".to_string(),
                quantity: qty,
                unit_price_cents: 0,
                line_total_cents: 0,
            }],
        }
    }

    #[test]
    fn test_calculated_stock_formula() {
        // opening + purchases + returns − sales − voucher sales
        let movements = StockMovements {
            opening: 20,
            purchased: 10,
            sales_returned: 2,
            sold: 7,
            voucher_sold: 5,
            ..Default::default()
        };
        assert_eq!(calculated_stock(&movements), 20);

        let movements = StockMovements {
            voucher_purchased: 4,
            purchase_returned: 3,
            ..movements
        };
        assert_eq!(movements.receipts(), 16);
        assert_eq!(movements.issuances(), 15);
        assert_eq!(calculated_stock(&movements), 21);
    }

    #[test]
    fn test_stock_status_boundaries() {
        assert_eq!(stock_status(-3, 5), StockStatus::OutOfStock);
        assert_eq!(stock_status(0, 0), StockStatus::OutOfStock);
        assert_eq!(stock_status(1, 5), StockStatus::LowStock);
        assert_eq!(stock_status(5, 5), StockStatus::InStock);
        assert_eq!(stock_status(1, 0), StockStatus::InStock);
        assert_eq!(StockStatus::LowStock.label(), "Low Stock");
    }

    #[test]
    fn test_ledger_honours_status_rules() {
        let ledger = StockLedger::from_transactions(
            &[sale(3), sale(2)],
            &[
                purchase(10, PurchaseStatus::Received),
                purchase(50, PurchaseStatus::Pending),
                purchase(70, PurchaseStatus::Cancelled),
            ],
            &[],
            &[],
            &[
                voucher(VoucherKind::Sales, VoucherStatus::Posted, 4),
                voucher(VoucherKind::Sales, VoucherStatus::Draft, 100),
                voucher(VoucherKind::Purchase, VoucherStatus::Posted, 6),
                voucher(VoucherKind::Purchase, VoucherStatus::Cancelled, 100),
            ],
        );

        let movements = ledger.movements("p1", 8);
        assert_eq!(movements.sold, 5);
        assert_eq!(movements.purchased, 10);
        assert_eq!(movements.voucher_sold, 4);
        assert_eq!(movements.voucher_purchased, 6);
        assert_eq!(calculated_stock(&movements), 8 + 10 + 6 - 5 - 4);

        assert_eq!(ledger.movements("unknown", 3), StockMovements {
            opening: 3,
            ..Default::default()
        });
    }

    #[test]
    fn test_snapshot_reports_diff() {
        let mut p = product(10, 5);
        let mut ledger = StockLedger::new();
        ledger.record("p1", MovementKind::Sale, 6);

        p.stock = 4;
        let snap = ledger.snapshot(&p);
        assert_eq!(snap.calculated, 4);
        assert!(snap.is_consistent());
        assert_eq!(snap.status, StockStatus::LowStock);

        p.stock = 9;
        let snap = ledger.snapshot(&p);
        assert_eq!(snap.diff, 5);
        assert!(!snap.is_consistent());
    }

    #[test]
    fn test_deltas() {
        assert_eq!(delta_for_sale(&sale(3)), StockDelta::new("p1", -3));
        assert_eq!(
            delta_for_purchase(&purchase(4, PurchaseStatus::Received)),
            Some(StockDelta::new("p1", 4))
        );
        assert_eq!(delta_for_purchase(&purchase(4, PurchaseStatus::Pending)), None);

        let posted = voucher(VoucherKind::Sales, VoucherStatus::Posted, 2);
        assert_eq!(deltas_for_voucher(&posted), vec![StockDelta::new("p1", -2)]);
        let draft = voucher(VoucherKind::Purchase, VoucherStatus::Draft, 2);
        assert!(deltas_for_voucher(&draft).is_empty());

        assert_eq!(StockDelta::new("p1", 5).reversed(), StockDelta::new("p1", -5));
    }

    #[test]
    fn test_net_deltas_merges_and_drops_zero() {
        let net = net_deltas(vec![
            StockDelta::new("b", 3),
            StockDelta::new("a", -2),
            StockDelta::new("b", -3),
            StockDelta::new("a", 7),
            StockDelta::new("c", 1),
        ]);
        assert_eq!(net, vec![StockDelta::new("a", 5), StockDelta::new("c", 1)]);
    }
}
