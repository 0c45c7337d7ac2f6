//! CSV export of products, sales, purchases and the reconciliation report.

use std::collections::HashMap;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::stock::StockSnapshot;
use crate::types::{Product, Purchase, Sale};

/// Which CSV the dashboard asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Products,
    Sales,
    Purchases,
    Reconciliation,
}

impl ExportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportKind::Products => "products",
            ExportKind::Sales => "sales",
            ExportKind::Purchases => "purchases",
            ExportKind::Reconciliation => "reconciliation",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.csv", self.as_str())
    }
}

impl FromStr for ExportKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_end_matches(".csv") {
            "products" => Ok(ExportKind::Products),
            "sales" => Ok(ExportKind::Sales),
            "purchases" => Ok(ExportKind::Purchases),
            "reconciliation" => Ok(ExportKind::Reconciliation),
            _ => Err(ValidationError::NotAllowed {
                field: "export".to_string(),
                allowed: ["products", "sales", "purchases", "reconciliation"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }),
        }
    }
}

fn amount(cents: i64) -> String {
    Money::from_cents(cents).to_plain_string()
}

fn write_rows<R: Serialize>(rows: impl IntoIterator<Item = R>) -> CoreResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| CoreError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CoreError::Export(e.to_string()))
}

// =============================================================================
// Rows
// =============================================================================

#[derive(Serialize)]
struct ProductRow<'a> {
    sku: &'a str,
    name: &'a str,
    category: &'a str,
    unit: &'a str,
    stock: i64,
    calculated_stock: i64,
    reorder_point: i64,
    status: &'static str,
    purchase_price: String,
    sell_price: String,
}

#[derive(Serialize)]
struct SaleRow<'a> {
    date: String,
    reference: &'a str,
    sku: &'a str,
    product: &'a str,
    customer: &'a str,
    quantity: i64,
    unit_price: String,
    discount: String,
    total: String,
}

#[derive(Serialize)]
struct PurchaseRow<'a> {
    date: String,
    order_id: &'a str,
    sku: &'a str,
    product: &'a str,
    status: &'static str,
    quantity: i64,
    unit_cost: String,
    total: String,
}

#[derive(Serialize)]
struct ReconciliationRow<'a> {
    sku: &'a str,
    name: &'a str,
    stored: i64,
    calculated: i64,
    diff: i64,
    status: &'static str,
}

// =============================================================================
// Writers
// =============================================================================

/// Products with stored and calculated stock. Products without a snapshot
/// fall back to the stored column.
pub fn products_csv(products: &[Product], snapshots: &[StockSnapshot]) -> CoreResult<String> {
    let by_id: HashMap<&str, &StockSnapshot> =
        snapshots.iter().map(|s| (s.product_id.as_str(), s)).collect();

    write_rows(products.iter().map(|p| {
        let snapshot = by_id.get(p.id.as_str());
        let calculated = snapshot.map_or(p.stock, |s| s.calculated);
        ProductRow {
            sku: &p.sku,
            name: &p.name,
            category: &p.category,
            unit: &p.unit,
            stock: p.stock,
            calculated_stock: calculated,
            reorder_point: p.reorder_point,
            status: crate::stock::stock_status(calculated, p.reorder_point).label(),
            purchase_price: amount(p.purchase_price_cents),
            sell_price: amount(p.sell_price_cents),
        }
    }))
}

pub fn sales_csv(sales: &[Sale], products: &[Product]) -> CoreResult<String> {
    let by_id: HashMap<&str, &Product> = products.iter().map(|p| (p.id.as_str(), p)).collect();

    write_rows(sales.iter().map(|s| {
        let product = by_id.get(s.product_id.as_str());
        SaleRow {
            date: s.sale_date.to_string(),
            reference: s.reference.as_deref().unwrap_or(""),
            sku: product.map_or("", |p| p.sku.as_str()),
            product: product.map_or("", |p| p.name.as_str()),
            customer: s.customer_name.as_deref().unwrap_or(""),
            quantity: s.quantity,
            unit_price: amount(s.unit_price_cents),
            discount: amount(s.discount_cents),
            total: amount(s.total_cents),
        }
    }))
}

pub fn purchases_csv(purchases: &[Purchase], products: &[Product]) -> CoreResult<String> {
    let by_id: HashMap<&str, &Product> = products.iter().map(|p| (p.id.as_str(), p)).collect();

    write_rows(purchases.iter().map(|p| {
        let product = by_id.get(p.product_id.as_str());
        PurchaseRow {
            date: p.purchase_date.to_string(),
            order_id: &p.order_id,
            sku: product.map_or("", |p| p.sku.as_str()),
            product: product.map_or("", |p| p.name.as_str()),
            status: p.status.as_str(),
            quantity: p.quantity,
            unit_cost: amount(p.unit_cost_cents),
            total: amount(p.total_cents),
        }
    }))
}

pub fn reconciliation_csv(snapshots: &[StockSnapshot]) -> CoreResult<String> {
    write_rows(snapshots.iter().map(|s| ReconciliationRow {
        sku: &s.sku,
        name: &s.name,
        stored: s.stored,
        calculated: s.calculated,
        diff: s.diff,
        status: s.status.label(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::{day, product, sale};
    use crate::stock::StockLedger;

    #[test]
    fn test_export_kind_parse() {
        assert_eq!("products".parse::<ExportKind>().unwrap(), ExportKind::Products);
        assert_eq!("sales.csv".parse::<ExportKind>().unwrap(), ExportKind::Sales);
        assert!("orders".parse::<ExportKind>().is_err());
        assert_eq!(ExportKind::Reconciliation.file_name(), "reconciliation.csv");
    }

    #[test]
    fn test_products_csv() {
        let products = vec![product("a", 3, 5, 1_050, 2_000)];
        let snapshots: Vec<_> = products
            .iter()
            .map(|p| StockLedger::new().snapshot(p))
            .collect();

        let csv = products_csv(&products, &snapshots).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "sku,name,category,unit,stock,calculated_stock,reorder_point,status,purchase_price,sell_price"
        );
        assert_eq!(
            lines.next().unwrap(),
            "SKU-a,Product a,General,pcs,3,3,5,Low Stock,10.50,20.00"
        );
    }

    #[test]
    fn test_sales_csv_quotes_fields() {
        let products = vec![product("a", 3, 0, 100, 250)];
        let mut s = sale("a", 2, 250, day(4));
        s.customer_name = Some("Hill, Traders".to_string());

        let csv = sales_csv(&[s], &products).unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(row, "2026-03-04,,SKU-a,Product a,\"Hill, Traders\",2,2.50,0.00,5.00");
    }

    #[test]
    fn test_reconciliation_csv() {
        let mut p = product("a", 3, 0, 100, 250);
        p.stock = 5;
        let snapshot = StockLedger::new().snapshot(&p);
        let csv = reconciliation_csv(&[snapshot]).unwrap();
        assert_eq!(csv.lines().nth(1).unwrap(), "SKU-a,Product a,5,3,2,In Stock");
    }
}
