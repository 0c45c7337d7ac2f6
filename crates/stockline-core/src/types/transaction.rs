//! Single-product stock transactions: sales, purchases and returns.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::input::{cents_or, AmountInput};
use super::product::Product;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation;
use crate::{new_id, MAX_LINE_ITEMS};

fn lookup<'a>(products: &'a HashMap<String, Product>, id: &str) -> CoreResult<&'a Product> {
    products
        .get(id)
        .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))
}

/// `unit × quantity − discount`, with the discount capped at the gross.
fn line_total(unit_cents: i64, quantity: i64, discount_cents: i64) -> CoreResult<i64> {
    let gross = Money::from_cents(unit_cents)
        .checked_multiply_quantity(quantity)?
        .cents();
    if discount_cents > gross {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: gross,
        }
        .into());
    }
    Ok(gross - discount_cents)
}

// =============================================================================
// Sale
// =============================================================================

/// A single-product sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Sale {
    pub id: String,
    /// Invoice / receipt reference typed by the user.
    pub reference: Option<String>,
    pub product_id: String,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    #[ts(as = "String")]
    pub sale_date: NaiveDate,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Create / edit payload for a sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleInput {
    #[serde(default)]
    pub reference: Option<String>,
    pub product_id: String,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    pub quantity: i64,
    /// Defaults to the product's selling price.
    #[serde(default)]
    pub unit_price: Option<AmountInput>,
    #[serde(default)]
    pub discount: Option<AmountInput>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub sale_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Sale {
    pub fn from_input(
        id: String,
        input: &SaleInput,
        product: &Product,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> CoreResult<Self> {
        validation::validate_quantity(input.quantity)?;
        let unit_price_cents = cents_or(
            input.unit_price.as_ref(),
            product.sell_price_cents,
            "unit price",
        )?;
        let discount_cents = cents_or(input.discount.as_ref(), 0, "discount")?;
        let total_cents = line_total(unit_price_cents, input.quantity, discount_cents)?;

        Ok(Sale {
            id,
            reference: input.reference.clone(),
            product_id: product.id.clone(),
            customer_id: input.customer_id.clone(),
            customer_name: input.customer_name.clone(),
            quantity: input.quantity,
            unit_price_cents,
            discount_cents,
            total_cents,
            sale_date: input.sale_date.unwrap_or(today),
            notes: input.notes.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuilds this sale from an edit, keeping identity and creation time.
    pub fn apply_input(
        &mut self,
        input: &SaleInput,
        product: &Product,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        let rebuilt = Sale::from_input(self.id.clone(), input, product, self.sale_date, now)?;
        *self = Sale {
            created_at: self.created_at,
            ..rebuilt
        };
        Ok(())
    }

    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Purchase
// =============================================================================

/// Lifecycle of a purchase line. Only received purchases move stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PurchaseStatus {
    Pending,
    #[default]
    Received,
    Cancelled,
}

impl PurchaseStatus {
    pub fn affects_stock(&self) -> bool {
        matches!(self, PurchaseStatus::Received)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::Received => "received",
            PurchaseStatus::Cancelled => "cancelled",
        }
    }
}

/// One product line of a purchase order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Purchase {
    pub id: String,
    /// Shared by every line of the same purchase order.
    pub order_id: String,
    pub product_id: String,
    pub supplier_id: Option<String>,
    pub quantity: i64,
    pub unit_cost_cents: i64,
    pub total_cents: i64,
    pub status: PurchaseStatus,
    #[ts(as = "String")]
    pub purchase_date: NaiveDate,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PurchaseLineInput {
    pub product_id: String,
    pub quantity: i64,
    /// Defaults to the product's purchase price.
    #[serde(default)]
    pub unit_cost: Option<AmountInput>,
}

/// Payload creating a purchase order (one row per line, shared order id).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PurchaseOrderInput {
    #[serde(default)]
    pub supplier_id: Option<String>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub purchase_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<PurchaseStatus>,
    #[serde(default)]
    pub notes: Option<String>,
    pub lines: Vec<PurchaseLineInput>,
}

/// Edit payload for a single purchase line.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PurchaseUpdate {
    pub product_id: String,
    pub quantity: i64,
    #[serde(default)]
    pub unit_cost: Option<AmountInput>,
    #[serde(default)]
    pub supplier_id: Option<String>,
    #[serde(default)]
    pub status: Option<PurchaseStatus>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub purchase_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Purchase {
    /// Expands a purchase order payload into purchase rows.
    pub fn lines_from_order(
        order_id: &str,
        input: &PurchaseOrderInput,
        products: &HashMap<String, Product>,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> CoreResult<Vec<Purchase>> {
        if input.lines.is_empty() {
            return Err(CoreError::EmptyDocument);
        }
        if input.lines.len() > MAX_LINE_ITEMS {
            return Err(CoreError::TooManyLines {
                max: MAX_LINE_ITEMS,
            });
        }

        input
            .lines
            .iter()
            .map(|line| -> CoreResult<Purchase> {
                validation::validate_quantity(line.quantity)?;
                let product = lookup(products, &line.product_id)?;
                let unit_cost_cents = cents_or(
                    line.unit_cost.as_ref(),
                    product.purchase_price_cents,
                    "unit cost",
                )?;
                Ok(Purchase {
                    id: new_id(),
                    order_id: order_id.to_string(),
                    product_id: product.id.clone(),
                    supplier_id: input.supplier_id.clone(),
                    quantity: line.quantity,
                    unit_cost_cents,
                    total_cents: line_total(unit_cost_cents, line.quantity, 0)?,
                    status: input.status.unwrap_or_default(),
                    purchase_date: input.purchase_date.unwrap_or(today),
                    notes: input.notes.clone(),
                    created_at: now,
                    updated_at: now,
                })
            })
            .collect()
    }

    /// Applies an edit to this line.
    pub fn apply_update(
        &mut self,
        update: &PurchaseUpdate,
        product: &Product,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        validation::validate_quantity(update.quantity)?;
        let unit_cost_cents = cents_or(
            update.unit_cost.as_ref(),
            product.purchase_price_cents,
            "unit cost",
        )?;

        self.product_id = product.id.clone();
        self.quantity = update.quantity;
        self.unit_cost_cents = unit_cost_cents;
        self.total_cents = line_total(unit_cost_cents, update.quantity, 0)?;
        self.supplier_id = update.supplier_id.clone();
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(date) = update.purchase_date {
            self.purchase_date = date;
        }
        self.notes = update.notes.clone();
        self.updated_at = now;
        Ok(())
    }

    /// Marks a pending line as received.
    pub fn receive(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        if self.status != PurchaseStatus::Pending {
            return Err(CoreError::InvalidPurchaseStatus {
                purchase_id: self.id.clone(),
                current_status: self.status.as_str().to_string(),
                operation: "receive".to_string(),
            });
        }
        self.status = PurchaseStatus::Received;
        self.updated_at = now;
        Ok(())
    }
}

// =============================================================================
// Purchase Order (derived)
// =============================================================================

/// Summary status of a purchase order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum OrderStatus {
    Pending,
    Received,
    Cancelled,
    /// Lines disagree (some received, some not).
    Partial,
}

/// Purchases grouped by their shared order id. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PurchaseOrder {
    pub order_id: String,
    pub supplier_id: Option<String>,
    #[ts(as = "String")]
    pub order_date: NaiveDate,
    pub status: OrderStatus,
    pub total_quantity: i64,
    pub total_cents: i64,
    pub lines: Vec<Purchase>,
}

impl PurchaseOrder {
    fn from_lines(order_id: String, lines: Vec<Purchase>) -> Self {
        let first = &lines[0];
        let status = if lines.iter().all(|l| l.status == first.status) {
            match first.status {
                PurchaseStatus::Pending => OrderStatus::Pending,
                PurchaseStatus::Received => OrderStatus::Received,
                PurchaseStatus::Cancelled => OrderStatus::Cancelled,
            }
        } else {
            OrderStatus::Partial
        };

        PurchaseOrder {
            order_id,
            supplier_id: first.supplier_id.clone(),
            order_date: lines.iter().map(|l| l.purchase_date).min().unwrap_or(first.purchase_date),
            status,
            total_quantity: lines.iter().map(|l| l.quantity).sum(),
            total_cents: lines.iter().map(|l| l.total_cents).sum(),
            lines,
        }
    }
}

/// Groups purchase rows by `order_id`, keeping first-seen order.
pub fn group_purchase_orders(purchases: Vec<Purchase>) -> Vec<PurchaseOrder> {
    let mut order_ids: Vec<String> = Vec::new();
    let mut grouped: HashMap<String, Vec<Purchase>> = HashMap::new();

    for purchase in purchases {
        if !grouped.contains_key(&purchase.order_id) {
            order_ids.push(purchase.order_id.clone());
        }
        grouped
            .entry(purchase.order_id.clone())
            .or_default()
            .push(purchase);
    }

    order_ids
        .into_iter()
        .filter_map(|id| {
            let lines = grouped.remove(&id)?;
            Some(PurchaseOrder::from_lines(id, lines))
        })
        .collect()
}

// =============================================================================
// Returns
// =============================================================================

/// Goods coming back from a customer. Adds to stock.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalesReturn {
    pub id: String,
    pub sale_id: Option<String>,
    pub product_id: String,
    pub quantity: i64,
    pub refund_cents: i64,
    pub reason: Option<String>,
    #[ts(as = "String")]
    pub return_date: NaiveDate,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalesReturnInput {
    #[serde(default)]
    pub sale_id: Option<String>,
    pub product_id: String,
    pub quantity: i64,
    /// Defaults to quantity × the unit price the goods were sold at.
    #[serde(default)]
    pub refund: Option<AmountInput>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub return_date: Option<NaiveDate>,
}

impl SalesReturn {
    pub fn from_input(
        id: String,
        input: &SalesReturnInput,
        unit_price_cents: i64,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> CoreResult<Self> {
        validation::validate_quantity(input.quantity)?;
        let refund_cents = cents_or(
            input.refund.as_ref(),
            unit_price_cents * input.quantity,
            "refund",
        )?;
        Ok(SalesReturn {
            id,
            sale_id: input.sale_id.clone(),
            product_id: input.product_id.clone(),
            quantity: input.quantity,
            refund_cents,
            reason: input.reason.clone(),
            return_date: input.return_date.unwrap_or(today),
            created_at: now,
        })
    }
}

/// Goods sent back to a supplier. Removes from stock.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PurchaseReturn {
    pub id: String,
    pub purchase_id: Option<String>,
    pub product_id: String,
    pub supplier_id: Option<String>,
    pub quantity: i64,
    pub credit_cents: i64,
    pub reason: Option<String>,
    #[ts(as = "String")]
    pub return_date: NaiveDate,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PurchaseReturnInput {
    #[serde(default)]
    pub purchase_id: Option<String>,
    pub product_id: String,
    #[serde(default)]
    pub supplier_id: Option<String>,
    pub quantity: i64,
    /// Defaults to quantity × the unit cost the goods were bought at.
    #[serde(default)]
    pub credit: Option<AmountInput>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub return_date: Option<NaiveDate>,
}

impl PurchaseReturn {
    pub fn from_input(
        id: String,
        input: &PurchaseReturnInput,
        unit_cost_cents: i64,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> CoreResult<Self> {
        validation::validate_quantity(input.quantity)?;
        let credit_cents = cents_or(
            input.credit.as_ref(),
            unit_cost_cents * input.quantity,
            "credit",
        )?;
        Ok(PurchaseReturn {
            id,
            purchase_id: input.purchase_id.clone(),
            product_id: input.product_id.clone(),
            supplier_id: input.supplier_id.clone(),
            quantity: input.quantity,
            credit_cents,
            reason: input.reason.clone(),
            return_date: input.return_date.unwrap_or(today),
            created_at: now,
        })
    }
}

/// Rejects a return larger than what is left of the original line.
pub fn check_returnable(original: i64, already_returned: i64, requested: i64) -> CoreResult<()> {
    let remaining = (original - already_returned).max(0);
    if requested < 1 || requested > remaining {
        return Err(ValidationError::OutOfRange {
            field: "return quantity".to_string(),
            min: 1,
            max: remaining,
        }
        .into());
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ProductInput, ProductStatus};

    #[test]
    fn test_check_returnable() {
        assert!(check_returnable(5, 0, 5).is_ok());
        assert!(check_returnable(5, 2, 3).is_ok());
        assert!(check_returnable(5, 2, 4).is_err());
        assert!(check_returnable(5, 5, 1).is_err());
        assert!(check_returnable(5, 0, 0).is_err());
    }

    fn product(id: &str, sell: i64, cost: i64) -> Product {
        let input = ProductInput {
            sku: format!("SKU-{}", id),
            name: format!("Product {}", id),
            category: "General".to_string(),
            description: None,
            unit: None,
            opening_stock: 0,
            reorder_point: 0,
            purchase_price: Some(AmountInput::Cents(cost)),
            sell_price: Some(AmountInput::Cents(sell)),
            status: Some(ProductStatus::Active),
        };
        Product::from_input(id.to_string(), &input, Utc::now()).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    fn sale_input(quantity: i64) -> SaleInput {
        SaleInput {
            reference: Some("INV-1".to_string()),
            product_id: "p1".to_string(),
            customer_id: None,
            customer_name: Some("Walk-in".to_string()),
            quantity,
            unit_price: None,
            discount: None,
            sale_date: None,
            notes: None,
        }
    }

    #[test]
    fn test_sale_defaults_to_sell_price_and_today() {
        let p = product("p1", 250, 100);
        let sale = Sale::from_input("s1".to_string(), &sale_input(4), &p, today(), Utc::now())
            .unwrap();
        assert_eq!(sale.unit_price_cents, 250);
        assert_eq!(sale.total_cents, 1000);
        assert_eq!(sale.sale_date, today());
    }

    #[test]
    fn test_sale_discount_cannot_exceed_gross() {
        let p = product("p1", 250, 100);
        let mut input = sale_input(2);
        input.discount = Some(AmountInput::Text("$4.00".to_string()));
        assert!(Sale::from_input("s1".to_string(), &input, &p, today(), Utc::now()).is_err());

        input.discount = Some(AmountInput::Text("$1.00".to_string()));
        let sale = Sale::from_input("s1".to_string(), &input, &p, today(), Utc::now()).unwrap();
        assert_eq!(sale.total_cents, 400);
    }

    #[test]
    fn test_sale_rejects_amounts_that_would_overflow() {
        let p = product("p1", 250, 100);
        let mut input = sale_input(3);
        input.unit_price = Some(AmountInput::Cents(4_000_000_000_000_000_000));
        let err = Sale::from_input("s1".to_string(), &input, &p, today(), Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { .. })
        ));

        // A stored price that never went through input validation.
        let mut legacy = product("p1", 250, 100);
        legacy.sell_price_cents = 4_000_000_000_000_000_000;
        let err = Sale::from_input("s1".to_string(), &sale_input(3), &legacy, today(), Utc::now())
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_sale_edit_keeps_created_at() {
        let p = product("p1", 250, 100);
        let mut sale =
            Sale::from_input("s1".to_string(), &sale_input(1), &p, today(), Utc::now()).unwrap();
        let created = sale.created_at;
        sale.apply_input(&sale_input(3), &p, Utc::now()).unwrap();
        assert_eq!(sale.id, "s1");
        assert_eq!(sale.quantity, 3);
        assert_eq!(sale.created_at, created);
    }

    #[test]
    fn test_purchase_order_lines_share_order_id() {
        let mut products = HashMap::new();
        products.insert("p1".to_string(), product("p1", 250, 100));
        products.insert("p2".to_string(), product("p2", 900, 600));

        let input = PurchaseOrderInput {
            supplier_id: Some("c1".to_string()),
            purchase_date: None,
            status: None,
            notes: None,
            lines: vec![
                PurchaseLineInput {
                    product_id: "p1".to_string(),
                    quantity: 10,
                    unit_cost: None,
                },
                PurchaseLineInput {
                    product_id: "p2".to_string(),
                    quantity: 2,
                    unit_cost: Some(AmountInput::Text("5.50".to_string())),
                },
            ],
        };

        let lines = Purchase::lines_from_order("po-1", &input, &products, today(), Utc::now())
            .unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.order_id == "po-1"));
        assert_eq!(lines[0].total_cents, 1000);
        assert_eq!(lines[1].unit_cost_cents, 550);
        assert_eq!(lines[0].status, PurchaseStatus::Received);
    }

    #[test]
    fn test_purchase_order_unknown_product() {
        let products = HashMap::new();
        let input = PurchaseOrderInput {
            supplier_id: None,
            purchase_date: None,
            status: None,
            notes: None,
            lines: vec![PurchaseLineInput {
                product_id: "missing".to_string(),
                quantity: 1,
                unit_cost: None,
            }],
        };
        let err = Purchase::lines_from_order("po-1", &input, &products, today(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, CoreError::ProductNotFound(_)));
    }

    #[test]
    fn test_receive_only_from_pending() {
        let mut products = HashMap::new();
        products.insert("p1".to_string(), product("p1", 250, 100));
        let input = PurchaseOrderInput {
            supplier_id: None,
            purchase_date: None,
            status: Some(PurchaseStatus::Pending),
            notes: None,
            lines: vec![PurchaseLineInput {
                product_id: "p1".to_string(),
                quantity: 1,
                unit_cost: None,
            }],
        };
        let mut line = Purchase::lines_from_order("po-1", &input, &products, today(), Utc::now())
            .unwrap()
            .remove(0);

        line.receive(Utc::now()).unwrap();
        assert_eq!(line.status, PurchaseStatus::Received);
        assert!(line.receive(Utc::now()).is_err());
    }

    #[test]
    fn test_group_purchase_orders() {
        let mut products = HashMap::new();
        products.insert("p1".to_string(), product("p1", 250, 100));
        let line = |order: &str, qty: i64, status: PurchaseStatus| {
            let input = PurchaseOrderInput {
                supplier_id: None,
                purchase_date: None,
                status: Some(status),
                notes: None,
                lines: vec![PurchaseLineInput {
                    product_id: "p1".to_string(),
                    quantity: qty,
                    unit_cost: None,
                }],
            };
            Purchase::lines_from_order(order, &input, &products, today(), Utc::now())
                .unwrap()
                .remove(0)
        };

        let orders = group_purchase_orders(vec![
            line("b", 1, PurchaseStatus::Received),
            line("a", 2, PurchaseStatus::Pending),
            line("b", 3, PurchaseStatus::Received),
            line("a", 4, PurchaseStatus::Received),
        ]);

        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].order_id, "b");
        assert_eq!(orders[0].total_quantity, 4);
        assert_eq!(orders[0].status, OrderStatus::Received);
        assert_eq!(orders[1].order_id, "a");
        assert_eq!(orders[1].total_cents, 600);
        assert_eq!(orders[1].status, OrderStatus::Partial);
    }

    #[test]
    fn test_return_defaults() {
        let input = SalesReturnInput {
            sale_id: None,
            product_id: "p1".to_string(),
            quantity: 3,
            refund: None,
            reason: Some("damaged".to_string()),
            return_date: None,
        };
        let ret = SalesReturn::from_input("r1".to_string(), &input, 250, today(), Utc::now())
            .unwrap();
        assert_eq!(ret.refund_cents, 750);

        let input = PurchaseReturnInput {
            purchase_id: None,
            product_id: "p1".to_string(),
            supplier_id: None,
            quantity: 2,
            credit: Some(AmountInput::Text("Rs. 150".to_string())),
            reason: None,
            return_date: None,
        };
        let ret = PurchaseReturn::from_input("r2".to_string(), &input, 100, today(), Utc::now())
            .unwrap();
        assert_eq!(ret.credit_cents, 15_000);
    }
}
