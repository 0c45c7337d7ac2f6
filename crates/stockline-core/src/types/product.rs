use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::input::{cents_or, AmountInput};
use crate::error::CoreResult;
use crate::money::Money;
use crate::validation;

// =============================================================================
// Product Status
// =============================================================================

/// Catalogue status of a product.
///
/// Stock level flags ("Low Stock", "Out of Stock") are derived, see
/// [`crate::stock::StockStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ProductStatus {
    #[default]
    Active,
    Inactive,
}

// =============================================================================
// Product
// =============================================================================

/// A stocked product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier, unique.
    pub sku: String,

    /// Display name.
    pub name: String,

    /// Free-form category ("Beverages", "Hardware", ...).
    pub category: String,

    pub description: Option<String>,

    /// Unit of measure ("pcs", "kg", "box").
    pub unit: String,

    /// Quantity on hand when the product was registered.
    pub opening_stock: i64,

    /// Persisted stock column, maintained by every stock-affecting write.
    pub stock: i64,

    /// Below this level the product is flagged "Low Stock".
    pub reorder_point: i64,

    /// Purchase (cost) price in cents.
    pub purchase_price_cents: i64,

    /// Selling price in cents.
    pub sell_price_cents: i64,

    pub status: ProductStatus,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Builds a new product from dashboard input.
    ///
    /// The stored stock starts at the opening stock.
    pub fn from_input(id: String, input: &ProductInput, now: DateTime<Utc>) -> CoreResult<Self> {
        let fields = input.validate()?;

        Ok(Product {
            id,
            sku: input.sku.trim().to_string(),
            name: input.name.trim().to_string(),
            category: input.category.trim().to_string(),
            description: input.description.clone(),
            unit: fields.unit,
            opening_stock: input.opening_stock,
            stock: input.opening_stock,
            reorder_point: input.reorder_point,
            purchase_price_cents: fields.purchase_price_cents,
            sell_price_cents: fields.sell_price_cents,
            status: input.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies an edit from the dashboard.
    ///
    /// A changed opening stock shifts the stored stock by the same amount,
    /// so the ledger identity keeps holding.
    pub fn apply_input(&mut self, input: &ProductInput, now: DateTime<Utc>) -> CoreResult<()> {
        let fields = input.validate()?;

        self.stock += input.opening_stock - self.opening_stock;
        self.sku = input.sku.trim().to_string();
        self.name = input.name.trim().to_string();
        self.category = input.category.trim().to_string();
        self.description = input.description.clone();
        self.unit = fields.unit;
        self.opening_stock = input.opening_stock;
        self.reorder_point = input.reorder_point;
        self.purchase_price_cents = fields.purchase_price_cents;
        self.sell_price_cents = fields.sell_price_cents;
        if let Some(status) = input.status {
            self.status = status;
        }
        self.updated_at = now;
        Ok(())
    }

    #[inline]
    pub fn purchase_price(&self) -> Money {
        Money::from_cents(self.purchase_price_cents)
    }

    #[inline]
    pub fn sell_price(&self) -> Money {
        Money::from_cents(self.sell_price_cents)
    }

    /// Per-unit margin at current prices.
    pub fn unit_margin(&self) -> Money {
        self.sell_price() - self.purchase_price()
    }

    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }

    /// Case-insensitive match on name, sku or category.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&query)
            || self.sku.to_lowercase().contains(&query)
            || self.category.to_lowercase().contains(&query)
    }
}

// =============================================================================
// Product Input
// =============================================================================

/// Create / edit payload for a product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductInput {
    pub sku: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub opening_stock: i64,
    #[serde(default)]
    pub reorder_point: i64,
    #[serde(default)]
    pub purchase_price: Option<AmountInput>,
    #[serde(default)]
    pub sell_price: Option<AmountInput>,
    #[serde(default)]
    pub status: Option<ProductStatus>,
}

struct ResolvedProductFields {
    unit: String,
    purchase_price_cents: i64,
    sell_price_cents: i64,
}

impl ProductInput {
    fn validate(&self) -> CoreResult<ResolvedProductFields> {
        validation::validate_sku(&self.sku)?;
        validation::validate_product_name(&self.name)?;
        validation::validate_category(&self.category)?;
        validation::validate_non_negative("opening stock", self.opening_stock)?;
        validation::validate_non_negative("reorder point", self.reorder_point)?;

        let unit = self.unit.as_deref().unwrap_or("pcs").trim().to_string();
        validation::validate_unit(&unit)?;

        Ok(ResolvedProductFields {
            unit,
            purchase_price_cents: cents_or(self.purchase_price.as_ref(), 0, "purchase price")?,
            sell_price_cents: cents_or(self.sell_price.as_ref(), 0, "sell price")?,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
