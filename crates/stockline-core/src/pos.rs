//! Point-of-sale cart.
//!
//! The counter screen builds a [`Cart`] from scanned products, checks it
//! against calculated stock, then checks out into a posted sales voucher.
//! POS sales therefore obey the same stock rules as vouchers typed on the
//! dashboard. The one extra rule: checkout refuses a line that stock
//! cannot cover.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{AmountInput, Product, VoucherInput, VoucherLineInput};
use crate::validation;
use crate::MAX_LINE_ITEMS;

/// A cart line.
///
/// Price and names are frozen when the product is added, so later catalogue
/// edits do not change an open cart.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartItem {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartItem {
            product_id: product.id.clone(),
            sku: product.sku.clone(),
            name: product.name.clone(),
            unit_price_cents: product.sell_price_cents,
            quantity,
            added_at: Utc::now(),
        }
    }

    /// Checked for overflow when the line was added or resized.
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }
}

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by `product_id` (adding again increases quantity)
/// - Quantities are in `1..=MAX_ITEM_QUANTITY`
/// - At most `MAX_LINE_ITEMS` lines
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Cart {
    pub items: Vec<CartItem>,
    /// Cart-level discount in basis points.
    pub discount_bps: u32,
    /// Tax on the discounted subtotal, in basis points.
    pub tax_bps: u32,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

/// A cart line asking for more than is on hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockShortage {
    pub product_id: String,
    pub sku: String,
    pub available: i64,
    pub requested: i64,
}

impl From<StockShortage> for CoreError {
    fn from(s: StockShortage) -> Self {
        CoreError::InsufficientStock {
            sku: s.sku,
            available: s.available,
            requested: s.requested,
        }
    }
}

impl Cart {
    pub fn new() -> Self {
        Cart {
            items: Vec::new(),
            discount_bps: 0,
            tax_bps: 0,
            created_at: Utc::now(),
        }
    }

    /// Adds a product or increases its quantity.
    pub fn add_item(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        if !product.is_active() {
            return Err(CoreError::ProductInactive(product.sku.clone()));
        }
        validation::validate_quantity(quantity)?;
        let unit = Money::from_cents(product.sell_price_cents);

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product.id) {
            let new_qty = item.quantity + quantity;
            validation::validate_quantity(new_qty)?;
            unit.checked_multiply_quantity(new_qty)?;
            item.quantity = new_qty;
            return Ok(());
        }
        unit.checked_multiply_quantity(quantity)?;

        if self.items.len() >= MAX_LINE_ITEMS {
            return Err(CoreError::TooManyLines {
                max: MAX_LINE_ITEMS,
            });
        }

        self.items.push(CartItem::from_product(product, quantity));
        Ok(())
    }

    /// Sets a line's quantity; zero removes the line.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_item(product_id);
        }
        validation::validate_quantity(quantity)?;

        match self.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(item) => {
                Money::from_cents(item.unit_price_cents).checked_multiply_quantity(quantity)?;
                item.quantity = quantity;
                Ok(())
            }
            None => Err(CoreError::NotInCart(product_id.to_string())),
        }
    }

    pub fn remove_item(&mut self, product_id: &str) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.product_id != product_id);

        if self.items.len() == initial_len {
            Err(CoreError::NotInCart(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn set_discount_bps(&mut self, bps: u32) -> CoreResult<()> {
        validation::validate_rate_bps("discount", bps)?;
        self.discount_bps = bps;
        Ok(())
    }

    pub fn set_tax_bps(&mut self, bps: u32) -> CoreResult<()> {
        validation::validate_rate_bps("tax", bps)?;
        self.tax_bps = bps;
        Ok(())
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn subtotal(&self) -> Money {
        self.items.iter().map(CartItem::line_total).sum()
    }

    pub fn discount(&self) -> Money {
        self.subtotal().percentage_of(self.discount_bps)
    }

    pub fn tax(&self) -> Money {
        (self.subtotal() - self.discount()).percentage_of(self.tax_bps)
    }

    pub fn total(&self) -> Money {
        self.subtotal() - self.discount() + self.tax()
    }

    /// Lines whose quantity exceeds `available(product_id)`.
    ///
    /// Products the lookup does not know count as zero on hand.
    pub fn check_stock(&self, available: impl Fn(&str) -> Option<i64>) -> Vec<StockShortage> {
        self.items
            .iter()
            .filter_map(|item| {
                let on_hand = available(&item.product_id).unwrap_or(0);
                (item.quantity > on_hand).then(|| StockShortage {
                    product_id: item.product_id.clone(),
                    sku: item.sku.clone(),
                    available: on_hand,
                    requested: item.quantity,
                })
            })
            .collect()
    }

    /// Converts the cart into a posted sales voucher payload.
    pub fn to_voucher_input(
        &self,
        party_id: Option<String>,
        party_name: Option<String>,
        notes: Option<String>,
    ) -> CoreResult<VoucherInput> {
        if self.is_empty() {
            return Err(CoreError::EmptyDocument);
        }
        Ok(VoucherInput {
            voucher_number: None,
            party_id,
            party_name,
            voucher_date: None,
            discount: Some(AmountInput::from(self.discount())),
            tax_bps: self.tax_bps,
            notes,
            post: true,
            items: self
                .items
                .iter()
                .map(|item| VoucherLineInput {
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                    unit_price: Some(AmountInput::Cents(item.unit_price_cents)),
                })
                .collect(),
        })
    }
}

/// Cart totals for responses.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            item_count: cart.item_count(),
            total_quantity: cart.total_quantity(),
            subtotal_cents: cart.subtotal().cents(),
            discount_cents: cart.discount().cents(),
            tax_cents: cart.tax().cents(),
            total_cents: cart.total().cents(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CheckoutLine {
    pub product_id: String,
    pub quantity: i64,
}

/// A whole cart submitted in one request.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutLine>,
    #[serde(default)]
    pub discount_bps: u32,
    #[serde(default)]
    pub tax_bps: u32,
    #[serde(default)]
    pub party_id: Option<String>,
    #[serde(default)]
    pub party_name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CheckoutRequest {
    /// Rebuilds the cart against current catalogue prices.
    pub fn to_cart(&self, products: &HashMap<String, Product>) -> CoreResult<Cart> {
        if self.items.is_empty() {
            return Err(CoreError::EmptyDocument);
        }
        if self.items.len() > MAX_LINE_ITEMS {
            return Err(CoreError::TooManyLines {
                max: MAX_LINE_ITEMS,
            });
        }

        let mut cart = Cart::new();
        cart.set_discount_bps(self.discount_bps)?;
        cart.set_tax_bps(self.tax_bps)?;
        for line in &self.items {
            let product = products
                .get(&line.product_id)
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;
            cart.add_item(product, line.quantity)?;
        }
        Ok(cart)
    }
}
