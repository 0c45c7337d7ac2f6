//! Sales and purchase vouchers: multi-line documents under one number.
//!
//! Both kinds share a shape and live in sibling tables. A voucher moves
//! stock only while it is posted.

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

// =============================================================================
// Kind & Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum VoucherKind {
    /// Goods leave stock.
    Sales,
    /// Goods enter stock.
    Purchase,
}

impl VoucherKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoucherKind::Sales => "sales",
            VoucherKind::Purchase => "purchase",
        }
    }

    /// Document number prefix.
    pub fn prefix(&self) -> &'static str {
        match self {
            VoucherKind::Sales => "SV",
            VoucherKind::Purchase => "PV",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            VoucherKind::Sales => "sales_vouchers",
            VoucherKind::Purchase => "purchase_vouchers",
        }
    }

    pub fn items_table(&self) -> &'static str {
        match self {
            VoucherKind::Sales => "sales_voucher_items",
            VoucherKind::Purchase => "purchase_voucher_items",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum VoucherStatus {
    #[default]
    Draft,
    Posted,
    Cancelled,
}

impl VoucherStatus {
    pub fn affects_stock(&self) -> bool {
        matches!(self, VoucherStatus::Posted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VoucherStatus::Draft => "draft",
            VoucherStatus::Posted => "posted",
            VoucherStatus::Cancelled => "cancelled",
        }
    }
}

/// Builds a document number like `SV-20260314-0007`.
///
/// ```rust
/// use chrono::NaiveDate;
/// use stockline_core::{format_voucher_number, VoucherKind};
///
/// let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
/// assert_eq!(format_voucher_number(VoucherKind::Sales, date, 7), "SV-20260314-0007");
/// ```
pub fn format_voucher_number(kind: VoucherKind, date: NaiveDate, seq: u32) -> String {
    format!("{}-{}-{:04}", kind.prefix(), date.format("%Y%m%d"), seq)
}

// =============================================================================
// Voucher
// =============================================================================

/// Voucher header.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Voucher {
    pub id: String,
    pub kind: VoucherKind,
    pub voucher_number: String,
    /// Customer (sales) or supplier (purchase) company.
    pub party_id: Option<String>,
    /// Free-text party name for walk-in customers.
    pub party_name: Option<String>,
    #[ts(as = "String")]
    pub voucher_date: NaiveDate,
    pub status: VoucherStatus,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Voucher {
    fn transition(
        &mut self,
        allowed_from: &[VoucherStatus],
        to: VoucherStatus,
        operation: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        if !allowed_from.contains(&self.status) {
            return Err(CoreError::InvalidVoucherStatus {
                voucher_number: self.voucher_number.clone(),
                current_status: self.status.as_str().to_string(),
                operation: operation.to_string(),
            });
        }
        self.status = to;
        self.updated_at = now;
        Ok(())
    }

    /// Draft → posted.
    pub fn post(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        self.transition(&[VoucherStatus::Draft], VoucherStatus::Posted, "post", now)
    }

    /// Draft or posted → cancelled.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        self.transition(
            &[VoucherStatus::Draft, VoucherStatus::Posted],
            VoucherStatus::Cancelled,
            "cancel",
            now,
        )
    }

    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// One product line of a voucher.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct VoucherItem {
    pub id: String,
    pub voucher_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct VoucherWithItems {
    #[serde(flatten)]
    pub voucher: Voucher,
    pub items: Vec<VoucherItem>,
}

// =============================================================================
// Input
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct VoucherLineInput {
    pub product_id: String,
    pub quantity: i64,
    /// Defaults to the product's sell price (sales) or purchase price.
    #[serde(default)]
    pub unit_price: Option<AmountInput>,
}

/// Payload creating a voucher.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct VoucherInput {
    /// Generated when absent.
    #[serde(default)]
    pub voucher_number: Option<String>,
    #[serde(default)]
    pub party_id: Option<String>,
    #[serde(default)]
    pub party_name: Option<String>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub voucher_date: Option<NaiveDate>,
    #[serde(default)]
    pub discount: Option<AmountInput>,
    #[serde(default)]
    pub tax_bps: u32,
    #[serde(default)]
    pub notes: Option<String>,
    /// Post immediately instead of saving a draft.
    #[serde(default)]
    pub post: bool,
    pub items: Vec<VoucherLineInput>,
}

impl VoucherInput {
    /// Validates the typed number, if any.
    pub fn requested_number(&self) -> CoreResult<Option<String>> {
        match self.voucher_number.as_deref().map(str::trim) {
            Some(number) if !number.is_empty() => {
                validation::validate_voucher_number(number)?;
                Ok(Some(number.to_string()))
            }
            _ => Ok(None),
        }
    }
}

impl VoucherWithItems {
    /// Builds a voucher with priced lines and totals.
    ///
    /// `subtotal = Σ line totals`, `tax = (subtotal − discount) × tax_bps`,
    /// `total = subtotal − discount + tax`.
    pub fn build(
        kind: VoucherKind,
        voucher_number: String,
        input: &VoucherInput,
        products: &HashMap<String, Product>,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> CoreResult<Self> {
        if input.items.is_empty() {
            return Err(CoreError::EmptyDocument);
        }
        if input.items.len() > MAX_LINE_ITEMS {
            return Err(CoreError::TooManyLines {
                max: MAX_LINE_ITEMS,
            });
        }
        validation::validate_rate_bps("tax", input.tax_bps)?;

        let voucher_id = new_id();
        let items = input
            .items
            .iter()
            .map(|line| -> CoreResult<VoucherItem> {
                validation::validate_quantity(line.quantity)?;
                let product = products
                    .get(&line.product_id)
                    .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;
                let default_price = match kind {
                    VoucherKind::Sales => product.sell_price_cents,
                    VoucherKind::Purchase => product.purchase_price_cents,
                };
                let unit_price_cents = cents_or(line.unit_price.as_ref(), default_price, "unit price")?;
                Ok(VoucherItem {
                    id: new_id(),
                    voucher_id: voucher_id.clone(),
                    product_id: product.id.clone(),
                    quantity: line.quantity,
                    unit_price_cents,
                    line_total_cents: Money::from_cents(unit_price_cents)
                        .checked_multiply_quantity(line.quantity)?
                        .cents(),
                })
            })
            .collect::<CoreResult<Vec<_>>>()?;

        let subtotal: Money = items
            .iter()
            .map(|item| Money::from_cents(item.line_total_cents))
            .sum();
        let discount = Money::from_cents(cents_or(input.discount.as_ref(), 0, "discount")?);
        if discount > subtotal {
            return Err(ValidationError::OutOfRange {
                field: "discount".to_string(),
                min: 0,
                max: subtotal.cents(),
            }
            .into());
        }
        let taxable = subtotal - discount;
        let tax = taxable.percentage_of(input.tax_bps);

        let status = if input.post {
            VoucherStatus::Posted
        } else {
            VoucherStatus::Draft
        };

        Ok(VoucherWithItems {
            voucher: Voucher {
                id: voucher_id,
                kind,
                voucher_number,
                party_id: input.party_id.clone(),
                party_name: input.party_name.clone(),
                voucher_date: input.voucher_date.unwrap_or(today),
                status,
                subtotal_cents: subtotal.cents(),
                discount_cents: discount.cents(),
                tax_cents: tax.cents(),
                total_cents: (taxable + tax).cents(),
                notes: input.notes.clone(),
                created_at: now,
                updated_at: now,
            },
            items,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
