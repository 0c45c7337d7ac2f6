//! Field checks shared by every input type.
//!
//! Each `*Input::validate` calls these before a repository opens a
//! transaction, so a bad form never reaches SQLite. The schema's own
//! `CHECK`, `UNIQUE` and foreign key constraints remain the last word.
//!
//! ```rust
//! use stockline_core::validation::{validate_quantity, validate_sku};
//!
//! validate_sku("TEA-250").unwrap();
//! assert!(validate_quantity(0).is_err());
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::{MAX_AMOUNT_CENTS, MAX_ITEM_QUANTITY};

pub type ValidationResult<T> = Result<T, ValidationError>;

fn required_within(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::required(field));
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

/// Up to 50 letters, digits, `-` or `_`.
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    required_within("sku", sku, 50)?;

    if !sku
        .trim()
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::invalid(
            "sku",
            "must contain only letters, numbers, hyphens, and underscores",
        ));
    }

    Ok(())
}

pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    required_within("name", name, 200)
}

pub fn validate_category(category: &str) -> ValidationResult<()> {
    required_within("category", category, 100)
}

/// "pcs", "kg", "box".
pub fn validate_unit(unit: &str) -> ValidationResult<()> {
    required_within("unit", unit, 20)
}

const MAX_QUERY_CHARS: usize = 100;

/// Trims a picker search. An empty result means "no search".
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();
    if query.chars().count() > MAX_QUERY_CHARS {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: MAX_QUERY_CHARS,
        });
    }
    Ok(query.to_string())
}

/// Shape only: one `@`, a non-empty local part, a dotted domain.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    required_within("email", email, 254)?;

    let invalid = || ValidationError::invalid("email", "must look like name@example.com");
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || email.contains(char::is_whitespace)
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }
    Ok(())
}

/// A hand-typed voucher number; generated ones always pass.
pub fn validate_voucher_number(number: &str) -> ValidationResult<()> {
    required_within("voucher number", number, 40)?;
    if !number
        .trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '/' | '_'))
    {
        return Err(ValidationError::invalid(
            "voucher number",
            "must contain only letters, numbers, '-', '/' and '_'",
        ));
    }
    Ok(())
}

/// Line quantity: 1 through [`MAX_ITEM_QUANTITY`].
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Opening stock, reorder point.
pub fn validate_non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Prices, discounts, refunds: 0 through [`MAX_AMOUNT_CENTS`].
pub fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<()> {
    validate_non_negative(field, cents)?;
    if cents > MAX_AMOUNT_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_CENTS,
        });
    }
    Ok(())
}

/// Discount and tax rates, 0 to 10000 basis points.
pub fn validate_rate_bps(field: &str, bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

/// Inclusive on both ends; either end may be open.
pub fn validate_date_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> ValidationResult<()> {
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(ValidationError::InvertedRange {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("TEA-250").is_ok());
        assert!(validate_sku("rice_5kg").is_ok());
        assert!(validate_sku("").is_err());
        assert!(validate_sku("  ").is_err());
        assert!(validate_sku("TEA 250").is_err());
        assert!(validate_sku(&"X".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Green Tea 250g").is_ok());
        assert!(validate_product_name(" ").is_err());
        assert!(validate_product_name(&"n".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_ITEM_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_non_negative() {
        assert!(validate_non_negative("reorder point", 0).is_ok());
        assert!(validate_non_negative("reorder point", 12).is_ok());
        assert!(matches!(
            validate_non_negative("reorder point", -1),
            Err(ValidationError::Negative { .. })
        ));
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("owner@shop.example").is_ok());
        assert!(validate_email(" owner@shop.example ").is_ok());
        assert!(validate_email("owner").is_err());
        assert!(validate_email("@shop.example").is_err());
        assert!(validate_email("owner@shop").is_err());
        assert!(validate_email("a@b@c.com").is_err());
        assert!(validate_email("own er@shop.example").is_err());
    }

    #[test]
    fn test_validate_voucher_number() {
        assert!(validate_voucher_number("SV-20260314-0001").is_ok());
        assert!(validate_voucher_number("INV/2026/7").is_ok());
        assert!(validate_voucher_number("").is_err());
        assert!(validate_voucher_number("SV 1").is_err());
    }

    #[test]
    fn test_validate_amount_cents_is_bounded() {
        assert!(validate_amount_cents("sell price", 0).is_ok());
        assert!(validate_amount_cents("sell price", MAX_AMOUNT_CENTS).is_ok());
        assert!(matches!(
            validate_amount_cents("sell price", -1),
            Err(ValidationError::Negative { .. })
        ));
        assert!(matches!(
            validate_amount_cents("sell price", 4_000_000_000_000_000_000),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_rate_bps() {
        assert!(validate_rate_bps("tax", 0).is_ok());
        assert!(validate_rate_bps("tax", 10_000).is_ok());
        assert!(validate_rate_bps("tax", 10_001).is_err());
    }

    #[test]
    fn test_validate_search_query_trims() {
        assert_eq!(validate_search_query("  tea ").unwrap(), "tea");
        assert_eq!(validate_search_query("   ").unwrap(), "");
        assert!(validate_search_query(&"é".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_date_range() {
        let d = |day| NaiveDate::from_ymd_opt(2026, 3, day).unwrap();
        assert!(validate_date_range(Some(d(1)), Some(d(31))).is_ok());
        assert!(validate_date_range(Some(d(5)), Some(d(5))).is_ok());
        assert!(validate_date_range(None, Some(d(5))).is_ok());
        assert!(validate_date_range(Some(d(6)), Some(d(5))).is_err());
    }
}
