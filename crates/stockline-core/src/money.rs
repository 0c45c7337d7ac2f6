//! Integer-cent money and the amount parser.
//!
//! Every stored price, total and refund is an `i64` number of cents, and
//! arithmetic never touches floating point. Amounts typed into forms or
//! found in imported rows come in as text such as `"$1,250.00"`,
//! `"Rs. 1,250"`, `"₹ 99.5"` or `"(12.00)"`. [`Money::parse`] is the single
//! place that strips symbols and separators from them.
//!
//! ```rust
//! use stockline_core::money::Money;
//!
//! assert_eq!(Money::parse("Rs. 1,250").unwrap().cents(), 125_000);
//! assert_eq!(Money::parse("(5.50)").unwrap().cents(), -550);
//! assert_eq!(Money::from_cents(125_000).format_with_symbol("Rs "), "Rs 1,250.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;

/// Signed cents; negative values are refunds and credits.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Whole units, truncated toward zero.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Cents part, always 0 to 99.
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Line totals and stock valuation over amounts already bounded by
    /// input validation.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// [`Money::multiply_quantity`] for untrusted operands.
    pub fn checked_multiply_quantity(&self, qty: i64) -> Result<Money, ValidationError> {
        self.0
            .checked_mul(qty)
            .map(Money)
            .ok_or_else(|| ValidationError::invalid("amount", "too large"))
    }

    /// `bps` basis points of this amount, rounded half away from zero.
    ///
    /// ```rust
    /// use stockline_core::money::Money;
    ///
    /// // 8.25% of 10.00 = 0.825 → 0.83
    /// assert_eq!(Money::from_cents(1000).percentage_of(825).cents(), 83);
    /// ```
    pub fn percentage_of(&self, bps: u32) -> Money {
        let raw = self.0 as i128 * bps as i128;
        let rounded = if raw >= 0 {
            (raw + 5000) / 10000
        } else {
            (raw - 5000) / 10000
        };
        Money(rounded as i64)
    }

    /// Reads a typed or imported amount.
    ///
    /// Currency symbols and codes on either side are ignored, as are `,`,
    /// `'` and spaces inside the whole part. A leading `-` or wrapping
    /// parentheses make it negative. The third decimal rounds half-up and
    /// anything after it is dropped. Decimal commas (`1.234,50`) are
    /// rejected.
    pub fn parse(text: &str) -> Result<Money, ValidationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::required("amount"));
        }

        let first_digit = text
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit())
            .map(|(i, _)| i)
            .ok_or_else(|| ValidationError::invalid("amount", "contains no digits"))?;
        let last_digit = text
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(first_digit);

        let prefix = &text[..first_digit];
        let negative = prefix.contains('-') || (prefix.contains('(') && text.ends_with(')'));
        let body = &text[first_digit..=last_digit];

        let mut whole: i64 = 0;
        let mut fraction = String::new();
        let mut seen_point = false;

        for c in body.chars() {
            match c {
                '0'..='9' if seen_point => fraction.push(c),
                '0'..='9' => {
                    whole = whole
                        .checked_mul(10)
                        .and_then(|w| w.checked_add(i64::from(c as u8 - b'0')))
                        .ok_or_else(|| ValidationError::invalid("amount", "too large"))?;
                }
                '.' if !seen_point => seen_point = true,
                ',' | '\'' | ' ' | '\u{a0}' if !seen_point => {}
                _ => {
                    return Err(ValidationError::invalid(
                        "amount",
                        format!("unexpected character '{}'", c),
                    ))
                }
            }
        }

        let digits: Vec<i64> = fraction
            .bytes()
            .map(|b| i64::from(b - b'0'))
            .chain(std::iter::repeat(0))
            .take(3)
            .collect();
        let mut minor = digits[0] * 10 + digits[1];
        if digits[2] >= 5 {
            minor += 1;
        }

        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .ok_or_else(|| ValidationError::invalid("amount", "too large"))?;

        Ok(Money(if negative { -cents } else { cents }))
    }

    /// `1234.50`, `-5.50`: no symbol, no grouping. CSV cells use this.
    pub fn to_plain_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.major().unsigned_abs(), self.minor())
    }

    /// Symbol after the sign, thousands grouped: `-Rs 1,250.00`.
    pub fn format_with_symbol(&self, symbol: &str) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let major = (self.0 / 100).unsigned_abs().to_string();

        let mut grouped = String::with_capacity(major.len() + major.len() / 3);
        for (i, c) in major.chars().enumerate() {
            if i > 0 && (major.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }

        format!("{}{}{}.{:02}", sign, symbol, grouped, self.minor())
    }
}

/// Log-friendly form with `$`; user-facing text goes through
/// [`Money::format_with_symbol`].
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_with_symbol("$"))
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_major_minor_split() {
        let refund = Money::from_cents(-1099);
        assert_eq!(refund.major(), -10);
        assert_eq!(refund.minor(), 99);
    }

    #[test]
    fn test_plain_and_display_forms() {
        assert_eq!(Money::from_cents(125_050).to_plain_string(), "1250.50");
        assert_eq!(Money::from_cents(-7).to_plain_string(), "-0.07");
        assert_eq!(Money::from_cents(125_050).to_string(), "$1,250.50");
        assert_eq!(Money::zero().to_string(), "$0.00");
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
        assert_eq!((-a).cents(), -1000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_checked_multiply_rejects_overflow() {
        let unit = Money::from_cents(299);
        assert_eq!(unit.checked_multiply_quantity(3).unwrap().cents(), 897);

        let huge = Money::from_cents(4_000_000_000_000_000_000);
        assert!(matches!(
            huge.checked_multiply_quantity(3),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(Money::from_cents(1000).percentage_of(825).cents(), 83);
        assert_eq!(Money::from_cents(-1000).percentage_of(825).cents(), -83);
        assert_eq!(Money::from_cents(10000).percentage_of(1000).cents(), 1000);
    }

    #[test]
    fn test_parse_strips_symbols_and_separators() {
        assert_eq!(Money::parse("$1,250.00").unwrap().cents(), 125_000);
        assert_eq!(Money::parse("Rs. 1,250").unwrap().cents(), 125_000);
        assert_eq!(Money::parse("₹ 99.5").unwrap().cents(), 9950);
        assert_eq!(Money::parse("PKR 1 200").unwrap().cents(), 120_000);
        assert_eq!(Money::parse("45 USD").unwrap().cents(), 4500);
        assert_eq!(Money::parse("€0.07").unwrap().cents(), 7);
        assert_eq!(Money::parse("12").unwrap().cents(), 1200);
    }

    #[test]
    fn test_parse_negative_forms() {
        assert_eq!(Money::parse("-$5.50").unwrap().cents(), -550);
        assert_eq!(Money::parse("$-5.50").unwrap().cents(), -550);
        assert_eq!(Money::parse("(5.50)").unwrap().cents(), -550);
    }

    #[test]
    fn test_parse_rounds_third_decimal() {
        assert_eq!(Money::parse("1.005").unwrap().cents(), 101);
        assert_eq!(Money::parse("1.004").unwrap().cents(), 100);
        assert_eq!(Money::parse("1.0049").unwrap().cents(), 100);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Money::parse("").is_err());
        assert!(Money::parse("Rs.").is_err());
        assert!(Money::parse("1.2.3").is_err());
        assert!(Money::parse("12abc34").is_err());
        assert!(Money::parse("99999999999999999999").is_err());
    }

    #[test]
    fn test_format_with_symbol() {
        assert_eq!(Money::from_cents(0).format_with_symbol("$"), "$0.00");
        assert_eq!(Money::from_cents(99_999).format_with_symbol("$"), "$999.99");
        assert_eq!(Money::from_cents(100_000).format_with_symbol("$"), "$1,000.00");
        assert_eq!(
            Money::from_cents(123_456_789).format_with_symbol("Rs "),
            "Rs 1,234,567.89"
        );
        assert_eq!(Money::from_cents(-550).format_with_symbol("$"), "-$5.50");
    }
}
