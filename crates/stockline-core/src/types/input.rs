use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation;

/// An amount as the dashboard sends it.
///
/// Numbers are cents. Strings are major units with optional currency
/// symbol and separators, and always go through [`Money::parse`].
///
/// ```rust
/// use stockline_core::AmountInput;
///
/// let typed: AmountInput = serde_json::from_str("\"Rs. 1,200\"").unwrap();
/// assert_eq!(typed.to_money().unwrap().cents(), 120_000);
///
/// let cents: AmountInput = serde_json::from_str("1999").unwrap();
/// assert_eq!(cents.to_money().unwrap().cents(), 1999);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export)]
pub enum AmountInput {
    Cents(i64),
    Text(String),
}

impl AmountInput {
    /// Resolves the input into money.
    pub fn to_money(&self) -> Result<Money, ValidationError> {
        match self {
            AmountInput::Cents(cents) => Ok(Money::from_cents(*cents)),
            AmountInput::Text(text) => Money::parse(text),
        }
    }

    /// Resolves to cents, rejecting negative or out-of-range amounts.
    pub fn non_negative_cents(&self, field: &str) -> Result<i64, ValidationError> {
        let cents = self.to_money()?.cents();
        validation::validate_amount_cents(field, cents)?;
        Ok(cents)
    }
}

impl From<Money> for AmountInput {
    fn from(money: Money) -> Self {
        AmountInput::Cents(money.cents())
    }
}

/// Resolves an optional amount, falling back to `default_cents`.
pub(crate) fn cents_or(
    amount: Option<&AmountInput>,
    default_cents: i64,
    field: &str,
) -> Result<i64, ValidationError> {
    match amount {
        Some(amount) => amount.non_negative_cents(field),
        None => Ok(default_cents),
    }
}
