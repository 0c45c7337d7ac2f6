//! Domain errors.
//!
//! [`ValidationError`] rejects malformed input before anything is stored.
//! [`CoreError`] covers the inventory rules themselves and wraps
//! validation failures, so the storage and HTTP layers only need one
//! conversion each (`DbError::Domain`, then `ApiError`).

use thiserror::Error;

/// A field that failed a shape or range check. `field` is the
/// human-readable name shown in the dashboard.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Unparseable amount, email, date and the like.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    #[error("date range start {from} is after end {to}")]
    InvertedRange { from: String, to: String },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// An inventory rule refused the operation.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Raised by POS checkout when calculated stock cannot cover a line.
    /// Plain sales may still go negative.
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// Posting a voucher that is not a draft, or cancelling one twice.
    #[error("Voucher {voucher_number} is {current_status}, cannot {operation}")]
    InvalidVoucherStatus {
        voucher_number: String,
        current_status: String,
        operation: String,
    },

    /// Receiving twice, or returning goods that never arrived.
    #[error("Purchase {purchase_id} is {current_status}, cannot {operation}")]
    InvalidPurchaseStatus {
        purchase_id: String,
        current_status: String,
        operation: String,
    },

    /// Inactive products stay in history but cannot be rung up.
    #[error("Product {0} is not available for sale")]
    ProductInactive(String),

    #[error("Cannot have more than {max} line items")]
    TooManyLines { max: usize },

    #[error("At least one line item is required")]
    EmptyDocument,

    #[error("Product {0} is not in the cart")]
    NotInCart(String),

    #[error("Role {role} is not permitted to {action}")]
    Forbidden { role: String, action: String },

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl From<csv::Error> for CoreError {
    fn from(err: csv::Error) -> Self {
        CoreError::Export(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortage_names_sku_and_quantities() {
        let err = CoreError::InsufficientStock {
            sku: "TEA-250".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for TEA-250: available 3, requested 5"
        );
    }

    #[test]
    fn test_status_errors_name_the_operation() {
        let err = CoreError::InvalidVoucherStatus {
            voucher_number: "PV-20260301-0002".to_string(),
            current_status: "cancelled".to_string(),
            operation: "cancel".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Voucher PV-20260301-0002 is cancelled, cannot cancel"
        );
    }

    #[test]
    fn test_validation_messages_and_wrapping() {
        assert_eq!(ValidationError::required("sku").to_string(), "sku is required");
        assert_eq!(
            ValidationError::invalid("sell price", "not a number").to_string(),
            "sell price has invalid format: not a number"
        );

        let wrapped: CoreError = ValidationError::Negative {
            field: "opening stock".to_string(),
        }
        .into();
        assert_eq!(
            wrapped.to_string(),
            "Validation error: opening stock must not be negative"
        );
    }
}
