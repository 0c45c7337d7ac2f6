//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ValidationError ──► CoreError ──► DbError ──► ApiError ──► Response   │
//! │                                                                         │
//! │  HTTP/1.1 404 Not Found                                                 │
//! │  { "code": "NOT_FOUND", "message": "Product not found: 9f1c..." }       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Database failures are logged in full and returned as a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use stockline_core::{CoreError, ValidationError};
use stockline_db::DbError;

/// Error body returned by every failing route.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// 404
    NotFound,
    /// 400
    ValidationError,
    /// 409: duplicate value or record still referenced
    Conflict,
    /// 422: status transition or business rule
    BusinessLogic,
    /// 422
    InsufficientStock,
    /// 401
    Unauthorized,
    /// 403
    Forbidden,
    /// 500
    DatabaseError,
    /// 500
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::BusinessLogic | ErrorCode::InsufficientStock => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!("Foreign key violation: {}", message);
                ApiError::new(
                    ErrorCode::Conflict,
                    "Record is referenced by other records or refers to a missing one",
                )
            }
            DbError::Domain(e) => ApiError::from(e),
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", &id),
            CoreError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, message)
            }
            CoreError::Forbidden { .. } => ApiError::forbidden(message),
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
            CoreError::Export(_) => ApiError::internal(message),
            CoreError::InvalidVoucherStatus { .. }
            | CoreError::InvalidPurchaseStatus { .. }
            | CoreError::TooManyLines { .. }
            | CoreError::EmptyDocument
            | CoreError::ProductInactive(_)
            | CoreError::NotInCart(_) => ApiError::new(ErrorCode::BusinessLogic, message),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_errors_map_to_codes() {
        let err = ApiError::from(DbError::not_found("Sale", "s1"));
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Sale not found: s1");

        let err = ApiError::from(DbError::duplicate("sku", "A-1"));
        assert_eq!(err.code, ErrorCode::Conflict);

        let err = ApiError::from(DbError::QueryFailed("syntax error near ...".to_string()));
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert_eq!(err.message, "Database operation failed");
    }

    #[test]
    fn test_domain_errors_pass_through() {
        let err = ApiError::from(DbError::Domain(CoreError::InsufficientStock {
            sku: "A".to_string(),
            available: 1,
            requested: 3,
        }));
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(err.code.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let err = ApiError::from(DbError::from(ValidationError::required("name")));
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = ApiError::from(CoreError::Forbidden {
            role: "staff".to_string(),
            action: "delete records".to_string(),
        });
        assert_eq!(err.code.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_into_response_status() {
        let response = ApiError::unauthorized("Missing bearer token").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
