//! Storage errors.
//!
//! Everything a repository can fail with ends up here: sqlx failures are
//! classified by constraint kind, and business-rule rejections raised
//! inside a write transaction travel as [`DbError::Domain`] so the API can
//! still answer with the precise code (insufficient stock, bad status).

use sqlx::error::{DatabaseError, ErrorKind};
use stockline_core::{CoreError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// SKU, voucher number or email taken.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A row points at a missing product or company, or a delete would
    /// orphan sales, purchases or voucher lines.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    #[error(transparent)]
    Domain(#[from] CoreError),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    fn from_constraint(err: &dyn DatabaseError) -> Self {
        let message = err.message();
        match err.kind() {
            ErrorKind::UniqueViolation => DbError::duplicate(unique_column(message), "?"),
            ErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation {
                message: message.to_string(),
            },
            _ => DbError::QueryFailed(message.to_string()),
        }
    }
}

/// `UNIQUE constraint failed: products.sku` -> `sku`
fn unique_column(message: &str) -> String {
    message
        .rsplit(": ")
        .next()
        .and_then(|target| target.split(',').next())
        .map(|column| column.rsplit('.').next().unwrap_or(column).trim().to_string())
        .unwrap_or_else(|| "value".to_string())
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) => DbError::from_constraint(db_err.as_ref()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Domain(err.into())
    }
}

/// SQLite does not report the offending value; callers that know it put
/// it back in.
pub(crate) fn with_duplicate_value(err: DbError, field: &str, value: &str) -> DbError {
    match err {
        DbError::UniqueViolation { .. } => DbError::duplicate(field, value),
        other => other,
    }
}
