//! API server configuration.
//!
//! Layered with the `config` crate, later sources overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. `stockline.toml` in the working directory (optional)
//! 3. `STOCKLINE_*` environment variables, e.g. `STOCKLINE_PORT=9000`,
//!    `STOCKLINE_JWT_SECRET=...`

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use stockline_core::MAX_PAGE_SIZE;

const DEV_JWT_SECRET: &str = "stockline-dev-secret-change-in-production";

/// API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Secret for signing access tokens
    pub jwt_secret: String,

    /// Access token lifetime in seconds
    pub jwt_access_lifetime_secs: i64,

    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,

    /// Symbol printed on invoices
    pub currency_symbol: String,

    /// Rows per page when a list request does not say
    pub default_page_size: u32,

    /// Super admin created on first start when no super admin exists
    pub bootstrap_admin_email: Option<String>,
    pub bootstrap_admin_password: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_path: "./stockline.db".to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_access_lifetime_secs: 8 * 3600,
            log_filter: "info,stockline=debug,sqlx=warn".to_string(),
            currency_symbol: "$".to_string(),
            default_page_size: stockline_core::DEFAULT_PAGE_SIZE,
            bootstrap_admin_email: None,
            bootstrap_admin_password: None,
        }
    }
}

impl ApiConfig {
    /// Loads defaults, then `stockline.toml`, then `STOCKLINE_*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("stockline")
    }

    /// Like [`ApiConfig::load`] with a different file stem.
    pub fn load_from(file_stem: &str) -> Result<Self, ConfigError> {
        let defaults = ApiConfig::default();
        let config: ApiConfig = Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("database_path", defaults.database_path)?
            .set_default("jwt_secret", defaults.jwt_secret)?
            .set_default("jwt_access_lifetime_secs", defaults.jwt_access_lifetime_secs)?
            .set_default("log_filter", defaults.log_filter)?
            .set_default("currency_symbol", defaults.currency_symbol)?
            .set_default("default_page_size", i64::from(defaults.default_page_size))?
            .add_source(File::with_name(file_stem).required(false))
            .add_source(Environment::with_prefix("STOCKLINE").try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt_secret".to_string()));
        }
        if self.jwt_access_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue(
                "jwt_access_lifetime_secs".to_string(),
            ));
        }
        if self.default_page_size == 0 || self.default_page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidValue("default_page_size".to_string()));
        }
        if self.database_path.trim().is_empty() {
            return Err(ConfigError::MissingRequired("database_path".to_string()));
        }
        if self.bootstrap_admin_email.is_some() != self.bootstrap_admin_password.is_some() {
            return Err(ConfigError::MissingRequired(
                "bootstrap_admin_email and bootstrap_admin_password".to_string(),
            ));
        }
        Ok(())
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}
