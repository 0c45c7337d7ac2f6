//! # Stockline API
//!
//! JSON over HTTP for the inventory dashboard.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           API Server                                    │
//! │                                                                         │
//! │  Dashboard ───► axum Router ───► routes::* ───► stockline-db ──► SQLite │
//! │                     │                 │                                 │
//! │                     ▼                 ▼                                 │
//! │               AuthUser (JWT)    stockline-core                          │
//! │                                 (reports, POS, invoices)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use stockline_db::{Database, DbConfig};
use tracing::info;

use crate::auth::{bootstrap_super_admin, JwtManager};
use crate::config::ApiConfig;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_access_lifetime_secs);
        AppState {
            db,
            jwt: Arc::new(jwt),
            config: Arc::new(config),
        }
    }
}

/// Opens the database, applies migrations and bootstraps the super admin.
pub async fn build_state(config: ApiConfig) -> anyhow::Result<AppState> {
    let db = Database::new(DbConfig::new(&config.database_path)).await?;
    info!(path = %config.database_path, "Database ready");

    if let Some(admin) = bootstrap_super_admin(&db, &config).await? {
        info!(email = %admin.email, "Super admin available");
    }

    Ok(AppState::new(db, config))
}

/// The full route tree.
pub fn router(state: AppState) -> Router {
    routes::router().with_state(state)
}
