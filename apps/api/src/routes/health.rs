//! Liveness check.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use stockline_db::migrations::migration_status;
use tracing::warn;

use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
    pub schema_current: bool,
    pub version: &'static str,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// `GET /health`: no authentication.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = state.db.health_check().await;
    let schema_current = match migration_status(state.db.pool()).await {
        Ok(status) => status.is_current(),
        Err(e) => {
            warn!(error = %e, "Health check could not read migration status");
            false
        }
    };

    Json(HealthResponse {
        status: if database && schema_current { "ok" } else { "degraded" },
        database,
        schema_current,
        version: env!("CARGO_PKG_VERSION"),
    })
}
