//! Login and the current user.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use stockline_core::UserProfile;
use tracing::{info, warn};

use crate::auth::{verify_password, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    /// Seconds until the token expires
    pub expires_in: i64,
    pub user: UserProfile,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
}

/// `POST /auth/login`
///
/// Unknown email, wrong password and deactivated account all answer with
/// the same 401.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let rejected = || ApiError::unauthorized("Invalid email or password");

    let user = state
        .db
        .users()
        .get_by_email(&request.email)
        .await?
        .ok_or_else(rejected)?;

    if !user.is_active || !verify_password(&request.password, &user.password_hash) {
        warn!(email = %user.email, "Rejected login");
        return Err(rejected());
    }

    let access_token = state.jwt.generate_access_token(&user)?;
    info!(user_id = %user.id, role = user.role.as_str(), "User logged in");

    Ok(Json(LoginResponse {
        access_token,
        token_type: "Bearer",
        expires_in: state.jwt.access_lifetime_secs(),
        user,
    }))
}

/// `GET /auth/me`
pub async fn me(State(state): State<AppState>, user: AuthUser) -> ApiResult<Json<UserProfile>> {
    Ok(Json(state.db.users().get(&user.id).await?))
}
