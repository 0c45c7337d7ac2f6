//! User administration.
//!
//! Admins manage roles below admin; the super admin manages everyone.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use stockline_core::{Permission, UserInput, UserProfile, UserUpdate};
use tracing::info;

use crate::auth::{hash_password, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list).post(create))
        .route("/users/{id}", put(update))
}

pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<UserProfile>>> {
    user.require(Permission::ManageUsers)?;
    Ok(Json(state.db.users().list().await?))
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<UserInput>,
) -> ApiResult<(StatusCode, Json<UserProfile>)> {
    user.require_manage(input.role)?;
    input.validate()?;

    let hash = hash_password(&input.password)?;
    let created = state.db.users().insert(&input, hash).await?;
    info!(
        user_id = %created.id,
        role = created.role.as_str(),
        by = %user.email,
        "User created"
    );
    Ok((StatusCode::CREATED, Json(created)))
}

/// Both the current and the requested role must be manageable by the
/// caller. Nobody deactivates their own account.
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(update): Json<UserUpdate>,
) -> ApiResult<Json<UserProfile>> {
    let users = state.db.users();
    let target = users.get(&id).await?;
    user.require_manage(target.role)?;
    if let Some(role) = update.role {
        user.require_manage(role)?;
    }
    if target.id == user.id && update.is_active == Some(false) {
        return Err(ApiError::validation("You cannot deactivate your own account"));
    }

    let updated = users.update(&id, &update).await?;
    info!(
        user_id = %updated.id,
        role = updated.role.as_str(),
        active = updated.is_active,
        by = %user.email,
        "User updated"
    );
    Ok(Json(updated))
}
