//! Single-line sales.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use stockline_core::picker::Page;
use stockline_core::{Permission, Sale, SaleInput};
use tracing::info;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::routes::ListQuery;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sales", get(list).post(create))
        .route("/sales/{id}", get(show).put(update).delete(remove))
}

/// `GET /sales`, newest first.
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Page<Sale>>> {
    user.require(Permission::View)?;
    let request = query.page_request(&state.config);
    Ok(Json(state.db.sales().list(request).await?))
}

/// `POST /sales`
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<SaleInput>,
) -> ApiResult<(StatusCode, Json<Sale>)> {
    user.require(Permission::RecordSales)?;
    let sale = state.db.sales().insert(&input).await?;
    info!(sale_id = %sale.id, quantity = sale.quantity, by = %user.email, "Sale recorded");
    Ok((StatusCode::CREATED, Json(sale)))
}

/// `GET /sales/{id}`
pub async fn show(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Sale>> {
    user.require(Permission::View)?;
    Ok(Json(state.db.sales().get(&id).await?))
}

/// `PUT /sales/{id}`
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(input): Json<SaleInput>,
) -> ApiResult<Json<Sale>> {
    user.require(Permission::RecordSales)?;
    let sale = state.db.sales().update(&id, &input).await?;
    info!(sale_id = %sale.id, by = %user.email, "Sale updated");
    Ok(Json(sale))
}

/// `DELETE /sales/{id}`
pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    user.require(Permission::DeleteRecords)?;
    state.db.sales().delete(&id).await?;
    info!(sale_id = %id, by = %user.email, "Sale deleted");
    Ok(StatusCode::NO_CONTENT)
}
