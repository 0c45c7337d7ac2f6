//! Purchase lines and the orders they are grouped into.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use stockline_core::picker::Page;
use stockline_core::{Permission, Purchase, PurchaseOrder, PurchaseOrderInput, PurchaseUpdate};
use tracing::info;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::routes::{ListQuery, RangeQuery};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/purchases", get(list).post(create))
        .route("/purchases/{id}", get(show).put(update).delete(remove))
        .route("/purchases/{id}/receive", post(receive))
        .route("/purchase-orders", get(list_orders))
        .route("/purchase-orders/{order_id}", get(show_order))
        .route("/purchase-orders/{order_id}/receive", post(receive_order))
}

/// `GET /purchases`, one row per line.
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Page<Purchase>>> {
    user.require(Permission::View)?;
    let request = query.page_request(&state.config);
    Ok(Json(state.db.purchases().list(request).await?))
}

/// `POST /purchases`: a whole order, one line per product.
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<PurchaseOrderInput>,
) -> ApiResult<(StatusCode, Json<PurchaseOrder>)> {
    user.require(Permission::ManageInventory)?;
    let order = state.db.purchases().insert_order(&input).await?;
    info!(
        order_id = %order.order_id,
        lines = order.lines.len(),
        by = %user.email,
        "Purchase order created"
    );
    Ok((StatusCode::CREATED, Json(order)))
}

/// `GET /purchases/{id}`
pub async fn show(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Purchase>> {
    user.require(Permission::View)?;
    Ok(Json(state.db.purchases().get(&id).await?))
}

/// `PUT /purchases/{id}`
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(input): Json<PurchaseUpdate>,
) -> ApiResult<Json<Purchase>> {
    user.require(Permission::ManageInventory)?;
    Ok(Json(state.db.purchases().update(&id, &input).await?))
}

/// `DELETE /purchases/{id}`
pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    user.require(Permission::DeleteRecords)?;
    state.db.purchases().delete(&id).await?;
    info!(purchase_id = %id, by = %user.email, "Purchase deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /purchases/{id}/receive`
pub async fn receive(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Purchase>> {
    user.require(Permission::ManageInventory)?;
    Ok(Json(state.db.purchases().receive(&id).await?))
}

/// `GET /purchase-orders?from=&to=`
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Json<Vec<PurchaseOrder>>> {
    user.require(Permission::View)?;
    let range = query.range()?;
    Ok(Json(state.db.purchases().list_orders(&range).await?))
}

/// `GET /purchase-orders/{order_id}`
pub async fn show_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<String>,
) -> ApiResult<Json<PurchaseOrder>> {
    user.require(Permission::View)?;
    Ok(Json(state.db.purchases().list_order(&order_id).await?))
}

/// `POST /purchase-orders/{order_id}/receive`: every pending line.
pub async fn receive_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<String>,
) -> ApiResult<Json<PurchaseOrder>> {
    user.require(Permission::ManageInventory)?;
    Ok(Json(state.db.purchases().receive_order(&order_id).await?))
}
