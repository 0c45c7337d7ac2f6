//! Product catalogue, per-product stock and reconciliation.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use stockline_core::picker::Page;
use stockline_core::stock::StockSnapshot;
use stockline_core::{Permission, Product, ProductInput};
use tracing::info;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::routes::ListQuery;
use crate::AppState;

/// `?page=1&pageSize=25&q=tea`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub q: Option<String>,
}

impl ProductQuery {
    fn paging(&self) -> ListQuery {
        ListQuery {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// A product with its derived stock figures.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductStock {
    pub product: Product,
    pub stock: StockSnapshot,
    pub status_label: &'static str,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list).post(create))
        .route("/products/{id}", get(show).put(update).delete(remove))
        .route("/products/{id}/stock", get(stock))
        .route("/products/{id}/reconcile", post(reconcile))
}

/// `GET /products`
///
/// With `q`, the page holds the search hits instead (page 1, at most
/// `pageSize` rows).
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ProductQuery>,
) -> ApiResult<Json<Page<Product>>> {
    user.require(Permission::View)?;
    let request = query.paging().page_request(&state.config);
    let products = state.db.products();

    match query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => {
            let items = products.search(q, request.page_size).await?;
            Ok(Json(Page {
                total: items.len() as u64,
                items,
                page: 1,
                page_size: request.page_size,
            }))
        }
        None => Ok(Json(products.list(request).await?)),
    }
}

/// `POST /products`
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<ProductInput>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    user.require(Permission::ManageInventory)?;
    let product = state.db.products().create(&input).await?;
    info!(sku = %product.sku, by = %user.email, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// `GET /products/{id}`
pub async fn show(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    user.require(Permission::View)?;
    Ok(Json(state.db.products().get(&id).await?))
}

/// `PUT /products/{id}`
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(input): Json<ProductInput>,
) -> ApiResult<Json<Product>> {
    user.require(Permission::ManageInventory)?;
    Ok(Json(state.db.products().update(&id, &input).await?))
}

/// `DELETE /products/{id}`: refused while transactions reference it.
pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    user.require(Permission::DeleteRecords)?;
    state.db.products().delete(&id).await?;
    info!(product_id = %id, by = %user.email, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /products/{id}/stock`
pub async fn stock(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ProductStock>> {
    user.require(Permission::View)?;
    let product = state.db.products().get(&id).await?;
    let stock = state.db.stock().snapshot(&id).await?;
    Ok(Json(ProductStock {
        status_label: stock.status.label(),
        product,
        stock,
    }))
}

/// `POST /products/{id}/reconcile`: overwrites stored stock with the
/// calculated value.
pub async fn reconcile(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<StockSnapshot>> {
    user.require(Permission::ManageInventory)?;
    Ok(Json(state.db.stock().reconcile(&id).await?))
}
