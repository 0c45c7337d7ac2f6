//! Sales and purchase vouchers.
//!
//! Both kinds share the handlers. The kind travels as an [`Extension`]
//! layered onto each half of the route tree:
//!
//! ```text
//! /sales-vouchers/...     ──► Extension(VoucherKind::Sales)
//! /purchase-vouchers/...  ──► Extension(VoucherKind::Purchase)
//! ```

use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use stockline_core::picker::Page;
use stockline_core::report::invoice;
use stockline_core::{Permission, Voucher, VoucherInput, VoucherKind, VoucherWithItems};
use tracing::info;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::routes::ListQuery;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    let sales = shared("/sales-vouchers")
        .route("/sales-vouchers/{id}/invoice", get(invoice_text))
        .layer(Extension(VoucherKind::Sales));
    let purchases = shared("/purchase-vouchers").layer(Extension(VoucherKind::Purchase));
    sales.merge(purchases)
}

fn shared(base: &str) -> Router<AppState> {
    Router::new()
        .route(base, get(list).post(create))
        .route(&format!("{}/{{id}}", base), get(show).delete(remove))
        .route(&format!("{}/{{id}}/post", base), post(post_voucher))
        .route(&format!("{}/{{id}}/cancel", base), post(cancel))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(kind): Extension<VoucherKind>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Page<Voucher>>> {
    user.require(Permission::View)?;
    let request = query.page_request(&state.config);
    Ok(Json(state.db.vouchers(kind).list(request).await?))
}

/// Creates a draft, or a posted voucher when `post` is set.
pub async fn create(
    State(state): State<AppState>,
    Extension(kind): Extension<VoucherKind>,
    user: AuthUser,
    Json(input): Json<VoucherInput>,
) -> ApiResult<(StatusCode, Json<VoucherWithItems>)> {
    user.require(Permission::ManageInventory)?;
    let voucher = state.db.vouchers(kind).create(&input).await?;
    info!(
        kind = kind.as_str(),
        number = %voucher.voucher.voucher_number,
        status = voucher.voucher.status.as_str(),
        by = %user.email,
        "Voucher created"
    );
    Ok((StatusCode::CREATED, Json(voucher)))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(kind): Extension<VoucherKind>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<VoucherWithItems>> {
    user.require(Permission::View)?;
    Ok(Json(state.db.vouchers(kind).get(&id).await?))
}

/// Deleting a posted voucher gives its stock back.
pub async fn remove(
    State(state): State<AppState>,
    Extension(kind): Extension<VoucherKind>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    user.require(Permission::DeleteRecords)?;
    state.db.vouchers(kind).delete(&id).await?;
    info!(kind = kind.as_str(), voucher_id = %id, by = %user.email, "Voucher deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Draft → posted.
pub async fn post_voucher(
    State(state): State<AppState>,
    Extension(kind): Extension<VoucherKind>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<VoucherWithItems>> {
    user.require(Permission::ManageInventory)?;
    Ok(Json(state.db.vouchers(kind).post(&id).await?))
}

/// Draft or posted → cancelled.
pub async fn cancel(
    State(state): State<AppState>,
    Extension(kind): Extension<VoucherKind>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<VoucherWithItems>> {
    user.require(Permission::ManageInventory)?;
    Ok(Json(state.db.vouchers(kind).cancel(&id).await?))
}

/// Fixed-width plain-text invoice.
pub async fn invoice_text(
    State(state): State<AppState>,
    Extension(kind): Extension<VoucherKind>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    user.require(Permission::View)?;
    if kind != VoucherKind::Sales {
        return Err(ApiError::not_found("Invoice", &id));
    }

    let voucher = state.db.vouchers(kind).get(&id).await?;
    let product_ids: Vec<String> = voucher.items.iter().map(|i| i.product_id.clone()).collect();
    let products = state.db.products().get_many(&product_ids).await?;
    let company = match voucher.voucher.party_id.as_deref() {
        Some(party_id) => state.db.companies().get_by_id(party_id).await?,
        None => None,
    };

    let text = invoice::render_text(
        &voucher,
        &products,
        company.as_ref(),
        &state.config.currency_symbol,
    );
    Ok(([(CONTENT_TYPE, "text/plain; charset=utf-8")], text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::routes::test_support::{product, state, user};
    use stockline_core::{Role, VoucherLineInput, VoucherStatus};

    fn input(product_id: &str, quantity: i64, post: bool) -> VoucherInput {
        VoucherInput {
            voucher_number: None,
            party_id: None,
            party_name: Some("Counter".to_string()),
            voucher_date: None,
            discount: None,
            tax_bps: 0,
            notes: None,
            post,
            items: vec![VoucherLineInput {
                product_id: product_id.to_string(),
                quantity,
                unit_price: None,
            }],
        }
    }

    async fn stock(state: &AppState, id: &str) -> i64 {
        state.db.products().get(id).await.unwrap().stock
    }

    #[tokio::test]
    async fn test_sales_voucher_post_and_cancel() {
        let state = state().await;
        let p = product(&state, "TEA-1", 10).await;
        let sales = Extension(VoucherKind::Sales);

        let err = create(
            State(state.clone()),
            sales.clone(),
            user(Role::Staff),
            Json(input(&p.id, 2, false)),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let (_, Json(draft)) = create(
            State(state.clone()),
            sales.clone(),
            user(Role::Manager),
            Json(input(&p.id, 2, false)),
        )
        .await
        .unwrap();
        assert_eq!(draft.voucher.status, VoucherStatus::Draft);
        assert!(draft.voucher.voucher_number.starts_with("SV-"));
        assert_eq!(stock(&state, &p.id).await, 10);

        let id = draft.voucher.id.clone();
        let Json(posted) = post_voucher(
            State(state.clone()),
            sales.clone(),
            user(Role::Manager),
            Path(id.clone()),
        )
        .await
        .unwrap();
        assert_eq!(posted.voucher.status, VoucherStatus::Posted);
        assert_eq!(stock(&state, &p.id).await, 8);

        let Json(cancelled) = cancel(
            State(state.clone()),
            sales.clone(),
            user(Role::Manager),
            Path(id.clone()),
        )
        .await
        .unwrap();
        assert_eq!(cancelled.voucher.status, VoucherStatus::Cancelled);
        assert_eq!(stock(&state, &p.id).await, 10);

        let err = post_voucher(State(state), sales, user(Role::Manager), Path(id))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);
    }

    #[tokio::test]
    async fn test_kinds_are_separate() {
        let state = state().await;
        let p = product(&state, "TEA-1", 0).await;

        let (_, Json(receipt)) = create(
            State(state.clone()),
            Extension(VoucherKind::Purchase),
            user(Role::Manager),
            Json(input(&p.id, 5, true)),
        )
        .await
        .unwrap();
        assert!(receipt.voucher.voucher_number.starts_with("PV-"));
        assert_eq!(stock(&state, &p.id).await, 5);

        let err = show(
            State(state.clone()),
            Extension(VoucherKind::Sales),
            user(Role::Guest),
            Path(receipt.voucher.id.clone()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        remove(
            State(state.clone()),
            Extension(VoucherKind::Purchase),
            user(Role::Admin),
            Path(receipt.voucher.id),
        )
        .await
        .unwrap();
        assert_eq!(stock(&state, &p.id).await, 0);
    }

    #[tokio::test]
    async fn test_invoice_is_plain_text() {
        let state = state().await;
        let p = product(&state, "TEA-1", 10).await;
        let (_, Json(voucher)) = create(
            State(state.clone()),
            Extension(VoucherKind::Sales),
            user(Role::Manager),
            Json(input(&p.id, 1, true)),
        )
        .await
        .unwrap();

        let response = invoice_text(
            State(state),
            Extension(VoucherKind::Sales),
            user(Role::Guest),
            Path(voucher.voucher.id.clone()),
        )
        .await
        .unwrap()
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
    }
}
