//! Point-of-sale checkout.
//!
//! ```text
//! CheckoutRequest ──► cart at catalogue prices ──┐
//!                                                ▼
//!            BEGIN IMMEDIATE: calculated stock check ──► posted SV voucher
//!                                                │
//!                                                └─► 422 INSUFFICIENT_STOCK
//! ```

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use stockline_core::pos::{CartTotals, CheckoutRequest};
use stockline_core::{Permission, VoucherKind, VoucherWithItems};
use tracing::info;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub voucher: VoucherWithItems,
    pub totals: CartTotals,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/pos/checkout", post(checkout))
}

/// `POST /pos/checkout`
///
/// Prices come from the catalogue, never from the request. Every line must
/// be covered by calculated stock.
pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CheckoutRequest>,
) -> ApiResult<(StatusCode, Json<CheckoutResponse>)> {
    user.require(Permission::RecordSales)?;

    let ids: Vec<String> = request.items.iter().map(|l| l.product_id.clone()).collect();
    let products = state.db.products().get_many(&ids).await?;
    let cart = request.to_cart(&products)?;

    let voucher = state
        .db
        .vouchers(VoucherKind::Sales)
        .checkout(
            &cart,
            request.party_id.clone(),
            request.party_name.clone(),
            request.notes.clone(),
        )
        .await?;
    let totals = CartTotals::from(&cart);

    info!(
        number = %voucher.voucher.voucher_number,
        items = totals.item_count,
        total_cents = totals.total_cents,
        by = %user.email,
        "Checkout complete"
    );
    Ok((StatusCode::CREATED, Json(CheckoutResponse { voucher, totals })))
}
