//! Customer and supplier returns.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use stockline_core::picker::Page;
use stockline_core::{Permission, PurchaseReturn, PurchaseReturnInput, SalesReturn, SalesReturnInput};
use tracing::info;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::routes::ListQuery;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sales-returns", get(list_sales_returns).post(create_sales_return))
        .route("/sales-returns/{id}", delete(remove_sales_return))
        .route(
            "/purchase-returns",
            get(list_purchase_returns).post(create_purchase_return),
        )
        .route("/purchase-returns/{id}", delete(remove_purchase_return))
}

// =============================================================================
// Sales Returns
// =============================================================================

pub async fn list_sales_returns(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Page<SalesReturn>>> {
    user.require(Permission::View)?;
    let request = query.page_request(&state.config);
    Ok(Json(state.db.sales_returns().list(request).await?))
}

/// Goods back from a customer, capped at what the sale still has
/// outstanding.
pub async fn create_sales_return(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<SalesReturnInput>,
) -> ApiResult<(StatusCode, Json<SalesReturn>)> {
    user.require(Permission::ManageInventory)?;
    let ret = state.db.sales_returns().insert(&input).await?;
    info!(
        return_id = %ret.id,
        sale_id = ?ret.sale_id,
        quantity = ret.quantity,
        by = %user.email,
        "Sales return recorded"
    );
    Ok((StatusCode::CREATED, Json(ret)))
}

pub async fn remove_sales_return(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    user.require(Permission::DeleteRecords)?;
    state.db.sales_returns().delete(&id).await?;
    info!(return_id = %id, by = %user.email, "Sales return deleted");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Purchase Returns
// =============================================================================

pub async fn list_purchase_returns(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Page<PurchaseReturn>>> {
    user.require(Permission::View)?;
    let request = query.page_request(&state.config);
    Ok(Json(state.db.purchase_returns().list(request).await?))
}

/// Goods sent back to a supplier. Only received purchase lines qualify.
pub async fn create_purchase_return(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<PurchaseReturnInput>,
) -> ApiResult<(StatusCode, Json<PurchaseReturn>)> {
    user.require(Permission::ManageInventory)?;
    let ret = state.db.purchase_returns().insert(&input).await?;
    info!(
        return_id = %ret.id,
        purchase_id = ?ret.purchase_id,
        quantity = ret.quantity,
        by = %user.email,
        "Purchase return recorded"
    );
    Ok((StatusCode::CREATED, Json(ret)))
}

pub async fn remove_purchase_return(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    user.require(Permission::DeleteRecords)?;
    state.db.purchase_returns().delete(&id).await?;
    info!(return_id = %id, by = %user.email, "Purchase return deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::routes::test_support::{product, state, user};
    use stockline_core::{PurchaseLineInput, PurchaseOrderInput, PurchaseStatus, Role, SaleInput};

    async fn stock(state: &AppState, id: &str) -> i64 {
        state.db.products().get(id).await.unwrap().stock
    }

    #[tokio::test]
    async fn test_sales_return_against_sale() {
        let state = state().await;
        let p = product(&state, "TEA-1", 10).await;
        let sale = state
            .db
            .sales()
            .insert(&SaleInput {
                reference: None,
                product_id: p.id.clone(),
                customer_id: None,
                customer_name: None,
                quantity: 3,
                unit_price: None,
                discount: None,
                sale_date: None,
                notes: None,
            })
            .await
            .unwrap();

        let input = |quantity| SalesReturnInput {
            sale_id: Some(sale.id.clone()),
            product_id: p.id.clone(),
            quantity,
            refund: None,
            reason: Some("damaged".to_string()),
            return_date: None,
        };

        let err = create_sales_return(State(state.clone()), user(Role::Staff), Json(input(1)))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let (_, Json(ret)) =
            create_sales_return(State(state.clone()), user(Role::Manager), Json(input(2)))
                .await
                .unwrap();
        assert_eq!(ret.refund_cents, 2 * 650);
        assert_eq!(stock(&state, &p.id).await, 9);

        let err = create_sales_return(State(state.clone()), user(Role::Manager), Json(input(2)))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        remove_sales_return(State(state.clone()), user(Role::Admin), Path(ret.id))
            .await
            .unwrap();
        assert_eq!(stock(&state, &p.id).await, 7);

        let Json(page) = list_sales_returns(
            State(state),
            user(Role::Guest),
            Query(ListQuery::default()),
        )
        .await
        .unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_purchase_return_needs_received_line() {
        let state = state().await;
        let p = product(&state, "TEA-1", 0).await;
        let order = state
            .db
            .purchases()
            .insert_order(&PurchaseOrderInput {
                supplier_id: None,
                purchase_date: None,
                status: Some(PurchaseStatus::Pending),
                notes: None,
                lines: vec![PurchaseLineInput {
                    product_id: p.id.clone(),
                    quantity: 6,
                    unit_cost: None,
                }],
            })
            .await
            .unwrap();
        let line_id = order.lines[0].id.clone();

        let input = PurchaseReturnInput {
            purchase_id: Some(line_id.clone()),
            product_id: p.id.clone(),
            supplier_id: None,
            quantity: 2,
            credit: None,
            reason: None,
            return_date: None,
        };

        let err = create_purchase_return(
            State(state.clone()),
            user(Role::Manager),
            Json(input.clone()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);

        state.db.purchases().receive(&line_id).await.unwrap();
        let (_, Json(ret)) =
            create_purchase_return(State(state.clone()), user(Role::Manager), Json(input))
                .await
                .unwrap();
        assert_eq!(ret.credit_cents, 2 * 400);
        assert_eq!(stock(&state, &p.id).await, 4);
    }
}
