//! Customers and suppliers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use stockline_core::{Company, CompanyInput, CompanyKind, Permission};
use tracing::info;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::AppState;

/// `?side=customer` lists customers plus companies on both sides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyQuery {
    pub side: Option<CompanyKind>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/companies", get(list).post(create))
        .route("/companies/{id}", get(show).put(update).delete(remove))
}

pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<CompanyQuery>,
) -> ApiResult<Json<Vec<Company>>> {
    user.require(Permission::View)?;
    Ok(Json(state.db.companies().list(query.side).await?))
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CompanyInput>,
) -> ApiResult<(StatusCode, Json<Company>)> {
    user.require(Permission::ManageInventory)?;
    let company = state.db.companies().create(&input).await?;
    info!(company_id = %company.id, name = %company.name, by = %user.email, "Company created");
    Ok((StatusCode::CREATED, Json(company)))
}

pub async fn show(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Company>> {
    user.require(Permission::View)?;
    Ok(Json(state.db.companies().get(&id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(input): Json<CompanyInput>,
) -> ApiResult<Json<Company>> {
    user.require(Permission::ManageInventory)?;
    Ok(Json(state.db.companies().update(&id, &input).await?))
}

/// Transactions that named the company keep their rows and lose the link.
pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    user.require(Permission::DeleteRecords)?;
    state.db.companies().delete(&id).await?;
    info!(company_id = %id, by = %user.email, "Company deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::routes::test_support::{state, user};
    use stockline_core::Role;

    fn input(name: &str, kind: CompanyKind) -> CompanyInput {
        CompanyInput {
            name: name.to_string(),
            kind,
            contact_person: None,
            phone: None,
            email: None,
            address: None,
            tax_number: None,
            is_active: None,
        }
    }

    #[tokio::test]
    async fn test_company_crud_and_side_filter() {
        let state = state().await;
        for (name, kind) in [
            ("Hill Traders", CompanyKind::Customer),
            ("Acme Supply", CompanyKind::Supplier),
            ("Riverside", CompanyKind::Both),
        ] {
            create(State(state.clone()), user(Role::Manager), Json(input(name, kind)))
                .await
                .unwrap();
        }

        let Json(suppliers) = list(
            State(state.clone()),
            user(Role::Guest),
            Query(CompanyQuery {
                side: Some(CompanyKind::Supplier),
            }),
        )
        .await
        .unwrap();
        let names: Vec<&str> = suppliers.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Acme Supply", "Riverside"]);

        let id = suppliers[0].id.clone();
        let Json(renamed) = update(
            State(state.clone()),
            user(Role::Manager),
            Path(id.clone()),
            Json(input("Acme Wholesale", CompanyKind::Supplier)),
        )
        .await
        .unwrap();
        assert_eq!(renamed.name, "Acme Wholesale");

        let err = remove(State(state.clone()), user(Role::Manager), Path(id.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
        remove(State(state.clone()), user(Role::Admin), Path(id.clone()))
            .await
            .unwrap();

        let err = show(State(state), user(Role::Guest), Path(id)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
