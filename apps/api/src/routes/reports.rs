//! Dashboard reports and CSV exports.
//!
//! Every figure is computed from calculated stock, never from the stored
//! column alone.

use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use stockline_core::report::export::{self, ExportKind};
use stockline_core::report::{self, ReconciliationReport, ReportSummary};
use stockline_core::stock::StockSnapshot;
use stockline_core::Permission;
use tracing::{debug, info};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::routes::RangeQuery;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports/summary", get(summary))
        .route("/reports/low-stock", get(low_stock))
        .route("/reports/reconciliation", get(reconciliation))
        .route("/reports/export/{file}", get(export_csv))
}

/// `GET /reports/summary?from=&to=`
pub async fn summary(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Json<ReportSummary>> {
    user.require(Permission::View)?;
    let range = query.range()?;
    let data = state.db.reports().load(&range).await?;
    let snapshots = state.db.stock().snapshots().await?;
    debug!(from = ?range.from, to = ?range.to, "Report summary");
    Ok(Json(report::summarize(&data, &snapshots, &range)))
}

/// `GET /reports/low-stock`, emptiest first.
pub async fn low_stock(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<StockSnapshot>>> {
    user.require(Permission::View)?;
    let snapshots = state.db.stock().snapshots().await?;
    Ok(Json(report::low_stock(&snapshots)))
}

/// `GET /reports/reconciliation`, drifted products first.
pub async fn reconciliation(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ReconciliationReport>> {
    user.require(Permission::View)?;
    let snapshots = state.db.stock().snapshots().await?;
    Ok(Json(report::stock_reconciliation(&snapshots)))
}

/// `GET /reports/export/{kind}.csv?from=&to=`
///
/// The range narrows the sales and purchases exports.
pub async fn export_csv(
    State(state): State<AppState>,
    user: AuthUser,
    Path(file): Path<String>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<impl IntoResponse> {
    user.require(Permission::ExportReports)?;
    let kind: ExportKind = file.parse()?;
    let range = query.range()?;

    let body = match kind {
        ExportKind::Products => {
            let products = state.db.products().list_all().await?;
            let snapshots = state.db.stock().snapshots().await?;
            export::products_csv(&products, &snapshots)?
        }
        ExportKind::Sales => {
            let products = state.db.products().list_all().await?;
            let sales = state.db.sales().list_range(&range).await?;
            export::sales_csv(&sales, &products)?
        }
        ExportKind::Purchases => {
            let products = state.db.products().list_all().await?;
            let purchases = state.db.purchases().list_range(&range).await?;
            export::purchases_csv(&purchases, &products)?
        }
        ExportKind::Reconciliation => {
            let snapshots = state.db.stock().snapshots().await?;
            export::reconciliation_csv(&snapshots)?
        }
    };

    info!(export = kind.as_str(), bytes = body.len(), by = %user.email, "CSV exported");
    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", kind.file_name()),
            ),
        ],
        body,
    ))
}
