//! # HTTP Routes
//!
//! One module per dashboard area. Every handler takes an [`AuthUser`] and
//! checks the permission its action needs before touching the database.
//!
//! | Area            | Read          | Write                           |
//! |-----------------|---------------|---------------------------------|
//! | products        | view          | manage inventory / delete       |
//! | sales, POS      | view          | record sales / delete           |
//! | purchases       | view          | manage inventory / delete       |
//! | returns         | view          | manage inventory / delete       |
//! | vouchers        | view          | record sales or manage inventory|
//! | companies       | view          | manage inventory / delete       |
//! | reports         | view          | export reports (CSV)            |
//! | users           | manage users  | manage users (rank rules)       |
//!
//! [`AuthUser`]: crate::auth::AuthUser

pub mod auth;
pub mod companies;
pub mod health;
pub mod pos;
pub mod products;
pub mod purchases;
pub mod reports;
pub mod returns;
pub mod sales;
pub mod users;
pub mod vouchers;

use axum::Router;
use chrono::NaiveDate;
use serde::Deserialize;
use stockline_core::picker::PageRequest;
use stockline_core::report::DateRange;
use stockline_core::MAX_PAGE_SIZE;

use crate::config::ApiConfig;
use crate::error::ApiResult;
use crate::AppState;

/// All routes, still waiting for their state.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(products::routes())
        .merge(sales::routes())
        .merge(purchases::routes())
        .merge(returns::routes())
        .merge(vouchers::routes())
        .merge(companies::routes())
        .merge(users::routes())
        .merge(pos::routes())
        .merge(reports::routes())
}

/// `?page=2&pageSize=50`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl ListQuery {
    pub fn page_request(&self, config: &ApiConfig) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(1),
            self.page_size.unwrap_or(config.default_page_size),
        )
        .clamped(MAX_PAGE_SIZE)
    }
}

/// `?from=2026-03-01&to=2026-03-31`, both ends inclusive and optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RangeQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl RangeQuery {
    pub fn range(&self) -> ApiResult<DateRange> {
        Ok(DateRange::new(self.from, self.to)?)
    }
}
