use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use millerp_accounting::{AccountUpdate, BalanceDisplay, NewAccount};
use millerp_core::AccountId;

use crate::app::dto::{self, AsOfQuery, LevelQuery, RangeQuery};
use crate::app::errors;
use crate::app::routes::common::respond;
use crate::app::services::AppServices;

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub account_id: AccountId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
    pub balance: Decimal,
    pub display: BalanceDisplay,
}

impl BalanceResponse {
    fn new(account_id: AccountId, as_of: Option<NaiveDate>, balance: Decimal) -> Self {
        Self {
            account_id,
            as_of,
            balance,
            display: BalanceDisplay::of(balance),
        }
    }
}

pub async fn create_account(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<NewAccount>, JsonRejection>,
) -> axum::response::Response {
    let Json(new) = match body {
        Ok(b) => b,
        Err(rej) => return errors::json_rejection(rej),
    };
    respond(StatusCode::CREATED, services.chart.create_account(new))
}

pub async fn list_level(
    Extension(services): Extension<Arc<AppServices>>,
    level: Result<Path<u8>, PathRejection>,
    query: Result<Query<LevelQuery>, QueryRejection>,
) -> axum::response::Response {
    let Path(level) = match level {
        Ok(p) => p,
        Err(rej) => return errors::path_rejection(rej),
    };
    let Query(q) = match query {
        Ok(q) => q,
        Err(rej) => return errors::query_rejection(rej),
    };
    let result = q.parent_id().and_then(|parent_id| {
        let account_type = q.account_type()?;
        services.chart.get_level(level, parent_id, account_type)
    });
    respond(StatusCode::OK, result)
}

pub async fn level_summary(
    Extension(services): Extension<Arc<AppServices>>,
    level: Result<Path<u8>, PathRejection>,
    query: Result<Query<LevelQuery>, QueryRejection>,
) -> axum::response::Response {
    let Path(level) = match level {
        Ok(p) => p,
        Err(rej) => return errors::path_rejection(rej),
    };
    let Query(q) = match query {
        Ok(q) => q,
        Err(rej) => return errors::query_rejection(rej),
    };
    let result = q
        .parent_id()
        .and_then(|parent_id| services.balances.level_summary(level, parent_id));
    respond(StatusCode::OK, result)
}

pub async fn get_account(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let result = dto::parse_account_id(&id).and_then(|id| services.chart.get_account(id));
    respond(StatusCode::OK, result)
}

pub async fn update_account(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<AccountUpdate>, JsonRejection>,
) -> axum::response::Response {
    let Json(update) = match body {
        Ok(b) => b,
        Err(rej) => return errors::json_rejection(rej),
    };
    let result =
        dto::parse_account_id(&id).and_then(|id| services.chart.update_account(id, update));
    respond(StatusCode::OK, result)
}

pub async fn list_children(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let result = dto::parse_account_id(&id).and_then(|id| services.chart.children(id));
    respond(StatusCode::OK, result)
}

pub async fn opening_balance(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let result = dto::parse_account_id(&id).and_then(|id| services.balances.opening_balance(id));
    respond(StatusCode::OK, result)
}

pub async fn running_balance(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    query: Result<Query<AsOfQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(q) = match query {
        Ok(q) => q,
        Err(rej) => return errors::query_rejection(rej),
    };
    let result = dto::parse_account_id(&id).and_then(|id| {
        let as_of = dto::parse_optional_date("as_of", q.as_of.as_deref())?
            .unwrap_or_else(|| Utc::now().date_naive());
        let balance = services.balances.running_balance(id, Some(as_of))?;
        Ok(BalanceResponse::new(id, Some(as_of), balance))
    });
    respond(StatusCode::OK, result)
}

pub async fn rollup_balance(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let result = dto::parse_account_id(&id).and_then(|id| {
        let balance = services.balances.rollup_balance(id)?;
        Ok(BalanceResponse::new(id, None, balance))
    });
    respond(StatusCode::OK, result)
}

pub async fn list_transactions(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(q) = match query {
        Ok(q) => q,
        Err(rej) => return errors::query_rejection(rej),
    };
    let result = dto::parse_account_id(&id).and_then(|id| {
        let (start, end) = q.bounds()?;
        services.ledger.list_for_account(id, start, end)
    });
    respond(StatusCode::OK, result)
}

pub async fn statement(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(q) = match query {
        Ok(q) => q,
        Err(rej) => return errors::query_rejection(rej),
    };
    let result = dto::parse_account_id(&id).and_then(|id| {
        let (start, end) = q.bounds()?;
        services.balances.statement(id, start, end)
    });
    respond(StatusCode::OK, result)
}
