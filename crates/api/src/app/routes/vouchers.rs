use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    Json,
};

use millerp_accounting::{NewExpense, NewPayment};

use crate::app::errors;
use crate::app::routes::common::respond;
use crate::app::services::AppServices;

pub async fn record_payment(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<NewPayment>, JsonRejection>,
) -> axum::response::Response {
    let Json(new) = match body {
        Ok(b) => b,
        Err(rej) => return errors::json_rejection(rej),
    };
    respond(StatusCode::CREATED, services.vouchers.record_payment(new))
}

pub async fn list_payments(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    respond(StatusCode::OK, services.store.payments())
}

pub async fn record_expense(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<NewExpense>, JsonRejection>,
) -> axum::response::Response {
    let Json(new) = match body {
        Ok(b) => b,
        Err(rej) => return errors::json_rejection(rej),
    };
    respond(StatusCode::CREATED, services.vouchers.record_expense(new))
}

pub async fn list_expenses(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    respond(StatusCode::OK, services.store.expenses())
}
