use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    Json,
};

use millerp_accounting::NewPendingEntry;

use crate::app::dto::{self, PendingQuery, PostPendingRequest};
use crate::app::errors;
use crate::app::routes::common::respond;
use crate::app::services::AppServices;

pub async fn list_pending(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<PendingQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(q) = match query {
        Ok(q) => q,
        Err(rej) => return errors::query_rejection(rej),
    };
    let result = q
        .category()
        .and_then(|category| services.pending.list_pending(category));
    respond(StatusCode::OK, result)
}

pub async fn enqueue(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<NewPendingEntry>, JsonRejection>,
) -> axum::response::Response {
    let Json(new) = match body {
        Ok(b) => b,
        Err(rej) => return errors::json_rejection(rej),
    };
    respond(StatusCode::CREATED, services.pending.enqueue(new))
}

pub async fn get_pending(
    Extension(services): Extension<Arc<AppServices>>,
    Path(pricing_id): Path<String>,
) -> axum::response::Response {
    let result = dto::parse_pricing_id(&pricing_id).and_then(|id| services.pending.get(id));
    respond(StatusCode::OK, result)
}

pub async fn post_pending(
    Extension(services): Extension<Arc<AppServices>>,
    Path(pricing_id): Path<String>,
    body: Result<Json<PostPendingRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(req) = match body {
        Ok(b) => b,
        Err(rej) => return errors::json_rejection(rej),
    };
    let result = dto::parse_pricing_id(&pricing_id)
        .and_then(|id| services.posting.post_pending_entry(req.into_command(id)));
    respond(StatusCode::CREATED, result)
}
