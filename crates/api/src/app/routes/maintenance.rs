use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode};

use crate::app::routes::common::respond;
use crate::app::services::AppServices;

/// Dry run: what a cleanup would remove.
pub async fn find_duplicates(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    respond(StatusCode::OK, services.ledger.find_duplicates())
}

pub async fn cleanup_duplicates(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    respond(StatusCode::OK, services.ledger.cleanup_duplicates())
}
