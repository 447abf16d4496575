use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use millerp_core::DomainResult;

use crate::app::errors;

/// Serialize `result` with `status`, or map the domain error.
pub fn respond<T: Serialize>(status: StatusCode, result: DomainResult<T>) -> axum::response::Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
