use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use millerp_core::DomainResult;

use crate::config::ApiConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the router over the configured store.
///
/// Must run on the multi-threaded tokio runtime: the Postgres store bridges
/// its synchronous calls with `block_in_place`.
pub async fn build_app(config: &ApiConfig) -> DomainResult<Router> {
    let services = AppServices::for_backend(&config.store).await?;
    if config.seed_chart {
        let heads = services.chart.seed_standard_heads()?;
        tracing::info!(created = heads.len(), "standard chart heads seeded");
    }
    Ok(router_with(Arc::new(services)))
}

/// Router over existing services (tests share the services with the server).
pub fn router_with(services: Arc<AppServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(Extension(services))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::request_logging)),
        )
}
