//! HTTP API over the ledger services.

pub mod app;
pub mod config;
pub mod middleware;
