use axum::{
    Router,
    routing::{get, post},
};

pub mod accounts;
pub mod common;
pub mod maintenance;
pub mod pending;
pub mod system;
pub mod vouchers;

/// Every ledger endpoint except `/health`.
pub fn router() -> Router {
    Router::new()
        .route("/accounts", post(accounts::create_account))
        .route("/accounts/levels/:level", get(accounts::list_level))
        .route("/accounts/levels/:level/summary", get(accounts::level_summary))
        .route(
            "/accounts/:id",
            get(accounts::get_account).patch(accounts::update_account),
        )
        .route("/accounts/:id/children", get(accounts::list_children))
        .route("/accounts/:id/opening-balance", get(accounts::opening_balance))
        .route("/accounts/:id/balance", get(accounts::running_balance))
        .route("/accounts/:id/rollup", get(accounts::rollup_balance))
        .route("/accounts/:id/transactions", get(accounts::list_transactions))
        .route("/accounts/:id/statement", get(accounts::statement))
        .route(
            "/pending",
            get(pending::list_pending).post(pending::enqueue),
        )
        .route("/pending/:pricing_id", get(pending::get_pending))
        .route("/pending/:pricing_id/post", post(pending::post_pending))
        .route(
            "/payments",
            get(vouchers::list_payments).post(vouchers::record_payment),
        )
        .route(
            "/expenses",
            get(vouchers::list_expenses).post(vouchers::record_expense),
        )
        .route("/maintenance/duplicates", get(maintenance::find_duplicates))
        .route(
            "/maintenance/duplicates/cleanup",
            post(maintenance::cleanup_duplicates),
        )
}
