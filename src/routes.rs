//! HTTP route table.

use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{handlers, state::AppState};

/// Route paths, shared by the router and the tests.
pub mod endpoints {
    pub const HOME: &str = "/";
    pub const HEALTH: &str = "/health";
    pub const CREATE_LINK_TOKEN: &str = "/api/create_link_token";
    pub const WEBHOOK: &str = "/webhook";
    pub const SYNC_TRANSACTIONS: &str = "/api/transactions/sync";
    pub const PENDING_TRANSACTIONS: &str = "/api/transactions/pending";
    pub const APPROVED_TRANSACTIONS: &str = "/api/transactions/approved";
    pub const APPROVE_TRANSACTION: &str = "/api/transactions/pending/{id}/approve";
    pub const REJECT_TRANSACTION: &str = "/api/transactions/pending/{id}/reject";
    pub const RECONCILE_START: &str = "/api/reconcile/start";
    pub const SMS: &str = "/sms";
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Link flow
        .route(endpoints::HOME, get(handlers::home::index))
        .route(
            endpoints::CREATE_LINK_TOKEN,
            post(handlers::link_token::create_link_token),
        )
        .route(endpoints::WEBHOOK, post(handlers::webhooks::receive_webhook))
        // Transactions
        .route(
            endpoints::SYNC_TRANSACTIONS,
            post(handlers::transactions::sync_transactions),
        )
        .route(
            endpoints::PENDING_TRANSACTIONS,
            get(handlers::transactions::list_pending),
        )
        .route(
            endpoints::APPROVED_TRANSACTIONS,
            get(handlers::transactions::list_approved),
        )
        .route(
            endpoints::APPROVE_TRANSACTION,
            post(handlers::transactions::approve_transaction),
        )
        .route(
            endpoints::REJECT_TRANSACTION,
            post(handlers::transactions::reject_transaction),
        )
        // Reconciliation over SMS
        .route(
            endpoints::RECONCILE_START,
            post(handlers::reconcile::start_reconcile),
        )
        .route(endpoints::SMS, post(handlers::sms::receive_sms))
        .route(endpoints::HEALTH, get(handlers::health::health_check))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
