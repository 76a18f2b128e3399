//! Reconciliation kick-off.
//!
//! Starting is an HTTP call; the rest of the conversation happens over SMS
//! (see [`crate::handlers::sms`]).

use axum::{Json, extract::State};

use crate::{
    error::AppError,
    services::reconcile_service::{self, ReconcileStart},
    state::AppState,
};

/// Start reconciling pending transactions over SMS.
///
/// # Endpoint
///
/// `POST /api/reconcile/start`
///
/// # Response (200 OK)
///
/// ```json
/// { "status": "prompted", "transaction": { "id": 7, "name": "Coffee Shop", ... } }
/// ```
///
/// `status` is one of `prompted`, `already_reconciling` or `nothing_pending`.
pub async fn start_reconcile(
    State(state): State<AppState>,
) -> Result<Json<ReconcileStart>, AppError> {
    let outcome = reconcile_service::start(state.store.as_ref(), state.notifier.as_ref()).await?;

    Ok(Json(outcome))
}
