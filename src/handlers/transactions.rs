//! Transaction HTTP handlers.
//!
//! This module implements the transaction endpoints:
//! - POST /api/transactions/sync - Pull new transactions from Plaid
//! - GET /api/transactions/pending - Transactions awaiting approval
//! - GET /api/transactions/approved - Confirmed transactions
//! - POST /api/transactions/pending/{id}/approve - Confirm one transaction
//! - POST /api/transactions/pending/{id}/reject - Discard one transaction

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    error::AppError,
    models::transaction::{LedgerTransaction, SyncSummary},
    services::sync_service,
    state::AppState,
};

/// Sync new transactions for the linked account.
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "added": 3,
///   "removed": 0,
///   "next_cursor": "CAESJ..."
/// }
/// ```
///
/// - **Error (404)**: no account has been linked yet
/// - **Plaid error**: Plaid's error body with Plaid's status
pub async fn sync_transactions(
    State(state): State<AppState>,
) -> Result<Json<SyncSummary>, AppError> {
    let summary = sync_service::sync_transactions(
        state.store.as_ref(),
        state.aggregator.as_ref(),
        state.notifier.as_ref(),
    )
    .await?;

    Ok(Json(summary))
}

/// List pending transactions, oldest first.
pub async fn list_pending(
    State(state): State<AppState>,
) -> Result<Json<Vec<LedgerTransaction>>, AppError> {
    Ok(Json(state.store.pending_transactions().await?))
}

/// List approved transactions, oldest first.
pub async fn list_approved(
    State(state): State<AppState>,
) -> Result<Json<Vec<LedgerTransaction>>, AppError> {
    Ok(Json(state.store.approved_transactions().await?))
}

/// Approve a pending transaction.
///
/// # Response
///
/// - **Success (200 OK)**: the approved row (it has a new `id`)
/// - **Error (404)**: no pending transaction with this id
pub async fn approve_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<i64>,
) -> Result<Json<LedgerTransaction>, AppError> {
    let approved = state.store.approve(transaction_id).await?;

    tracing::info!(transaction_id, approved_id = approved.id, "Transaction approved");

    Ok(Json(approved))
}

/// Reject (delete) a pending transaction.
///
/// # Response
///
/// - **Success (204 No Content)**
/// - **Error (404)**: no pending transaction with this id
pub async fn reject_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.store.reject(transaction_id).await?;

    tracing::info!(transaction_id, "Transaction rejected");

    Ok(StatusCode::NO_CONTENT)
}
