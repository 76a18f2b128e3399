//! Reconciliation over SMS.
//!
//! The owner is asked about one pending transaction at a time. The id of the
//! transaction being asked about lives in the linked account's `current_tx`
//! column, so a reply can arrive on any request.

use chrono::Utc;
use serde::Serialize;

use crate::error::AppError;
use crate::models::linked_account::ReconcileState;
use crate::models::sms::ReplyDecision;
use crate::models::transaction::LedgerTransaction;
use crate::services::sms_service::SmsNotifier;
use crate::stores::LedgerStore;

pub const NOTHING_TO_REVIEW: &str = "Nothing to review right now.";

pub const ALL_CAUGHT_UP: &str = "All caught up, every transaction has been reviewed.";

/// Outcome of starting a reconciliation.
///
/// ```json
/// { "status": "prompted", "transaction": { "id": 7, "name": "Coffee Shop", ... } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReconcileStart {
    /// A prompt for `transaction` was sent.
    Prompted { transaction: LedgerTransaction },

    /// The owner is already being asked about `transaction`; nothing was sent.
    AlreadyReconciling { transaction: LedgerTransaction },

    /// No pending transactions; the reconciliation flags were cleared.
    NothingPending,
}

/// Text sent to the owner for one transaction.
pub fn prompt(transaction: &LedgerTransaction) -> String {
    format!("Approve {}? Reply Y or N.", transaction.summary())
}

/// State after the last pending transaction has been dealt with.
fn finished() -> ReconcileState {
    ReconcileState {
        needs_reconcile: false,
        currently_reconciling: false,
        current_tx: None,
        current_month: Utc::now(),
    }
}

/// Begin asking the owner about pending transactions.
///
/// A running reconciliation is left alone while its current transaction is
/// still pending. If that transaction was approved, rejected or removed
/// elsewhere, the oldest pending one is prompted instead.
///
/// The prompt is sent before the state is saved, so a failed SMS leaves the
/// account untouched.
pub async fn start(
    store: &dyn LedgerStore,
    notifier: &dyn SmsNotifier,
) -> Result<ReconcileStart, AppError> {
    let account = store
        .linked_account()
        .await?
        .ok_or(AppError::NoLinkedAccount)?;
    let mut state = account.reconcile_state();

    if state.currently_reconciling {
        let current = match state.current_transaction_id() {
            Some(id) => store.pending_transaction(id).await?,
            None => None,
        };
        if let Some(transaction) = current {
            return Ok(ReconcileStart::AlreadyReconciling { transaction });
        }
        tracing::info!(current_tx = ?state.current_tx, "Current transaction is gone, moving on");
    }

    let Some(next) = store.pending_transactions().await?.into_iter().next() else {
        if state.needs_reconcile || state.currently_reconciling {
            store.save_reconcile_state(account.id, &finished()).await?;
        }
        return Ok(ReconcileStart::NothingPending);
    };

    notifier.notify(&prompt(&next)).await?;

    state.currently_reconciling = true;
    state.current_tx = Some(next.id.to_string());
    store.save_reconcile_state(account.id, &state).await?;

    tracing::info!(transaction_id = next.id, "Reconciliation started");

    Ok(ReconcileStart::Prompted { transaction: next })
}

/// Apply the owner's reply and return the text to answer with.
///
/// # Process
///
/// 1. Ignore the reply unless a reconciliation is running
/// 2. Approve or reject the current transaction; an unclear reply repeats the question
/// 3. Prompt for the next pending transaction, or finish: clear both flags and
///    `current_tx`, and move the reconciliation month to now
pub async fn handle_reply(store: &dyn LedgerStore, text: &str) -> Result<String, AppError> {
    let Some(account) = store.linked_account().await? else {
        return Ok(NOTHING_TO_REVIEW.to_string());
    };
    let mut state = account.reconcile_state();

    if !state.currently_reconciling {
        return Ok(NOTHING_TO_REVIEW.to_string());
    }

    let mut reply = String::new();

    if let Some(id) = state.current_transaction_id() {
        match ReplyDecision::parse(text) {
            ReplyDecision::Approve => match store.approve(id).await {
                Ok(approved) => reply.push_str(&format!("Approved {}. ", approved.name)),
                Err(AppError::TransactionNotFound) => {}
                Err(e) => return Err(e),
            },
            ReplyDecision::Reject => match store.reject(id).await {
                Ok(()) => reply.push_str("Rejected. "),
                Err(AppError::TransactionNotFound) => {}
                Err(e) => return Err(e),
            },
            ReplyDecision::Unknown => {
                if let Some(current) = store.pending_transaction(id).await? {
                    return Ok(format!("Sorry, I didn't get that. {}", prompt(&current)));
                }
            }
        }
    }

    match store.pending_transactions().await?.into_iter().next() {
        Some(next) => {
            state.current_tx = Some(next.id.to_string());
            store.save_reconcile_state(account.id, &state).await?;
            reply.push_str(&prompt(&next));
        }
        None => {
            store.save_reconcile_state(account.id, &finished()).await?;
            tracing::info!("Reconciliation finished");
            reply.push_str(ALL_CAUGHT_UP);
        }
    }

    Ok(reply)
}
