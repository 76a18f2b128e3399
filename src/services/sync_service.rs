//! Incremental transaction sync.
//!
//! Pulls every page of updates after the stored cursor, queues new
//! transactions for approval and tells the owner how many arrived.

use crate::error::AppError;
use crate::models::transaction::SyncSummary;
use crate::services::plaid_client::Aggregator;
use crate::services::sms_service::SmsNotifier;
use crate::stores::LedgerStore;

/// Sync transactions for the linked account.
///
/// # Process
///
/// 1. Page through updates from the stored cursor until `has_more` is false
/// 2. Insert added transactions as pending, skipping pending, approved and rejected ids
/// 3. Delete pending rows the aggregator removed
/// 4. Store the final cursor
/// 5. If anything was added, flag the account for reconciliation and send one SMS
///
/// Modified transactions are not applied to pending rows.
///
/// # Errors
///
/// - `NoLinkedAccount`: nothing has been linked yet
/// - `Aggregator`: a page could not be fetched; the cursor is left unchanged
/// - `Database`: a write failed
///
/// A failed SMS is logged and does not fail the sync.
pub async fn sync_transactions(
    store: &dyn LedgerStore,
    aggregator: &dyn Aggregator,
    notifier: &dyn SmsNotifier,
) -> Result<SyncSummary, AppError> {
    let account = store
        .linked_account()
        .await?
        .ok_or(AppError::NoLinkedAccount)?;

    let mut cursor = account.cursor.clone();
    let mut added = 0;
    let mut removed = 0;

    loop {
        let page = aggregator
            .sync_transactions(&account.access_token, cursor.as_deref())
            .await?;

        for transaction in &page.added {
            if store
                .add_pending(&transaction.to_new_transaction())
                .await?
                .is_some()
            {
                added += 1;
            }
        }

        for transaction in &page.removed {
            removed += store
                .remove_pending_by_source_id(&transaction.transaction_id)
                .await?;
        }

        if !page.modified.is_empty() {
            tracing::debug!(count = page.modified.len(), "Ignoring modified transactions");
        }

        cursor = Some(page.next_cursor);

        if !page.has_more {
            break;
        }
    }

    if let Some(cursor) = cursor.as_deref() {
        store.save_cursor(account.id, cursor).await?;
    }

    tracing::info!(added, removed, "Transaction sync complete");

    if added > 0 {
        // Replies may have moved the reconciliation on while pages were fetched
        store.mark_needs_reconcile(account.id).await?;

        if let Err(e) = notifier.notify(&arrival_message(added)).await {
            tracing::warn!("Could not send sync notification: {}", e);
        }
    }

    Ok(SyncSummary {
        added,
        removed,
        next_cursor: cursor,
    })
}

fn arrival_message(added: usize) -> String {
    if added == 1 {
        "1 new transaction is waiting for your approval.".to_string()
    } else {
        format!("{added} new transactions are waiting for your approval.")
    }
}
