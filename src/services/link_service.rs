//! Linking a bank connection.
//!
//! The Link page posts the public token it receives to `/webhook`; this
//! service trades it for a long-lived access token and stores it on the single
//! linked account.

use crate::error::AppError;
use crate::models::linked_account::LinkedAccount;
use crate::services::plaid_client::Aggregator;
use crate::stores::LedgerStore;

/// Exchange `public_token` and save the resulting access token and item id.
///
/// # Process
///
/// 1. Ask the aggregator for an access token and item id
/// 2. Create the linked account, or overwrite the existing one
///
/// # Errors
///
/// - `Aggregator`: the exchange was rejected; nothing is written
/// - `Database`: the row could not be saved
pub async fn link_item(
    store: &dyn LedgerStore,
    aggregator: &dyn Aggregator,
    public_token: &str,
) -> Result<LinkedAccount, AppError> {
    let exchange = aggregator.exchange_public_token(public_token).await?;

    let account = store
        .save_item_link(&exchange.access_token, &exchange.item_id)
        .await?;

    tracing::info!(
        item_id = %account.item_id,
        access_token = %mask_token(&account.access_token),
        "Linked item saved"
    );

    Ok(account)
}

/// Keep only the last four characters of a secret for logging.
pub fn mask_token(token: &str) -> String {
    let visible: String = token
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    format!("****{visible}")
}
