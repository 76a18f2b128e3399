//! Persistence behind a trait.
//!
//! Handlers and services only see [`LedgerStore`]; the PostgreSQL
//! implementation lives in [`postgres`]. Tests swap in an in-memory store.

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::linked_account::{LinkedAccount, ReconcileState};
use crate::models::transaction::{LedgerTransaction, NewTransaction};

pub mod postgres;

pub use postgres::PgLedgerStore;

/// Storage for the linked account and its pending/approved transactions.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Check the database answers at all.
    async fn ping(&self) -> Result<(), AppError>;

    /// The first linked account by id, if any.
    async fn linked_account(&self) -> Result<Option<LinkedAccount>, AppError>;

    /// Create the linked account, or overwrite the token and item of the
    /// existing one. Never creates a second row.
    async fn save_item_link(
        &self,
        access_token: &str,
        item_id: &str,
    ) -> Result<LinkedAccount, AppError>;

    async fn save_cursor(&self, account_id: i32, cursor: &str) -> Result<(), AppError>;

    async fn save_reconcile_state(
        &self,
        account_id: i32,
        state: &ReconcileState,
    ) -> Result<(), AppError>;

    /// Set `needs_reconcile` and nothing else.
    async fn mark_needs_reconcile(&self, account_id: i32) -> Result<(), AppError>;

    /// Insert a pending transaction.
    ///
    /// Returns `None` when the source transaction id is already pending,
    /// approved or rejected.
    async fn add_pending(
        &self,
        transaction: &NewTransaction,
    ) -> Result<Option<LedgerTransaction>, AppError>;

    /// Delete pending rows with this source id, returning how many went.
    async fn remove_pending_by_source_id(&self, source_transaction_id: &str)
    -> Result<u64, AppError>;

    /// Pending transactions, oldest first.
    async fn pending_transactions(&self) -> Result<Vec<LedgerTransaction>, AppError>;

    /// Approved transactions, oldest first.
    async fn approved_transactions(&self) -> Result<Vec<LedgerTransaction>, AppError>;

    async fn pending_transaction(&self, id: i64) -> Result<Option<LedgerTransaction>, AppError>;

    /// Move a pending transaction to the approved table atomically.
    ///
    /// Returns [`AppError::TransactionNotFound`] if `id` is not pending.
    async fn approve(&self, id: i64) -> Result<LedgerTransaction, AppError>;

    /// Delete a pending transaction and remember its source id as rejected.
    ///
    /// Returns [`AppError::TransactionNotFound`] if `id` is not pending.
    async fn reject(&self, id: i64) -> Result<(), AppError>;
}
