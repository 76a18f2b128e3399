//! Linked account model.
//!
//! The service tracks exactly one bank connection. The table may in principle
//! hold more rows, but every lookup takes the first row by id.

use chrono::{DateTime, Utc};

/// Represents the `linked_accounts` row created by the public-token exchange.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct LinkedAccount {
    pub id: i32,

    /// Long-lived aggregator token. Never logged or returned to clients.
    pub access_token: String,

    /// Aggregator identifier of the connection
    pub item_id: String,

    /// Marker returned by the last incremental sync, `None` before the first sync
    pub cursor: Option<String>,

    /// Start of the month currently being reconciled
    pub current_month: DateTime<Utc>,

    pub needs_reconcile: bool,

    pub currently_reconciling: bool,

    /// Id of the pending transaction the owner is being asked about, as text
    pub current_tx: Option<String>,
}

impl LinkedAccount {
    pub fn reconcile_state(&self) -> ReconcileState {
        ReconcileState {
            needs_reconcile: self.needs_reconcile,
            currently_reconciling: self.currently_reconciling,
            current_tx: self.current_tx.clone(),
            current_month: self.current_month,
        }
    }
}

/// The reconciliation columns of a [`LinkedAccount`], written together.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileState {
    pub needs_reconcile: bool,
    pub currently_reconciling: bool,
    pub current_tx: Option<String>,
    pub current_month: DateTime<Utc>,
}

impl ReconcileState {
    /// The pending transaction id stored in `current_tx`, if it parses.
    pub fn current_transaction_id(&self) -> Option<i64> {
        self.current_tx.as_deref()?.trim().parse().ok()
    }
}
