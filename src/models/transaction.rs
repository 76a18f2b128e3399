//! Transaction data models.
//!
//! This module defines:
//! - `LedgerTransaction`: a row of either `pending_transactions` or `approved_transactions`
//! - `NewTransaction`: the values needed to insert a pending row
//! - `SyncSummary`: the response body of a transaction sync

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Maximum length of the `name` and `category` columns.
pub const MAX_TEXT_LEN: usize = 255;

/// Represents a transaction record from the database.
///
/// # Database Tables
///
/// Both `pending_transactions` and `approved_transactions` have this shape.
/// Approving a transaction moves the row from the first table to the second,
/// so the approved row gets a new `id`.
///
/// # Amount Storage
///
/// Amounts are stored as `i64` cents using the aggregator's sign convention:
/// positive values are money leaving the account.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize)]
pub struct LedgerTransaction {
    pub id: i64,

    /// The aggregator's transaction id, used to deduplicate syncs
    pub source_transaction_id: Option<String>,

    pub name: String,

    pub amount_cents: i64,

    /// Human-readable category name
    pub category: String,

    /// Numeric aggregator category, 0 when unknown
    pub category_id: i32,

    pub date: DateTime<Utc>,
}

impl LedgerTransaction {
    /// One-line description used in SMS prompts, e.g. `Coffee Shop $4.33 (Food and Drink)`.
    pub fn summary(&self) -> String {
        format!(
            "{} {} ({})",
            self.name,
            format_cents(self.amount_cents),
            self.category
        )
    }
}

/// Values for a new pending transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub source_transaction_id: Option<String>,
    pub name: String,
    pub amount_cents: i64,
    pub category: String,
    pub category_id: i32,
    pub date: DateTime<Utc>,
}

/// Response body of `POST /api/transactions/sync`.
///
/// ```json
/// {
///   "added": 3,
///   "removed": 1,
///   "next_cursor": "CAESJ..."
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncSummary {
    pub added: usize,
    pub removed: u64,
    pub next_cursor: Option<String>,
}

/// Format cents as dollars, e.g. `-1050` becomes `-$10.50`.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();

    format!("{sign}${}.{:02}", cents / 100, cents % 100)
}

/// Convert a decimal amount to cents, rounding to the nearest cent.
pub fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Cut `text` to at most [`MAX_TEXT_LEN`] characters.
pub fn truncate_text(text: &str) -> String {
    text.chars().take(MAX_TEXT_LEN).collect()
}
