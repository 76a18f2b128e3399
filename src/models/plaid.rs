//! Plaid API request and response bodies.
//!
//! Only the fields this service reads are modelled; unknown fields in
//! responses are ignored. Link-token responses are passed to the browser
//! verbatim and therefore stay as `serde_json::Value`.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::LinkTokenSettings;
use crate::models::transaction::{NewTransaction, to_cents, truncate_text};

/// Language requested for the Link flow.
const LINK_LANGUAGE: &str = "en";

/// The service has one owner, so Link always sees the same user id.
const LINK_CLIENT_USER_ID: &str = "user";

/// Category stored when the aggregator reports none.
const UNCATEGORIZED: &str = "Uncategorized";

/// Body of `POST /link/token/create`.
///
/// ```json
/// {
///   "client_name": "YourAppName",
///   "country_codes": ["US"],
///   "language": "en",
///   "user": { "client_user_id": "user" },
///   "products": ["transactions"],
///   "webhook": "https://example.com/webhook"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkTokenCreateRequest {
    pub client_name: String,
    pub country_codes: Vec<String>,
    pub language: String,
    pub user: LinkTokenUser,
    pub products: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkTokenUser {
    pub client_user_id: String,
}

impl LinkTokenCreateRequest {
    pub fn from_settings(settings: &LinkTokenSettings) -> Self {
        Self {
            client_name: settings.client_name.clone(),
            country_codes: settings.country_codes.clone(),
            language: LINK_LANGUAGE.to_string(),
            user: LinkTokenUser {
                client_user_id: LINK_CLIENT_USER_ID.to_string(),
            },
            products: settings.products.clone(),
            webhook: settings.webhook_url.clone(),
            redirect_uri: settings.redirect_uri.clone(),
        }
    }
}

/// Body of `POST /item/public_token/exchange`.
#[derive(Debug, Serialize)]
pub struct PublicTokenExchangeRequest<'a> {
    pub public_token: &'a str,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PublicTokenExchangeResponse {
    pub access_token: String,
    pub item_id: String,
    #[serde(default)]
    pub request_id: Option<String>,
}

/// Body of `POST /transactions/sync`.
#[derive(Debug, Serialize)]
pub struct TransactionsSyncRequest<'a> {
    pub access_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<&'a str>,
}

/// One page of incremental transaction updates.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransactionsSyncResponse {
    #[serde(default)]
    pub added: Vec<PlaidTransaction>,
    #[serde(default)]
    pub modified: Vec<PlaidTransaction>,
    #[serde(default)]
    pub removed: Vec<RemovedTransaction>,
    pub next_cursor: String,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlaidTransaction {
    pub transaction_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub merchant_name: Option<String>,
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(default)]
    pub datetime: Option<DateTime<Utc>>,
    /// Legacy category hierarchy, most general first
    #[serde(default)]
    pub category: Option<Vec<String>>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub personal_finance_category: Option<PersonalFinanceCategory>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PersonalFinanceCategory {
    pub primary: String,
    #[serde(default)]
    pub detailed: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemovedTransaction {
    pub transaction_id: String,
}

impl PlaidTransaction {
    /// Map to a pending transaction row.
    ///
    /// The category name is the most specific legacy category, falling back to
    /// the personal-finance category. A missing or non-numeric `category_id`
    /// becomes 0.
    pub fn to_new_transaction(&self) -> NewTransaction {
        let name = if self.name.trim().is_empty() {
            self.merchant_name.clone().unwrap_or_default()
        } else {
            self.name.clone()
        };

        let category = self
            .category
            .as_ref()
            .and_then(|categories| categories.last().cloned())
            .or_else(|| {
                self.personal_finance_category
                    .as_ref()
                    .map(|pfc| humanize_category(&pfc.primary))
            })
            .unwrap_or_else(|| UNCATEGORIZED.to_string());

        let category_id = self
            .category_id
            .as_deref()
            .and_then(|id| id.trim().parse().ok())
            .unwrap_or(0);

        let date = self
            .datetime
            .unwrap_or_else(|| self.date.and_time(NaiveTime::MIN).and_utc());

        NewTransaction {
            source_transaction_id: Some(self.transaction_id.clone()),
            name: truncate_text(&name),
            amount_cents: to_cents(self.amount),
            category: truncate_text(&category),
            category_id,
            date,
        }
    }
}

/// `FOOD_AND_DRINK` becomes `Food and drink`.
fn humanize_category(code: &str) -> String {
    let lower = code.replace('_', " ").to_lowercase();
    let mut chars = lower.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Error body returned by Plaid with a non-2xx status.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlaidErrorBody {
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
}
