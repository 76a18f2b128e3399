//! Plaid API client.
//!
//! The [`Aggregator`] trait is what handlers and services depend on;
//! [`PlaidClient`] implements it over HTTP.
//!
//! # Headers Sent
//!
//! - `PLAID-CLIENT-ID`, `PLAID-SECRET`: credentials from the environment
//! - `Plaid-Version: 2020-09-14`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use url::Url;

use crate::models::plaid::{
    LinkTokenCreateRequest, PlaidErrorBody, PublicTokenExchangeRequest,
    PublicTokenExchangeResponse, TransactionsSyncRequest, TransactionsSyncResponse,
};

/// API version pinned for every request.
const PLAID_VERSION: &str = "2020-09-14";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors talking to Plaid.
#[derive(Debug, thiserror::Error)]
pub enum PlaidError {
    /// Plaid answered with a non-2xx status. `body` is its JSON error object,
    /// or the raw text as a JSON string when the body was not JSON.
    #[error("Plaid returned {status}: {}", describe(.body))]
    Api { status: StatusCode, body: Value },

    /// The request never got a usable answer (connection, timeout, decoding).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid Plaid URL: {0}")]
    Url(#[from] url::ParseError),
}

fn describe(body: &Value) -> String {
    match serde_json::from_value::<PlaidErrorBody>(body.clone()) {
        Ok(PlaidErrorBody {
            error_code: Some(code),
            error_message: Some(message),
            ..
        }) => format!("{code}: {message}"),
        _ => body.to_string(),
    }
}

/// Operations the service needs from the bank-data aggregator.
#[async_trait]
pub trait Aggregator: Send + Sync {
    /// Create a Link token. The response body is returned untouched.
    async fn create_link_token(
        &self,
        request: &LinkTokenCreateRequest,
    ) -> Result<Value, PlaidError>;

    /// Exchange a Link public token for an access token and item id.
    async fn exchange_public_token(
        &self,
        public_token: &str,
    ) -> Result<PublicTokenExchangeResponse, PlaidError>;

    /// Fetch one page of transaction updates after `cursor`.
    async fn sync_transactions(
        &self,
        access_token: &str,
        cursor: Option<&str>,
    ) -> Result<TransactionsSyncResponse, PlaidError>;
}

/// HTTP client for the Plaid API.
pub struct PlaidClient {
    http: reqwest::Client,
    base_url: Url,
    client_id: String,
    secret: String,
}

impl PlaidClient {
    /// Create a client for `base_url` (see [`crate::config::PlaidEnvironment::base_url`]).
    pub fn new(
        base_url: &str,
        client_id: impl Into<String>,
        secret: impl Into<String>,
    ) -> Result<Self, PlaidError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
            client_id: client_id.into(),
            secret: secret.into(),
        })
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, PlaidError>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.base_url.join(path)?;

        let response = self
            .http
            .post(url)
            .header("PLAID-CLIENT-ID", &self.client_id)
            .header("PLAID-SECRET", &self.secret)
            .header("Plaid-Version", PLAID_VERSION)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await?;
            let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
            return Err(PlaidError::Api { status, body });
        }

        Ok(response.json::<R>().await?)
    }
}

#[async_trait]
impl Aggregator for PlaidClient {
    async fn create_link_token(
        &self,
        request: &LinkTokenCreateRequest,
    ) -> Result<Value, PlaidError> {
        self.post("/link/token/create", request).await
    }

    async fn exchange_public_token(
        &self,
        public_token: &str,
    ) -> Result<PublicTokenExchangeResponse, PlaidError> {
        self.post(
            "/item/public_token/exchange",
            &PublicTokenExchangeRequest { public_token },
        )
        .await
    }

    async fn sync_transactions(
        &self,
        access_token: &str,
        cursor: Option<&str>,
    ) -> Result<TransactionsSyncResponse, PlaidError> {
        self.post(
            "/transactions/sync",
            &TransactionsSyncRequest {
                access_token,
                cursor,
            },
        )
        .await
    }
}
