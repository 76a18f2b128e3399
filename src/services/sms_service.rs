//! Outbound SMS to the account owner.
//!
//! [`TwilioClient`] sends through Twilio's Messages API. When the SMS
//! variables are incomplete, [`LogOnlyNotifier`] is used instead and messages
//! only reach the log.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::config::SmsCredentials;

const TWILIO_API: &str = "https://api.twilio.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors sending an SMS.
#[derive(Debug, thiserror::Error)]
pub enum SmsError {
    #[error("Twilio returned {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Delivers a text message to the account owner.
#[async_trait]
pub trait SmsNotifier: Send + Sync {
    async fn notify(&self, message: &str) -> Result<(), SmsError>;
}

/// Sends messages through Twilio.
pub struct TwilioClient {
    http: reqwest::Client,
    base_url: String,
    credentials: SmsCredentials,
}

impl TwilioClient {
    pub fn new(credentials: SmsCredentials) -> Result<Self, SmsError> {
        Self::with_base_url(TWILIO_API, credentials)
    }

    pub fn with_base_url(base_url: &str, credentials: SmsCredentials) -> Result<Self, SmsError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }
}

#[async_trait]
impl SmsNotifier for TwilioClient {
    /// # Request
    ///
    /// `POST /2010-04-01/Accounts/{sid}/Messages.json` with basic auth
    /// `(sid, auth token)` and form fields `To`, `From`, `Body`.
    async fn notify(&self, message: &str) -> Result<(), SmsError> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.credentials.account_sid
        );

        let response = self
            .http
            .post(url)
            .basic_auth(
                &self.credentials.account_sid,
                Some(&self.credentials.auth_token),
            )
            .form(&[
                ("To", self.credentials.to_number.as_str()),
                ("From", self.credentials.from_number.as_str()),
                ("Body", message),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SmsError::Api { status, body });
        }

        tracing::info!("SMS sent to account owner");

        Ok(())
    }
}

/// Stand-in used when Twilio is not configured.
#[derive(Debug, Default)]
pub struct LogOnlyNotifier;

#[async_trait]
impl SmsNotifier for LogOnlyNotifier {
    async fn notify(&self, message: &str) -> Result<(), SmsError> {
        tracing::info!(sms = message, "SMS disabled, message not sent");

        Ok(())
    }
}
