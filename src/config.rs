//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to deserialize environment variables into a type-safe struct,
//! then checks the few rules that types alone cannot express.

use serde::Deserialize;

use crate::services::twilio_signature::RequestValidator;

/// Plaid API host used when `PLAID_ENV=sandbox`.
const SANDBOX_HOST: &str = "https://sandbox.plaid.com";

/// Plaid API host used for every other `PLAID_ENV` value.
const PRODUCTION_HOST: &str = "https://production.plaid.com";

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `PORT` (optional): HTTP server port, defaults to 5000
/// - `PLAID_CLIENT_ID`, `PLAID_SECRET`: aggregator credentials
/// - `PLAID_ENV` (optional): `sandbox` or `production` (default)
/// - `PLAID_PRODUCTS`, `PLAID_COUNTRY_CODES` (optional): comma separated lists
/// - `PLAID_WEBHOOK_URL`, `PLAID_REDIRECT_URI` (optional): forwarded to Link
/// - `PLAID_CLIENT_NAME` (optional): name shown inside Link
/// - `ACCOUNT_SID`, `TWILIO_AUTH`, `USER_PHONE_NUM`, `TWILIO_NUM` (optional):
///   SMS notifications are enabled only when all four are set
/// - `TWILIO_WEBHOOK_URL` (optional): public URL of `/sms`, checked against
///   Twilio's request signature; rebuilt from the `Host` header when unset
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database_url: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub plaid_client_id: String,

    #[serde(default)]
    pub plaid_secret: String,

    #[serde(default = "default_plaid_env")]
    pub plaid_env: String,

    #[serde(default = "default_products")]
    pub plaid_products: Vec<String>,

    #[serde(default = "default_country_codes")]
    pub plaid_country_codes: Vec<String>,

    pub plaid_webhook_url: Option<String>,

    pub plaid_redirect_uri: Option<String>,

    #[serde(default = "default_client_name")]
    pub plaid_client_name: String,

    pub account_sid: Option<String>,

    pub twilio_auth: Option<String>,

    pub user_phone_num: Option<String>,

    pub twilio_num: Option<String>,

    pub twilio_webhook_url: Option<String>,
}

fn default_port() -> u16 {
    5000
}

fn default_plaid_env() -> String {
    "production".to_string()
}

fn default_products() -> Vec<String> {
    vec!["transactions".to_string()]
}

fn default_country_codes() -> Vec<String> {
    vec!["US".to_string()]
}

fn default_client_name() -> String {
    "YourAppName".to_string()
}

/// Errors raised while loading [`Config`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read environment: {0}")]
    Env(#[from] envy::Error),

    #[error("DATABASE_URL is not set or is empty")]
    MissingDatabaseUrl,

    #[error("{name} is not a valid URL: {source}")]
    InvalidUrl {
        name: &'static str,
        source: url::ParseError,
    },
}

/// Which Plaid deployment the service talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaidEnvironment {
    Sandbox,
    Production,
}

impl PlaidEnvironment {
    /// Only an explicit `sandbox` selects the sandbox host.
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("sandbox") {
            PlaidEnvironment::Sandbox
        } else {
            PlaidEnvironment::Production
        }
    }

    pub fn base_url(self) -> &'static str {
        match self {
            PlaidEnvironment::Sandbox => SANDBOX_HOST,
            PlaidEnvironment::Production => PRODUCTION_HOST,
        }
    }
}

/// Everything needed to build a link-token request.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkTokenSettings {
    pub client_name: String,
    pub country_codes: Vec<String>,
    pub products: Vec<String>,
    pub webhook_url: Option<String>,
    pub redirect_uri: Option<String>,
}

/// Twilio credentials and the two phone numbers involved in a conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct SmsCredentials {
    pub account_sid: String,
    pub auth_token: String,
    /// The Twilio number messages are sent from.
    pub from_number: String,
    /// The account owner's phone.
    pub to_number: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `DATABASE_URL` is missing or empty
    /// - Environment variable values cannot be parsed into expected types
    /// - `PLAID_WEBHOOK_URL`, `PLAID_REDIRECT_URI` or `TWILIO_WEBHOOK_URL` is
    ///   set but not a URL
    pub fn from_env() -> Result<Self, ConfigError> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        Self::from_vars(std::env::vars())
    }

    /// Build a configuration from an explicit set of variables.
    ///
    /// Field names are converted the same way as for the process environment:
    /// `database_url` is read from `DATABASE_URL`.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::from_iter::<_, Config>(vars)?;
        config.normalized()
    }

    fn normalized(mut self) -> Result<Self, ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::MissingDatabaseUrl);
        }

        self.plaid_products = clean_list(self.plaid_products);
        self.plaid_country_codes = clean_list(self.plaid_country_codes);

        self.plaid_webhook_url = non_empty(self.plaid_webhook_url);
        self.plaid_redirect_uri = non_empty(self.plaid_redirect_uri);
        check_url("PLAID_WEBHOOK_URL", self.plaid_webhook_url.as_deref())?;
        check_url("PLAID_REDIRECT_URI", self.plaid_redirect_uri.as_deref())?;

        self.twilio_webhook_url = non_empty(self.twilio_webhook_url);
        check_url("TWILIO_WEBHOOK_URL", self.twilio_webhook_url.as_deref())?;

        self.account_sid = non_empty(self.account_sid);
        self.twilio_auth = non_empty(self.twilio_auth);
        self.user_phone_num = non_empty(self.user_phone_num);
        self.twilio_num = non_empty(self.twilio_num);

        Ok(self)
    }

    pub fn plaid_environment(&self) -> PlaidEnvironment {
        PlaidEnvironment::from_name(&self.plaid_env)
    }

    pub fn link_token_settings(&self) -> LinkTokenSettings {
        LinkTokenSettings {
            client_name: self.plaid_client_name.clone(),
            country_codes: self.plaid_country_codes.clone(),
            products: self.plaid_products.clone(),
            webhook_url: self.plaid_webhook_url.clone(),
            redirect_uri: self.plaid_redirect_uri.clone(),
        }
    }

    /// Checker for inbound Twilio requests, or `None` without `TWILIO_AUTH`.
    pub fn sms_request_validator(&self) -> Option<RequestValidator> {
        let auth_token = self.twilio_auth.clone()?;

        Some(RequestValidator::new(
            auth_token,
            self.twilio_webhook_url.clone(),
        ))
    }

    /// Twilio credentials, or `None` unless all four SMS variables are set.
    pub fn sms_credentials(&self) -> Option<SmsCredentials> {
        Some(SmsCredentials {
            account_sid: self.account_sid.clone()?,
            auth_token: self.twilio_auth.clone()?,
            from_number: self.twilio_num.clone()?,
            to_number: self.user_phone_num.clone()?,
        })
    }
}

fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn check_url(name: &'static str, value: Option<&str>) -> Result<(), ConfigError> {
    match value {
        Some(value) => url::Url::parse(value)
            .map(|_| ())
            .map_err(|source| ConfigError::InvalidUrl { name, source }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn missing_database_url_is_rejected() {
        let result = Config::from_vars(vars(&[("PLAID_CLIENT_ID", "abc")]));

        assert!(matches!(result, Err(ConfigError::MissingDatabaseUrl)));
    }

    #[test]
    fn empty_database_url_is_rejected() {
        let result = Config::from_vars(vars(&[("DATABASE_URL", "   ")]));

        assert!(matches!(result, Err(ConfigError::MissingDatabaseUrl)));
    }

    #[test]
    fn unset_optional_values_use_defaults() {
        let config = Config::from_vars(vars(&[("DATABASE_URL", "postgres://localhost/bank")]))
            .expect("config should load");

        assert_eq!(config.port, 5000);
        assert_eq!(config.plaid_environment(), PlaidEnvironment::Production);
        assert_eq!(config.plaid_products, vec!["transactions"]);
        assert_eq!(config.plaid_country_codes, vec!["US"]);
        assert_eq!(config.plaid_client_name, "YourAppName");
        assert!(config.plaid_webhook_url.is_none());
        assert!(config.sms_credentials().is_none());
    }

    #[test]
    fn comma_separated_lists_are_split_and_trimmed() {
        let config = Config::from_vars(vars(&[
            ("DATABASE_URL", "postgres://localhost/bank"),
            ("PLAID_PRODUCTS", "transactions, auth,"),
            ("PLAID_COUNTRY_CODES", "US,CA"),
        ]))
        .expect("config should load");

        assert_eq!(config.plaid_products, vec!["transactions", "auth"]);
        assert_eq!(config.plaid_country_codes, vec!["US", "CA"]);
    }

    #[test]
    fn sandbox_is_selected_only_by_name() {
        assert_eq!(
            PlaidEnvironment::from_name("sandbox"),
            PlaidEnvironment::Sandbox
        );
        assert_eq!(
            PlaidEnvironment::from_name("development"),
            PlaidEnvironment::Production
        );
        assert_eq!(
            PlaidEnvironment::Sandbox.base_url(),
            "https://sandbox.plaid.com"
        );
    }

    #[test]
    fn sms_needs_all_four_variables() {
        let partial = Config::from_vars(vars(&[
            ("DATABASE_URL", "postgres://localhost/bank"),
            ("ACCOUNT_SID", "AC123"),
            ("TWILIO_AUTH", "secret"),
            ("TWILIO_NUM", "+15550000000"),
        ]))
        .expect("config should load");
        assert!(partial.sms_credentials().is_none());

        let full = Config::from_vars(vars(&[
            ("DATABASE_URL", "postgres://localhost/bank"),
            ("ACCOUNT_SID", "AC123"),
            ("TWILIO_AUTH", "secret"),
            ("TWILIO_NUM", "+15550000000"),
            ("USER_PHONE_NUM", "+15551111111"),
        ]))
        .expect("config should load");
        let credentials = full.sms_credentials().expect("credentials should be complete");
        assert_eq!(credentials.from_number, "+15550000000");
        assert_eq!(credentials.to_number, "+15551111111");
    }

    #[test]
    fn sms_signature_checks_need_the_auth_token() {
        let without = Config::from_vars(vars(&[("DATABASE_URL", "postgres://localhost/bank")]))
            .expect("config should load");
        assert!(without.sms_request_validator().is_none());

        let with = Config::from_vars(vars(&[
            ("DATABASE_URL", "postgres://localhost/bank"),
            ("TWILIO_AUTH", "secret"),
            ("TWILIO_WEBHOOK_URL", "https://bank.example.com/sms"),
        ]))
        .expect("config should load");
        let validator = with.sms_request_validator().expect("validator should exist");
        assert_eq!(
            validator.request_url(Some("10.0.0.5"), "/sms").as_deref(),
            Some("https://bank.example.com/sms")
        );
    }

    #[test]
    fn invalid_webhook_url_is_rejected() {
        let result = Config::from_vars(vars(&[
            ("DATABASE_URL", "postgres://localhost/bank"),
            ("PLAID_WEBHOOK_URL", "not a url"),
        ]));

        assert!(matches!(
            result,
            Err(ConfigError::InvalidUrl {
                name: "PLAID_WEBHOOK_URL",
                ..
            })
        ));
    }

    #[test]
    fn link_token_settings_carry_optional_urls() {
        let config = Config::from_vars(vars(&[
            ("DATABASE_URL", "postgres://localhost/bank"),
            ("PLAID_WEBHOOK_URL", "https://example.com/webhook"),
            ("PLAID_REDIRECT_URI", ""),
        ]))
        .expect("config should load");

        let settings = config.link_token_settings();
        assert_eq!(
            settings.webhook_url.as_deref(),
            Some("https://example.com/webhook")
        );
        assert!(settings.redirect_uri.is_none());
    }
}
