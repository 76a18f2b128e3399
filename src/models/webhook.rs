//! Inbound aggregator webhook bodies.
//!
//! Plaid posts JSON objects tagged with `webhook_type` and `webhook_code`.
//! The Link page served by this service posts `{"public_token": "..."}` to the
//! same endpoint once the owner finishes linking. Only the latter triggers any
//! work; everything else is acknowledged and logged.

use serde_json::Value;

/// What the service understood from a webhook body.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundWebhook {
    /// A public token to exchange for an access token
    PublicToken(String),

    /// Any other JSON body
    Event {
        webhook_type: Option<String>,
        webhook_code: Option<String>,
    },

    /// The body was not JSON at all
    Malformed,
}

impl InboundWebhook {
    /// Classify a raw request body.
    ///
    /// A `public_token` that is present but not a string is treated as an
    /// ordinary event, so the exchange is skipped.
    pub fn parse(body: &[u8]) -> Self {
        let Ok(value) = serde_json::from_slice::<Value>(body) else {
            return InboundWebhook::Malformed;
        };

        if let Some(token) = value.get("public_token").and_then(Value::as_str) {
            return InboundWebhook::PublicToken(token.to_string());
        }

        let field = |name: &str| value.get(name).and_then(Value::as_str).map(str::to_string);

        InboundWebhook::Event {
            webhook_type: field("webhook_type"),
            webhook_code: field("webhook_code"),
        }
    }
}
