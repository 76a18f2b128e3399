//! Verification of Twilio's `X-Twilio-Signature` header.
//!
//! # Algorithm
//!
//! 1. Start from the full URL Twilio requested
//! 2. Append every form parameter as `name` then `value`, sorted by name
//! 3. HMAC-SHA1 the result with the account's auth token
//! 4. Base64-encode the digest
//!
//! The comparison is constant-time (`Mac::verify_slice`).

use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Header Twilio puts the signature in.
pub const SIGNATURE_HEADER: &str = "x-twilio-signature";

/// Checks inbound Twilio requests against the account's auth token.
#[derive(Clone)]
pub struct RequestValidator {
    auth_token: String,
    /// Public URL of the SMS webhook, when the service sits behind a proxy
    webhook_url: Option<String>,
}

impl RequestValidator {
    pub fn new(auth_token: impl Into<String>, webhook_url: Option<String>) -> Self {
        Self {
            auth_token: auth_token.into(),
            webhook_url,
        }
    }

    /// The URL Twilio signed: the configured webhook URL, or
    /// `https://{host}{path_and_query}` rebuilt from the request.
    pub fn request_url(&self, host: Option<&str>, path_and_query: &str) -> Option<String> {
        match &self.webhook_url {
            Some(url) => Some(url.clone()),
            None => host.map(|host| format!("https://{host}{path_and_query}")),
        }
    }

    fn mac(&self, url: &str, params: &[(String, String)]) -> Option<HmacSha1> {
        let mut mac = HmacSha1::new_from_slice(self.auth_token.as_bytes()).ok()?;

        let mut sorted: Vec<&(String, String)> = params.iter().collect();
        sorted.sort();

        mac.update(url.as_bytes());
        for (name, value) in sorted {
            mac.update(name.as_bytes());
            mac.update(value.as_bytes());
        }

        Some(mac)
    }

    /// Whether `signature` matches `url` and `params`.
    pub fn is_valid(&self, url: &str, params: &[(String, String)], signature: &str) -> bool {
        let Ok(expected) = STANDARD.decode(signature.trim()) else {
            return false;
        };

        self.mac(url, params)
            .is_some_and(|mac| mac.verify_slice(&expected).is_ok())
    }

    /// Signature Twilio would send for this request.
    #[cfg(test)]
    pub fn sign(&self, url: &str, params: &[(String, String)]) -> String {
        let mac = self.mac(url, params).expect("HMAC accepts any key length");
        STANDARD.encode(mac.finalize().into_bytes())
    }
}
