//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::LinkTokenSettings;
use crate::services::plaid_client::Aggregator;
use crate::services::sms_service::SmsNotifier;
use crate::services::twilio_signature::RequestValidator;
use crate::stores::LedgerStore;

/// Shared application state, cloned into every handler via `State`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LedgerStore>,

    pub aggregator: Arc<dyn Aggregator>,

    pub notifier: Arc<dyn SmsNotifier>,

    /// Values for every link-token request
    pub link_settings: LinkTokenSettings,

    /// Only SMS replies from this number are acted on, when set
    pub owner_phone: Option<String>,

    /// Checks `X-Twilio-Signature`; `/sms` refuses every request without it
    pub sms_validator: Option<RequestValidator>,
}
