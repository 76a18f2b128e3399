//! Inbound SMS handler.
//!
//! Twilio posts the owner's replies here as a form and expects TwiML back.

use axum::{
    Form,
    extract::State,
    http::{HeaderMap, Uri, header},
    response::{IntoResponse, Response},
};

use crate::{
    error::AppError,
    models::sms::InboundSms,
    services::{reconcile_service, twilio_signature::SIGNATURE_HEADER},
    state::AppState,
};

/// TwiML reply. `None` renders an empty `<Response/>`, which Twilio treats
/// as "send nothing".
#[derive(Debug, Clone, PartialEq)]
pub struct Twiml(pub Option<String>);

impl Twiml {
    pub fn message(text: impl Into<String>) -> Self {
        Twiml(Some(text.into()))
    }

    pub fn empty() -> Self {
        Twiml(None)
    }

    pub fn render(&self) -> String {
        match &self.0 {
            Some(text) => format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>{}</Message></Response>",
                escape_xml(text)
            ),
            None => "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response/>".to_string(),
        }
    }
}

impl IntoResponse for Twiml {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, "application/xml")], self.render()).into_response()
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Digits only, so `+1 (555) 010-0000` and `+15550100000` compare equal.
fn normalize_phone(number: &str) -> String {
    number.chars().filter(char::is_ascii_digit).collect()
}

/// Receive an SMS reply.
///
/// # Endpoint
///
/// `POST /sms` (form: `From`, `Body`, plus Twilio's other fields)
///
/// # Response (200 OK, `application/xml`)
///
/// ```xml
/// <?xml version="1.0" encoding="UTF-8"?><Response><Message>Approved Coffee Shop. ...</Message></Response>
/// ```
///
/// - **Error (403)**: `X-Twilio-Signature` is missing or wrong, or
///   `TWILIO_AUTH` is not configured
///
/// Signed messages from any number other than the configured owner get an
/// empty `<Response/>` and change nothing.
pub async fn receive_sms(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    Form(params): Form<Vec<(String, String)>>,
) -> Result<Twiml, AppError> {
    verify_signature(&state, &headers, &uri, &params)?;

    let sms = InboundSms::from_params(&params);

    let from_owner = state
        .owner_phone
        .as_deref()
        .is_none_or(|owner| normalize_phone(owner) == normalize_phone(&sms.from));

    if !from_owner {
        tracing::warn!(from = %sms.from, "Ignoring SMS from unknown number");
        return Ok(Twiml::empty());
    }

    let reply = reconcile_service::handle_reply(state.store.as_ref(), &sms.body).await?;

    Ok(Twiml::message(reply))
}

fn verify_signature(
    state: &AppState,
    headers: &HeaderMap,
    uri: &Uri,
    params: &[(String, String)],
) -> Result<(), AppError> {
    let Some(validator) = &state.sms_validator else {
        tracing::warn!("TWILIO_AUTH is not set, refusing inbound SMS");
        return Err(AppError::InvalidSignature);
    };

    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok());
    let path = uri.path_and_query().map_or(uri.path(), |path| path.as_str());
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let valid = match (validator.request_url(host, path), signature) {
        (Some(url), Some(signature)) => validator.is_valid(&url, params, signature),
        _ => false,
    };

    if !valid {
        tracing::warn!("Rejected SMS webhook with a missing or invalid signature");
        return Err(AppError::InvalidSignature);
    }

    Ok(())
}
