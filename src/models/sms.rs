//! Inbound Twilio message webhook.

/// The fields of Twilio's inbound-message form that matter here.
///
/// Twilio sends many more (`MessageSid`, `NumMedia`, ...). All of them are
/// kept as raw pairs by the handler because the request signature covers
/// every one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboundSms {
    pub from: String,
    pub body: String,
}

impl InboundSms {
    /// Pick `From` and `Body` out of the form parameters; missing ones are empty.
    pub fn from_params(params: &[(String, String)]) -> Self {
        let field = |name: &str| {
            params
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone())
                .unwrap_or_default()
        };

        Self {
            from: field("From"),
            body: field("Body"),
        }
    }
}

/// The owner's answer to an approval prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyDecision {
    Approve,
    Reject,
    Unknown,
}

impl ReplyDecision {
    pub fn parse(text: &str) -> Self {
        match text.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" | "approve" => ReplyDecision::Approve,
            "n" | "no" | "reject" => ReplyDecision::Reject,
            _ => ReplyDecision::Unknown,
        }
    }
}
