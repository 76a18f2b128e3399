//! Aggregator webhook receiver.
//!
//! Plaid and the Link page both post here. The body is read as raw bytes so
//! that anything, JSON or not, is acknowledged the same way.

use axum::{Json, body::Bytes, extract::State};
use serde_json::{Value, json};

use crate::models::webhook::InboundWebhook;
use crate::services::link_service;
use crate::state::AppState;

/// Receive a webhook.
///
/// # Endpoint
///
/// `POST /webhook`
///
/// # Behaviour
///
/// - `{"public_token": "..."}`: the token is exchanged and the linked account
///   is created or overwritten
/// - Anything else is logged and ignored
///
/// # Response (200 OK)
///
/// Always, even when the exchange fails (the failure is logged):
///
/// ```json
/// { "status": "success" }
/// ```
pub async fn receive_webhook(State(state): State<AppState>, body: Bytes) -> Json<Value> {
    match InboundWebhook::parse(&body) {
        InboundWebhook::PublicToken(public_token) => {
            tracing::info!("Webhook carried a public token, exchanging");

            if let Err(e) = link_service::link_item(
                state.store.as_ref(),
                state.aggregator.as_ref(),
                &public_token,
            )
            .await
            {
                tracing::error!("Public token exchange failed: {}", e);
            }
        }
        InboundWebhook::Event {
            webhook_type,
            webhook_code,
        } => {
            tracing::info!(?webhook_type, ?webhook_code, "Webhook received");
        }
        InboundWebhook::Malformed => {
            tracing::warn!(bytes = body.len(), "Webhook body is not JSON");
        }
    }

    Json(json!({ "status": "success" }))
}
