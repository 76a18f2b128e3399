//! Link-token creation.

use axum::{Json, extract::State};
use serde_json::Value;

use crate::{
    error::AppError, models::plaid::LinkTokenCreateRequest, services::plaid_client::PlaidError,
    state::AppState,
};

/// Create a Link token for the browser.
///
/// # Endpoint
///
/// `POST /api/create_link_token`
///
/// # Response
///
/// - **Success (200 OK)**: Plaid's response body, unchanged
/// - **Plaid error (200 OK)**: Plaid's error body, unchanged; the Link page
///   reads `error_code` from it
/// - **Error (502)**: Plaid could not be reached
///
/// ```json
/// {
///   "link_token": "link-sandbox-af1a0311-da53-4636-b754-dd15cc058176",
///   "expiration": "2020-03-27T12:56:34Z",
///   "request_id": "XQVgFigpGHXkb0b"
/// }
/// ```
pub async fn create_link_token(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let request = LinkTokenCreateRequest::from_settings(&state.link_settings);

    match state.aggregator.create_link_token(&request).await {
        Ok(response) => Ok(Json(response)),
        Err(PlaidError::Api { status, body }) => {
            tracing::warn!(%status, "Link token request rejected: {}", body);
            Ok(Json(body))
        }
        Err(e) => Err(e.into()),
    }
}
