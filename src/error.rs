//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::services::plaid_client::PlaidError;
use crate::services::sms_service::SmsError;

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Database Errors**: Any sqlx::Error from database operations
/// - **Upstream Errors**: Failures reported by Plaid or Twilio
/// - **Resource Errors**: Requested rows do not exist
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Plaid rejected a request or could not be reached.
    #[error("Aggregator error: {0}")]
    Aggregator(#[from] PlaidError),

    /// Twilio rejected a message or could not be reached.
    #[error("SMS error: {0}")]
    Sms(#[from] SmsError),

    /// No bank connection has been linked yet.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("No linked account")]
    NoLinkedAccount,

    /// Requested transaction is not in the pending table.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Transaction not found")]
    TransactionNotFound,

    /// Inbound SMS request is not signed by Twilio.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("Missing or invalid Twilio signature")]
    InvalidSignature,
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// Errors produced by this service return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// Errors reported by Plaid are the exception: their body and status are
/// forwarded unchanged so callers see exactly what Plaid said.
///
/// # Status Code Mapping
///
/// - `Aggregator` (Plaid API error) → Plaid's status and body
/// - `Aggregator` (transport) → 502 Bad Gateway
/// - `Sms` → 502 Bad Gateway
/// - `NoLinkedAccount`, `TransactionNotFound` → 404 Not Found
/// - `InvalidSignature` → 403 Forbidden
/// - `Database` → 500 Internal Server Error (hides details from client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Aggregator(PlaidError::Api { status, body }) => {
                tracing::warn!(%status, "Plaid returned an error: {}", body);
                return (status, Json(body)).into_response();
            }
            AppError::Aggregator(ref e) => {
                tracing::error!("Plaid request failed: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "aggregator_unavailable",
                    "The bank data provider could not be reached".to_string(),
                )
            }
            AppError::Sms(ref e) => {
                tracing::error!("Twilio request failed: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "sms_unavailable",
                    "The SMS provider could not be reached".to_string(),
                )
            }
            AppError::NoLinkedAccount => {
                (StatusCode::NOT_FOUND, "no_linked_account", self.to_string())
            }
            AppError::TransactionNotFound => (
                StatusCode::NOT_FOUND,
                "transaction_not_found",
                self.to_string(),
            ),
            AppError::InvalidSignature => {
                (StatusCode::FORBIDDEN, "invalid_signature", self.to_string())
            }
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
