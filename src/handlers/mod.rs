//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, form, URL params)
//! 2. Delegates to a service or the store
//! 3. Returns HTTP response (JSON, HTML or TwiML)

/// Service health
pub mod health;
/// Static Link page
pub mod home;
/// Link-token creation
pub mod link_token;
/// Reconciliation kick-off
pub mod reconcile;
/// Inbound SMS replies
pub mod sms;
/// Pending/approved transactions and sync
pub mod transactions;
/// Aggregator webhook receiver
pub mod webhooks;
