//! Data models representing database entities and external payloads.
//!
//! This module contains the structures that map to database tables and the
//! request/response bodies exchanged with the aggregator and SMS provider.

/// The single linked bank connection
pub mod linked_account;
/// Plaid API request and response bodies
pub mod plaid;
/// Inbound Twilio message webhook
pub mod sms;
/// Pending and approved transactions
pub mod transaction;
/// Inbound aggregator webhook bodies
pub mod webhook;
