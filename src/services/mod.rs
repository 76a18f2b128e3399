//! Business logic services.
//!
//! Services contain the logic separated from HTTP handlers. They talk to the
//! store and the external APIs only through traits, so they can be tested
//! with in-memory stand-ins.

pub mod link_service;
pub mod plaid_client;
pub mod reconcile_service;
pub mod sms_service;
pub mod sync_service;
pub mod twilio_signature;
