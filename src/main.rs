//! Bank Link Webhook Server - Main Application Entry Point
//!
//! A small web service that links one bank account through Plaid, keeps the
//! resulting access token in PostgreSQL, pulls new transactions into a
//! pending queue and lets the owner approve or reject them over SMS.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Aggregator**: Plaid over reqwest
//! - **SMS**: Twilio over reqwest, or a log-only stand-in
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool and probe the server
//! 3. Run database migrations
//! 4. Build the Plaid and SMS clients
//! 5. Build HTTP router and start server on configured port
//!
//! Steps 2 to 4 live in [`build_state`]; a failure there exits before binding.

mod config;
mod db;
mod error;
mod handlers;
mod models;
mod routes;
mod services;
mod state;
mod stores;

#[cfg(test)]
mod test_utils;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::services::plaid_client::PlaidClient;
use crate::services::sms_service::{LogOnlyNotifier, SmsNotifier, TwilioClient};
use crate::state::AppState;
use crate::stores::PgLedgerStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(plaid_env = ?config.plaid_environment(), "Configuration loaded");

    let state = build_state(&config).await?;
    let app = routes::build_router(state);

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Start serving HTTP requests
    axum::serve(listener, app).await?;

    Ok(())
}

/// Connect, migrate and build every client the handlers need.
///
/// Any error here ends the process before the listener is bound.
async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    if config.plaid_client_id.is_empty() || config.plaid_secret.is_empty() {
        tracing::warn!("PLAID_CLIENT_ID or PLAID_SECRET is empty, Plaid requests will fail");
    }

    // Create database pool
    let pool = db::create_pool(&config.database_url)
        .await
        .context("could not connect to the database")?;
    let version = db::server_version(&pool).await?;
    tracing::info!(%version, "Database pool created");

    // Run migrations
    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    let aggregator = PlaidClient::new(
        config.plaid_environment().base_url(),
        config.plaid_client_id.clone(),
        config.plaid_secret.clone(),
    )?;

    let notifier: Arc<dyn SmsNotifier> = match config.sms_credentials() {
        Some(credentials) => {
            tracing::info!("SMS notifications enabled");
            Arc::new(TwilioClient::new(credentials)?)
        }
        None => {
            tracing::warn!("Twilio is not fully configured, SMS messages will only be logged");
            Arc::new(LogOnlyNotifier)
        }
    };

    let sms_validator = config.sms_request_validator();
    if sms_validator.is_none() {
        tracing::warn!("TWILIO_AUTH is not set, inbound SMS replies will be refused");
    }

    Ok(AppState {
        store: Arc::new(PgLedgerStore::new(pool)),
        aggregator: Arc::new(aggregator),
        notifier,
        link_settings: config.link_token_settings(),
        owner_phone: config.user_phone_num.clone(),
        sms_validator,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_database_stops_startup() {
        let config = Config::from_vars(vec![(
            "DATABASE_URL".to_string(),
            "postgres://postgres@127.0.0.1:1/none".to_string(),
        )])
        .expect("config should load");

        let error = build_state(&config)
            .await
            .err()
            .expect("startup should fail");

        assert!(error.to_string().contains("could not connect to the database"));
    }
}
