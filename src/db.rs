//! Database connection pool and migration management.
//!
//! This module provides utilities for:
//! - Creating and managing a PostgreSQL connection pool
//! - Probing the server once at startup
//! - Running database migrations automatically

use std::time::Duration;

use sqlx::{Pool, Postgres};

/// Type alias for PostgreSQL connection pool.
pub type DbPool = Pool<Postgres>;

/// How long startup waits for the first connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Create a new PostgreSQL connection pool.
///
/// Connecting eagerly means an unreachable database is reported here, before
/// the HTTP listener is bound.
///
/// # Errors
///
/// Returns an error if:
/// - Database connection string is invalid
/// - Cannot connect to PostgreSQL server
/// - Database authentication fails
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        // Limit concurrent connections
        .max_connections(5)
        .acquire_timeout(CONNECT_TIMEOUT)
        .connect(database_url)
        .await
}

/// Ask the server for its version string.
///
/// Used as the startup connectivity probe; the result is only logged.
pub async fn server_version(pool: &DbPool) -> Result<String, sqlx::Error> {
    sqlx::query_scalar("SELECT version()").fetch_one(pool).await
}

/// Run database migrations from the `migrations/` directory.
///
/// Migrations are tracked in the `_sqlx_migrations` table and every statement
/// uses `IF NOT EXISTS`, so repeated startups against an existing database
/// neither duplicate nor drop the tables.
///
/// # Errors
///
/// Returns an error if:
/// - SQL syntax errors in migration files
/// - A previously applied migration was edited (checksum mismatch)
/// - Database errors during migration execution
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    // The macro reads migrations at compile time from ./migrations directory
    sqlx::migrate!("./migrations").run(pool).await
}
