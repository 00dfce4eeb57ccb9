//! PostgreSQL connection pool and embedded migrations (`setlist_core/migrations/`).

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use thiserror::Error;
use tracing::info;

/// Maximum pooled connections.
const MAX_CONNECTIONS: u32 = 5;

/// How long to wait for a pooled connection before failing.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors that can occur connecting to the database.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database URL must start with postgres:// or postgresql://")]
    InvalidUrl,

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Strip credentials from a connection URL for logging.
pub fn redact(database_url: &str) -> String {
    match url::Url::parse(database_url) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("***"));
            }
            url.to_string()
        }
        Err(_) => "<unparseable>".to_string(),
    }
}

/// Open a pool against `database_url`.
pub async fn connect(database_url: &str) -> Result<PgPool, DbError> {
    if !(database_url.starts_with("postgres://") || database_url.starts_with("postgresql://")) {
        return Err(DbError::InvalidUrl);
    }
    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await?;
    info!(url = %redact(database_url), "connected to database");
    Ok(pool)
}

/// Apply every pending embedded migration.
pub async fn migrate(pool: &PgPool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("database migrations applied");
    Ok(())
}
