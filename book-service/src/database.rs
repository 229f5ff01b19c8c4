//! Database connection pool management
//!
//! The service talks to PostgreSQL or SQLite through the sqlx `Any` driver.
//! The driver does not rewrite SQL, so statement text must follow the
//! conventions of the backend behind the URL; [`Dialect`] carries them.

use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use std::time::Duration;

use crate::condition::{CompileOptions, IlikeSupport, Placeholder};
use crate::config::DatabaseConfig;
use crate::error::{sanitize_url, Error, Result};

/// SQL conventions of the connected backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// PostgreSQL: `$n` placeholders, native `ILIKE`
    Postgres,
    /// SQLite: `?` placeholders, no `ILIKE`
    Sqlite,
}

impl Dialect {
    /// Detect the dialect from a connection URL scheme
    ///
    /// # Example
    ///
    /// ```rust
    /// use book_service::database::Dialect;
    ///
    /// assert_eq!(Dialect::from_url("postgres://localhost/books"), Some(Dialect::Postgres));
    /// assert_eq!(Dialect::from_url("sqlite::memory:"), Some(Dialect::Sqlite));
    /// assert_eq!(Dialect::from_url("mysql://localhost/books"), None);
    /// ```
    pub fn from_url(url: &str) -> Option<Self> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Some(Self::Postgres)
        } else if url.starts_with("sqlite:") {
            Some(Self::Sqlite)
        } else {
            None
        }
    }

    /// Backend name as used in logs
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }

    /// Condition compile options matching this backend
    pub const fn compile_options(&self) -> CompileOptions {
        match self {
            Self::Postgres => CompileOptions::new(Placeholder::Numbered),
            Self::Sqlite => {
                CompileOptions::new(Placeholder::Question).with_ilike(IlikeSupport::Lower)
            }
        }
    }

    /// Placeholder for the `n`-th bound parameter (1-based)
    pub fn placeholder(&self, n: usize) -> String {
        match self {
            Self::Postgres => format!("${n}"),
            Self::Sqlite => "?".to_string(),
        }
    }
}

/// Create a connection pool with retry logic
///
/// Failed attempts are retried `max_retries` times with exponential backoff
/// starting at `retry_delay_secs`.
pub async fn create_pool(config: &DatabaseConfig) -> Result<AnyPool> {
    sqlx::any::install_default_drivers();

    let mut attempt = 0;
    let base_delay = Duration::from_secs(config.retry_delay_secs);

    loop {
        match try_create_pool(config).await {
            Ok(pool) => {
                if attempt > 0 {
                    tracing::info!(
                        "Database connection established after {} attempt(s)",
                        attempt + 1
                    );
                } else {
                    tracing::info!(
                        max = config.max_connections,
                        min = config.min_connections,
                        "Database connection pool created"
                    );
                }
                return Ok(pool);
            }
            Err(e) => {
                attempt += 1;

                if attempt > config.max_retries {
                    tracing::error!(
                        "Failed to connect to database after {} attempts: {}",
                        config.max_retries + 1,
                        e
                    );
                    return Err(e);
                }

                let delay = base_delay * 2_u32.pow(attempt.saturating_sub(1));

                tracing::warn!(
                    "Database connection attempt {} failed: {}. Retrying in {:?}...",
                    attempt,
                    e,
                    delay
                );

                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Attempt to create a database pool (single try)
async fn try_create_pool(config: &DatabaseConfig) -> Result<AnyPool> {
    AnyPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.connection_timeout())
        .connect(&config.url)
        .await
        .map_err(|e| {
            Error::Internal(format!(
                "Failed to connect to database at '{}': {} ({})",
                sanitize_url(&config.url),
                categorize_db_error(&e),
                e
            ))
        })
}

/// Short description of a connection failure
fn categorize_db_error(err: &sqlx::Error) -> &'static str {
    use sqlx::Error;

    match err {
        Error::Configuration(_) => "Configuration error",
        Error::Database(_) => "Database error",
        Error::Io(_) => "Network I/O error - check connectivity",
        Error::Tls(_) => "TLS/SSL error - check certificate configuration",
        Error::PoolTimedOut => "Connection pool timeout - database may be overloaded",
        Error::PoolClosed => "Connection pool closed",
        Error::WorkerCrashed => "Database worker crashed",
        _ => "Connection error",
    }
}
