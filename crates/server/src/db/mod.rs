//! Database operations for the Krambambouli `PostgreSQL` store.
//!
//! ## Tables
//!
//! - `products` - Beverage catalog (read-only here)
//! - `pickup_locations` / `delivery_locations` / `location_codes` - Catalog
//! - `activities` - Association calendar (the flagship cantus gates pickup)
//! - `krambambouli_customers` - One row per submitted order
//! - `krambambouli_orders` - Line items (FK cascade from customer)
//! - `krambambouli_delivery_addresses` / `krambambouli_pickup_locations` -
//!   The mutually exclusive fulfillment path rows
//! - `staff_users` - Staff login accounts
//!
//! # Migrations
//!
//! Migrations live in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p krambam-cli -- migrate
//! ```
//!
//! # Error classification
//!
//! [`RepositoryError::is_transient`] separates connection-class failures
//! (retried with a fixed delay, bounded attempts) from permanent ones
//! (constraint violations, bad data), so the retry policy never depends on
//! driver-specific error codes.

pub mod catalog;
pub mod orders;
pub mod staff;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use catalog::CatalogRepository;
pub use orders::OrderRepository;
pub use staff::StaffRepository;

/// Fixed delay between retries of transient failures.
pub(crate) const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., a line item naming an unknown product).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Whether the failure is connection-class and worth retrying.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Database(e) => is_transient_sqlx(e),
            Self::DataCorruption(_) | Self::NotFound | Self::Conflict(_) => false,
        }
    }
}

fn is_transient_sqlx(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::Io(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
    )
}

/// Run `op`, retrying transient failures with a fixed delay.
///
/// Non-transient errors propagate immediately; the final attempt's error
/// propagates when the budget is exhausted.
pub(crate) async fn with_retry<T, F, Fut>(attempts: u32, mut op: F) -> Result<T, RepositoryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RepositoryError>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < attempts => {
                tracing::warn!(attempt, error = %e, "transient database error, retrying");
                tokio::time::sleep(RETRY_DELAY).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Create a `PostgreSQL` connection pool and verify it with a liveness query.
///
/// Connection-class failures are retried up to `retry_attempts` times with
/// the same fixed delay as query retries, so a database that is still
/// starting up does not kill the service.
///
/// # Errors
///
/// Returns the last `sqlx::Error` once the retry budget is exhausted.
pub async fn create_pool(
    database_url: &secrecy::SecretString,
    max_connections: u32,
    retry_attempts: u32,
) -> Result<PgPool, sqlx::Error> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match try_create_pool(database_url, max_connections).await {
            Ok(pool) => return Ok(pool),
            Err(e) if is_transient_sqlx(&e) && attempt < retry_attempts => {
                tracing::warn!(attempt, error = %e, "database connection failed, retrying");
                tokio::time::sleep(RETRY_DELAY).await;
            }
            Err(e) => return Err(e),
        }
    }
}

async fn try_create_pool(
    database_url: &secrecy::SecretString,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await?;

    // Trivial liveness probe before trusting the pool.
    sqlx::query("SELECT 1").execute(&pool).await?;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_and_io_errors_are_transient() {
        assert!(RepositoryError::Database(sqlx::Error::PoolTimedOut).is_transient());
        assert!(
            RepositoryError::Database(sqlx::Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "refused",
            )))
            .is_transient()
        );
    }

    #[test]
    fn domain_errors_are_permanent() {
        assert!(!RepositoryError::NotFound.is_transient());
        assert!(!RepositoryError::Conflict("unknown product".into()).is_transient());
        assert!(!RepositoryError::Database(sqlx::Error::RowNotFound).is_transient());
    }

    #[tokio::test]
    async fn with_retry_propagates_permanent_errors_immediately() {
        let calls = std::cell::Cell::new(0);
        let result: Result<(), _> = with_retry(5, || async {
            calls.set(calls.get() + 1);
            Err(RepositoryError::NotFound)
        })
        .await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn with_retry_retries_transient_errors_up_to_the_budget() {
        let calls = std::cell::Cell::new(0);
        let result: Result<(), _> = with_retry(3, || async {
            calls.set(calls.get() + 1);
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn with_retry_returns_first_success() {
        let calls = std::cell::Cell::new(0);
        let result = with_retry(5, || async {
            calls.set(calls.get() + 1);
            if calls.get() < 2 {
                Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
            } else {
                Ok(calls.get())
            }
        })
        .await;
        assert_eq!(result.expect("should succeed on second attempt"), 2);
    }
}
