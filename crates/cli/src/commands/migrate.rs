//! Database migration command.
//!
//! Migrations live in `crates/server/migrations/` and are embedded into
//! this binary at compile time, so production boxes never need the source
//! tree.
//!
//! ```bash
//! krambam migrate
//! ```

use super::{CliError, connect};

/// Run all pending migrations.
///
/// # Errors
///
/// Returns `CliError::MissingDatabaseUrl` without a connection string and
/// `CliError::Migration` if a migration fails.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
