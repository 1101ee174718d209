//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! bt-cli migrate
//! ```
//!
//! Runs the embedded storefront migrations, then creates the session table
//! used by `tower-sessions-sqlx-store`.

use tower_sessions_sqlx_store::PostgresStore;

use super::{CommandError, connect};

/// Run every pending migration.
///
/// # Errors
///
/// Returns `CommandError` if the database cannot be reached or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running storefront migrations...");
    booktime_storefront::db::MIGRATOR.run(&pool).await?;

    tracing::info!("Creating session table...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
