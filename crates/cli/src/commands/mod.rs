//! CLI command implementations.

pub mod migrate;
pub mod staff;

use secrecy::SecretString;
use sqlx::PgPool;

/// Errors shared by the commands.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Auth(#[from] booktime_storefront::services::auth::AuthError),
}

/// Connect to the database named by `BOOKTIME_DATABASE_URL`, falling back
/// to `DATABASE_URL`.
async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("BOOKTIME_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| CommandError::MissingEnvVar("BOOKTIME_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    Ok(booktime_storefront::db::create_pool(&SecretString::from(database_url)).await?)
}
