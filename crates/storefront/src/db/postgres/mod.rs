//! `PostgreSQL` store.
//!
//! Queries are checked at runtime (`sqlx::query_as` + `FromRow`) so the crate
//! builds without a live database. Multi-row writes run inside a single
//! transaction.

use async_trait::async_trait;
use sqlx::PgPool;

use super::{RepositoryError, Store};

mod address;
mod basket;
mod catalog;
mod order;
mod report;
mod user;

/// Store backed by a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool, for the session store and migrations.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
