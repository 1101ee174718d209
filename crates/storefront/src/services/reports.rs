//! Back-office reports over a trailing period.

use chrono::Utc;
use serde::Serialize;
use tracing::instrument;

use crate::db::{RepositoryError, Store};
use crate::models::{DailyOrderCount, ProductSales, ReportPeriod};

/// How many products the "most bought" report lists.
pub const TOP_PRODUCTS_LIMIT: i64 = 5;

/// A report together with the period it covers.
#[derive(Debug, Clone, Serialize)]
pub struct Report<T> {
    pub days: i64,
    pub rows: Vec<T>,
}

/// Orders placed per day over `period`.
///
/// # Errors
///
/// Returns `RepositoryError` if the query fails.
#[instrument(skip(store))]
pub async fn orders_per_day(
    store: &dyn Store,
    period: ReportPeriod,
) -> Result<Report<DailyOrderCount>, RepositoryError> {
    let rows = store.orders_per_day(period.since(Utc::now())).await?;
    Ok(Report {
        days: period.days(),
        rows,
    })
}

/// Most bought products over `period`, counting one per order line.
///
/// # Errors
///
/// Returns `RepositoryError` if the query fails.
#[instrument(skip(store))]
pub async fn top_products(
    store: &dyn Store,
    period: ReportPeriod,
) -> Result<Report<ProductSales>, RepositoryError> {
    let rows = store
        .top_products(period.since(Utc::now()), TOP_PRODUCTS_LIMIT)
        .await?;
    Ok(Report {
        days: period.days(),
        rows,
    })
}
