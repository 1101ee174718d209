use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::PgStore;
use crate::db::{ReportStore, RepositoryError};
use crate::models::{DailyOrderCount, ProductSales};

#[async_trait]
impl ReportStore for PgStore {
    async fn orders_per_day(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyOrderCount>, RepositoryError> {
        let rows = sqlx::query_as(
            "SELECT (date_added AT TIME ZONE 'UTC')::date AS day, COUNT(*) AS orders
             FROM storefront.orders
             WHERE date_added >= $1
             GROUP BY day
             ORDER BY day",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn top_products(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ProductSales>, RepositoryError> {
        let rows = sqlx::query_as(
            "SELECT p.name AS product_name, COUNT(*) AS quantity
             FROM storefront.order_line l
             JOIN storefront.orders o ON o.id = l.order_id
             JOIN storefront.product p ON p.id = l.product_id
             WHERE o.date_added >= $1
             GROUP BY p.name
             ORDER BY quantity DESC, p.name
             LIMIT $2",
        )
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
