use async_trait::async_trait;

use booktime_core::{BasketId, BasketLineId, BasketStatus, ProductId, UserId};

use super::PgStore;
use crate::db::{BasketStore, RepositoryError, map_write_error};
use crate::models::{Basket, BasketItem, BasketLine, BasketSummary};

#[derive(sqlx::FromRow)]
struct BasketSummaryRow {
    id: BasketId,
    user_id: Option<UserId>,
    status: BasketStatus,
    count: i64,
}

#[async_trait]
impl BasketStore for PgStore {
    async fn get_basket(&self, id: BasketId) -> Result<Option<Basket>, RepositoryError> {
        let basket = sqlx::query_as("SELECT id, user_id, status FROM storefront.basket WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(basket)
    }

    async fn create_basket(&self, user: Option<UserId>) -> Result<Basket, RepositoryError> {
        sqlx::query_as(
            "INSERT INTO storefront.basket (user_id) VALUES ($1) RETURNING id, user_id, status",
        )
        .bind(user)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "basket"))
    }

    async fn open_baskets_for_user(&self, user: UserId) -> Result<Vec<BasketId>, RepositoryError> {
        let ids = sqlx::query_scalar(
            "SELECT id FROM storefront.basket
             WHERE user_id = $1 AND status = 'open'
             ORDER BY id",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn basket_lines(&self, basket: BasketId) -> Result<Vec<BasketLine>, RepositoryError> {
        let lines = sqlx::query_as(
            "SELECT id, basket_id, product_id, quantity
             FROM storefront.basket_line
             WHERE basket_id = $1
             ORDER BY id",
        )
        .bind(basket)
        .fetch_all(&self.pool)
        .await?;
        Ok(lines)
    }

    async fn basket_items(&self, basket: BasketId) -> Result<Vec<BasketItem>, RepositoryError> {
        let items = sqlx::query_as(
            "SELECT l.id, l.product_id, p.name AS product_name, p.price AS unit_price, l.quantity
             FROM storefront.basket_line l
             JOIN storefront.product p ON p.id = l.product_id
             WHERE l.basket_id = $1
             ORDER BY l.id",
        )
        .bind(basket)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    async fn add_product(
        &self,
        basket: BasketId,
        product: ProductId,
    ) -> Result<BasketLine, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Serializes adds to the same basket so a first add cannot insert twice.
        sqlx::query("SELECT id FROM storefront.basket WHERE id = $1 FOR UPDATE")
            .bind(basket)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let incremented: Option<BasketLine> = sqlx::query_as(
            "UPDATE storefront.basket_line SET quantity = quantity + 1
             WHERE id = (
                 SELECT MIN(id) FROM storefront.basket_line
                 WHERE basket_id = $1 AND product_id = $2
             )
             RETURNING id, basket_id, product_id, quantity",
        )
        .bind(basket)
        .bind(product)
        .fetch_optional(&mut *tx)
        .await?;

        let line = match incremented {
            Some(line) => line,
            None => sqlx::query_as(
                "INSERT INTO storefront.basket_line (basket_id, product_id, quantity)
                 VALUES ($1, $2, 1)
                 RETURNING id, basket_id, product_id, quantity",
            )
            .bind(basket)
            .bind(product)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, "basket line"))?,
        };

        tx.commit().await?;
        Ok(line)
    }

    async fn set_line_quantity(
        &self,
        basket: BasketId,
        line: BasketLineId,
        quantity: i32,
    ) -> Result<BasketLine, RepositoryError> {
        sqlx::query_as(
            "UPDATE storefront.basket_line SET quantity = $3
             WHERE id = $2 AND basket_id = $1
             RETURNING id, basket_id, product_id, quantity",
        )
        .bind(basket)
        .bind(line)
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    async fn remove_line(
        &self,
        basket: BasketId,
        line: BasketLineId,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("DELETE FROM storefront.basket_line WHERE id = $2 AND basket_id = $1")
                .bind(basket)
                .bind(line)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn assign_user(&self, basket: BasketId, user: UserId) -> Result<Basket, RepositoryError> {
        sqlx::query_as(
            "UPDATE storefront.basket SET user_id = $2
             WHERE id = $1
             RETURNING id, user_id, status",
        )
        .bind(basket)
        .bind(user)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "basket owner"))?
        .ok_or(RepositoryError::NotFound)
    }

    async fn move_lines_and_delete(
        &self,
        from: BasketId,
        into: BasketId,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE storefront.basket_line SET basket_id = $2 WHERE basket_id = $1")
            .bind(from)
            .bind(into)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, "basket line"))?;

        let deleted = sqlx::query("DELETE FROM storefront.basket WHERE id = $1")
            .bind(from)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_baskets(
        &self,
        status: Option<BasketStatus>,
    ) -> Result<Vec<BasketSummary>, RepositoryError> {
        let rows: Vec<BasketSummaryRow> = sqlx::query_as(
            "SELECT b.id, b.user_id, b.status, COALESCE(SUM(l.quantity), 0)::int8 AS count
             FROM storefront.basket b
             LEFT JOIN storefront.basket_line l ON l.basket_id = b.id
             WHERE ($1::storefront.basket_status IS NULL OR b.status = $1)
             GROUP BY b.id
             ORDER BY b.id DESC",
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| BasketSummary {
                basket: Basket {
                    id: row.id,
                    user_id: row.user_id,
                    status: row.status,
                },
                count: row.count,
            })
            .collect())
    }
}
