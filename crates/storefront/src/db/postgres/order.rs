use async_trait::async_trait;

use booktime_core::order::expand_lines;
use booktime_core::{
    AddressFields, BasketId, OrderId, OrderLineId, OrderLineStatus, OrderStatus, ProductId, UserId,
};

use super::PgStore;
use crate::db::{OrderStore, RepositoryError, map_write_error};
use crate::models::{
    BasketLine, Order, OrderFilter, OrderLine, OrderLineFilter, OrderScope, OrderUpdate,
};

const ORDER_COLUMNS: &str = r"
    o.id, o.user_id, o.status,
    o.billing_name, o.billing_address1, o.billing_address2,
    o.billing_zip_code, o.billing_city, o.billing_country,
    o.shipping_name, o.shipping_address1, o.shipping_address2,
    o.shipping_zip_code, o.shipping_city, o.shipping_country,
    o.date_added, o.date_updated
";

const ORDER_LINE_SELECT: &str = r"
    SELECT l.id, l.order_id, l.product_id, p.name AS product_name, l.status
    FROM storefront.order_line l
    JOIN storefront.orders o ON o.id = l.order_id
    JOIN storefront.product p ON p.id = l.product_id
";

/// Bound as the `paid only` flag of scoped queries.
const fn paid_only(scope: OrderScope) -> bool {
    matches!(scope, OrderScope::Paid)
}

#[async_trait]
impl OrderStore for PgStore {
    async fn create_order(
        &self,
        basket: BasketId,
        user: UserId,
        billing: &AddressFields,
        shipping: &AddressFields,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let submitted = sqlx::query(
            "UPDATE storefront.basket SET status = 'submitted'
             WHERE id = $1 AND user_id = $2 AND status = 'open'",
        )
        .bind(basket)
        .bind(user)
        .execute(&mut *tx)
        .await?;

        if submitted.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(RepositoryError::Conflict(format!(
                "basket {basket} is not open for user {user}"
            )));
        }

        let lines: Vec<BasketLine> = sqlx::query_as(
            "SELECT id, basket_id, product_id, quantity
             FROM storefront.basket_line
             WHERE basket_id = $1
             ORDER BY id",
        )
        .bind(basket)
        .fetch_all(&mut *tx)
        .await?;

        let quantities: Vec<_> = lines.iter().map(BasketLine::as_quantity).collect();
        let products: Vec<i32> = expand_lines(&quantities)
            .iter()
            .map(ProductId::as_i32)
            .collect();

        let sql = format!(
            "INSERT INTO storefront.orders AS o (
                 user_id,
                 billing_name, billing_address1, billing_address2,
                 billing_zip_code, billing_city, billing_country,
                 shipping_name, shipping_address1, shipping_address2,
                 shipping_zip_code, shipping_city, shipping_country
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             RETURNING {ORDER_COLUMNS}"
        );

        let order: Order = sqlx::query_as(&sql)
            .bind(user)
            .bind(&billing.name)
            .bind(&billing.address1)
            .bind(&billing.address2)
            .bind(&billing.zip_code)
            .bind(&billing.city)
            .bind(billing.country)
            .bind(&shipping.name)
            .bind(&shipping.address1)
            .bind(&shipping.address2)
            .bind(&shipping.zip_code)
            .bind(&shipping.city)
            .bind(shipping.country)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, "order"))?;

        sqlx::query(
            "INSERT INTO storefront.order_line (order_id, product_id)
             SELECT $1, UNNEST($2::int4[])",
        )
        .bind(order.id)
        .bind(&products)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "order line"))?;

        tx.commit().await?;
        Ok(order)
    }

    async fn get_order(
        &self,
        id: OrderId,
        scope: OrderScope,
    ) -> Result<Option<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.orders o
             WHERE o.id = $1 AND (NOT $2 OR o.status = 'paid')"
        );
        let order = sqlx::query_as(&sql)
            .bind(id)
            .bind(paid_only(scope))
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.orders o
             WHERE (NOT $1 OR o.status = 'paid')
               AND ($2::storefront.order_status IS NULL OR o.status = $2)
               AND ($3::int4 IS NULL OR o.user_id = $3)
             ORDER BY o.date_added DESC, o.id DESC"
        );
        let orders = sqlx::query_as(&sql)
            .bind(paid_only(filter.scope))
            .bind(filter.status)
            .bind(filter.user)
            .fetch_all(&self.pool)
            .await?;
        Ok(orders)
    }

    async fn order_lines(&self, order: OrderId) -> Result<Vec<OrderLine>, RepositoryError> {
        let sql = format!("{ORDER_LINE_SELECT} WHERE l.order_id = $1 ORDER BY l.id");
        let lines = sqlx::query_as(&sql)
            .bind(order)
            .fetch_all(&self.pool)
            .await?;
        Ok(lines)
    }

    async fn update_order(
        &self,
        id: OrderId,
        update: &OrderUpdate,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {ORDER_COLUMNS} FROM storefront.orders o WHERE o.id = $1 FOR UPDATE");
        let mut order: Order = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        if let Some(status) = update.status {
            order.status = status;
        }
        if let Some(billing) = &update.billing {
            order.set_billing(billing.clone());
        }
        if let Some(shipping) = &update.shipping {
            order.set_shipping(shipping.clone());
        }

        let sql = format!(
            "UPDATE storefront.orders AS o SET
                 status = $2,
                 billing_name = $3, billing_address1 = $4, billing_address2 = $5,
                 billing_zip_code = $6, billing_city = $7, billing_country = $8,
                 shipping_name = $9, shipping_address1 = $10, shipping_address2 = $11,
                 shipping_zip_code = $12, shipping_city = $13, shipping_country = $14,
                 date_updated = NOW()
             WHERE o.id = $1
             RETURNING {ORDER_COLUMNS}"
        );
        let order = sqlx::query_as(&sql)
            .bind(id)
            .bind(order.status)
            .bind(&order.billing_name)
            .bind(&order.billing_address1)
            .bind(&order.billing_address2)
            .bind(&order.billing_zip_code)
            .bind(&order.billing_city)
            .bind(order.billing_country)
            .bind(&order.shipping_name)
            .bind(&order.shipping_address1)
            .bind(&order.shipping_address2)
            .bind(&order.shipping_zip_code)
            .bind(&order.shipping_city)
            .bind(order.shipping_country)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(order)
    }

    async fn set_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let sql = format!(
            "UPDATE storefront.orders AS o SET status = $2, date_updated = NOW()
             WHERE o.id = $1
             RETURNING {ORDER_COLUMNS}"
        );
        sqlx::query_as(&sql)
            .bind(id)
            .bind(status)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_order_line(
        &self,
        id: OrderLineId,
        scope: OrderScope,
    ) -> Result<Option<OrderLine>, RepositoryError> {
        let sql = format!("{ORDER_LINE_SELECT} WHERE l.id = $1 AND (NOT $2 OR o.status = 'paid')");
        let line = sqlx::query_as(&sql)
            .bind(id)
            .bind(paid_only(scope))
            .fetch_optional(&self.pool)
            .await?;
        Ok(line)
    }

    async fn list_order_lines(
        &self,
        filter: &OrderLineFilter,
    ) -> Result<Vec<OrderLine>, RepositoryError> {
        let sql = format!(
            "{ORDER_LINE_SELECT}
             WHERE (NOT $1 OR o.status = 'paid')
               AND ($2::int4 IS NULL OR l.order_id = $2)
               AND ($3::storefront.order_line_status IS NULL OR l.status = $3)
             ORDER BY o.date_added DESC, l.order_id DESC, l.id"
        );
        let lines = sqlx::query_as(&sql)
            .bind(paid_only(filter.scope))
            .bind(filter.order)
            .bind(filter.status)
            .fetch_all(&self.pool)
            .await?;
        Ok(lines)
    }

    async fn set_order_line_status(
        &self,
        id: OrderLineId,
        status: OrderLineStatus,
    ) -> Result<OrderLine, RepositoryError> {
        let updated = sqlx::query("UPDATE storefront.order_line SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get_order_line(id, OrderScope::All)
            .await?
            .ok_or(RepositoryError::NotFound)
    }
}
