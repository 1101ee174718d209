//! Order and order-line status changes.
//!
//! Every order-line status write goes through [`set_line_status`], which runs
//! the order aggregation right after the write.

use thiserror::Error;
use tracing::instrument;

use booktime_core::aggregation::order_status_after_line_change;
use booktime_core::{OrderId, OrderLineId, OrderLineStatus, OrderStatus};

use crate::db::{RepositoryError, Store};
use crate::models::{Order, OrderLine, OrderScope};

/// Errors from fulfillment updates.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// The order or line does not exist within the caller's scope.
    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

fn not_found(err: RepositoryError) -> FulfillmentError {
    match err {
        RepositoryError::NotFound => FulfillmentError::NotFound,
        other => FulfillmentError::Repository(other),
    }
}

/// Change a line's status, then bring its order's status up to date.
///
/// The line write is never rolled back because of the aggregation step; if
/// that step fails it is logged and the order catches up on the next write.
///
/// # Errors
///
/// `FulfillmentError::NotFound` when the line is outside `scope`.
#[instrument(skip(store))]
pub async fn set_line_status(
    store: &dyn Store,
    line: OrderLineId,
    status: OrderLineStatus,
    scope: OrderScope,
) -> Result<OrderLine, FulfillmentError> {
    if store.get_order_line(line, scope).await?.is_none() {
        return Err(FulfillmentError::NotFound);
    }

    let updated = store
        .set_order_line_status(line, status)
        .await
        .map_err(not_found)?;

    if let Err(e) = aggregate_order(store, updated.order_id).await {
        tracing::error!(order_id = %updated.order_id, error = %e, "Order status aggregation failed");
    }

    Ok(updated)
}

/// Move the order to `Done` once none of its lines is pending.
///
/// Returns the new status when it changed. Safe to call repeatedly.
///
/// # Errors
///
/// Returns `RepositoryError` if the order or its lines cannot be loaded.
#[instrument(skip(store))]
pub async fn aggregate_order(
    store: &dyn Store,
    order: OrderId,
) -> Result<Option<OrderStatus>, RepositoryError> {
    let current = store
        .get_order(order, OrderScope::All)
        .await?
        .ok_or(RepositoryError::NotFound)?;
    let statuses: Vec<OrderLineStatus> = store
        .order_lines(order)
        .await?
        .into_iter()
        .map(|line| line.status)
        .collect();

    let Some(next) = order_status_after_line_change(current.status, &statuses) else {
        return Ok(None);
    };

    store.set_order_status(order, next).await?;
    tracing::info!(order_id = %order, status = %next, "Order status updated from its lines");
    Ok(Some(next))
}

/// Set an order's status directly from the back office.
///
/// # Errors
///
/// `FulfillmentError::NotFound` if the order does not exist.
#[instrument(skip(store))]
pub async fn set_order_status(
    store: &dyn Store,
    order: OrderId,
    status: OrderStatus,
) -> Result<Order, FulfillmentError> {
    store
        .set_order_status(order, status)
        .await
        .map_err(not_found)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::{BasketStore, CatalogStore, MemoryStore, OrderStore, UserStore};
    use crate::models::{NewProduct, NewUser};
    use booktime_core::{AddressFields, CountryCode, Email, Price, Slug};

    /// A paid order with three lines, returned with its line ids.
    async fn paid_order(store: &MemoryStore) -> (OrderId, Vec<OrderLineId>) {
        let user = store
            .create_user(&NewUser {
                email: Email::parse("ada@booktime.domain").unwrap(),
                password_hash: "x".to_owned(),
                first_name: String::new(),
                last_name: String::new(),
                role: None,
            })
            .await
            .unwrap();
        let product = store
            .create_product(
                &NewProduct {
                    name: "Dune".to_owned(),
                    slug: None,
                    description: String::new(),
                    price: Price::from_cents(999).unwrap(),
                    active: true,
                    in_stock: true,
                    tags: Vec::new(),
                },
                &Slug::from_name("Dune"),
            )
            .await
            .unwrap();
        let basket = store.create_basket(Some(user.id)).await.unwrap();
        let line = store.add_product(basket.id, product.id).await.unwrap();
        store.set_line_quantity(basket.id, line.id, 3).await.unwrap();

        let fields = AddressFields {
            name: "Ada".to_owned(),
            address1: "1 Street".to_owned(),
            address2: String::new(),
            zip_code: "12345".to_owned(),
            city: "Town".to_owned(),
            country: CountryCode::Us,
        };
        let order = store
            .create_order(basket.id, user.id, &fields, &fields)
            .await
            .unwrap();
        store.set_order_status(order.id, OrderStatus::Paid).await.unwrap();

        let lines = store.order_lines(order.id).await.unwrap();
        (order.id, lines.into_iter().map(|l| l.id).collect())
    }

    async fn order_status(store: &MemoryStore, order: OrderId) -> OrderStatus {
        store
            .get_order(order, OrderScope::All)
            .await
            .unwrap()
            .unwrap()
            .status
    }

    #[tokio::test]
    async fn test_order_done_when_last_pending_line_settles() {
        let store = MemoryStore::new();
        let (order, lines) = paid_order(&store).await;

        set_line_status(&store, lines[0], OrderLineStatus::Sent, OrderScope::Paid)
            .await
            .unwrap();
        set_line_status(&store, lines[1], OrderLineStatus::Sent, OrderScope::Paid)
            .await
            .unwrap();
        assert_eq!(order_status(&store, order).await, OrderStatus::Paid);

        set_line_status(&store, lines[2], OrderLineStatus::Cancelled, OrderScope::Paid)
            .await
            .unwrap();
        assert_eq!(order_status(&store, order).await, OrderStatus::Done);
    }

    #[tokio::test]
    async fn test_done_order_is_not_demoted() {
        let store = MemoryStore::new();
        let (order, lines) = paid_order(&store).await;
        for line in &lines {
            set_line_status(&store, *line, OrderLineStatus::Sent, OrderScope::All)
                .await
                .unwrap();
        }
        assert_eq!(order_status(&store, order).await, OrderStatus::Done);

        set_line_status(&store, lines[0], OrderLineStatus::Processing, OrderScope::All)
            .await
            .unwrap();
        assert_eq!(order_status(&store, order).await, OrderStatus::Done);
        assert_eq!(aggregate_order(&store, order).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_paid_scope_hides_lines_of_unpaid_orders() {
        let store = MemoryStore::new();
        let (order, lines) = paid_order(&store).await;
        store.set_order_status(order, OrderStatus::New).await.unwrap();

        assert!(matches!(
            set_line_status(&store, lines[0], OrderLineStatus::Sent, OrderScope::Paid).await,
            Err(FulfillmentError::NotFound)
        ));
    }
}
