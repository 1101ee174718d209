//! Basket to order conversion.

use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use booktime_core::order::{ConversionError, check_convertible};
use booktime_core::{AddressFields, AddressId, UserId};

use crate::db::{RepositoryError, Store};
use crate::models::{Basket, Order};

/// Errors from checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The basket has no owner or is no longer open.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// Nothing to order.
    #[error("basket is empty")]
    EmptyBasket,

    /// The chosen address is not in the user's address book.
    #[error("address {0} not found")]
    AddressNotFound(AddressId),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Addresses picked on the checkout page.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CheckoutForm {
    pub billing_address: AddressId,
    pub shipping_address: AddressId,
}

/// Convert `basket` into an order with the given address snapshots.
///
/// The basket must have an owner and be open. Nothing is written when either
/// check fails, and a basket submitted concurrently surfaces as
/// `ConversionError::NotOpen`.
///
/// # Errors
///
/// `CheckoutError::Conversion` when the precondition fails.
#[instrument(skip(store, basket, billing, shipping), fields(basket_id = %basket.id))]
pub async fn create_order(
    store: &dyn Store,
    basket: &Basket,
    billing: &AddressFields,
    shipping: &AddressFields,
) -> Result<Order, CheckoutError> {
    let user = check_convertible(basket.user_id, basket.status)?;

    let order = store
        .create_order(basket.id, user, billing, shipping)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => CheckoutError::Conversion(ConversionError::NotOpen),
            other => CheckoutError::Repository(other),
        })?;

    tracing::info!(order_id = %order.id, user_id = %user, "Order created");
    Ok(order)
}

/// Checkout page submission: look up both addresses in `user`'s address book
/// and convert the non-empty basket.
///
/// # Errors
///
/// `CheckoutError::EmptyBasket`, `CheckoutError::AddressNotFound`, or any
/// error from [`create_order`].
pub async fn checkout(
    store: &dyn Store,
    basket: &Basket,
    user: UserId,
    form: CheckoutForm,
) -> Result<Order, CheckoutError> {
    if store.basket_lines(basket.id).await?.is_empty() {
        return Err(CheckoutError::EmptyBasket);
    }

    let billing = store
        .get_address(user, form.billing_address)
        .await?
        .ok_or(CheckoutError::AddressNotFound(form.billing_address))?;
    let shipping = store
        .get_address(user, form.shipping_address)
        .await?
        .ok_or(CheckoutError::AddressNotFound(form.shipping_address))?;

    create_order(store, basket, &billing.fields(), &shipping.fields()).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::{BasketStore, MemoryStore, OrderStore, UserStore};
    use crate::models::{NewUser, OrderFilter};
    use booktime_core::{BasketStatus, CountryCode, Email};

    fn fields() -> AddressFields {
        AddressFields {
            name: "Ada".to_owned(),
            address1: "1 Street".to_owned(),
            address2: String::new(),
            zip_code: "12345".to_owned(),
            city: "Town".to_owned(),
            country: CountryCode::Us,
        }
    }

    #[tokio::test]
    async fn test_anonymous_basket_is_rejected_without_writes() {
        let store = MemoryStore::new();
        let basket = store.create_basket(None).await.unwrap();

        let result = create_order(&store, &basket, &fields(), &fields()).await;

        assert!(matches!(
            result,
            Err(CheckoutError::Conversion(ConversionError::NoUser))
        ));
        assert!(store.list_orders(&OrderFilter::default()).await.unwrap().is_empty());
        let basket = store.get_basket(basket.id).await.unwrap().unwrap();
        assert_eq!(basket.status, BasketStatus::Open);
    }

    #[tokio::test]
    async fn test_stale_basket_reports_not_open() {
        let store = MemoryStore::new();
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
        let basket = store.create_basket(Some(user.id)).await.unwrap();

        create_order(&store, &basket, &fields(), &fields()).await.unwrap();
        let again = create_order(&store, &basket, &fields(), &fields()).await;

        assert!(matches!(
            again,
            Err(CheckoutError::Conversion(ConversionError::NotOpen))
        ));
    }
}
