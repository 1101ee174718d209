//! Basket operations behind the shop's basket page.
//!
//! A session carries at most one basket id. Baskets are created lazily on the
//! first add; a submitted or vanished basket is treated as no basket at all.

use thiserror::Error;
use tracing::instrument;

use booktime_core::basket::{self, QuantityError, validate_quantity};
use booktime_core::{BasketId, BasketLineId, ProductId, UserId};

use crate::db::{RepositoryError, Store};
use crate::models::{Basket, BasketLine, BasketView};

/// Errors from basket operations.
#[derive(Debug, Error)]
pub enum BasketError {
    /// The product does not exist or is not for sale.
    #[error("product not found")]
    ProductNotFound,

    /// The line is not part of the session's basket.
    #[error("basket line not found")]
    LineNotFound,

    /// The session has no open basket.
    #[error("no open basket")]
    NoBasket,

    #[error(transparent)]
    Quantity(#[from] QuantityError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// The open basket behind a session's basket id, if `caller` may use it.
///
/// A basket owned by another account resolves to nothing, as does an owned
/// basket seen by an anonymous caller.
///
/// # Errors
///
/// Returns `RepositoryError` if the lookup fails.
pub async fn resolve_basket(
    store: &dyn Store,
    basket_id: Option<BasketId>,
    caller: Option<UserId>,
) -> Result<Option<Basket>, RepositoryError> {
    let Some(id) = basket_id else {
        return Ok(None);
    };
    Ok(store.get_basket(id).await?.filter(|basket| {
        basket.is_open() && basket.user_id.is_none_or(|owner| Some(owner) == caller)
    }))
}

/// Add one unit of `product` to the session basket, creating the basket if
/// needed.
///
/// A logged-in user without a session basket continues their existing open
/// basket rather than starting a second one. Returns the basket now in use,
/// which the caller stores in the session.
///
/// # Errors
///
/// `BasketError::ProductNotFound` for unknown or inactive products.
#[instrument(skip(store))]
pub async fn add_product(
    store: &dyn Store,
    current: Option<Basket>,
    user: Option<UserId>,
    product: ProductId,
) -> Result<(Basket, BasketLine), BasketError> {
    let available = store
        .get_product(product)
        .await?
        .is_some_and(|p| p.active);
    if !available {
        return Err(BasketError::ProductNotFound);
    }

    let basket = match current {
        Some(basket) => basket,
        None => existing_or_new(store, user).await?,
    };

    let line = store
        .add_product(basket.id, product)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => BasketError::ProductNotFound,
            other => BasketError::Repository(other),
        })?;

    tracing::debug!(basket_id = %basket.id, line_id = %line.id, quantity = line.quantity, "Product added to basket");
    Ok((basket, line))
}

async fn existing_or_new(store: &dyn Store, user: Option<UserId>) -> Result<Basket, BasketError> {
    if let Some(user) = user {
        let open = store.open_baskets_for_user(user).await?;
        if let [id] = open.as_slice()
            && let Some(basket) = store.get_basket(*id).await?
        {
            return Ok(basket);
        }
    }

    let basket = store.create_basket(user).await?;
    tracing::info!(basket_id = %basket.id, "Basket created");
    Ok(basket)
}

/// Lines and totals for the basket page. No basket renders as empty.
///
/// # Errors
///
/// Returns `RepositoryError` if the lines cannot be loaded.
pub async fn basket_contents(
    store: &dyn Store,
    basket: Option<&Basket>,
) -> Result<BasketView, RepositoryError> {
    let Some(basket) = basket else {
        return Ok(BasketView {
            id: None,
            lines: Vec::new(),
            count: 0,
            is_empty: true,
        });
    };

    let lines = store.basket_lines(basket.id).await?;
    let quantities: Vec<_> = lines.iter().map(BasketLine::as_quantity).collect();
    let items = store.basket_items(basket.id).await?;

    Ok(BasketView {
        id: Some(basket.id),
        lines: items,
        count: basket::total_quantity(&quantities),
        is_empty: basket::is_empty(&quantities),
    })
}

/// Set a line's quantity from the basket page.
///
/// # Errors
///
/// `BasketError::Quantity` when below 1, `BasketError::LineNotFound`
/// when the line belongs to another basket.
#[instrument(skip(store, basket), fields(basket_id = %basket.id))]
pub async fn update_quantity(
    store: &dyn Store,
    basket: &Basket,
    line: BasketLineId,
    quantity: i32,
) -> Result<BasketLine, BasketError> {
    let quantity = validate_quantity(quantity)?;
    store
        .set_line_quantity(basket.id, line, quantity)
        .await
        .map_err(line_error)
}

/// Remove a line from the basket.
///
/// # Errors
///
/// `BasketError::LineNotFound` when the line belongs to another basket.
#[instrument(skip(store, basket), fields(basket_id = %basket.id))]
pub async fn remove_line(
    store: &dyn Store,
    basket: &Basket,
    line: BasketLineId,
) -> Result<(), BasketError> {
    store.remove_line(basket.id, line).await.map_err(line_error)
}

fn line_error(err: RepositoryError) -> BasketError {
    match err {
        RepositoryError::NotFound => BasketError::LineNotFound,
        other => BasketError::Repository(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::{BasketStore, CatalogStore, MemoryStore, UserStore};
    use crate::models::{NewProduct, NewUser, ProductUpdate};
    use booktime_core::{BasketStatus, Email, Price, Slug};

    async fn product(store: &MemoryStore, name: &str) -> ProductId {
        let new = NewProduct {
            name: name.to_owned(),
            slug: None,
            description: String::new(),
            price: Price::from_cents(1250).unwrap(),
            active: true,
            in_stock: true,
            tags: Vec::new(),
        };
        store
            .create_product(&new, &Slug::from_name(name))
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_first_add_creates_basket() {
        let store = MemoryStore::new();
        let dune = product(&store, "Dune").await;

        let (basket, line) = add_product(&store, None, None, dune).await.unwrap();
        assert_eq!(basket.user_id, None);
        assert_eq!(line.quantity, 1);

        let (again, line) = add_product(&store, Some(basket), None, dune).await.unwrap();
        assert_eq!(again.id, basket.id);
        assert_eq!(line.quantity, 2);
    }

    #[tokio::test]
    async fn test_inactive_product_cannot_be_added() {
        let store = MemoryStore::new();
        let dune = product(&store, "Dune").await;
        store
            .update_product(
                dune,
                &ProductUpdate {
                    active: Some(false),
                    ..ProductUpdate::default()
                },
            )
            .await
            .unwrap();

        assert!(matches!(
            add_product(&store, None, None, dune).await,
            Err(BasketError::ProductNotFound)
        ));
    }

    #[tokio::test]
    async fn test_submitted_basket_does_not_resolve() {
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
        let fields = booktime_core::AddressFields {
            name: "Ada".to_owned(),
            address1: "1 Street".to_owned(),
            address2: String::new(),
            zip_code: "12345".to_owned(),
            city: "Town".to_owned(),
            country: booktime_core::CountryCode::Us,
        };
        crate::db::OrderStore::create_order(&store, basket.id, user.id, &fields, &fields)
            .await
            .unwrap();

        assert_eq!(
            store.get_basket(basket.id).await.unwrap().unwrap().status,
            BasketStatus::Submitted
        );
        assert!(resolve_basket(&store, Some(basket.id), Some(user.id)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_someone_elses_basket_does_not_resolve() {
        let store = MemoryStore::new();
        let owner = store
            .create_user(&NewUser {
                email: Email::parse("ada@booktime.domain").unwrap(),
                password_hash: "x".to_owned(),
                first_name: String::new(),
                last_name: String::new(),
                role: None,
            })
            .await
            .unwrap();
        let basket = store.create_basket(Some(owner.id)).await.unwrap();
        let anonymous = store.create_basket(None).await.unwrap();

        let stranger = UserId::new(owner.id.as_i32() + 1);

        let resolve = |id, caller| resolve_basket(&store, Some(id), caller);
        assert!(resolve(basket.id, Some(owner.id)).await.unwrap().is_some());
        assert!(resolve(basket.id, Some(stranger)).await.unwrap().is_none());
        assert!(resolve(basket.id, None).await.unwrap().is_none());
        assert!(resolve(anonymous.id, Some(stranger)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_contents_count_and_quantity_rules() {
        let store = MemoryStore::new();
        let dune = product(&store, "Dune").await;
        let emma = product(&store, "Emma").await;
        let (basket, dune_line) = add_product(&store, None, None, dune).await.unwrap();
        add_product(&store, Some(basket), None, emma).await.unwrap();

        update_quantity(&store, &basket, dune_line.id, 3).await.unwrap();
        let view = basket_contents(&store, Some(&basket)).await.unwrap();
        assert_eq!(view.count, 4);
        assert!(!view.is_empty);

        assert!(matches!(
            update_quantity(&store, &basket, dune_line.id, 0).await,
            Err(BasketError::Quantity(_))
        ));

        let other = store.create_basket(None).await.unwrap();
        assert!(matches!(
            remove_line(&store, &other, dune_line.id).await,
            Err(BasketError::LineNotFound)
        ));
    }

    #[tokio::test]
    async fn test_empty_view_without_basket() {
        let store = MemoryStore::new();
        let view = basket_contents(&store, None).await.unwrap();
        assert!(view.is_empty);
        assert_eq!(view.count, 0);
    }
}
