//! Back-office catalog writes.

use thiserror::Error;
use tracing::instrument;

use booktime_core::{ProductId, Slug, TagId};

use crate::db::{RepositoryError, Store};
use crate::models::{NewProduct, NewTag, Product, ProductUpdate, Tag, TagUpdate};

/// Longest product or tag name.
pub const MAX_NAME_LENGTH: usize = 32;

/// Errors from catalog writes.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("name must be 1 to {MAX_NAME_LENGTH} characters")]
    InvalidName,

    /// Slug collides with another product or tag.
    #[error("{0}")]
    Conflict(String),

    /// Product or tag missing, or a referenced tag does not exist.
    #[error("not found")]
    NotFound,

    /// Still referenced by orders.
    #[error("{0}")]
    Protected(String),

    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for CatalogError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound,
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            RepositoryError::Protected(msg) => Self::Protected(msg),
            other => Self::Repository(other),
        }
    }
}

fn check_name(name: &str) -> Result<String, CatalogError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
        return Err(CatalogError::InvalidName);
    }
    Ok(name.to_owned())
}

/// Create a product; the slug defaults to a slugified name.
///
/// # Errors
///
/// `CatalogError::InvalidName`, or `CatalogError::Conflict` for a taken slug.
#[instrument(skip(store, product), fields(name = %product.name))]
pub async fn create_product(store: &dyn Store, product: NewProduct) -> Result<Product, CatalogError> {
    let product = NewProduct {
        name: check_name(&product.name)?,
        ..product
    };
    let slug = product
        .slug
        .clone()
        .unwrap_or_else(|| Slug::from_name(&product.name));

    let created = store.create_product(&product, &slug).await?;
    tracing::info!(product_id = %created.id, slug = %created.slug, "Product created");
    Ok(created)
}

/// Apply a partial product update.
///
/// # Errors
///
/// `CatalogError::NotFound`, `CatalogError::InvalidName` or `CatalogError::Conflict`.
#[instrument(skip(store, update))]
pub async fn update_product(
    store: &dyn Store,
    id: ProductId,
    update: ProductUpdate,
) -> Result<Product, CatalogError> {
    let update = ProductUpdate {
        name: update.name.as_deref().map(check_name).transpose()?,
        ..update
    };
    Ok(store.update_product(id, &update).await?)
}

/// Delete a product unless orders still reference it.
///
/// # Errors
///
/// `CatalogError::Protected` when order lines reference the product.
#[instrument(skip(store))]
pub async fn delete_product(store: &dyn Store, id: ProductId) -> Result<(), CatalogError> {
    store.delete_product(id).await?;
    tracing::info!(product_id = %id, "Product deleted");
    Ok(())
}

/// Create a tag; the slug defaults to a slugified name.
///
/// # Errors
///
/// `CatalogError::InvalidName`, or `CatalogError::Conflict` for a taken slug.
#[instrument(skip(store, tag), fields(name = %tag.name))]
pub async fn create_tag(store: &dyn Store, tag: NewTag) -> Result<Tag, CatalogError> {
    let tag = NewTag {
        name: check_name(&tag.name)?,
        ..tag
    };
    let slug = tag.slug.clone().unwrap_or_else(|| Slug::from_name(&tag.name));
    Ok(store.create_tag(&tag, &slug).await?)
}

/// Apply a partial tag update.
///
/// # Errors
///
/// `CatalogError::NotFound`, `CatalogError::InvalidName` or `CatalogError::Conflict`.
#[instrument(skip(store, update))]
pub async fn update_tag(
    store: &dyn Store,
    id: TagId,
    update: TagUpdate,
) -> Result<Tag, CatalogError> {
    let update = TagUpdate {
        name: update.name.as_deref().map(check_name).transpose()?,
        ..update
    };
    Ok(store.update_tag(id, &update).await?)
}

/// Delete a tag. Products lose the tag; they are not deleted.
///
/// # Errors
///
/// `CatalogError::NotFound` if the tag does not exist.
#[instrument(skip(store))]
pub async fn delete_tag(store: &dyn Store, id: TagId) -> Result<(), CatalogError> {
    Ok(store.delete_tag(id).await?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use booktime_core::Price;

    fn new_product(name: &str) -> NewProduct {
        NewProduct {
            name: name.to_owned(),
            slug: None,
            description: String::new(),
            price: Price::from_cents(500).unwrap(),
            active: true,
            in_stock: true,
            tags: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_slug_derived_from_name() {
        let store = MemoryStore::new();
        let product = create_product(&store, new_product("  The Hobbit ")).await.unwrap();
        assert_eq!(product.name, "The Hobbit");
        assert_eq!(product.slug.as_str(), "the-hobbit");
    }

    #[tokio::test]
    async fn test_name_length_enforced() {
        let store = MemoryStore::new();
        let long = "x".repeat(MAX_NAME_LENGTH + 1);
        assert!(matches!(
            create_product(&store, new_product(&long)).await,
            Err(CatalogError::InvalidName)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_slug_conflicts() {
        let store = MemoryStore::new();
        create_product(&store, new_product("Dune")).await.unwrap();
        assert!(matches!(
            create_product(&store, new_product("dune")).await,
            Err(CatalogError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_ordered_product_is_protected() {
        use crate::db::{BasketStore, CatalogStore, OrderStore, UserStore};
        use crate::models::NewUser;
        use booktime_core::{AddressFields, CountryCode, Email};

        let store = MemoryStore::new();
        let product = create_product(&store, new_product("Dune")).await.unwrap();
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
        store.add_product(basket.id, product.id).await.unwrap();
        let address = AddressFields {
            name: "Ada".to_owned(),
            address1: "1 Street".to_owned(),
            address2: String::new(),
            zip_code: "12345".to_owned(),
            city: "Town".to_owned(),
            country: CountryCode::Us,
        };
        let order = store
            .create_order(basket.id, user.id, &address, &address)
            .await
            .unwrap();

        assert!(matches!(
            delete_product(&store, product.id).await,
            Err(CatalogError::Protected(_))
        ));
        assert!(store.get_product(product.id).await.unwrap().is_some());
        assert_eq!(store.order_lines(order.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_tag_rejected() {
        let store = MemoryStore::new();
        let mut product = new_product("Dune");
        product.tags = vec![TagId::new(404)];
        assert!(matches!(
            create_product(&store, product).await,
            Err(CatalogError::NotFound)
        ));
    }
}
