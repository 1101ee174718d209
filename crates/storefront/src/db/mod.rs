//! Persistence for the storefront.
//!
//! # Database: `booktime`
//!
//! All tables live in the `storefront` schema:
//!
//! - `user` - Accounts, password hashes and staff roles
//! - `address` - Per-user address book
//! - `product`, `product_tag`, `product_tags`, `product_image` - Catalog
//! - `basket`, `basket_line` - Shopping baskets
//! - `orders`, `order_line` - Placed orders with address snapshots
//!
//! Sessions are stored by `tower-sessions-sqlx-store` in its own schema.
//!
//! # Stores
//!
//! Every handler and service talks to an `Arc<dyn Store>`. Two
//! implementations exist:
//!
//! - [`postgres::PgStore`] - production, one transaction per multi-row write
//! - [`memory::MemoryStore`] - in-process, used by tests and local demos
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p booktime-cli -- migrate
//! ```

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use booktime_core::{
    AddressFields, AddressId, BasketId, BasketLineId, BasketStatus, Email, OrderId, OrderLineId,
    OrderLineStatus, OrderStatus, ProductId, Slug, TagId, UserId,
};

use crate::models::{
    Address, Basket, BasketItem, BasketLine, BasketSummary, DailyOrderCount, NewProduct, NewTag,
    NewUser, Order, OrderFilter, OrderLine, OrderLineFilter, OrderScope, OrderUpdate, Product,
    ProductImage, ProductSales, ProductUpdate, Tag, TagUpdate, User, UserCredentials, UserUpdate,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Embedded schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or violates an invariant.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation or lost race (e.g., unique email, basket no longer open).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The row is still referenced and may not be deleted.
    #[error("protected: {0}")]
    Protected(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Products, tags and images.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Products ordered by name, optionally restricted to a tag and to active products.
    async fn list_products(
        &self,
        tag: Option<&Slug>,
        active_only: bool,
    ) -> Result<Vec<Product>, RepositoryError>;

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    async fn get_product_by_slug(&self, slug: &Slug) -> Result<Option<Product>, RepositoryError>;

    async fn create_product(&self, product: &NewProduct, slug: &Slug)
    -> Result<Product, RepositoryError>;

    async fn update_product(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, RepositoryError>;

    /// Delete a product with its images and basket lines.
    ///
    /// Fails with [`RepositoryError::Protected`] while order lines reference it.
    async fn delete_product(&self, id: ProductId) -> Result<(), RepositoryError>;

    async fn list_tags(&self, active_only: bool) -> Result<Vec<Tag>, RepositoryError>;

    async fn get_tag(&self, id: TagId) -> Result<Option<Tag>, RepositoryError>;

    async fn create_tag(&self, tag: &NewTag, slug: &Slug) -> Result<Tag, RepositoryError>;

    async fn update_tag(&self, id: TagId, update: &TagUpdate) -> Result<Tag, RepositoryError>;

    async fn delete_tag(&self, id: TagId) -> Result<(), RepositoryError>;

    async fn list_product_images(
        &self,
        product: ProductId,
    ) -> Result<Vec<ProductImage>, RepositoryError>;

    async fn add_product_image(
        &self,
        product: ProductId,
        image: &str,
    ) -> Result<ProductImage, RepositoryError>;
}

/// Baskets and their lines.
#[async_trait]
pub trait BasketStore: Send + Sync {
    async fn get_basket(&self, id: BasketId) -> Result<Option<Basket>, RepositoryError>;

    async fn create_basket(&self, user: Option<UserId>) -> Result<Basket, RepositoryError>;

    /// Ids of every OPEN basket owned by `user`, lowest first.
    async fn open_baskets_for_user(&self, user: UserId) -> Result<Vec<BasketId>, RepositoryError>;

    async fn basket_lines(&self, basket: BasketId) -> Result<Vec<BasketLine>, RepositoryError>;

    /// Lines joined with product name and price, in line order.
    async fn basket_items(&self, basket: BasketId) -> Result<Vec<BasketItem>, RepositoryError>;

    /// Increment the oldest line for `product`, or create one with quantity 1.
    async fn add_product(
        &self,
        basket: BasketId,
        product: ProductId,
    ) -> Result<BasketLine, RepositoryError>;

    async fn set_line_quantity(
        &self,
        basket: BasketId,
        line: BasketLineId,
        quantity: i32,
    ) -> Result<BasketLine, RepositoryError>;

    async fn remove_line(&self, basket: BasketId, line: BasketLineId)
    -> Result<(), RepositoryError>;

    async fn assign_user(&self, basket: BasketId, user: UserId) -> Result<Basket, RepositoryError>;

    /// Re-parent every line of `from` onto `into`, then delete `from`. Atomic.
    async fn move_lines_and_delete(
        &self,
        from: BasketId,
        into: BasketId,
    ) -> Result<(), RepositoryError>;

    /// Back-office listing with per-basket item counts, newest first.
    async fn list_baskets(
        &self,
        status: Option<BasketStatus>,
    ) -> Result<Vec<BasketSummary>, RepositoryError>;
}

/// Orders and order lines.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Convert an open basket owned by `user` into an order. Atomic.
    ///
    /// Writes the order with both address snapshots, one `New` order line per
    /// unit of every basket line, and flips the basket to `Submitted`. Fails
    /// with [`RepositoryError::Conflict`] and writes nothing if the basket is
    /// not open or not owned by `user`.
    async fn create_order(
        &self,
        basket: BasketId,
        user: UserId,
        billing: &AddressFields,
        shipping: &AddressFields,
    ) -> Result<Order, RepositoryError>;

    async fn get_order(&self, id: OrderId, scope: OrderScope)
    -> Result<Option<Order>, RepositoryError>;

    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError>;

    async fn order_lines(&self, order: OrderId) -> Result<Vec<OrderLine>, RepositoryError>;

    async fn update_order(
        &self,
        id: OrderId,
        update: &OrderUpdate,
    ) -> Result<Order, RepositoryError>;

    async fn set_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError>;

    async fn get_order_line(
        &self,
        id: OrderLineId,
        scope: OrderScope,
    ) -> Result<Option<OrderLine>, RepositoryError>;

    async fn list_order_lines(
        &self,
        filter: &OrderLineFilter,
    ) -> Result<Vec<OrderLine>, RepositoryError>;

    async fn set_order_line_status(
        &self,
        id: OrderLineId,
        status: OrderLineStatus,
    ) -> Result<OrderLine, RepositoryError>;
}

/// User accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with [`RepositoryError::Conflict`] if the email is taken.
    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<UserCredentials>, RepositoryError>;

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError>;

    async fn update_user(&self, id: UserId, update: &UserUpdate) -> Result<User, RepositoryError>;
}

/// Address book. Every operation is scoped to the owning user.
#[async_trait]
pub trait AddressStore: Send + Sync {
    /// Addresses of `user`, or of everyone when `None`.
    async fn list_addresses(&self, user: Option<UserId>) -> Result<Vec<Address>, RepositoryError>;

    async fn get_address(
        &self,
        user: UserId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError>;

    async fn create_address(
        &self,
        user: UserId,
        fields: &AddressFields,
    ) -> Result<Address, RepositoryError>;

    async fn update_address(
        &self,
        user: UserId,
        id: AddressId,
        fields: &AddressFields,
    ) -> Result<Address, RepositoryError>;

    async fn delete_address(&self, user: UserId, id: AddressId) -> Result<(), RepositoryError>;
}

/// Aggregate queries for the back-office reports.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Orders per calendar day (UTC) since `since`, oldest day first.
    async fn orders_per_day(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyOrderCount>, RepositoryError>;

    /// Order lines since `since` grouped by product name, most bought first.
    async fn top_products(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ProductSales>, RepositoryError>;
}

/// Everything the storefront needs from persistence.
#[async_trait]
pub trait Store:
    CatalogStore + BasketStore + OrderStore + UserStore + AddressStore + ReportStore
{
    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Map an insert/update error: unique violations become
/// [`RepositoryError::Conflict`], dangling foreign keys [`RepositoryError::NotFound`].
pub(crate) fn map_write_error(err: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(format!("{what} already exists"));
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::NotFound;
        }
    }
    RepositoryError::Database(err)
}

/// Map a delete error: foreign-key violations become [`RepositoryError::Protected`].
pub(crate) fn map_delete_error(err: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_foreign_key_violation()
    {
        return RepositoryError::Protected(format!("{what} is referenced by existing orders"));
    }
    RepositoryError::Database(err)
}
