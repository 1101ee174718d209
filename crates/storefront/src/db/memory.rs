//! In-process store.
//!
//! Holds every table in `BTreeMap`s behind one async mutex, so each trait
//! method is atomic in the same way a single Postgres transaction is.
//! Foreign keys, unique slugs/emails and delete rules mirror the migrations.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;

use booktime_core::basket::line_to_increment;
use booktime_core::order::expand_lines;
use booktime_core::{
    AddressFields, AddressId, BasketId, BasketLineId, BasketStatus, Email, OrderId, OrderLineId,
    OrderLineStatus, OrderStatus, ProductId, ProductImageId, Slug, TagId, UserId,
};

use super::{
    AddressStore, BasketStore, CatalogStore, OrderStore, ReportStore, RepositoryError, Store,
    UserStore,
};
use crate::models::{
    Address, Basket, BasketItem, BasketLine, BasketSummary, DailyOrderCount, NewProduct, NewTag,
    NewUser, Order, OrderFilter, OrderLine, OrderLineFilter, OrderScope, OrderUpdate, Product,
    ProductImage, ProductSales, ProductUpdate, Tag, TagUpdate, User, UserCredentials, UserUpdate,
};

/// Order line as stored; the product name is joined in on read.
#[derive(Debug, Clone, Copy)]
struct OrderLineRow {
    id: OrderLineId,
    order_id: OrderId,
    product_id: ProductId,
    status: OrderLineStatus,
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, UserCredentials>,
    addresses: BTreeMap<AddressId, Address>,
    products: BTreeMap<ProductId, Product>,
    tags: BTreeMap<TagId, Tag>,
    images: BTreeMap<ProductImageId, ProductImage>,
    baskets: BTreeMap<BasketId, Basket>,
    basket_lines: BTreeMap<BasketLineId, BasketLine>,
    orders: BTreeMap<OrderId, Order>,
    order_lines: BTreeMap<OrderLineId, OrderLineRow>,
    next_id: i32,
}

impl Tables {
    /// Serial shared by all tables; ids only need to be unique per table.
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn require_user(&self, id: UserId) -> Result<(), RepositoryError> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn require_product(&self, id: ProductId) -> Result<(), RepositoryError> {
        if self.products.contains_key(&id) {
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn require_tags(&self, tags: &[TagId]) -> Result<(), RepositoryError> {
        if tags.iter().all(|tag| self.tags.contains_key(tag)) {
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn product_slug_taken(&self, slug: &Slug, except: Option<ProductId>) -> bool {
        self.products
            .values()
            .any(|p| &p.slug == slug && Some(p.id) != except)
    }

    fn tag_slug_taken(&self, slug: &Slug, except: Option<TagId>) -> bool {
        self.tags
            .values()
            .any(|t| &t.slug == slug && Some(t.id) != except)
    }

    fn lines_of(&self, basket: BasketId) -> Vec<BasketLine> {
        self.basket_lines
            .values()
            .filter(|line| line.basket_id == basket)
            .copied()
            .collect()
    }

    fn order_in_scope(&self, order: OrderId, scope: OrderScope) -> bool {
        self.orders
            .get(&order)
            .is_some_and(|o| scope.admits(o.status))
    }

    fn joined_line(&self, row: &OrderLineRow) -> Result<OrderLine, RepositoryError> {
        let product = self.products.get(&row.product_id).ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "order line {} references missing product {}",
                row.id, row.product_id
            ))
        })?;
        Ok(OrderLine {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            product_name: product.name.clone(),
            status: row.status,
        })
    }

    fn sort_newest_first(orders: &mut [Order]) {
        orders.sort_by(|a, b| {
            b.date_added
                .cmp(&a.date_added)
                .then_with(|| b.id.cmp(&a.id))
        });
    }
}

/// Store that keeps everything in memory. Data is lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_products(
        &self,
        tag: Option<&Slug>,
        active_only: bool,
    ) -> Result<Vec<Product>, RepositoryError> {
        let t = self.tables.lock().await;
        let tag_id = match tag {
            Some(slug) => match t.tags.values().find(|tag| &tag.slug == slug) {
                Some(tag) => Some(tag.id),
                None => return Ok(Vec::new()),
            },
            None => None,
        };

        let mut products: Vec<Product> = t
            .products
            .values()
            .filter(|p| !active_only || p.active)
            .filter(|p| tag_id.is_none_or(|id| p.tags.contains(&id)))
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(products)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.tables.lock().await.products.get(&id).cloned())
    }

    async fn get_product_by_slug(&self, slug: &Slug) -> Result<Option<Product>, RepositoryError> {
        let t = self.tables.lock().await;
        Ok(t.products.values().find(|p| &p.slug == slug).cloned())
    }

    async fn create_product(
        &self,
        product: &NewProduct,
        slug: &Slug,
    ) -> Result<Product, RepositoryError> {
        let mut t = self.tables.lock().await;
        if t.product_slug_taken(slug, None) {
            return Err(RepositoryError::Conflict(
                "product slug already exists".to_owned(),
            ));
        }
        t.require_tags(&product.tags)?;

        let mut tags = product.tags.clone();
        tags.sort_unstable();
        tags.dedup();

        let created = Product {
            id: ProductId::new(t.next_id()),
            name: product.name.clone(),
            slug: slug.clone(),
            description: product.description.clone(),
            price: product.price,
            active: product.active,
            in_stock: product.in_stock,
            tags,
            date_updated: Utc::now(),
        };
        t.products.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_product(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        let mut t = self.tables.lock().await;
        t.require_product(id)?;
        if let Some(slug) = &update.slug
            && t.product_slug_taken(slug, Some(id))
        {
            return Err(RepositoryError::Conflict(
                "product slug already exists".to_owned(),
            ));
        }
        if let Some(tags) = &update.tags {
            t.require_tags(tags)?;
        }

        let product = t.products.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        if let Some(name) = &update.name {
            product.name.clone_from(name);
        }
        if let Some(slug) = &update.slug {
            product.slug = slug.clone();
        }
        if let Some(description) = &update.description {
            product.description.clone_from(description);
        }
        if let Some(price) = update.price {
            product.price = price;
        }
        if let Some(active) = update.active {
            product.active = active;
        }
        if let Some(in_stock) = update.in_stock {
            product.in_stock = in_stock;
        }
        if let Some(tags) = &update.tags {
            let mut tags = tags.clone();
            tags.sort_unstable();
            tags.dedup();
            product.tags = tags;
        }
        product.date_updated = Utc::now();
        Ok(product.clone())
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), RepositoryError> {
        let mut t = self.tables.lock().await;
        t.require_product(id)?;
        if t.order_lines.values().any(|line| line.product_id == id) {
            return Err(RepositoryError::Protected(
                "product is referenced by existing orders".to_owned(),
            ));
        }
        t.products.remove(&id);
        t.images.retain(|_, image| image.product_id != id);
        t.basket_lines.retain(|_, line| line.product_id != id);
        Ok(())
    }

    async fn list_tags(&self, active_only: bool) -> Result<Vec<Tag>, RepositoryError> {
        let t = self.tables.lock().await;
        let mut tags: Vec<Tag> = t
            .tags
            .values()
            .filter(|tag| !active_only || tag.active)
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(tags)
    }

    async fn get_tag(&self, id: TagId) -> Result<Option<Tag>, RepositoryError> {
        Ok(self.tables.lock().await.tags.get(&id).cloned())
    }

    async fn create_tag(&self, tag: &NewTag, slug: &Slug) -> Result<Tag, RepositoryError> {
        let mut t = self.tables.lock().await;
        if t.tag_slug_taken(slug, None) {
            return Err(RepositoryError::Conflict("tag slug already exists".to_owned()));
        }
        let created = Tag {
            id: TagId::new(t.next_id()),
            name: tag.name.clone(),
            slug: slug.clone(),
            description: tag.description.clone(),
            active: tag.active,
        };
        t.tags.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_tag(&self, id: TagId, update: &TagUpdate) -> Result<Tag, RepositoryError> {
        let mut t = self.tables.lock().await;
        if let Some(slug) = &update.slug
            && t.tag_slug_taken(slug, Some(id))
        {
            return Err(RepositoryError::Conflict("tag slug already exists".to_owned()));
        }
        let tag = t.tags.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        if let Some(name) = &update.name {
            tag.name.clone_from(name);
        }
        if let Some(slug) = &update.slug {
            tag.slug = slug.clone();
        }
        if let Some(description) = &update.description {
            tag.description.clone_from(description);
        }
        if let Some(active) = update.active {
            tag.active = active;
        }
        Ok(tag.clone())
    }

    async fn delete_tag(&self, id: TagId) -> Result<(), RepositoryError> {
        let mut t = self.tables.lock().await;
        t.tags.remove(&id).ok_or(RepositoryError::NotFound)?;
        for product in t.products.values_mut() {
            product.tags.retain(|tag| *tag != id);
        }
        Ok(())
    }

    async fn list_product_images(
        &self,
        product: ProductId,
    ) -> Result<Vec<ProductImage>, RepositoryError> {
        let t = self.tables.lock().await;
        Ok(t.images
            .values()
            .filter(|image| image.product_id == product)
            .cloned()
            .collect())
    }

    async fn add_product_image(
        &self,
        product: ProductId,
        image: &str,
    ) -> Result<ProductImage, RepositoryError> {
        let mut t = self.tables.lock().await;
        t.require_product(product)?;
        let created = ProductImage {
            id: ProductImageId::new(t.next_id()),
            product_id: product,
            image: image.to_owned(),
            thumbnail: None,
        };
        t.images.insert(created.id, created.clone());
        Ok(created)
    }
}

#[async_trait]
impl BasketStore for MemoryStore {
    async fn get_basket(&self, id: BasketId) -> Result<Option<Basket>, RepositoryError> {
        Ok(self.tables.lock().await.baskets.get(&id).copied())
    }

    async fn create_basket(&self, user: Option<UserId>) -> Result<Basket, RepositoryError> {
        let mut t = self.tables.lock().await;
        if let Some(user) = user {
            t.require_user(user)?;
        }
        let basket = Basket {
            id: BasketId::new(t.next_id()),
            user_id: user,
            status: BasketStatus::Open,
        };
        t.baskets.insert(basket.id, basket);
        Ok(basket)
    }

    async fn open_baskets_for_user(&self, user: UserId) -> Result<Vec<BasketId>, RepositoryError> {
        let t = self.tables.lock().await;
        Ok(t.baskets
            .values()
            .filter(|b| b.user_id == Some(user) && b.is_open())
            .map(|b| b.id)
            .collect())
    }

    async fn basket_lines(&self, basket: BasketId) -> Result<Vec<BasketLine>, RepositoryError> {
        Ok(self.tables.lock().await.lines_of(basket))
    }

    async fn basket_items(&self, basket: BasketId) -> Result<Vec<BasketItem>, RepositoryError> {
        let t = self.tables.lock().await;
        t.lines_of(basket)
            .into_iter()
            .map(|line| {
                let product = t.products.get(&line.product_id).ok_or_else(|| {
                    RepositoryError::DataCorruption(format!(
                        "basket line {} references missing product {}",
                        line.id, line.product_id
                    ))
                })?;
                Ok(BasketItem {
                    id: line.id,
                    product_id: line.product_id,
                    product_name: product.name.clone(),
                    unit_price: product.price,
                    quantity: line.quantity,
                })
            })
            .collect()
    }

    async fn add_product(
        &self,
        basket: BasketId,
        product: ProductId,
    ) -> Result<BasketLine, RepositoryError> {
        let mut t = self.tables.lock().await;
        if !t.baskets.contains_key(&basket) {
            return Err(RepositoryError::NotFound);
        }
        t.require_product(product)?;

        let quantities: Vec<_> = t
            .lines_of(basket)
            .iter()
            .map(BasketLine::as_quantity)
            .collect();

        if let Some(line_id) = line_to_increment(&quantities, product) {
            let line = t
                .basket_lines
                .get_mut(&line_id)
                .ok_or(RepositoryError::NotFound)?;
            line.quantity += 1;
            return Ok(*line);
        }

        let line = BasketLine {
            id: BasketLineId::new(t.next_id()),
            basket_id: basket,
            product_id: product,
            quantity: 1,
        };
        t.basket_lines.insert(line.id, line);
        Ok(line)
    }

    async fn set_line_quantity(
        &self,
        basket: BasketId,
        line: BasketLineId,
        quantity: i32,
    ) -> Result<BasketLine, RepositoryError> {
        if quantity < 1 {
            return Err(RepositoryError::Conflict(format!(
                "quantity {quantity} violates line constraint"
            )));
        }
        let mut t = self.tables.lock().await;
        let row = t
            .basket_lines
            .get_mut(&line)
            .filter(|row| row.basket_id == basket)
            .ok_or(RepositoryError::NotFound)?;
        row.quantity = quantity;
        Ok(*row)
    }

    async fn remove_line(
        &self,
        basket: BasketId,
        line: BasketLineId,
    ) -> Result<(), RepositoryError> {
        let mut t = self.tables.lock().await;
        match t.basket_lines.get(&line) {
            Some(row) if row.basket_id == basket => {
                t.basket_lines.remove(&line);
                Ok(())
            }
            _ => Err(RepositoryError::NotFound),
        }
    }

    async fn assign_user(&self, basket: BasketId, user: UserId) -> Result<Basket, RepositoryError> {
        let mut t = self.tables.lock().await;
        t.require_user(user)?;
        let row = t.baskets.get_mut(&basket).ok_or(RepositoryError::NotFound)?;
        row.user_id = Some(user);
        Ok(*row)
    }

    async fn move_lines_and_delete(
        &self,
        from: BasketId,
        into: BasketId,
    ) -> Result<(), RepositoryError> {
        let mut t = self.tables.lock().await;
        if !t.baskets.contains_key(&from) || !t.baskets.contains_key(&into) {
            return Err(RepositoryError::NotFound);
        }
        for line in t.basket_lines.values_mut() {
            if line.basket_id == from {
                line.basket_id = into;
            }
        }
        t.baskets.remove(&from);
        Ok(())
    }

    async fn list_baskets(
        &self,
        status: Option<BasketStatus>,
    ) -> Result<Vec<BasketSummary>, RepositoryError> {
        let t = self.tables.lock().await;
        Ok(t.baskets
            .values()
            .rev()
            .filter(|b| status.is_none_or(|s| b.status == s))
            .map(|b| BasketSummary {
                basket: *b,
                count: t
                    .lines_of(b.id)
                    .iter()
                    .map(|line| i64::from(line.quantity))
                    .sum(),
            })
            .collect())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create_order(
        &self,
        basket: BasketId,
        user: UserId,
        billing: &AddressFields,
        shipping: &AddressFields,
    ) -> Result<Order, RepositoryError> {
        let mut t = self.tables.lock().await;
        t.require_user(user)?;

        let convertible = t
            .baskets
            .get(&basket)
            .is_some_and(|b| b.is_open() && b.user_id == Some(user));
        if !convertible {
            return Err(RepositoryError::Conflict(format!(
                "basket {basket} is not open for user {user}"
            )));
        }

        let quantities: Vec<_> = t
            .lines_of(basket)
            .iter()
            .map(BasketLine::as_quantity)
            .collect();
        let products = expand_lines(&quantities);

        let now = Utc::now();
        let mut order = Order {
            id: OrderId::new(t.next_id()),
            user_id: user,
            status: OrderStatus::New,
            billing_name: String::new(),
            billing_address1: String::new(),
            billing_address2: String::new(),
            billing_zip_code: String::new(),
            billing_city: String::new(),
            billing_country: billing.country,
            shipping_name: String::new(),
            shipping_address1: String::new(),
            shipping_address2: String::new(),
            shipping_zip_code: String::new(),
            shipping_city: String::new(),
            shipping_country: shipping.country,
            date_added: now,
            date_updated: now,
        };
        order.set_billing(billing.clone());
        order.set_shipping(shipping.clone());

        for product_id in products {
            let row = OrderLineRow {
                id: OrderLineId::new(t.next_id()),
                order_id: order.id,
                product_id,
                status: OrderLineStatus::New,
            };
            t.order_lines.insert(row.id, row);
        }
        t.orders.insert(order.id, order.clone());
        if let Some(b) = t.baskets.get_mut(&basket) {
            b.status = BasketStatus::Submitted;
        }
        Ok(order)
    }

    async fn get_order(
        &self,
        id: OrderId,
        scope: OrderScope,
    ) -> Result<Option<Order>, RepositoryError> {
        let t = self.tables.lock().await;
        Ok(t.orders
            .get(&id)
            .filter(|o| scope.admits(o.status))
            .cloned())
    }

    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError> {
        let t = self.tables.lock().await;
        let mut orders: Vec<Order> = t
            .orders
            .values()
            .filter(|o| filter.scope.admits(o.status))
            .filter(|o| filter.status.is_none_or(|s| o.status == s))
            .filter(|o| filter.user.is_none_or(|u| o.user_id == u))
            .cloned()
            .collect();
        Tables::sort_newest_first(&mut orders);
        Ok(orders)
    }

    async fn order_lines(&self, order: OrderId) -> Result<Vec<OrderLine>, RepositoryError> {
        let t = self.tables.lock().await;
        t.order_lines
            .values()
            .filter(|row| row.order_id == order)
            .map(|row| t.joined_line(row))
            .collect()
    }

    async fn update_order(
        &self,
        id: OrderId,
        update: &OrderUpdate,
    ) -> Result<Order, RepositoryError> {
        let mut t = self.tables.lock().await;
        let order = t.orders.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        if let Some(status) = update.status {
            order.status = status;
        }
        if let Some(billing) = &update.billing {
            order.set_billing(billing.clone());
        }
        if let Some(shipping) = &update.shipping {
            order.set_shipping(shipping.clone());
        }
        order.date_updated = Utc::now();
        Ok(order.clone())
    }

    async fn set_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let mut t = self.tables.lock().await;
        let order = t.orders.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        order.status = status;
        order.date_updated = Utc::now();
        Ok(order.clone())
    }

    async fn get_order_line(
        &self,
        id: OrderLineId,
        scope: OrderScope,
    ) -> Result<Option<OrderLine>, RepositoryError> {
        let t = self.tables.lock().await;
        match t.order_lines.get(&id) {
            Some(row) if t.order_in_scope(row.order_id, scope) => t.joined_line(row).map(Some),
            _ => Ok(None),
        }
    }

    async fn list_order_lines(
        &self,
        filter: &OrderLineFilter,
    ) -> Result<Vec<OrderLine>, RepositoryError> {
        let t = self.tables.lock().await;
        let mut orders: Vec<Order> = t
            .orders
            .values()
            .filter(|o| filter.scope.admits(o.status))
            .filter(|o| filter.order.is_none_or(|id| o.id == id))
            .cloned()
            .collect();
        Tables::sort_newest_first(&mut orders);

        let mut lines = Vec::new();
        for order in &orders {
            for row in t.order_lines.values().filter(|row| row.order_id == order.id) {
                if filter.status.is_none_or(|s| row.status == s) {
                    lines.push(t.joined_line(row)?);
                }
            }
        }
        Ok(lines)
    }

    async fn set_order_line_status(
        &self,
        id: OrderLineId,
        status: OrderLineStatus,
    ) -> Result<OrderLine, RepositoryError> {
        let mut t = self.tables.lock().await;
        let row = t.order_lines.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        row.status = status;
        let row = *row;
        t.joined_line(&row)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut t = self.tables.lock().await;
        if t.users.values().any(|c| c.user.email == user.email) {
            return Err(RepositoryError::Conflict(
                "user with this email already exists".to_owned(),
            ));
        }
        let created = User {
            id: UserId::new(t.next_id()),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_active: true,
            role: user.role,
            date_joined: Utc::now(),
        };
        t.users.insert(
            created.id,
            UserCredentials {
                user: created.clone(),
                password_hash: user.password_hash.clone(),
            },
        );
        Ok(created)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let t = self.tables.lock().await;
        Ok(t.users.get(&id).map(|c| c.user.clone()))
    }

    async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<UserCredentials>, RepositoryError> {
        let t = self.tables.lock().await;
        Ok(t.users.values().find(|c| &c.user.email == email).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let t = self.tables.lock().await;
        Ok(t.users.values().map(|c| c.user.clone()).collect())
    }

    async fn update_user(&self, id: UserId, update: &UserUpdate) -> Result<User, RepositoryError> {
        let mut t = self.tables.lock().await;
        let user = &mut t.users.get_mut(&id).ok_or(RepositoryError::NotFound)?.user;
        if let Some(first_name) = &update.first_name {
            user.first_name.clone_from(first_name);
        }
        if let Some(last_name) = &update.last_name {
            user.last_name.clone_from(last_name);
        }
        if let Some(is_active) = update.is_active {
            user.is_active = is_active;
        }
        if let Some(role) = update.role {
            user.role = role;
        }
        Ok(user.clone())
    }
}

#[async_trait]
impl AddressStore for MemoryStore {
    async fn list_addresses(&self, user: Option<UserId>) -> Result<Vec<Address>, RepositoryError> {
        let t = self.tables.lock().await;
        Ok(t.addresses
            .values()
            .filter(|a| user.is_none_or(|u| a.user_id == u))
            .cloned()
            .collect())
    }

    async fn get_address(
        &self,
        user: UserId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        let t = self.tables.lock().await;
        Ok(t.addresses.get(&id).filter(|a| a.user_id == user).cloned())
    }

    async fn create_address(
        &self,
        user: UserId,
        fields: &AddressFields,
    ) -> Result<Address, RepositoryError> {
        let mut t = self.tables.lock().await;
        t.require_user(user)?;
        let fields = fields.clone();
        let address = Address {
            id: AddressId::new(t.next_id()),
            user_id: user,
            name: fields.name,
            address1: fields.address1,
            address2: fields.address2,
            zip_code: fields.zip_code,
            city: fields.city,
            country: fields.country,
        };
        t.addresses.insert(address.id, address.clone());
        Ok(address)
    }

    async fn update_address(
        &self,
        user: UserId,
        id: AddressId,
        fields: &AddressFields,
    ) -> Result<Address, RepositoryError> {
        let mut t = self.tables.lock().await;
        let address = t
            .addresses
            .get_mut(&id)
            .filter(|a| a.user_id == user)
            .ok_or(RepositoryError::NotFound)?;
        let fields = fields.clone();
        address.name = fields.name;
        address.address1 = fields.address1;
        address.address2 = fields.address2;
        address.zip_code = fields.zip_code;
        address.city = fields.city;
        address.country = fields.country;
        Ok(address.clone())
    }

    async fn delete_address(&self, user: UserId, id: AddressId) -> Result<(), RepositoryError> {
        let mut t = self.tables.lock().await;
        match t.addresses.get(&id) {
            Some(a) if a.user_id == user => {
                t.addresses.remove(&id);
                Ok(())
            }
            _ => Err(RepositoryError::NotFound),
        }
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn orders_per_day(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyOrderCount>, RepositoryError> {
        let t = self.tables.lock().await;
        let mut days: BTreeMap<NaiveDate, i64> = BTreeMap::new();
        for order in t.orders.values().filter(|o| o.date_added >= since) {
            *days.entry(order.date_added.date_naive()).or_default() += 1;
        }
        Ok(days
            .into_iter()
            .map(|(day, orders)| DailyOrderCount { day, orders })
            .collect())
    }

    async fn top_products(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ProductSales>, RepositoryError> {
        let t = self.tables.lock().await;
        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for row in t.order_lines.values() {
            let recent = t.orders.get(&row.order_id).is_some_and(|o| o.date_added >= since);
            if recent {
                let line = t.joined_line(row)?;
                *counts.entry(line.product_name).or_default() += 1;
            }
        }

        let mut sales: Vec<ProductSales> = counts
            .into_iter()
            .map(|(product_name, quantity)| ProductSales {
                product_name,
                quantity,
            })
            .collect();
        sales.sort_by(|a, b| {
            b.quantity
                .cmp(&a.quantity)
                .then_with(|| a.product_name.cmp(&b.product_name))
        });
        sales.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(sales)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use booktime_core::{CountryCode, Price};

    fn address() -> AddressFields {
        AddressFields {
            name: "Reader".to_owned(),
            address1: "1 Page Street".to_owned(),
            address2: String::new(),
            zip_code: "AB1 2CD".to_owned(),
            city: "London".to_owned(),
            country: CountryCode::Uk,
        }
    }

    async fn seed_user(store: &MemoryStore, email: &str) -> UserId {
        store
            .create_user(&NewUser {
                email: Email::parse(email).unwrap(),
                password_hash: "hash".to_owned(),
                first_name: String::new(),
                last_name: String::new(),
                role: None,
            })
            .await
            .unwrap()
            .id
    }

    async fn seed_product(store: &MemoryStore, name: &str) -> ProductId {
        let product = NewProduct {
            name: name.to_owned(),
            slug: None,
            description: String::new(),
            price: Price::from_cents(1000).unwrap(),
            active: true,
            in_stock: true,
            tags: Vec::new(),
        };
        store
            .create_product(&product, &Slug::from_name(name))
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_add_product_increments_existing_line() {
        let store = MemoryStore::new();
        let product = seed_product(&store, "Dune").await;
        let basket = store.create_basket(None).await.unwrap();

        let first = store.add_product(basket.id, product).await.unwrap();
        let second = store.add_product(basket.id, product).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.quantity, 2);
        assert_eq!(store.basket_lines(basket.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_order_expands_and_submits() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "a@booktime.domain").await;
        let dune = seed_product(&store, "Dune").await;
        let emma = seed_product(&store, "Emma").await;
        let basket = store.create_basket(Some(user)).await.unwrap();
        store.add_product(basket.id, dune).await.unwrap();
        store.add_product(basket.id, dune).await.unwrap();
        store.add_product(basket.id, emma).await.unwrap();

        let order = store
            .create_order(basket.id, user, &address(), &address())
            .await
            .unwrap();

        let lines = store.order_lines(order.id).await.unwrap();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.status == OrderLineStatus::New));
        let basket = store.get_basket(basket.id).await.unwrap().unwrap();
        assert_eq!(basket.status, BasketStatus::Submitted);
    }

    #[tokio::test]
    async fn test_create_order_twice_conflicts() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "a@booktime.domain").await;
        let basket = store.create_basket(Some(user)).await.unwrap();

        store
            .create_order(basket.id, user, &address(), &address())
            .await
            .unwrap();
        let again = store
            .create_order(basket.id, user, &address(), &address())
            .await;

        assert!(matches!(again, Err(RepositoryError::Conflict(_))));
        assert_eq!(store.list_orders(&OrderFilter::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_ordered_product_is_protected() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "a@booktime.domain").await;
        let product = seed_product(&store, "Dune").await;
        let basket = store.create_basket(Some(user)).await.unwrap();
        store.add_product(basket.id, product).await.unwrap();
        store
            .create_order(basket.id, user, &address(), &address())
            .await
            .unwrap();

        let result = store.delete_product(product).await;
        assert!(matches!(result, Err(RepositoryError::Protected(_))));
    }

    #[tokio::test]
    async fn test_paid_scope_hides_new_orders() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "a@booktime.domain").await;
        let product = seed_product(&store, "Dune").await;
        let basket = store.create_basket(Some(user)).await.unwrap();
        store.add_product(basket.id, product).await.unwrap();
        let order = store
            .create_order(basket.id, user, &address(), &address())
            .await
            .unwrap();
        let line = store.order_lines(order.id).await.unwrap().first().unwrap().id;

        assert!(store.get_order(order.id, OrderScope::Paid).await.unwrap().is_none());
        assert!(store.get_order_line(line, OrderScope::Paid).await.unwrap().is_none());

        store.set_order_status(order.id, OrderStatus::Paid).await.unwrap();
        assert!(store.get_order_line(line, OrderScope::Paid).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        seed_user(&store, "a@booktime.domain").await;
        let again = store
            .create_user(&NewUser {
                email: Email::parse("a@booktime.domain").unwrap(),
                password_hash: "hash".to_owned(),
                first_name: String::new(),
                last_name: String::new(),
                role: None,
            })
            .await;
        assert!(matches!(again, Err(RepositoryError::Conflict(_))));
    }
}
