//! Domain models for the storefront.
//!
//! These structs double as database rows (`sqlx::FromRow`) and JSON bodies.
//! Foreign keys are serialized under the name of the entity they point at
//! (`user`, `order`, `product`), matching the keys used by the back-office
//! field policy in [`booktime_core::access`].

pub mod address;
pub mod basket;
pub mod catalog;
pub mod order;
pub mod report;
pub mod session;
pub mod user;

pub use address::Address;
pub use basket::{Basket, BasketItem, BasketLine, BasketSummary, BasketView};
pub use catalog::{NewProduct, NewTag, Product, ProductImage, ProductUpdate, Tag, TagUpdate};
pub use order::{
    Order, OrderDetail, OrderFilter, OrderLine, OrderLineFilter, OrderScope, OrderUpdate,
};
pub use report::{DailyOrderCount, ProductSales, ReportPeriod};
pub use session::{CurrentUser, session_keys};
pub use user::{NewUser, User, UserCredentials, UserUpdate};
