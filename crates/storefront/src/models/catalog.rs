//! Catalog: products, tags and product images.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use booktime_core::{Price, ProductId, ProductImageId, Slug, TagId};

/// A product in the catalog.
///
/// Inactive products stay in the database but are excluded from every
/// customer-facing query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: Slug,
    pub description: String,
    pub price: Price,
    pub active: bool,
    pub in_stock: bool,
    pub tags: Vec<TagId>,
    pub date_updated: DateTime<Utc>,
}

/// A product tag. Slugs are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub slug: Slug,
    pub description: String,
    pub active: bool,
}

/// An uploaded product image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ProductImage {
    pub id: ProductImageId,
    #[serde(rename = "product")]
    pub product_id: ProductId,
    pub image: String,
    pub thumbnail: Option<String>,
}

/// Values for a new product. A missing slug is derived from the name.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub slug: Option<Slug>,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default = "default_true")]
    pub in_stock: bool,
    #[serde(default)]
    pub tags: Vec<TagId>,
}

/// Partial product update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub slug: Option<Slug>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub active: Option<bool>,
    pub in_stock: Option<bool>,
    pub tags: Option<Vec<TagId>>,
}

/// Values for a new tag. A missing slug is derived from the name.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTag {
    pub name: String,
    pub slug: Option<Slug>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

/// Partial tag update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagUpdate {
    pub name: Option<String>,
    pub slug: Option<Slug>,
    pub description: Option<String>,
    pub active: Option<bool>,
}

const fn default_true() -> bool {
    true
}
