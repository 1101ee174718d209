//! Shopping baskets.

use serde::Serialize;

use booktime_core::basket::LineQuantity;
use booktime_core::{BasketId, BasketLineId, BasketStatus, Price, ProductId, UserId};

/// A shopping basket, anonymous until its owner logs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Basket {
    pub id: BasketId,
    #[serde(rename = "user")]
    pub user_id: Option<UserId>,
    pub status: BasketStatus,
}

impl Basket {
    /// Whether the basket can still be shopped with.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == BasketStatus::Open
    }
}

/// One product row in a basket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct BasketLine {
    pub id: BasketLineId,
    #[serde(rename = "basket")]
    pub basket_id: BasketId,
    #[serde(rename = "product")]
    pub product_id: ProductId,
    pub quantity: i32,
}

impl BasketLine {
    /// The quantity view used by the pure basket rules.
    #[must_use]
    pub const fn as_quantity(&self) -> LineQuantity {
        LineQuantity {
            line_id: self.id,
            product_id: self.product_id,
            quantity: self.quantity,
        }
    }
}

/// A basket line joined with the product it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct BasketItem {
    pub id: BasketLineId,
    #[serde(rename = "product")]
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Price,
    pub quantity: i32,
}

/// The basket page: lines plus totals.
#[derive(Debug, Clone, Serialize)]
pub struct BasketView {
    pub id: Option<BasketId>,
    pub lines: Vec<BasketItem>,
    pub count: i64,
    pub is_empty: bool,
}

/// Back-office basket listing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BasketSummary {
    #[serde(flatten)]
    pub basket: Basket,
    pub count: i64,
}
