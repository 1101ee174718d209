//! Orders and order lines.
//!
//! Billing and shipping addresses are copied onto the order row when it is
//! created. Nothing links an order back to the address book or to the basket
//! it came from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use booktime_core::{
    AddressFields, CountryCode, OrderId, OrderLineId, OrderLineStatus, OrderStatus, ProductId,
    UserId,
};

/// A placed order with its address snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    #[serde(rename = "user")]
    pub user_id: UserId,
    pub status: OrderStatus,
    pub billing_name: String,
    pub billing_address1: String,
    pub billing_address2: String,
    pub billing_zip_code: String,
    pub billing_city: String,
    pub billing_country: CountryCode,
    pub shipping_name: String,
    pub shipping_address1: String,
    pub shipping_address2: String,
    pub shipping_zip_code: String,
    pub shipping_city: String,
    pub shipping_country: CountryCode,
    pub date_added: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

impl Order {
    /// The billing snapshot.
    #[must_use]
    pub fn billing(&self) -> AddressFields {
        AddressFields {
            name: self.billing_name.clone(),
            address1: self.billing_address1.clone(),
            address2: self.billing_address2.clone(),
            zip_code: self.billing_zip_code.clone(),
            city: self.billing_city.clone(),
            country: self.billing_country,
        }
    }

    /// The shipping snapshot.
    #[must_use]
    pub fn shipping(&self) -> AddressFields {
        AddressFields {
            name: self.shipping_name.clone(),
            address1: self.shipping_address1.clone(),
            address2: self.shipping_address2.clone(),
            zip_code: self.shipping_zip_code.clone(),
            city: self.shipping_city.clone(),
            country: self.shipping_country,
        }
    }

    /// Overwrite the billing snapshot.
    pub fn set_billing(&mut self, fields: AddressFields) {
        self.billing_name = fields.name;
        self.billing_address1 = fields.address1;
        self.billing_address2 = fields.address2;
        self.billing_zip_code = fields.zip_code;
        self.billing_city = fields.city;
        self.billing_country = fields.country;
    }

    /// Overwrite the shipping snapshot.
    pub fn set_shipping(&mut self, fields: AddressFields) {
        self.shipping_name = fields.name;
        self.shipping_address1 = fields.address1;
        self.shipping_address2 = fields.address2;
        self.shipping_zip_code = fields.zip_code;
        self.shipping_city = fields.city;
        self.shipping_country = fields.country;
    }
}

/// One physical unit of a product in an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct OrderLine {
    pub id: OrderLineId,
    #[serde(rename = "order")]
    pub order_id: OrderId,
    #[serde(rename = "product")]
    pub product_id: ProductId,
    pub product_name: String,
    pub status: OrderLineStatus,
}

/// An order together with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

/// Which orders a query may touch.
///
/// Fulfillment partners and dispatchers only ever see paid orders; the scope
/// is applied inside the query so other orders are indistinguishable from
/// missing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderScope {
    #[default]
    All,
    Paid,
}

impl OrderScope {
    /// Whether an order with this status is inside the scope.
    #[must_use]
    pub fn admits(self, status: OrderStatus) -> bool {
        match self {
            Self::All => true,
            Self::Paid => status == OrderStatus::Paid,
        }
    }
}

/// Order listing filter. Results are newest first.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFilter {
    pub scope: OrderScope,
    pub status: Option<OrderStatus>,
    pub user: Option<UserId>,
}

/// Order-line listing filter. Results follow their orders, newest first.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct OrderLineFilter {
    #[serde(skip)]
    pub scope: OrderScope,
    pub order: Option<OrderId>,
    pub status: Option<OrderLineStatus>,
}

/// Back-office order changes. `None` leaves a part unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderUpdate {
    pub status: Option<OrderStatus>,
    pub billing: Option<AddressFields>,
    pub shipping: Option<AddressFields>,
}
