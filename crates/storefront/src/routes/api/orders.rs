//! Order and order-line endpoints for fulfillment partners.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use booktime_core::{CountryCode, OrderId, OrderLineId, OrderLineStatus};

use crate::error::AppError;
use crate::middleware::ApiStaff;
use crate::models::{Order, OrderFilter, OrderLine, OrderLineFilter, OrderScope};
use crate::services::fulfillment;
use crate::state::AppState;

/// An order line as partners see it: the product by name.
#[derive(Debug, Clone, Serialize)]
pub struct OrderLineView {
    pub id: OrderLineId,
    pub order: OrderId,
    pub product: String,
    pub status: OrderLineStatus,
}

impl From<OrderLine> for OrderLineView {
    fn from(line: OrderLine) -> Self {
        Self {
            id: line.id,
            order: line.order_id,
            product: line.product_name,
            status: line.status,
        }
    }
}

/// An order as partners see it: where to ship, nothing about billing.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    pub id: OrderId,
    pub shipping_name: String,
    pub shipping_address1: String,
    pub shipping_address2: String,
    pub shipping_zip_code: String,
    pub shipping_city: String,
    pub shipping_country: CountryCode,
    pub date_added: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            shipping_name: order.shipping_name,
            shipping_address1: order.shipping_address1,
            shipping_address2: order.shipping_address2,
            shipping_zip_code: order.shipping_zip_code,
            shipping_city: order.shipping_city,
            shipping_country: order.shipping_country,
            date_added: order.date_added,
            date_updated: order.date_updated,
        }
    }
}

/// Writable part of an order line. Other keys in the body are ignored.
#[derive(Debug, Deserialize)]
pub struct LineStatusForm {
    pub status: OrderLineStatus,
}

/// GET /api/orderlines?order=&status=
#[instrument(skip(state, staff), fields(user_id = %staff.user.id))]
pub async fn order_lines(
    State(state): State<AppState>,
    ApiStaff(staff): ApiStaff,
    Query(filter): Query<OrderLineFilter>,
) -> Result<Json<Vec<OrderLineView>>, AppError> {
    let filter = OrderLineFilter {
        scope: OrderScope::Paid,
        ..filter
    };
    let lines = state.store().list_order_lines(&filter).await?;
    Ok(Json(lines.into_iter().map(OrderLineView::from).collect()))
}

#[instrument(skip(state, staff), fields(user_id = %staff.user.id))]
pub async fn order_line(
    State(state): State<AppState>,
    ApiStaff(staff): ApiStaff,
    Path(id): Path<OrderLineId>,
) -> Result<Json<OrderLineView>, AppError> {
    state
        .store()
        .get_order_line(id, OrderScope::Paid)
        .await?
        .map(|line| Json(line.into()))
        .ok_or_else(|| AppError::NotFound(format!("Order line {id}")))
}

/// PUT/PATCH /api/orderlines/{id}: change the status only.
#[instrument(skip(state, staff), fields(user_id = %staff.user.id))]
pub async fn update_order_line(
    State(state): State<AppState>,
    ApiStaff(staff): ApiStaff,
    Path(id): Path<OrderLineId>,
    Json(form): Json<LineStatusForm>,
) -> Result<Json<OrderLineView>, AppError> {
    let line = fulfillment::set_line_status(state.store(), id, form.status, OrderScope::Paid)
        .await?;
    tracing::info!(line_id = %line.id, status = %line.status, "Order line updated by partner");
    Ok(Json(line.into()))
}

/// GET /api/orders, paid orders newest first.
#[instrument(skip(state, staff), fields(user_id = %staff.user.id))]
pub async fn orders(
    State(state): State<AppState>,
    ApiStaff(staff): ApiStaff,
) -> Result<Json<Vec<OrderView>>, AppError> {
    let filter = OrderFilter {
        scope: OrderScope::Paid,
        ..OrderFilter::default()
    };
    let orders = state.store().list_orders(&filter).await?;
    Ok(Json(orders.into_iter().map(OrderView::from).collect()))
}

#[instrument(skip(state, staff), fields(user_id = %staff.user.id))]
pub async fn order(
    State(state): State<AppState>,
    ApiStaff(staff): ApiStaff,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderView>, AppError> {
    state
        .store()
        .get_order(id, OrderScope::Paid)
        .await?
        .map(|order| Json(order.into()))
        .ok_or_else(|| AppError::NotFound(format!("Order {id}")))
}
