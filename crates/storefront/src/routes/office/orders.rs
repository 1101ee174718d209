//! Back-office baskets, orders and order lines.
//!
//! Dispatchers only ever see paid orders; anything else reads as missing.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use booktime_core::access::Resource;
use booktime_core::{AddressFields, BasketStatus, OrderId, OrderLineId, OrderLineStatus, OrderStatus};

use super::{checked_write, ensure_visible, order_scope, redact, redact_all};
use crate::error::AppError;
use crate::middleware::RequireStaff;
use crate::models::{OrderDetail, OrderFilter, OrderLineFilter, OrderUpdate};
use crate::services::fulfillment;
use crate::state::AppState;

/// Status filter for listings.
#[derive(Debug, Deserialize)]
pub struct StatusQuery<S> {
    pub status: Option<S>,
}

/// Body of a status change.
#[derive(Debug, Deserialize)]
pub struct StatusForm<S> {
    pub status: S,
}

fn validated_snapshot(fields: Option<AddressFields>) -> Result<Option<AddressFields>, AppError> {
    fields
        .map(AddressFields::validated)
        .transpose()
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

// =============================================================================
// Baskets
// =============================================================================

/// Baskets with their item counts, newest first.
#[instrument(skip(state, staff))]
pub async fn baskets(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Query(query): Query<StatusQuery<BasketStatus>>,
) -> Result<Json<Vec<Value>>, AppError> {
    ensure_visible(&staff, Resource::Basket)?;
    let baskets = state.store().list_baskets(query.status).await?;
    Ok(Json(redact_all(staff.role, Resource::Basket, &baskets)?))
}

// =============================================================================
// Orders
// =============================================================================

#[instrument(skip(state, staff))]
pub async fn orders(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Query(query): Query<StatusQuery<OrderStatus>>,
) -> Result<Json<Vec<Value>>, AppError> {
    ensure_visible(&staff, Resource::Order)?;
    let filter = OrderFilter {
        scope: order_scope(staff.role),
        status: query.status,
        user: None,
    };
    let orders = state.store().list_orders(&filter).await?;
    Ok(Json(redact_all(staff.role, Resource::Order, &orders)?))
}

/// One order with its lines.
#[instrument(skip(state, staff))]
pub async fn order(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<OrderId>,
) -> Result<Json<Value>, AppError> {
    ensure_visible(&staff, Resource::Order)?;
    let order = state
        .store()
        .get_order(id, order_scope(staff.role))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {id}")))?;
    let lines = state.store().order_lines(order.id).await?;
    let detail = OrderDetail { order, lines };
    Ok(Json(redact(staff.role, Resource::Order, &detail)?))
}

/// Edit an order's status or either address snapshot.
#[instrument(skip(state, staff, body))]
pub async fn update_order(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<OrderId>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    ensure_visible(&staff, Resource::Order)?;
    let OrderUpdate {
        status,
        billing,
        shipping,
    } = checked_write(&staff, Resource::Order, body)?;
    let update = OrderUpdate {
        status,
        billing: validated_snapshot(billing)?,
        shipping: validated_snapshot(shipping)?,
    };

    if state
        .store()
        .get_order(id, order_scope(staff.role))
        .await?
        .is_none()
    {
        return Err(AppError::NotFound(format!("Order {id}")));
    }

    let order = state.store().update_order(id, &update).await?;
    tracing::info!(order_id = %order.id, changed_by = %staff.user.id, "Order updated");
    Ok(Json(redact(staff.role, Resource::Order, &order)?))
}

/// Set an order's status, e.g. mark it paid once payment is confirmed.
#[instrument(skip(state, staff, body))]
pub async fn set_order_status(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<OrderId>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    ensure_visible(&staff, Resource::Order)?;
    let form: StatusForm<OrderStatus> = checked_write(&staff, Resource::Order, body)?;
    let order = fulfillment::set_order_status(state.store(), id, form.status).await?;
    tracing::info!(order_id = %order.id, status = %order.status, changed_by = %staff.user.id, "Order status set");
    Ok(Json(redact(staff.role, Resource::Order, &order)?))
}

// =============================================================================
// Order lines
// =============================================================================

#[instrument(skip(state, staff))]
pub async fn order_lines(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Query(filter): Query<OrderLineFilter>,
) -> Result<Json<Vec<Value>>, AppError> {
    ensure_visible(&staff, Resource::OrderLine)?;
    let filter = OrderLineFilter {
        scope: order_scope(staff.role),
        ..filter
    };
    let lines = state.store().list_order_lines(&filter).await?;
    Ok(Json(redact_all(staff.role, Resource::OrderLine, &lines)?))
}

/// Move one line along; the order follows once no line is pending.
#[instrument(skip(state, staff, body))]
pub async fn set_line_status(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<OrderLineId>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    ensure_visible(&staff, Resource::OrderLine)?;
    let form: StatusForm<OrderLineStatus> = checked_write(&staff, Resource::OrderLine, body)?;
    let line =
        fulfillment::set_line_status(state.store(), id, form.status, order_scope(staff.role))
            .await?;
    Ok(Json(redact(staff.role, Resource::OrderLine, &line)?))
}
