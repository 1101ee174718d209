//! Account route handlers.
//!
//! These routes require authentication. Every lookup is scoped to the
//! logged-in user, so another user's address or order reads as missing.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use booktime_core::{AddressFields, AddressId, OrderId};

use crate::error::AppError;
use crate::middleware::RequireUser;
use crate::models::{Address, Order, OrderDetail, OrderFilter, OrderScope};
use crate::state::AppState;

fn validated(fields: AddressFields) -> Result<AddressFields, AppError> {
    fields
        .validated()
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

/// List the user's saved addresses.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn addresses(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<Address>>, AppError> {
    Ok(Json(state.store().list_addresses(Some(user.id)).await?))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show_address(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<AddressId>,
) -> Result<Json<Address>, AppError> {
    state
        .store()
        .get_address(user.id, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Address {id}")))
}

/// Save a new address.
#[instrument(skip(state, user, fields), fields(user_id = %user.id))]
pub async fn create_address(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(fields): Json<AddressFields>,
) -> Result<(StatusCode, Json<Address>), AppError> {
    let fields = validated(fields)?;
    let address = state.store().create_address(user.id, &fields).await?;
    tracing::info!(address_id = %address.id, "Address created");
    Ok((StatusCode::CREATED, Json(address)))
}

/// Replace an address. Orders already placed keep their own copy.
#[instrument(skip(state, user, fields), fields(user_id = %user.id))]
pub async fn update_address(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<AddressId>,
    Json(fields): Json<AddressFields>,
) -> Result<Json<Address>, AppError> {
    let fields = validated(fields)?;
    Ok(Json(
        state.store().update_address(user.id, id, &fields).await?,
    ))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_address(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<AddressId>,
) -> Result<StatusCode, AppError> {
    state.store().delete_address(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Order history, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<Order>>, AppError> {
    let filter = OrderFilter {
        user: Some(user.id),
        ..OrderFilter::default()
    };
    Ok(Json(state.store().list_orders(&filter).await?))
}

/// One of the user's orders with its lines.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn order(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>, AppError> {
    let order = state
        .store()
        .get_order(id, OrderScope::All)
        .await?
        .filter(|order| order.user_id == user.id)
        .ok_or_else(|| AppError::NotFound(format!("Order {id}")))?;
    let lines = state.store().order_lines(order.id).await?;
    Ok(Json(OrderDetail { order, lines }))
}
