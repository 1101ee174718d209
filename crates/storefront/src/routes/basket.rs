//! Basket and checkout route handlers.
//!
//! The basket id lives in the session. Anonymous shoppers get a basket on
//! their first add; it is attached to their account when they log in.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use booktime_core::{BasketLineId, ProductId, UserId};

use crate::error::AppError;
use crate::middleware::{OptionalUser, RequireUser, session_basket_id, set_session_basket};
use crate::models::{Basket, BasketLine, BasketView, Order};
use crate::services::basket::{self, BasketError};
use crate::services::checkout::{self, CheckoutForm};
use crate::state::AppState;

/// Form data for adding a product.
#[derive(Debug, Deserialize)]
pub struct AddForm {
    pub product: ProductId,
}

/// Form data for changing a line's quantity.
#[derive(Debug, Deserialize)]
pub struct QuantityForm {
    pub quantity: i32,
}

/// The open basket the session points at, if `user` may shop with it.
async fn current_basket(
    state: &AppState,
    session: &Session,
    user: Option<UserId>,
) -> Result<Option<Basket>, AppError> {
    let id = session_basket_id(session).await?;
    Ok(basket::resolve_basket(state.store(), id, user).await?)
}

async fn require_basket(
    state: &AppState,
    session: &Session,
    user: Option<UserId>,
) -> Result<Basket, AppError> {
    current_basket(state, session, user)
        .await?
        .ok_or_else(|| BasketError::NoBasket.into())
}

/// Show the basket with its lines and item count.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalUser(user): OptionalUser,
) -> Result<Json<BasketView>, AppError> {
    let basket = current_basket(&state, &session, user.map(|u| u.id)).await?;
    let view = basket::basket_contents(state.store(), basket.as_ref()).await?;
    Ok(Json(view))
}

/// Add one unit of a product, creating the basket if needed.
#[instrument(skip(state, session, user))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    OptionalUser(user): OptionalUser,
    Json(form): Json<AddForm>,
) -> Result<(StatusCode, Json<BasketLine>), AppError> {
    let user = user.map(|u| u.id);
    let current = current_basket(&state, &session, user).await?;
    let (basket, line) = basket::add_product(state.store(), current, user, form.product).await?;

    set_session_basket(&session, Some(basket.id)).await?;
    Ok((StatusCode::CREATED, Json(line)))
}

/// Change the quantity of one line.
#[instrument(skip(state, session, user))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    OptionalUser(user): OptionalUser,
    Path(line): Path<BasketLineId>,
    Json(form): Json<QuantityForm>,
) -> Result<Json<BasketLine>, AppError> {
    let basket = require_basket(&state, &session, user.map(|u| u.id)).await?;
    let line = basket::update_quantity(state.store(), &basket, line, form.quantity).await?;
    Ok(Json(line))
}

#[instrument(skip(state, session, user))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    OptionalUser(user): OptionalUser,
    Path(line): Path<BasketLineId>,
) -> Result<StatusCode, AppError> {
    let basket = require_basket(&state, &session, user.map(|u| u.id)).await?;
    basket::remove_line(state.store(), &basket, line).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Turn the session basket into an order.
///
/// On success the session forgets the basket; the next add starts a new one.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    RequireUser(user): RequireUser,
    Json(form): Json<CheckoutForm>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let basket = require_basket(&state, &session, Some(user.id)).await?;

    let order = checkout::checkout(state.store(), &basket, user.id, form).await?;
    set_session_basket(&session, None).await?;

    Ok((StatusCode::CREATED, Json(order)))
}
