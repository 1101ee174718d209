//! Back-office accounts and address books.

use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::Value;
use tracing::instrument;

use booktime_core::UserId;
use booktime_core::access::Resource;

use super::{checked_write, ensure_visible, redact, redact_all};
use crate::error::AppError;
use crate::middleware::RequireStaff;
use crate::models::UserUpdate;
use crate::state::AppState;

#[instrument(skip(state, staff))]
pub async fn users(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
) -> Result<Json<Vec<Value>>, AppError> {
    ensure_visible(&staff, Resource::User)?;
    let users = state.store().list_users().await?;
    Ok(Json(redact_all(staff.role, Resource::User, &users)?))
}

#[instrument(skip(state, staff))]
pub async fn user(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<UserId>,
) -> Result<Json<Value>, AppError> {
    ensure_visible(&staff, Resource::User)?;
    let user = state
        .store()
        .get_user(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {id}")))?;
    Ok(Json(redact(staff.role, Resource::User, &user)?))
}

/// Change names, activation or role of an account.
#[instrument(skip(state, staff, body))]
pub async fn update_user(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<UserId>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    ensure_visible(&staff, Resource::User)?;
    let update: UserUpdate = checked_write(&staff, Resource::User, body)?;
    let user = state.store().update_user(id, &update).await?;
    tracing::info!(user_id = %user.id, changed_by = %staff.user.id, "User updated");
    Ok(Json(redact(staff.role, Resource::User, &user)?))
}

/// Every saved address, all users.
#[instrument(skip(state, staff))]
pub async fn addresses(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
) -> Result<Json<Vec<Value>>, AppError> {
    ensure_visible(&staff, Resource::Address)?;
    let addresses = state.store().list_addresses(None).await?;
    Ok(Json(redact_all(staff.role, Resource::Address, &addresses)?))
}
