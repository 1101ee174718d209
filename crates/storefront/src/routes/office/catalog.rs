//! Back-office catalog: products, tags and product images.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::Value;
use tracing::instrument;

use booktime_core::access::{Field, Resource, field_access};
use booktime_core::{ProductId, TagId};

use super::{checked_write, ensure_visible, redact, redact_all};
use crate::error::AppError;
use crate::middleware::{RequireStaff, Staff};
use crate::models::{NewProduct, NewTag, ProductUpdate, TagUpdate};
use crate::services::catalog;
use crate::state::AppState;

/// Creating or deleting an entry needs the same right as naming it.
fn ensure_owns_entries(staff: &Staff, resource: Resource) -> Result<(), AppError> {
    ensure_visible(staff, resource)?;
    if field_access(staff.role, resource, Field::Name).is_editable() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Creating or deleting entries is not allowed for this role".to_string(),
        ))
    }
}

// =============================================================================
// Products
// =============================================================================

/// Every product, inactive ones included.
#[instrument(skip(state, staff))]
pub async fn products(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
) -> Result<Json<Vec<Value>>, AppError> {
    ensure_visible(&staff, Resource::Product)?;
    let products = state.store().list_products(None, false).await?;
    Ok(Json(redact_all(staff.role, Resource::Product, &products)?))
}

#[instrument(skip(state, staff))]
pub async fn product(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<ProductId>,
) -> Result<Json<Value>, AppError> {
    ensure_visible(&staff, Resource::Product)?;
    let product = state
        .store()
        .get_product(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {id}")))?;
    Ok(Json(redact(staff.role, Resource::Product, &product)?))
}

#[instrument(skip(state, staff, body))]
pub async fn create_product(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    ensure_owns_entries(&staff, Resource::Product)?;
    let new: NewProduct = checked_write(&staff, Resource::Product, body)?;
    let product = catalog::create_product(state.store(), new).await?;
    Ok((
        StatusCode::CREATED,
        Json(redact(staff.role, Resource::Product, &product)?),
    ))
}

#[instrument(skip(state, staff, body))]
pub async fn update_product(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<ProductId>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    ensure_visible(&staff, Resource::Product)?;
    let update: ProductUpdate = checked_write(&staff, Resource::Product, body)?;
    let product = catalog::update_product(state.store(), id, update).await?;
    Ok(Json(redact(staff.role, Resource::Product, &product)?))
}

#[instrument(skip(state, staff))]
pub async fn delete_product(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<ProductId>,
) -> Result<StatusCode, AppError> {
    ensure_owns_entries(&staff, Resource::Product)?;
    catalog::delete_product(state.store(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Images uploaded for one product.
#[instrument(skip(state, staff))]
pub async fn product_images(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<ProductId>,
) -> Result<Json<Vec<Value>>, AppError> {
    ensure_visible(&staff, Resource::ProductImage)?;
    let images = state.store().list_product_images(id).await?;
    Ok(Json(redact_all(staff.role, Resource::ProductImage, &images)?))
}

// =============================================================================
// Tags
// =============================================================================

#[instrument(skip(state, staff))]
pub async fn tags(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
) -> Result<Json<Vec<Value>>, AppError> {
    ensure_visible(&staff, Resource::Tag)?;
    let tags = state.store().list_tags(false).await?;
    Ok(Json(redact_all(staff.role, Resource::Tag, &tags)?))
}

#[instrument(skip(state, staff))]
pub async fn tag(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<TagId>,
) -> Result<Json<Value>, AppError> {
    ensure_visible(&staff, Resource::Tag)?;
    let tag = state
        .store()
        .get_tag(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tag {id}")))?;
    Ok(Json(redact(staff.role, Resource::Tag, &tag)?))
}

#[instrument(skip(state, staff, body))]
pub async fn create_tag(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    ensure_owns_entries(&staff, Resource::Tag)?;
    let new: NewTag = checked_write(&staff, Resource::Tag, body)?;
    let tag = catalog::create_tag(state.store(), new).await?;
    Ok((
        StatusCode::CREATED,
        Json(redact(staff.role, Resource::Tag, &tag)?),
    ))
}

#[instrument(skip(state, staff, body))]
pub async fn update_tag(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<TagId>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    ensure_visible(&staff, Resource::Tag)?;
    let update: TagUpdate = checked_write(&staff, Resource::Tag, body)?;
    let tag = catalog::update_tag(state.store(), id, update).await?;
    Ok(Json(redact(staff.role, Resource::Tag, &tag)?))
}

#[instrument(skip(state, staff))]
pub async fn delete_tag(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<TagId>,
) -> Result<StatusCode, AppError> {
    ensure_owns_entries(&staff, Resource::Tag)?;
    catalog::delete_tag(state.store(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
