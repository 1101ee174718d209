//! Catalog route handlers.
//!
//! Only active products and tags are ever shown to shoppers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use booktime_core::Slug;

use crate::error::AppError;
use crate::models::{Product, Tag};
use crate::state::AppState;

/// Query parameters for the product listing.
#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub tag: Option<Slug>,
}

/// List active products, optionally restricted to one tag.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = state
        .store()
        .list_products(query.tag.as_ref(), true)
        .await?;
    Ok(Json(products))
}

/// Product detail by slug.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<Slug>,
) -> Result<Json<Product>, AppError> {
    state
        .store()
        .get_product_by_slug(&slug)
        .await?
        .filter(|product| product.active)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Product '{slug}'")))
}

#[instrument(skip(state))]
pub async fn tags(State(state): State<AppState>) -> Result<Json<Vec<Tag>>, AppError> {
    Ok(Json(state.store().list_tags(true).await?))
}
