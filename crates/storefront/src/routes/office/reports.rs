//! Back-office reports.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use booktime_core::access::Resource;

use super::ensure_visible;
use crate::error::AppError;
use crate::middleware::RequireStaff;
use crate::models::{DailyOrderCount, ProductSales, ReportPeriod};
use crate::services::reports::{self, Report};
use crate::state::AppState;

/// `?period=30|60|90`, defaulting to 30 days.
#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    #[serde(default)]
    pub period: ReportPeriod,
}

#[instrument(skip(state, staff))]
pub async fn orders_per_day(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<Report<DailyOrderCount>>, AppError> {
    ensure_visible(&staff, Resource::Reports)?;
    Ok(Json(reports::orders_per_day(state.store(), query.period).await?))
}

#[instrument(skip(state, staff))]
pub async fn top_products(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<Report<ProductSales>>, AppError> {
    ensure_visible(&staff, Resource::Reports)?;
    Ok(Json(reports::top_products(state.store(), query.period).await?))
}
