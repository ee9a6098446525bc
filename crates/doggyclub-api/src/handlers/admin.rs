//! Maintenance endpoints.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use doggyclub_core::defaults::LOCATION_RETENTION_HOURS;

use crate::{ApiError, AppState};

#[derive(Debug, Deserialize, IntoParams)]
pub struct CleanupQuery {
    /// Delete locations older than this many hours (default 24)
    pub older_than_hours: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CleanupResponse {
    pub deleted: u64,
    pub older_than_hours: i64,
}

/// Purge device locations not updated within the retention period.
#[utoipa::path(
    post,
    path = "/api/v1/admin/locations/cleanup",
    tag = "Admin",
    params(CleanupQuery),
    responses(
        (status = 200, description = "Stale locations removed", body = CleanupResponse),
        (status = 400, description = "Invalid retention period")
    )
)]
pub async fn cleanup_locations(
    State(state): State<AppState>,
    Query(query): Query<CleanupQuery>,
) -> Result<Json<CleanupResponse>, ApiError> {
    let hours = query.older_than_hours.unwrap_or(LOCATION_RETENTION_HOURS);
    let period = TimeDelta::try_hours(hours)
        .filter(|p| *p > TimeDelta::zero())
        .ok_or_else(|| ApiError::BadRequest("older_than_hours must be positive".to_string()))?;

    let deleted = state.encounters.cleanup(period).await?;
    Ok(Json(CleanupResponse {
        deleted,
        older_than_hours: hours,
    }))
}
