//! Device location HTTP handlers.
//!
//! Location reports overwrite the dog's last-known position; the nearby
//! lookup reads positions reported within the freshness window.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use doggyclub_core::{DeviceLocation, NearbyDog, NearbyDogsRequest, ReportLocationRequest};

use crate::{ApiError, AppState};

const DEFAULT_HISTORY_HOURS: i64 = 24;

/// Query parameters for location history.
#[derive(Debug, Deserialize, IntoParams)]
pub struct LocationHistoryQuery {
    /// Look-back window in hours (default 24)
    pub hours: Option<i64>,
}

/// Query parameters for the nearby-dogs lookup.
#[derive(Debug, Deserialize, IntoParams)]
pub struct NearbyQuery {
    pub latitude: f64,
    pub longitude: f64,
    /// Search radius, 1 to 10000 meters
    pub radius_meters: f64,
}

/// Report a dog's current position.
///
/// # Returns
/// - 200 OK with the stored location
/// - 400 Bad Request for out-of-range coordinates
/// - 404 Not Found if the dog doesn't exist
#[utoipa::path(
    post,
    path = "/api/v1/locations",
    tag = "Locations",
    request_body = ReportLocationRequest,
    responses(
        (status = 200, description = "Location stored", body = DeviceLocation),
        (status = 400, description = "Invalid coordinates"),
        (status = 404, description = "Dog not found")
    )
)]
pub async fn report_location(
    State(state): State<AppState>,
    Json(req): Json<ReportLocationRequest>,
) -> Result<Json<DeviceLocation>, ApiError> {
    let location = state
        .encounters
        .report_location(req.dog_id, req.latitude, req.longitude)
        .await?;
    Ok(Json(location))
}

/// Locations reported by a dog within the last `hours`.
#[utoipa::path(
    get,
    path = "/api/v1/dogs/{id}/locations",
    tag = "Locations",
    params(("id" = Uuid, Path, description = "Dog ID"), LocationHistoryQuery),
    responses(
        (status = 200, description = "Recent locations, newest first", body = Vec<DeviceLocation>),
        (status = 404, description = "Dog not found")
    )
)]
pub async fn location_history(
    State(state): State<AppState>,
    Path(dog_id): Path<Uuid>,
    Query(query): Query<LocationHistoryQuery>,
) -> Result<Json<Vec<DeviceLocation>>, ApiError> {
    let hours = query.hours.unwrap_or(DEFAULT_HISTORY_HOURS);
    let locations = state.encounters.location_history(dog_id, hours).await?;
    Ok(Json(locations))
}

/// Dogs with public owners near a point, closest first.
#[utoipa::path(
    get,
    path = "/api/v1/dogs/{id}/nearby",
    tag = "Locations",
    params(("id" = Uuid, Path, description = "Requesting dog ID"), NearbyQuery),
    responses(
        (status = 200, description = "Nearby dogs with distances", body = Vec<NearbyDog>),
        (status = 400, description = "Invalid coordinates or radius")
    )
)]
pub async fn nearby_dogs(
    State(state): State<AppState>,
    Path(dog_id): Path<Uuid>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<Vec<NearbyDog>>, ApiError> {
    let dogs = state
        .encounters
        .nearby_dogs(&NearbyDogsRequest {
            dog_id,
            latitude: query.latitude,
            longitude: query.longitude,
            radius_meters: query.radius_meters,
        })
        .await?;
    Ok(Json(dogs))
}
