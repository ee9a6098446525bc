//! Encounter HTTP handlers: GPS detection, Bluetooth reports and history.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use doggyclub_core::{
    normalize_page, BluetoothEncounterRequest, DetectEncountersRequest, Encounter, EncounterPage,
};

use crate::{ApiError, AppState};

/// Response for GPS detection.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DetectEncountersResponse {
    /// Encounters created by this call
    pub encounters: Vec<Encounter>,
    pub count: usize,
}

/// Paging for encounter history.
///
/// Values are read leniently: anything unparsable or out of range falls back
/// to the default (limit 20, offset 0).
#[derive(Debug, Deserialize, IntoParams)]
pub struct HistoryQuery {
    /// Page size, 1 to 100
    pub limit: Option<String>,
    pub offset: Option<String>,
}

fn require_detection(state: &AppState) -> Result<(), ApiError> {
    if state.detection_enabled {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "encounter detection is disabled".to_string(),
        ))
    }
}

/// Detect GPS encounters around a dog's last reported position.
///
/// # Returns
/// - 200 OK with the newly created encounters
/// - 400 Bad Request if the radius is outside 1..=10000 meters
/// - 403 Forbidden when detection is disabled
/// - 404 Not Found if the dog has no reported location
#[utoipa::path(
    post,
    path = "/api/v1/encounters/detect",
    tag = "Encounters",
    request_body = DetectEncountersRequest,
    responses(
        (status = 200, description = "Detection complete", body = DetectEncountersResponse),
        (status = 400, description = "Invalid radius"),
        (status = 403, description = "Detection disabled"),
        (status = 404, description = "No location for dog")
    )
)]
pub async fn detect_encounters(
    State(state): State<AppState>,
    Json(req): Json<DetectEncountersRequest>,
) -> Result<Json<DetectEncountersResponse>, ApiError> {
    require_detection(&state)?;

    let encounters = state
        .encounters
        .detect(req.dog_id, req.radius_meters)
        .await?;
    if !encounters.is_empty() {
        state.history_cache.invalidate_encounters(&encounters).await;
    }

    Ok(Json(DetectEncountersResponse {
        count: encounters.len(),
        encounters,
    }))
}

/// Record an encounter reported by a proximity beacon.
///
/// # Returns
/// - 201 Created with the encounter
/// - 400 Bad Request for a self-encounter or missing `other_dog_id`
/// - 404 Not Found if either dog doesn't exist
/// - 409 Conflict if the pair met within the last 30 minutes
#[utoipa::path(
    post,
    path = "/api/v1/encounters/bluetooth",
    tag = "Encounters",
    request_body = BluetoothEncounterRequest,
    responses(
        (status = 201, description = "Encounter recorded", body = Encounter),
        (status = 400, description = "Invalid request"),
        (status = 403, description = "Detection disabled"),
        (status = 404, description = "Dog not found"),
        (status = 409, description = "Encounter already recorded recently")
    )
)]
pub async fn record_bluetooth_encounter(
    State(state): State<AppState>,
    Json(req): Json<BluetoothEncounterRequest>,
) -> Result<(StatusCode, Json<Encounter>), ApiError> {
    require_detection(&state)?;

    let encounter = state.encounters.record_bluetooth(&req).await?;
    state
        .history_cache
        .invalidate_encounters(std::slice::from_ref(&encounter))
        .await;

    Ok((StatusCode::CREATED, Json(encounter)))
}

/// Encounter history for a dog, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/dogs/{id}/encounters",
    tag = "Encounters",
    params(("id" = Uuid, Path, description = "Dog ID"), HistoryQuery),
    responses(
        (status = 200, description = "One page of encounters", body = EncounterPage)
    )
)]
pub async fn list_encounters(
    State(state): State<AppState>,
    Path(dog_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<EncounterPage>, ApiError> {
    let (limit, offset) = normalize_page(
        query.limit.as_deref().and_then(|v| v.parse().ok()),
        query.offset.as_deref().and_then(|v| v.parse().ok()),
    );

    let key = state.history_cache.page_key(dog_id, limit, offset);
    if let Some(page) = state.history_cache.get::<EncounterPage>(&key).await {
        return Ok(Json(page));
    }

    let page = state
        .encounters
        .list_encounters(dog_id, Some(limit), Some(offset))
        .await?;
    state.history_cache.set(&key, &page).await;
    Ok(Json(page))
}
