//! Router construction and middleware stack.

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::handlers::{admin, encounters, health, locations};
use crate::AppState;

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// OPENAPI
// =============================================================================

#[derive(OpenApi)]
#[openapi(
    info(
        title = "DoggyClub Encounter API",
        description = "Device locations, proximity encounters and nearby dogs"
    ),
    paths(
        health::health_check,
        locations::report_location,
        locations::location_history,
        locations::nearby_dogs,
        encounters::detect_encounters,
        encounters::record_bluetooth_encounter,
        encounters::list_encounters,
        admin::cleanup_locations,
    ),
    components(schemas(
        doggyclub_core::GeoPoint,
        doggyclub_core::Visibility,
        doggyclub_core::Dog,
        doggyclub_core::DeviceLocation,
        doggyclub_core::DetectionMethod,
        doggyclub_core::Encounter,
        doggyclub_core::EncounterPage,
        doggyclub_core::NearbyDog,
        doggyclub_core::ReportLocationRequest,
        doggyclub_core::DetectEncountersRequest,
        doggyclub_core::BluetoothEncounterRequest,
        encounters::DetectEncountersResponse,
        admin::CleanupResponse,
    )),
    tags(
        (name = "Locations", description = "Device location reports and nearby lookup"),
        (name = "Encounters", description = "GPS and Bluetooth encounter detection"),
        (name = "Admin", description = "Maintenance operations"),
        (name = "System", description = "Health checks")
    )
)]
pub struct ApiDoc;

// =============================================================================
// ROUTER
// =============================================================================

/// Build the application router with all middleware applied.
pub fn build_router(state: AppState, config: &ApiConfig) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Locations
        .route("/api/v1/locations", post(locations::report_location))
        .route("/api/v1/dogs/:id/locations", get(locations::location_history))
        .route("/api/v1/dogs/:id/nearby", get(locations::nearby_dogs))
        // Encounters
        .route(
            "/api/v1/encounters/detect",
            post(encounters::detect_encounters),
        )
        .route(
            "/api/v1/encounters/bluetooth",
            post(encounters::record_bluetooth_encounter),
        )
        .route("/api/v1/dogs/:id/encounters", get(encounters::list_encounters))
        // Admin
        .route(
            "/api/v1/admin/locations/cleanup",
            post(admin::cleanup_locations),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(config.allowed_origins.clone()))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
                .allow_credentials(true)
                .max_age(std::time::Duration::from_secs(3600)),
        )
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .with_state(state)
}
