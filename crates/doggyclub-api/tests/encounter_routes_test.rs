//! Router-level tests for the encounter API.
//!
//! Drives the full axum `Router` (middleware included) with
//! `tower::ServiceExt::oneshot` over the in-memory store and a manual clock,
//! so no database or Redis is needed.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::TimeDelta;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use doggyclub_api::services::HistoryCache;
use doggyclub_api::{build_router, ApiConfig, AppState};
use doggyclub_core::memory::{InMemoryStore, ManualClock};
use doggyclub_core::{EncounterService, Visibility};

const A: (f64, f64) = (37.7749, -122.4194);
const B: (f64, f64) = (37.7750, -122.4195);

struct TestApp {
    store: InMemoryStore,
    clock: Arc<ManualClock>,
    detection_enabled: bool,
}

impl TestApp {
    fn new() -> Self {
        Self {
            store: InMemoryStore::new(),
            clock: Arc::new(ManualClock::default()),
            detection_enabled: true,
        }
    }

    fn router(&self) -> Router {
        let service = EncounterService::from_store(self.store.clone(), self.clock.clone());
        let state = AppState::new(service, HistoryCache::disabled())
            .with_detection_enabled(self.detection_enabled);
        build_router(state, &ApiConfig::default())
    }

    async fn dog(&self, visibility: Visibility, name: &str) -> Uuid {
        let owner = self.store.add_user(visibility).await;
        self.store.add_dog(owner, name).await.id
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn report(&self, dog_id: Uuid, (lat, lon): (f64, f64)) {
        let (status, _) = self
            .post(
                "/api/v1/locations",
                json!({"dog_id": dog_id, "latitude": lat, "longitude": lon}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let app = TestApp::new();
    let response = app
        .router()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let id = response
        .headers()
        .get("x-request-id")
        .expect("request id header")
        .to_str()
        .unwrap();
    assert_eq!(Uuid::parse_str(id).unwrap().get_version_num(), 7);
}

#[tokio::test]
async fn test_report_location_validation() {
    let app = TestApp::new();
    let rex = app.dog(Visibility::Public, "Rex").await;

    let (status, body) = app
        .post(
            "/api/v1/locations",
            json!({"dog_id": rex, "latitude": 95.0, "longitude": 0.0}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("latitude"));

    let (status, _) = app
        .post(
            "/api/v1/locations",
            json!({"dog_id": Uuid::new_v4(), "latitude": 1.0, "longitude": 1.0}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_location_history() {
    let app = TestApp::new();
    let rex = app.dog(Visibility::Public, "Rex").await;
    app.report(rex, A).await;

    let (status, body) = app
        .get(&format!("/api/v1/dogs/{}/locations?hours=1", rex))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["dog_id"], rex.to_string());
}

#[tokio::test]
async fn test_detect_creates_one_encounter_then_dedups() {
    let app = TestApp::new();
    let a = app.dog(Visibility::Public, "A").await;
    let b = app.dog(Visibility::Public, "B").await;
    app.report(a, A).await;
    app.report(b, B).await;

    let (status, body) = app
        .post(
            "/api/v1/encounters/detect",
            json!({"dog_id": a, "radius_meters": 50}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["encounters"][0]["dog1_id"], a.to_string());
    assert_eq!(body["encounters"][0]["dog2_id"], b.to_string());
    assert_eq!(body["encounters"][0]["detection_method"], "gps");

    app.clock.advance_minutes(10);
    let (_, body) = app
        .post(
            "/api/v1/encounters/detect",
            json!({"dog_id": a, "radius_meters": 50}),
        )
        .await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_detect_errors() {
    let app = TestApp::new();
    let a = app.dog(Visibility::Public, "A").await;

    let (status, body) = app
        .post(
            "/api/v1/encounters/detect",
            json!({"dog_id": a, "radius_meters": 50}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    app.report(a, A).await;
    let (status, _) = app
        .post(
            "/api/v1/encounters/detect",
            json!({"dog_id": a, "radius_meters": 20000}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bluetooth_created_conflict_and_self() {
    let app = TestApp::new();
    let a = app.dog(Visibility::Public, "A").await;
    let b = app.dog(Visibility::Public, "B").await;
    let request = json!({
        "dog_id": a,
        "latitude": A.0,
        "longitude": A.1,
        "metadata": {"other_dog_id": b, "rssi": -58}
    });

    let (status, body) = app.post("/api/v1/encounters/bluetooth", request.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["detection_method"], "bluetooth");

    app.clock.advance_minutes(5);
    let (status, body) = app.post("/api/v1/encounters/bluetooth", request.clone()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "encounter already recorded recently");

    app.clock.advance_minutes(26);
    let (status, _) = app.post("/api/v1/encounters/bluetooth", request).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .post(
            "/api/v1/encounters/bluetooth",
            json!({"dog_id": a, "other_dog_id": a, "latitude": 0.0, "longitude": 0.0}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_detection_disabled_is_forbidden() {
    let mut app = TestApp::new();
    app.detection_enabled = false;
    let a = app.dog(Visibility::Public, "A").await;
    let b = app.dog(Visibility::Public, "B").await;

    let (status, _) = app
        .post(
            "/api/v1/encounters/detect",
            json!({"dog_id": a, "radius_meters": 50}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .post(
            "/api/v1/encounters/bluetooth",
            json!({"dog_id": a, "other_dog_id": b, "latitude": 0.0, "longitude": 0.0}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(app.store.encounters().await.is_empty());
}

#[tokio::test]
async fn test_history_paging_falls_back_to_defaults() {
    let app = TestApp::new();
    let a = app.dog(Visibility::Public, "A").await;
    for i in 0..3 {
        let other = app.dog(Visibility::Public, &format!("Friend{}", i)).await;
        let (status, _) = app
            .post(
                "/api/v1/encounters/bluetooth",
                json!({"dog_id": a, "other_dog_id": other, "latitude": 0.0, "longitude": 0.0}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        app.clock.advance_minutes(1);
    }

    let (status, body) = app
        .get(&format!("/api/v1/dogs/{}/encounters?limit=abc&offset=-4", a))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["limit"], 20);
    assert_eq!(body["offset"], 0);
    assert_eq!(body["total"], 3);

    let (_, body) = app
        .get(&format!("/api/v1/dogs/{}/encounters?limit=2&offset=2", a))
        .await;
    assert_eq!(body["encounters"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_nearby_dogs_sorted_and_public_only() {
    let app = TestApp::new();
    let me = app.dog(Visibility::Public, "Me").await;
    let near = app.dog(Visibility::Public, "Near").await;
    let hidden = app.dog(Visibility::Private, "Hidden").await;
    app.report(near, B).await;
    app.report(hidden, A).await;

    let (status, body) = app
        .get(&format!(
            "/api/v1/dogs/{}/nearby?latitude={}&longitude={}&radius_meters=100",
            me, A.0, A.1
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let results = body.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["dog"]["id"], near.to_string());
    assert!(results[0]["distance_meters"].as_f64().unwrap() < 20.0);
}

#[tokio::test]
async fn test_admin_cleanup() {
    let app = TestApp::new();
    let old = app.dog(Visibility::Public, "Old").await;
    app.report(old, A).await;
    app.clock.advance(TimeDelta::hours(25));
    let fresh = app.dog(Visibility::Public, "Fresh").await;
    app.report(fresh, B).await;

    let (status, body) = app
        .post("/api/v1/admin/locations/cleanup", json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 1);
    assert_eq!(body["older_than_hours"], 24);

    let (status, _) = app
        .post("/api/v1/admin/locations/cleanup?older_than_hours=0", json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
