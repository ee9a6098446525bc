//! Encounter service: location upsert, GPS and Bluetooth detection, history,
//! nearby lookup and location retention.
//!
//! The service owns no storage. It is generic over the repository traits and
//! reads time from an injected [`Clock`], so every window (dedup, freshness,
//! retention) is computed here and handed to the store as an instant.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::defaults;
use crate::error::{Error, Result};
use crate::geo::{validate_radius, GeoPoint};
use crate::models::*;
use crate::traits::*;

/// What GPS detection does when recording one candidate fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CandidateFailurePolicy {
    /// Log at WARN and continue with the remaining candidates.
    #[default]
    Skip,
    /// Return the first failure. Encounters already recorded are kept.
    Abort,
}

/// Tunables for the encounter service.
#[derive(Debug, Clone)]
pub struct EncounterConfig {
    /// Window during which a second encounter for the same pair is suppressed.
    pub dedup_window: TimeDelta,
    /// Locations older than this are ignored by detection and nearby lookup.
    pub freshness_window: TimeDelta,
    pub candidate_failure_policy: CandidateFailurePolicy,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            dedup_window: TimeDelta::minutes(defaults::DEDUP_WINDOW_MINUTES),
            freshness_window: TimeDelta::minutes(defaults::FRESHNESS_WINDOW_MINUTES),
            candidate_failure_policy: CandidateFailurePolicy::default(),
        }
    }
}

impl EncounterConfig {
    pub fn with_candidate_failure_policy(mut self, policy: CandidateFailurePolicy) -> Self {
        self.candidate_failure_policy = policy;
        self
    }
}

/// Normalize history paging parameters.
///
/// A missing or out-of-range `limit` falls back to the default page size;
/// a missing or negative `offset` falls back to zero.
pub fn normalize_page(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let limit = limit
        .filter(|l| (1..=defaults::PAGE_LIMIT_MAX).contains(l))
        .unwrap_or(defaults::PAGE_LIMIT);
    let offset = offset
        .filter(|o| *o >= 0)
        .unwrap_or(defaults::PAGE_OFFSET);
    (limit, offset)
}

/// Clock-driven encounter service.
#[derive(Clone)]
pub struct EncounterService {
    dogs: Arc<dyn DogRepository>,
    locations: Arc<dyn DeviceLocationRepository>,
    encounters: Arc<dyn EncounterRepository>,
    clock: Arc<dyn Clock + Send + Sync>,
    config: EncounterConfig,
}

impl EncounterService {
    pub fn new(
        dogs: Arc<dyn DogRepository>,
        locations: Arc<dyn DeviceLocationRepository>,
        encounters: Arc<dyn EncounterRepository>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self {
            dogs,
            locations,
            encounters,
            clock,
            config: EncounterConfig::default(),
        }
    }

    /// Build a service over a single store implementing every repository.
    pub fn from_store<S>(store: S, clock: Arc<dyn Clock + Send + Sync>) -> Self
    where
        S: DogRepository + DeviceLocationRepository + EncounterRepository + Clone + 'static,
    {
        Self::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store),
            clock,
        )
    }

    pub fn with_config(mut self, config: EncounterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EncounterConfig {
        &self.config
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    async fn require_dog(&self, dog_id: Uuid) -> Result<()> {
        if self.dogs.exists(dog_id).await? {
            Ok(())
        } else {
            Err(Error::DogNotFound(dog_id))
        }
    }

    // =========================================================================
    // LOCATIONS
    // =========================================================================

    /// Upsert the dog's last-known position. Last write wins.
    pub async fn report_location(
        &self,
        dog_id: Uuid,
        latitude: f64,
        longitude: f64,
    ) -> Result<DeviceLocation> {
        let point = GeoPoint::new(latitude, longitude)?;
        self.require_dog(dog_id).await?;

        let location = self.locations.upsert(dog_id, point, self.now()).await?;
        debug!(
            subsystem = "encounters",
            op = "report_location",
            dog_id = %dog_id,
            "Device location updated"
        );
        Ok(location)
    }

    /// Positions reported within the last `hours`, newest first.
    ///
    /// Only the last-known position is stored, so this yields at most one row.
    pub async fn location_history(&self, dog_id: Uuid, hours: i64) -> Result<Vec<DeviceLocation>> {
        let window = TimeDelta::try_hours(hours)
            .filter(|w| *w > TimeDelta::zero())
            .ok_or_else(|| {
                Error::InvalidInput(format!("hours must be positive, got {}", hours))
            })?;
        self.require_dog(dog_id).await?;

        let since = self
            .now()
            .checked_sub_signed(window)
            .ok_or_else(|| Error::InvalidInput(format!("hours out of range: {}", hours)))?;
        self.locations.list_since(dog_id, since).await
    }

    // =========================================================================
    // DETECTION
    // =========================================================================

    /// Record GPS encounters between `dog_id` and every fresh dog within
    /// `radius_meters`. Returns only the encounters created by this call.
    pub async fn detect(&self, dog_id: Uuid, radius_meters: f64) -> Result<Vec<Encounter>> {
        validate_radius(radius_meters)?;
        let start = Instant::now();

        let origin = self
            .locations
            .get(dog_id)
            .await?
            .ok_or(Error::LocationNotFound(dog_id))?;

        let now = self.now();
        let candidates = self
            .locations
            .find_within(&ProximityQuery {
                exclude_dog_id: dog_id,
                center: origin.point,
                radius_meters,
                fresh_since: now - self.config.freshness_window,
            })
            .await?;

        let window_start = now - self.config.dedup_window;
        let mut created = Vec::new();

        for candidate in &candidates {
            let new = NewEncounter {
                dog1_id: dog_id,
                dog2_id: candidate.dog_id,
                point: origin.point,
                detection_method: DetectionMethod::Gps,
                timestamp: now,
            };
            match self.encounters.record_if_absent(new, window_start).await {
                Ok(Some(encounter)) => {
                    trace!(
                        dog_id = %dog_id,
                        other_dog_id = %candidate.dog_id,
                        encounter_id = %encounter.id,
                        "Encounter recorded"
                    );
                    created.push(encounter);
                }
                Ok(None) => {
                    trace!(
                        dog_id = %dog_id,
                        other_dog_id = %candidate.dog_id,
                        "Recent encounter exists, skipping"
                    );
                }
                Err(e) => match self.config.candidate_failure_policy {
                    CandidateFailurePolicy::Skip => {
                        warn!(
                            subsystem = "encounters",
                            op = "detect",
                            dog_id = %dog_id,
                            other_dog_id = %candidate.dog_id,
                            error = %e,
                            "Failed to record encounter, skipping candidate"
                        );
                    }
                    CandidateFailurePolicy::Abort => return Err(e),
                },
            }
        }

        info!(
            subsystem = "encounters",
            op = "detect",
            method = "gps",
            dog_id = %dog_id,
            radius_meters,
            candidate_count = candidates.len(),
            result_count = created.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "GPS detection complete"
        );
        Ok(created)
    }

    /// Record a Bluetooth encounter reported by `request.dog_id`.
    ///
    /// A repeat for the same pair inside the dedup window is a [`Error::Conflict`].
    pub async fn record_bluetooth(&self, request: &BluetoothEncounterRequest) -> Result<Encounter> {
        let other_dog_id = request.resolve_other_dog_id()?;
        if other_dog_id == request.dog_id {
            return Err(Error::InvalidInput(
                "a dog cannot encounter itself".to_string(),
            ));
        }
        let point = GeoPoint::new(request.latitude, request.longitude)?;

        self.require_dog(request.dog_id).await?;
        self.require_dog(other_dog_id).await?;

        let now = self.now();
        let new = NewEncounter {
            dog1_id: request.dog_id,
            dog2_id: other_dog_id,
            point,
            detection_method: DetectionMethod::Bluetooth,
            timestamp: now,
        };

        let encounter = self
            .encounters
            .record_if_absent(new, now - self.config.dedup_window)
            .await?
            .ok_or_else(|| Error::Conflict("encounter already recorded recently".to_string()))?;

        info!(
            subsystem = "encounters",
            op = "record_bluetooth",
            method = "bluetooth",
            dog_id = %request.dog_id,
            other_dog_id = %other_dog_id,
            encounter_id = %encounter.id,
            "Bluetooth encounter recorded"
        );
        Ok(encounter)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// A page of encounters involving `dog_id`, newest first.
    ///
    /// Paging parameters are normalized with [`normalize_page`].
    pub async fn list_encounters(
        &self,
        dog_id: Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<EncounterPage> {
        let (limit, offset) = normalize_page(limit, offset);

        let (encounters, total) = self.encounters.list_for_dog(dog_id, limit, offset).await?;
        debug!(
            op = "list_encounters",
            dog_id = %dog_id,
            result_count = encounters.len(),
            total,
            "Encounter history loaded"
        );
        Ok(EncounterPage {
            encounters,
            total,
            limit,
            offset,
        })
    }

    /// Fresh dogs with public owners around an explicit point, closest first.
    pub async fn nearby_dogs(&self, request: &NearbyDogsRequest) -> Result<Vec<NearbyDog>> {
        let center = GeoPoint::new(request.latitude, request.longitude)?;
        validate_radius(request.radius_meters)?;

        let query = ProximityQuery {
            exclude_dog_id: request.dog_id,
            center,
            radius_meters: request.radius_meters,
            fresh_since: self.now() - self.config.freshness_window,
        };
        let dogs = self.dogs.nearby_public(&query).await?;
        debug!(
            op = "nearby_dogs",
            dog_id = %request.dog_id,
            radius_meters = request.radius_meters,
            result_count = dogs.len(),
            "Nearby lookup complete"
        );
        Ok(dogs)
    }

    // =========================================================================
    // RETENTION
    // =========================================================================

    /// Delete locations not updated within `older_than`. Returns rows removed.
    pub async fn cleanup(&self, older_than: TimeDelta) -> Result<u64> {
        if older_than < TimeDelta::zero() {
            return Err(Error::InvalidInput(
                "retention period must not be negative".to_string(),
            ));
        }
        let cutoff = self.now().checked_sub_signed(older_than).ok_or_else(|| {
            Error::InvalidInput("retention period out of range".to_string())
        })?;
        let deleted = self.locations.delete_older_than(cutoff).await?;
        info!(
            subsystem = "encounters",
            op = "cleanup",
            deleted_count = deleted,
            cutoff = %cutoff,
            "Stale locations removed"
        );
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryStore, ManualClock};
    use serde_json::json;

    const A_LAT: f64 = 37.7749;
    const A_LON: f64 = -122.4194;
    const B_LAT: f64 = 37.7750;
    const B_LON: f64 = -122.4195;

    struct Harness {
        store: InMemoryStore,
        clock: Arc<ManualClock>,
        service: EncounterService,
    }

    fn harness() -> Harness {
        let store = InMemoryStore::new();
        let clock = Arc::new(ManualClock::default());
        let service = EncounterService::from_store(store.clone(), clock.clone());
        Harness {
            store,
            clock,
            service,
        }
    }

    async fn public_dog(h: &Harness, name: &str) -> Uuid {
        let owner = h.store.add_user(Visibility::Public).await;
        h.store.add_dog(owner, name).await.id
    }

    async fn private_dog(h: &Harness, name: &str) -> Uuid {
        let owner = h.store.add_user(Visibility::Private).await;
        h.store.add_dog(owner, name).await.id
    }

    fn bluetooth(dog_id: Uuid, other: Uuid) -> BluetoothEncounterRequest {
        BluetoothEncounterRequest {
            dog_id,
            other_dog_id: Some(other),
            latitude: A_LAT,
            longitude: A_LON,
            metadata: None,
        }
    }

    // ─── report_location ──────────────────────────────────────────────────

    #[tokio::test]
    async fn test_report_location_upserts() {
        let h = harness();
        let rex = public_dog(&h, "Rex").await;

        h.service.report_location(rex, A_LAT, A_LON).await.unwrap();
        h.clock.advance_minutes(5);
        let second = h.service.report_location(rex, B_LAT, B_LON).await.unwrap();

        let all = h.store.locations().await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0], second);
        assert_eq!(second.updated_at, h.clock.utc());
    }

    #[tokio::test]
    async fn test_report_location_unknown_dog() {
        let h = harness();
        let err = h
            .service
            .report_location(Uuid::new_v4(), A_LAT, A_LON)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_report_location_rejects_bad_coordinates() {
        let h = harness();
        let rex = public_dog(&h, "Rex").await;
        for (lat, lon) in [(91.0, 0.0), (0.0, 181.0), (f64::NAN, 0.0)] {
            let err = h.service.report_location(rex, lat, lon).await.unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)));
        }
        assert!(h.store.locations().await.is_empty());
    }

    #[tokio::test]
    async fn test_location_history_within_window() {
        let h = harness();
        let rex = public_dog(&h, "Rex").await;
        h.service.report_location(rex, A_LAT, A_LON).await.unwrap();

        h.clock.advance_minutes(90);
        assert_eq!(h.service.location_history(rex, 2).await.unwrap().len(), 1);
        assert!(h.service.location_history(rex, 1).await.unwrap().is_empty());
        assert!(matches!(
            h.service.location_history(rex, 0).await,
            Err(Error::InvalidInput(_))
        ));
    }

    // ─── detect ───────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_detect_records_gps_encounter_once() {
        let h = harness();
        let a = public_dog(&h, "A").await;
        let b = public_dog(&h, "B").await;
        h.service.report_location(a, A_LAT, A_LON).await.unwrap();
        h.service.report_location(b, B_LAT, B_LON).await.unwrap();

        let first = h.service.detect(a, 50.0).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].dog1_id, a);
        assert_eq!(first[0].dog2_id, b);
        assert_eq!(first[0].detection_method, DetectionMethod::Gps);
        assert_eq!(first[0].point, GeoPoint::new(A_LAT, A_LON).unwrap());
        assert_eq!(first[0].timestamp, h.clock.utc());

        h.clock.advance_minutes(10);
        assert!(h.service.detect(a, 50.0).await.unwrap().is_empty());
        assert_eq!(h.store.encounters().await.len(), 1);
    }

    #[tokio::test]
    async fn test_detect_dedup_checks_reverse_ordering() {
        let h = harness();
        let a = public_dog(&h, "A").await;
        let b = public_dog(&h, "B").await;
        h.service.report_location(a, A_LAT, A_LON).await.unwrap();
        h.service.report_location(b, B_LAT, B_LON).await.unwrap();

        assert_eq!(h.service.detect(a, 50.0).await.unwrap().len(), 1);
        assert!(h.service.detect(b, 50.0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_detect_again_after_window() {
        let h = harness();
        let a = public_dog(&h, "A").await;
        let b = public_dog(&h, "B").await;
        h.service.report_location(a, A_LAT, A_LON).await.unwrap();
        h.service.report_location(b, B_LAT, B_LON).await.unwrap();
        assert_eq!(h.service.detect(a, 50.0).await.unwrap().len(), 1);

        h.clock.advance_minutes(31);
        h.service.report_location(a, A_LAT, A_LON).await.unwrap();
        h.service.report_location(b, B_LAT, B_LON).await.unwrap();
        assert_eq!(h.service.detect(a, 50.0).await.unwrap().len(), 1);
        assert_eq!(h.store.encounters().await.len(), 2);
    }

    #[tokio::test]
    async fn test_detect_ignores_stale_and_distant_locations() {
        let h = harness();
        let a = public_dog(&h, "A").await;
        let stale = public_dog(&h, "Stale").await;
        let far = public_dog(&h, "Far").await;

        h.service.report_location(stale, B_LAT, B_LON).await.unwrap();
        h.clock.advance_minutes(61);
        h.service.report_location(a, A_LAT, A_LON).await.unwrap();
        h.service.report_location(far, 37.80, -122.40).await.unwrap();

        assert!(h.service.detect(a, 50.0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_detect_without_location_is_not_found() {
        let h = harness();
        let a = public_dog(&h, "A").await;
        let err = h.service.detect(a, 50.0).await.unwrap_err();
        assert!(matches!(err, Error::LocationNotFound(id) if id == a));
    }

    #[tokio::test]
    async fn test_detect_rejects_radius_out_of_range() {
        let h = harness();
        let a = public_dog(&h, "A").await;
        h.service.report_location(a, A_LAT, A_LON).await.unwrap();
        assert!(matches!(
            h.service.detect(a, 0.0).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            h.service.detect(a, 10_001.0).await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_detect_skips_failed_candidate_by_default() {
        let h = harness();
        let a = public_dog(&h, "A").await;
        let b = public_dog(&h, "B").await;
        let c = public_dog(&h, "C").await;
        h.service.report_location(a, A_LAT, A_LON).await.unwrap();
        h.service.report_location(b, B_LAT, B_LON).await.unwrap();
        h.service.report_location(c, A_LAT, A_LON).await.unwrap();
        h.store.fail_inserts_involving(b).await;

        let created = h.service.detect(a, 50.0).await.unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].dog2_id, c);
    }

    #[tokio::test]
    async fn test_detect_abort_policy_propagates_failure() {
        let h = harness();
        let service = h.service.clone().with_config(
            EncounterConfig::default()
                .with_candidate_failure_policy(CandidateFailurePolicy::Abort),
        );
        let a = public_dog(&h, "A").await;
        let b = public_dog(&h, "B").await;
        service.report_location(a, A_LAT, A_LON).await.unwrap();
        service.report_location(b, B_LAT, B_LON).await.unwrap();
        h.store.fail_inserts_involving(b).await;

        assert!(matches!(
            service.detect(a, 50.0).await,
            Err(Error::Database(_))
        ));
    }

    // ─── bluetooth ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_bluetooth_duplicate_conflicts_within_window() {
        let h = harness();
        let a = public_dog(&h, "A").await;
        let b = public_dog(&h, "B").await;

        let first = h.service.record_bluetooth(&bluetooth(a, b)).await.unwrap();
        assert_eq!(first.detection_method, DetectionMethod::Bluetooth);

        h.clock.advance_minutes(5);
        let err = h
            .service
            .record_bluetooth(&bluetooth(b, a))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        h.clock.advance_minutes(26);
        assert!(h.service.record_bluetooth(&bluetooth(a, b)).await.is_ok());
        assert_eq!(h.store.encounters().await.len(), 2);
    }

    #[tokio::test]
    async fn test_bluetooth_rejects_self_encounter() {
        let h = harness();
        let a = public_dog(&h, "A").await;
        let err = h
            .service
            .record_bluetooth(&bluetooth(a, a))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_bluetooth_requires_both_dogs() {
        let h = harness();
        let a = public_dog(&h, "A").await;
        let ghost = Uuid::new_v4();

        let err = h
            .service
            .record_bluetooth(&bluetooth(a, ghost))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DogNotFound(id) if id == ghost));

        let err = h
            .service
            .record_bluetooth(&bluetooth(ghost, a))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_bluetooth_other_dog_from_metadata() {
        let h = harness();
        let a = public_dog(&h, "A").await;
        let b = public_dog(&h, "B").await;
        let request = BluetoothEncounterRequest {
            dog_id: a,
            other_dog_id: None,
            latitude: B_LAT,
            longitude: B_LON,
            metadata: Some(json!({"other_dog_id": b.to_string(), "rssi": -70})),
        };

        let encounter = h.service.record_bluetooth(&request).await.unwrap();
        assert!(encounter.links(a, b));
        assert_eq!(encounter.point, GeoPoint::new(B_LAT, B_LON).unwrap());
    }

    #[tokio::test]
    async fn test_bluetooth_blocks_gps_for_same_pair() {
        let h = harness();
        let a = public_dog(&h, "A").await;
        let b = public_dog(&h, "B").await;
        h.service.record_bluetooth(&bluetooth(a, b)).await.unwrap();

        h.service.report_location(a, A_LAT, A_LON).await.unwrap();
        h.service.report_location(b, B_LAT, B_LON).await.unwrap();
        assert!(h.service.detect(a, 50.0).await.unwrap().is_empty());
    }

    // ─── history & nearby ─────────────────────────────────────────────────

    #[tokio::test]
    async fn test_list_encounters_newest_first_with_total() {
        let h = harness();
        let a = public_dog(&h, "A").await;
        let mut others = Vec::new();
        for i in 0..3 {
            let other = public_dog(&h, &format!("Dog{}", i)).await;
            h.service.record_bluetooth(&bluetooth(a, other)).await.unwrap();
            h.clock.advance_minutes(1);
            others.push(other);
        }

        let page = h.service.list_encounters(a, Some(2), Some(0)).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.limit, 2);
        assert_eq!(page.encounters.len(), 2);
        assert_eq!(page.encounters[0].dog2_id, others[2]);
        assert_eq!(page.encounters[1].dog2_id, others[1]);

        let rest = h.service.list_encounters(a, Some(2), Some(2)).await.unwrap();
        assert_eq!(rest.encounters.len(), 1);
        assert_eq!(rest.encounters[0].dog2_id, others[0]);

        let as_other = h.service.list_encounters(others[0], None, None).await.unwrap();
        assert_eq!(as_other.total, 1);
    }

    #[tokio::test]
    async fn test_list_encounters_falls_back_to_defaults() {
        let h = harness();
        let a = public_dog(&h, "A").await;

        let page = h.service.list_encounters(a, Some(500), Some(-3)).await.unwrap();
        assert_eq!(page.limit, defaults::PAGE_LIMIT);
        assert_eq!(page.offset, 0);

        let page = h.service.list_encounters(a, Some(0), None).await.unwrap();
        assert_eq!(page.limit, defaults::PAGE_LIMIT);

        let page = h.service.list_encounters(a, Some(100), None).await.unwrap();
        assert_eq!(page.limit, 100);
    }

    #[tokio::test]
    async fn test_nearby_dogs_public_fresh_and_sorted() {
        let h = harness();
        let me = public_dog(&h, "Me").await;
        let near = public_dog(&h, "Near").await;
        let nearer = public_dog(&h, "Nearer").await;
        let hidden = private_dog(&h, "Hidden").await;
        let stale = public_dog(&h, "Stale").await;

        h.service.report_location(stale, A_LAT, A_LON).await.unwrap();
        h.clock.advance_minutes(61);
        h.service.report_location(me, A_LAT, A_LON).await.unwrap();
        h.service.report_location(near, B_LAT, B_LON).await.unwrap();
        h.service.report_location(nearer, 37.77495, -122.41945).await.unwrap();
        h.service.report_location(hidden, A_LAT, A_LON).await.unwrap();

        let found = h
            .service
            .nearby_dogs(&NearbyDogsRequest {
                dog_id: me,
                latitude: A_LAT,
                longitude: A_LON,
                radius_meters: 100.0,
            })
            .await
            .unwrap();

        let ids: Vec<Uuid> = found.iter().map(|n| n.dog.id).collect();
        assert_eq!(ids, vec![nearer, near]);
        assert!(found[0].distance_meters < found[1].distance_meters);
    }

    #[test]
    fn test_normalize_page() {
        assert_eq!(normalize_page(None, None), (20, 0));
        assert_eq!(normalize_page(Some(50), Some(10)), (50, 10));
        assert_eq!(normalize_page(Some(101), Some(-1)), (20, 0));
        assert_eq!(normalize_page(Some(-5), Some(0)), (20, 0));
    }

    // ─── cleanup ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_cleanup_removes_only_stale_rows() {
        let h = harness();
        let old = public_dog(&h, "Old").await;
        let fresh = public_dog(&h, "Fresh").await;

        h.service.report_location(old, A_LAT, A_LON).await.unwrap();
        h.clock.advance(TimeDelta::hours(25));
        h.service.report_location(fresh, B_LAT, B_LON).await.unwrap();

        let removed = h.service.cleanup(TimeDelta::hours(24)).await.unwrap();
        assert_eq!(removed, 1);

        let left = h.store.locations().await;
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].dog_id, fresh);
        assert_eq!(h.service.cleanup(TimeDelta::hours(24)).await.unwrap(), 0);
    }
}
