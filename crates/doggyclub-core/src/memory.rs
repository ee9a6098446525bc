//! In-memory store and manual clock for deterministic testing.
//!
//! [`InMemoryStore`] implements every repository trait over a single mutex,
//! so `record_if_absent` is atomic just like the PostgreSQL implementation.
//! Distances use the haversine formula.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use doggyclub_core::memory::{InMemoryStore, ManualClock};
//! use doggyclub_core::{EncounterService, Visibility};
//!
//! # async fn demo() -> doggyclub_core::Result<()> {
//! let store = InMemoryStore::new();
//! let owner = store.add_user(Visibility::Public).await;
//! let rex = store.add_dog(owner, "Rex").await;
//!
//! let service = EncounterService::from_store(store.clone(), Arc::new(ManualClock::default()));
//! assert!(service.detect(rex.id, 50.0).await.is_err()); // no location yet
//! # Ok(())
//! # }
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::geo::GeoPoint;
use crate::models::*;
use crate::traits::*;

#[derive(Default)]
struct StoreState {
    users: HashMap<Uuid, Visibility>,
    dogs: HashMap<Uuid, Dog>,
    locations: HashMap<Uuid, DeviceLocation>,
    encounters: Vec<Encounter>,
    failing_dogs: HashSet<Uuid>,
}

/// Thread-safe in-memory implementation of all repository traits.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an owner with the given visibility.
    pub async fn add_user(&self, visibility: Visibility) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().await.users.insert(id, visibility);
        id
    }

    /// Register a dog belonging to `user_id`.
    pub async fn add_dog(&self, user_id: Uuid, name: &str) -> Dog {
        let dog = Dog {
            id: Uuid::new_v4(),
            user_id,
            name: name.to_string(),
            breed: None,
            age: None,
            photo_url: None,
            bio: None,
            created_at: Utc::now(),
        };
        self.state.lock().await.dogs.insert(dog.id, dog.clone());
        dog
    }

    /// Make every encounter insert involving `dog_id` fail with a database
    /// error. Used to exercise per-candidate failure handling.
    pub async fn fail_inserts_involving(&self, dog_id: Uuid) {
        self.state.lock().await.failing_dogs.insert(dog_id);
    }

    /// Snapshot of every stored encounter, in insertion order.
    pub async fn encounters(&self) -> Vec<Encounter> {
        self.state.lock().await.encounters.clone()
    }

    /// Snapshot of every stored location.
    pub async fn locations(&self) -> Vec<DeviceLocation> {
        self.state.lock().await.locations.values().cloned().collect()
    }
}

#[async_trait]
impl DogRepository for InMemoryStore {
    async fn fetch(&self, id: Uuid) -> Result<Option<Dog>> {
        Ok(self.state.lock().await.dogs.get(&id).cloned())
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        Ok(self.state.lock().await.dogs.contains_key(&id))
    }

    async fn nearby_public(&self, query: &ProximityQuery) -> Result<Vec<NearbyDog>> {
        let state = self.state.lock().await;
        let mut found: Vec<NearbyDog> = state
            .locations
            .values()
            .filter(|loc| loc.dog_id != query.exclude_dog_id)
            .filter(|loc| loc.updated_at > query.fresh_since)
            .filter_map(|loc| {
                let dog = state.dogs.get(&loc.dog_id)?;
                let public = state.users.get(&dog.user_id) == Some(&Visibility::Public);
                let distance = query.center.distance_to(&loc.point);
                (public && distance <= query.radius_meters).then(|| NearbyDog {
                    dog: dog.clone(),
                    distance_meters: distance,
                })
            })
            .collect();
        found.sort_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters));
        Ok(found)
    }
}

#[async_trait]
impl DeviceLocationRepository for InMemoryStore {
    async fn upsert(
        &self,
        dog_id: Uuid,
        point: GeoPoint,
        at: DateTime<Utc>,
    ) -> Result<DeviceLocation> {
        let location = DeviceLocation {
            dog_id,
            point,
            updated_at: at,
        };
        self.state
            .lock()
            .await
            .locations
            .insert(dog_id, location.clone());
        Ok(location)
    }

    async fn get(&self, dog_id: Uuid) -> Result<Option<DeviceLocation>> {
        Ok(self.state.lock().await.locations.get(&dog_id).cloned())
    }

    async fn find_within(&self, query: &ProximityQuery) -> Result<Vec<DeviceLocation>> {
        let state = self.state.lock().await;
        let mut found: Vec<(f64, DeviceLocation)> = state
            .locations
            .values()
            .filter(|loc| loc.dog_id != query.exclude_dog_id)
            .filter(|loc| loc.updated_at > query.fresh_since)
            .map(|loc| (query.center.distance_to(&loc.point), loc.clone()))
            .filter(|(distance, _)| *distance <= query.radius_meters)
            .collect();
        found.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(found.into_iter().map(|(_, loc)| loc).collect())
    }

    async fn list_since(&self, dog_id: Uuid, since: DateTime<Utc>) -> Result<Vec<DeviceLocation>> {
        let state = self.state.lock().await;
        Ok(state
            .locations
            .get(&dog_id)
            .filter(|loc| loc.updated_at > since)
            .cloned()
            .into_iter()
            .collect())
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut state = self.state.lock().await;
        let before = state.locations.len();
        state.locations.retain(|_, loc| loc.updated_at >= cutoff);
        Ok((before - state.locations.len()) as u64)
    }
}

#[async_trait]
impl EncounterRepository for InMemoryStore {
    async fn record_if_absent(
        &self,
        encounter: NewEncounter,
        window_start: DateTime<Utc>,
    ) -> Result<Option<Encounter>> {
        let mut state = self.state.lock().await;

        if state.failing_dogs.contains(&encounter.dog1_id)
            || state.failing_dogs.contains(&encounter.dog2_id)
        {
            return Err(Error::Database(sqlx::Error::PoolTimedOut));
        }

        let recent = state.encounters.iter().any(|e| {
            e.links(encounter.dog1_id, encounter.dog2_id) && e.timestamp > window_start
        });
        if recent {
            return Ok(None);
        }

        let stored = Encounter {
            id: Uuid::now_v7(),
            dog1_id: encounter.dog1_id,
            dog2_id: encounter.dog2_id,
            point: encounter.point,
            detection_method: encounter.detection_method,
            timestamp: encounter.timestamp,
        };
        state.encounters.push(stored.clone());
        Ok(Some(stored))
    }

    async fn list_for_dog(
        &self,
        dog_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Encounter>, i64)> {
        let state = self.state.lock().await;
        let mut matching: Vec<&Encounter> =
            state.encounters.iter().filter(|e| e.involves(dog_id)).collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }
}

// =============================================================================
// MANUAL CLOCK
// =============================================================================

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock(StdMutex<DateTime<Utc>>);

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self(StdMutex::new(start))
    }

    /// Move the clock forward by `minutes`.
    pub fn advance_minutes(&self, minutes: i64) {
        self.advance(TimeDelta::minutes(minutes));
    }

    /// Move the clock forward by `delta`.
    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now += delta;
    }

    /// Jump to an absolute instant.
    pub fn set(&self, instant: DateTime<Utc>) {
        let mut now = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now = instant;
    }
}

impl Default for ManualClock {
    /// Starts at 2026-06-01T12:00:00Z.
    fn default() -> Self {
        Self::new(
            Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0)
                .single()
                .unwrap_or_else(Utc::now),
        )
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
