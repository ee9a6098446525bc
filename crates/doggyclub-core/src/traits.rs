//! Repository traits for the encounter subsystem.
//!
//! These traits define the storage seams the encounter service depends on.
//! `doggyclub-db` implements them on PostgreSQL + PostGIS and
//! [`crate::memory::InMemoryStore`] implements them with haversine distance.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::geo::GeoPoint;
use crate::models::*;

/// Radius query around a point, excluding one dog and stale positions.
#[derive(Debug, Clone, PartialEq)]
pub struct ProximityQuery {
    /// Dog to leave out of the results (the caller itself).
    pub exclude_dog_id: Uuid,
    pub center: GeoPoint,
    pub radius_meters: f64,
    /// Only locations updated strictly after this instant match.
    pub fresh_since: DateTime<Utc>,
}

// =============================================================================
// DOG REPOSITORY
// =============================================================================

/// Read access to dog profiles.
#[async_trait]
pub trait DogRepository: Send + Sync {
    /// Fetch a dog by ID.
    async fn fetch(&self, id: Uuid) -> Result<Option<Dog>>;

    /// Check if a dog exists.
    async fn exists(&self, id: Uuid) -> Result<bool>;

    /// Dogs with public owners whose location matches `query`, closest first.
    async fn nearby_public(&self, query: &ProximityQuery) -> Result<Vec<NearbyDog>>;
}

// =============================================================================
// DEVICE LOCATION REPOSITORY
// =============================================================================

/// Last-known-position storage, one row per dog.
#[async_trait]
pub trait DeviceLocationRepository: Send + Sync {
    /// Insert or overwrite the dog's location.
    async fn upsert(
        &self,
        dog_id: Uuid,
        point: GeoPoint,
        at: DateTime<Utc>,
    ) -> Result<DeviceLocation>;

    /// Current location of a dog.
    async fn get(&self, dog_id: Uuid) -> Result<Option<DeviceLocation>>;

    /// Other dogs' locations within the query radius.
    async fn find_within(&self, query: &ProximityQuery) -> Result<Vec<DeviceLocation>>;

    /// Locations for a dog updated after `since`, newest first.
    async fn list_since(&self, dog_id: Uuid, since: DateTime<Utc>) -> Result<Vec<DeviceLocation>>;

    /// Delete every location updated before `cutoff`; returns rows removed.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}

// =============================================================================
// ENCOUNTER REPOSITORY
// =============================================================================

/// Append-only encounter storage.
#[async_trait]
pub trait EncounterRepository: Send + Sync {
    /// Atomically insert `encounter` unless the same unordered pair already
    /// has an encounter newer than `window_start`.
    ///
    /// Returns `None` when a recent encounter suppressed the insert.
    async fn record_if_absent(
        &self,
        encounter: NewEncounter,
        window_start: DateTime<Utc>,
    ) -> Result<Option<Encounter>>;

    /// Encounters involving `dog_id`, newest first, with the total count.
    async fn list_for_dog(
        &self,
        dog_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Encounter>, i64)>;
}
