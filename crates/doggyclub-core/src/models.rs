//! Core data models for the DoggyClub encounter subsystem.
//!
//! These types are shared across all DoggyClub crates and represent the
//! domain entities and request payloads.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::Error;
use crate::geo::GeoPoint;

// =============================================================================
// OWNERS & DOGS
// =============================================================================

/// Profile visibility of a dog's owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            other => Err(Error::InvalidInput(format!("unknown visibility '{}'", other))),
        }
    }
}

/// Dog profile as seen by the encounter subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Dog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub breed: Option<String>,
    pub age: Option<i32>,
    pub photo_url: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Dog {
    /// Whether `user_id` owns this dog.
    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

// =============================================================================
// DEVICE LOCATIONS
// =============================================================================

/// Last-known position of a dog. One row per dog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DeviceLocation {
    pub dog_id: Uuid,
    pub point: GeoPoint,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// ENCOUNTERS
// =============================================================================

/// How an encounter was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMethod {
    Gps,
    Bluetooth,
}

impl DetectionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionMethod::Gps => "gps",
            DetectionMethod::Bluetooth => "bluetooth",
        }
    }
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetectionMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gps" => Ok(DetectionMethod::Gps),
            "bluetooth" => Ok(DetectionMethod::Bluetooth),
            other => Err(Error::InvalidInput(format!(
                "unknown detection method '{}'",
                other
            ))),
        }
    }
}

/// Immutable record that two dogs were co-located.
///
/// `dog1_id` is the initiating dog for GPS detection and the reporting dog
/// for Bluetooth. The pair is unordered for deduplication purposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Encounter {
    pub id: Uuid,
    pub dog1_id: Uuid,
    pub dog2_id: Uuid,
    pub point: GeoPoint,
    pub detection_method: DetectionMethod,
    pub timestamp: DateTime<Utc>,
}

impl Encounter {
    /// Whether `dog_id` took part in this encounter.
    pub fn involves(&self, dog_id: Uuid) -> bool {
        self.dog1_id == dog_id || self.dog2_id == dog_id
    }

    /// The other participant, if `dog_id` is one of the two.
    pub fn other_dog(&self, dog_id: Uuid) -> Option<Uuid> {
        if self.dog1_id == dog_id {
            Some(self.dog2_id)
        } else if self.dog2_id == dog_id {
            Some(self.dog1_id)
        } else {
            None
        }
    }

    /// Whether this encounter links the unordered pair `{a, b}`.
    pub fn links(&self, a: Uuid, b: Uuid) -> bool {
        (self.dog1_id == a && self.dog2_id == b) || (self.dog1_id == b && self.dog2_id == a)
    }
}

/// Encounter to be inserted by a repository.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEncounter {
    pub dog1_id: Uuid,
    pub dog2_id: Uuid,
    pub point: GeoPoint,
    pub detection_method: DetectionMethod,
    pub timestamp: DateTime<Utc>,
}

impl NewEncounter {
    /// The pair in canonical (smaller id first) order.
    pub fn ordered_pair(&self) -> (Uuid, Uuid) {
        if self.dog1_id <= self.dog2_id {
            (self.dog1_id, self.dog2_id)
        } else {
            (self.dog2_id, self.dog1_id)
        }
    }
}

/// One page of a dog's encounter history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct EncounterPage {
    pub encounters: Vec<Encounter>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// A dog found near a point, with its distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct NearbyDog {
    pub dog: Dog,
    pub distance_meters: f64,
}

// =============================================================================
// REQUESTS
// =============================================================================

/// Location ping from a dog's device.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ReportLocationRequest {
    pub dog_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
}

/// GPS detection request.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DetectEncountersRequest {
    pub dog_id: Uuid,
    pub radius_meters: f64,
}

/// Pairwise encounter reported by a proximity beacon.
///
/// `other_dog_id` may be omitted when the beacon payload carries it as
/// `metadata.other_dog_id`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct BluetoothEncounterRequest {
    pub dog_id: Uuid,
    #[serde(default)]
    pub other_dog_id: Option<Uuid>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<JsonValue>,
}

impl BluetoothEncounterRequest {
    /// Resolve the other participant from the explicit field or the metadata.
    pub fn resolve_other_dog_id(&self) -> Result<Uuid, Error> {
        if let Some(id) = self.other_dog_id {
            return Ok(id);
        }
        let raw = self
            .metadata
            .as_ref()
            .and_then(|m| m.get("other_dog_id"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                Error::InvalidInput("other_dog_id required for Bluetooth encounters".to_string())
            })?;
        Uuid::parse_str(raw)
            .map_err(|_| Error::InvalidInput("invalid other_dog_id format".to_string()))
    }
}

/// Nearby-dogs lookup around an explicit point.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct NearbyDogsRequest {
    pub dog_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
}
