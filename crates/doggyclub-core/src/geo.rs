//! Geodesy helpers: coordinate validation and great-circle distance.
//!
//! PostGIS evaluates `ST_DWithin` on the WGS84 spheroid; the in-memory store
//! uses the haversine formula on a sphere of mean Earth radius. The two agree
//! to well under 0.5% at the radii accepted for detection.

use serde::{Deserialize, Serialize};

use crate::defaults::{MAX_RADIUS_METERS, MIN_RADIUS_METERS};
use crate::error::{Error, Result};

/// Mean Earth radius (IUGG) in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Build a point, rejecting out-of-range or non-finite coordinates.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        validate_latitude(latitude)?;
        validate_longitude(longitude)?;
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Great-circle distance to `other` in meters.
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        haversine_distance(self, other)
    }

    /// Whether `other` lies within `radius_meters` (inclusive).
    pub fn is_within(&self, other: &GeoPoint, radius_meters: f64) -> bool {
        self.distance_to(other) <= radius_meters
    }
}

/// Haversine distance between two points in meters.
pub fn haversine_distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
}

/// Latitude must be finite and within [-90, 90].
pub fn validate_latitude(latitude: f64) -> Result<()> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(Error::InvalidInput(format!(
            "latitude must be between -90 and 90, got {}",
            latitude
        )));
    }
    Ok(())
}

/// Longitude must be finite and within [-180, 180].
pub fn validate_longitude(longitude: f64) -> Result<()> {
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(Error::InvalidInput(format!(
            "longitude must be between -180 and 180, got {}",
            longitude
        )));
    }
    Ok(())
}

/// Detection and nearby radii must be within the configured bounds.
pub fn validate_radius(radius_meters: f64) -> Result<()> {
    if !radius_meters.is_finite()
        || !(MIN_RADIUS_METERS..=MAX_RADIUS_METERS).contains(&radius_meters)
    {
        return Err(Error::InvalidInput(format!(
            "radius_meters must be between {} and {}, got {}",
            MIN_RADIUS_METERS, MAX_RADIUS_METERS, radius_meters
        )));
    }
    Ok(())
}
