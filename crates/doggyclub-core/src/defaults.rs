//! Centralized default constants for the DoggyClub backend.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers.

// =============================================================================
// ENCOUNTER DETECTION
// =============================================================================

/// Window during which a second encounter for the same pair is suppressed.
pub const DEDUP_WINDOW_MINUTES: i64 = 30;

/// Locations older than this are stale and never matched.
pub const FRESHNESS_WINDOW_MINUTES: i64 = 60;

/// Smallest accepted detection radius in meters.
pub const MIN_RADIUS_METERS: f64 = 1.0;

/// Largest accepted detection radius in meters.
pub const MAX_RADIUS_METERS: f64 = 10_000.0;

// =============================================================================
// LOCATION RETENTION
// =============================================================================

/// Default age after which device locations are purged.
pub const LOCATION_RETENTION_HOURS: i64 = 24;

/// Default interval between retention sweeps.
pub const LOCATION_SWEEP_INTERVAL_SECS: u64 = 3600;

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for encounter history.
pub const PAGE_LIMIT: i64 = 20;

/// Largest page size accepted for encounter history.
pub const PAGE_LIMIT_MAX: i64 = 100;

/// Default page offset.
pub const PAGE_OFFSET: i64 = 0;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 9090;

/// Default request body limit in bytes.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

// =============================================================================
// CACHE
// =============================================================================

/// Default TTL for cached encounter history pages (30 minutes).
pub const HISTORY_CACHE_TTL_SECS: u64 = 1800;

/// Key prefix for cached encounter history pages.
pub const HISTORY_CACHE_PREFIX: &str = "encounters:dog:";
