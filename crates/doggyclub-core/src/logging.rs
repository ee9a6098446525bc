//! Structured logging field names shared by every DoggyClub crate.
//!
//! Log aggregation tools query by these names, so crates use the constants
//! (or the identical literal keys in `tracing` macros) instead of ad-hoc
//! field names.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration (detection candidates) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated across a request.
/// Format: UUIDv7 (time-ordered).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "encounters", "database", "cache", "sweeper"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "detect", "report_location", "cleanup"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Dog UUID being operated on.
pub const DOG_ID: &str = "dog_id";

/// Other participant of an encounter.
pub const OTHER_DOG_ID: &str = "other_dog_id";

/// Encounter UUID.
pub const ENCOUNTER_ID: &str = "encounter_id";

/// Detection method ("gps", "bluetooth").
pub const DETECTION_METHOD: &str = "method";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a query.
pub const RESULT_COUNT: &str = "result_count";

/// Number of candidates considered by detection.
pub const CANDIDATE_COUNT: &str = "candidate_count";

/// Search radius in meters.
pub const RADIUS_METERS: &str = "radius_meters";

/// Rows removed by a cleanup pass.
pub const DELETED_COUNT: &str = "deleted_count";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[&str] = &[
        REQUEST_ID,
        SUBSYSTEM,
        COMPONENT,
        OPERATION,
        DOG_ID,
        OTHER_DOG_ID,
        ENCOUNTER_ID,
        DETECTION_METHOD,
        DURATION_MS,
        RESULT_COUNT,
        CANDIDATE_COUNT,
        RADIUS_METERS,
        DELETED_COUNT,
        POOL_SIZE,
        POOL_IDLE,
        SUCCESS,
        ERROR_MSG,
    ];

    #[test]
    fn test_field_names_are_unique_snake_case() {
        let mut seen = std::collections::HashSet::new();
        for name in ALL {
            assert!(seen.insert(*name), "duplicate field name {}", name);
            assert!(
                name.chars().all(|c| c.is_ascii_lowercase() || c == '_'),
                "{} is not snake_case",
                name
            );
        }
    }
}
