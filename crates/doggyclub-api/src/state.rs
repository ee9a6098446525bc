//! Shared application state.

use doggyclub_core::EncounterService;

use crate::services::HistoryCache;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub encounters: EncounterService,
    /// Redis encounter history cache (disabled when Redis is unavailable).
    pub history_cache: HistoryCache,
    /// Whether detection endpoints are served.
    pub detection_enabled: bool,
}

impl AppState {
    pub fn new(encounters: EncounterService, history_cache: HistoryCache) -> Self {
        Self {
            encounters,
            history_cache,
            detection_enabled: true,
        }
    }

    pub fn with_detection_enabled(mut self, enabled: bool) -> Self {
        self.detection_enabled = enabled;
        self
    }
}
