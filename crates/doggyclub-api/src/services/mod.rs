//! Service layer for caching and background maintenance.

pub mod history_cache;
pub mod location_sweeper;

pub use history_cache::HistoryCache;
pub use location_sweeper::{LocationSweeper, SweeperConfig, SweeperHandle};
