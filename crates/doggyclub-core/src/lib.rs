//! # doggyclub-core
//!
//! Core types, traits, and encounter detection for the DoggyClub backend.
//!
//! This crate provides the domain models, repository trait definitions and
//! the clock-driven [`EncounterService`] that the database and API crates
//! build on.

pub mod defaults;
pub mod encounters;
pub mod error;
pub mod geo;
pub mod logging;
pub mod memory;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use encounters::{normalize_page, CandidateFailurePolicy, EncounterConfig, EncounterService};
pub use error::{Error, Result};
pub use geo::{haversine_distance, GeoPoint};
pub use mockable::{Clock, DefaultClock};
pub use models::*;
pub use traits::*;
