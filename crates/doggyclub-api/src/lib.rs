//! # doggyclub-api
//!
//! HTTP surface for the DoggyClub encounter subsystem: location reports,
//! GPS and Bluetooth detection, encounter history, nearby dogs and location
//! retention.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::ApiError;
pub use routes::{build_router, ApiDoc};
pub use state::AppState;
