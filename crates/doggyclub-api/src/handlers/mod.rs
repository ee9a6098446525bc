//! HTTP handlers for doggyclub-api.

pub mod admin;
pub mod encounters;
pub mod health;
pub mod locations;
