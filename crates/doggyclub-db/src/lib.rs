//! # doggyclub-db
//!
//! PostgreSQL + PostGIS database layer for the DoggyClub backend.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for dogs, device locations and encounters
//! - Radius queries with `ST_DWithin` on geography columns
//! - Pair-locked encounter deduplication
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use doggyclub_db::{Database, DefaultClock};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/doggyclub").await?;
//!     let service = db.encounter_service(Arc::new(DefaultClock));
//!
//!     let created = service.detect(dog_id, 50.0).await?;
//!     println!("Recorded {} encounters", created.len());
//!     Ok(())
//! }
//! ```
pub mod dogs;
pub mod encounters;
pub mod locations;
pub mod pool;

// Test fixtures for integration tests
// Note: Always compiled so downstream crates can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

use std::sync::Arc;

// Re-export core types
pub use doggyclub_core::*;

pub use dogs::PgDogRepository;
pub use encounters::PgEncounterRepository;
pub use locations::PgDeviceLocationRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    pub dogs: PgDogRepository,
    /// Last-known positions, one row per dog.
    pub locations: PgDeviceLocationRepository,
    pub encounters: PgEncounterRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            dogs: PgDogRepository::new(pool.clone()),
            locations: PgDeviceLocationRepository::new(pool.clone()),
            encounters: PgEncounterRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }

    /// Build an encounter service over these repositories.
    pub fn encounter_service(&self, clock: Arc<dyn Clock + Send + Sync>) -> EncounterService {
        EncounterService::new(
            Arc::new(self.dogs.clone()),
            Arc::new(self.locations.clone()),
            Arc::new(self.encounters.clone()),
            clock,
        )
    }
}
