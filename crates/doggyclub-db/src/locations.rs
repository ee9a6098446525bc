//! Device location repository backed by a PostGIS geography column.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use doggyclub_core::{
    DeviceLocation, DeviceLocationRepository, Error, GeoPoint, ProximityQuery, Result,
};

/// Selects a location row with the point split back into degrees.
const LOCATION_COLUMNS: &str = "dog_id,
       ST_Y(point::geometry) AS latitude,
       ST_X(point::geometry) AS longitude,
       updated_at";

/// PostgreSQL device location repository.
#[derive(Clone)]
pub struct PgDeviceLocationRepository {
    pool: Pool<Postgres>,
}

impl PgDeviceLocationRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(r: &PgRow) -> DeviceLocation {
        DeviceLocation {
            dog_id: r.get("dog_id"),
            point: GeoPoint {
                latitude: r.get("latitude"),
                longitude: r.get("longitude"),
            },
            updated_at: r.get("updated_at"),
        }
    }
}

#[async_trait]
impl DeviceLocationRepository for PgDeviceLocationRepository {
    async fn upsert(
        &self,
        dog_id: Uuid,
        point: GeoPoint,
        at: DateTime<Utc>,
    ) -> Result<DeviceLocation> {
        let row = sqlx::query(&format!(
            "INSERT INTO device_locations (dog_id, point, updated_at)
             VALUES ($1, ST_SetSRID(ST_MakePoint($3, $2), 4326)::geography, $4)
             ON CONFLICT (dog_id) DO UPDATE
                SET point = EXCLUDED.point, updated_at = EXCLUDED.updated_at
             RETURNING {}",
            LOCATION_COLUMNS
        ))
        .bind(dog_id)
        .bind(point.latitude)
        .bind(point.longitude)
        .bind(at)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(Self::parse_row(&row))
    }

    async fn get(&self, dog_id: Uuid) -> Result<Option<DeviceLocation>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM device_locations WHERE dog_id = $1",
            LOCATION_COLUMNS
        ))
        .bind(dog_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(Self::parse_row))
    }

    async fn find_within(&self, query: &ProximityQuery) -> Result<Vec<DeviceLocation>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM device_locations
            WHERE dog_id <> $4
              AND updated_at > $5
              AND ST_DWithin(
                  point,
                  ST_SetSRID(ST_MakePoint($2, $1), 4326)::geography,
                  $3
              )
            ORDER BY ST_Distance(point, ST_SetSRID(ST_MakePoint($2, $1), 4326)::geography)
            "#,
            LOCATION_COLUMNS
        ))
        .bind(query.center.latitude)
        .bind(query.center.longitude)
        .bind(query.radius_meters)
        .bind(query.exclude_dog_id)
        .bind(query.fresh_since)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "database",
            component = "locations",
            op = "find_within",
            radius_meters = query.radius_meters,
            result_count = rows.len(),
            "Proximity query complete"
        );
        Ok(rows.iter().map(Self::parse_row).collect())
    }

    async fn list_since(&self, dog_id: Uuid, since: DateTime<Utc>) -> Result<Vec<DeviceLocation>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM device_locations
             WHERE dog_id = $1 AND updated_at > $2
             ORDER BY updated_at DESC",
            LOCATION_COLUMNS
        ))
        .bind(dog_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(Self::parse_row).collect())
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM device_locations WHERE updated_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected())
    }
}
