//! Encounter repository.
//!
//! Deduplication runs inside one transaction holding an advisory lock keyed
//! on the unordered dog pair, so two concurrent detections for the same pair
//! cannot both pass the window check.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

use doggyclub_core::{
    Encounter, EncounterRepository, Error, GeoPoint, NewEncounter, Result,
};

const ENCOUNTER_COLUMNS: &str = "id, dog1_id, dog2_id,
       ST_Y(point::geometry) AS latitude,
       ST_X(point::geometry) AS longitude,
       detection_method, encountered_at";

/// PostgreSQL encounter repository.
#[derive(Clone)]
pub struct PgEncounterRepository {
    pool: Pool<Postgres>,
}

impl PgEncounterRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(r: &PgRow) -> Result<Encounter> {
        let method: String = r.get("detection_method");
        Ok(Encounter {
            id: r.get("id"),
            dog1_id: r.get("dog1_id"),
            dog2_id: r.get("dog2_id"),
            point: GeoPoint {
                latitude: r.get("latitude"),
                longitude: r.get("longitude"),
            },
            detection_method: method.parse()?,
            timestamp: r.get("encountered_at"),
        })
    }
}

/// Advisory lock key for an unordered pair.
fn pair_lock_key(encounter: &NewEncounter) -> String {
    let (a, b) = encounter.ordered_pair();
    format!("encounter:{}:{}", a, b)
}

#[async_trait]
impl EncounterRepository for PgEncounterRepository {
    async fn record_if_absent(
        &self,
        encounter: NewEncounter,
        window_start: DateTime<Utc>,
    ) -> Result<Option<Encounter>> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(pair_lock_key(&encounter))
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        let recent: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM encounters
                WHERE ((dog1_id = $1 AND dog2_id = $2) OR (dog1_id = $2 AND dog2_id = $1))
                  AND encountered_at > $3
             )",
        )
        .bind(encounter.dog1_id)
        .bind(encounter.dog2_id)
        .bind(window_start)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;

        if recent {
            tx.rollback().await.map_err(Error::Database)?;
            return Ok(None);
        }

        let row = sqlx::query(&format!(
            "INSERT INTO encounters (id, dog1_id, dog2_id, point, detection_method, encountered_at)
             VALUES ($1, $2, $3, ST_SetSRID(ST_MakePoint($5, $4), 4326)::geography, $6, $7)
             RETURNING {}",
            ENCOUNTER_COLUMNS
        ))
        .bind(Uuid::now_v7())
        .bind(encounter.dog1_id)
        .bind(encounter.dog2_id)
        .bind(encounter.point.latitude)
        .bind(encounter.point.longitude)
        .bind(encounter.detection_method.as_str())
        .bind(encounter.timestamp)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;

        let stored = Self::parse_row(&row)?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(Some(stored))
    }

    async fn list_for_dog(
        &self,
        dog_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Encounter>, i64)> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM encounters
             WHERE dog1_id = $1 OR dog2_id = $1
             ORDER BY encountered_at DESC, id DESC
             LIMIT $2 OFFSET $3",
            ENCOUNTER_COLUMNS
        ))
        .bind(dog_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM encounters WHERE dog1_id = $1 OR dog2_id = $1")
                .bind(dog_id)
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Database)?;

        let encounters = rows.iter().map(Self::parse_row).collect::<Result<Vec<_>>>()?;
        Ok((encounters, total))
    }
}
