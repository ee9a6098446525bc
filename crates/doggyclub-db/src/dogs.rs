//! Dog repository: existence checks and public nearby lookup.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

use doggyclub_core::{Dog, DogRepository, Error, NearbyDog, ProximityQuery, Result};

const DOG_COLUMNS: &str = "d.id, d.user_id, d.name, d.breed, d.age, d.photo_url, d.bio, d.created_at";

/// PostgreSQL dog repository.
#[derive(Clone)]
pub struct PgDogRepository {
    pool: Pool<Postgres>,
}

impl PgDogRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_dog(r: &PgRow) -> Dog {
        Dog {
            id: r.get("id"),
            user_id: r.get("user_id"),
            name: r.get("name"),
            breed: r.get("breed"),
            age: r.get("age"),
            photo_url: r.get("photo_url"),
            bio: r.get("bio"),
            created_at: r.get("created_at"),
        }
    }
}

#[async_trait]
impl DogRepository for PgDogRepository {
    async fn fetch(&self, id: Uuid) -> Result<Option<Dog>> {
        let row = sqlx::query(&format!("SELECT {} FROM dogs d WHERE d.id = $1", DOG_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.as_ref().map(Self::parse_dog))
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM dogs WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(exists)
    }

    async fn nearby_public(&self, query: &ProximityQuery) -> Result<Vec<NearbyDog>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {},
                   ST_Distance(
                       dl.point,
                       ST_SetSRID(ST_MakePoint($2, $1), 4326)::geography
                   ) AS distance_m
            FROM device_locations dl
            JOIN dogs d ON d.id = dl.dog_id
            JOIN users u ON u.id = d.user_id
            WHERE u.visibility = 'public'
              AND dl.dog_id <> $4
              AND dl.updated_at > $5
              AND ST_DWithin(
                  dl.point,
                  ST_SetSRID(ST_MakePoint($2, $1), 4326)::geography,
                  $3
              )
            ORDER BY distance_m ASC
            "#,
            DOG_COLUMNS
        ))
        .bind(query.center.latitude)
        .bind(query.center.longitude)
        .bind(query.radius_meters)
        .bind(query.exclude_dog_id)
        .bind(query.fresh_since)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .iter()
            .map(|r| NearbyDog {
                dog: Self::parse_dog(r),
                distance_meters: r.get("distance_m"),
            })
            .collect())
    }
}
