//! Redis-backed cache for encounter history pages.
//!
//! Pages are keyed per dog and page window. Recording an encounter drops
//! every cached page of both participants.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `REDIS_ENABLED`: Set to "false" to disable caching (default: true)
//! - `REDIS_URL`: Redis connection URL (default: redis://localhost:6379)
//! - `REDIS_CACHE_TTL`: Cache TTL in seconds (default: 1800)

use std::sync::Arc;
use std::time::Duration;

use doggyclub_core::defaults::{HISTORY_CACHE_PREFIX, HISTORY_CACHE_TTL_SECS};
use doggyclub_core::Encounter;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Encounter history cache backed by Redis.
#[derive(Clone)]
pub struct HistoryCache {
    inner: Arc<HistoryCacheInner>,
}

struct HistoryCacheInner {
    /// Redis connection manager (None if disabled or unreachable).
    connection: RwLock<Option<ConnectionManager>>,
    ttl_seconds: u64,
    prefix: String,
}

impl HistoryCache {
    /// Create a cache from environment configuration.
    ///
    /// Connection failures are logged and leave the cache disabled.
    pub async fn from_env() -> Self {
        let enabled = std::env::var("REDIS_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

        let ttl_seconds: u64 = std::env::var("REDIS_CACHE_TTL")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(HISTORY_CACHE_TTL_SECS);

        let connection = if enabled {
            match redis::Client::open(redis_url.as_str()) {
                Ok(client) => match ConnectionManager::new(client).await {
                    Ok(conn) => {
                        info!(
                            subsystem = "cache",
                            ttl_secs = ttl_seconds,
                            "Redis encounter history cache enabled"
                        );
                        Some(conn)
                    }
                    Err(e) => {
                        warn!(subsystem = "cache", error = %e, "Failed to connect to Redis, cache disabled");
                        None
                    }
                },
                Err(e) => {
                    warn!(subsystem = "cache", error = %e, "Invalid Redis URL, cache disabled");
                    None
                }
            }
        } else {
            info!(subsystem = "cache", "Redis history cache disabled via REDIS_ENABLED=false");
            None
        };

        Self::with_connection(connection, ttl_seconds)
    }

    /// Create a disabled cache (for testing or when Redis is unavailable).
    pub fn disabled() -> Self {
        Self::with_connection(None, HISTORY_CACHE_TTL_SECS)
    }

    fn with_connection(connection: Option<ConnectionManager>, ttl_seconds: u64) -> Self {
        Self {
            inner: Arc::new(HistoryCacheInner {
                connection: RwLock::new(connection),
                ttl_seconds,
                prefix: HISTORY_CACHE_PREFIX.to_string(),
            }),
        }
    }

    /// Check if the cache holds a live connection.
    pub async fn is_connected(&self) -> bool {
        self.inner.connection.read().await.is_some()
    }

    /// Key for one history page of a dog.
    pub fn page_key(&self, dog_id: Uuid, limit: i64, offset: i64) -> String {
        format!("{}{}:page:{}:{}", self.inner.prefix, dog_id, limit, offset)
    }

    fn dog_pattern(&self, dog_id: Uuid) -> String {
        format!("{}{}:*", self.inner.prefix, dog_id)
    }

    /// Get a cached value. Any failure is treated as a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut conn_guard = self.inner.connection.write().await;
        let conn = conn_guard.as_mut()?;

        match conn.get::<_, Option<String>>(key).await {
            Ok(Some(data)) => match serde_json::from_str(&data) {
                Ok(result) => {
                    debug!(subsystem = "cache", key, "Cache HIT");
                    Some(result)
                }
                Err(e) => {
                    warn!(subsystem = "cache", error = %e, "Cache deserialization error");
                    None
                }
            },
            Ok(None) => {
                debug!(subsystem = "cache", key, "Cache MISS");
                None
            }
            Err(e) => {
                error!(subsystem = "cache", error = %e, "Redis GET error");
                None
            }
        }
    }

    /// Store a value with the configured TTL.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> bool {
        let mut conn_guard = self.inner.connection.write().await;
        let conn = match conn_guard.as_mut() {
            Some(c) => c,
            None => return false,
        };

        let serialized = match serde_json::to_string(value) {
            Ok(s) => s,
            Err(e) => {
                error!(subsystem = "cache", error = %e, "Cache serialization error");
                return false;
            }
        };

        match conn
            .set_ex::<_, _, ()>(key, serialized, self.inner.ttl_seconds)
            .await
        {
            Ok(_) => {
                debug!(subsystem = "cache", key, ttl_secs = self.inner.ttl_seconds, "Cache SET");
                true
            }
            Err(e) => {
                error!(subsystem = "cache", error = %e, "Redis SET error");
                false
            }
        }
    }

    /// Drop every cached page for `dog_id`.
    pub async fn invalidate_dog(&self, dog_id: Uuid) -> bool {
        let mut conn_guard = self.inner.connection.write().await;
        let conn = match conn_guard.as_mut() {
            Some(c) => c,
            None => return false,
        };

        let pattern = self.dog_pattern(dog_id);
        match redis::cmd("KEYS")
            .arg(&pattern)
            .query_async::<Vec<String>>(conn)
            .await
        {
            Ok(keys) if !keys.is_empty() => match conn.del::<_, ()>(&keys[..]).await {
                Ok(_) => {
                    debug!(subsystem = "cache", dog_id = %dog_id, removed = keys.len(), "Cache INVALIDATE");
                    true
                }
                Err(e) => {
                    error!(subsystem = "cache", error = %e, "Redis DEL error");
                    false
                }
            },
            Ok(_) => true,
            Err(e) => {
                error!(subsystem = "cache", error = %e, "Redis KEYS error");
                false
            }
        }
    }

    /// Invalidate history of both participants of each encounter.
    pub async fn invalidate_encounters(&self, encounters: &[Encounter]) {
        let mut dogs: Vec<Uuid> = encounters
            .iter()
            .flat_map(|e| [e.dog1_id, e.dog2_id])
            .collect();
        dogs.sort();
        dogs.dedup();
        for dog_id in dogs {
            self.invalidate_dog(dog_id).await;
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.inner.ttl_seconds)
    }
}
