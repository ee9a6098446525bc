//! Server configuration loaded from the environment.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `DATABASE_URL` | `postgres://localhost/doggyclub` | PostgreSQL connection string |
//! | `HOST` | `0.0.0.0` | Bind address |
//! | `PORT` | `9090` | Bind port |
//! | `ENCOUNTER_DETECTION_ENABLED` | `true` | Serve the detect/bluetooth endpoints |
//! | `MAX_BODY_BYTES` | `65536` | Request body limit |
//! | `ALLOWED_ORIGINS` | `http://localhost:3000` | Comma-separated CORS origins |
//!
//! Redis and sweeper settings are read by their own services.

use axum::http::HeaderValue;
use doggyclub_core::defaults;

const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000";

/// Top-level HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// When false, detection endpoints answer 403.
    pub encounter_detection_enabled: bool,
    pub max_body_bytes: usize,
    pub allowed_origins: Vec<HeaderValue>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/doggyclub".to_string(),
            host: "0.0.0.0".to_string(),
            port: defaults::SERVER_PORT,
            encounter_detection_enabled: true,
            max_body_bytes: defaults::MAX_BODY_BYTES,
            allowed_origins: parse_allowed_origins(DEFAULT_ALLOWED_ORIGINS),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables (with defaults).
    pub fn from_env() -> Self {
        let base = Self::default();

        let database_url = std::env::var("DATABASE_URL").unwrap_or(base.database_url);
        let host = std::env::var("HOST").unwrap_or(base.host);
        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(base.port);
        let encounter_detection_enabled = std::env::var("ENCOUNTER_DETECTION_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);
        let max_body_bytes = std::env::var("MAX_BODY_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(base.max_body_bytes);
        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .map(|v| parse_allowed_origins(&v))
            .unwrap_or(base.allowed_origins);

        Self {
            database_url,
            host,
            port,
            encounter_detection_enabled,
            max_body_bytes,
            allowed_origins,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parse a comma-separated CORS origin list.
///
/// Invalid entries are dropped with a warning; an empty list falls back to
/// the development default.
pub fn parse_allowed_origins(origins: &str) -> Vec<HeaderValue> {
    let parsed: Vec<HeaderValue> = origins
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect();

    if parsed.is_empty() {
        return vec![HeaderValue::from_static(DEFAULT_ALLOWED_ORIGINS)];
    }
    parsed
}
