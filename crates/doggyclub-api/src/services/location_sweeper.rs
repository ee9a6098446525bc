//! Background task that purges stale device locations on an interval.

use std::time::Duration;

use chrono::TimeDelta;
use doggyclub_core::{defaults, EncounterService, Error, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Configuration for the location sweeper.
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    pub enabled: bool,
    /// Locations not updated within this period are deleted.
    pub retention: TimeDelta,
    /// Time between sweeps. The first sweep runs at startup.
    pub interval: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            retention: TimeDelta::hours(defaults::LOCATION_RETENTION_HOURS),
            interval: Duration::from_secs(defaults::LOCATION_SWEEP_INTERVAL_SECS),
        }
    }
}

impl SweeperConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `LOCATION_SWEEPER_ENABLED` | `true` | Run the sweeper |
    /// | `LOCATION_RETENTION_HOURS` | `24` | Age after which locations are deleted |
    /// | `LOCATION_SWEEP_INTERVAL_SECS` | `3600` | Seconds between sweeps |
    pub fn from_env() -> Self {
        let enabled = std::env::var("LOCATION_SWEEPER_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let retention_hours = std::env::var("LOCATION_RETENTION_HOURS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|h| *h > 0)
            .unwrap_or(defaults::LOCATION_RETENTION_HOURS);

        let interval_secs = std::env::var("LOCATION_SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::LOCATION_SWEEP_INTERVAL_SECS)
            .max(1);

        Self {
            enabled,
            retention: TimeDelta::hours(retention_hours),
            interval: Duration::from_secs(interval_secs),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Handle to a running sweeper.
pub struct SweeperHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signal the sweeper to stop and wait for it to exit.
    pub async fn shutdown(self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| Error::Internal("Failed to send shutdown signal".into()))?;
        self.task
            .await
            .map_err(|e| Error::Internal(format!("Sweeper task failed: {}", e)))
    }
}

/// Periodic caller of [`EncounterService::cleanup`].
pub struct LocationSweeper {
    service: EncounterService,
    config: SweeperConfig,
}

impl LocationSweeper {
    pub fn new(service: EncounterService, config: SweeperConfig) -> Self {
        Self { service, config }
    }

    /// Spawn the sweep loop. Returns `None` when disabled.
    pub fn start(self) -> Option<SweeperHandle> {
        if !self.config.enabled {
            info!(subsystem = "sweeper", "Location sweeper is disabled, not starting");
            return None;
        }

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let task = tokio::spawn(async move {
            self.run(&mut shutdown_rx).await;
        });
        Some(SweeperHandle { shutdown_tx, task })
    }

    async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>) {
        info!(
            subsystem = "sweeper",
            retention_hours = self.config.retention.num_hours(),
            interval_secs = self.config.interval.as_secs(),
            "Location sweeper started"
        );

        let mut ticker = tokio::time::interval(self.config.interval);
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!(subsystem = "sweeper", "Location sweeper received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.service.cleanup(self.config.retention).await {
                        error!(subsystem = "sweeper", error = %e, "Location sweep failed");
                    }
                }
            }
        }
    }
}
