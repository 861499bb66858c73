//! Source of corridor readings: the live feed when it has something to say,
//! otherwise a small simulated corridor.

use pulseops_core::model::{SnapshotSource, WorldStatus};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::gtfs::GtfsFeed;

/// Delay (minutes) applied by a manual disruption.
pub const DISRUPTION_DELAY_MINUTES: f64 = 15.0;

/// Simulated corridor on route 10 between S2 and S3.
#[derive(Debug, Default)]
pub struct SimulatedWorld {
    delay_minutes: f64,
}

impl SimulatedWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delay_minutes(&self) -> f64 {
        self.delay_minutes
    }

    pub fn trigger_disruption(&mut self) {
        self.delay_minutes = DISRUPTION_DELAY_MINUTES;
        info!(delay_minutes = self.delay_minutes, "disruption triggered");
    }

    /// Recovers one minute of delay, never going below zero.
    pub fn decay(&mut self) {
        if self.delay_minutes > 0.0 {
            self.delay_minutes = (self.delay_minutes - 1.0).max(0.0);
            debug!(delay_minutes = self.delay_minutes, "delay decaying");
        }
    }

    pub fn status(&self) -> WorldStatus {
        let disrupted = self.delay_minutes > 0.0;
        WorldStatus {
            route_id: "10".into(),
            segment_start_stop_id: "S2".into(),
            segment_end_stop_id: "S3".into(),
            avg_delay_minutes: self.delay_minutes,
            trips_impacted: if disrupted { 3 } else { 0 },
            riders_estimated: if disrupted { 90 } else { 0 },
            source: SnapshotSource::Simulated,
        }
    }
}

pub struct WorldProvider {
    sim: Mutex<SimulatedWorld>,
    feed: Option<GtfsFeed>,
}

impl WorldProvider {
    pub fn new(feed: Option<GtfsFeed>) -> Self {
        Self {
            sim: Mutex::new(SimulatedWorld::new()),
            feed,
        }
    }

    /// Live status if the feed is configured, reachable and shows delay;
    /// the simulated corridor otherwise.
    pub async fn current_status(&self) -> WorldStatus {
        if let Some(feed) = &self.feed {
            match feed.fetch_status().await {
                Ok(Some(status)) => {
                    debug!(
                        avg_delay_minutes = status.avg_delay_minutes,
                        trips_impacted = status.trips_impacted,
                        "live world status"
                    );
                    return status;
                }
                Ok(None) => debug!("feed shows no delays; using simulation"),
                Err(e) => warn!(error = %e, "live feed failed; using simulation"),
            }
        }
        self.sim.lock().await.status()
    }

    pub async fn trigger_disruption(&self) {
        self.sim.lock().await.trigger_disruption();
    }

    pub async fn decay(&self) {
        self.sim.lock().await.decay();
    }
}
