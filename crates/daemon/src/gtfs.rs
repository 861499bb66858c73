//! GTFS-Realtime TripUpdates adapter.
//!
//! Reads the JSON encoding of the feed (as served by most agencies' enhanced
//! endpoints) and folds it into a single corridor [`WorldStatus`].

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use pulseops_core::model::{SnapshotSource, WorldStatus};
use pulseops_core::round_to_tenth;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::GtfsConfig;

/// Riders assumed aboard each delayed trip.
pub const RIDERS_PER_TRIP: i64 = 30;

#[derive(Debug, Default, Deserialize)]
pub struct FeedMessage {
    #[serde(default)]
    pub entity: Vec<FeedEntity>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FeedEntity {
    #[serde(default)]
    pub id: String,
    #[serde(default, alias = "tripUpdate")]
    pub trip_update: Option<TripUpdate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TripUpdate {
    #[serde(default)]
    pub trip: TripDescriptor,
    #[serde(default, alias = "stopTimeUpdate")]
    pub stop_time_update: Vec<StopTimeUpdate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TripDescriptor {
    #[serde(default, alias = "tripId")]
    pub trip_id: Option<String>,
    #[serde(default, alias = "routeId")]
    pub route_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StopTimeUpdate {
    #[serde(default)]
    pub arrival: Option<StopTimeEvent>,
    #[serde(default)]
    pub departure: Option<StopTimeEvent>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StopTimeEvent {
    /// Seconds; negative means early.
    #[serde(default)]
    pub delay: Option<i64>,
}

impl StopTimeUpdate {
    /// Arrival delay if present, else departure delay, never negative.
    fn delay_secs(&self) -> i64 {
        self.arrival
            .as_ref()
            .and_then(|e| e.delay)
            .or_else(|| self.departure.as_ref().and_then(|e| e.delay))
            .unwrap_or(0)
            .max(0)
    }
}

/// Folds a feed into a corridor status. `None` when no trip is delayed.
pub fn aggregate_feed(feed: &FeedMessage, cfg: &GtfsConfig) -> Option<WorldStatus> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut total_delay_secs: i64 = 0;
    let mut delayed_trips: i64 = 0;

    for entity in &feed.entity {
        let Some(update) = &entity.trip_update else {
            continue;
        };

        if let (Some(filter), Some(route)) = (&cfg.route_filter, &update.trip.route_id) {
            if route != filter {
                continue;
            }
        }

        let trip_id = update
            .trip
            .trip_id
            .clone()
            .unwrap_or_else(|| format!("unknown-{}", entity.id));
        if seen.contains(&trip_id) {
            continue;
        }

        let trip_delay: i64 = update.stop_time_update.iter().map(StopTimeUpdate::delay_secs).sum();
        if trip_delay > 0 {
            total_delay_secs += trip_delay;
            delayed_trips += 1;
            seen.insert(trip_id);
        }
    }

    if delayed_trips == 0 {
        return None;
    }

    let avg_delay_minutes = round_to_tenth(total_delay_secs as f64 / delayed_trips as f64 / 60.0);
    Some(WorldStatus {
        route_id: cfg.route_filter.clone().unwrap_or_else(|| "gtfs-route".into()),
        segment_start_stop_id: cfg.segment_start_stop_id.clone(),
        segment_end_stop_id: cfg.segment_end_stop_id.clone(),
        avg_delay_minutes,
        trips_impacted: delayed_trips,
        riders_estimated: delayed_trips * RIDERS_PER_TRIP,
        source: SnapshotSource::GtfsRealtime,
    })
}

/// HTTP client for one configured feed.
#[derive(Clone)]
pub struct GtfsFeed {
    client: Client,
    url: String,
    config: GtfsConfig,
    timeout: Duration,
}

impl GtfsFeed {
    /// `None` when no feed URL is configured.
    pub fn from_config(client: Client, config: &GtfsConfig, timeout: Duration) -> Option<Self> {
        let url = config.url.clone().filter(|u| !u.is_empty())?;
        Some(Self {
            client,
            url,
            config: config.clone(),
            timeout,
        })
    }

    /// Fetches and aggregates the feed.
    pub async fn fetch_status(&self) -> Result<Option<WorldStatus>> {
        let feed = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await
            .context("gtfs-rt request")?
            .error_for_status()
            .context("gtfs-rt status")?
            .json::<FeedMessage>()
            .await
            .context("gtfs-rt decode")?;

        debug!(entities = feed.entity.len(), "gtfs-rt feed fetched");
        Ok(aggregate_feed(&feed, &self.config))
    }
}
