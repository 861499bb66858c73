use serde::{Deserialize, Serialize};

use crate::model::Snapshot;

/// Delay at or above which a snapshot is counted as an incident.
pub const INCIDENT_DELAY_MINUTES: f64 = 5.0;

/// Coarse rollup over the whole retained history.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DaySummary {
    /// Number of snapshots at or above [`INCIDENT_DELAY_MINUTES`]. A long
    /// disruption is counted once per snapshot.
    pub total_incidents: u32,
    pub avg_delay: f64,
    pub max_delay: f64,
    pub total_rider_delay_minutes: f64,
}

/// Summarizes the history. Empty history yields all zeros.
pub fn summarize_day(history: &[Snapshot]) -> DaySummary {
    if history.is_empty() {
        return DaySummary::default();
    }

    let delays: Vec<f64> = history.iter().map(Snapshot::delay).collect();
    let avg_delay = delays.iter().sum::<f64>() / delays.len() as f64;
    let max_delay = delays.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let total_rider_delay_minutes = history.iter().map(Snapshot::rider_delay_minutes).sum();
    let total_incidents = delays.iter().filter(|&&d| d >= INCIDENT_DELAY_MINUTES).count() as u32;

    DaySummary {
        total_incidents,
        avg_delay,
        max_delay,
        total_rider_delay_minutes,
    }
}
