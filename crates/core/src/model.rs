use serde::{Deserialize, Serialize};

use crate::util::EpochMs;

/// Where a world status reading came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotSource {
    /// Derived from a live GTFS-Realtime feed.
    GtfsRealtime,
    /// Produced by the in-process simulated corridor.
    Simulated,
}

/// Point-in-time condition of the monitored corridor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorldStatus {
    pub route_id: String,
    pub segment_start_stop_id: String,
    pub segment_end_stop_id: String,
    pub avg_delay_minutes: f64,
    pub trips_impacted: i64,
    pub riders_estimated: i64,
    pub source: SnapshotSource,
}

/// A world status stamped with its capture time. Never mutated once recorded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    #[serde(flatten)]
    pub status: WorldStatus,
    /// Capture instant (ms).
    pub timestamp: EpochMs,
}

impl Snapshot {
    /// Stamps `status` with `timestamp`.
    pub fn new(status: WorldStatus, timestamp: EpochMs) -> Self {
        Self { status, timestamp }
    }

    /// Average delay in minutes.
    pub fn delay(&self) -> f64 {
        self.status.avg_delay_minutes
    }

    /// Delay × riders with both factors clamped at zero.
    pub fn rider_delay_minutes(&self) -> f64 {
        let delay = self.status.avg_delay_minutes.max(0.0);
        let riders = self.status.riders_estimated.max(0) as f64;
        delay * riders
    }
}

/// Lifecycle state of an incident.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    Open,
    Monitoring,
    Resolved,
}

/// Incident severity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Minor,
    Moderate,
    Major,
}

/// Incident kind. Only corridor blockages exist today.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum IncidentType {
    #[default]
    CorridorBlockage,
}

/// Origin of the data that opened an incident.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    GtfsRealtime,
    Simulated,
    AutoRealtime,
}

impl DataSource {
    /// True for incidents opened from live feed data.
    pub fn is_live(self) -> bool {
        matches!(self, Self::GtfsRealtime | Self::AutoRealtime)
    }
}

impl From<SnapshotSource> for DataSource {
    fn from(value: SnapshotSource) -> Self {
        match value {
            SnapshotSource::GtfsRealtime => Self::GtfsRealtime,
            SnapshotSource::Simulated => Self::Simulated,
        }
    }
}

/// A disruption being handled by the control center.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Incident {
    pub id: String,
    pub status: IncidentStatus,
    pub severity: Severity,
    #[serde(rename = "type", default)]
    pub kind: IncidentType,
    pub route_ids: Vec<String>,
    pub segment_start_stop_id: String,
    pub segment_end_stop_id: String,
    /// RFC 3339 start time.
    pub start_time: String,
    pub avg_delay_minutes: f64,
    pub trips_impacted: i64,
    pub riders_estimated: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<DataSource>,
}

impl Incident {
    /// True when the incident is open on `route_id`.
    pub fn is_open_on_route(&self, route_id: &str) -> bool {
        self.status == IncidentStatus::Open && self.route_ids.iter().any(|r| r == route_id)
    }

    /// First affected route, if any.
    pub fn primary_route(&self) -> Option<&str> {
        self.route_ids.first().map(String::as_str)
    }
}

/// Partial incident update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncidentPatch {
    #[serde(default)]
    pub status: Option<IncidentStatus>,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub avg_delay_minutes: Option<f64>,
    #[serde(default)]
    pub trips_impacted: Option<i64>,
    #[serde(default)]
    pub riders_estimated: Option<i64>,
}

impl IncidentPatch {
    /// Applies the set fields to `incident`.
    pub fn apply(self, incident: &mut Incident) {
        if let Some(v) = self.status {
            incident.status = v;
        }
        if let Some(v) = self.severity {
            incident.severity = v;
        }
        if let Some(v) = self.avg_delay_minutes {
            incident.avg_delay_minutes = v;
        }
        if let Some(v) = self.trips_impacted {
            incident.trips_impacted = v;
        }
        if let Some(v) = self.riders_estimated {
            incident.riders_estimated = v;
        }
    }
}

/// Kind of operational response.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    AlertOnly,
    Detour,
    Shuttle,
}

/// One drafted response action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlannedAction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident_id: Option<String>,
    pub category: ActionCategory,
    pub summary: String,
    pub rider_alert_header: String,
    pub rider_alert_body: String,
    pub ops_script: String,
    pub social_post: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Planner output: ranked actions plus the model's reasoning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanResult {
    pub actions: Vec<PlannedAction>,
    pub reasoning: String,
}

/// Weather intensity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    None,
    Light,
    #[default]
    Moderate,
    Heavy,
}

/// Current weather near the corridor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherSummary {
    pub condition: String,
    pub intensity: Intensity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_c: Option<f64>,
}

/// An upcoming event that may load the network.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventSummary {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_attendance: Option<i64>,
    /// 0–1.
    pub relevance_score: f64,
}

/// Weather and events around the corridor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExternalContext {
    pub weather: Option<WeatherSummary>,
    pub events: Vec<EventSummary>,
}

/// A lesson recorded by operators or the copilot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LearningEntry {
    pub id: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_id: Option<String>,
    pub summary: String,
    /// e.g. `threshold_adjustment`, `pattern_detected`, `playbook_feedback`.
    pub category: String,
}

/// Pre-canned incident used for demos and manual testing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestScenario {
    pub id: String,
    pub label: String,
    pub short_description: String,
    pub mode: String,
    pub route_id: String,
    pub segment_start_stop_id: String,
    pub segment_end_stop_id: String,
    pub severity: Severity,
    pub reason: String,
    pub expected_delay_minutes: f64,
    pub riders_estimated: i64,
    #[serde(default)]
    pub default_actions: Vec<String>,
}

impl TestScenario {
    /// Trips impacted implied by ridership (30 riders per trip, rounded up).
    pub fn trips_impacted(&self) -> i64 {
        (self.riders_estimated.max(0) + 29) / 30
    }
}
