use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Default Anthropic model used for plan drafting.
pub const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";
/// Default Anthropic Messages endpoint.
pub const DEFAULT_ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub listen: SocketAddr,
    /// Catalogues and the learning log live here.
    pub data_dir: PathBuf,
    pub monitor_interval_seconds: u64,
    pub http_timeout: Duration,

    pub gtfs: GtfsConfig,
    pub planner: PlannerConfig,
    pub external: ExternalConfig,
}

#[derive(Debug, Clone)]
pub struct GtfsConfig {
    /// TripUpdates feed (JSON encoding). `None` disables live data.
    pub url: Option<String>,
    pub route_filter: Option<String>,
    pub segment_start_stop_id: String,
    pub segment_end_stop_id: String,
}

impl Default for GtfsConfig {
    fn default() -> Self {
        Self {
            url: None,
            route_filter: None,
            segment_start_stop_id: "stop-100".into(),
            segment_end_stop_id: "stop-120".into(),
        }
    }
}

#[derive(Clone)]
pub struct PlannerConfig {
    /// Planning is disabled without a key.
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    /// Incident-context flow; the daemon's own `/fake-flow` by default.
    pub flow_url: String,
}

// Keeps the API key out of the startup log.
impl std::fmt::Debug for PlannerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlannerConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("flow_url", &self.flow_url)
            .finish()
    }
}

#[derive(Clone, Default)]
pub struct ExternalConfig {
    pub weather_url: Option<String>,
    pub weather_key: Option<String>,
    pub events_url: Option<String>,
    pub events_key: Option<String>,
}

impl std::fmt::Debug for ExternalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalConfig")
            .field("weather_url", &self.weather_url)
            .field("events_url", &self.events_url)
            .finish_non_exhaustive()
    }
}

impl DaemonConfig {
    /// Offline configuration: no feed, no planner key, no external APIs.
    pub fn offline(data_dir: PathBuf) -> Self {
        let listen: SocketAddr = ([127, 0, 0, 1], 3000).into();
        Self {
            listen,
            data_dir,
            monitor_interval_seconds: 30,
            http_timeout: Duration::from_secs(10),
            gtfs: GtfsConfig::default(),
            planner: PlannerConfig {
                api_key: None,
                api_url: DEFAULT_ANTHROPIC_URL.into(),
                model: DEFAULT_MODEL.into(),
                flow_url: format!("http://{listen}/fake-flow"),
            },
            external: ExternalConfig::default(),
        }
    }
}
