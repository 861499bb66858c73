use chrono::{Local, Utc};
use pulseops_core::{
    api::{
        BrainInsightsResponse, HealthResponse, SparklinePoint, TickResponse,
    },
    case_studies::{find_relevant_case_studies, CaseStudy, CaseStudyQuery},
    compute_health_metrics, compute_risk_for_route,
    incidents::{
        incident_from_status, live_incident_severity, simulated_incident_severity,
    },
    model::{DataSource, Incident, PlanResult, PlannedAction, Snapshot, WorldStatus},
    new_ulid, summarize_day, DaySummary, History, RiskAssessment,
};
use reqwest::Client;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::config::DaemonConfig;
use crate::external::ExternalData;
use crate::gtfs::GtfsFeed;
use crate::learning_log::LearningLog;
use crate::planner::{Planner, PlannerError};
use crate::store::IncidentStore;
use crate::world::WorldProvider;

/// Fresh incident id.
pub fn new_incident_id() -> String {
    format!("incident-{}", new_ulid())
}

/// Current time as an RFC 3339 string.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// Control-center logic shared by the HTTP layer and the monitor loop.
pub struct PulseOpsService {
    history: Mutex<History>,
    world: WorldProvider,
    store: IncidentStore,
    planner: Option<Planner>,
    external: ExternalData,
    catalog: Catalog,
    learning_log: LearningLog,
}

impl PulseOpsService {
    pub async fn new(config: &DaemonConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("pulseops/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let feed = GtfsFeed::from_config(client.clone(), &config.gtfs, config.http_timeout);
        let planner = Planner::from_config(client.clone(), &config.planner);
        if planner.is_none() {
            warn!("no planner API key; incident planning is disabled");
        }

        Ok(Self {
            history: Mutex::new(History::new()),
            world: WorldProvider::new(feed),
            store: IncidentStore::new(),
            planner,
            external: ExternalData::new(client, &config.external, config.http_timeout),
            catalog: Catalog::load(&config.data_dir).await,
            learning_log: LearningLog::new(&config.data_dir),
        })
    }

    pub fn store(&self) -> &IncidentStore {
        &self.store
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn learning_log(&self) -> &LearningLog {
        &self.learning_log
    }

    pub fn external(&self) -> &ExternalData {
        &self.external
    }

    pub fn planner_configured(&self) -> bool {
        self.planner.is_some()
    }

    pub async fn current_status(&self) -> WorldStatus {
        self.world.current_status().await
    }

    pub async fn record(&self, status: WorldStatus) {
        self.history.lock().await.record(status);
    }

    /// Snapshot copy of the rolling window.
    pub async fn history(&self) -> Vec<Snapshot> {
        self.history.lock().await.snapshots()
    }

    /// Fetches and records a reading, then scores the window.
    pub async fn health(&self) -> HealthResponse {
        let latest = self.current_status().await;
        self.record(latest.clone()).await;

        let history = self.history().await;
        let health = compute_health_metrics(&history);
        let sparkline = history
            .iter()
            .map(|s| SparklinePoint {
                timestamp: s.timestamp,
                avg_delay_minutes: s.delay(),
            })
            .collect();

        HealthResponse {
            ok: true,
            world_status: latest,
            health,
            history: sparkline,
        }
    }

    pub async fn risk(&self) -> Option<RiskAssessment> {
        compute_risk_for_route(&self.history().await)
    }

    pub async fn daily_summary(&self) -> DaySummary {
        summarize_day(&self.history().await)
    }

    pub async fn trigger_disruption(&self) -> WorldStatus {
        self.world.trigger_disruption().await;
        self.current_status().await
    }

    /// Plans `incident` and stores the resulting actions.
    pub async fn plan_incident(&self, incident: &Incident) -> Result<PlanResult, PlannerError> {
        let planner = self.planner.as_ref().ok_or(PlannerError::NotConfigured)?;
        let mut plan = planner.plan(incident, &self.catalog.case_studies).await?;
        let saved: Vec<PlannedAction> = self
            .store
            .add_actions_for_incident(&incident.id, plan.actions.clone())
            .await;
        info!(incident_id = %incident.id, actions = saved.len(), "actions saved");
        plan.actions = saved;
        Ok(plan)
    }

    /// One step of the simulated control loop: decay, observe, record, and
    /// open and plan an incident when the corridor is badly delayed.
    pub async fn tick(&self) -> anyhow::Result<TickResponse> {
        self.world.decay().await;
        let status = self.current_status().await;
        self.record(status.clone()).await;
        info!(
            avg_delay_minutes = status.avg_delay_minutes,
            source = ?status.source,
            "agent tick"
        );

        let mut resp = TickResponse {
            ok: true,
            world_status: status.clone(),
            incident_created: None,
            actions_planned: None,
            warning: None,
        };

        let Some(severity) = simulated_incident_severity(&status) else {
            return Ok(resp);
        };
        let segment = (
            status.segment_start_stop_id.as_str(),
            status.segment_end_stop_id.as_str(),
        );
        if self
            .store
            .find_open_incident(&status.route_id, Some(segment))
            .await
            .is_some()
        {
            return Ok(resp);
        }
        if !self.planner_configured() {
            warn!("skipping incident creation; planner not configured");
            resp.warning = Some("planner not configured".into());
            return Ok(resp);
        }

        let incident = incident_from_status(
            new_incident_id(),
            now_rfc3339(),
            &status,
            severity,
            DataSource::Simulated,
        );
        let incident = self.store.create_incident(incident).await;
        info!(incident_id = %incident.id, ?severity, "incident auto-created");

        let plan = self.plan_incident(&incident).await?;
        resp.incident_created = Some(incident.id);
        resp.actions_planned = Some(plan.actions.len());
        Ok(resp)
    }

    /// Background monitor step: observe, record, and open an incident from
    /// live data when delays are significant. Returns the created incident.
    pub async fn monitor_tick(&self) -> Option<Incident> {
        let status = self.current_status().await;
        self.record(status.clone()).await;
        self.apply_live_policy(&status).await
    }

    pub async fn apply_live_policy(&self, status: &WorldStatus) -> Option<Incident> {
        let severity = live_incident_severity(status)?;
        if let Some(existing) = self.store.find_open_live_incident(&status.route_id).await {
            info!(incident_id = %existing.id, "live incident already open");
            return None;
        }

        let incident = incident_from_status(
            new_incident_id(),
            now_rfc3339(),
            status,
            severity,
            DataSource::GtfsRealtime,
        );
        info!(
            incident_id = %incident.id,
            route_id = %status.route_id,
            ?severity,
            "incident opened from live data"
        );
        Some(self.store.create_incident(incident).await)
    }

    /// Case studies relevant to the corridor right now.
    pub async fn recommended_case_studies(&self) -> Vec<CaseStudy> {
        let status = self.current_status().await;
        let query = CaseStudyQuery::for_route(&status.route_id, &Local::now());
        find_relevant_case_studies(&self.catalog.case_studies, &query)
    }

    pub async fn brain_insights(&self) -> BrainInsightsResponse {
        let history = self.history().await;
        let external = self.external.context().await;
        let insights = self.catalog.brain.analyze(&history, Some(&external));
        BrainInsightsResponse {
            ok: true,
            insights,
            external,
        }
    }
}
