use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::brain::BrainInsight;
use crate::case_studies::CaseStudy;
use crate::health::HealthMetrics;
use crate::model::{
    EventSummary, Incident, LearningEntry, PlanResult, PlannedAction, TestScenario,
    WeatherSummary, WorldStatus,
};
use crate::risk::RiskAssessment;
use crate::simulation::SimulationResult;
use crate::summary::DaySummary;
use crate::util::EpochMs;

/// Compact history point for sparklines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SparklinePoint {
    pub timestamp: EpochMs,
    pub avg_delay_minutes: f64,
}

/// `GET /health` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub world_status: WorldStatus,
    pub health: HealthMetrics,
    pub history: Vec<SparklinePoint>,
}

/// `GET /risk` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskResponse {
    pub ok: bool,
    pub risk: Option<RiskAssessment>,
}

/// `GET /summary/daily` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub ok: bool,
    pub summary: DaySummary,
}

/// `GET /incidents` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentsResponse {
    pub incidents: Vec<Incident>,
}

/// `GET /incidents/{id}` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentResponse {
    pub incident: Incident,
}

/// `GET /incidents/{id}/actions` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionsResponse {
    pub incident_id: String,
    pub actions: Vec<PlannedAction>,
}

/// `POST /incidents/{id}/plan` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResponse {
    pub incident_id: String,
    pub plan: PlanResult,
    pub actions_saved: usize,
}

/// `POST /agent/tick` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickResponse {
    pub ok: bool,
    pub world_status: WorldStatus,
    pub incident_created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions_planned: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// `POST /debug/trigger-disruption` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerResponse {
    pub ok: bool,
    pub world_status: WorldStatus,
}

/// Response for the debug incident-creation endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateIncidentResponse {
    pub message: String,
    pub incident: Incident,
}

/// `POST /debug/create-custom-incident` request. Numbers are accepted loosely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomIncidentRequest {
    #[serde(default)]
    pub route_id: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub segment_start_stop_id: Option<String>,
    #[serde(default)]
    pub segment_end_stop_id: Option<String>,
    #[serde(default)]
    pub avg_delay_minutes: Option<Value>,
    #[serde(default)]
    pub trips_impacted: Option<Value>,
    #[serde(default)]
    pub riders_estimated: Option<Value>,
}

/// Request sent to the incident-context flow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowContextRequest {
    #[serde(default)]
    pub route_id: Option<String>,
    #[serde(default)]
    pub segment_start_stop_id: Option<String>,
    #[serde(default)]
    pub segment_end_stop_id: Option<String>,
}

/// Incident context returned by the flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlowContext {
    pub route_id: String,
    pub avg_delay_minutes_live: f64,
    pub weather_summary: String,
    pub suggested_cause: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// `POST /simulate` request. Numbers are accepted loosely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulateRequest {
    #[serde(default)]
    pub delay_minutes: Option<Value>,
    #[serde(default)]
    pub riders_estimated: Option<Value>,
    #[serde(default)]
    pub duration_minutes: Option<Value>,
}

/// `POST /simulate` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulateResponse {
    pub ok: bool,
    pub result: SimulationResult,
}

/// `GET /context` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextResponse {
    pub ok: bool,
    pub weather: Option<WeatherSummary>,
    pub events: Vec<EventSummary>,
}

/// `GET /brain/insights` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrainInsightsResponse {
    pub ok: bool,
    pub insights: BrainInsight,
    pub external: crate::model::ExternalContext,
}

/// `GET /learning-log` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningLogResponse {
    pub ok: bool,
    pub entries: Vec<LearningEntry>,
}

/// `POST /learning-log` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLearningEntry {
    #[serde(default)]
    pub incident_id: Option<String>,
    #[serde(default)]
    pub route_id: Option<String>,
    pub summary: String,
    pub category: String,
}

/// `POST /learning-log` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningEntryResponse {
    pub ok: bool,
    pub entry: LearningEntry,
}

/// `GET /test-scenarios` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenariosResponse {
    pub ok: bool,
    pub scenarios: Vec<TestScenario>,
}

/// Scenario details echoed back after creating an incident from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioInfo {
    pub label: String,
    pub description: String,
    pub default_actions: Vec<String>,
}

/// `POST /test-scenarios/{id}/create-incident` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioIncidentResponse {
    pub ok: bool,
    pub incident: Incident,
    pub scenario_info: ScenarioInfo,
    pub plan: Option<PlanResult>,
}

/// `GET /case-studies/recommendations` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseStudiesResponse {
    pub ok: bool,
    pub cases: Vec<CaseStudy>,
}
