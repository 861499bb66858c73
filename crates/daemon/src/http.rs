use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use pulseops_core::{
    api::{
        ActionsResponse, BrainInsightsResponse, CaseStudiesResponse, ContextResponse,
        CreateIncidentResponse, CustomIncidentRequest, FlowContext, FlowContextRequest,
        HealthResponse, IncidentResponse, IncidentsResponse, LearningEntryResponse,
        LearningLogResponse, NewLearningEntry, PlanResponse, RiskResponse, ScenarioIncidentResponse,
        ScenarioInfo, ScenariosResponse, SimulateRequest, SimulateResponse, SummaryResponse,
        TickResponse, TriggerResponse,
    },
    incidents::{custom_incident, demo_incident, scenario_incident},
    simulation::{simulate_impact, SimulationInput},
    validation::{coerce_number, validate_custom_incident, ValidationError},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::planner::PlannerError;
use crate::service::{new_incident_id, now_rfc3339, PulseOpsService};

/// Entries returned by `GET /learning-log`.
const LEARNING_LOG_LIMIT: usize = 30;

#[derive(Clone)]
pub struct AppState {
    svc: Arc<PulseOpsService>,
}

pub fn router(svc: Arc<PulseOpsService>) -> Router {
    let state = AppState { svc };
    Router::new()
        .route("/healthz", get(healthz))
        .route("/health", get(health))
        .route("/risk", get(risk))
        .route("/summary/daily", get(summary_daily))
        .route("/incidents", get(list_incidents))
        .route("/incidents/{id}", get(get_incident))
        .route("/incidents/{id}/actions", get(incident_actions))
        .route("/incidents/{id}/plan", post(plan_incident))
        .route("/agent/tick", post(agent_tick))
        .route("/debug/trigger-disruption", post(trigger_disruption))
        .route("/debug/create-incident", post(create_demo_incident))
        .route("/debug/create-custom-incident", post(create_custom_incident))
        .route("/fake-flow", post(fake_flow))
        .route("/simulate", post(simulate))
        .route("/context", get(context))
        .route("/brain/insights", get(brain_insights))
        .route("/learning-log", get(learning_log).post(add_learning_entry))
        .route("/test-scenarios", get(test_scenarios))
        .route("/test-scenarios/{id}/create-incident", post(create_scenario_incident))
        .route("/case-studies/recommendations", get(case_study_recommendations))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn health(State(st): State<AppState>) -> Json<HealthResponse> {
    Json(st.svc.health().await)
}

async fn risk(State(st): State<AppState>) -> Json<RiskResponse> {
    Json(RiskResponse {
        ok: true,
        risk: st.svc.risk().await,
    })
}

async fn summary_daily(State(st): State<AppState>) -> Json<SummaryResponse> {
    Json(SummaryResponse {
        ok: true,
        summary: st.svc.daily_summary().await,
    })
}

async fn list_incidents(State(st): State<AppState>) -> Json<IncidentsResponse> {
    Json(IncidentsResponse {
        incidents: st.svc.store().list_incidents().await,
    })
}

async fn get_incident(
    State(st): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<IncidentResponse>, AppError> {
    let incident = st
        .svc
        .store()
        .get_incident(&id)
        .await
        .ok_or_else(|| AppError::not_found("incident not found"))?;
    Ok(Json(IncidentResponse { incident }))
}

async fn incident_actions(
    State(st): State<AppState>,
    Path(id): Path<String>,
) -> Json<ActionsResponse> {
    let actions = st.svc.store().actions_for_incident(&id).await;
    Json(ActionsResponse {
        incident_id: id,
        actions,
    })
}

async fn plan_incident(
    State(st): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PlanResponse>, AppError> {
    let incident = st
        .svc
        .store()
        .get_incident(&id)
        .await
        .ok_or_else(|| AppError::not_found("incident not found"))?;
    let plan = st.svc.plan_incident(&incident).await?;
    Ok(Json(PlanResponse {
        incident_id: incident.id,
        actions_saved: plan.actions.len(),
        plan,
    }))
}

async fn agent_tick(State(st): State<AppState>) -> Result<Json<TickResponse>, AppError> {
    Ok(Json(st.svc.tick().await?))
}

async fn trigger_disruption(State(st): State<AppState>) -> Json<TriggerResponse> {
    let world_status = st.svc.trigger_disruption().await;
    info!("disruption triggered via API");
    Json(TriggerResponse {
        ok: true,
        world_status,
    })
}

async fn create_demo_incident(State(st): State<AppState>) -> Json<CreateIncidentResponse> {
    let incident = st
        .svc
        .store()
        .create_incident(demo_incident(new_incident_id(), now_rfc3339()))
        .await;
    info!(incident_id = %incident.id, "demo incident created");
    Json(CreateIncidentResponse {
        message: "Fake incident created".into(),
        incident,
    })
}

async fn create_custom_incident(
    State(st): State<AppState>,
    Json(req): Json<CustomIncidentRequest>,
) -> Result<Json<CreateIncidentResponse>, AppError> {
    let input = validate_custom_incident(req)?;
    let incident = st
        .svc
        .store()
        .create_incident(custom_incident(new_incident_id(), now_rfc3339(), input))
        .await;
    info!(
        incident_id = %incident.id,
        avg_delay_minutes = incident.avg_delay_minutes,
        "custom incident created"
    );
    Ok(Json(CreateIncidentResponse {
        message: "Custom incident created".into(),
        incident,
    }))
}

/// Stand-in for the external incident-context flow.
async fn fake_flow(Json(req): Json<FlowContextRequest>) -> Json<FlowContext> {
    Json(FlowContext {
        route_id: req.route_id.unwrap_or_else(|| "10".into()),
        avg_delay_minutes_live: 18.0,
        weather_summary: "heavy rain".into(),
        suggested_cause: "WEATHER".into(),
        timestamp: Some(now_rfc3339()),
    })
}

async fn simulate(Json(req): Json<SimulateRequest>) -> Json<SimulateResponse> {
    let num = |v: &Option<serde_json::Value>| v.as_ref().and_then(coerce_number).unwrap_or(0.0);
    let result = simulate_impact(SimulationInput {
        delay_minutes: num(&req.delay_minutes),
        riders_estimated: num(&req.riders_estimated),
        duration_minutes: num(&req.duration_minutes),
    });
    Json(SimulateResponse { ok: true, result })
}

async fn context(State(st): State<AppState>) -> Json<ContextResponse> {
    let ctx = st.svc.external().context().await;
    Json(ContextResponse {
        ok: true,
        weather: ctx.weather,
        events: ctx.events,
    })
}

async fn brain_insights(State(st): State<AppState>) -> Json<BrainInsightsResponse> {
    Json(st.svc.brain_insights().await)
}

async fn learning_log(State(st): State<AppState>) -> Json<LearningLogResponse> {
    Json(LearningLogResponse {
        ok: true,
        entries: st.svc.learning_log().recent(LEARNING_LOG_LIMIT).await,
    })
}

async fn add_learning_entry(
    State(st): State<AppState>,
    Json(req): Json<NewLearningEntry>,
) -> Result<(StatusCode, Json<LearningEntryResponse>), AppError> {
    if req.summary.trim().is_empty() {
        return Err(AppError::bad_request("summary must not be empty"));
    }
    let entry = st.svc.learning_log().add(req).await;
    Ok((StatusCode::CREATED, Json(LearningEntryResponse { ok: true, entry })))
}

async fn test_scenarios(State(st): State<AppState>) -> Json<ScenariosResponse> {
    Json(ScenariosResponse {
        ok: true,
        scenarios: st.svc.catalog().scenarios.clone(),
    })
}

async fn create_scenario_incident(
    State(st): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<ScenarioIncidentResponse>), AppError> {
    let scenario = st
        .svc
        .catalog()
        .scenario(&id)
        .ok_or_else(|| AppError::not_found("scenario not found"))?;

    let incident = st
        .svc
        .store()
        .create_incident(scenario_incident(new_incident_id(), now_rfc3339(), scenario))
        .await;
    info!(incident_id = %incident.id, scenario = %scenario.label, "scenario incident created");

    let plan = if st.svc.planner_configured() {
        match st.svc.plan_incident(&incident).await {
            Ok(plan) => Some(plan),
            Err(e) => {
                warn!(error = %e, incident_id = %incident.id, "auto-plan failed");
                None
            }
        }
    } else {
        None
    };

    Ok((
        StatusCode::CREATED,
        Json(ScenarioIncidentResponse {
            ok: true,
            incident,
            scenario_info: ScenarioInfo {
                label: scenario.label.clone(),
                description: scenario.short_description.clone(),
                default_actions: scenario.default_actions.clone(),
            },
            plan,
        }),
    ))
}

async fn case_study_recommendations(State(st): State<AppState>) -> Json<CaseStudiesResponse> {
    Json(CaseStudiesResponse {
        ok: true,
        cases: st.svc.recommended_case_studies().await,
    })
}

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    fn not_found(msg: &'static str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: anyhow::anyhow!(msg),
        }
    }

    fn bad_request(msg: &'static str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: anyhow::anyhow!(msg),
        }
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(value: E) -> Self {
        let error: anyhow::Error = value.into();
        let status = if error.downcast_ref::<ValidationError>().is_some() {
            StatusCode::BAD_REQUEST
        } else if matches!(error.downcast_ref::<PlannerError>(), Some(PlannerError::NotConfigured)) {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self { status, error }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(error = %format!("{:#}", self.error), "request failed");
        }
        let body = Json(serde_json::json!({
            "ok": false,
            "error": self.error.to_string()
        }));
        (self.status, body).into_response()
    }
}
