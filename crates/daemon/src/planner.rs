//! Response-plan drafting through the Anthropic Messages API.

use std::time::Duration;

use chrono::{DateTime, Local};
use pulseops_core::api::{FlowContext, FlowContextRequest};
use pulseops_core::case_studies::{find_relevant_case_studies, CaseStudy, CaseStudyQuery};
use pulseops_core::model::{Incident, PlanResult};
use pulseops_core::plan::{parse_plan_response, PlanParseError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::PlannerConfig;

const MAX_TOKENS: u32 = 2048;
const ANTHROPIC_VERSION: &str = "2023-06-01";
const FLOW_TIMEOUT: Duration = Duration::from_secs(5);
const PLAN_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_CASE_STUDIES: usize = 5;

const SYSTEM_PROMPT: &str = r#"You are PulseOps, an incident command assistant for a public transit control center.
Review live disruptions, decide on the best operational responses, and draft clear
communications for staff and riders.

Be conservative and safety-aware, and stay aligned with agency playbooks.
Never invent routes, stops, people, or resources that are not in the provided data.

You are also given real-world incident case studies from other transit agencies.
Compare the current incident to those cases, prefer patterns that led to "good"
outcomes, and name the case IDs you draw from.

Output ONLY valid JSON with this shape:

{
  "actions": [
    {
      "category": "alert_only" | "detour" | "shuttle",
      "summary": "short one-sentence summary for operators",
      "rider_alert_header": "short rider-facing title",
      "rider_alert_body": "2-3 sentence rider-friendly message",
      "ops_script": "internal instructions referencing real routes/stops and staff",
      "social_post": "update text, <= 240 characters"
    }
  ],
  "reasoning": "1-5 sentences explaining why you ranked the actions this way."
}

Do not wrap the JSON in backticks or markdown.
Do not include any top-level keys besides "actions" and "reasoning"."#;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("planner is not configured (missing API key)")]
    NotConfigured,
    #[error("planner request failed: {0}")]
    Upstream(#[from] reqwest::Error),
    #[error("planner returned HTTP {status}: {body}")]
    UpstreamStatus { status: u16, body: String },
    #[error("planner response had no text content")]
    NoText,
    #[error("planner returned a malformed plan: {0}")]
    Malformed(#[from] PlanParseError),
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Clone)]
pub struct Planner {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
    flow_url: String,
}

impl Planner {
    /// `None` without an API key.
    pub fn from_config(client: Client, cfg: &PlannerConfig) -> Option<Self> {
        let api_key = cfg.api_key.clone().filter(|k| !k.is_empty())?;
        Some(Self {
            client,
            api_key,
            api_url: cfg.api_url.clone(),
            model: cfg.model.clone(),
            flow_url: cfg.flow_url.clone(),
        })
    }

    /// Drafts a plan for `incident`, grounded on the most relevant entries of
    /// `case_studies`.
    pub async fn plan(
        &self,
        incident: &Incident,
        case_studies: &[CaseStudy],
    ) -> Result<PlanResult, PlannerError> {
        info!(incident_id = %incident.id, "planning incident");
        let context = self.incident_context(incident).await;

        let query = case_study_query(incident);
        let related: Vec<CaseStudy> = find_relevant_case_studies(case_studies, &query)
            .into_iter()
            .take(MAX_CASE_STUDIES)
            .collect();
        info!(
            cases = ?related.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(),
            "selected case studies"
        );

        let body = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            system: SYSTEM_PROMPT,
            messages: vec![Message {
                role: "user",
                content: user_prompt(incident, &context, &related),
            }],
        };

        let resp = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .timeout(PLAN_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PlannerError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: MessagesResponse = resp.json().await?;
        let text = parsed
            .content
            .into_iter()
            .find(|b| b.kind == "text")
            .and_then(|b| b.text)
            .ok_or(PlannerError::NoText)?;

        let plan = parse_plan_response(&text)?;
        info!(incident_id = %incident.id, actions = plan.actions.len(), "plan parsed");
        Ok(plan)
    }

    /// Context from the incident flow; a fallback built from the incident
    /// itself when the flow is unreachable.
    async fn incident_context(&self, incident: &Incident) -> FlowContext {
        let req = FlowContextRequest {
            route_id: incident.primary_route().map(str::to_string),
            segment_start_stop_id: Some(incident.segment_start_stop_id.clone()),
            segment_end_stop_id: Some(incident.segment_end_stop_id.clone()),
        };
        let res = async {
            self.client
                .post(&self.flow_url)
                .timeout(FLOW_TIMEOUT)
                .json(&req)
                .send()
                .await?
                .error_for_status()?
                .json::<FlowContext>()
                .await
        }
        .await;

        match res {
            Ok(ctx) => ctx,
            Err(e) => {
                warn!(error = %e, "incident context unavailable; using fallback");
                fallback_context(incident)
            }
        }
    }
}

pub fn fallback_context(incident: &Incident) -> FlowContext {
    FlowContext {
        route_id: incident.primary_route().unwrap_or_default().to_string(),
        avg_delay_minutes_live: incident.avg_delay_minutes,
        weather_summary: "unknown".into(),
        suggested_cause: "UNKNOWN".into(),
        timestamp: None,
    }
}

/// Case-study query for an incident, in local time at its start.
pub fn case_study_query(incident: &Incident) -> CaseStudyQuery {
    let at = DateTime::parse_from_rfc3339(&incident.start_time)
        .map(|t| t.with_timezone(&Local))
        .unwrap_or_else(|_| Local::now());
    CaseStudyQuery {
        scenario_type: Some("service_delay".into()),
        ..CaseStudyQuery::for_route(incident.primary_route().unwrap_or_default(), &at)
    }
}

fn pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".into())
}

fn user_prompt(incident: &Incident, context: &FlowContext, cases: &[CaseStudy]) -> String {
    format!(
        "You are handling a new transit incident. Here is the incident data:\n\n\
         <incident_json>\n{}\n</incident_json>\n\n\
         <additional_context>\n{}\n</additional_context>\n\n\
         <case_studies>\n{}\n</case_studies>\n\n\
         Based on this information, generate a response plan with appropriate actions.\n\
         Output ONLY the JSON response as specified in your system prompt.\n",
        pretty(incident),
        pretty(context),
        pretty(&cases),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulseops_core::incidents::demo_incident;

    #[test]
    fn query_uses_incident_start_and_route() {
        let mut incident = demo_incident("i".into(), "2025-03-04T08:30:00Z".into());
        incident.route_ids = vec!["Green-B".into()];
        let q = case_study_query(&incident);
        assert_eq!(q.mode.as_deref(), Some("light_rail"));
        assert_eq!(q.corridor_type.as_deref(), Some("core_subway"));
        assert_eq!(q.scenario_type.as_deref(), Some("service_delay"));
        assert!(q.time_of_day.is_some() && q.weekday.is_some());
    }

    #[test]
    fn prompt_embeds_incident_context_and_cases() {
        let incident = demo_incident("incident-x".into(), "2025-03-04T08:30:00Z".into());
        let prompt = user_prompt(&incident, &fallback_context(&incident), &[]);
        assert!(prompt.contains("\"id\": \"incident-x\""));
        assert!(prompt.contains("\"suggested_cause\": \"UNKNOWN\""));
        assert!(prompt.contains("<case_studies>\n[]\n</case_studies>"));
    }

    #[test]
    fn unconfigured_without_key() {
        let mut cfg = crate::config::DaemonConfig::offline(".".into()).planner;
        assert!(Planner::from_config(Client::new(), &cfg).is_none());
        cfg.api_key = Some(String::new());
        assert!(Planner::from_config(Client::new(), &cfg).is_none());
        cfg.api_key = Some("k".into());
        assert!(Planner::from_config(Client::new(), &cfg).is_some());
    }
}
