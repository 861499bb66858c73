//! Parsing of model-drafted response plans.

use thiserror::Error;

use crate::model::PlanResult;

#[derive(Debug, Error)]
pub enum PlanParseError {
    #[error("plan response was empty")]
    Empty,
    #[error("plan response is not valid plan JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Parses the model's text output into a [`PlanResult`]. Markdown code
/// fences around the JSON are tolerated.
pub fn parse_plan_response(text: &str) -> Result<PlanResult, PlanParseError> {
    let body = strip_code_fence(text.trim());
    if body.is_empty() {
        return Err(PlanParseError::Empty);
    }
    Ok(serde_json::from_str(body)?)
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (e.g. `json`) up to the first newline.
    let rest = match rest.find('\n') {
        Some(i) => &rest[i + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };
    rest.trim_end().trim_end_matches("```").trim()
}
