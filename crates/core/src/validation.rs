//! Validation at the ingestion boundary: loosely typed payloads in, strongly
//! typed values out.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::api::CustomIncidentRequest;
use crate::model::{Severity, SnapshotSource, WorldStatus};

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("field {field} is not a number: {value}")]
    NotANumber { field: &'static str, value: String },
    #[error("field {0} must be finite")]
    NonFinite(&'static str),
    #[error("unknown source: {0}")]
    UnknownSource(String),
    #[error("severity must be 'minor' or 'major' (found: {0})")]
    BadSeverity(String),
}

/// World status as received from an upstream payload. Every field is
/// optional and numbers may arrive as strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawWorldStatus {
    #[serde(default)]
    pub route_id: Option<String>,
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
    #[serde(default)]
    pub source: Option<String>,
}

impl TryFrom<RawWorldStatus> for WorldStatus {
    type Error = ValidationError;

    fn try_from(raw: RawWorldStatus) -> Result<Self, Self::Error> {
        let route_id = required(raw.route_id, "route_id")?;
        let segment_start_stop_id = required(raw.segment_start_stop_id, "segment_start_stop_id")?;
        let segment_end_stop_id = required(raw.segment_end_stop_id, "segment_end_stop_id")?;

        let avg_delay_minutes = number_or_zero(raw.avg_delay_minutes.as_ref(), "avg_delay_minutes")?;
        let trips_impacted = number_or_zero(raw.trips_impacted.as_ref(), "trips_impacted")?;
        let riders_estimated = number_or_zero(raw.riders_estimated.as_ref(), "riders_estimated")?;

        let source = match raw.source.as_deref() {
            None | Some("simulated") => SnapshotSource::Simulated,
            Some("gtfs_realtime") | Some("mbta_v3_api") => SnapshotSource::GtfsRealtime,
            Some(other) => return Err(ValidationError::UnknownSource(other.to_string())),
        };

        Ok(WorldStatus {
            route_id,
            segment_start_stop_id,
            segment_end_stop_id,
            avg_delay_minutes,
            trips_impacted: trips_impacted.trunc() as i64,
            riders_estimated: riders_estimated.trunc() as i64,
            source,
        })
    }
}

/// Incident parameters accepted from the custom-incident endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomIncident {
    pub route_id: String,
    pub severity: Severity,
    pub segment_start_stop_id: String,
    pub segment_end_stop_id: String,
    pub avg_delay_minutes: f64,
    pub trips_impacted: i64,
    pub riders_estimated: i64,
}

/// Validates a custom incident request. Missing, zero or non-numeric numbers
/// fall back to 15 min / 5 trips / 150 riders.
pub fn validate_custom_incident(req: CustomIncidentRequest) -> Result<CustomIncident, ValidationError> {
    let route_id = required(req.route_id, "route_id")?;
    let severity_raw = required(req.severity, "severity")?;
    let segment_start_stop_id = required(req.segment_start_stop_id, "segment_start_stop_id")?;
    let segment_end_stop_id = required(req.segment_end_stop_id, "segment_end_stop_id")?;

    let severity = match severity_raw.as_str() {
        "minor" => Severity::Minor,
        "major" => Severity::Major,
        _ => return Err(ValidationError::BadSeverity(severity_raw)),
    };

    Ok(CustomIncident {
        route_id,
        severity,
        segment_start_stop_id,
        segment_end_stop_id,
        avg_delay_minutes: number_or_default(req.avg_delay_minutes.as_ref(), 15.0),
        trips_impacted: number_or_default(req.trips_impacted.as_ref(), 5.0) as i64,
        riders_estimated: number_or_default(req.riders_estimated.as_ref(), 150.0) as i64,
    })
}

/// Coerces a JSON value to a number: numbers as-is, numeric strings parsed
/// (blank is zero), booleans as 0/1, null as zero.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim().is_empty() => Some(0.0),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null => Some(0.0),
        _ => None,
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ValidationError::MissingField(field)),
    }
}

fn number_or_zero(value: Option<&Value>, field: &'static str) -> Result<f64, ValidationError> {
    let Some(value) = value else {
        return Ok(0.0);
    };
    let n = coerce_number(value).ok_or_else(|| ValidationError::NotANumber {
        field,
        value: value.to_string(),
    })?;
    if !n.is_finite() {
        return Err(ValidationError::NonFinite(field));
    }
    Ok(n)
}

fn number_or_default(value: Option<&Value>, default: f64) -> f64 {
    match value.and_then(coerce_number) {
        Some(n) if n.is_finite() && n != 0.0 => n,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerces_loose_numbers() {
        assert_eq!(coerce_number(&json!(3.5)), Some(3.5));
        assert_eq!(coerce_number(&json!(" 12 ")), Some(12.0));
        assert_eq!(coerce_number(&json!("")), Some(0.0));
        assert_eq!(coerce_number(&json!(true)), Some(1.0));
        assert_eq!(coerce_number(&json!("abc")), None);
        assert_eq!(coerce_number(&json!([1])), None);
    }
}
