//! Short-horizon (15 minute) delay forecast and risk score for the most
//! recently observed route.

use serde::{Deserialize, Serialize};

use crate::model::Snapshot;
use crate::util::{now_ms, EpochMs};

const LOOKBACK_MS: i64 = 15 * 60 * 1000;

/// Risk estimate for the next ~15 minutes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessment {
    pub route_id: String,
    pub segment_start_stop_id: String,
    pub segment_end_stop_id: String,

    pub current_delay_minutes: f64,
    pub predicted_delay_15m: f64,

    /// Not derived yet; always `None`.
    pub current_headway_variance_secs: Option<f64>,
    /// 0–100.
    pub predicted_risk_score: u32,

    /// Labels explaining the score.
    pub risk_factors: Vec<String>,
}

/// Computes the risk assessment as of now.
pub fn compute_risk_for_route(history: &[Snapshot]) -> Option<RiskAssessment> {
    compute_risk_for_route_at(history, now_ms())
}

/// Computes the risk assessment as of `now`. `None` when the history is empty.
pub fn compute_risk_for_route_at(history: &[Snapshot], now: EpochMs) -> Option<RiskAssessment> {
    let mut sorted = history.to_vec();
    sorted.sort_by_key(|s| s.timestamp);
    let latest = sorted.last()?;

    let cutoff = now - LOOKBACK_MS;
    let recent: Vec<&Snapshot> = sorted.iter().filter(|s| s.timestamp >= cutoff).collect();

    let assessment = |current: f64, predicted: f64, score: u32, factors: Vec<String>| {
        RiskAssessment {
            route_id: latest.status.route_id.clone(),
            segment_start_stop_id: latest.status.segment_start_stop_id.clone(),
            segment_end_stop_id: latest.status.segment_end_stop_id.clone(),
            current_delay_minutes: current,
            predicted_delay_15m: predicted,
            current_headway_variance_secs: None,
            predicted_risk_score: score,
            risk_factors: factors,
        }
    };

    let Some(newest) = recent.last() else {
        let d = latest.delay();
        return Some(assessment(d, d, 0, vec!["no_recent_history".into()]));
    };

    let delays: Vec<f64> = recent.iter().map(|s| s.delay()).collect();
    let current = newest.delay();
    let avg_riders =
        recent.iter().map(|s| s.status.riders_estimated as f64).sum::<f64>() / recent.len() as f64;

    let trend = trend(&delays);
    let mut predicted = current + trend;
    if !predicted.is_finite() {
        predicted = current;
    }

    let mut factors = Vec::new();
    let mut risk: i64 = 0;

    if current >= 5.0 {
        risk += 30;
        factors.push("current_delay_high".to_string());
    } else if current >= 3.0 {
        risk += 15;
        factors.push("current_delay_moderate".to_string());
    }

    if trend > 0.5 {
        risk += 25;
        factors.push("delay_trend_worsening".to_string());
    } else if trend < -0.5 {
        risk -= 10;
        factors.push("delay_trend_improving".to_string());
    }

    if avg_riders >= 1500.0 {
        risk += 25;
        factors.push("high_ridership".to_string());
    } else if avg_riders >= 700.0 {
        risk += 10;
        factors.push("medium_ridership".to_string());
    }

    let score = risk.clamp(0, 100) as u32;
    Some(assessment(current, predicted, score, factors))
}

/// Mean of the last third minus mean of the first third (at least one
/// element each). `delays` must be non-empty.
fn trend(delays: &[f64]) -> f64 {
    let third = (delays.len() / 3).max(1);
    let avg = |xs: &[f64]| xs.iter().sum::<f64>() / third as f64;
    let early = avg(&delays[..third]);
    let late = avg(&delays[delays.len() - third..]);
    late - early
}
