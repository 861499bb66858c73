//! Corridor health metrics over the snapshot history.
//!
//! Windows are measured back from the time of the call, not from the newest
//! snapshot:
//! - 15 minutes: average delay (drives the delay penalty and risk level)
//! - 30 minutes: volatility, near misses, stakeholder KPIs
//!
//! An empty history reports perfect health.

use serde::{Deserialize, Serialize};

use crate::model::Snapshot;
use crate::util::{now_ms, round_half_up, round_to_tenth, EpochMs};

const MIN_MS: i64 = 60 * 1000;

/// Delay at which a snapshot counts as a near miss (inclusive).
pub const CONCERN_THRESHOLD_MINUTES: f64 = 3.0;
/// Delay at which a snapshot is treated as an incident rather than a near miss.
pub const INCIDENT_THRESHOLD_MINUTES: f64 = 10.0;

/// Coarse risk label derived from the health score and recent delay.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Health report for the monitored corridor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthMetrics {
    /// 0–100.
    pub health_score: u32,
    pub avg_delay_15m: f64,
    /// Population standard deviation of delay over 30 minutes.
    pub delay_volatility: f64,
    pub risk_level: RiskLevel,
    pub near_miss_count_30m: u32,

    pub avg_delay_30m: f64,
    pub total_rider_delay_minutes_30m: u64,
    /// Share of snapshots with delay <= 2 min.
    pub percent_time_minor: f64,
    /// Share of snapshots with 2 < delay <= 5 min.
    pub percent_time_moderate: f64,
    /// Share of snapshots with delay > 5 min.
    pub percent_time_severe: f64,
}

impl HealthMetrics {
    /// Report used when there is no history at all.
    pub fn perfect() -> Self {
        Self {
            health_score: 100,
            avg_delay_15m: 0.0,
            delay_volatility: 0.0,
            risk_level: RiskLevel::Low,
            near_miss_count_30m: 0,
            avg_delay_30m: 0.0,
            total_rider_delay_minutes_30m: 0,
            percent_time_minor: 100.0,
            percent_time_moderate: 0.0,
            percent_time_severe: 0.0,
        }
    }
}

/// Computes health metrics as of now.
pub fn compute_health_metrics(history: &[Snapshot]) -> HealthMetrics {
    compute_health_metrics_at(history, now_ms())
}

/// Computes health metrics as of `now`.
pub fn compute_health_metrics_at(history: &[Snapshot], now: EpochMs) -> HealthMetrics {
    if history.is_empty() {
        return HealthMetrics::perfect();
    }

    let last30m = within(history, now, 30 * MIN_MS);
    let last15m = within(history, now, 15 * MIN_MS);

    let avg_delay_15m = mean(last15m.iter().map(|s| s.delay()));

    let delays_30m: Vec<f64> = last30m.iter().map(|s| s.delay()).collect();
    let delay_volatility = population_std_dev(&delays_30m);

    let near_miss_count_30m = delays_30m
        .iter()
        .filter(|&&d| d >= CONCERN_THRESHOLD_MINUTES && d < INCIDENT_THRESHOLD_MINUTES)
        .count() as u32;

    let delay_penalty = (avg_delay_15m * 5.0).min(50.0);
    let volatility_penalty = (delay_volatility * 3.0).min(30.0);
    let near_miss_penalty = (f64::from(near_miss_count_30m) * 2.0).min(20.0);
    let health_score =
        (100.0 - delay_penalty - volatility_penalty - near_miss_penalty).clamp(0.0, 100.0);

    let risk_level = risk_level(health_score, avg_delay_15m);

    let avg_delay_30m = mean(delays_30m.iter().copied());
    let total_rider_delay_minutes_30m: f64 =
        last30m.iter().map(|s| s.rider_delay_minutes()).sum();

    let (mut minor, mut moderate, mut severe) = (0usize, 0usize, 0usize);
    for d in &delays_30m {
        if *d <= 2.0 {
            minor += 1;
        } else if *d <= 5.0 {
            moderate += 1;
        } else {
            severe += 1;
        }
    }
    // Guarded denominator: an empty 30m window yields 0/0/0, unlike the
    // empty-history report above.
    let total = delays_30m.len().max(1) as f64;
    let pct = |count: usize| count as f64 / total * 100.0;

    HealthMetrics {
        health_score: round_half_up(health_score) as u32,
        avg_delay_15m: round_to_tenth(avg_delay_15m),
        delay_volatility: round_to_tenth(delay_volatility),
        risk_level,
        near_miss_count_30m,
        avg_delay_30m: round_to_tenth(avg_delay_30m),
        total_rider_delay_minutes_30m: round_half_up(total_rider_delay_minutes_30m) as u64,
        percent_time_minor: round_to_tenth(pct(minor)),
        percent_time_moderate: round_to_tenth(pct(moderate)),
        percent_time_severe: round_to_tenth(pct(severe)),
    }
}

fn risk_level(health_score: f64, avg_delay_15m: f64) -> RiskLevel {
    let mut level = RiskLevel::Low;
    if health_score < 70.0 || avg_delay_15m >= 5.0 {
        level = RiskLevel::Medium;
    }
    if health_score < 50.0 || avg_delay_15m >= 10.0 {
        level = RiskLevel::High;
    }
    level
}

fn within(history: &[Snapshot], now: EpochMs, window_ms: i64) -> Vec<&Snapshot> {
    history
        .iter()
        .filter(|s| now - s.timestamp <= window_ms)
        .collect()
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values.iter().copied());
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
