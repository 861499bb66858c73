//! Integration tests for the corridor aggregators.

use pulseops_core::model::{Snapshot, SnapshotSource, WorldStatus};
use pulseops_core::{
    compute_health_metrics_at, compute_risk_for_route_at, summarize_day, History, HealthMetrics,
    RiskLevel,
};

const MIN: i64 = 60 * 1000;
const NOW: i64 = 1_700_000_000_000;

fn status(delay: f64, riders: i64) -> WorldStatus {
    WorldStatus {
        route_id: "10".into(),
        segment_start_stop_id: "S2".into(),
        segment_end_stop_id: "S3".into(),
        avg_delay_minutes: delay,
        trips_impacted: 3,
        riders_estimated: riders,
        source: SnapshotSource::Simulated,
    }
}

/// Builds a history from `(minutes_ago, delay, riders)` triples, oldest first.
fn history(points: &[(i64, f64, i64)]) -> Vec<Snapshot> {
    let mut h = History::new();
    for &(ago, delay, riders) in points {
        h.record_at(status(delay, riders), NOW - ago * MIN);
    }
    h.snapshots()
}

#[test]
fn test_empty_history_defaults() {
    let health = compute_health_metrics_at(&[], NOW);
    assert_eq!(health, HealthMetrics::perfect());
    assert_eq!(health.health_score, 100);
    assert_eq!(health.percent_time_minor, 100.0);
    assert_eq!(health.percent_time_moderate, 0.0);
    assert_eq!(health.percent_time_severe, 0.0);
    assert_eq!(health.risk_level, RiskLevel::Low);

    assert_eq!(compute_risk_for_route_at(&[], NOW), None);

    let summary = summarize_day(&[]);
    assert_eq!(summary.total_incidents, 0);
    assert_eq!(summary.avg_delay, 0.0);
    assert_eq!(summary.max_delay, 0.0);
    assert_eq!(summary.total_rider_delay_minutes, 0.0);
}

#[test]
fn test_health_for_rising_delay() {
    let h = history(&[(10, 2.0, 500), (5, 6.0, 500), (0, 9.0, 500)]);
    let health = compute_health_metrics_at(&h, NOW);

    assert_eq!(health.avg_delay_15m, 5.7);
    assert_eq!(health.delay_volatility, 2.9);
    assert_eq!(health.near_miss_count_30m, 2);
    assert_eq!(health.health_score, 59);
    assert_eq!(health.risk_level, RiskLevel::Medium);
    assert_eq!(health.avg_delay_30m, 5.7);
    assert_eq!(health.total_rider_delay_minutes_30m, 8500);
    assert_eq!(health.percent_time_minor, 33.3);
    assert_eq!(health.percent_time_moderate, 0.0);
    assert_eq!(health.percent_time_severe, 66.7);
}

#[test]
fn test_bucket_percentages() {
    let h = history(&[
        (25, 1.0, 0),
        (20, 1.0, 0),
        (15, 3.0, 0),
        (10, 6.0, 0),
        (5, 6.0, 0),
    ]);
    let health = compute_health_metrics_at(&h, NOW);
    assert_eq!(health.percent_time_minor, 40.0);
    assert_eq!(health.percent_time_moderate, 20.0);
    assert_eq!(health.percent_time_severe, 40.0);
}

#[test]
fn test_mean_delay_of_ten_forces_high_risk() {
    let h = history(&[(1, 10.0, 0)]);
    let health = compute_health_metrics_at(&h, NOW);
    assert_eq!(health.avg_delay_15m, 10.0);
    assert_eq!(health.risk_level, RiskLevel::High);
}

#[test]
fn test_stale_window_reports_zero_percentages() {
    // History is non-empty but nothing falls in the last 30 minutes.
    let h = history(&[(45, 8.0, 100)]);
    let health = compute_health_metrics_at(&h, NOW);
    assert_eq!(health.health_score, 100);
    assert_eq!(health.avg_delay_15m, 0.0);
    assert_eq!(health.risk_level, RiskLevel::Low);
    assert_eq!(health.percent_time_minor, 0.0);
    assert_eq!(health.percent_time_moderate, 0.0);
    assert_eq!(health.percent_time_severe, 0.0);
}

#[test]
fn test_negative_inputs_clamp_rider_delay() {
    let h = history(&[(1, -5.0, 200)]);
    let health = compute_health_metrics_at(&h, NOW);
    assert_eq!(health.total_rider_delay_minutes_30m, 0);
    assert_eq!(health.health_score, 100);
    assert_eq!(summarize_day(&h).total_rider_delay_minutes, 0.0);

    let h = history(&[(1, 4.0, -200)]);
    assert_eq!(compute_health_metrics_at(&h, NOW).total_rider_delay_minutes_30m, 0);
    assert_eq!(summarize_day(&h).total_rider_delay_minutes, 0.0);
}

#[test]
fn test_risk_for_rising_delay() {
    let h = history(&[(10, 2.0, 500), (5, 6.0, 500), (0, 9.0, 500)]);
    let risk = compute_risk_for_route_at(&h, NOW).expect("non-empty history");

    assert_eq!(risk.route_id, "10");
    assert_eq!(risk.current_delay_minutes, 9.0);
    assert_eq!(risk.predicted_delay_15m, 16.0);
    assert_eq!(risk.predicted_risk_score, 55);
    assert_eq!(
        risk.risk_factors,
        vec!["current_delay_high".to_string(), "delay_trend_worsening".to_string()]
    );
    assert_eq!(risk.current_headway_variance_secs, None);
}

#[test]
fn test_risk_without_recent_history() {
    let h = history(&[(20, 4.0, 900)]);
    let risk = compute_risk_for_route_at(&h, NOW).expect("non-empty history");
    assert_eq!(risk.current_delay_minutes, 4.0);
    assert_eq!(risk.predicted_delay_15m, 4.0);
    assert_eq!(risk.predicted_risk_score, 0);
    assert_eq!(risk.risk_factors, vec!["no_recent_history".to_string()]);
}

#[test]
fn test_risk_improving_trend_with_high_ridership() {
    let h = history(&[
        (12, 8.0, 1600),
        (10, 8.0, 1600),
        (8, 8.0, 1600),
        (6, 2.0, 1600),
        (4, 2.0, 1600),
        (2, 2.0, 1600),
    ]);
    let risk = compute_risk_for_route_at(&h, NOW).expect("non-empty history");
    assert_eq!(risk.predicted_delay_15m, -4.0);
    assert_eq!(risk.predicted_risk_score, 15);
    assert_eq!(
        risk.risk_factors,
        vec!["delay_trend_improving".to_string(), "high_ridership".to_string()]
    );
}

#[test]
fn test_risk_score_floors_at_zero() {
    let h = history(&[(2, 6.0, 0), (1, 0.0, 0)]);
    let risk = compute_risk_for_route_at(&h, NOW).expect("non-empty history");
    assert_eq!(risk.predicted_risk_score, 0);
    assert_eq!(risk.risk_factors, vec!["delay_trend_improving".to_string()]);
}

#[test]
fn test_risk_sorts_unordered_input_without_touching_it() {
    let mut newest = status(3.5, 800);
    newest.route_id = "Red".into();
    let input = vec![
        Snapshot::new(newest, NOW - MIN),
        Snapshot::new(status(1.0, 800), NOW - 5 * MIN),
    ];
    let before = input.clone();

    let risk = compute_risk_for_route_at(&input, NOW).expect("non-empty history");
    assert_eq!(input, before);
    assert_eq!(risk.route_id, "Red");
    assert_eq!(risk.current_delay_minutes, 3.5);
    assert_eq!(
        risk.risk_factors,
        vec![
            "current_delay_moderate".to_string(),
            "delay_trend_worsening".to_string(),
            "medium_ridership".to_string(),
        ]
    );
    assert_eq!(risk.predicted_risk_score, 50);
}

#[test]
fn test_daily_summary_counts_snapshots_as_incidents() {
    let h = history(&[(50, 6.0, 100), (40, 7.0, 100), (30, 1.0, 100), (20, 5.0, 0)]);
    let summary = summarize_day(&h);
    assert_eq!(summary.total_incidents, 3);
    assert_eq!(summary.avg_delay, 4.75);
    assert_eq!(summary.max_delay, 7.0);
    assert_eq!(summary.total_rider_delay_minutes, 1400.0);
}

#[test]
fn test_history_reads_are_idempotent() {
    let mut h = History::new();
    h.record_at(status(2.0, 10), NOW - MIN);
    h.record_at(status(3.0, 10), NOW);
    assert_eq!(h.snapshots(), h.snapshots());
}

#[test]
fn test_snapshot_serializes_flat() {
    let snap = Snapshot::new(status(2.5, 90), 42);
    let v = serde_json::to_value(&snap).unwrap();
    assert_eq!(v["route_id"], "10");
    assert_eq!(v["avg_delay_minutes"], 2.5);
    assert_eq!(v["source"], "simulated");
    assert_eq!(v["timestamp"], 42);
}
