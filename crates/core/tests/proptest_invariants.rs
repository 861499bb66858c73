use proptest::prelude::*;
use pulseops_core::model::{SnapshotSource, WorldStatus};
use pulseops_core::{
    compute_health_metrics_at, compute_risk_for_route_at, History, HISTORY_WINDOW_MS,
};

fn status(delay: f64, riders: i64) -> WorldStatus {
    WorldStatus {
        route_id: "10".into(),
        segment_start_stop_id: "S2".into(),
        segment_end_stop_id: "S3".into(),
        avg_delay_minutes: delay,
        trips_impacted: 0,
        riders_estimated: riders,
        source: SnapshotSource::Simulated,
    }
}

/// Monotone insertion times built from gaps of up to 40 minutes, with
/// arbitrary (possibly negative) delays and riders.
fn readings() -> impl Strategy<Value = Vec<(i64, f64, i64)>> {
    prop::collection::vec((0i64..40 * 60 * 1000, -20.0f64..60.0, -500i64..5000), 0..60)
}

fn build(readings: &[(i64, f64, i64)]) -> (History, i64) {
    let mut h = History::new();
    let mut t = 1_700_000_000_000i64;
    for &(gap, delay, riders) in readings {
        t += gap;
        h.record_at(status(delay, riders), t);
    }
    (h, t)
}

proptest! {
    #[test]
    fn no_stale_entries_survive_insertion(rs in readings()) {
        let mut h = History::new();
        let mut t = 1_700_000_000_000i64;
        for (gap, delay, riders) in rs {
            t += gap;
            h.record_at(status(delay, riders), t);
            for snap in h.snapshots() {
                prop_assert!(snap.timestamp >= t - HISTORY_WINDOW_MS);
            }
            prop_assert_eq!(h.latest().map(|s| s.timestamp), Some(t));
        }
    }

    #[test]
    fn scores_stay_in_bounds(rs in readings(), lag in 0i64..90 * 60 * 1000) {
        let (h, last) = build(&rs);
        let snaps = h.snapshots();
        let now = last + lag;

        let health = compute_health_metrics_at(&snaps, now);
        prop_assert!(health.health_score <= 100);
        prop_assert!(health.delay_volatility >= 0.0);

        if let Some(risk) = compute_risk_for_route_at(&snaps, now) {
            prop_assert!(risk.predicted_risk_score <= 100);
            prop_assert!(risk.predicted_delay_15m.is_finite());
        } else {
            prop_assert!(snaps.is_empty());
        }
    }

    #[test]
    fn bucket_percentages_sum_to_hundred_or_zero(rs in readings()) {
        let (h, last) = build(&rs);
        let health = compute_health_metrics_at(&h.snapshots(), last);
        let total = health.percent_time_minor + health.percent_time_moderate + health.percent_time_severe;
        prop_assert!(total == 0.0 || (total - 100.0).abs() <= 0.2, "total = {}", total);
    }
}
