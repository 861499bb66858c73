use pulseops_core::model::{DataSource, IncidentStatus, Severity, SnapshotSource, WorldStatus};
use pulseops_daemon::{config::DaemonConfig, service::PulseOpsService};

fn live(delay: f64, trips: i64) -> WorldStatus {
    WorldStatus {
        route_id: "Red".into(),
        segment_start_stop_id: "stop-100".into(),
        segment_end_stop_id: "stop-120".into(),
        avg_delay_minutes: delay,
        trips_impacted: trips,
        riders_estimated: trips * 30,
        source: SnapshotSource::GtfsRealtime,
    }
}

async fn offline(dir: &tempfile::TempDir) -> PulseOpsService {
    PulseOpsService::new(&DaemonConfig::offline(dir.path().into()))
        .await
        .unwrap()
}

#[tokio::test]
async fn live_policy_opens_one_incident_per_route() {
    let dir = tempfile::tempdir().unwrap();
    let svc = offline(&dir).await;

    assert!(svc.apply_live_policy(&live(2.0, 1)).await.is_none());

    let first = svc.apply_live_policy(&live(9.2, 4)).await.unwrap();
    assert_eq!(first.severity, Severity::Major);
    assert_eq!(first.data_source, Some(DataSource::GtfsRealtime));
    assert_eq!(first.status, IncidentStatus::Open);
    assert_eq!(first.route_ids, vec!["Red"]);

    // Still disrupted: no duplicate while the first stays open.
    assert!(svc.apply_live_policy(&live(6.0, 3)).await.is_none());
    assert_eq!(svc.store().list_incidents().await.len(), 1);
}

#[tokio::test]
async fn monitor_tick_records_simulated_readings_only() {
    let dir = tempfile::tempdir().unwrap();
    let svc = offline(&dir).await;

    svc.trigger_disruption().await;
    assert!(svc.monitor_tick().await.is_none());
    assert_eq!(svc.history().await.len(), 1);
    assert!(svc.store().list_incidents().await.is_empty());
}

#[tokio::test]
async fn tick_opens_incident_before_planning() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = DaemonConfig::offline(dir.path().into());
    cfg.planner.api_key = Some("test-key".into());
    // Nothing listens on the discard port; both calls fail fast.
    cfg.planner.api_url = "http://127.0.0.1:9/v1/messages".into();
    cfg.planner.flow_url = "http://127.0.0.1:9/fake-flow".into();
    let svc = PulseOpsService::new(&cfg).await.unwrap();

    svc.trigger_disruption().await;
    let err = svc.tick().await.unwrap_err();
    assert!(err.to_string().contains("planner request failed"));

    let incidents = svc.store().list_incidents().await;
    assert_eq!(incidents.len(), 1);
    assert_eq!(incidents[0].severity, Severity::Minor);
    assert_eq!(incidents[0].avg_delay_minutes, 14.0);
    assert_eq!(incidents[0].segment_start_stop_id, "S2");

    // Same corridor still open: the next tick does not plan again.
    let resp = svc.tick().await.unwrap();
    assert_eq!(resp.incident_created, None);
    assert_eq!(resp.world_status.avg_delay_minutes, 13.0);
}

#[tokio::test]
async fn daily_summary_counts_delayed_readings() {
    let dir = tempfile::tempdir().unwrap();
    let svc = offline(&dir).await;

    svc.trigger_disruption().await;
    for _ in 0..3 {
        svc.tick().await.unwrap();
    }
    let summary = svc.daily_summary().await;
    assert_eq!(summary.total_incidents, 3);
    assert_eq!(summary.max_delay, 14.0);
}

#[tokio::test]
async fn shipped_catalogues_parse() {
    let data = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data");
    let catalog = pulseops_daemon::catalog::Catalog::load(&data).await;
    assert!(catalog.case_studies.len() >= 5);
    assert!(catalog.scenario("red-dtx-signal").is_some());
    assert_eq!(
        catalog.brain.corridor_for_route("Green-B").map(|c| c.id.as_str()),
        Some("green_surface")
    );
}
