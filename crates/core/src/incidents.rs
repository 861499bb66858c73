//! When to open incidents automatically, and how to build them.

use crate::model::{
    DataSource, Incident, IncidentStatus, IncidentType, Severity, SnapshotSource, TestScenario,
    WorldStatus,
};
use crate::validation::CustomIncident;

/// Simulated delays strictly above this open an incident on tick.
pub const SIMULATED_INCIDENT_DELAY_MINUTES: f64 = 10.0;

/// Severity for an incident opened from the simulated corridor, or `None`
/// when the status does not warrant one.
pub fn simulated_incident_severity(status: &WorldStatus) -> Option<Severity> {
    if status.source != SnapshotSource::Simulated
        || status.avg_delay_minutes <= SIMULATED_INCIDENT_DELAY_MINUTES
    {
        return None;
    }
    Some(if status.avg_delay_minutes >= 20.0 {
        Severity::Major
    } else {
        Severity::Minor
    })
}

/// Severity for an incident opened from live feed data: at least 5 minutes
/// of delay or 3 impacted trips.
pub fn live_incident_severity(status: &WorldStatus) -> Option<Severity> {
    if status.source != SnapshotSource::GtfsRealtime {
        return None;
    }
    let moderate_delay = status.avg_delay_minutes >= 5.0;
    let many_trips = status.trips_impacted >= 3;
    if !moderate_delay && !many_trips {
        return None;
    }
    Some(if status.avg_delay_minutes >= 8.0 {
        Severity::Major
    } else {
        Severity::Moderate
    })
}

/// Opens an incident mirroring `status`.
pub fn incident_from_status(
    id: String,
    start_time: String,
    status: &WorldStatus,
    severity: Severity,
    data_source: DataSource,
) -> Incident {
    Incident {
        id,
        status: IncidentStatus::Open,
        severity,
        kind: IncidentType::CorridorBlockage,
        route_ids: vec![status.route_id.clone()],
        segment_start_stop_id: status.segment_start_stop_id.clone(),
        segment_end_stop_id: status.segment_end_stop_id.clone(),
        start_time,
        avg_delay_minutes: status.avg_delay_minutes,
        trips_impacted: status.trips_impacted,
        riders_estimated: status.riders_estimated,
        data_source: Some(data_source),
    }
}

/// Fixed demo incident on route 10.
pub fn demo_incident(id: String, start_time: String) -> Incident {
    Incident {
        id,
        status: IncidentStatus::Open,
        severity: Severity::Major,
        kind: IncidentType::CorridorBlockage,
        route_ids: vec!["10".into()],
        segment_start_stop_id: "stop-100".into(),
        segment_end_stop_id: "stop-120".into(),
        start_time,
        avg_delay_minutes: 15.0,
        trips_impacted: 8,
        riders_estimated: 240,
        data_source: Some(DataSource::Simulated),
    }
}

/// Incident built from validated custom input.
pub fn custom_incident(id: String, start_time: String, input: CustomIncident) -> Incident {
    Incident {
        id,
        status: IncidentStatus::Open,
        severity: input.severity,
        kind: IncidentType::CorridorBlockage,
        route_ids: vec![input.route_id],
        segment_start_stop_id: input.segment_start_stop_id,
        segment_end_stop_id: input.segment_end_stop_id,
        start_time,
        avg_delay_minutes: input.avg_delay_minutes,
        trips_impacted: input.trips_impacted,
        riders_estimated: input.riders_estimated,
        data_source: Some(DataSource::Simulated),
    }
}

/// Incident built from a canned test scenario.
pub fn scenario_incident(id: String, start_time: String, scenario: &TestScenario) -> Incident {
    Incident {
        id,
        status: IncidentStatus::Open,
        severity: scenario.severity,
        kind: IncidentType::CorridorBlockage,
        route_ids: vec![scenario.route_id.clone()],
        segment_start_stop_id: scenario.segment_start_stop_id.clone(),
        segment_end_stop_id: scenario.segment_end_stop_id.clone(),
        start_time,
        avg_delay_minutes: scenario.expected_delay_minutes,
        trips_impacted: scenario.trips_impacted(),
        riders_estimated: scenario.riders_estimated,
        data_source: Some(DataSource::Simulated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(source: SnapshotSource, delay: f64, trips: i64) -> WorldStatus {
        WorldStatus {
            route_id: "10".into(),
            segment_start_stop_id: "S2".into(),
            segment_end_stop_id: "S3".into(),
            avg_delay_minutes: delay,
            trips_impacted: trips,
            riders_estimated: 90,
            source,
        }
    }

    #[test]
    fn simulated_threshold_is_exclusive() {
        use SnapshotSource::*;
        assert_eq!(simulated_incident_severity(&status(Simulated, 10.0, 3)), None);
        assert_eq!(simulated_incident_severity(&status(Simulated, 15.0, 3)), Some(Severity::Minor));
        assert_eq!(simulated_incident_severity(&status(Simulated, 20.0, 3)), Some(Severity::Major));
        assert_eq!(simulated_incident_severity(&status(GtfsRealtime, 30.0, 3)), None);
    }

    #[test]
    fn live_policy_uses_delay_or_trips() {
        use SnapshotSource::*;
        assert_eq!(live_incident_severity(&status(GtfsRealtime, 1.0, 2)), None);
        assert_eq!(live_incident_severity(&status(GtfsRealtime, 1.0, 3)), Some(Severity::Moderate));
        assert_eq!(live_incident_severity(&status(GtfsRealtime, 5.0, 0)), Some(Severity::Moderate));
        assert_eq!(live_incident_severity(&status(GtfsRealtime, 8.0, 0)), Some(Severity::Major));
        assert_eq!(live_incident_severity(&status(Simulated, 30.0, 9)), None);
    }
}
