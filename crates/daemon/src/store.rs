use std::collections::HashMap;

use chrono::Utc;
use pulseops_core::model::{Incident, IncidentPatch, PlannedAction};
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    incidents: HashMap<String, Incident>,
    /// Insertion order for stable listings.
    order: Vec<String>,
    actions: HashMap<String, Vec<PlannedAction>>,
}

/// In-memory incidents and their planned actions.
#[derive(Default)]
pub struct IncidentStore {
    inner: RwLock<Inner>,
}

impl IncidentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn list_incidents(&self) -> Vec<Incident> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter_map(|id| inner.incidents.get(id).cloned())
            .collect()
    }

    pub async fn get_incident(&self, id: &str) -> Option<Incident> {
        self.inner.read().await.incidents.get(id).cloned()
    }

    /// Inserts or replaces by id.
    pub async fn create_incident(&self, incident: Incident) -> Incident {
        let mut inner = self.inner.write().await;
        if !inner.incidents.contains_key(&incident.id) {
            inner.order.push(incident.id.clone());
        }
        inner.incidents.insert(incident.id.clone(), incident.clone());
        incident
    }

    pub async fn update_incident(&self, id: &str, patch: IncidentPatch) -> Option<Incident> {
        let mut inner = self.inner.write().await;
        let incident = inner.incidents.get_mut(id)?;
        patch.apply(incident);
        Some(incident.clone())
    }

    pub async fn actions_for_incident(&self, incident_id: &str) -> Vec<PlannedAction> {
        self.inner
            .read()
            .await
            .actions
            .get(incident_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Appends actions, numbering ids after the ones already stored.
    pub async fn add_actions_for_incident(
        &self,
        incident_id: &str,
        actions: Vec<PlannedAction>,
    ) -> Vec<PlannedAction> {
        let created_at = Utc::now().to_rfc3339();
        let mut inner = self.inner.write().await;
        let list = inner.actions.entry(incident_id.to_string()).or_default();
        let start = list.len();
        let stamped: Vec<_> = actions
            .into_iter()
            .enumerate()
            .map(|(i, mut action)| {
                action.id = Some(format!("{incident_id}-action-{}", start + i));
                action.incident_id = Some(incident_id.to_string());
                action.created_at = Some(created_at.clone());
                action
            })
            .collect();
        list.extend(stamped.iter().cloned());
        stamped
    }

    pub async fn all_actions(&self) -> Vec<PlannedAction> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter_map(|id| inner.actions.get(id))
            .flatten()
            .cloned()
            .collect()
    }

    /// First open incident on `route_id`, restricted to a segment when given.
    pub async fn find_open_incident(
        &self,
        route_id: &str,
        segment: Option<(&str, &str)>,
    ) -> Option<Incident> {
        self.find_open(|inc| {
            inc.is_open_on_route(route_id)
                && segment.map_or(true, |(start, end)| {
                    inc.segment_start_stop_id == start && inc.segment_end_stop_id == end
                })
        })
        .await
    }

    /// First open incident on `route_id` that was opened from live data.
    pub async fn find_open_live_incident(&self, route_id: &str) -> Option<Incident> {
        self.find_open(|inc| {
            inc.is_open_on_route(route_id) && inc.data_source.is_some_and(|d| d.is_live())
        })
        .await
    }

    async fn find_open(&self, pred: impl Fn(&Incident) -> bool) -> Option<Incident> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter_map(|id| inner.incidents.get(id))
            .find(|inc| pred(inc))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulseops_core::incidents::demo_incident;
    use pulseops_core::model::{ActionCategory, DataSource, IncidentStatus};

    fn action(summary: &str) -> PlannedAction {
        PlannedAction {
            id: None,
            incident_id: None,
            category: ActionCategory::AlertOnly,
            summary: summary.into(),
            rider_alert_header: "h".into(),
            rider_alert_body: "b".into(),
            ops_script: "o".into(),
            social_post: "s".into(),
            created_at: None,
        }
    }

    #[tokio::test]
    async fn numbers_actions_across_batches() {
        let store = IncidentStore::new();
        store.create_incident(demo_incident("inc-1".into(), "t".into())).await;

        store.add_actions_for_incident("inc-1", vec![action("a"), action("b")]).await;
        let second = store.add_actions_for_incident("inc-1", vec![action("c")]).await;
        assert_eq!(second[0].id.as_deref(), Some("inc-1-action-2"));

        let all = store.actions_for_incident("inc-1").await;
        let ids: Vec<_> = all.iter().filter_map(|a| a.id.as_deref()).collect();
        assert_eq!(ids, vec!["inc-1-action-0", "inc-1-action-1", "inc-1-action-2"]);
        assert!(all.iter().all(|a| a.incident_id.as_deref() == Some("inc-1") && a.created_at.is_some()));
        assert_eq!(store.all_actions().await.len(), 3);
        assert!(store.actions_for_incident("missing").await.is_empty());
    }

    #[tokio::test]
    async fn finds_open_incidents_by_route_and_segment() {
        let store = IncidentStore::new();
        store.create_incident(demo_incident("inc-1".into(), "t".into())).await;

        assert!(store.find_open_incident("10", None).await.is_some());
        assert!(store.find_open_incident("10", Some(("stop-100", "stop-120"))).await.is_some());
        assert!(store.find_open_incident("10", Some(("S2", "S3"))).await.is_none());
        assert!(store.find_open_live_incident("10").await.is_none());

        let patch = IncidentPatch {
            status: Some(IncidentStatus::Resolved),
            ..Default::default()
        };
        let updated = store.update_incident("inc-1", patch).await.unwrap();
        assert_eq!(updated.status, IncidentStatus::Resolved);
        assert!(store.find_open_incident("10", None).await.is_none());
        assert!(store.update_incident("nope", IncidentPatch::default()).await.is_none());

        let mut live = demo_incident("inc-2".into(), "t".into());
        live.data_source = Some(DataSource::AutoRealtime);
        store.create_incident(live).await;
        assert_eq!(store.find_open_live_incident("10").await.map(|i| i.id), Some("inc-2".into()));
        assert_eq!(store.list_incidents().await.len(), 2);
    }
}
