//! Corridor knowledge base ("transit brain") and rule matching.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::{ExternalContext, Snapshot};

/// A group of routes sharing infrastructure and failure modes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Corridor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub modes: Vec<String>,
    #[serde(default)]
    pub routes: Vec<String>,
    #[serde(default)]
    pub transfer_hubs: Vec<String>,
    #[serde(default)]
    pub vulnerabilities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Operational rule. Conditions are small expressions such as
/// `corridor_id == 'red_core'`, `headway_variance_secs > 240` or
/// `nearby_event == true`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrainRule {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub suggested_actions: Vec<String>,
}

/// The whole knowledge base.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TransitBrain {
    #[serde(default)]
    pub corridors: Vec<Corridor>,
    #[serde(default)]
    pub rules: Vec<BrainRule>,
}

/// What the knowledge base says about the current situation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BrainInsight {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corridor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corridor_name: Option<String>,
    pub likely_failure_modes: Vec<String>,
    pub triggered_rules: Vec<BrainRule>,
}

struct Facts<'a> {
    corridor: Option<&'a Corridor>,
    nearby_event: bool,
    headway_variance_secs: Option<f64>,
}

impl TransitBrain {
    /// Corridor serving `route_id`, if any.
    pub fn corridor_for_route(&self, route_id: &str) -> Option<&Corridor> {
        self.corridors
            .iter()
            .find(|c| c.routes.iter().any(|r| r == route_id))
    }

    /// Matches the latest snapshot's corridor and the external context against
    /// the rule set.
    pub fn analyze(&self, history: &[Snapshot], external: Option<&ExternalContext>) -> BrainInsight {
        let Some(latest) = history.last() else {
            return BrainInsight::default();
        };
        let corridor = self.corridor_for_route(&latest.status.route_id);

        let mut seen = BTreeSet::new();
        let likely_failure_modes = corridor
            .map(|c| c.vulnerabilities.as_slice())
            .unwrap_or_default()
            .iter()
            .filter(|v| seen.insert(v.as_str()))
            .cloned()
            .collect();

        let facts = Facts {
            corridor,
            nearby_event: external.is_some_and(|e| !e.events.is_empty()),
            // Headway variance is not derived from the feed yet.
            headway_variance_secs: None,
        };

        let triggered_rules = self
            .rules
            .iter()
            .filter(|rule| rule.conditions.iter().all(|c| condition_holds(c, &facts)))
            .cloned()
            .collect();

        BrainInsight {
            corridor_id: corridor.map(|c| c.id.clone()),
            corridor_name: corridor.map(|c| c.name.clone()),
            likely_failure_modes,
            triggered_rules,
        }
    }
}

/// Evaluates one condition. Conditions about facts that are unknown (no
/// corridor matched, no headway data) and unrecognised conditions do not
/// block a rule.
fn condition_holds(cond: &str, facts: &Facts<'_>) -> bool {
    if cond.contains("corridor_id") {
        let Some(corridor) = facts.corridor else {
            return true;
        };
        let expected = cond
            .split("==")
            .nth(1)
            .map(|s| s.trim().trim_matches(|c| c == '\'' || c == '"'))
            .unwrap_or_default();
        corridor.id == expected
    } else if cond.contains("headway_variance_secs") {
        let Some(variance) = facts.headway_variance_secs else {
            return true;
        };
        cond.rsplit('>')
            .next()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .is_some_and(|threshold| variance > threshold)
    } else if cond.contains("nearby_event == true") {
        facts.nearby_event
    } else {
        true
    }
}
