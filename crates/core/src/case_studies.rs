//! Historical incident case studies and relevance matching.

use chrono::{Datelike, Timelike, Weekday};
use serde::{Deserialize, Serialize};

/// How well a historical response went.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeQuality {
    Good,
    Mixed,
    Poor,
}

/// A real-world incident handled by some agency.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseStudy {
    pub id: String,
    pub city: String,
    pub agency: String,
    /// `bus`, `subway`, `light_rail`, `commuter_rail`, ...
    pub mode: String,
    pub scenario_type: String,
    pub corridor_type: String,
    /// `am_peak`, `midday`, `pm_peak`, `overnight`.
    pub time_of_day: String,
    /// `weekday` or `weekend`.
    pub weekday: String,
    pub peak_delay_minutes: f64,
    pub duration_minutes: f64,
    pub riders_impacted: i64,
    #[serde(default)]
    pub actions_taken: Vec<String>,
    pub outcome_quality: OutcomeQuality,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

/// Attributes to match case studies against. Unset fields do not score.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseStudyQuery {
    pub mode: Option<String>,
    pub scenario_type: Option<String>,
    pub time_of_day: Option<String>,
    pub weekday: Option<String>,
    pub corridor_type: Option<String>,
}

impl CaseStudyQuery {
    /// Query for a route at a point in (local) time.
    pub fn for_route<T: Datelike + Timelike>(route_id: &str, at: &T) -> Self {
        let (mode, corridor_type) = infer_mode(route_id);
        Self {
            mode: Some(mode.to_string()),
            corridor_type: Some(corridor_type.to_string()),
            time_of_day: Some(time_of_day(at.hour()).to_string()),
            weekday: Some(weekday_kind(at.weekday()).to_string()),
            scenario_type: None,
        }
    }
}

const MAX_RESULTS: usize = 5;

fn score(cs: &CaseStudy, q: &CaseStudyQuery) -> f64 {
    let hit = |want: &Option<String>, have: &str| want.as_deref() == Some(have);
    let mut s = 0.0;
    if hit(&q.mode, &cs.mode) {
        s += 2.0;
    }
    if hit(&q.scenario_type, &cs.scenario_type) {
        s += 3.0;
    }
    if hit(&q.corridor_type, &cs.corridor_type) {
        s += 1.0;
    }
    if hit(&q.time_of_day, &cs.time_of_day) {
        s += 1.0;
    }
    if hit(&q.weekday, &cs.weekday) {
        s += 1.0;
    }
    if cs.outcome_quality == OutcomeQuality::Good {
        s += 0.5;
    }
    s
}

/// Ranks `all` by relevance to `query` and returns at most five. When fewer
/// than three case studies score above zero, the top five overall are
/// returned instead.
pub fn find_relevant_case_studies(all: &[CaseStudy], query: &CaseStudyQuery) -> Vec<CaseStudy> {
    let mut scored: Vec<(f64, &CaseStudy)> = all.iter().map(|cs| (score(cs, query), cs)).collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    let non_zero = scored.iter().filter(|(s, _)| *s > 0.0).count();
    let keep_zero = non_zero < 3;
    scored
        .into_iter()
        .filter(|(s, _)| keep_zero || *s > 0.0)
        .take(MAX_RESULTS)
        .map(|(_, cs)| cs.clone())
        .collect()
}

/// Service period for an hour of day (0–23).
pub fn time_of_day(hour: u32) -> &'static str {
    match hour {
        0..=9 => "am_peak",
        10..=15 => "midday",
        16..=21 => "pm_peak",
        _ => "overnight",
    }
}

/// `weekend` on Saturday/Sunday, else `weekday`.
pub fn weekday_kind(day: Weekday) -> &'static str {
    match day {
        Weekday::Sat | Weekday::Sun => "weekend",
        _ => "weekday",
    }
}

/// Mode and corridor type guessed from a route id.
pub fn infer_mode(route_id: &str) -> (&'static str, &'static str) {
    let r = route_id.to_lowercase();
    if r.contains("green") {
        ("light_rail", "core_subway")
    } else if r.contains("red") || r.contains("orange") || r.contains("blue") {
        ("subway", "core_subway")
    } else {
        ("bus", "urban_trunk")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn buckets_hours_and_days() {
        assert_eq!(time_of_day(0), "am_peak");
        assert_eq!(time_of_day(9), "am_peak");
        assert_eq!(time_of_day(10), "midday");
        assert_eq!(time_of_day(16), "pm_peak");
        assert_eq!(time_of_day(22), "overnight");
        assert_eq!(weekday_kind(Weekday::Sun), "weekend");
        assert_eq!(weekday_kind(Weekday::Wed), "weekday");
    }

    #[test]
    fn infers_mode_from_route() {
        assert_eq!(infer_mode("Green-B"), ("light_rail", "core_subway"));
        assert_eq!(infer_mode("Red"), ("subway", "core_subway"));
        assert_eq!(infer_mode("10"), ("bus", "urban_trunk"));
    }

    #[test]
    fn query_for_route_uses_local_time() {
        // 2024-03-09 is a Saturday.
        let at = NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|d| d.and_hms_opt(17, 30, 0))
            .unwrap();
        let q = CaseStudyQuery::for_route("Orange", &at);
        assert_eq!(q.mode.as_deref(), Some("subway"));
        assert_eq!(q.time_of_day.as_deref(), Some("pm_peak"));
        assert_eq!(q.weekday.as_deref(), Some("weekend"));
    }
}
