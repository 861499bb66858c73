//! Optional weather and events feeds. Anything unconfigured or failing
//! degrades to "no data".

use std::time::Duration;

use anyhow::{Context, Result};
use pulseops_core::model::{EventSummary, ExternalContext, Intensity, WeatherSummary};
use reqwest::Client;
use serde_json::Value;
use tracing::warn;

use crate::config::ExternalConfig;

#[derive(Clone)]
struct Endpoint {
    url: String,
    key: String,
}

impl Endpoint {
    fn new(url: &Option<String>, key: &Option<String>) -> Option<Self> {
        match (url.as_deref(), key.as_deref()) {
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => Some(Self {
                url: url.to_string(),
                key: key.to_string(),
            }),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct ExternalData {
    client: Client,
    timeout: Duration,
    weather: Option<Endpoint>,
    events: Option<Endpoint>,
}

impl ExternalData {
    pub fn new(client: Client, cfg: &ExternalConfig, timeout: Duration) -> Self {
        Self {
            client,
            timeout,
            weather: Endpoint::new(&cfg.weather_url, &cfg.weather_key),
            events: Endpoint::new(&cfg.events_url, &cfg.events_key),
        }
    }

    pub async fn weather(&self) -> Option<WeatherSummary> {
        let ep = self.weather.as_ref()?;
        match self.fetch(ep).await {
            Ok(v) => Some(weather_from_json(&v)),
            Err(e) => {
                warn!(error = %e, "weather fetch failed");
                None
            }
        }
    }

    pub async fn events(&self) -> Vec<EventSummary> {
        let Some(ep) = self.events.as_ref() else {
            return Vec::new();
        };
        match self.fetch(ep).await {
            Ok(v) => events_from_json(&v),
            Err(e) => {
                warn!(error = %e, "events fetch failed");
                Vec::new()
            }
        }
    }

    /// Weather and events fetched concurrently.
    pub async fn context(&self) -> ExternalContext {
        let (weather, events) = tokio::join!(self.weather(), self.events());
        ExternalContext { weather, events }
    }

    async fn fetch(&self, ep: &Endpoint) -> Result<Value> {
        self.client
            .get(&ep.url)
            .bearer_auth(&ep.key)
            .timeout(self.timeout)
            .send()
            .await
            .context("request")?
            .error_for_status()
            .context("status")?
            .json::<Value>()
            .await
            .context("decode")
    }
}

fn str_field<'a>(v: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| v.get(*k).and_then(Value::as_str)).filter(|s| !s.is_empty())
}

fn display(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn weather_from_json(v: &Value) -> WeatherSummary {
    let condition = str_field(v, &["condition", "weather"])
        .unwrap_or("clear")
        .to_lowercase();
    let intensity = v
        .get("intensity")
        .and_then(|i| serde_json::from_value::<Intensity>(i.clone()).ok())
        .unwrap_or_default();
    let temperature_c = ["temperature_c", "temp_c"]
        .iter()
        .find_map(|k| v.get(*k).and_then(Value::as_f64));
    WeatherSummary {
        condition,
        intensity,
        temperature_c,
    }
}

pub fn events_from_json(v: &Value) -> Vec<EventSummary> {
    let items = ["events", "items"]
        .iter()
        .find_map(|k| v.get(*k).and_then(Value::as_array))
        .cloned()
        .unwrap_or_default();

    items
        .iter()
        .enumerate()
        .map(|(i, item)| EventSummary {
            id: ["id", "slug"]
                .iter()
                .find_map(|k| item.get(*k).and_then(display))
                .unwrap_or_else(|| i.to_string()),
            name: str_field(item, &["name", "title"]).unwrap_or("Event").to_string(),
            venue: str_field(item, &["venue", "location"]).map(str::to_string),
            start_time: str_field(item, &["start_time", "datetime"]).map(str::to_string),
            expected_attendance: ["expected_attendance", "attendance"]
                .iter()
                .find_map(|k| item.get(*k).and_then(Value::as_i64))
                .filter(|n| *n != 0),
            relevance_score: 0.5,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn weather_falls_back_field_by_field() {
        let w = weather_from_json(&json!({ "weather": "Heavy Snow", "temp_c": -3.5 }));
        assert_eq!(w.condition, "heavy snow");
        assert_eq!(w.intensity, Intensity::Moderate);
        assert_eq!(w.temperature_c, Some(-3.5));

        let w = weather_from_json(&json!({ "intensity": "heavy" }));
        assert_eq!(w.condition, "clear");
        assert_eq!(w.intensity, Intensity::Heavy);
        assert_eq!(w.temperature_c, None);
    }

    #[test]
    fn events_accept_alternate_keys() {
        let events = events_from_json(&json!({
            "items": [
                { "slug": "sox", "title": "Red Sox", "location": "Fenway", "datetime": "2025-06-01T19:10:00", "attendance": 37000 },
                { "id": 7 },
                {}
            ]
        }));
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].id, "sox");
        assert_eq!(events[0].name, "Red Sox");
        assert_eq!(events[0].venue.as_deref(), Some("Fenway"));
        assert_eq!(events[0].expected_attendance, Some(37000));
        assert_eq!(events[1].id, "7");
        assert_eq!(events[2].id, "2");
        assert_eq!(events[2].name, "Event");
        assert!(events.iter().all(|e| e.relevance_score == 0.5));
        assert!(events_from_json(&json!({})).is_empty());
    }

    #[tokio::test]
    async fn unconfigured_yields_nothing() {
        let ext = ExternalData::new(Client::new(), &ExternalConfig::default(), Duration::from_secs(1));
        assert_eq!(ext.context().await, ExternalContext::default());
    }
}
