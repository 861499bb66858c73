//! Static JSON catalogues shipped in the data directory.

use std::path::Path;

use anyhow::{Context, Result};
use pulseops_core::brain::TransitBrain;
use pulseops_core::case_studies::CaseStudy;
use pulseops_core::model::TestScenario;
use serde::de::DeserializeOwned;
use tracing::{error, info};

pub const CASE_STUDIES_FILE: &str = "case_studies.json";
pub const TEST_SCENARIOS_FILE: &str = "test_scenarios.json";
pub const TRANSIT_BRAIN_FILE: &str = "transit_brain.json";

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub case_studies: Vec<CaseStudy>,
    pub scenarios: Vec<TestScenario>,
    pub brain: TransitBrain,
}

impl Catalog {
    /// Loads every catalogue under `dir`. A missing or invalid file yields an
    /// empty catalogue and an error log.
    pub async fn load(dir: &Path) -> Self {
        let catalog = Self {
            case_studies: load_or_default(&dir.join(CASE_STUDIES_FILE)).await,
            scenarios: load_or_default(&dir.join(TEST_SCENARIOS_FILE)).await,
            brain: load_or_default(&dir.join(TRANSIT_BRAIN_FILE)).await,
        };
        info!(
            case_studies = catalog.case_studies.len(),
            scenarios = catalog.scenarios.len(),
            corridors = catalog.brain.corridors.len(),
            rules = catalog.brain.rules.len(),
            "catalogues loaded"
        );
        catalog
    }

    pub fn scenario(&self, id: &str) -> Option<&TestScenario> {
        self.scenarios.iter().find(|s| s.id == id)
    }
}

async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = tokio::fs::read(path)
        .await
        .with_context(|| format!("read {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("parse {}", path.display()))
}

async fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match load_json(path).await {
        Ok(v) => v,
        Err(e) => {
            error!(error = %format!("{e:#}"), "catalogue unavailable");
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_and_invalid_files_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join(CASE_STUDIES_FILE), b"{ not json").await.unwrap();
        tokio::fs::write(
            dir.path().join(TRANSIT_BRAIN_FILE),
            br#"{ "corridors": [ { "id": "red_core", "name": "Red core", "routes": ["Red"] } ] }"#,
        )
        .await
        .unwrap();

        let catalog = Catalog::load(dir.path()).await;
        assert!(catalog.case_studies.is_empty());
        assert!(catalog.scenarios.is_empty());
        assert_eq!(catalog.brain.corridors.len(), 1);
        assert!(catalog.brain.rules.is_empty());
        assert!(catalog.scenario("anything").is_none());
    }
}
