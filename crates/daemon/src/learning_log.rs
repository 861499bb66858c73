//! File-backed log of lessons learned.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use pulseops_core::api::NewLearningEntry;
use pulseops_core::model::LearningEntry;
use pulseops_core::new_ulid;
use tokio::sync::Mutex;
use tracing::{error, warn};

pub const LEARNING_LOG_FILE: &str = "learning_log.json";

pub struct LearningLog {
    path: PathBuf,
    /// `None` until first use.
    entries: Mutex<Option<Vec<LearningEntry>>>,
}

impl LearningLog {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(LEARNING_LOG_FILE),
            entries: Mutex::new(None),
        }
    }

    /// The last `limit` entries, oldest first.
    pub async fn recent(&self, limit: usize) -> Vec<LearningEntry> {
        let mut guard = self.entries.lock().await;
        let entries = self.loaded(&mut guard).await;
        let start = entries.len().saturating_sub(limit);
        entries[start..].to_vec()
    }

    /// Appends an entry and rewrites the file. A failed write is logged; the
    /// entry stays in memory either way.
    pub async fn add(&self, new: NewLearningEntry) -> LearningEntry {
        let entry = LearningEntry {
            id: format!("log_{}", new_ulid()),
            created_at: Utc::now().to_rfc3339(),
            incident_id: new.incident_id,
            route_id: new.route_id,
            summary: new.summary,
            category: new.category,
        };

        let mut guard = self.entries.lock().await;
        let entries = self.loaded(&mut guard).await;
        entries.push(entry.clone());
        if let Err(e) = persist(&self.path, entries).await {
            error!(error = %format!("{e:#}"), "learning log persist failed");
        }
        entry
    }

    async fn loaded<'a>(&self, slot: &'a mut Option<Vec<LearningEntry>>) -> &'a mut Vec<LearningEntry> {
        if slot.is_none() {
            let entries = match tokio::fs::read(&self.path).await {
                Ok(raw) => serde_json::from_slice(&raw).unwrap_or_else(|e| {
                    warn!(error = %e, path = %self.path.display(), "learning log unreadable; starting empty");
                    Vec::new()
                }),
                Err(_) => Vec::new(),
            };
            *slot = Some(entries);
        }
        slot.get_or_insert_with(Vec::new)
    }
}

async fn persist(path: &Path, entries: &[LearningEntry]) -> Result<()> {
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await.context("create data dir")?;
    }
    let body = serde_json::to_vec_pretty(entries)?;
    tokio::fs::write(path, body)
        .await
        .with_context(|| format!("write {}", path.display()))
}
