use crate::scenario::ScenarioOutcome;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
    Passed,
    Failed,
}

/// Machine-readable summary of one scenario run.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub status: ScenarioStatus,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub artifacts: Vec<PathBuf>,
    pub outcome: Option<ScenarioOutcome>,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.status == ScenarioStatus::Passed
    }

    /// Write `<stem>.json` into `dir`.
    pub async fn write_to(&self, dir: &Path, stem: &str) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(format!("{}.json", stem));
        let json = serde_json::to_vec_pretty(self).map_err(std::io::Error::other)?;
        tokio::fs::write(&path, json).await?;
        Ok(path)
    }
}

/// `<name>-<unix millis>`, unique enough for sequential runs.
pub fn artifact_stem(name: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("{}-{}", name, millis)
}
