use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

#[derive(Debug, Clone, Serialize)]
pub struct RunLog {
    pub schema_version: &'static str,
    pub tool_version: String,
    pub started_at: String,
    pub finished_at: String,
    pub server: String,
    pub user: String,
    pub report_days: u32,
    pub output: String,
    pub sheets: Vec<SheetLog>,
    pub dr_copies: StepLog,
    pub chart: StepLog,
}

#[derive(Debug, Clone, Serialize)]
pub struct SheetLog {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepLog {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl StepLog {
    pub fn ok() -> Self {
        Self {
            status: "ok",
            reason: None,
        }
    }

    pub fn degraded(reason: impl Into<String>) -> Self {
        Self {
            status: "skipped",
            reason: Some(reason.into()),
        }
    }
}

pub fn logs_dir(home_dir: &Path) -> PathBuf {
    home_dir.join(".config/ppdmat/logs")
}

pub fn format_timestamp(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string())
}

pub fn write_run_log(home_dir: &Path, finished_at: OffsetDateTime, log: &RunLog) -> Result<PathBuf> {
    let dir = logs_dir(home_dir);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create log directory: {}", dir.display()))?;

    let pid = std::process::id();
    let ts = finished_at.unix_timestamp_nanos();
    let path = dir.join(format!("run-{pid}-{ts}.json"));

    let json = serde_json::to_string_pretty(log).context("failed to serialize run log")?;
    std::fs::write(&path, json)
        .with_context(|| format!("failed to write run log: {}", path.display()))?;
    Ok(path)
}
