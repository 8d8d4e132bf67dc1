//! Run artifacts: the result record and state screenshots.

use std::path::{Path, PathBuf};

use action_flow::SnapshotSink;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use threadbot_core_types::{NavState, RunReport};
use tokio::fs;
use tracing::info;

/// Write `report` as pretty JSON, replacing any previous record.
pub async fn write_report(path: &Path, report: &RunReport) -> Result<()> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("creating result directory {}", dir.display()))?;
    }
    let payload = serde_json::to_vec_pretty(report).context("serializing run report")?;
    fs::write(path, payload)
        .await
        .with_context(|| format!("writing run report to {}", path.display()))?;
    info!(
        path = %path.display(),
        final_state = %report.final_state,
        errors = report.errors.len(),
        "run report written"
    );
    Ok(())
}

/// Stores PNG screenshots as `<state>-<timestamp>.png`.
pub struct ScreenshotDir {
    dir: PathBuf,
}

impl ScreenshotDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn file_for(&self, state: NavState) -> PathBuf {
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%3fZ");
        self.dir.join(format!("{state}-{stamp}.png"))
    }
}

#[async_trait]
impl SnapshotSink for ScreenshotDir {
    async fn store(&self, state: NavState, png: Vec<u8>) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating screenshot directory {}", self.dir.display()))?;
        let path = self.file_for(state);
        fs::write(&path, png)
            .await
            .with_context(|| format!("writing screenshot {}", path.display()))?;
        info!(%state, path = %path.display(), "screenshot saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use threadbot_core_types::{ErrorCategory, RunId, SubmissionMethod};

    #[tokio::test]
    async fn report_uses_camel_case_record_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("result.json");

        let mut report = RunReport::new(RunId("run-1".into()));
        report.enter(NavState::Home);
        report.enter(NavState::Profile);
        report.login_succeeded = true;
        report.submission = Some(SubmissionMethod::Keyboard);
        report.record_error(ErrorCategory::ConsoleError, "boom");
        report.finish();
        write_report(&path, &report).await.unwrap();

        let value: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(value["loginSucceeded"], Value::Bool(true));
        assert!(value["startTime"].is_string());
        assert!(value["endTime"].is_string());
        assert_eq!(value["reachedStates"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["submission"], "keyboard");
        assert_eq!(value["errors"][0]["message"], "boom");
    }

    #[tokio::test]
    async fn screenshots_are_named_by_state() {
        let dir = tempfile::tempdir().unwrap();
        let sink = ScreenshotDir::new(dir.path().join("shots"));
        sink.store(NavState::Failed, vec![1, 2, 3]).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path().join("shots"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("failed-"));
        assert!(names[0].ends_with(".png"));
    }
}
