//! One run, end to end: browser session, state machine, result record.

use std::path::PathBuf;
use std::sync::Arc;

use action_flow::{FlowConfig, NavigationStateMachine};
use async_trait::async_trait;
use cdp_adapter::{BrowserOptions, ChromiumDriver, CollectingObserver, PageDriver};
use threadbot_core_types::{ErrorCategory, NavState, RunConfig, RunId, RunReport};
use tracing::{error, info, warn};

use crate::artifacts::{write_report, ScreenshotDir};
use crate::config::AppConfig;
use crate::session_store::FileSessionStore;

/// Starts runs. The webhook server only knows this trait.
#[async_trait]
pub trait RunLauncher: Send + Sync {
    async fn launch(&self, run_id: RunId, run: RunConfig) -> RunReport;
}

/// Everything a run needs besides the page itself.
#[derive(Clone)]
pub struct RunEnvironment {
    pub flow: Arc<FlowConfig>,
    pub cookie_file: PathBuf,
    pub result_file: PathBuf,
    pub screenshot_dir: Option<PathBuf>,
}

impl RunEnvironment {
    pub fn from_config(config: &AppConfig, flow: FlowConfig) -> Self {
        Self {
            flow: Arc::new(flow),
            cookie_file: config.paths.cookie_file.clone(),
            result_file: config.paths.result_file.clone(),
            screenshot_dir: config
                .paths
                .save_screenshots
                .then(|| config.paths.screenshot_dir.clone()),
        }
    }

    /// Drive `driver` through one run and write the result record.
    pub async fn execute(
        &self,
        driver: Arc<dyn PageDriver>,
        observer: Option<CollectingObserver>,
        run_id: RunId,
        run: RunConfig,
    ) -> RunReport {
        let mut machine = NavigationStateMachine::new(driver, Arc::new(run), self.flow.clone())
            .with_session_store(Arc::new(FileSessionStore::new(&self.cookie_file)));
        if let Some(dir) = &self.screenshot_dir {
            machine = machine.with_snapshot_sink(Arc::new(ScreenshotDir::new(dir)));
        }
        if let Some(observer) = observer {
            machine = machine.with_observer(observer);
        }

        let report = machine.run(run_id).await;
        self.record(&report).await;
        report
    }

    /// Record a run that never got a page.
    pub async fn record_launch_failure(&self, run_id: RunId, message: String) -> RunReport {
        let mut report = RunReport::new(run_id);
        report.record_error(ErrorCategory::InfrastructureFault, message);
        report.enter(NavState::Failed);
        report.finish();
        self.record(&report).await;
        report
    }

    async fn record(&self, report: &RunReport) {
        if let Err(err) = write_report(&self.result_file, report).await {
            error!(?err, "failed to write run report");
        }
    }
}

/// Launches a fresh Chromium per run.
pub struct BrowserLauncher {
    options: BrowserOptions,
    env: RunEnvironment,
}

impl BrowserLauncher {
    pub fn new(options: BrowserOptions, env: RunEnvironment) -> Self {
        Self { options, env }
    }
}

#[async_trait]
impl RunLauncher for BrowserLauncher {
    async fn launch(&self, run_id: RunId, run: RunConfig) -> RunReport {
        let driver = match ChromiumDriver::launch(self.options.clone()).await {
            Ok(driver) => Arc::new(driver),
            Err(err) => {
                error!(%run_id, %err, "browser launch failed");
                return self
                    .env
                    .record_launch_failure(run_id, err.to_string())
                    .await;
            }
        };

        let observer = CollectingObserver::new();
        if let Err(err) = driver.attach_observer(Arc::new(observer.clone())).await {
            warn!(%err, "console observer unavailable for this run");
        }

        let report = self
            .env
            .execute(driver.clone(), Some(observer), run_id, run)
            .await;
        driver.close().await;
        info!(
            run_id = %report.run_id,
            final_state = %report.final_state,
            elapsed_ms = ?report.elapsed_ms(),
            "browser session closed"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdp_adapter::sim::{SimElement, SimScreen, SimulatedPage};
    use threadbot_core_types::RunTarget;

    fn env(dir: &std::path::Path) -> RunEnvironment {
        RunEnvironment {
            flow: Arc::new(FlowConfig {
                retry_budget: 0,
                backoff_ms: 10,
                strategy_timeout_ms: 100,
                verification_timeout_ms: 100,
                consent_timeout_ms: 200,
                settle_ms: 10,
                ..FlowConfig::default()
            }),
            cookie_file: dir.join("cookies.json"),
            result_file: dir.join("result.json"),
            screenshot_dir: Some(dir.join("shots")),
        }
    }

    fn run() -> RunConfig {
        RunConfig::new(
            "dorar.ing",
            "hello",
            RunTarget::Profile {
                handle: "someone".into(),
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn launch_failure_still_writes_one_record() {
        let dir = tempfile::tempdir().unwrap();
        let env = env(dir.path());
        let report = env
            .record_launch_failure(RunId::new(), "no chrome".into())
            .await;
        assert_eq!(report.final_state, NavState::Failed);
        assert!(report.has_category(ErrorCategory::InfrastructureFault));
        assert!(dir.path().join("result.json").exists());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_run_writes_record_and_screenshot() {
        let dir = tempfile::tempdir().unwrap();
        let page = Arc::new(
            SimulatedPage::new().with_screen(
                "https://www.threads.net/",
                SimScreen::new()
                    .with_text("Log in")
                    .with_element(SimElement::button("other", "Sign up")),
            ),
        );

        let report = env(dir.path())
            .execute(page, None, RunId::new(), run())
            .await;

        assert_eq!(report.final_state, NavState::Failed);
        assert!(report.has_category(ErrorCategory::StateRetryExhausted));
        let written: serde_json::Value =
            serde_json::from_slice(&std::fs::read(dir.path().join("result.json")).unwrap())
                .unwrap();
        assert_eq!(written["finalState"], "Failed");
        assert_eq!(std::fs::read_dir(dir.path().join("shots")).unwrap().count(), 1);
    }
}
