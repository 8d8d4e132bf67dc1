use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use threadbot_core_types::{RunConfig, RunId, RunReport};
use tokio::sync::Mutex as RunGate;
use tracing::info;

use crate::runner::RunLauncher;

#[derive(Clone)]
pub struct ServeState {
    launcher: Arc<dyn RunLauncher>,
    base: Arc<RunConfig>,
    /// Held for the whole of a run; two runs never share the browser session.
    gate: Arc<RunGate<()>>,
    status: Arc<Mutex<RunStatus>>,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatus {
    pub active_run: Option<RunId>,
    pub queued: usize,
    pub last_report: Option<RunReport>,
}

impl ServeState {
    pub fn new(launcher: Arc<dyn RunLauncher>, base: RunConfig) -> Self {
        Self {
            launcher,
            base: Arc::new(base),
            gate: Arc::new(RunGate::new(())),
            status: Arc::new(Mutex::new(RunStatus::default())),
        }
    }

    pub fn status(&self) -> RunStatus {
        self.status.lock().clone()
    }

    /// Queue one run with `payload` as the comment and return its id.
    pub fn trigger(&self, payload: String) -> RunId {
        let run_id = RunId::new();
        let run = self.base.with_payload(payload);
        self.status.lock().queued += 1;

        let state = self.clone();
        let id = run_id.clone();
        tokio::spawn(async move {
            let _turn = state.gate.lock().await;
            {
                let mut status = state.status.lock();
                status.queued = status.queued.saturating_sub(1);
                status.active_run = Some(id.clone());
            }
            info!(run_id = %id, "triggered run starting");
            let report = state.launcher.launch(id, run).await;
            let mut status = state.status.lock();
            status.active_run = None;
            status.last_report = Some(report);
        });
        run_id
    }
}
