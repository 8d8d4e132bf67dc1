#![allow(dead_code)]

//! Shared primitives for the threadbot action and navigation layers.
//!
//! Everything here is plain data: intents and strategies are built once per
//! navigation state, action results and run reports are produced while a run
//! is in progress.

pub mod intent;
pub mod lexicon;
pub mod report;
pub mod result;
pub mod run_config;
pub mod state;
pub mod strategy;

use std::fmt;

use uuid::Uuid;

pub use intent::{BoundingBoxHint, Intent, IntentKind};
pub use report::{ErrorCategory, RunError, RunReport, SubmissionMethod};
pub use result::{ActionResult, AttemptDiagnostic, AttemptError};
pub use run_config::{RunConfig, RunTarget, TargetError};
pub use state::NavState;
pub use strategy::{order_strategies, Strategy, StrategyKind, DEFAULT_STRATEGY_TIMEOUT_MS};

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
