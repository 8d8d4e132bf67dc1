//! Flow configuration and transition types

use serde::{Deserialize, Serialize};
use std::time::Duration;
use threadbot_core_types::NavState;

/// Timing and retry configuration for one run
///
/// Built once from the application config and shared read-only with the
/// state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    pub home_url: String,
    pub explore_url: String,
    pub for_you_url: String,
    /// Re-entries allowed per state; total entries are `retry_budget + 1`.
    pub retry_budget: u32,
    pub backoff_ms: u64,
    pub total_budget_ms: u64,
    pub navigation_timeout_ms: u64,
    pub strategy_timeout_ms: u64,
    pub verification_timeout_ms: u64,
    /// How long to wait for the chooser or credential form after consent.
    pub consent_timeout_ms: u64,
    /// Fixed pause after navigations and clicks that load new content.
    pub settle_ms: u64,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            home_url: "https://www.threads.net/".to_string(),
            explore_url: "https://www.threads.net/explore".to_string(),
            for_you_url: "https://www.threads.net/for-you".to_string(),
            retry_budget: 3,
            backoff_ms: 1_000,
            total_budget_ms: 300_000,
            navigation_timeout_ms: 30_000,
            strategy_timeout_ms: 5_000,
            verification_timeout_ms: 3_000,
            consent_timeout_ms: 10_000,
            settle_ms: 2_000,
        }
    }
}

impl FlowConfig {
    pub fn failure_strategy(&self) -> FailureStrategy {
        FailureStrategy::Retry {
            max_attempts: self.retry_budget + 1,
            backoff_ms: self.backoff_ms,
        }
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn total_budget(&self) -> Duration {
        Duration::from_millis(self.total_budget_ms)
    }

    /// Pages searched for a reply control, target first.
    pub fn reply_pages(&self, target_url: &str) -> Vec<String> {
        vec![
            target_url.to_string(),
            self.explore_url.clone(),
            self.for_you_url.clone(),
        ]
    }
}

/// Failure strategy - how to handle a state that made no progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureStrategy {
    /// Fail the run on the first miss
    Abort,

    /// Re-enter the state with exponential backoff
    Retry { max_attempts: u32, backoff_ms: u64 },
}

/// Outcome of running one state's handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Progress was made.
    Advance(NavState),
    /// No progress; re-enter `to` if its budget allows.
    Retry { to: NavState, reason: String },
}

impl Transition {
    pub fn retry(to: NavState, reason: impl Into<String>) -> Self {
        Transition::Retry {
            to,
            reason: reason.into(),
        }
    }

    pub fn target(&self) -> NavState {
        match self {
            Transition::Advance(to) | Transition::Retry { to, .. } => *to,
        }
    }
}
