//! Failure handling strategies

use crate::types::FailureStrategy;
use async_trait::async_trait;
use threadbot_core_types::NavState;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

/// Failure handler trait
#[async_trait]
pub trait FailureHandler: Send + Sync {
    /// Decide whether `state` may be re-entered after `attempt` failed entries
    async fn handle_failure(
        &self,
        state: NavState,
        strategy: FailureStrategy,
        reason: &str,
        attempt: u32,
    ) -> FailureHandlerResult;

    /// Check if retry should be attempted
    fn should_retry(&self, strategy: FailureStrategy, attempt: u32) -> bool;

    /// Calculate backoff duration for retry
    fn calculate_backoff(&self, strategy: FailureStrategy, attempt: u32) -> Duration;
}

/// Result of failure handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureHandlerResult {
    /// Fail the run
    Abort(String),

    /// Re-enter the state
    Retry { attempt: u32, backoff_ms: u64 },
}

/// Default failure handler implementation
pub struct DefaultFailureHandler;

impl DefaultFailureHandler {
    /// Create a new default failure handler
    pub fn new() -> Self {
        Self
    }
}

impl Default for DefaultFailureHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FailureHandler for DefaultFailureHandler {
    async fn handle_failure(
        &self,
        state: NavState,
        strategy: FailureStrategy,
        reason: &str,
        attempt: u32,
    ) -> FailureHandlerResult {
        match strategy {
            FailureStrategy::Abort => {
                warn!(%state, reason, "state failed, aborting run");
                FailureHandlerResult::Abort(reason.to_string())
            }

            FailureStrategy::Retry { max_attempts, .. } => {
                if !self.should_retry(strategy, attempt) {
                    warn!(%state, attempt, reason, "state failed, retry budget exhausted");
                    FailureHandlerResult::Abort(format!(
                        "max attempts ({}) exceeded: {}",
                        max_attempts, reason
                    ))
                } else {
                    let backoff = self.calculate_backoff(strategy, attempt);
                    info!(
                        %state,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        reason,
                        "state failed, retrying"
                    );

                    sleep(backoff).await;

                    FailureHandlerResult::Retry {
                        attempt: attempt + 1,
                        backoff_ms: backoff.as_millis() as u64,
                    }
                }
            }
        }
    }

    fn should_retry(&self, strategy: FailureStrategy, attempt: u32) -> bool {
        match strategy {
            FailureStrategy::Retry { max_attempts, .. } => attempt < max_attempts,
            FailureStrategy::Abort => false,
        }
    }

    fn calculate_backoff(&self, strategy: FailureStrategy, attempt: u32) -> Duration {
        match strategy {
            FailureStrategy::Retry { backoff_ms, .. } => {
                // Exponential backoff: backoff_ms * 2^(attempt-1)
                let multiplier = 2u64.saturating_pow(attempt.saturating_sub(1));
                let total_ms = backoff_ms.saturating_mul(multiplier);
                // Cap at 60 seconds
                let capped_ms = total_ms.min(60_000);
                Duration::from_millis(capped_ms)
            }
            FailureStrategy::Abort => Duration::from_millis(0),
        }
    }
}
