//! Flow execution error types

use action_locator::LocatorError;
use cdp_adapter::AdapterError;
use thiserror::Error;
use threadbot_core_types::{ErrorCategory, NavState};

/// Errors that end a run
///
/// Strategy misses and verification timeouts are not here; they stay inside
/// `ActionResult` diagnostics and only surface once a state's budget is spent.
#[derive(Debug, Error, Clone)]
pub enum FlowError {
    /// Browser primitive failed beyond recovery
    #[error("Infrastructure fault: {0}")]
    Infrastructure(AdapterError),

    /// A state kept failing until its retry budget ran out
    #[error("State {state} exhausted after {attempts} attempt(s): {reason}")]
    StateRetryExhausted {
        state: NavState,
        attempts: u32,
        reason: String,
    },

    /// Login needs input that cannot be supplied automatically
    #[error("Login blocked: {0}")]
    CredentialOrChallengeBlocked(String),

    /// Total run budget exceeded
    #[error("Run timed out after {0}ms")]
    Timeout(u64),

    /// A state plan was rejected by the resolver
    #[error("Invalid plan: {0}")]
    InvalidPlan(String),
}

impl FlowError {
    /// Category recorded in the run report.
    pub fn category(&self) -> ErrorCategory {
        match self {
            FlowError::Infrastructure(_) | FlowError::InvalidPlan(_) => {
                ErrorCategory::InfrastructureFault
            }
            FlowError::StateRetryExhausted { .. } => ErrorCategory::StateRetryExhausted,
            FlowError::CredentialOrChallengeBlocked(_) => {
                ErrorCategory::CredentialOrChallengeBlocked
            }
            FlowError::Timeout(_) => ErrorCategory::Timeout,
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Get error severity (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            FlowError::Infrastructure(_) | FlowError::InvalidPlan(_) => 3,
            FlowError::Timeout(_) | FlowError::StateRetryExhausted { .. } => 2,
            FlowError::CredentialOrChallengeBlocked(_) => 1,
        }
    }
}

impl From<LocatorError> for FlowError {
    fn from(err: LocatorError) -> Self {
        match err {
            LocatorError::Infrastructure(inner) => FlowError::Infrastructure(inner),
            other => FlowError::InvalidPlan(other.to_string()),
        }
    }
}

impl From<AdapterError> for FlowError {
    fn from(err: AdapterError) -> Self {
        FlowError::Infrastructure(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdp_adapter::AdapterErrorKind;

    #[test]
    fn categories_follow_taxonomy() {
        let crash = FlowError::from(LocatorError::Infrastructure(AdapterError::new(
            AdapterErrorKind::PageCrashed,
        )));
        assert_eq!(crash.category(), ErrorCategory::InfrastructureFault);
        assert_eq!(
            FlowError::CredentialOrChallengeBlocked("code".into()).category(),
            ErrorCategory::CredentialOrChallengeBlocked
        );
        let exhausted = FlowError::StateRetryExhausted {
            state: NavState::Profile,
            attempts: 4,
            reason: "no reply control".into(),
        };
        assert_eq!(exhausted.category(), ErrorCategory::StateRetryExhausted);
        assert!(exhausted.to_string().contains("profile"));
    }
}
