//! Outcome of a single `resolve` call.

use thiserror::Error;

use crate::report::ErrorCategory;
use crate::strategy::StrategyKind;

/// Why one strategy attempt did not produce a verified effect.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AttemptError {
    #[error("intent has no keywords for a keyword-driven strategy")]
    MissingKeywords,

    #[error("no candidates found")]
    NoCandidates,

    #[error("{found} candidate(s) found, none actionable")]
    NoActionableCandidate { found: usize },

    #[error("positional fallback suppressed: other strategies produced candidates")]
    Suppressed,

    #[error("candidate discovery exceeded {timeout_ms}ms")]
    StrategyTimeout { timeout_ms: u64 },

    #[error("action failed: {0}")]
    ActionFailed(String),

    #[error("effect not observed within {timeout_ms}ms")]
    VerificationTimeout { timeout_ms: u64 },
}

impl AttemptError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AttemptError::VerificationTimeout { .. } => ErrorCategory::VerificationTimeout,
            _ => ErrorCategory::StrategyNotApplicable,
        }
    }

    /// True when the strategy located at least one element.
    pub fn had_candidates(&self) -> bool {
        matches!(
            self,
            AttemptError::NoActionableCandidate { .. }
                | AttemptError::ActionFailed(_)
                | AttemptError::VerificationTimeout { .. }
        )
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttemptDiagnostic {
    pub strategy: StrategyKind,
    pub priority: i32,
    pub error: AttemptError,
}

impl AttemptDiagnostic {
    pub fn new(strategy: StrategyKind, priority: i32, error: AttemptError) -> Self {
        Self {
            strategy,
            priority,
            error,
        }
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ActionResult {
    pub succeeded: bool,
    pub strategy_used: Option<StrategyKind>,
    pub elapsed_ms: u64,
    /// Every failed attempt, in the order it was made.
    pub diagnostics: Vec<AttemptDiagnostic>,
    /// Name of the verification check that confirmed the effect.
    pub matched_check: Option<String>,
}

impl ActionResult {
    pub fn success(
        strategy: StrategyKind,
        elapsed_ms: u64,
        diagnostics: Vec<AttemptDiagnostic>,
        matched_check: Option<String>,
    ) -> Self {
        Self {
            succeeded: true,
            strategy_used: Some(strategy),
            elapsed_ms,
            diagnostics,
            matched_check,
        }
    }

    pub fn failure(elapsed_ms: u64, diagnostics: Vec<AttemptDiagnostic>) -> Self {
        Self {
            succeeded: false,
            strategy_used: None,
            elapsed_ms,
            diagnostics,
            matched_check: None,
        }
    }

    /// One-line summary of the attempts, e.g. `role-query: no candidates; ...`.
    pub fn diagnostic_summary(&self) -> String {
        self.diagnostics
            .iter()
            .map(|diag| format!("{}: {}", diag.strategy, diag.error))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Category of the most informative failure in the trail.
    pub fn failure_category(&self) -> ErrorCategory {
        if self
            .diagnostics
            .iter()
            .any(|diag| matches!(diag.error, AttemptError::VerificationTimeout { .. }))
        {
            ErrorCategory::VerificationTimeout
        } else {
            ErrorCategory::StrategyNotApplicable
        }
    }
}
