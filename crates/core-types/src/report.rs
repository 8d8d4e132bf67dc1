//! Run result record. Exactly one is produced per run, whatever the outcome.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::state::NavState;
use crate::RunId;

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    StrategyNotApplicable,
    VerificationTimeout,
    StateRetryExhausted,
    InfrastructureFault,
    CredentialOrChallengeBlocked,
    Timeout,
    ConsoleError,
    PageError,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::StrategyNotApplicable => "StrategyNotApplicable",
            ErrorCategory::VerificationTimeout => "VerificationTimeout",
            ErrorCategory::StateRetryExhausted => "StateRetryExhausted",
            ErrorCategory::InfrastructureFault => "InfrastructureFault",
            ErrorCategory::CredentialOrChallengeBlocked => "CredentialOrChallengeBlocked",
            ErrorCategory::Timeout => "Timeout",
            ErrorCategory::ConsoleError => "ConsoleError",
            ErrorCategory::PageError => "PageError",
        }
    }

    /// Categories that end the run on their own.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ErrorCategory::StateRetryExhausted
                | ErrorCategory::InfrastructureFault
                | ErrorCategory::CredentialOrChallengeBlocked
                | ErrorCategory::Timeout
        )
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunError {
    pub category: ErrorCategory,
    pub message: String,
}

/// How the comment was finally submitted.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "lowercase"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmissionMethod {
    Button,
    Keyboard,
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug, PartialEq)]
pub struct RunReport {
    pub run_id: RunId,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub login_succeeded: bool,
    pub reached_states: Vec<NavState>,
    pub final_state: NavState,
    pub profile_visited: bool,
    pub reply_button_clicked: bool,
    pub comment_dialog_opened: bool,
    pub comment_submitted: bool,
    pub submission: Option<SubmissionMethod>,
    pub errors: Vec<RunError>,
}

impl RunReport {
    pub fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            start_time: Utc::now(),
            end_time: None,
            login_succeeded: false,
            reached_states: Vec::new(),
            final_state: NavState::Home,
            profile_visited: false,
            reply_button_clicked: false,
            comment_dialog_opened: false,
            comment_submitted: false,
            submission: None,
            errors: Vec::new(),
        }
    }

    /// Record entry into `state`. Consecutive re-entries are collapsed.
    pub fn enter(&mut self, state: NavState) {
        if self.reached_states.last() != Some(&state) {
            self.reached_states.push(state);
        }
        self.final_state = state;
    }

    pub fn record_error(&mut self, category: ErrorCategory, message: impl Into<String>) {
        self.errors.push(RunError {
            category,
            message: message.into(),
        });
    }

    pub fn finish(&mut self) {
        self.end_time = Some(Utc::now());
    }

    pub fn succeeded(&self) -> bool {
        self.final_state == NavState::Done
    }

    pub fn has_category(&self, category: ErrorCategory) -> bool {
        self.errors.iter().any(|error| error.category == category)
    }

    pub fn elapsed_ms(&self) -> Option<i64> {
        self.end_time
            .map(|end| (end - self.start_time).num_milliseconds())
    }
}
