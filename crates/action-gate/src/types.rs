//! Core types for the verification gate

use crate::conditions::Check;
use serde::{Deserialize, Serialize};

pub const DEFAULT_VERIFICATION_TIMEOUT_MS: u64 = 3_000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// How checks inside one spec combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaceSemantics {
    /// Pass as soon as any check is satisfied.
    FirstMatchWins,
}

/// VerificationSpec - what must be observed after an action
///
/// Checks are raced: on every poll they are evaluated in declaration order
/// and the first satisfied one wins. With no checks the spec passes at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationSpec {
    pub checks: Vec<Check>,
    pub timeout_ms: u64,
    pub race: RaceSemantics,
    pub poll_interval_ms: u64,
}

impl VerificationSpec {
    pub fn new() -> Self {
        Self {
            checks: Vec::new(),
            timeout_ms: DEFAULT_VERIFICATION_TIMEOUT_MS,
            race: RaceSemantics::FirstMatchWins,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }

    /// Spec that is satisfied by any of `checks`.
    pub fn any_of<I>(checks: I) -> Self
    where
        I: IntoIterator<Item = Check>,
    {
        let mut spec = Self::new();
        for check in checks {
            spec = spec.with_check(check);
        }
        spec
    }

    /// Add a check; duplicates are ignored so the set stays ordered and unique.
    pub fn with_check(mut self, check: Check) -> Self {
        if !self.checks.contains(&check) {
            self.checks.push(check);
        }
        self
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms.max(1);
        self
    }

    pub fn has_checks(&self) -> bool {
        !self.checks.is_empty()
    }

    pub fn needs_baseline(&self) -> bool {
        self.checks.iter().any(Check::needs_baseline)
    }
}

impl Default for VerificationSpec {
    fn default() -> Self {
        Self::new()
    }
}

/// Page facts captured before the action ran.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationContext {
    pub baseline_url: Option<String>,
}

impl VerificationContext {
    pub fn with_baseline(url: impl Into<String>) -> Self {
        Self {
            baseline_url: Some(url.into()),
        }
    }
}

/// Result of one `verify` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub passed: bool,
    /// Name of the check that won the race.
    pub matched: Option<String>,
    pub elapsed_ms: u64,
    pub polls: u32,
}

impl VerificationOutcome {
    pub fn pass(matched: Option<String>, elapsed_ms: u64, polls: u32) -> Self {
        Self {
            passed: true,
            matched,
            elapsed_ms,
            polls,
        }
    }

    pub fn timeout(elapsed_ms: u64, polls: u32) -> Self {
        Self {
            passed: false,
            matched: None,
            elapsed_ms,
            polls,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_checks_unique_and_ordered() {
        let spec = VerificationSpec::any_of([
            Check::DialogPresent,
            Check::UrlChanged,
            Check::DialogPresent,
        ])
        .with_timeout(1500);
        assert_eq!(spec.checks, vec![Check::DialogPresent, Check::UrlChanged]);
        assert_eq!(spec.timeout_ms, 1500);
        assert_eq!(spec.race, RaceSemantics::FirstMatchWins);
        assert!(spec.needs_baseline());
    }

    #[test]
    fn poll_interval_never_zero() {
        let spec = VerificationSpec::new().with_poll_interval(0);
        assert_eq!(spec.poll_interval_ms, 1);
    }
}
