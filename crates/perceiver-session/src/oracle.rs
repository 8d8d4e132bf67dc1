//! Login State Oracle.
//!
//! Precedence, highest first:
//! 1. a present decisive logged-out signal
//! 2. a present decisive logged-in signal
//! 3. an absolute majority of all supporting signals being present and positive
//! 4. otherwise not logged in, low confidence
//!
//! Stale DOM fragments are common on the target pages, so a negative
//! decisive signal always beats any amount of positive evidence.

use serde::{Deserialize, Serialize};

use crate::signal::{LoginSignal, Polarity, SignalWeight};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginVerdict {
    pub logged_in: bool,
    pub confidence: Confidence,
    /// Signal that settled the verdict, if a decisive one did.
    pub decided_by: Option<String>,
}

impl LoginVerdict {
    fn new(logged_in: bool, confidence: Confidence, decided_by: Option<&str>) -> Self {
        Self {
            logged_in,
            confidence,
            decided_by: decided_by.map(str::to_string),
        }
    }
}

pub fn evaluate(signals: &[LoginSignal]) -> LoginVerdict {
    let present_decisive = |polarity: Polarity| {
        signals
            .iter()
            .find(|s| s.present && s.weight == SignalWeight::Decisive && s.polarity == polarity)
    };

    if let Some(signal) = present_decisive(Polarity::LoggedOut) {
        return LoginVerdict::new(false, Confidence::High, Some(&signal.name));
    }
    if let Some(signal) = present_decisive(Polarity::LoggedIn) {
        return LoginVerdict::new(true, Confidence::High, Some(&signal.name));
    }

    let supporting: Vec<&LoginSignal> = signals
        .iter()
        .filter(|s| s.weight == SignalWeight::Supporting)
        .collect();
    let positive_total = supporting
        .iter()
        .filter(|s| s.polarity == Polarity::LoggedIn)
        .count();
    let positive_present = supporting
        .iter()
        .filter(|s| s.present && s.polarity == Polarity::LoggedIn)
        .count();
    let negative_present = supporting
        .iter()
        .filter(|s| s.present && s.polarity == Polarity::LoggedOut)
        .count();

    if positive_present * 2 > supporting.len() && positive_present > negative_present {
        let confidence = if negative_present == 0 && positive_present == positive_total {
            Confidence::High
        } else {
            Confidence::Low
        };
        return LoginVerdict::new(true, confidence, None);
    }

    LoginVerdict::new(false, Confidence::Low, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supporting_all_positive(count: usize) -> Vec<LoginSignal> {
        (0..count)
            .map(|i| LoginSignal::supporting_positive(format!("support-{i}"), true))
            .collect()
    }

    #[test]
    fn decisive_negative_dominates_any_supporting_evidence() {
        for count in [0, 1, 5, 50] {
            let mut signals = supporting_all_positive(count);
            signals.push(LoginSignal::decisive_negative("login-prompt", true));
            let verdict = evaluate(&signals);
            assert!(!verdict.logged_in, "count {count}");
            assert_eq!(verdict.confidence, Confidence::High);
            assert_eq!(verdict.decided_by.as_deref(), Some("login-prompt"));
        }
    }

    #[test]
    fn contradictory_decisive_signals_are_conservative() {
        let signals = vec![
            LoginSignal::decisive_positive("logout-option", true),
            LoginSignal::decisive_negative("account-chooser", true),
        ];
        assert!(!evaluate(&signals).logged_in);
    }

    #[test]
    fn decisive_positive_wins_without_negatives() {
        let signals = vec![
            LoginSignal::decisive_positive("logout-option", true),
            LoginSignal::decisive_negative("account-chooser", false),
            LoginSignal::supporting_negative("login-text", true),
        ];
        let verdict = evaluate(&signals);
        assert!(verdict.logged_in);
        assert_eq!(verdict.confidence, Confidence::High);
    }

    #[test]
    fn supporting_majority_is_required() {
        let signals = vec![
            LoginSignal::supporting_positive("nav", true),
            LoginSignal::supporting_positive("feed", true),
            LoginSignal::supporting_positive("search", false),
            LoginSignal::supporting_positive("create", false),
        ];
        assert!(!evaluate(&signals).logged_in);

        let signals = vec![
            LoginSignal::supporting_positive("nav", true),
            LoginSignal::supporting_positive("feed", true),
            LoginSignal::supporting_positive("search", true),
            LoginSignal::supporting_negative("login-text", false),
        ];
        let verdict = evaluate(&signals);
        assert!(verdict.logged_in);
        assert_eq!(verdict.confidence, Confidence::High);
    }

    #[test]
    fn single_spurious_supporting_signal_is_not_enough() {
        let signals = vec![
            LoginSignal::supporting_positive("search", true),
            LoginSignal::supporting_positive("nav", false),
            LoginSignal::supporting_negative("login-text", true),
        ];
        let verdict = evaluate(&signals);
        assert!(!verdict.logged_in);
        assert_eq!(verdict.confidence, Confidence::Low);
    }

    #[test]
    fn no_evidence_defaults_to_logged_out() {
        let verdict = evaluate(&[]);
        assert!(!verdict.logged_in);
        assert_eq!(verdict.confidence, Confidence::Low);
    }
}
