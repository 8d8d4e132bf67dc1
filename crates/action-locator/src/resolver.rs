//! Action resolver with ordered strategy fallback

use crate::{errors::LocatorError, strategies::finder_for, types::Discovery};
use action_gate::{VerificationContext, VerificationSpec, Verifier};
use async_trait::async_trait;
use cdp_adapter::{AdapterError, ElementProbe, PageDriver};
use std::sync::Arc;
use std::time::Duration;
use threadbot_core_types::{
    order_strategies, ActionResult, AttemptDiagnostic, AttemptError, Intent, IntentKind,
    Strategy, StrategyKind,
};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// Interval between candidate reads while a strategy waits for its target.
pub const CANDIDATE_POLL_MS: u64 = 200;

/// Action resolver trait
#[async_trait]
pub trait ActionResolver: Send + Sync {
    /// Realize `intent` with the first strategy whose action is verified.
    ///
    /// Returns `Ok` with `succeeded: false` when every strategy is exhausted;
    /// `Err` only for infrastructure faults and malformed input.
    async fn resolve(
        &self,
        intent: &Intent,
        strategies: &[Strategy],
        verification: &VerificationSpec,
    ) -> Result<ActionResult, LocatorError>;
}

/// Default resolver driving a page and a verifier
pub struct DefaultActionResolver {
    driver: Arc<dyn PageDriver>,
    verifier: Arc<dyn Verifier>,
    poll_interval: Duration,
}

impl DefaultActionResolver {
    pub fn new(driver: Arc<dyn PageDriver>, verifier: Arc<dyn Verifier>) -> Self {
        Self {
            driver,
            verifier,
            poll_interval: Duration::from_millis(CANDIDATE_POLL_MS),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    fn fatal_or<T>(result: Result<T, AdapterError>) -> Result<Result<T, AdapterError>, LocatorError> {
        match result {
            Err(err) if err.is_fatal() => Err(LocatorError::Infrastructure(err)),
            other => Ok(other),
        }
    }

    /// Poll one strategy until it yields an actionable target or its timeout elapses.
    async fn discover(&self, intent: &Intent, strategy: &Strategy) -> Result<Discovery, LocatorError> {
        let finder = finder_for(strategy.kind);
        let deadline = Instant::now() + Duration::from_millis(strategy.timeout_ms);

        loop {
            let discovery = match Self::fatal_or(
                finder.find(self.driver.as_ref(), intent, strategy).await,
            )? {
                Ok(discovery) => discovery,
                Err(err) => {
                    debug!(strategy = %strategy.kind, %err, "candidate read failed");
                    Discovery::failed_read()
                }
            };
            if discovery.has_target() {
                return Ok(discovery);
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(discovery);
            }
            sleep(self.poll_interval.min(deadline - now)).await;
        }
    }

    async fn act(&self, intent: &Intent, target: &ElementProbe) -> Result<(), AdapterError> {
        match intent.kind {
            IntentKind::Click => self.driver.click(target).await,
            IntentKind::Fill => {
                let payload = intent.payload.as_deref().unwrap_or_default();
                self.driver.fill(target, payload).await
            }
            IntentKind::WaitForEffect => Ok(()),
        }
    }
}

#[async_trait]
impl ActionResolver for DefaultActionResolver {
    async fn resolve(
        &self,
        intent: &Intent,
        strategies: &[Strategy],
        verification: &VerificationSpec,
    ) -> Result<ActionResult, LocatorError> {
        let start = Instant::now();
        let elapsed = || start.elapsed().as_millis() as u64;

        if intent.kind == IntentKind::Fill && intent.payload.is_none() {
            return Err(LocatorError::InvalidIntent(format!(
                "{intent} has no payload to fill"
            )));
        }
        if strategies.is_empty() {
            warn!(intent = %intent, "no strategies configured");
            return Ok(ActionResult::failure(elapsed(), Vec::new()));
        }

        info!(intent = %intent, strategies = strategies.len(), "resolving intent");

        let mut diagnostics = Vec::new();
        let mut any_candidates = false;

        for strategy in order_strategies(strategies) {
            let mut record = |error: AttemptError| {
                debug!(strategy = %strategy.kind, %error, "strategy attempt failed");
                diagnostics.push(AttemptDiagnostic::new(strategy.kind, strategy.priority, error));
            };

            if strategy.kind == StrategyKind::PositionalFallback && any_candidates {
                record(AttemptError::Suppressed);
                continue;
            }
            if strategy.kind.requires_keywords() && !intent.has_keywords() {
                record(AttemptError::MissingKeywords);
                continue;
            }

            let discovery = self.discover(intent, strategy).await?;
            if discovery.found > 0 {
                any_candidates = true;
            }
            let target = match discovery.pick(strategy.position) {
                Some(target) if strategy.kind == StrategyKind::PositionalFallback => target,
                Some(_) => &discovery.targets[0],
                None if discovery.found > 0 => {
                    record(AttemptError::NoActionableCandidate {
                        found: discovery.found,
                    });
                    continue;
                }
                None if discovery.read_failed => {
                    record(AttemptError::StrategyTimeout {
                        timeout_ms: strategy.timeout_ms,
                    });
                    continue;
                }
                None => {
                    record(AttemptError::NoCandidates);
                    continue;
                }
            };

            let baseline = match Self::fatal_or(self.driver.current_url().await)? {
                Ok(url) => VerificationContext::with_baseline(url),
                Err(err) if verification.needs_baseline() => {
                    record(AttemptError::ActionFailed(format!(
                        "baseline url unavailable: {err}"
                    )));
                    continue;
                }
                Err(_) => VerificationContext::default(),
            };

            debug!(
                strategy = %strategy.kind,
                handle = %target.handle,
                name = %target.name,
                "acting on candidate"
            );
            if let Err(err) = Self::fatal_or(self.act(intent, target).await)? {
                record(AttemptError::ActionFailed(err.to_string()));
                continue;
            }

            let outcome = self.verifier.verify(verification, &baseline).await?;
            if outcome.passed {
                info!(
                    intent = %intent,
                    strategy = %strategy.kind,
                    matched = ?outcome.matched,
                    elapsed_ms = elapsed(),
                    "intent resolved"
                );
                return Ok(ActionResult::success(
                    strategy.kind,
                    elapsed(),
                    diagnostics,
                    outcome.matched,
                ));
            }
            record(AttemptError::VerificationTimeout {
                timeout_ms: verification.timeout_ms,
            });
        }

        let result = ActionResult::failure(elapsed(), diagnostics);
        warn!(
            intent = %intent,
            attempts = result.diagnostics.len(),
            summary = %result.diagnostic_summary(),
            "all strategies exhausted"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_gate::{Check, DefaultVerifier};
    use cdp_adapter::sim::{SimEffect, SimElement, SimScreen, SimulatedPage};

    const PROFILE: &str = "https://www.threads.net/@someone";
    const CHOOSER: &str = "https://www.instagram.com/threads/sso/";

    fn resolver_for(page: Arc<SimulatedPage>) -> DefaultActionResolver {
        let verifier = Arc::new(DefaultVerifier::new(page.clone()));
        DefaultActionResolver::new(page, verifier)
    }

    fn page_at(url: &str, elements: Vec<SimElement>) -> Arc<SimulatedPage> {
        let mut screen = SimScreen::new();
        for element in elements {
            screen = screen.with_element(element);
        }
        Arc::new(
            SimulatedPage::new()
                .with_screen(url, screen)
                .with_screen(PROFILE, SimScreen::new().with_text("profile"))
                .starting_at(url),
        )
    }

    fn dialog() -> SimElement {
        SimElement::new("dialog", "div")
            .with_role("dialog")
            .with_selector(r#"div[role="dialog"]"#)
            .hidden()
    }

    fn reply_intent() -> Intent {
        Intent::click("reply control")
            .with_role("button")
            .with_keywords(["답글", "Reply"])
    }

    #[tokio::test]
    async fn empty_strategy_list_fails_immediately() {
        let page = page_at(PROFILE, vec![SimElement::button("reply", "Reply")]);
        let resolver = resolver_for(page.clone());
        let result = resolver
            .resolve(
                &reply_intent(),
                &[],
                &VerificationSpec::any_of([Check::DialogPresent]),
            )
            .await
            .unwrap();
        assert!(!result.succeeded);
        assert!(result.diagnostics.is_empty());
        assert!(page.clicks().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn falls_through_to_text_query_when_role_finds_nothing() {
        let reply = SimElement::new("reply", "div")
            .with_text("Reply")
            .on_click(SimEffect::Show("dialog".into()));
        let page = page_at(PROFILE, vec![reply, dialog()]);
        let resolver = resolver_for(page.clone());
        let strategies = vec![
            Strategy::role_query(0).with_timeout_ms(500),
            Strategy::text_query(10).with_timeout_ms(500),
        ];

        let result = resolver
            .resolve(
                &reply_intent(),
                &strategies,
                &VerificationSpec::any_of([Check::DialogPresent]),
            )
            .await
            .unwrap();

        assert!(result.succeeded);
        assert_eq!(result.strategy_used, Some(StrategyKind::TextQuery));
        assert_eq!(result.matched_check.as_deref(), Some("dialog-present"));
        assert_eq!(
            result.diagnostics,
            vec![AttemptDiagnostic::new(
                StrategyKind::RoleQuery,
                0,
                AttemptError::NoCandidates
            )]
        );
        assert_eq!(page.clicks(), vec!["reply".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn chooser_prefers_keyword_match_over_position() {
        let page = page_at(
            CHOOSER,
            vec![
                SimElement::button("acct-1", "other.account").at(100.0, 100.0, 300.0, 48.0),
                SimElement::button("acct-2", "dorar.ing")
                    .at(100.0, 200.0, 300.0, 48.0)
                    .on_click(SimEffect::Goto(PROFILE.into())),
            ],
        );
        let resolver = resolver_for(page.clone());
        let intent = Intent::click("account selection")
            .with_role("button")
            .with_keywords(["dorar.ing"]);
        let strategies = vec![
            Strategy::role_query(0).with_timeout_ms(500),
            Strategy::positional_fallback(90, 0).with_timeout_ms(500),
        ];

        let result = resolver
            .resolve(
                &intent,
                &strategies,
                &VerificationSpec::any_of([Check::UrlChanged]),
            )
            .await
            .unwrap();

        assert!(result.succeeded);
        assert_eq!(result.strategy_used, Some(StrategyKind::RoleQuery));
        assert_eq!(page.clicks(), vec!["acct-2".to_string()]);
        assert_eq!(page.url(), PROFILE);
    }

    #[tokio::test(start_paused = true)]
    async fn positional_fallback_is_suppressed_once_candidates_were_seen() {
        let page = page_at(
            CHOOSER,
            vec![
                SimElement::button("acct-1", "other.account"),
                SimElement::button("acct-2", "dorar.ing"),
            ],
        );
        let resolver = resolver_for(page.clone());
        let intent = Intent::click("account selection").with_keywords(["dorar.ing"]);
        let strategies = vec![
            Strategy::text_query(0).with_timeout_ms(300),
            Strategy::positional_fallback(90, 0).with_timeout_ms(300),
        ];

        let result = resolver
            .resolve(
                &intent,
                &strategies,
                &VerificationSpec::any_of([Check::UrlChanged]).with_timeout(300),
            )
            .await
            .unwrap();

        assert!(!result.succeeded);
        let errors: Vec<_> = result.diagnostics.iter().map(|d| d.error.clone()).collect();
        assert_eq!(
            errors,
            vec![
                AttemptError::VerificationTimeout { timeout_ms: 300 },
                AttemptError::Suppressed
            ]
        );
        assert_eq!(page.clicks(), vec!["acct-2".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn positional_fallback_runs_when_nothing_else_matched() {
        let page = page_at(
            CHOOSER,
            vec![
                SimElement::button("first", "Continue").at(100.0, 100.0, 300.0, 48.0),
                SimElement::button("second", "Switch")
                    .at(100.0, 200.0, 300.0, 48.0)
                    .on_click(SimEffect::Goto(PROFILE.into())),
            ],
        );
        let resolver = resolver_for(page.clone());
        let intent = Intent::click("account selection").with_keywords(["dorar.ing"]);
        let strategies = vec![
            Strategy::role_query(0).with_timeout_ms(200),
            Strategy::heuristic_scan(10).with_timeout_ms(200),
            Strategy::positional_fallback(90, 1).with_timeout_ms(200),
        ];

        let result = resolver
            .resolve(
                &intent,
                &strategies,
                &VerificationSpec::any_of([Check::UrlChanged]),
            )
            .await
            .unwrap();

        assert!(result.succeeded);
        assert_eq!(result.strategy_used, Some(StrategyKind::PositionalFallback));
        assert_eq!(result.diagnostics.len(), 2);
        assert_eq!(page.clicks(), vec!["second".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_reports_every_strategy_once() {
        let page = page_at(PROFILE, vec![SimElement::button("share", "Share")]);
        let resolver = resolver_for(page.clone());
        let strategies = vec![
            Strategy::heuristic_scan(30).with_timeout_ms(100),
            Strategy::text_query(10).with_timeout_ms(100),
            Strategy::selector_list(20, ["div._aal0"]).with_timeout_ms(100),
            Strategy::role_query(0).with_timeout_ms(100),
        ];

        let result = resolver
            .resolve(
                &reply_intent(),
                &strategies,
                &VerificationSpec::any_of([Check::DialogPresent]),
            )
            .await
            .unwrap();

        assert!(!result.succeeded);
        assert_eq!(result.strategy_used, None);
        let kinds: Vec<_> = result.diagnostics.iter().map(|d| d.strategy).collect();
        assert_eq!(
            kinds,
            vec![
                StrategyKind::RoleQuery,
                StrategyKind::TextQuery,
                StrategyKind::SelectorList,
                StrategyKind::HeuristicScan,
            ]
        );
        assert!(page.clicks().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn keywordless_intent_skips_keyword_strategies() {
        let page = page_at(PROFILE, vec![]);
        let resolver = resolver_for(page);
        let result = resolver
            .resolve(
                &Intent::click("anything"),
                &[Strategy::text_query(0).with_timeout_ms(100)],
                &VerificationSpec::new(),
            )
            .await
            .unwrap();
        assert_eq!(
            result.diagnostics[0].error,
            AttemptError::MissingKeywords
        );
    }

    #[tokio::test]
    async fn fill_writes_payload_and_verifies_content() {
        let page = page_at(
            PROFILE,
            vec![SimElement::textbox("compose").with_placeholder("Add a comment...")],
        );
        let resolver = resolver_for(page.clone());
        let intent = Intent::fill("comment field", "nice post")
            .with_keywords(["Add a comment..."]);

        let result = resolver
            .resolve(
                &intent,
                &[Strategy::text_query(0)],
                &VerificationSpec::any_of([Check::EditableHasContent]),
            )
            .await
            .unwrap();

        assert!(result.succeeded);
        assert_eq!(
            page.fills(),
            vec![("compose".to_string(), "nice post".to_string())]
        );
    }

    #[tokio::test]
    async fn fill_without_payload_is_rejected() {
        let page = page_at(PROFILE, vec![]);
        let resolver = resolver_for(page);
        let mut intent = Intent::fill("comment field", "x");
        intent.payload = None;
        let err = resolver
            .resolve(&intent, &[Strategy::text_query(0)], &VerificationSpec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LocatorError::InvalidIntent(_)));
    }

    /// Fails the first `current_url` read with a recoverable error.
    struct FlakyUrl {
        inner: Arc<SimulatedPage>,
        failed_once: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl PageDriver for FlakyUrl {
        async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), AdapterError> {
            self.inner.navigate(url, timeout).await
        }

        async fn current_url(&self) -> Result<String, AdapterError> {
            use std::sync::atomic::Ordering;
            if !self.failed_once.swap(true, Ordering::SeqCst) {
                return Err(AdapterError::new(cdp_adapter::AdapterErrorKind::Script));
            }
            self.inner.current_url().await
        }

        async fn page_text(&self) -> Result<String, AdapterError> {
            self.inner.page_text().await
        }

        async fn query(
            &self,
            query: &cdp_adapter::ElementQuery,
        ) -> Result<Vec<ElementProbe>, AdapterError> {
            self.inner.query(query).await
        }

        async fn click(&self, target: &ElementProbe) -> Result<(), AdapterError> {
            self.inner.click(target).await
        }

        async fn fill(&self, target: &ElementProbe, text: &str) -> Result<(), AdapterError> {
            self.inner.fill(target, text).await
        }

        async fn press_key(&self, key: &str) -> Result<(), AdapterError> {
            self.inner.press_key(key).await
        }

        async fn screenshot(&self) -> Result<Vec<u8>, AdapterError> {
            self.inner.screenshot().await
        }

        async fn cookies(&self) -> Result<Vec<cdp_adapter::CookieRecord>, AdapterError> {
            self.inner.cookies().await
        }

        async fn set_cookies(
            &self,
            cookies: &[cdp_adapter::CookieRecord],
        ) -> Result<(), AdapterError> {
            self.inner.set_cookies(cookies).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unreadable_baseline_moves_to_next_strategy() {
        let page = page_at(
            CHOOSER,
            vec![SimElement::button("acct", "dorar.ing").on_click(SimEffect::Goto(PROFILE.into()))],
        );
        let driver = Arc::new(FlakyUrl {
            inner: page.clone(),
            failed_once: std::sync::atomic::AtomicBool::new(false),
        });
        let verifier = Arc::new(DefaultVerifier::new(driver.clone()));
        let resolver = DefaultActionResolver::new(driver, verifier);
        let intent = Intent::click("account selection")
            .with_role("button")
            .with_keywords(["dorar.ing"]);
        let strategies = vec![
            Strategy::role_query(0).with_timeout_ms(200),
            Strategy::text_query(10).with_timeout_ms(200),
        ];

        let result = resolver
            .resolve(
                &intent,
                &strategies,
                &VerificationSpec::any_of([Check::UrlChanged]),
            )
            .await
            .unwrap();

        assert!(result.succeeded);
        assert_eq!(result.strategy_used, Some(StrategyKind::TextQuery));
        assert_eq!(result.diagnostics.len(), 1);
        assert!(matches!(
            &result.diagnostics[0].error,
            AttemptError::ActionFailed(message) if message.starts_with("baseline url unavailable")
        ));
        assert_eq!(page.clicks(), vec!["acct".to_string()]);
    }

    #[tokio::test]
    async fn crash_after_action_is_infrastructure() {
        let page = page_at(
            PROFILE,
            vec![SimElement::button("reply", "Reply").on_click(SimEffect::Crash)],
        );
        let resolver = resolver_for(page);
        let err = resolver
            .resolve(
                &reply_intent(),
                &[Strategy::role_query(0)],
                &VerificationSpec::any_of([Check::DialogPresent]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LocatorError::Infrastructure(_)));
        assert_eq!(err.severity(), 3);
    }
}
