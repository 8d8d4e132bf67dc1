//! Navigation state machine
//!
//! Drives one run from the home page to a submitted comment:
//!
//! ```text
//! Home -> AwaitingSsoConsent -> AccountChooser ----------> Profile
//!              |                     ^                       |
//!              +----> LoginForm -----+-----------------------+
//!                                                            v
//! Done <- Submitting <- CommentCompose <- AwaitingReplyTarget
//! ```
//!
//! Every handler returns a [`Transition`]. Entries per state are capped at
//! `retry_budget + 1`, and the whole run sits under one total timeout, so a
//! run always ends with exactly one report.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use action_gate::DefaultVerifier;
use action_locator::{ActionResolver, DefaultActionResolver};
use async_trait::async_trait;
use cdp_adapter::{CollectingObserver, CookieRecord, ObservedKind, PageDriver};
use perceiver_session::{PageSignals, SessionPerceiver};
use threadbot_core_types::{
    ActionResult, ErrorCategory, NavState, RunConfig, RunId, RunReport, SubmissionMethod,
};
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, error, info, warn};

use crate::errors::FlowError;
use crate::plans::{self, StatePlan};
use crate::strategies::{DefaultFailureHandler, FailureHandler, FailureHandlerResult};
use crate::types::{FlowConfig, Transition};

/// Interval between page observations while waiting for a page to settle.
const SIGNAL_POLL_MS: u64 = 500;

/// Persists authentication cookies between runs.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> anyhow::Result<Vec<CookieRecord>>;

    async fn save(&self, cookies: &[CookieRecord]) -> anyhow::Result<()>;
}

/// Receives screenshots taken at notable points of a run.
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    async fn store(&self, state: NavState, png: Vec<u8>) -> anyhow::Result<()>;
}

/// Per-run mutable bookkeeping.
struct RunLedger {
    report: RunReport,
    entries: HashMap<NavState, u32>,
}

impl RunLedger {
    fn new(run_id: RunId) -> Self {
        Self {
            report: RunReport::new(run_id),
            entries: HashMap::new(),
        }
    }

    fn enter(&mut self, state: NavState) -> u32 {
        self.report.enter(state);
        let count = self.entries.entry(state).or_insert(0);
        *count += 1;
        *count
    }

    fn entries(&self, state: NavState) -> u32 {
        self.entries.get(&state).copied().unwrap_or(0)
    }
}

fn miss(plan: &StatePlan, result: &ActionResult) -> String {
    format!(
        "{} not realized: {}",
        plan.intent.label,
        result.diagnostic_summary()
    )
}

pub struct NavigationStateMachine {
    driver: Arc<dyn PageDriver>,
    resolver: Arc<dyn ActionResolver>,
    perceiver: SessionPerceiver,
    failure_handler: Arc<dyn FailureHandler>,
    run: Arc<RunConfig>,
    config: Arc<FlowConfig>,
    session_store: Option<Arc<dyn SessionStore>>,
    snapshots: Option<Arc<dyn SnapshotSink>>,
    observer: Option<CollectingObserver>,
}

impl NavigationStateMachine {
    pub fn new(driver: Arc<dyn PageDriver>, run: Arc<RunConfig>, config: Arc<FlowConfig>) -> Self {
        let verifier = Arc::new(DefaultVerifier::new(driver.clone()));
        let resolver = Arc::new(DefaultActionResolver::new(driver.clone(), verifier));
        Self {
            perceiver: SessionPerceiver::new(driver.clone()),
            driver,
            resolver,
            failure_handler: Arc::new(DefaultFailureHandler::new()),
            run,
            config,
            session_store: None,
            snapshots: None,
            observer: None,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn ActionResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_failure_handler(mut self, handler: Arc<dyn FailureHandler>) -> Self {
        self.failure_handler = handler;
        self
    }

    pub fn with_session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session_store = Some(store);
        self
    }

    pub fn with_snapshot_sink(mut self, sink: Arc<dyn SnapshotSink>) -> Self {
        self.snapshots = Some(sink);
        self
    }

    /// Console and page errors collected here end up in the report.
    pub fn with_observer(mut self, observer: CollectingObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Run the flow to completion, failure or the total budget.
    pub async fn run(&self, run_id: RunId) -> RunReport {
        let mut ledger = RunLedger::new(run_id);
        info!(
            run_id = %ledger.report.run_id,
            target = %self.run.target,
            budget_ms = self.config.total_budget_ms,
            "run started"
        );

        match timeout(self.config.total_budget(), self.drive(&mut ledger)).await {
            Ok(Ok(())) => {
                info!(run_id = %ledger.report.run_id, "run completed");
            }
            Ok(Err(err)) => {
                error!(
                    run_id = %ledger.report.run_id,
                    state = %ledger.report.final_state,
                    category = %err.category(),
                    %err,
                    "run failed"
                );
                ledger.report.record_error(err.category(), err.to_string());
                ledger.report.enter(NavState::Failed);
                self.snapshot(NavState::Failed).await;
            }
            Err(_) => {
                let err = FlowError::Timeout(self.config.total_budget_ms);
                warn!(
                    run_id = %ledger.report.run_id,
                    state = %ledger.report.final_state,
                    "run exceeded its total budget"
                );
                ledger.report.record_error(err.category(), err.to_string());
            }
        }

        self.collect_page_events(&mut ledger.report);
        ledger.report.finish();
        ledger.report
    }

    async fn drive(&self, ledger: &mut RunLedger) -> Result<(), FlowError> {
        self.restore_session().await?;

        let mut state = NavState::Home;
        ledger.enter(state);

        while !state.is_terminal() {
            debug!(%state, entry = ledger.entries(state), "running state");
            let transition = match state {
                NavState::Home => self.home(ledger).await?,
                NavState::AwaitingSsoConsent => self.awaiting_sso_consent(ledger).await?,
                NavState::AccountChooser => self.account_chooser(ledger).await?,
                NavState::LoginForm => self.login_form(ledger).await?,
                NavState::Profile => self.profile(ledger).await?,
                NavState::AwaitingReplyTarget => self.awaiting_reply_target(ledger).await?,
                NavState::CommentCompose => self.comment_compose().await?,
                NavState::Submitting => self.submitting(ledger).await?,
                NavState::Done | NavState::Failed => break,
            };
            state = self.apply(ledger, transition).await?;
        }
        Ok(())
    }

    /// Enter the transition's target unless its entry budget is spent.
    async fn apply(&self, ledger: &mut RunLedger, transition: Transition) -> Result<NavState, FlowError> {
        let policy = self.config.failure_strategy();
        let to = transition.target();
        let entries = ledger.entries(to);

        match transition {
            Transition::Retry { reason, .. } => {
                match self
                    .failure_handler
                    .handle_failure(to, policy, &reason, entries)
                    .await
                {
                    FailureHandlerResult::Abort(message) => {
                        return Err(FlowError::StateRetryExhausted {
                            state: to,
                            attempts: entries,
                            reason: message,
                        });
                    }
                    FailureHandlerResult::Retry { .. } => {}
                }
            }
            Transition::Advance(_) => {
                if entries > 0 && !self.failure_handler.should_retry(policy, entries) {
                    return Err(FlowError::StateRetryExhausted {
                        state: to,
                        attempts: entries,
                        reason: "re-entered without progress".to_string(),
                    });
                }
            }
        }

        let entry = ledger.enter(to);
        info!(state = %to, entry, "entered state");
        Ok(to)
    }

    async fn home(&self, ledger: &mut RunLedger) -> Result<Transition, FlowError> {
        self.open(&self.config.home_url).await?;

        let signals = self.perceiver.observe().await?;
        if let Some(transition) = self.route_by_page(ledger, &signals).await? {
            return Ok(transition);
        }

        let plan = plans::consent(&self.config);
        let result = self.attempt(&plan).await?;
        if result.succeeded {
            self.driver.pause(self.config.settle()).await;
            Ok(Transition::Advance(NavState::AwaitingSsoConsent))
        } else {
            Ok(Transition::retry(NavState::Home, miss(&plan, &result)))
        }
    }

    async fn awaiting_sso_consent(&self, ledger: &mut RunLedger) -> Result<Transition, FlowError> {
        let deadline = Instant::now() + Duration::from_millis(self.config.consent_timeout_ms);
        loop {
            let signals = self.perceiver.observe().await?;
            if let Some(transition) = self.route_by_page(ledger, &signals).await? {
                return Ok(transition);
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            sleep(Duration::from_millis(SIGNAL_POLL_MS).min(deadline - now)).await;
        }
        Ok(Transition::retry(
            NavState::Home,
            "neither account chooser nor credential form appeared after consent",
        ))
    }

    async fn account_chooser(&self, ledger: &mut RunLedger) -> Result<Transition, FlowError> {
        let plan = plans::account_selection(&self.config, &self.run.account_identifier);
        let result = self.attempt(&plan).await?;
        if !result.succeeded {
            return Ok(Transition::retry(NavState::AccountChooser, miss(&plan, &result)));
        }
        self.driver.pause(self.config.settle()).await;

        let deadline = Instant::now() + Duration::from_millis(self.config.consent_timeout_ms);
        loop {
            let signals = self.perceiver.observe().await?;
            if signals.challenge {
                return Err(self.blocked(&signals, "security challenge after account selection"));
            }
            if signals.credential_form {
                return Ok(Transition::Advance(NavState::LoginForm));
            }
            let verdict = signals.verdict();
            if verdict.logged_in {
                info!(
                    confidence = ?verdict.confidence,
                    decided_by = ?verdict.decided_by,
                    "account selected, login visible"
                );
                self.mark_logged_in(ledger).await?;
                return Ok(Transition::Advance(NavState::Profile));
            }
            if signals.dismiss_prompt {
                self.dismiss_prompts().await?;
            }
            let now = Instant::now();
            if now >= deadline {
                warn!(
                    confidence = ?verdict.confidence,
                    url = %signals.url,
                    "account selected but login never became visible"
                );
                let back_to = if signals.chooser {
                    NavState::AccountChooser
                } else {
                    NavState::Home
                };
                return Ok(Transition::retry(
                    back_to,
                    "login not confirmed after account selection",
                ));
            }
            sleep(Duration::from_millis(SIGNAL_POLL_MS).min(deadline - now)).await;
        }
    }

    async fn login_form(&self, ledger: &mut RunLedger) -> Result<Transition, FlowError> {
        let signals = self.perceiver.observe().await?;
        if !signals.credential_form {
            if let Some(transition) = self.route_by_page(ledger, &signals).await? {
                return Ok(transition);
            }
            return Ok(Transition::retry(
                NavState::LoginForm,
                "credential form not visible",
            ));
        }
        if signals.challenge {
            return Err(self.blocked(&signals, "security challenge on credential form"));
        }
        let Some(secret) = self.run.credential_secret.as_deref() else {
            return Err(FlowError::CredentialOrChallengeBlocked(
                "credential form shown but no secret is configured".to_string(),
            ));
        };

        let steps = [
            plans::username(&self.config, &self.run.account_identifier),
            plans::password(&self.config, secret),
            plans::login_submit(&self.config),
        ];
        for plan in &steps {
            let result = self.attempt(plan).await?;
            if !result.succeeded {
                return Ok(Transition::retry(NavState::LoginForm, miss(plan, &result)));
            }
        }
        self.driver.pause(self.config.settle()).await;

        let deadline = Instant::now() + Duration::from_millis(self.config.consent_timeout_ms);
        loop {
            let signals = self.perceiver.observe().await?;
            if signals.challenge {
                return Err(self.blocked(&signals, "security challenge after login"));
            }
            if signals.dismiss_prompt {
                self.dismiss_prompts().await?;
            } else if !signals.credential_form {
                if let Some(transition) = self.route_by_page(ledger, &signals).await? {
                    return Ok(transition);
                }
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            sleep(Duration::from_millis(SIGNAL_POLL_MS).min(deadline - now)).await;
        }
        Ok(Transition::retry(
            NavState::LoginForm,
            "login not confirmed after submitting credentials",
        ))
    }

    async fn profile(&self, ledger: &mut RunLedger) -> Result<Transition, FlowError> {
        let target_url = self.run.target.page_url(&self.config.home_url);
        let pages = self.config.reply_pages(&target_url);
        let attempt = ledger.entries(NavState::Profile).saturating_sub(1) as usize;
        let url = &pages[attempt % pages.len()];

        info!(url = %url, attempt = attempt + 1, "looking for a reply control");
        self.open(url).await?;
        if *url == target_url {
            ledger.report.profile_visited = true;
        }

        let plan = plans::reply_trigger(&self.config);
        let result = self.attempt(&plan).await?;
        if result.succeeded {
            ledger.report.reply_button_clicked = true;
            Ok(Transition::Advance(NavState::AwaitingReplyTarget))
        } else {
            Ok(Transition::retry(NavState::Profile, miss(&plan, &result)))
        }
    }

    async fn awaiting_reply_target(&self, ledger: &mut RunLedger) -> Result<Transition, FlowError> {
        let plan = plans::compose_surface(&self.config);
        let result = self.attempt(&plan).await?;
        if result.succeeded {
            ledger.report.comment_dialog_opened = true;
            Ok(Transition::Advance(NavState::CommentCompose))
        } else {
            Ok(Transition::retry(NavState::Profile, miss(&plan, &result)))
        }
    }

    async fn comment_compose(&self) -> Result<Transition, FlowError> {
        let plan = plans::comment(&self.config, &self.run.comment_payload);
        let result = self.attempt(&plan).await?;
        if result.succeeded {
            Ok(Transition::Advance(NavState::Submitting))
        } else {
            Ok(Transition::retry(NavState::CommentCompose, miss(&plan, &result)))
        }
    }

    async fn submitting(&self, ledger: &mut RunLedger) -> Result<Transition, FlowError> {
        let plan = plans::submit(&self.config);
        let result = self.attempt(&plan).await?;

        let method = if result.succeeded {
            SubmissionMethod::Button
        } else {
            warn!(
                summary = %result.diagnostic_summary(),
                "submit control not confirmed, pressing Enter"
            );
            match self.driver.press_key("Enter").await {
                Ok(()) => {}
                Err(err) if err.is_fatal() => return Err(err.into()),
                Err(err) => {
                    return Ok(Transition::retry(
                        NavState::Submitting,
                        format!("keyboard submit failed: {err}"),
                    ))
                }
            }
            self.driver.pause(self.config.settle()).await;
            SubmissionMethod::Keyboard
        };

        info!(method = ?method, "comment submitted");
        ledger.report.comment_submitted = true;
        ledger.report.submission = Some(method);
        self.snapshot(NavState::Done).await;
        Ok(Transition::Advance(NavState::Done))
    }

    /// Transition implied by a page that is not what the current state expected.
    async fn route_by_page(
        &self,
        ledger: &mut RunLedger,
        signals: &PageSignals,
    ) -> Result<Option<Transition>, FlowError> {
        if signals.challenge {
            return Err(self.blocked(signals, "security challenge"));
        }
        if signals.credential_form {
            return Ok(Some(Transition::Advance(NavState::LoginForm)));
        }
        if signals.chooser {
            return Ok(Some(Transition::Advance(NavState::AccountChooser)));
        }
        let verdict = signals.verdict();
        if verdict.logged_in {
            info!(
                confidence = ?verdict.confidence,
                decided_by = ?verdict.decided_by,
                "already logged in"
            );
            self.mark_logged_in(ledger).await?;
            return Ok(Some(Transition::Advance(NavState::Profile)));
        }
        Ok(None)
    }

    fn blocked(&self, signals: &PageSignals, what: &str) -> FlowError {
        FlowError::CredentialOrChallengeBlocked(format!(
            "{what} at {} requires manual input",
            signals.url
        ))
    }

    async fn attempt(&self, plan: &StatePlan) -> Result<ActionResult, FlowError> {
        let result = self
            .resolver
            .resolve(&plan.intent, &plan.strategies, &plan.verification)
            .await?;
        if !result.succeeded {
            debug!(
                intent = %plan.intent,
                summary = %result.diagnostic_summary(),
                "intent not realized"
            );
        }
        Ok(result)
    }

    async fn open(&self, url: &str) -> Result<(), FlowError> {
        match self
            .driver
            .navigate(url, self.config.navigation_timeout())
            .await
        {
            Ok(()) => {}
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => warn!(url, %err, "navigation did not settle, continuing"),
        }
        self.driver.pause(self.config.settle()).await;
        Ok(())
    }

    /// Best-effort dismissal of "not now" interstitials.
    async fn dismiss_prompts(&self) -> Result<(), FlowError> {
        let plan = plans::dismiss_prompt(&self.config);
        for _ in 0..2 {
            if !self.attempt(&plan).await?.succeeded {
                break;
            }
            self.driver.pause(self.config.settle()).await;
        }
        Ok(())
    }

    async fn mark_logged_in(&self, ledger: &mut RunLedger) -> Result<(), FlowError> {
        if ledger.report.login_succeeded {
            return Ok(());
        }
        ledger.report.login_succeeded = true;
        info!("login confirmed");
        self.persist_session().await
    }

    async fn restore_session(&self) -> Result<(), FlowError> {
        let Some(store) = &self.session_store else {
            return Ok(());
        };
        let cookies = match store.load().await {
            Ok(cookies) => cookies,
            Err(err) => {
                warn!(%err, "could not load saved session, starting fresh");
                return Ok(());
            }
        };
        if cookies.is_empty() {
            return Ok(());
        }
        match self.driver.set_cookies(&cookies).await {
            Ok(()) => {
                info!(count = cookies.len(), "restored saved session cookies");
                Ok(())
            }
            Err(err) if err.is_fatal() => Err(err.into()),
            Err(err) => {
                warn!(%err, "could not apply saved cookies");
                Ok(())
            }
        }
    }

    async fn persist_session(&self) -> Result<(), FlowError> {
        let Some(store) = &self.session_store else {
            return Ok(());
        };
        let cookies = match self.driver.cookies().await {
            Ok(cookies) => cookies,
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => {
                warn!(%err, "could not read cookies for saving");
                return Ok(());
            }
        };
        if let Err(err) = store.save(&cookies).await {
            warn!(%err, "could not save session cookies");
        }
        Ok(())
    }

    /// Screenshot for the record. Never fails the run.
    async fn snapshot(&self, state: NavState) {
        let Some(sink) = &self.snapshots else {
            return;
        };
        match self.driver.screenshot().await {
            Ok(png) => {
                if let Err(err) = sink.store(state, png).await {
                    warn!(%state, %err, "could not store screenshot");
                }
            }
            Err(err) => warn!(%state, %err, "screenshot failed"),
        }
    }

    fn collect_page_events(&self, report: &mut RunReport) {
        let Some(observer) = &self.observer else {
            return;
        };
        for event in observer.drain() {
            let category = match event.kind {
                ObservedKind::ConsoleError => ErrorCategory::ConsoleError,
                ObservedKind::PageError => ErrorCategory::PageError,
            };
            report.record_error(category, event.message);
        }
    }
}
