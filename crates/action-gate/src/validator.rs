//! Verifier that races checks against the live page

use crate::{conditions::Check, errors::GateError, types::*};
use async_trait::async_trait;
use cdp_adapter::{AdapterError, ElementQuery, PageDriver};
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use threadbot_core_types::lexicon::selectors;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// Verification oracle trait
#[async_trait]
pub trait Verifier: Send + Sync {
    /// Race all checks until one passes or the spec's timeout elapses
    async fn verify(
        &self,
        spec: &VerificationSpec,
        context: &VerificationContext,
    ) -> Result<VerificationOutcome, GateError>;

    /// Evaluate a single check once
    async fn check(&self, check: &Check, context: &VerificationContext)
        -> Result<bool, GateError>;
}

/// Default verifier backed by a page driver
pub struct DefaultVerifier {
    driver: Arc<dyn PageDriver>,
}

impl DefaultVerifier {
    pub fn new(driver: Arc<dyn PageDriver>) -> Self {
        Self { driver }
    }

    /// Fatal driver errors abort; anything else just means "not yet".
    fn absorb<T>(result: Result<T, AdapterError>, check: &Check) -> Result<Option<T>, GateError> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_fatal() => Err(GateError::Infrastructure(err)),
            Err(err) => {
                debug!(check = %check, %err, "check read failed, treating as unmet");
                Ok(None)
            }
        }
    }

    async fn visible_count(&self, selector: &str, check: &Check) -> Result<usize, GateError> {
        Ok(Self::absorb(self.driver.count_visible(selector).await, check)?.unwrap_or(0))
    }

    async fn visible_editables(&self, check: &Check) -> Result<Option<Vec<usize>>, GateError> {
        let probes = Self::absorb(
            self.driver
                .query(&ElementQuery::css(selectors::EDITABLE))
                .await,
            check,
        )?;
        Ok(probes.map(|probes| {
            probes
                .into_iter()
                .filter(|probe| probe.visible)
                .map(|probe| probe.value_len)
                .collect()
        }))
    }
}

#[async_trait]
impl Verifier for DefaultVerifier {
    async fn verify(
        &self,
        spec: &VerificationSpec,
        context: &VerificationContext,
    ) -> Result<VerificationOutcome, GateError> {
        let start = Instant::now();

        if !spec.has_checks() {
            debug!("VerificationSpec has no checks, passing by default");
            return Ok(VerificationOutcome::pass(None, 0, 0));
        }
        if spec.needs_baseline() && context.baseline_url.is_none() {
            return Err(GateError::InvalidSpec(
                "url-changed check requires a baseline url".to_string(),
            ));
        }

        let deadline = start + Duration::from_millis(spec.timeout_ms);
        let poll = Duration::from_millis(spec.poll_interval_ms.max(1));
        let mut polls = 0u32;

        loop {
            polls += 1;
            for check in &spec.checks {
                if self.check(check, context).await? {
                    let elapsed = start.elapsed().as_millis() as u64;
                    info!(check = %check, elapsed_ms = elapsed, polls, "verification passed");
                    return Ok(VerificationOutcome::pass(Some(check.name()), elapsed, polls));
                }
            }

            let now = Instant::now();
            if now >= deadline {
                break;
            }
            sleep(poll.min(deadline - now)).await;
        }

        let elapsed = start.elapsed().as_millis() as u64;
        warn!(
            checks = spec.checks.len(),
            timeout_ms = spec.timeout_ms,
            polls,
            "verification timed out"
        );
        Ok(VerificationOutcome::timeout(elapsed, polls))
    }

    async fn check(
        &self,
        check: &Check,
        context: &VerificationContext,
    ) -> Result<bool, GateError> {
        let satisfied = match check {
            Check::DialogPresent => self.visible_count(selectors::DIALOG, check).await? > 0,
            Check::DialogAbsent => {
                match Self::absorb(self.driver.count_visible(selectors::DIALOG).await, check)? {
                    Some(count) => count == 0,
                    None => false,
                }
            }
            Check::UrlChanged => {
                let baseline = context.baseline_url.as_deref().ok_or_else(|| {
                    GateError::InvalidSpec("url-changed check requires a baseline url".into())
                })?;
                Self::absorb(self.driver.current_url().await, check)?
                    .map(|url| url != baseline)
                    .unwrap_or(false)
            }
            Check::UrlContains(fragment) => Self::absorb(self.driver.current_url().await, check)?
                .map(|url| url.contains(fragment.as_str()))
                .unwrap_or(false),
            Check::UrlMatches(pattern) => {
                let regex = Regex::new(pattern)
                    .map_err(|err| GateError::InvalidSpec(format!("bad url pattern: {err}")))?;
                Self::absorb(self.driver.current_url().await, check)?
                    .map(|url| regex.is_match(&url))
                    .unwrap_or(false)
            }
            Check::ElementVisible(list) => {
                let mut any = false;
                for selector in list {
                    if self.visible_count(selector, check).await? > 0 {
                        any = true;
                        break;
                    }
                }
                any
            }
            Check::EditableHasContent => self
                .visible_editables(check)
                .await?
                .map(|lengths| lengths.iter().any(|len| *len > 0))
                .unwrap_or(false),
            Check::EditableEmpty => self
                .visible_editables(check)
                .await?
                .map(|lengths| lengths.iter().all(|len| *len == 0))
                .unwrap_or(false),
            Check::TextPresent(texts) => Self::absorb(self.driver.page_text().await, check)?
                .map(|body| {
                    let body = body.to_lowercase();
                    texts.iter().any(|text| body.contains(&text.to_lowercase()))
                })
                .unwrap_or(false),
        };
        Ok(satisfied)
    }
}
