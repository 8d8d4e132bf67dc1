//! Application configuration
//!
//! One YAML document, overridable from the environment. Everything a run
//! needs is derived from it once at startup: the immutable [`RunConfig`]
//! and [`FlowConfig`] handed to the state machine, and the browser launch
//! options.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use action_flow::FlowConfig;
use cdp_adapter::BrowserOptions;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use threadbot_core_types::{RunConfig, RunTarget, TargetError};
use url::Url;

pub const ACCOUNT_ENV: &str = "THREADBOT_ACCOUNT";
pub const SECRET_ENV: &str = "THREADBOT_SECRET";
pub const COMMENT_ENV: &str = "THREADBOT_COMMENT";
pub const TARGET_ENV: &str = "THREADBOT_TARGET";
pub const HEADLESS_ENV: &str = "THREADBOT_HEADLESS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("account.identifier is not set (config or {ACCOUNT_ENV})")]
    MissingAccount,

    #[error("comment.payload is empty (config or {COMMENT_ENV})")]
    MissingComment,

    #[error("invalid target: {0}")]
    Target(#[from] TargetError),

    #[error("flow.{field} is not a valid URL: {value}")]
    BadUrl { field: &'static str, value: String },
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AccountSection {
    pub identifier: String,
    /// Only needed when Instagram shows a credential form.
    pub secret: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CommentSection {
    pub payload: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BrowserSection {
    pub headless: bool,
    pub executable: Option<PathBuf>,
    pub window_width: u32,
    pub window_height: u32,
    pub user_agent: Option<String>,
    pub extra_args: Vec<String>,
}

impl Default for BrowserSection {
    fn default() -> Self {
        Self {
            headless: false,
            executable: None,
            window_width: 1280,
            window_height: 800,
            user_agent: None,
            extra_args: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsSection {
    pub cookie_file: PathBuf,
    pub result_file: PathBuf,
    pub screenshot_dir: PathBuf,
    pub save_screenshots: bool,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            cookie_file: PathBuf::from("instagram_cookies.json"),
            result_file: PathBuf::from("result.json"),
            screenshot_dir: PathBuf::from("screenshots"),
            save_screenshots: true,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingSection {
    /// Daily-rolling log files go here when set.
    pub directory: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub account: AccountSection,
    pub comment: CommentSection,
    /// Profile handle, profile URL or post URL.
    pub target: String,
    pub browser: BrowserSection,
    pub flow: FlowConfig,
    pub paths: PathsSection,
    pub logging: LoggingSection,
}

impl AppConfig {
    /// Apply `THREADBOT_*` variables on top of the file values.
    pub fn apply_env_overrides(&mut self) {
        fn var(name: &str) -> Option<String> {
            env::var(name)
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        }

        if let Some(account) = var(ACCOUNT_ENV) {
            self.account.identifier = account;
        }
        if let Some(secret) = var(SECRET_ENV) {
            self.account.secret = Some(secret);
        }
        if let Some(comment) = var(COMMENT_ENV) {
            self.comment.payload = comment;
        }
        if let Some(target) = var(TARGET_ENV) {
            self.target = target;
        }
        if let Some(headless) = var(HEADLESS_ENV).and_then(|value| value.parse::<bool>().ok()) {
            self.browser.headless = headless;
        }
    }

    pub fn target(&self) -> Result<RunTarget, ConfigError> {
        Ok(RunTarget::classify(&self.target)?)
    }

    /// Immutable per-run configuration.
    pub fn run_config(&self) -> Result<RunConfig, ConfigError> {
        if self.comment.payload.trim().is_empty() {
            return Err(ConfigError::MissingComment);
        }
        self.trigger_base()
    }

    /// Like [`run_config`](Self::run_config) but the comment may be empty;
    /// webhook triggers supply it per run.
    pub fn trigger_base(&self) -> Result<RunConfig, ConfigError> {
        if self.account.identifier.trim().is_empty() {
            return Err(ConfigError::MissingAccount);
        }
        let mut run = RunConfig::new(
            self.account.identifier.trim(),
            self.comment.payload.clone(),
            self.target()?,
        );
        if let Some(secret) = &self.account.secret {
            run = run.with_secret(secret.clone());
        }
        Ok(run)
    }

    /// Flow settings after checking the configured URLs parse.
    pub fn flow_config(&self) -> Result<FlowConfig, ConfigError> {
        for (field, value) in [
            ("home_url", &self.flow.home_url),
            ("explore_url", &self.flow.explore_url),
            ("for_you_url", &self.flow.for_you_url),
        ] {
            if Url::parse(value).is_err() {
                return Err(ConfigError::BadUrl {
                    field,
                    value: value.clone(),
                });
            }
        }
        Ok(self.flow.clone())
    }

    pub fn browser_options(&self) -> BrowserOptions {
        BrowserOptions {
            headless: self.browser.headless,
            executable: self.browser.executable.clone(),
            window_width: self.browser.window_width,
            window_height: self.browser.window_height,
            user_agent: self.browser.user_agent.clone(),
            extra_args: self.browser.extra_args.clone(),
            request_timeout: Duration::from_millis(self.flow.navigation_timeout_ms.max(1_000)),
        }
    }
}
