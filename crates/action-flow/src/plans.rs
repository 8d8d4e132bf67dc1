//! Per-state plans: what to act on, how to find it, how to confirm it

use action_gate::{Check, VerificationSpec};
use threadbot_core_types::lexicon::{self, selectors};
use threadbot_core_types::{BoundingBoxHint, Intent, Strategy};

use crate::types::FlowConfig;

const USERNAME_KEYWORDS: &[&str] = &[
    "전화번호, 사용자 이름 또는 이메일",
    "사용자 이름",
    "Phone number, username, or email",
    "Username",
];

const PASSWORD_KEYWORDS: &[&str] = &["비밀번호", "Password"];

const REPLY_SELECTORS: &[&str] = &[
    r#"svg[aria-label="답글"]"#,
    r#"svg[aria-label="Reply"]"#,
    r#"svg[aria-label="댓글"]"#,
    r#"svg[aria-label="Comment"]"#,
    "div._aal0",
    "div.x1i10hfl.xjqpnuy.xa49m3k",
];

const COMPOSE_SELECTORS: &[&str] = &[
    r#"[contenteditable="true"]"#,
    r#"div[role="textbox"]"#,
    "textarea",
    "p.xdj266r",
];

const SUBMIT_SELECTORS: &[&str] = &[r#"div[role="button"].xc26acl"#, ".xc26acl"];

/// Reply icons are roughly 40-60px wide and 30-40px tall.
const REPLY_ICON: BoundingBoxHint = BoundingBoxHint {
    min_w: 40.0,
    max_w: 60.0,
    min_h: 30.0,
    max_h: 40.0,
};

/// Intent, ordered strategies and verification for one step.
#[derive(Debug, Clone)]
pub struct StatePlan {
    pub intent: Intent,
    pub strategies: Vec<Strategy>,
    pub verification: VerificationSpec,
}

impl StatePlan {
    fn new(intent: Intent, verification: VerificationSpec) -> Self {
        Self {
            intent,
            strategies: Vec::new(),
            verification,
        }
    }

    fn with(mut self, strategy: Strategy) -> Self {
        self.strategies.push(strategy);
        self
    }

    fn timed(mut self, timeout_ms: u64) -> Self {
        for strategy in &mut self.strategies {
            strategy.timeout_ms = timeout_ms;
        }
        self
    }
}

fn verify(config: &FlowConfig, checks: impl IntoIterator<Item = Check>) -> VerificationSpec {
    VerificationSpec::any_of(checks).with_timeout(config.verification_timeout_ms)
}

/// Home: the "continue with Instagram" control.
pub fn consent(config: &FlowConfig) -> StatePlan {
    StatePlan::new(
        Intent::click("consent control")
            .with_role("button")
            .with_keywords(lexicon::CONSENT_CONTROL.iter().copied()),
        verify(
            config,
            [
                Check::url_contains("sso"),
                Check::url_contains("accounts"),
                Check::url_contains("instagram.com"),
                Check::UrlChanged,
            ],
        ),
    )
    .with(Strategy::role_query(0))
    .with(Strategy::text_query(10))
    .with(Strategy::selector_list(
        20,
        [r#"a[href*="instagram.com"]"#, r#"button[aria-label*="Instagram"]"#],
    ))
    .with(Strategy::heuristic_scan(30))
    .with(Strategy::positional_fallback(90, 0).with_selectors(["button"]))
    .timed(config.strategy_timeout_ms)
}

/// Account chooser: the button carrying the configured account name.
pub fn account_selection(config: &FlowConfig, account: &str) -> StatePlan {
    StatePlan::new(
        Intent::click("account selection")
            .with_role("button")
            .with_keywords([account]),
        verify(config, [Check::UrlChanged]),
    )
    .with(Strategy::role_query(0))
    .with(Strategy::text_query(10))
    .with(Strategy::heuristic_scan(20))
    .with(
        Strategy::positional_fallback(90, 1)
            .with_selectors([r#"div[role="button"]"#, "button"]),
    )
    .timed(config.strategy_timeout_ms)
}

pub fn username(config: &FlowConfig, account: &str) -> StatePlan {
    StatePlan::new(
        Intent::fill("username field", account)
            .with_role("textbox")
            .with_keywords(USERNAME_KEYWORDS.iter().copied()),
        VerificationSpec::new(),
    )
    .with(Strategy::selector_list(0, [selectors::USERNAME_INPUT]))
    .with(Strategy::text_query(10))
    .timed(config.strategy_timeout_ms)
}

pub fn password(config: &FlowConfig, secret: &str) -> StatePlan {
    StatePlan::new(
        Intent::fill("password field", secret)
            .with_role("textbox")
            .with_keywords(PASSWORD_KEYWORDS.iter().copied()),
        VerificationSpec::new(),
    )
    .with(Strategy::selector_list(0, [selectors::PASSWORD_INPUT]))
    .with(Strategy::text_query(10))
    .timed(config.strategy_timeout_ms)
}

pub fn login_submit(config: &FlowConfig) -> StatePlan {
    StatePlan::new(
        Intent::click("login submit")
            .with_role("button")
            .with_keywords(lexicon::LOGIN_SUBMIT.iter().copied()),
        verify(
            config,
            [
                Check::UrlChanged,
                Check::text_present(lexicon::DISMISS_PROMPT.iter().copied()),
            ],
        ),
    )
    .with(Strategy::selector_list(0, [selectors::LOGIN_SUBMIT]))
    .with(Strategy::role_query(10))
    .with(Strategy::text_query(20))
    .timed(config.strategy_timeout_ms)
}

/// "Not now" on save-login and notification prompts. Short timeouts: usually absent.
pub fn dismiss_prompt(config: &FlowConfig) -> StatePlan {
    StatePlan::new(
        Intent::click("dismiss prompt")
            .with_role("button")
            .with_keywords(lexicon::DISMISS_PROMPT.iter().copied()),
        VerificationSpec::new(),
    )
    .with(Strategy::role_query(0))
    .with(Strategy::text_query(10))
    .timed(config.strategy_timeout_ms.min(1_000))
}

pub fn reply_trigger(config: &FlowConfig) -> StatePlan {
    StatePlan::new(
        Intent::click("reply control")
            .with_role("button")
            .with_keywords(lexicon::REPLY_CONTROL.iter().copied())
            .with_bounding_box(REPLY_ICON),
        verify(
            config,
            [
                Check::DialogPresent,
                Check::element_visible([r#"[contenteditable="true"]"#, selectors::PLACEHOLDER]),
            ],
        ),
    )
    .with(Strategy::text_query(0))
    .with(Strategy::role_query(10))
    .with(Strategy::selector_list(20, REPLY_SELECTORS.iter().copied()))
    .with(Strategy::heuristic_scan(30))
    .timed(config.strategy_timeout_ms)
}

/// Locate the compose surface without acting on it.
pub fn compose_surface(config: &FlowConfig) -> StatePlan {
    StatePlan::new(
        Intent::wait_for_effect("compose surface")
            .with_keywords(lexicon::COMPOSE_PLACEHOLDERS.iter().copied()),
        verify(
            config,
            [
                Check::DialogPresent,
                Check::element_visible([selectors::EDITABLE]),
            ],
        ),
    )
    .with(Strategy::selector_list(
        0,
        [selectors::DIALOG, selectors::EDITABLE, selectors::PLACEHOLDER],
    ))
    .with(Strategy::text_query(10))
    .timed(config.strategy_timeout_ms)
}

pub fn comment(config: &FlowConfig, payload: &str) -> StatePlan {
    StatePlan::new(
        Intent::fill("comment field", payload)
            .with_role("textbox")
            .with_keywords(lexicon::COMPOSE_PLACEHOLDERS.iter().copied()),
        verify(config, [Check::EditableHasContent]),
    )
    .with(Strategy::text_query(0))
    .with(Strategy::selector_list(10, COMPOSE_SELECTORS.iter().copied()))
    .with(
        Strategy::heuristic_scan(20)
            .with_selectors(COMPOSE_SELECTORS[..3].iter().copied()),
    )
    .timed(config.strategy_timeout_ms)
}

pub fn submit(config: &FlowConfig) -> StatePlan {
    StatePlan::new(
        Intent::click("submit control")
            .with_role("button")
            .with_keywords(lexicon::SUBMIT_CONTROL.iter().copied()),
        verify(config, [Check::DialogAbsent, Check::EditableEmpty]),
    )
    .with(Strategy::text_query(0))
    .with(Strategy::role_query(10))
    .with(Strategy::selector_list(20, SUBMIT_SELECTORS.iter().copied()))
    .with(Strategy::heuristic_scan(30))
    .timed(config.strategy_timeout_ms)
}
