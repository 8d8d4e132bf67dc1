//! Page observation for login state and page classification

use std::sync::Arc;

use cdp_adapter::{AdapterError, PageDriver};
use serde::{Deserialize, Serialize};
use threadbot_core_types::lexicon::{self, contains_any, selectors};
use tracing::debug;

use crate::oracle::{evaluate, LoginVerdict};
use crate::signal::LoginSignal;

/// What the current page turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageKind {
    /// One-time code or checkpoint interstitial.
    Challenge,
    CredentialForm,
    AccountChooser,
    LoggedIn,
    /// A dialog or editable is on screen.
    ComposeSurface,
    Other,
}

/// One observation pass over the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSignals {
    pub url: String,
    pub login: Vec<LoginSignal>,
    pub challenge: bool,
    pub credential_form: bool,
    pub chooser: bool,
    pub consent_control: bool,
    pub dismiss_prompt: bool,
    pub compose_surface: bool,
}

impl PageSignals {
    pub fn verdict(&self) -> LoginVerdict {
        evaluate(&self.login)
    }

    /// Classification in precedence order: blocking pages first.
    pub fn kind(&self) -> PageKind {
        if self.challenge {
            PageKind::Challenge
        } else if self.credential_form {
            PageKind::CredentialForm
        } else if self.chooser {
            PageKind::AccountChooser
        } else if self.verdict().logged_in {
            PageKind::LoggedIn
        } else if self.compose_surface {
            PageKind::ComposeSurface
        } else {
            PageKind::Other
        }
    }

    /// Names of the login signals that were present.
    pub fn present_signals(&self) -> Vec<&str> {
        self.login
            .iter()
            .filter(|signal| signal.present)
            .map(|signal| signal.name.as_str())
            .collect()
    }
}

/// Scrapes [`PageSignals`] from a page driver without touching page state.
pub struct SessionPerceiver {
    driver: Arc<dyn PageDriver>,
}

impl SessionPerceiver {
    pub fn new(driver: Arc<dyn PageDriver>) -> Self {
        Self { driver }
    }

    /// Failed reads count as absent signals unless the session itself is gone.
    fn absorb<T: Default>(result: Result<T, AdapterError>, what: &str) -> Result<T, AdapterError> {
        match result {
            Ok(value) => Ok(value),
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                debug!(signal = what, %err, "signal read failed, treating as absent");
                Ok(T::default())
            }
        }
    }

    async fn visible(&self, selector: &str) -> Result<bool, AdapterError> {
        let count = Self::absorb(self.driver.count_visible(selector).await, selector)?;
        Ok(count > 0)
    }

    pub async fn observe(&self) -> Result<PageSignals, AdapterError> {
        let url = Self::absorb(self.driver.current_url().await, "url")?;
        let text = Self::absorb(self.driver.page_text().await, "text")?;
        let lower_url = url.to_lowercase();

        let on_instagram = lower_url.contains("instagram.com");
        let login_text = contains_any(&text, lexicon::LOGIN_PROMPT);
        let logout_text = contains_any(&text, lexicon::LOGOUT_OPTION);
        let chooser_text = contains_any(&text, lexicon::ACCOUNT_CHOOSER);
        let sso_url = lower_url.contains("/threads/sso") || lower_url.contains("/oauth");

        let username_input = self.visible(selectors::USERNAME_INPUT).await?;
        let password_input = self.visible(selectors::PASSWORD_INPUT).await?;
        let security_code = self.visible(selectors::SECURITY_CODE).await?;
        let profile_icon = self.visible(selectors::PROFILE_ICON).await?;
        let navigation = self.visible(selectors::MAIN_NAVIGATION).await?;
        let search_box = self.visible(selectors::SEARCH_BOX).await?;
        let dialog = self.visible(selectors::DIALOG).await?;
        let editable = self.visible(selectors::EDITABLE).await?;

        let challenge = security_code
            || lower_url.contains("/challenge")
            || lower_url.contains("/checkpoint");
        let credential_form = password_input || (on_instagram && username_input);
        let chooser = !credential_form && (chooser_text || sso_url);
        let instagram_login_page =
            on_instagram && (lower_url.contains("/accounts/login") || credential_form);
        let bare_login_prompt = login_text && !logout_text && !profile_icon && !navigation;

        let login = vec![
            LoginSignal::decisive_negative("instagram-login-page", instagram_login_page),
            LoginSignal::decisive_negative("account-chooser", chooser),
            LoginSignal::decisive_negative("credential-form", credential_form),
            LoginSignal::decisive_negative("bare-login-prompt", bare_login_prompt),
            LoginSignal::decisive_positive("logout-option", logout_text),
            LoginSignal::decisive_positive("profile-icon", profile_icon),
            LoginSignal::supporting_positive("main-navigation", navigation),
            LoginSignal::supporting_positive(
                "profile-text",
                contains_any(&text, lexicon::PROFILE_TEXT),
            ),
            LoginSignal::supporting_positive("feed-text", contains_any(&text, lexicon::FEED_TEXT)),
            LoginSignal::supporting_positive(
                "create-text",
                contains_any(&text, lexicon::CREATE_TEXT),
            ),
            LoginSignal::supporting_positive(
                "notification-text",
                contains_any(&text, lexicon::NOTIFICATION_TEXT),
            ),
            LoginSignal::supporting_positive("search-box", search_box),
            LoginSignal::supporting_negative("login-text", login_text),
        ];

        let signals = PageSignals {
            url,
            login,
            challenge,
            credential_form,
            chooser,
            consent_control: contains_any(&text, lexicon::CONSENT_CONTROL),
            dismiss_prompt: contains_any(&text, lexicon::DISMISS_PROMPT),
            compose_surface: dialog || editable,
        };
        debug!(
            url = %signals.url,
            kind = ?signals.kind(),
            present = ?signals.present_signals(),
            "page observed"
        );
        Ok(signals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdp_adapter::sim::{SimElement, SimScreen, SimulatedPage};
    use cdp_adapter::AdapterErrorKind;

    fn perceiver(url: &str, screen: SimScreen) -> (Arc<SimulatedPage>, SessionPerceiver) {
        let page = Arc::new(SimulatedPage::new().with_screen(url, screen).starting_at(url));
        let perceiver = SessionPerceiver::new(page.clone());
        (page, perceiver)
    }

    fn logged_in_home() -> SimScreen {
        SimScreen::new()
            .with_text("Home Search Create Activity Profile")
            .with_element(SimElement::new("nav", "nav").with_selector("nav"))
            .with_element(
                SimElement::new("me", "a")
                    .with_aria_label("profile")
                    .with_selector(r#"a[href*="profile"]"#),
            )
    }

    #[tokio::test]
    async fn recognises_logged_in_home() {
        let (_, perceiver) = perceiver("https://www.threads.net/", logged_in_home());
        let signals = perceiver.observe().await.unwrap();
        let verdict = signals.verdict();
        assert!(verdict.logged_in);
        assert_eq!(verdict.decided_by.as_deref(), Some("profile-icon"));
        assert_eq!(signals.kind(), PageKind::LoggedIn);
    }

    #[tokio::test]
    async fn chooser_text_overrides_stale_navigation() {
        let screen = logged_in_home().with_text("Move to Threads  Home Profile");
        let (_, perceiver) = perceiver("https://www.instagram.com/threads/sso/", screen);
        let signals = perceiver.observe().await.unwrap();
        assert!(signals.chooser);
        assert!(!signals.verdict().logged_in);
        assert_eq!(signals.kind(), PageKind::AccountChooser);
    }

    #[tokio::test]
    async fn credential_form_and_challenge_are_classified() {
        let form = SimScreen::new()
            .with_text("Log in")
            .with_element(SimElement::input("user", "username"))
            .with_element(SimElement::input("pass", "password"));
        let (_, perceiver) = perceiver("https://www.instagram.com/accounts/login/", form);
        let signals = perceiver.observe().await.unwrap();
        assert!(signals.credential_form);
        assert_eq!(signals.kind(), PageKind::CredentialForm);

        let code = SimScreen::new().with_element(
            SimElement::input("code", "verificationCode")
                .with_selector(r#"input[name="verificationCode"]"#),
        );
        let (_, perceiver) = self::perceiver("https://www.instagram.com/accounts/login/two_factor", code);
        assert_eq!(
            perceiver.observe().await.unwrap().kind(),
            PageKind::Challenge
        );
    }

    #[tokio::test]
    async fn observation_is_read_only() {
        let (page, perceiver) = perceiver("https://www.threads.net/", logged_in_home());
        let first = perceiver.observe().await.unwrap();
        let second = perceiver.observe().await.unwrap();
        assert_eq!(first.verdict(), second.verdict());
        assert!(page.clicks().is_empty());
        assert!(page.keys().is_empty());
    }

    #[tokio::test]
    async fn crashed_page_is_an_error() {
        let (page, perceiver) = perceiver("https://www.threads.net/", logged_in_home());
        page.crash();
        let err = perceiver.observe().await.unwrap_err();
        assert_eq!(err.kind, AdapterErrorKind::PageCrashed);
    }
}
