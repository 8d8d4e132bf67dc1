use std::fmt;

/// Discrete phase of the login-and-comment workflow.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NavState {
    Home,
    AwaitingSsoConsent,
    AccountChooser,
    LoginForm,
    Profile,
    AwaitingReplyTarget,
    CommentCompose,
    Submitting,
    Done,
    Failed,
}

impl NavState {
    pub fn as_str(&self) -> &'static str {
        match self {
            NavState::Home => "home",
            NavState::AwaitingSsoConsent => "awaiting-sso-consent",
            NavState::AccountChooser => "account-chooser",
            NavState::LoginForm => "login-form",
            NavState::Profile => "profile",
            NavState::AwaitingReplyTarget => "awaiting-reply-target",
            NavState::CommentCompose => "comment-compose",
            NavState::Submitting => "submitting",
            NavState::Done => "done",
            NavState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, NavState::Done | NavState::Failed)
    }

    /// States at or beyond the profile page happen after login.
    pub fn is_post_login(&self) -> bool {
        matches!(
            self,
            NavState::Profile
                | NavState::AwaitingReplyTarget
                | NavState::CommentCompose
                | NavState::Submitting
                | NavState::Done
        )
    }
}

impl fmt::Display for NavState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
