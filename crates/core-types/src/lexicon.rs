//! Keyword sets used to recognise controls and page states.
//!
//! The target application ships a Korean and an English UI; every set lists
//! the Korean wording first.

pub const CONSENT_CONTROL: &[&str] = &[
    "Instagram으로 계속",
    "Continue with Instagram",
    "Instagram",
    "인스타그램",
];

pub const REPLY_CONTROL: &[&str] = &["답글", "댓글", "댓글 달기", "Reply", "Comment"];

pub const COMPOSE_PLACEHOLDERS: &[&str] = &[
    "답글 달기...",
    "댓글 달기...",
    "댓글 작성...",
    "Add a comment...",
    "Reply...",
    "Leave a comment...",
];

pub const SUBMIT_CONTROL: &[&str] = &["게시", "답글", "Post", "Reply", "Send"];

pub const DISMISS_PROMPT: &[&str] = &["나중에 하기", "Not Now", "Not now"];

pub const LOGIN_SUBMIT: &[&str] = &["로그인", "Log in", "Login"];

pub const LOGIN_PROMPT: &[&str] = &["로그인", "Login", "Log in", "Sign in"];

pub const LOGOUT_OPTION: &[&str] = &["로그아웃", "Logout", "Log out"];

pub const ACCOUNT_CHOOSER: &[&str] = &[
    "Threads로 이동",
    "Move to Threads",
    "계정 선택",
    "다른 Instagram 계정으로",
];

pub const PROFILE_TEXT: &[&str] = &["프로필", "Profile"];

pub const FEED_TEXT: &[&str] = &["피드", "Feed", "홈", "Home"];

pub const CREATE_TEXT: &[&str] = &["만들기", "Create", "New thread", "글쓰기"];

pub const NOTIFICATION_TEXT: &[&str] = &["알림", "Notification", "Activity"];

/// Selectors of the elements the login oracle probes.
pub mod selectors {
    pub const PROFILE_ICON: &str = r#"a[href*="profile"], [aria-label*="profile"], [aria-label*="프로필"]"#;
    pub const MAIN_NAVIGATION: &str = r#"nav, [role="navigation"]"#;
    pub const SEARCH_BOX: &str =
        r#"[placeholder*="Search"], [placeholder*="검색"], [aria-label*="Search"], [aria-label*="검색"]"#;
    pub const USERNAME_INPUT: &str = r#"input[name="username"]"#;
    pub const PASSWORD_INPUT: &str = r#"input[name="password"], input[type="password"]"#;
    pub const LOGIN_SUBMIT: &str = r#"button[type="submit"]"#;
    pub const SECURITY_CODE: &str = r#"input[aria-label="보안 코드"], input[aria-label="Security code"], input[name="verificationCode"]"#;
    pub const DIALOG: &str = r#"div[role="dialog"]"#;
    pub const EDITABLE: &str =
        r#"[contenteditable="true"], div[role="textbox"], textarea, input[type="text"]"#;
    pub const PLACEHOLDER: &str = "[placeholder]";
}

/// Case-insensitive "any keyword occurs in text".
pub fn contains_any(text: &str, keywords: &[&str]) -> bool {
    let haystack = text.to_lowercase();
    keywords
        .iter()
        .any(|keyword| haystack.contains(&keyword.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_any_ignores_case() {
        assert!(contains_any("Continue with INSTAGRAM", CONSENT_CONTROL));
        assert!(contains_any("계정 선택하기", ACCOUNT_CHOOSER));
        assert!(!contains_any("nothing here", LOGOUT_OPTION));
    }
}
