//! Per-run inputs: who logs in, what to post, and where.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static POST_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"threads\.(?:net|com)/@([\w.-]+)/post/(\w+)").expect("valid post url pattern")
});
static PROFILE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"threads\.(?:net|com)/@([\w.-]+)/?(?:[?#].*)?$").expect("valid profile url pattern")
});
static HANDLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@?([\w.-]+)$").expect("valid handle pattern"));

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TargetError {
    #[error("target is empty")]
    Empty,

    #[error("unrecognised target '{0}': expected a handle, profile URL or post URL")]
    Unrecognised(String),
}

/// Where the comment goes.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunTarget {
    /// Comment on the first post reachable from this profile.
    Profile { handle: String },
    /// Comment on one specific post.
    Post { url: String },
}

impl RunTarget {
    /// Accepts `name`, `@name`, `https://www.threads.net/@name` or a post URL.
    pub fn classify(raw: &str) -> Result<Self, TargetError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TargetError::Empty);
        }
        if POST_URL.is_match(trimmed) {
            return Ok(RunTarget::Post {
                url: trimmed.to_string(),
            });
        }
        if let Some(caps) = PROFILE_URL.captures(trimmed) {
            return Ok(RunTarget::Profile {
                handle: caps[1].to_string(),
            });
        }
        if let Some(caps) = HANDLE.captures(trimmed) {
            return Ok(RunTarget::Profile {
                handle: caps[1].to_string(),
            });
        }
        Err(TargetError::Unrecognised(trimmed.to_string()))
    }

    /// Page to open for this target, relative to the application's home URL.
    pub fn page_url(&self, home_url: &str) -> String {
        match self {
            RunTarget::Post { url } => url.clone(),
            RunTarget::Profile { handle } => {
                format!("{}/@{}", home_url.trim_end_matches('/'), handle)
            }
        }
    }
}

impl fmt::Display for RunTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunTarget::Profile { handle } => write!(f, "profile @{}", handle),
            RunTarget::Post { url } => write!(f, "post {}", url),
        }
    }
}

/// Immutable run configuration handed to the state machine.
#[derive(Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub account_identifier: String,
    pub credential_secret: Option<String>,
    pub comment_payload: String,
    pub target: RunTarget,
}

impl RunConfig {
    pub fn new(
        account_identifier: impl Into<String>,
        comment_payload: impl Into<String>,
        target: RunTarget,
    ) -> Self {
        Self {
            account_identifier: account_identifier.into(),
            credential_secret: None,
            comment_payload: comment_payload.into(),
            target,
        }
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        let secret = secret.into();
        self.credential_secret = (!secret.is_empty()).then_some(secret);
        self
    }

    /// Copy with a different comment; used for triggered runs.
    pub fn with_payload(&self, payload: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.comment_payload = payload.into();
        next
    }
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("account_identifier", &self.account_identifier)
            .field(
                "credential_secret",
                &self.credential_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("comment_payload", &self.comment_payload)
            .field("target", &self.target)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_handles_and_urls() {
        assert_eq!(
            RunTarget::classify("@dorar.ing").unwrap(),
            RunTarget::Profile {
                handle: "dorar.ing".into()
            }
        );
        assert_eq!(
            RunTarget::classify("https://www.threads.net/@dorar.ing/").unwrap(),
            RunTarget::Profile {
                handle: "dorar.ing".into()
            }
        );
        assert_eq!(
            RunTarget::classify("https://www.threads.net/@dorar.ing/post/C4abc").unwrap(),
            RunTarget::Post {
                url: "https://www.threads.net/@dorar.ing/post/C4abc".into()
            }
        );
        assert_eq!(RunTarget::classify("  "), Err(TargetError::Empty));
        assert!(RunTarget::classify("https://example.com/x y").is_err());
    }

    #[test]
    fn profile_page_url_joins_home() {
        let target = RunTarget::Profile {
            handle: "dorar.ing".into(),
        };
        assert_eq!(
            target.page_url("https://www.threads.net/"),
            "https://www.threads.net/@dorar.ing"
        );
    }

    #[test]
    fn debug_redacts_secret() {
        let config = RunConfig::new("me", "hi", RunTarget::Profile { handle: "me".into() })
            .with_secret("hunter2");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
        assert_eq!(config.with_payload("bye").comment_payload, "bye");
    }
}
