use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// High-level error categories surfaced by the driver.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdapterErrorKind {
    #[error("navigation timed out")]
    NavTimeout,
    #[error("navigation failed")]
    NavigationFailed,
    #[error("cdp i/o failure")]
    CdpIo,
    #[error("page crashed")]
    PageCrashed,
    #[error("browser closed")]
    BrowserClosed,
    #[error("target element not found")]
    TargetNotFound,
    #[error("script evaluation failed")]
    Script,
    #[error("browser launch failed")]
    Launch,
    #[error("internal error")]
    Internal,
}

/// Enriched error metadata passed back to higher layers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdapterError {
    pub kind: AdapterErrorKind,
    pub hint: Option<String>,
    pub retriable: bool,
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(hint) = &self.hint {
            write!(f, ": {}", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for AdapterError {}

impl AdapterError {
    pub fn new(kind: AdapterErrorKind) -> Self {
        Self {
            kind,
            hint: None,
            retriable: matches!(
                kind,
                AdapterErrorKind::NavTimeout | AdapterErrorKind::TargetNotFound
            ),
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn retriable(mut self, flag: bool) -> Self {
        self.retriable = flag;
        self
    }

    /// The browser itself is gone or unusable; no strategy can recover.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind,
            AdapterErrorKind::NavigationFailed
                | AdapterErrorKind::CdpIo
                | AdapterErrorKind::PageCrashed
                | AdapterErrorKind::BrowserClosed
                | AdapterErrorKind::Launch
        )
    }
}
