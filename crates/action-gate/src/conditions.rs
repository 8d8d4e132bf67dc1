//! Check predicates for post-action verification

use serde::{Deserialize, Serialize};
use std::fmt;

/// One pure read of page state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Check {
    /// A visible `div[role="dialog"]`.
    DialogPresent,

    /// No visible dialog.
    DialogAbsent,

    /// Current URL differs from the baseline captured before the action.
    UrlChanged,

    /// Current URL contains the substring.
    UrlContains(String),

    /// Current URL matches the regex.
    UrlMatches(String),

    /// Any of the selectors matches a visible element.
    ElementVisible(Vec<String>),

    /// Some visible editable holds text.
    EditableHasContent,

    /// No visible editable holds text.
    EditableEmpty,

    /// Page text contains any of the strings.
    TextPresent(Vec<String>),
}

impl Check {
    pub fn element_visible<I, S>(selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Check::ElementVisible(selectors.into_iter().map(Into::into).collect())
    }

    pub fn url_contains(fragment: impl Into<String>) -> Self {
        Check::UrlContains(fragment.into())
    }

    pub fn text_present<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Check::TextPresent(texts.into_iter().map(Into::into).collect())
    }

    /// Stable descriptor used in logs and results.
    pub fn name(&self) -> String {
        match self {
            Check::DialogPresent => "dialog-present".to_string(),
            Check::DialogAbsent => "dialog-absent".to_string(),
            Check::UrlChanged => "url-changed".to_string(),
            Check::UrlContains(fragment) => format!("url-contains:{fragment}"),
            Check::UrlMatches(pattern) => format!("url-matches:{pattern}"),
            Check::ElementVisible(selectors) => format!("element-visible:{}", selectors.join("|")),
            Check::EditableHasContent => "editable-has-content".to_string(),
            Check::EditableEmpty => "editable-empty".to_string(),
            Check::TextPresent(texts) => format!("text-present:{}", texts.join("|")),
        }
    }

    /// Whether evaluating the check needs the pre-action URL.
    pub fn needs_baseline(&self) -> bool {
        matches!(self, Check::UrlChanged)
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
