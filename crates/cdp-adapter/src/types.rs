use serde::{Deserialize, Serialize};

/// Viewport-relative bounding box in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ElementRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// How to look elements up. Every variant is a pure read of the page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ElementQuery {
    /// Elements whose (explicit or implicit) role matches and whose accessible
    /// name contains one of `names`, case-insensitively.
    Role { role: String, names: Vec<String> },
    /// Innermost elements whose text, placeholder or aria-label contains a
    /// pattern, lifted to their closest interactive ancestor.
    Text { patterns: Vec<String> },
    Css { selector: String },
    /// Every interactive element, or the union of `pool` selectors when given.
    Interactive { pool: Vec<String> },
}

impl ElementQuery {
    pub fn css(selector: impl Into<String>) -> Self {
        ElementQuery::Css {
            selector: selector.into(),
        }
    }

    pub fn text<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ElementQuery::Text {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn role<I, S>(role: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ElementQuery::Role {
            role: role.into(),
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn interactive(pool: Vec<String>) -> Self {
        ElementQuery::Interactive { pool }
    }
}

/// Snapshot of one element as seen at query time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementProbe {
    /// Opaque locator the driver can resolve again for click/fill.
    pub handle: String,
    pub tag: String,
    pub role: Option<String>,
    /// Accessible name: aria-label, labelled text, inner text or placeholder.
    pub name: String,
    pub text: String,
    pub aria_label: Option<String>,
    pub placeholder: Option<String>,
    pub rect: ElementRect,
    pub visible: bool,
    pub disabled: bool,
    pub in_viewport: bool,
    pub editable: bool,
    /// Trimmed length of the element's value or editable text.
    pub value_len: usize,
}

impl ElementProbe {
    /// Visible, non-zero box, not disabled.
    pub fn is_actionable(&self) -> bool {
        self.visible && !self.rect.is_empty() && !self.disabled
    }

    /// All human-readable strings attached to the element.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        [
            Some(self.text.as_str()),
            Some(self.name.as_str()),
            self.aria_label.as_deref(),
            self.placeholder.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|value| !value.trim().is_empty())
    }
}

/// One cookie as persisted between runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieRecord {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Seconds since the epoch; non-positive values mean a session cookie.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
}

impl CookieRecord {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
            expires: None,
            http_only: None,
            secure: None,
            same_site: None,
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn is_session(&self) -> bool {
        self.expires.map(|value| value <= 0.0).unwrap_or(true)
    }
}
