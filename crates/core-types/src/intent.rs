//! Semantic description of a desired UI effect.

use std::fmt;

/// What the resolver should do with the element it locates.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntentKind {
    Click,
    Fill,
    /// Locate only; the effect itself is confirmed by verification.
    WaitForEffect,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::Click => "click",
            IntentKind::Fill => "fill",
            IntentKind::WaitForEffect => "wait-for-effect",
        }
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Size window an element must fit to be considered by geometry-aware scans.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBoxHint {
    pub min_w: f64,
    pub max_w: f64,
    pub min_h: f64,
    pub max_h: f64,
}

impl BoundingBoxHint {
    pub fn new(min_w: f64, max_w: f64, min_h: f64, max_h: f64) -> Self {
        Self {
            min_w,
            max_w,
            min_h,
            max_h,
        }
    }

    pub fn contains(&self, width: f64, height: f64) -> bool {
        width >= self.min_w && width <= self.max_w && height >= self.min_h && height <= self.max_h
    }
}

/// A semantic target such as "the reply control" or "the comment field".
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Intent {
    /// Short human label used in logs and diagnostics.
    pub label: String,
    pub kind: IntentKind,
    pub semantic_role: Option<String>,
    /// Ordered, duplicate-free keyword set. Native language first, then English.
    pub keywords: Vec<String>,
    pub bounding_box_hint: Option<BoundingBoxHint>,
    /// Text to type for [`IntentKind::Fill`].
    pub payload: Option<String>,
}

impl Intent {
    pub fn new(label: impl Into<String>, kind: IntentKind) -> Self {
        Self {
            label: label.into(),
            kind,
            semantic_role: None,
            keywords: Vec::new(),
            bounding_box_hint: None,
            payload: None,
        }
    }

    pub fn click(label: impl Into<String>) -> Self {
        Self::new(label, IntentKind::Click)
    }

    pub fn fill(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::new(label, IntentKind::Fill).with_payload(payload)
    }

    pub fn wait_for_effect(label: impl Into<String>) -> Self {
        Self::new(label, IntentKind::WaitForEffect)
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.semantic_role = Some(role.into());
        self
    }

    /// Append keywords, skipping blanks and anything already present.
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for keyword in keywords {
            let keyword = keyword.into();
            let trimmed = keyword.trim();
            if trimmed.is_empty() || self.keywords.iter().any(|existing| existing == trimmed) {
                continue;
            }
            self.keywords.push(trimmed.to_string());
        }
        self
    }

    pub fn with_bounding_box(mut self, hint: BoundingBoxHint) -> Self {
        self.bounding_box_hint = Some(hint);
        self
    }

    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn has_keywords(&self) -> bool {
        !self.keywords.is_empty()
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind, self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_keep_order_and_drop_duplicates() {
        let intent = Intent::click("reply")
            .with_keywords(["답글", "Reply", " ", "답글"])
            .with_keywords(["Reply", "Comment"]);
        assert_eq!(intent.keywords, vec!["답글", "Reply", "Comment"]);
    }

    #[test]
    fn bounding_box_is_inclusive() {
        let hint = BoundingBoxHint::new(40.0, 60.0, 30.0, 40.0);
        assert!(hint.contains(40.0, 30.0));
        assert!(hint.contains(60.0, 40.0));
        assert!(!hint.contains(61.0, 35.0));
        assert!(!hint.contains(50.0, 20.0));
    }

    #[test]
    fn fill_carries_payload() {
        let intent = Intent::fill("comment", "hi");
        assert_eq!(intent.kind, IntentKind::Fill);
        assert_eq!(intent.payload.as_deref(), Some("hi"));
    }
}
