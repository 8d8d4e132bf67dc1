//! Core types for candidate ranking

use cdp_adapter::ElementProbe;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// How strongly an element can be attributed to an intent's keywords.
///
/// Ordered weakest first so that `max` picks the strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MatchStrength {
    None,
    /// Unlabelled editable, only considered for fill intents.
    EditableSurface,
    /// Keyword found in aria-label or placeholder.
    Label,
    /// Keyword somewhere inside the visible text.
    Contains,
    /// Visible text starts with the keyword.
    Prefix,
    /// Visible text equals the keyword.
    Exact,
}

impl MatchStrength {
    pub fn is_attributed(&self) -> bool {
        *self > MatchStrength::None
    }
}

/// Strength of the best keyword match on `probe`.
pub fn keyword_strength(probe: &ElementProbe, keywords: &[String]) -> MatchStrength {
    let primary = [probe.text.trim().to_lowercase(), probe.name.trim().to_lowercase()];
    let secondary: Vec<String> = [probe.aria_label.as_deref(), probe.placeholder.as_deref()]
        .into_iter()
        .flatten()
        .map(|value| value.trim().to_lowercase())
        .collect();

    let mut best = MatchStrength::None;
    for keyword in keywords {
        let keyword = keyword.trim().to_lowercase();
        if keyword.is_empty() {
            continue;
        }
        let strength = if primary.iter().any(|value| *value == keyword) {
            MatchStrength::Exact
        } else if primary.iter().any(|value| value.starts_with(&keyword)) {
            MatchStrength::Prefix
        } else if primary.iter().any(|value| value.contains(&keyword)) {
            MatchStrength::Contains
        } else if secondary.iter().any(|value| value.contains(&keyword)) {
            MatchStrength::Label
        } else {
            MatchStrength::None
        };
        best = best.max(strength);
        if best == MatchStrength::Exact {
            break;
        }
    }
    best
}

/// Viewport first, then topmost, then leftmost.
pub fn geometry_order(a: &ElementProbe, b: &ElementProbe) -> Ordering {
    b.in_viewport
        .cmp(&a.in_viewport)
        .then_with(|| a.rect.y.partial_cmp(&b.rect.y).unwrap_or(Ordering::Equal))
        .then_with(|| a.rect.x.partial_cmp(&b.rect.x).unwrap_or(Ordering::Equal))
}

/// Candidates one strategy produced on one read of the page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Discovery {
    /// Elements located before the actionable filter.
    pub found: usize,
    /// Actionable elements, best first.
    pub targets: Vec<ElementProbe>,
    /// The last read failed with a non-fatal driver error.
    pub read_failed: bool,
}

impl Discovery {
    /// Keep the actionable elements of `probes` in their given order.
    pub fn from_probes(probes: Vec<ElementProbe>) -> Self {
        let found = probes.len();
        let targets = probes
            .into_iter()
            .filter(ElementProbe::is_actionable)
            .collect();
        Self {
            found,
            targets,
            read_failed: false,
        }
    }

    pub fn failed_read() -> Self {
        Self {
            read_failed: true,
            ..Self::default()
        }
    }

    pub fn has_target(&self) -> bool {
        !self.targets.is_empty()
    }

    /// Pick by index, falling back to the first target.
    pub fn pick(&self, position: usize) -> Option<&ElementProbe> {
        self.targets.get(position).or_else(|| self.targets.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdp_adapter::ElementRect;

    fn probe(text: &str, aria: Option<&str>) -> ElementProbe {
        ElementProbe {
            handle: text.to_string(),
            tag: "div".into(),
            name: aria.unwrap_or(text).to_string(),
            text: text.to_string(),
            aria_label: aria.map(str::to_string),
            rect: ElementRect::new(0.0, 0.0, 40.0, 30.0),
            visible: true,
            in_viewport: true,
            ..ElementProbe::default()
        }
    }

    #[test]
    fn strength_prefers_exact_over_partial() {
        let keywords = vec!["Reply".to_string(), "답글".to_string()];
        assert_eq!(keyword_strength(&probe("reply", None), &keywords), MatchStrength::Exact);
        assert_eq!(
            keyword_strength(&probe("Reply to thread", None), &keywords),
            MatchStrength::Prefix
        );
        assert_eq!(
            keyword_strength(&probe("Quick reply", None), &keywords),
            MatchStrength::Contains
        );
        assert_eq!(keyword_strength(&probe("Share", None), &keywords), MatchStrength::None);
    }

    #[test]
    fn label_only_match_is_weakest_attribution() {
        let mut icon = probe("", Some("답글"));
        icon.name.clear();
        let keywords = vec!["답글".to_string()];
        assert_eq!(keyword_strength(&icon, &keywords), MatchStrength::Label);
        assert!(MatchStrength::Label.is_attributed());
        assert!(!MatchStrength::None.is_attributed());
    }

    #[test]
    fn discovery_filters_and_picks() {
        let mut hidden = probe("a", None);
        hidden.visible = false;
        let discovery = Discovery::from_probes(vec![hidden, probe("b", None), probe("c", None)]);
        assert_eq!(discovery.found, 3);
        assert_eq!(discovery.targets.len(), 2);
        assert_eq!(discovery.pick(1).map(|p| p.handle.as_str()), Some("c"));
        assert_eq!(discovery.pick(7).map(|p| p.handle.as_str()), Some("b"));
    }
}
