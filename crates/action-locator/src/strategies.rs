//! Candidate discovery, one finder per strategy kind
//!
//! Finders only read the page. Each returns a [`Discovery`] whose targets are
//! already filtered to actionable elements and ordered best first:
//! - RoleQuery / TextQuery: keyword-matched elements, keyword strength, then
//!   viewport and geometry
//! - SelectorList: the first selector that yields an actionable element wins
//! - HeuristicScan: interactive elements ranked by keyword strength, then
//!   visibility, then geometry; unattributable elements are dropped
//! - PositionalFallback: interactive elements in document order

use async_trait::async_trait;
use cdp_adapter::{AdapterError, ElementProbe, ElementQuery, PageDriver};
use std::cmp::Ordering;
use threadbot_core_types::{Intent, IntentKind, Strategy, StrategyKind};
use tracing::debug;

use crate::types::{geometry_order, keyword_strength, Discovery, MatchStrength};

/// Candidate finder trait
#[async_trait]
pub trait CandidateFinder: Send + Sync {
    /// Read the page once and report what this strategy can act on
    async fn find(
        &self,
        driver: &dyn PageDriver,
        intent: &Intent,
        strategy: &Strategy,
    ) -> Result<Discovery, AdapterError>;

    /// Strategy kind handled by this finder
    fn kind(&self) -> StrategyKind;
}

/// Finder for a strategy kind.
pub fn finder_for(kind: StrategyKind) -> &'static dyn CandidateFinder {
    match kind {
        StrategyKind::RoleQuery => &RoleFinder,
        StrategyKind::TextQuery => &TextFinder,
        StrategyKind::SelectorList => &SelectorListFinder,
        StrategyKind::HeuristicScan => &HeuristicScanFinder,
        StrategyKind::PositionalFallback => &PositionalFinder,
    }
}

fn default_role(kind: IntentKind) -> &'static str {
    match kind {
        IntentKind::Fill => "textbox",
        IntentKind::Click | IntentKind::WaitForEffect => "button",
    }
}

fn by_geometry(mut discovery: Discovery) -> Discovery {
    discovery.targets.sort_by(geometry_order);
    discovery
}

/// Stronger keyword match first, geometry among equals.
fn by_keyword_then_geometry(mut discovery: Discovery, keywords: &[String]) -> Discovery {
    discovery.targets.sort_by(|a, b| {
        keyword_strength(b, keywords)
            .cmp(&keyword_strength(a, keywords))
            .then_with(|| geometry_order(a, b))
    });
    discovery
}

/// Accessible role plus accessible name.
pub struct RoleFinder;

#[async_trait]
impl CandidateFinder for RoleFinder {
    async fn find(
        &self,
        driver: &dyn PageDriver,
        intent: &Intent,
        _strategy: &Strategy,
    ) -> Result<Discovery, AdapterError> {
        let role = intent
            .semantic_role
            .clone()
            .unwrap_or_else(|| default_role(intent.kind).to_string());
        let probes = driver
            .query(&ElementQuery::role(role, intent.keywords.iter().cloned()))
            .await?;
        Ok(by_keyword_then_geometry(
            Discovery::from_probes(probes),
            &intent.keywords,
        ))
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::RoleQuery
    }
}

/// Visible text, placeholder or aria-label.
pub struct TextFinder;

#[async_trait]
impl CandidateFinder for TextFinder {
    async fn find(
        &self,
        driver: &dyn PageDriver,
        intent: &Intent,
        _strategy: &Strategy,
    ) -> Result<Discovery, AdapterError> {
        let probes = driver
            .query(&ElementQuery::text(intent.keywords.iter().cloned()))
            .await?;
        Ok(by_keyword_then_geometry(
            Discovery::from_probes(probes),
            &intent.keywords,
        ))
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::TextQuery
    }
}

/// Explicit selectors, in declaration order.
pub struct SelectorListFinder;

#[async_trait]
impl CandidateFinder for SelectorListFinder {
    async fn find(
        &self,
        driver: &dyn PageDriver,
        _intent: &Intent,
        strategy: &Strategy,
    ) -> Result<Discovery, AdapterError> {
        let mut found = 0;
        for selector in &strategy.selectors {
            let discovery = Discovery::from_probes(driver.query(&ElementQuery::css(selector)).await?);
            found += discovery.found;
            if discovery.has_target() {
                debug!(selector = %selector, "selector produced a target");
                let mut discovery = by_geometry(discovery);
                discovery.found = found;
                return Ok(discovery);
            }
        }
        Ok(Discovery {
            found,
            ..Discovery::default()
        })
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::SelectorList
    }
}

/// Scan of every interactive element, ranked by how well it matches.
pub struct HeuristicScanFinder;

impl HeuristicScanFinder {
    /// Strength of `probe` for `intent`, with the bounding-box hint applied.
    pub fn score(intent: &Intent, probe: &ElementProbe) -> MatchStrength {
        if let Some(hint) = &intent.bounding_box_hint {
            if !hint.contains(probe.rect.width, probe.rect.height) {
                return MatchStrength::None;
            }
        }
        let strength = keyword_strength(probe, &intent.keywords);
        if strength == MatchStrength::None && intent.kind == IntentKind::Fill && probe.editable {
            return MatchStrength::EditableSurface;
        }
        strength
    }

    /// Stronger match, then actionable, then (for fills) emptier, then geometry.
    pub fn rank(intent: &Intent, probes: Vec<ElementProbe>) -> Vec<ElementProbe> {
        let mut scored: Vec<(MatchStrength, ElementProbe)> = probes
            .into_iter()
            .map(|probe| (Self::score(intent, &probe), probe))
            .filter(|(strength, _)| strength.is_attributed())
            .collect();
        scored.sort_by(|(sa, a), (sb, b)| {
            sb.cmp(sa)
                .then_with(|| b.is_actionable().cmp(&a.is_actionable()))
                .then_with(|| {
                    if intent.kind == IntentKind::Fill {
                        a.value_len.cmp(&b.value_len)
                    } else {
                        Ordering::Equal
                    }
                })
                .then_with(|| geometry_order(a, b))
        });
        scored.into_iter().map(|(_, probe)| probe).collect()
    }
}

#[async_trait]
impl CandidateFinder for HeuristicScanFinder {
    async fn find(
        &self,
        driver: &dyn PageDriver,
        intent: &Intent,
        strategy: &Strategy,
    ) -> Result<Discovery, AdapterError> {
        let probes = driver
            .query(&ElementQuery::interactive(strategy.selectors.clone()))
            .await?;
        let scanned = probes.len();
        let ranked = Self::rank(intent, probes);
        debug!(scanned, attributed = ranked.len(), "heuristic scan ranked");
        Ok(Discovery::from_probes(ranked))
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::HeuristicScan
    }
}

/// Pick by index among interactive elements.
pub struct PositionalFinder;

#[async_trait]
impl CandidateFinder for PositionalFinder {
    async fn find(
        &self,
        driver: &dyn PageDriver,
        _intent: &Intent,
        strategy: &Strategy,
    ) -> Result<Discovery, AdapterError> {
        let probes = driver
            .query(&ElementQuery::interactive(strategy.selectors.clone()))
            .await?;
        Ok(Discovery::from_probes(probes))
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::PositionalFallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdp_adapter::sim::{SimElement, SimScreen, SimulatedPage};
    use threadbot_core_types::BoundingBoxHint;

    const URL: &str = "https://www.threads.net/@someone";

    fn page(elements: Vec<SimElement>) -> SimulatedPage {
        let mut screen = SimScreen::new();
        for element in elements {
            screen = screen.with_element(element);
        }
        SimulatedPage::new().with_screen(URL, screen).starting_at(URL)
    }

    fn reply_intent() -> Intent {
        Intent::click("reply control")
            .with_role("button")
            .with_keywords(["답글", "Reply"])
    }

    #[tokio::test]
    async fn heuristic_scan_ranks_by_keyword_strength() {
        let page = page(vec![
            SimElement::button("share", "Share").at(10.0, 10.0, 50.0, 35.0),
            SimElement::button("prefix", "Reply to thread").at(10.0, 50.0, 50.0, 35.0),
            SimElement::button("exact", "Reply").at(10.0, 400.0, 50.0, 35.0),
        ]);
        let discovery = HeuristicScanFinder
            .find(&page, &reply_intent(), &Strategy::heuristic_scan(30))
            .await
            .unwrap();
        let handles: Vec<_> = discovery.targets.iter().map(|p| p.handle.as_str()).collect();
        assert_eq!(handles, vec!["exact", "prefix"]);
    }

    #[tokio::test]
    async fn heuristic_scan_applies_bounding_box_hint() {
        let page = page(vec![
            SimElement::button("wide", "Reply").at(10.0, 10.0, 300.0, 35.0),
            SimElement::button("icon", "Reply").at(10.0, 300.0, 48.0, 36.0),
        ]);
        let intent = reply_intent().with_bounding_box(BoundingBoxHint::new(40.0, 60.0, 30.0, 40.0));
        let discovery = HeuristicScanFinder
            .find(&page, &intent, &Strategy::heuristic_scan(30))
            .await
            .unwrap();
        assert_eq!(discovery.targets.len(), 1);
        assert_eq!(discovery.targets[0].handle, "icon");
    }

    #[tokio::test]
    async fn fill_scan_prefers_empty_editables() {
        let mut used = SimElement::textbox("used").at(10.0, 10.0, 400.0, 40.0);
        used.value = "draft".into();
        let page = page(vec![used, SimElement::textbox("empty").at(10.0, 200.0, 400.0, 40.0)]);
        let intent = Intent::fill("comment field", "hello").with_keywords(["Add a comment..."]);
        let discovery = HeuristicScanFinder
            .find(&page, &intent, &Strategy::heuristic_scan(30))
            .await
            .unwrap();
        assert_eq!(discovery.targets[0].handle, "empty");
    }

    #[tokio::test]
    async fn selector_list_uses_first_productive_selector() {
        let page = page(vec![
            SimElement::new("hidden", "div").with_selector("div._aal0").hidden(),
            SimElement::new("svg", "svg").with_selector(r#"svg[aria-label="Reply"]"#),
        ]);
        let strategy =
            Strategy::selector_list(20, ["div._aal0", r#"svg[aria-label="Reply"]"#, "button"]);
        let discovery = SelectorListFinder
            .find(&page, &reply_intent(), &strategy)
            .await
            .unwrap();
        assert_eq!(discovery.found, 2);
        assert_eq!(discovery.targets[0].handle, "svg");
    }

    #[tokio::test]
    async fn role_query_orders_by_geometry() {
        let page = page(vec![
            SimElement::button("offscreen", "Reply").at(10.0, 2000.0, 50.0, 35.0),
            SimElement::button("lower", "Reply").at(10.0, 300.0, 50.0, 35.0),
            SimElement::button("upper", "Reply").at(10.0, 100.0, 50.0, 35.0),
        ]);
        let discovery = RoleFinder
            .find(&page, &reply_intent(), &Strategy::role_query(0))
            .await
            .unwrap();
        let handles: Vec<_> = discovery.targets.iter().map(|p| p.handle.as_str()).collect();
        assert_eq!(handles, vec!["upper", "lower", "offscreen"]);
    }

    #[tokio::test]
    async fn role_query_puts_exact_account_before_longer_lookalike() {
        let page = page(vec![
            SimElement::button("backup", "dorar.ing.backup").at(100.0, 100.0, 300.0, 48.0),
            SimElement::button("mine", "dorar.ing").at(100.0, 200.0, 300.0, 48.0),
        ]);
        let intent = Intent::click("account selection")
            .with_role("button")
            .with_keywords(["dorar.ing"]);
        let discovery = RoleFinder
            .find(&page, &intent, &Strategy::role_query(0))
            .await
            .unwrap();
        let handles: Vec<_> = discovery.targets.iter().map(|p| p.handle.as_str()).collect();
        assert_eq!(handles, vec!["mine", "backup"]);
    }

    #[tokio::test]
    async fn text_query_puts_exact_match_before_contains() {
        let page = page(vec![
            SimElement::new("quote", "div")
                .with_text("Reply to this quote")
                .at(10.0, 50.0, 200.0, 35.0),
            SimElement::new("reply", "div")
                .with_text("Reply")
                .at(10.0, 300.0, 50.0, 35.0),
        ]);
        let discovery = TextFinder
            .find(&page, &reply_intent(), &Strategy::text_query(10))
            .await
            .unwrap();
        assert_eq!(discovery.targets[0].handle, "reply");
    }
}
