//! Concrete techniques for realizing an intent.

use std::fmt;

pub const DEFAULT_STRATEGY_TIMEOUT_MS: u64 = 5_000;

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// Accessible role plus accessible name.
    RoleQuery,
    /// Visible text, placeholder or label match.
    TextQuery,
    /// Explicit CSS selectors, tried in declaration order.
    SelectorList,
    /// Scan of every interactive element, ranked by keyword strength.
    HeuristicScan,
    /// Pick by index. Only allowed when nothing else produced a candidate.
    PositionalFallback,
}

impl StrategyKind {
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::RoleQuery => "role-query",
            StrategyKind::TextQuery => "text-query",
            StrategyKind::SelectorList => "selector-list",
            StrategyKind::HeuristicScan => "heuristic-scan",
            StrategyKind::PositionalFallback => "positional-fallback",
        }
    }

    /// Whether the strategy relies on the intent's keywords to find anything.
    pub fn requires_keywords(&self) -> bool {
        matches!(
            self,
            StrategyKind::RoleQuery | StrategyKind::TextQuery | StrategyKind::HeuristicScan
        )
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Strategy {
    /// Lower is tried first.
    pub priority: i32,
    pub kind: StrategyKind,
    /// Selectors for `SelectorList`; candidate pool for scans and positional picks.
    pub selectors: Vec<String>,
    pub timeout_ms: u64,
    /// Index into the actionable pool for `PositionalFallback`.
    pub position: usize,
}

impl Strategy {
    pub fn new(priority: i32, kind: StrategyKind) -> Self {
        Self {
            priority,
            kind,
            selectors: Vec::new(),
            timeout_ms: DEFAULT_STRATEGY_TIMEOUT_MS,
            position: 0,
        }
    }

    pub fn role_query(priority: i32) -> Self {
        Self::new(priority, StrategyKind::RoleQuery)
    }

    pub fn text_query(priority: i32) -> Self {
        Self::new(priority, StrategyKind::TextQuery)
    }

    pub fn selector_list<I, S>(priority: i32, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(priority, StrategyKind::SelectorList).with_selectors(selectors)
    }

    pub fn heuristic_scan(priority: i32) -> Self {
        Self::new(priority, StrategyKind::HeuristicScan)
    }

    pub fn positional_fallback(priority: i32, position: usize) -> Self {
        let mut strategy = Self::new(priority, StrategyKind::PositionalFallback);
        strategy.position = position;
        strategy
    }

    pub fn with_selectors<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selectors = selectors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// Ascending priority; equal priorities keep their declaration order.
pub fn order_strategies(strategies: &[Strategy]) -> Vec<&Strategy> {
    let mut ordered: Vec<&Strategy> = strategies.iter().collect();
    ordered.sort_by_key(|strategy| strategy.priority);
    ordered
}
