use async_trait::async_trait;
use std::time::Duration;

use crate::error::AdapterError;
use crate::types::{CookieRecord, ElementProbe, ElementQuery};

/// Browser-driving primitive used by every higher layer.
///
/// Reads (`current_url`, `page_text`, `query`) never change page state, so
/// verification and login probes built on them are repeatable.
#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), AdapterError>;

    async fn current_url(&self) -> Result<String, AdapterError>;

    /// Visible text of the document body.
    async fn page_text(&self) -> Result<String, AdapterError>;

    async fn query(&self, query: &ElementQuery) -> Result<Vec<ElementProbe>, AdapterError>;

    /// Click the centre of the element's box.
    async fn click(&self, target: &ElementProbe) -> Result<(), AdapterError>;

    /// Focus, clear, then insert `text`.
    async fn fill(&self, target: &ElementProbe, text: &str) -> Result<(), AdapterError>;

    /// Press and release a key on whatever currently has focus.
    async fn press_key(&self, key: &str) -> Result<(), AdapterError>;

    async fn screenshot(&self) -> Result<Vec<u8>, AdapterError>;

    async fn cookies(&self) -> Result<Vec<CookieRecord>, AdapterError>;

    async fn set_cookies(&self, cookies: &[CookieRecord]) -> Result<(), AdapterError>;

    /// Number of visible elements matching a CSS selector.
    async fn count_visible(&self, selector: &str) -> Result<usize, AdapterError> {
        let probes = self.query(&ElementQuery::css(selector)).await?;
        Ok(probes.iter().filter(|probe| probe.visible).count())
    }

    /// Fixed settle pause between steps.
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
