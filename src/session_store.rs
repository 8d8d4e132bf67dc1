//! Cookie persistence between runs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use action_flow::SessionStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use cdp_adapter::CookieRecord;
use tokio::fs;
use tracing::{debug, info};

/// JSON array of cookie records on disk.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Session-cookie count per domain, for the log line.
fn session_cookies_by_domain(cookies: &[CookieRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for cookie in cookies.iter().filter(|cookie| cookie.is_session()) {
        let domain = cookie.domain.clone().unwrap_or_else(|| "(none)".to_string());
        *counts.entry(domain).or_insert(0) += 1;
    }
    counts
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Vec<CookieRecord>> {
        if fs::metadata(&self.path).await.is_err() {
            info!(path = %self.path.display(), "no saved session, starting fresh");
            return Ok(Vec::new());
        }
        let raw = fs::read(&self.path)
            .await
            .with_context(|| format!("reading cookies from {}", self.path.display()))?;
        let cookies: Vec<CookieRecord> = serde_json::from_slice(&raw)
            .with_context(|| format!("parsing cookies in {}", self.path.display()))?;
        info!(
            path = %self.path.display(),
            count = cookies.len(),
            session = ?session_cookies_by_domain(&cookies),
            "loaded saved cookies"
        );
        Ok(cookies)
    }

    async fn save(&self, cookies: &[CookieRecord]) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating cookie directory {}", dir.display()))?;
        }
        let payload = serde_json::to_vec_pretty(cookies)?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, payload)
            .await
            .with_context(|| format!("writing cookies to {}", staging.display()))?;
        fs::rename(&staging, &self.path)
            .await
            .with_context(|| format!("moving cookies into {}", self.path.display()))?;
        debug!(path = %self.path.display(), count = cookies.len(), "cookies saved");
        Ok(())
    }
}
