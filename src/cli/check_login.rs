use std::sync::Arc;

use action_flow::{FlowConfig, SessionStore};
use anyhow::{Context, Result};
use cdp_adapter::{ChromiumDriver, PageDriver};
use clap::Args;
use perceiver_session::{PageSignals, SessionPerceiver};
use serde_json::json;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::session_store::FileSessionStore;

use super::output::OutputFormat;

#[derive(Args, Clone, Debug)]
pub struct CheckLoginArgs {
    /// Run without a visible browser window
    #[arg(long)]
    pub headless: bool,
}

/// Restore saved cookies, open the home page and observe it once.
pub async fn observe_login(
    driver: Arc<dyn PageDriver>,
    store: &dyn SessionStore,
    flow: &FlowConfig,
) -> Result<PageSignals> {
    match store.load().await {
        Ok(cookies) if !cookies.is_empty() => {
            driver
                .set_cookies(&cookies)
                .await
                .context("applying saved cookies")?;
        }
        Ok(_) => {}
        Err(err) => warn!(?err, "saved cookies unreadable, checking without them"),
    }

    if let Err(err) = driver
        .navigate(&flow.home_url, flow.navigation_timeout())
        .await
    {
        if err.is_fatal() {
            return Err(err).context("opening home page");
        }
        warn!(%err, "home page did not settle, observing anyway");
    }
    driver.pause(flow.settle()).await;

    let signals = SessionPerceiver::new(driver)
        .observe()
        .await
        .context("observing home page")?;
    Ok(signals)
}

pub async fn cmd_check_login(
    args: CheckLoginArgs,
    mut config: AppConfig,
    output: OutputFormat,
) -> Result<()> {
    if args.headless {
        config.browser.headless = true;
    }
    let flow = config.flow_config()?;
    let store = FileSessionStore::new(&config.paths.cookie_file);

    let driver = Arc::new(
        ChromiumDriver::launch(config.browser_options())
            .await
            .context("launching browser")?,
    );
    let result = observe_login(driver.clone(), &store, &flow).await;
    driver.close().await;
    let signals = result?;

    let verdict = signals.verdict();
    info!(logged_in = verdict.logged_in, confidence = ?verdict.confidence, "login checked");

    match output {
        OutputFormat::Json => {
            let value = json!({ "verdict": verdict, "signals": signals });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Human => {
            println!(
                "Logged in: {} ({:?} confidence)",
                verdict.logged_in, verdict.confidence
            );
            if let Some(decided_by) = &verdict.decided_by {
                println!("Decided by: {decided_by}");
            }
            println!("Page: {} [{:?}]", signals.url, signals.kind());
            for signal in &signals.login {
                let mark = if signal.present { "x" } else { " " };
                println!(
                    "  [{mark}] {:<22} {:?}/{:?}",
                    signal.name, signal.weight, signal.polarity
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdp_adapter::sim::{SimElement, SimScreen, SimulatedPage};
    use cdp_adapter::CookieRecord;

    const HOME: &str = "https://www.threads.net/";

    #[tokio::test(start_paused = true)]
    async fn restores_cookies_before_observing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("cookies.json"));
        store
            .save(&[CookieRecord::new("sessionid", "abc").with_domain(".threads.net")])
            .await
            .unwrap();

        let page = Arc::new(
            SimulatedPage::new().with_screen(
                HOME,
                SimScreen::new().with_text("Home Profile").with_element(
                    SimElement::new("me", "a")
                        .with_aria_label("profile")
                        .with_selector(r#"a[href*="profile"]"#),
                ),
            ),
        );
        let flow = FlowConfig {
            settle_ms: 10,
            ..FlowConfig::default()
        };

        let signals = observe_login(page.clone(), &store, &flow).await.unwrap();
        assert!(signals.verdict().logged_in);
        assert_eq!(page.stored_cookies().len(), 1);
        assert_eq!(page.navigations(), vec![HOME.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn logged_out_home_without_cookies() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("missing.json"));
        let page = Arc::new(SimulatedPage::new().with_screen(
            HOME,
            SimScreen::new().with_element(SimElement::button("go", "Continue with Instagram")),
        ));
        let flow = FlowConfig {
            settle_ms: 10,
            ..FlowConfig::default()
        };

        let signals = observe_login(page, &store, &flow).await.unwrap();
        assert!(!signals.verdict().logged_in);
        assert!(signals.consent_control);
    }
}
