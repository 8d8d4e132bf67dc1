//! ChromiumDriver against a real browser.
//!
//! Run with:
//! ```bash
//! export THREADBOT_USE_REAL_CHROME=1
//! export THREADBOT_CHROME=/usr/bin/google-chrome  # optional
//! cargo test -p cdp-adapter --test real_chrome -- --ignored --nocapture
//! ```

use std::env;
use std::time::Duration;

use cdp_adapter::{BrowserOptions, ChromiumDriver, CookieRecord, ElementQuery, PageDriver};

const PAGE: &str = "data:text/html,<html><body>\
<button aria-label='Reply'>Reply</button>\
<textarea placeholder='Reply...'></textarea>\
</body></html>";

fn should_run_real_tests() -> bool {
    env::var("THREADBOT_USE_REAL_CHROME")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

async fn launch() -> ChromiumDriver {
    ChromiumDriver::launch(BrowserOptions::default())
        .await
        .expect("launch chromium")
}

#[tokio::test]
#[ignore = "requires Chrome/Chromium; set THREADBOT_USE_REAL_CHROME=1"]
async fn probes_fill_and_read_back() {
    if !should_run_real_tests() {
        println!("Skipping real browser test (THREADBOT_USE_REAL_CHROME not set)");
        return;
    }
    let driver = launch().await;
    driver
        .navigate(PAGE, Duration::from_secs(10))
        .await
        .expect("navigate");

    let buttons = driver
        .query(&ElementQuery::Role {
            role: "button".into(),
            names: vec!["reply".into()],
        })
        .await
        .expect("role query");
    assert_eq!(buttons.len(), 1);
    assert!(buttons[0].visible);

    let editors = driver
        .query(&ElementQuery::css("textarea"))
        .await
        .expect("css query");
    driver.fill(&editors[0], "hello").await.expect("fill");
    let refreshed = driver
        .query(&ElementQuery::css("textarea"))
        .await
        .expect("css query");
    assert_eq!(refreshed[0].value_len, 5);

    let png = driver.screenshot().await.expect("screenshot");
    assert!(png.starts_with(b"\x89PNG"));
    driver.close().await;
}

#[tokio::test]
#[ignore = "requires Chrome/Chromium; set THREADBOT_USE_REAL_CHROME=1"]
async fn cookies_survive_a_round_trip() {
    if !should_run_real_tests() {
        println!("Skipping real browser test (THREADBOT_USE_REAL_CHROME not set)");
        return;
    }
    let driver = launch().await;
    driver
        .set_cookies(&[CookieRecord::new("sessionid", "abc").with_domain(".threads.net")])
        .await
        .expect("set cookies");
    let cookies = driver.cookies().await.expect("cookies");
    assert!(cookies.iter().any(|cookie| cookie.name == "sessionid"));
    driver.close().await;
}
