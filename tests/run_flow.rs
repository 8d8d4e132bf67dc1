//! End-to-end runs over a simulated page with real file persistence.

use std::path::Path;
use std::sync::Arc;

use action_flow::{FlowConfig, SessionStore};
use cdp_adapter::sim::{SimEffect, SimElement, SimScreen, SimulatedPage};
use cdp_adapter::CookieRecord;
use threadbot_cli::session_store::FileSessionStore;
use threadbot_cli::RunEnvironment;
use threadbot_core_types::{ErrorCategory, NavState, RunConfig, RunId, RunTarget};

const HOME: &str = "https://www.threads.net/";
const SSO: &str = "https://www.instagram.com/threads/sso/";
const FEED: &str = "https://www.threads.net/?logged_in=1";
const TARGET: &str = "https://www.threads.net/@target";

fn environment(dir: &Path) -> RunEnvironment {
    RunEnvironment {
        flow: Arc::new(FlowConfig {
            retry_budget: 3,
            backoff_ms: 100,
            total_budget_ms: 600_000,
            strategy_timeout_ms: 300,
            verification_timeout_ms: 500,
            consent_timeout_ms: 1_000,
            settle_ms: 50,
            ..FlowConfig::default()
        }),
        cookie_file: dir.join("session").join("cookies.json"),
        result_file: dir.join("out").join("result.json"),
        screenshot_dir: Some(dir.join("shots")),
    }
}

fn run() -> RunConfig {
    RunConfig::new(
        "dorar.ing",
        "great thread",
        RunTarget::Profile {
            handle: "target".into(),
        },
    )
}

fn logged_in_screen() -> SimScreen {
    SimScreen::new()
        .with_text("Home Search Activity Profile")
        .with_element(SimElement::new("nav", "nav").with_selector("nav"))
        .with_element(
            SimElement::new("me", "a")
                .with_aria_label("profile")
                .with_selector(r#"a[href*="profile"]"#)
                .at(10.0, 700.0, 40.0, 40.0),
        )
}

fn target_screen() -> SimScreen {
    logged_in_screen()
        .with_element(
            SimElement::new("reply", "div")
                .with_role("button")
                .with_aria_label("Reply")
                .at(100.0, 400.0, 48.0, 36.0)
                .on_click(SimEffect::Show("dialog".into()))
                .on_click(SimEffect::Show("composer".into()))
                .on_click(SimEffect::Show("post".into()))
                .on_click(SimEffect::Hide("reply".into())),
        )
        .with_element(
            SimElement::new("dialog", "div")
                .with_role("dialog")
                .with_selector(r#"div[role="dialog"]"#)
                .at(50.0, 20.0, 700.0, 400.0)
                .hidden(),
        )
        .with_element(
            SimElement::textbox("composer")
                .with_placeholder("Reply...")
                .at(100.0, 200.0, 500.0, 60.0)
                .hidden(),
        )
        .with_element(
            SimElement::button("post", "Post")
                .at(600.0, 50.0, 60.0, 32.0)
                .hidden()
                .on_click(SimEffect::Hide("dialog".into()))
                .on_click(SimEffect::ClearEditables),
        )
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

#[tokio::test(start_paused = true)]
async fn sso_run_writes_record_and_saves_session() {
    let dir = tempfile::tempdir().unwrap();
    let env = environment(dir.path());
    let home = SimScreen::new()
        .with_text("Log in or sign up for Threads")
        .with_element(
            SimElement::button("consent", "Continue with Instagram")
                .on_click(SimEffect::Goto(SSO.into())),
        );
    let chooser = SimScreen::new()
        .with_text("Move to Threads")
        .with_element(
            SimElement::button("mine", "dorar.ing")
                .at(100.0, 200.0, 300.0, 48.0)
                .on_click(SimEffect::Goto(FEED.into())),
        );
    let page = Arc::new(
        SimulatedPage::new()
            .with_screen(HOME, home)
            .with_screen(SSO, chooser)
            .with_screen(FEED, logged_in_screen())
            .with_screen(TARGET, target_screen())
            .starting_at("about:blank"),
    );
    page.add_cookie(CookieRecord::new("sessionid", "fresh").with_domain(".instagram.com"));

    let report = env.execute(page.clone(), None, RunId::new(), run()).await;

    assert!(report.succeeded());
    assert!(report.reached_states.contains(&NavState::AccountChooser));
    let written = read_json(&env.result_file);
    assert_eq!(written["finalState"], "Done");
    assert_eq!(written["commentSubmitted"], true);
    assert_eq!(written["loginSucceeded"], true);

    let saved = FileSessionStore::new(&env.cookie_file).load().await.unwrap();
    assert!(saved.iter().any(|cookie| cookie.name == "sessionid"));
}

#[tokio::test(start_paused = true)]
async fn saved_session_is_restored_on_the_next_run() {
    let dir = tempfile::tempdir().unwrap();
    let env = environment(dir.path());
    FileSessionStore::new(&env.cookie_file)
        .save(&[CookieRecord::new("sessionid", "kept").with_domain(".threads.net")])
        .await
        .unwrap();
    let page = Arc::new(
        SimulatedPage::new()
            .with_screen(HOME, logged_in_screen())
            .with_screen(TARGET, target_screen())
            .starting_at("about:blank"),
    );

    let report = env.execute(page.clone(), None, RunId::new(), run()).await;

    assert!(report.succeeded());
    assert_eq!(report.reached_states[..2], [NavState::Home, NavState::Profile]);
    assert_eq!(page.stored_cookies()[0].value, "kept");
}

#[tokio::test(start_paused = true)]
async fn corrupt_cookie_file_does_not_stop_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let env = environment(dir.path());
    std::fs::create_dir_all(env.cookie_file.parent().unwrap()).unwrap();
    std::fs::write(&env.cookie_file, b"not json").unwrap();
    let page = Arc::new(
        SimulatedPage::new()
            .with_screen(HOME, logged_in_screen())
            .with_screen(TARGET, target_screen())
            .starting_at("about:blank"),
    );

    let report = env.execute(page, None, RunId::new(), run()).await;

    assert!(report.succeeded());
    assert!(!report.has_category(ErrorCategory::InfrastructureFault));
}
