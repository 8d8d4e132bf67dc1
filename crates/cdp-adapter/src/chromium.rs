//! chromiumoxide-backed [`PageDriver`].

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
    DispatchMouseEventType, InsertTextParams, MouseButton,
};
use chromiumoxide::cdp::browser_protocol::network::{
    Cookie, CookieParam, CookieSameSite, TimeSinceEpoch,
};
use chromiumoxide::cdp::js_protocol::runtime::{
    ConsoleApiCalledType, EventConsoleApiCalled, EventExceptionThrown,
};
use chromiumoxide::error::CdpError;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use parking_lot::Mutex;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::discovery::resolve_chrome_path;
use crate::driver::PageDriver;
use crate::error::{AdapterError, AdapterErrorKind};
use crate::observer::{ObservedEvent, ObservedKind, PageObserver};
use crate::script;
use crate::types::{CookieRecord, ElementProbe, ElementQuery};

const LAUNCH_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--disable-dev-shm-usage",
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-gpu",
    "--disable-software-rasterizer",
];

/// Launch settings for [`ChromiumDriver::launch`].
#[derive(Clone, Debug)]
pub struct BrowserOptions {
    pub headless: bool,
    pub executable: Option<PathBuf>,
    pub window_width: u32,
    pub window_height: u32,
    pub user_agent: Option<String>,
    pub extra_args: Vec<String>,
    pub request_timeout: Duration,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            window_width: 1280,
            window_height: 800,
            user_agent: None,
            extra_args: Vec::new(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

pub struct ChromiumDriver {
    browser: tokio::sync::Mutex<Browser>,
    page: Page,
    handler_task: JoinHandle<()>,
    observer_tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ChromiumDriver {
    pub async fn launch(options: BrowserOptions) -> Result<Self, AdapterError> {
        let mut builder = BrowserConfig::builder()
            .window_size(options.window_width, options.window_height)
            .request_timeout(options.request_timeout)
            .args(LAUNCH_ARGS.iter().map(|arg| arg.to_string()));
        if let Some(path) = resolve_chrome_path(options.executable.as_ref()) {
            builder = builder.chrome_executable(path);
        }
        if !options.headless {
            builder = builder.with_head();
        }
        builder = builder.arg(format!(
            "--window-size={},{}",
            options.window_width, options.window_height
        ));
        if let Some(agent) = &options.user_agent {
            builder = builder.arg(format!("--user-agent={agent}"));
        }
        for extra in &options.extra_args {
            builder = builder.arg(extra.clone());
        }
        let config = builder
            .build()
            .map_err(|err| AdapterError::new(AdapterErrorKind::Launch).with_hint(err))?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(|err| {
            AdapterError::new(AdapterErrorKind::Launch).with_hint(err.to_string())
        })?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    error!(target: "cdp-adapter", %err, "browser handler stopped");
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(map_cdp_error)?;

        info!(
            target: "cdp-adapter",
            headless = options.headless,
            "chromium session started"
        );

        Ok(Self {
            browser: tokio::sync::Mutex::new(browser),
            page,
            handler_task,
            observer_tasks: Mutex::new(Vec::new()),
        })
    }

    /// Forward console errors and uncaught exceptions to `observer`.
    pub async fn attach_observer(
        &self,
        observer: Arc<dyn PageObserver>,
    ) -> Result<(), AdapterError> {
        let mut console = self
            .page
            .event_listener::<EventConsoleApiCalled>()
            .await
            .map_err(map_cdp_error)?;
        let mut exceptions = self
            .page
            .event_listener::<EventExceptionThrown>()
            .await
            .map_err(map_cdp_error)?;

        let console_observer = Arc::clone(&observer);
        let console_task = tokio::spawn(async move {
            while let Some(event) = console.next().await {
                if !matches!(event.r#type, ConsoleApiCalledType::Error) {
                    continue;
                }
                let message = event
                    .args
                    .iter()
                    .filter_map(|arg| {
                        arg.value
                            .as_ref()
                            .map(|value| match value.as_str() {
                                Some(text) => text.to_string(),
                                None => value.to_string(),
                            })
                            .or_else(|| arg.description.clone())
                    })
                    .collect::<Vec<_>>()
                    .join(" ");
                console_observer.on_event(ObservedEvent {
                    kind: ObservedKind::ConsoleError,
                    message,
                });
            }
        });

        let exception_task = tokio::spawn(async move {
            while let Some(event) = exceptions.next().await {
                let details = &event.exception_details;
                let message = details
                    .exception
                    .as_ref()
                    .and_then(|exception| exception.description.clone())
                    .unwrap_or_else(|| details.text.clone());
                observer.on_event(ObservedEvent {
                    kind: ObservedKind::PageError,
                    message,
                });
            }
        });

        let mut tasks = self.observer_tasks.lock();
        tasks.push(console_task);
        tasks.push(exception_task);
        Ok(())
    }

    pub async fn close(&self) {
        for task in self.observer_tasks.lock().drain(..) {
            task.abort();
        }
        let mut browser = self.browser.lock().await;
        if let Err(err) = browser.close().await {
            warn!(target: "cdp-adapter", %err, "browser close failed");
        }
        if let Err(err) = browser.wait().await {
            debug!(target: "cdp-adapter", %err, "browser wait failed");
        }
        self.handler_task.abort();
    }

    async fn evaluate<T: for<'de> Deserialize<'de>>(
        &self,
        expression: String,
    ) -> Result<T, AdapterError> {
        let result = self
            .page
            .evaluate(expression)
            .await
            .map_err(map_cdp_error)?;
        result
            .into_value::<T>()
            .map_err(|err| AdapterError::new(AdapterErrorKind::Script).with_hint(err.to_string()))
    }

    async fn dispatch_click(&self, x: f64, y: f64) -> Result<(), AdapterError> {
        let base = DispatchMouseEventParams::builder()
            .x(x)
            .y(y)
            .button(MouseButton::Left)
            .click_count(1);
        for kind in [
            DispatchMouseEventType::MouseMoved,
            DispatchMouseEventType::MousePressed,
            DispatchMouseEventType::MouseReleased,
        ] {
            let command = base
                .clone()
                .r#type(kind)
                .build()
                .map_err(|err| AdapterError::new(AdapterErrorKind::Internal).with_hint(err))?;
            self.page.execute(command).await.map_err(map_cdp_error)?;
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct Center {
    x: f64,
    y: f64,
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), AdapterError> {
        debug!(target: "cdp-adapter", %url, "navigating");
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(err)) => Err(map_cdp_error(err)),
            Err(_) => Err(AdapterError::new(AdapterErrorKind::NavTimeout)
                .with_hint(format!("{url} did not load within {}ms", timeout.as_millis()))),
        }
    }

    async fn current_url(&self) -> Result<String, AdapterError> {
        let url = self.page.url().await.map_err(map_cdp_error)?;
        Ok(url.unwrap_or_default())
    }

    async fn page_text(&self) -> Result<String, AdapterError> {
        self.evaluate(script::PAGE_TEXT.to_string()).await
    }

    async fn query(&self, query: &ElementQuery) -> Result<Vec<ElementProbe>, AdapterError> {
        self.evaluate(script::probe(query)?).await
    }

    async fn click(&self, target: &ElementProbe) -> Result<(), AdapterError> {
        let center: Option<Center> = self.evaluate(script::center(&target.handle)?).await?;
        let Some(center) = center else {
            return Err(AdapterError::new(AdapterErrorKind::TargetNotFound)
                .with_hint(format!("element {} detached before click", target.handle)));
        };
        self.dispatch_click(center.x, center.y).await
    }

    async fn fill(&self, target: &ElementProbe, text: &str) -> Result<(), AdapterError> {
        self.click(target).await?;
        let cleared: bool = self.evaluate(script::clear(&target.handle)?).await?;
        if !cleared {
            return Err(AdapterError::new(AdapterErrorKind::TargetNotFound)
                .with_hint(format!("element {} detached before fill", target.handle)));
        }
        self.page
            .execute(InsertTextParams::new(text))
            .await
            .map_err(map_cdp_error)?;
        Ok(())
    }

    async fn press_key(&self, key: &str) -> Result<(), AdapterError> {
        let (code, key_code, text) = match key {
            "Enter" => ("Enter", 13, Some("\r")),
            "Escape" => ("Escape", 27, None),
            "Tab" => ("Tab", 9, None),
            other => {
                return Err(AdapterError::new(AdapterErrorKind::Internal)
                    .with_hint(format!("unsupported key '{other}'")))
            }
        };
        let mut base = DispatchKeyEventParams::builder()
            .key(key)
            .code(code)
            .windows_virtual_key_code(key_code)
            .native_virtual_key_code(key_code);
        if let Some(text) = text {
            base = base.text(text);
        }
        for kind in [DispatchKeyEventType::KeyDown, DispatchKeyEventType::KeyUp] {
            let command = base
                .clone()
                .r#type(kind)
                .build()
                .map_err(|err| AdapterError::new(AdapterErrorKind::Internal).with_hint(err))?;
            self.page.execute(command).await.map_err(map_cdp_error)?;
        }
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, AdapterError> {
        self.page
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await
            .map_err(map_cdp_error)
    }

    async fn cookies(&self) -> Result<Vec<CookieRecord>, AdapterError> {
        let cookies = self.page.get_cookies().await.map_err(map_cdp_error)?;
        Ok(cookies.into_iter().map(cookie_record).collect())
    }

    async fn set_cookies(&self, cookies: &[CookieRecord]) -> Result<(), AdapterError> {
        let params: Vec<CookieParam> = cookies.iter().map(cookie_param).collect();
        self.page
            .set_cookies(params)
            .await
            .map_err(map_cdp_error)?;
        Ok(())
    }
}

fn cookie_record(cookie: Cookie) -> CookieRecord {
    CookieRecord {
        name: cookie.name,
        value: cookie.value,
        domain: Some(cookie.domain),
        path: Some(cookie.path),
        expires: Some(cookie.expires),
        http_only: Some(cookie.http_only),
        secure: Some(cookie.secure),
        same_site: cookie.same_site.map(|site| {
            match site {
                CookieSameSite::Strict => "Strict",
                CookieSameSite::Lax => "Lax",
                CookieSameSite::None => "None",
            }
            .to_string()
        }),
    }
}

fn cookie_param(record: &CookieRecord) -> CookieParam {
    let mut param = CookieParam::new(record.name.clone(), record.value.clone());
    param.domain = record.domain.clone();
    param.path = record.path.clone();
    param.http_only = record.http_only;
    param.secure = record.secure;
    param.expires = record
        .expires
        .filter(|value| *value > 0.0)
        .map(TimeSinceEpoch::new);
    param.same_site = record.same_site.as_deref().and_then(|site| match site {
        "Strict" => Some(CookieSameSite::Strict),
        "Lax" => Some(CookieSameSite::Lax),
        "None" => Some(CookieSameSite::None),
        _ => None,
    });
    param
}

fn map_cdp_error(err: CdpError) -> AdapterError {
    let message = err.to_string();
    let kind = match &err {
        CdpError::Timeout => AdapterErrorKind::NavTimeout,
        CdpError::NotFound | CdpError::FrameNotFound(_) => AdapterErrorKind::TargetNotFound,
        CdpError::JavascriptException(_) | CdpError::Serde(_) => AdapterErrorKind::Script,
        CdpError::Ws(_) | CdpError::NoResponse | CdpError::ChannelSendError(_) => {
            AdapterErrorKind::CdpIo
        }
        CdpError::ChromeMessage(text) => classify_chrome_message(text),
        _ => AdapterErrorKind::Internal,
    };
    AdapterError::new(kind).with_hint(message)
}

fn classify_chrome_message(text: &str) -> AdapterErrorKind {
    let lower = text.to_ascii_lowercase();
    if lower.contains("crash") || lower.contains("target closed") {
        AdapterErrorKind::PageCrashed
    } else if lower.contains("net::err") || lower.contains("navigation") {
        AdapterErrorKind::NavigationFailed
    } else {
        AdapterErrorKind::Internal
    }
}
