//! Scriptable in-memory page for tests.
//!
//! A [`SimulatedPage`] holds a set of screens keyed by URL. Each screen has
//! body text and elements; elements answer to the CSS selectors they are
//! declared with and can trigger [`SimEffect`]s when clicked, filled or when
//! Enter is pressed while they hold focus.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

use crate::driver::PageDriver;
use crate::error::{AdapterError, AdapterErrorKind};
use crate::types::{CookieRecord, ElementProbe, ElementQuery, ElementRect};

const VIEWPORT_W: f64 = 1280.0;
const VIEWPORT_H: f64 = 800.0;

#[derive(Clone, Debug, PartialEq)]
pub enum SimEffect {
    /// Load another screen.
    Goto(String),
    Show(String),
    Hide(String),
    /// Empty every editable on the current screen.
    ClearEditables,
    /// Every later call fails with `PageCrashed`.
    Crash,
}

#[derive(Clone, Debug)]
pub struct SimElement {
    pub id: String,
    pub tag: String,
    pub role: Option<String>,
    pub text: String,
    pub aria_label: Option<String>,
    pub placeholder: Option<String>,
    pub selectors: Vec<String>,
    pub rect: ElementRect,
    pub visible: bool,
    pub disabled: bool,
    pub editable: bool,
    pub value: String,
    pub on_click: Vec<SimEffect>,
    pub on_fill: Vec<SimEffect>,
    pub on_enter: Vec<SimEffect>,
}

impl SimElement {
    pub fn new(id: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag: tag.into(),
            role: None,
            text: String::new(),
            aria_label: None,
            placeholder: None,
            selectors: Vec::new(),
            rect: ElementRect::new(100.0, 100.0, 120.0, 36.0),
            visible: true,
            disabled: false,
            editable: false,
            value: String::new(),
            on_click: Vec::new(),
            on_fill: Vec::new(),
            on_enter: Vec::new(),
        }
    }

    pub fn button(id: impl Into<String>, text: impl Into<String>) -> Self {
        let mut element = Self::new(id, "button").with_text(text);
        element.role = Some("button".into());
        element.selectors.push("button".into());
        element
    }

    pub fn textbox(id: impl Into<String>) -> Self {
        let mut element = Self::new(id, "div");
        element.role = Some("textbox".into());
        element.editable = true;
        element.selectors.push(r#"[contenteditable="true"]"#.into());
        element.selectors.push(r#"div[role="textbox"]"#.into());
        element
    }

    pub fn input(id: impl Into<String>, name: &str) -> Self {
        let mut element = Self::new(id, "input");
        element.role = Some("textbox".into());
        element.editable = true;
        element.selectors.push(format!(r#"input[name="{name}"]"#));
        element
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_aria_label(mut self, label: impl Into<String>) -> Self {
        self.aria_label = Some(label.into());
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self.selectors.push("[placeholder]".into());
        self
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selectors.push(selector.into());
        self
    }

    pub fn at(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.rect = ElementRect::new(x, y, width, height);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn on_click(mut self, effect: SimEffect) -> Self {
        self.on_click.push(effect);
        self
    }

    pub fn on_fill(mut self, effect: SimEffect) -> Self {
        self.on_fill.push(effect);
        self
    }

    pub fn on_enter(mut self, effect: SimEffect) -> Self {
        self.on_enter.push(effect);
        self
    }

    fn effective_role(&self) -> Option<String> {
        if let Some(role) = &self.role {
            return Some(role.clone());
        }
        match self.tag.as_str() {
            "button" => Some("button".into()),
            "a" => Some("link".into()),
            "input" | "textarea" => Some("textbox".into()),
            _ => None,
        }
    }

    fn accessible_name(&self) -> String {
        self.aria_label
            .clone()
            .filter(|label| !label.is_empty())
            .or_else(|| Some(self.text.clone()).filter(|text| !text.is_empty()))
            .or_else(|| self.placeholder.clone())
            .unwrap_or_default()
    }

    fn answers_to(&self, selector: &str) -> bool {
        selector
            .split(',')
            .map(str::trim)
            .any(|part| self.selectors.iter().any(|own| own == part))
    }

    fn is_interactive(&self) -> bool {
        self.editable
            || matches!(self.tag.as_str(), "button" | "a" | "input" | "textarea")
            || matches!(self.role.as_deref(), Some("button") | Some("textbox") | Some("link"))
    }

    fn probe(&self) -> ElementProbe {
        let rect = self.rect;
        ElementProbe {
            handle: self.id.clone(),
            tag: self.tag.clone(),
            role: self.effective_role(),
            name: self.accessible_name(),
            text: self.text.clone(),
            aria_label: self.aria_label.clone(),
            placeholder: self.placeholder.clone(),
            rect,
            visible: self.visible,
            disabled: self.disabled,
            in_viewport: rect.x + rect.width > 0.0
                && rect.y + rect.height > 0.0
                && rect.x < VIEWPORT_W
                && rect.y < VIEWPORT_H,
            editable: self.editable,
            value_len: self.value.trim().chars().count(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SimScreen {
    pub text: String,
    pub elements: Vec<SimElement>,
}

impl SimScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_element(mut self, element: SimElement) -> Self {
        self.elements.push(element);
        self
    }
}

#[derive(Default)]
struct SimState {
    url: String,
    screens: HashMap<String, SimScreen>,
    current: SimScreen,
    focused: Option<String>,
    crashed: bool,
    navigation_error: Option<AdapterErrorKind>,
    cookies: Vec<CookieRecord>,
    clicks: Vec<String>,
    fills: Vec<(String, String)>,
    keys: Vec<String>,
    navigations: Vec<String>,
    reads: usize,
}

impl SimState {
    fn load(&mut self, url: &str) {
        self.url = url.to_string();
        self.current = self.screens.get(url).cloned().unwrap_or_default();
        self.focused = None;
    }

    fn apply(&mut self, effects: &[SimEffect]) {
        for effect in effects {
            match effect {
                SimEffect::Goto(url) => self.load(url),
                SimEffect::Show(id) => self.set_visible(id, true),
                SimEffect::Hide(id) => self.set_visible(id, false),
                SimEffect::ClearEditables => {
                    for element in self.current.elements.iter_mut().filter(|el| el.editable) {
                        element.value.clear();
                    }
                }
                SimEffect::Crash => self.crashed = true,
            }
        }
    }

    fn set_visible(&mut self, id: &str, visible: bool) {
        if let Some(element) = self.current.elements.iter_mut().find(|el| el.id == id) {
            element.visible = visible;
        }
    }

    fn element_mut(&mut self, id: &str) -> Result<&mut SimElement, AdapterError> {
        self.current
            .elements
            .iter_mut()
            .find(|el| el.id == id)
            .ok_or_else(|| {
                AdapterError::new(AdapterErrorKind::TargetNotFound)
                    .with_hint(format!("element {id} is not on the current screen"))
            })
    }

    fn ensure_alive(&self) -> Result<(), AdapterError> {
        if self.crashed {
            Err(AdapterError::new(AdapterErrorKind::PageCrashed).with_hint("simulated crash"))
        } else {
            Ok(())
        }
    }
}

/// In-memory [`PageDriver`].
#[derive(Default)]
pub struct SimulatedPage {
    state: Mutex<SimState>,
}

impl SimulatedPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_screen(self, url: impl Into<String>, screen: SimScreen) -> Self {
        self.state.lock().screens.insert(url.into(), screen);
        self
    }

    /// Load `url` without recording a navigation.
    pub fn starting_at(self, url: &str) -> Self {
        self.state.lock().load(url);
        self
    }

    pub fn fail_navigation(&self, kind: AdapterErrorKind) {
        self.state.lock().navigation_error = Some(kind);
    }

    pub fn crash(&self) {
        self.state.lock().crashed = true;
    }

    pub fn url(&self) -> String {
        self.state.lock().url.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.state.lock().clicks.clone()
    }

    pub fn fills(&self) -> Vec<(String, String)> {
        self.state.lock().fills.clone()
    }

    pub fn keys(&self) -> Vec<String> {
        self.state.lock().keys.clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().navigations.clone()
    }

    pub fn stored_cookies(&self) -> Vec<CookieRecord> {
        self.state.lock().cookies.clone()
    }

    pub fn add_cookie(&self, cookie: CookieRecord) {
        self.state.lock().cookies.push(cookie);
    }

    /// Number of read calls served so far.
    pub fn reads(&self) -> usize {
        self.state.lock().reads
    }

    fn matches(element: &SimElement, query: &ElementQuery) -> bool {
        let contains = |value: &str, patterns: &[String]| {
            let hay = value.to_lowercase();
            !hay.is_empty() && patterns.iter().any(|p| hay.contains(&p.to_lowercase()))
        };
        match query {
            ElementQuery::Role { role, names } => {
                element.effective_role().as_deref() == Some(role.as_str())
                    && contains(&element.accessible_name(), names)
            }
            ElementQuery::Text { patterns } => {
                contains(&element.text, patterns)
                    || element
                        .placeholder
                        .as_deref()
                        .map(|value| contains(value, patterns))
                        .unwrap_or(false)
                    || element
                        .aria_label
                        .as_deref()
                        .map(|value| contains(value, patterns))
                        .unwrap_or(false)
            }
            ElementQuery::Css { selector } => element.answers_to(selector),
            ElementQuery::Interactive { pool } => {
                if pool.is_empty() {
                    element.is_interactive()
                } else {
                    pool.iter().any(|selector| element.answers_to(selector))
                }
            }
        }
    }
}

#[async_trait]
impl PageDriver for SimulatedPage {
    async fn navigate(&self, url: &str, _timeout: Duration) -> Result<(), AdapterError> {
        let mut state = self.state.lock();
        state.ensure_alive()?;
        state.navigations.push(url.to_string());
        if let Some(kind) = state.navigation_error {
            return Err(AdapterError::new(kind).with_hint(format!("simulated failure for {url}")));
        }
        state.load(url);
        Ok(())
    }

    async fn current_url(&self) -> Result<String, AdapterError> {
        let mut state = self.state.lock();
        state.ensure_alive()?;
        state.reads += 1;
        Ok(state.url.clone())
    }

    async fn page_text(&self) -> Result<String, AdapterError> {
        let mut state = self.state.lock();
        state.ensure_alive()?;
        state.reads += 1;
        let mut text = state.current.text.clone();
        for element in state.current.elements.iter().filter(|el| el.visible) {
            if !element.text.is_empty() {
                text.push('\n');
                text.push_str(&element.text);
            }
        }
        Ok(text)
    }

    async fn query(&self, query: &ElementQuery) -> Result<Vec<ElementProbe>, AdapterError> {
        let mut state = self.state.lock();
        state.ensure_alive()?;
        state.reads += 1;
        Ok(state
            .current
            .elements
            .iter()
            .filter(|element| Self::matches(element, query))
            .map(SimElement::probe)
            .collect())
    }

    async fn click(&self, target: &ElementProbe) -> Result<(), AdapterError> {
        let mut state = self.state.lock();
        state.ensure_alive()?;
        let effects = {
            let element = state.element_mut(&target.handle)?;
            if !element.visible {
                return Err(AdapterError::new(AdapterErrorKind::TargetNotFound)
                    .with_hint(format!("element {} is hidden", element.id)));
            }
            element.on_click.clone()
        };
        state.clicks.push(target.handle.clone());
        state.focused = Some(target.handle.clone());
        state.apply(&effects);
        Ok(())
    }

    async fn fill(&self, target: &ElementProbe, text: &str) -> Result<(), AdapterError> {
        let mut state = self.state.lock();
        state.ensure_alive()?;
        let effects = {
            let element = state.element_mut(&target.handle)?;
            if !element.editable {
                return Err(AdapterError::new(AdapterErrorKind::Script)
                    .with_hint(format!("element {} is not editable", element.id)));
            }
            element.value = text.to_string();
            element.on_fill.clone()
        };
        state.fills.push((target.handle.clone(), text.to_string()));
        state.focused = Some(target.handle.clone());
        state.apply(&effects);
        Ok(())
    }

    async fn press_key(&self, key: &str) -> Result<(), AdapterError> {
        let mut state = self.state.lock();
        state.ensure_alive()?;
        state.keys.push(key.to_string());
        if key != "Enter" {
            return Ok(());
        }
        let effects = match state.focused.clone() {
            Some(id) => state
                .current
                .elements
                .iter()
                .find(|el| el.id == id)
                .map(|el| el.on_enter.clone())
                .unwrap_or_default(),
            None => Vec::new(),
        };
        state.apply(&effects);
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, AdapterError> {
        let mut state = self.state.lock();
        state.ensure_alive()?;
        state.reads += 1;
        Ok(b"\x89PNG\r\n\x1a\n".to_vec())
    }

    async fn cookies(&self) -> Result<Vec<CookieRecord>, AdapterError> {
        let state = self.state.lock();
        state.ensure_alive()?;
        Ok(state.cookies.clone())
    }

    async fn set_cookies(&self, cookies: &[CookieRecord]) -> Result<(), AdapterError> {
        let mut state = self.state.lock();
        state.ensure_alive()?;
        for cookie in cookies {
            state.cookies.retain(|existing| existing.name != cookie.name);
            state.cookies.push(cookie.clone());
        }
        Ok(())
    }
}
