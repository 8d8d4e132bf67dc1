//! Chromium DevTools Protocol page driver.
//!
//! The layers above never talk to the browser directly. They drive a
//! [`PageDriver`], which exposes the handful of primitives the action
//! engine needs: navigation, element probes, click, fill, key presses,
//! screenshots and cookies. [`ChromiumDriver`] implements it on top of
//! chromiumoxide; the `sim` feature adds an in-memory page for tests.

pub mod chromium;
pub mod discovery;
pub mod driver;
pub mod error;
pub mod observer;
pub mod script;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod types;

pub use chromium::{BrowserOptions, ChromiumDriver};
pub use driver::PageDriver;
pub use error::{AdapterError, AdapterErrorKind};
pub use observer::{CollectingObserver, ObservedEvent, ObservedKind, PageObserver};
pub use types::{CookieRecord, ElementProbe, ElementQuery, ElementRect};
