//! Session perceiver
//!
//! Scrapes weak, independent signals from the current page and folds them
//! into a conservative logged-in verdict. The same observation pass also
//! classifies the page (account chooser, credential form, security
//! challenge, compose surface) so the navigation layer can react to what a
//! page load actually revealed.

pub mod oracle;
pub mod perceiver;
pub mod signal;

pub use oracle::{evaluate, Confidence, LoginVerdict};
pub use perceiver::{PageKind, PageSignals, SessionPerceiver};
pub use signal::{LoginSignal, Polarity, SignalWeight};
