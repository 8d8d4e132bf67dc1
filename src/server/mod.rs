//! Webhook trigger surface.
//!
//! A POST replaces the comment payload for one run and queues it; runs are
//! serialized behind a single gate so they never share a browser session.

mod router;
mod state;

pub use router::{build_router, WebhookRequest};
pub use state::{RunStatus, ServeState};
