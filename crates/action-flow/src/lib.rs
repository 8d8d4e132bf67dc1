//! Navigation layer
//!
//! Sequences the login-then-comment workflow as an explicit state machine.
//! Each state owns a plan (intent, ordered strategies, verification) that the
//! action resolver realizes; fresh page signals decide where to go next, and
//! a per-state retry budget plus a total time budget keep every run finite.

pub mod errors;
pub mod machine;
pub mod plans;
pub mod strategies;
pub mod types;

pub use errors::FlowError;
pub use machine::{NavigationStateMachine, SessionStore, SnapshotSink};
pub use plans::StatePlan;
pub use strategies::{DefaultFailureHandler, FailureHandler, FailureHandlerResult};
pub use types::{FailureStrategy, FlowConfig, Transition};
