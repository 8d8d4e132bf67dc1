//! Action resolver - ordered strategy fallback
//!
//! This crate turns a semantic [`Intent`](threadbot_core_types::Intent) into
//! a verified page effect:
//! - candidate discovery per strategy kind (role, text, selector list,
//!   heuristic scan, positional fallback)
//! - actionable filtering and geometry-aware selection
//! - keyword-strength ranking for heuristic scans
//! - post-action verification through the action gate

pub mod errors;
pub mod resolver;
pub mod strategies;
pub mod types;

pub use errors::*;
pub use resolver::*;
pub use strategies::*;
pub use types::*;
