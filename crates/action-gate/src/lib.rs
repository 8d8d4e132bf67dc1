//! Post-action verification gate
//!
//! After every action the resolver asks this crate whether the intended
//! effect actually happened:
//! - `Check` predicates over URL, dialogs, editables and page text
//! - `VerificationSpec` with first-match-wins race semantics and a timeout
//! - `DefaultVerifier`, which polls checks through a `PageDriver` without
//!   touching page state

pub mod conditions;
pub mod errors;
pub mod types;
pub mod validator;

pub use conditions::*;
pub use errors::*;
pub use types::*;
pub use validator::*;
