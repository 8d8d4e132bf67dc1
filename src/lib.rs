//! Threadbot library
//!
//! Configuration, file persistence and the run/serve surfaces around the
//! navigation state machine. Exposed for integration testing.

pub mod artifacts;
pub mod cli;
pub mod config;
pub mod runner;
pub mod server;
pub mod session_store;

pub use config::{AppConfig, ConfigError};
pub use runner::{BrowserLauncher, RunEnvironment, RunLauncher};
