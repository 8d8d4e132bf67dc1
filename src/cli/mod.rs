pub mod app;
pub mod check_login;
pub mod commands;
pub mod env;
pub mod output;
pub mod run;
pub mod runtime;
pub mod serve;

pub use env::CliArgs;
