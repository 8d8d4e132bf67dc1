use clap::Subcommand;

use super::check_login::CheckLoginArgs;
use super::run::RunArgs;
use super::serve::ServeArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Log in and post one comment
    Run(RunArgs),

    /// Listen for webhook triggers that start runs
    Serve(ServeArgs),

    /// Open the home page with saved cookies and report the login verdict
    CheckLogin(CheckLoginArgs),
}
