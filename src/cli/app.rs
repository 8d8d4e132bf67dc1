use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};

use super::check_login::cmd_check_login;
use super::commands::Commands;
use super::env::CliArgs;
use super::run::cmd_run;
use super::runtime::{init_logging, load_config, load_local_env_overrides, LoadedConfig};
use super::serve::cmd_serve;

pub async fn run() -> Result<()> {
    let local_env = load_local_env_overrides(Path::new("config/local.env"));
    let cli = CliArgs::parse();

    let LoadedConfig {
        config,
        path,
        from_file,
    } = load_config(cli.config.as_ref()).await?;

    let _log_guard = init_logging(
        &cli.log_level,
        cli.debug,
        cli.log_json,
        config.logging.directory.as_deref(),
    )?;

    info!("Starting threadbot v{}", env!("CARGO_PKG_VERSION"));
    if local_env > 0 {
        info!(count = local_env, "Loaded environment overrides from config/local.env");
    }
    if from_file {
        info!("Loaded configuration from: {}", path.display());
    } else {
        warn!("Config file not found, using defaults: {}", path.display());
    }

    let result = match cli.command {
        Commands::Run(args) => cmd_run(args, config, cli.output).await,
        Commands::Serve(args) => cmd_serve(args, config).await,
        Commands::CheckLogin(args) => cmd_check_login(args, config, cli.output).await,
    };

    match result {
        Ok(()) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(err) => {
            error!("Command failed: {:#}", err);
            Err(err)
        }
    }
}
