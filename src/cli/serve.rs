use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use crate::config::AppConfig;
use crate::runner::{BrowserLauncher, RunEnvironment};
use crate::server::{build_router, ServeState};

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    /// Port for the webhook server
    #[arg(long, default_value_t = 5000)]
    pub port: u16,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub host: IpAddr,
}

pub async fn cmd_serve(args: ServeArgs, config: AppConfig) -> Result<()> {
    let base = config.trigger_base()?;
    let flow = config.flow_config()?;
    let launcher = BrowserLauncher::new(
        config.browser_options(),
        RunEnvironment::from_config(&config, flow),
    );

    let app = build_router(ServeState::new(Arc::new(launcher), base));
    let addr = SocketAddr::new(args.host, args.port);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding webhook server to {addr}"))?;
    info!(%addr, "webhook server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await
        .context("webhook server failed")
}
