use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    threadbot_cli::cli::app::run().await
}
