use anyhow::Context;
use tracing_subscriber::EnvFilter;
use wasp_core::WaspConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = WaspConfig::load().context("loading configuration")?;
    tracing::info!(data_dir = %config.data_dir.display(), "wasp configuration loaded");

    wasp_server::run(config).await
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,wasp_server=debug")),
        )
        .init();
}
