use clap::Parser;
use tracing_subscriber::EnvFilter;
use wasp_cli::{cli::Cli, commands, output};
use wasp_core::WaspConfig;

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    let json_mode = cli.json;

    let config = match WaspConfig::load() {
        Ok(config) => config,
        Err(err) => {
            output::emit_error(json_mode, "failed to load configuration", Some(&err.to_string()));
            std::process::exit(1);
        }
    };

    let code = match commands::dispatch(cli, config).await {
        Ok(code) => code,
        Err(err) => {
            output::emit_error(json_mode, "command failed", Some(&err.to_string()));
            1
        }
    };

    std::process::exit(code);
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
}
