use clap::Parser;
use tracing_subscriber::EnvFilter;

use warden::config::Config;
use warden::server;

/// Minimal static file server that chroots and drops privileges.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Port to listen on
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = Config::load(cli.port);

    tokio::select! {
        res = server::start(cfg) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
