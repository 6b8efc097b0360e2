//! Startup sequence and accept loop.

pub mod listener;
pub mod privileges;

use tracing::info;

use crate::config::{Config, StaticFilesConfig};
use privileges::ServerIdentity;

/// Runs the server: resolve the run-as account, bind, confine the
/// filesystem, drop privileges, then accept connections.
///
/// The order is fixed. Binding a low port needs privileges, and no connection
/// may be accepted until they are gone.
pub async fn start(cfg: Config) -> anyhow::Result<()> {
    info!("Starting server...");

    let identity = ServerIdentity::resolve(&cfg.server.run_as)?;
    let listener = listener::bind(&cfg.server)?;
    let root = privileges::confine(&cfg.static_files.root)?;
    privileges::drop_to(&identity)?;

    let static_files = StaticFilesConfig {
        root,
        ..cfg.static_files
    };
    listener::run(listener, static_files, cfg.server.deadline).await
}
