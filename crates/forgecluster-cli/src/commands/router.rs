//! `forgecluster router` - starts the client-facing proxy.

use std::path::Path;

use anyhow::{Context, Result};
use forgecluster_registry::PeerRegistry;
use tracing::info;

pub fn run(port: u16, data_dir: &str) -> Result<()> {
    let data_dir = Path::new(data_dir);
    std::fs::create_dir_all(data_dir.join("config")).context("failed to create data directory")?;

    let registry = PeerRegistry::new(data_dir.join("config").join("peers.json"));
    let addr = format!("127.0.0.1:{port}");
    info!(addr, "starting router");

    forgecluster_router::serve(&addr, registry).context("router server exited")
}
