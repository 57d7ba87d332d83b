//! `forgecluster node` - starts a cluster node and blocks until signaled.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use forgecluster_node::Node;
use forgecluster_registry::NodeIdentity;
use tracing::info;

pub fn run(port: u16, data_dir: &str) -> Result<()> {
    let data_dir = Path::new(data_dir);
    std::fs::create_dir_all(data_dir).context("failed to create data directory")?;

    let identity = NodeIdentity::load(&data_dir.join("config"), port).context("failed to load node identity")?;
    info!(node_id = %identity.node_id, host = %identity.host, port = identity.port, "starting node");

    let node = Node::new(identity, data_dir).context("failed to start node")?;
    let _handles = node.start();

    let shutdown = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&shutdown))
        .context("failed to install signal handler")?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&shutdown))
        .context("failed to install signal handler")?;

    while !shutdown.load(Ordering::Relaxed) {
        std::thread::sleep(std::time::Duration::from_millis(200));
    }

    info!("shutting down");
    node.shutdown();
    Ok(())
}
