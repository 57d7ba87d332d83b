//! forgecluster unified CLI.
//!
//! ```bash
//! # Start a cluster node
//! forgecluster node --port 5001 --data-dir ./data
//!
//! # Start the client-facing proxy
//! forgecluster router --port 6000 --data-dir ./data
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "forgecluster")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a cluster node.
    Node {
        /// Port this node listens on, also used to derive its node id.
        #[arg(short, long)]
        port: u16,

        /// Directory for snapshot, log, and registry files.
        #[arg(short, long, default_value = "./data")]
        data_dir: String,
    },

    /// Start the client-facing proxy.
    Router {
        /// Port the router listens on.
        #[arg(short, long)]
        port: u16,

        /// Directory containing the shared Peer Registry.
        #[arg(short, long, default_value = "./data")]
        data_dir: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Node { port, data_dir } => commands::node::run(port, &data_dir),
        Commands::Router { port, data_dir } => commands::router::run(port, &data_dir),
    }
}
