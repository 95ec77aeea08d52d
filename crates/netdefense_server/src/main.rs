//! NetDefense - Game Server

use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;
use netdefense_server::ServerConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "netdefense-server")]
#[command(about = "HTTP game server for NetDefense")]
struct Cli {
    /// Address to bind
    #[arg(long, env = "NETDEFENSE_HOST", default_value = "127.0.0.1")]
    host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "NETDEFENSE_PORT", default_value_t = 8080)]
    port: u16,

    /// Building catalog RON file
    #[arg(long, env = "NETDEFENSE_CATALOG")]
    catalog: Option<PathBuf>,

    /// Game rules RON file
    #[arg(long, env = "NETDEFENSE_RULES")]
    rules: Option<PathBuf>,

    /// Fixed seed for incident draws
    #[arg(long, env = "NETDEFENSE_SEED")]
    seed: Option<u64>,
}

impl From<Cli> for ServerConfig {
    fn from(cli: Cli) -> Self {
        Self {
            host: cli.host,
            port: cli.port,
            catalog_path: cli.catalog,
            rules_path: cli.rules,
            seed: cli.seed,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting NetDefense server");

    let config = ServerConfig::from(Cli::parse());
    if let Err(e) = netdefense_server::serve(config).await {
        tracing::error!("Server failed: {e}");
        std::process::exit(1);
    }
}
