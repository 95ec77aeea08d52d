//! NetDefense - Development Tools

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "netdefense-tools")]
#[command(about = "Development tools for NetDefense game data")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate data files
    Validate {
        /// Path to data directory
        #[arg(default_value = "assets/data")]
        path: PathBuf,
    },
    /// Print a building catalog grouped by device class
    Catalog {
        /// Path to a catalog file
        #[arg(default_value = "assets/data/buildings.ron")]
        path: PathBuf,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { path } => {
            tracing::info!("Validating data files in: {}", path.display());
            netdefense_tools::validate::validate_data_directory(&path).map(|report| {
                tracing::info!(
                    building_types = report.building_types,
                    grid_size = report.grid_size,
                    "Validation passed"
                );
            })
        }
        Commands::Catalog { path } => {
            netdefense_tools::validate::validate_catalog_file(&path).and_then(|catalog| {
                let summary = netdefense_tools::validate::CatalogSummary::new(&catalog);
                println!("{}", summary.to_ron()?);
                Ok(())
            })
        }
    };

    if let Err(e) = result {
        tracing::error!("Failed: {e}");
        std::process::exit(1);
    }
}
