//! shopchat CLI - Database migrations and bulk loading.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! shopchat migrate
//!
//! # Load the catalog, customers and orders from a directory of CSV files
//! shopchat load --dir ./data
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `load` - Bulk load CSV exports

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "shopchat")]
#[command(author, version, about = "shopchat CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Bulk load CSV files into the database
    Load {
        /// Directory containing `distribution_centers.csv`, `products.csv`,
        /// `users.csv`, `orders.csv`, `inventory_items.csv` and `order_items.csv`
        #[arg(short, long)]
        dir: PathBuf,

        /// Rows per insert transaction
        #[arg(long, default_value_t = commands::load::DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Load { dir, batch_size } => {
            let reports = commands::load::run(&dir, batch_size).await?;
            for report in &reports {
                tracing::info!(
                    table = report.table,
                    read = report.read,
                    skipped = report.skipped,
                    inserted = report.inserted,
                    complete = report.complete,
                    "Table loaded"
                );
            }
        }
    }
    Ok(())
}
