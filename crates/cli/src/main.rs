//! Paperback CLI - database migrations and seed data.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! paperback-cli migrate
//!
//! # Seed the catalog with sample data
//! paperback-cli seed
//!
//! # Re-seed even when books already exist
//! paperback-cli seed --force
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed the catalog with sample books, quotes, and deliveries

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "paperback-cli")]
#[command(author, version, about = "Paperback CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the catalog with sample data
    Seed {
        /// Seed even when the catalog already has books
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
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
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Seed { force } => commands::seed::catalog(force).await?,
    }
    Ok(())
}
