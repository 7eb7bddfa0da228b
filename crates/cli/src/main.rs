//! Bloom CLI - favorites store migration and diagnostics tools.
//!
//! Operates on a JSON-file favorites store (a device-store export or a
//! local development store).
//!
//! # Usage
//!
//! ```bash
//! # Per-identity counts and last-modified times
//! bloom-cli --store favorites.json stats
//!
//! # Migrate the legacy global list into a user's namespace
//! bloom-cli --store favorites.json migrate --user u1
//!
//! # Delete the legacy global list
//! bloom-cli --store favorites.json cleanup
//!
//! # Snapshot / restore a user's favorites
//! bloom-cli --store favorites.json backup --user u1
//! bloom-cli --store favorites.json restore --key favorites_backup_u1_1700000000123
//! ```
//!
//! The store path may also come from the `BLOOM_STORE_PATH` environment
//! variable (a `.env` file is honored).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bloom-cli")]
#[command(author, version, about = "Bloom favorites store CLI tools")]
struct Cli {
    /// Path to the JSON store file (falls back to BLOOM_STORE_PATH)
    #[arg(short, long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Per-identity favorites counts and last-modified times
    Stats,
    /// Migrate the legacy global favorites list into a user's namespace
    Migrate {
        /// Target user id
        #[arg(short, long)]
        user: String,
    },
    /// Delete the legacy global favorites list
    Cleanup,
    /// Snapshot a user's favorites under a timestamped backup key
    Backup {
        /// User id to back up
        #[arg(short, long)]
        user: String,
    },
    /// Restore a user's favorites from a backup key
    Restore {
        /// Backup storage key (favorites_backup_<id>_<millis>)
        #[arg(short, long)]
        key: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    let store = commands::open_store(cli.store).await?;

    match cli.command {
        Commands::Stats => commands::stats::report(&store).await,
        Commands::Migrate { user } => commands::migrate::run(&store, &user).await,
        Commands::Cleanup => commands::migrate::cleanup(&store).await,
        Commands::Backup { user } => commands::backup::create(&store, &user).await,
        Commands::Restore { key } => commands::backup::restore(&store, &key).await,
    }
}
