//! Aitoonic CLI - Catalog inspection and seeding tools.
//!
//! # Usage
//!
//! ```bash
//! # Show the categories the public site lists, with tool counts
//! aitoonic-cli categories
//!
//! # Insert categories, tools and agents from a YAML file
//! aitoonic-cli seed catalog.yaml
//! ```
//!
//! Both commands read `SUPABASE_URL` and `SUPABASE_ANON_KEY`; `seed` also
//! signs in with `ADMIN_EMAIL` and `ADMIN_PASSWORD`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "aitoonic-cli")]
#[command(author, version, about = "Aitoonic CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List visible categories, most tools first
    Categories,
    /// Seed the catalog from a YAML file
    Seed {
        /// Path to the YAML seed file
        file: PathBuf,
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
        Commands::Categories => commands::categories::list().await?,
        Commands::Seed { file } => commands::seed::from_file(&file).await?,
    }
    Ok(())
}
