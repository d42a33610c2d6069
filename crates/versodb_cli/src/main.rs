//! VersoDB CLI
//!
//! Command-line tools for VersoDB database maintenance.
//!
//! # Commands
//!
//! - `versions` - List schema versions and the recorded current version
//! - `inspect` - Display per-table statistics
//! - `create-version` - Derive a new schema version file
//! - `verify` - Check schema and table files for consistency

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// VersoDB command-line database tools.
#[derive(Parser)]
#[command(name = "versodb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the database directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List schema versions and the recorded current version
    Versions {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Display per-table statistics
    Inspect {
        /// Show details for a single table only
        #[arg(short, long)]
        table: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Derive a new schema version file
    CreateVersion {
        /// Version string for the new schema
        #[arg(short, long)]
        app_version: String,

        /// Source version to derive from (defaults to the latest)
        #[arg(long)]
        from: Option<String>,
    },

    /// Check schema and table files for consistency
    Verify,

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Versions { format } => {
            let path = cli.path.ok_or("Database path required for versions")?;
            commands::versions::run(&path, &format)?;
        }
        Commands::Inspect { table, format } => {
            let path = cli.path.ok_or("Database path required for inspect")?;
            commands::inspect::run(&path, table.as_deref(), &format)?;
        }
        Commands::CreateVersion { app_version, from } => {
            let path = cli.path.ok_or("Database path required for create-version")?;
            commands::create_version::run(&path, &app_version, from.as_deref())?;
        }
        Commands::Verify => {
            let path = cli.path.ok_or("Database path required for verify")?;
            commands::verify::run(&path)?;
        }
        Commands::Version => {
            println!("VersoDB CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
