//! EntiMap CLI
//!
//! Command-line tools for resolving model declarations and reconciling
//! them against an index catalog.
//!
//! # Commands
//!
//! - `resolve` - Show the indexes a set of models declares
//! - `plan` - Show what reconciliation would change
//! - `apply` - Reconcile the catalog and write it back

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// EntiMap command-line index tools.
#[derive(Parser)]
#[command(name = "entimap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the indexes each declared model resolves to
    Resolve {
        /// JSON file holding an array of model declarations
        #[arg(short, long)]
        models: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show the index changes reconciliation would make
    Plan {
        /// JSON file holding an array of model declarations
        #[arg(short, long)]
        models: PathBuf,

        /// JSON index catalog describing the current database
        #[arg(short, long)]
        catalog: PathBuf,

        /// Keep indexes no model declares
        #[arg(short, long)]
        keep_unmanaged: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Reconcile the catalog and write the result back
    Apply {
        /// JSON file holding an array of model declarations
        #[arg(short, long)]
        models: PathBuf,

        /// JSON index catalog to reconcile
        #[arg(short, long)]
        catalog: PathBuf,

        /// Keep indexes no model declares
        #[arg(short, long)]
        keep_unmanaged: bool,

        /// Dry run - show what would be done
        #[arg(short, long)]
        dry_run: bool,
    },

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
        Commands::Resolve { models, format } => {
            commands::resolve::run(&models, &format)?;
        }
        Commands::Plan {
            models,
            catalog,
            keep_unmanaged,
            format,
        } => {
            commands::plan::run(&models, &catalog, keep_unmanaged, &format)?;
        }
        Commands::Apply {
            models,
            catalog,
            keep_unmanaged,
            dry_run,
        } => {
            commands::apply::run(&models, &catalog, keep_unmanaged, dry_run)?;
        }
        Commands::Version => {
            println!("EntiMap CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("EntiMap Core v{}", entimap_core::VERSION);
        }
    }

    Ok(())
}
