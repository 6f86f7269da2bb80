//! CLI for Quire.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use quire_core::{QuireConfig, DEFAULT_RECENT_LIMIT};
use std::path::PathBuf;

use commands::{run_recent, run_resolve};

/// Top-level CLI
#[derive(Debug, Parser)]
#[command(name = "quire")]
#[command(about = "Quire: sandboxed markdown documents and their images", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Load every image a document references and report the outcome.
    Resolve {
        /// Markdown document.
        document: PathBuf,

        /// Extra file or folder to grant access to, as if picked by the user.
        #[arg(long = "grant", value_name = "PATH")]
        grants: Vec<PathBuf>,
    },

    /// Manage the recent documents list.
    #[command(subcommand)]
    Recent(RecentCommand),
}

#[derive(Debug, Subcommand)]
pub enum RecentCommand {
    /// Bookmark a document and add it to the list.
    Add {
        /// Path to the document.
        path: PathBuf,
    },

    /// Show recent documents, most recently opened first.
    List {
        #[arg(long, default_value_t = DEFAULT_RECENT_LIMIT, value_name = "N")]
        limit: usize,
    },

    /// Open a recent document through its bookmark.
    Open {
        /// Record identifier.
        id: String,

        /// Also resolve the images the document references.
        #[arg(long)]
        images: bool,
    },

    /// Refresh the cached size and modification date.
    Refresh {
        /// Record identifier.
        id: String,
    },

    /// Remove a document from the list.
    Remove {
        /// Record identifier.
        id: String,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let config_path = cli.config.unwrap_or_else(QuireConfig::default_path);
        let cfg = QuireConfig::load_or_default(&config_path)?;
        tracing::debug!("loaded config from {:?}: {:?}", config_path, cfg);

        match cli.command {
            CliCommand::Resolve { document, grants } => {
                run_resolve(&cfg, &document, &grants).await?
            }
            CliCommand::Recent(command) => run_recent(&cfg, command).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
