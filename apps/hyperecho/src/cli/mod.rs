//! # HyperEcho CLI Module
//!
//! This module implements the CLI interface for HyperEcho.
//!
//! ## Available Commands
//!
//! - `echo` - Score files against the unit identity and route them
//! - `map` - Map files into the substrate and route by connectivity
//! - `status` - Show substrate metrics
//! - `export` - Write a snapshot of the substrate
//! - `import` - Replace the substrate with a snapshot
//! - `resonance` - Raw resonance of a text against the unit identity

mod commands;

use crate::config::HostConfig;
use clap::{Parser, Subcommand};
use hyperecho_core::HyperError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// HyperEcho - hypergraph mapping and identity resonance
///
/// Records text as content, word and attribute nodes in a hypergraph and
/// scores it against a cognitive identity.
#[derive(Parser, Debug)]
#[command(name = "hyperecho")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the redb substrate database (in-memory when omitted)
    #[arg(short = 'D', long, global = true)]
    pub store: Option<PathBuf>,

    /// Path to the TOML configuration file
    #[arg(short, long, global = true, default_value = "hyperecho.toml")]
    pub config: PathBuf,

    /// Output in JSON format (for programmatic access)
    #[arg(long = "json", global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Echo files through the resonance handler
    Echo {
        /// Input files ("-" reads stdin)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Map files into the substrate
    Map {
        /// Input files ("-" reads stdin)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Record attribute as key=value (repeatable)
        #[arg(short, long = "attr", value_parser = parse_attribute)]
        attributes: Vec<(String, String)>,
    },

    /// Show substrate metrics
    Status {
        /// Also report metrics for this node
        #[arg(short, long)]
        node: Option<String>,
    },

    /// Export the substrate as a snapshot file
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Replace the stored substrate with a snapshot file
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Compute resonance of a text against the unit identity
    Resonance {
        /// Text to score
        #[arg(short, long)]
        text: String,
    },
}

/// Parse a `key=value` record attribute.
pub fn parse_attribute(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{}'", raw)),
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), HyperError> {
    let config = HostConfig::load(&cli.config)?;
    if cli.verbose {
        tracing::info!(?config, "loaded configuration");
    }

    let store = cli.store.as_deref();
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Echo { files }) => cmd_echo(&config, json_mode, &files),
        Some(Commands::Map { files, attributes }) => {
            cmd_map(&config, store, json_mode, &files, &attributes)
        }
        Some(Commands::Status { node }) => cmd_status(store, json_mode, node.as_deref()),
        Some(Commands::Export { output }) => cmd_export(store, &output),
        Some(Commands::Import { input }) => cmd_import(store, &input),
        Some(Commands::Resonance { text }) => cmd_resonance(&config, json_mode, &text),
        None => {
            // No subcommand - show status by default
            cmd_status(store, json_mode, None)
        }
    }
}
