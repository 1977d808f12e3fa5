//! # HyperEcho - Hypergraph Mapping CLI
//!
//! The binary entry point: tracing setup, argument parsing and dispatch.

use clap::Parser;
use hyperecho::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // Initialize tracing. HYPERECHO_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("HYPERECHO_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "hyperecho=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    // Parse CLI arguments
    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the HyperEcho startup banner.
fn print_banner() {
    eprintln!(
        "HyperEcho v{} - hypergraph substrate, cognitive echo",
        env!("CARGO_PKG_VERSION")
    );
}
