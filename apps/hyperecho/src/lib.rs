//! # HyperEcho
//!
//! Host application around `hyperecho-core`: configuration, the echo and
//! mapper text handlers, and the command line.
//!
//! ## Usage
//!
//! ```bash
//! # Score text against the unit identity
//! hyperecho echo notes.txt
//!
//! # Map files into a persistent substrate
//! hyperecho --store substrate.redb map a.txt b.txt --attr source=inbox
//! hyperecho --store substrate.redb status --node flow_0123456789abcdef_content
//!
//! # Snapshots
//! hyperecho --store substrate.redb export -o substrate.hype
//! hyperecho --store restored.redb import -i substrate.hype
//! ```

pub mod cli;
pub mod config;
pub mod handlers;

pub use config::HostConfig;
