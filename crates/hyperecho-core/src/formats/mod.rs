//! # Formats Module
//!
//! Binary snapshot format for whole substrates.
//! File I/O operations are in the app layer.

mod persistence;

pub use persistence::*;
