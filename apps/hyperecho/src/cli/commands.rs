//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::config::HostConfig;
use crate::handlers::{EchoHandler, META_CONNECTIONS, META_RESONANCE, MapperHandler};
use hyperecho_core::formats::MAX_SNAPSHOT_SIZE;
use hyperecho_core::{
    HyperError, MemoryPersistence, NodeId, Outcome, ProcessingUnit, Record, RedbPersistence,
    Substrate, SubstratePersistence, TextHandler, substrate_from_bytes, substrate_to_bytes,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Substrate whose persistence strategy is chosen at runtime.
pub type HostSubstrate = Substrate<Box<dyn SubstratePersistence>>;

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum size of a single input record (100 MB).
const MAX_INPUT_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Input path meaning "read standard input".
const STDIN_PATH: &str = "-";

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), HyperError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| HyperError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(HyperError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve `path` and ensure it names a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, HyperError> {
    let canonical = path.canonicalize().map_err(|e| {
        HyperError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(HyperError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve the parent directory of an output path.
fn validate_output_path(path: &Path) -> Result<PathBuf, HyperError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        HyperError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    let filename = path
        .file_name()
        .ok_or_else(|| HyperError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Read one input as text; `-` reads stdin.
pub fn read_input(path: &Path) -> Result<String, HyperError> {
    if path.as_os_str() == STDIN_PATH {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .map_err(|e| HyperError::IoError(format!("Read stdin: {}", e)))?;
        return Ok(content);
    }

    let validated = validate_file_path(path)?;
    validate_file_size(&validated, MAX_INPUT_FILE_SIZE)?;
    let bytes = std::fs::read(&validated)
        .map_err(|e| HyperError::IoError(format!("Read file: {}", e)))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Build the record for one input.
fn input_record(path: &Path, content: String, attributes: &[(String, String)]) -> Record {
    let mut record = Record::new(content);
    if let Some(name) = path.file_name().filter(|_| path.as_os_str() != STDIN_PATH) {
        record = record.with_attribute("filename", name.to_string_lossy());
    }
    for (key, value) in attributes {
        record = record.with_attribute(key.as_str(), value.as_str());
    }
    record
}

/// Open the substrate: redb-backed and loaded when `store` is set, in-memory
/// otherwise.
pub fn open_substrate(store: Option<&Path>) -> Result<Arc<HostSubstrate>, HyperError> {
    let Some(path) = store else {
        let persistence: Box<dyn SubstratePersistence> = Box::new(MemoryPersistence::new());
        return Ok(Arc::new(Substrate::with_persistence(persistence)));
    };

    let persistence: Box<dyn SubstratePersistence> = Box::new(RedbPersistence::open(path)?);
    let substrate = Substrate::with_persistence(persistence);
    if !substrate.load() {
        return Err(HyperError::IoError(format!(
            "Could not list stored ids in {:?}",
            path
        )));
    }
    tracing::debug!(
        "Loaded {} nodes, {} edges from {:?}",
        substrate.node_count(),
        substrate.edge_count(),
        path
    );
    Ok(Arc::new(substrate))
}

/// Push the substrate to its store and report mirror failures.
pub fn persist(substrate: &HostSubstrate, store: Option<&Path>) {
    if store.is_none() {
        return;
    }
    if !substrate.save() {
        tracing::warn!("Some nodes or edges could not be saved to {:?}", store);
    }
    let failures = substrate.mirror_failures();
    if failures > 0 {
        tracing::warn!("{} mirrored writes failed during this run", failures);
    }
}

/// Build and initialize a unit named by the configuration.
fn build_unit<H, P>(
    config: &HostConfig,
    handler: H,
    substrate: Option<Arc<Substrate<P>>>,
) -> ProcessingUnit<H, P>
where
    H: TextHandler<P>,
    P: SubstratePersistence,
{
    let unit = match substrate {
        Some(substrate) => ProcessingUnit::attached(config.unit_name.as_str(), handler, substrate),
        None => ProcessingUnit::detached(config.unit_name.as_str(), handler),
    }
    .with_patterns(config.extra_patterns.iter().cloned());
    unit.initialize();
    unit
}

fn print_outcome(source: &str, outcome: &Outcome, json_mode: bool) {
    if json_mode {
        let output = serde_json::json!({
            "source": source,
            "route": outcome.route,
            "metadata": outcome.metadata,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return;
    }

    println!("{} -> {}", source, outcome.route);
    for (key, value) in &outcome.metadata {
        println!("  {} = {}", key, value);
    }
}

// =============================================================================
// ECHO COMMAND
// =============================================================================

/// Echo each input through the resonance handler.
pub fn cmd_echo(config: &HostConfig, json_mode: bool, files: &[PathBuf]) -> Result<(), HyperError> {
    let unit = build_unit::<_, MemoryPersistence>(config, EchoHandler::from_config(config), None);

    for path in files {
        let record = input_record(path, read_input(path)?, &[]);
        let outcome = unit.process(&record)?;
        tracing::info!(
            "Echoed {:?}: {} (resonance {})",
            path,
            outcome.route,
            outcome.get(META_RESONANCE).unwrap_or("?")
        );
        print_outcome(&path.to_string_lossy(), &outcome, json_mode);
    }

    Ok(())
}

// =============================================================================
// MAP COMMAND
// =============================================================================

/// Map each input into one shared substrate.
pub fn cmd_map(
    config: &HostConfig,
    store: Option<&Path>,
    json_mode: bool,
    files: &[PathBuf],
    attributes: &[(String, String)],
) -> Result<(), HyperError> {
    let substrate = open_substrate(store)?;
    let unit = build_unit(
        config,
        MapperHandler::from_config(config),
        Some(Arc::clone(&substrate)),
    );

    for path in files {
        let record = input_record(path, read_input(path)?, attributes);
        let outcome = unit.process(&record)?;
        tracing::info!(
            "Mapped {:?}: {} ({} connections)",
            path,
            outcome.route,
            outcome.get(META_CONNECTIONS).unwrap_or("0")
        );
        print_outcome(&path.to_string_lossy(), &outcome, json_mode);
    }

    persist(&substrate, store);
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show substrate metrics.
pub fn cmd_status(
    store: Option<&Path>,
    json_mode: bool,
    node: Option<&str>,
) -> Result<(), HyperError> {
    let substrate = open_substrate(store)?;
    let focus = node.map(NodeId::new);
    let metrics = substrate.metrics(focus.as_ref());

    if json_mode {
        let output = serde_json::json!({
            "store": store.map(|p| p.to_string_lossy().into_owned()),
            "metrics": metrics,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("HyperEcho Substrate Status");
    println!("==========================");
    match store {
        Some(path) => println!("Store:      {:?}", path),
        None => println!("Store:      (in-memory)"),
    }
    println!();
    println!("Nodes:      {}", metrics.node_count);
    println!("Edges:      {}", metrics.edge_count);
    println!("Density:    {:.6}", metrics.density);
    println!("Activation: {:.6}", metrics.total_activation);
    println!("Max Arity:  {}", metrics.max_arity);

    match (&focus, &metrics.focus) {
        (Some(_), Some(found)) => {
            println!();
            println!("Node {}:", found.id);
            println!("  Connections:    {}", found.connections);
            println!("  Incident Edges: {}", found.incident_edges);
            println!("  Clustering:     {:.6}", found.clustering_coefficient);
            println!("  Activation:     {:.6}", found.activation);
        }
        (Some(id), None) => {
            println!();
            println!("Node {} not found", id);
        }
        _ => {}
    }

    Ok(())
}

// =============================================================================
// EXPORT COMMAND
// =============================================================================

/// Write a snapshot of the substrate.
pub fn cmd_export(store: Option<&Path>, output: &Path) -> Result<(), HyperError> {
    let validated_output = validate_output_path(output)?;
    let substrate = open_substrate(store)?;

    let data = substrate_to_bytes(&substrate.snapshot())?;
    std::fs::write(&validated_output, &data)
        .map_err(|e| HyperError::IoError(format!("Write file: {}", e)))?;

    println!("Exported {} bytes to {:?}", data.len(), validated_output);
    Ok(())
}

// =============================================================================
// IMPORT COMMAND
// =============================================================================

/// Replace the stored substrate with a snapshot.
pub fn cmd_import(store: Option<&Path>, input: &Path) -> Result<(), HyperError> {
    if store.is_none() {
        return Err(HyperError::IoError(
            "Import needs a --store to write into".to_string(),
        ));
    }

    let validated_path = validate_file_path(input)?;
    validate_file_size(&validated_path, MAX_SNAPSHOT_SIZE as u64)?;
    let data = std::fs::read(&validated_path)
        .map_err(|e| HyperError::IoError(format!("Read file: {}", e)))?;
    let graph = substrate_from_bytes(&data)?;

    let substrate = open_substrate(store)?;
    if !substrate.restore(graph) {
        tracing::warn!("Snapshot restored but some persistence writes failed");
    }

    println!(
        "Imported substrate: {} nodes, {} edges",
        substrate.node_count(),
        substrate.edge_count()
    );
    Ok(())
}

// =============================================================================
// RESONANCE COMMAND
// =============================================================================

/// Print the resonance of `text` against the configured unit identity.
pub fn cmd_resonance(config: &HostConfig, json_mode: bool, text: &str) -> Result<(), HyperError> {
    let unit = build_unit::<_, MemoryPersistence>(config, EchoHandler::from_config(config), None);
    let kernel = unit.kernel();
    let resonance = kernel.calculate_resonance(text);
    let identity = kernel.identity();

    if json_mode {
        let output = serde_json::json!({
            "text": text,
            "identity": identity.signature,
            "patterns": identity.patterns,
            "resonance": resonance,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Identity:  {}", identity.signature);
    println!("Patterns:  {}", identity.patterns.join(", "));
    println!("Resonance: {:.6}", resonance);
    Ok(())
}
