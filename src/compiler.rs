//! # Ladder Compiler
//!
//! Main entry points for turning a cycle snapshot into ladder rows.

use crate::codegen::{GenerationOutput, LadderCodeGenerator};
use crate::error::GenerationError;
use crate::io_resolver::{IoAddressResolver, IoResolver};
use crate::model::GenerationSnapshot;
use crate::relations::{RelationIndex, RelationSource};
use crate::settings::GeneratorSettings;

/// Generate the process-detail rows of a snapshot
///
/// Uses the default IO resolver and indexes the snapshot's own relationship
/// tables.
///
/// # Returns
///
/// * `Ok(GenerationOutput)` - Rows in `(sort_number, id)` detail order plus
///   every recoverable error found on the way
/// * `Err(GenerationError)` - The snapshot references records it does not contain
///
/// # Examples
///
/// ```rust
/// use ldgc::{compile_details, GenerationSnapshot, GeneratorSettings};
///
/// let snapshot = GenerationSnapshot::default();
/// let output = compile_details(&snapshot, &GeneratorSettings::default()).unwrap();
/// assert!(output.rows.is_empty());
/// ```
pub fn compile_details(
    snapshot: &GenerationSnapshot,
    settings: &GeneratorSettings,
) -> Result<GenerationOutput, GenerationError> {
    let relations = RelationIndex::from_snapshot(snapshot);
    compile_details_with_services(snapshot, settings, &IoAddressResolver, &relations)
}

/// Generate the process-detail rows with caller-supplied collaborators
///
/// `resolver` turns sensor keys into addresses; `relations` answers the
/// connection, finish and control-box queries.
pub fn compile_details_with_services(
    snapshot: &GenerationSnapshot,
    settings: &GeneratorSettings,
    resolver: &dyn IoResolver,
    relations: &dyn RelationSource,
) -> Result<GenerationOutput, GenerationError> {
    tracing::info!("[LDGC] Starting ladder generation");
    tracing::info!(
        "[LDGC] Cycle {} on PLC {}: {} details, {} processes",
        snapshot.cycle_id,
        snapshot.plc_id,
        snapshot.details.len(),
        snapshot.processes.len()
    );

    tracing::info!("[LDGC] Phase 1: Generating detail rungs...");
    let mut generator = LadderCodeGenerator::new(snapshot, settings, resolver, relations);
    let output = generator.generate_details()?;

    log_summary(&output);
    Ok(output)
}

/// Generate the whole program: process aggregate rungs, then detail rungs
///
/// Both blocks share one row-key sequence.
pub fn compile_program(
    snapshot: &GenerationSnapshot,
    settings: &GeneratorSettings,
) -> Result<GenerationOutput, GenerationError> {
    tracing::info!("[LDGC] Starting program generation");

    tracing::info!("[LDGC] Phase 1: Indexing relationships...");
    let relations = RelationIndex::from_snapshot(snapshot);

    tracing::info!("[LDGC] Phase 2: Generating process and detail rungs...");
    let mut generator = LadderCodeGenerator::new(snapshot, settings, &IoAddressResolver, &relations);
    let output = generator.generate_program()?;

    log_summary(&output);
    Ok(output)
}

fn log_summary(output: &GenerationOutput) {
    let critical = output.errors.iter().filter(|e| e.is_critical).count();
    tracing::info!(
        "[LDGC] Generation complete ({} rows, {} errors, {} critical)",
        output.rows.len(),
        output.errors.len(),
        critical
    );
}
