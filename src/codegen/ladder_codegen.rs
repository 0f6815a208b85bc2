//! # Ladder Code Generator
//!
//! Walks a snapshot in sort order and concatenates the rungs of every
//! process detail into one keyed row stream.

use serde::Serialize;

use crate::error::{ErrorAggregator, GenerationError, OutputError};
use crate::io_resolver::IoResolver;
use crate::ladder::{LadderCsvRow, RowKeyCounter};
use crate::model::GenerationSnapshot;
use crate::relations::RelationSource;
use crate::settings::GeneratorSettings;

use super::category_handlers::Category;
use super::detail_unit::{DetailUnitBuilder, GenerationContext, ManualSlotIndex};
use super::process_unit::ProcessUnitBuilder;

/// Result of one generation run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct GenerationOutput {
    pub rows: Vec<LadderCsvRow>,
    pub errors: Vec<OutputError>,
}

impl GenerationOutput {
    pub fn has_critical(&self) -> bool {
        self.errors.iter().any(|e| e.is_critical)
    }
}

/// Ladder generator for one snapshot.
///
/// Owns the row-key counter; every `generate_*` call resets it first, so
/// repeated runs produce identical streams.
pub struct LadderCodeGenerator<'a> {
    ctx: GenerationContext<'a>,
    slots: ManualSlotIndex,
    keys: RowKeyCounter,
}

impl<'a> LadderCodeGenerator<'a> {
    pub fn new(
        snapshot: &'a GenerationSnapshot,
        settings: &'a GeneratorSettings,
        resolver: &'a dyn IoResolver,
        relations: &'a dyn RelationSource,
    ) -> Self {
        Self {
            ctx: GenerationContext {
                snapshot,
                settings,
                resolver,
                relations,
            },
            slots: ManualSlotIndex::from_snapshot(snapshot),
            keys: RowKeyCounter::new(),
        }
    }

    /// Rows for every process detail, in `(sort_number, id)` order.
    pub fn generate_details(&mut self) -> Result<GenerationOutput, GenerationError> {
        self.keys.reset();
        let mut rows = Vec::new();
        let mut errors = ErrorAggregator::new();
        self.emit_details(&mut rows, &mut errors)?;
        Ok(GenerationOutput {
            rows,
            errors: errors.into_errors(),
        })
    }

    /// Process aggregate rungs followed by every detail's rungs.
    pub fn generate_program(&mut self) -> Result<GenerationOutput, GenerationError> {
        self.keys.reset();
        let mut rows = Vec::new();
        let mut errors = ErrorAggregator::new();
        self.emit_processes(&mut rows)?;
        self.emit_details(&mut rows, &mut errors)?;
        Ok(GenerationOutput {
            rows,
            errors: errors.into_errors(),
        })
    }

    fn emit_processes(&mut self, rows: &mut Vec<LadderCsvRow>) -> Result<(), GenerationError> {
        let processes = self.ctx.snapshot.processes_in_order();
        tracing::debug!("[LDGC] Emitting {} processes", processes.len());

        for process in processes {
            let mut unit = vec![LadderCsvRow::statement(format!(
                "{}:{}",
                process.record.id, process.record.process_name
            ))];
            unit.extend(ProcessUnitBuilder::new(self.ctx, process).build()?);
            self.keys.append(rows, unit);
        }
        Ok(())
    }

    fn emit_details(
        &mut self,
        rows: &mut Vec<LadderCsvRow>,
        errors: &mut ErrorAggregator,
    ) -> Result<(), GenerationError> {
        let details = self.ctx.snapshot.details_in_order();
        tracing::debug!("[LDGC] Emitting {} process details", details.len());

        for detail in details {
            let record = &detail.record;
            let Some(category) = record.category_id.and_then(Category::from_id) else {
                tracing::debug!(
                    "[LDGC] detail {} ({}): category {:?} skipped",
                    record.id,
                    record.detail_name,
                    record.category_id
                );
                continue;
            };
            if !category.is_implemented() {
                tracing::debug!(
                    "[LDGC] detail {} ({}): {} not implemented, skipped",
                    record.id,
                    record.detail_name,
                    category.label()
                );
                continue;
            }

            tracing::debug!(
                "[LDGC] detail {} ({}) as {}",
                record.id,
                record.detail_name,
                category.label()
            );
            let slot = self.slots.slot_of(record.id);
            let mut builder = DetailUnitBuilder::new(self.ctx, detail, slot)?;
            builder.build(category)?;
            let output = builder.finish();

            for error in output.errors {
                errors.add(error);
            }
            if output.rows.is_empty() {
                continue;
            }

            let mut unit = Vec::with_capacity(output.rows.len() + 1);
            unit.push(LadderCsvRow::statement(format!(
                "{}:{}_{}",
                record.id,
                record.detail_name,
                category.label()
            )));
            unit.extend(output.rows);
            self.keys.append(rows, unit);
        }
        Ok(())
    }
}
