//! # Process Unit Builder
//!
//! Aggregate rungs of a process: its start latch (+0), running bit (+1)
//! and completion latch (+4). Details read the running bit as their parent
//! term, so these rungs close the loop for the whole cycle.

use crate::error::GenerationError;
use crate::ladder::LadderCsvRow;
use crate::model::{MnemonicDeviceWithProcess, MnemonicDeviceWithProcessDetail};

use super::detail_unit::{GenerationContext, STAGE_COMPLETE, STAGE_RUN, STAGE_START};

pub struct ProcessUnitBuilder<'a> {
    ctx: GenerationContext<'a>,
    process: &'a MnemonicDeviceWithProcess,
    rows: Vec<LadderCsvRow>,
}

impl<'a> ProcessUnitBuilder<'a> {
    pub fn new(ctx: GenerationContext<'a>, process: &'a MnemonicDeviceWithProcess) -> Self {
        Self { ctx, process, rows: Vec::new() }
    }

    fn condition_device(
        &self,
        detail_id: i32,
        context: &str,
    ) -> Result<&'a MnemonicDeviceWithProcessDetail, GenerationError> {
        self.ctx
            .snapshot
            .detail(detail_id)
            .ok_or_else(|| GenerationError::DetailDeviceNotFound {
                referenced_id: detail_id,
                context: format!("{} of process {}", context, self.process.record.id),
            })
    }

    pub fn build(mut self) -> Result<Vec<LadderCsvRow>, GenerationError> {
        let settings = self.ctx.settings;
        let process = self.process;
        let id = process.record.id;

        let starts = self
            .ctx
            .relations
            .start_conditions_by_process(id)
            .iter()
            .map(|c| self.condition_device(c.start_process_detail_id, "start condition"))
            .collect::<Result<Vec<_>, _>>()?;
        let finishes = self
            .ctx
            .relations
            .finish_conditions_by_process(id)
            .iter()
            .map(|c| self.condition_device(c.finish_process_detail_id, "finish condition"))
            .collect::<Result<Vec<_>, _>>()?;

        if starts.is_empty() {
            self.rows.push(LadderCsvRow::ld(&settings.pause_signal));
        }
        for (i, start) in starts.iter().enumerate() {
            let address = start.address(STAGE_COMPLETE);
            self.rows.push(if i == 0 { LadderCsvRow::ld(address) } else { LadderCsvRow::or(address) });
        }
        self.rows.push(LadderCsvRow::or(process.address(STAGE_START)));
        self.rows.push(LadderCsvRow::ani(&settings.soft_reset_signal));
        self.rows.push(LadderCsvRow::out(process.address(STAGE_START)));

        self.rows.push(LadderCsvRow::ld(process.address(STAGE_START)));
        self.rows.push(LadderCsvRow::and(&settings.pause_signal));
        self.rows.push(LadderCsvRow::out(process.address(STAGE_RUN)));

        if finishes.is_empty() {
            self.rows.push(LadderCsvRow::ld(&settings.always_off));
        }
        for (i, finish) in finishes.iter().enumerate() {
            let address = finish.address(STAGE_COMPLETE);
            self.rows.push(if i == 0 { LadderCsvRow::ld(address) } else { LadderCsvRow::and(address) });
        }
        self.rows.push(LadderCsvRow::or(process.address(STAGE_COMPLETE)));
        self.rows.push(LadderCsvRow::and(process.address(STAGE_RUN)));
        self.rows.push(LadderCsvRow::out(process.address(STAGE_COMPLETE)));

        Ok(self.rows)
    }
}
