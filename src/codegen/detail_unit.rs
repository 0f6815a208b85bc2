//! # Detail Unit Builder
//!
//! Per-detail build context plus the rung helpers every category shares:
//! the L0 start latch, the L1 latch tail, the L4 completion rung and the
//! manual-operation circuit.
//!
//! Offsets from a detail's `start_num`:
//!
//! | offset | stage |
//! |---|---|
//! | +0 | L0 start latch |
//! | +1 | L1 running |
//! | +2 | L2 secondary (branch feedback, season stop, timer done) |
//! | +3 | start companion bit |
//! | +4 | L4 complete |

use std::collections::HashMap;

use crate::error::{GenerationError, OutputError};
use crate::io_resolver::IoResolver;
use crate::ladder::{LadderCsvRow, SignedKey};
use crate::model::{
    GenerationSnapshot, MnemonicDeviceWithCylinder, MnemonicDeviceWithOperation,
    MnemonicDeviceWithProcessDetail, MnemonicKind, MnemonicTimerDeviceWithDetail,
};
use crate::relations::RelationSource;
use crate::settings::GeneratorSettings;

pub const STAGE_START: i32 = 0;
pub const STAGE_RUN: i32 = 1;
pub const STAGE_SECONDARY: i32 = 2;
pub const STAGE_COMPANION: i32 = 3;
pub const STAGE_COMPLETE: i32 = 4;

/// Offset of an operation's completion bit.
pub const OPERATION_COMPLETE: i32 = 19;

/// Manual-operation bits inside a cylinder's device range.
pub const CYLINDER_MANUAL_START: i32 = 10;
pub const CYLINDER_MANUAL_RESET: i32 = 11;
pub const CYLINDER_MANUAL_OPERATE_BASE: i32 = 12;
pub const CYLINDER_MANUAL_OPERATE_SLOTS: usize = 8;

/// Timer category of the operation-level start delay.
pub const START_DELAY_TIMER_CATEGORY: i32 = 15;

/// Everything shared by all builders of one run.
#[derive(Clone, Copy)]
pub struct GenerationContext<'a> {
    pub snapshot: &'a GenerationSnapshot,
    pub settings: &'a GeneratorSettings,
    pub resolver: &'a dyn IoResolver,
    pub relations: &'a dyn RelationSource,
}

/// Rows and errors produced for one detail.
#[derive(Debug, Default)]
pub struct DetailOutput {
    pub rows: Vec<LadderCsvRow>,
    pub errors: Vec<OutputError>,
}

/// Device the detail's "parent running" term points at: the owning process,
/// or the detail named by `block_number`.
#[derive(Debug, Clone)]
struct ParentDevice {
    label: String,
    start: i32,
}

impl ParentDevice {
    fn address(&self, offset: i32) -> String {
        format!("{}{}", self.label, self.start + offset)
    }
}

/// Position of each detail among the details driving the same cylinder, in
/// generation order. Picks the detail's manual-operate slot.
#[derive(Debug, Default, Clone)]
pub struct ManualSlotIndex {
    slots: HashMap<i32, usize>,
}

impl ManualSlotIndex {
    pub fn from_snapshot(snapshot: &GenerationSnapshot) -> Self {
        let mut next_by_cylinder: HashMap<i32, usize> = HashMap::new();
        let mut slots = HashMap::new();
        for detail in snapshot.details_in_order() {
            let cylinder_id = detail
                .record
                .operation_id
                .and_then(|id| snapshot.operation(id))
                .and_then(|op| op.record.cylinder_id);
            if let Some(cylinder_id) = cylinder_id {
                let next = next_by_cylinder.entry(cylinder_id).or_insert(0);
                slots.insert(detail.record.id, *next);
                *next += 1;
            }
        }
        Self { slots }
    }

    pub fn slot_of(&self, detail_id: i32) -> Option<usize> {
        self.slots.get(&detail_id).copied()
    }
}

#[derive(Debug, Default, Clone)]
struct ManualBits {
    start: Option<String>,
    reset: Option<String>,
    operate: Option<String>,
}

/// Build context for a single process detail.
pub struct DetailUnitBuilder<'a> {
    pub(crate) ctx: GenerationContext<'a>,
    pub(crate) detail: &'a MnemonicDeviceWithProcessDetail,
    pub(crate) operation: Option<&'a MnemonicDeviceWithOperation>,
    cylinder: Option<&'a MnemonicDeviceWithCylinder>,
    parent: ParentDevice,
    manual: ManualBits,
    output: DetailOutput,
}

impl<'a> DetailUnitBuilder<'a> {
    /// Resolve the detail's parent, operation and cylinder.
    ///
    /// A missing parent process or block is corrupted input and fails the run.
    /// A missing operation or cylinder only disables manual wiring. `slot` is
    /// the detail's entry in [`ManualSlotIndex`].
    pub fn new(
        ctx: GenerationContext<'a>,
        detail: &'a MnemonicDeviceWithProcessDetail,
        slot: Option<usize>,
    ) -> Result<Self, GenerationError> {
        let record = &detail.record;
        let snapshot = ctx.snapshot;

        let parent = match record.block_number {
            Some(block_number) => {
                let block = snapshot.detail(block_number).ok_or(GenerationError::BlockNotFound {
                    detail_id: record.id,
                    block_number,
                })?;
                ParentDevice { label: block.device_label.clone(), start: block.start_num }
            }
            None => {
                let process = snapshot.process(record.process_id).ok_or(
                    GenerationError::ProcessNotFound {
                        detail_id: record.id,
                        process_id: record.process_id,
                    },
                )?;
                ParentDevice { label: process.device_label.clone(), start: process.start_num }
            }
        };

        let operation = record.operation_id.and_then(|id| snapshot.operation(id));
        let cylinder = operation
            .and_then(|op| op.record.cylinder_id)
            .and_then(|id| snapshot.cylinder(id));

        let mut builder = Self {
            ctx,
            detail,
            operation,
            cylinder,
            parent,
            manual: ManualBits::default(),
            output: DetailOutput::default(),
        };
        builder.manual = builder.resolve_manual_bits(slot);
        Ok(builder)
    }

    pub fn finish(self) -> DetailOutput {
        self.output
    }

    // ── Emission primitives ──────────────────────────────────────────────────

    pub(crate) fn emit(&mut self, row: LadderCsvRow) {
        self.output.rows.push(row);
    }

    /// Address of this detail's bit at `offset`.
    pub(crate) fn own(&self, offset: i32) -> String {
        self.detail.address(offset)
    }

    pub(crate) fn pause(&self) -> String {
        self.ctx.settings.pause_signal.clone()
    }

    pub(crate) fn always_off(&self) -> String {
        self.ctx.settings.always_off.clone()
    }

    pub(crate) fn debug_test(&self) -> String {
        self.ctx.settings.debug_test.clone()
    }

    pub(crate) fn parent_address(&self, offset: i32) -> String {
        self.parent.address(offset)
    }

    pub(crate) fn report(&mut self, message: impl Into<String>, is_critical: bool) {
        let record = &self.detail.record;
        self.output.errors.push(OutputError {
            message: message.into(),
            record_name: record.detail_name.clone(),
            mnemonic: MnemonicKind::ProcessDetail,
            record_id: record.id,
            is_critical,
        });
    }

    // ── Sensors ──────────────────────────────────────────────────────────────

    /// Resolve a signed sensor key to `(address, negated)`.
    ///
    /// A miss is reported as a non-critical error.
    pub(crate) fn resolve_sensor(&mut self, key: &str) -> Option<(String, bool)> {
        let signed = SignedKey::parse(key);
        let detail = self.detail;
        let record = &detail.record;
        let hint = self.cylinder.map(|c| c.record.cylinder_name.as_str());
        let resolved = self.ctx.resolver.resolve(
            &self.ctx.snapshot.ios,
            signed.name,
            false,
            &record.detail_name,
            record.id,
            hint,
        );
        match resolved {
            Some(address) => Some((address, signed.negated)),
            None => {
                tracing::warn!(
                    "[LDGC] detail {} ({}): IO '{}' not resolved",
                    record.id,
                    record.detail_name,
                    signed.name
                );
                self.report(format!("IO '{}' が見つかりませんでした。", signed.name), false);
                None
            }
        }
    }

    /// Load row for a sensor key; AlwaysOFF when it does not resolve.
    ///
    /// `force_inverted` loads inverted regardless of the key's prefix.
    pub(crate) fn sensor_load(&mut self, key: &str, force_inverted: bool) -> LadderCsvRow {
        match self.resolve_sensor(key) {
            Some((address, negated)) => LadderCsvRow::load(address, negated || force_inverted),
            None => LadderCsvRow::ld(self.always_off()),
        }
    }

    /// Load row for a required sensor; reports and loads AlwaysOFF when unset.
    pub(crate) fn required_sensor_load(&mut self, key: Option<&str>, field: &str) -> LadderCsvRow {
        match key {
            Some(key) => self.sensor_load(key, false),
            None => {
                self.report(format!("{field} が設定されていません。"), false);
                LadderCsvRow::ld(self.always_off())
            }
        }
    }

    /// `OR`/`ORI` of the skip bit, if one is set.
    pub(crate) fn skip_or(&self) -> Option<LadderCsvRow> {
        self.detail.record.skip_mode_key().map(|key| {
            let signed = SignedKey::parse(key);
            LadderCsvRow::or_polar(signed.name, signed.negated)
        })
    }

    pub(crate) fn emit_skip_or(&mut self) {
        if let Some(row) = self.skip_or() {
            self.emit(row);
        }
    }

    // ── Relationship lookups ─────────────────────────────────────────────────

    fn detail_device(
        &self,
        id: i32,
        context: &str,
    ) -> Result<&'a MnemonicDeviceWithProcessDetail, GenerationError> {
        self.ctx
            .snapshot
            .detail(id)
            .ok_or_else(|| GenerationError::DetailDeviceNotFound {
                referenced_id: id,
                context: format!("{} of detail {}", context, self.detail.record.id),
            })
    }

    /// Devices of the details this one waits on, in edge order.
    pub(crate) fn start_devices(
        &self,
    ) -> Result<Vec<&'a MnemonicDeviceWithProcessDetail>, GenerationError> {
        self.ctx
            .relations
            .connections_by_to_id(self.detail.record.id)
            .iter()
            .map(|c| self.detail_device(c.from_process_detail_id, "start connection"))
            .collect()
    }

    /// Devices named by this detail's finish edges, in edge order.
    pub(crate) fn finish_devices(
        &self,
    ) -> Result<Vec<&'a MnemonicDeviceWithProcessDetail>, GenerationError> {
        self.ctx
            .relations
            .finishes_by_detail_id(self.detail.record.id)
            .iter()
            .map(|f| self.detail_device(f.finish_process_detail_id, "finish edge"))
            .collect()
    }

    /// Timers bound to this detail, in input order.
    pub(crate) fn detail_timers(&self) -> Vec<&'a MnemonicTimerDeviceWithDetail> {
        let snapshot = self.ctx.snapshot;
        snapshot
            .timers
            .iter()
            .filter(|t| {
                t.device.mnemonic_kind == MnemonicKind::ProcessDetail
                    && t.device.record_id == self.detail.record.id
                    && t.device.cycle_id.map_or(true, |c| c == snapshot.cycle_id)
            })
            .collect()
    }

    /// Start-delay timer bound to this detail's operation.
    pub(crate) fn operation_start_timer(&self) -> Option<&'a MnemonicTimerDeviceWithDetail> {
        let snapshot = self.ctx.snapshot;
        let operation_id = self.detail.record.operation_id?;
        snapshot.timers.iter().find(|t| {
            t.device.cycle_id.map_or(true, |c| c == snapshot.cycle_id)
                && t.device.mnemonic_kind == MnemonicKind::Operation
                && t.device.record_id == operation_id
                && t.timer.timer_category_id == START_DELAY_TIMER_CATEGORY
        })
    }

    // ── Manual operation ─────────────────────────────────────────────────────

    fn resolve_manual_bits(&self, slot: Option<usize>) -> ManualBits {
        let Some(cylinder) = self.cylinder else {
            return ManualBits::default();
        };

        let operate = match slot {
            Some(i) if i < CYLINDER_MANUAL_OPERATE_SLOTS => {
                Some(cylinder.address(CYLINDER_MANUAL_OPERATE_BASE + i as i32))
            }
            Some(i) => {
                tracing::warn!(
                    "[LDGC] detail {}: cylinder {} has no manual slot left (index {})",
                    self.detail.record.id,
                    cylinder.record.cylinder_name,
                    i
                );
                None
            }
            None => None,
        };

        ManualBits {
            start: Some(cylinder.address(CYLINDER_MANUAL_START)),
            reset: Some(cylinder.address(CYLINDER_MANUAL_RESET)),
            operate,
        }
    }

    /// Manual-reset bit of this detail's cylinder, if resolvable.
    pub fn manual_reset_device(&self) -> Option<&str> {
        self.manual.reset.as_deref()
    }

    /// Manual-operate bit of this detail, if resolvable.
    pub fn manual_operate_device(&self) -> Option<&str> {
        self.manual.operate.as_deref()
    }

    /// Control-box circuit: leaving manual mode clears the manual start and
    /// pulses manual reset; a manual button press sets manual operate.
    fn emit_manual_circuit(&mut self) {
        let (Some(cylinder), Some(start), Some(reset), Some(operate)) = (
            self.cylinder,
            self.manual.start.clone(),
            self.manual.reset.clone(),
            self.manual.operate.clone(),
        ) else {
            return;
        };

        let boxes = self
            .ctx
            .relations
            .control_boxes_by_cylinder(cylinder.record.id, self.ctx.snapshot.plc_id);
        if boxes.is_empty() {
            return;
        }

        for (i, control_box) in boxes.iter().enumerate() {
            let mode = control_box.manual_mode.clone();
            self.emit(if i == 0 { LadderCsvRow::ldi(mode) } else { LadderCsvRow::ori(mode) });
        }
        self.emit(LadderCsvRow::rst(start.clone()));
        self.emit(LadderCsvRow::pls(reset));

        for (i, control_box) in boxes.iter().enumerate() {
            let button = control_box.manual_button.clone();
            self.emit(if i == 0 { LadderCsvRow::ld(button) } else { LadderCsvRow::or(button) });
        }
        self.emit(LadderCsvRow::and(start));
        self.emit(LadderCsvRow::set(operate));
    }

    /// `LDP self+4, ORP manualReset, RST manualOperate`, only when both bits
    /// resolve.
    pub(crate) fn emit_manual_reset(&mut self) {
        let (Some(reset), Some(operate)) = (self.manual.reset.clone(), self.manual.operate.clone())
        else {
            return;
        };
        self.emit(LadderCsvRow::ldp(self.own(STAGE_COMPLETE)));
        self.emit(LadderCsvRow::orp(reset));
        self.emit(LadderCsvRow::rst(operate));
    }

    // ── Shared rungs ─────────────────────────────────────────────────────────

    fn emit_start_condition(&mut self, timer: Option<&MnemonicTimerDeviceWithDetail>) {
        if let Some(timer) = timer {
            self.emit(LadderCsvRow::ld(timer.device.timer_device.clone()));
            return;
        }

        let detail = self.detail;
        match detail.record.start_sensor_key() {
            Some(sensor) => {
                let load = self.sensor_load(sensor, false);
                self.emit(load);
                self.emit(LadderCsvRow::or(self.own(STAGE_COMPANION)));
                self.emit_skip_or();
                self.emit(LadderCsvRow::and(self.pause()));
            }
            None => self.emit(LadderCsvRow::ld(self.pause())),
        }
    }

    /// Offset read on each predecessor of an incoming connection.
    fn predecessor_offset(&self) -> i32 {
        let record = &self.detail.record;
        if record.start_sensor_key().is_some() && record.block_number.is_none() {
            STAGE_RUN
        } else {
            STAGE_COMPLETE
        }
    }

    /// L0 start latch.
    ///
    /// `(start condition OR self) ANB (parent running OR manual operate)`,
    /// then the OR-group of predecessors, then `OUT self+0`.
    pub(crate) fn emit_start_latch(
        &mut self,
        timer: Option<&MnemonicTimerDeviceWithDetail>,
    ) -> Result<(), GenerationError> {
        self.emit_manual_circuit();
        self.emit_start_condition(timer);
        self.emit(LadderCsvRow::or(self.own(STAGE_START)));

        let parent_term = if self.detail.record.is_reset_after {
            self.ctx.settings.always_on.clone()
        } else {
            self.parent_address(STAGE_RUN)
        };
        self.emit(LadderCsvRow::ld(parent_term));
        if let Some(operate) = self.manual.operate.clone() {
            self.emit(LadderCsvRow::or(operate));
        }
        self.emit(LadderCsvRow::anb());

        let offset = self.predecessor_offset();
        let predecessors = self.start_devices()?;
        for (i, predecessor) in predecessors.iter().enumerate() {
            let address = predecessor.address(offset);
            self.emit(if i == 0 { LadderCsvRow::ld(address) } else { LadderCsvRow::or(address) });
        }
        if !predecessors.is_empty() {
            self.emit(LadderCsvRow::anb());
        }

        self.emit(LadderCsvRow::out(self.own(STAGE_START)));
        Ok(())
    }

    /// L1 latch tail: `OR self+1, AND self+0, OUT self+1`.
    pub(crate) fn emit_run_latch(&mut self) {
        self.emit(LadderCsvRow::or(self.own(STAGE_RUN)));
        self.emit(LadderCsvRow::and(self.own(STAGE_START)));
        self.emit(LadderCsvRow::out(self.own(STAGE_RUN)));
    }

    /// L4 completion: `LD Pause [AND finish] OR self+4 AND self+1 OUT self+4`.
    pub(crate) fn emit_complete(&mut self, finish: Option<String>) {
        self.emit(LadderCsvRow::ld(self.pause()));
        if let Some(finish) = finish {
            self.emit(LadderCsvRow::and(finish));
        }
        self.emit(LadderCsvRow::or(self.own(STAGE_COMPLETE)));
        self.emit(LadderCsvRow::and(self.own(STAGE_RUN)));
        self.emit(LadderCsvRow::out(self.own(STAGE_COMPLETE)));
    }

    /// `LDP self+0` followed by `RST` of every timer.
    pub(crate) fn emit_timer_reset(&mut self, timers: &[&MnemonicTimerDeviceWithDetail]) {
        self.emit(LadderCsvRow::ldp(self.own(STAGE_START)));
        for timer in timers {
            self.emit(LadderCsvRow::rst(timer.device.timer_device.clone()));
        }
    }
}
