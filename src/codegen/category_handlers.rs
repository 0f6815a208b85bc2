//! # Category Handlers
//!
//! One build function per process-detail category. Each appends rows to the
//! detail's [`DetailUnitBuilder`]; structural failures are reported as
//! critical errors and stop that detail only.

use crate::error::GenerationError;
use crate::ladder::LadderCsvRow;

use super::detail_unit::{
    DetailUnitBuilder, OPERATION_COMPLETE, STAGE_COMPLETE, STAGE_RUN, STAGE_SECONDARY,
    STAGE_START,
};

/// Behavioural archetype of a process detail, keyed by `category_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Normal = 1,
    Summarize = 2,
    SensorOn = 3,
    SensorOff = 4,
    Branch = 5,
    Merge = 6,
    ServoCoordinate = 7,
    InverterCoordinate = 8,
    InverterSpeed = 9,
    IlWait = 10,
    ResetStart = 11,
    ResetFinish = 12,
    ProcessOff = 13,
    Season = 15,
    TimerProcess = 16,
    Timer = 17,
    Module = 18,
}

impl Category {
    pub fn from_id(id: i32) -> Option<Self> {
        Some(match id {
            1 => Self::Normal,
            2 => Self::Summarize,
            3 => Self::SensorOn,
            4 => Self::SensorOff,
            5 => Self::Branch,
            6 => Self::Merge,
            7 => Self::ServoCoordinate,
            8 => Self::InverterCoordinate,
            9 => Self::InverterSpeed,
            10 => Self::IlWait,
            11 => Self::ResetStart,
            12 => Self::ResetFinish,
            13 => Self::ProcessOff,
            15 => Self::Season,
            16 => Self::TimerProcess,
            17 => Self::Timer,
            18 => Self::Module,
            _ => return None,
        })
    }

    /// Suffix of the statement row written ahead of the detail's rungs.
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Summarize => "Summarize",
            Self::SensorOn => "SensorON",
            Self::SensorOff => "SensorOFF",
            Self::Branch => "Branch",
            Self::Merge => "Merge",
            Self::ServoCoordinate => "ServoCoordinate",
            Self::InverterCoordinate => "InverterCoordinate",
            Self::InverterSpeed => "InverterSpeed",
            Self::IlWait => "ILWait",
            Self::ResetStart => "ResetStart",
            Self::ResetFinish => "ResetFinish",
            Self::ProcessOff => "ProcessOFF",
            Self::Season => "Season",
            Self::TimerProcess => "TimerProcess",
            Self::Timer => "Timer",
            Self::Module => "Module",
        }
    }

    /// Categories with emission rules. The rest produce no rows.
    pub fn is_implemented(self) -> bool {
        !matches!(
            self,
            Self::ServoCoordinate
                | Self::InverterCoordinate
                | Self::InverterSpeed
                | Self::ResetStart
                | Self::ResetFinish
        )
    }
}

impl<'a> DetailUnitBuilder<'a> {
    /// Emit the rungs of `category`.
    pub fn build(&mut self, category: Category) -> Result<(), GenerationError> {
        match category {
            Category::Normal => self.build_normal(),
            Category::Summarize => self.build_summarize(),
            Category::SensorOn => self.build_sensor(false),
            Category::SensorOff => self.build_sensor(true),
            Category::Branch => self.build_branch(),
            Category::Merge => self.build_merge(),
            Category::IlWait => self.build_il_wait(),
            Category::ProcessOff => self.build_process_off(),
            Category::Season => self.build_season(),
            Category::TimerProcess => self.build_timer_process(),
            Category::Timer => self.build_timer(),
            Category::Module => self.build_module(),
            // TODO: reset start/finish (11/12) stay unwired until product confirms the rung shape.
            Category::ServoCoordinate
            | Category::InverterCoordinate
            | Category::InverterSpeed
            | Category::ResetStart
            | Category::ResetFinish => {
                tracing::debug!(
                    "[LDGC] detail {}: category {:?} has no emission rules",
                    self.detail.record.id,
                    category
                );
                Ok(())
            }
        }
    }

    /// L1 waits for the operation's completion bit.
    fn build_normal(&mut self) -> Result<(), GenerationError> {
        self.emit_start_latch(None)?;

        let operation = self.operation;
        match operation {
            Some(operation) => self.emit(LadderCsvRow::ld(operation.address(OPERATION_COMPLETE))),
            None => {
                self.report("Operation が設定されていません。", false);
                self.emit(LadderCsvRow::ld(self.always_off()));
            }
        }
        self.emit_skip_or();
        self.emit(LadderCsvRow::and(self.pause()));
        self.emit_run_latch();

        self.emit_complete(None);
        self.emit_manual_reset();
        Ok(())
    }

    /// Pure grouping step: runs as soon as it starts. No manual reset.
    fn build_summarize(&mut self) -> Result<(), GenerationError> {
        self.emit_start_latch(None)?;

        self.emit(LadderCsvRow::ld(self.pause()));
        self.emit_run_latch();

        self.emit_complete(None);
        Ok(())
    }

    /// L1 waits for the finish sensor. `always_inverted` reads it with `LDI`
    /// whatever its prefix.
    fn build_sensor(&mut self, always_inverted: bool) -> Result<(), GenerationError> {
        self.emit_start_latch(None)?;

        let detail = self.detail;
        match detail.record.finish_sensor_key() {
            Some(sensor) => {
                let load = self.sensor_load(sensor, always_inverted);
                self.emit(load);
                self.emit(LadderCsvRow::or(self.debug_test()));
                self.emit_skip_or();
                self.emit(LadderCsvRow::and(self.pause()));
            }
            None => self.emit(LadderCsvRow::ld(self.pause())),
        }
        self.emit_run_latch();

        self.emit_complete(None);
        self.emit_manual_reset();
        Ok(())
    }

    /// L1 holds while the finish sensor is on and the branch's +2 feedback
    /// bit is off.
    fn build_branch(&mut self) -> Result<(), GenerationError> {
        self.emit_start_latch(None)?;

        let detail = self.detail;
        let load = self.required_sensor_load(detail.record.finish_sensor_key(), "FinishSensor");
        self.emit(load);
        self.emit(LadderCsvRow::ani(self.own(STAGE_SECONDARY)));
        self.emit(LadderCsvRow::and(self.pause()));
        self.emit_run_latch();

        self.emit_complete(None);
        self.emit_manual_reset();
        Ok(())
    }

    /// Joins several predecessors. Written out inline: no manual circuit and
    /// no run stage.
    fn build_merge(&mut self) -> Result<(), GenerationError> {
        self.emit(LadderCsvRow::ld(self.pause()));
        self.emit(LadderCsvRow::or(self.own(STAGE_START)));
        self.emit(LadderCsvRow::and(self.parent_address(STAGE_START)));

        let predecessors = self.start_devices()?;
        for (i, predecessor) in predecessors.iter().enumerate() {
            let address = predecessor.address(STAGE_COMPLETE);
            self.emit(if i == 0 { LadderCsvRow::ld(address) } else { LadderCsvRow::or(address) });
        }
        if !predecessors.is_empty() {
            self.emit(LadderCsvRow::anb());
        }
        self.emit(LadderCsvRow::out(self.own(STAGE_START)));

        self.emit(LadderCsvRow::ld(self.pause()));
        self.emit(LadderCsvRow::or(self.own(STAGE_COMPLETE)));
        self.emit(LadderCsvRow::and(self.own(STAGE_START)));
        self.emit(LadderCsvRow::out(self.own(STAGE_COMPLETE)));

        self.emit_manual_reset();
        Ok(())
    }

    /// Interlock wait: drives `il_start` while started but not yet running.
    fn build_il_wait(&mut self) -> Result<(), GenerationError> {
        self.emit_start_latch(None)?;

        let detail = self.detail;
        let load = self.required_sensor_load(detail.record.finish_sensor_key(), "FinishSensor");
        self.emit(load);
        self.emit(LadderCsvRow::or(self.debug_test()));
        self.emit_skip_or();
        self.emit_run_latch();

        if let Some(il_start) = detail.record.il_start_key() {
            self.emit(LadderCsvRow::ld(self.own(STAGE_START)));
            self.emit(LadderCsvRow::ani(self.own(STAGE_RUN)));
            self.emit(LadderCsvRow::out(il_start));
        }

        self.emit_complete(None);
        self.emit_manual_reset();
        Ok(())
    }

    /// Runs once the single finish target has started.
    fn build_process_off(&mut self) -> Result<(), GenerationError> {
        let finishes = self.finish_devices()?;
        if finishes.len() != 1 {
            self.report(
                format!("ProcessOFF の終了条件は 1 件である必要があります。({} 件)", finishes.len()),
                true,
            );
            return Ok(());
        }
        let target = finishes[0];

        self.emit_start_latch(None)?;

        self.emit(LadderCsvRow::ld(target.address(STAGE_START)));
        self.emit_skip_or();
        self.emit(LadderCsvRow::and(self.pause()));
        self.emit_run_latch();

        self.emit(LadderCsvRow::ld(self.own(STAGE_RUN)));
        self.emit(LadderCsvRow::and(self.pause()));
        self.emit(LadderCsvRow::out(self.own(STAGE_COMPLETE)));

        self.emit_manual_reset();
        Ok(())
    }

    /// Period: runs until the finish sensor and all finish targets agree,
    /// latching the stop stage at +2.
    fn build_season(&mut self) -> Result<(), GenerationError> {
        let finishes = self.finish_devices()?;

        self.emit_start_latch(None)?;

        self.emit(LadderCsvRow::ld(self.pause()));
        self.emit_run_latch();

        let detail = self.detail;
        match detail.record.finish_sensor_key() {
            Some(sensor) => {
                let load = self.sensor_load(sensor, false);
                self.emit(load);
                for finish in &finishes {
                    self.emit(LadderCsvRow::and(finish.address(STAGE_RUN)));
                }
            }
            None if !finishes.is_empty() => {
                self.emit(LadderCsvRow::ld(self.pause()));
                for finish in &finishes {
                    self.emit(LadderCsvRow::and(finish.address(STAGE_COMPLETE)));
                }
            }
            None => self.emit(LadderCsvRow::ld(self.always_off())),
        }
        self.emit_skip_or();
        self.emit(LadderCsvRow::or(self.own(STAGE_SECONDARY)));
        self.emit(LadderCsvRow::and(self.own(STAGE_RUN)));
        self.emit(LadderCsvRow::out(self.own(STAGE_SECONDARY)));

        self.emit(LadderCsvRow::ld(self.pause()));
        self.emit(LadderCsvRow::or(self.own(STAGE_COMPLETE)));
        self.emit(LadderCsvRow::and(self.own(STAGE_SECONDARY)));
        self.emit(LadderCsvRow::out(self.own(STAGE_COMPLETE)));

        self.emit_manual_reset();
        Ok(())
    }

    /// Timed step: the detail's timers run while +1 is on and latch +2 when
    /// they expire; completion waits for +2.
    fn build_timer_process(&mut self) -> Result<(), GenerationError> {
        let timers = self.detail_timers();
        if timers.is_empty() {
            self.report("タイマーが設定されていません。", true);
            return Ok(());
        }

        let start_timer = self.operation_start_timer();
        self.emit_start_latch(start_timer)?;
        self.emit_timer_reset(&timers);

        self.emit(LadderCsvRow::ld(self.pause()));
        self.emit_run_latch();

        self.emit(LadderCsvRow::ld(self.own(STAGE_RUN)));
        self.emit(LadderCsvRow::ani(self.own(STAGE_SECONDARY)));
        for timer in &timers {
            self.emit(LadderCsvRow::timer(
                timer.device.timer_device.clone(),
                timer.device.data_register.clone(),
            ));
        }

        for (i, timer) in timers.iter().enumerate() {
            let contact = timer.device.timer_device.clone();
            self.emit(if i == 0 { LadderCsvRow::ld(contact) } else { LadderCsvRow::or(contact) });
        }
        self.emit(LadderCsvRow::or(self.own(STAGE_SECONDARY)));
        self.emit(LadderCsvRow::and(self.own(STAGE_RUN)));
        self.emit(LadderCsvRow::out(self.own(STAGE_SECONDARY)));

        self.emit_complete(Some(self.own(STAGE_SECONDARY)));
        self.emit_manual_reset();
        Ok(())
    }

    /// Plain timer: completion follows the timer contact directly.
    fn build_timer(&mut self) -> Result<(), GenerationError> {
        let timers = self.detail_timers();
        if timers.is_empty() {
            self.report("タイマーが設定されていません。", true);
            return Ok(());
        }

        self.emit_start_latch(None)?;
        self.emit_timer_reset(&timers);

        self.emit(LadderCsvRow::ld(self.pause()));
        self.emit_run_latch();

        self.emit(LadderCsvRow::ld(self.own(STAGE_RUN)));
        self.emit(LadderCsvRow::ani(self.own(STAGE_COMPLETE)));
        for timer in &timers {
            self.emit(LadderCsvRow::timer(
                timer.device.timer_device.clone(),
                timer.device.data_register.clone(),
            ));
        }

        for (i, timer) in timers.iter().enumerate() {
            let contact = timer.device.timer_device.clone();
            self.emit(if i == 0 { LadderCsvRow::ld(contact) } else { LadderCsvRow::or(contact) });
        }
        self.emit(LadderCsvRow::and(self.pause()));
        self.emit(LadderCsvRow::or(self.own(STAGE_COMPLETE)));
        self.emit(LadderCsvRow::and(self.own(STAGE_RUN)));
        self.emit(LadderCsvRow::out(self.own(STAGE_COMPLETE)));

        self.emit_manual_reset();
        Ok(())
    }

    /// Sub-sequence call: runs for as long as it is started and completes
    /// when the single finish target completes.
    fn build_module(&mut self) -> Result<(), GenerationError> {
        self.emit_start_latch(None)?;

        self.emit(LadderCsvRow::ld(self.own(STAGE_START)));
        self.emit(LadderCsvRow::out(self.own(STAGE_RUN)));

        let finishes = self.finish_devices()?;
        if finishes.len() != 1 {
            self.report(
                format!("Module の終了条件は 1 件である必要があります。({} 件)", finishes.len()),
                true,
            );
            return Ok(());
        }
        let target = finishes[0];

        self.emit(LadderCsvRow::ld(target.address(STAGE_COMPLETE)));
        self.emit(LadderCsvRow::and(self.pause()));
        self.emit(LadderCsvRow::or(self.own(STAGE_COMPLETE)));
        self.emit(LadderCsvRow::and(self.own(STAGE_START)));
        self.emit(LadderCsvRow::out(self.own(STAGE_COMPLETE)));

        self.emit_manual_reset();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_from_id() {
        for id in 1..=18 {
            match Category::from_id(id) {
                Some(category) => assert_eq!(category as i32, id),
                None => assert_eq!(id, 14),
            }
        }
        assert_eq!(Category::from_id(0), None);
        assert_eq!(Category::from_id(19), None);
    }

    #[test]
    fn servo_inverter_and_reset_categories_are_not_implemented() {
        let unimplemented: Vec<i32> = (1..=18)
            .filter_map(Category::from_id)
            .filter(|c| !c.is_implemented())
            .map(|c| c as i32)
            .collect();
        assert_eq!(unimplemented, vec![7, 8, 9, 11, 12]);
    }

    #[test]
    fn labels_match_statement_suffixes() {
        assert_eq!(Category::SensorOff.label(), "SensorOFF");
        assert_eq!(Category::IlWait.label(), "ILWait");
        assert_eq!(Category::ProcessOff.label(), "ProcessOFF");
    }
}
