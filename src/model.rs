//! # Mnemonic Device Model
//!
//! Read-only snapshots of the records the generator consumes. Every record
//! that owns ladder memory is paired with its device assignment through
//! [`MnemonicDevice`]; the generator only reads these assignments.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::error::GenerationError;

/// Which kind of record a device, timer binding or error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum MnemonicKind {
    Process = 1,
    ProcessDetail = 2,
    Operation = 3,
    Cylinder = 4,
}

impl TryFrom<i32> for MnemonicKind {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Process),
            2 => Ok(Self::ProcessDetail),
            3 => Ok(Self::Operation),
            4 => Ok(Self::Cylinder),
            other => Err(format!("unknown mnemonic kind {other}")),
        }
    }
}

impl From<MnemonicKind> for i32 {
    fn from(kind: MnemonicKind) -> Self {
        kind as i32
    }
}

/// A domain record bound to its bit-memory range.
///
/// `start_num + 0`, `+1`, `+2`, ... carry fixed meanings per record kind
/// (for process details: start / run / stop / spare / complete).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MnemonicDevice<T> {
    pub record: T,
    pub record_id: i32,
    pub device_label: String,
    pub start_num: i32,
}

impl<T> MnemonicDevice<T> {
    pub fn new(record: T, record_id: i32, device_label: impl Into<String>, start_num: i32) -> Self {
        Self {
            record,
            record_id,
            device_label: device_label.into(),
            start_num,
        }
    }

    /// Operand text for the bit at `start_num + offset`, e.g. `L104`.
    pub fn address(&self, offset: i32) -> String {
        format!("{}{}", self.device_label, self.start_num + offset)
    }
}

pub type MnemonicDeviceWithProcess = MnemonicDevice<Process>;
pub type MnemonicDeviceWithProcessDetail = MnemonicDevice<ProcessDetail>;
pub type MnemonicDeviceWithOperation = MnemonicDevice<Operation>;
pub type MnemonicDeviceWithCylinder = MnemonicDevice<Cylinder>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Process {
    pub id: i32,
    pub process_name: String,
    pub cycle_id: Option<i32>,
    pub sort_number: Option<i32>,
}

/// The atomic unit of ladder generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessDetail {
    pub id: i32,
    pub process_id: i32,
    pub operation_id: Option<i32>,
    pub category_id: Option<i32>,
    pub detail_name: String,
    /// Sensor key; a leading `_` negates it.
    pub start_sensor: Option<String>,
    /// Sensor key; a leading `_` negates it.
    pub finish_sensor: Option<String>,
    /// Skip bit; a leading `_` negates it.
    pub skip_mode: Option<String>,
    /// Detail acting as the virtual parent block.
    pub block_number: Option<i32>,
    pub sort_number: Option<i32>,
    pub start_timer_id: Option<i32>,
    /// Interlock output bit driven while the detail waits.
    pub il_start: Option<String>,
    pub is_reset_after: bool,
}

impl ProcessDetail {
    pub fn start_sensor_key(&self) -> Option<&str> {
        present(&self.start_sensor)
    }

    pub fn finish_sensor_key(&self) -> Option<&str> {
        present(&self.finish_sensor)
    }

    pub fn skip_mode_key(&self) -> Option<&str> {
        present(&self.skip_mode)
    }

    pub fn il_start_key(&self) -> Option<&str> {
        present(&self.il_start)
    }
}

/// Exported key fields use `""` (and a bare `_`) for "not set".
fn present(field: &Option<String>) -> Option<&str> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.trim_start_matches('_').trim().is_empty())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Operation {
    pub id: i32,
    pub operation_name: String,
    pub cylinder_id: Option<i32>,
    pub cycle_id: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cylinder {
    pub id: i32,
    pub cylinder_name: String,
    pub plc_id: i32,
}

/// One row of the PLC's IO address table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Io {
    pub id: i32,
    pub address: String,
    pub io_name: String,
    pub plc_id: i32,
}

/// "From must be complete before To may start."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessDetailConnection {
    pub from_process_detail_id: i32,
    pub to_process_detail_id: i32,
    pub cycle_id: Option<i32>,
}

/// "This detail's completion also depends on the finish target."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessDetailFinish {
    pub process_detail_id: i32,
    pub finish_process_detail_id: i32,
    pub cycle_id: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessStartCondition {
    pub process_id: i32,
    pub start_process_detail_id: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessFinishCondition {
    pub process_id: i32,
    pub finish_process_detail_id: i32,
}

/// A manual-operation panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlBox {
    pub id: i32,
    pub plc_id: i32,
    pub box_name: String,
    pub manual_mode: String,
    pub manual_button: String,
}

/// Assignment of a control box to a cylinder, ordered by `sort_order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CylinderControlBox {
    pub cylinder_id: i32,
    pub control_box_id: i32,
    pub plc_id: i32,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timer {
    pub id: i32,
    pub cycle_id: Option<i32>,
    pub timer_name: String,
    pub timer_category_id: i32,
    pub timer_count: i32,
}

/// Device assignment of a timer to one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MnemonicTimerDevice {
    pub mnemonic_kind: MnemonicKind,
    pub record_id: i32,
    pub timer_id: i32,
    /// Timer contact/coil, e.g. `T12`.
    pub timer_device: String,
    /// Data register holding the preset, e.g. `D120`.
    pub data_register: String,
    pub cycle_id: Option<i32>,
}

/// A timer together with the device that binds it to a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MnemonicTimerDeviceWithDetail {
    pub timer: Timer,
    pub device: MnemonicTimerDevice,
}

/// Everything one generation run reads, pre-loaded for a single cycle/PLC.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSnapshot {
    pub plc_id: i32,
    pub cycle_id: i32,
    pub processes: Vec<MnemonicDeviceWithProcess>,
    pub details: Vec<MnemonicDeviceWithProcessDetail>,
    pub operations: Vec<MnemonicDeviceWithOperation>,
    pub cylinders: Vec<MnemonicDeviceWithCylinder>,
    pub ios: Vec<Io>,
    pub timers: Vec<MnemonicTimerDeviceWithDetail>,
    pub connections: Vec<ProcessDetailConnection>,
    pub finishes: Vec<ProcessDetailFinish>,
    pub start_conditions: Vec<ProcessStartCondition>,
    pub finish_conditions: Vec<ProcessFinishCondition>,
    pub control_boxes: Vec<ControlBox>,
    pub cylinder_control_boxes: Vec<CylinderControlBox>,
}

impl GenerationSnapshot {
    pub fn from_json(json: &str) -> Result<Self, GenerationError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn process(&self, id: i32) -> Option<&MnemonicDeviceWithProcess> {
        self.processes.iter().find(|p| p.record.id == id)
    }

    pub fn detail(&self, id: i32) -> Option<&MnemonicDeviceWithProcessDetail> {
        self.details.iter().find(|d| d.record.id == id)
    }

    pub fn operation(&self, id: i32) -> Option<&MnemonicDeviceWithOperation> {
        self.operations.iter().find(|o| o.record.id == id)
    }

    pub fn cylinder(&self, id: i32) -> Option<&MnemonicDeviceWithCylinder> {
        self.cylinders.iter().find(|c| c.record.id == id)
    }

    /// Details in generation order: `(sort_number ?? +inf, id)`.
    pub fn details_in_order(&self) -> Vec<&MnemonicDeviceWithProcessDetail> {
        let mut details: Vec<_> = self.details.iter().collect();
        details.sort_by(|a, b| {
            sort_key_cmp(
                (a.record.sort_number, a.record.id),
                (b.record.sort_number, b.record.id),
            )
        });
        details
    }

    /// Processes in generation order: `(sort_number ?? +inf, id)`.
    pub fn processes_in_order(&self) -> Vec<&MnemonicDeviceWithProcess> {
        let mut processes: Vec<_> = self.processes.iter().collect();
        processes.sort_by(|a, b| {
            sort_key_cmp(
                (a.record.sort_number, a.record.id),
                (b.record.sort_number, b.record.id),
            )
        });
        processes
    }
}

/// Orders by sort number with `None` last, ties broken by id.
pub fn sort_key_cmp(a: (Option<i32>, i32), b: (Option<i32>, i32)) -> Ordering {
    let rank = |s: Option<i32>| match s {
        Some(n) => (0, n),
        None => (1, 0),
    };
    rank(a.0).cmp(&rank(b.0)).then(a.1.cmp(&b.1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_adds_offset_to_start() {
        let device = MnemonicDevice::new(ProcessDetail::default(), 7, "L", 100);
        assert_eq!(device.address(0), "L100");
        assert_eq!(device.address(4), "L104");
    }

    #[test]
    fn null_sort_numbers_sort_last() {
        let mut keys = vec![(None, 1), (Some(5), 9), (Some(5), 2), (None, 0), (Some(-1), 3)];
        keys.sort_by(|a, b| sort_key_cmp(*a, *b));
        assert_eq!(keys, vec![(Some(-1), 3), (Some(5), 2), (Some(5), 9), (None, 0), (None, 1)]);
    }

    #[test]
    fn snapshot_loads_from_json() {
        let json = r#"{
            "plc_id": 1,
            "cycle_id": 2,
            "details": [{
                "record": { "id": 5, "process_id": 1, "category_id": 1, "detail_name": "clamp" },
                "record_id": 5,
                "device_label": "L",
                "start_num": 100
            }],
            "timers": [{
                "timer": { "id": 3, "timer_category_id": 15 },
                "device": {
                    "mnemonic_kind": 3, "record_id": 4, "timer_id": 3,
                    "timer_device": "T3", "data_register": "D30", "cycle_id": 2
                }
            }]
        }"#;

        let snapshot = GenerationSnapshot::from_json(json).unwrap();
        assert_eq!(snapshot.cycle_id, 2);
        assert_eq!(snapshot.details[0].record.detail_name, "clamp");
        assert_eq!(snapshot.details[0].record.start_sensor, None);
        assert_eq!(snapshot.timers[0].device.mnemonic_kind, MnemonicKind::Operation);
    }

    #[test]
    fn unknown_mnemonic_kind_is_rejected() {
        let json = r#"{ "timers": [{
            "timer": {},
            "device": { "mnemonic_kind": 9, "record_id": 1, "timer_id": 1,
                        "timer_device": "T1", "data_register": "D1", "cycle_id": null }
        }]}"#;
        assert!(GenerationSnapshot::from_json(json).is_err());
    }

    #[test]
    fn blank_keys_read_as_unset() {
        let detail = ProcessDetail {
            start_sensor: Some(String::new()),
            finish_sensor: Some("  ".to_string()),
            skip_mode: Some("_".to_string()),
            il_start: Some(" Y20 ".to_string()),
            ..Default::default()
        };

        assert_eq!(detail.start_sensor_key(), None);
        assert_eq!(detail.finish_sensor_key(), None);
        assert_eq!(detail.skip_mode_key(), None);
        assert_eq!(detail.il_start_key(), Some("Y20"));

        let negated = ProcessDetail {
            skip_mode: Some("_M50".to_string()),
            ..Default::default()
        };
        assert_eq!(negated.skip_mode_key(), Some("_M50"));
    }
}
