#![allow(dead_code)]

use ldgc::codegen::{DetailOutput, GenerationContext};
use ldgc::{
    Category, ControlBox, Cylinder, CylinderControlBox, DetailUnitBuilder, GenerationSnapshot,
    GeneratorSettings, Io, IoAddressResolver, LadderCsvRow, ManualSlotIndex, MnemonicDevice,
    MnemonicKind, MnemonicTimerDevice, MnemonicTimerDeviceWithDetail, Operation, Process,
    ProcessDetail, ProcessDetailConnection, ProcessDetailFinish, RelationIndex, Timer,
};

pub const PLC: i32 = 1;
pub const CYCLE: i32 = 1;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Snapshot with process 1 at `L0`.
pub fn base_snapshot() -> GenerationSnapshot {
    GenerationSnapshot {
        plc_id: PLC,
        cycle_id: CYCLE,
        processes: vec![MnemonicDevice::new(
            Process {
                id: 1,
                process_name: "process1".to_string(),
                cycle_id: Some(CYCLE),
                sort_number: Some(1),
            },
            1,
            "L",
            0,
        )],
        ..Default::default()
    }
}

pub fn detail(id: i32, category: i32) -> ProcessDetail {
    ProcessDetail {
        id,
        process_id: 1,
        category_id: Some(category),
        detail_name: format!("detail{id}"),
        sort_number: Some(id),
        ..Default::default()
    }
}

pub fn add_detail(snapshot: &mut GenerationSnapshot, record: ProcessDetail, start: i32) {
    let id = record.id;
    snapshot.details.push(MnemonicDevice::new(record, id, "L", start));
}

pub fn add_io(snapshot: &mut GenerationSnapshot, address: &str, name: &str) {
    let id = snapshot.ios.len() as i32 + 1;
    snapshot.ios.push(Io {
        id,
        address: address.to_string(),
        io_name: name.to_string(),
        plc_id: PLC,
    });
}

/// Operation `op_id` at `M{op_start}`, optionally driving cylinder `cyl_id` at `M{cyl_start}`.
pub fn add_operation(
    snapshot: &mut GenerationSnapshot,
    op_id: i32,
    op_start: i32,
    cylinder: Option<(i32, i32)>,
) {
    snapshot.operations.push(MnemonicDevice::new(
        Operation {
            id: op_id,
            operation_name: format!("op{op_id}"),
            cylinder_id: cylinder.map(|(id, _)| id),
            cycle_id: Some(CYCLE),
        },
        op_id,
        "M",
        op_start,
    ));
    if let Some((cyl_id, cyl_start)) = cylinder {
        if snapshot.cylinder(cyl_id).is_none() {
            snapshot.cylinders.push(MnemonicDevice::new(
                Cylinder {
                    id: cyl_id,
                    cylinder_name: format!("CY{cyl_id}"),
                    plc_id: PLC,
                },
                cyl_id,
                "M",
                cyl_start,
            ));
        }
    }
}

pub fn add_control_box(
    snapshot: &mut GenerationSnapshot,
    cylinder_id: i32,
    box_id: i32,
    mode: &str,
    button: &str,
) {
    snapshot.control_boxes.push(ControlBox {
        id: box_id,
        plc_id: PLC,
        box_name: format!("box{box_id}"),
        manual_mode: mode.to_string(),
        manual_button: button.to_string(),
    });
    snapshot.cylinder_control_boxes.push(CylinderControlBox {
        cylinder_id,
        control_box_id: box_id,
        plc_id: PLC,
        sort_order: box_id,
    });
}

pub fn connect(snapshot: &mut GenerationSnapshot, from: i32, to: i32) {
    snapshot.connections.push(ProcessDetailConnection {
        from_process_detail_id: from,
        to_process_detail_id: to,
        cycle_id: Some(CYCLE),
    });
}

pub fn finish(snapshot: &mut GenerationSnapshot, detail_id: i32, target: i32) {
    snapshot.finishes.push(ProcessDetailFinish {
        process_detail_id: detail_id,
        finish_process_detail_id: target,
        cycle_id: Some(CYCLE),
    });
}

pub fn add_timer(
    snapshot: &mut GenerationSnapshot,
    kind: MnemonicKind,
    record_id: i32,
    timer_id: i32,
    category: i32,
) {
    snapshot.timers.push(MnemonicTimerDeviceWithDetail {
        timer: Timer {
            id: timer_id,
            cycle_id: Some(CYCLE),
            timer_name: format!("timer{timer_id}"),
            timer_category_id: category,
            timer_count: 10,
        },
        device: MnemonicTimerDevice {
            mnemonic_kind: kind,
            record_id,
            timer_id,
            timer_device: format!("T{timer_id}"),
            data_register: format!("D{}", timer_id * 10),
            cycle_id: Some(CYCLE),
        },
    });
}

/// Run one detail's builder directly, without the orchestrator's statement row.
pub fn build_detail(snapshot: &GenerationSnapshot, detail_id: i32) -> DetailOutput {
    let settings = GeneratorSettings::default();
    let relations = RelationIndex::from_snapshot(snapshot);
    let ctx = GenerationContext {
        snapshot,
        settings: &settings,
        resolver: &IoAddressResolver,
        relations: &relations,
    };
    let device = snapshot.detail(detail_id).expect("detail device");
    let category = device
        .record
        .category_id
        .and_then(Category::from_id)
        .expect("known category");

    let slot = ManualSlotIndex::from_snapshot(snapshot).slot_of(detail_id);
    let mut builder = DetailUnitBuilder::new(ctx, device, slot).expect("builder");
    builder.build(category).expect("build");
    builder.finish()
}

pub fn texts(rows: &[LadderCsvRow]) -> Vec<String> {
    rows.iter().map(|r| r.to_string()).collect()
}

pub fn strs(expected: &[&str]) -> Vec<String> {
    expected.iter().map(|s| s.to_string()).collect()
}
