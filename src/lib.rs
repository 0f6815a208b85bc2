//! # Ladder Detail Generation Compiler (LDGC)
//!
//! Compiler for turning cylinder sequencing graphs (processes, process
//! details and their start/finish edges) into PLC ladder instruction rows.
//!
//! Every process detail owns a bit-memory range and is compiled into a small
//! state machine of self-latching rungs:
//! - **L0** start latch (`+0`)
//! - **L1** running (`+1`)
//! - **L2** secondary stage (`+2`, branch/season/timer categories)
//! - **L4** complete (`+4`)
//!
//! with manual-override wiring from the cylinder's control boxes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ldgc::{compile_details, export, GenerationSnapshot, GeneratorSettings};
//!
//! let json = std::fs::read_to_string("cycle.json")?;
//! let snapshot = GenerationSnapshot::from_json(&json)?;
//!
//! let output = compile_details(&snapshot, &GeneratorSettings::default())?;
//! for error in &output.errors {
//!     eprintln!("{}", error);
//! }
//! export::write_csv_file(&output.rows, "ladder.csv".as_ref())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! LDGC follows a short pipeline:
//!
//! 1. **Snapshot Loading** - Device-labelled records for one cycle/PLC
//! 2. **Relationship Indexing** - Start/finish edges and control boxes keyed by id
//! 3. **Ordering** - Details sorted by `(sort_number, id)`, nulls last
//! 4. **Category Dispatch** - One emission routine per detail category
//! 5. **Export** - Keyed rows serialized to CSV

pub mod codegen;
pub mod compiler;
pub mod error;
pub mod export;
pub mod io_resolver;
pub mod ladder;
pub mod model;
pub mod relations;
pub mod settings;

// Re-export the main compilation API
pub use compiler::{compile_details, compile_details_with_services, compile_program};

pub use codegen::{
    Category, DetailUnitBuilder, GenerationContext, GenerationOutput, LadderCodeGenerator,
    ManualSlotIndex,
};
pub use error::{ErrorAggregator, GenerationError, OutputError};
pub use io_resolver::{IoAddressResolver, IoResolver};
pub use ladder::{Instruction, LadderCsvRow, RowKeyCounter, SignedKey};
pub use model::{
    ControlBox, Cylinder, CylinderControlBox, GenerationSnapshot, Io, MnemonicDevice,
    MnemonicDeviceWithCylinder, MnemonicDeviceWithOperation, MnemonicDeviceWithProcess,
    MnemonicDeviceWithProcessDetail, MnemonicKind, MnemonicTimerDevice,
    MnemonicTimerDeviceWithDetail, Operation, Process, ProcessDetail, ProcessDetailConnection,
    ProcessDetailFinish, ProcessFinishCondition, ProcessStartCondition, Timer,
};
pub use relations::{RelationIndex, RelationSource};
pub use settings::GeneratorSettings;
