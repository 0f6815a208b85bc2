//! # Ladder Code Generation
//!
//! Ladder row generation for process-detail graphs.

mod category_handlers;
mod detail_unit;
mod ladder_codegen;
mod process_unit;

pub use category_handlers::Category;
pub use detail_unit::*;
pub use ladder_codegen::*;
pub use process_unit::ProcessUnitBuilder;
