//! # Generation Errors
//!
//! Two channels: [`GenerationError`] aborts the whole run (corrupted input,
//! I/O), while [`OutputError`]s are collected per detail and never thrown.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::model::MnemonicKind;

/// Fatal errors. Any of these aborts the run.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("process {process_id} referenced by detail {detail_id} has no device assignment")]
    ProcessNotFound { detail_id: i32, process_id: i32 },

    #[error("block detail {block_number} referenced by detail {detail_id} has no device assignment")]
    BlockNotFound { detail_id: i32, block_number: i32 },

    #[error("detail {referenced_id} referenced by {context} has no device assignment")]
    DetailDeviceNotFound { referenced_id: i32, context: String },

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(#[from] serde_json::Error),

    #[error("invalid settings: {0}")]
    InvalidSettings(#[from] toml::de::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// A recoverable problem found while building one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputError {
    pub message: String,
    pub record_name: String,
    pub mnemonic: MnemonicKind,
    pub record_id: i32,
    pub is_critical: bool,
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = if self.is_critical { "CRITICAL" } else { "WARN" };
        write!(
            f,
            "[{}] {:?} {} ({}): {}",
            tag, self.mnemonic, self.record_id, self.record_name, self.message
        )
    }
}

/// Sink collecting [`OutputError`]s in report order.
#[derive(Debug, Default, Clone)]
pub struct ErrorAggregator {
    errors: Vec<OutputError>,
}

impl ErrorAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, error: OutputError) {
        if error.is_critical {
            tracing::warn!("[LDGC] critical: {}", error);
        } else {
            tracing::debug!("[LDGC] {}", error);
        }
        self.errors.push(error);
    }

    pub fn errors(&self) -> &[OutputError] {
        &self.errors
    }

    pub fn has_critical(&self) -> bool {
        self.errors.iter().any(|e| e.is_critical)
    }

    pub fn into_errors(self) -> Vec<OutputError> {
        self.errors
    }
}
