//! # CSV Export
//!
//! Serializes a row stream into the CSV layout consumed by the ladder
//! programming tool: `Key,Statement,Instruction,Device,Value`, one line per
//! row, CRLF line endings.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::GenerationError;
use crate::ladder::LadderCsvRow;

pub const CSV_HEADER: [&str; 5] = ["Key", "Statement", "Instruction", "Device", "Value"];

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn write_record<W: Write>(writer: &mut W, fields: &[&str]) -> io::Result<()> {
    let line: Vec<String> = fields.iter().map(|f| escape(f)).collect();
    write!(writer, "{}\r\n", line.join(","))
}

pub fn write_csv<W: Write>(rows: &[LadderCsvRow], writer: &mut W) -> io::Result<()> {
    write_record(writer, &CSV_HEADER)?;
    for row in rows {
        let key = row.key.to_string();
        let record = if row.is_statement() {
            [key.as_str(), row.operand.as_str(), "", "", ""]
        } else {
            [
                key.as_str(),
                "",
                row.instruction.mnemonic(),
                row.operand.as_str(),
                row.value.as_deref().unwrap_or(""),
            ]
        };
        write_record(writer, &record)?;
    }
    Ok(())
}

pub fn to_csv_string(rows: &[LadderCsvRow]) -> String {
    let mut buffer = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_csv(rows, &mut buffer);
    String::from_utf8_lossy(&buffer).into_owned()
}

pub fn write_csv_file(rows: &[LadderCsvRow], path: &Path) -> Result<(), GenerationError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_csv(rows, &mut writer)?;
    writer.flush()?;
    tracing::info!("[LDGC] Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}
