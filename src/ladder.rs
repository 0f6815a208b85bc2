//! # Ladder Rows
//!
//! One [`LadderCsvRow`] per ladder instruction. Rows are created unkeyed by
//! the builders and stamped with a synthetic key when they are appended to
//! the output stream (see [`RowKeyCounter`]).

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Instruction {
    /// Inter-rung comment.
    Statement,
    Ld,
    Ldi,
    Ldp,
    And,
    Ani,
    Anb,
    Or,
    Ori,
    Orp,
    Out,
    Set,
    Rst,
    Pls,
}

impl Instruction {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Instruction::Statement => "",
            Instruction::Ld => "LD",
            Instruction::Ldi => "LDI",
            Instruction::Ldp => "LDP",
            Instruction::And => "AND",
            Instruction::Ani => "ANI",
            Instruction::Anb => "ANB",
            Instruction::Or => "OR",
            Instruction::Ori => "ORI",
            Instruction::Orp => "ORP",
            Instruction::Out => "OUT",
            Instruction::Set => "SET",
            Instruction::Rst => "RST",
            Instruction::Pls => "PLS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LadderCsvRow {
    /// Append-order key; `0` until stamped.
    pub key: u64,
    pub instruction: Instruction,
    /// Device operand, or the comment text of a statement row.
    pub operand: String,
    /// Second operand (timer preset register).
    pub value: Option<String>,
}

impl LadderCsvRow {
    fn op(instruction: Instruction, operand: impl Into<String>) -> Self {
        Self {
            key: 0,
            instruction,
            operand: operand.into(),
            value: None,
        }
    }

    pub fn statement(text: impl Into<String>) -> Self {
        Self::op(Instruction::Statement, text)
    }

    pub fn ld(operand: impl Into<String>) -> Self {
        Self::op(Instruction::Ld, operand)
    }

    pub fn ldi(operand: impl Into<String>) -> Self {
        Self::op(Instruction::Ldi, operand)
    }

    pub fn ldp(operand: impl Into<String>) -> Self {
        Self::op(Instruction::Ldp, operand)
    }

    pub fn and(operand: impl Into<String>) -> Self {
        Self::op(Instruction::And, operand)
    }

    pub fn ani(operand: impl Into<String>) -> Self {
        Self::op(Instruction::Ani, operand)
    }

    pub fn anb() -> Self {
        Self::op(Instruction::Anb, "")
    }

    pub fn or(operand: impl Into<String>) -> Self {
        Self::op(Instruction::Or, operand)
    }

    pub fn ori(operand: impl Into<String>) -> Self {
        Self::op(Instruction::Ori, operand)
    }

    pub fn orp(operand: impl Into<String>) -> Self {
        Self::op(Instruction::Orp, operand)
    }

    pub fn out(operand: impl Into<String>) -> Self {
        Self::op(Instruction::Out, operand)
    }

    pub fn set(operand: impl Into<String>) -> Self {
        Self::op(Instruction::Set, operand)
    }

    pub fn rst(operand: impl Into<String>) -> Self {
        Self::op(Instruction::Rst, operand)
    }

    pub fn pls(operand: impl Into<String>) -> Self {
        Self::op(Instruction::Pls, operand)
    }

    /// On-delay timer coil `OUT <timer> <preset register>`.
    pub fn timer(timer_device: impl Into<String>, data_register: impl Into<String>) -> Self {
        Self {
            value: Some(data_register.into()),
            ..Self::op(Instruction::Out, timer_device)
        }
    }

    /// `LD` or `LDI` depending on polarity.
    pub fn load(operand: impl Into<String>, negated: bool) -> Self {
        if negated { Self::ldi(operand) } else { Self::ld(operand) }
    }

    /// `OR` or `ORI` depending on polarity.
    pub fn or_polar(operand: impl Into<String>, negated: bool) -> Self {
        if negated { Self::ori(operand) } else { Self::or(operand) }
    }

    pub fn is_statement(&self) -> bool {
        self.instruction == Instruction::Statement
    }
}

impl fmt::Display for LadderCsvRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_statement() {
            return write!(f, "; {}", self.operand);
        }
        f.write_str(self.instruction.mnemonic())?;
        if !self.operand.is_empty() {
            write!(f, " {}", self.operand)?;
        }
        if let Some(value) = &self.value {
            write!(f, " {}", value)?;
        }
        Ok(())
    }
}

/// A sensor or skip key split into its device name and negation flag.
///
/// A leading `_` means "negated"; it is never part of the device name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedKey<'a> {
    pub name: &'a str,
    pub negated: bool,
}

impl<'a> SignedKey<'a> {
    pub fn parse(key: &'a str) -> Self {
        match key.strip_prefix('_') {
            Some(name) => Self { name, negated: true },
            None => Self { name: key, negated: false },
        }
    }
}

/// Synthetic row keys, strictly increasing in append order.
#[derive(Debug)]
pub struct RowKeyCounter {
    next: u64,
}

impl Default for RowKeyCounter {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl RowKeyCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.next = 1;
    }

    /// Stamp `rows` with fresh keys and append them to `output`.
    pub fn append(&mut self, output: &mut Vec<LadderCsvRow>, rows: Vec<LadderCsvRow>) {
        for mut row in rows {
            row.key = self.next;
            self.next += 1;
            output.push(row);
        }
    }
}
