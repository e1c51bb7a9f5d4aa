//! Parsed program and the instruction sink seam

use serde::{Deserialize, Serialize};

use super::{HeaderMetadata, Instruction};
use crate::error::{GcodeError, Result};

/// One input line after parsing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProgramLine {
    /// Line parsed into an instruction
    Parsed(Instruction),
    /// Line the parser rejected
    Malformed {
        /// 1-based line number
        line_number: usize,
        /// Raw text
        text: String,
        /// Why parsing failed
        error: GcodeError,
    },
}

impl ProgramLine {
    pub fn instruction(&self) -> Option<&Instruction> {
        match self {
            Self::Parsed(instruction) => Some(instruction),
            Self::Malformed { .. } => None,
        }
    }
}

impl From<Instruction> for ProgramLine {
    fn from(instruction: Instruction) -> Self {
        Self::Parsed(instruction)
    }
}

/// A complete program: header metadata plus every line in order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub header: HeaderMetadata,
    pub lines: Vec<ProgramLine>,
    /// Header problems found while parsing
    pub warnings: Vec<String>,
    /// Size of the source text in bytes
    pub bytes: u64,
}

impl Program {
    /// Build a program from already-parsed instructions
    pub fn from_instructions(header: HeaderMetadata, instructions: Vec<Instruction>) -> Self {
        Self {
            header,
            lines: instructions.into_iter().map(ProgramLine::Parsed).collect(),
            warnings: Vec::new(),
            bytes: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Parsed instructions, skipping malformed lines
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.lines.iter().filter_map(ProgramLine::instruction)
    }
}

/// Receiver of every instruction the optimizer retains or produces, in order
pub trait InstructionSink {
    /// Accept one instruction
    fn emit(&mut self, instruction: &Instruction) -> Result<()>;

    /// Called once after the last instruction
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }

    /// Serialized size of everything emitted so far, when the sink knows it
    fn bytes_written(&self) -> Option<u64> {
        None
    }
}

impl InstructionSink for Vec<Instruction> {
    fn emit(&mut self, instruction: &Instruction) -> Result<()> {
        self.push(instruction.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Operation, ParamSet};

    #[test]
    fn test_instructions_skip_malformed() {
        let program = Program {
            lines: vec![
                Instruction::comment(";a").into(),
                ProgramLine::Malformed {
                    line_number: 2,
                    text: "G1 X#".to_string(),
                    error: GcodeError::InvalidSyntax {
                        line_number: 2,
                        reason: "bad".to_string(),
                    },
                },
                Instruction::new(Some(Operation::g(1)), ParamSet::new()).into(),
            ],
            ..Program::default()
        };
        assert_eq!(program.len(), 3);
        assert_eq!(program.instructions().count(), 2);
    }

    #[test]
    fn test_vec_sink_collects() {
        let mut sink: Vec<Instruction> = Vec::new();
        sink.emit(&Instruction::blank()).unwrap();
        sink.finish().unwrap();
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.bytes_written(), None);
    }
}
