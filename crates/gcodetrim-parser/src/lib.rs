//! # gcodetrim Parser
//!
//! Instruction source and sink for the optimizer.
//!
//! - [`parse_line`] turns one line of text into an instruction
//! - [`parse_header`] reads the leading `;key: value` metadata block
//! - [`ProgramReader`] and [`parse_program`] build a whole program
//! - [`GcodeWriter`] serializes instructions back to text

pub mod header;
pub mod line;
pub mod reader;
pub mod writer;

pub use header::parse_header;
pub use line::parse_line;
pub use reader::{parse_program, ProgramBuilder, ProgramReader, READ_BUFFER_SIZE};
pub use writer::{GcodeWriter, WRITE_BUFFER_SIZE};
