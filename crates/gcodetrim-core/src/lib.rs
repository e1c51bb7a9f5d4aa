//! # gcodetrim Core
//!
//! Core types and error handling for gcodetrim.
//! Provides the instruction model shared by the parser, the optimizer
//! and the command-line front end, plus the [`InstructionSink`] seam
//! between the optimizer and whatever serializes its output.

pub mod error;
pub mod types;

pub use error::{ConfigError, Error, GcodeError, GeometryError, Result};

pub use types::{
    format_number, round_output, Axis, AxisSet, HeaderMetadata, Instruction, InstructionSink,
    MotionKind, OpLetter, Operation, Param, ParamSet, Program, ProgramLine, OUTPUT_DECIMALS,
};
