//! Program model types

pub mod header;
pub mod instruction;
pub mod params;
pub mod program;

pub use header::HeaderMetadata;
pub use instruction::{
    format_number, round_output, Instruction, MotionKind, OpLetter, Operation, OUTPUT_DECIMALS,
};
pub use params::{Axis, AxisSet, Param, ParamSet};
pub use program::{InstructionSink, Program, ProgramLine};
