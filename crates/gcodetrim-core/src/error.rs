//! Error handling for gcodetrim
//!
//! Provides the error types for every layer of the optimizer:
//! - Configuration errors (allowance and strategy selection)
//! - G-Code errors (per-line parsing)
//! - Geometry errors (threshold intersection)
//!
//! Configuration and no-motion errors abort a run. G-Code and geometry
//! errors are recovered per instruction by the engine.
//!
//! All error types use `thiserror` for ergonomic error handling.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error type
///
/// Raised before any instruction is processed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Allowance is below zero
    #[error("Allowance must be non-negative, got {value}")]
    NegativeAllowance {
        /// The rejected allowance.
        value: f64,
    },

    /// Allowance is NaN or infinite
    #[error("Allowance must be a finite number, got {value}")]
    NonFiniteAllowance {
        /// The rejected allowance.
        value: f64,
    },

    /// Strategy identifier does not match any known variant
    #[error("Invalid {kind} strategy '{value}' (valid: {})", .valid.join(", "))]
    InvalidStrategy {
        /// Which strategy dimension was being parsed.
        kind: &'static str,
        /// The rejected identifier.
        value: String,
        /// Every accepted identifier.
        valid: &'static [&'static str],
    },

    /// A setting is out of its valid range
    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting {
        /// The setting name.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Config file extension is not supported
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),
}

/// G-Code error type
///
/// Represents a line the parser could not turn into an instruction.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GcodeError {
    /// Word letter outside the supported dialect
    #[error("Unknown word '{letter}' at line {line_number}")]
    UnknownWord {
        /// The line number (1-based).
        line_number: usize,
        /// The offending letter.
        letter: char,
    },

    /// Word value could not be parsed as a number
    #[error("Invalid number '{text}' for word '{letter}' at line {line_number}")]
    InvalidNumber {
        /// The line number (1-based).
        line_number: usize,
        /// The word letter.
        letter: char,
        /// The text that failed to parse.
        text: String,
    },

    /// Operation code is negative, fractional beyond one subcode, or too large
    #[error("Invalid code '{letter}{text}' at line {line_number}")]
    InvalidCode {
        /// The line number (1-based).
        line_number: usize,
        /// The code letter (G, M or T).
        letter: char,
        /// The code text.
        text: String,
    },

    /// A parenthesised comment was never closed
    #[error("Unterminated comment at line {line_number}")]
    UnterminatedComment {
        /// The line number (1-based).
        line_number: usize,
    },

    /// Unexpected character between words
    #[error("Invalid syntax at line {line_number}: {reason}")]
    InvalidSyntax {
        /// The line number (1-based).
        line_number: usize,
        /// Description of the problem.
        reason: String,
    },
}

impl GcodeError {
    /// Line number the error refers to
    pub fn line_number(&self) -> usize {
        match self {
            Self::UnknownWord { line_number, .. }
            | Self::InvalidNumber { line_number, .. }
            | Self::InvalidCode { line_number, .. }
            | Self::UnterminatedComment { line_number }
            | Self::InvalidSyntax { line_number, .. } => *line_number,
        }
    }
}

/// Geometry error type
///
/// Raised by the intersection calculator when a move cannot be split at the
/// threshold plane.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeometryError {
    /// Depth does not change along the move
    #[error("Move does not cross threshold vertically (depth delta {delta:e})")]
    HorizontalMove {
        /// The depth delta that fell under tolerance.
        delta: f64,
    },

    /// Crossing parameter is outside the open interval (0, 1)
    #[error("Intersection parameter t={t} out of range (0, 1)")]
    ParameterOutOfRange {
        /// The computed interpolation parameter.
        t: f64,
    },

    /// Instruction is not a G0/G1 move
    #[error("Instruction is not a linear or rapid move")]
    NotAMove,

    /// Classification was not a crossing variant
    #[error("Cannot split a {classification} move")]
    NotCrossing {
        /// The classification that was passed.
        classification: String,
    },
}

/// Main error type for gcodetrim
///
/// A unified error type that can represent any error from all layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// G-Code error
    #[error(transparent)]
    Gcode(#[from] GcodeError),

    /// Geometry error
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Threshold resolution found no G0/G1 move
    #[error("No motion instructions found: cannot determine minimum depth")]
    NoMotionFound,

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    /// Check if this error aborts a run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Config(_) | Error::NoMotionFound | Error::Io(_) | Error::Other(_)
        )
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
