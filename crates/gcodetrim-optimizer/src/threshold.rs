//! Depth threshold resolution (first pass)

use gcodetrim_core::{ConfigError, Error, Instruction, Result};
use serde::{Deserialize, Serialize};

use crate::modal::ModalState;

/// Preservation threshold for a run
///
/// Moves that stay strictly above `value` were already cut by the roughing
/// pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthThreshold {
    /// Deepest depth reached by any G0/G1 move
    pub min_depth: f64,
    /// Material left by the roughing pass
    pub allowance: f64,
    /// `min_depth + allowance`
    pub value: f64,
}

/// Check an allowance before a run starts
pub fn validate_allowance(allowance: f64) -> std::result::Result<(), ConfigError> {
    if !allowance.is_finite() {
        return Err(ConfigError::NonFiniteAllowance { value: allowance });
    }
    if allowance < 0.0 {
        return Err(ConfigError::NegativeAllowance { value: allowance });
    }
    Ok(())
}

/// Scan every instruction and compute the threshold
///
/// Uses its own modal tracker, so nothing it does is visible to the second
/// pass.
///
/// # Errors
/// `ConfigError` for an invalid allowance, `NoMotionFound` when the program
/// has no G0/G1 move.
pub fn resolve<'a, I>(instructions: I, header_max_depth: Option<f64>, allowance: f64) -> Result<DepthThreshold>
where
    I: IntoIterator<Item = &'a Instruction>,
{
    validate_allowance(allowance)?;

    let mut state = ModalState::initialize(header_max_depth);
    let mut min_depth: Option<f64> = None;

    for instruction in instructions {
        state.update(instruction);
        if instruction.is_depth_motion() {
            let depth = state.depth();
            min_depth = Some(min_depth.map_or(depth, |min| min.min(depth)));
        }
    }

    let min_depth = min_depth.ok_or(Error::NoMotionFound)?;
    let threshold = DepthThreshold {
        min_depth,
        allowance,
        value: min_depth + allowance,
    };
    tracing::debug!(
        "Resolved threshold {} (min depth {}, allowance {})",
        threshold.value,
        threshold.min_depth,
        threshold.allowance
    );
    Ok(threshold)
}
