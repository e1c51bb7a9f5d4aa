//! Move classification against the depth threshold
//!
//! Smaller (more negative) depths are deeper. A depth equal to the threshold
//! counts as deep, so a move that only touches the threshold is never a
//! crossing and never produces a zero-length segment.

use gcodetrim_core::Instruction;
use serde::{Deserialize, Serialize};

use crate::modal::ModalState;

/// Where a move lies relative to the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveClassification {
    /// Entirely above the threshold; already cut
    Shallow,
    /// Entirely at or below the threshold
    Deep,
    /// Starts above, ends at or below
    CrossingEnter,
    /// Starts at or below, ends above
    CrossingLeave,
    /// Not a classifiable cutting move
    NonMotion,
}

impl MoveClassification {
    pub fn is_crossing(self) -> bool {
        matches!(self, Self::CrossingEnter | Self::CrossingLeave)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Shallow => "shallow",
            Self::Deep => "deep",
            Self::CrossingEnter => "crossing-enter",
            Self::CrossingLeave => "crossing-leave",
            Self::NonMotion => "non-motion",
        }
    }
}

impl std::fmt::Display for MoveClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a move by its start and end depth
///
/// Total over all inputs. A NaN depth is never "above", so it classifies
/// toward preservation.
pub fn classify(start_depth: f64, end_depth: f64, threshold: f64) -> MoveClassification {
    let start_above = start_depth > threshold;
    let end_above = end_depth > threshold;

    match (start_above, end_above) {
        (true, true) => MoveClassification::Shallow,
        (false, false) => MoveClassification::Deep,
        (true, false) => MoveClassification::CrossingEnter,
        (false, true) => MoveClassification::CrossingLeave,
    }
}

/// Classify an instruction given the modal state before and after it
///
/// Only explicit G1 moves are classified; everything else is `NonMotion`.
pub fn classify_instruction(
    instruction: &Instruction,
    start: &ModalState,
    end: &ModalState,
    threshold: f64,
) -> MoveClassification {
    if !instruction.is_linear() {
        return MoveClassification::NonMotion;
    }
    classify(start.depth(), end.depth(), threshold)
}
