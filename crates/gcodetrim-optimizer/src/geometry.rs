//! Threshold intersection and move splitting
//!
//! A straight move from `start` to `end` is parameterised as
//! `start + t * (end - start)`. The crossing parameter is
//! `t = (threshold - start_depth) / (end_depth - start_depth)`; every axis is
//! interpolated with the same `t` and the depth is pinned to the threshold.

use gcodetrim_core::{round_output, Axis, GeometryError, Instruction, Param, ParamSet};
use serde::{Deserialize, Serialize};

use crate::classify::MoveClassification;
use crate::modal::ModalState;

/// Depth deltas smaller than this are treated as horizontal
pub const DEPTH_TOLERANCE: f64 = 1e-9;

/// Point where a move crosses the threshold plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntersectionPoint {
    coords: [f64; Axis::COUNT],
    t: f64,
}

impl IntersectionPoint {
    /// Coordinate of an axis at the crossing
    pub fn axis(&self, axis: Axis) -> f64 {
        self.coords[axis.index()]
    }

    /// Always exactly the threshold
    pub fn depth(&self) -> f64 {
        self.axis(Axis::Z)
    }

    /// Fraction of the move completed at the crossing, in (0, 1)
    pub fn t(&self) -> f64 {
        self.t
    }
}

/// Find where the move `start -> end` crosses `threshold`
///
/// # Errors
/// `HorizontalMove` if depth does not change along the move,
/// `ParameterOutOfRange` if the crossing is not strictly inside the move.
pub fn intersect(
    start: &ModalState,
    end: &ModalState,
    threshold: f64,
) -> Result<IntersectionPoint, GeometryError> {
    let delta = end.depth() - start.depth();
    if !(delta.abs() >= DEPTH_TOLERANCE) {
        return Err(GeometryError::HorizontalMove { delta });
    }

    let t = (threshold - start.depth()) / delta;
    if !(t > 0.0 && t < 1.0) {
        return Err(GeometryError::ParameterOutOfRange { t });
    }

    let mut coords = [0.0; Axis::COUNT];
    for axis in Axis::ALL {
        coords[axis.index()] = if axis.is_depth() {
            threshold
        } else {
            let from = start.axis(axis);
            round_output(from + t * (end.axis(axis) - from))
        };
    }

    Ok(IntersectionPoint { coords, t })
}

/// Replace a crossing move with the segments that stay in the finishing zone
///
/// - `CrossingEnter`: a move to the crossing point, then a move on to the
///   original end point. Both are returned.
/// - `CrossingLeave`: a move from the start to the crossing point only.
///
/// Segments carry exactly the axis words of the source line. Linear segments
/// carry the feed rate in effect (the line's own, else the modal one). Other
/// words, extra codes and the comment stay on the first segment.
///
/// # Errors
/// `NotAMove` for anything but G0/G1, `NotCrossing` for a non-crossing
/// classification.
pub fn split(
    instruction: &Instruction,
    intersection: &IntersectionPoint,
    classification: MoveClassification,
    start: &ModalState,
) -> Result<(Instruction, Option<Instruction>), GeometryError> {
    let kind = instruction.motion_kind().ok_or(GeometryError::NotAMove)?;
    if !classification.is_crossing() {
        return Err(GeometryError::NotCrossing {
            classification: classification.to_string(),
        });
    }

    let axes = instruction.axes();
    let feed = if kind.uses_feed() {
        instruction
            .feed_rate()
            .or_else(|| start.has_feed_rate().then(|| start.feed_rate()))
            .filter(|feed| *feed > 0.0)
    } else {
        None
    };

    let mut first_params = ParamSet::new();
    for axis in axes.iter() {
        first_params.set(axis.param(), intersection.axis(axis));
    }
    if let Some(feed) = feed {
        first_params.set(Param::F, feed);
    }
    for (param, value) in instruction.params.iter() {
        if param.axis().is_none() && param != Param::F {
            first_params.set(param, value);
        }
    }

    let first = Instruction {
        operation: Some(kind.operation()),
        extra_codes: instruction.extra_codes.clone(),
        params: first_params,
        comment: instruction.comment.clone(),
        line_number: instruction.line_number,
        source: None,
    };

    let second = match classification {
        MoveClassification::CrossingEnter => {
            let mut params = ParamSet::new();
            for axis in axes.iter() {
                if let Some(value) = instruction.axis(axis) {
                    params.set(axis.param(), value);
                }
            }
            if let Some(feed) = feed {
                params.set(Param::F, feed);
            }
            let mut second = Instruction::new(Some(kind.operation()), params);
            second.line_number = instruction.line_number;
            Some(second)
        }
        _ => None,
    };

    Ok((first, second))
}
