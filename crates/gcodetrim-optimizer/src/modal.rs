//! Modal state tracking
//!
//! Programs only write the words that change, so the position of every axis
//! and the active feed rate persist from line to line. [`ModalState`] holds
//! the most recent explicit value of each.

use gcodetrim_core::{Axis, Instruction};
use serde::{Deserialize, Serialize};

/// Current position and feed rate
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ModalState {
    position: [f64; Axis::COUNT],
    feed_rate: f64,
    feed_rate_set: bool,
}

impl ModalState {
    /// Initial state for a run
    ///
    /// Depth starts at the header's declared maximum depth, or 0. Every
    /// other axis and the feed rate start at 0.
    pub fn initialize(header_max_depth: Option<f64>) -> Self {
        let mut state = Self::default();
        state.position[Axis::Z.index()] = header_max_depth.unwrap_or(0.0);
        state
    }

    /// Apply the words present on `instruction`; absent words keep their value
    pub fn update(&mut self, instruction: &Instruction) {
        for axis in Axis::ALL {
            if let Some(value) = instruction.axis(axis) {
                self.position[axis.index()] = value;
            }
        }
        if let Some(feed) = instruction.feed_rate() {
            self.feed_rate = feed;
            self.feed_rate_set = true;
        }
    }

    pub fn axis(&self, axis: Axis) -> f64 {
        self.position[axis.index()]
    }

    pub fn depth(&self) -> f64 {
        self.axis(Axis::Z)
    }

    /// Active feed rate (0 until one is programmed)
    pub fn feed_rate(&self) -> f64 {
        self.feed_rate
    }

    /// Whether any line has programmed a feed rate yet
    pub fn has_feed_rate(&self) -> bool {
        self.feed_rate_set
    }

    /// Euclidean distance to another state over every tracked axis
    pub fn distance_to(&self, other: &ModalState) -> f64 {
        Axis::ALL
            .iter()
            .map(|axis| {
                let delta = other.axis(*axis) - self.axis(*axis);
                delta * delta
            })
            .sum::<f64>()
            .sqrt()
    }
}
