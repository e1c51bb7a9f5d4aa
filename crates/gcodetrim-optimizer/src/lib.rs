//! # gcodetrim Optimizer
//!
//! Removes the moves of a finishing toolpath that lie entirely above the
//! depth a roughing pass already reached, and truncates the moves that cross
//! that depth.
//!
//! The pipeline, leaves first:
//! - [`ModalState`] tracks position and feed rate across lines
//! - [`resolve`] computes the [`DepthThreshold`] (first pass)
//! - [`classify`] places a move relative to the threshold
//! - [`intersect`] and [`split`] cut crossing moves at the threshold
//! - [`StrategyEngine`] decides what happens to each move
//! - [`StatisticsAccumulator`] tallies the outcome
//!
//! [`Engine`] runs both passes over a [`Program`](gcodetrim_core::Program).

pub mod advisory;
pub mod classify;
pub mod engine;
pub mod geometry;
pub mod modal;
pub mod stats;
pub mod strategy;
pub mod threshold;

pub use advisory::{Advisory, AdvisoryLog};
pub use classify::{classify, classify_instruction, MoveClassification};
pub use engine::{
    Engine, EngineConfig, OptimizationReport, ProgressUpdate, DEFAULT_PROGRESS_INTERVAL,
};
pub use geometry::{intersect, split, IntersectionPoint, DEPTH_TOLERANCE};
pub use modal::ModalState;
pub use stats::{StatisticsAccumulator, Summary, DEFAULT_FEED_RATE};
pub use strategy::{Action, CrossingStrategy, MultiAxisStrategy, Strategy, StrategyEngine};
pub use threshold::{resolve, validate_allowance, DepthThreshold};
