//! Program header metadata

use serde::{Deserialize, Serialize};

/// Metadata declared in the leading comment block of a program
///
/// Every field is optional; programs from other generators carry no header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaderMetadata {
    /// e.g. "cnc"
    pub file_type: Option<String>,
    /// e.g. "standardCNCToolheadForSM2"
    pub tool_head: Option<String>,
    /// e.g. "Snapmaker 2.0 A350"
    pub machine: Option<String>,
    /// Declared line count
    pub total_lines: Option<u64>,
    /// Declared run time in seconds
    pub estimated_time_secs: Option<f64>,
    /// Rotary (4-axis) job
    pub is_rotate: Option<bool>,
    pub min_x: Option<f64>,
    pub max_x: Option<f64>,
    pub min_y: Option<f64>,
    pub max_y: Option<f64>,
    pub min_z: Option<f64>,
    pub max_z: Option<f64>,
    pub min_b: Option<f64>,
    pub max_b: Option<f64>,
    /// Cutting speed, mm/min
    pub work_speed: Option<u32>,
    /// Travel speed, mm/min
    pub jog_speed: Option<u32>,
}

impl HeaderMetadata {
    /// Create empty metadata
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the header declares a CNC tool head
    pub fn is_cnc(&self) -> bool {
        self.tool_head
            .as_deref()
            .is_some_and(|head| head.to_lowercase().contains("cnc"))
    }

    /// Nothing was declared
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
