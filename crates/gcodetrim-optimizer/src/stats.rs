//! Statistics accumulation

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::modal::ModalState;

/// Feed rate assumed for time estimates when none is in effect (units/min)
pub const DEFAULT_FEED_RATE: f64 = 1000.0;

/// Running counters for one run
#[derive(Debug, Clone, Default)]
pub struct StatisticsAccumulator {
    total: u64,
    removed: u64,
    preserved: u64,
    split: u64,
    malformed: u64,
    segments_emitted: u64,
    residuals_emitted: u64,
    time_saved_minutes: f64,
    default_feed_used: bool,
}

impl StatisticsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a removed move and the machining time it would have taken
    ///
    /// Distance is Euclidean over every tracked axis. A zero, negative or
    /// missing feed rate falls back to [`DEFAULT_FEED_RATE`].
    pub fn record_removed(&mut self, start: &ModalState, end: &ModalState, feed_rate: Option<f64>) {
        self.total += 1;
        self.removed += 1;

        let feed = match feed_rate {
            Some(feed) if feed > 0.0 => feed,
            _ => {
                self.default_feed_used = true;
                DEFAULT_FEED_RATE
            }
        };
        self.time_saved_minutes += start.distance_to(end) / feed;
    }

    pub fn record_preserved(&mut self) {
        self.total += 1;
        self.preserved += 1;
    }

    /// Record a split move that produced `segments` output lines
    pub fn record_split(&mut self, segments: u64) {
        self.total += 1;
        self.split += 1;
        self.segments_emitted += segments;
    }

    /// Record the modal residual line written in place of a removed move
    pub fn record_residual(&mut self) {
        self.residuals_emitted += 1;
    }

    pub fn record_malformed(&mut self) {
        self.total += 1;
        self.malformed += 1;
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn removed(&self) -> u64 {
        self.removed
    }

    /// Whether any removed move was timed with the default feed rate
    pub fn default_feed_used(&self) -> bool {
        self.default_feed_used
    }

    /// Produce the final summary
    pub fn finalize(&self, processing_time: Duration, bytes_in: u64, bytes_out: Option<u64>) -> Summary {
        let kept_lines = self.preserved + self.split;
        let lines_written = self.preserved + self.segments_emitted + self.residuals_emitted;

        let line_reduction_percent = percent(self.removed as f64, self.total as f64);
        let size_reduction_percent = bytes_out.map(|out| {
            percent(bytes_in as f64 - out as f64, bytes_in as f64)
        });

        let seconds = processing_time.as_secs_f64();
        let lines_per_second = if seconds > 0.0 {
            self.total as f64 / seconds
        } else {
            0.0
        };

        let time_saved = Duration::try_from_secs_f64(self.time_saved_minutes * 60.0)
            .unwrap_or_default();

        Summary {
            total: self.total,
            removed: self.removed,
            preserved: self.preserved,
            split: self.split,
            malformed: self.malformed,
            kept_lines,
            lines_written,
            line_reduction_percent,
            bytes_in,
            bytes_out,
            size_reduction_percent,
            time_saved,
            processing_time,
            lines_per_second,
            default_feed_used: self.default_feed_used,
        }
    }
}

fn percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

/// Immutable result of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Input lines processed, malformed ones included
    pub total: u64,
    pub removed: u64,
    /// Lines emitted unchanged
    pub preserved: u64,
    /// Moves replaced by their split segments
    pub split: u64,
    /// Lines the parser rejected and that were dropped
    pub malformed: u64,
    /// Input lines that survived whole or split
    pub kept_lines: u64,
    /// Output lines, split segments and modal residuals counted individually
    pub lines_written: u64,
    pub line_reduction_percent: f64,
    pub bytes_in: u64,
    /// Output size, when the sink reports it
    pub bytes_out: Option<u64>,
    pub size_reduction_percent: Option<f64>,
    /// Estimated machining time of the removed moves
    pub time_saved: Duration,
    pub processing_time: Duration,
    pub lines_per_second: f64,
    pub default_feed_used: bool,
}
