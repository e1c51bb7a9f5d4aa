//! Human-readable rendering of an optimization report

use std::fmt::Write as _;
use std::time::Duration;

use gcodetrim_optimizer::{Advisory, OptimizationReport};

/// Thousands separators: `12450` -> `12,450`
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        let remaining = digits.len() - i;
        if i > 0 && remaining % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// `3.2s`, `1m 15s`, `1h 2m`
pub fn format_duration(d: Duration) -> String {
    let seconds = d.as_secs();
    if seconds < 60 {
        return format!("{:.1}s", d.as_secs_f64());
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{}m {}s", minutes, seconds % 60);
    }
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// `512 B`, `12.3 KB`, `4.0 MB`
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// Lines per second, rounded
pub fn format_throughput(lines_per_second: f64) -> String {
    if !lines_per_second.is_finite() || lines_per_second <= 0.0 {
        return "0".to_string();
    }
    format_number(lines_per_second.round() as u64)
}

/// One `WARNING:` line per advisory
pub fn format_advisory(advisory: &Advisory) -> String {
    format!("WARNING: {}", advisory)
}

/// Render the end-of-run summary
pub fn render_summary(report: &OptimizationReport) -> String {
    let summary = &report.summary;
    let threshold = &report.threshold;
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "\n=== Optimization Complete ===\n");
    let _ = writeln!(
        out,
        "Threshold:       Z{:.3} (deepest Z{:.3} + allowance {:.3})",
        threshold.value, threshold.min_depth, threshold.allowance
    );
    let _ = writeln!(
        out,
        "Strategy:        {} crossing, {} multi-axis\n",
        report.crossing_strategy, report.multi_axis_strategy
    );

    let _ = writeln!(out, "Total lines:     {}", format_number(summary.total));
    let _ = writeln!(out, "Removed lines:   {}", format_number(summary.removed));
    if summary.split > 0 {
        let _ = writeln!(out, "Moves split:     {}", format_number(summary.split));
    }
    if summary.malformed > 0 {
        let _ = writeln!(out, "Malformed lines: {}", format_number(summary.malformed));
    }
    let _ = writeln!(out, "Kept lines:      {}", format_number(summary.kept_lines));
    let _ = writeln!(out, "Line reduction:  {:.1}%\n", summary.line_reduction_percent);

    let _ = writeln!(out, "Input size:      {}", format_bytes(summary.bytes_in));
    if let (Some(bytes_out), Some(reduction)) = (summary.bytes_out, summary.size_reduction_percent)
    {
        let _ = writeln!(out, "Output size:     {}", format_bytes(bytes_out));
        let _ = writeln!(out, "Size reduction:  {:.1}%", reduction);
    }
    out.push('\n');

    let _ = writeln!(
        out,
        "Estimated time saved:  {}",
        format_duration(summary.time_saved)
    );
    let _ = writeln!(
        out,
        "Processing time:       {} ({} lines/s)",
        format_duration(summary.processing_time),
        format_throughput(summary.lines_per_second)
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcodetrim_optimizer::{
        CrossingStrategy, DepthThreshold, MultiAxisStrategy, StatisticsAccumulator,
    };

    fn report(split: u64) -> OptimizationReport {
        let mut stats = StatisticsAccumulator::new();
        stats.record_preserved();
        if split > 0 {
            stats.record_split(2);
        }
        let summary = stats.finalize(Duration::from_millis(20), 2048, Some(1024));
        OptimizationReport {
            threshold: DepthThreshold {
                min_depth: -10.0,
                allowance: 1.0,
                value: -9.0,
            },
            crossing_strategy: CrossingStrategy::Aggressive,
            multi_axis_strategy: MultiAxisStrategy::Safe,
            summary,
            advisories: Vec::new(),
        }
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(12450), "12,450");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(3200)), "3.2s");
        assert_eq!(format_duration(Duration::from_millis(400)), "0.4s");
        assert_eq!(format_duration(Duration::from_secs(75)), "1m 15s");
        assert_eq!(format_duration(Duration::from_secs(3720)), "1h 2m");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(12_595), "12.3 KB");
        assert_eq!(format_bytes(4 * 1024 * 1024), "4.0 MB");
    }

    #[test]
    fn test_format_throughput() {
        assert_eq!(format_throughput(0.0), "0");
        assert_eq!(format_throughput(f64::INFINITY), "0");
        assert_eq!(format_throughput(125_000.4), "125,000");
    }

    #[test]
    fn test_split_line_only_when_nonzero() {
        let text = render_summary(&report(0));
        assert!(!text.contains("Moves split"), "{}", text);
        assert!(text.contains("Threshold:       Z-9.000"), "{}", text);

        let text = render_summary(&report(1));
        assert!(text.contains("Moves split:     1"), "{}", text);
        assert!(text.contains("Size reduction:  50.0%"), "{}", text);
    }

    #[test]
    fn test_advisory_line() {
        assert_eq!(
            format_advisory(&Advisory::NoFeedRateSpecified),
            "WARNING: No feed rate specified anywhere in the program"
        );
    }
}
