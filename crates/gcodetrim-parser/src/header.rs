//! Header metadata extraction
//!
//! CAM generators such as Snapmaker Luban open a program with a block of
//! `;key: value` or `;key(unit): value` comment lines. Only the leading
//! comment block is scanned; the first line carrying code ends the header.

use std::sync::OnceLock;

use gcodetrim_core::HeaderMetadata;
use regex::Regex;

fn header_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^;\s*([A-Za-z_][A-Za-z0-9_]*)\s*(?:\([^)]*\))?\s*:\s*(.*?)\s*$")
            .expect("invalid header regex")
    })
}

/// Whether a line belongs to the leading comment block
pub fn is_header_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with(';') || trimmed == "%"
}

/// Extract header metadata from the leading lines of a program
///
/// Returns the metadata and any warnings about it. Scanning stops at the
/// first line that is not blank or a `;` comment.
pub fn parse_header<'a, I>(lines: I) -> (HeaderMetadata, Vec<String>)
where
    I: IntoIterator<Item = &'a str>,
{
    let mut header = HeaderMetadata::new();
    let mut warnings = Vec::new();

    for line in lines {
        if !is_header_line(line) {
            break;
        }
        let Some(caps) = header_regex().captures(line.trim()) else {
            continue;
        };
        let key = caps[1].to_ascii_lowercase();
        let value = caps[2].to_string();
        apply_entry(&mut header, &key, &value, &mut warnings);
    }

    if header.is_empty() {
        warnings.push("No header metadata found; initial depth assumed 0".to_string());
        return (header, warnings);
    }

    match &header.tool_head {
        None => warnings.push("Header has no tool_head; cannot confirm a CNC program".to_string()),
        Some(head) if !header.is_cnc() => {
            warnings.push(format!("Tool head '{}' is not a CNC tool head", head))
        }
        Some(_) => {}
    }
    if header.max_z.is_none() {
        warnings.push("Header has no max_z; initial depth assumed 0".to_string());
    }

    (header, warnings)
}

fn apply_entry(header: &mut HeaderMetadata, key: &str, value: &str, warnings: &mut Vec<String>) {
    let parsed = match key {
        "file_type" => {
            header.file_type = Some(value.to_string());
            true
        }
        "tool_head" => {
            header.tool_head = Some(value.to_string());
            true
        }
        "machine" => {
            header.machine = Some(value.to_string());
            true
        }
        "estimated_time" => set_number(&mut header.estimated_time_secs, value),
        "max_x" => set_number(&mut header.max_x, value),
        "min_x" => set_number(&mut header.min_x, value),
        "max_y" => set_number(&mut header.max_y, value),
        "min_y" => set_number(&mut header.min_y, value),
        "max_z" => set_number(&mut header.max_z, value),
        "min_z" => set_number(&mut header.min_z, value),
        "max_b" => set_number(&mut header.max_b, value),
        "min_b" => set_number(&mut header.min_b, value),
        "file_total_lines" => value
            .parse::<u64>()
            .map(|v| header.total_lines = Some(v))
            .is_ok(),
        "work_speed" => parse_speed(value)
            .map(|v| header.work_speed = Some(v))
            .is_some(),
        "jog_speed" => parse_speed(value)
            .map(|v| header.jog_speed = Some(v))
            .is_some(),
        "is_rotate" => match value.to_ascii_lowercase().as_str() {
            "true" => {
                header.is_rotate = Some(true);
                true
            }
            "false" => {
                header.is_rotate = Some(false);
                true
            }
            _ => false,
        },
        _ => true,
    };

    if !parsed {
        warnings.push(format!("Invalid header value for {}: '{}'", key, value));
    }
}

fn set_number(target: &mut Option<f64>, value: &str) -> bool {
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => {
            *target = Some(v);
            true
        }
        _ => false,
    }
}

fn parse_speed(value: &str) -> Option<u32> {
    let speed = value.parse::<f64>().ok()?;
    if speed.is_finite() && speed >= 0.0 && speed <= u32::MAX as f64 {
        Some(speed.round() as u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LUBAN_HEADER: &str = ";Header Start
;header_type: cnc
;file_type: cnc
;tool_head: standardCNCToolheadForSM2
;machine: A350
;file_total_lines: 52310
;estimated_time(s): 1843.2
;is_rotate: false
;max_x(mm): 120.5
;max_y(mm): 80
;max_z(mm): 0.5
;min_x(mm): 0
;min_y(mm): 0
;min_z(mm): -10
;work_speed(mm/minute): 300
;jog_speed(mm/minute): 1500
;Header End

G90
G0 Z5
;max_z(mm): 99
";

    #[test]
    fn test_parses_luban_header() {
        let (header, warnings) = parse_header(LUBAN_HEADER.lines());

        assert_eq!(header.file_type.as_deref(), Some("cnc"));
        assert_eq!(header.tool_head.as_deref(), Some("standardCNCToolheadForSM2"));
        assert_eq!(header.machine.as_deref(), Some("A350"));
        assert_eq!(header.total_lines, Some(52310));
        assert_eq!(header.estimated_time_secs, Some(1843.2));
        assert_eq!(header.is_rotate, Some(false));
        assert_eq!(header.max_x, Some(120.5));
        assert_eq!(header.min_z, Some(-10.0));
        assert_eq!(header.work_speed, Some(300));
        assert_eq!(header.jog_speed, Some(1500));
        assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
    }

    #[test]
    fn test_stops_at_first_code_line() {
        let (header, _) = parse_header(LUBAN_HEADER.lines());
        assert_eq!(header.max_z, Some(0.5));
    }

    #[test]
    fn test_missing_header() {
        let (header, warnings) = parse_header("G0 Z5\nG1 Z-1".lines());
        assert!(header.is_empty());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("No header metadata"));
    }

    #[test]
    fn test_non_cnc_tool_head_warns() {
        let (header, warnings) = parse_header(";tool_head: levelTwoLaserToolheadForSM2\n;max_z: 0".lines());
        assert!(!header.is_cnc());
        assert_eq!(header.max_z, Some(0.0));
        assert!(warnings.iter().any(|w| w.contains("not a CNC tool head")));
    }

    #[test]
    fn test_invalid_value_warns() {
        let (header, warnings) = parse_header(";tool_head: cnc\n;max_z(mm): deep".lines());
        assert_eq!(header.max_z, None);
        assert!(warnings.iter().any(|w| w.contains("Invalid header value for max_z")));
        assert!(warnings.iter().any(|w| w.contains("no max_z")));
    }
}
