//! ASERT test-vector run files
//!
//! Parses the BCHN-style `aserti3-2d` vector format: `## key: value`
//! header lines, `#` comments, and whitespace-separated data rows of
//! `iteration height time bits`. Heights may exceed the signed 64-bit
//! range; such rows are reduced to a height delta relative to the
//! anchor, which must fit.

use crate::error::{Error, Result};
use std::fs;
use std::num::IntErrorKind;
use std::path::Path;

/// Header metadata of a vector run.
#[derive(Debug, Clone, Default)]
pub struct RunHeader {
    /// Free-form description of the scenario.
    pub description: String,
    /// Height of the anchor block.
    pub anchor_height: i64,
    /// Timestamp of the anchor block's parent (some files label this
    /// "anchor ancestor time").
    pub anchor_parent_time: i64,
    /// Compact bits of the anchor target.
    pub anchor_bits: u32,
    /// Height of the first evaluated block.
    pub start_height: i64,
    /// Timestamp of the first evaluated block.
    pub start_time: i64,
    /// Expected number of data rows.
    pub iterations: i64,
}

/// One evaluated block in a vector run.
#[derive(Debug, Clone, Copy)]
pub struct RunRow {
    /// 1-based row counter from the file.
    pub iteration: i64,
    /// Height of the evaluated block relative to the anchor.
    pub height_delta: i64,
    /// Timestamp of the evaluated block.
    pub time: i64,
    /// Expected compact bits of the next target.
    pub bits: u32,
}

/// Parse a `0x`-prefixed or bare hex bits value.
fn parse_hex_bits(s: &str) -> Option<u32> {
    let trimmed = s.trim();
    let stripped = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u32::from_str_radix(stripped, 16).ok()
}

/// Load a vector run file.
///
/// Format errors carry the file path and 1-based line number.
pub fn load_run(path: &Path) -> Result<(RunHeader, Vec<RunRow>)> {
    let file = path.display().to_string();
    let contents = fs::read_to_string(path)?;

    let mut header = RunHeader::default();
    let mut rows = Vec::new();

    for (idx, raw) in contents.lines().enumerate() {
        let lineno = idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix("##") {
            parse_header_line(rest, &mut header)
                .map_err(|msg| Error::vector_format(file.as_str(), lineno, msg))?;
            continue;
        }

        if line.starts_with('#') {
            continue;
        }

        let row = parse_data_line(line, &header)
            .map_err(|msg| Error::vector_format(file.as_str(), lineno, msg))?;
        rows.push(row);
    }

    Ok((header, rows))
}

fn parse_header_line(rest: &str, header: &mut RunHeader) -> std::result::Result<(), String> {
    let lower = rest.to_lowercase();
    let value = rest.split_once(':').map(|(_, v)| v.trim()).unwrap_or("");

    if lower.contains("description:") {
        header.description = value.to_string();
    } else if lower.contains("anchor height:") {
        header.anchor_height = value
            .parse()
            .map_err(|e| format!("parse anchor height: {}", e))?;
    } else if lower.contains("anchor") && lower.contains("time") && !lower.contains("start") {
        // anchor ancestor time / anchor parent time
        header.anchor_parent_time = value
            .parse()
            .map_err(|e| format!("parse anchor parent/ancestor time: {}", e))?;
    } else if lower.contains("anchor nbits:") {
        header.anchor_bits =
            parse_hex_bits(value).ok_or_else(|| format!("parse anchor nBits: {:?}", value))?;
    } else if lower.contains("start height:") {
        header.start_height = value
            .parse()
            .map_err(|e| format!("parse start height: {}", e))?;
    } else if lower.contains("start time:") {
        header.start_time = value
            .parse()
            .map_err(|e| format!("parse start time: {}", e))?;
    } else if lower.contains("iterations:") {
        header.iterations = value
            .parse()
            .map_err(|e| format!("parse iterations: {}", e))?;
    }
    // Unknown header keys are ignored.

    Ok(())
}

fn parse_data_line(line: &str, header: &RunHeader) -> std::result::Result<RunRow, String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != 4 {
        return Err(format!("unexpected data line: {:?}", line));
    }

    let iteration: i64 = parts[0]
        .parse()
        .map_err(|e| format!("parse iteration: {}", e))?;

    let height_delta = parse_height_delta(parts[1], header.anchor_height)?;

    let time: i64 = parts[2].parse().map_err(|e| format!("parse time: {}", e))?;

    let bits = parse_hex_bits(parts[3]).ok_or_else(|| format!("parse bits: {:?}", parts[3]))?;

    Ok(RunRow {
        iteration,
        height_delta,
        time,
        bits,
    })
}

/// Heights normally parse as `i64`. Values beyond `i64::MAX` fall back to
/// unsigned parsing; only the delta against the anchor needs to fit.
fn parse_height_delta(field: &str, anchor_height: i64) -> std::result::Result<i64, String> {
    match field.parse::<i64>() {
        Ok(height) => Ok(height - anchor_height),
        Err(e) if matches!(e.kind(), IntErrorKind::PosOverflow) => {
            let height: u64 = field
                .parse()
                .map_err(|e2| format!("parse uint height: {}", e2))?;
            let anchor = u64::try_from(anchor_height)
                .map_err(|_| "negative anchor height with unsigned data height".to_string())?;
            if height < anchor {
                return Err(format!("height {} below anchor {}", height, anchor));
            }
            i64::try_from(height - anchor)
                .map_err(|_| format!("height delta too large: {}", height - anchor))
        }
        Err(e) => Err(format!("parse height: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_minimal_run() {
        let file = write_temp(
            "## description: two ideal blocks\n\
             ## anchor height: 1\n\
             ## anchor parent time: 0\n\
             ## anchor nBits: 0x1d00ffff\n\
             ## start height: 2\n\
             ## start time: 1200\n\
             ## iterations: 2\n\
             # iteration height time target\n\
             1 2 1200 0x1d00ffff\n\
             2 3 1800 0x1d00ffff\n",
        );

        let (header, rows) = load_run(file.path()).unwrap();
        assert_eq!(header.description, "two ideal blocks");
        assert_eq!(header.anchor_height, 1);
        assert_eq!(header.anchor_parent_time, 0);
        assert_eq!(header.anchor_bits, 0x1d00ffff);
        assert_eq!(header.iterations, 2);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].iteration, 1);
        assert_eq!(rows[0].height_delta, 1);
        assert_eq!(rows[1].time, 1800);
        assert_eq!(rows[1].bits, 0x1d00ffff);
    }

    #[test]
    fn test_ancestor_time_alias() {
        let file = write_temp(
            "## anchor height: 5\n\
             ## anchor ancestor time: 12345\n\
             ## anchor nBits: 0x1b0404cb\n\
             ## iterations: 0\n",
        );
        let (header, rows) = load_run(file.path()).unwrap();
        assert_eq!(header.anchor_parent_time, 12345);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_height_beyond_i64() {
        let file = write_temp(
            "## anchor height: 9223372036854775000\n\
             ## anchor parent time: 0\n\
             ## anchor nBits: 0x1d00ffff\n\
             ## iterations: 1\n\
             1 9223372036854775808 600 0x1d00ffff\n",
        );
        let (header, rows) = load_run(file.path()).unwrap();
        assert_eq!(header.anchor_height, 9_223_372_036_854_775_000);
        assert_eq!(rows[0].height_delta, 808);
    }

    #[test]
    fn test_height_delta_at_i64_boundary() {
        let file = write_temp(
            "## anchor height: 9223372036854775807\n\
             ## anchor nBits: 0x1d00ffff\n\
             ## iterations: 1\n\
             1 9223372036854775808 600 0x1d00ffff\n",
        );
        let (_, rows) = load_run(file.path()).unwrap();
        assert_eq!(rows[0].height_delta, 1);
    }

    #[test]
    fn test_height_delta_too_large_rejected() {
        let file = write_temp(
            "## anchor height: 1\n\
             ## anchor nBits: 0x1d00ffff\n\
             ## iterations: 1\n\
             1 18446744073709551615 600 0x1d00ffff\n",
        );
        let err = load_run(file.path()).unwrap_err();
        assert!(err.to_string().contains("height delta too large"));
    }

    #[test]
    fn test_malformed_data_line() {
        let file = write_temp(
            "## anchor height: 1\n\
             ## anchor nBits: 0x1d00ffff\n\
             1 2 600\n",
        );
        let err = load_run(file.path()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains(":3:"), "missing line context: {}", msg);
        assert!(msg.contains("unexpected data line"));
    }

    #[test]
    fn test_bad_bits_reports_line() {
        let file = write_temp(
            "## anchor height: 1\n\
             ## anchor nBits: zzz\n",
        );
        let err = load_run(file.path()).unwrap_err();
        assert!(err.to_string().contains(":2:"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_run(Path::new("/nonexistent/run99")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
