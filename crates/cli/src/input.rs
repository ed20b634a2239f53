//! Measurement file loading
//!
//! Accepts a JSON array of measurements, or a CSV export with the header
//! `timestamp,total_marker,free_marker` (free marker column may be blank).

use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use trend_lib::RawMeasurement;

const CSV_HEADER: [&str; 3] = ["timestamp", "total_marker", "free_marker"];

/// Load a measurement file, choosing the parser by extension
pub fn load_measurements(path: &Path) -> Result<Vec<RawMeasurement>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    if is_csv {
        parse_csv(BufReader::new(file))
            .with_context(|| format!("Failed to parse CSV file {}", path.display()))
    } else {
        parse_json(file).with_context(|| format!("Failed to parse JSON file {}", path.display()))
    }
}

fn parse_json<R: Read>(reader: R) -> Result<Vec<RawMeasurement>> {
    Ok(serde_json::from_reader(reader)?)
}

/// Parse CSV rows; values are left unvalidated for the engine to check
pub fn parse_csv<R: BufRead>(reader: R) -> Result<Vec<RawMeasurement>> {
    let mut lines = reader.lines().enumerate();
    let mut measurements = Vec::new();

    match lines.next() {
        Some((_, header)) => {
            let header = header?;
            let columns: Vec<&str> = header.split(',').map(str::trim).collect();
            let expected_len = if columns.len() == 2 { 2 } else { 3 };
            if columns[..] != CSV_HEADER[..expected_len] {
                bail!(
                    "Unexpected CSV header '{}', expected '{}'",
                    header.trim(),
                    CSV_HEADER.join(",")
                );
            }
        }
        None => return Ok(measurements),
    }

    for (line_idx, line) in lines {
        let line = line?;
        let line_num = line_idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = trimmed.split(',').map(str::trim).collect();
        if fields.len() < 2 || fields.len() > 3 {
            bail!(
                "Line {}: expected 2 or 3 fields, got {}",
                line_num,
                fields.len()
            );
        }

        let total_marker: f64 = fields[1]
            .parse()
            .with_context(|| format!("Line {}: invalid total_marker '{}'", line_num, fields[1]))?;

        let free_marker = match fields.get(2) {
            Some(value) if !value.is_empty() => Some(value.parse::<f64>().with_context(|| {
                format!("Line {}: invalid free_marker '{}'", line_num, value)
            })?),
            _ => None,
        };

        measurements.push(RawMeasurement {
            timestamp: fields[0].to_string(),
            total_marker,
            free_marker,
        });
    }

    Ok(measurements)
}
