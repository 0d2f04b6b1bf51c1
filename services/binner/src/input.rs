//! JSON-lines observation input.
//!
//! One observation per line: `{"lat": 12.5, "lon": -40.1, "values": [0.21]}`.
//! Blank lines and lines starting with `#` are ignored. An optional header
//! line `{"scene_time": "2024-01-01T10:30:00Z"}` before the first observation
//! dates the scene; without it the time is taken from the file name.

use anyhow::{Context, Result};
use binning_common::Observation;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::warn;

/// Observations read from one input file.
#[derive(Debug, Clone, Default)]
pub struct InputFile {
    pub observations: Vec<Observation>,
    /// Lines that did not parse as an observation.
    pub malformed: usize,
    /// Scene start time, if known.
    pub scene_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SceneHeader {
    scene_time: DateTime<Utc>,
}

/// Scene start time encoded in a Level-2 file name.
///
/// Understands `AQUA_MODIS.20240101T103000.L2.OC.nc` style names and the
/// older `A2024001103000.L2_LAC_OC` form (sensor letter, year, day of year,
/// time of day).
pub fn scene_time_from_name(name: &str) -> Option<DateTime<Utc>> {
    for token in name.split(|c: char| c == '.' || c == '_') {
        if let Ok(time) = NaiveDateTime::parse_from_str(token, "%Y%m%dT%H%M%S") {
            return Some(time.and_utc());
        }
    }

    if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let digits = name.get(1..14)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let number = |range: std::ops::Range<usize>| digits[range].parse::<u32>().ok();
    let date = NaiveDate::from_yo_opt(i32::try_from(number(0..4)?).ok()?, number(4..7)?)?;
    let time = NaiveTime::from_hms_opt(number(7..9)?, number(9..11)?, number(11..13)?)?;
    Some(date.and_time(time).and_utc())
}

/// Parse observations from any line-oriented reader.
pub fn parse_observations<R: BufRead>(reader: R, source: &str) -> Result<InputFile> {
    let mut input = InputFile::default();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {} of {}", line_no + 1, source))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        match serde_json::from_str::<Observation>(trimmed) {
            Ok(obs) => input.observations.push(obs),
            Err(e) => {
                if input.observations.is_empty() && input.scene_time.is_none() {
                    if let Ok(header) = serde_json::from_str::<SceneHeader>(trimmed) {
                        input.scene_time = Some(header.scene_time);
                        continue;
                    }
                }
                warn!(source = %source, line = line_no + 1, error = %e, "Skipping malformed observation line");
                input.malformed += 1;
            }
        }
    }

    Ok(input)
}

/// Read one JSON-lines observation file.
pub fn read_observations<P: AsRef<Path>>(path: P) -> Result<InputFile> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open input {:?}", path))?;
    let mut input = parse_observations(BufReader::new(file), &path.display().to_string())?;
    if input.scene_time.is_none() {
        input.scene_time = path
            .file_name()
            .and_then(|name| scene_time_from_name(&name.to_string_lossy()));
    }
    Ok(input)
}
