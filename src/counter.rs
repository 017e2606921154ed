use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::filename::get_stem;

/// Accepted ISO-8601 layouts without a UTC offset, most specific first
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Accepted ISO-8601 layouts carrying a `+HH:MM` or `+HHMM` offset
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M%z",
];

#[derive(Debug, Error)]
pub enum CounterError {
    #[error("failed to read counter file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid count {value:?} in {}", .path.display())]
    InvalidCount {
        path: PathBuf,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("invalid ISO-8601 timestamp {value:?} in {}", .path.display())]
    InvalidTimestamp { path: PathBuf, value: String },
}

/// A parsed counter file: line 1 is the running total, line 2 the time it was last updated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterFile {
    pub name: String,
    pub total: i128,
    pub last_update: NaiveDateTime,
}

/// Read a counter file.
///
/// Returns `Ok(None)` for files with fewer than two lines; those are not
/// counter files and get skipped. A bad count or timestamp is an error.
pub fn read_counter_file(path: &Path) -> Result<Option<CounterFile>, CounterError> {
    let content = fs::read_to_string(path).map_err(|source| CounterError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_counter(path, &content)
}

fn parse_counter(path: &Path, content: &str) -> Result<Option<CounterFile>, CounterError> {
    let mut lines = content.lines();
    let (count_line, time_line) = match (lines.next(), lines.next()) {
        (Some(count), Some(time)) => (count.trim(), time.trim()),
        _ => return Ok(None),
    };

    let total = count_line
        .parse::<i128>()
        .map_err(|source| CounterError::InvalidCount {
            path: path.to_path_buf(),
            value: count_line.to_string(),
            source,
        })?;

    let last_update =
        parse_iso_timestamp(time_line).ok_or_else(|| CounterError::InvalidTimestamp {
            path: path.to_path_buf(),
            value: time_line.to_string(),
        })?;

    let name = get_stem(path).unwrap_or_default();

    Ok(Some(CounterFile {
        name,
        total,
        last_update,
    }))
}

/// Parse an ISO-8601 date or date-time.
///
/// Offset-aware values are reduced to their local wall-clock time.
pub fn parse_iso_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = normalize_iso(s.trim());
    let s = s.as_str();

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Some(dt.naive_local());
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive);
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Rewrite the ISO shorthands chrono has no format for
fn normalize_iso(s: &str) -> String {
    // `Z` is shorthand for a zero offset
    if let Some(rest) = s.strip_suffix(|c: char| c == 'Z' || c == 'z') {
        return format!("{}+00:00", rest);
    }

    // Hour-only time, `YYYY-MM-DDTHH`
    let bytes = s.as_bytes();
    if bytes.len() == 13
        && matches!(bytes[10], b'T' | b' ')
        && bytes[11..].iter().all(u8::is_ascii_digit)
    {
        return format!("{}:00", s);
    }

    s.to_string()
}
