use anyhow::Result;
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};

/// Extension shared by counter files and their archived copies
pub const COUNTER_EXTENSION: &str = "txt";

/// Format the month bucket used for both the report and the archive folder,
/// e.g. `January_2024`
pub fn month_year(now: &NaiveDateTime) -> String {
    now.format("%B_%Y").to_string()
}

/// Name of the monthly CSV report
pub fn report_file_name(now: &NaiveDateTime) -> String {
    format!("{}.csv", month_year(now))
}

/// Compact archive timestamp as MMDDYYHHMMSS
fn format_stamp(now: &NaiveDateTime) -> String {
    now.format("%m%d%y%H%M%S").to_string()
}

/// Generate the archived name for a counter file: `<stem>_<MMDDYYHHMMSS>.txt`
pub fn archive_file_name(stem: &str, now: &NaiveDateTime) -> String {
    format!("{}_{}.{}", stem, format_stamp(now), COUNTER_EXTENSION)
}

/// Same as `archive_file_name` with a `-N` collision counter before the extension
fn archive_file_name_with_counter(stem: &str, now: &NaiveDateTime, counter: u32) -> String {
    format!(
        "{}_{}-{}.{}",
        stem,
        format_stamp(now),
        counter,
        COUNTER_EXTENSION
    )
}

/// Get the file stem from a path
pub fn get_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}

/// Find the first archive path in `archive_dir` that is not already taken
pub fn find_available_archive_path(
    archive_dir: &Path,
    stem: &str,
    now: &NaiveDateTime,
) -> Result<PathBuf> {
    let base_path = archive_dir.join(archive_file_name(stem, now));
    if !base_path.exists() {
        return Ok(base_path);
    }

    // Same stem archived within the same second, add counter to make unique
    for counter in 1..10000 {
        let path = archive_dir.join(archive_file_name_with_counter(stem, now, counter));
        if !path.exists() {
            return Ok(path);
        }
    }

    anyhow::bail!("Too many archive name collisions for {}", stem);
}
