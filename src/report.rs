use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::counter::read_counter_file;
use crate::filename::report_file_name;

/// Header written once, when a monthly report is first created
pub const HEADER: [&str; 3] = ["File Name", "Date", "Total Estimated Coin"];

/// Per-file sums for one run; printed, never persisted
pub type Summary = BTreeMap<String, i128>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsolidatedRow {
    pub file_name: String,
    pub date: NaiveDate,
    pub count: i128,
}

impl ConsolidatedRow {
    fn to_record(&self) -> [String; 3] {
        [
            self.file_name.clone(),
            self.date.format("%Y-%m-%d").to_string(),
            self.count.to_string(),
        ]
    }
}

#[derive(Debug, Default)]
pub struct Consolidation {
    pub report_path: PathBuf,
    pub rows: Vec<ConsolidatedRow>,
    pub summary: Summary,
    /// Sum of every row written this run
    pub total: i128,
    /// Files with fewer than two lines
    pub skipped: Vec<PathBuf>,
}

/// Parse every counter file and append one row per valid file to the
/// monthly report in `dir`.
///
/// All files are parsed before anything is written, so a bad count or
/// timestamp, or totals that overflow, leave the report untouched.
pub fn consolidate(dir: &Path, files: &[PathBuf], now: &NaiveDateTime) -> Result<Consolidation> {
    let today = now.date();
    let mut consolidation = Consolidation {
        report_path: dir.join(report_file_name(now)),
        ..Default::default()
    };

    for file in files {
        match read_counter_file(file)? {
            Some(counter) => {
                let overflow = || anyhow!("Count total overflows at {}", file.display());
                let entry = consolidation.summary.entry(counter.name.clone()).or_insert(0);
                *entry = entry.checked_add(counter.total).ok_or_else(overflow)?;
                consolidation.total = consolidation
                    .total
                    .checked_add(counter.total)
                    .ok_or_else(overflow)?;
                consolidation.rows.push(ConsolidatedRow {
                    file_name: counter.name,
                    date: today,
                    count: counter.total,
                });
            }
            None => {
                tracing::debug!("Skipping {}: fewer than two lines", file.display());
                consolidation.skipped.push(file.clone());
            }
        }
    }

    append_rows(&consolidation.report_path, &consolidation.rows)?;

    println!(
        "Consolidated data has been written to {}",
        report_file_name(now)
    );

    Ok(consolidation)
}

/// Append rows to a CSV report, writing the header only when the file is new
pub fn append_rows(path: &Path, rows: &[ConsolidatedRow]) -> Result<()> {
    let write_header = !path.exists();

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open report {}", path.display()))?;

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(file);

    if write_header {
        writer
            .write_record(HEADER)
            .with_context(|| format!("Failed to write header to {}", path.display()))?;
    }

    for row in rows {
        writer
            .write_record(row.to_record())
            .with_context(|| format!("Failed to append row to {}", path.display()))?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to flush report {}", path.display()))?;

    tracing::debug!("Appended {} rows to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sample_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 20)
            .unwrap()
            .and_hms_opt(18, 30, 0)
            .unwrap()
    }

    fn read_records(path: &Path) -> Vec<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .unwrap();
        reader
            .records()
            .map(|r| r.unwrap().iter().map(|f| f.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_single_file_produces_row() {
        let dir = TempDir::new().unwrap();
        let x = dir.path().join("X.txt");
        fs::write(&x, "5\n2024-01-01T00:00:00").unwrap();

        let result = consolidate(dir.path(), &[x], &sample_now()).unwrap();

        assert_eq!(result.report_path, dir.path().join("January_2024.csv"));
        assert_eq!(
            result.rows,
            vec![ConsolidatedRow {
                file_name: "X".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 1, 20).unwrap(),
                count: 5,
            }]
        );
        assert_eq!(result.summary.get("X"), Some(&5));

        let records = read_records(&result.report_path);
        assert_eq!(
            records,
            vec![
                vec!["File Name", "Date", "Total Estimated Coin"],
                vec!["X", "2024-01-20", "5"],
            ]
        );
    }

    #[test]
    fn test_summary_matches_written_counts() {
        let dir = TempDir::new().unwrap();
        let mut files = Vec::new();
        for (name, count) in [("A", 3i128), ("B", 0), ("C", 1200), ("D", -20)] {
            let path = dir.path().join(format!("{}.txt", name));
            fs::write(&path, format!("{}\n2024-01-10T12:00:00\n", count)).unwrap();
            files.push(path);
        }

        let result = consolidate(dir.path(), &files, &sample_now()).unwrap();

        for row in &result.rows {
            assert_eq!(result.summary.get(&row.file_name), Some(&row.count));
        }
        assert_eq!(result.total, 1183);
    }

    #[test]
    fn test_large_counts_do_not_wrap() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("A.txt");
        let b = dir.path().join("B.txt");
        fs::write(&a, "18446744073709551615\n2024-01-01T00:00:00").unwrap();
        fs::write(&b, "18446744073709551614\n2024-01-01T00:00:00").unwrap();

        let result = consolidate(dir.path(), &[a, b], &sample_now()).unwrap();

        assert_eq!(result.total, 2 * (u64::MAX as i128) - 1);
        let records = read_records(&result.report_path);
        assert_eq!(records[1], vec!["A", "2024-01-20", "18446744073709551615"]);
    }

    #[test]
    fn test_overflowing_total_aborts_before_writing() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("A.txt");
        let b = dir.path().join("B.txt");
        fs::write(&a, format!("{}\n2024-01-01T00:00:00", i128::MAX)).unwrap();
        fs::write(&b, "1\n2024-01-01T00:00:00").unwrap();

        let err = consolidate(dir.path(), &[a, b], &sample_now()).unwrap_err();

        assert!(err.to_string().contains("overflows"));
        assert!(!dir.path().join("January_2024.csv").exists());
    }

    #[test]
    fn test_second_run_appends_without_header() {
        let dir = TempDir::new().unwrap();
        let x = dir.path().join("X.txt");
        fs::write(&x, "5\n2024-01-01T00:00:00").unwrap();

        consolidate(dir.path(), &[x.clone()], &sample_now()).unwrap();
        fs::write(&x, "8\n2024-01-02T00:00:00").unwrap();
        let result = consolidate(dir.path(), &[x], &sample_now()).unwrap();

        let records = read_records(&result.report_path);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], vec!["File Name", "Date", "Total Estimated Coin"]);
        assert_eq!(records[1], vec!["X", "2024-01-20", "5"]);
        assert_eq!(records[2], vec!["X", "2024-01-20", "8"]);

        let raw = fs::read_to_string(&result.report_path).unwrap();
        assert_eq!(raw.matches("File Name").count(), 1);
        assert!(raw.ends_with("\r\n"));
    }

    #[test]
    fn test_one_line_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let short = dir.path().join("Short.txt");
        fs::write(&short, "5\n").unwrap();

        let result = consolidate(dir.path(), &[short.clone()], &sample_now()).unwrap();

        assert!(result.rows.is_empty());
        assert!(result.summary.is_empty());
        assert_eq!(result.skipped, vec![short]);
        // The report still gets its header
        assert_eq!(read_records(&result.report_path).len(), 1);
    }

    #[test]
    fn test_bad_file_aborts_before_writing() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("A.txt");
        let bad = dir.path().join("B.txt");
        fs::write(&good, "5\n2024-01-01T00:00:00").unwrap();
        fs::write(&bad, "lots\n2024-01-01T00:00:00").unwrap();

        let err = consolidate(dir.path(), &[good, bad], &sample_now()).unwrap_err();

        assert!(format!("{:#}", err).contains("invalid count"));
        assert!(!dir.path().join("January_2024.csv").exists());
    }
}
