use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};

use crate::filename::{find_available_archive_path, get_stem, month_year};

/// Default name of the archive root inside the consolidated directory
pub const DEFAULT_ARCHIVE_DIR_NAME: &str = "#Archive";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedFile {
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Monthly archive folder: `<root>/<archive_dir_name>/<Month>_<Year>`
pub fn archive_dir(root: &Path, archive_dir_name: &str, now: &NaiveDateTime) -> PathBuf {
    root.join(archive_dir_name).join(month_year(now))
}

/// Move each file into `archive_dir`, renamed to `<stem>_<MMDDYYHHMMSS>.txt`.
///
/// The archive folder is created on demand. Stops at the first file that
/// cannot be moved.
pub fn archive_files(
    files: &[PathBuf],
    archive_dir: &Path,
    now: &NaiveDateTime,
) -> Result<Vec<ArchivedFile>> {
    fs::create_dir_all(archive_dir)
        .with_context(|| format!("Failed to create archive directory: {}", archive_dir.display()))?;

    let mut archived = Vec::with_capacity(files.len());

    for file in files {
        let stem = get_stem(file)
            .with_context(|| format!("File has no usable name: {}", file.display()))?;
        let target_path = find_available_archive_path(archive_dir, &stem, now)?;

        move_file(file, &target_path)?;

        let name = file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");
        println!("Moved {} to {}", name, target_path.display());

        archived.push(ArchivedFile {
            source: file.clone(),
            destination: target_path,
        });
    }

    Ok(archived)
}

/// Rename when possible, otherwise copy then delete the source
fn move_file(from: &Path, to: &Path) -> Result<()> {
    if let Err(rename_err) = fs::rename(from, to) {
        // rename fails across volumes
        tracing::debug!(
            "Rename of {} failed ({}), falling back to copy",
            from.display(),
            rename_err
        );

        fs::copy(from, to)
            .with_context(|| format!("Failed to copy file to {}", to.display()))?;

        fs::remove_file(from)
            .with_context(|| format!("Failed to delete source file after copy: {}", from.display()))?;
    }

    Ok(())
}
