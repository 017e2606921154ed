use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::filename::COUNTER_EXTENSION;

/// List the counter files directly inside `dir`, sorted by file name.
///
/// Only regular files whose name ends in `.txt` (case-sensitive) are
/// returned; subdirectories such as the archive are never descended into.
pub fn list_text_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("Not a directory: {}", dir.display());
    }

    let suffix = format!(".{}", COUNTER_EXTENSION);
    let mut files = Vec::new();

    for entry_result in WalkDir::new(dir)
        .max_depth(1)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
    {
        let entry = match entry_result {
            Ok(e) => e,
            Err(err) => {
                if let Some(path) = err.path() {
                    tracing::warn!("Failed to access {}: {}", path.display(), err);
                } else {
                    tracing::warn!("WalkDir error: {}", err);
                }
                continue;
            }
        };

        let path = entry.path();

        // Follows symlinks, same as a plain metadata check
        if !path.is_file() {
            continue;
        }

        let filename = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => {
                tracing::warn!("Skipping non UTF-8 file name: {}", path.display());
                continue;
            }
        };

        if !filename.ends_with(&suffix) {
            continue;
        }

        files.push(path.to_path_buf());
    }

    tracing::debug!("Found {} counter files in {}", files.len(), dir.display());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_lists_only_top_level_txt_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.txt"), "1\n2024-01-01").unwrap();
        fs::write(dir.path().join("a.txt"), "1\n2024-01-01").unwrap();
        fs::write(dir.path().join("notes.TXT"), "ignored").unwrap();
        fs::write(dir.path().join("January_2024.csv"), "ignored").unwrap();
        fs::create_dir_all(dir.path().join("#Archive").join("January_2024")).unwrap();
        fs::write(
            dir.path().join("#Archive").join("January_2024").join("c_010124000000.txt"),
            "1\n2024-01-01",
        )
        .unwrap();
        fs::create_dir(dir.path().join("folder.txt")).unwrap();

        let files = list_text_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();

        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_empty_directory() {
        let dir = TempDir::new().unwrap();
        assert!(list_text_files(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(list_text_files(&dir.path().join("missing")).is_err());
    }
}
