use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::{glob, Pattern};
use tracing::{info, warn};

/// Expand an input argument into the files to chop.
///
/// A file is returned as is, whatever its extension. A directory is searched
/// recursively for `*.csv` files, returned in sorted order.
pub fn csv_files(path: &Path) -> Result<Vec<PathBuf>> {
    let metadata = fs::metadata(path)
        .with_context(|| format!("failed to get file information: {}", path.display()))?;
    if !metadata.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    info!(path = %path.display(), "search CSV files from directory");

    let root = path
        .to_str()
        .with_context(|| format!("directory path is not valid UTF-8: {}", path.display()))?;
    let pattern = format!("{}/**/*.csv", Pattern::escape(root.trim_end_matches('/')));

    let mut files = Vec::new();
    for entry in glob(&pattern).with_context(|| format!("invalid search pattern {pattern}"))? {
        match entry {
            Ok(file) if file.is_file() => files.push(file),
            Ok(_) => {}
            Err(err) => warn!(path = %err.path().display(), error = %err.error(), "skip unreadable entry"),
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_is_searched_recursively_for_csv() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("nested/deeper")).unwrap();
        fs::create_dir_all(root.join("dir.csv")).unwrap();
        for name in ["b.csv", "nested/a.csv", "nested/deeper/c.csv", "notes.txt", "upper.CSV"] {
            fs::write(root.join(name), b"20240101,x\n").unwrap();
        }

        let files = csv_files(root).unwrap();

        assert_eq!(
            files,
            vec![
                root.join("b.csv"),
                root.join("nested/a.csv"),
                root.join("nested/deeper/c.csv"),
            ]
        );
    }

    #[test]
    fn file_argument_is_returned_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("data.tsv");
        fs::write(&file, b"").unwrap();

        assert_eq!(csv_files(&file).unwrap(), vec![file]);
    }

    #[test]
    fn missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(csv_files(&dir.path().join("absent")).is_err());
    }
}
