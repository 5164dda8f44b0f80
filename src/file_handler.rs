use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::SieveError;

/// All regular `.stream` files in the directory, sorted by name so worker
/// launch order is deterministic.
pub fn stream_files(dir: &Path) -> Result<Vec<PathBuf>, SieveError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(SieveError::Io)? {
        let entry = entry.map_err(SieveError::Io)?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "stream") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Delete `best_results*.stream` leftovers from a previous run so they are
/// neither reprocessed nor mistaken for fresh output.
pub fn remove_stale_best_results(dir: &Path) -> Result<usize, SieveError> {
    let mut removed = 0;
    for entry in fs::read_dir(dir).map_err(SieveError::Io)? {
        let entry = entry.map_err(SieveError::Io)?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if name.starts_with("best_results") && name.ends_with(".stream") && path.is_file() {
            fs::remove_file(&path).map_err(SieveError::Io)?;
            info!(file = name, "removed stale best-results file");
            removed += 1;
        }
    }
    Ok(removed)
}

/// First file in the directory with the given extension (no leading dot), or
/// `None`. Names are compared sorted, so "first" is deterministic.
pub fn first_file_with_extension(
    dir: &Path,
    extension: &str,
) -> Result<Option<PathBuf>, SieveError> {
    let mut matches = Vec::new();
    for entry in fs::read_dir(dir).map_err(SieveError::Io)? {
        let entry = entry.map_err(SieveError::Io)?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
            matches.push(path);
        }
    }
    matches.sort();
    Ok(matches.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_files_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.stream"), "").unwrap();
        fs::write(dir.path().join("a.stream"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let files = stream_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect();
        assert_eq!(names, vec!["a.stream", "b.stream"]);
    }

    #[test]
    fn test_remove_stale_best_results() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("best_results_IQM_1.stream"), "").unwrap();
        fs::write(dir.path().join("best_results.stream"), "").unwrap();
        fs::write(dir.path().join("run1.stream"), "").unwrap();
        fs::write(dir.path().join("best_results.csv"), "").unwrap();

        let removed = remove_stale_best_results(dir.path()).unwrap();
        assert_eq!(removed, 2);

        let remaining = stream_files(dir.path()).unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(remaining[0].ends_with("run1.stream"));
    }

    #[test]
    fn test_first_file_with_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("z.cell"), "").unwrap();
        fs::write(dir.path().join("a.cell"), "").unwrap();
        fs::write(dir.path().join("a.stream"), "").unwrap();

        let first = first_file_with_extension(dir.path(), "cell").unwrap().unwrap();
        assert!(first.ends_with("a.cell"));
        assert!(first_file_with_extension(dir.path(), "geom").unwrap().is_none());
    }
}
