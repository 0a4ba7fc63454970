//! Locating the event files to export.

use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{ExportError, Result};

/// File name prefix every TensorBoard event file carries.
pub const EVENT_FILE_PREFIX: &str = "events.out.tfevents.";

/// Label used when an event file has no parent directory name.
const ROOT_LABEL: &str = "root";

/// A single event file and the label its exports are grouped under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub path: PathBuf,
    /// Name of the directory holding the event file.
    pub label: String,
}

impl Run {
    pub fn new(path: PathBuf) -> Self {
        let label = path
            .parent()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| ROOT_LABEL.to_string());
        Self { path, label }
    }
}

pub fn is_event_file(name: &str) -> bool {
    name.starts_with(EVENT_FILE_PREFIX)
}

/// Resolve `log` into the runs to export.
///
/// A file is taken as is, whatever its name. A directory is searched
/// recursively for event files; the result is sorted by path.
pub fn discover_runs(log: &Path) -> Result<Vec<Run>> {
    let root = log.canonicalize().map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ExportError::PathNotFound {
            path: log.to_path_buf(),
        },
        _ => ExportError::ReadLog {
            path: log.to_path_buf(),
            source,
        },
    })?;

    if !root.is_dir() {
        return Ok(vec![Run::new(root)]);
    }

    let mut runs = Vec::new();
    for entry in WalkDir::new(&root).follow_links(true) {
        let entry = entry.map_err(|source| ExportError::Discovery {
            root: root.clone(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry.file_name().to_str().is_some_and(is_event_file);
        if matches {
            runs.push(Run::new(entry.into_path()));
        }
    }
    runs.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_single_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run1").join("anything.log");
        touch(&path);

        let runs = discover_runs(&path).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].label, "run1");
        assert_eq!(runs[0].path, path.canonicalize().unwrap());
    }

    #[test]
    fn test_recursive_directory() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(&root.join("b/events.out.tfevents.2.host"));
        touch(&root.join("a/events.out.tfevents.1.host"));
        touch(&root.join("a/nested/deeper/events.out.tfevents.3.host"));
        touch(&root.join("a/checkpoint"));
        touch(&root.join("a/events.out.tfevents"));
        fs::create_dir_all(root.join("c/events.out.tfevents.dir")).unwrap();

        let runs = discover_runs(root).unwrap();
        let labels: Vec<&str> = runs.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["a", "deeper", "b"]);
        assert!(runs.iter().all(|r| r.path.is_absolute()));
    }

    #[test]
    fn test_directory_without_event_files() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("notes.txt"));
        assert!(discover_runs(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_path() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");
        assert!(matches!(
            discover_runs(&missing),
            Err(ExportError::PathNotFound { .. })
        ));
    }

    #[test]
    fn test_root_label() {
        let run = Run::new(PathBuf::from("/"));
        assert_eq!(run.label, ROOT_LABEL);
    }
}
