//! Error types for event-log export.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Debug, Error)]
pub enum ExportError {
    /// The log path given on the command line does not exist.
    #[error("log path not found: {}", path.display())]
    PathNotFound { path: PathBuf },

    #[error("failed to walk {}: {source}", root.display())]
    Discovery {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to read event log {}: {source}", path.display())]
    ReadLog {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file is not a valid event log (bad framing, checksum or protobuf).
    #[error("corrupt event log {}: {reason}", path.display())]
    CorruptLogFile { path: PathBuf, reason: String },

    #[error("no {kind} tag named '{tag}'")]
    UnknownTag { kind: &'static str, tag: String },

    /// Scalar tags of one run do not share the same number of points.
    #[error(
        "scalar tag '{tag}' has {actual} points but the first tag has {expected}; \
         rows cannot be aligned"
    )]
    TagLengthMismatch {
        tag: String,
        expected: usize,
        actual: usize,
    },

    /// A run failed while exporting without `keep_going`.
    #[error("failed to export {}", run.display())]
    Run {
        run: PathBuf,
        #[source]
        source: Box<ExportError>,
    },

    #[error("failed to write {}: {source}", path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ExportError {
    pub(crate) fn in_run(run: impl Into<PathBuf>, source: ExportError) -> Self {
        ExportError::Run {
            run: run.into(),
            source: Box::new(source),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ExportError::WriteError {
            path: path.into(),
            source,
        }
    }
}
