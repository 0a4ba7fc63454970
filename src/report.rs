//! Machine-readable summary of an export, written with `--report`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::discovery::Run;
use crate::error::{ExportError, Result};
use crate::export::SummaryKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Ok,
    Failed,
}

/// Outcome of exporting one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run: PathBuf,
    pub label: String,
    pub output_dir: PathBuf,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Data rows in `scalars.csv`, when scalars were exported.
    pub scalar_rows: Option<usize>,
    pub images_written: usize,
    /// Requested kinds that were skipped because no exporter exists.
    pub unsupported: Vec<SummaryKind>,
}

impl RunReport {
    pub fn new(run: &Run, output_dir: &Path) -> Self {
        Self {
            run: run.path.clone(),
            label: run.label.clone(),
            output_dir: output_dir.to_path_buf(),
            status: RunStatus::Ok,
            error: None,
            scalar_rows: None,
            images_written: 0,
            unsupported: Vec::new(),
        }
    }

    pub fn failed(run: &Run, output_dir: &Path, error: &ExportError) -> Self {
        Self {
            status: RunStatus::Failed,
            error: Some(error.to_string()),
            ..Self::new(run, output_dir)
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportReport {
    pub runs: Vec<RunReport>,
}

impl ExportReport {
    pub fn failed(&self) -> impl Iterator<Item = &RunReport> {
        self.runs.iter().filter(|r| r.status == RunStatus::Failed)
    }

    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| ExportError::write(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| ExportError::write(path, e.into()))?;
        writer.flush().map_err(|e| ExportError::write(path, e))
    }
}
