//! Exporting event logs to plain files.
//!
//! For every discovered run, an [`EventAccumulator`] is loaded and each
//! requested summary kind is written under `<output_dir>/<run label>/`:
//!
//! ```text
//! <output_dir>/<run label>/
//!     scalars.csv                 # scalars
//!     images/<tag>/<step>.png     # images
//! ```
//!
//! Histograms, compressed histograms and audio are listed in the tag summary
//! but not exported.

pub mod images;
pub mod scalars;

pub use images::{export_images, IMAGES_DIR};
pub use scalars::{export_scalars, SCALARS_FILE};

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::ValueEnum;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::accumulator::{
    AccumulatorOptions, EventAccumulator, TagCatalog, AUDIO, COMPRESSED_HISTOGRAMS, HISTOGRAMS,
    IMAGES, SCALARS,
};
use crate::discovery::{discover_runs, Run};
use crate::error::{ExportError, Result};
use crate::report::{ExportReport, RunReport};

/// Summary kinds that can be requested for export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SummaryKind {
    Scalars,
    Histograms,
    Images,
    Audio,
    #[value(name = "compressedHistograms")]
    CompressedHistograms,
}

impl SummaryKind {
    /// Every kind, in the order listed on the command line.
    pub const ALL: [SummaryKind; 5] = [
        SummaryKind::Scalars,
        SummaryKind::Histograms,
        SummaryKind::Images,
        SummaryKind::Audio,
        SummaryKind::CompressedHistograms,
    ];

    /// The order kinds are processed in for each run.
    pub const EXPORT_ORDER: [SummaryKind; 5] = [
        SummaryKind::Audio,
        SummaryKind::CompressedHistograms,
        SummaryKind::Histograms,
        SummaryKind::Images,
        SummaryKind::Scalars,
    ];

    /// Key of this kind in the accumulator's tag catalog.
    pub fn catalog_key(self) -> &'static str {
        match self {
            SummaryKind::Scalars => SCALARS,
            SummaryKind::Histograms => HISTOGRAMS,
            SummaryKind::Images => IMAGES,
            SummaryKind::Audio => AUDIO,
            SummaryKind::CompressedHistograms => COMPRESSED_HISTOGRAMS,
        }
    }

    /// Whether an exporter exists; the others only print a notice.
    pub fn is_supported(self) -> bool {
        matches!(self, SummaryKind::Scalars | SummaryKind::Images)
    }
}

impl fmt::Display for SummaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.catalog_key())
    }
}

/// Everything an export needs, passed explicitly to each step.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Event file, or directory searched recursively for event files.
    pub log_path: PathBuf,
    pub output_dir: PathBuf,
    pub summaries: Vec<SummaryKind>,
    /// Record a failing run in the report and continue with the next one
    /// instead of aborting.
    pub keep_going: bool,
    pub accumulator: AccumulatorOptions,
}

impl ExportConfig {
    pub fn new(log_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
            output_dir: output_dir.into(),
            summaries: SummaryKind::ALL.to_vec(),
            keep_going: false,
            accumulator: AccumulatorOptions::default(),
        }
    }

    pub fn wants(&self, kind: SummaryKind) -> bool {
        self.summaries.contains(&kind)
    }
}

/// Discover every run under `config.log_path` and export them in order.
///
/// Without `keep_going` the first failing run aborts the export and its
/// error is returned. With it, failures are recorded in the report.
pub fn export_all(config: &ExportConfig) -> Result<ExportReport> {
    let runs = discover_runs(&config.log_path)?;
    if runs.is_empty() {
        warn!(path = %config.log_path.display(), "no event files found");
    }
    warn_shared_labels(&runs);

    let mut report = ExportReport::default();
    for run in &runs {
        info!(run = %run.path.display(), label = %run.label, "exporting run");
        match export_run(run, config) {
            Ok(run_report) => report.runs.push(run_report),
            Err(e) if config.keep_going => {
                error!(run = %run.path.display(), "export failed: {e}");
                report
                    .runs
                    .push(RunReport::failed(run, &run_output_dir(config, run), &e));
            }
            Err(e) => return Err(ExportError::in_run(&run.path, e)),
        }
    }
    Ok(report)
}

/// Export one run into `<output_dir>/<run label>/`.
pub fn export_run(run: &Run, config: &ExportConfig) -> Result<RunReport> {
    let output_path = run_output_dir(config, run);
    fs::create_dir_all(&output_path).map_err(|e| ExportError::write(&output_path, e))?;

    let mut accumulator = EventAccumulator::with_options(&run.path, config.accumulator.clone());
    let started = Instant::now();
    accumulator.reload()?;
    debug!(
        run = %accumulator.path().display(),
        version = accumulator.file_version().unwrap_or("unknown"),
        elapsed = ?started.elapsed(),
        "event log loaded"
    );

    let catalog = accumulator.tags();
    print_catalog(&catalog);

    let mut report = RunReport::new(run, &output_path);
    for kind in SummaryKind::EXPORT_ORDER {
        if !config.wants(kind) || !catalog.contains(kind.catalog_key()) {
            continue;
        }

        println!(" ");
        match kind {
            SummaryKind::Scalars => println!("Exporting scalars to csv-file..."),
            _ => println!("Exporting {kind}..."),
        }
        if !kind.is_supported() {
            announce_unsupported(kind);
            report.unsupported.push(kind);
            continue;
        }

        let started = Instant::now();
        match kind {
            SummaryKind::Images => {
                let image_dir = output_path.join(IMAGES_DIR);
                println!("Image dir: {}", image_dir.display());
                report.images_written =
                    export_images(&accumulator, catalog.tags(IMAGES), &image_dir)?;
            }
            SummaryKind::Scalars => {
                let csv_path = output_path.join(SCALARS_FILE);
                println!("   CSV-path: {}", csv_path.display());
                report.scalar_rows = Some(export_scalars(
                    &accumulator,
                    catalog.tags(SCALARS),
                    &csv_path,
                )?);
            }
            SummaryKind::Audio | SummaryKind::CompressedHistograms | SummaryKind::Histograms => {}
        }
        debug!(kind = %kind, elapsed = ?started.elapsed(), "export step finished");
    }

    Ok(report)
}

fn run_output_dir(config: &ExportConfig, run: &Run) -> PathBuf {
    config.output_dir.join(&run.label)
}

fn print_catalog(catalog: &TagCatalog) {
    for (key, value) in catalog.iter() {
        println!("   {key}: {value}");
    }
}

fn announce_unsupported(kind: SummaryKind) {
    let notice = match kind {
        SummaryKind::Audio => "Audio is not yet supported!",
        SummaryKind::CompressedHistograms => "Compressed histograms are not yet supported!",
        SummaryKind::Histograms => "Histograms are not yet supported!",
        SummaryKind::Scalars | SummaryKind::Images => return,
    };
    println!("   {notice}");
}

/// Runs sharing a directory name write into the same output directory; the
/// later run's `scalars.csv` replaces the earlier one.
fn warn_shared_labels(runs: &[Run]) {
    let mut seen: HashMap<&str, &Path> = HashMap::new();
    for run in runs {
        if let Some(previous) = seen.insert(run.label.as_str(), run.path.as_path()) {
            warn!(
                label = %run.label,
                first = %previous.display(),
                second = %run.path.display(),
                "runs share an output directory, later exports overwrite earlier ones"
            );
        }
    }
}
