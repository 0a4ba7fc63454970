//! tbexport library - reading TensorBoard event logs and exporting them.
//!
//! # Modules
//!
//! - [`record`] - TFRecord framing used by event files
//! - [`accumulator`] - Loads an event file into per-tag series
//! - [`discovery`] - Finds the event files under a log directory
//! - [`export`] - Writes scalars to CSV and images to PNG files
//! - [`event_file`] - Writes event files, mainly for fixtures
//!
//! # Example
//!
//! ```no_run
//! use tbexport::{export_all, ExportConfig, SummaryKind};
//!
//! let mut config = ExportConfig::new("./logs", "./exported");
//! config.summaries = vec![SummaryKind::Scalars];
//! let report = export_all(&config).expect("export failed");
//! println!("{} runs exported", report.runs.len());
//! ```

pub mod accumulator;
pub mod discovery;
pub mod error;
pub mod event_file;
pub mod export;
#[allow(clippy::all)]
pub mod proto;
pub mod record;
pub mod report;

pub use accumulator::{AccumulatorOptions, EventAccumulator, SummarySource};
pub use discovery::{discover_runs, Run};
pub use error::{ExportError, Result};
pub use event_file::EventFileWriter;
pub use export::{export_all, export_run, ExportConfig, SummaryKind};
pub use report::{ExportReport, RunReport, RunStatus};
