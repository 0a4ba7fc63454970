//! tbexport: export TensorBoard event logs to CSV and PNG files.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tbexport::{export_all, AccumulatorOptions, ExportConfig, SummaryKind};

#[derive(Debug, Parser)]
#[command(name = "tbexport")]
#[command(about = "Export TensorBoard event logs (scalars to CSV, images to PNG)")]
#[command(version)]
struct Command {
    /// Event file, or directory searched recursively for event files
    log: PathBuf,

    /// Directory the exports are written to
    out: PathBuf,

    /// Summary kinds to export
    #[arg(
        short = 's',
        long = "summaries",
        value_enum,
        num_args = 0..,
        default_values_t = SummaryKind::ALL
    )]
    summaries: Vec<SummaryKind>,

    /// Record failing runs and continue with the rest
    #[arg(long)]
    keep_going: bool,

    /// Keep events logged before a training restart
    #[arg(long)]
    keep_orphaned: bool,

    /// Write a JSON report of the export to PATH
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let opts = Command::parse();
    init_logging(opts.verbose);

    let config = ExportConfig {
        log_path: opts.log,
        output_dir: opts.out,
        summaries: opts.summaries,
        keep_going: opts.keep_going,
        accumulator: AccumulatorOptions {
            purge_orphaned_data: !opts.keep_orphaned,
        },
    };

    let report = export_all(&config)?;

    if let Some(path) = &opts.report {
        report
            .write_json(path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
    }

    if !report.is_success() {
        let failed: Vec<_> = report.failed().collect();
        eprintln!("\n{} of {} runs failed:", failed.len(), report.runs.len());
        for run in &failed {
            eprintln!(
                "  {}: {}",
                run.run.display(),
                run.error.as_deref().unwrap_or("unknown error")
            );
        }
        bail!("{} runs failed to export", failed.len());
    }

    Ok(())
}
