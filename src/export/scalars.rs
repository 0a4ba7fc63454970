//! Flattening every scalar tag of a run into one CSV table.

use std::path::Path;

use tracing::warn;

use crate::accumulator::{ScalarEvent, SummarySource};
use crate::error::{ExportError, Result};

pub const SCALARS_FILE: &str = "scalars.csv";

/// Write `wall_time,step,<tag...>` rows to `dest`, one per recorded point.
///
/// Row `i` takes wall time and step from the first tag's `i`-th point and the
/// `i`-th value of every tag. All tags must hold the same number of points;
/// this is checked before `dest` is touched. An empty tag list produces a
/// header-only file. Returns the number of data rows written.
pub fn export_scalars<S>(source: &S, tags: &[String], dest: &Path) -> Result<usize>
where
    S: SummarySource + ?Sized,
{
    let series = tags
        .iter()
        .map(|tag| source.scalars(tag))
        .collect::<Result<Vec<&[ScalarEvent]>>>()?;

    let rows = series.first().map_or(0, |points| points.len());
    for (tag, points) in tags.iter().zip(&series) {
        if points.len() != rows {
            return Err(ExportError::TagLengthMismatch {
                tag: tag.clone(),
                expected: rows,
                actual: points.len(),
            });
        }
    }

    let csv_err = |e: csv::Error| ExportError::write(dest, e.into());
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(dest)
        .map_err(csv_err)?;

    let header = ["wall_time", "step"]
        .into_iter()
        .chain(tags.iter().map(String::as_str));
    writer.write_record(header).map_err(csv_err)?;

    let mut misaligned = false;
    let mut record = Vec::with_capacity(tags.len() + 2);
    for i in 0..rows {
        let anchor = &series[0][i];
        record.clear();
        record.push(format_float(anchor.wall_time));
        record.push(anchor.step.to_string());
        for (tag, points) in tags.iter().zip(&series) {
            let point = &points[i];
            if point.step != anchor.step && !misaligned {
                warn!(
                    tag = %tag,
                    row = i,
                    expected_step = anchor.step,
                    step = point.step,
                    "scalar steps differ between tags, values are paired by position"
                );
                misaligned = true;
            }
            record.push(format_float(point.value));
        }
        writer.write_record(&record).map_err(csv_err)?;
    }

    writer.flush().map_err(|e| ExportError::write(dest, e))?;
    Ok(rows)
}

/// Shortest representation that round-trips, always with a decimal point or
/// exponent (`1.0`, `0.5`, `1e-7`). Non-finite values are written as `nan`,
/// `inf` and `-inf`.
fn format_float(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value == f64::INFINITY {
        "inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{value:?}")
    }
}
