//! In-memory index of one TensorBoard event file.
//!
//! [`EventAccumulator`] reads the framed `Event` records of a single event
//! file and sorts every summary value into per-kind, per-tag sequences. It
//! keeps every event (no sampling) and can be reloaded to pick up records the
//! training process appended since the previous load.
//!
//! # Example
//!
//! ```no_run
//! use tbexport::accumulator::{EventAccumulator, SCALARS};
//!
//! let mut acc = EventAccumulator::new("runs/train/events.out.tfevents.1700000000.host");
//! acc.reload()?;
//! for tag in acc.tags().tags(SCALARS) {
//!     println!("{tag}: {} points", acc.scalars(tag)?.len());
//! }
//! # Ok::<(), tbexport::ExportError>(())
//! ```

mod tensor;
mod types;

pub use types::{
    AudioEvent, CatalogValue, HistogramEvent, HistogramValue, ImageEvent, ScalarEvent,
    TagCatalog, TensorEvent,
};

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use protobuf::Message;
use tracing::{debug, warn};

use crate::error::{ExportError, Result};
use crate::proto::{event, session_log::SessionStatus, summary, Event, TensorProto};
use crate::record::{RecordError, RecordReader};
use tensor::{AUDIO_PLUGIN, HISTOGRAMS_PLUGIN, IMAGES_PLUGIN, SCALARS_PLUGIN};
use types::TagSeries;

// Tag catalog keys.
pub const IMAGES: &str = "images";
pub const AUDIO: &str = "audio";
pub const HISTOGRAMS: &str = "histograms";
pub const SCALARS: &str = "scalars";
pub const COMPRESSED_HISTOGRAMS: &str = "compressedHistograms";
pub const TENSORS: &str = "tensors";
pub const GRAPH: &str = "graph";
pub const META_GRAPH: &str = "meta_graph";
pub const RUN_METADATA: &str = "run_metadata";

/// Options controlling how events are folded in.
#[derive(Debug, Clone)]
pub struct AccumulatorOptions {
    /// Discard data orphaned by a restart: when a `SessionLog::START` event at
    /// step `s` is seen, everything recorded at step `s` or later is dropped.
    pub purge_orphaned_data: bool,
}

impl Default for AccumulatorOptions {
    fn default() -> Self {
        Self {
            purge_orphaned_data: true,
        }
    }
}

/// Read access to per-tag summaries, as used by the export routines.
pub trait SummarySource {
    fn scalars(&self, tag: &str) -> Result<&[ScalarEvent]>;
    fn images(&self, tag: &str) -> Result<&[ImageEvent]>;
}

pub struct EventAccumulator {
    path: PathBuf,
    options: AccumulatorOptions,
    /// Byte offset just past the last record folded in.
    offset: u64,
    loaded: bool,
    file_version: Option<String>,
    scalars: TagSeries<ScalarEvent>,
    images: TagSeries<ImageEvent>,
    histograms: TagSeries<HistogramEvent>,
    audio: TagSeries<AudioEvent>,
    tensors: TagSeries<TensorEvent>,
    graph_count: usize,
    meta_graph_count: usize,
    run_metadata: Vec<String>,
    /// Writers attach plugin metadata only to the first value of a tag.
    plugin_by_tag: HashMap<String, String>,
}

impl EventAccumulator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_options(path, AccumulatorOptions::default())
    }

    pub fn with_options(path: impl Into<PathBuf>, options: AccumulatorOptions) -> Self {
        Self {
            path: path.into(),
            options,
            offset: 0,
            loaded: false,
            file_version: None,
            scalars: TagSeries::default(),
            images: TagSeries::default(),
            histograms: TagSeries::default(),
            audio: TagSeries::default(),
            tensors: TagSeries::default(),
            graph_count: 0,
            meta_graph_count: 0,
            run_metadata: Vec::new(),
            plugin_by_tag: HashMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The `file_version` string of the log (e.g. `brain.Event:2`), once seen.
    pub fn file_version(&self) -> Option<&str> {
        self.file_version.as_deref()
    }

    /// Fold in every complete record appended since the previous reload.
    ///
    /// A record cut short at the end of the file is left for the next reload.
    pub fn reload(&mut self) -> Result<&mut Self> {
        let file = File::open(&self.path).map_err(|source| self.read_error(source))?;
        let mut reader = BufReader::with_capacity(256 * 1024, file);
        reader
            .seek(SeekFrom::Start(self.offset))
            .map_err(|source| self.read_error(source))?;

        let mut records = RecordReader::with_offset(reader, self.offset);
        let mut count = 0usize;
        loop {
            let record_offset = records.offset();
            match records.read_record() {
                Ok(Some(data)) => {
                    let event = Event::parse_from_bytes(&data).map_err(|e| {
                        self.corrupt(format!("undecodable event at offset {record_offset}: {e}"))
                    })?;
                    self.process_event(event);
                    self.offset = records.offset();
                    count += 1;
                }
                Ok(None) => break,
                Err(RecordError::Truncated { offset }) => {
                    warn!(
                        path = %self.path.display(),
                        offset,
                        "event log ends in a partial record, leaving it for the next reload"
                    );
                    break;
                }
                Err(RecordError::Io { source, .. }) => return Err(self.read_error(source)),
                Err(e) => return Err(self.corrupt(e.to_string())),
            }
        }

        self.loaded = true;
        debug!(path = %self.path.display(), events = count, "reloaded event log");
        Ok(self)
    }

    /// Catalog of everything accumulated; empty until the first reload.
    pub fn tags(&self) -> TagCatalog {
        if !self.loaded {
            return TagCatalog::default();
        }
        let list = |tags: &[String]| CatalogValue::List(tags.to_vec());
        TagCatalog::new(vec![
            (IMAGES, list(self.images.tags())),
            (AUDIO, list(self.audio.tags())),
            (HISTOGRAMS, list(self.histograms.tags())),
            (SCALARS, list(self.scalars.tags())),
            (COMPRESSED_HISTOGRAMS, list(self.histograms.tags())),
            (TENSORS, list(self.tensors.tags())),
            (GRAPH, CatalogValue::Count(self.graph_count)),
            (META_GRAPH, CatalogValue::Count(self.meta_graph_count)),
            (RUN_METADATA, list(&self.run_metadata)),
        ])
    }

    pub fn scalars(&self, tag: &str) -> Result<&[ScalarEvent]> {
        self.scalars.get(tag).ok_or_else(|| unknown(SCALARS, tag))
    }

    pub fn images(&self, tag: &str) -> Result<&[ImageEvent]> {
        self.images.get(tag).ok_or_else(|| unknown(IMAGES, tag))
    }

    pub fn histograms(&self, tag: &str) -> Result<&[HistogramEvent]> {
        self.histograms
            .get(tag)
            .ok_or_else(|| unknown(HISTOGRAMS, tag))
    }

    pub fn audio(&self, tag: &str) -> Result<&[AudioEvent]> {
        self.audio.get(tag).ok_or_else(|| unknown(AUDIO, tag))
    }

    pub fn tensors(&self, tag: &str) -> Result<&[TensorEvent]> {
        self.tensors.get(tag).ok_or_else(|| unknown(TENSORS, tag))
    }

    fn process_event(&mut self, event: Event) {
        let wall_time = event.wall_time;
        let step = event.step;
        match event.what {
            Some(event::What::FileVersion(version)) => self.file_version = Some(version),
            Some(event::What::GraphDef(_)) => self.graph_count += 1,
            Some(event::What::MetaGraphDef(_)) => self.meta_graph_count += 1,
            Some(event::What::TaggedRunMetadata(metadata)) => {
                if !self.run_metadata.contains(&metadata.tag) {
                    self.run_metadata.push(metadata.tag);
                }
            }
            Some(event::What::SessionLog(log)) => {
                if self.options.purge_orphaned_data
                    && log.status.enum_value_or_default() == SessionStatus::START
                {
                    self.purge_from(step);
                }
            }
            Some(event::What::Summary(summary)) => {
                for value in summary.value {
                    self.process_value(wall_time, step, value);
                }
            }
            None => {}
        }
    }

    fn process_value(&mut self, wall_time: f64, step: i64, value: summary::Value) {
        let tag = if value.tag.is_empty() {
            value.node_name.clone()
        } else {
            value.tag.clone()
        };

        let plugin = value
            .metadata
            .as_ref()
            .and_then(|metadata| metadata.plugin_data.as_ref())
            .map(|plugin_data| plugin_data.plugin_name.as_str())
            .filter(|name| !name.is_empty());
        if let Some(plugin) = plugin {
            self.plugin_by_tag
                .entry(tag.clone())
                .or_insert_with(|| plugin.to_string());
        }

        match value.value {
            Some(summary::value::Value::SimpleValue(v)) => self.scalars.push(
                &tag,
                ScalarEvent {
                    wall_time,
                    step,
                    value: f64::from(v),
                },
            ),
            Some(summary::value::Value::Image(image)) => self.images.push(
                &tag,
                ImageEvent {
                    wall_time,
                    step,
                    encoded_image: image.encoded_image_string,
                    width: image.width,
                    height: image.height,
                },
            ),
            Some(summary::value::Value::Histo(histo)) => self.histograms.push(
                &tag,
                HistogramEvent {
                    wall_time,
                    step,
                    histogram: histo.into(),
                },
            ),
            Some(summary::value::Value::Audio(audio)) => self.audio.push(
                &tag,
                AudioEvent {
                    wall_time,
                    step,
                    encoded_audio: audio.encoded_audio_string,
                    content_type: audio.content_type,
                    sample_rate: audio.sample_rate,
                    length_frames: audio.length_frames,
                },
            ),
            Some(summary::value::Value::Tensor(tensor)) => {
                self.process_tensor(wall_time, step, &tag, tensor)
            }
            Some(summary::value::Value::ObsoleteOldStyleHistogram(_)) | None => {}
        }
    }

    fn process_tensor(&mut self, wall_time: f64, step: i64, tag: &str, tensor: TensorProto) {
        let plugin = self.plugin_by_tag.get(tag).cloned();
        match plugin.as_deref() {
            Some(SCALARS_PLUGIN) => {
                if let Some(value) = tensor::scalar_value(&tensor) {
                    self.scalars.push(
                        tag,
                        ScalarEvent {
                            wall_time,
                            step,
                            value,
                        },
                    );
                    return;
                }
            }
            Some(IMAGES_PLUGIN) => {
                let samples = tensor::image_samples(&tensor);
                if !samples.is_empty() {
                    for (index, sample) in samples.into_iter().enumerate() {
                        let sample_tag = match index {
                            0 => tag.to_string(),
                            n => format!("{tag}/{n}"),
                        };
                        self.images.push(
                            &sample_tag,
                            ImageEvent {
                                wall_time,
                                step,
                                encoded_image: sample.encoded.to_vec(),
                                width: sample.width,
                                height: sample.height,
                            },
                        );
                    }
                    return;
                }
            }
            Some(HISTOGRAMS_PLUGIN) => {
                if let Some(histogram) = tensor::histogram(&tensor) {
                    self.histograms.push(
                        tag,
                        HistogramEvent {
                            wall_time,
                            step,
                            histogram,
                        },
                    );
                    return;
                }
            }
            Some(AUDIO_PLUGIN) => {
                if let Some(clip) = tensor::first_audio_clip(&tensor) {
                    self.audio.push(
                        tag,
                        AudioEvent {
                            wall_time,
                            step,
                            encoded_audio: clip.to_vec(),
                            content_type: "audio/wav".to_string(),
                            sample_rate: 0.0,
                            length_frames: 0,
                        },
                    );
                    return;
                }
            }
            _ => {}
        }

        if plugin.is_some() {
            debug!(tag, plugin = ?plugin, "tensor summary not understood by its plugin");
        }
        self.tensors.push(
            tag,
            TensorEvent {
                wall_time,
                step,
                tensor,
            },
        );
    }

    fn purge_from(&mut self, step: i64) {
        let purged = self.scalars.retain_before(step)
            + self.images.retain_before(step)
            + self.histograms.retain_before(step)
            + self.audio.retain_before(step)
            + self.tensors.retain_before(step);
        if purged > 0 {
            warn!(
                path = %self.path.display(),
                step,
                purged,
                "session restarted, discarded events orphaned by the restart"
            );
        }
    }

    fn read_error(&self, source: std::io::Error) -> ExportError {
        ExportError::ReadLog {
            path: self.path.clone(),
            source,
        }
    }

    fn corrupt(&self, reason: String) -> ExportError {
        ExportError::CorruptLogFile {
            path: self.path.clone(),
            reason,
        }
    }
}

impl SummarySource for EventAccumulator {
    fn scalars(&self, tag: &str) -> Result<&[ScalarEvent]> {
        EventAccumulator::scalars(self, tag)
    }

    fn images(&self, tag: &str) -> Result<&[ImageEvent]> {
        EventAccumulator::images(self, tag)
    }
}

fn unknown(kind: &'static str, tag: &str) -> ExportError {
    ExportError::UnknownTag {
        kind,
        tag: tag.to_string(),
    }
}
