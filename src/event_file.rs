//! Writing TensorBoard event files.
//!
//! Produces files in the same format training frameworks write, which is
//! what the accumulator reads back. The free functions build the individual
//! `Event` messages.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use protobuf::{Message, MessageField};

use crate::error::{ExportError, Result};
use crate::proto::{
    session_log::SessionStatus, summary, summary_metadata, DataType, Event, HistogramProto,
    SessionLog, Summary, SummaryMetadata, TensorProto,
};
use crate::record::RecordWriter;

pub const FILE_VERSION: &str = "brain.Event:2";

pub struct EventFileWriter {
    path: PathBuf,
    writer: RecordWriter<BufWriter<File>>,
}

impl EventFileWriter {
    /// Create `dir/events.out.tfevents.<secs>.<hostname>`, creating `dir` if
    /// needed.
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|e| ExportError::write(dir, e))?;
        let filename = format!(
            "events.out.tfevents.{}.{}",
            current_unix_timestamp(),
            hostname()
        );
        Self::create_at(&dir.join(filename))
    }

    /// Create an event file at an explicit path.
    pub fn create_at(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| ExportError::write(path, e))?;
        let mut writer = Self {
            path: path.to_path_buf(),
            writer: RecordWriter::new(BufWriter::new(file)),
        };

        let mut version = Event::new();
        version.wall_time = current_wall_time();
        version.set_file_version(FILE_VERSION.to_string());
        writer.write_event(&version)?;
        Ok(writer)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_event(&mut self, event: &Event) -> Result<()> {
        let data = event.write_to_bytes().map_err(|e| {
            ExportError::write(&self.path, std::io::Error::other(e))
        })?;
        self.writer
            .write_record(&data)
            .map_err(|e| ExportError::write(&self.path, e))
    }

    /// Log a scalar stamped with the current time.
    pub fn add_scalar(&mut self, tag: &str, step: i64, value: f32) -> Result<()> {
        self.write_event(&scalar_event(current_wall_time(), step, tag, value))
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| ExportError::write(&self.path, e))
    }
}

impl Drop for EventFileWriter {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

fn summary_event(wall_time: f64, step: i64, value: summary::Value) -> Event {
    let mut summary = Summary::new();
    summary.value.push(value);

    let mut event = Event::new();
    event.wall_time = wall_time;
    event.step = step;
    event.set_summary(summary);
    event
}

fn tagged_value(tag: &str) -> summary::Value {
    let mut value = summary::Value::new();
    value.tag = tag.to_string();
    value
}

pub fn scalar_event(wall_time: f64, step: i64, tag: &str, value: f32) -> Event {
    let mut v = tagged_value(tag);
    v.set_simple_value(value);
    summary_event(wall_time, step, v)
}

pub fn image_event(
    wall_time: f64,
    step: i64,
    tag: &str,
    width: i32,
    height: i32,
    encoded: &[u8],
) -> Event {
    let mut image = summary::Image::new();
    image.width = width;
    image.height = height;
    image.colorspace = 4;
    image.encoded_image_string = encoded.to_vec();

    let mut v = tagged_value(tag);
    v.set_image(image);
    summary_event(wall_time, step, v)
}

pub fn histogram_event(wall_time: f64, step: i64, tag: &str, histo: HistogramProto) -> Event {
    let mut v = tagged_value(tag);
    v.set_histo(histo);
    summary_event(wall_time, step, v)
}

pub fn audio_event(
    wall_time: f64,
    step: i64,
    tag: &str,
    sample_rate: f32,
    encoded: &[u8],
) -> Event {
    let mut audio = summary::Audio::new();
    audio.sample_rate = sample_rate;
    audio.num_channels = 1;
    audio.encoded_audio_string = encoded.to_vec();
    audio.content_type = "audio/wav".to_string();

    let mut v = tagged_value(tag);
    v.set_audio(audio);
    summary_event(wall_time, step, v)
}

/// A rank-0 float tensor, as newer writers log scalars. Only the first value
/// of a tag normally carries the `scalars` plugin metadata.
pub fn tensor_scalar_event(
    wall_time: f64,
    step: i64,
    tag: &str,
    value: f32,
    with_metadata: bool,
) -> Event {
    let mut tensor = TensorProto::new();
    tensor.dtype = DataType::DT_FLOAT.into();
    tensor.float_val.push(value);

    let mut v = tagged_value(tag);
    if with_metadata {
        let mut plugin_data = summary_metadata::PluginData::new();
        plugin_data.plugin_name = "scalars".to_string();
        let mut metadata = SummaryMetadata::new();
        metadata.plugin_data = MessageField::some(plugin_data);
        v.metadata = MessageField::some(metadata);
    }
    v.set_tensor(tensor);
    summary_event(wall_time, step, v)
}

/// Marks a (re)start of training at `step`.
pub fn session_start_event(wall_time: f64, step: i64) -> Event {
    let mut log = SessionLog::new();
    log.status = SessionStatus::START.into();

    let mut event = Event::new();
    event.wall_time = wall_time;
    event.step = step;
    event.set_session_log(log);
    event
}

fn current_unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn current_wall_time() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|dur| dur.as_secs_f64())
        .unwrap_or(0.0)
}

fn hostname() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "localhost".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordReader;
    use tempfile::TempDir;

    #[test]
    fn test_create_names_file_like_tensorboard() {
        let dir = TempDir::new().unwrap();
        let writer = EventFileWriter::create(&dir.path().join("run1")).unwrap();
        let name = writer.path().file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("events.out.tfevents."));
        assert!(writer.path().parent().unwrap().ends_with("run1"));
    }

    #[test]
    fn test_first_record_is_file_version() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.out.tfevents.0.test");
        {
            let mut writer = EventFileWriter::create_at(&path).unwrap();
            writer.add_scalar("loss", 3, 0.5).unwrap();
        }

        let file = File::open(&path).unwrap();
        let records: Vec<Vec<u8>> = RecordReader::new(file).map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);

        let first = Event::parse_from_bytes(&records[0]).unwrap();
        assert_eq!(first.file_version(), FILE_VERSION);
        let second = Event::parse_from_bytes(&records[1]).unwrap();
        assert_eq!(second.step, 3);
        assert_eq!(second.summary().value[0].simple_value(), 0.5);
    }
}
