//! Records held by the accumulator and the tag catalog it reports.

use std::collections::HashMap;
use std::fmt;

use crate::proto::HistogramProto;
use crate::proto::TensorProto;

/// One recorded point of a scalar tag.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarEvent {
    pub wall_time: f64,
    pub step: i64,
    pub value: f64,
}

/// One encoded image of an image tag.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageEvent {
    pub wall_time: f64,
    pub step: i64,
    /// Encoded bytes exactly as logged (PNG for TensorBoard writers).
    pub encoded_image: Vec<u8>,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistogramValue {
    pub min: f64,
    pub max: f64,
    pub num: f64,
    pub sum: f64,
    pub sum_squares: f64,
    /// Right edge of each bucket.
    pub bucket_limit: Vec<f64>,
    pub bucket: Vec<f64>,
}

impl From<HistogramProto> for HistogramValue {
    fn from(histo: HistogramProto) -> Self {
        Self {
            min: histo.min,
            max: histo.max,
            num: histo.num,
            sum: histo.sum,
            sum_squares: histo.sum_squares,
            bucket_limit: histo.bucket_limit,
            bucket: histo.bucket,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramEvent {
    pub wall_time: f64,
    pub step: i64,
    pub histogram: HistogramValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioEvent {
    pub wall_time: f64,
    pub step: i64,
    pub encoded_audio: Vec<u8>,
    pub content_type: String,
    /// Zero when the writer did not record it (tensor-based audio summaries).
    pub sample_rate: f32,
    pub length_frames: i64,
}

/// A tensor summary that no known plugin claimed.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorEvent {
    pub wall_time: f64,
    pub step: i64,
    pub tensor: TensorProto,
}

/// Anything recorded at a global step.
pub(crate) trait Stepped {
    fn step(&self) -> i64;
}

macro_rules! impl_stepped {
    ($($ty:ty),*) => {
        $(impl Stepped for $ty {
            fn step(&self) -> i64 {
                self.step
            }
        })*
    };
}

impl_stepped!(ScalarEvent, ImageEvent, HistogramEvent, AudioEvent, TensorEvent);

/// Per-tag event sequences, remembering the order tags were first seen.
#[derive(Debug)]
pub(crate) struct TagSeries<T> {
    order: Vec<String>,
    series: HashMap<String, Vec<T>>,
}

impl<T> Default for TagSeries<T> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            series: HashMap::new(),
        }
    }
}

impl<T: Stepped> TagSeries<T> {
    pub(crate) fn push(&mut self, tag: &str, item: T) {
        match self.series.get_mut(tag) {
            Some(items) => items.push(item),
            None => {
                self.order.push(tag.to_string());
                self.series.insert(tag.to_string(), vec![item]);
            }
        }
    }

    pub(crate) fn get(&self, tag: &str) -> Option<&[T]> {
        self.series.get(tag).map(Vec::as_slice)
    }

    pub(crate) fn tags(&self) -> &[String] {
        &self.order
    }

    /// Drop every item recorded at `step` or later. Tags stay listed even if
    /// they end up empty. Returns the number of items removed.
    pub(crate) fn retain_before(&mut self, step: i64) -> usize {
        let mut removed = 0;
        for items in self.series.values_mut() {
            let before = items.len();
            items.retain(|item| item.step() < step);
            removed += before - items.len();
        }
        removed
    }
}

/// Value of one tag-catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogValue {
    /// Tag names, in first-seen order.
    List(Vec<String>),
    Count(usize),
}

impl fmt::Display for CatalogValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogValue::List(tags) => write!(f, "{} summaries", tags.len()),
            CatalogValue::Count(n) => write!(f, "{n}"),
        }
    }
}

/// What a reloaded accumulator holds, keyed by summary kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagCatalog {
    entries: Vec<(&'static str, CatalogValue)>,
}

impl TagCatalog {
    pub(crate) fn new(entries: Vec<(&'static str, CatalogValue)>) -> Self {
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&CatalogValue> {
        self.entries
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value)
    }

    /// Tag names listed under `key`; empty for unknown keys and counts.
    pub fn tags(&self, key: &str) -> &[String] {
        match self.get(key) {
            Some(CatalogValue::List(tags)) => tags,
            _ => &[],
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &CatalogValue)> {
        self.entries.iter().map(|(name, value)| (*name, value))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
