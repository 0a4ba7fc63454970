//! Decoding of plugin-tagged tensor summaries.
//!
//! Newer writers log everything as a `TensorProto` and identify the meaning
//! through the plugin name in the value's metadata:
//!
//! - `scalars`: rank-0 float/double/int tensor.
//! - `images`: string tensor `[width, height, encoded_0, encoded_1, ...]`.
//! - `histograms`: `[k, 3]` float/double tensor of `(left, right, count)`.
//! - `audio`: string tensor `[k, 2]` of `(encoded, label)`.

use crate::proto::{DataType, TensorProto};

use super::types::HistogramValue;

pub(crate) const SCALARS_PLUGIN: &str = "scalars";
pub(crate) const IMAGES_PLUGIN: &str = "images";
pub(crate) const HISTOGRAMS_PLUGIN: &str = "histograms";
pub(crate) const AUDIO_PLUGIN: &str = "audio";

pub(crate) struct ImageSample<'a> {
    pub width: i32,
    pub height: i32,
    pub encoded: &'a [u8],
}

/// First element of a numeric tensor as f64.
pub(crate) fn scalar_value(tensor: &TensorProto) -> Option<f64> {
    let content = tensor.tensor_content.as_slice();
    match tensor.dtype.enum_value_or_default() {
        DataType::DT_FLOAT => tensor
            .float_val
            .first()
            .copied()
            .or_else(|| le_chunk(content).map(f32::from_le_bytes))
            .map(f64::from),
        DataType::DT_DOUBLE => tensor
            .double_val
            .first()
            .copied()
            .or_else(|| le_chunk(content).map(f64::from_le_bytes)),
        DataType::DT_INT32 => tensor
            .int_val
            .first()
            .copied()
            .or_else(|| le_chunk(content).map(i32::from_le_bytes))
            .map(f64::from),
        DataType::DT_INT64 => tensor
            .int64_val
            .first()
            .copied()
            .or_else(|| le_chunk(content).map(i64::from_le_bytes))
            .map(|v| v as f64),
        _ => None,
    }
}

/// Encoded images of an image-plugin tensor. Malformed tensors yield nothing.
pub(crate) fn image_samples(tensor: &TensorProto) -> Vec<ImageSample<'_>> {
    let [width, height, encoded @ ..] = tensor.string_val.as_slice() else {
        return Vec::new();
    };
    let width = parse_dimension(width);
    let height = parse_dimension(height);
    encoded
        .iter()
        .map(|bytes| ImageSample {
            width,
            height,
            encoded: bytes,
        })
        .collect()
}

/// Histogram of a `[k, 3]` bucket tensor.
///
/// Sum and sum of squares are not recoverable from buckets and stay zero.
pub(crate) fn histogram(tensor: &TensorProto) -> Option<HistogramValue> {
    let values = float_values(tensor)?;
    let buckets: Vec<&[f64]> = values.chunks_exact(3).collect();

    let mut histogram = HistogramValue::default();
    if let (Some(first), Some(last)) = (buckets.first(), buckets.last()) {
        histogram.min = first[0];
        histogram.max = last[1];
    }
    for bucket in buckets {
        histogram.bucket_limit.push(bucket[1]);
        histogram.bucket.push(bucket[2]);
        histogram.num += bucket[2];
    }
    Some(histogram)
}

/// First encoded clip of an audio-plugin tensor.
pub(crate) fn first_audio_clip(tensor: &TensorProto) -> Option<&[u8]> {
    tensor.string_val.first().map(Vec::as_slice)
}

fn float_values(tensor: &TensorProto) -> Option<Vec<f64>> {
    let content = tensor.tensor_content.as_slice();
    match tensor.dtype.enum_value_or_default() {
        DataType::DT_DOUBLE if !tensor.double_val.is_empty() => Some(tensor.double_val.clone()),
        DataType::DT_DOUBLE => Some(
            content
                .chunks_exact(8)
                .filter_map(le_chunk::<8>)
                .map(f64::from_le_bytes)
                .collect(),
        ),
        DataType::DT_FLOAT if !tensor.float_val.is_empty() => {
            Some(tensor.float_val.iter().copied().map(f64::from).collect())
        }
        DataType::DT_FLOAT => Some(
            content
                .chunks_exact(4)
                .filter_map(le_chunk::<4>)
                .map(|b| f64::from(f32::from_le_bytes(b)))
                .collect(),
        ),
        _ => None,
    }
}

fn le_chunk<const N: usize>(bytes: &[u8]) -> Option<[u8; N]> {
    bytes.get(..N)?.try_into().ok()
}

fn parse_dimension(bytes: &[u8]) -> i32 {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tensor(dtype: DataType) -> TensorProto {
        let mut tensor = TensorProto::new();
        tensor.dtype = dtype.into();
        tensor
    }

    #[test]
    fn test_scalar_from_float_val() {
        let mut t = tensor(DataType::DT_FLOAT);
        t.float_val = vec![0.25];
        assert_eq!(scalar_value(&t), Some(0.25));
    }

    #[test]
    fn test_scalar_from_tensor_content() {
        let mut t = tensor(DataType::DT_DOUBLE);
        t.tensor_content = 1.5f64.to_le_bytes().to_vec();
        assert_eq!(scalar_value(&t), Some(1.5));

        let mut t = tensor(DataType::DT_INT64);
        t.tensor_content = 42i64.to_le_bytes().to_vec();
        assert_eq!(scalar_value(&t), Some(42.0));
    }

    #[test]
    fn test_scalar_unsupported_dtype() {
        let mut t = tensor(DataType::DT_STRING);
        t.string_val = vec![b"nope".to_vec()];
        assert_eq!(scalar_value(&t), None);
        assert_eq!(scalar_value(&tensor(DataType::DT_FLOAT)), None);
    }

    #[test]
    fn test_image_samples() {
        let mut t = tensor(DataType::DT_STRING);
        t.string_val = vec![
            b"4".to_vec(),
            b"2".to_vec(),
            b"png-a".to_vec(),
            b"png-b".to_vec(),
        ];
        let samples = image_samples(&t);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].width, 4);
        assert_eq!(samples[0].height, 2);
        assert_eq!(samples[1].encoded, b"png-b");
    }

    #[test]
    fn test_image_samples_malformed() {
        let mut t = tensor(DataType::DT_STRING);
        t.string_val = vec![b"4".to_vec()];
        assert!(image_samples(&t).is_empty());
    }

    #[test]
    fn test_histogram_buckets() {
        let mut t = tensor(DataType::DT_DOUBLE);
        t.double_val = vec![0.0, 1.0, 3.0, 1.0, 2.0, 5.0];
        let h = histogram(&t).unwrap();
        assert_eq!(h.min, 0.0);
        assert_eq!(h.max, 2.0);
        assert_eq!(h.num, 8.0);
        assert_eq!(h.bucket_limit, vec![1.0, 2.0]);
        assert_eq!(h.bucket, vec![3.0, 5.0]);
    }

    #[test]
    fn test_empty_histogram() {
        let h = histogram(&tensor(DataType::DT_FLOAT)).unwrap();
        assert_eq!(h, HistogramValue::default());
    }
}
