//! TFRecord framing used by TensorBoard event files.
//!
//! Every record in an event file is laid out as:
//!
//! ```text
//! u64      length of data (little endian)
//! u32      masked crc32c of the 8 length bytes
//! [u8; N]  data (a serialized `Event`)
//! u32      masked crc32c of data
//! ```

mod reader;
mod writer;

pub use reader::{RecordError, RecordReader};
pub use writer::RecordWriter;

const MASK_DELTA: u32 = 0xa282_ead8;

/// Size of the length prefix plus its checksum.
const HEADER_LEN: usize = 12;

/// Size of the trailing data checksum.
const FOOTER_LEN: usize = 4;

/// Masked CRC-32C as used by TFRecord files.
///
/// The raw checksum is rotated right by 15 bits and offset by a constant so
/// that checksumming data which itself contains checksums stays robust.
pub fn masked_crc32c(data: &[u8]) -> u32 {
    let crc = crc32c::crc32c(data);
    ((crc >> 15) | (crc << 17)).wrapping_add(MASK_DELTA)
}
