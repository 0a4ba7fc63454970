use std::io::{self, Read};

use thiserror::Error;

use super::{masked_crc32c, FOOTER_LEN, HEADER_LEN};

/// Errors produced while reading framed records.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("I/O error at offset {offset}: {source}")]
    Io {
        offset: u64,
        #[source]
        source: io::Error,
    },
    /// The file ends in the middle of a record. Usually the writer is still
    /// appending to it.
    #[error("record at offset {offset} is truncated")]
    Truncated { offset: u64 },
    #[error("length checksum mismatch for record at offset {offset}")]
    LengthCrcMismatch { offset: u64 },
    #[error("data checksum mismatch for record at offset {offset}")]
    DataCrcMismatch { offset: u64 },
    #[error("record at offset {offset} claims {length} bytes, too large for this platform")]
    TooLarge { offset: u64, length: u64 },
}

/// Streams records out of a TFRecord file.
///
/// The reader tracks the byte offset just past the last complete record so
/// that a caller can resume from there once more data has been appended.
/// After an error the iterator is fused and yields `None`.
pub struct RecordReader<R> {
    reader: R,
    offset: u64,
    buffer: Vec<u8>,
    failed: bool,
}

impl<R: Read> RecordReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_offset(reader, 0)
    }

    /// Create a reader for a stream that is already positioned at `offset`.
    pub fn with_offset(reader: R, offset: u64) -> Self {
        Self {
            reader,
            offset,
            buffer: Vec::with_capacity(64 * 1024),
            failed: false,
        }
    }

    /// Offset just past the last complete record read.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Read the next record, returning `Ok(None)` on a clean end of stream.
    pub fn read_record(&mut self) -> Result<Option<Vec<u8>>, RecordError> {
        let start = self.offset;
        let io_err = |source| RecordError::Io {
            offset: start,
            source,
        };

        let mut header = [0u8; HEADER_LEN];
        match read_full(&mut self.reader, &mut header).map_err(io_err)? {
            0 => return Ok(None),
            n if n < HEADER_LEN => return Err(RecordError::Truncated { offset: start }),
            _ => {}
        }

        let mut len_bytes = [0u8; 8];
        len_bytes.copy_from_slice(&header[..8]);
        let mut len_crc = [0u8; 4];
        len_crc.copy_from_slice(&header[8..]);
        if masked_crc32c(&len_bytes) != u32::from_le_bytes(len_crc) {
            return Err(RecordError::LengthCrcMismatch { offset: start });
        }

        let length = u64::from_le_bytes(len_bytes);
        let too_large = || RecordError::TooLarge {
            offset: start,
            length,
        };
        let data_len = usize::try_from(length).map_err(|_| too_large())?;
        let body_len = length
            .checked_add(FOOTER_LEN as u64)
            .ok_or_else(too_large)?;

        // The length is only as trustworthy as the file; grow the buffer as
        // bytes actually arrive.
        self.buffer.clear();
        let read = (&mut self.reader)
            .take(body_len)
            .read_to_end(&mut self.buffer)
            .map_err(io_err)?;
        if (read as u64) < body_len {
            return Err(RecordError::Truncated { offset: start });
        }

        let (data, footer) = self.buffer.split_at(data_len);
        let mut data_crc = [0u8; 4];
        data_crc.copy_from_slice(footer);
        if masked_crc32c(data) != u32::from_le_bytes(data_crc) {
            return Err(RecordError::DataCrcMismatch { offset: start });
        }

        self.offset += (HEADER_LEN + data_len + FOOTER_LEN) as u64;
        Ok(Some(data.to_vec()))
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Vec<u8>, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let result = self.read_record().transpose();
        if matches!(result, Some(Err(_))) {
            self.failed = true;
        }
        result
    }
}

/// Fill `buf` as far as the stream allows, returning the number of bytes read.
/// Short counts only happen at end of stream.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
