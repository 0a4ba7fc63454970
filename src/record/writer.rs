use std::io::{self, Write};

use super::masked_crc32c;

/// Writes framed records to any `Write` sink.
pub struct RecordWriter<W: Write> {
    writer: W,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_record(&mut self, data: &[u8]) -> io::Result<()> {
        let len_bytes = (data.len() as u64).to_le_bytes();
        self.writer.write_all(&len_bytes)?;
        self.writer
            .write_all(&masked_crc32c(&len_bytes).to_le_bytes())?;
        self.writer.write_all(data)?;
        self.writer.write_all(&masked_crc32c(data).to_le_bytes())?;
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
