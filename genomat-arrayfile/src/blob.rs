use crate::randfile::RandFile;
use std::io::{Error, ErrorKind, Read, Result, Seek, Write};

/// A read-only view of a fixed extent inside a container file.
pub struct Blob<T> {
    file: RandFile<T>,
    size: u64,
    offset: u64,
}

impl<T> Blob<T> {
    pub(crate) fn new(file: RandFile<T>, offset: u64, size: u64) -> Self {
        Self { file, size, offset }
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

impl<T: Read + Seek> Blob<T> {
    /// Read bytes starting at the given offset inside the blob. Returns the
    /// number of bytes actually loaded, which is bounded by the blob extent.
    pub fn read_block(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if self.size < offset {
            return Ok(0);
        }
        let bytes_to_read = (buf.len() as u64).min(self.size - offset) as usize;
        self.file
            .read_block(self.offset + offset, &mut buf[..bytes_to_read])?;
        Ok(bytes_to_read)
    }

    /// Read an exact byte range, failing if the range crosses the blob end.
    pub fn read_exact_block(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        if offset + buf.len() as u64 > self.size {
            return Err(Error::new(
                ErrorKind::UnexpectedEof,
                "Read passes the end of the blob",
            ));
        }
        let loaded = self.read_block(offset, buf)?;
        if loaded != buf.len() {
            return Err(Error::new(
                ErrorKind::UnexpectedEof,
                "Blob extent is truncated",
            ));
        }
        Ok(())
    }
}

/// A sequential writer over a reserved extent. The extent is allocated up
/// front, so several blob writers can make progress over the same container
/// file at the same time.
pub struct BlobWriter<T> {
    file: RandFile<T>,
    offset: u64,
    capacity: u64,
    cursor: u64,
}

impl<T: Write + Seek> BlobWriter<T> {
    pub(crate) fn new(file: RandFile<T>, offset: u64, capacity: u64) -> Self {
        Self {
            file,
            offset,
            capacity,
            cursor: 0,
        }
    }

    pub fn remaining(&self) -> u64 {
        self.capacity - self.cursor
    }

    pub fn bytes_written(&self) -> u64 {
        self.cursor
    }

    pub fn write(&mut self, buf: &[u8]) -> Result<()> {
        if buf.len() as u64 > self.remaining() {
            return Err(Error::new(
                ErrorKind::Other,
                "Write passes the end of the reserved extent",
            ));
        }
        self.file.update_block(self.offset + self.cursor, buf)?;
        self.cursor += buf.len() as u64;
        Ok(())
    }
}
