use std::io::{Read, Result, Seek, SeekFrom, Write};
use std::sync::{Arc, Mutex};

/// The shared random access wrapper around a backing store. All reads and
/// writes go through explicit file addresses; the wrapper itself never tracks
/// block boundaries, that is the responsibility of the upper layer.
///
/// Cloning a `RandFile` yields another handle to the same underlying store,
/// so a writer and any number of variable views can coexist over one file.
pub struct RandFile<T> {
    inner: Arc<Mutex<T>>,
}

impl<T> Clone for RandFile<T> {
    fn clone(&self) -> Self {
        RandFile {
            inner: self.inner.clone(),
        }
    }
}

fn lock_error() -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, "Lock Error")
}

impl<T> RandFile<T> {
    /// Create a new random access file wrapper
    ///
    /// - `inner`: The underlying implementation for the backend
    pub fn new(inner: T) -> Self {
        RandFile {
            inner: Arc::new(Mutex::new(inner)),
        }
    }
}

impl<T: Write + Seek> RandFile<T> {
    /// Append a block to the end of the backing store and return its
    /// absolute address.
    pub fn append_block(&mut self, buf: &[u8]) -> Result<u64> {
        let mut inner = self.inner.lock().map_err(|_| lock_error())?;
        let ret = inner.seek(SeekFrom::End(0))?;
        inner.write_all(buf)?;
        Ok(ret)
    }

    /// Overwrite a previously reserved or written block at the given address.
    pub fn update_block(&mut self, offset: u64, buf: &[u8]) -> Result<()> {
        let mut inner = self.inner.lock().map_err(|_| lock_error())?;
        inner.seek(SeekFrom::Start(offset))?;
        inner.write_all(buf)?;
        Ok(())
    }

    /// Reserve a block of the given size at the end of the backing store.
    /// The content of the reserved region is later filled in with
    /// `update_block`. Returns the absolute address of the reserved block.
    pub fn reserve_block(&mut self, size: usize) -> Result<u64> {
        let mut inner = self.inner.lock().map_err(|_| lock_error())?;
        let ret = inner.seek(SeekFrom::End(0))?;
        if size > 0 {
            inner.seek(SeekFrom::Current(size as i64 - 1))?;
            inner.write_all(b"\0")?;
        }
        Ok(ret)
    }
}

impl<T: Read + Seek> RandFile<T> {
    pub fn size(&mut self) -> Result<u64> {
        let mut inner = self.inner.lock().map_err(|_| lock_error())?;
        inner.seek(SeekFrom::End(0))
    }

    /// Read a block from the given address. There might not be enough bytes
    /// available, thus the actual number of bytes loaded is returned.
    pub fn read_block(&mut self, addr: u64, buf: &mut [u8]) -> Result<usize> {
        let mut inner = self.inner.lock().map_err(|_| lock_error())?;
        inner.seek(SeekFrom::Start(addr))?;
        let mut ret = 0;
        loop {
            let bytes_read = inner.read(&mut buf[ret..])?;
            if bytes_read == 0 {
                break Ok(ret);
            }
            ret += bytes_read;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_write_blocks() {
        let backend = Cursor::new(vec![0; 0]);
        let mut rand_file = RandFile::new(backend);
        assert_eq!(0, rand_file.append_block(b"This is a test block").unwrap());
        assert_eq!(20, rand_file.append_block(b"This is a test block").unwrap());

        let mut buf = [0u8; 20];
        assert_eq!(20, rand_file.read_block(0, &mut buf).unwrap());
        assert_eq!(b"This is a test block", &buf);
    }

    #[test]
    fn test_reserve_then_update() {
        let backend = Cursor::new(vec![0; 0]);
        let mut rand_file = RandFile::new(backend);
        let addr = rand_file.reserve_block(8).unwrap();
        assert_eq!(8, rand_file.append_block(b"tail").unwrap());
        rand_file.update_block(addr, b"12345678").unwrap();

        let mut buf = [0u8; 12];
        assert_eq!(12, rand_file.read_block(0, &mut buf).unwrap());
        assert_eq!(b"12345678tail", &buf);
    }

    #[test]
    fn test_shared_handles() {
        let backend = Cursor::new(vec![0; 0]);
        let mut rand_file = RandFile::new(backend);
        let mut other = rand_file.clone();
        rand_file.append_block(b"one").unwrap();
        other.append_block(b"two").unwrap();
        assert_eq!(6, rand_file.size().unwrap());
    }
}
