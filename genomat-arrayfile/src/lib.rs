/**
 * The self-describing, array-oriented container used by the genomat dataset
 * files. A container holds named dimensions, named fixed-element-size
 * variables and global attributes. Variables are written in a single forward
 * pass into extents reserved up front; sealing the file appends the table of
 * contents and patches its address into the header, after which the file is
 * read-only.
 **/
mod blob;
mod randfile;
mod toc;

pub use blob::{Blob, BlobWriter};
pub use randfile::RandFile;
pub use toc::{Dimension, ElementType, Toc, VariableEntry};

use std::convert::TryInto;
use std::fs::{File, OpenOptions};
use std::io::{Error, ErrorKind, Read, Result, Seek, Write};
use std::path::Path;

/// The container magic number
pub const FILE_MAGIC_NUM: &[u8] = b"GMAT";

// magic + u64 TOC offset + u32 TOC size
const HEADER_SIZE: usize = 16;

/// The writer side of a container file
pub struct ArrayFileWriter<T: Read + Write + Seek> {
    file: RandFile<T>,
    toc: Toc,
}

impl ArrayFileWriter<File> {
    pub fn create_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let target = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Self::create(target)
    }
}

impl<T: Read + Write + Seek> ArrayFileWriter<T> {
    pub fn create(back: T) -> Result<Self> {
        let mut file = RandFile::new(back);
        let mut header = [0u8; HEADER_SIZE];
        header[..4].copy_from_slice(FILE_MAGIC_NUM);
        file.append_block(&header)?;
        Ok(Self {
            file,
            toc: Toc::default(),
        })
    }

    pub fn add_dimension(&mut self, name: &str, size: u64) -> &mut Self {
        self.toc.dimensions.push(Dimension {
            name: name.to_string(),
            size,
        });
        self
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) -> &mut Self {
        self.toc
            .attributes
            .insert(name.to_string(), value.to_string());
        self
    }

    /// Reserve the extent for a new variable and return a sequential writer
    /// over it. Several variable writers may be active at the same time.
    pub fn create_variable(
        &mut self,
        name: &str,
        element: ElementType,
        shape: &[u64],
    ) -> Result<VariableWriter<T>> {
        if self.toc.variable(name).is_some() {
            return Err(Error::new(
                ErrorKind::Other,
                format!("Duplicated variable name: {}", name),
            ));
        }
        let size = element.size() as u64 * shape.iter().product::<u64>();
        let offset = self.file.reserve_block(size as usize)?;
        self.toc.variables.push(VariableEntry {
            name: name.to_string(),
            element,
            shape: shape.to_vec(),
            offset,
            size,
        });
        Ok(VariableWriter {
            writer: BlobWriter::new(self.file.clone(), offset, size),
            element,
        })
    }

    /// Seal the container: append the table of contents and patch its
    /// address into the header. After this the file is complete and
    /// read-only.
    pub fn seal(mut self) -> Result<()> {
        let encoded = serde_json::to_vec(&self.toc)
            .map_err(|e| Error::new(ErrorKind::Other, format!("TOC encoding error: {}", e)))?;
        let toc_offset = self.file.append_block(&encoded)?;
        let mut patch = [0u8; 12];
        patch[..8].copy_from_slice(&toc_offset.to_le_bytes());
        patch[8..].copy_from_slice(&(encoded.len() as u32).to_le_bytes());
        self.file.update_block(4, &patch)
    }
}

/// Sequential writer over one variable extent
pub struct VariableWriter<T> {
    writer: BlobWriter<T>,
    element: ElementType,
}

impl<T: Write + Seek> VariableWriter<T> {
    pub fn remaining_bytes(&self) -> u64 {
        self.writer.remaining()
    }

    pub fn put_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write(data)
    }

    pub fn put_i32s(&mut self, values: &[i32]) -> Result<()> {
        let mut buf = Vec::with_capacity(values.len() * 4);
        for value in values {
            buf.extend_from_slice(&value.to_le_bytes());
        }
        self.writer.write(&buf)
    }

    pub fn put_u64s(&mut self, values: &[u64]) -> Result<()> {
        let mut buf = Vec::with_capacity(values.len() * 8);
        for value in values {
            buf.extend_from_slice(&value.to_le_bytes());
        }
        self.writer.write(&buf)
    }

    pub fn put_f64s(&mut self, values: &[f64]) -> Result<()> {
        let mut buf = Vec::with_capacity(values.len() * 8);
        for value in values {
            buf.extend_from_slice(&value.to_le_bytes());
        }
        self.writer.write(&buf)
    }

    /// Write one NUL-padded fixed stride string. Longer inputs are
    /// truncated to the stride.
    pub fn put_str(&mut self, value: &str) -> Result<()> {
        let width = match self.element {
            ElementType::FixedStr(width) => width as usize,
            _ => {
                return Err(Error::new(
                    ErrorKind::Other,
                    "Variable element type is not a fixed string",
                ))
            }
        };
        let mut buf = vec![0u8; width];
        let bytes = value.as_bytes();
        let len = bytes.len().min(width);
        buf[..len].copy_from_slice(&bytes[..len]);
        self.writer.write(&buf)
    }
}

/// The reader side of a sealed container file
pub struct ArrayFileReader<T> {
    file: RandFile<T>,
    toc: Toc,
}

impl ArrayFileReader<File> {
    pub fn open_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open(File::open(path)?)
    }
}

impl<T: Read + Seek> ArrayFileReader<T> {
    pub fn open(back: T) -> Result<Self> {
        let mut file = RandFile::new(back);
        let mut header = [0u8; HEADER_SIZE];
        if file.read_block(0, &mut header)? != HEADER_SIZE {
            return Err(Error::new(ErrorKind::Other, "Truncated container header"));
        }
        if &header[..4] != FILE_MAGIC_NUM {
            return Err(Error::new(ErrorKind::Other, "Invalid container magic number"));
        }
        let toc_offset = u64::from_le_bytes(header[4..12].try_into().unwrap());
        let toc_size = u32::from_le_bytes(header[12..16].try_into().unwrap()) as usize;
        if toc_offset == 0 {
            return Err(Error::new(
                ErrorKind::Other,
                "Container file was never sealed",
            ));
        }
        let mut encoded = vec![0u8; toc_size];
        if file.read_block(toc_offset, &mut encoded)? != toc_size {
            return Err(Error::new(ErrorKind::Other, "Truncated table of contents"));
        }
        let toc = serde_json::from_slice(&encoded)
            .map_err(|_| Error::new(ErrorKind::Other, "Invalid table of contents"))?;
        Ok(Self { file, toc })
    }

    pub fn toc(&self) -> &Toc {
        &self.toc
    }

    pub fn dimension(&self, name: &str) -> Option<u64> {
        self.toc.dimension(name)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.toc.attribute(name)
    }

    /// Open a variable view. The view owns its own handle to the backing
    /// store, so it may outlive the reader.
    pub fn variable(&self, name: &str) -> Result<Variable<T>> {
        let entry = self
            .toc
            .variable(name)
            .ok_or_else(|| Error::new(ErrorKind::Other, format!("Variable not found: {}", name)))?
            .clone();
        Ok(Variable {
            blob: Blob::new(self.file.clone(), entry.offset, entry.size),
            entry,
        })
    }
}

/// A read-only view over one variable of a sealed container
pub struct Variable<T> {
    blob: Blob<T>,
    entry: VariableEntry,
}

impl<T> Variable<T> {
    pub fn len(&self) -> u64 {
        self.entry.element_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn element(&self) -> ElementType {
        self.entry.element
    }

    pub fn shape(&self) -> &[u64] {
        &self.entry.shape
    }
}

impl<T: Read + Seek> Variable<T> {
    /// Read raw bytes for `buf.len() / element_size` elements starting at
    /// the given element index.
    pub fn read_bytes(&mut self, start_element: u64, buf: &mut [u8]) -> Result<()> {
        let offset = start_element * self.entry.element.size() as u64;
        self.blob.read_exact_block(offset, buf)
    }

    pub fn read_i32s(&mut self, start_element: u64, count: usize) -> Result<Vec<i32>> {
        let mut buf = vec![0u8; count * 4];
        self.read_bytes(start_element, &mut buf)?;
        Ok(buf
            .chunks_exact(4)
            .map(|c| i32::from_le_bytes(c.try_into().unwrap()))
            .collect())
    }

    pub fn read_u64s(&mut self, start_element: u64, count: usize) -> Result<Vec<u64>> {
        let mut buf = vec![0u8; count * 8];
        self.read_bytes(start_element, &mut buf)?;
        Ok(buf
            .chunks_exact(8)
            .map(|c| u64::from_le_bytes(c.try_into().unwrap()))
            .collect())
    }

    pub fn read_f64s(&mut self, start_element: u64, count: usize) -> Result<Vec<f64>> {
        let mut buf = vec![0u8; count * 8];
        self.read_bytes(start_element, &mut buf)?;
        Ok(buf
            .chunks_exact(8)
            .map(|c| f64::from_le_bytes(c.try_into().unwrap()))
            .collect())
    }

    /// Read one fixed stride string, trimming the NUL padding.
    pub fn read_str(&mut self, index: u64) -> Result<String> {
        let width = match self.entry.element {
            ElementType::FixedStr(width) => width as usize,
            _ => {
                return Err(Error::new(
                    ErrorKind::Other,
                    "Variable element type is not a fixed string",
                ))
            }
        };
        let mut buf = vec![0u8; width];
        self.read_bytes(index, &mut buf)?;
        let end = buf.iter().position(|&b| b == 0).unwrap_or(width);
        Ok(String::from_utf8_lossy(&buf[..end]).to_string())
    }

    pub fn read_strs(&mut self, start_element: u64, count: usize) -> Result<Vec<String>> {
        (0..count)
            .map(|i| self.read_str(start_element + i as u64))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_round_trip() -> Result<()> {
        let mut buf = vec![];
        {
            let cursor = Cursor::new(&mut buf);
            let mut writer = ArrayFileWriter::create(cursor)?;
            writer
                .add_dimension("markers", 3)
                .add_dimension("samples", 2)
                .set_attribute("study_id", "1")
                .set_attribute("technology", "UNKNOWN");
            let mut ids = writer.create_variable("marker_ids", ElementType::FixedStr(16), &[3])?;
            ids.put_str("rs100")?;
            ids.put_str("rs200")?;
            ids.put_str("rs300")?;
            let mut pos = writer.create_variable("marker_positions", ElementType::I32, &[3])?;
            pos.put_i32s(&[100, 200, 300])?;
            let mut gt = writer.create_variable("genotypes", ElementType::BytePair, &[2, 3])?;
            gt.put_bytes(b"AAACAG")?;
            gt.put_bytes(b"CCGGTT")?;
            writer.seal()?;
        }
        {
            let reader = ArrayFileReader::open(Cursor::new(&buf))?;
            assert_eq!(Some(3), reader.dimension("markers"));
            assert_eq!(Some("1"), reader.attribute("study_id"));
            let mut ids = reader.variable("marker_ids")?;
            assert_eq!(3, ids.len());
            assert_eq!("rs200", ids.read_str(1)?);
            let mut pos = reader.variable("marker_positions")?;
            assert_eq!(vec![200, 300], pos.read_i32s(1, 2)?);
            let mut gt = reader.variable("genotypes")?;
            let mut row = [0u8; 6];
            gt.read_bytes(3, &mut row)?;
            assert_eq!(b"CCGGTT", &row);
        }
        Ok(())
    }

    #[test]
    fn test_unsealed_file_is_rejected() {
        let mut buf = vec![];
        {
            let cursor = Cursor::new(&mut buf);
            let mut writer = ArrayFileWriter::create(cursor).unwrap();
            let mut var = writer
                .create_variable("values", ElementType::F64, &[2])
                .unwrap();
            var.put_f64s(&[1.0, 2.0]).unwrap();
            // writer dropped without seal
        }
        assert!(ArrayFileReader::open(Cursor::new(&buf)).is_err());
    }

    #[test]
    fn test_bad_magic() {
        let buf = b"NOPE\0\0\0\0\0\0\0\0\0\0\0\0".to_vec();
        assert!(ArrayFileReader::open(Cursor::new(&buf)).is_err());
    }

    #[test]
    fn test_variable_overflow() {
        let mut buf = vec![];
        let cursor = Cursor::new(&mut buf);
        let mut writer = ArrayFileWriter::create(cursor).unwrap();
        let mut var = writer
            .create_variable("values", ElementType::I32, &[2])
            .unwrap();
        var.put_i32s(&[1, 2]).unwrap();
        var.put_i32s(&[3]).expect_err("Should be error");
    }
}
