use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The storage type of a single element inside a variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementType {
    U8,
    I32,
    U64,
    F64,
    /// A NUL-padded byte string with a fixed stride
    FixedStr(u16),
    /// A pair of allele bytes
    BytePair,
}

impl ElementType {
    pub fn size(self) -> usize {
        match self {
            ElementType::U8 => 1,
            ElementType::I32 => 4,
            ElementType::U64 => 8,
            ElementType::F64 => 8,
            ElementType::FixedStr(width) => width as usize,
            ElementType::BytePair => 2,
        }
    }
}

/// A named dimension of the container
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    pub size: u64,
}

/// A named variable of the container. The variable payload lives at `offset`
/// as one contiguous extent of `size` bytes; `shape` is expressed in
/// elements, row-major.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VariableEntry {
    pub name: String,
    pub element: ElementType,
    pub shape: Vec<u64>,
    pub offset: u64,
    pub size: u64,
}

impl VariableEntry {
    pub fn element_count(&self) -> u64 {
        self.shape.iter().product()
    }
}

/// The table of contents, stored as a JSON block appended when the file is
/// sealed.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Toc {
    pub dimensions: Vec<Dimension>,
    pub variables: Vec<VariableEntry>,
    pub attributes: BTreeMap<String, String>,
}

impl Toc {
    pub fn dimension(&self, name: &str) -> Option<u64> {
        self.dimensions
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.size)
    }

    pub fn variable(&self, name: &str) -> Option<&VariableEntry> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}
