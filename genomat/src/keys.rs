use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a study, the top level grouping of matrices
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StudyId(pub u32);

/// Identifier of a stored genotype matrix within a study
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MatrixId(pub u32);

/// Identifier of an operation result derived from a matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OperationId(pub u32);

/// The key of a stored genotype matrix. Assigned at matrix creation time and
/// never reused after deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MatrixKey {
    pub study: StudyId,
    pub matrix: MatrixId,
}

impl fmt::Display for MatrixKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "study {} matrix {}", self.study.0, self.matrix.0)
    }
}

/// The key of a derived operation result. Operations form a tree rooted at
/// their matrix; a nested operation records its parent operation id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OperationKey {
    pub matrix: MatrixKey,
    pub operation: OperationId,
    pub parent_operation: Option<OperationId>,
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} operation {}", self.matrix, self.operation.0)
    }
}

/// The single addressing type accepted by every API of this layer: a dataset
/// is either a stored matrix or an operation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DataSetKey {
    Matrix(MatrixKey),
    Operation(OperationKey),
}

impl DataSetKey {
    /// The key of the ultimate ancestor matrix of this dataset
    pub fn origin_matrix(&self) -> MatrixKey {
        match self {
            DataSetKey::Matrix(key) => *key,
            DataSetKey::Operation(key) => key.matrix,
        }
    }
}

impl From<MatrixKey> for DataSetKey {
    fn from(key: MatrixKey) -> Self {
        DataSetKey::Matrix(key)
    }
}

impl From<OperationKey> for DataSetKey {
    fn from(key: OperationKey) -> Self {
        DataSetKey::Operation(key)
    }
}

impl fmt::Display for DataSetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSetKey::Matrix(key) => key.fmt(f),
            DataSetKey::Operation(key) => key.fmt(f),
        }
    }
}

/// The stable domain identifier of a marker row
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MarkerKey {
    pub marker_id: String,
}

impl MarkerKey {
    pub fn new<S: Into<String>>(marker_id: S) -> Self {
        Self {
            marker_id: marker_id.into(),
        }
    }
}

impl fmt::Display for MarkerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.marker_id)
    }
}

/// The stable domain identifier of a sample row
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SampleKey {
    pub family_id: String,
    pub sample_id: String,
}

impl SampleKey {
    pub fn new<F: Into<String>, S: Into<String>>(family_id: F, sample_id: S) -> Self {
        Self {
            family_id: family_id.into(),
            sample_id: sample_id.into(),
        }
    }
}

impl fmt::Display for SampleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.family_id, self.sample_id)
    }
}

/// The stable domain identifier of a chromosome record
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChromosomeKey {
    pub name: String,
}

impl ChromosomeKey {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for ChromosomeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
