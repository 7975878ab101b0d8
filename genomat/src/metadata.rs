use crate::keys::{DataSetKey, MatrixKey, OperationKey};
use serde_derive::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// The container format version written into every matrix file
pub const FORMAT_VERSION: &str = "1.0";

pub(crate) fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// The stored description of a genotype matrix. Created once when the matrix
/// is sealed; read-only thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixMetadata {
    pub key: MatrixKey,
    pub friendly_name: String,
    pub description: String,
    /// The import technology the matrix came from
    pub technology: String,
    pub strand: String,
    pub format_version: String,
    pub has_dictionary: bool,
    pub num_markers: usize,
    pub num_samples: usize,
    pub num_chromosomes: usize,
    pub created_secs: u64,
}

/// The stored description of an operation result. The parent link is what
/// forms the provenance chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationMetadata {
    pub key: OperationKey,
    pub parent: DataSetKey,
    pub operation_type: String,
    pub friendly_name: String,
    pub description: String,
    pub num_markers: usize,
    pub num_samples: usize,
    pub num_chromosomes: usize,
    /// Whether the result lives in the in-process table instead of a
    /// container file
    pub in_memory: bool,
    pub created_secs: u64,
}
