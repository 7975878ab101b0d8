use crate::keys::{MatrixKey, OperationKey};
use serde_derive::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_chunk_size() -> usize {
    10_000
}

fn default_write_buffer_rows() -> usize {
    10_000
}

/// The storage policy of the layer. This is an external configuration value
/// supplied by the caller, not internal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the matrix/operation container files and the
    /// metadata tables
    pub data_dir: PathBuf,
    /// When set, freshly generated operation datasets are backed by process
    /// memory instead of a container file
    #[serde(default)]
    pub in_memory_storage: bool,
    /// Number of elements per lazily loaded chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Number of entry rows buffered by a file backed operation dataset
    /// before they are flushed to the container
    #[serde(default = "default_write_buffer_rows")]
    pub write_buffer_rows: usize,
}

impl StorageConfig {
    pub fn new<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.into(),
            in_memory_storage: false,
            chunk_size: default_chunk_size(),
            write_buffer_rows: default_write_buffer_rows(),
        }
    }

    pub fn matrix_path(&self, key: MatrixKey) -> PathBuf {
        self.data_dir.join(format!(
            "study_{}_matrix_{}.gmat",
            key.study.0, key.matrix.0
        ))
    }

    pub fn operation_path(&self, key: OperationKey) -> PathBuf {
        self.data_dir.join(format!(
            "study_{}_matrix_{}_op_{}.gmat",
            key.matrix.study.0, key.matrix.matrix.0, key.operation.0
        ))
    }
}
