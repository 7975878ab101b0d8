use crate::error::{DatasetError, Result};
use crate::keys::{DataSetKey, MatrixKey, OperationId, OperationKey, StudyId};
use crate::metadata::{MatrixMetadata, OperationMetadata};
use serde_derive::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// The metadata store consumed by this layer. Matrix and operation records
/// are created exactly once, at finalize time, and are read-only afterwards.
///
/// Key allocation is split from record insertion: an identifier is handed
/// out when a writer is created, while the metadata row only becomes durable
/// when the dataset is finalized. Allocated identifiers are never reused,
/// even when the write is abandoned.
pub trait MetadataStore: Send + Sync {
    fn allocate_matrix_key(&self, study: StudyId) -> Result<MatrixKey>;
    fn allocate_operation_key(
        &self,
        matrix: MatrixKey,
        parent_operation: Option<OperationId>,
    ) -> Result<OperationKey>;

    fn matrix_metadata(&self, key: MatrixKey) -> Result<MatrixMetadata>;
    fn operation_metadata(&self, key: OperationKey) -> Result<OperationMetadata>;

    fn insert_matrix_metadata(&self, meta: MatrixMetadata) -> Result<MatrixKey>;
    fn insert_operation_metadata(&self, meta: OperationMetadata) -> Result<OperationKey>;

    /// Remove the matrix row and every operation row rooted at it. Backing
    /// files are removed by the repository, not the store.
    fn delete_matrix(&self, key: MatrixKey) -> Result<()>;
    fn delete_operation(&self, key: OperationKey) -> Result<()>;

    fn list_matrices(&self, study: StudyId) -> Result<Vec<MatrixMetadata>>;
    fn operations_of(&self, key: MatrixKey) -> Result<Vec<OperationMetadata>>;
}

#[derive(Default, Serialize, Deserialize)]
struct Tables {
    next_matrix_id: u32,
    next_operation_id: u32,
    matrices: Vec<MatrixMetadata>,
    operations: Vec<OperationMetadata>,
}

/// The default collaborator: metadata tables kept as one JSON file under the
/// data directory, loaded lazily and cached for the lifetime of the store.
pub struct FsMetadataStore {
    path: PathBuf,
    tables: Mutex<Option<Tables>>,
}

impl FsMetadataStore {
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            path: data_dir.as_ref().join("metadata.json"),
            tables: Mutex::new(None),
        }
    }

    fn with_tables<R>(&self, body: impl FnOnce(&mut Tables) -> Result<(R, bool)>) -> Result<R> {
        let mut guard = self
            .tables
            .lock()
            .map_err(|_| DatasetError::Corrupted("metadata store lock poisoned".to_string()))?;
        if guard.is_none() {
            let tables = if self.path.exists() {
                let data = fs::read(&self.path)?;
                serde_json::from_slice(&data).map_err(|e| {
                    DatasetError::Corrupted(format!("invalid metadata tables: {}", e))
                })?
            } else {
                Tables::default()
            };
            *guard = Some(tables);
        }
        let tables = guard.as_mut().unwrap();
        let (ret, dirty) = body(tables)?;
        if dirty {
            if let Some(dir) = self.path.parent() {
                fs::create_dir_all(dir)?;
            }
            let data = serde_json::to_vec_pretty(tables)
                .map_err(|e| DatasetError::Corrupted(format!("metadata encoding: {}", e)))?;
            fs::write(&self.path, data)?;
        }
        Ok(ret)
    }
}

fn same_operation(row: &OperationMetadata, key: OperationKey) -> bool {
    row.key.matrix == key.matrix && row.key.operation == key.operation
}

impl MetadataStore for FsMetadataStore {
    fn allocate_matrix_key(&self, study: StudyId) -> Result<MatrixKey> {
        self.with_tables(|t| {
            let key = MatrixKey {
                study,
                matrix: crate::keys::MatrixId(t.next_matrix_id),
            };
            t.next_matrix_id += 1;
            Ok((key, true))
        })
    }

    fn allocate_operation_key(
        &self,
        matrix: MatrixKey,
        parent_operation: Option<OperationId>,
    ) -> Result<OperationKey> {
        self.with_tables(|t| {
            let key = OperationKey {
                matrix,
                operation: OperationId(t.next_operation_id),
                parent_operation,
            };
            t.next_operation_id += 1;
            Ok((key, true))
        })
    }

    fn matrix_metadata(&self, key: MatrixKey) -> Result<MatrixMetadata> {
        self.with_tables(|t| {
            let row = t
                .matrices
                .iter()
                .find(|m| m.key == key)
                .cloned()
                .ok_or(DatasetError::NotFound(DataSetKey::Matrix(key)))?;
            Ok((row, false))
        })
    }

    fn operation_metadata(&self, key: OperationKey) -> Result<OperationMetadata> {
        self.with_tables(|t| {
            let row = t
                .operations
                .iter()
                .find(|o| same_operation(o, key))
                .cloned()
                .ok_or(DatasetError::NotFound(DataSetKey::Operation(key)))?;
            Ok((row, false))
        })
    }

    fn insert_matrix_metadata(&self, meta: MatrixMetadata) -> Result<MatrixKey> {
        self.with_tables(|t| {
            assert!(
                t.matrices.iter().all(|m| m.key != meta.key),
                "matrix metadata inserted twice for {}",
                meta.key
            );
            let key = meta.key;
            t.matrices.push(meta);
            Ok((key, true))
        })
    }

    fn insert_operation_metadata(&self, meta: OperationMetadata) -> Result<OperationKey> {
        self.with_tables(|t| {
            assert!(
                !t.operations.iter().any(|o| same_operation(o, meta.key)),
                "operation metadata inserted twice for {}",
                meta.key
            );
            let key = meta.key;
            t.operations.push(meta);
            Ok((key, true))
        })
    }

    fn delete_matrix(&self, key: MatrixKey) -> Result<()> {
        self.with_tables(|t| {
            let before = t.matrices.len();
            t.matrices.retain(|m| m.key != key);
            if t.matrices.len() == before {
                return Err(DatasetError::NotFound(DataSetKey::Matrix(key)));
            }
            t.operations.retain(|o| o.key.matrix != key);
            Ok(((), true))
        })
    }

    fn delete_operation(&self, key: OperationKey) -> Result<()> {
        self.with_tables(|t| {
            let before = t.operations.len();
            t.operations.retain(|o| !same_operation(o, key));
            if t.operations.len() == before {
                return Err(DatasetError::NotFound(DataSetKey::Operation(key)));
            }
            Ok(((), true))
        })
    }

    fn list_matrices(&self, study: StudyId) -> Result<Vec<MatrixMetadata>> {
        self.with_tables(|t| {
            let rows = t
                .matrices
                .iter()
                .filter(|m| m.key.study == study)
                .cloned()
                .collect();
            Ok((rows, false))
        })
    }

    fn operations_of(&self, key: MatrixKey) -> Result<Vec<OperationMetadata>> {
        self.with_tables(|t| {
            let rows = t
                .operations
                .iter()
                .filter(|o| o.key.matrix == key)
                .cloned()
                .collect();
            Ok((rows, false))
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::metadata::now_secs;

    fn matrix_meta(key: MatrixKey) -> MatrixMetadata {
        MatrixMetadata {
            key,
            friendly_name: "test".to_string(),
            description: String::new(),
            technology: "UNKNOWN".to_string(),
            strand: "+".to_string(),
            format_version: crate::metadata::FORMAT_VERSION.to_string(),
            has_dictionary: false,
            num_markers: 1,
            num_samples: 1,
            num_chromosomes: 1,
            created_secs: now_secs(),
        }
    }

    #[test]
    fn test_keys_are_never_reused() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsMetadataStore::open(dir.path());
        let study = StudyId(0);
        let k1 = store.allocate_matrix_key(study).unwrap();
        store.insert_matrix_metadata(matrix_meta(k1)).unwrap();
        store.delete_matrix(k1).unwrap();
        let k2 = store.allocate_matrix_key(study).unwrap();
        assert_ne!(k1.matrix, k2.matrix);
    }

    #[test]
    fn test_lookup_after_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let key = {
            let store = FsMetadataStore::open(dir.path());
            let key = store.allocate_matrix_key(StudyId(7)).unwrap();
            store.insert_matrix_metadata(matrix_meta(key)).unwrap()
        };
        let store = FsMetadataStore::open(dir.path());
        let row = store.matrix_metadata(key).unwrap();
        assert_eq!(row.key, key);
        assert_eq!(1, store.list_matrices(StudyId(7)).unwrap().len());
    }

    #[test]
    fn test_missing_key_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsMetadataStore::open(dir.path());
        let key = MatrixKey {
            study: StudyId(0),
            matrix: crate::keys::MatrixId(42),
        };
        match store.matrix_metadata(key) {
            Err(DatasetError::NotFound(_)) => (),
            other => panic!("Unexpected result: {:?}", other.map(|m| m.key)),
        }
    }
}
