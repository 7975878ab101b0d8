use crate::config::StorageConfig;
use crate::error::{DatasetError, Result};
use crate::keys::{DataSetKey, MatrixKey, OperationId, OperationKey, StudyId};
use crate::matrix::{MatrixBuilder, MatrixWriter};
use crate::metadata::{MatrixMetadata, OperationMetadata};
use crate::operation::writer::OperationDataSetWriter;
use crate::operation::{OperationOrientation, OperationTypeInfo};
use crate::source::{
    DataSetSource, FileOperationSource, InMemoryOperation, InMemoryOperationSource, MatrixSource,
};
use crate::store::MetadataStore;
use log::{debug, info};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// The owner of everything stored: configuration, the metadata store, the
/// registered operation types and the in-process table of memory backed
/// operation results. Every dataset is created through and opened from here.
pub struct DatasetRepository {
    config: StorageConfig,
    store: Box<dyn MetadataStore>,
    operation_types: HashMap<&'static str, OperationTypeInfo>,
    in_memory: Mutex<HashMap<(MatrixKey, OperationId), Arc<InMemoryOperation>>>,
}

impl DatasetRepository {
    pub fn new(config: StorageConfig, store: Box<dyn MetadataStore>) -> Self {
        Self {
            config,
            store,
            operation_types: HashMap::new(),
            in_memory: Mutex::new(HashMap::new()),
        }
    }

    /// Open a repository with the default JSON file metadata store rooted in
    /// the configured data directory, with the builtin operation types
    /// registered.
    pub fn open(config: StorageConfig) -> Self {
        let store = Box::new(crate::store::FsMetadataStore::open(&config.data_dir));
        let mut repo = Self::new(config, store);
        register_builtin_operations(&mut repo);
        repo
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn MetadataStore {
        self.store.as_ref()
    }

    /// Register an operation type. The registry is a fixed table populated at
    /// startup; a duplicate id is a programming error.
    pub fn register_operation_type(&mut self, info: OperationTypeInfo) {
        let prev = self.operation_types.insert(info.id, info);
        if let Some(prev) = prev {
            panic!("operation type registered twice: {}", prev.id);
        }
    }

    pub fn operation_type(&self, id: &str) -> Option<&OperationTypeInfo> {
        self.operation_types.get(id)
    }

    fn mem_table(
        &self,
    ) -> Result<std::sync::MutexGuard<HashMap<(MatrixKey, OperationId), Arc<InMemoryOperation>>>>
    {
        self.in_memory
            .lock()
            .map_err(|_| DatasetError::Corrupted("in-memory operation table poisoned".to_string()))
    }

    pub(crate) fn register_in_memory(&self, key: OperationKey, data: Arc<InMemoryOperation>) {
        if let Ok(mut table) = self.mem_table() {
            table.insert((key.matrix, key.operation), data);
        }
    }

    /// Resolve a dataset key into its source. A memory backed operation that
    /// is no longer in the in-process table (the process that wrote it is
    /// gone) resolves to `NotFound` just like a missing file would.
    pub fn open_dataset_source(&self, key: DataSetKey) -> Result<Box<dyn DataSetSource>> {
        match key {
            DataSetKey::Matrix(key) => {
                self.store.matrix_metadata(key)?;
                Ok(Box::new(MatrixSource::open(&self.config, key)?))
            }
            DataSetKey::Operation(op_key) => {
                let metadata = self.store.operation_metadata(op_key)?;
                if metadata.in_memory {
                    let data = self
                        .mem_table()?
                        .get(&(op_key.matrix, op_key.operation))
                        .cloned()
                        .ok_or(DatasetError::NotFound(key))?;
                    Ok(Box::new(InMemoryOperationSource::new(data, &self.config)))
                } else {
                    Ok(Box::new(FileOperationSource::open(&self.config, metadata)?))
                }
            }
        }
    }

    /// Allocate a fresh operation dataset of the given registered type,
    /// derived from `parent`. The parent must resolve; the backend follows
    /// the configured storage mode.
    pub fn generate_fresh_operation_dataset(
        &self,
        type_id: &str,
        parent: DataSetKey,
    ) -> Result<OperationDataSetWriter> {
        let type_info = self
            .operation_types
            .get(type_id)
            .unwrap_or_else(|| panic!("unregistered operation type: {}", type_id))
            .clone();
        match parent {
            DataSetKey::Matrix(key) => {
                self.store.matrix_metadata(key)?;
            }
            DataSetKey::Operation(key) => {
                self.store.operation_metadata(key)?;
            }
        }
        let parent_operation = match parent {
            DataSetKey::Matrix(_) => None,
            DataSetKey::Operation(key) => Some(key.operation),
        };
        let key = self
            .store
            .allocate_operation_key(parent.origin_matrix(), parent_operation)?;
        debug!(
            "fresh {} operation {} derived from {}",
            type_id, key, parent
        );
        Ok(OperationDataSetWriter::new(
            self,
            type_info,
            parent,
            key,
            self.config.in_memory_storage,
            self.config.write_buffer_rows,
        ))
    }

    /// Create a matrix container from the builder; genotype rows are then
    /// streamed through the returned writer.
    pub fn create_matrix<'a>(&'a self, builder: &mut MatrixBuilder) -> Result<MatrixWriter<'a>> {
        builder.create(&self.config, self.store.as_ref())
    }

    pub fn matrix_metadata(&self, key: MatrixKey) -> Result<MatrixMetadata> {
        self.store.matrix_metadata(key)
    }

    pub fn operation_metadata(&self, key: OperationKey) -> Result<OperationMetadata> {
        self.store.operation_metadata(key)
    }

    pub fn list_matrices(&self, study: StudyId) -> Result<Vec<MatrixMetadata>> {
        self.store.list_matrices(study)
    }

    pub fn operations_of(&self, key: MatrixKey) -> Result<Vec<OperationMetadata>> {
        self.store.operations_of(key)
    }

    /// Delete a matrix together with every operation derived from it, their
    /// container files included.
    pub fn delete_matrix(&self, key: MatrixKey) -> Result<()> {
        let operations = self.store.operations_of(key)?;
        for op in operations {
            if !op.in_memory {
                let path = self.config.operation_path(op.key);
                if path.exists() {
                    std::fs::remove_file(path)?;
                }
            }
        }
        self.mem_table()?.retain(|(matrix, _), _| *matrix != key);
        self.store.delete_matrix(key)?;
        let path = self.config.matrix_path(key);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        info!("deleted {} and its operations", key);
        Ok(())
    }

    /// Delete one operation result and its backing storage
    pub fn delete_operation(&self, key: OperationKey) -> Result<()> {
        let metadata = self.store.operation_metadata(key)?;
        if metadata.in_memory {
            self.mem_table()?.remove(&(key.matrix, key.operation));
        } else {
            let path = self.config.operation_path(key);
            if path.exists() {
                std::fs::remove_file(path)?;
            }
        }
        self.store.delete_operation(key)
    }
}

/// Register the builtin analysis and filter operation types
pub fn register_builtin_operations(repo: &mut DatasetRepository) {
    repo.register_operation_type(OperationTypeInfo {
        id: "qa_markers",
        name: "Marker QA",
        orientation: OperationOrientation::Markers,
        columns: vec!["missing_ratio", "mismatch", "minor_allele_frequency"],
    });
    repo.register_operation_type(OperationTypeInfo {
        id: "qa_samples",
        name: "Sample QA",
        orientation: OperationOrientation::Samples,
        columns: vec!["missing_ratio", "heterozygosity_ratio"],
    });
    repo.register_operation_type(OperationTypeInfo {
        id: "hardy_weinberg",
        name: "Hardy-Weinberg",
        orientation: OperationOrientation::Markers,
        columns: vec!["p_value"],
    });
    repo.register_operation_type(OperationTypeInfo {
        id: "filter",
        name: "Filter",
        orientation: OperationOrientation::Markers,
        columns: vec![],
    });
    repo.register_operation_type(OperationTypeInfo {
        id: "trend_test",
        name: "Cochran-Armitage Trend Test",
        orientation: OperationOrientation::Markers,
        columns: vec!["chi_square", "p_value"],
    });
    repo.register_operation_type(OperationTypeInfo {
        id: "association_test",
        name: "Allelic Association Test",
        orientation: OperationOrientation::Markers,
        columns: vec!["chi_square", "p_value", "odds_ratio"],
    });
}
