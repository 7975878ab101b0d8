/*!
  The dataset access layer of a genotype analysis store.

  Genotype matrices and the operation results derived from them live in
  array container files (or, optionally, in process memory) and are exposed
  through one uniform, lazily loading `DataSetSource` contract. The
  `DatasetRepository` owns the stored world: it creates matrices, derives
  operation datasets, resolves any dataset key into a readable source and
  tracks provenance through the metadata store.
*/
pub mod algorithm;
pub mod config;
pub mod error;
pub mod genotype;
pub mod keys;
pub mod matrix;
pub mod metadata;
pub mod operation;
pub mod progress;
pub mod source;
pub mod store;

pub use config::StorageConfig;
pub use error::{DatasetError, Result};
pub use genotype::{Affection, Genotype, MarkerRecord, SampleRecord, Sex};
pub use keys::{
    ChromosomeKey, DataSetKey, MarkerKey, MatrixId, MatrixKey, OperationId, OperationKey,
    SampleKey, StudyId,
};
pub use matrix::{MatrixBuilder, MatrixWriter};
pub use metadata::{MatrixMetadata, OperationMetadata};
pub use operation::{
    register_builtin_operations, DatasetRepository, OperationDataSetWriter, OperationEntry,
    OperationOrientation, OperationTypeInfo,
};
pub use progress::{CancelToken, NoopProgress, ProcessPhase, ProgressObserver};
pub use source::{DataSetSource, KeysView, MatrixSource};
pub use store::{FsMetadataStore, MetadataStore};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
