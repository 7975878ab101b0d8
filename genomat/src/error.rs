use crate::keys::{DataSetKey, StudyId};
use thiserror::Error;

/// The error type of the dataset access layer.
///
/// Invariant violations (reading a dataset that was never finalized, writing
/// entries out of original-index order, finalizing twice) are programming
/// errors and panic instead of surfacing here.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The key does not resolve in the metadata store, either because it
    /// never existed or because the dataset was deleted from under a
    /// derived operation.
    #[error("dataset {0} not found")]
    NotFound(DataSetKey),

    /// A filter pass kept no markers or no samples. This is a recognized
    /// outcome the caller must check for, not a failure of the layer.
    #[error("no data left after filtering")]
    NoDataLeft,

    #[error("corrupted dataset storage: {0}")]
    Corrupted(String),

    /// The inputs of a merge belong to different studies
    #[error("cannot merge datasets from different studies ({} and {})", .0.0, .1.0)]
    StudyMismatch(StudyId, StudyId),

    /// The run was cancelled at a row-iteration boundary; no dataset was
    /// finalized.
    #[error("operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, DatasetError>;
