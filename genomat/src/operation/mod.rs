/*!
  The write-then-read side of the layer: every analysis or filter step
  produces its result through an operation dataset, written in one forward
  pass and sealed by `finish_writing`, after which it is readable through
  the ordinary `DataSetSource` contract.
*/
mod factory;
mod writer;

pub use factory::{register_builtin_operations, DatasetRepository};
pub use writer::OperationDataSetWriter;

use serde_derive::{Deserialize, Serialize};

/// Which dimension the operation's entry rows are aligned with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationOrientation {
    Markers,
    Samples,
}

impl OperationOrientation {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationOrientation::Markers => "markers",
            OperationOrientation::Samples => "samples",
        }
    }
}

/// The static descriptor of an operation type. Descriptors are registered
/// once at process startup into the map owned by the repository; this is a
/// fixed table, not a plugin system.
#[derive(Debug, Clone)]
pub struct OperationTypeInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub orientation: OperationOrientation,
    /// Names of the per-entry result statistics
    pub columns: Vec<&'static str>,
}

/// One entry row of a finalized operation dataset, in original-index order
#[derive(Debug, Clone, PartialEq)]
pub struct OperationEntry {
    pub original_index: usize,
    pub values: Vec<f64>,
}

/// Names of the dimensions, variables and attributes of an operation
/// container file. Dimension names are shared with the matrix layout.
pub mod layout {
    pub const VAR_MARKER_ORIGINAL_INDICES: &str = "marker_original_indices";
    pub const VAR_SAMPLE_ORIGINAL_INDICES: &str = "sample_original_indices";
    pub const VAR_CHROMOSOME_ORIGINAL_INDICES: &str = "chromosome_original_indices";
    pub const RESULT_VAR_PREFIX: &str = "result_";

    pub const ATTR_OPERATION_TYPE: &str = "operation_type";
    pub const ATTR_ORIENTATION: &str = "orientation";
    pub const ATTR_PARENT: &str = "parent";
}
