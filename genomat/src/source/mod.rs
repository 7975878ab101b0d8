/*!
  The read side of the layer: every dataset, whether a stored matrix or a
  finalized operation result, is exposed through the same `DataSetSource`
  contract built from chunked, origin-index aware sequences.
*/
mod chunked;
mod filtered;
mod matrix;
mod operation;

pub use chunked::{ChunkLoader, ChunkedIter, ChunkedSource, VecLoader};
pub use filtered::{pick_by_original_index, FilteredIter, OriginFilteredSource};
pub use matrix::MatrixSource;
pub use operation::{FileOperationSource, InMemoryOperation, InMemoryOperationSource};

use crate::error::Result;
use crate::genotype::{Genotype, MarkerRecord, SampleRecord};
use crate::keys::{ChromosomeKey, DataSetKey, MarkerKey, SampleKey};
use std::collections::BTreeMap;

/// A lazy sequence of per-row genotype lists
pub type GenotypeRowSource = OriginFilteredSource<Box<dyn ChunkLoader<Item = Vec<Genotype>>>>;

/// An ordered key sequence together with its original indices. Iteration
/// order equals insertion order equals ascending original index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeysView<K> {
    entries: Vec<(usize, K)>,
}

impl<K> KeysView<K> {
    pub fn from_entries(entries: Vec<(usize, K)>) -> Self {
        assert!(
            entries.windows(2).all(|w| w[0].0 < w[1].0),
            "original indices must be strictly increasing"
        );
        Self { entries }
    }

    /// The unfiltered case: the k-th key sits at original index k
    pub fn identity(keys: Vec<K>) -> Self {
        Self {
            entries: keys.into_iter().enumerate().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn key(&self, index: usize) -> &K {
        &self.entries[index].1
    }

    pub fn original_index(&self, index: usize) -> usize {
        self.entries[index].0
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &K)> {
        self.entries.iter().map(|(index, key)| (*index, key))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(_, key)| key)
    }

    pub fn original_indices(&self) -> Vec<usize> {
        self.entries.iter().map(|(index, _)| *index).collect()
    }

    pub fn into_entries(self) -> Vec<(usize, K)> {
        self.entries
    }
}

impl<K: Clone + Ord> KeysView<K> {
    /// The original-index to key map. Since original indices are strictly
    /// increasing, map iteration order equals insertion order.
    pub fn indices_map(&self) -> BTreeMap<usize, K> {
        self.entries
            .iter()
            .map(|(index, key)| (*index, key.clone()))
            .collect()
    }
}

/// The read-only, assembled view of one matrix or operation result.
///
/// All key sequences and genotype sequences of one source are index
/// aligned: the k-th element of every sequence describes the same logical
/// row. Reads take `&mut self` because each source carries its own
/// single-slot chunk caches; consumers on different threads must each open
/// their own instance (cheap: a source is mostly index structures).
pub trait DataSetSource {
    fn dataset_key(&self) -> DataSetKey;

    fn num_markers(&self) -> usize;
    fn num_samples(&self) -> usize;
    fn num_chromosomes(&self) -> usize;

    fn markers_keys(&mut self) -> Result<KeysView<MarkerKey>>;
    fn samples_keys(&mut self) -> Result<KeysView<SampleKey>>;
    fn chromosomes_keys(&mut self) -> Result<KeysView<ChromosomeKey>>;

    /// Marker annotations, index aligned with `markers_keys`
    fn markers_records(&mut self) -> Result<Vec<MarkerRecord>>;
    /// Sample phenotype info, index aligned with `samples_keys`
    fn samples_records(&mut self) -> Result<Vec<SampleRecord>>;

    /// One genotype list per sample row
    fn samples_genotypes(&mut self) -> Result<GenotypeRowSource>;
    /// One genotype list per marker row
    fn markers_genotypes(&mut self) -> Result<GenotypeRowSource>;
}
