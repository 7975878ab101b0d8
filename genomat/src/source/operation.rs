use crate::config::StorageConfig;
use crate::error::{DatasetError, Result};
use crate::genotype::{Genotype, MarkerRecord, SampleRecord};
use crate::keys::{ChromosomeKey, DataSetKey, MarkerKey, SampleKey};
use crate::matrix::layout as matrix_layout;
use crate::metadata::OperationMetadata;
use crate::operation::{layout, OperationEntry, OperationOrientation};
use crate::source::chunked::{ChunkLoader, ChunkedSource, VecLoader};
use crate::source::filtered::{pick_by_original_index, OriginFilteredSource};
use crate::source::matrix::{MarkerRowLoader, MatrixSource, SampleRowLoader};
use crate::source::{DataSetSource, GenotypeRowSource, KeysView};
use genomat_arrayfile::{ArrayFileReader, Variable};
use std::collections::BTreeSet;
use std::fs::File;
use std::sync::Arc;

/// A sequence of per-entry statistic values
pub type StatisticSource = ChunkedSource<Box<dyn ChunkLoader<Item = f64>>>;

/// A finalized, memory backed operation result. Held in the repository's
/// in-process table and shared read-only between any number of sources.
pub struct InMemoryOperation {
    pub metadata: OperationMetadata,
    pub orientation: OperationOrientation,
    pub markers: Vec<(usize, MarkerKey)>,
    pub samples: Vec<(usize, SampleKey)>,
    pub chromosomes: Vec<(usize, ChromosomeKey)>,
    pub columns: Vec<(String, Vec<f64>)>,
}

impl InMemoryOperation {
    fn oriented_indices(&self) -> Vec<usize> {
        match self.orientation {
            OperationOrientation::Markers => self.markers.iter().map(|(i, _)| *i).collect(),
            OperationOrientation::Samples => self.samples.iter().map(|(i, _)| *i).collect(),
        }
    }
}

fn entries_from_columns(
    oriented_indices: Vec<usize>,
    columns: &[(String, Vec<f64>)],
) -> Vec<OperationEntry> {
    oriented_indices
        .into_iter()
        .enumerate()
        .map(|(row, original_index)| OperationEntry {
            original_index,
            values: columns.iter().map(|(_, values)| values[row]).collect(),
        })
        .collect()
}

fn samples_rows_from_origin(
    origin: &mut MatrixSource,
    chunk_size: usize,
    kept_markers: Vec<usize>,
    kept_samples: Vec<usize>,
) -> Result<GenotypeRowSource> {
    let loader: Box<dyn ChunkLoader<Item = Vec<Genotype>>> = Box::new(SampleRowLoader::new(
        origin.genotypes_variable()?,
        origin.num_markers(),
        origin.num_samples(),
        Some(kept_markers),
    ));
    Ok(OriginFilteredSource::new(
        ChunkedSource::new(loader, chunk_size)?,
        Some(kept_samples),
    ))
}

fn markers_rows_from_origin(
    origin: &mut MatrixSource,
    chunk_size: usize,
    kept_markers: Vec<usize>,
    kept_samples: Vec<usize>,
) -> Result<GenotypeRowSource> {
    let loader: Box<dyn ChunkLoader<Item = Vec<Genotype>>> = Box::new(MarkerRowLoader::new(
        origin.genotypes_variable()?,
        origin.num_markers(),
        origin.num_samples(),
        Some(kept_samples),
    ));
    Ok(OriginFilteredSource::new(
        ChunkedSource::new(loader, chunk_size)?,
        Some(kept_markers),
    ))
}

struct F64VarLoader {
    variable: Variable<File>,
}

impl ChunkLoader for F64VarLoader {
    type Item = f64;

    fn total_len(&mut self) -> Result<usize> {
        Ok(self.variable.len() as usize)
    }

    fn load_range(&mut self, start: usize, len: usize) -> Result<Vec<f64>> {
        Ok(self.variable.read_f64s(start as u64, len)?)
    }
}

fn read_key_entries<K>(
    reader: &ArrayFileReader<File>,
    indices_var: &str,
    count: usize,
    mut make_key: impl FnMut(&ArrayFileReader<File>, usize) -> Result<Vec<K>>,
) -> Result<KeysView<K>> {
    let mut indices = reader.variable(indices_var)?;
    let indices = indices.read_u64s(0, count)?;
    let keys = make_key(reader, count)?;
    Ok(KeysView::from_entries(
        indices
            .into_iter()
            .map(|i| i as usize)
            .zip(keys)
            .collect(),
    ))
}

/// The dataset source of a finalized, file backed operation result.
/// Key sequences come from the operation container itself; genotype rows
/// are resolved through the lazily opened origin matrix, narrowed by this
/// operation's kept original indices.
pub struct FileOperationSource {
    metadata: OperationMetadata,
    orientation: OperationOrientation,
    config: StorageConfig,
    reader: ArrayFileReader<File>,
    origin: Option<MatrixSource>,
    markers: Option<KeysView<MarkerKey>>,
    samples: Option<KeysView<SampleKey>>,
    chromosomes: Option<KeysView<ChromosomeKey>>,
}

impl FileOperationSource {
    pub fn open(config: &StorageConfig, metadata: OperationMetadata) -> Result<Self> {
        let path = config.operation_path(metadata.key);
        if !path.exists() {
            return Err(DatasetError::NotFound(DataSetKey::Operation(metadata.key)));
        }
        let reader = ArrayFileReader::open_file(&path)?;
        let orientation = match reader.attribute(layout::ATTR_ORIENTATION) {
            Some("samples") => OperationOrientation::Samples,
            Some("markers") => OperationOrientation::Markers,
            other => {
                return Err(DatasetError::Corrupted(format!(
                    "invalid operation orientation: {:?}",
                    other
                )))
            }
        };
        Ok(Self {
            metadata,
            orientation,
            config: config.clone(),
            reader,
            origin: None,
            markers: None,
            samples: None,
            chromosomes: None,
        })
    }

    pub fn metadata(&self) -> &OperationMetadata {
        &self.metadata
    }

    pub fn orientation(&self) -> OperationOrientation {
        self.orientation
    }

    fn origin(&mut self) -> Result<&mut MatrixSource> {
        if self.origin.is_none() {
            self.origin = Some(MatrixSource::open(&self.config, self.metadata.key.matrix)?);
        }
        Ok(self.origin.as_mut().unwrap())
    }

    pub fn column_names(&self) -> Vec<String> {
        self.reader
            .toc()
            .variables
            .iter()
            .filter_map(|v| v.name.strip_prefix(layout::RESULT_VAR_PREFIX))
            .map(ToOwned::to_owned)
            .collect()
    }

    /// The lazily loaded statistic values of one result column
    pub fn statistic_column(&mut self, name: &str) -> Result<StatisticSource> {
        let variable = self
            .reader
            .variable(&format!("{}{}", layout::RESULT_VAR_PREFIX, name))?;
        let loader: Box<dyn ChunkLoader<Item = f64>> = Box::new(F64VarLoader { variable });
        ChunkedSource::new(loader, self.config.chunk_size)
    }

    /// All entry rows, in original-index order
    pub fn entries(&mut self) -> Result<Vec<OperationEntry>> {
        let oriented = match self.orientation {
            OperationOrientation::Markers => self.markers_keys()?.original_indices(),
            OperationOrientation::Samples => self.samples_keys()?.original_indices(),
        };
        let mut columns = vec![];
        for name in self.column_names() {
            let mut variable = self
                .reader
                .variable(&format!("{}{}", layout::RESULT_VAR_PREFIX, name))?;
            let values = variable.read_f64s(0, oriented.len())?;
            columns.push((name, values));
        }
        Ok(entries_from_columns(oriented, &columns))
    }
}

impl DataSetSource for FileOperationSource {
    fn dataset_key(&self) -> DataSetKey {
        DataSetKey::Operation(self.metadata.key)
    }

    fn num_markers(&self) -> usize {
        self.metadata.num_markers
    }

    fn num_samples(&self) -> usize {
        self.metadata.num_samples
    }

    fn num_chromosomes(&self) -> usize {
        self.metadata.num_chromosomes
    }

    fn markers_keys(&mut self) -> Result<KeysView<MarkerKey>> {
        if self.markers.is_none() {
            let count = self.metadata.num_markers;
            self.markers = Some(read_key_entries(
                &self.reader,
                layout::VAR_MARKER_ORIGINAL_INDICES,
                count,
                |reader, count| {
                    let mut ids = reader.variable(matrix_layout::VAR_MARKER_IDS)?;
                    Ok(ids
                        .read_strs(0, count)?
                        .into_iter()
                        .map(MarkerKey::new)
                        .collect())
                },
            )?);
        }
        Ok(self.markers.clone().unwrap())
    }

    fn samples_keys(&mut self) -> Result<KeysView<SampleKey>> {
        if self.samples.is_none() {
            let count = self.metadata.num_samples;
            self.samples = Some(read_key_entries(
                &self.reader,
                layout::VAR_SAMPLE_ORIGINAL_INDICES,
                count,
                |reader, count| {
                    let mut ids = reader.variable(matrix_layout::VAR_SAMPLE_IDS)?;
                    let mut families = reader.variable(matrix_layout::VAR_SAMPLE_FAMILIES)?;
                    let ids = ids.read_strs(0, count)?;
                    let families = families.read_strs(0, count)?;
                    Ok(families
                        .into_iter()
                        .zip(ids)
                        .map(|(family_id, sample_id)| SampleKey::new(family_id, sample_id))
                        .collect())
                },
            )?);
        }
        Ok(self.samples.clone().unwrap())
    }

    fn chromosomes_keys(&mut self) -> Result<KeysView<ChromosomeKey>> {
        if self.chromosomes.is_none() {
            let count = self.metadata.num_chromosomes;
            self.chromosomes = Some(read_key_entries(
                &self.reader,
                layout::VAR_CHROMOSOME_ORIGINAL_INDICES,
                count,
                |reader, count| {
                    let mut names = reader.variable(matrix_layout::VAR_CHROMOSOME_NAMES)?;
                    Ok(names
                        .read_strs(0, count)?
                        .into_iter()
                        .map(ChromosomeKey::new)
                        .collect())
                },
            )?);
        }
        Ok(self.chromosomes.clone().unwrap())
    }

    fn markers_records(&mut self) -> Result<Vec<MarkerRecord>> {
        let wanted: BTreeSet<usize> = self.markers_keys()?.original_indices().into_iter().collect();
        let origin = self.origin()?;
        let records = origin.markers_records()?;
        Ok(pick_by_original_index(0..records.len(), records, &wanted))
    }

    fn samples_records(&mut self) -> Result<Vec<SampleRecord>> {
        let wanted: BTreeSet<usize> = self.samples_keys()?.original_indices().into_iter().collect();
        let origin = self.origin()?;
        let records = origin.samples_records()?;
        Ok(pick_by_original_index(0..records.len(), records, &wanted))
    }

    fn samples_genotypes(&mut self) -> Result<GenotypeRowSource> {
        let kept_markers = self.markers_keys()?.original_indices();
        let kept_samples = self.samples_keys()?.original_indices();
        let chunk_size = self.config.chunk_size;
        let origin = self.origin()?;
        samples_rows_from_origin(origin, chunk_size, kept_markers, kept_samples)
    }

    fn markers_genotypes(&mut self) -> Result<GenotypeRowSource> {
        let kept_markers = self.markers_keys()?.original_indices();
        let kept_samples = self.samples_keys()?.original_indices();
        let chunk_size = self.config.chunk_size;
        let origin = self.origin()?;
        markers_rows_from_origin(origin, chunk_size, kept_markers, kept_samples)
    }
}

/// The dataset source of a finalized, memory backed operation result
pub struct InMemoryOperationSource {
    data: Arc<InMemoryOperation>,
    config: StorageConfig,
    origin: Option<MatrixSource>,
}

impl InMemoryOperationSource {
    pub fn new(data: Arc<InMemoryOperation>, config: &StorageConfig) -> Self {
        Self {
            data,
            config: config.clone(),
            origin: None,
        }
    }

    fn origin(&mut self) -> Result<&mut MatrixSource> {
        if self.origin.is_none() {
            self.origin = Some(MatrixSource::open(
                &self.config,
                self.data.metadata.key.matrix,
            )?);
        }
        Ok(self.origin.as_mut().unwrap())
    }

    pub fn metadata(&self) -> &OperationMetadata {
        &self.data.metadata
    }

    pub fn orientation(&self) -> OperationOrientation {
        self.data.orientation
    }

    pub fn column_names(&self) -> Vec<String> {
        self.data.columns.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn statistic_column(&mut self, name: &str) -> Result<StatisticSource> {
        let values = self
            .data
            .columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.clone())
            .ok_or_else(|| DatasetError::Corrupted(format!("unknown result column: {}", name)))?;
        let loader: Box<dyn ChunkLoader<Item = f64>> = Box::new(VecLoader(values));
        ChunkedSource::new(loader, self.config.chunk_size)
    }

    pub fn entries(&mut self) -> Result<Vec<OperationEntry>> {
        Ok(entries_from_columns(
            self.data.oriented_indices(),
            &self.data.columns,
        ))
    }
}

impl DataSetSource for InMemoryOperationSource {
    fn dataset_key(&self) -> DataSetKey {
        DataSetKey::Operation(self.data.metadata.key)
    }

    fn num_markers(&self) -> usize {
        self.data.markers.len()
    }

    fn num_samples(&self) -> usize {
        self.data.samples.len()
    }

    fn num_chromosomes(&self) -> usize {
        self.data.chromosomes.len()
    }

    fn markers_keys(&mut self) -> Result<KeysView<MarkerKey>> {
        Ok(KeysView::from_entries(self.data.markers.clone()))
    }

    fn samples_keys(&mut self) -> Result<KeysView<SampleKey>> {
        Ok(KeysView::from_entries(self.data.samples.clone()))
    }

    fn chromosomes_keys(&mut self) -> Result<KeysView<ChromosomeKey>> {
        Ok(KeysView::from_entries(self.data.chromosomes.clone()))
    }

    fn markers_records(&mut self) -> Result<Vec<MarkerRecord>> {
        let wanted: BTreeSet<usize> = self.data.markers.iter().map(|(i, _)| *i).collect();
        let origin = self.origin()?;
        let records = origin.markers_records()?;
        Ok(pick_by_original_index(0..records.len(), records, &wanted))
    }

    fn samples_records(&mut self) -> Result<Vec<SampleRecord>> {
        let wanted: BTreeSet<usize> = self.data.samples.iter().map(|(i, _)| *i).collect();
        let origin = self.origin()?;
        let records = origin.samples_records()?;
        Ok(pick_by_original_index(0..records.len(), records, &wanted))
    }

    fn samples_genotypes(&mut self) -> Result<GenotypeRowSource> {
        let kept_markers: Vec<usize> = self.data.markers.iter().map(|(i, _)| *i).collect();
        let kept_samples: Vec<usize> = self.data.samples.iter().map(|(i, _)| *i).collect();
        let chunk_size = self.config.chunk_size;
        let origin = self.origin()?;
        samples_rows_from_origin(origin, chunk_size, kept_markers, kept_samples)
    }

    fn markers_genotypes(&mut self) -> Result<GenotypeRowSource> {
        let kept_markers: Vec<usize> = self.data.markers.iter().map(|(i, _)| *i).collect();
        let kept_samples: Vec<usize> = self.data.samples.iter().map(|(i, _)| *i).collect();
        let chunk_size = self.config.chunk_size;
        let origin = self.origin()?;
        markers_rows_from_origin(origin, chunk_size, kept_markers, kept_samples)
    }
}
