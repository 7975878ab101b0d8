use crate::error::Result;
use crate::keys::{ChromosomeKey, DataSetKey, MarkerKey, OperationKey, SampleKey};
use crate::matrix::layout as matrix_layout;
use crate::metadata::{now_secs, OperationMetadata};
use crate::operation::factory::DatasetRepository;
use crate::operation::{layout, OperationOrientation, OperationTypeInfo};
use crate::source::InMemoryOperation;
use genomat_arrayfile::{ArrayFileWriter, ElementType, VariableWriter};
use log::debug;
use std::fs::File;
use std::sync::Arc;

struct BufferedEntry {
    original_index: u64,
    key_a: String,
    key_b: Option<String>,
    values: Vec<f64>,
}

struct FileState {
    file: ArrayFileWriter<File>,
    oriented_indices: VariableWriter<File>,
    oriented_key_a: VariableWriter<File>,
    oriented_key_b: Option<VariableWriter<File>>,
    columns: Vec<VariableWriter<File>>,
}

enum Backend {
    Memory {
        markers: Vec<(usize, MarkerKey)>,
        samples: Vec<(usize, SampleKey)>,
        columns: Vec<Vec<f64>>,
    },
    File {
        state: Option<FileState>,
        buffer: Vec<BufferedEntry>,
        buffer_rows: usize,
    },
}

/// The write side of an operation dataset.
///
/// The writer moves through three states: fresh (counts not yet set),
/// writing (entries appended in strictly increasing original-index order)
/// and finalized (`finish_writing` consumed the writer). Breaking the
/// ordering, writing before the counts are set, or finalizing with a
/// mismatched entry count are programming errors and panic.
///
/// `finish_writing` flushes the backend, makes the operation metadata
/// durable and returns the key of the freshly stored operation; the result
/// is then readable by opening that key as a dataset source.
pub struct OperationDataSetWriter<'a> {
    repo: &'a DatasetRepository,
    type_info: OperationTypeInfo,
    parent: DataSetKey,
    key: OperationKey,
    num_markers: Option<usize>,
    num_samples: Option<usize>,
    num_chromosomes: Option<usize>,
    started_writing: bool,
    last_original_index: Option<usize>,
    entries_written: usize,
    marker_map: Option<Vec<(usize, MarkerKey)>>,
    sample_map: Option<Vec<(usize, SampleKey)>>,
    chromosome_map: Option<Vec<(usize, ChromosomeKey)>>,
    backend: Backend,
}

impl<'a> OperationDataSetWriter<'a> {
    pub(crate) fn new(
        repo: &'a DatasetRepository,
        type_info: OperationTypeInfo,
        parent: DataSetKey,
        key: OperationKey,
        in_memory: bool,
        buffer_rows: usize,
    ) -> Self {
        let backend = if in_memory {
            Backend::Memory {
                markers: vec![],
                samples: vec![],
                columns: vec![vec![]; type_info.columns.len()],
            }
        } else {
            Backend::File {
                state: None,
                buffer: vec![],
                buffer_rows,
            }
        };
        Self {
            repo,
            type_info,
            parent,
            key,
            num_markers: None,
            num_samples: None,
            num_chromosomes: None,
            started_writing: false,
            last_original_index: None,
            entries_written: 0,
            marker_map: None,
            sample_map: None,
            chromosome_map: None,
            backend,
        }
    }

    pub fn key(&self) -> OperationKey {
        self.key
    }

    pub fn orientation(&self) -> OperationOrientation {
        self.type_info.orientation
    }

    pub fn set_num_markers(&mut self, count: usize) -> &mut Self {
        assert!(!self.started_writing, "counts must be set before writing");
        self.num_markers = Some(count);
        self
    }

    pub fn set_num_samples(&mut self, count: usize) -> &mut Self {
        assert!(!self.started_writing, "counts must be set before writing");
        self.num_samples = Some(count);
        self
    }

    pub fn set_num_chromosomes(&mut self, count: usize) -> &mut Self {
        assert!(!self.started_writing, "counts must be set before writing");
        self.num_chromosomes = Some(count);
        self
    }

    /// Seed the kept-marker map. Only meaningful for samples-oriented
    /// operations; for markers-oriented ones the map is accumulated from
    /// the entry stream.
    pub fn set_marker_keys(&mut self, entries: Vec<(usize, MarkerKey)>) -> &mut Self {
        assert_eq!(
            OperationOrientation::Samples,
            self.type_info.orientation,
            "marker keys of a markers-oriented operation come from its entries"
        );
        self.marker_map = Some(entries);
        self
    }

    /// Seed the kept-sample map of a markers-oriented operation.
    pub fn set_sample_keys(&mut self, entries: Vec<(usize, SampleKey)>) -> &mut Self {
        assert_eq!(
            OperationOrientation::Markers,
            self.type_info.orientation,
            "sample keys of a samples-oriented operation come from its entries"
        );
        self.sample_map = Some(entries);
        self
    }

    pub fn set_chromosome_keys(&mut self, entries: Vec<(usize, ChromosomeKey)>) -> &mut Self {
        self.chromosome_map = Some(entries);
        self
    }

    fn counts(&self) -> (usize, usize, usize) {
        (
            self.num_markers
                .expect("marker count must be set before writing"),
            self.num_samples
                .expect("sample count must be set before writing"),
            self.num_chromosomes
                .expect("chromosome count must be set before writing"),
        )
    }

    fn oriented_count(&self) -> usize {
        let (markers, samples, _) = self.counts();
        match self.type_info.orientation {
            OperationOrientation::Markers => markers,
            OperationOrientation::Samples => samples,
        }
    }

    fn ensure_writing(&mut self) -> Result<()> {
        let (num_markers, num_samples, num_chromosomes) = self.counts();
        if self.started_writing {
            return Ok(());
        }
        self.started_writing = true;
        if let Backend::File { state, .. } = &mut self.backend {
            let config = self.repo.config();
            std::fs::create_dir_all(&config.data_dir)?;
            let path = config.operation_path(self.key);
            debug!("creating operation container for {} at {:?}", self.key, path);
            let mut file = ArrayFileWriter::create_file(&path)?;
            file.add_dimension(matrix_layout::DIM_MARKERS, num_markers as u64)
                .add_dimension(matrix_layout::DIM_SAMPLES, num_samples as u64)
                .add_dimension(matrix_layout::DIM_CHROMOSOMES, num_chromosomes as u64)
                .set_attribute(layout::ATTR_OPERATION_TYPE, self.type_info.id)
                .set_attribute(
                    layout::ATTR_ORIENTATION,
                    self.type_info.orientation.as_str(),
                )
                .set_attribute(
                    layout::ATTR_PARENT,
                    &serde_json::to_string(&self.parent).map_err(std::io::Error::from)?,
                );
            let oriented = match self.type_info.orientation {
                OperationOrientation::Markers => num_markers as u64,
                OperationOrientation::Samples => num_samples as u64,
            };
            let (oriented_indices, oriented_key_a, oriented_key_b) =
                match self.type_info.orientation {
                    OperationOrientation::Markers => (
                        file.create_variable(
                            layout::VAR_MARKER_ORIGINAL_INDICES,
                            ElementType::U64,
                            &[oriented],
                        )?,
                        file.create_variable(
                            matrix_layout::VAR_MARKER_IDS,
                            ElementType::FixedStr(matrix_layout::MARKER_ID_WIDTH),
                            &[oriented],
                        )?,
                        None,
                    ),
                    OperationOrientation::Samples => (
                        file.create_variable(
                            layout::VAR_SAMPLE_ORIGINAL_INDICES,
                            ElementType::U64,
                            &[oriented],
                        )?,
                        file.create_variable(
                            matrix_layout::VAR_SAMPLE_IDS,
                            ElementType::FixedStr(matrix_layout::SAMPLE_ID_WIDTH),
                            &[oriented],
                        )?,
                        Some(file.create_variable(
                            matrix_layout::VAR_SAMPLE_FAMILIES,
                            ElementType::FixedStr(matrix_layout::FAMILY_ID_WIDTH),
                            &[oriented],
                        )?),
                    ),
                };
            let columns = self
                .type_info
                .columns
                .iter()
                .map(|name| {
                    file.create_variable(
                        &format!("{}{}", layout::RESULT_VAR_PREFIX, name),
                        ElementType::F64,
                        &[oriented],
                    )
                })
                .collect::<std::io::Result<Vec<_>>>()?;
            *state = Some(FileState {
                file,
                oriented_indices,
                oriented_key_a,
                oriented_key_b,
                columns,
            });
        }
        Ok(())
    }

    fn check_entry(&mut self, original_index: usize, values: &[f64]) {
        assert_eq!(
            self.type_info.columns.len(),
            values.len(),
            "entry value count does not match the registered result columns"
        );
        if let Some(last) = self.last_original_index {
            assert!(
                original_index > last,
                "entries must be written in increasing original-index order \
                 ({} after {})",
                original_index,
                last
            );
        }
        assert!(
            self.entries_written < self.oriented_count(),
            "more entries than the declared count"
        );
        self.last_original_index = Some(original_index);
        self.entries_written += 1;
    }

    fn flush_buffer(&mut self) -> Result<()> {
        if let Backend::File { state, buffer, .. } = &mut self.backend {
            let state = state.as_mut().expect("file backend was never opened");
            for entry in buffer.drain(..) {
                state.oriented_indices.put_u64s(&[entry.original_index])?;
                state.oriented_key_a.put_str(&entry.key_a)?;
                if let Some(key_b) = &mut state.oriented_key_b {
                    key_b.put_str(entry.key_b.as_deref().unwrap_or(""))?;
                }
                for (variable, value) in state.columns.iter_mut().zip(&entry.values) {
                    variable.put_f64s(&[*value])?;
                }
            }
        }
        Ok(())
    }

    fn push_entry(&mut self, entry: BufferedEntry) -> Result<()> {
        match &mut self.backend {
            Backend::Memory { .. } => unreachable!("memory backend entries are pushed directly"),
            Backend::File {
                buffer, buffer_rows, ..
            } => {
                buffer.push(entry);
                let full = buffer.len() >= *buffer_rows;
                if full {
                    self.flush_buffer()?;
                }
            }
        }
        Ok(())
    }

    /// Append one entry of a markers-oriented operation.
    pub fn add_marker_entry(
        &mut self,
        original_index: usize,
        key: MarkerKey,
        values: &[f64],
    ) -> Result<()> {
        assert_eq!(
            OperationOrientation::Markers,
            self.type_info.orientation,
            "marker entries on a samples-oriented operation"
        );
        self.ensure_writing()?;
        self.check_entry(original_index, values);
        match &mut self.backend {
            Backend::Memory {
                markers, columns, ..
            } => {
                for (column, value) in columns.iter_mut().zip(values) {
                    column.push(*value);
                }
                markers.push((original_index, key));
                Ok(())
            }
            Backend::File { .. } => self.push_entry(BufferedEntry {
                original_index: original_index as u64,
                key_a: key.marker_id,
                key_b: None,
                values: values.to_vec(),
            }),
        }
    }

    /// Append one entry of a samples-oriented operation.
    pub fn add_sample_entry(
        &mut self,
        original_index: usize,
        key: SampleKey,
        values: &[f64],
    ) -> Result<()> {
        assert_eq!(
            OperationOrientation::Samples,
            self.type_info.orientation,
            "sample entries on a markers-oriented operation"
        );
        self.ensure_writing()?;
        self.check_entry(original_index, values);
        match &mut self.backend {
            Backend::Memory {
                samples, columns, ..
            } => {
                for (column, value) in columns.iter_mut().zip(values) {
                    column.push(*value);
                }
                samples.push((original_index, key));
                Ok(())
            }
            Backend::File { .. } => self.push_entry(BufferedEntry {
                original_index: original_index as u64,
                key_a: key.sample_id,
                key_b: Some(key.family_id),
                values: values.to_vec(),
            }),
        }
    }

    fn build_metadata(&self, in_memory: bool) -> OperationMetadata {
        let (num_markers, num_samples, num_chromosomes) = self.counts();
        OperationMetadata {
            key: self.key,
            parent: self.parent,
            operation_type: self.type_info.id.to_string(),
            friendly_name: self.type_info.name.to_string(),
            description: format!("{} on {}", self.type_info.name, self.parent),
            num_markers,
            num_samples,
            num_chromosomes,
            in_memory,
            created_secs: now_secs(),
        }
    }

    /// Seal the operation dataset and make its metadata durable. Returns
    /// the key the finalized result is addressable by.
    pub fn finish_writing(mut self) -> Result<OperationKey> {
        self.ensure_writing()?;
        assert_eq!(
            self.oriented_count(),
            self.entries_written,
            "finalized with fewer entries than the declared count"
        );
        let chromosome_map = self
            .chromosome_map
            .take()
            .expect("chromosome keys must be set before finalizing");
        assert_eq!(
            self.num_chromosomes.unwrap(),
            chromosome_map.len(),
            "chromosome key map does not match the declared count"
        );

        let key = self.key;
        self.flush_buffer()?;
        match std::mem::replace(
            &mut self.backend,
            Backend::File {
                state: None,
                buffer: vec![],
                buffer_rows: 0,
            },
        ) {
            Backend::Memory {
                markers,
                samples,
                columns,
            } => {
                let (markers, samples) = match self.type_info.orientation {
                    OperationOrientation::Markers => (
                        markers,
                        self.sample_map
                            .take()
                            .expect("sample keys must be set before finalizing"),
                    ),
                    OperationOrientation::Samples => (
                        self.marker_map
                            .take()
                            .expect("marker keys must be set before finalizing"),
                        samples,
                    ),
                };
                assert_eq!(self.num_markers.unwrap(), markers.len());
                assert_eq!(self.num_samples.unwrap(), samples.len());
                let metadata = self.build_metadata(true);
                let data = InMemoryOperation {
                    metadata: metadata.clone(),
                    orientation: self.type_info.orientation,
                    markers,
                    samples,
                    chromosomes: chromosome_map,
                    columns: self
                        .type_info
                        .columns
                        .iter()
                        .map(|name| name.to_string())
                        .zip(columns)
                        .collect(),
                };
                self.repo.store().insert_operation_metadata(metadata)?;
                self.repo.register_in_memory(key, Arc::new(data));
            }
            Backend::File { state, .. } => {
                let state = state.expect("file backend was never opened");
                let mut file = state.file;
                match self.type_info.orientation {
                    OperationOrientation::Markers => {
                        let sample_map = self
                            .sample_map
                            .take()
                            .expect("sample keys must be set before finalizing");
                        assert_eq!(self.num_samples.unwrap(), sample_map.len());
                        let count = sample_map.len() as u64;
                        let mut indices = file.create_variable(
                            layout::VAR_SAMPLE_ORIGINAL_INDICES,
                            ElementType::U64,
                            &[count],
                        )?;
                        let mut ids = file.create_variable(
                            matrix_layout::VAR_SAMPLE_IDS,
                            ElementType::FixedStr(matrix_layout::SAMPLE_ID_WIDTH),
                            &[count],
                        )?;
                        let mut families = file.create_variable(
                            matrix_layout::VAR_SAMPLE_FAMILIES,
                            ElementType::FixedStr(matrix_layout::FAMILY_ID_WIDTH),
                            &[count],
                        )?;
                        for (original_index, sample) in &sample_map {
                            indices.put_u64s(&[*original_index as u64])?;
                            ids.put_str(&sample.sample_id)?;
                            families.put_str(&sample.family_id)?;
                        }
                    }
                    OperationOrientation::Samples => {
                        let marker_map = self
                            .marker_map
                            .take()
                            .expect("marker keys must be set before finalizing");
                        assert_eq!(self.num_markers.unwrap(), marker_map.len());
                        let count = marker_map.len() as u64;
                        let mut indices = file.create_variable(
                            layout::VAR_MARKER_ORIGINAL_INDICES,
                            ElementType::U64,
                            &[count],
                        )?;
                        let mut ids = file.create_variable(
                            matrix_layout::VAR_MARKER_IDS,
                            ElementType::FixedStr(matrix_layout::MARKER_ID_WIDTH),
                            &[count],
                        )?;
                        for (original_index, marker) in &marker_map {
                            indices.put_u64s(&[*original_index as u64])?;
                            ids.put_str(&marker.marker_id)?;
                        }
                    }
                }
                let count = chromosome_map.len() as u64;
                let mut indices = file.create_variable(
                    layout::VAR_CHROMOSOME_ORIGINAL_INDICES,
                    ElementType::U64,
                    &[count],
                )?;
                let mut names = file.create_variable(
                    matrix_layout::VAR_CHROMOSOME_NAMES,
                    ElementType::FixedStr(matrix_layout::CHROMOSOME_WIDTH),
                    &[count],
                )?;
                for (original_index, chromosome) in &chromosome_map {
                    indices.put_u64s(&[*original_index as u64])?;
                    names.put_str(&chromosome.name)?;
                }
                file.seal()?;
                debug!("sealed operation container for {}", key);
                self.repo
                    .store()
                    .insert_operation_metadata(self.build_metadata(false))?;
            }
        }
        Ok(key)
    }

    /// Drop the unfinished dataset, removing any backing storage that was
    /// already allocated. The allocated key is never reused.
    pub fn discard(self) -> Result<()> {
        if let Backend::File { state: Some(_), .. } = &self.backend {
            let path = self.repo.config().operation_path(self.key);
            if path.exists() {
                std::fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}
