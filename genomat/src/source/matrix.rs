use crate::config::StorageConfig;
use crate::error::{DatasetError, Result};
use crate::genotype::{Affection, Genotype, MarkerRecord, SampleRecord, Sex};
use crate::keys::{ChromosomeKey, DataSetKey, MarkerKey, MatrixKey, SampleKey};
use crate::matrix::layout;
use crate::source::chunked::{ChunkLoader, ChunkedSource};
use crate::source::filtered::OriginFilteredSource;
use crate::source::{DataSetSource, GenotypeRowSource, KeysView};
use genomat_arrayfile::{ArrayFileReader, Variable};
use std::fs::File;

fn dim(reader: &ArrayFileReader<File>, name: &str) -> Result<usize> {
    reader
        .dimension(name)
        .map(|v| v as usize)
        .ok_or_else(|| DatasetError::Corrupted(format!("missing dimension: {}", name)))
}

fn parse_rows(buf: &[u8], row_len: usize) -> Vec<Vec<Genotype>> {
    buf.chunks_exact(row_len * 2)
        .map(|row| {
            row.chunks_exact(2)
                .map(|pair| Genotype([pair[0], pair[1]]))
                .collect()
        })
        .collect()
}

/// Loads per-sample genotype rows from the [sample, marker] variable of a
/// matrix container. With `kept_markers` set, each loaded row is narrowed to
/// the kept marker positions.
pub(crate) struct SampleRowLoader {
    genotypes: Variable<File>,
    origin_markers: usize,
    origin_samples: usize,
    kept_markers: Option<Vec<usize>>,
}

impl SampleRowLoader {
    pub(crate) fn new(
        genotypes: Variable<File>,
        origin_markers: usize,
        origin_samples: usize,
        kept_markers: Option<Vec<usize>>,
    ) -> Self {
        Self {
            genotypes,
            origin_markers,
            origin_samples,
            kept_markers,
        }
    }
}

impl ChunkLoader for SampleRowLoader {
    type Item = Vec<Genotype>;

    fn total_len(&mut self) -> Result<usize> {
        Ok(self.origin_samples)
    }

    fn load_range(&mut self, start: usize, len: usize) -> Result<Vec<Vec<Genotype>>> {
        let mut buf = vec![0u8; len * self.origin_markers * 2];
        self.genotypes
            .read_bytes((start * self.origin_markers) as u64, &mut buf)?;
        let mut rows = parse_rows(&buf, self.origin_markers);
        if let Some(kept) = &self.kept_markers {
            for row in &mut rows {
                *row = kept.iter().map(|&m| row[m]).collect();
            }
        }
        Ok(rows)
    }
}

/// Loads per-marker genotype rows from the same [sample, marker] variable.
/// Marker rows are strided in the file, so a chunk is gathered with one
/// contiguous read per sample.
pub(crate) struct MarkerRowLoader {
    genotypes: Variable<File>,
    origin_markers: usize,
    origin_samples: usize,
    kept_samples: Option<Vec<usize>>,
}

impl MarkerRowLoader {
    pub(crate) fn new(
        genotypes: Variable<File>,
        origin_markers: usize,
        origin_samples: usize,
        kept_samples: Option<Vec<usize>>,
    ) -> Self {
        Self {
            genotypes,
            origin_markers,
            origin_samples,
            kept_samples,
        }
    }

    fn sample_rows(&self) -> Vec<usize> {
        match &self.kept_samples {
            Some(kept) => kept.clone(),
            None => (0..self.origin_samples).collect(),
        }
    }
}

impl ChunkLoader for MarkerRowLoader {
    type Item = Vec<Genotype>;

    fn total_len(&mut self) -> Result<usize> {
        Ok(self.origin_markers)
    }

    fn load_range(&mut self, start: usize, len: usize) -> Result<Vec<Vec<Genotype>>> {
        let samples = self.sample_rows();
        let mut rows = vec![Vec::with_capacity(samples.len()); len];
        let mut buf = vec![0u8; len * 2];
        for &sample in &samples {
            self.genotypes
                .read_bytes((sample * self.origin_markers + start) as u64, &mut buf)?;
            for (row, pair) in rows.iter_mut().zip(buf.chunks_exact(2)) {
                row.push(Genotype([pair[0], pair[1]]));
            }
        }
        Ok(rows)
    }
}

/// The dataset source of a stored genotype matrix. This is the origin every
/// derived view ultimately resolves to; none of its sequences are filtered.
pub struct MatrixSource {
    key: MatrixKey,
    config: StorageConfig,
    reader: ArrayFileReader<File>,
    num_markers: usize,
    num_samples: usize,
    num_chromosomes: usize,
    markers: Option<KeysView<MarkerKey>>,
    samples: Option<KeysView<SampleKey>>,
    chromosomes: Option<KeysView<ChromosomeKey>>,
}

impl MatrixSource {
    pub fn open(config: &StorageConfig, key: MatrixKey) -> Result<Self> {
        let path = config.matrix_path(key);
        if !path.exists() {
            return Err(DatasetError::NotFound(DataSetKey::Matrix(key)));
        }
        let reader = ArrayFileReader::open_file(&path)?;
        let num_markers = dim(&reader, layout::DIM_MARKERS)?;
        let num_samples = dim(&reader, layout::DIM_SAMPLES)?;
        let num_chromosomes = dim(&reader, layout::DIM_CHROMOSOMES)?;
        Ok(Self {
            key,
            config: config.clone(),
            reader,
            num_markers,
            num_samples,
            num_chromosomes,
            markers: None,
            samples: None,
            chromosomes: None,
        })
    }

    pub fn key(&self) -> MatrixKey {
        self.key
    }

    pub fn technology(&self) -> &str {
        self.reader
            .attribute(layout::ATTR_TECHNOLOGY)
            .unwrap_or("UNKNOWN")
    }

    pub fn strand(&self) -> &str {
        self.reader.attribute(layout::ATTR_STRAND).unwrap_or("+")
    }

    pub(crate) fn genotypes_variable(&self) -> Result<Variable<File>> {
        Ok(self.reader.variable(layout::VAR_GENOTYPES)?)
    }

    /// Per-chromosome marker counts, index aligned with `chromosomes_keys`
    pub fn chromosome_marker_counts(&mut self) -> Result<Vec<usize>> {
        let mut counts = self
            .reader
            .variable(layout::VAR_CHROMOSOME_MARKER_COUNTS)?;
        let n = self.num_chromosomes;
        Ok(counts.read_i32s(0, n)?.into_iter().map(|v| v as usize).collect())
    }
}

impl DataSetSource for MatrixSource {
    fn dataset_key(&self) -> DataSetKey {
        DataSetKey::Matrix(self.key)
    }

    fn num_markers(&self) -> usize {
        self.num_markers
    }

    fn num_samples(&self) -> usize {
        self.num_samples
    }

    fn num_chromosomes(&self) -> usize {
        self.num_chromosomes
    }

    fn markers_keys(&mut self) -> Result<KeysView<MarkerKey>> {
        if self.markers.is_none() {
            let mut ids = self.reader.variable(layout::VAR_MARKER_IDS)?;
            let keys = ids
                .read_strs(0, self.num_markers)?
                .into_iter()
                .map(MarkerKey::new)
                .collect();
            self.markers = Some(KeysView::identity(keys));
        }
        Ok(self.markers.clone().unwrap())
    }

    fn samples_keys(&mut self) -> Result<KeysView<SampleKey>> {
        if self.samples.is_none() {
            let mut ids = self.reader.variable(layout::VAR_SAMPLE_IDS)?;
            let mut families = self.reader.variable(layout::VAR_SAMPLE_FAMILIES)?;
            let ids = ids.read_strs(0, self.num_samples)?;
            let families = families.read_strs(0, self.num_samples)?;
            let keys = families
                .into_iter()
                .zip(ids)
                .map(|(family_id, sample_id)| SampleKey::new(family_id, sample_id))
                .collect();
            self.samples = Some(KeysView::identity(keys));
        }
        Ok(self.samples.clone().unwrap())
    }

    fn chromosomes_keys(&mut self) -> Result<KeysView<ChromosomeKey>> {
        if self.chromosomes.is_none() {
            let mut names = self.reader.variable(layout::VAR_CHROMOSOME_NAMES)?;
            let keys = names
                .read_strs(0, self.num_chromosomes)?
                .into_iter()
                .map(ChromosomeKey::new)
                .collect();
            self.chromosomes = Some(KeysView::identity(keys));
        }
        Ok(self.chromosomes.clone().unwrap())
    }

    fn markers_records(&mut self) -> Result<Vec<MarkerRecord>> {
        let keys = self.markers_keys()?;
        let mut rsids = self.reader.variable(layout::VAR_MARKER_RSIDS)?;
        let mut chroms = self.reader.variable(layout::VAR_MARKER_CHROMOSOMES)?;
        let mut positions = self.reader.variable(layout::VAR_MARKER_POSITIONS)?;
        let rsids = rsids.read_strs(0, self.num_markers)?;
        let chroms = chroms.read_strs(0, self.num_markers)?;
        let positions = positions.read_i32s(0, self.num_markers)?;
        Ok(keys
            .keys()
            .cloned()
            .zip(rsids)
            .zip(chroms)
            .zip(positions)
            .map(|(((key, rs_id), chromosome), position)| MarkerRecord {
                key,
                rs_id,
                chromosome: ChromosomeKey::new(chromosome),
                position,
            })
            .collect())
    }

    fn samples_records(&mut self) -> Result<Vec<SampleRecord>> {
        let keys = self.samples_keys()?;
        let mut affections = self.reader.variable(layout::VAR_SAMPLE_AFFECTIONS)?;
        let mut sexes = self.reader.variable(layout::VAR_SAMPLE_SEXES)?;
        let mut affection_codes = vec![0u8; self.num_samples];
        affections.read_bytes(0, &mut affection_codes)?;
        let mut sex_codes = vec![0u8; self.num_samples];
        sexes.read_bytes(0, &mut sex_codes)?;
        Ok(keys
            .keys()
            .cloned()
            .zip(affection_codes)
            .zip(sex_codes)
            .map(|((key, affection), sex)| SampleRecord {
                key,
                affection: Affection::from_code(affection),
                sex: Sex::from_code(sex),
            })
            .collect())
    }

    fn samples_genotypes(&mut self) -> Result<GenotypeRowSource> {
        let loader: Box<dyn ChunkLoader<Item = Vec<Genotype>>> = Box::new(SampleRowLoader::new(
            self.genotypes_variable()?,
            self.num_markers,
            self.num_samples,
            None,
        ));
        Ok(OriginFilteredSource::identity(ChunkedSource::new(
            loader,
            self.config.chunk_size,
        )?))
    }

    fn markers_genotypes(&mut self) -> Result<GenotypeRowSource> {
        let loader: Box<dyn ChunkLoader<Item = Vec<Genotype>>> = Box::new(MarkerRowLoader::new(
            self.genotypes_variable()?,
            self.num_markers,
            self.num_samples,
            None,
        ));
        Ok(OriginFilteredSource::identity(ChunkedSource::new(
            loader,
            self.config.chunk_size,
        )?))
    }
}
