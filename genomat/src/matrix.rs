use crate::config::StorageConfig;
use crate::error::{DatasetError, Result};
use crate::genotype::{Genotype, MarkerRecord, SampleRecord};
use crate::keys::{ChromosomeKey, MatrixKey, StudyId};
use crate::metadata::{now_secs, MatrixMetadata, FORMAT_VERSION};
use crate::store::MetadataStore;
use genomat_arrayfile::{ArrayFileWriter, ElementType, VariableWriter};
use log::debug;
use std::fs::File;

/// Names of the dimensions, variables and global attributes of a matrix
/// container file.
pub mod layout {
    pub const DIM_MARKERS: &str = "markers";
    pub const DIM_SAMPLES: &str = "samples";
    pub const DIM_CHROMOSOMES: &str = "chromosomes";

    pub const VAR_MARKER_IDS: &str = "marker_ids";
    pub const VAR_MARKER_RSIDS: &str = "marker_rsids";
    pub const VAR_MARKER_CHROMOSOMES: &str = "marker_chromosomes";
    pub const VAR_MARKER_POSITIONS: &str = "marker_positions";
    pub const VAR_SAMPLE_IDS: &str = "sample_ids";
    pub const VAR_SAMPLE_FAMILIES: &str = "sample_families";
    pub const VAR_SAMPLE_AFFECTIONS: &str = "sample_affections";
    pub const VAR_SAMPLE_SEXES: &str = "sample_sexes";
    pub const VAR_CHROMOSOME_NAMES: &str = "chromosome_names";
    pub const VAR_CHROMOSOME_MARKER_COUNTS: &str = "chromosome_marker_counts";
    /// Genotype byte pairs indexed by [sample, marker]
    pub const VAR_GENOTYPES: &str = "genotypes";

    pub const ATTR_STUDY_ID: &str = "study_id";
    pub const ATTR_TECHNOLOGY: &str = "technology";
    pub const ATTR_STRAND: &str = "strand";
    pub const ATTR_FORMAT_VERSION: &str = "format_version";
    pub const ATTR_HAS_DICTIONARY: &str = "has_dictionary";
    pub const ATTR_FRIENDLY_NAME: &str = "friendly_name";
    pub const ATTR_DESCRIPTION: &str = "description";

    pub const MARKER_ID_WIDTH: u16 = 64;
    pub const RSID_WIDTH: u16 = 32;
    pub const SAMPLE_ID_WIDTH: u16 = 32;
    pub const FAMILY_ID_WIDTH: u16 = 32;
    pub const CHROMOSOME_WIDTH: u16 = 16;
}

/// The builder that is used to create a stored genotype matrix
pub struct MatrixBuilder {
    study: StudyId,
    friendly_name: String,
    description: String,
    technology: String,
    strand: String,
    has_dictionary: bool,
    markers: Vec<MarkerRecord>,
    samples: Vec<SampleRecord>,
    chromosomes: Vec<(ChromosomeKey, usize)>,
}

impl MatrixBuilder {
    pub fn new<S: Into<String>>(study: StudyId, friendly_name: S) -> Self {
        Self {
            study,
            friendly_name: friendly_name.into(),
            description: String::new(),
            technology: "UNKNOWN".to_string(),
            strand: "+".to_string(),
            has_dictionary: false,
            markers: vec![],
            samples: vec![],
            chromosomes: vec![],
        }
    }

    pub fn set_description<S: Into<String>>(&mut self, value: S) -> &mut Self {
        self.description = value.into();
        self
    }

    pub fn set_technology<S: Into<String>>(&mut self, value: S) -> &mut Self {
        self.technology = value.into();
        self
    }

    pub fn set_strand<S: Into<String>>(&mut self, value: S) -> &mut Self {
        self.strand = value.into();
        self
    }

    pub fn set_has_dictionary(&mut self, value: bool) -> &mut Self {
        self.has_dictionary = value;
        self
    }

    pub fn append_markers<I: IntoIterator<Item = MarkerRecord>>(&mut self, it: I) -> &mut Self {
        self.markers.extend(it);
        self
    }

    pub fn append_samples<I: IntoIterator<Item = SampleRecord>>(&mut self, it: I) -> &mut Self {
        self.samples.extend(it);
        self
    }

    /// Append chromosome records; the count is the number of markers sitting
    /// on that chromosome.
    pub fn append_chromosomes<I: IntoIterator<Item = (ChromosomeKey, usize)>>(
        &mut self,
        it: I,
    ) -> &mut Self {
        self.chromosomes.extend(it);
        self
    }

    /// Allocate a matrix key, create the container file and write every
    /// table except the genotypes, which are streamed through the returned
    /// writer one sample row at a time.
    pub fn create<'a>(
        &mut self,
        config: &StorageConfig,
        store: &'a dyn MetadataStore,
    ) -> Result<MatrixWriter<'a>> {
        let key = store.allocate_matrix_key(self.study)?;
        std::fs::create_dir_all(&config.data_dir)?;
        let path = config.matrix_path(key);
        debug!("creating matrix container for {} at {:?}", key, path);

        let mut file = ArrayFileWriter::create_file(&path)?;
        file.add_dimension(layout::DIM_MARKERS, self.markers.len() as u64)
            .add_dimension(layout::DIM_SAMPLES, self.samples.len() as u64)
            .add_dimension(layout::DIM_CHROMOSOMES, self.chromosomes.len() as u64)
            .set_attribute(layout::ATTR_STUDY_ID, &self.study.0.to_string())
            .set_attribute(layout::ATTR_TECHNOLOGY, &self.technology)
            .set_attribute(layout::ATTR_STRAND, &self.strand)
            .set_attribute(layout::ATTR_FORMAT_VERSION, FORMAT_VERSION)
            .set_attribute(
                layout::ATTR_HAS_DICTIONARY,
                if self.has_dictionary { "1" } else { "0" },
            )
            .set_attribute(layout::ATTR_FRIENDLY_NAME, &self.friendly_name)
            .set_attribute(layout::ATTR_DESCRIPTION, &self.description);

        let num_markers = self.markers.len() as u64;
        let num_samples = self.samples.len() as u64;
        let num_chromosomes = self.chromosomes.len() as u64;

        let mut ids = file.create_variable(
            layout::VAR_MARKER_IDS,
            ElementType::FixedStr(layout::MARKER_ID_WIDTH),
            &[num_markers],
        )?;
        let mut rsids = file.create_variable(
            layout::VAR_MARKER_RSIDS,
            ElementType::FixedStr(layout::RSID_WIDTH),
            &[num_markers],
        )?;
        let mut chroms = file.create_variable(
            layout::VAR_MARKER_CHROMOSOMES,
            ElementType::FixedStr(layout::CHROMOSOME_WIDTH),
            &[num_markers],
        )?;
        let mut positions =
            file.create_variable(layout::VAR_MARKER_POSITIONS, ElementType::I32, &[num_markers])?;
        for marker in &self.markers {
            ids.put_str(&marker.key.marker_id)?;
            rsids.put_str(&marker.rs_id)?;
            chroms.put_str(&marker.chromosome.name)?;
            positions.put_i32s(&[marker.position])?;
        }

        let mut sample_ids = file.create_variable(
            layout::VAR_SAMPLE_IDS,
            ElementType::FixedStr(layout::SAMPLE_ID_WIDTH),
            &[num_samples],
        )?;
        let mut families = file.create_variable(
            layout::VAR_SAMPLE_FAMILIES,
            ElementType::FixedStr(layout::FAMILY_ID_WIDTH),
            &[num_samples],
        )?;
        let mut affections =
            file.create_variable(layout::VAR_SAMPLE_AFFECTIONS, ElementType::U8, &[num_samples])?;
        let mut sexes =
            file.create_variable(layout::VAR_SAMPLE_SEXES, ElementType::U8, &[num_samples])?;
        for sample in &self.samples {
            sample_ids.put_str(&sample.key.sample_id)?;
            families.put_str(&sample.key.family_id)?;
            affections.put_bytes(&[sample.affection.code()])?;
            sexes.put_bytes(&[sample.sex.code()])?;
        }

        let mut chrom_names = file.create_variable(
            layout::VAR_CHROMOSOME_NAMES,
            ElementType::FixedStr(layout::CHROMOSOME_WIDTH),
            &[num_chromosomes],
        )?;
        let mut chrom_counts = file.create_variable(
            layout::VAR_CHROMOSOME_MARKER_COUNTS,
            ElementType::I32,
            &[num_chromosomes],
        )?;
        for (chromosome, count) in &self.chromosomes {
            chrom_names.put_str(&chromosome.name)?;
            chrom_counts.put_i32s(&[*count as i32])?;
        }

        let genotypes = file.create_variable(
            layout::VAR_GENOTYPES,
            ElementType::BytePair,
            &[num_samples, num_markers],
        )?;

        let metadata = MatrixMetadata {
            key,
            friendly_name: std::mem::take(&mut self.friendly_name),
            description: self.description.clone(),
            technology: self.technology.clone(),
            strand: self.strand.clone(),
            format_version: FORMAT_VERSION.to_string(),
            has_dictionary: self.has_dictionary,
            num_markers: self.markers.len(),
            num_samples: self.samples.len(),
            num_chromosomes: self.chromosomes.len(),
            created_secs: now_secs(),
        };

        Ok(MatrixWriter {
            store,
            metadata,
            file: Some(file),
            genotypes,
            rows_written: 0,
        })
    }
}

/// Streams genotype rows into a freshly created matrix container. Rows are
/// written sample-major, one call per sample, in sample order.
pub struct MatrixWriter<'a> {
    store: &'a dyn MetadataStore,
    metadata: MatrixMetadata,
    file: Option<ArrayFileWriter<File>>,
    genotypes: VariableWriter<File>,
    rows_written: usize,
}

impl<'a> MatrixWriter<'a> {
    pub fn key(&self) -> MatrixKey {
        self.metadata.key
    }

    pub fn write_sample_row(&mut self, genotypes: &[Genotype]) -> Result<()> {
        assert_eq!(
            genotypes.len(),
            self.metadata.num_markers,
            "genotype row length does not match the marker count"
        );
        assert!(
            self.rows_written < self.metadata.num_samples,
            "more genotype rows than samples"
        );
        let mut buf = Vec::with_capacity(genotypes.len() * 2);
        for genotype in genotypes {
            buf.extend_from_slice(&genotype.0);
        }
        self.genotypes.put_bytes(&buf)?;
        self.rows_written += 1;
        Ok(())
    }

    /// Seal the container and make the matrix metadata durable. Returns the
    /// key of the stored matrix.
    pub fn finish(mut self) -> Result<MatrixKey> {
        if self.rows_written != self.metadata.num_samples {
            return Err(DatasetError::Corrupted(format!(
                "matrix sealed with {} of {} sample rows",
                self.rows_written, self.metadata.num_samples
            )));
        }
        let file = self.file.take().expect("matrix writer finished twice");
        file.seal()?;
        debug!("sealed matrix container for {}", self.metadata.key);
        self.store.insert_matrix_metadata(self.metadata.clone())
    }
}
