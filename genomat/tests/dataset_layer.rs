use genomat::algorithm::{
    affection_predicate, filter_dataset, merge_datasets, statistic_threshold_predicate,
};
use genomat::{
    Affection, CancelToken, DataSetKey, DataSetSource, DatasetRepository, DatasetError, Genotype,
    MarkerKey, MarkerRecord, MatrixBuilder, MatrixKey, NoopProgress, SampleKey, SampleRecord, Sex,
    StorageConfig, StudyId,
};

fn g(pair: &str) -> Genotype {
    let bytes = pair.as_bytes();
    Genotype([bytes[0], bytes[1]])
}

fn marker(id: &str, chromosome: &str, position: i32) -> MarkerRecord {
    MarkerRecord {
        key: MarkerKey::new(id),
        rs_id: format!("rs_{}", id),
        chromosome: genomat::ChromosomeKey::new(chromosome),
        position,
    }
}

fn sample(family: &str, id: &str, affection: Affection) -> SampleRecord {
    SampleRecord {
        key: SampleKey::new(family, id),
        affection,
        sex: Sex::Unknown,
    }
}

fn small_config(dir: &std::path::Path) -> StorageConfig {
    let mut config = StorageConfig::new(dir);
    // exercise chunk boundaries even on tiny fixtures
    config.chunk_size = 2;
    config
}

/// 4 markers (chr1: m1 m2, chr2: m3 m4), 3 samples, genotypes row by row
fn build_matrix(repo: &DatasetRepository) -> MatrixKey {
    let mut builder = MatrixBuilder::new(StudyId(0), "fixture");
    builder
        .set_technology("TEST_CHIP")
        .append_markers(vec![
            marker("m1", "chr1", 100),
            marker("m2", "chr1", 200),
            marker("m3", "chr2", 50),
            marker("m4", "chr2", 75),
        ])
        .append_samples(vec![
            sample("fam1", "s1", Affection::Affected),
            sample("fam1", "s2", Affection::Unaffected),
            sample("fam2", "s3", Affection::Affected),
        ])
        .append_chromosomes(vec![
            (genomat::ChromosomeKey::new("chr1"), 2),
            (genomat::ChromosomeKey::new("chr2"), 2),
        ]);
    let mut writer = repo.create_matrix(&mut builder).unwrap();
    writer
        .write_sample_row(&[g("AA"), g("AC"), g("GG"), g("00")])
        .unwrap();
    writer
        .write_sample_row(&[g("CC"), g("AA"), g("GT"), g("AA")])
        .unwrap();
    writer
        .write_sample_row(&[g("00"), g("AC"), g("TT"), g("AG")])
        .unwrap();
    writer.finish().unwrap()
}

#[test]
fn test_matrix_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let repo = DatasetRepository::open(small_config(dir.path()));
    let key = build_matrix(&repo);

    let mut source = repo.open_dataset_source(DataSetKey::Matrix(key)).unwrap();
    assert_eq!(4, source.num_markers());
    assert_eq!(3, source.num_samples());
    assert_eq!(2, source.num_chromosomes());

    let markers = source.markers_keys().unwrap();
    assert_eq!(
        vec![&MarkerKey::new("m1"), &MarkerKey::new("m2"), &MarkerKey::new("m3"), &MarkerKey::new("m4")],
        markers.keys().collect::<Vec<_>>()
    );
    assert_eq!(vec![0, 1, 2, 3], markers.original_indices());

    let records = source.markers_records().unwrap();
    assert_eq!("rs_m3", records[2].rs_id);
    assert_eq!("chr2", records[2].chromosome.name);
    assert_eq!(50, records[2].position);

    let samples = source.samples_records().unwrap();
    assert_eq!(SampleKey::new("fam1", "s2"), samples[1].key);
    assert_eq!(Affection::Unaffected, samples[1].affection);

    let mut rows = source.samples_genotypes().unwrap();
    assert_eq!(3, rows.len());
    assert_eq!(vec![g("CC"), g("AA"), g("GT"), g("AA")], rows.get(1).unwrap());

    let mut columns = source.markers_genotypes().unwrap();
    assert_eq!(4, columns.len());
    assert_eq!(vec![g("AC"), g("AA"), g("AC")], columns.get(1).unwrap());
    assert_eq!(vec![g("00"), g("AA"), g("AG")], columns.get(3).unwrap());
}

fn operation_round_trip(in_memory: bool) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = small_config(dir.path());
    config.in_memory_storage = in_memory;
    let repo = DatasetRepository::open(config);
    let matrix = build_matrix(&repo);
    let parent = DataSetKey::Matrix(matrix);

    let mut parent_source = repo.open_dataset_source(parent).unwrap();
    let samples = parent_source.samples_keys().unwrap().into_entries();
    let chromosomes = parent_source.chromosomes_keys().unwrap().into_entries();

    let mut writer = repo
        .generate_fresh_operation_dataset("hardy_weinberg", parent)
        .unwrap();
    writer
        .set_num_markers(2)
        .set_num_samples(3)
        .set_num_chromosomes(2)
        .set_sample_keys(samples)
        .set_chromosome_keys(chromosomes);
    writer
        .add_marker_entry(1, MarkerKey::new("m2"), &[0.5])
        .unwrap();
    writer
        .add_marker_entry(3, MarkerKey::new("m4"), &[0.01])
        .unwrap();
    let key = writer.finish_writing().unwrap();

    let meta = repo.operation_metadata(key).unwrap();
    assert_eq!(in_memory, meta.in_memory);
    assert_eq!(parent, meta.parent);
    assert_eq!("hardy_weinberg", meta.operation_type);

    let mut source = repo.open_dataset_source(DataSetKey::Operation(key)).unwrap();
    assert_eq!(2, source.num_markers());
    assert_eq!(3, source.num_samples());
    assert_eq!(2, source.num_chromosomes());

    let markers = source.markers_keys().unwrap();
    assert_eq!(vec![1, 3], markers.original_indices());
    assert_eq!(&MarkerKey::new("m4"), markers.key(1));

    let records = source.markers_records().unwrap();
    assert_eq!(2, records.len());
    assert_eq!("rs_m2", records[0].rs_id);
    assert_eq!("rs_m4", records[1].rs_id);

    // genotype rows are the kept columns of the origin matrix
    let mut rows = source.samples_genotypes().unwrap();
    assert_eq!(3, rows.len());
    assert_eq!(vec![g("AC"), g("00")], rows.get(0).unwrap());
    assert_eq!(vec![g("AA"), g("AA")], rows.get(1).unwrap());
    assert_eq!(vec![g("AC"), g("AG")], rows.get(2).unwrap());
    let mut columns = source.markers_genotypes().unwrap();
    assert_eq!(2, columns.len());
    assert_eq!(vec![g("00"), g("AA"), g("AG")], columns.get(1).unwrap());
}

#[test]
fn test_operation_round_trip_file_backend() {
    operation_round_trip(false);
}

#[test]
fn test_operation_round_trip_memory_backend() {
    operation_round_trip(true);
}

#[test]
fn test_filter_keeping_everything_matches_parent() {
    let dir = tempfile::tempdir().unwrap();
    let repo = DatasetRepository::open(small_config(dir.path()));
    let matrix = build_matrix(&repo);
    let parent = DataSetKey::Matrix(matrix);

    let key = filter_dataset(
        &repo,
        parent,
        |_, _| true,
        |_, _| true,
        &mut NoopProgress,
        &CancelToken::new(),
    )
    .unwrap();

    let mut parent_source = repo.open_dataset_source(parent).unwrap();
    let mut filtered = repo.open_dataset_source(DataSetKey::Operation(key)).unwrap();
    assert_eq!(parent_source.num_markers(), filtered.num_markers());
    assert_eq!(parent_source.num_samples(), filtered.num_samples());
    assert_eq!(parent_source.num_chromosomes(), filtered.num_chromosomes());
    assert_eq!(
        parent_source.markers_keys().unwrap().into_entries(),
        filtered.markers_keys().unwrap().into_entries()
    );
    assert_eq!(
        parent_source.samples_genotypes().unwrap().get(2).unwrap(),
        filtered.samples_genotypes().unwrap().get(2).unwrap()
    );
}

#[test]
fn test_filter_by_record_predicates() {
    let dir = tempfile::tempdir().unwrap();
    let repo = DatasetRepository::open(small_config(dir.path()));
    let matrix = build_matrix(&repo);

    // keep chr2 markers and affected samples
    let key = filter_dataset(
        &repo,
        DataSetKey::Matrix(matrix),
        |_, record| record.chromosome.name == "chr2",
        |_, record| record.affection == Affection::Affected,
        &mut NoopProgress,
        &CancelToken::new(),
    )
    .unwrap();

    let mut source = repo.open_dataset_source(DataSetKey::Operation(key)).unwrap();
    assert_eq!(vec![2, 3], source.markers_keys().unwrap().original_indices());
    assert_eq!(vec![0, 2], source.samples_keys().unwrap().original_indices());
    // chromosome map is carried over unchanged
    assert_eq!(2, source.num_chromosomes());

    let mut rows = source.samples_genotypes().unwrap();
    assert_eq!(2, rows.len());
    assert_eq!(vec![g("GG"), g("00")], rows.get(0).unwrap());
    assert_eq!(vec![g("TT"), g("AG")], rows.get(1).unwrap());
}

#[test]
fn test_nested_filter_keeps_origin_indices() {
    let dir = tempfile::tempdir().unwrap();
    let repo = DatasetRepository::open(small_config(dir.path()));
    let matrix = build_matrix(&repo);

    let first = filter_dataset(
        &repo,
        DataSetKey::Matrix(matrix),
        |original_index, _| original_index >= 1,
        |_, _| true,
        &mut NoopProgress,
        &CancelToken::new(),
    )
    .unwrap();
    let second = filter_dataset(
        &repo,
        DataSetKey::Operation(first),
        |original_index, _| original_index >= 3,
        |_, record| record.key.family_id == "fam1",
        &mut NoopProgress,
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(Some(first.operation), second.parent_operation);

    let mut source = repo
        .open_dataset_source(DataSetKey::Operation(second))
        .unwrap();
    // original indices always refer to the origin matrix
    assert_eq!(vec![3], source.markers_keys().unwrap().original_indices());
    assert_eq!(vec![0, 1], source.samples_keys().unwrap().original_indices());
    let mut rows = source.samples_genotypes().unwrap();
    assert_eq!(vec![g("00")], rows.get(0).unwrap());
    assert_eq!(vec![g("AA")], rows.get(1).unwrap());
}

#[test]
fn test_filter_rejecting_everything_is_no_data_left() {
    let dir = tempfile::tempdir().unwrap();
    let repo = DatasetRepository::open(small_config(dir.path()));
    let matrix = build_matrix(&repo);

    let result = filter_dataset(
        &repo,
        DataSetKey::Matrix(matrix),
        |_, _| false,
        |_, _| true,
        &mut NoopProgress,
        &CancelToken::new(),
    );
    match result {
        Err(DatasetError::NoDataLeft) => (),
        other => panic!("Unexpected result: {:?}", other),
    }
    // the abandoned writer must not leave a metadata row behind
    assert!(repo.operations_of(matrix).unwrap().is_empty());
}

#[test]
fn test_filter_cancellation() {
    let dir = tempfile::tempdir().unwrap();
    let repo = DatasetRepository::open(small_config(dir.path()));
    let matrix = build_matrix(&repo);

    let cancel = CancelToken::new();
    cancel.cancel();
    let result = filter_dataset(
        &repo,
        DataSetKey::Matrix(matrix),
        |_, _| true,
        |_, _| true,
        &mut NoopProgress,
        &cancel,
    );
    match result {
        Err(DatasetError::Cancelled) => (),
        other => panic!("Unexpected result: {:?}", other),
    }
    assert!(repo.operations_of(matrix).unwrap().is_empty());
}

#[test]
fn test_samples_oriented_operation() {
    let dir = tempfile::tempdir().unwrap();
    let repo = DatasetRepository::open(small_config(dir.path()));
    let matrix = build_matrix(&repo);
    let parent = DataSetKey::Matrix(matrix);

    let mut parent_source = repo.open_dataset_source(parent).unwrap();
    let markers = parent_source.markers_keys().unwrap().into_entries();
    let chromosomes = parent_source.chromosomes_keys().unwrap().into_entries();

    let mut writer = repo
        .generate_fresh_operation_dataset("qa_samples", parent)
        .unwrap();
    writer
        .set_num_markers(4)
        .set_num_samples(2)
        .set_num_chromosomes(2)
        .set_marker_keys(markers)
        .set_chromosome_keys(chromosomes);
    writer
        .add_sample_entry(0, SampleKey::new("fam1", "s1"), &[0.25, 0.5])
        .unwrap();
    writer
        .add_sample_entry(2, SampleKey::new("fam2", "s3"), &[0.0, 0.75])
        .unwrap();
    let key = writer.finish_writing().unwrap();

    let mut source = repo.open_dataset_source(DataSetKey::Operation(key)).unwrap();
    assert_eq!(4, source.num_markers());
    assert_eq!(vec![0, 2], source.samples_keys().unwrap().original_indices());
    assert_eq!(
        &SampleKey::new("fam2", "s3"),
        source.samples_keys().unwrap().key(1)
    );

    let mut rows = source.samples_genotypes().unwrap();
    assert_eq!(2, rows.len());
    assert_eq!(
        vec![g("AA"), g("AC"), g("GG"), g("00")],
        rows.get(0).unwrap()
    );
    assert_eq!(
        vec![g("00"), g("AC"), g("TT"), g("AG")],
        rows.get(1).unwrap()
    );
    let mut columns = source.markers_genotypes().unwrap();
    assert_eq!(vec![g("AA"), g("00")], columns.get(0).unwrap());
}

#[test]
fn test_shipped_predicates() {
    let dir = tempfile::tempdir().unwrap();
    let repo = DatasetRepository::open(small_config(dir.path()));
    let matrix = build_matrix(&repo);
    let parent = DataSetKey::Matrix(matrix);

    // a Hardy-Weinberg style run over all markers; m2 falls below the cutoff
    let mut parent_source = repo.open_dataset_source(parent).unwrap();
    let samples = parent_source.samples_keys().unwrap().into_entries();
    let chromosomes = parent_source.chromosomes_keys().unwrap().into_entries();
    let mut writer = repo
        .generate_fresh_operation_dataset("hardy_weinberg", parent)
        .unwrap();
    writer
        .set_num_markers(4)
        .set_num_samples(3)
        .set_num_chromosomes(2)
        .set_sample_keys(samples)
        .set_chromosome_keys(chromosomes);
    for (index, (id, p_value)) in [("m1", 0.8), ("m2", 1e-7), ("m3", 0.3), ("m4", 0.05)]
        .iter()
        .enumerate()
    {
        writer
            .add_marker_entry(index, MarkerKey::new(*id), &[*p_value])
            .unwrap();
    }
    let hw = writer.finish_writing().unwrap();

    let mut hw_source = genomat::source::FileOperationSource::open(
        repo.config(),
        repo.operation_metadata(hw).unwrap(),
    )
    .unwrap();
    let entries = hw_source.entries().unwrap();

    let filtered = filter_dataset(
        &repo,
        parent,
        statistic_threshold_predicate(&entries, 0, 0.05),
        affection_predicate(Affection::Affected),
        &mut NoopProgress,
        &CancelToken::new(),
    )
    .unwrap();

    let mut source = repo
        .open_dataset_source(DataSetKey::Operation(filtered))
        .unwrap();
    assert_eq!(
        vec![0, 2, 3],
        source.markers_keys().unwrap().original_indices()
    );
    assert_eq!(vec![0, 2], source.samples_keys().unwrap().original_indices());
}

#[test]
fn test_merge_prefers_second_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let repo = DatasetRepository::open(small_config(dir.path()));

    let mut builder = MatrixBuilder::new(StudyId(0), "left");
    builder
        .append_markers(vec![marker("m1", "chr1", 100), marker("m2", "chr1", 200)])
        .append_samples(vec![
            sample("fam1", "s1", Affection::Affected),
            sample("fam1", "s2", Affection::Unaffected),
        ])
        .append_chromosomes(vec![(genomat::ChromosomeKey::new("chr1"), 2)]);
    let mut writer = repo.create_matrix(&mut builder).unwrap();
    writer.write_sample_row(&[g("AA"), g("CC")]).unwrap();
    writer.write_sample_row(&[g("AC"), g("CG")]).unwrap();
    let left = writer.finish().unwrap();

    let mut builder = MatrixBuilder::new(StudyId(0), "right");
    builder
        .append_markers(vec![marker("m2", "chr1", 200), marker("m3", "chr2", 50)])
        .append_samples(vec![
            sample("fam1", "s2", Affection::Unaffected),
            sample("fam2", "s3", Affection::Affected),
        ])
        .append_chromosomes(vec![
            (genomat::ChromosomeKey::new("chr1"), 1),
            (genomat::ChromosomeKey::new("chr2"), 1),
        ]);
    let mut writer = repo.create_matrix(&mut builder).unwrap();
    writer.write_sample_row(&[g("TT"), g("GG")]).unwrap();
    writer.write_sample_row(&[g("AG"), g("00")]).unwrap();
    let right = writer.finish().unwrap();

    let merged = merge_datasets(
        &repo,
        DataSetKey::Matrix(left),
        DataSetKey::Matrix(right),
        "merged",
        &mut NoopProgress,
        &CancelToken::new(),
    )
    .unwrap();

    let mut source = repo.open_dataset_source(DataSetKey::Matrix(merged)).unwrap();
    assert_eq!(3, source.num_markers());
    assert_eq!(3, source.num_samples());
    assert_eq!(
        vec![&MarkerKey::new("m1"), &MarkerKey::new("m2"), &MarkerKey::new("m3")],
        source.markers_keys().unwrap().keys().collect::<Vec<_>>()
    );
    let chromosomes = source.chromosomes_keys().unwrap();
    assert_eq!(2, chromosomes.len());

    let mut rows = source.samples_genotypes().unwrap();
    // s1 only exists on the left; m3 is filled with no-calls
    assert_eq!(vec![g("AA"), g("CC"), g("00")], rows.get(0).unwrap());
    // s2 exists in both: the second dataset's call wins where it covers
    assert_eq!(vec![g("AC"), g("TT"), g("GG")], rows.get(1).unwrap());
    // s3 only exists on the right; its explicit no-call stays a no-call
    assert_eq!(vec![g("00"), g("AG"), g("00")], rows.get(2).unwrap());
}

#[test]
fn test_merge_sorts_markers_across_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let repo = DatasetRepository::open(small_config(dir.path()));

    // the left input carries the lexicographically later marker
    let mut builder = MatrixBuilder::new(StudyId(0), "left");
    builder
        .append_markers(vec![marker("m2", "chr1", 200)])
        .append_samples(vec![sample("fam1", "s1", Affection::Affected)])
        .append_chromosomes(vec![(genomat::ChromosomeKey::new("chr1"), 1)]);
    let mut writer = repo.create_matrix(&mut builder).unwrap();
    writer.write_sample_row(&[g("AA")]).unwrap();
    let left = writer.finish().unwrap();

    let mut builder = MatrixBuilder::new(StudyId(0), "right");
    builder
        .append_markers(vec![marker("m1", "chr1", 100)])
        .append_samples(vec![sample("fam1", "s1", Affection::Affected)])
        .append_chromosomes(vec![(genomat::ChromosomeKey::new("chr1"), 1)]);
    let mut writer = repo.create_matrix(&mut builder).unwrap();
    writer.write_sample_row(&[g("CC")]).unwrap();
    let right = writer.finish().unwrap();

    let merged = merge_datasets(
        &repo,
        DataSetKey::Matrix(left),
        DataSetKey::Matrix(right),
        "merged",
        &mut NoopProgress,
        &CancelToken::new(),
    )
    .unwrap();

    let mut source = repo.open_dataset_source(DataSetKey::Matrix(merged)).unwrap();
    assert_eq!(
        vec![&MarkerKey::new("m1"), &MarkerKey::new("m2")],
        source.markers_keys().unwrap().keys().collect::<Vec<_>>()
    );
    // the genotype columns follow the sorted marker order
    let mut rows = source.samples_genotypes().unwrap();
    assert_eq!(vec![g("CC"), g("AA")], rows.get(0).unwrap());
    let records = source.markers_records().unwrap();
    assert_eq!(100, records[0].position);
    assert_eq!(200, records[1].position);
}

#[test]
fn test_merge_rejects_cross_study_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let repo = DatasetRepository::open(small_config(dir.path()));

    let mut builder = MatrixBuilder::new(StudyId(0), "left");
    builder
        .append_markers(vec![marker("m1", "chr1", 100)])
        .append_samples(vec![sample("fam1", "s1", Affection::Affected)])
        .append_chromosomes(vec![(genomat::ChromosomeKey::new("chr1"), 1)]);
    let mut writer = repo.create_matrix(&mut builder).unwrap();
    writer.write_sample_row(&[g("AA")]).unwrap();
    let left = writer.finish().unwrap();

    let mut builder = MatrixBuilder::new(StudyId(1), "right");
    builder
        .append_markers(vec![marker("m1", "chr1", 100)])
        .append_samples(vec![sample("fam1", "s1", Affection::Affected)])
        .append_chromosomes(vec![(genomat::ChromosomeKey::new("chr1"), 1)]);
    let mut writer = repo.create_matrix(&mut builder).unwrap();
    writer.write_sample_row(&[g("CC")]).unwrap();
    let right = writer.finish().unwrap();

    let result = merge_datasets(
        &repo,
        DataSetKey::Matrix(left),
        DataSetKey::Matrix(right),
        "merged",
        &mut NoopProgress,
        &CancelToken::new(),
    );
    match result {
        Err(DatasetError::StudyMismatch(StudyId(0), StudyId(1))) => (),
        other => panic!("Unexpected result: {:?}", other),
    }
}

#[test]
fn test_delete_matrix_cascades() {
    let dir = tempfile::tempdir().unwrap();
    let repo = DatasetRepository::open(small_config(dir.path()));
    let matrix = build_matrix(&repo);

    let op = filter_dataset(
        &repo,
        DataSetKey::Matrix(matrix),
        |_, _| true,
        |_, _| true,
        &mut NoopProgress,
        &CancelToken::new(),
    )
    .unwrap();
    let matrix_path = repo.config().matrix_path(matrix);
    let op_path = repo.config().operation_path(op);
    assert!(matrix_path.exists());
    assert!(op_path.exists());

    repo.delete_matrix(matrix).unwrap();
    assert!(!matrix_path.exists());
    assert!(!op_path.exists());
    match repo.open_dataset_source(DataSetKey::Matrix(matrix)) {
        Err(DatasetError::NotFound(_)) => (),
        _ => panic!("Deleted matrix must not resolve"),
    }
    match repo.open_dataset_source(DataSetKey::Operation(op)) {
        Err(DatasetError::NotFound(_)) => (),
        _ => panic!("Deleted operation must not resolve"),
    }
}

#[test]
fn test_statistic_columns() {
    let dir = tempfile::tempdir().unwrap();
    let repo = DatasetRepository::open(small_config(dir.path()));
    let matrix = build_matrix(&repo);
    let parent = DataSetKey::Matrix(matrix);

    let mut parent_source = repo.open_dataset_source(parent).unwrap();
    let samples = parent_source.samples_keys().unwrap().into_entries();
    let chromosomes = parent_source.chromosomes_keys().unwrap().into_entries();

    let mut writer = repo
        .generate_fresh_operation_dataset("trend_test", parent)
        .unwrap();
    writer
        .set_num_markers(4)
        .set_num_samples(3)
        .set_num_chromosomes(2)
        .set_sample_keys(samples)
        .set_chromosome_keys(chromosomes);
    for (index, id) in ["m1", "m2", "m3", "m4"].iter().enumerate() {
        writer
            .add_marker_entry(index, MarkerKey::new(*id), &[index as f64, 0.25 * index as f64])
            .unwrap();
    }
    let key = writer.finish_writing().unwrap();

    let mut source = genomat::source::FileOperationSource::open(
        repo.config(),
        repo.operation_metadata(key).unwrap(),
    )
    .unwrap();
    let mut names = source.column_names();
    names.sort();
    assert_eq!(vec!["chi_square", "p_value"], names);
    let mut chi = source.statistic_column("chi_square").unwrap();
    let values: Vec<f64> = chi.iter().collect::<genomat::Result<_>>().unwrap();
    assert_eq!(vec![0.0, 1.0, 2.0, 3.0], values);

    let entries = source.entries().unwrap();
    assert_eq!(4, entries.len());
    assert_eq!(3, entries[3].original_index);
    assert_eq!(vec![3.0, 0.75], entries[3].values);
}
