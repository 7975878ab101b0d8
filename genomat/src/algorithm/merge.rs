use crate::error::{DatasetError, Result};
use crate::genotype::Genotype;
use crate::keys::{ChromosomeKey, DataSetKey, MatrixKey};
use crate::matrix::MatrixBuilder;
use crate::operation::DatasetRepository;
use crate::progress::{CancelToken, ProcessPhase, ProgressObserver};
use log::info;
use std::collections::{BTreeSet, HashMap};

// Positions a merged row occupies in the two parent sources, if present
struct RowOrigin {
    left: Option<usize>,
    right: Option<usize>,
}

// The merged marker dimension is the sorted union of both key sets
fn sorted_union_positions<K: Clone + Ord + std::hash::Hash>(
    left: &[K],
    right: &[K],
) -> (Vec<K>, Vec<RowOrigin>) {
    let left_pos: HashMap<&K, usize> = left.iter().enumerate().map(|(i, k)| (k, i)).collect();
    let right_pos: HashMap<&K, usize> = right.iter().enumerate().map(|(i, k)| (k, i)).collect();
    let mut keys = vec![];
    let mut origins = vec![];
    for key in left.iter().chain(right.iter()).collect::<BTreeSet<_>>() {
        keys.push(key.clone());
        origins.push(RowOrigin {
            left: left_pos.get(key).copied(),
            right: right_pos.get(key).copied(),
        });
    }
    (keys, origins)
}

fn union_positions<K: Clone + Eq + std::hash::Hash>(
    left: &[K],
    right: &[K],
) -> (Vec<K>, Vec<RowOrigin>) {
    let right_pos: HashMap<&K, usize> = right.iter().enumerate().map(|(i, k)| (k, i)).collect();
    let left_set: HashMap<&K, ()> = left.iter().map(|k| (k, ())).collect();
    let mut keys = vec![];
    let mut origins = vec![];
    for (i, key) in left.iter().enumerate() {
        keys.push(key.clone());
        origins.push(RowOrigin {
            left: Some(i),
            right: right_pos.get(key).copied(),
        });
    }
    for (i, key) in right.iter().enumerate() {
        if !left_set.contains_key(key) {
            keys.push(key.clone());
            origins.push(RowOrigin {
                left: None,
                right: Some(i),
            });
        }
    }
    (keys, origins)
}

/// Merge two datasets rooted in the same study into a fresh stored matrix;
/// inputs from different studies are rejected.
///
/// The marker dimension of the result is the sorted union of both marker
/// key sets. Samples are united by key: first every row of the first
/// dataset in its order, then the rows only the second one has. Where both
/// datasets cover a cell the second dataset's call wins; a cell covered by
/// neither is a no-call. The chromosome map is rebuilt from the merged
/// marker annotations.
pub fn merge_datasets(
    repo: &DatasetRepository,
    first: DataSetKey,
    second: DataSetKey,
    friendly_name: &str,
    progress: &mut dyn ProgressObserver,
    cancel: &CancelToken,
) -> Result<MatrixKey> {
    let study = first.origin_matrix().study;
    if study != second.origin_matrix().study {
        return Err(DatasetError::StudyMismatch(
            study,
            second.origin_matrix().study,
        ));
    }
    progress.phase_changed(ProcessPhase::Initializing);
    let mut left = repo.open_dataset_source(first)?;
    let mut right = repo.open_dataset_source(second)?;

    let left_markers = left.markers_records()?;
    let right_markers = right.markers_records()?;
    let left_marker_keys: Vec<_> = left_markers.iter().map(|r| r.key.clone()).collect();
    let right_marker_keys: Vec<_> = right_markers.iter().map(|r| r.key.clone()).collect();
    let (_, marker_origins) = sorted_union_positions(&left_marker_keys, &right_marker_keys);
    let merged_markers: Vec<_> = marker_origins
        .iter()
        .map(|origin| match (origin.left, origin.right) {
            (Some(i), _) => left_markers[i].clone(),
            (None, Some(i)) => right_markers[i].clone(),
            (None, None) => unreachable!(),
        })
        .collect();

    let left_samples = left.samples_records()?;
    let right_samples = right.samples_records()?;
    let left_sample_keys: Vec<_> = left_samples.iter().map(|r| r.key.clone()).collect();
    let right_sample_keys: Vec<_> = right_samples.iter().map(|r| r.key.clone()).collect();
    let (_, sample_origins) = union_positions(&left_sample_keys, &right_sample_keys);
    let merged_samples: Vec<_> = sample_origins
        .iter()
        .map(|origin| match (origin.left, origin.right) {
            (Some(i), _) => left_samples[i].clone(),
            (None, Some(i)) => right_samples[i].clone(),
            (None, None) => unreachable!(),
        })
        .collect();

    // chromosome map in first-seen order over the merged markers
    let mut chromosomes: Vec<(ChromosomeKey, usize)> = vec![];
    for record in &merged_markers {
        match chromosomes.iter_mut().find(|(c, _)| *c == record.chromosome) {
            Some((_, count)) => *count += 1,
            None => chromosomes.push((record.chromosome.clone(), 1)),
        }
    }

    let mut builder = MatrixBuilder::new(study, friendly_name);
    builder
        .set_description(&format!("merge of {} and {}", first, second))
        .append_markers(merged_markers)
        .append_samples(merged_samples)
        .append_chromosomes(chromosomes);
    let mut writer = repo.create_matrix(&mut builder)?;
    let key = writer.key();

    let mut left_rows = left.samples_genotypes()?;
    let mut right_rows = right.samples_genotypes()?;

    progress.phase_changed(ProcessPhase::Running);
    let total = sample_origins.len();
    let mut row = Vec::with_capacity(marker_origins.len());
    for (done, sample) in sample_origins.iter().enumerate() {
        if cancel.is_cancelled() {
            drop(writer);
            let path = repo.config().matrix_path(key);
            if path.exists() {
                std::fs::remove_file(path)?;
            }
            return Err(DatasetError::Cancelled);
        }
        let left_row = match sample.left {
            Some(i) => Some(left_rows.get(i)?),
            None => None,
        };
        let right_row = match sample.right {
            Some(i) => Some(right_rows.get(i)?),
            None => None,
        };
        row.clear();
        for marker in &marker_origins {
            let g2 = match (&right_row, marker.right) {
                (Some(genotypes), Some(col)) => Some(genotypes[col]),
                _ => None,
            };
            let g1 = match (&left_row, marker.left) {
                (Some(genotypes), Some(col)) => Some(genotypes[col]),
                _ => None,
            };
            row.push(g2.or(g1).unwrap_or(Genotype::NO_CALL));
        }
        writer.write_sample_row(&row)?;
        progress.progress(done + 1, total);
    }

    progress.phase_changed(ProcessPhase::Finalizing);
    let key = writer.finish()?;
    info!("merged {} and {} into {}", first, second, key);
    progress.phase_changed(ProcessPhase::Completed);
    Ok(key)
}
