use crate::error::{DatasetError, Result};
use crate::genotype::{Affection, MarkerRecord, SampleRecord};
use crate::keys::{DataSetKey, MarkerKey, OperationKey, SampleKey};
use crate::operation::{DatasetRepository, OperationEntry};
use crate::progress::{CancelToken, ProcessPhase, ProgressObserver};
use log::info;
use std::collections::BTreeMap;

/// A marker predicate keeping the markers whose statistic from an earlier
/// operation stays at or above `threshold`, e.g. a Hardy-Weinberg p-value
/// cutoff. Markers the earlier operation did not report are dropped.
pub fn statistic_threshold_predicate(
    entries: &[OperationEntry],
    column: usize,
    threshold: f64,
) -> impl FnMut(usize, &MarkerRecord) -> bool {
    let values: BTreeMap<usize, f64> = entries
        .iter()
        .map(|entry| (entry.original_index, entry.values[column]))
        .collect();
    move |original_index, _| {
        values
            .get(&original_index)
            .map_or(false, |value| *value >= threshold)
    }
}

/// A sample predicate keeping one affection status
pub fn affection_predicate(keep: Affection) -> impl FnMut(usize, &SampleRecord) -> bool {
    move |_, record| record.affection == keep
}

/// Derive a filter operation from `parent`, keeping the marker and sample
/// rows the predicates accept. Predicates see each row's original index and
/// its record. The chromosome map is carried over from the parent unchanged.
///
/// Fails with `NoDataLeft` when either predicate rejects everything, and
/// with `Cancelled` (after removing any partial backing storage) when the
/// token fires between rows.
pub fn filter_dataset<MP, SP>(
    repo: &DatasetRepository,
    parent: DataSetKey,
    mut keep_marker: MP,
    mut keep_sample: SP,
    progress: &mut dyn ProgressObserver,
    cancel: &CancelToken,
) -> Result<OperationKey>
where
    MP: FnMut(usize, &MarkerRecord) -> bool,
    SP: FnMut(usize, &SampleRecord) -> bool,
{
    progress.phase_changed(ProcessPhase::Initializing);
    let mut source = repo.open_dataset_source(parent)?;

    let marker_keys = source.markers_keys()?;
    let marker_records = source.markers_records()?;
    let kept_markers: Vec<(usize, MarkerKey)> = marker_keys
        .iter()
        .zip(&marker_records)
        .filter(|&((original_index, _), record)| keep_marker(original_index, record))
        .map(|((original_index, key), _)| (original_index, key.clone()))
        .collect();

    let sample_keys = source.samples_keys()?;
    let sample_records = source.samples_records()?;
    let kept_samples: Vec<(usize, SampleKey)> = sample_keys
        .iter()
        .zip(&sample_records)
        .filter(|&((original_index, _), record)| keep_sample(original_index, record))
        .map(|((original_index, key), _)| (original_index, key.clone()))
        .collect();

    if kept_markers.is_empty() || kept_samples.is_empty() {
        return Err(DatasetError::NoDataLeft);
    }
    let chromosomes = source.chromosomes_keys()?.into_entries();

    let mut writer = repo.generate_fresh_operation_dataset("filter", parent)?;
    writer
        .set_num_markers(kept_markers.len())
        .set_num_samples(kept_samples.len())
        .set_num_chromosomes(chromosomes.len())
        .set_sample_keys(kept_samples)
        .set_chromosome_keys(chromosomes);

    progress.phase_changed(ProcessPhase::Running);
    let total = kept_markers.len();
    for (row, (original_index, key)) in kept_markers.into_iter().enumerate() {
        if cancel.is_cancelled() {
            writer.discard()?;
            return Err(DatasetError::Cancelled);
        }
        writer.add_marker_entry(original_index, key, &[])?;
        progress.progress(row + 1, total);
    }

    progress.phase_changed(ProcessPhase::Finalizing);
    let key = writer.finish_writing()?;
    info!("filtered {} into {}", parent, key);
    progress.phase_changed(ProcessPhase::Completed);
    Ok(key)
}
