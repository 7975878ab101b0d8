/*!
  Whole-dataset passes built on top of the source and writer layers: filtering
  a dataset down to kept rows and merging two datasets into a fresh matrix.
*/
mod filter;
mod merge;

pub use filter::{affection_predicate, filter_dataset, statistic_threshold_predicate};
pub use merge::merge_datasets;
