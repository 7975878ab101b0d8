use crate::error::Result;
use crate::source::chunked::{ChunkLoader, ChunkedSource};
use std::collections::BTreeSet;

/// A chunked source seen through an optional ordered list of kept original
/// indices. With no filter the view is the identity and every access
/// delegates directly, paying no per-element indirection; with a filter,
/// position `i` of the compact view maps to `kept[i]` of the parent extent.
pub struct OriginFilteredSource<L: ChunkLoader> {
    inner: ChunkedSource<L>,
    kept: Option<Vec<usize>>,
}

impl<L: ChunkLoader> OriginFilteredSource<L> {
    pub fn new(inner: ChunkedSource<L>, kept: Option<Vec<usize>>) -> Self {
        if let Some(kept) = &kept {
            debug_assert!(
                kept.windows(2).all(|w| w[0] < w[1]),
                "kept original indices must be strictly increasing"
            );
            if let Some(&last) = kept.last() {
                assert!(
                    last < inner.len(),
                    "kept original index {} out of bounds for parent of size {}",
                    last,
                    inner.len()
                );
            }
        }
        Self { inner, kept }
    }

    pub fn identity(inner: ChunkedSource<L>) -> Self {
        Self::new(inner, None)
    }

    pub fn len(&self) -> usize {
        match &self.kept {
            Some(kept) => kept.len(),
            None => self.inner.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The position this view element occupies in the parent extent
    pub fn original_index(&self, index: usize) -> usize {
        match &self.kept {
            Some(kept) => kept[index],
            None => index,
        }
    }

    pub fn get(&mut self, index: usize) -> Result<L::Item>
    where
        L::Item: Clone,
    {
        match &self.kept {
            Some(kept) => self.inner.get(kept[index]),
            None => self.inner.get(index),
        }
    }

    pub fn iter(&mut self) -> FilteredIter<'_, L> {
        FilteredIter {
            source: self,
            position: 0,
        }
    }
}

pub struct FilteredIter<'a, L: ChunkLoader> {
    source: &'a mut OriginFilteredSource<L>,
    position: usize,
}

impl<'a, L: ChunkLoader> Iterator for FilteredIter<'a, L>
where
    L::Item: Clone,
{
    type Item = Result<L::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.source.len() {
            return None;
        }
        let item = self.source.get(self.position);
        self.position += 1;
        Some(item)
    }
}

/// Extract the values whose original index is in `wanted`, by one linear
/// lock-step pass over the full original-index sequence and the unfiltered
/// values. This is how a narrower dataset's contents are derived from a
/// wider parent without random access into the parent: O(origin size),
/// bounded by a single pass.
pub fn pick_by_original_index<V>(
    original_indices: impl IntoIterator<Item = usize>,
    values: impl IntoIterator<Item = V>,
    wanted: &BTreeSet<usize>,
) -> Vec<V> {
    original_indices
        .into_iter()
        .zip(values)
        .filter(|(index, _)| wanted.contains(index))
        .map(|(_, value)| value)
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::source::chunked::VecLoader;

    fn chunked(values: Vec<u32>) -> ChunkedSource<VecLoader<u32>> {
        ChunkedSource::new(VecLoader(values), 2).unwrap()
    }

    #[test]
    fn test_identity_matches_parent() {
        let values: Vec<u32> = (0..7).map(|v| v * 10).collect();
        let mut plain = chunked(values.clone());
        let mut identity = OriginFilteredSource::identity(chunked(values));
        assert_eq!(plain.len(), identity.len());
        for i in 0..plain.len() {
            assert_eq!(plain.get(i).unwrap(), identity.get(i).unwrap());
            assert_eq!(i, identity.original_index(i));
        }
    }

    #[test]
    fn test_filtered_view_maps_through_kept_indices() {
        let kept = vec![1, 3, 6];
        let mut source =
            OriginFilteredSource::new(chunked((0..7).map(|v| v * 10).collect()), Some(kept.clone()));
        assert_eq!(3, source.len());
        for (i, &original) in kept.iter().enumerate() {
            assert_eq!(original as u32 * 10, source.get(i).unwrap());
            assert_eq!(original, source.original_index(i));
        }
    }

    #[test]
    fn test_five_sample_scenario() {
        // parent rows s1..s5 at original indices 0..4, filter keeps {1, 3}
        let samples = vec!["s1", "s2", "s3", "s4", "s5"];
        let inner = ChunkedSource::new(VecLoader(samples), 2).unwrap();
        let mut filtered = OriginFilteredSource::new(inner, Some(vec![1, 3]));
        assert_eq!(2, filtered.len());
        assert_eq!("s2", filtered.get(0).unwrap());
        assert_eq!("s4", filtered.get(1).unwrap());
    }

    #[test]
    fn test_pick_by_original_index() {
        let wanted: BTreeSet<usize> = [1, 3].iter().copied().collect();
        let picked = pick_by_original_index(0..5, ["a", "b", "c", "d", "e"], &wanted);
        assert_eq!(vec!["b", "d"], picked);
    }
}
