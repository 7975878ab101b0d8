use crate::error::Result;

/// Supplies the elements of a binary backed sequence in contiguous ranges.
/// Loading a range is the only I/O-triggering operation of a chunked source.
pub trait ChunkLoader {
    type Item;

    /// Total number of elements of the backing extent. Called once, when the
    /// source is constructed.
    fn total_len(&mut self) -> Result<usize>;

    /// Load `len` elements starting at `start`. The requested range is
    /// always within `0..total_len()`.
    fn load_range(&mut self, start: usize, len: usize) -> Result<Vec<Self::Item>>;
}

impl<I> ChunkLoader for Box<dyn ChunkLoader<Item = I>> {
    type Item = I;

    fn total_len(&mut self) -> Result<usize> {
        (**self).total_len()
    }

    fn load_range(&mut self, start: usize, len: usize) -> Result<Vec<I>> {
        (**self).load_range(start, len)
    }
}

/// An in-memory loader; the backing extent is an ordinary vector.
pub struct VecLoader<T>(pub Vec<T>);

impl<T: Clone> ChunkLoader for VecLoader<T> {
    type Item = T;

    fn total_len(&mut self) -> Result<usize> {
        Ok(self.0.len())
    }

    fn load_range(&mut self, start: usize, len: usize) -> Result<Vec<T>> {
        Ok(self.0[start..start + len].to_vec())
    }
}

/// A lazy sequence over a fixed-size backing extent, materializing
/// fixed-size chunks on demand. Only the most recently used chunk is kept
/// (a single cache slot, not an LRU set), which is exactly what a full
/// sequential scan needs.
pub struct ChunkedSource<L: ChunkLoader> {
    loader: L,
    chunk_size: usize,
    len: usize,
    cached: Option<(usize, Vec<L::Item>)>,
}

impl<L: ChunkLoader> ChunkedSource<L> {
    pub fn new(mut loader: L, chunk_size: usize) -> Result<Self> {
        assert!(chunk_size > 0, "chunk size must be positive");
        let len = loader.total_len()?;
        Ok(Self {
            loader,
            chunk_size,
            len,
            cached: None,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&mut self, index: usize) -> Result<L::Item>
    where
        L::Item: Clone,
    {
        assert!(
            index < self.len,
            "index {} out of bounds for source of size {}",
            index,
            self.len
        );
        let chunk_index = index / self.chunk_size;
        let hit = matches!(&self.cached, Some((cached, _)) if *cached == chunk_index);
        if !hit {
            // Drop the old chunk first so a failed load leaves the cache
            // empty and the next access retries.
            self.cached = None;
            let start = chunk_index * self.chunk_size;
            let len = self.chunk_size.min(self.len - start);
            let chunk = self.loader.load_range(start, len)?;
            self.cached = Some((chunk_index, chunk));
        }
        let (_, chunk) = self.cached.as_ref().unwrap();
        Ok(chunk[index % self.chunk_size].clone())
    }

    pub fn iter(&mut self) -> ChunkedIter<'_, L> {
        ChunkedIter {
            source: self,
            position: 0,
        }
    }
}

/// Sequential cursor over a chunked source
pub struct ChunkedIter<'a, L: ChunkLoader> {
    source: &'a mut ChunkedSource<L>,
    position: usize,
}

impl<'a, L: ChunkLoader> Iterator for ChunkedIter<'a, L>
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
