//! Binary heap merger.

use std::cmp::Ordering;
use std::error::Error;
use std::fmt;
use std::fmt::Display;

use crate::chunk::SortedSource;
use crate::heap::KeyedMinHeap;

/// Merge error. Wraps the error of the source that failed to advance.
#[derive(Debug)]
pub struct MergeError<E> {
    source_index: usize,
    cause: E,
}

impl<E> MergeError<E> {
    pub fn new(source_index: usize, cause: E) -> Self {
        MergeError { source_index, cause }
    }

    /// Index of the failed source in the order the sources were passed to the merger.
    pub fn source_index(&self) -> usize {
        self.source_index
    }

    pub fn cause(&self) -> &E {
        &self.cause
    }

    pub fn into_cause(self) -> E {
        self.cause
    }
}

impl<E: Error + 'static> Error for MergeError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.cause)
    }
}

impl<E: Display> Display for MergeError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "merge source {} failed to advance: {}", self.source_index, self.cause)
    }
}

/// Binary heap merger implementation.
/// Merges multiple sorted sources into a single sorted output.
/// Time complexity is *m* \* log(*n*) in worst case where *m* is the number of items,
/// *n* is the number of sources.
///
/// The heap holds one `(head, source)` entry per non-exhausted source. The head of a source is a lower bound
/// of everything the source has left, so the heap minimum is the smallest item not yet emitted.
pub struct BinaryHeapMerger<S, F>
where
    S: SortedSource,
    F: Fn(&S::Item, &S::Item) -> Ordering,
{
    heap: KeyedMinHeap<S::Item, usize, F>,
    sources: Vec<S>,
}

impl<S, F> BinaryHeapMerger<S, F>
where
    S: SortedSource,
    F: Fn(&S::Item, &S::Item) -> Ordering,
{
    /// Creates an instance of a binary heap merger.
    /// Every source is advanced to its first item; exhausted sources are left out of the merge.
    /// Source items should be sorted in ascending order according to `compare` otherwise the result is undefined.
    ///
    /// # Arguments
    /// * `sources` - Sources to be merged in a single sorted one
    /// * `compare` - Function used to compare items, the one the sources were sorted with
    pub fn new<I>(sources: I, compare: F) -> Result<Self, MergeError<S::Error>>
    where
        I: IntoIterator<Item = S>,
    {
        let sources = Vec::from_iter(sources);
        let mut heap = KeyedMinHeap::with_capacity(sources.len(), compare);

        let mut active = Vec::with_capacity(sources.len());
        for (idx, mut source) in sources.into_iter().enumerate() {
            match source.advance() {
                Ok(Some(head)) => {
                    heap.push(head, active.len());
                    active.push(source);
                }
                Ok(None) => log::debug!("merge source {} is empty, skipping", idx),
                Err(err) => return Err(MergeError::new(idx, err)),
            }
        }

        return Ok(BinaryHeapMerger { heap, sources: active });
    }

    /// Returns the number of sources that still have items to merge.
    pub fn active_sources(&self) -> usize {
        self.heap.len()
    }
}

impl<S, F> Iterator for BinaryHeapMerger<S, F>
where
    S: SortedSource,
    F: Fn(&S::Item, &S::Item) -> Ordering,
{
    type Item = Result<S::Item, MergeError<S::Error>>;

    /// Returns the next item from the sources in ascending order.
    /// After an error the merger is exhausted.
    fn next(&mut self) -> Option<Self::Item> {
        let (result, idx) = self.heap.pop()?;

        match self.sources[idx].advance() {
            Ok(Some(head)) => self.heap.push(head, idx),
            Ok(None) => {}
            Err(err) => {
                self.heap.clear();
                return Some(Err(MergeError::new(idx, err)));
            }
        }

        return Some(Ok(result));
    }
}

/// [`SortedSource`] adapter over an iterator of results.
pub struct IterSource<I>(I);

impl<I> IterSource<I> {
    pub fn new<C: IntoIterator<IntoIter = I>>(items: C) -> Self {
        IterSource(items.into_iter())
    }
}

impl<I, T, E> SortedSource for IterSource<I>
where
    I: Iterator<Item = Result<T, E>>,
    E: Error,
{
    type Item = T;
    type Error = E;

    fn advance(&mut self) -> Result<Option<T>, E> {
        self.0.next().transpose()
    }
}
