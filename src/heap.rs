//! Keyed binary min-heap.

use std::cmp::Ordering;

/// Binary min-heap of `(key, value)` entries ordered by a comparison function over keys.
///
/// Unlike [`std::collections::BinaryHeap`] the order is supplied at runtime, so keys do not need to
/// implement [`Ord`] and the same comparison function can be shared with other sorting stages.
/// Values are carried along and never compared.
pub struct KeyedMinHeap<K, V, F>
where
    F: Fn(&K, &K) -> Ordering,
{
    entries: Vec<(K, V)>,
    compare: F,
}

impl<K, V, F> KeyedMinHeap<K, V, F>
where
    F: Fn(&K, &K) -> Ordering,
{
    /// Creates an empty heap using `compare` to order keys.
    pub fn new(compare: F) -> Self {
        KeyedMinHeap {
            entries: Vec::new(),
            compare,
        }
    }

    /// Creates an empty heap with space for at least `capacity` entries.
    pub fn with_capacity(capacity: usize, compare: F) -> Self {
        KeyedMinHeap {
            entries: Vec::with_capacity(capacity),
            compare,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entry with the smallest key without removing it.
    pub fn peek(&self) -> Option<(&K, &V)> {
        self.entries.first().map(|(key, value)| (key, value))
    }

    /// Inserts an entry. O(log n).
    pub fn push(&mut self, key: K, value: V) {
        self.entries.push((key, value));
        self.sift_up(self.entries.len() - 1);
    }

    /// Removes and returns the entry with the smallest key. O(log n).
    pub fn pop(&mut self) -> Option<(K, V)> {
        if self.entries.is_empty() {
            return None;
        }

        let last = self.entries.len() - 1;
        self.entries.swap(0, last);
        let min = self.entries.pop();
        if !self.entries.is_empty() {
            self.sift_down(0);
        }

        return min;
    }

    /// Drops all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn less(&self, a: usize, b: usize) -> bool {
        (self.compare)(&self.entries[a].0, &self.entries[b].0) == Ordering::Less
    }

    fn sift_up(&mut self, mut idx: usize) {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if !self.less(idx, parent) {
                break;
            }
            self.entries.swap(idx, parent);
            idx = parent;
        }
    }

    fn sift_down(&mut self, mut idx: usize) {
        let len = self.entries.len();
        loop {
            let left = 2 * idx + 1;
            let right = left + 1;

            let mut smallest = idx;
            if left < len && self.less(left, smallest) {
                smallest = left;
            }
            if right < len && self.less(right, smallest) {
                smallest = right;
            }
            if smallest == idx {
                break;
            }

            self.entries.swap(idx, smallest);
            idx = smallest;
        }
    }
}
