//! Bounded retention of the K best scored items.
//!
//! Backed by a min-heap keyed by `(score, arrival)`, so the root is always the
//! lowest scoring entry and, among equal scores, the oldest one. That root is
//! both the eviction victim and the pruning threshold for the search.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::data::Score;

#[derive(Debug, Clone)]
struct Entry<T> {
    score: Score,
    arrival: u64,
    item: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.arrival == other.arrival
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .cmp(&other.score)
            .then_with(|| self.arrival.cmp(&other.arrival))
    }
}

/// Holds at most `capacity` items: the highest scoring ones offered so far.
#[derive(Debug, Clone)]
pub struct TopK<T> {
    capacity: usize,
    heap: BinaryHeap<Reverse<Entry<T>>>,
    arrivals: u64,
}

impl<T> TopK<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            heap: BinaryHeap::with_capacity(capacity),
            arrivals: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.capacity
    }

    /// Lowest retained score.
    pub fn min_score(&self) -> Option<Score> {
        self.heap.peek().map(|Reverse(entry)| entry.score)
    }

    /// Score an offer has to beat to be retained, once the set is full.
    pub fn threshold(&self) -> Option<Score> {
        if self.is_full() {
            self.min_score()
        } else {
            None
        }
    }

    /// Offers an item. Returns whether it was retained.
    ///
    /// When full, the item must score strictly above the current minimum; the
    /// oldest entry among those holding the minimum is evicted.
    pub fn offer(&mut self, score: Score, item: T) -> bool {
        if self.capacity == 0 {
            return false;
        }
        if self.is_full() {
            match self.min_score() {
                Some(min) if score > min => {
                    self.heap.pop();
                }
                _ => return false,
            }
        }
        let arrival = self.arrivals;
        self.arrivals += 1;
        self.heap.push(Reverse(Entry {
            score,
            arrival,
            item,
        }));
        true
    }

    /// Retained items by score descending, earlier arrivals first on ties.
    /// Does not modify the set.
    pub fn ranked(&self) -> Vec<(Score, &T)> {
        let mut entries: Vec<&Entry<T>> = self.heap.iter().map(|Reverse(entry)| entry).collect();
        entries.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.arrival.cmp(&b.arrival)));
        entries
            .into_iter()
            .map(|entry| (entry.score, &entry.item))
            .collect()
    }

    /// Consumes the set, returning items in the same order as [`TopK::ranked`].
    pub fn into_ranked(self) -> Vec<(Score, T)> {
        let mut entries: Vec<Entry<T>> = self.heap.into_iter().map(|Reverse(entry)| entry).collect();
        entries.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.arrival.cmp(&b.arrival)));
        entries
            .into_iter()
            .map(|entry| (entry.score, entry.item))
            .collect()
    }
}
