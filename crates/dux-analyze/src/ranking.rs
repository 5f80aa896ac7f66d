//! Bounded, path-deduplicating ranking of findings.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};
use std::path::{Path, PathBuf};

use crate::insights::Insight;

/// Heap entry ordered by disk usage, then path.
#[derive(Debug)]
struct Entry(Insight);

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .disk_usage
            .cmp(&other.0.disk_usage)
            .then_with(|| other.0.path.cmp(&self.0.path))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

/// Keeps the largest findings of one category, at most `capacity` of them.
///
/// A path seen again with a higher usage is re-inserted rather than updated
/// in place, so stale entries may sit in the heap until
/// [`into_sorted`](Self::into_sorted) drops them.
#[derive(Debug)]
pub struct BoundedRanking {
    capacity: usize,
    heap: BinaryHeap<Reverse<Entry>>,
    /// Highest usage ever offered per path.
    seen: HashMap<PathBuf, u64>,
}

impl BoundedRanking {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            heap: BinaryHeap::new(),
            seen: HashMap::new(),
        }
    }

    /// Offer a finding. Returns whether it entered the heap.
    pub fn push(&mut self, insight: Insight) -> bool {
        let usage = insight.disk_usage;
        match self.seen.get_mut(&insight.path) {
            Some(best) if *best >= usage => return false,
            Some(best) => *best = usage,
            None => {
                self.seen.insert(insight.path.clone(), usage);
            }
        }

        if self.heap.len() < self.capacity {
            self.heap.push(Reverse(Entry(insight)));
            true
        } else if self
            .heap
            .peek()
            .is_some_and(|Reverse(min)| usage > min.0.disk_usage)
        {
            self.heap.pop();
            self.heap.push(Reverse(Entry(insight)));
            true
        } else {
            false
        }
    }

    /// Entries currently held, stale ones included.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Highest usage offered for `path`, whether or not it was kept.
    pub fn recorded(&self, path: &Path) -> Option<u64> {
        self.seen.get(path).copied()
    }

    /// Current findings, largest first, without stale duplicates.
    pub fn into_sorted(self) -> Vec<Insight> {
        let seen = self.seen;
        // Ascending on `Reverse`, so largest usage comes first.
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(Entry(insight))| insight)
            .filter(|insight| seen.get(&insight.path) == Some(&insight.disk_usage))
            .collect()
    }
}
