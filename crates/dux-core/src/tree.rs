//! Scan results and summary statistics.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::node::ScanNode;

/// Counters collected while scanning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Files (and other non-expanded entries) discovered.
    pub files: u64,
    /// Directories discovered below the root.
    pub directories: u64,
    /// Entries or directories that could not be read.
    pub access_errors: u64,
}

impl ScanStats {
    /// Total entries discovered.
    pub fn total_entries(&self) -> u64 {
        self.files + self.directories
    }

    /// Check if any access errors were recorded.
    pub fn has_errors(&self) -> bool {
        self.access_errors > 0
    }
}

/// Successful scan outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Root of the scanned tree.
    pub root: ScanNode,

    /// Frozen scan counters.
    pub stats: ScanStats,

    /// Wall time the scan took.
    pub scan_duration: Duration,
}

impl Snapshot {
    /// Create a new snapshot.
    pub fn new(root: ScanNode, stats: ScanStats, scan_duration: Duration) -> Self {
        Self {
            root,
            stats,
            scan_duration,
        }
    }

    /// Aggregate directory sizes in place and return the snapshot.
    pub fn finalized(mut self) -> Self {
        crate::analytics::finalize_sizes(&mut self.root);
        self
    }

    /// Total logical size under the root (valid after finalization).
    pub fn total_size(&self) -> u64 {
        self.root.size_bytes
    }

    /// Total disk usage under the root (valid after finalization).
    pub fn total_disk_usage(&self) -> u64 {
        self.root.disk_usage
    }
}
