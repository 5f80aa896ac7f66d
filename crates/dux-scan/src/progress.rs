//! Scan progress reporting.

use std::path::PathBuf;
use std::time::Duration;

/// Progress information during a scan.
#[derive(Debug, Clone, Default)]
pub struct ScanProgress {
    /// Files discovered so far.
    pub files: u64,
    /// Directories discovered so far.
    pub directories: u64,
    /// Access errors recorded so far.
    pub access_errors: u64,
    /// Directory most recently expanded.
    pub current_path: PathBuf,
    /// Time elapsed since scan started.
    pub elapsed: Duration,
    /// Set on the last update of a scan.
    pub finished: bool,
}

impl ScanProgress {
    /// Calculate scan rate in entries per second.
    pub fn entries_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.total_items() as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Get total items discovered (files + dirs).
    pub fn total_items(&self) -> u64 {
        self.files + self.directories
    }
}
