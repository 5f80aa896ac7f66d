//! Loop guard for followed symbolic links.

use std::path::{Path, PathBuf};

use dashmap::DashSet;

/// Tracks the real paths of directories reached through symbolic links.
///
/// A followed link is only expanded the first time its target is seen, so
/// a link pointing back at an ancestor cannot make the scan run forever.
#[derive(Debug, Default)]
pub struct LinkTracker {
    seen: DashSet<PathBuf>,
}

impl LinkTracker {
    /// Create a new tracker.
    pub fn new() -> Self {
        Self {
            seen: DashSet::new(),
        }
    }

    /// Track a real path. Returns `true` if this is the first time seeing it.
    pub fn track(&self, real_path: PathBuf) -> bool {
        self.seen.insert(real_path)
    }

    /// Check if a real path has been seen (without tracking).
    pub fn has_seen(&self, real_path: &Path) -> bool {
        self.seen.contains(real_path)
    }

    /// Number of distinct targets tracked.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Check if nothing has been tracked.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_once() {
        let tracker = LinkTracker::new();
        assert!(tracker.track(PathBuf::from("/srv/data")));
        assert!(!tracker.track(PathBuf::from("/srv/data")));
        assert!(tracker.has_seen(Path::new("/srv/data")));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_distinct_paths() {
        let tracker = LinkTracker::new();
        assert!(tracker.is_empty());
        assert!(tracker.track(PathBuf::from("/a")));
        assert!(tracker.track(PathBuf::from("/b")));
        assert_eq!(tracker.len(), 2);
    }
}
