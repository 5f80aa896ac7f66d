//! Filesystem port backed by `std::fs`.

use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

use compact_str::CompactString;
use rayon::prelude::*;

use super::{DirEntry, FileSystem, StatResult};

/// The real operating system filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl OsFileSystem {
    /// Create a new OS filesystem handle.
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for OsFileSystem {
    fn stat(&self, path: &Path) -> io::Result<StatResult> {
        fs::metadata(path).map(|m| to_stat(&m))
    }

    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            // DirEntry::metadata does not traverse symlinks.
            let stat = entry.metadata().ok().map(|m| to_stat(&m));
            entries.push(DirEntry {
                name: CompactString::new(entry.file_name().to_string_lossy()),
                path: entry.path(),
                stat,
            });
        }
        Ok(entries)
    }

    fn read_text(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn real_path(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }

    fn supports_bulk(&self) -> bool {
        cfg!(unix)
    }

    fn list_dir_bulk(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        // Enumerate names first, then stat the whole batch in parallel.
        let names = fs::read_dir(path)?
            .map(|entry| entry.map(|e| (e.file_name(), e.path())))
            .collect::<io::Result<Vec<_>>>()?;

        Ok(names
            .into_par_iter()
            .map(|(name, path)| {
                let stat = fs::symlink_metadata(&path).ok().map(|m| to_stat(&m));
                DirEntry {
                    name: CompactString::new(name.to_string_lossy()),
                    path,
                    stat,
                }
            })
            .collect())
    }
}

fn to_stat(metadata: &Metadata) -> StatResult {
    StatResult {
        size: metadata.len(),
        disk_usage: disk_usage(metadata),
        is_dir: metadata.is_dir(),
        is_symlink: metadata.file_type().is_symlink(),
    }
}

/// Allocated bytes, from the 512-byte block count.
#[cfg(unix)]
fn disk_usage(metadata: &Metadata) -> u64 {
    metadata.blocks() * 512
}

/// Estimate allocated bytes by rounding up to a 4 KiB cluster.
#[cfg(not(unix))]
fn disk_usage(metadata: &Metadata) -> u64 {
    metadata.len().div_ceil(4096) * 4096
}
