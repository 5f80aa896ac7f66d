//! The filesystem port.
//!
//! The scan engine never touches the operating system directly. Everything it
//! needs goes through [`FileSystem`], which has an OS-backed implementation
//! ([`OsFileSystem`]) and an in-memory double ([`MemoryFileSystem`]).

mod memory;
mod os;

use std::io;
use std::path::{Path, PathBuf};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

pub use memory::MemoryFileSystem;
pub use os::OsFileSystem;

/// Metadata the scanner needs about one path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatResult {
    /// Logical size in bytes.
    pub size: u64,
    /// Bytes allocated on disk.
    pub disk_usage: u64,
    /// Whether the path is a directory.
    pub is_dir: bool,
    /// Whether the path itself is a symbolic link (never set by [`FileSystem::stat`]).
    pub is_symlink: bool,
}

/// One entry produced by a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Entry name.
    pub name: CompactString,
    /// Full path of the entry (the listed directory joined with `name`).
    pub path: PathBuf,
    /// Link-level metadata, or `None` if stat'ing this entry failed.
    pub stat: Option<StatResult>,
}

/// Capability set the scan engine consumes.
pub trait FileSystem: Send + Sync {
    /// Stat a path, following symbolic links.
    fn stat(&self, path: &Path) -> io::Result<StatResult>;

    /// List a directory. Entry metadata describes the entry itself, not the
    /// target of a symbolic link.
    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Read a whole file as UTF-8 text.
    fn read_text(&self, path: &Path) -> io::Result<String>;

    /// Resolve a path to its canonical location.
    fn real_path(&self, path: &Path) -> io::Result<PathBuf> {
        Ok(path.to_path_buf())
    }

    /// Whether [`FileSystem::list_dir_bulk`] batches metadata calls.
    fn supports_bulk(&self) -> bool {
        false
    }

    /// List a directory, fetching entry metadata in one batch.
    fn list_dir_bulk(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        self.list_dir(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Minimal;

    impl FileSystem for Minimal {
        fn stat(&self, _path: &Path) -> io::Result<StatResult> {
            Ok(StatResult::default())
        }

        fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
            Ok(vec![DirEntry {
                name: "only".into(),
                path: path.join("only"),
                stat: None,
            }])
        }

        fn read_text(&self, _path: &Path) -> io::Result<String> {
            Ok(String::new())
        }
    }

    #[test]
    fn test_provided_methods() {
        let fs = Minimal;
        assert!(!fs.supports_bulk());
        assert_eq!(fs.real_path(Path::new("/a/b")).unwrap(), PathBuf::from("/a/b"));
        let entries = fs.list_dir_bulk(Path::new("/a")).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, PathBuf::from("/a/only"));
    }
}
