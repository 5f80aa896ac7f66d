//! In-memory filesystem for tests and dry runs.

use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

use super::{DirEntry, FileSystem, StatResult};
use crate::node::name_of;

/// Symlink chains longer than this are treated as loops.
const MAX_LINK_HOPS: usize = 40;

#[derive(Debug, Clone)]
enum MemNode {
    Dir,
    File {
        size: u64,
        disk_usage: u64,
        text: Option<String>,
    },
    Symlink {
        target: PathBuf,
    },
}

/// A filesystem that lives entirely in memory.
///
/// Parents are created implicitly, so `add_file("/a/b/c.txt", ..)` also
/// creates `/a` and `/a/b`. Individual paths can be made to fail with
/// [`fail_stat`](Self::fail_stat) and [`fail_list`](Self::fail_list).
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    nodes: BTreeMap<PathBuf, MemNode>,
    stat_failures: HashSet<PathBuf>,
    list_failures: HashSet<PathBuf>,
}

impl MemoryFileSystem {
    /// Create an empty filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory (and any missing parents).
    pub fn add_dir(&mut self, path: impl AsRef<Path>) -> &mut Self {
        let path = path.as_ref();
        self.add_parents(path);
        self.nodes.entry(path.to_path_buf()).or_insert(MemNode::Dir);
        self
    }

    /// Add a file with the given logical size and disk usage.
    pub fn add_file(&mut self, path: impl AsRef<Path>, size: u64, disk_usage: u64) -> &mut Self {
        let path = path.as_ref();
        self.add_parents(path);
        self.nodes.insert(
            path.to_path_buf(),
            MemNode::File {
                size,
                disk_usage,
                text: None,
            },
        );
        self
    }

    /// Add a file with text content; size and usage are the text length.
    pub fn add_text_file(&mut self, path: impl AsRef<Path>, text: impl Into<String>) -> &mut Self {
        let path = path.as_ref();
        let text = text.into();
        let size = text.len() as u64;
        self.add_parents(path);
        self.nodes.insert(
            path.to_path_buf(),
            MemNode::File {
                size,
                disk_usage: size,
                text: Some(text),
            },
        );
        self
    }

    /// Add a symbolic link pointing at an absolute target.
    pub fn add_symlink(&mut self, path: impl AsRef<Path>, target: impl Into<PathBuf>) -> &mut Self {
        let path = path.as_ref();
        self.add_parents(path);
        self.nodes.insert(
            path.to_path_buf(),
            MemNode::Symlink {
                target: target.into(),
            },
        );
        self
    }

    /// Make every stat of `path` fail, including its listing entry.
    pub fn fail_stat(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.stat_failures.insert(path.into());
        self
    }

    /// Make listing `path` fail.
    pub fn fail_list(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.list_failures.insert(path.into());
        self
    }

    fn add_parents(&mut self, path: &Path) {
        let mut current = path.parent();
        while let Some(parent) = current {
            if parent.as_os_str().is_empty() {
                break;
            }
            self.nodes.entry(parent.to_path_buf()).or_insert(MemNode::Dir);
            current = parent.parent();
        }
    }

    /// Resolve every symlink along `path`.
    fn resolve(&self, path: &Path) -> io::Result<PathBuf> {
        let mut resolved = PathBuf::new();
        let mut hops = 0;
        for component in path.components() {
            resolved.push(component);
            while let Some(MemNode::Symlink { target }) = self.nodes.get(&resolved) {
                hops += 1;
                if hops > MAX_LINK_HOPS {
                    return Err(io::Error::other(format!(
                        "too many levels of symbolic links: {}",
                        path.display()
                    )));
                }
                resolved = target.clone();
            }
        }
        Ok(resolved)
    }

    fn lookup(&self, path: &Path) -> io::Result<&MemNode> {
        self.nodes.get(path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file or directory: {}", path.display()),
            )
        })
    }

    fn check_stat(&self, path: &Path) -> io::Result<()> {
        if self.stat_failures.contains(path) {
            return Err(permission_denied(path));
        }
        Ok(())
    }
}

impl FileSystem for MemoryFileSystem {
    fn stat(&self, path: &Path) -> io::Result<StatResult> {
        self.check_stat(path)?;
        let real = self.resolve(path)?;
        self.check_stat(&real)?;
        Ok(match self.lookup(&real)? {
            MemNode::Dir => StatResult {
                is_dir: true,
                ..StatResult::default()
            },
            MemNode::File {
                size, disk_usage, ..
            } => StatResult {
                size: *size,
                disk_usage: *disk_usage,
                ..StatResult::default()
            },
            MemNode::Symlink { .. } => {
                return Err(io::Error::other(format!(
                    "unresolved symbolic link: {}",
                    path.display()
                )));
            }
        })
    }

    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let real = self.resolve(path)?;
        if self.list_failures.contains(path) || self.list_failures.contains(&real) {
            return Err(permission_denied(path));
        }
        if !matches!(self.lookup(&real)?, MemNode::Dir) {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("not a directory: {}", path.display()),
            ));
        }

        let entries = self
            .nodes
            .iter()
            .filter(|(child, _)| child.parent() == Some(real.as_path()))
            .map(|(child, node)| {
                let name = name_of(child);
                let entry_path = path.join(name.as_str());
                let failed = self.stat_failures.contains(child.as_path())
                    || self.stat_failures.contains(&entry_path);
                let stat = (!failed).then(|| match node {
                    MemNode::Dir => StatResult {
                        is_dir: true,
                        ..StatResult::default()
                    },
                    MemNode::File {
                        size, disk_usage, ..
                    } => StatResult {
                        size: *size,
                        disk_usage: *disk_usage,
                        ..StatResult::default()
                    },
                    MemNode::Symlink { target } => StatResult {
                        size: target.as_os_str().len() as u64,
                        is_symlink: true,
                        ..StatResult::default()
                    },
                });
                DirEntry {
                    name,
                    path: entry_path,
                    stat,
                }
            })
            .collect();
        Ok(entries)
    }

    fn read_text(&self, path: &Path) -> io::Result<String> {
        self.check_stat(path)?;
        let real = self.resolve(path)?;
        match self.lookup(&real)? {
            MemNode::File { text, .. } => Ok(text.clone().unwrap_or_default()),
            _ => Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("not a regular file: {}", path.display()),
            )),
        }
    }

    fn real_path(&self, path: &Path) -> io::Result<PathBuf> {
        let real = self.resolve(path)?;
        self.lookup(&real)?;
        Ok(real)
    }
}

fn permission_denied(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::PermissionDenied,
        format!("permission denied: {}", path.display()),
    )
}
