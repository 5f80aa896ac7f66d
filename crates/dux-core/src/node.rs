//! File and directory node types.

use std::path::{Path, PathBuf};

use compact_str::CompactString;
use serde::{Deserialize, Serialize, Serializer};

/// Type of file system node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Anything that is not expanded: regular files, unfollowed symlinks, devices.
    File,
    /// Directory.
    Directory,
}

impl NodeKind {
    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, NodeKind::Directory)
    }

    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        matches!(self, NodeKind::File)
    }

    /// Short label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::File => "FILE",
            NodeKind::Directory => "DIR",
        }
    }
}

/// A single file or directory in the scanned tree.
///
/// File sizes are fixed at creation. Directory sizes stay at zero until
/// [`finalize_sizes`](crate::finalize_sizes) has run over the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanNode {
    /// Absolute path, unique within a tree.
    #[serde(serialize_with = "serialize_path")]
    pub path: PathBuf,

    /// File/directory name (not full path).
    pub name: CompactString,

    /// Node type.
    pub kind: NodeKind,

    /// Logical size in bytes (aggregate for directories).
    pub size_bytes: u64,

    /// Bytes actually allocated on disk (aggregate for directories).
    pub disk_usage: u64,

    /// Children nodes (directories only). Files keep the empty,
    /// non-allocating `Vec::new()` for their whole life.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ScanNode>,
}

impl ScanNode {
    /// Create a new file node.
    pub fn new_file(path: impl Into<PathBuf>, size_bytes: u64, disk_usage: u64) -> Self {
        let path = path.into();
        Self {
            name: name_of(&path),
            path,
            kind: NodeKind::File,
            size_bytes,
            disk_usage,
            children: Vec::new(),
        }
    }

    /// Create a new, empty directory node with unaggregated sizes.
    pub fn new_directory(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: name_of(&path),
            path,
            kind: NodeKind::Directory,
            size_bytes: 0,
            disk_usage: 0,
            children: Vec::new(),
        }
    }

    /// Attach children, consuming and returning the node.
    pub fn with_children(mut self, children: Vec<ScanNode>) -> Self {
        self.children = children;
        self
    }

    /// Check if this node is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Check if this node is a file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Get the number of direct children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Sort children by name, recursively.
    pub fn sort_children_by_name(&mut self) {
        self.children.sort_by(|a, b| a.name.cmp(&b.name));
        for child in &mut self.children {
            child.sort_children_by_name();
        }
    }
}

/// Last path component, or the whole path for roots like `/`.
pub fn name_of(path: &Path) -> CompactString {
    match path.file_name() {
        Some(name) => CompactString::new(name.to_string_lossy()),
        None => CompactString::new(path.to_string_lossy()),
    }
}

/// Serialize a path as a string, replacing invalid UTF-8 with U+FFFD.
///
/// Use with `#[serde(serialize_with = "...")]`; plain `PathBuf`
/// serialization fails on such paths.
pub fn serialize_path<P, S>(path: &P, serializer: S) -> Result<S::Ok, S::Error>
where
    P: AsRef<Path>,
    S: Serializer,
{
    serializer.serialize_str(&path.as_ref().to_string_lossy())
}
