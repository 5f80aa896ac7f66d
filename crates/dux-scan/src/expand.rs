//! Directory expansion strategies.
//!
//! A strategy lists one directory and turns its entries into child nodes.
//! Strategies only differ in how they batch filesystem calls; the
//! classification rules in [`classify`] are shared so every strategy
//! produces the same tree and the same counts.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dux_core::{DirEntry, FileSystem, NodeKind, ScanNode, ScanOptions};
use tracing::debug;

use crate::links::LinkTracker;

/// Result of expanding one directory.
#[derive(Debug, Default)]
pub struct Expansion {
    /// New child nodes, directories included (with no children yet).
    pub children: Vec<ScanNode>,
    /// Paths of the child directories that may be expanded next.
    pub subdirs: Vec<PathBuf>,
    /// Files discovered.
    pub files: u64,
    /// Directories discovered.
    pub dirs: u64,
    /// Entries that could not be stat'ed.
    pub errors: u64,
}

/// What a strategy may use while expanding.
pub struct ExpandContext<'a> {
    pub fs: &'a dyn FileSystem,
    pub options: &'a ScanOptions,
    pub links: &'a LinkTracker,
    /// Whether the directories found here will be expanded in turn.
    /// Link targets are only claimed in the loop guard when they will be.
    pub expand_subdirs: bool,
}

/// A way of expanding a single directory.
pub trait Expander: Send + Sync {
    /// Strategy name for logging and diagnostics.
    fn name(&self) -> &'static str;

    /// List `path` and classify its entries. An `Err` means the whole
    /// directory could not be read.
    fn expand(&self, ctx: &ExpandContext<'_>, path: &Path) -> io::Result<Expansion>;
}

/// Generic strategy: one listing call, metadata fetched entry by entry.
#[derive(Debug, Default, Clone, Copy)]
pub struct EntryExpander;

impl Expander for EntryExpander {
    fn name(&self) -> &'static str {
        "entry"
    }

    fn expand(&self, ctx: &ExpandContext<'_>, path: &Path) -> io::Result<Expansion> {
        let entries = ctx.fs.list_dir(path)?;
        Ok(classify(ctx, entries))
    }
}

/// Bulk strategy: names and metadata fetched as one batch by the port.
#[derive(Debug, Default, Clone, Copy)]
pub struct BulkExpander;

impl Expander for BulkExpander {
    fn name(&self) -> &'static str {
        "bulk"
    }

    fn expand(&self, ctx: &ExpandContext<'_>, path: &Path) -> io::Result<Expansion> {
        let entries = ctx.fs.list_dir_bulk(path)?;
        Ok(classify(ctx, entries))
    }
}

/// Pick the strategy for a filesystem: bulk when the port supports it.
pub fn default_expander(fs: &dyn FileSystem) -> Arc<dyn Expander> {
    if fs.supports_bulk() {
        Arc::new(BulkExpander)
    } else {
        Arc::new(EntryExpander)
    }
}

/// Turn listing entries into nodes, counting files, directories and errors.
pub fn classify(ctx: &ExpandContext<'_>, entries: Vec<DirEntry>) -> Expansion {
    let mut expansion = Expansion::default();
    expansion.children.reserve(entries.len());

    for entry in entries {
        let Some(stat) = entry.stat else {
            debug!(path = %entry.path.display(), "cannot stat entry");
            expansion.errors += 1;
            continue;
        };

        let kind = if stat.is_symlink {
            if !ctx.options.follow_symlinks {
                NodeKind::File
            } else {
                match follow_link(ctx, &entry.path) {
                    Ok(Followed::Directory) => NodeKind::Directory,
                    Ok(Followed::File(target)) => {
                        expansion.files += 1;
                        expansion.children.push(leaf(entry, target.size, target.disk_usage));
                        continue;
                    }
                    Ok(Followed::Leaf) => NodeKind::File,
                    Err(err) => {
                        debug!(path = %entry.path.display(), error = %err, "cannot resolve link");
                        expansion.errors += 1;
                        continue;
                    }
                }
            }
        } else if stat.is_dir {
            NodeKind::Directory
        } else {
            NodeKind::File
        };

        match kind {
            NodeKind::Directory => {
                expansion.dirs += 1;
                expansion.subdirs.push(entry.path.clone());
                expansion.children.push(ScanNode {
                    path: entry.path,
                    name: entry.name,
                    kind: NodeKind::Directory,
                    size_bytes: 0,
                    disk_usage: 0,
                    children: Vec::new(),
                });
            }
            NodeKind::File => {
                expansion.files += 1;
                expansion.children.push(leaf(entry, stat.size, stat.disk_usage));
            }
        }
    }

    expansion
}

enum Followed {
    /// Target is a directory not reached before; expand it.
    Directory,
    /// Target is a file; count the target's sizes.
    File(dux_core::StatResult),
    /// Dangling link or an already expanded target; keep the link itself.
    Leaf,
}

fn follow_link(ctx: &ExpandContext<'_>, path: &Path) -> io::Result<Followed> {
    let target = match ctx.fs.stat(path) {
        Ok(target) => target,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Followed::Leaf),
        Err(err) => return Err(err),
    };
    if !target.is_dir {
        return Ok(Followed::File(target));
    }
    if !ctx.expand_subdirs {
        return Ok(Followed::Directory);
    }
    let real = ctx.fs.real_path(path)?;
    if ctx.links.track(real) {
        Ok(Followed::Directory)
    } else {
        Ok(Followed::Leaf)
    }
}

fn leaf(entry: DirEntry, size_bytes: u64, disk_usage: u64) -> ScanNode {
    ScanNode {
        path: entry.path,
        name: entry.name,
        kind: NodeKind::File,
        size_bytes,
        disk_usage,
        children: Vec::new(),
    }
}
