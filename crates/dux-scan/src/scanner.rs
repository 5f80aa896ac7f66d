//! Worker-pool directory scanner.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use dashmap::DashMap;
use rayon::Scope;
use tokio::sync::broadcast;
use tracing::{debug, info};

use dux_core::{FileSystem, OsFileSystem, ScanError, ScanNode, ScanOptions, ScanStats, Snapshot};

use crate::expand::{ExpandContext, Expander, Expansion, default_expander};
use crate::links::LinkTracker;
use crate::progress::ScanProgress;

/// Publish progress once per this many expanded directories.
const PROGRESS_INTERVAL: u64 = 256;

/// Concurrent scanner that expands directories on a fixed-size worker pool.
pub struct Scanner {
    fs: Arc<dyn FileSystem>,
    expander: Arc<dyn Expander>,
    progress_tx: broadcast::Sender<ScanProgress>,
}

impl Scanner {
    /// Create a scanner over a filesystem port, picking its default strategy.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        let expander = default_expander(fs.as_ref());
        let (progress_tx, _) = broadcast::channel(100);
        Self {
            fs,
            expander,
            progress_tx,
        }
    }

    /// Create a scanner over the real filesystem.
    pub fn os() -> Self {
        Self::new(Arc::new(OsFileSystem::new()))
    }

    /// Replace the expansion strategy.
    pub fn with_expander(mut self, expander: Arc<dyn Expander>) -> Self {
        self.expander = expander;
        self
    }

    /// Name of the strategy in use.
    pub fn strategy(&self) -> &'static str {
        self.expander.name()
    }

    /// Subscribe to scan progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Check that `path` can be scanned.
    pub fn resolve_root(&self, path: &Path) -> Result<PathBuf, ScanError> {
        let stat = self
            .fs
            .stat(path)
            .map_err(|source| ScanError::RootStatFailed {
                path: path.to_path_buf(),
                source,
            })?;
        if !stat.is_dir {
            return Err(ScanError::NotADirectory {
                path: path.to_path_buf(),
            });
        }
        Ok(path.to_path_buf())
    }

    /// Scan the tree under `root`.
    ///
    /// Directory sizes in the returned snapshot are not aggregated yet; run
    /// [`finalize_sizes`](dux_core::finalize_sizes) (or
    /// [`Snapshot::finalized`]) before reading them.
    pub fn scan(&self, root: impl AsRef<Path>, options: &ScanOptions) -> Result<Snapshot, ScanError> {
        let start = Instant::now();
        let root_path = self.resolve_root(root.as_ref())?;
        let workers = options.effective_workers();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("dux-scan-{i}"))
            .build()
            .map_err(|e| ScanError::WorkerPool {
                message: e.to_string(),
            })?;

        info!(
            root = %root_path.display(),
            workers,
            strategy = self.expander.name(),
            "starting scan"
        );

        let state = ScanState {
            fs: self.fs.as_ref(),
            expander: self.expander.as_ref(),
            options,
            links: LinkTracker::new(),
            children: DashMap::new(),
            counters: Counters::default(),
            progress_tx: &self.progress_tx,
            start,
        };

        if options.follow_symlinks {
            if let Ok(real) = self.fs.real_path(&root_path) {
                state.links.track(real);
            }
        }

        // The scope returns once every spawned expansion has finished.
        pool.scope(|scope| state.expand(scope, root_path.clone(), 0));

        let stats = state.counters.snapshot();
        state.publish(&root_path, true);

        let mut by_parent: HashMap<PathBuf, Vec<ScanNode>> = state.children.into_iter().collect();
        let mut root_node = ScanNode::new_directory(root_path);
        attach_children(&mut root_node, &mut by_parent);
        root_node.sort_children_by_name();

        let scan_duration = start.elapsed();
        info!(
            files = stats.files,
            directories = stats.directories,
            access_errors = stats.access_errors,
            elapsed_ms = scan_duration.as_millis() as u64,
            "scan complete"
        );

        Ok(Snapshot::new(root_node, stats, scan_duration))
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::os()
    }
}

/// State shared by every worker for the duration of one scan.
struct ScanState<'a> {
    fs: &'a dyn FileSystem,
    expander: &'a dyn Expander,
    options: &'a ScanOptions,
    links: LinkTracker,
    /// Children of each expanded directory, keyed by the directory's path.
    children: DashMap<PathBuf, Vec<ScanNode>>,
    counters: Counters,
    progress_tx: &'a broadcast::Sender<ScanProgress>,
    start: Instant,
}

impl<'a> ScanState<'a> {
    fn expand<'s>(&'s self, scope: &Scope<'s>, path: PathBuf, depth: u32) {
        let expand_subdirs = self.options.should_expand(depth + 1);
        let ctx = ExpandContext {
            fs: self.fs,
            options: self.options,
            links: &self.links,
            expand_subdirs,
        };

        match self.expander.expand(&ctx, &path) {
            Ok(expansion) => {
                self.counters.record(&expansion);
                let Expansion {
                    children, subdirs, ..
                } = expansion;

                if expand_subdirs {
                    for subdir in subdirs {
                        scope.spawn(move |scope| self.expand(scope, subdir, depth + 1));
                    }
                }
                if !children.is_empty() {
                    self.children.insert(path.clone(), children);
                }
            }
            Err(err) => {
                debug!(path = %path.display(), error = %err, "cannot expand directory");
                self.counters.access_errors.fetch_add(1, Ordering::Relaxed);
            }
        }

        let expanded = self.counters.expanded.fetch_add(1, Ordering::Relaxed) + 1;
        if expanded % PROGRESS_INTERVAL == 0 {
            self.publish(&path, false);
        }
    }

    fn publish(&self, current_path: &Path, finished: bool) {
        let stats = self.counters.snapshot();
        // Sending fails only when nobody is subscribed.
        let _ = self.progress_tx.send(ScanProgress {
            files: stats.files,
            directories: stats.directories,
            access_errors: stats.access_errors,
            current_path: current_path.to_path_buf(),
            elapsed: self.start.elapsed(),
            finished,
        });
    }
}

/// Counters incremented concurrently by the workers.
#[derive(Debug, Default)]
struct Counters {
    files: AtomicU64,
    directories: AtomicU64,
    access_errors: AtomicU64,
    expanded: AtomicU64,
}

impl Counters {
    fn record(&self, expansion: &Expansion) {
        self.files.fetch_add(expansion.files, Ordering::Relaxed);
        self.directories.fetch_add(expansion.dirs, Ordering::Relaxed);
        self.access_errors.fetch_add(expansion.errors, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ScanStats {
        ScanStats {
            files: self.files.load(Ordering::Relaxed),
            directories: self.directories.load(Ordering::Relaxed),
            access_errors: self.access_errors.load(Ordering::Relaxed),
        }
    }
}

/// Move each directory's collected children under it, recursively.
fn attach_children(node: &mut ScanNode, by_parent: &mut HashMap<PathBuf, Vec<ScanNode>>) {
    if let Some(children) = by_parent.remove(&node.path) {
        node.children = children;
        for child in node.children.iter_mut().filter(|c| c.is_dir()) {
            attach_children(child, by_parent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dux_core::{MemoryFileSystem, ScanErrorCode, iter_nodes};
    use std::fs;
    use tempfile::TempDir;

    fn memory_scanner(fs: MemoryFileSystem) -> Scanner {
        Scanner::new(Arc::new(fs))
    }

    fn workers(n: usize) -> ScanOptions {
        ScanOptions {
            workers: n,
            ..ScanOptions::default()
        }
    }

    fn project() -> MemoryFileSystem {
        let mut fs = MemoryFileSystem::new();
        fs.add_file("/project/src/main.py", 100, 100)
            .add_file("/project/tmp/trace.log", 500, 500)
            .add_file("/project/.cache/pip/some.whl", 200, 200)
            .add_dir("/project/empty");
        fs
    }

    #[test]
    fn test_basic_scan() {
        let snapshot = memory_scanner(project()).scan("/project", &workers(2)).unwrap();

        assert_eq!(snapshot.stats.files, 3);
        // src, tmp, .cache, .cache/pip, empty
        assert_eq!(snapshot.stats.directories, 5);
        assert_eq!(snapshot.stats.access_errors, 0);
        assert_eq!(iter_nodes(&snapshot.root).count(), 9);
    }

    #[test]
    fn test_directory_sizes_unaggregated() {
        let snapshot = memory_scanner(project()).scan("/project", &workers(2)).unwrap();
        for node in iter_nodes(&snapshot.root).filter(|n| n.is_dir()) {
            assert_eq!(node.size_bytes, 0);
            assert_eq!(node.disk_usage, 0);
        }
        assert_eq!(snapshot.finalized().total_size(), 800);
    }

    #[test]
    fn test_root_errors() {
        let mut fs = project();
        fs.fail_stat("/project/src");
        let scanner = memory_scanner(fs);

        let err = scanner.scan("/missing", &ScanOptions::default()).unwrap_err();
        assert_eq!(err.code(), ScanErrorCode::RootStatFailed);

        let err = scanner.scan("/project/src", &ScanOptions::default()).unwrap_err();
        assert_eq!(err.code(), ScanErrorCode::RootStatFailed);

        let err = scanner
            .scan("/project/tmp/trace.log", &ScanOptions::default())
            .unwrap_err();
        assert_eq!(err.code(), ScanErrorCode::NotDirectory);

        assert_eq!(
            scanner.resolve_root(Path::new("/project")).unwrap(),
            PathBuf::from("/project")
        );
    }

    #[test]
    fn test_directory_failure_isolated() {
        let mut fs = project();
        fs.add_file("/project/locked/secret", 50, 50)
            .fail_list("/project/locked");
        let snapshot = memory_scanner(fs).scan("/project", &workers(4)).unwrap();

        assert_eq!(snapshot.stats.access_errors, 1);
        assert_eq!(snapshot.stats.files, 3);
        let locked = snapshot
            .root
            .children
            .iter()
            .find(|c| c.name == "locked")
            .unwrap();
        assert!(locked.children.is_empty());
    }

    #[test]
    fn test_entry_stat_failure_excluded() {
        let mut fs = project();
        fs.fail_stat("/project/src/main.py");
        let snapshot = memory_scanner(fs).scan("/project", &workers(1)).unwrap();

        assert_eq!(snapshot.stats.access_errors, 1);
        assert_eq!(snapshot.stats.files, 2);
        assert!(
            iter_nodes(&snapshot.root).all(|n| n.path != Path::new("/project/src/main.py"))
        );
    }

    #[test]
    fn test_counts_independent_of_worker_count() {
        let mut fs = MemoryFileSystem::new();
        for d in 0..20 {
            for f in 0..15 {
                fs.add_file(format!("/wide/d{d}/s{}/f{f}", f % 3), f, f);
            }
        }
        fs.fail_list("/wide/d7/s1");
        let scanner = memory_scanner(fs);

        let single = scanner.scan("/wide", &workers(1)).unwrap();
        let many = scanner.scan("/wide", &workers(8)).unwrap();
        assert_eq!(single.stats, many.stats);
        assert_eq!(single.stats.directories, 80);
        assert_eq!(single.stats.access_errors, 1);
        assert_eq!(single.stats.files, 300 - 5);
        assert_eq!(single.root, many.root);
    }

    #[test]
    fn test_max_depth() {
        let options = ScanOptions {
            max_depth: 1,
            ..ScanOptions::default()
        };
        let snapshot = memory_scanner(project()).scan("/project", &options).unwrap();

        // Only the root is listed; its subdirectories appear but stay empty.
        assert_eq!(snapshot.stats.directories, 4);
        assert_eq!(snapshot.stats.files, 0);
        assert!(snapshot.root.children.iter().all(|c| c.children.is_empty()));
    }

    #[test]
    fn test_symlink_loop_guard() {
        let mut fs = MemoryFileSystem::new();
        fs.add_file("/r/a/file", 10, 10).add_symlink("/r/a/up", "/r");
        let options = ScanOptions {
            follow_symlinks: true,
            ..ScanOptions::default()
        };
        let snapshot = memory_scanner(fs).scan("/r", &options).unwrap();

        // `up` points back at the root, so it stays a leaf.
        assert_eq!(snapshot.stats.directories, 1);
        assert_eq!(snapshot.stats.files, 2);
    }

    #[test]
    fn test_progress_final_update() {
        let scanner = memory_scanner(project());
        let mut rx = scanner.subscribe();
        let snapshot = scanner.scan("/project", &workers(2)).unwrap();

        let mut last = None;
        while let Ok(progress) = rx.try_recv() {
            last = Some(progress);
        }
        let last = last.unwrap();
        assert!(last.finished);
        assert_eq!(last.files, snapshot.stats.files);
        assert_eq!(last.directories, snapshot.stats.directories);
    }

    #[test]
    fn test_os_scan() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("dir1/subdir")).unwrap();
        fs::create_dir(root.join("dir2")).unwrap();
        fs::write(root.join("file1.txt"), "hello").unwrap();
        fs::write(root.join("dir1/file2.txt"), "world world world").unwrap();
        fs::write(root.join("dir1/subdir/file3.txt"), "test").unwrap();
        fs::write(root.join("dir2/file4.txt"), "another file here").unwrap();

        let snapshot = Scanner::os().scan(root, &workers(3)).unwrap().finalized();
        assert_eq!(snapshot.stats.files, 4);
        assert_eq!(snapshot.stats.directories, 3);
        assert_eq!(snapshot.total_size(), 5 + 17 + 4 + 17);
    }
}
