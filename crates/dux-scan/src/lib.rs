//! Directory scanning engine for dux.
//!
//! # Overview
//!
//! `dux-scan` walks a directory tree through the [`FileSystem`] port and
//! builds an unaggregated [`ScanNode`] tree. Key features:
//!
//! - **Worker pool** of a configurable size; each directory is one task
//! - **Expansion strategies** behind the [`Expander`] trait (bulk listing
//!   where the platform supports it)
//! - **Progress updates** via broadcast channels
//! - **Symlink loop protection** when links are followed
//! - **Fault isolation**: unreadable entries are counted, never fatal
//!
//! # Example
//!
//! ```rust,no_run
//! use dux_scan::{ScanOptions, Scanner};
//!
//! let scanner = Scanner::os();
//! let snapshot = scanner
//!     .scan("/path/to/scan", &ScanOptions::default())
//!     .unwrap()
//!     .finalized();
//!
//! println!("Total size: {} bytes", snapshot.total_size());
//! println!("Files: {}", snapshot.stats.files);
//! ```
//!
//! # Progress Monitoring
//!
//! ```rust,no_run
//! use dux_scan::Scanner;
//!
//! let scanner = Scanner::os();
//! let mut progress_rx = scanner.subscribe();
//!
//! std::thread::spawn(move || {
//!     while let Ok(progress) = progress_rx.blocking_recv() {
//!         println!("Scanned {} files", progress.files);
//!     }
//! });
//! ```

mod expand;
mod links;
mod progress;
mod scanner;

pub use expand::{
    BulkExpander, EntryExpander, ExpandContext, Expander, Expansion, classify, default_expander,
};
pub use links::LinkTracker;
pub use progress::ScanProgress;
pub use scanner::Scanner;

// Re-export core types for convenience
pub use dux_core::{FileSystem, NodeKind, ScanError, ScanNode, ScanOptions, ScanStats, Snapshot};
