//! Core types and traits for dux.
//!
//! This crate provides the data structures shared by the scanner, the
//! insights engine and the CLI:
//!
//! - [`ScanNode`] trees and the [`Snapshot`] a scan produces
//! - the [`FileSystem`] port with OS and in-memory implementations
//! - [`AppConfig`], [`ScanOptions`] and [`PatternRule`] configuration
//! - tree analytics: [`finalize_sizes`], [`iter_nodes`], [`top_nodes`]

mod analytics;
mod config;
mod error;
pub mod fs;
mod node;
mod rules;
mod tree;

pub use analytics::{NodeIter, finalize_sizes, iter_nodes, top_nodes};
pub use config::{AppConfig, ScanOptions, ScanOptionsBuilder, default_config_path};
pub use error::{ConfigError, ScanError, ScanErrorCode};
pub use fs::{DirEntry, FileSystem, MemoryFileSystem, OsFileSystem, StatResult};
pub use node::{NodeKind, ScanNode, name_of, serialize_path};
pub use rules::{
    ApplyTo, InsightCategory, PatternRule, default_build_artifact_rules, default_cache_rules,
    default_temp_rules,
};
pub use tree::{ScanStats, Snapshot};
