//! Insights engine for dux.
//!
//! Classifies the nodes of a finalized scan tree into actionable
//! categories using configurable glob rules:
//!
//! - **Temp** - scratch directories, logs, editor leftovers
//! - **Cache** - tool and package-manager caches
//! - **Build artifacts** - build outputs and dependency-install trees
//!
//! Only the largest findings of each category are kept, so memory stays
//! bounded on trees with millions of matches.
//!
//! # Traversal
//!
//! Nodes are visited in pre-order, once. When a node matches a category,
//! its descendants are no longer checked against that category but remain
//! eligible for the others. A rule with `stop_recursion` set halts the walk
//! below the matched node entirely.
//!
//! ```rust,ignore
//! use dux_analyze::generate_insights;
//! use dux_core::AppConfig;
//! use dux_scan::Scanner;
//!
//! let config = AppConfig::default();
//! let snapshot = Scanner::os()
//!     .scan("/path/to/scan", &config.scan_options())
//!     .unwrap()
//!     .finalized();
//!
//! let bundle = generate_insights(&snapshot.root, &config).unwrap();
//! for insight in &bundle.insights {
//!     println!("{} {} ({})", insight.category, insight.path.display(), insight.summary);
//! }
//! ```

mod insights;
mod matcher;
mod ranking;

pub use insights::{Insight, InsightBundle, filter_insights, generate_insights};
pub use matcher::{CompiledRule, MatchPath, RuleSet};
pub use ranking::BoundedRanking;

// Re-export core types
pub use dux_core::{ApplyTo, InsightCategory, PatternRule};
