//! Scan options and application configuration.

use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;
use crate::fs::FileSystem;
use crate::rules::{
    InsightCategory, PatternRule, default_build_artifact_rules, default_cache_rules,
    default_temp_rules,
};

/// Options for a single scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), default)]
pub struct ScanOptions {
    /// Do not expand directories at or below this depth (0 = unlimited).
    /// The root is depth 0.
    #[serde(default)]
    pub max_depth: u32,

    /// Expand symbolic links that point at directories.
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Number of scan workers (0 = one per available CPU).
    #[serde(default)]
    pub workers: usize,
}

impl ScanOptions {
    /// Create a new scan options builder.
    pub fn builder() -> ScanOptionsBuilder {
        ScanOptionsBuilder::default()
    }

    /// Worker count with `0` resolved to the available parallelism.
    pub fn effective_workers(&self) -> usize {
        match self.workers {
            0 => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            n => n,
        }
    }

    /// Whether a directory at `depth` should have its entries listed.
    pub fn should_expand(&self, depth: u32) -> bool {
        self.max_depth == 0 || depth < self.max_depth
    }
}

/// Application configuration consumed by the scanner, the insights engine
/// and the report renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Scan worker count (0 = one per available CPU).
    pub scan_workers: usize,
    /// Rows shown in each "largest" report.
    pub top_count: usize,
    /// Rows per page in paged listings.
    pub page_size: usize,
    /// Maximum scan depth (0 = unlimited).
    pub max_depth: u32,
    /// Expand symlinked directories while scanning.
    pub follow_symlinks: bool,
    /// Rules for the temp category.
    pub temp_patterns: Vec<PatternRule>,
    /// Rules for the cache category.
    pub cache_patterns: Vec<PatternRule>,
    /// Rules for the build artifact category.
    pub build_artifact_patterns: Vec<PatternRule>,
    /// Absolute paths that are always caches.
    pub additional_cache_paths: Vec<String>,
    /// Findings kept per category.
    pub max_insights_per_category: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            temp_patterns: default_temp_rules(),
            cache_patterns: default_cache_rules(),
            build_artifact_patterns: default_build_artifact_rules(),
            ..Self::without_rules()
        }
    }
}

impl AppConfig {
    /// Default scalars with every rule list empty.
    pub fn without_rules() -> Self {
        Self {
            scan_workers: 0,
            top_count: 15,
            page_size: 100,
            max_depth: 0,
            follow_symlinks: false,
            temp_patterns: Vec::new(),
            cache_patterns: Vec::new(),
            build_artifact_patterns: Vec::new(),
            additional_cache_paths: Vec::new(),
            max_insights_per_category: 1000,
        }
    }

    /// Configured rules for one category, in evaluation order.
    pub fn rules_for(&self, category: InsightCategory) -> &[PatternRule] {
        match category {
            InsightCategory::Temp => &self.temp_patterns,
            InsightCategory::Cache => &self.cache_patterns,
            InsightCategory::BuildArtifact => &self.build_artifact_patterns,
        }
    }

    /// Scan options implied by this configuration.
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            max_depth: self.max_depth,
            follow_symlinks: self.follow_symlinks,
            workers: self.scan_workers,
        }
    }

    /// Serialize to a plain key-value representation.
    pub fn to_value(&self) -> Result<Value, ConfigError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Build a config from a key-value representation. Keys absent from
    /// `value` keep their value from `base`; unknown keys are ignored.
    pub fn from_value(value: &Value, base: &AppConfig) -> Result<Self, ConfigError> {
        let Value::Object(overlay) = value else {
            return Err(ConfigError::Parse(serde::de::Error::custom(
                "configuration must be an object",
            )));
        };

        let mut merged = serde_json::to_value(base)?;
        if let Value::Object(target) = &mut merged {
            for (key, field) in overlay {
                if target.contains_key(key) {
                    target.insert(key.clone(), field.clone());
                }
            }
        }
        Ok(serde_json::from_value(merged)?)
    }

    /// Load a JSON config file through the filesystem port, on top of the defaults.
    pub fn load(fs: &dyn FileSystem, path: &Path) -> Result<Self, ConfigError> {
        let text = fs.read_text(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value = serde_json::from_str(&text)?;
        Self::from_value(&value, &Self::default())
    }

    /// Write this config as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(write_err)
    }
}

/// Per-user config location, e.g. `~/.config/dux/config.json`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("dux").join("config.json"))
}
