//! Pattern rules that classify nodes into insight categories.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter};

use crate::node::NodeKind;

/// Actionable category a node can be classified into.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InsightCategory {
    /// Temporary files and scratch directories.
    Temp,
    /// Tool and package-manager caches.
    Cache,
    /// Build outputs and dependency-install trees.
    BuildArtifact,
}

/// Which node kinds a rule may match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyTo {
    File,
    Directory,
    #[default]
    Both,
}

impl ApplyTo {
    /// Whether a node of `kind` is eligible for a rule with this setting.
    pub fn accepts(self, kind: NodeKind) -> bool {
        match self {
            ApplyTo::File => kind == NodeKind::File,
            ApplyTo::Directory => kind == NodeKind::Directory,
            ApplyTo::Both => true,
        }
    }
}

/// A named glob that classifies matching nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRule {
    /// Human-readable rule name, used as the insight summary.
    pub name: String,
    /// Glob matched case-insensitively against the full path.
    pub pattern: String,
    /// Category assigned on match.
    pub category: InsightCategory,
    /// Node kinds the rule applies to.
    #[serde(default)]
    pub apply_to: ApplyTo,
    /// Stop all traversal below a matched node.
    #[serde(default)]
    pub stop_recursion: bool,
}

impl PatternRule {
    /// Create a rule that applies to files and directories.
    pub fn new(
        name: impl Into<String>,
        pattern: impl Into<String>,
        category: InsightCategory,
    ) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            category,
            apply_to: ApplyTo::Both,
            stop_recursion: false,
        }
    }

    /// Restrict the rule to one node kind.
    pub fn apply_to(mut self, apply_to: ApplyTo) -> Self {
        self.apply_to = apply_to;
        self
    }

    /// Stop traversal below matches of this rule.
    pub fn stop_recursion(mut self) -> Self {
        self.stop_recursion = true;
        self
    }
}

fn dir_rule(name: &str, pattern: &str, category: InsightCategory) -> PatternRule {
    PatternRule::new(name, pattern, category).apply_to(ApplyTo::Directory)
}

fn file_rule(name: &str, pattern: &str, category: InsightCategory) -> PatternRule {
    PatternRule::new(name, pattern, category).apply_to(ApplyTo::File)
}

/// Built-in temporary file rules.
pub fn default_temp_rules() -> Vec<PatternRule> {
    use InsightCategory::Temp;
    vec![
        dir_rule("tmp directory", "**/tmp/**", Temp),
        dir_rule("temp directory", "**/temp/**", Temp),
        file_rule("temporary file", "**/*.tmp", Temp),
        file_rule("temporary file", "**/*.temp", Temp),
        file_rule("editor swap file", "**/*.swp", Temp),
        file_rule("editor backup file", "**/*~", Temp),
        file_rule("log file", "**/*.log", Temp),
        file_rule("core dump", "**/core.[0-9]*", Temp),
        file_rule("Finder metadata", "**/.DS_Store", Temp),
        file_rule("Windows thumbnail cache", "**/Thumbs.db", Temp),
    ]
}

/// Built-in cache rules.
pub fn default_cache_rules() -> Vec<PatternRule> {
    use InsightCategory::Cache;
    vec![
        dir_rule("user cache", "**/.cache/**", Cache),
        dir_rule("macOS caches", "**/Library/Caches/**", Cache),
        dir_rule("Python bytecode cache", "**/__pycache__/**", Cache),
        dir_rule("pytest cache", "**/.pytest_cache/**", Cache),
        dir_rule("mypy cache", "**/.mypy_cache/**", Cache),
        dir_rule("ruff cache", "**/.ruff_cache/**", Cache),
        dir_rule("npm cache", "**/.npm/_cacache/**", Cache),
        dir_rule("yarn cache", "**/.yarn/cache/**", Cache),
        dir_rule("Gradle cache", "**/.gradle/caches/**", Cache),
        dir_rule("Cargo registry cache", "**/.cargo/registry/cache/**", Cache),
        file_rule("Python bytecode", "**/*.pyc", Cache),
    ]
}

/// Built-in build artifact rules.
pub fn default_build_artifact_rules() -> Vec<PatternRule> {
    use InsightCategory::BuildArtifact;
    vec![
        dir_rule("node modules", "**/node_modules/**", BuildArtifact).stop_recursion(),
        dir_rule("Python virtualenv", "**/.venv/**", BuildArtifact).stop_recursion(),
        dir_rule("tox environments", "**/.tox/**", BuildArtifact).stop_recursion(),
        dir_rule("Cargo target directory", "**/target/**", BuildArtifact).stop_recursion(),
        dir_rule("build output", "**/build/**", BuildArtifact),
        dir_rule("dist output", "**/dist/**", BuildArtifact),
        dir_rule("Next.js build", "**/.next/**", BuildArtifact).stop_recursion(),
        file_rule("object file", "**/*.o", BuildArtifact),
        file_rule("Java class file", "**/*.class", BuildArtifact),
    ]
}
