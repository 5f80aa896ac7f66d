//! Compiled, case-insensitive rule sets.

use std::borrow::Cow;
use std::path::Path;

use globset::{GlobBuilder, GlobMatcher};
use tracing::warn;

use dux_core::{ApplyTo, ConfigError, InsightCategory, NodeKind, PatternRule, ScanNode};

/// A rule with its glob compiled.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub name: String,
    pub apply_to: ApplyTo,
    pub stop_recursion: bool,
    matcher: GlobMatcher,
}

impl CompiledRule {
    fn compile(rule: &PatternRule) -> Result<Self, ConfigError> {
        Ok(Self {
            name: rule.name.clone(),
            apply_to: rule.apply_to,
            stop_recursion: rule.stop_recursion,
            matcher: compile_glob(&rule.name, &rule.pattern)?,
        })
    }

    /// Glob source the rule was compiled from.
    pub fn pattern(&self) -> &str {
        self.matcher.glob().glob()
    }

    fn matches(&self, kind: NodeKind, path: &MatchPath) -> bool {
        self.apply_to.accepts(kind) && path.any(|p| self.matcher.is_match(p))
    }
}

fn compile_glob(rule: &str, pattern: &str) -> Result<GlobMatcher, ConfigError> {
    GlobBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|e| {
            warn!(rule, pattern, error = %e, "invalid glob pattern");
            ConfigError::InvalidPattern {
                rule: rule.to_string(),
                pattern: pattern.to_string(),
                message: e.to_string(),
            }
        })
}

/// The rules of one category, in configuration order.
#[derive(Debug, Clone)]
pub struct RuleSet {
    category: InsightCategory,
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    /// Compile `rules` for `category`.
    ///
    /// Rules filed under a different category are skipped.
    pub fn compile(category: InsightCategory, rules: &[PatternRule]) -> Result<Self, ConfigError> {
        let rules = rules
            .iter()
            .filter(|rule| rule.category == category)
            .map(CompiledRule::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { category, rules })
    }

    /// Append exact-path rules that match files and directories alike.
    pub fn with_literal_paths(mut self, paths: &[String]) -> Result<Self, ConfigError> {
        for path in paths {
            let pattern = globset::escape(&normalize(Path::new(path)));
            self.rules.push(CompiledRule {
                name: path.clone(),
                apply_to: ApplyTo::Both,
                stop_recursion: false,
                matcher: compile_glob(path, &pattern)?,
            });
        }
        Ok(self)
    }

    pub fn category(&self) -> InsightCategory {
        self.category
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First rule, in configuration order, that classifies a node of
    /// `kind` at `path`.
    pub fn first_match(&self, kind: NodeKind, path: &MatchPath) -> Option<&CompiledRule> {
        self.rules.iter().find(|rule| rule.matches(kind, path))
    }
}

/// Strings a node's path is matched as. Directories also match with a
/// trailing separator so `**/name/**` selects the directory itself.
///
/// Built once per node and shared by every rule set.
#[derive(Debug, Clone)]
pub struct MatchPath {
    plain: String,
    as_dir: Option<String>,
}

impl MatchPath {
    pub fn of(node: &ScanNode) -> Self {
        let plain = normalize(&node.path).into_owned();
        let as_dir = node
            .is_dir()
            .then(|| format!("{}/", plain.trim_end_matches('/')));
        Self { plain, as_dir }
    }

    fn any(&self, mut f: impl FnMut(&str) -> bool) -> bool {
        f(&self.plain) || self.as_dir.as_deref().is_some_and(f)
    }
}

/// Path as a `/`-separated string.
fn normalize(path: &Path) -> Cow<'_, str> {
    let text = path.to_string_lossy();
    if cfg!(windows) && text.contains('\\') {
        Cow::Owned(text.replace('\\', "/"))
    } else {
        text
    }
}
