//! Classify a finalized tree into temp, cache and build-artifact findings.

use std::collections::HashSet;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tracing::debug;

use dux_core::{AppConfig, ConfigError, InsightCategory, NodeKind, ScanNode, serialize_path};

use crate::matcher::{MatchPath, RuleSet};
use crate::ranking::BoundedRanking;

/// One classified node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(serialize_with = "serialize_path")]
    pub path: PathBuf,
    pub size_bytes: u64,
    pub disk_usage: u64,
    pub kind: NodeKind,
    pub category: InsightCategory,
    /// Name of the rule that matched.
    pub summary: String,
}

impl Insight {
    fn from_node(node: &ScanNode, category: InsightCategory, summary: &str) -> Self {
        Self {
            path: node.path.clone(),
            size_bytes: node.size_bytes,
            disk_usage: node.disk_usage,
            kind: node.kind,
            category,
            summary: summary.to_string(),
        }
    }
}

/// All findings of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightBundle {
    /// Every finding, grouped by category and largest first within each.
    pub insights: Vec<Insight>,
    /// The same findings per category; empty categories are absent.
    pub by_category: IndexMap<InsightCategory, Vec<Insight>>,
}

impl InsightBundle {
    pub fn is_empty(&self) -> bool {
        self.insights.is_empty()
    }

    pub fn len(&self) -> usize {
        self.insights.len()
    }

    /// Findings of one category, largest first.
    pub fn category(&self, category: InsightCategory) -> &[Insight] {
        self.by_category
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Sum of disk usage over all findings.
    ///
    /// Findings of different categories may overlap on disk.
    pub fn total_disk_usage(&self) -> u64 {
        self.insights
            .iter()
            .fold(0u64, |acc, i| acc.saturating_add(i.disk_usage))
    }
}

/// Classify every node below `root` using the rules in `config`.
///
/// `root` must already be finalized. Each category keeps at most
/// `config.max_insights_per_category` findings. Below a node matched by a
/// category, that category stops matching; below a node matched by a
/// `stop_recursion` rule, nothing is visited.
pub fn generate_insights(root: &ScanNode, config: &AppConfig) -> Result<InsightBundle, ConfigError> {
    let all_rules: Vec<_> = InsightCategory::iter()
        .flat_map(|category| config.rules_for(category).iter().cloned())
        .collect();

    let mut rule_sets = Vec::new();
    for category in InsightCategory::iter() {
        let mut set = RuleSet::compile(category, &all_rules)?;
        if category == InsightCategory::Cache {
            set = set.with_literal_paths(&config.additional_cache_paths)?;
        }
        rule_sets.push(set);
    }

    let mut rankings: Vec<BoundedRanking> = rule_sets
        .iter()
        .map(|_| BoundedRanking::new(config.max_insights_per_category))
        .collect();

    // Bit `i` set: rule set `i` is suppressed for this subtree.
    let mut stack: Vec<(&ScanNode, u8)> = root.children.iter().rev().map(|c| (c, 0)).collect();
    let mut visited = 0usize;

    while let Some((node, skip)) = stack.pop() {
        visited += 1;
        let mut child_skip = skip;
        let mut stop = false;
        let match_path = MatchPath::of(node);

        for (i, set) in rule_sets.iter().enumerate() {
            if skip & (1 << i) != 0 {
                continue;
            }
            if let Some(rule) = set.first_match(node.kind, &match_path) {
                rankings[i].push(Insight::from_node(node, set.category(), &rule.name));
                child_skip |= 1 << i;
                stop |= rule.stop_recursion;
            }
        }

        if !stop {
            stack.extend(node.children.iter().rev().map(|c| (c, child_skip)));
        }
    }

    let mut bundle = InsightBundle::default();
    for (set, ranking) in rule_sets.iter().zip(rankings) {
        let found = ranking.into_sorted();
        if found.is_empty() {
            continue;
        }
        bundle.insights.extend(found.iter().cloned());
        bundle.by_category.insert(set.category(), found);
    }

    debug!(
        visited,
        insights = bundle.insights.len(),
        categories = bundle.by_category.len(),
        "insights generated"
    );
    Ok(bundle)
}

/// Findings whose category is in `categories`, in bundle order.
pub fn filter_insights<'a>(
    bundle: &'a InsightBundle,
    categories: &HashSet<InsightCategory>,
) -> Vec<&'a Insight> {
    if categories.is_empty() {
        return Vec::new();
    }
    bundle
        .insights
        .iter()
        .filter(|i| categories.contains(&i.category))
        .collect()
}
