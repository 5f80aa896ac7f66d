//! Size aggregation, traversal and top-K selection over a scanned tree.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::node::{NodeKind, ScanNode};

/// Aggregate directory sizes bottom-up.
///
/// Every directory's `size_bytes` and `disk_usage` become the sums over its
/// children. Files keep their own values. Running it again on a finalized
/// tree recomputes identical sums.
pub fn finalize_sizes(root: &mut ScanNode) {
    aggregate(root);
}

fn aggregate(node: &mut ScanNode) -> (u64, u64) {
    if node.is_dir() {
        let mut size: u64 = 0;
        let mut usage: u64 = 0;
        for child in &mut node.children {
            let (child_size, child_usage) = aggregate(child);
            size = size.saturating_add(child_size);
            usage = usage.saturating_add(child_usage);
        }
        node.size_bytes = size;
        node.disk_usage = usage;
    }
    (node.size_bytes, node.disk_usage)
}

/// Lazy pre-order iterator over a tree, root included.
#[derive(Debug, Clone)]
pub struct NodeIter<'a> {
    stack: Vec<&'a ScanNode>,
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = &'a ScanNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Iterate every node in pre-order. Call again to restart.
pub fn iter_nodes(root: &ScanNode) -> NodeIter<'_> {
    NodeIter { stack: vec![root] }
}

/// Ordering used for "largest" queries: higher disk usage first, then
/// path ascending so equal usages come out in a stable order.
struct Ranked<'a>(&'a ScanNode);

impl Ord for Ranked<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .disk_usage
            .cmp(&other.0.disk_usage)
            .then_with(|| other.0.path.cmp(&self.0.path))
    }
}

impl PartialOrd for Ranked<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Ranked<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked<'_> {}

/// The `n` nodes with the largest disk usage, largest first.
///
/// The root itself is never returned. `kind` restricts the result to files
/// or directories; `None` accepts both.
pub fn top_nodes(root: &ScanNode, n: usize, kind: Option<NodeKind>) -> Vec<&ScanNode> {
    if n == 0 {
        return Vec::new();
    }

    let mut heap: BinaryHeap<Reverse<Ranked<'_>>> = BinaryHeap::new();
    for node in iter_nodes(root).skip(1) {
        if kind.is_some_and(|k| k != node.kind) {
            continue;
        }
        let candidate = Ranked(node);
        if heap.len() < n {
            heap.push(Reverse(candidate));
        } else if heap.peek().is_some_and(|Reverse(worst)| candidate > *worst) {
            heap.pop();
            heap.push(Reverse(candidate));
        }
    }

    heap.into_sorted_vec()
        .into_iter()
        .map(|Reverse(Ranked(node))| node)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir(path: &str, children: Vec<ScanNode>) -> ScanNode {
        ScanNode::new_directory(path).with_children(children)
    }

    fn file(path: &str, usage: u64) -> ScanNode {
        ScanNode::new_file(path, usage, usage)
    }

    #[test]
    fn test_finalize_sums_leaves() {
        let mut root = dir(
            "/r",
            vec![
                file("/r/a", 10),
                dir("/r/sub", vec![file("/r/sub/b", 20), dir("/r/sub/empty", vec![])]),
            ],
        );
        finalize_sizes(&mut root);
        assert_eq!(root.size_bytes, 30);
        assert_eq!(root.children[1].disk_usage, 20);
        assert_eq!(root.children[1].children[1].size_bytes, 0);
    }

    #[test]
    fn test_finalize_idempotent() {
        let mut root = dir("/r", vec![file("/r/a", 7), dir("/r/d", vec![file("/r/d/b", 5)])]);
        finalize_sizes(&mut root);
        let first = root.clone();
        finalize_sizes(&mut root);
        assert_eq!(root, first);
    }

    #[test]
    fn test_finalize_replaces_stale_sums() {
        let mut root = dir("/r", vec![file("/r/a", 7)]);
        root.size_bytes = 999;
        root.disk_usage = 999;
        finalize_sizes(&mut root);
        assert_eq!(root.size_bytes, 7);
        assert_eq!(root.disk_usage, 7);
    }

    #[test]
    fn test_iter_single_root() {
        let root = dir("/root", vec![]);
        let nodes: Vec<_> = iter_nodes(&root).collect();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].path, root.path);
    }

    #[test]
    fn test_iter_pre_order() {
        let root = dir(
            "/root",
            vec![file("/root/a.txt", 10), dir("/root/sub", vec![file("/root/sub/b.txt", 20)])],
        );
        let paths: Vec<_> = iter_nodes(&root)
            .map(|n| n.path.to_string_lossy().into_owned())
            .collect();
        assert_eq!(paths, vec!["/root", "/root/a.txt", "/root/sub", "/root/sub/b.txt"]);

        // Restartable: a fresh call yields the same sequence.
        assert_eq!(iter_nodes(&root).count(), 4);
    }

    #[test]
    fn test_top_nodes_all_kinds() {
        let mut root = dir("/r", vec![file("/r/a", 10), dir("/r/sub", vec![file("/r/b", 20)])]);
        finalize_sizes(&mut root);
        let result = top_nodes(&root, 10, None);
        assert_eq!(result.len(), 3);
        // /r/sub and /r/b tie at 20; path order breaks the tie.
        assert_eq!(result[0].path.to_str(), Some("/r/b"));
        assert_eq!(result[1].path.to_str(), Some("/r/sub"));
        assert_eq!(result[2].path.to_str(), Some("/r/a"));
    }

    #[test]
    fn test_top_nodes_kind_filter() {
        let mut root = dir(
            "/r",
            vec![file("/r/a", 10), file("/r/b", 20), dir("/r/sub", vec![file("/r/sub/c", 5)])],
        );
        finalize_sizes(&mut root);

        let files = top_nodes(&root, 10, Some(NodeKind::File));
        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|n| n.is_file()));
        assert!(files.windows(2).all(|w| w[0].disk_usage >= w[1].disk_usage));

        let dirs = top_nodes(&root, 10, Some(NodeKind::Directory));
        assert_eq!(dirs.len(), 1);
        assert_eq!(dirs[0].path.to_str(), Some("/r/sub"));
    }

    #[test]
    fn test_top_nodes_truncates() {
        let children: Vec<_> = (0..50).map(|i| file(&format!("/r/f{i:02}"), i * 3)).collect();
        let mut root = dir("/r", children);
        finalize_sizes(&mut root);

        let result = top_nodes(&root, 4, None);
        let usages: Vec<u64> = result.iter().map(|n| n.disk_usage).collect();
        assert_eq!(usages, vec![147, 144, 141, 138]);
    }

    #[test]
    fn test_top_nodes_excludes_root() {
        let root = dir("/r", vec![]);
        assert!(top_nodes(&root, 10, None).is_empty());
        assert!(top_nodes(&root, 0, None).is_empty());
    }
}
