//! Frequency tree: occurrence counts per normalized element path.
//!
//! One [`FrequencyTree`] is built per inspected resource type and is mutated
//! only by the aggregator that owns it; after the walk completes it is handed
//! off read-only to the renderer. Children are kept in first-seen order so
//! the rendered hierarchy is stable across runs over the same data.

use crate::path::{NormalizedPath, Segment};
use indexmap::IndexMap;

/// Maximum number of distinct values tracked per node. Further distinct
/// values still count, but into the node's `other` bucket, keeping memory
/// bounded on high-cardinality fields while preserving the sum invariant.
pub const MAX_DISTINCT_VALUES: usize = 50;

/// Bounded value-frequency table for one tree node.
#[derive(Debug, Clone, Default)]
pub struct ValueCounts {
    counts: IndexMap<String, u64>,
    other: u64,
}

impl ValueCounts {
    fn record(&mut self, value: String, cap: usize) {
        if let Some(n) = self.counts.get_mut(&value) {
            *n += 1;
        } else if self.counts.len() < cap {
            self.counts.insert(value, 1);
        } else {
            self.other += 1;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty() && self.other == 0
    }

    /// Occurrences that did not fit under a distinct key.
    pub fn other(&self) -> u64 {
        self.other
    }

    /// Sum of all recorded value visits, overflow included.
    pub fn total(&self) -> u64 {
        self.counts.values().sum::<u64>() + self.other
    }

    /// Entries sorted by count, descending. Ties keep first-seen order.
    pub fn sorted(&self) -> Vec<(&str, u64)> {
        let mut entries: Vec<(&str, u64)> =
            self.counts.iter().map(|(v, n)| (v.as_str(), *n)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
    }

    pub fn get(&self, value: &str) -> Option<u64> {
        self.counts.get(value).copied()
    }
}

/// One node of the frequency tree, identified by its path from the root.
#[derive(Debug, Default)]
pub struct TreeNode {
    count: u64,
    children: IndexMap<Segment, TreeNode>,
    values: ValueCounts,
}

impl TreeNode {
    /// How many times this path was visited across all walked instances.
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn child(&self, segment: &Segment) -> Option<&TreeNode> {
        self.children.get(segment)
    }

    pub fn children(&self) -> indexmap::map::Iter<'_, Segment, TreeNode> {
        self.children.iter()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn values(&self) -> &ValueCounts {
        &self.values
    }
}

/// A root node plus the number of instances folded into it.
#[derive(Debug)]
pub struct FrequencyTree {
    root: TreeNode,
    instances: u64,
    value_cap: usize,
}

impl Default for FrequencyTree {
    fn default() -> Self {
        Self::new()
    }
}

impl FrequencyTree {
    pub fn new() -> Self {
        Self::with_value_cap(MAX_DISTINCT_VALUES)
    }

    pub fn with_value_cap(value_cap: usize) -> Self {
        FrequencyTree {
            root: TreeNode::default(),
            instances: 0,
            value_cap,
        }
    }

    /// Increment the occurrence count at `path`, creating any missing
    /// ancestors with count 0. The walker records parents before children,
    /// so an ancestor created here is one the walker will never visit
    /// directly (an array's element level, or a skipped-null parent).
    pub fn record(&mut self, path: &NormalizedPath) {
        self.node_mut(path).count += 1;
    }

    /// As [`record`](Self::record), and additionally count `value` in the
    /// node's value table.
    pub fn record_value(&mut self, path: &NormalizedPath, value: String) {
        let cap = self.value_cap;
        let node = self.node_mut(path);
        node.count += 1;
        node.values.record(value, cap);
    }

    /// Called once per instance successfully folded in.
    pub fn note_instance(&mut self) {
        self.instances += 1;
    }

    pub fn instances(&self) -> u64 {
        self.instances
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Look up the node at `path`, if it was ever created.
    pub fn node(&self, path: &NormalizedPath) -> Option<&TreeNode> {
        let mut node = &self.root;
        for segment in path.segments() {
            node = node.child(segment)?;
        }
        Some(node)
    }

    fn node_mut(&mut self, path: &NormalizedPath) -> &mut TreeNode {
        let mut node = &mut self.root;
        for segment in path.segments() {
            node = node.children.entry(segment.clone()).or_default();
        }
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::RawStep;

    fn path(steps: &[&str]) -> NormalizedPath {
        NormalizedPath::normalize(
            &steps
                .iter()
                .map(|s| {
                    if *s == "[]" {
                        RawStep::Index(0)
                    } else {
                        RawStep::Field(s.to_string())
                    }
                })
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn test_record_creates_zero_count_ancestors() {
        let mut tree = FrequencyTree::new();
        tree.record(&path(&["a", "b", "c"]));

        assert_eq!(tree.node(&path(&["a"])).unwrap().count(), 0);
        assert_eq!(tree.node(&path(&["a", "b"])).unwrap().count(), 0);
        assert_eq!(tree.node(&path(&["a", "b", "c"])).unwrap().count(), 1);
    }

    #[test]
    fn test_record_increments_existing_node() {
        let mut tree = FrequencyTree::new();
        tree.record(&path(&["name"]));
        tree.record(&path(&["name"]));
        assert_eq!(tree.node(&path(&["name"])).unwrap().count(), 2);
    }

    #[test]
    fn test_children_keep_first_seen_order() {
        let mut tree = FrequencyTree::new();
        tree.record(&path(&["zebra"]));
        tree.record(&path(&["apple"]));
        tree.record(&path(&["mango"]));

        let order: Vec<String> = tree.root().children().map(|(s, _)| s.to_string()).collect();
        assert_eq!(order, ["zebra", "apple", "mango"]);
    }

    #[test]
    fn test_value_sum_invariant_under_cap_overflow() {
        let mut tree = FrequencyTree::with_value_cap(2);
        let p = path(&["status"]);
        tree.record_value(&p, "a".to_string());
        tree.record_value(&p, "b".to_string());
        tree.record_value(&p, "c".to_string());
        tree.record_value(&p, "d".to_string());
        tree.record_value(&p, "a".to_string());

        let node = tree.node(&p).unwrap();
        assert_eq!(node.count(), 5);
        assert_eq!(node.values().get("a"), Some(2));
        assert_eq!(node.values().get("b"), Some(1));
        // "c" and "d" exceeded the cap, still accounted for
        assert_eq!(node.values().get("c"), None);
        assert_eq!(node.values().other(), 2);
        assert_eq!(node.values().total(), 5);
    }

    #[test]
    fn test_sorted_values_descend_by_count() {
        let mut tree = FrequencyTree::new();
        let p = path(&["code"]);
        for v in ["x", "y", "y", "z", "y", "z"] {
            tree.record_value(&p, v.to_string());
        }
        let sorted = tree.node(&p).unwrap().values().sorted();
        assert_eq!(sorted, [("y", 3), ("z", 2), ("x", 1)]);
    }

    #[test]
    fn test_element_segments_share_a_node() {
        let mut tree = FrequencyTree::new();
        let first = NormalizedPath::normalize(&[
            RawStep::Field("name".to_string()),
            RawStep::Index(0),
        ]);
        let second = NormalizedPath::normalize(&[
            RawStep::Field("name".to_string()),
            RawStep::Index(5),
        ]);
        tree.record(&first);
        tree.record(&second);
        assert_eq!(tree.node(&first).unwrap().count(), 2);
    }
}
