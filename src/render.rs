//! Depth-limited, lazy rendering of a frequency tree.
//!
//! [`lines`] yields [`RenderedLine`]s in pre-order without materialising the
//! whole view. A node sitting at the depth limit does not get its children
//! traversed; instead one elision line reports how many direct children were
//! cut off, so truncation is never silent.

use crate::path::Segment;
use crate::tree::{FrequencyTree, TreeNode};

/// Default maximum display depth (levels below the resource root).
pub const DEFAULT_MAX_LEVEL: u32 = 10;

/// One output unit of the rendered hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedLine {
    Node {
        /// 0 for top-level fields of the resource.
        depth: usize,
        label: String,
        count: u64,
        /// Formatted value summary, present only when the walk collected
        /// values for this node.
        values: Option<String>,
    },
    /// Emitted for a node at the depth limit whose children were not
    /// traversed; `omitted` is that node's direct child count.
    Elided { depth: usize, omitted: usize },
}

/// Lazy pre-order traversal; finite and single-pass. Re-rendering the same
/// tree starts a fresh pass and yields an identical sequence.
pub struct TreeLines<'a> {
    stack: Vec<indexmap::map::Iter<'a, Segment, TreeNode>>,
    max_depth: usize,
    pending: Option<RenderedLine>,
}

/// Iterate the rendered lines of `tree`, truncating below `max_depth`
/// (deepest rendered node depth == `max_depth`).
pub fn lines(tree: &FrequencyTree, max_depth: usize) -> TreeLines<'_> {
    TreeLines {
        stack: vec![tree.root().children()],
        max_depth,
        pending: None,
    }
}

impl<'a> Iterator for TreeLines<'a> {
    type Item = RenderedLine;

    fn next(&mut self) -> Option<RenderedLine> {
        if let Some(line) = self.pending.take() {
            return Some(line);
        }
        loop {
            let iter = self.stack.last_mut()?;
            match iter.next() {
                None => {
                    self.stack.pop();
                }
                Some((segment, node)) => {
                    let depth = self.stack.len() - 1;
                    let line = RenderedLine::Node {
                        depth,
                        label: segment.to_string(),
                        count: node.count(),
                        values: format_values(node),
                    };
                    if depth < self.max_depth {
                        if node.child_count() > 0 {
                            self.stack.push(node.children());
                        }
                    } else if node.child_count() > 0 {
                        self.pending = Some(RenderedLine::Elided {
                            depth,
                            omitted: node.child_count(),
                        });
                    }
                    return Some(line);
                }
            }
        }
    }
}

/// `value(count)` pairs sorted by count descending, with the overflow bucket
/// appended as `(+N more)`.
fn format_values(node: &TreeNode) -> Option<String> {
    let values = node.values();
    if values.is_empty() {
        return None;
    }
    let mut parts: Vec<String> = values
        .sorted()
        .into_iter()
        .map(|(value, count)| format!("{value}({count})"))
        .collect();
    if values.other() > 0 {
        parts.push(format!("(+{} more)", values.other()));
    }
    Some(parts.join(" "))
}
