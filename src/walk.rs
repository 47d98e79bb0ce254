//! Record walker: folds one resource instance into a frequency tree.
//!
//! Depth-first, pre-order. Mapping fields are visited in document order
//! (serde_json's `preserve_order` keeps them that way), array elements in
//! index order, with all elements of one array collapsing onto the same
//! `[]` node. A node's path is always recorded before any of its children.

use crate::path::{NormalizedPath, Segment};
use crate::tree::FrequencyTree;
use serde_json::Value;
use thiserror::Error;

/// Maximum length of a value's display string; longer values are truncated
/// with a `...` suffix before entering the value table.
pub const MAX_VALUE_LEN: usize = 50;

/// An instance the walker refuses to fold. The caller skips it and
/// continues; statistics stay usable on a partially dirty dataset.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MalformedRecord {
    #[error("instance is not a JSON object")]
    NotAnObject,
    #[error("instance has no resourceType field")]
    MissingResourceType,
}

/// Walker configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkOptions {
    /// Populate per-node value-frequency tables (scalars only; composite
    /// values are never stringified into the table).
    pub inspect_values: bool,
    /// Record explicit JSON nulls as path occurrences. Nulls are never
    /// recorded as values either way.
    pub include_absent: bool,
    /// Require a `resourceType` string on every instance.
    pub require_resource_type: bool,
}

/// Stateless traversal driver; one walker serves a whole aggregation run.
#[derive(Debug, Clone, Copy)]
pub struct RecordWalker {
    opts: WalkOptions,
}

impl RecordWalker {
    pub fn new(opts: WalkOptions) -> Self {
        RecordWalker { opts }
    }

    /// Fold one instance into `tree`. On success the tree's instance count
    /// is bumped; a malformed instance leaves the tree untouched.
    pub fn walk(&self, instance: &Value, tree: &mut FrequencyTree) -> Result<(), MalformedRecord> {
        let obj = instance.as_object().ok_or(MalformedRecord::NotAnObject)?;
        if self.opts.require_resource_type
            && !obj.get("resourceType").is_some_and(Value::is_string)
        {
            return Err(MalformedRecord::MissingResourceType);
        }

        tree.note_instance();
        let mut path = NormalizedPath::root();
        self.walk_object(obj, &mut path, tree);
        Ok(())
    }

    fn walk_object(
        &self,
        obj: &serde_json::Map<String, Value>,
        path: &mut NormalizedPath,
        tree: &mut FrequencyTree,
    ) {
        for (key, value) in obj {
            path.push(Segment::Field(key.clone()));
            self.walk_value(value, path, tree);
            path.pop();
        }
    }

    fn walk_value(&self, value: &Value, path: &mut NormalizedPath, tree: &mut FrequencyTree) {
        match value {
            Value::Null => {
                if self.opts.include_absent {
                    tree.record(path);
                }
            }
            Value::Object(obj) => {
                tree.record(path);
                self.walk_object(obj, path, tree);
            }
            Value::Array(items) => {
                // One visit for the array-bearing path itself, then one per
                // element on the shared `[]` child.
                tree.record(path);
                for item in items {
                    path.push(Segment::Element);
                    self.walk_value(item, path, tree);
                    path.pop();
                }
            }
            scalar => {
                if self.opts.inspect_values {
                    tree.record_value(path, display_scalar(scalar));
                } else {
                    tree.record(path);
                }
            }
        }
    }
}

/// Display form of a scalar for the value table: strings unquoted, other
/// scalars via their JSON rendering, truncated to [`MAX_VALUE_LEN`].
fn display_scalar(value: &Value) -> String {
    let s = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if s.chars().count() > MAX_VALUE_LEN + 3 {
        let mut truncated: String = s.chars().take(MAX_VALUE_LEN).collect();
        truncated.push_str("...");
        truncated
    } else {
        s
    }
}
