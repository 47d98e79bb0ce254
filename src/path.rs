//! Canonical, index-free element paths.
//!
//! A concrete location inside one resource instance carries array indices
//! (`name[0].given[1]`). For aggregation across many instances those indices
//! are noise: every element of an array should land on the same tree node.
//! [`NormalizedPath::normalize`] collapses each index step to a single
//! [`Segment::Element`] marker, so two locations compare equal iff they have
//! the same field names interleaved with array markers in the same order.

use std::fmt;

/// One raw step of a concrete traversal location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RawStep {
    /// A named field of a mapping.
    Field(String),
    /// A concrete position inside an array.
    Index(usize),
}

/// One segment of a normalized path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// A named field of a mapping.
    Field(String),
    /// Any element of an array (the index is deliberately not retained).
    Element,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Field(name) => f.write_str(name),
            Segment::Element => f.write_str("[]"),
        }
    }
}

/// An ordered sequence of [`Segment`]s identifying one tree node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NormalizedPath(Vec<Segment>);

impl NormalizedPath {
    /// The empty path (the tree root).
    pub fn root() -> Self {
        NormalizedPath(Vec::new())
    }

    /// Normalize a concrete location: field steps pass through, every index
    /// step becomes [`Segment::Element`]. Pure; cannot fail.
    pub fn normalize(steps: &[RawStep]) -> Self {
        NormalizedPath(
            steps
                .iter()
                .map(|step| match step {
                    RawStep::Field(name) => Segment::Field(name.clone()),
                    RawStep::Index(_) => Segment::Element,
                })
                .collect(),
        )
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Append one segment. The walker pushes on descent and pops on return,
    /// reusing a single path allocation for the whole traversal.
    pub fn push(&mut self, segment: Segment) {
        self.0.push(segment);
    }

    pub fn pop(&mut self) {
        self.0.pop();
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromIterator<Segment> for NormalizedPath {
    fn from_iter<T: IntoIterator<Item = Segment>>(iter: T) -> Self {
        NormalizedPath(iter.into_iter().collect())
    }
}
