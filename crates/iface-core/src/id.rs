//! Stable ID newtype for registered classes.
//!
//! `ClassId` is a distinct newtype wrapper over `u32`, providing type safety
//! and a bridge to petgraph's `NodeIndex<u32>` for the class hierarchy graph.

use std::fmt;

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

/// Stable class identifier. Maps to a petgraph `NodeIndex<u32>` in the
/// class hierarchy graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(pub u32);

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Bridge between ClassId and petgraph's NodeIndex<u32>.

impl From<NodeIndex<u32>> for ClassId {
    fn from(idx: NodeIndex<u32>) -> Self {
        ClassId(idx.index() as u32)
    }
}

impl From<ClassId> for NodeIndex<u32> {
    fn from(id: ClassId) -> Self {
        NodeIndex::new(id.0 as usize)
    }
}
