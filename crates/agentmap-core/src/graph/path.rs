use std::collections::BTreeSet;

use serde::Serialize;

use crate::graph::hierarchy::Hierarchy;
use crate::newtypes::NodeId;

/// Ancestor chain of a selected node in the disclosure hierarchy.
///
/// Follows canonical parents only: a node reachable through several callers is
/// highlighted along its single hierarchy path, not every path that reaches
/// it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightPath {
    /// Root first, selected node last.
    pub chain: Vec<NodeId>,
    /// The same ids as a set.
    pub nodes: BTreeSet<NodeId>,
}

impl HighlightPath {
    /// Returns `true` if `id` lies on the path.
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains(id)
    }

    /// Returns `true` if both endpoints of `(source, target)` lie on the path.
    pub fn is_edge_highlighted(&self, source: &str, target: &str) -> bool {
        self.contains(source) && self.contains(target)
    }

    /// Returns `true` if nothing is highlighted.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Number of highlighted nodes.
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// First node of the chain.
    pub fn root(&self) -> Option<&NodeId> {
        self.chain.first()
    }

    /// Last node of the chain.
    pub fn selected(&self) -> Option<&NodeId> {
        self.chain.last()
    }
}

/// Highlights `selected` and its canonical ancestors.
///
/// `None` and ids not in `hierarchy` yield an empty path; a root yields just
/// itself.
pub fn compute_path(hierarchy: &Hierarchy, selected: Option<&str>) -> HighlightPath {
    let Some(id) = selected else {
        return HighlightPath::default();
    };
    let mut chain = hierarchy.ancestors_inclusive(id);
    chain.reverse();
    let nodes = chain.iter().cloned().collect();
    HighlightPath { chain, nodes }
}
