//! Progressive disclosure: which part of the topology is on screen.
//!
//! A node is visible iff it is a root, or its canonical parent is visible and
//! expanded. Visibility is resolved top-down over the [`Hierarchy`], so
//! collapsing a node hides its whole subtree even when descendants are still
//! marked expanded; re-expanding the node restores the previous view.
//!
//! [`ExpansionState`] is an immutable value. Every transition returns a new
//! state and none of them cascades implicitly; use
//! [`ExpansionState::collapse_subtree`] for an explicit cascade.
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::graph::TopologyModel;
use crate::graph::classify::{EdgeClassification, EdgeKind};
use crate::graph::hierarchy::Hierarchy;
use crate::newtypes::NodeId;
use crate::structures::{Edge, Node};

/// Set of expanded node ids.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpansionState {
    expanded: BTreeSet<NodeId>,
}

impl ExpansionState {
    /// Everything collapsed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every node that has children, expanded.
    pub fn expand_all(hierarchy: &Hierarchy) -> Self {
        hierarchy.expandable_ids().cloned().collect()
    }

    /// Returns `true` if `id` is marked expanded.
    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    /// Number of expanded ids.
    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    /// Returns `true` if nothing is expanded.
    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }

    /// Expanded ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &NodeId> {
        self.expanded.iter()
    }

    /// Adds `id` if absent, removes it if present.
    pub fn toggle_expand(&self, id: &NodeId) -> Self {
        if self.is_expanded(id) {
            self.collapse(id)
        } else {
            self.expand(id)
        }
    }

    /// State with `id` expanded.
    pub fn expand(&self, id: &NodeId) -> Self {
        let mut expanded = self.expanded.clone();
        expanded.insert(id.clone());
        Self { expanded }
    }

    /// State with `id` collapsed. Descendants keep their own flags.
    pub fn collapse(&self, id: &str) -> Self {
        let mut expanded = self.expanded.clone();
        expanded.remove(id);
        Self { expanded }
    }

    /// State with `id` and every hierarchy descendant of `id` collapsed.
    pub fn collapse_subtree(&self, hierarchy: &Hierarchy, id: &str) -> Self {
        let mut expanded = self.expanded.clone();
        expanded.remove(id);
        for d in hierarchy.descendants(id) {
            expanded.remove(&d);
        }
        Self { expanded }
    }

    /// State with every ancestor of `id` expanded, so `id` becomes visible.
    ///
    /// `id` itself is left as it was. Unknown ids return an unchanged state.
    pub fn expand_to(&self, hierarchy: &Hierarchy, id: &str) -> Self {
        let mut expanded = self.expanded.clone();
        expanded.extend(hierarchy.ancestors_inclusive(id).into_iter().skip(1));
        Self { expanded }
    }
}

impl FromIterator<NodeId> for ExpansionState {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        Self {
            expanded: iter.into_iter().collect(),
        }
    }
}

/// Free-function form of [`ExpansionState::toggle_expand`].
pub fn toggle_expand(expanded: &ExpansionState, id: &NodeId) -> ExpansionState {
    expanded.toggle_expand(id)
}

/// The nodes and edges to render for one expansion state.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleGraph {
    /// Visible nodes, in model order.
    pub nodes: Vec<Node>,
    /// Visible forward edges, in model order.
    pub dag_edges: Vec<Edge>,
    /// Visible back edges, in model order.
    pub back_edges: Vec<Edge>,
    /// For each visible collapsed node with children, how many are hidden.
    pub hidden_child_counts: BTreeMap<NodeId, usize>,
}

impl VisibleGraph {
    /// Returns `true` if `id` is visible.
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id.as_str() == id)
    }

    /// Number of visible nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of visible edges of both kinds.
    pub fn edge_count(&self) -> usize {
        self.dag_edges.len() + self.back_edges.len()
    }

    /// Returns `true` if nothing is visible.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Resolves the visible subgraph for `expanded`.
///
/// `classification` and `hierarchy` must be derived from `model`. Ids in
/// `expanded` that are not in the model are ignored.
pub fn visible_graph(
    model: &TopologyModel,
    classification: &EdgeClassification,
    hierarchy: &Hierarchy,
    expanded: &ExpansionState,
) -> VisibleGraph {
    let mut visible: HashSet<&str> = HashSet::with_capacity(model.node_count());
    let mut queue: VecDeque<&NodeId> = hierarchy.root_ids.iter().collect();
    while let Some(id) = queue.pop_front() {
        if !visible.insert(id.as_str()) {
            continue;
        }
        if expanded.is_expanded(id) {
            queue.extend(hierarchy.children(id));
        }
    }

    let nodes: Vec<Node> = model
        .nodes()
        .iter()
        .filter(|n| visible.contains(n.id.as_str()))
        .cloned()
        .collect();

    let mut dag_edges = Vec::new();
    let mut back_edges = Vec::new();
    for (position, edge) in model.edges().iter().enumerate() {
        if !(visible.contains(edge.source.as_str()) && visible.contains(edge.target.as_str())) {
            continue;
        }
        match classification.kind_at(position) {
            Some(EdgeKind::Back) => back_edges.push(edge.clone()),
            Some(EdgeKind::Forward) | None => dag_edges.push(edge.clone()),
        }
    }

    let hidden_child_counts = nodes
        .iter()
        .filter(|n| !expanded.is_expanded(&n.id) && hierarchy.has_children(&n.id))
        .map(|n| (n.id.clone(), hierarchy.children_count(&n.id)))
        .collect();

    tracing::debug!(
        nodes = nodes.len(),
        dag_edges = dag_edges.len(),
        back_edges = back_edges.len(),
        "resolved visible graph"
    );

    VisibleGraph {
        nodes,
        dag_edges,
        back_edges,
        hidden_child_counts,
    }
}
