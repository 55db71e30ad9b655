/// Edge classification for layout-safe rendering of cyclic call graphs.
///
/// Agent executions loop: a planner re-invokes a sub-agent after a tool
/// failure, a sub-agent calls back into its parent. Hierarchical layout
/// engines need a DAG, so [`classify_edges`] partitions every edge into a
/// **forward** edge (kept in the layout) or a **back** edge (drawn separately
/// as a retry/loop arc).
///
/// # Algorithm Overview
///
/// Standard three-colour depth-first search. Nodes start white, turn gray when
/// the DFS enters them and black when every outgoing edge has been explored.
/// An edge `(u, v)` explored while `v` is gray points at an ancestor of `u` on
/// the current DFS path (or at `u` itself), so it closes a cycle and is a back
/// edge. Every other edge is forward.
///
/// DFS starts from [`TopologyModel::seed_roots`] in order, then from every
/// still-white node in ascending id order so disconnected components are
/// covered. Children are explored in input edge order, which makes the result
/// deterministic for a given input.
///
/// The forward subgraph is acyclic for any input: a cycle made only of
/// forward edges would need an edge into a gray node somewhere along it.
use std::collections::{BTreeSet, HashMap, HashSet};

use petgraph::stable_graph::NodeIndex;
use serde::Serialize;

use crate::graph::TopologyModel;
use crate::newtypes::NodeId;
use crate::structures::Edge;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Classification of a single edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Consistent with the DFS ordering; safe for hierarchical layout.
    Forward,
    /// Target is a DFS ancestor of the source (or the source itself).
    Back,
}

/// DFS node colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Result of [`classify_edges`].
///
/// `forward_edges` and `back_edges` partition the model's edges by id; both
/// lists keep the model's edge order. Multiple back edges into the same
/// ancestor are kept individually so each retry path stays inspectable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeClassification {
    /// Ids of forward edges.
    pub forward_edges: Vec<String>,
    /// Ids of back edges.
    pub back_edges: Vec<String>,
    /// `"source->target"` keys of back edges.
    ///
    /// Ids containing `->` can make two pairs share a key, so membership
    /// checks go through [`EdgeClassification::is_back_edge`] instead.
    pub back_edge_pairs: BTreeSet<String>,
    #[serde(skip)]
    kinds: Vec<EdgeKind>,
    #[serde(skip)]
    back_targets: HashMap<NodeId, HashSet<NodeId>>,
    #[serde(skip)]
    back_edge_endpoints: Vec<(NodeId, NodeId)>,
    #[serde(skip)]
    dfs_parent: HashMap<NodeId, NodeId>,
}

impl EdgeClassification {
    /// Returns `true` if the `(source, target)` edge is a back edge.
    ///
    /// Unknown pairs return `false`.
    pub fn is_back_edge(&self, source: &str, target: &str) -> bool {
        self.back_targets
            .get(source)
            .is_some_and(|targets| targets.contains(target))
    }

    /// Kind of the edge at `position` in [`TopologyModel::edges`].
    pub fn kind_at(&self, position: usize) -> Option<EdgeKind> {
        self.kinds.get(position).copied()
    }

    /// Classification that assigns `kinds` by edge position without running
    /// the DFS, for exercising consumers on splits the DFS never produces.
    /// Id lists and loop data are left empty.
    #[cfg(test)]
    pub(crate) fn from_kinds(kinds: Vec<EdgeKind>) -> Self {
        Self {
            forward_edges: Vec::new(),
            back_edges: Vec::new(),
            back_edge_pairs: BTreeSet::new(),
            kinds,
            back_targets: HashMap::new(),
            back_edge_endpoints: Vec::new(),
            dfs_parent: HashMap::new(),
        }
    }

    /// Number of forward edges.
    pub fn forward_edge_count(&self) -> usize {
        self.forward_edges.len()
    }

    /// Number of back edges.
    pub fn back_edge_count(&self) -> usize {
        self.back_edges.len()
    }

    /// Returns `true` if the classified graph contained at least one cycle.
    pub fn has_cycles(&self) -> bool {
        !self.back_edges.is_empty()
    }

    /// Forward edges of `model`, in model order.
    ///
    /// `model` must be the model this classification was computed from.
    pub fn forward_edges_of<'m>(&self, model: &'m TopologyModel) -> Vec<&'m Edge> {
        self.edges_of_kind(model, EdgeKind::Forward)
    }

    /// Back edges of `model`, in model order.
    pub fn back_edges_of<'m>(&self, model: &'m TopologyModel) -> Vec<&'m Edge> {
        self.edges_of_kind(model, EdgeKind::Back)
    }

    fn edges_of_kind<'m>(&self, model: &'m TopologyModel, kind: EdgeKind) -> Vec<&'m Edge> {
        model
            .edges()
            .iter()
            .zip(&self.kinds)
            .filter(|&(_, k)| *k == kind)
            .map(|(e, _)| e)
            .collect()
    }

    /// The loop each back edge closes, one per back edge in model order.
    ///
    /// For a back edge `(u, v)` the loop is `v → … → u → v` along DFS tree
    /// edges, with the first and last node equal. A self-loop yields `[u, u]`.
    pub fn loops(&self) -> Vec<Vec<NodeId>> {
        self.back_edge_endpoints
            .iter()
            .map(|(source, target)| {
                let mut chain: Vec<NodeId> = vec![source.clone()];
                let mut current = source;
                while current != target {
                    match self.dfs_parent.get(current) {
                        Some(parent) => {
                            chain.push(parent.clone());
                            current = parent;
                        }
                        None => break,
                    }
                }
                chain.reverse();
                chain.push(target.clone());
                chain
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Partitions the edges of `model` into forward and back edges.
///
/// Pure: the same model always yields the same classification. See the module
/// documentation for the traversal order.
pub fn classify_edges(model: &TopologyModel) -> EdgeClassification {
    let mut color: HashMap<NodeIndex, Color> = HashMap::with_capacity(model.node_count());
    let mut kinds: Vec<EdgeKind> = vec![EdgeKind::Forward; model.edge_count()];
    let mut dfs_parent: HashMap<NodeId, NodeId> = HashMap::new();

    let mut restart_ids: Vec<&NodeId> = model.nodes().iter().map(|n| &n.id).collect();
    restart_ids.sort();

    let starts: Vec<NodeIndex> = model
        .seed_roots()
        .iter()
        .filter_map(|id| model.node_index(id))
        .chain(restart_ids.into_iter().filter_map(|id| model.node_index(id)))
        .collect();

    for start in starts {
        if color.get(&start).copied().unwrap_or(Color::White) != Color::White {
            continue;
        }
        visit(model, start, &mut color, &mut kinds, &mut dfs_parent);
    }

    let mut forward_edges = Vec::new();
    let mut back_edges = Vec::new();
    let mut back_edge_pairs = BTreeSet::new();
    let mut back_edge_endpoints = Vec::new();
    let mut back_targets: HashMap<NodeId, HashSet<NodeId>> = HashMap::new();
    for (edge, kind) in model.edges().iter().zip(&kinds) {
        match kind {
            EdgeKind::Forward => forward_edges.push(edge.id.clone()),
            EdgeKind::Back => {
                back_edges.push(edge.id.clone());
                back_edge_pairs.insert(edge.pair_key());
                back_targets
                    .entry(edge.source.clone())
                    .or_default()
                    .insert(edge.target.clone());
                back_edge_endpoints.push((edge.source.clone(), edge.target.clone()));
            }
        }
    }

    tracing::debug!(
        forward = forward_edges.len(),
        back = back_edges.len(),
        "classified edges"
    );

    EdgeClassification {
        forward_edges,
        back_edges,
        back_edge_pairs,
        kinds,
        back_targets,
        back_edge_endpoints,
        dfs_parent,
    }
}

// ---------------------------------------------------------------------------
// Internal: iterative DFS
// ---------------------------------------------------------------------------

/// Runs one DFS tree from `start`, colouring nodes and marking back edges.
///
/// Uses an explicit stack so deep call chains cannot overflow the thread
/// stack. Each frame holds the node, its outgoing `(edge position, target)`
/// pairs in input order, and the index of the next pair to explore.
fn visit(
    model: &TopologyModel,
    start: NodeIndex,
    color: &mut HashMap<NodeIndex, Color>,
    kinds: &mut [EdgeKind],
    dfs_parent: &mut HashMap<NodeId, NodeId>,
) {
    let mut stack: Vec<(NodeIndex, Vec<(usize, NodeIndex)>, usize)> = Vec::new();

    color.insert(start, Color::Gray);
    stack.push((start, model.out_edges(start), 0));

    while let Some(frame) = stack.last_mut() {
        let (node, children, next) = frame;
        let node = *node;

        if *next >= children.len() {
            color.insert(node, Color::Black);
            stack.pop();
            continue;
        }

        let (position, child) = children[*next];
        *next += 1;

        match color.get(&child).copied().unwrap_or(Color::White) {
            Color::Gray => {
                if let Some(kind) = kinds.get_mut(position) {
                    *kind = EdgeKind::Back;
                }
            }
            Color::Black => {}
            Color::White => {
                if let (Some(parent), Some(child_weight)) =
                    (model.node_weight(node), model.node_weight(child))
                {
                    dfs_parent.insert(child_weight.local_id.clone(), parent.local_id.clone());
                }
                color.insert(child, Color::Gray);
                stack.push((child, model.out_edges(child), 0));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
