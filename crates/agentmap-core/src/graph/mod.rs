/// Topology model construction using `petgraph`, plus the analysis stages
/// layered on top of it.
///
/// This module wraps a `StableDiGraph` with small typed node and edge weights,
/// built from the raw node/edge lists of a [`TopologySnapshot`]. The analysis
/// stages live in submodules and run in this order:
///
/// 1. [`classify`]: three-colour DFS splitting edges into forward and back edges.
/// 2. [`hierarchy`]: canonical single parent per node over forward edges.
/// 3. [`visibility`]: visible subgraph for an expansion state.
/// 4. [`path`]: ancestor chain of a selected node.
///
/// # Two-Pass Construction
///
/// [`build_topology`] runs two passes over its input:
/// 1. **Node pass**: inserts nodes into the `StableDiGraph` and records the
///    `id → NodeIndex` mapping. A repeated id keeps the first node and is
///    recorded in [`BuildDiagnostics::duplicate_node_ids`].
/// 2. **Edge pass**: resolves `source`/`target` ids. Edges naming an unknown
///    node are dropped and recorded in [`BuildDiagnostics::dropped_edges`].
///    Repeated `(source, target)` pairs are folded into the first occurrence
///    with [`Edge::absorb`], so the graph holds at most one edge per pair.
///
/// Construction never fails: malformed telemetry degrades the picture but must
/// not stop the renderer.
pub mod classify;
pub mod hierarchy;
pub mod path;
pub mod visibility;

pub use classify::{EdgeClassification, classify_edges};
pub use hierarchy::{Hierarchy, build_hierarchy};
pub use path::{HighlightPath, compute_path};
pub use visibility::{ExpansionState, VisibleGraph, toggle_expand, visible_graph};

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;

use crate::enums::NodeType;
use crate::newtypes::{NodeId, edge_key};
use crate::snapshot::TopologySnapshot;
use crate::structures::{Edge, Node};

/// Weight stored inline on each petgraph node.
///
/// Kept small so traversal loops stay cache-friendly; the full node is reached
/// through `data_index` into [`TopologyModel::nodes`].
#[derive(Debug, Clone)]
pub struct NodeWeight {
    /// Snapshot-local node id.
    pub local_id: NodeId,
    /// Node role.
    pub node_type: NodeType,
    /// Index into [`TopologyModel::nodes`].
    pub data_index: usize,
}

/// Weight stored inline on each petgraph edge.
///
/// `data_index` is also the edge's position in first-seen input order, which
/// is the tie-break every traversal in this crate uses.
#[derive(Debug, Clone)]
pub struct EdgeWeight {
    /// Canonical `"source->target"` id.
    pub local_id: String,
    /// Index into [`TopologyModel::edges`].
    pub data_index: usize,
}

/// An input edge that was discarded because an endpoint does not exist.
///
/// An empty `missing_node_id` marks a record whose endpoint was empty or
/// absent on the wire; see [`TopologySnapshot::rejected_edges`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedEdge {
    /// The edge's id as received (or its pair key when the id was empty).
    pub edge_id: String,
    /// The endpoint id that could not be resolved.
    pub missing_node_id: String,
}

/// Non-fatal problems found while building a [`TopologyModel`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BuildDiagnostics {
    /// Edges dropped for referencing unknown nodes. Records rejected while
    /// decoding the snapshot come first, then the rest in input order.
    pub dropped_edges: Vec<DroppedEdge>,
    /// Node ids that appeared more than once; only the first node was kept.
    pub duplicate_node_ids: Vec<NodeId>,
    /// Number of raw edge records folded into an earlier record for the same pair.
    pub merged_edges: usize,
}

impl BuildDiagnostics {
    /// Returns `true` if the input needed no repair beyond duplicate merging.
    pub fn is_clean(&self) -> bool {
        self.dropped_edges.is_empty() && self.duplicate_node_ids.is_empty()
    }
}

/// Normalised, immutable adjacency over one topology snapshot.
///
/// Wraps a `petgraph` [`StableDiGraph`] with [`NodeWeight`] and [`EdgeWeight`]
/// and keeps the owned [`Node`] and [`Edge`] records alongside it. Holds at
/// most one edge per `(source, target)` pair, and every edge's endpoints
/// exist.
///
/// Construct with [`build_topology`].
#[derive(Debug, Clone)]
pub struct TopologyModel {
    graph: StableDiGraph<NodeWeight, EdgeWeight>,
    id_to_index: HashMap<NodeId, NodeIndex>,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    nodes_by_type: HashMap<NodeType, Vec<NodeIndex>>,
    diagnostics: BuildDiagnostics,
}

impl TopologyModel {
    /// Builds a model from a decoded snapshot. See [`build_topology`].
    ///
    /// Edge records the decoder already rejected are reported in
    /// [`BuildDiagnostics::dropped_edges`] ahead of the ones dropped here.
    pub fn from_snapshot(snapshot: TopologySnapshot) -> Self {
        build(snapshot.nodes, snapshot.edges, snapshot.rejected_edges)
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of (merged) edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns `true` if the model has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes, in input order with duplicates removed.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All edges, in first-seen input order with duplicates merged.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Returns `true` if a node with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.id_to_index.contains_key(id)
    }

    /// Looks up a node by id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.id_to_index
            .get(id)
            .and_then(|&idx| self.graph.node_weight(idx))
            .and_then(|w| self.nodes.get(w.data_index))
    }

    /// Looks up the [`NodeIndex`] for a node id.
    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.id_to_index.get(id).copied()
    }

    /// Returns the [`NodeWeight`] for the given index.
    pub fn node_weight(&self, idx: NodeIndex) -> Option<&NodeWeight> {
        self.graph.node_weight(idx)
    }

    /// Returns the [`EdgeWeight`] for the given index.
    pub fn edge_weight(&self, idx: EdgeIndex) -> Option<&EdgeWeight> {
        self.graph.edge_weight(idx)
    }

    /// Returns the underlying [`StableDiGraph`].
    pub fn graph(&self) -> &StableDiGraph<NodeWeight, EdgeWeight> {
        &self.graph
    }

    /// Returns the indices of every node of the given type, in input order.
    pub fn nodes_of_type(&self, t: NodeType) -> &[NodeIndex] {
        self.nodes_by_type.get(&t).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the repairs made while building.
    pub fn diagnostics(&self) -> &BuildDiagnostics {
        &self.diagnostics
    }

    /// Outgoing edges of `id` in input order. Unknown ids yield an empty list.
    pub fn outgoing(&self, id: &str) -> Vec<&Edge> {
        self.node_index(id)
            .map(|idx| self.edge_positions(idx, Direction::Outgoing))
            .unwrap_or_default()
            .into_iter()
            .filter_map(|pos| self.edges.get(pos))
            .collect()
    }

    /// Incoming edges of `id` in input order. Unknown ids yield an empty list.
    pub fn incoming(&self, id: &str) -> Vec<&Edge> {
        self.node_index(id)
            .map(|idx| self.edge_positions(idx, Direction::Incoming))
            .unwrap_or_default()
            .into_iter()
            .filter_map(|pos| self.edges.get(pos))
            .collect()
    }

    /// Sum of `call_count` over the outgoing edges of `id`.
    pub fn outgoing_call_total(&self, id: &str) -> u64 {
        self.outgoing(id)
            .iter()
            .fold(0u64, |acc, e| acc.saturating_add(e.call_count))
    }

    /// Positions in [`TopologyModel::edges`] of the edges touching `idx` in
    /// `direction`, sorted ascending (input order).
    ///
    /// `StableDiGraph` iterates adjacency newest-first, so the sort is what
    /// makes traversals follow input order.
    pub(crate) fn edge_positions(&self, idx: NodeIndex, direction: Direction) -> Vec<usize> {
        let mut positions: Vec<usize> = self
            .graph
            .edges_directed(idx, direction)
            .map(|e| e.weight().data_index)
            .collect();
        positions.sort_unstable();
        positions
    }

    /// Outgoing edges of `idx` as `(edge position, target index)` pairs in
    /// input order.
    pub(crate) fn out_edges(&self, idx: NodeIndex) -> Vec<(usize, NodeIndex)> {
        let mut out: Vec<(usize, NodeIndex)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.weight().data_index, e.target()))
            .collect();
        out.sort_unstable_by_key(|&(pos, _)| pos);
        out
    }

    /// Starting set for the depth-first edge classification.
    ///
    /// `user` nodes and nodes with no incoming edge from another node, in input
    /// order. When that set is empty but the graph is not (every node sits on
    /// a cycle and there is no user), the single node with the highest total
    /// outgoing call count is returned instead, lowest id winning ties.
    pub fn seed_roots(&self) -> Vec<NodeId> {
        let seeds: Vec<NodeId> = self
            .graph
            .node_indices()
            .filter_map(|idx| {
                let w = self.graph.node_weight(idx)?;
                let called_by_other = self
                    .graph
                    .edges_directed(idx, Direction::Incoming)
                    .any(|e| e.source() != idx);
                (w.node_type.is_entry_point() || !called_by_other).then(|| w.local_id.clone())
            })
            .collect();

        if seeds.is_empty() {
            self.fallback_root().into_iter().collect()
        } else {
            seeds
        }
    }

    /// Node with the highest total outgoing call count; lowest id on ties.
    pub fn fallback_root(&self) -> Option<NodeId> {
        self.nodes
            .iter()
            .max_by(|a, b| {
                self.outgoing_call_total(&a.id)
                    .cmp(&self.outgoing_call_total(&b.id))
                    .then_with(|| b.id.cmp(&a.id))
            })
            .map(|n| n.id.clone())
    }
}

/// Builds a [`TopologyModel`] from raw node and edge lists.
///
/// Construction is O(N + E). See the module documentation for the two-pass
/// process. Every repair is recorded in [`TopologyModel::diagnostics`] and
/// logged at `warn` level.
pub fn build_topology(nodes: Vec<Node>, edges: Vec<Edge>) -> TopologyModel {
    build(nodes, edges, Vec::new())
}

fn build(nodes: Vec<Node>, edges: Vec<Edge>, rejected: Vec<DroppedEdge>) -> TopologyModel {
    let mut graph: StableDiGraph<NodeWeight, EdgeWeight> =
        StableDiGraph::with_capacity(nodes.len(), edges.len());
    let mut id_to_index: HashMap<NodeId, NodeIndex> = HashMap::with_capacity(nodes.len());
    let mut nodes_by_type: HashMap<NodeType, Vec<NodeIndex>> = HashMap::new();
    let mut kept_nodes: Vec<Node> = Vec::with_capacity(nodes.len());
    let mut diagnostics = BuildDiagnostics::default();

    for dropped in rejected {
        tracing::warn!(edge_id = %dropped.edge_id, "dropping edge with empty endpoint");
        diagnostics.dropped_edges.push(dropped);
    }

    for node in nodes {
        if id_to_index.contains_key(&node.id) {
            tracing::warn!(node_id = %node.id, "ignoring duplicate node id");
            diagnostics.duplicate_node_ids.push(node.id);
            continue;
        }

        let idx = graph.add_node(NodeWeight {
            local_id: node.id.clone(),
            node_type: node.node_type,
            data_index: kept_nodes.len(),
        });
        id_to_index.insert(node.id.clone(), idx);
        nodes_by_type.entry(node.node_type).or_default().push(idx);
        kept_nodes.push(node);
    }

    let mut kept_edges: Vec<Edge> = Vec::with_capacity(edges.len());
    let mut pair_to_position: HashMap<(NodeIndex, NodeIndex), usize> = HashMap::new();

    for raw in edges {
        let Some(&source_idx) = id_to_index.get(&raw.source) else {
            drop_edge(&mut diagnostics, &raw, &raw.source);
            continue;
        };
        let Some(&target_idx) = id_to_index.get(&raw.target) else {
            drop_edge(&mut diagnostics, &raw, &raw.target);
            continue;
        };

        if let Some(&pos) = pair_to_position.get(&(source_idx, target_idx)) {
            if let Some(existing) = kept_edges.get_mut(pos) {
                existing.absorb(&raw);
                diagnostics.merged_edges += 1;
            }
            continue;
        }

        let data_index = kept_edges.len();
        let mut edge = raw;
        edge.id = edge_key(&edge.source, &edge.target);
        graph.add_edge(
            source_idx,
            target_idx,
            EdgeWeight {
                local_id: edge.id.clone(),
                data_index,
            },
        );
        pair_to_position.insert((source_idx, target_idx), data_index);
        kept_edges.push(edge);
    }

    tracing::debug!(
        nodes = kept_nodes.len(),
        edges = kept_edges.len(),
        dropped_edges = diagnostics.dropped_edges.len(),
        merged_edges = diagnostics.merged_edges,
        "built topology model"
    );

    TopologyModel {
        graph,
        id_to_index,
        nodes: kept_nodes,
        edges: kept_edges,
        nodes_by_type,
        diagnostics,
    }
}

fn drop_edge(diagnostics: &mut BuildDiagnostics, raw: &Edge, missing: &NodeId) {
    let edge_id = if raw.id.is_empty() {
        raw.pair_key()
    } else {
        raw.id.clone()
    };
    tracing::warn!(%edge_id, missing_node_id = %missing, "dropping edge with unknown endpoint");
    diagnostics.dropped_edges.push(DroppedEdge {
        edge_id,
        missing_node_id: missing.to_string(),
    });
}
