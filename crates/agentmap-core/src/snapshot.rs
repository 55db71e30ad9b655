/// Top-level topology snapshot as returned by the graph-snapshot endpoint.
///
/// A snapshot is the raw `{ nodes, edges }` payload for one project, time
/// range and filter combination. It is the only input the analysis layer
/// accepts; everything downstream is derived from it and discarded when a new
/// snapshot arrives.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::graph::DroppedEdge;
use crate::newtypes::{NodeId, edge_key};
use crate::structures::{Edge, Node};

/// Raw node and edge lists for one topology snapshot.
///
/// No referential integrity is implied: edges may name unknown nodes and the
/// same `(source, target)` pair may appear more than once. Normalisation is
/// the job of [`crate::graph::build_topology`].
///
/// Decoding is lenient for edges: a record whose `source` or `target` is
/// empty or absent cannot become an [`Edge`], so it is set aside in
/// `rejected_edges` instead of failing the whole payload.
/// [`crate::graph::TopologyModel::from_snapshot`] reports those records in
/// its dropped-edge diagnostics.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "WireSnapshot")]
pub struct TopologySnapshot {
    /// All nodes in the snapshot.
    pub nodes: Vec<Node>,
    /// All decodable edges in the snapshot.
    pub edges: Vec<Edge>,
    /// Edge records dropped while decoding, in input order.
    #[serde(skip)]
    pub rejected_edges: Vec<DroppedEdge>,
}

impl TopologySnapshot {
    /// Creates a snapshot with no rejected edge records.
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self {
            nodes,
            edges,
            rejected_edges: Vec::new(),
        }
    }
}

#[derive(Deserialize)]
struct WireSnapshot {
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    edges: Vec<WireEdge>,
}

/// An edge record with unvalidated endpoints.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEdge {
    #[serde(default)]
    id: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    target: String,
    #[serde(default, deserialize_with = "crate::serde_helpers::deserialize_count")]
    call_count: u64,
    #[serde(default, deserialize_with = "crate::serde_helpers::deserialize_count")]
    error_count: u64,
    #[serde(default)]
    avg_latency_ms: Option<f64>,
}

impl WireEdge {
    fn into_edge(self) -> Result<Edge, DroppedEdge> {
        let endpoints = NodeId::try_from(self.source.as_str())
            .and_then(|s| NodeId::try_from(self.target.as_str()).map(|t| (s, t)));
        let Ok((source, target)) = endpoints else {
            let missing_node_id = if self.source.is_empty() {
                self.source.clone()
            } else {
                self.target.clone()
            };
            let edge_id = if self.id.is_empty() {
                edge_key(&self.source, &self.target)
            } else {
                self.id
            };
            return Err(DroppedEdge {
                edge_id,
                missing_node_id,
            });
        };
        Ok(Edge {
            id: self.id,
            source,
            target,
            call_count: self.call_count,
            error_count: self.error_count,
            avg_latency_ms: self.avg_latency_ms,
        })
    }
}

impl From<WireSnapshot> for TopologySnapshot {
    fn from(wire: WireSnapshot) -> Self {
        let mut edges = Vec::with_capacity(wire.edges.len());
        let mut rejected_edges = Vec::new();
        for raw in wire.edges {
            match raw.into_edge() {
                Ok(edge) => edges.push(edge),
                Err(dropped) => rejected_edges.push(dropped),
            }
        }
        Self {
            nodes: wire.nodes,
            edges,
            rejected_edges,
        }
    }
}

/// Error returned when a snapshot payload cannot be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotError {
    /// 1-based line of the failure, `0` when unknown.
    pub line: usize,
    /// 1-based column of the failure, `0` when unknown.
    pub column: usize,
    /// Decoder message.
    pub detail: String,
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "invalid snapshot: {}", self.detail)
        } else {
            write!(
                f,
                "invalid snapshot at line {} column {}: {}",
                self.line, self.column, self.detail
            )
        }
    }
}

impl std::error::Error for SnapshotError {}

impl From<serde_json::Error> for SnapshotError {
    fn from(e: serde_json::Error) -> Self {
        Self {
            line: e.line(),
            column: e.column(),
            detail: e.to_string(),
        }
    }
}

/// Decodes a JSON topology snapshot.
///
/// # Errors
///
/// Returns [`SnapshotError`] when the payload is not valid JSON, a node has an
/// empty id, a node type is not one of the known variants, or a count is not
/// a whole non-negative number. Edges with empty endpoints do not fail the
/// decode; see [`TopologySnapshot`].
pub fn parse_snapshot(json: &str) -> Result<TopologySnapshot, SnapshotError> {
    Ok(serde_json::from_str(json)?)
}
