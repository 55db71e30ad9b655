use serde::{Deserialize, Serialize};

use crate::newtypes::{NodeId, edge_key};

/// A directed call relationship between two nodes, aggregated over all
/// telemetry records for the `(source, target)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Edge identifier. Canonically `"source->target"`; see [`Edge::pair_key`].
    #[serde(default)]
    pub id: String,

    /// Calling node.
    pub source: NodeId,

    /// Called node.
    pub target: NodeId,

    /// Number of calls along this edge.
    #[serde(default, deserialize_with = "crate::serde_helpers::deserialize_count")]
    pub call_count: u64,

    /// Number of calls along this edge that failed.
    #[serde(default, deserialize_with = "crate::serde_helpers::deserialize_count")]
    pub error_count: u64,

    /// Mean call latency in milliseconds, when the backend reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_latency_ms: Option<f64>,
}

impl Edge {
    /// Creates an edge with the canonical id and zero errors.
    pub fn new(source: NodeId, target: NodeId, call_count: u64) -> Self {
        Self {
            id: edge_key(&source, &target),
            source,
            target,
            call_count,
            error_count: 0,
            avg_latency_ms: None,
        }
    }

    /// Returns the canonical `"source->target"` key for this edge.
    pub fn pair_key(&self) -> String {
        edge_key(&self.source, &self.target)
    }

    /// Returns `true` if the edge starts and ends at the same node.
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    /// Folds a duplicate record for the same endpoint pair into `self`.
    ///
    /// Counts are summed (saturating). Latency becomes the call-weighted mean
    /// of the two records when both report one; a single known latency is
    /// kept as-is.
    pub fn absorb(&mut self, other: &Edge) {
        self.avg_latency_ms = match (self.avg_latency_ms, other.avg_latency_ms) {
            (Some(a), Some(b)) => {
                let total = self.call_count.saturating_add(other.call_count);
                if total == 0 {
                    Some((a + b) / 2.0)
                } else {
                    #[allow(clippy::cast_precision_loss)]
                    let weighted = (a * self.call_count as f64 + b * other.call_count as f64)
                        / total as f64;
                    Some(weighted)
                }
            }
            (Some(a), None) => Some(a),
            (None, b) => b,
        };
        self.call_count = self.call_count.saturating_add(other.call_count);
        self.error_count = self.error_count.saturating_add(other.error_count);
    }
}
