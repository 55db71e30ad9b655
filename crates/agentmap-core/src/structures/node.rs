use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::NodeType;
use crate::newtypes::NodeId;

/// Pre-aggregated metrics attached to a node.
///
/// Every field is optional: the backend omits metrics it did not collect for
/// the requested time range. Unknown keys land in [`NodeMetrics::extra`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetrics {
    /// Number of invocations of this node.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::serde_helpers::deserialize_optional_count"
    )]
    pub call_count: Option<u64>,

    /// Number of invocations that ended in an error.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::serde_helpers::deserialize_optional_count"
    )]
    pub error_count: Option<u64>,

    /// Mean latency per invocation in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_latency_ms: Option<f64>,

    /// Total tokens consumed (LLM nodes, or agents rolling up their calls).
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::serde_helpers::deserialize_optional_count"
    )]
    pub total_tokens: Option<u64>,

    /// Total cost in the backend's billing currency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<f64>,

    /// Metric keys not modelled above.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A single node of an execution topology snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Snapshot-unique identifier.
    pub id: NodeId,

    /// Role of the node (user, agent, sub-agent, tool, LLM).
    pub node_type: NodeType,

    /// Display label; defaults to empty when the backend omits it.
    #[serde(default)]
    pub label: String,

    /// Pre-aggregated metrics.
    #[serde(default)]
    pub metrics: NodeMetrics,
}

impl Node {
    /// Creates a node with empty metrics.
    pub fn new(id: NodeId, node_type: NodeType, label: impl Into<String>) -> Self {
        Self {
            id,
            node_type,
            label: label.into(),
            metrics: NodeMetrics::default(),
        }
    }

    /// Returns the label, falling back to the id when the label is empty.
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
}
