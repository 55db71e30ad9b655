#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod analysis;
pub mod enums;
pub mod fingerprint;
pub mod graph;
pub mod newtypes;
pub mod sankey;
pub mod serde_helpers;
pub mod snapshot;
pub mod structures;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use analysis::{AnalysisCache, TopologyAnalysis};
pub use enums::{NodeType, UnknownNodeType};
pub use fingerprint::{fingerprint_of, model_fingerprint, snapshot_fingerprint};
pub use graph::classify::EdgeKind;
pub use graph::{
    BuildDiagnostics, DroppedEdge, EdgeClassification, EdgeWeight, ExpansionState, Hierarchy,
    HighlightPath, NodeWeight, TopologyModel, VisibleGraph, build_hierarchy, build_topology,
    classify_edges, compute_path, toggle_expand, visible_graph,
};
pub use newtypes::{EDGE_KEY_SEPARATOR, NewtypeError, NodeId, edge_key};
pub use sankey::{
    LoopTrace, RawTrace, SankeyConfig, SankeyLink, SankeyNode, SankeyProjection, SankeyResponse,
    TraceLoop, detect_trace_loops, parse_sankey, remove_cyclic_links,
    remove_cyclic_links_with_config, sankey_from_topology,
};
pub use snapshot::{SnapshotError, TopologySnapshot, parse_snapshot};
pub use structures::{Edge, Node, NodeMetrics};

/// Returns the current version of the agentmap-core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
