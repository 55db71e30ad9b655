//! Implementation of `agentmap inspect <file>`.
//!
//! Builds the topology model and prints summary statistics:
//! - node count by type
//! - edge count, total calls and total errors
//! - hierarchy roots and promoted orphans
//! - back edge count
//! - build diagnostics (dropped edges, duplicate node ids, merged edges)
//!
//! In `--format json` mode a single JSON object is emitted to stdout.
//! In human mode, aligned key/value lines are printed.
use std::collections::BTreeMap;
use std::io::Write;

use agentmap_core::{NodeId, NodeType, TopologyAnalysis, TopologySnapshot};
use serde::Serialize;

use crate::OutputFormat;
use crate::error::CliError;
use crate::format::emit;

/// One edge discarded while building the model.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DroppedEdgeStat {
    /// Edge id as received.
    pub edge_id: String,
    /// Endpoint that does not exist.
    pub missing_node_id: String,
}

/// Statistics gathered from an analysed snapshot.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectStats {
    /// Total number of nodes kept.
    pub node_count: usize,
    /// Node count keyed by wire type name; types with no nodes are omitted.
    pub node_counts: BTreeMap<&'static str, usize>,
    /// Number of distinct edges kept.
    pub edge_count: usize,
    /// Sum of `callCount` over kept edges.
    pub total_calls: u64,
    /// Sum of `errorCount` over kept edges.
    pub total_errors: u64,
    /// Hierarchy roots in order.
    pub roots: Vec<NodeId>,
    /// Roots promoted because no forward edge reached them.
    pub orphans: Vec<NodeId>,
    /// Number of back edges.
    pub back_edge_count: usize,
    /// Edges dropped for unknown endpoints.
    pub dropped_edges: Vec<DroppedEdgeStat>,
    /// Node ids that appeared more than once.
    pub duplicate_node_ids: Vec<NodeId>,
    /// Raw edge records folded into an earlier record.
    pub merged_edges: usize,
}

impl InspectStats {
    /// Computes statistics from an analysis.
    pub fn from_analysis(analysis: &TopologyAnalysis) -> Self {
        let model = analysis.model();
        let node_counts = NodeType::ALL
            .iter()
            .map(|&t| (t.as_str(), model.nodes_of_type(t).len()))
            .filter(|&(_, n)| n > 0)
            .collect();
        let diagnostics = model.diagnostics();

        Self {
            node_count: model.node_count(),
            node_counts,
            edge_count: model.edge_count(),
            total_calls: model.edges().iter().map(|e| e.call_count).sum(),
            total_errors: model.edges().iter().map(|e| e.error_count).sum(),
            roots: analysis.hierarchy().root_ids.clone(),
            orphans: analysis.hierarchy().orphaned_ids.clone(),
            back_edge_count: analysis.classification().back_edge_count(),
            dropped_edges: diagnostics
                .dropped_edges
                .iter()
                .map(|d| DroppedEdgeStat {
                    edge_id: d.edge_id.clone(),
                    missing_node_id: d.missing_node_id.clone(),
                })
                .collect(),
            duplicate_node_ids: diagnostics.duplicate_node_ids.clone(),
            merged_edges: diagnostics.merged_edges,
        }
    }
}

/// Runs the `inspect` command.
///
/// # Errors
///
/// Returns [`CliError::IoError`] if stdout cannot be written.
pub fn run(snapshot: TopologySnapshot, format: OutputFormat) -> Result<(), CliError> {
    let analysis = TopologyAnalysis::from_snapshot(snapshot);
    let stats = InspectStats::from_analysis(&analysis);
    emit(format, &stats, |w| print_human(w, &stats))
}

fn print_human(w: &mut dyn Write, stats: &InspectStats) -> std::io::Result<()> {
    writeln!(w, "nodes:          {}", stats.node_count)?;
    for t in NodeType::ALL {
        if let Some(count) = stats.node_counts.get(t.as_str()) {
            writeln!(w, "  {}: {count}", t.display_name())?;
        }
    }
    writeln!(w, "edges:          {}", stats.edge_count)?;
    writeln!(w, "calls:          {}", stats.total_calls)?;
    writeln!(w, "errors:         {}", stats.total_errors)?;
    writeln!(w, "back edges:     {}", stats.back_edge_count)?;
    writeln!(w, "roots:          {}", join(&stats.roots))?;
    if !stats.orphans.is_empty() {
        writeln!(w, "orphans:        {}", join(&stats.orphans))?;
    }
    if !stats.dropped_edges.is_empty() {
        writeln!(w, "dropped edges:  {}", stats.dropped_edges.len())?;
        for d in &stats.dropped_edges {
            if d.missing_node_id.is_empty() {
                writeln!(w, "  {} (empty endpoint)", d.edge_id)?;
            } else {
                writeln!(w, "  {} (unknown node {})", d.edge_id, d.missing_node_id)?;
            }
        }
    }
    if !stats.duplicate_node_ids.is_empty() {
        writeln!(w, "duplicate ids:  {}", join(&stats.duplicate_node_ids))?;
    }
    if stats.merged_edges > 0 {
        writeln!(w, "merged edges:   {}", stats.merged_edges)?;
    }
    Ok(())
}

fn join(ids: &[NodeId]) -> String {
    ids.iter()
        .map(NodeId::as_str)
        .collect::<Vec<&str>>()
        .join(", ")
}
