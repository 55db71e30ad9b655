//! Implementation of `agentmap visible <file>`.
//!
//! Resolves the nodes and edges shown for an expansion state built from
//! `--expand`, `--expand-all` and `--reveal`. With no flags only the hierarchy
//! roots are visible.
use std::io::Write;

use agentmap_core::{
    ExpansionState, Hierarchy, NodeId, TopologyAnalysis, TopologySnapshot, VisibleGraph,
};

use crate::OutputFormat;
use crate::error::CliError;
use crate::format::{edge_line, emit, node_line};

/// Expansion flags as given on the command line.
#[derive(Debug, Default)]
pub struct ExpansionRequest<'a> {
    /// Ids to expand.
    pub expand: &'a [String],
    /// Expand every node with children.
    pub expand_all: bool,
    /// Ids whose ancestors are expanded.
    pub reveal: &'a [String],
}

/// Builds the expansion state requested on the command line.
///
/// Ids not in the hierarchy are logged and otherwise ignored.
///
/// # Errors
///
/// Returns [`CliError::InvalidArgument`] for an empty id.
pub fn expansion_state(
    hierarchy: &Hierarchy,
    request: &ExpansionRequest<'_>,
) -> Result<ExpansionState, CliError> {
    let mut state = if request.expand_all {
        ExpansionState::expand_all(hierarchy)
    } else {
        ExpansionState::new()
    };

    for raw in request.expand {
        let id = parse_id(raw)?;
        if !hierarchy.contains(&id) {
            tracing::warn!(node_id = %id, "--expand names an unknown node");
        }
        state = state.expand(&id);
    }
    for raw in request.reveal {
        let id = parse_id(raw)?;
        if !hierarchy.contains(&id) {
            tracing::warn!(node_id = %id, "--reveal names an unknown node");
        }
        state = state.expand_to(hierarchy, &id);
    }

    tracing::debug!(expanded = state.len(), "built expansion state");
    Ok(state)
}

fn parse_id(raw: &str) -> Result<NodeId, CliError> {
    NodeId::try_from(raw).map_err(|e| CliError::InvalidArgument {
        detail: e.to_string(),
    })
}

/// Runs the `visible` command.
///
/// # Errors
///
/// Returns [`CliError::InvalidArgument`] for an empty id and
/// [`CliError::IoError`] if stdout cannot be written.
pub fn run(
    snapshot: TopologySnapshot,
    format: OutputFormat,
    request: &ExpansionRequest<'_>,
) -> Result<(), CliError> {
    let analysis = TopologyAnalysis::from_snapshot(snapshot);
    let state = expansion_state(analysis.hierarchy(), request)?;
    let visible = analysis.visible_graph(&state);
    emit(format, &visible, |w| print_human(w, &visible))
}

fn print_human(w: &mut dyn Write, visible: &VisibleGraph) -> std::io::Result<()> {
    writeln!(w, "nodes: {}", visible.node_count())?;
    for node in &visible.nodes {
        match visible.hidden_child_counts.get(&node.id) {
            Some(hidden) => writeln!(w, "  {} (+{hidden} hidden)", node_line(node))?,
            None => writeln!(w, "  {}", node_line(node))?,
        }
    }
    writeln!(w, "edges: {}", visible.dag_edges.len())?;
    for edge in &visible.dag_edges {
        writeln!(w, "  {}", edge_line(edge))?;
    }
    writeln!(w, "back edges: {}", visible.back_edges.len())?;
    for edge in &visible.back_edges {
        writeln!(w, "  {}", edge_line(edge))?;
    }
    Ok(())
}
