//! Implementation of `agentmap path <file> <node-id>`.
//!
//! Prints the hierarchy chain from the root of the selected node's tree down
//! to the node itself.
//!
//! Output (human mode): the chain on one line with ids separated by ` -> `.
//! Output (JSON mode): `{"chain": [...], "nodes": [...]}`.
//!
//! Exit codes: 0 = success, 1 = node not found, 2 = input failure.

use agentmap_core::{HighlightPath, TopologyAnalysis, TopologySnapshot};

use crate::OutputFormat;
use crate::error::CliError;
use crate::format::{chain, emit};

/// Computes the highlight path for `node_id`.
///
/// # Errors
///
/// Returns [`CliError::NodeNotFound`] if `node_id` is not in the hierarchy.
pub fn highlight(analysis: &TopologyAnalysis, node_id: &str) -> Result<HighlightPath, CliError> {
    if !analysis.hierarchy().contains(node_id) {
        return Err(CliError::NodeNotFound {
            node_id: node_id.to_owned(),
        });
    }
    Ok(analysis.compute_path(Some(node_id)))
}

/// Runs the `path` command.
///
/// # Errors
///
/// Returns [`CliError::NodeNotFound`] if `node_id` is unknown, or
/// [`CliError::IoError`] if stdout cannot be written.
pub fn run(
    snapshot: TopologySnapshot,
    node_id: &str,
    format: OutputFormat,
) -> Result<(), CliError> {
    let analysis = TopologyAnalysis::from_snapshot(snapshot);
    let path = highlight(&analysis, node_id)?;
    emit(format, &path, |w| writeln!(w, "{}", chain(&path.chain)))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::cmd::fixtures::retry_snapshot;

    #[test]
    fn chain_runs_from_root_to_selection() {
        let analysis = TopologyAnalysis::from_snapshot(retry_snapshot());
        let path = highlight(&analysis, "search").expect("known node");
        assert_eq!(chain(&path.chain), "u -> planner -> search");
        assert!(path.is_edge_highlighted("planner", "search"));
        assert!(!path.contains("gpt"));
    }

    #[test]
    fn root_selection_is_single_node() {
        let analysis = TopologyAnalysis::from_snapshot(retry_snapshot());
        let path = highlight(&analysis, "u").expect("known node");
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn unknown_node_exits_one() {
        let analysis = TopologyAnalysis::from_snapshot(retry_snapshot());
        let err = highlight(&analysis, "ghost").expect_err("dropped node");
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("ghost"));
    }
}
