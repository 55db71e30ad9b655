//! Implementation of `agentmap tree <file>`.
//!
//! Prints the disclosure hierarchy as an indented tree, roots first, children
//! in hierarchy order. Roots promoted from unreachable cycles are marked
//! `(orphan)`.
use std::io::Write;

use agentmap_core::{Hierarchy, NodeId, TopologyAnalysis, TopologyModel, TopologySnapshot};

use crate::OutputFormat;
use crate::error::CliError;
use crate::format::{emit, node_line};

/// Runs the `tree` command.
///
/// # Errors
///
/// Returns [`CliError::IoError`] if stdout cannot be written.
pub fn run(snapshot: TopologySnapshot, format: OutputFormat) -> Result<(), CliError> {
    let analysis = TopologyAnalysis::from_snapshot(snapshot);
    emit(format, analysis.hierarchy(), |w| {
        print_tree(w, analysis.model(), analysis.hierarchy())
    })
}

/// Writes one line per node, indented two spaces per depth level.
pub fn print_tree(
    w: &mut dyn Write,
    model: &TopologyModel,
    hierarchy: &Hierarchy,
) -> std::io::Result<()> {
    let mut stack: Vec<(&NodeId, usize)> =
        hierarchy.root_ids.iter().rev().map(|r| (r, 0)).collect();

    while let Some((id, depth)) = stack.pop() {
        let text = model.node(id).map_or_else(|| id.to_string(), node_line);
        let indent = "  ".repeat(depth);
        let orphan = if hierarchy.orphaned_ids.contains(id) {
            " (orphan)"
        } else {
            ""
        };
        writeln!(w, "{indent}{text}{orphan}")?;

        for child in hierarchy.children(id).iter().rev() {
            stack.push((child, depth + 1));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use agentmap_core::parse_snapshot;

    use super::*;
    use crate::cmd::fixtures::retry_snapshot;

    fn render(snapshot: TopologySnapshot) -> String {
        let analysis = TopologyAnalysis::from_snapshot(snapshot);
        let mut buf = Vec::new();
        print_tree(&mut buf, analysis.model(), analysis.hierarchy()).expect("write");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn children_are_indented_under_parents() {
        let text = render(retry_snapshot());
        assert_eq!(
            text,
            "u [user] \"Alice\"\n\
             \x20 planner [agent] \"Planner\"\n\
             \x20   search [tool] \"web_search\"\n\
             \x20   gpt [llm] \"gpt-4o\"\n"
        );
    }

    #[test]
    fn isolated_nodes_are_roots() {
        let snapshot = parse_snapshot(
            r#"{"nodes": [
                {"id": "a", "nodeType": "agent", "label": "a"},
                {"id": "b", "nodeType": "tool", "label": "b"}
            ], "edges": []}"#,
        )
        .expect("parse");
        assert_eq!(render(snapshot), "a [agent]\nb [tool]\n");
    }

    #[test]
    fn empty_snapshot_prints_nothing() {
        assert_eq!(render(TopologySnapshot::default()), "");
    }
}
