//! Implementation of `agentmap classify <file>`.
//!
//! Partitions the snapshot's edges into forward and back edges and lists the
//! loop each back edge closes.
use std::io::Write;

use agentmap_core::{EdgeClassification, NodeId, TopologyAnalysis, TopologySnapshot};
use serde::Serialize;

use crate::OutputFormat;
use crate::error::CliError;
use crate::format::{chain, edge_line, emit};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClassifyReport<'a> {
    #[serde(flatten)]
    classification: &'a EdgeClassification,
    loops: Vec<Vec<NodeId>>,
}

/// Runs the `classify` command.
///
/// # Errors
///
/// Returns [`CliError::IoError`] if stdout cannot be written.
pub fn run(snapshot: TopologySnapshot, format: OutputFormat) -> Result<(), CliError> {
    let analysis = TopologyAnalysis::from_snapshot(snapshot);
    let report = ClassifyReport {
        classification: analysis.classification(),
        loops: analysis.classification().loops(),
    };
    emit(format, &report, |w| print_human(w, &analysis, &report.loops))
}

fn print_human(
    w: &mut dyn Write,
    analysis: &TopologyAnalysis,
    loops: &[Vec<NodeId>],
) -> std::io::Result<()> {
    let classification = analysis.classification();
    let forward = classification.forward_edges_of(analysis.model());
    let back = classification.back_edges_of(analysis.model());

    writeln!(w, "forward edges: {}", forward.len())?;
    for edge in forward {
        writeln!(w, "  {}", edge_line(edge))?;
    }
    writeln!(w, "back edges: {}", back.len())?;
    for edge in back {
        writeln!(w, "  {}", edge_line(edge))?;
    }
    if !loops.is_empty() {
        writeln!(w, "loops:")?;
        for cycle in loops {
            writeln!(w, "  {}", chain(cycle))?;
        }
    }
    Ok(())
}
