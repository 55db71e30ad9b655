//! Implementation of `agentmap sankey <file>`.
//!
//! Reads a Sankey response (or derives one from a topology snapshot with
//! `--from-topology`), drops the links that would close a cycle, and reports
//! loops found in the raw traces.
use std::io::Write;

use agentmap_core::{
    NodeId, SankeyConfig, SankeyLink, SankeyProjection, SankeyResponse, TopologyModel,
    remove_cyclic_links_with_config, sankey_from_topology,
};

use crate::error::CliError;
use crate::format::{chain, emit};
use crate::io::{read_sankey, read_snapshot};
use crate::{OutputFormat, PathOrStdin};

/// Reads the Sankey input named on the command line.
///
/// # Errors
///
/// Returns [`CliError`] for unreadable input or malformed JSON.
pub fn read_response(
    file: &PathOrStdin,
    max_file_size: u64,
    from_topology: bool,
) -> Result<SankeyResponse, CliError> {
    if from_topology {
        let snapshot = read_snapshot(file, max_file_size)?;
        Ok(sankey_from_topology(&TopologyModel::from_snapshot(snapshot)))
    } else {
        read_sankey(file, max_file_size)
    }
}

/// Runs the `sankey` command.
///
/// # Errors
///
/// Returns [`CliError::IoError`] if stdout cannot be written.
pub fn run(
    response: &SankeyResponse,
    config: &SankeyConfig,
    format: OutputFormat,
) -> Result<(), CliError> {
    let projection = remove_cyclic_links_with_config(response, config);
    emit(format, &projection, |w| print_human(w, &projection))
}

fn link_line(link: &SankeyLink) -> String {
    format!("{} -> {} ({})", link.source, link.target, link.value)
}

/// A loop rendered closed: `[a, b]` becomes `a -> b -> a`.
fn closed_loop(cycle: &[NodeId]) -> String {
    let mut ids: Vec<&NodeId> = cycle.iter().collect();
    if let Some(first) = cycle.first() {
        ids.push(first);
    }
    chain(&ids)
}

fn print_human(w: &mut dyn Write, projection: &SankeyProjection) -> std::io::Result<()> {
    writeln!(w, "nodes: {}", projection.nodes.len())?;
    writeln!(w, "links: {}", projection.links.len())?;
    for link in &projection.links {
        writeln!(w, "  {}", link_line(link))?;
    }
    writeln!(w, "dropped links: {}", projection.dropped_links.len())?;
    for link in &projection.dropped_links {
        writeln!(w, "  {}", link_line(link))?;
    }
    if projection.invalid_links > 0 {
        writeln!(w, "invalid links: {}", projection.invalid_links)?;
    }
    if !projection.loop_traces.is_empty() {
        writeln!(w, "loop traces: {}", projection.loop_traces.len())?;
        for lt in &projection.loop_traces {
            for l in &lt.loops {
                writeln!(w, "  {}: {}", lt.trace.trace_id, closed_loop(&l.cycle))?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use agentmap_core::parse_sankey;

    use super::*;
    use crate::cmd::fixtures::retry_snapshot;

    fn render(projection: &SankeyProjection) -> String {
        let mut buf = Vec::new();
        print_human(&mut buf, projection).expect("write");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn topology_retry_link_is_dropped() {
        let response = sankey_from_topology(&TopologyModel::from_snapshot(retry_snapshot()));
        let projection = remove_cyclic_links_with_config(&response, &SankeyConfig::default());
        let text = render(&projection);
        assert!(text.contains("links: 3\n"));
        assert!(text.contains("dropped links: 1\n  search -> planner (2)\n"));
        assert!(!text.contains("loop traces"));
    }

    #[test]
    fn trace_loops_are_rendered_closed() {
        let response = parse_sankey(
            r#"{
                "nodes": [{"id": "a"}, {"id": "b"}, {"id": "c"}],
                "links": [
                    {"source": "a", "target": "b", "value": 2},
                    {"source": "b", "target": "c", "value": 1},
                    {"source": "c", "target": "a", "value": 1},
                    {"source": "c", "target": "zzz", "value": 1}
                ],
                "traces": [{"traceId": "t1", "path": ["a", "b", "c", "a"]}]
            }"#,
        )
        .expect("parse");
        let projection = remove_cyclic_links_with_config(&response, &SankeyConfig::default());
        let text = render(&projection);
        assert!(text.contains("dropped links: 1\n  c -> a (1)\n"));
        assert!(text.contains("invalid links: 1\n"));
        assert!(text.contains("loop traces: 1\n  t1: a -> b -> c -> a\n"));
    }

    #[test]
    fn loop_detection_can_be_disabled() {
        let response = parse_sankey(
            r#"{"nodes": [{"id": "a"}], "links": [],
                "traces": [{"traceId": "t", "path": ["a", "a"]}]}"#,
        )
        .expect("parse");
        let config = SankeyConfig {
            detect_trace_loops: false,
            ..SankeyConfig::default()
        };
        let projection = remove_cyclic_links_with_config(&response, &config);
        assert!(projection.loop_traces.is_empty());
    }

    #[test]
    fn closed_loop_of_empty_cycle_is_empty() {
        assert_eq!(closed_loop(&[]), "");
    }
}
