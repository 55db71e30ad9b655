//! Acyclic projection of Sankey flow data.
//!
//! Sankey layouts require a DAG. [`remove_cyclic_links`] walks the links in
//! input order and keeps each one unless its target already reaches its source
//! through links kept so far; the dropped link is therefore always the last
//! one processed on the cycle it would close. Dropping never touches a link
//! that is not part of some cycle in the input.
//!
//! Separately, every raw execution trace is scanned for repeated node ids and
//! annotated with the loops it went through. Loop traces are informational and
//! do not influence which links are kept.
use std::collections::{HashMap, HashSet};

use petgraph::algo::has_path_connecting;
use petgraph::graphmap::DiGraphMap;
use serde::{Deserialize, Serialize};

use crate::enums::NodeType;
use crate::graph::TopologyModel;
use crate::newtypes::NodeId;
use crate::structures::Node;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// A Sankey column entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SankeyNode {
    /// Node id, shared with the topology snapshot.
    pub id: NodeId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Node role, when the backend supplies it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<NodeType>,
}

/// A weighted flow between two Sankey nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SankeyLink {
    /// Upstream node id.
    pub source: NodeId,
    /// Downstream node id.
    pub target: NodeId,
    /// Flow weight (call count).
    #[serde(default, deserialize_with = "crate::serde_helpers::deserialize_count")]
    pub value: u64,
}

impl SankeyLink {
    /// Creates a link.
    pub fn new(source: NodeId, target: NodeId, value: u64) -> Self {
        Self {
            source,
            target,
            value,
        }
    }
}

/// One execution's ordered node-id sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTrace {
    /// Trace identifier.
    pub trace_id: String,
    /// Visited node ids in execution order.
    #[serde(default)]
    pub path: Vec<NodeId>,
}

/// One loop found in a trace: the ids from a node up to (excluding) its repeat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceLoop {
    /// Ids in loop order; the first id is the one that repeats.
    pub cycle: Vec<NodeId>,
}

/// A trace annotated with the loops it contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopTrace {
    /// The original trace.
    pub trace: RawTrace,
    /// Loops in the order their closing repeat occurs.
    pub loops: Vec<TraceLoop>,
}

/// Sankey payload as returned by the backend.
///
/// A link whose `source` or `target` is empty or absent is not decoded; it is
/// counted in `rejected_links` and reported with the projection's invalid
/// links.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "WireSankeyResponse")]
pub struct SankeyResponse {
    /// Sankey nodes.
    #[serde(default)]
    pub nodes: Vec<SankeyNode>,
    /// Links, possibly cyclic.
    #[serde(default)]
    pub links: Vec<SankeyLink>,
    /// Raw execution traces.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub traces: Vec<RawTrace>,
    /// Loop traces already computed by the backend.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub loop_traces: Vec<LoopTrace>,
    /// Number of link records dropped while decoding.
    #[serde(skip)]
    pub rejected_links: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSankeyResponse {
    #[serde(default)]
    nodes: Vec<SankeyNode>,
    #[serde(default)]
    links: Vec<WireLink>,
    #[serde(default)]
    traces: Vec<RawTrace>,
    #[serde(default)]
    loop_traces: Vec<LoopTrace>,
}

/// A link record with unvalidated endpoints.
#[derive(Deserialize)]
struct WireLink {
    #[serde(default)]
    source: String,
    #[serde(default)]
    target: String,
    #[serde(default, deserialize_with = "crate::serde_helpers::deserialize_count")]
    value: u64,
}

impl From<WireSankeyResponse> for SankeyResponse {
    fn from(wire: WireSankeyResponse) -> Self {
        let total = wire.links.len();
        let links: Vec<SankeyLink> = wire
            .links
            .into_iter()
            .filter_map(|l| {
                let source = NodeId::try_from(l.source.as_str()).ok()?;
                let target = NodeId::try_from(l.target.as_str()).ok()?;
                Some(SankeyLink::new(source, target, l.value))
            })
            .collect();
        Self {
            rejected_links: total - links.len(),
            nodes: wire.nodes,
            links,
            traces: wire.traces,
            loop_traces: wire.loop_traces,
        }
    }
}

/// Decodes a JSON Sankey response.
///
/// # Errors
///
/// Returns the `serde_json` error when the payload does not match the wire
/// shape.
pub fn parse_sankey(json: &str) -> Result<SankeyResponse, serde_json::Error> {
    serde_json::from_str(json)
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Knobs for [`remove_cyclic_links_with_config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SankeyConfig {
    /// Fold repeated `(source, target)` links into one, summing `value`.
    ///
    /// Default: `true`.
    pub merge_duplicate_links: bool,

    /// Scan `traces` for repeated node ids and emit loop traces.
    ///
    /// Default: `true`.
    pub detect_trace_loops: bool,
}

impl Default for SankeyConfig {
    fn default() -> Self {
        Self {
            merge_duplicate_links: true,
            detect_trace_loops: true,
        }
    }
}

/// Output of [`remove_cyclic_links`]: an acyclic link set plus diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SankeyProjection {
    /// Sankey nodes, unchanged.
    pub nodes: Vec<SankeyNode>,
    /// Kept links, in input order. Never contains a cycle.
    pub links: Vec<SankeyLink>,
    /// Links dropped because they would close a cycle, in input order.
    pub dropped_links: Vec<SankeyLink>,
    /// Number of links ignored because an endpoint is not a Sankey node,
    /// including links rejected while decoding.
    pub invalid_links: usize,
    /// Backend-supplied loop traces followed by locally detected ones.
    pub loop_traces: Vec<LoopTrace>,
}

/// Projects `response` onto an acyclic link set with the default
/// [`SankeyConfig`].
pub fn remove_cyclic_links(response: &SankeyResponse) -> SankeyProjection {
    remove_cyclic_links_with_config(response, &SankeyConfig::default())
}

/// Projects `response` onto an acyclic link set.
///
/// Links are considered in input order (after duplicate merging, which keeps
/// the position of the first occurrence). A link `(u, v)` is dropped when
/// `u == v` or when `u` is reachable from `v` over links already kept.
pub fn remove_cyclic_links_with_config(
    response: &SankeyResponse,
    config: &SankeyConfig,
) -> SankeyProjection {
    let known: HashSet<&str> = response.nodes.iter().map(|n| n.id.as_str()).collect();

    let mut invalid_links = response.rejected_links;
    let mut candidates: Vec<SankeyLink> = Vec::with_capacity(response.links.len());
    let mut pair_to_position: HashMap<(&str, &str), usize> = HashMap::new();
    for link in &response.links {
        if !known.contains(link.source.as_str()) || !known.contains(link.target.as_str()) {
            tracing::warn!(
                source = %link.source,
                target = %link.target,
                "sankey link references unknown node; ignoring"
            );
            invalid_links += 1;
            continue;
        }
        if config.merge_duplicate_links {
            let pair = (link.source.as_str(), link.target.as_str());
            if let Some(&position) = pair_to_position.get(&pair) {
                if let Some(existing) = candidates.get_mut(position) {
                    existing.value = existing.value.saturating_add(link.value);
                }
                continue;
            }
            pair_to_position.insert(pair, candidates.len());
        }
        candidates.push(link.clone());
    }

    let mut accepted: DiGraphMap<&str, ()> = DiGraphMap::new();
    let mut links = Vec::with_capacity(candidates.len());
    let mut dropped_links = Vec::new();
    for link in &candidates {
        if closes_cycle(&accepted, link) {
            tracing::debug!(
                source = %link.source,
                target = %link.target,
                "dropping cycle-closing sankey link"
            );
            dropped_links.push(link.clone());
            continue;
        }
        accepted.add_edge(link.source.as_str(), link.target.as_str(), ());
        links.push(link.clone());
    }

    let mut loop_traces = response.loop_traces.clone();
    if config.detect_trace_loops {
        loop_traces.extend(response.traces.iter().filter_map(|trace| {
            let loops = detect_trace_loops(trace);
            (!loops.is_empty()).then(|| LoopTrace {
                trace: trace.clone(),
                loops,
            })
        }));
    }

    tracing::debug!(
        kept = links.len(),
        dropped = dropped_links.len(),
        invalid = invalid_links,
        loop_traces = loop_traces.len(),
        "projected sankey links"
    );

    SankeyProjection {
        nodes: response.nodes.clone(),
        links,
        dropped_links,
        invalid_links,
        loop_traces,
    }
}

/// Returns `true` if adding `link` to `accepted` would create a cycle.
fn closes_cycle(accepted: &DiGraphMap<&str, ()>, link: &SankeyLink) -> bool {
    let (u, v) = (link.source.as_str(), link.target.as_str());
    if u == v {
        return true;
    }
    accepted.contains_node(u)
        && accepted.contains_node(v)
        && has_path_connecting(accepted, v, u, None)
}

/// Finds the loops in one trace.
///
/// Each time an id repeats at position `j`, the loop is the slice from its
/// most recent earlier occurrence `i` up to `j` (exclusive), so
/// `[A, B, C, A]` yields `[A, B, C]`.
pub fn detect_trace_loops(trace: &RawTrace) -> Vec<TraceLoop> {
    let mut last_seen: HashMap<&str, usize> = HashMap::new();
    let mut loops = Vec::new();
    for (j, id) in trace.path.iter().enumerate() {
        if let Some(&i) = last_seen.get(id.as_str()) {
            if let Some(cycle) = trace.path.get(i..j) {
                loops.push(TraceLoop {
                    cycle: cycle.to_vec(),
                });
            }
        }
        last_seen.insert(id.as_str(), j);
    }
    loops
}

/// Reshapes a topology model into a Sankey response.
///
/// Node `name` is the node's display label and link `value` its call count.
/// Nodes are ordered by [`NodeType::flow_rank`] so callers come before
/// callees, keeping model order within a rank. Links keep model order. The
/// result carries no traces.
pub fn sankey_from_topology(model: &TopologyModel) -> SankeyResponse {
    let mut nodes: Vec<&Node> = model.nodes().iter().collect();
    nodes.sort_by_key(|n| n.node_type.flow_rank());
    SankeyResponse {
        nodes: nodes
            .into_iter()
            .map(|n| SankeyNode {
                id: n.id.clone(),
                name: n.display_label().to_owned(),
                node_type: Some(n.node_type),
            })
            .collect(),
        links: model
            .edges()
            .iter()
            .map(|e| SankeyLink::new(e.source.clone(), e.target.clone(), e.call_count))
            .collect(),
        traces: Vec::new(),
        loop_traces: Vec::new(),
        rejected_links: 0,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::graph::build_topology;
    use crate::test_helpers::{chain_abc, cycle_abc, node_id, typed_node};

    fn sankey_node(id: &str) -> SankeyNode {
        SankeyNode {
            id: node_id(id),
            name: id.to_owned(),
            node_type: None,
        }
    }

    fn link(s: &str, t: &str, value: u64) -> SankeyLink {
        SankeyLink::new(node_id(s), node_id(t), value)
    }

    fn trace(id: &str, path: &[&str]) -> RawTrace {
        RawTrace {
            trace_id: id.to_owned(),
            path: path.iter().map(|p| node_id(p)).collect(),
        }
    }

    fn response(ids: &[&str], links: Vec<SankeyLink>) -> SankeyResponse {
        SankeyResponse {
            nodes: ids.iter().map(|id| sankey_node(id)).collect(),
            links,
            ..SankeyResponse::default()
        }
    }

    fn pair(s: &str, t: &str) -> (String, String) {
        (s.to_owned(), t.to_owned())
    }

    fn pairs(links: &[SankeyLink]) -> Vec<(String, String)> {
        links
            .iter()
            .map(|l| (l.source.to_string(), l.target.to_string()))
            .collect()
    }

    /// Three-cycle with equal weights: the last link processed is dropped, and
    /// the trace `[A, B, C, A]` reports the loop `[A, B, C]`.
    #[test]
    fn test_three_cycle_drops_closing_link() {
        let mut r = response(
            &["A", "B", "C"],
            vec![link("A", "B", 1), link("B", "C", 1), link("C", "A", 1)],
        );
        r.traces = vec![trace("t1", &["A", "B", "C", "A"])];

        let p = remove_cyclic_links(&r);
        assert_eq!(p.links.len(), 2);
        assert_eq!(pairs(&p.dropped_links), vec![pair("C", "A")]);
        assert_eq!(p.loop_traces.len(), 1);
        assert_eq!(
            p.loop_traces[0].loops,
            vec![TraceLoop {
                cycle: vec![node_id("A"), node_id("B"), node_id("C")]
            }]
        );
    }

    /// An acyclic input passes through untouched.
    #[test]
    fn test_acyclic_links_are_kept() {
        let r = response(
            &["A", "B", "C", "D"],
            vec![link("A", "B", 1), link("A", "C", 2), link("B", "D", 1), link("C", "D", 1)],
        );
        let p = remove_cyclic_links(&r);
        assert_eq!(p.links, r.links);
        assert!(p.dropped_links.is_empty());
        assert!(p.loop_traces.is_empty());
    }

    /// A self-link is always dropped.
    #[test]
    fn test_self_link_dropped() {
        let p = remove_cyclic_links(&response(&["A"], vec![link("A", "A", 4)]));
        assert!(p.links.is_empty());
        assert_eq!(p.dropped_links.len(), 1);
    }

    /// Duplicate links merge into the first occurrence by summing values.
    #[test]
    fn test_duplicate_links_merge() {
        let r = response(&["A", "B"], vec![link("A", "B", 3), link("A", "B", 2)]);
        let p = remove_cyclic_links(&r);
        assert_eq!(p.links, vec![link("A", "B", 5)]);

        let cfg = SankeyConfig {
            merge_duplicate_links: false,
            ..SankeyConfig::default()
        };
        let p = remove_cyclic_links_with_config(&r, &cfg);
        assert_eq!(p.links.len(), 2);
    }

    /// Links naming unknown nodes are counted and ignored.
    #[test]
    fn test_unknown_endpoint_links_are_ignored() {
        let r = response(&["A", "B"], vec![link("A", "B", 1), link("B", "ghost", 1)]);
        let p = remove_cyclic_links(&r);
        assert_eq!(p.links.len(), 1);
        assert_eq!(p.invalid_links, 1);
        assert!(p.dropped_links.is_empty());
    }

    /// The kept set is acyclic for two interleaved cycles.
    #[test]
    fn test_interleaved_cycles_become_acyclic() {
        let r = response(
            &["A", "B", "C", "D"],
            vec![
                link("A", "B", 1),
                link("B", "A", 1),
                link("B", "C", 1),
                link("C", "D", 1),
                link("D", "B", 1),
                link("D", "A", 1),
            ],
        );
        let p = remove_cyclic_links(&r);
        let mut g: DiGraphMap<&str, ()> = DiGraphMap::new();
        for l in &p.links {
            g.add_edge(l.source.as_str(), l.target.as_str(), ());
        }
        assert!(!petgraph::algo::is_cyclic_directed(&g));
        assert_eq!(
            pairs(&p.dropped_links),
            vec![pair("B", "A"), pair("D", "B"), pair("D", "A")]
        );
    }

    /// Repeats use the most recent occurrence; traces without loops are omitted.
    #[test]
    fn test_trace_loop_detection() {
        let loops = detect_trace_loops(&trace("t", &["A", "B", "A", "C", "A"]));
        let cycles: Vec<Vec<String>> = loops
            .iter()
            .map(|l| l.cycle.iter().map(ToString::to_string).collect())
            .collect();
        assert_eq!(cycles, vec![vec!["A", "B"], vec!["A", "C"]]);

        let mut r = response(&["A", "B"], vec![link("A", "B", 1)]);
        r.traces = vec![trace("straight", &["A", "B"])];
        assert!(remove_cyclic_links(&r).loop_traces.is_empty());
    }

    /// Backend loop traces come first; detection can be switched off.
    #[test]
    fn test_backend_loop_traces_pass_through() {
        let backend = LoopTrace {
            trace: trace("t0", &["B", "B"]),
            loops: vec![TraceLoop {
                cycle: vec![node_id("B")],
            }],
        };
        let mut r = response(&["A", "B"], vec![]);
        r.loop_traces = vec![backend.clone()];
        r.traces = vec![trace("t1", &["A", "B", "A"])];

        let p = remove_cyclic_links(&r);
        assert_eq!(p.loop_traces.len(), 2);
        assert_eq!(p.loop_traces[0], backend);
        assert_eq!(p.loop_traces[1].trace.trace_id, "t1");

        let cfg = SankeyConfig {
            detect_trace_loops: false,
            ..SankeyConfig::default()
        };
        assert_eq!(remove_cyclic_links_with_config(&r, &cfg).loop_traces, vec![backend]);
    }

    /// Topology models reshape into Sankey responses with labels and call counts.
    #[test]
    fn test_sankey_from_topology() {
        let r = sankey_from_topology(&chain_abc());
        assert_eq!(r.nodes.len(), 3);
        assert_eq!(r.nodes[1].node_type, Some(NodeType::Tool));
        assert_eq!(r.links, vec![link("A", "B", 1), link("B", "C", 1)]);

        let p = remove_cyclic_links(&sankey_from_topology(&cycle_abc()));
        assert_eq!(pairs(&p.dropped_links), vec![pair("C", "A")]);
    }

    /// Nodes are ordered user, agent, sub-agent, then tools and models, with
    /// model order kept inside a rank.
    #[test]
    fn test_sankey_from_topology_orders_nodes_by_flow_rank() {
        let model = build_topology(
            vec![
                typed_node("gpt", NodeType::Llm),
                typed_node("search", NodeType::Tool),
                typed_node("writer", NodeType::SubAgent),
                typed_node("planner", NodeType::Agent),
                typed_node("u", NodeType::User),
            ],
            vec![],
        );
        let ids: Vec<String> = sankey_from_topology(&model)
            .nodes
            .iter()
            .map(|n| n.id.to_string())
            .collect();
        assert_eq!(ids, vec!["u", "planner", "writer", "gpt", "search"]);
    }

    /// The wire shape uses camelCase keys and omits empty trace lists.
    #[test]
    fn test_wire_shape() {
        let json = r#"{
            "nodes": [{"id": "a", "name": "Planner", "nodeType": "agent"}, {"id": "b"}],
            "links": [{"source": "a", "target": "b", "value": 3}],
            "loopTraces": [
                {"trace": {"traceId": "t0", "path": ["a", "a"]}, "loops": [{"cycle": ["a"]}]}
            ]
        }"#;
        let r = parse_sankey(json).expect("valid sankey response");
        assert_eq!(r.nodes[0].node_type, Some(NodeType::Agent));
        assert_eq!(r.loop_traces.len(), 1);

        let out = serde_json::to_value(response(&["x"], vec![])).expect("serialize");
        assert!(out.get("traces").is_none());
        assert!(out.get("loopTraces").is_none());
    }

    /// Empty input, empty projection.
    #[test]
    fn test_empty_response() {
        assert_eq!(
            remove_cyclic_links(&SankeyResponse::default()),
            SankeyProjection::default()
        );
    }

    /// Links with empty endpoints are counted as invalid instead of failing
    /// the decode, and float values decode as whole numbers.
    #[test]
    fn test_lenient_link_decoding() {
        let json = r#"{
            "nodes": [{"id": "a"}, {"id": "b"}],
            "links": [
                {"source": "a", "target": "b", "value": 4.0},
                {"source": "", "target": "b", "value": 1},
                {"target": "a", "value": 1}
            ]
        }"#;
        let r = parse_sankey(json).expect("lenient decode");
        assert_eq!(r.links, vec![link("a", "b", 4)]);
        assert_eq!(r.rejected_links, 2);

        let p = remove_cyclic_links(&r);
        assert_eq!(p.links.len(), 1);
        assert_eq!(p.invalid_links, 2);
    }
}
