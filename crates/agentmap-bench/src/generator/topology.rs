//! Topology strategies: user entry points, layered sub-agent delegation,
//! tool/model fan-out, retry loop injection and noisy edge records.

use std::collections::{HashMap, HashSet};

use agentmap_core::{
    Edge, Node, NodeId, NodeType, RawTrace, SankeyLink, SankeyNode, SankeyResponse,
    TopologySnapshot,
};
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::GeneratorConfig;
use super::edges;
use super::nodes;

/// Longest random walk recorded as a trace.
const MAX_TRACE_LEN: usize = 12;

/// Probability that a fan-out call goes to a deeper sub-agent rather than a
/// tool or model.
const DELEGATE_PROBABILITY: f64 = 0.2;

fn add_nodes(
    rng: &mut StdRng,
    out: &mut Vec<Node>,
    node_type: NodeType,
    count: usize,
) -> Vec<NodeId> {
    (0..count)
        .map(|i| {
            let node = nodes::build_node(rng, node_type, i);
            let id = node.id.clone();
            out.push(node);
            id
        })
        .collect()
}

/// Distinct `(source, target)` call pairs in insertion order.
#[derive(Default)]
struct CallSet {
    pairs: Vec<(NodeId, NodeId)>,
    seen: HashSet<(NodeId, NodeId)>,
}

impl CallSet {
    fn push(&mut self, source: &NodeId, target: &NodeId) {
        let pair = (source.clone(), target.clone());
        if self.seen.insert(pair.clone()) {
            self.pairs.push(pair);
        }
    }
}

/// Builds a complete topology snapshot from the generator configuration.
pub fn build_snapshot(config: &GeneratorConfig, rng: &mut StdRng) -> TopologySnapshot {
    let mut all_nodes: Vec<Node> = Vec::new();
    let users = add_nodes(rng, &mut all_nodes, NodeType::User, config.num_users);
    let agents = add_nodes(rng, &mut all_nodes, NodeType::Agent, config.num_agents);
    let subs = add_nodes(rng, &mut all_nodes, NodeType::SubAgent, config.num_sub_agents);
    let tools = add_nodes(rng, &mut all_nodes, NodeType::Tool, config.num_tools);
    let llms = add_nodes(rng, &mut all_nodes, NodeType::Llm, config.num_llms);

    let layer_size = subs.len().div_ceil(config.delegation_depth.max(1)).max(1);
    let layers: Vec<&[NodeId]> = subs.chunks(layer_size).collect();
    let leaves: Vec<&NodeId> = tools.iter().chain(&llms).collect();

    let mut calls = CallSet::default();

    for user in &users {
        for _ in 0..rng.gen_range(1..=2) {
            if let Some(agent) = agents.choose(rng) {
                calls.push(user, agent);
            }
        }
    }

    // Every sub-agent gets one caller from the layer above.
    let mut above: &[NodeId] = &agents;
    for layer in &layers {
        for sub in *layer {
            if let Some(caller) = above.choose(rng) {
                calls.push(caller, sub);
            }
        }
        above = *layer;
    }

    let caller_tiers = std::iter::once(agents.as_slice()).chain(layers.iter().copied());
    for (depth, tier) in caller_tiers.enumerate() {
        let deeper: &[NodeId] = layers.get(depth).copied().unwrap_or(&[]);
        for caller in tier {
            for _ in 0..config.fan_out {
                let callee = if !deeper.is_empty() && rng.gen_bool(DELEGATE_PROBABILITY) {
                    deeper.choose(rng)
                } else {
                    leaves.choose(rng).copied()
                };
                if let Some(callee) = callee {
                    calls.push(caller, callee);
                }
            }
        }
    }

    let forward = calls.pairs.clone();
    for (source, target) in &forward {
        if rng.gen_bool(config.retry_density) {
            calls.push(target, source);
        }
    }

    let mut all_edges: Vec<Edge> = Vec::with_capacity(calls.pairs.len());
    for (source, target) in &calls.pairs {
        let edge = edges::build_call(rng, source, target, config.max_calls);
        let duplicate = rng
            .gen_bool(config.duplicate_rate)
            .then(|| edges::build_duplicate(rng, &edge, config.max_calls));
        all_edges.push(edge);
        all_edges.extend(duplicate);
    }

    for i in 0..config.num_dangling_edges {
        if let Some(source) = all_nodes.choose(rng) {
            let missing = nodes::node_id("missing", i);
            all_edges.push(edges::build_call(rng, &source.id, &missing, config.max_calls));
        }
    }

    TopologySnapshot::new(all_nodes, all_edges)
}

/// Builds a Sankey response from a generated snapshot.
///
/// Links copy the raw edge records, so they keep duplicates, dangling
/// endpoints and retry cycles. Traces are random walks starting at users.
pub fn build_sankey(
    config: &GeneratorConfig,
    snapshot: &TopologySnapshot,
    rng: &mut StdRng,
) -> SankeyResponse {
    let sankey_nodes: Vec<SankeyNode> = snapshot
        .nodes
        .iter()
        .map(|n| SankeyNode {
            id: n.id.clone(),
            name: n.display_label().to_owned(),
            node_type: Some(n.node_type),
        })
        .collect();

    let links: Vec<SankeyLink> = snapshot
        .edges
        .iter()
        .map(|e| SankeyLink::new(e.source.clone(), e.target.clone(), e.call_count))
        .collect();

    let known: HashSet<&NodeId> = snapshot.nodes.iter().map(|n| &n.id).collect();
    let mut outgoing: HashMap<&NodeId, Vec<&NodeId>> = HashMap::new();
    for e in &snapshot.edges {
        if known.contains(&e.target) {
            outgoing.entry(&e.source).or_default().push(&e.target);
        }
    }

    let starts: Vec<&NodeId> = snapshot
        .nodes
        .iter()
        .filter(|n| n.node_type == NodeType::User)
        .map(|n| &n.id)
        .collect();

    let mut traces = Vec::with_capacity(config.num_traces);
    for i in 0..config.num_traces {
        let Some(&start) = starts.choose(rng) else {
            break;
        };
        let mut path = vec![start.clone()];
        let mut current = start;
        while path.len() < MAX_TRACE_LEN {
            let Some(&next) = outgoing.get(current).and_then(|targets| targets.choose(rng)) else {
                break;
            };
            path.push(next.clone());
            current = next;
        }
        traces.push(RawTrace {
            trace_id: format!("trace-{i:06}"),
            path,
        });
    }

    SankeyResponse {
        nodes: sankey_nodes,
        links,
        traces,
        ..SankeyResponse::default()
    }
}
