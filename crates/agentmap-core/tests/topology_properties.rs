//! Property-based tests for the topology analysis pipeline.
//!
//! Random graphs of 1-10 nodes and up to 40 raw edges, including self-loops,
//! duplicate pairs and edges that name missing nodes, are pushed through
//! classification, hierarchy, visibility, path highlighting and the Sankey
//! projection. Each property is an invariant the renderer relies on.
#![allow(clippy::expect_used)]

use std::collections::{BTreeSet, HashSet};

use agentmap_core::{
    Edge, ExpansionState, Node, NodeId, NodeType, SankeyResponse, TopologyModel, build_hierarchy,
    build_topology, classify_edges, compute_path, remove_cyclic_links, sankey_from_topology,
    visible_graph,
};
use petgraph::algo::{has_path_connecting, is_cyclic_directed};
use petgraph::graphmap::DiGraphMap;
use proptest::prelude::*;

fn nid(s: &str) -> NodeId {
    NodeId::try_from(s).expect("valid NodeId")
}

fn arb_node_type() -> impl Strategy<Value = NodeType> {
    prop::sample::select(NodeType::ALL.to_vec())
}

/// Nodes `n0..n{k}` with random types, and raw edges whose endpoints are drawn
/// from `0..=k`, so index `k` names a node that does not exist.
fn arb_topology() -> impl Strategy<Value = (Vec<Node>, Vec<Edge>)> {
    (1usize..=10)
        .prop_flat_map(|node_count| {
            let types = prop::collection::vec(arb_node_type(), node_count);
            let edges = prop::collection::vec(
                (0usize..=node_count, 0usize..=node_count, 1u64..5),
                0..=40,
            );
            (types, edges)
        })
        .prop_map(|(types, raw_edges)| {
            let nodes = types
                .into_iter()
                .enumerate()
                .map(|(i, t)| Node::new(nid(&format!("n{i}")), t, format!("node {i}")))
                .collect();
            let edges = raw_edges
                .into_iter()
                .map(|(s, t, calls)| {
                    Edge::new(nid(&format!("n{s}")), nid(&format!("n{t}")), calls)
                })
                .collect();
            (nodes, edges)
        })
}

fn model_of((nodes, edges): (Vec<Node>, Vec<Edge>)) -> TopologyModel {
    build_topology(nodes, edges)
}

/// Directed graph over the given edges, with every model node present.
fn graph_of<'a>(model: &'a TopologyModel, edges: &[&'a Edge]) -> DiGraphMap<&'a str, ()> {
    let mut g = DiGraphMap::new();
    for n in model.nodes() {
        g.add_node(n.id.as_str());
    }
    for e in edges {
        g.add_edge(e.source.as_str(), e.target.as_str(), ());
    }
    g
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The forward subgraph never contains a cycle.
    #[test]
    fn forward_edges_are_acyclic(topology in arb_topology()) {
        let model = model_of(topology);
        let c = classify_edges(&model);
        let forward = c.forward_edges_of(&model);
        prop_assert!(!is_cyclic_directed(&graph_of(&model, &forward)));
    }

    /// Every back edge closes a cycle: its target reaches its source along
    /// forward edges.
    #[test]
    fn back_edges_close_cycles(topology in arb_topology()) {
        let model = model_of(topology);
        let c = classify_edges(&model);
        let forward = graph_of(&model, &c.forward_edges_of(&model));
        for e in c.back_edges_of(&model) {
            prop_assert!(
                has_path_connecting(&forward, e.target.as_str(), e.source.as_str(), None),
                "back edge {} does not close a cycle", e.id
            );
        }
        let all: Vec<_> = model.edges().iter().collect();
        let has_cycle = is_cyclic_directed(&graph_of(&model, &all));
        prop_assert_eq!(c.has_cycles(), has_cycle);
    }

    /// Forward and back edges partition the model's edges; self-loops are back edges.
    #[test]
    fn classification_partitions_edges(topology in arb_topology()) {
        let model = model_of(topology);
        let c = classify_edges(&model);
        prop_assert_eq!(c.forward_edge_count() + c.back_edge_count(), model.edge_count());
        for e in model.edges() {
            if e.is_self_loop() {
                prop_assert!(c.is_back_edge(&e.source, &e.target));
            }
        }
    }

    /// The hierarchy is a forest covering every node, and roots highlight
    /// only themselves.
    #[test]
    fn hierarchy_is_a_covering_forest(topology in arb_topology()) {
        let model = model_of(topology);
        let h = build_hierarchy(&model, &classify_edges(&model));
        prop_assert_eq!(h.parent_of.len(), model.node_count());

        let unique_roots: HashSet<&NodeId> = h.root_ids.iter().collect();
        prop_assert_eq!(unique_roots.len(), h.root_ids.len());

        for n in model.nodes() {
            let chain = h.ancestors_inclusive(&n.id);
            let top = chain.last().expect("chain contains the node itself");
            prop_assert!(h.is_root(top));
            if n.node_type == NodeType::User {
                prop_assert!(h.is_root(&n.id));
            }
        }
        for r in &h.root_ids {
            let p = compute_path(&h, Some(r.as_str()));
            prop_assert_eq!(p.chain.clone(), vec![r.clone()]);
        }
    }

    /// Nothing expanded shows exactly the roots; everything expanded shows
    /// the whole model.
    #[test]
    fn visibility_extremes(topology in arb_topology()) {
        let model = model_of(topology);
        let c = classify_edges(&model);
        let h = build_hierarchy(&model, &c);

        let collapsed = visible_graph(&model, &c, &h, &ExpansionState::new());
        let visible: BTreeSet<&NodeId> = collapsed.nodes.iter().map(|n| &n.id).collect();
        let roots: BTreeSet<&NodeId> = h.root_ids.iter().collect();
        prop_assert_eq!(visible, roots);

        let all_ids: ExpansionState = model.nodes().iter().map(|n| n.id.clone()).collect();
        let full = visible_graph(&model, &c, &h, &all_ids);
        prop_assert_eq!(full.node_count(), model.node_count());
        prop_assert_eq!(full.edge_count(), model.edge_count());
        prop_assert_eq!(full.back_edges.len(), c.back_edge_count());
        prop_assert!(full.hidden_child_counts.is_empty());

        let expand_all = visible_graph(&model, &c, &h, &ExpansionState::expand_all(&h));
        prop_assert_eq!(expand_all, full);
    }

    /// The Sankey projection is acyclic and only drops links that lie on a
    /// cycle of the input.
    #[test]
    fn sankey_projection_is_acyclic(topology in arb_topology()) {
        let model = model_of(topology);
        let response: SankeyResponse = sankey_from_topology(&model);
        let projection = remove_cyclic_links(&response);

        let mut kept: DiGraphMap<&str, ()> = DiGraphMap::new();
        for l in &projection.links {
            kept.add_edge(l.source.as_str(), l.target.as_str(), ());
        }
        prop_assert!(!is_cyclic_directed(&kept));

        let original = graph_of(&model, &model.edges().iter().collect::<Vec<_>>());
        for l in &projection.dropped_links {
            let closes =
                has_path_connecting(&original, l.target.as_str(), l.source.as_str(), None);
            prop_assert!(closes);
        }
        prop_assert_eq!(
            projection.links.len() + projection.dropped_links.len(),
            response.links.len()
        );
    }

    /// Every stage returns equal results for equal inputs.
    #[test]
    fn pipeline_is_idempotent(topology in arb_topology()) {
        let a = model_of(topology.clone());
        let b = model_of(topology);
        let ca = classify_edges(&a);
        prop_assert_eq!(&ca, &classify_edges(&b));
        let ha = build_hierarchy(&a, &ca);
        prop_assert_eq!(&ha, &build_hierarchy(&b, &ca));
        let state = ExpansionState::expand_all(&ha);
        prop_assert_eq!(
            visible_graph(&a, &ca, &ha, &state),
            visible_graph(&b, &ca, &ha, &state)
        );
        prop_assert_eq!(
            remove_cyclic_links(&sankey_from_topology(&a)),
            remove_cyclic_links(&sankey_from_topology(&b))
        );
    }
}

/// Fixed-case checks of the worked scenarios through the public API only.
#[test]
fn duplicate_edges_merge_into_one() {
    let model = build_topology(
        vec![
            Node::new(nid("A"), NodeType::Agent, "A"),
            Node::new(nid("B"), NodeType::Tool, "B"),
        ],
        vec![Edge::new(nid("A"), nid("B"), 3), Edge::new(nid("A"), nid("B"), 2)],
    );
    assert_eq!(model.edge_count(), 1);
    assert_eq!(model.edges()[0].call_count, 5);
    assert_eq!(model.edges()[0].id, "A->B");
}
