//! Shared test helper functions for constructing test fixtures.
//!
//! This module is compiled only in test builds and provides common constructors
//! for [`Node`], [`Edge`], and built [`TopologyModel`]s used across unit test
//! modules throughout `agentmap-core`.
//!
//! Integration tests in `crates/agentmap-core/tests/` define their own local
//! helpers because they link against the non-test library build where this
//! module is not available.
#![allow(clippy::expect_used)]

use crate::enums::NodeType;
use crate::graph::{TopologyModel, build_topology};
use crate::newtypes::NodeId;
use crate::structures::{Edge, Node};

/// Creates a [`NodeId`] from a string slice, panicking on invalid input.
pub fn node_id(s: &str) -> NodeId {
    NodeId::try_from(s).expect("valid NodeId")
}

/// Creates a node of the given type whose label equals its id.
pub fn typed_node(id: &str, node_type: NodeType) -> Node {
    Node::new(node_id(id), node_type, id)
}

/// Creates an agent [`Node`].
pub fn agent(id: &str) -> Node {
    typed_node(id, NodeType::Agent)
}

/// Creates a user [`Node`].
pub fn user(id: &str) -> Node {
    typed_node(id, NodeType::User)
}

/// Creates a tool [`Node`].
pub fn tool(id: &str) -> Node {
    typed_node(id, NodeType::Tool)
}

/// Creates an LLM [`Node`].
pub fn llm(id: &str) -> Node {
    typed_node(id, NodeType::Llm)
}

/// Creates an [`Edge`] with the canonical id and the given call count.
pub fn edge(source: &str, target: &str, calls: u64) -> Edge {
    Edge::new(node_id(source), node_id(target), calls)
}

/// Creates one agent node per id and a single-call edge per `(source, target)`
/// pair, then builds the model.
pub fn agents_graph(ids: &[&str], pairs: &[(&str, &str)]) -> TopologyModel {
    let nodes = ids.iter().map(|id| agent(id)).collect();
    let edges = pairs.iter().map(|(s, t)| edge(s, t, 1)).collect();
    build_topology(nodes, edges)
}

/// `A(agent) -> B(tool) -> C(llm)`.
pub fn chain_abc() -> TopologyModel {
    build_topology(
        vec![agent("A"), tool("B"), llm("C")],
        vec![edge("A", "B", 1), edge("B", "C", 1)],
    )
}

/// `A -> B -> C -> A`, all agents.
pub fn cycle_abc() -> TopologyModel {
    agents_graph(&["A", "B", "C"], &[("A", "B"), ("B", "C"), ("C", "A")])
}

