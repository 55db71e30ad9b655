//! Node builders for the five execution roles.

use agentmap_core::{Node, NodeId, NodeMetrics, NodeType};
use rand::Rng;
use rand::rngs::StdRng;

const USER_NAMES: &[&str] = &["Alice", "Bob", "Carol", "Dmitri", "Eun-ji", "Farah", "Gustavo"];

const AGENT_NAMES: &[&str] = &[
    "Planner",
    "Orchestrator",
    "Triage",
    "Support Desk",
    "Release Manager",
    "Data Steward",
];

const SUB_AGENT_NAMES: &[&str] = &[
    "Researcher",
    "Writer",
    "Critic",
    "Coder",
    "Reviewer",
    "Summariser",
    "Translator",
];

const TOOL_NAMES: &[&str] = &[
    "web_search",
    "sql_query",
    "http_get",
    "file_read",
    "file_write",
    "run_tests",
    "send_email",
    "vector_lookup",
];

const MODEL_NAMES: &[&str] = &[
    "gpt-4o",
    "gpt-4o-mini",
    "claude-sonnet",
    "claude-haiku",
    "llama-3-70b",
    "mistral-large",
];

/// Id prefix for generated nodes of `node_type`.
pub fn prefix(node_type: NodeType) -> &'static str {
    match node_type {
        NodeType::User => "user",
        NodeType::Agent => "agent",
        NodeType::SubAgent => "sub",
        NodeType::Tool => "tool",
        NodeType::Llm => "llm",
    }
}

/// Returns the id `"{prefix}-{index:06}"`.
pub fn node_id(prefix: &str, index: usize) -> NodeId {
    let s = format!("{prefix}-{index:06}");
    NodeId::try_from(s.as_str()).unwrap_or_else(|_| unreachable!())
}

fn pick<'a>(rng: &mut StdRng, pool: &[&'a str]) -> &'a str {
    pool.get(rng.gen_range(0..pool.len())).copied().unwrap_or("node")
}

/// Builds a node of `node_type` with a pooled label and plausible metrics.
pub fn build_node(rng: &mut StdRng, node_type: NodeType, index: usize) -> Node {
    let pool = match node_type {
        NodeType::User => USER_NAMES,
        NodeType::Agent => AGENT_NAMES,
        NodeType::SubAgent => SUB_AGENT_NAMES,
        NodeType::Tool => TOOL_NAMES,
        NodeType::Llm => MODEL_NAMES,
    };
    let label = format!("{} {index}", pick(rng, pool));
    let mut node = Node::new(node_id(prefix(node_type), index), node_type, label);
    node.metrics = build_metrics(rng, node_type);
    node
}

fn build_metrics(rng: &mut StdRng, node_type: NodeType) -> NodeMetrics {
    let calls: u64 = rng.gen_range(1..=500);
    let mut metrics = NodeMetrics {
        call_count: Some(calls),
        error_count: Some(rng.gen_range(0..=calls / 10)),
        avg_latency_ms: Some(rng.gen_range(2.0..4000.0)),
        ..NodeMetrics::default()
    };
    match node_type {
        NodeType::Llm => {
            let tokens = calls * rng.gen_range(200..4000);
            metrics.total_tokens = Some(tokens);
            #[allow(clippy::cast_precision_loss)]
            let cost = tokens as f64 * 0.000_002;
            metrics.total_cost = Some(cost);
        }
        NodeType::User => {
            metrics.avg_latency_ms = None;
        }
        NodeType::Agent | NodeType::SubAgent | NodeType::Tool => {}
    }
    metrics
}
