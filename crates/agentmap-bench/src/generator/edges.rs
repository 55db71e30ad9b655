//! Call edge builders.

use agentmap_core::{Edge, NodeId};
use rand::Rng;
use rand::rngs::StdRng;

/// Builds a call edge with random counts and latency.
///
/// `error_count` never exceeds a quarter of `call_count`.
pub fn build_call(rng: &mut StdRng, source: &NodeId, target: &NodeId, max_calls: u64) -> Edge {
    let calls = rng.gen_range(1..=max_calls.max(1));
    let mut edge = Edge::new(source.clone(), target.clone(), calls);
    edge.error_count = rng.gen_range(0..=calls / 4);
    if rng.gen_bool(0.8) {
        edge.avg_latency_ms = Some(rng.gen_range(5.0..2000.0));
    }
    edge
}

/// Builds a second record for an existing pair, as a backend emits when a
/// pair is aggregated across two time buckets.
pub fn build_duplicate(rng: &mut StdRng, original: &Edge, max_calls: u64) -> Edge {
    let mut dup = build_call(rng, &original.source, &original.target, max_calls);
    dup.id.clear();
    dup
}
