//! Execution topology generator.
//!
//! Produces [`TopologySnapshot`] instances shaped like real multi-agent runs:
//! users call top-level agents, agents delegate through layers of sub-agents,
//! and every agent fans out to tools and models. Retry loops, duplicate edge
//! records and dangling edges are injected at configurable rates so the
//! normalisation and cycle handling paths are exercised.

pub mod edges;
pub mod nodes;
pub mod topology;

use agentmap_core::{SankeyResponse, TopologySnapshot};
use rand::SeedableRng;
use rand::rngs::StdRng;

use topology::{build_sankey, build_snapshot};

/// Configuration for the topology generator.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Seed for the random number generator (deterministic).
    pub seed: u64,
    /// Number of user nodes.
    pub num_users: usize,
    /// Number of top-level agent nodes.
    pub num_agents: usize,
    /// Number of sub-agent nodes, spread over `delegation_depth` layers.
    pub num_sub_agents: usize,
    /// Number of tool nodes.
    pub num_tools: usize,
    /// Number of LLM nodes.
    pub num_llms: usize,
    /// Number of sub-agent layers below the top-level agents.
    pub delegation_depth: usize,
    /// Extra callees per agent or sub-agent, beyond the delegation tree.
    pub fan_out: usize,
    /// Probability that a call gets a callback edge closing a retry loop (0.0-1.0).
    pub retry_density: f64,
    /// Probability that an edge record is emitted twice (0.0-1.0).
    pub duplicate_rate: f64,
    /// Number of edges pointing at ids absent from the snapshot.
    pub num_dangling_edges: usize,
    /// Upper bound on per-edge call counts.
    pub max_calls: u64,
    /// Number of raw traces in generated Sankey responses.
    pub num_traces: usize,
}

/// Predefined size tiers for benchmarking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeTier {
    /// ~50 nodes, ~150 edges
    Small,
    /// ~500 nodes, ~1500 edges
    Medium,
    /// ~2000 nodes, ~6000 edges
    Large,
    /// ~5000 nodes, ~15000 edges
    XLarge,
    /// ~100K nodes, generated to disk by `gen-huge`
    Huge,
}

impl SizeTier {
    /// Returns the default `GeneratorConfig` for this size tier.
    pub fn config(self, seed: u64) -> GeneratorConfig {
        match self {
            SizeTier::Small => GeneratorConfig {
                seed,
                num_users: 2,
                num_agents: 4,
                num_sub_agents: 12,
                num_tools: 20,
                num_llms: 8,
                delegation_depth: 2,
                fan_out: 3,
                retry_density: 0.1,
                duplicate_rate: 0.05,
                num_dangling_edges: 2,
                max_calls: 50,
                num_traces: 20,
            },
            SizeTier::Medium => GeneratorConfig {
                seed,
                num_users: 10,
                num_agents: 40,
                num_sub_agents: 150,
                num_tools: 220,
                num_llms: 80,
                delegation_depth: 3,
                fan_out: 3,
                retry_density: 0.1,
                duplicate_rate: 0.05,
                num_dangling_edges: 10,
                max_calls: 200,
                num_traces: 200,
            },
            SizeTier::Large => GeneratorConfig {
                seed,
                num_users: 40,
                num_agents: 160,
                num_sub_agents: 600,
                num_tools: 900,
                num_llms: 300,
                delegation_depth: 4,
                fan_out: 3,
                retry_density: 0.1,
                duplicate_rate: 0.05,
                num_dangling_edges: 40,
                max_calls: 500,
                num_traces: 800,
            },
            SizeTier::XLarge => GeneratorConfig {
                seed,
                num_users: 100,
                num_agents: 400,
                num_sub_agents: 1500,
                num_tools: 2250,
                num_llms: 750,
                delegation_depth: 5,
                fan_out: 3,
                retry_density: 0.12,
                duplicate_rate: 0.05,
                num_dangling_edges: 100,
                max_calls: 1000,
                num_traces: 2000,
            },
            SizeTier::Huge => GeneratorConfig {
                seed,
                num_users: 2000,
                num_agents: 8000,
                num_sub_agents: 30000,
                num_tools: 45000,
                num_llms: 15000,
                delegation_depth: 6,
                fan_out: 3,
                retry_density: 0.12,
                duplicate_rate: 0.05,
                num_dangling_edges: 2000,
                max_calls: 5000,
                num_traces: 20000,
            },
        }
    }
}

/// Generates a topology snapshot from the given configuration.
///
/// All randomness is deterministic, seeded from `config.seed`.
pub fn generate_topology(config: &GeneratorConfig) -> TopologySnapshot {
    let mut rng = StdRng::seed_from_u64(config.seed);
    build_snapshot(config, &mut rng)
}

/// Generates a Sankey response whose links mirror the topology generated for
/// the same configuration, plus `config.num_traces` random-walk traces.
pub fn generate_sankey(config: &GeneratorConfig) -> SankeyResponse {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let snapshot = build_snapshot(config, &mut rng);
    build_sankey(config, &snapshot, &mut rng)
}
