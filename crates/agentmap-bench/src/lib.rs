//! Execution topology generator and benchmark utilities for agentmap.
//!
//! This crate provides deterministic generation of realistic multi-agent
//! topology snapshots and Sankey responses for benchmarking and
//! property-based testing of `agentmap-core`.

use std::path::PathBuf;

pub mod correctness;
pub mod generator;

pub use generator::{GeneratorConfig, SizeTier, generate_sankey, generate_topology};

/// Returns the path where the huge-tier snapshot fixture is stored on disk.
///
/// The file lives under `target/bench-fixtures/huge.snapshot.json` so it is
/// automatically gitignored and shared between the generator binary and
/// the benchmark harness.
pub fn huge_fixture_path() -> PathBuf {
    let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest
        .join("..")
        .join("..")
        .join("target")
        .join("bench-fixtures")
        .join("huge.snapshot.json")
}
