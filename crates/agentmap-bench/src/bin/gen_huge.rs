//! Generates the huge-tier benchmark fixture to disk.
//!
//! Writes a topology snapshot to `target/bench-fixtures/` which is loaded by
//! `benches/huge_file.rs` at benchmark time.

use std::error::Error;
use std::fs;
use std::io::BufWriter;

use agentmap_bench::{SizeTier, generate_topology, huge_fixture_path};

fn main() -> Result<(), Box<dyn Error>> {
    let path = huge_fixture_path();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    eprintln!("Generating Huge tier (~100K nodes)...");
    let snapshot = generate_topology(&SizeTier::Huge.config(42));

    let node_count = snapshot.nodes.len();
    let edge_count = snapshot.edges.len();
    eprintln!("Generated {node_count} nodes, {edge_count} edge records");

    eprintln!("Writing JSON to {}...", path.display());
    let out = fs::File::create(&path)?;
    let writer = BufWriter::new(out);
    serde_json::to_writer(writer, &snapshot)?;

    let meta = fs::metadata(&path)?;
    #[allow(clippy::cast_precision_loss)]
    let size_mb = meta.len() as f64 / (1024.0 * 1024.0);
    eprintln!("JSON: {size_mb:.1} MB");

    Ok(())
}
