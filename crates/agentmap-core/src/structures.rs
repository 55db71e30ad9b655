//! Node and Edge structs for the execution-topology data model.
//!
//! These mirror the JSON delivered by the graph-snapshot backend (camelCase
//! keys). Metrics are pre-aggregated upstream and carried through untouched;
//! the only arithmetic performed here is the duplicate-edge merge in
//! [`Edge::absorb`].
//!
//! Key design decisions:
//! - `Edge::id` is optional on the wire. The topology model always rewrites it
//!   to the canonical `"source->target"` key, because the endpoint pair is the
//!   edge identity.
//! - `#[serde(flatten)] pub extra` on [`NodeMetrics`] preserves metric keys this
//!   crate does not know about across round trips.
mod edge;
mod node;

pub use edge::Edge;
pub use node::{Node, NodeMetrics};
