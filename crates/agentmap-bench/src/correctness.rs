//! Post-operation invariant checkers for correctness validation.

use std::collections::HashSet;

use agentmap_core::{
    EdgeClassification, ExpansionState, Hierarchy, SankeyProjection, TopologyModel,
    TopologySnapshot, VisibleGraph,
};
use petgraph::algo::is_cyclic_directed;
use petgraph::graphmap::DiGraphMap;

/// Verifies model construction invariants:
/// - every kept edge has both endpoints in the model
/// - no `(source, target)` pair appears twice
/// - kept + dropped + merged edges account for every input record
pub fn check_model_invariants(
    snapshot: &TopologySnapshot,
    model: &TopologyModel,
) -> Result<(), String> {
    let diagnostics = model.diagnostics();
    if model.node_count() + diagnostics.duplicate_node_ids.len() != snapshot.nodes.len() {
        return Err(format!(
            "node accounting: kept({}) + duplicates({}) != input({})",
            model.node_count(),
            diagnostics.duplicate_node_ids.len(),
            snapshot.nodes.len()
        ));
    }

    let mut pairs: HashSet<(&str, &str)> = HashSet::new();
    for edge in model.edges() {
        if !model.contains(&edge.source) || !model.contains(&edge.target) {
            return Err(format!("edge {} has an unknown endpoint", edge.id));
        }
        if !pairs.insert((edge.source.as_str(), edge.target.as_str())) {
            return Err(format!("edge {} appears twice", edge.id));
        }
    }

    let accounted = model.edge_count() + diagnostics.dropped_edges.len() + diagnostics.merged_edges;
    let input = snapshot.edges.len() + snapshot.rejected_edges.len();
    if accounted != input {
        return Err(format!(
            "edge accounting: kept + dropped + merged = {accounted}, input = {input}"
        ));
    }
    Ok(())
}

/// Verifies that the classification partitions the edges and that the
/// forward subgraph is acyclic.
pub fn check_classification(
    model: &TopologyModel,
    classification: &EdgeClassification,
) -> Result<(), String> {
    let total = classification.forward_edge_count() + classification.back_edge_count();
    if total != model.edge_count() {
        return Err(format!(
            "classification covers {total} edges, model has {}",
            model.edge_count()
        ));
    }

    let mut forward: DiGraphMap<&str, ()> = DiGraphMap::new();
    for node in model.nodes() {
        forward.add_node(node.id.as_str());
    }
    for edge in classification.forward_edges_of(model) {
        forward.add_edge(edge.source.as_str(), edge.target.as_str(), ());
    }
    if is_cyclic_directed(&forward) {
        return Err("forward edges contain a cycle".to_owned());
    }

    for edge in classification.back_edges_of(model) {
        if !classification.is_back_edge(&edge.source, &edge.target) {
            return Err(format!("back edge {} missing from pair index", edge.id));
        }
    }
    Ok(())
}

/// Verifies hierarchy invariants:
/// - every model node has exactly one entry in `parent_of`
/// - roots have no parent and every parent chain reaches a root
/// - `children_of` mirrors `parent_of`
pub fn check_hierarchy(model: &TopologyModel, hierarchy: &Hierarchy) -> Result<(), String> {
    if hierarchy.parent_of.len() != model.node_count() {
        return Err(format!(
            "hierarchy covers {} nodes, model has {}",
            hierarchy.parent_of.len(),
            model.node_count()
        ));
    }

    for root in &hierarchy.root_ids {
        if hierarchy.parent_of(root).is_some() {
            return Err(format!("root {root} has a parent"));
        }
    }

    for node in model.nodes() {
        let mut current = &node.id;
        let mut steps = 0usize;
        while let Some(parent) = hierarchy.parent_of(current) {
            if !hierarchy.children(parent).contains(current) {
                return Err(format!("{current} missing from children of {parent}"));
            }
            current = parent;
            steps += 1;
            if steps > model.node_count() {
                return Err(format!("parent chain from {} does not terminate", node.id));
            }
        }
        if !hierarchy.is_root(current) {
            return Err(format!("chain from {} ends at non-root {current}", node.id));
        }
    }
    Ok(())
}

/// Verifies visibility invariants:
/// - roots are always visible
/// - every visible edge has both endpoints visible
/// - a fully expanded state shows every node and edge
pub fn check_visible(
    model: &TopologyModel,
    hierarchy: &Hierarchy,
    expanded: &ExpansionState,
    visible: &VisibleGraph,
) -> Result<(), String> {
    let shown: HashSet<&str> = visible.nodes.iter().map(|n| n.id.as_str()).collect();
    for root in &hierarchy.root_ids {
        if !shown.contains(root.as_str()) {
            return Err(format!("root {root} is not visible"));
        }
    }
    for edge in visible.dag_edges.iter().chain(&visible.back_edges) {
        if !shown.contains(edge.source.as_str()) || !shown.contains(edge.target.as_str()) {
            return Err(format!("visible edge {} has a hidden endpoint", edge.id));
        }
    }

    let all_expanded = hierarchy.expandable_ids().all(|id| expanded.is_expanded(id));
    let full = visible.node_count() == model.node_count()
        && visible.edge_count() == model.edge_count();
    if all_expanded && !full {
        return Err(format!(
            "fully expanded state shows {}/{} nodes and {}/{} edges",
            visible.node_count(),
            model.node_count(),
            visible.edge_count(),
            model.edge_count()
        ));
    }
    Ok(())
}

/// Verifies that projected Sankey links contain no cycle or self-link.
pub fn check_sankey_acyclic(projection: &SankeyProjection) -> Result<(), String> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for link in &projection.links {
        if link.source == link.target {
            return Err(format!("self-link on {}", link.source));
        }
        graph.add_edge(link.source.as_str(), link.target.as_str(), ());
    }
    if is_cyclic_directed(&graph) {
        return Err("kept sankey links contain a cycle".to_owned());
    }
    Ok(())
}
