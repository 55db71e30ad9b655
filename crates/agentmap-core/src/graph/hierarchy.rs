/// Disclosure hierarchy: one canonical parent per node.
///
/// The raw call graph is a general graph; a node may be called from several
/// agents. Progressive expand/collapse needs a tree, so [`build_hierarchy`]
/// flattens the forward subgraph into a forest by keeping, for every node,
/// only the edge that first discovers it in a breadth-first traversal from the
/// roots. Other forward edges into the node remain in the rendered edge set;
/// they just do not make the node a child.
///
/// # Traversal order
///
/// BFS runs level by level. Within a level, the forward out-edges of every
/// frontier node are gathered and processed in input edge order, so when two
/// nodes of the same level both call `X`, the earlier edge wins.
///
/// # Unreachable nodes
///
/// Nodes no root reaches over forward edges are promoted to roots (ascending
/// id) and recorded in [`Hierarchy::orphaned_ids`], so they are never
/// permanently hidden by collapse state.
use std::collections::{BTreeMap, HashSet, VecDeque};

use petgraph::stable_graph::NodeIndex;
use serde::Serialize;

use crate::graph::TopologyModel;
use crate::graph::classify::{EdgeClassification, EdgeKind};
use crate::newtypes::NodeId;

/// Forest over the nodes of a [`TopologyModel`].
///
/// Invariant: following `parent_of` from any node terminates at a root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hierarchy {
    /// Canonical parent of every node; `None` for roots.
    pub parent_of: BTreeMap<NodeId, Option<NodeId>>,
    /// Roots in input order, followed by any promoted orphans.
    pub root_ids: Vec<NodeId>,
    /// Children of every node with at least one child, in discovery order.
    pub children_of: BTreeMap<NodeId, Vec<NodeId>>,
    /// Nodes promoted to roots because no root reached them.
    pub orphaned_ids: Vec<NodeId>,
    #[serde(skip)]
    depth: BTreeMap<NodeId, usize>,
}

impl Hierarchy {
    /// Returns `true` if `id` is part of the hierarchy.
    pub fn contains(&self, id: &str) -> bool {
        self.parent_of.contains_key(id)
    }

    /// Canonical parent of `id`; `None` for roots and unknown ids.
    pub fn parent_of(&self, id: &str) -> Option<&NodeId> {
        self.parent_of.get(id).and_then(Option::as_ref)
    }

    /// Returns `true` if `id` is a root.
    pub fn is_root(&self, id: &str) -> bool {
        matches!(self.parent_of.get(id), Some(None))
    }

    /// Children of `id` in discovery order. Unknown ids yield an empty slice.
    pub fn children(&self, id: &str) -> &[NodeId] {
        self.children_of.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns `true` if `id` has at least one child.
    pub fn has_children(&self, id: &str) -> bool {
        !self.children(id).is_empty()
    }

    /// Number of children of `id`; `0` for leaves and unknown ids.
    pub fn children_count(&self, id: &str) -> usize {
        self.children(id).len()
    }

    /// Distance from the root; roots are at depth 0.
    pub fn depth_of(&self, id: &str) -> Option<usize> {
        self.depth.get(id).copied()
    }

    /// Every node below `id`, breadth-first. `id` itself is excluded.
    pub fn descendants(&self, id: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut queue: VecDeque<&NodeId> = self.children(id).iter().collect();
        while let Some(next) = queue.pop_front() {
            out.push(next.clone());
            queue.extend(self.children(next));
        }
        out
    }

    /// `id` and its ancestors, from `id` up to its root. Empty for unknown ids.
    pub fn ancestors_inclusive(&self, id: &str) -> Vec<NodeId> {
        let Some((start, _)) = self.parent_of.get_key_value(id) else {
            return Vec::new();
        };
        let mut chain = vec![start.clone()];
        let mut current = start;
        // The forest invariant bounds this walk; the length guard keeps a
        // corrupted map from looping forever.
        while let Some(parent) = self.parent_of(current) {
            if chain.len() > self.parent_of.len() {
                break;
            }
            chain.push(parent.clone());
            current = parent;
        }
        chain
    }

    /// Every node that has children, in id order.
    pub fn expandable_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.children_of
            .iter()
            .filter(|(_, c)| !c.is_empty())
            .map(|(id, _)| id)
    }
}

/// Builds the disclosure hierarchy of `model` from its forward edges.
///
/// `classification` must come from [`crate::graph::classify_edges`] on the
/// same model. Roots are, in input order, every `user` node and every node
/// without an incoming forward edge.
///
/// Orphan promotion only fires for a classification whose forward edges
/// contain a cycle, which `classify_edges` never produces; it keeps every
/// node placed if the precondition is broken.
pub fn build_hierarchy(model: &TopologyModel, classification: &EdgeClassification) -> Hierarchy {
    let mut has_forward_in: HashSet<NodeIndex> = HashSet::new();
    for (position, edge) in model.edges().iter().enumerate() {
        if classification.kind_at(position) == Some(EdgeKind::Forward) {
            if let Some(idx) = model.node_index(&edge.target) {
                has_forward_in.insert(idx);
            }
        }
    }

    let roots: Vec<NodeIndex> = model
        .graph()
        .node_indices()
        .filter(|idx| {
            let is_entry = model
                .node_weight(*idx)
                .is_some_and(|w| w.node_type.is_entry_point());
            is_entry || !has_forward_in.contains(idx)
        })
        .collect();

    let mut builder = Builder {
        model,
        classification,
        parent_of: BTreeMap::new(),
        children_of: BTreeMap::new(),
        depth: BTreeMap::new(),
        root_ids: Vec::new(),
    };

    builder.run(roots);

    let mut unassigned: Vec<NodeId> = model
        .nodes()
        .iter()
        .filter(|n| !builder.parent_of.contains_key(&n.id))
        .map(|n| n.id.clone())
        .collect();
    unassigned.sort();

    let mut orphaned_ids = Vec::new();
    for id in unassigned {
        if builder.parent_of.contains_key(&id) {
            continue;
        }
        let Some(idx) = model.node_index(&id) else {
            continue;
        };
        tracing::warn!(node_id = %id, "node unreachable from any root; promoting to root");
        orphaned_ids.push(id);
        builder.run(vec![idx]);
    }

    tracing::debug!(
        roots = builder.root_ids.len(),
        orphans = orphaned_ids.len(),
        "built hierarchy"
    );

    Hierarchy {
        parent_of: builder.parent_of,
        root_ids: builder.root_ids,
        children_of: builder.children_of,
        orphaned_ids,
        depth: builder.depth,
    }
}

/// Mutable state of the level-synchronous BFS.
struct Builder<'a> {
    model: &'a TopologyModel,
    classification: &'a EdgeClassification,
    parent_of: BTreeMap<NodeId, Option<NodeId>>,
    children_of: BTreeMap<NodeId, Vec<NodeId>>,
    depth: BTreeMap<NodeId, usize>,
    root_ids: Vec<NodeId>,
}

impl Builder<'_> {
    fn id_of(&self, idx: NodeIndex) -> Option<NodeId> {
        self.model.node_weight(idx).map(|w| w.local_id.clone())
    }

    /// Registers `roots` and runs BFS from them over forward edges.
    fn run(&mut self, roots: Vec<NodeIndex>) {
        let mut frontier: Vec<NodeIndex> = Vec::with_capacity(roots.len());
        for idx in roots {
            let Some(id) = self.id_of(idx) else { continue };
            if self.parent_of.contains_key(&id) {
                continue;
            }
            self.parent_of.insert(id.clone(), None);
            self.depth.insert(id.clone(), 0);
            self.root_ids.push(id);
            frontier.push(idx);
        }

        let mut level = 0usize;
        while !frontier.is_empty() {
            let mut candidates: Vec<(usize, NodeIndex, NodeIndex)> = frontier
                .iter()
                .flat_map(|&parent| {
                    self.model
                        .out_edges(parent)
                        .into_iter()
                        .map(move |(position, child)| (position, parent, child))
                })
                .filter(|&(position, _, _)| {
                    self.classification.kind_at(position) == Some(EdgeKind::Forward)
                })
                .collect();
            candidates.sort_unstable_by_key(|&(position, _, _)| position);

            level += 1;
            let mut next: Vec<NodeIndex> = Vec::new();
            for (_, parent, child) in candidates {
                let (Some(parent_id), Some(child_id)) = (self.id_of(parent), self.id_of(child))
                else {
                    continue;
                };
                if self.parent_of.contains_key(&child_id) {
                    continue;
                }
                self.parent_of.insert(child_id.clone(), Some(parent_id.clone()));
                self.depth.insert(child_id.clone(), level);
                self.children_of.entry(parent_id).or_default().push(child_id);
                next.push(child);
            }
            frontier = next;
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::graph::{build_topology, classify_edges};
    use crate::test_helpers::{agent, agents_graph, chain_abc, cycle_abc, edge, node_id, user};

    fn hierarchy_of(model: &TopologyModel) -> Hierarchy {
        build_hierarchy(model, &classify_edges(model))
    }

    /// Chain `A -> B -> C` becomes a single path rooted at A.
    #[test]
    fn test_chain_hierarchy() {
        let h = hierarchy_of(&chain_abc());
        assert_eq!(h.root_ids, vec![node_id("A")]);
        assert_eq!(h.parent_of("B"), Some(&node_id("A")));
        assert_eq!(h.parent_of("C"), Some(&node_id("B")));
        assert_eq!(h.parent_of("A"), None);
        assert!(h.is_root("A"));
        assert!(h.has_children("A"));
        assert!(!h.has_children("C"));
        assert_eq!(h.depth_of("C"), Some(2));
    }

    /// The 3-cycle is rooted at A; the back edge does not create a parent.
    #[test]
    fn test_cycle_hierarchy_is_a_tree() {
        let h = hierarchy_of(&cycle_abc());
        assert_eq!(h.root_ids, vec![node_id("A")]);
        assert_eq!(h.parent_of("A"), None);
        assert_eq!(h.parent_of("C"), Some(&node_id("B")));
    }

    /// A node called from two agents keeps only the first-discovered parent.
    #[test]
    fn test_multi_parent_keeps_first_discovered() {
        // root -> p1, root -> p2, p2 -> shared, p1 -> shared
        // p1 and p2 are on the same level; edge p2->shared comes first in input.
        let m = agents_graph(
            &["root", "p1", "p2", "shared"],
            &[
                ("root", "p1"),
                ("root", "p2"),
                ("p2", "shared"),
                ("p1", "shared"),
            ],
        );
        let h = hierarchy_of(&m);
        assert_eq!(h.parent_of("shared"), Some(&node_id("p2")));
        assert_eq!(h.children_count("p1"), 0);
        assert_eq!(h.children_count("p2"), 1);
    }

    /// A shallower path wins over an earlier edge from a deeper level.
    #[test]
    fn test_bfs_prefers_shallower_parent() {
        // deep -> x appears first in input but `deep` is at level 2.
        let m = agents_graph(
            &["r", "mid", "deep", "x"],
            &[("deep", "x"), ("r", "mid"), ("mid", "deep"), ("r", "x")],
        );
        let h = hierarchy_of(&m);
        assert_eq!(h.parent_of("x"), Some(&node_id("r")));
        assert_eq!(h.children("r"), &[node_id("mid"), node_id("x")]);
    }

    /// Users are roots even when an agent calls back into them.
    #[test]
    fn test_user_is_always_root() {
        let m = build_topology(
            vec![agent("a"), user("u")],
            vec![edge("u", "a", 1), edge("a", "u", 1)],
        );
        let h = hierarchy_of(&m);
        assert_eq!(h.root_ids, vec![node_id("u")]);
        assert!(h.is_root("u"));
        assert_eq!(h.parent_of("a"), Some(&node_id("u")));
    }

    /// A user with an incoming forward edge stays a root and gets no parent.
    #[test]
    fn test_user_with_forward_caller_is_still_root() {
        // agent a (seed) -> user u ; u has an incoming forward edge.
        let m = build_topology(vec![agent("a"), user("u")], vec![edge("a", "u", 1)]);
        let h = hierarchy_of(&m);
        assert_eq!(h.root_ids, vec![node_id("a"), node_id("u")]);
        assert_eq!(h.parent_of("u"), None);
        assert!(!h.has_children("a"));
    }

    /// Every node gets exactly one entry and the parent chain always ends.
    #[test]
    fn test_parent_of_is_a_forest() {
        let m = agents_graph(
            &["A", "B", "C", "D", "E"],
            &[
                ("A", "B"),
                ("B", "C"),
                ("C", "A"),
                ("C", "D"),
                ("D", "B"),
                ("E", "E"),
            ],
        );
        let h = hierarchy_of(&m);
        assert_eq!(h.parent_of.len(), 5);
        for n in m.nodes() {
            let chain = h.ancestors_inclusive(&n.id);
            let root = chain.last().expect("non-empty chain");
            assert!(h.is_root(root), "chain of {} must end at a root", n.id);
        }
    }

    /// Descendants are listed breadth-first.
    #[test]
    fn test_descendants_breadth_first() {
        let m = agents_graph(
            &["r", "a", "b", "a1", "b1"],
            &[("r", "a"), ("r", "b"), ("a", "a1"), ("b", "b1")],
        );
        let h = hierarchy_of(&m);
        let d: Vec<String> = h.descendants("r").iter().map(ToString::to_string).collect();
        assert_eq!(d, vec!["a", "b", "a1", "b1"]);
        assert!(h.descendants("b1").is_empty());
    }

    /// Unknown ids are answered with empty/false/None.
    #[test]
    fn test_unknown_ids_are_total() {
        let h = hierarchy_of(&chain_abc());
        assert!(!h.has_children("ghost"));
        assert_eq!(h.children_count("ghost"), 0);
        assert!(h.parent_of("ghost").is_none());
        assert!(h.depth_of("ghost").is_none());
        assert!(h.ancestors_inclusive("ghost").is_empty());
        assert!(!h.contains("ghost"));
    }

    /// Empty model, empty hierarchy.
    #[test]
    fn test_empty_model() {
        let h = hierarchy_of(&build_topology(vec![], vec![]));
        assert!(h.root_ids.is_empty());
        assert!(h.parent_of.is_empty());
        assert!(h.orphaned_ids.is_empty());
    }

    /// A classification that marks nothing forward makes every node a root.
    #[test]
    fn test_no_forward_edges_means_all_roots() {
        let m = chain_abc();
        let c = EdgeClassification::from_kinds(vec![EdgeKind::Back; m.edge_count()]);
        let h = build_hierarchy(&m, &c);
        assert_eq!(h.root_ids, vec![node_id("A"), node_id("B"), node_id("C")]);
        assert!(h.orphaned_ids.is_empty());
    }

    /// Nodes whose every caller is itself unreachable are promoted to roots
    /// in ascending id order, and their own subtrees are still built.
    #[test]
    fn test_unreachable_nodes_are_promoted() {
        // Y <-> Z with both edges forward: neither is a root, X reaches neither.
        let m = agents_graph(&["X", "Z", "Y"], &[("Y", "Z"), ("Z", "Y")]);
        let both_forward = EdgeClassification::from_kinds(vec![EdgeKind::Forward; 2]);
        let h = build_hierarchy(&m, &both_forward);
        assert_eq!(h.orphaned_ids, vec![node_id("Y")]);
        assert_eq!(h.root_ids, vec![node_id("X"), node_id("Y")]);
        assert_eq!(h.parent_of("Z"), Some(&node_id("Y")));
        assert_eq!(h.parent_of.len(), 3);
    }

    /// Building twice yields equal hierarchies.
    #[test]
    fn test_hierarchy_is_idempotent() {
        let m = cycle_abc();
        assert_eq!(hierarchy_of(&m), hierarchy_of(&m));
    }

    /// Expandable ids are exactly the nodes with children.
    #[test]
    fn test_expandable_ids() {
        let h = hierarchy_of(&chain_abc());
        let ids: Vec<&str> = h.expandable_ids().map(NodeId::as_str).collect();
        assert_eq!(ids, vec!["A", "B"]);
    }
}
