//! One-snapshot analysis bundle.
//!
//! [`TopologyAnalysis`] holds every stage that depends only on `(nodes,
//! edges)`: the model, its edge classification and its hierarchy. Stages that
//! also depend on UI state (expansion, selection) are methods, so a caller
//! recomputes only those when the state changes.
//!
//! [`AnalysisCache`] keeps the most recent analysis keyed by its snapshot
//! fingerprint, for callers that receive the same snapshot repeatedly.
use crate::fingerprint::snapshot_fingerprint;
use crate::graph::{
    EdgeClassification, ExpansionState, Hierarchy, HighlightPath, TopologyModel, VisibleGraph,
    build_hierarchy, classify_edges, compute_path, visible_graph,
};
use crate::sankey::{SankeyProjection, remove_cyclic_links, sankey_from_topology};
use crate::snapshot::TopologySnapshot;

/// Model, classification and hierarchy of one snapshot.
#[derive(Debug, Clone)]
pub struct TopologyAnalysis {
    model: TopologyModel,
    classification: EdgeClassification,
    hierarchy: Hierarchy,
}

impl TopologyAnalysis {
    /// Runs classification and hierarchy construction over `model`.
    pub fn new(model: TopologyModel) -> Self {
        let classification = classify_edges(&model);
        let hierarchy = build_hierarchy(&model, &classification);
        Self {
            model,
            classification,
            hierarchy,
        }
    }

    /// Builds the model from `snapshot` and analyses it.
    pub fn from_snapshot(snapshot: TopologySnapshot) -> Self {
        Self::new(TopologyModel::from_snapshot(snapshot))
    }

    /// The normalised model.
    pub fn model(&self) -> &TopologyModel {
        &self.model
    }

    /// Forward/back split of the model's edges.
    pub fn classification(&self) -> &EdgeClassification {
        &self.classification
    }

    /// Canonical disclosure hierarchy over forward edges.
    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    /// Visible subgraph for `expanded`.
    pub fn visible_graph(&self, expanded: &ExpansionState) -> VisibleGraph {
        visible_graph(&self.model, &self.classification, &self.hierarchy, expanded)
    }

    /// Highlighted ancestor chain for `selected`.
    pub fn compute_path(&self, selected: Option<&str>) -> HighlightPath {
        compute_path(&self.hierarchy, selected)
    }

    /// Expansion state with every node that has children expanded.
    pub fn expand_all(&self) -> ExpansionState {
        ExpansionState::expand_all(&self.hierarchy)
    }

    /// Acyclic Sankey projection of the model.
    pub fn sankey(&self) -> SankeyProjection {
        remove_cyclic_links(&sankey_from_topology(&self.model))
    }
}

/// Single-slot cache of the latest [`TopologyAnalysis`].
#[derive(Debug, Default)]
pub struct AnalysisCache {
    latest: Option<(String, TopologyAnalysis)>,
    hits: u64,
    misses: u64,
}

impl AnalysisCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the analysis of `snapshot`, reusing the cached one when the
    /// snapshot fingerprint is unchanged.
    ///
    /// # Errors
    ///
    /// Returns the fingerprint encoding error, see
    /// [`crate::fingerprint::snapshot_fingerprint`].
    pub fn analyse(
        &mut self,
        snapshot: &TopologySnapshot,
    ) -> Result<&TopologyAnalysis, serde_json::Error> {
        let key = snapshot_fingerprint(&snapshot.nodes, &snapshot.edges)?;
        let entry = match self.latest.take() {
            Some((cached, analysis)) if cached == key => {
                self.hits += 1;
                (cached, analysis)
            }
            Some(_) | None => {
                self.misses += 1;
                tracing::debug!(fingerprint = %key, "analysing new snapshot");
                (key, TopologyAnalysis::from_snapshot(snapshot.clone()))
            }
        };
        let (_, analysis) = self.latest.insert(entry);
        Ok(&*analysis)
    }

    /// Number of lookups answered from the cache.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Number of lookups that rebuilt the analysis.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Drops the cached analysis.
    pub fn clear(&mut self) {
        self.latest = None;
    }
}
