//! Post-mutation recomputation.
//!
//! Handlers only change structure and content. The [`Pipeline`] then brings
//! positions and focus back in line, running each stage at most once per
//! batch and in a fixed order:
//!
//! 1. tree layout
//! 2. area overlap resolution
//! 3. focus normalization
//!
//! Every stage is idempotent, so running the pipeline on its own output is a
//! fixed point.

use nodal_graph::{Graph, GraphError, NodeId};
use nodal_layout::{AreaLayout, TreeLayout};
use tracing::{debug, debug_span};

use crate::command::ViewportIntent;
use crate::config::EngineConfig;

/// Downstream work a handler requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MutationEffects {
    pub did_mutate_graph: bool,
    pub needs_tree_layout: bool,
    pub needs_area_layout: bool,
    pub needs_focus_normalization: bool,
}

impl MutationEffects {
    /// Nothing changed.
    pub const NONE: Self = Self {
        did_mutate_graph: false,
        needs_tree_layout: false,
        needs_area_layout: false,
        needs_focus_normalization: false,
    };

    /// A structural edit: every stage re-runs.
    pub const STRUCTURAL: Self = Self {
        did_mutate_graph: true,
        needs_tree_layout: true,
        needs_area_layout: true,
        needs_focus_normalization: true,
    };

    /// Focus or selection moved; positions are untouched.
    pub const FOCUS_ONLY: Self = Self {
        did_mutate_graph: false,
        needs_tree_layout: false,
        needs_area_layout: false,
        needs_focus_normalization: true,
    };

    /// Content changed in place (text, size, flags).
    pub const CONTENT: Self = Self {
        did_mutate_graph: true,
        needs_tree_layout: true,
        needs_area_layout: true,
        needs_focus_normalization: false,
    };

    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        Self {
            did_mutate_graph: self.did_mutate_graph || other.did_mutate_graph,
            needs_tree_layout: self.needs_tree_layout || other.needs_tree_layout,
            needs_area_layout: self.needs_area_layout || other.needs_area_layout,
            needs_focus_normalization: self.needs_focus_normalization
                || other.needs_focus_normalization,
        }
    }

    #[must_use]
    pub const fn is_noop(&self) -> bool {
        !self.did_mutate_graph
            && !self.needs_tree_layout
            && !self.needs_area_layout
            && !self.needs_focus_normalization
    }
}

/// Outcome of one handler: the graph before and after plus requested work.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationResult {
    pub before: Graph,
    pub after: Graph,
    pub effects: MutationEffects,
    /// Node whose layout group anchors overlap resolution.
    pub area_layout_seed: Option<NodeId>,
    pub viewport_intent: Option<ViewportIntent>,
}

impl MutationResult {
    /// A result that leaves `graph` as it is.
    #[must_use]
    pub fn noop(graph: &Graph) -> Self {
        Self {
            before: graph.clone(),
            after: graph.clone(),
            effects: MutationEffects::NONE,
            area_layout_seed: None,
            viewport_intent: None,
        }
    }
}

/// Effects accumulated over a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchEffects {
    pub effects: MutationEffects,
    pub area_layout_seed: Option<NodeId>,
    pub viewport_intent: Option<ViewportIntent>,
}

impl BatchEffects {
    /// Fold one handler result in. Flags are OR-ed; the latest seed and intent win.
    pub fn absorb(&mut self, result: &MutationResult) {
        self.effects = self.effects.merge(result.effects);
        if let Some(seed) = &result.area_layout_seed {
            self.area_layout_seed = Some(seed.clone());
        }
        if let Some(intent) = &result.viewport_intent {
            self.viewport_intent = Some(intent.clone());
        }
    }
}

/// Staged recomputation run once at the end of a batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pipeline {
    tree: TreeLayout,
    area: AreaLayout,
}

impl Pipeline {
    /// Tree roots keep at least the area `min_spacing` between them.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        let root_spacing = config
            .tree_layout
            .root_spacing
            .max(config.area_layout.min_spacing);
        Self {
            tree: TreeLayout::new(config.tree_layout.with_root_spacing(root_spacing)),
            area: AreaLayout::new(config.area_layout),
        }
    }

    #[must_use]
    pub fn tree_layout(&self) -> &TreeLayout {
        &self.tree
    }

    #[must_use]
    pub fn area_layout(&self) -> &AreaLayout {
        &self.area
    }

    /// Run the stages `batch` asks for, in order.
    pub fn run(&self, graph: &mut Graph, batch: &BatchEffects) -> Result<(), GraphError> {
        let effects = batch.effects;
        if effects.needs_tree_layout {
            let _span = debug_span!("pipeline.tree_layout").entered();
            let stats = self.tree.apply(graph)?;
            debug!(
                nodes_moved = stats.nodes_moved,
                roots_shifted = stats.roots_shifted,
                "tree layout applied"
            );
        }
        if effects.needs_area_layout {
            let _span = debug_span!("pipeline.area_layout").entered();
            let seed = batch
                .area_layout_seed
                .clone()
                .filter(|seed| graph.contains_node(seed))
                .or_else(|| graph.focused_node_id().cloned());
            let stats = self.area.apply(graph, seed.as_ref())?;
            debug!(
                groups = stats.groups,
                groups_moved = stats.groups_moved,
                nodes_moved = stats.nodes_moved,
                "area layout applied"
            );
        }
        if effects.needs_focus_normalization {
            let _span = debug_span!("pipeline.focus_normalization").entered();
            normalize_focus(graph)?;
        }
        Ok(())
    }
}

/// Repair focus and selection after structural edits.
///
/// - A focus that no longer exists falls back to the topmost-leftmost node.
/// - A focus hidden under a collapsed root moves to that collapsed ancestor.
/// - The selection keeps only live, visible nodes.
pub fn normalize_focus(graph: &mut Graph) -> Result<(), GraphError> {
    let focus = match graph.focused_node_id() {
        Some(focus) if graph.contains_node(focus) => Some(focus.clone()),
        _ => graph.topmost_leftmost_node().map(|node| node.id.clone()),
    };
    let focus = match focus {
        Some(focus) if !graph.is_visible(&focus) => graph
            .outermost_collapsed_ancestor(&focus)
            .or(Some(focus)),
        other => other,
    };
    if graph.focused_node_id() != focus.as_ref() {
        debug!(focus = ?focus, "focus normalized");
        graph.set_focused_node_id(focus)?;
    }

    let hidden = graph.hidden_node_ids();
    let selection = graph
        .selected_node_ids()
        .iter()
        .filter(|id| graph.contains_node(id) && !hidden.contains(*id))
        .cloned()
        .collect::<Vec<_>>();
    if selection.len() != graph.selected_node_ids().len() {
        graph.set_selected_node_ids(selection)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodal_graph::{Area, Edge, EditingMode, Node, Rect};

    fn outline() -> Graph {
        let mut graph = Graph::new();
        for (id, x, y) in [("root", 0.0, 0.0), ("kid", 500.0, 500.0), ("far", 0.0, 900.0)] {
            graph
                .create_node(Node::text(id, Rect::new(x, y, 220.0, 120.0)))
                .expect("node");
        }
        graph
            .create_edge(Edge::parent_child("e1", "root", "kid", Some(0)))
            .expect("edge");
        graph
            .create_area(Area::new("a", EditingMode::Tree).with_nodes(["root", "kid", "far"]))
            .expect("area");
        graph
    }

    #[test]
    fn merge_is_a_union_of_flags() {
        let merged = MutationEffects::FOCUS_ONLY.merge(MutationEffects::CONTENT);
        assert_eq!(merged, MutationEffects::STRUCTURAL);
        assert!(MutationEffects::NONE.is_noop());
        assert!(!merged.is_noop());
    }

    #[test]
    fn absorb_keeps_latest_seed_and_intent() {
        let graph = Graph::new();
        let mut batch = BatchEffects::default();
        let mut first = MutationResult::noop(&graph);
        first.area_layout_seed = Some("a".into());
        first.effects = MutationEffects::CONTENT;
        let mut second = MutationResult::noop(&graph);
        second.viewport_intent = Some(ViewportIntent::ResetManualPan);
        batch.absorb(&first);
        batch.absorb(&second);
        assert_eq!(batch.area_layout_seed, Some(NodeId::from("a")));
        assert_eq!(batch.viewport_intent, Some(ViewportIntent::ResetManualPan));
        assert_eq!(batch.effects, MutationEffects::CONTENT);
    }

    #[test]
    fn stale_focus_falls_back_to_topmost_leftmost() {
        let mut graph = outline();
        graph.set_focused_node_id(Some("far".into())).expect("focus");
        let _ = graph.delete_node(&"far".into()).expect("delete");
        normalize_focus(&mut graph).expect("normalize");
        assert_eq!(graph.focused_node_id(), Some(&NodeId::from("root")));
    }

    #[test]
    fn hidden_focus_moves_to_collapsed_root() {
        let mut graph = outline();
        graph.set_focused_node_id(Some("kid".into())).expect("focus");
        graph
            .set_selected_node_ids([NodeId::from("kid"), NodeId::from("far")])
            .expect("select");
        graph.set_collapsed(&"root".into(), true).expect("collapse");
        normalize_focus(&mut graph).expect("normalize");
        assert_eq!(graph.focused_node_id(), Some(&NodeId::from("root")));
        assert_eq!(
            graph.selected_node_ids().iter().cloned().collect::<Vec<_>>(),
            vec![NodeId::from("far")]
        );
    }

    #[test]
    fn full_pipeline_is_a_fixed_point() {
        let mut graph = outline();
        graph.set_focused_node_id(Some("kid".into())).expect("focus");
        let pipeline = Pipeline::default();
        let batch = BatchEffects {
            effects: MutationEffects::STRUCTURAL,
            ..BatchEffects::default()
        };
        pipeline.run(&mut graph, &batch).expect("first run");
        let once = graph.clone();
        pipeline.run(&mut graph, &batch).expect("second run");
        assert_eq!(graph, once);
    }
}
