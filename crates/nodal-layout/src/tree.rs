//! Tree layout for tree-mode areas.
//!
//! Each area is laid out independently:
//! 1. Build a forest over the area's members. A node hangs under its primary
//!    parent; collapsed nodes are leaves; a visited set claims each node once.
//! 2. Materialize sibling order so the layout no longer depends on positions.
//! 3. Lay out every subtree relative to its root, then anchor it at the root's
//!    current position.
//! 4. Push roots down, in reading order, until their bands clear every earlier
//!    band by `root_spacing`.

use std::collections::{BTreeMap, BTreeSet};

use nodal_core::geometry::Rect;
use nodal_graph::{EditingMode, Graph, GraphError, NodeId};
use serde::{Deserialize, Serialize};

use crate::EPSILON;

/// Spacing constants for [`TreeLayout`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeLayoutConfig {
    /// Gap between a parent's right edge and its children.
    pub horizontal_spacing: f64,
    /// Gap between stacked sibling bands.
    pub vertical_spacing: f64,
    /// Minimum vertical gap between top-level subtrees of one area.
    pub root_spacing: f64,
}

impl Default for TreeLayoutConfig {
    fn default() -> Self {
        Self {
            horizontal_spacing: 40.0,
            vertical_spacing: 24.0,
            root_spacing: 24.0,
        }
    }
}

impl TreeLayoutConfig {
    #[must_use]
    pub fn with_horizontal_spacing(mut self, spacing: f64) -> Self {
        self.horizontal_spacing = spacing;
        self
    }

    #[must_use]
    pub fn with_vertical_spacing(mut self, spacing: f64) -> Self {
        self.vertical_spacing = spacing;
        self
    }

    #[must_use]
    pub fn with_root_spacing(mut self, spacing: f64) -> Self {
        self.root_spacing = spacing;
        self
    }
}

/// What a [`TreeLayout::apply`] call changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeLayoutStats {
    pub nodes_moved: usize,
    pub roots_shifted: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TreeLayout {
    config: TreeLayoutConfig,
}

// ---------------------------------------------------------------------------
// Forest
// ---------------------------------------------------------------------------

struct Forest {
    roots: Vec<NodeId>,
    children: BTreeMap<NodeId, Vec<NodeId>>,
}

impl Forest {
    fn build(graph: &Graph, members: &BTreeSet<NodeId>) -> Self {
        let roots = members
            .iter()
            .filter(|id| {
                graph
                    .primary_parent(id)
                    .is_none_or(|parent| !members.contains(parent))
            })
            .cloned()
            .collect::<Vec<_>>();

        let mut visited = BTreeSet::new();
        let mut children = BTreeMap::new();
        for root in &roots {
            let mut stack = vec![root.clone()];
            while let Some(current) = stack.pop() {
                if !visited.insert(current.clone()) {
                    continue;
                }
                let kids = if graph.is_collapsed(&current) {
                    Vec::new()
                } else {
                    graph
                        .ordered_children(&current)
                        .into_iter()
                        .filter(|kid| {
                            members.contains(kid)
                                && !visited.contains(kid)
                                && graph.primary_parent(kid) == Some(&current)
                        })
                        .collect::<Vec<_>>()
                };
                stack.extend(kids.iter().rev().cloned());
                let _ = children.insert(current, kids);
            }
        }
        Self { roots, children }
    }

    fn children(&self, node: &NodeId) -> &[NodeId] {
        self.children.get(node).map_or(&[], Vec::as_slice)
    }

    fn parents(&self) -> impl Iterator<Item = &NodeId> {
        self.children
            .iter()
            .filter(|(_, kids)| !kids.is_empty())
            .map(|(parent, _)| parent)
    }
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

impl TreeLayout {
    #[must_use]
    pub fn new(config: TreeLayoutConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &TreeLayoutConfig {
        &self.config
    }

    /// Lay out every tree-mode area of `graph` in place.
    pub fn apply(&self, graph: &mut Graph) -> Result<TreeLayoutStats, GraphError> {
        let tree_areas = graph
            .areas()
            .values()
            .filter(|area| area.mode == EditingMode::Tree)
            .map(|area| {
                area.node_ids
                    .iter()
                    .filter(|id| graph.contains_node(id))
                    .cloned()
                    .collect::<BTreeSet<_>>()
            })
            .collect::<Vec<_>>();

        let mut stats = TreeLayoutStats::default();
        for members in tree_areas {
            self.layout_area(graph, &members, &mut stats)?;
        }
        nodal_core::debug!(
            nodes_moved = stats.nodes_moved,
            roots_shifted = stats.roots_shifted,
            "tree layout applied"
        );
        Ok(stats)
    }

    fn layout_area(
        &self,
        graph: &mut Graph,
        members: &BTreeSet<NodeId>,
        stats: &mut TreeLayoutStats,
    ) -> Result<(), GraphError> {
        let forest = Forest::build(graph, members);
        let parents = forest.parents().cloned().collect::<Vec<_>>();
        for parent in &parents {
            graph.normalize_parent_child_order(parent)?;
        }

        let mut roots = forest
            .roots
            .iter()
            .filter_map(|id| graph.node(id))
            .collect::<Vec<_>>();
        roots.sort_by(|a, b| a.visual_cmp(b));
        let roots = roots
            .into_iter()
            .map(|node| (node.id.clone(), node.bounds))
            .collect::<Vec<_>>();

        let mut placed_bands: Vec<Rect> = Vec::new();
        for (root_id, root_bounds) in roots {
            let offsets = self.relative_offsets(graph, &forest, &root_id);
            let frames_at = |root_y: f64| {
                offsets
                    .iter()
                    .map(|(id, (dx, dy, width, height))| {
                        (
                            id.clone(),
                            Rect::new(root_bounds.x + dx, root_y + dy, *width, *height),
                        )
                    })
                    .collect::<Vec<_>>()
            };

            let mut root_y = root_bounds.y;
            let mut frames = frames_at(root_y);
            let mut shifted = false;
            loop {
                let Some(band) = Rect::union_all(frames.iter().map(|(_, rect)| rect)) else {
                    break;
                };
                let push = placed_bands
                    .iter()
                    .filter(|placed| self.bands_conflict(placed, &band))
                    .map(|placed| placed.bottom() + self.config.root_spacing - band.top())
                    .fold(0.0_f64, f64::max);
                if push <= EPSILON {
                    placed_bands.push(band);
                    break;
                }
                root_y += push;
                frames = frames_at(root_y);
                shifted = true;
            }
            if shifted {
                stats.roots_shifted += 1;
            }

            for (node_id, rect) in frames {
                if graph.bounds(&node_id) != Some(rect) {
                    graph.set_node_bounds(&node_id, rect)?;
                    stats.nodes_moved += 1;
                }
            }
        }
        Ok(())
    }

    /// Horizontal overlap and a vertical gap below `root_spacing`.
    fn bands_conflict(&self, placed: &Rect, band: &Rect) -> bool {
        let spacing = self.config.root_spacing;
        band.left() < placed.right() - EPSILON
            && placed.left() < band.right() - EPSILON
            && band.top() < placed.bottom() + spacing - EPSILON
            && placed.top() < band.bottom() + spacing - EPSILON
    }

    /// Offsets `(dx, dy, width, height)` of every node in the subtree, relative
    /// to the root's top-left corner.
    fn relative_offsets(
        &self,
        graph: &Graph,
        forest: &Forest,
        root: &NodeId,
    ) -> BTreeMap<NodeId, (f64, f64, f64, f64)> {
        let mut extents = BTreeMap::new();
        self.measure(graph, forest, root, &mut extents);

        let mut positions = BTreeMap::new();
        self.place(graph, forest, root, 0.0, 0.0, &extents, &mut positions);

        let Some(&(root_x, root_y)) = positions.get(root) else {
            return BTreeMap::new();
        };
        positions
            .into_iter()
            .filter_map(|(id, (x, y))| {
                let size = graph.bounds(&id)?;
                Some((id, (x - root_x, y - root_y, size.width, size.height)))
            })
            .collect()
    }

    /// Band height of each subtree: the node itself or its stacked children,
    /// whichever is taller.
    fn measure(
        &self,
        graph: &Graph,
        forest: &Forest,
        node: &NodeId,
        extents: &mut BTreeMap<NodeId, f64>,
    ) -> f64 {
        let own = graph.bounds(node).map_or(0.0, |rect| rect.height);
        let block = self.block_height(graph, forest, node, extents);
        let extent = own.max(block);
        let _ = extents.insert(node.clone(), extent);
        extent
    }

    fn block_height(
        &self,
        graph: &Graph,
        forest: &Forest,
        node: &NodeId,
        extents: &mut BTreeMap<NodeId, f64>,
    ) -> f64 {
        let kids = forest.children(node);
        if kids.is_empty() {
            return 0.0;
        }
        let stacked = kids
            .iter()
            .map(|kid| self.measure(graph, forest, kid, extents))
            .sum::<f64>();
        stacked + self.config.vertical_spacing * (kids.len() - 1) as f64
    }

    #[allow(clippy::too_many_arguments)]
    fn place(
        &self,
        graph: &Graph,
        forest: &Forest,
        node: &NodeId,
        x: f64,
        top: f64,
        extents: &BTreeMap<NodeId, f64>,
        positions: &mut BTreeMap<NodeId, (f64, f64)>,
    ) {
        let Some(bounds) = graph.bounds(node) else {
            return;
        };
        let kids = forest.children(node);
        if kids.is_empty() {
            let _ = positions.insert(node.clone(), (x, top));
            return;
        }

        let extent = extents.get(node).copied().unwrap_or(bounds.height);
        let block = kids
            .iter()
            .map(|kid| extents.get(kid).copied().unwrap_or(0.0))
            .sum::<f64>()
            + self.config.vertical_spacing * (kids.len() - 1) as f64;
        let child_x = x + bounds.width + self.config.horizontal_spacing;
        let mut cursor = if bounds.height > block {
            top + (bounds.height - block) / 2.0
        } else {
            top
        };
        for kid in kids {
            self.place(graph, forest, kid, child_x, cursor, extents, positions);
            cursor += extents.get(kid).copied().unwrap_or(0.0) + self.config.vertical_spacing;
        }

        let span_top = kids
            .first()
            .and_then(|kid| positions.get(kid))
            .map_or(top, |(_, y)| *y);
        let span_bottom = kids
            .last()
            .and_then(|kid| Some(positions.get(kid)?.1 + graph.bounds(kid)?.height))
            .unwrap_or(top + bounds.height);
        let centered = (span_top + span_bottom) / 2.0 - bounds.height / 2.0;
        let y = centered.clamp(top, top + (extent - bounds.height).max(0.0));
        let _ = positions.insert(node.clone(), (x, y));
    }
}
