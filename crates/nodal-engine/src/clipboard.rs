//! Subtree copy/paste and in-place duplication.
//!
//! Hierarchy edges are not guaranteed acyclic, so every walk here carries the
//! set of nodes on the current path and refuses to descend into one of them
//! again.

use std::collections::{BTreeMap, BTreeSet};

use nodal_core::geometry::Rect;
use nodal_graph::{Attachment, Edge, EdgeId, Graph, GraphError, Node, NodeId, NodeKind};
use serde::{Deserialize, Serialize};

use crate::config::PlacementConfig;

/// Identifier-free snapshot of a subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtreePayload {
    pub kind: NodeKind,
    pub text: Option<String>,
    #[serde(default)]
    pub markdown_style_enabled: bool,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub width: f64,
    pub height: f64,
    /// Children in sibling order.
    #[serde(default)]
    pub children: Vec<SubtreePayload>,
}

impl SubtreePayload {
    /// Capture `root` and its descendants in effective sibling order.
    pub fn capture(graph: &Graph, root: &NodeId) -> Result<Self, GraphError> {
        let mut path = BTreeSet::new();
        capture_node(graph, root, &mut path)
    }

    /// Number of nodes in the payload.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(SubtreePayload::node_count)
            .sum::<usize>()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn capture_node(
    graph: &Graph,
    node_id: &NodeId,
    path: &mut BTreeSet<NodeId>,
) -> Result<SubtreePayload, GraphError> {
    let node = graph.node(node_id).ok_or_else(|| GraphError::NodeNotFound {
        node_id: node_id.clone(),
    })?;
    let _ = path.insert(node_id.clone());
    let mut children = Vec::new();
    for child in graph.ordered_children(node_id) {
        if path.contains(&child) {
            continue;
        }
        children.push(capture_node(graph, &child, path)?);
    }
    let _ = path.remove(node_id);
    Ok(SubtreePayload {
        kind: node.kind,
        text: node.text.clone(),
        markdown_style_enabled: node.markdown_style_enabled,
        metadata: node.metadata.clone(),
        attachments: node.attachments.clone(),
        width: node.bounds.width,
        height: node.bounds.height,
        children,
    })
}

// ---------------------------------------------------------------------------
// Paste
// ---------------------------------------------------------------------------

/// Nodes created by a paste.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PastedSubtree {
    pub root: NodeId,
    /// Every created node, root first, preorder.
    pub created: Vec<NodeId>,
}

/// Recreate `payload` as the last child of `parent` with fresh ids.
///
/// New nodes join the parent's area. Positions are provisional; tree layout
/// places them.
pub fn paste_under(
    graph: &mut Graph,
    payload: &SubtreePayload,
    parent: &NodeId,
    placement: &PlacementConfig,
) -> Result<PastedSubtree, GraphError> {
    let parent_bounds = graph.bounds(parent).ok_or_else(|| GraphError::NodeNotFound {
        node_id: parent.clone(),
    })?;
    let order = graph.next_parent_child_order(parent);
    let origin = (parent_bounds.right() + placement.gap, parent_bounds.y);

    let mut created = Vec::with_capacity(payload.node_count());
    let root = build_node(graph, payload, origin, placement, &mut created)?;
    let edge_id = graph.mint_edge_id();
    graph.create_edge(Edge::parent_child(edge_id, parent.clone(), root.clone(), Some(order)))?;

    if let Some(area_id) = graph.area_of(parent).map(|area| area.id.clone()) {
        let members = created.iter().cloned().collect::<BTreeSet<_>>();
        graph.assign_nodes_to_area(&members, &area_id)?;
    }
    Ok(PastedSubtree { root, created })
}

fn build_node(
    graph: &mut Graph,
    payload: &SubtreePayload,
    (x, y): (f64, f64),
    placement: &PlacementConfig,
    created: &mut Vec<NodeId>,
) -> Result<NodeId, GraphError> {
    let node_id = graph.mint_node_id();
    graph.create_node(Node {
        id: node_id.clone(),
        kind: payload.kind,
        text: payload.text.clone(),
        attachments: payload.attachments.clone(),
        bounds: Rect::new(x, y, payload.width, payload.height),
        metadata: payload.metadata.clone(),
        markdown_style_enabled: payload.markdown_style_enabled,
    })?;
    created.push(node_id.clone());

    let child_x = x + payload.width + placement.gap;
    let mut child_y = y;
    for (index, child) in payload.children.iter().enumerate() {
        let child_id = build_node(graph, child, (child_x, child_y), placement, created)?;
        child_y += child.height + placement.gap;
        let edge_id = graph.mint_edge_id();
        graph.create_edge(Edge::parent_child(
            edge_id,
            node_id.clone(),
            child_id,
            Some(index as i64),
        ))?;
    }
    Ok(node_id)
}

// ---------------------------------------------------------------------------
// Duplicate
// ---------------------------------------------------------------------------

/// Clone each subtree rooted in `selection` as a sibling right after it.
///
/// Each clone lands `gap` below the band of its original. Returns the cloned roots in visual order of their originals. A descendant
/// shared by several duplicated subtrees is cloned once and linked from every
/// cloned parent.
pub fn duplicate_as_siblings(
    graph: &mut Graph,
    selection: &BTreeSet<NodeId>,
    gap: f64,
) -> Result<Vec<NodeId>, GraphError> {
    let roots = graph.subtree_roots(selection);
    let mut run = DuplicateRun::default();
    let mut cloned_roots = Vec::with_capacity(roots.len());

    for root in roots {
        if run.clones.contains_key(&root) {
            continue;
        }
        let band = Rect::union_all(
            graph
                .descendants(&root)
                .iter()
                .filter_map(|id| graph.node(id))
                .map(|node| &node.bounds),
        );
        let dy = band.map_or(0.0, |band| band.height + gap);

        let clone_root = run.clone_node(graph, &root, dy)?;
        if let Some(parent_edge) = graph.primary_parent_edge(&root).cloned() {
            let parent = parent_edge.from.clone();
            graph.normalize_parent_child_order(&parent)?;
            let slot = graph.child_order(&parent, &root).map_or(0, |order| order + 1);
            graph.shift_parent_child_order(&parent, slot, 1)?;
            run.link(graph, &parent_edge, &parent, &clone_root, Some(slot))?;
        }

        let mut path = BTreeSet::new();
        run.clone_descendants(graph, &root, dy, &mut path)?;
        cloned_roots.push(clone_root);
    }
    Ok(cloned_roots)
}

#[derive(Default)]
struct DuplicateRun {
    /// Original id to clone id.
    clones: BTreeMap<NodeId, NodeId>,
    /// Clone ids; never descended into as originals.
    created: BTreeSet<NodeId>,
    linked: BTreeSet<(NodeId, NodeId)>,
}

impl DuplicateRun {
    fn clone_node(
        &mut self,
        graph: &mut Graph,
        original: &NodeId,
        dy: f64,
    ) -> Result<NodeId, GraphError> {
        if let Some(existing) = self.clones.get(original) {
            return Ok(existing.clone());
        }
        let mut node = graph
            .node(original)
            .cloned()
            .ok_or_else(|| GraphError::NodeNotFound {
                node_id: original.clone(),
            })?;
        let clone_id = graph.mint_node_id();
        node.id = clone_id.clone();
        node.bounds = node.bounds.translated(0.0, dy);
        graph.create_node(node)?;
        if let Some(area_id) = graph.area_of(original).map(|area| area.id.clone()) {
            graph.assign_node_to_area(&clone_id, &area_id)?;
        }
        let _ = self.clones.insert(original.clone(), clone_id.clone());
        let _ = self.created.insert(clone_id.clone());
        Ok(clone_id)
    }

    /// Add a parent-child edge mirroring `template`, once per (from, to) pair.
    fn link(
        &mut self,
        graph: &mut Graph,
        template: &Edge,
        from: &NodeId,
        to: &NodeId,
        order: Option<i64>,
    ) -> Result<(), GraphError> {
        if !self.linked.insert((from.clone(), to.clone())) {
            return Ok(());
        }
        let edge_id: EdgeId = graph.mint_edge_id();
        let mut edge = Edge::parent_child(edge_id, from.clone(), to.clone(), order);
        edge.label = template.label.clone();
        edge.metadata = template.metadata.clone();
        graph.create_edge(edge)
    }

    fn clone_descendants(
        &mut self,
        graph: &mut Graph,
        original: &NodeId,
        dy: f64,
        path: &mut BTreeSet<NodeId>,
    ) -> Result<(), GraphError> {
        let Some(clone_parent) = self.clones.get(original).cloned() else {
            return Ok(());
        };
        let _ = path.insert(original.clone());
        let entries = graph.ordered_child_entries(original);
        for entry in entries {
            if path.contains(&entry.child_id) || self.created.contains(&entry.child_id) {
                continue;
            }
            let Some(template) = graph.edge(&entry.edge_id).cloned() else {
                continue;
            };
            let first_visit = !self.clones.contains_key(&entry.child_id);
            let clone_child = self.clone_node(graph, &entry.child_id, dy)?;
            self.link(
                graph,
                &template,
                &clone_parent,
                &clone_child,
                Some(entry.effective_order),
            )?;
            if first_visit {
                self.clone_descendants(graph, &entry.child_id, dy, path)?;
            }
        }
        let _ = path.remove(original);
        Ok(())
    }
}
