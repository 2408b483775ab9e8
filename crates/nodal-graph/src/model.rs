//! Value types for the graph snapshot.
//!
//! A [`Graph`] is a plain value: cloning it yields an independent snapshot.
//! Maps and sets are ordered so iteration, hashing for tests, and every
//! tie-break are deterministic.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use nodal_core::geometry::Rect;
use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::ids::{AreaId, EdgeId, NodeId};

/// Node content kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    #[default]
    Text,
}

/// Payload kind of a node attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttachmentKind {
    Image { path: String },
    Other { descriptor: String },
}

/// Where an attachment is drawn relative to the node text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentPlacement {
    #[default]
    AboveText,
    BelowText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Unique within the owning node.
    pub id: String,
    pub kind: AttachmentKind,
    pub placement: AttachmentPlacement,
}

impl Attachment {
    /// Image attachment drawn above the text.
    #[must_use]
    pub fn image(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: AttachmentKind::Image { path: path.into() },
            placement: AttachmentPlacement::AboveText,
        }
    }

    #[must_use]
    pub const fn is_image(&self) -> bool {
        matches!(self.kind, AttachmentKind::Image { .. })
    }
}

/// One canvas node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub text: Option<String>,
    /// Attachments in display order.
    pub attachments: Vec<Attachment>,
    pub bounds: Rect,
    pub metadata: BTreeMap<String, String>,
    pub markdown_style_enabled: bool,
}

impl Node {
    /// Empty text node with the given bounds.
    #[must_use]
    pub fn text(id: impl Into<NodeId>, bounds: Rect) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Text,
            text: None,
            attachments: Vec::new(),
            bounds,
            metadata: BTreeMap::new(),
            markdown_style_enabled: false,
        }
    }

    /// Builder-style text setter.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Visual order: top edge, then left edge, then id.
    pub fn visual_cmp(&self, other: &Node) -> Ordering {
        self.bounds
            .reading_cmp(&other.bounds)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Edge relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    /// Hierarchy edge; supports sibling ordering.
    ParentChild,
    /// Free diagram connection without ordering.
    Normal,
}

/// A directed edge between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    pub relation: RelationType,
    /// Sibling order; only meaningful on parent-child edges.
    pub parent_child_order: Option<i64>,
    pub label: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

impl Edge {
    #[must_use]
    pub fn parent_child(
        id: impl Into<EdgeId>,
        from: impl Into<NodeId>,
        to: impl Into<NodeId>,
        order: Option<i64>,
    ) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            relation: RelationType::ParentChild,
            parent_child_order: order,
            label: None,
            metadata: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn normal(id: impl Into<EdgeId>, from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            relation: RelationType::Normal,
            parent_child_order: None,
            label: None,
            metadata: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn is_parent_child(&self) -> bool {
        self.relation == RelationType::ParentChild
    }

    #[must_use]
    pub fn touches(&self, node_id: &NodeId) -> bool {
        &self.from == node_id || &self.to == node_id
    }
}

/// Editing mode carried by an area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditingMode {
    /// Outline editing with automatic tree layout.
    #[default]
    Tree,
    /// Free-form diagram; only overlap resolution applies.
    Diagram,
}

impl fmt::Display for EditingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tree => f.write_str("tree"),
            Self::Diagram => f.write_str("diagram"),
        }
    }
}

/// A disjoint group of nodes sharing one editing mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub id: AreaId,
    pub node_ids: BTreeSet<NodeId>,
    pub mode: EditingMode,
}

impl Area {
    #[must_use]
    pub fn new(id: impl Into<AreaId>, mode: EditingMode) -> Self {
        Self {
            id: id.into(),
            node_ids: BTreeSet::new(),
            mode,
        }
    }

    /// Builder-style membership setter.
    #[must_use]
    pub fn with_nodes<I, T>(mut self, node_ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<NodeId>,
    {
        self.node_ids = node_ids.into_iter().map(Into::into).collect();
        self
    }
}

/// Immutable-by-convention snapshot of the whole document.
///
/// Mutating methods take `&mut self` and validate before touching anything, so
/// a failed call leaves the graph as it was. Callers that need snapshot
/// isolation mutate a clone and swap it in on success.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Graph {
    pub(crate) nodes: BTreeMap<NodeId, Node>,
    pub(crate) edges: BTreeMap<EdgeId, Edge>,
    pub(crate) focused_node_id: Option<NodeId>,
    pub(crate) selected_node_ids: BTreeSet<NodeId>,
    pub(crate) collapsed_root_node_ids: BTreeSet<NodeId>,
    pub(crate) areas: BTreeMap<AreaId, Area>,
    /// Serial used to mint fresh identifiers.
    pub(crate) next_serial: u64,
}

impl Graph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Read access ------------------------------------------------------

    #[must_use]
    pub fn nodes(&self) -> &BTreeMap<NodeId, Node> {
        &self.nodes
    }

    #[must_use]
    pub fn node(&self, node_id: &NodeId) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    #[must_use]
    pub fn contains_node(&self, node_id: &NodeId) -> bool {
        self.nodes.contains_key(node_id)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn edges(&self) -> &BTreeMap<EdgeId, Edge> {
        &self.edges
    }

    #[must_use]
    pub fn edge(&self, edge_id: &EdgeId) -> Option<&Edge> {
        self.edges.get(edge_id)
    }

    #[must_use]
    pub fn focused_node_id(&self) -> Option<&NodeId> {
        self.focused_node_id.as_ref()
    }

    /// The focused node, if focus resolves to an existing node.
    #[must_use]
    pub fn focused_node(&self) -> Option<&Node> {
        self.focused_node_id
            .as_ref()
            .and_then(|node_id| self.nodes.get(node_id))
    }

    #[must_use]
    pub fn selected_node_ids(&self) -> &BTreeSet<NodeId> {
        &self.selected_node_ids
    }

    #[must_use]
    pub fn collapsed_root_node_ids(&self) -> &BTreeSet<NodeId> {
        &self.collapsed_root_node_ids
    }

    #[must_use]
    pub fn is_collapsed(&self, node_id: &NodeId) -> bool {
        self.collapsed_root_node_ids.contains(node_id)
    }

    #[must_use]
    pub fn areas(&self) -> &BTreeMap<AreaId, Area> {
        &self.areas
    }

    #[must_use]
    pub fn area(&self, area_id: &AreaId) -> Option<&Area> {
        self.areas.get(area_id)
    }

    /// The area that owns `node_id`.
    #[must_use]
    pub fn area_of(&self, node_id: &NodeId) -> Option<&Area> {
        self.areas
            .values()
            .find(|area| area.node_ids.contains(node_id))
    }

    /// Editing mode of the area that owns `node_id`.
    #[must_use]
    pub fn mode_of(&self, node_id: &NodeId) -> Option<EditingMode> {
        self.area_of(node_id).map(|area| area.mode)
    }

    /// Bounds of a node, if it exists.
    #[must_use]
    pub fn bounds(&self, node_id: &NodeId) -> Option<Rect> {
        self.nodes.get(node_id).map(|node| node.bounds)
    }

    /// Topmost, then leftmost, then smallest-id node.
    #[must_use]
    pub fn topmost_leftmost_node(&self) -> Option<&Node> {
        self.nodes.values().min_by(|a, b| a.visual_cmp(b))
    }

    // --- Focus and selection ---------------------------------------------

    /// Set or clear focus. The node must exist.
    pub fn set_focused_node_id(&mut self, node_id: Option<NodeId>) -> Result<(), GraphError> {
        if let Some(node_id) = &node_id
            && !self.nodes.contains_key(node_id)
        {
            return Err(GraphError::NodeNotFound {
                node_id: node_id.clone(),
            });
        }
        self.focused_node_id = node_id;
        Ok(())
    }

    /// Replace the selection. Every member must exist.
    pub fn set_selected_node_ids<I>(&mut self, node_ids: I) -> Result<(), GraphError>
    where
        I: IntoIterator<Item = NodeId>,
    {
        let selection = node_ids.into_iter().collect::<BTreeSet<_>>();
        if let Some(missing) = selection.iter().find(|id| !self.nodes.contains_key(*id)) {
            return Err(GraphError::NodeNotFound {
                node_id: missing.clone(),
            });
        }
        self.selected_node_ids = selection;
        Ok(())
    }

    /// Mark or unmark a node as a collapsed subtree root.
    pub fn set_collapsed(&mut self, node_id: &NodeId, collapsed: bool) -> Result<(), GraphError> {
        if !self.nodes.contains_key(node_id) {
            return Err(GraphError::NodeNotFound {
                node_id: node_id.clone(),
            });
        }
        if collapsed {
            let _ = self.collapsed_root_node_ids.insert(node_id.clone());
        } else {
            let _ = self.collapsed_root_node_ids.remove(node_id);
        }
        Ok(())
    }

    // --- Identifier minting ----------------------------------------------

    /// Fresh node id that does not collide with any existing node.
    pub fn mint_node_id(&mut self) -> NodeId {
        loop {
            let candidate = NodeId::new(self.next_label("node"));
            if !self.nodes.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    /// Fresh edge id that does not collide with any existing edge.
    pub fn mint_edge_id(&mut self) -> EdgeId {
        loop {
            let candidate = EdgeId::new(self.next_label("edge"));
            if !self.edges.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    /// Fresh area id that does not collide with any existing area.
    pub fn mint_area_id(&mut self) -> AreaId {
        loop {
            let candidate = AreaId::new(self.next_label("area"));
            if !self.areas.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    fn next_label(&mut self, prefix: &str) -> String {
        self.next_serial = self.next_serial.saturating_add(1);
        format!("{prefix}-{:06}", self.next_serial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f64, y: f64) -> Rect {
        Rect::new(x, y, 100.0, 50.0)
    }

    #[test]
    fn minted_ids_skip_existing_entries() {
        let mut graph = Graph::new();
        graph
            .create_node(Node::text("node-000001", rect(0.0, 0.0)))
            .expect("create");
        let minted = graph.mint_node_id();
        assert_eq!(minted.as_str(), "node-000002");
    }

    #[test]
    fn minted_ids_share_one_serial() {
        let mut graph = Graph::new();
        assert_eq!(graph.mint_node_id().as_str(), "node-000001");
        assert_eq!(graph.mint_edge_id().as_str(), "edge-000002");
        assert_eq!(graph.mint_area_id().as_str(), "area-000003");
    }

    #[test]
    fn focus_requires_existing_node() {
        let mut graph = Graph::new();
        let err = graph
            .set_focused_node_id(Some(NodeId::from("ghost")))
            .expect_err("missing node");
        assert_eq!(
            err,
            GraphError::NodeNotFound {
                node_id: NodeId::from("ghost")
            }
        );
        assert_eq!(graph.focused_node_id(), None);
    }

    #[test]
    fn topmost_leftmost_breaks_ties_by_id() {
        let mut graph = Graph::new();
        graph.create_node(Node::text("b", rect(0.0, 0.0))).expect("b");
        graph.create_node(Node::text("a", rect(0.0, 0.0))).expect("a");
        graph.create_node(Node::text("c", rect(-5.0, 10.0))).expect("c");
        let top = graph.topmost_leftmost_node().expect("non-empty");
        assert_eq!(top.id.as_str(), "a");
    }

    #[test]
    fn graph_round_trips_through_json() {
        let mut graph = Graph::new();
        graph.create_node(Node::text("a", rect(1.0, 2.0)).with_text("hi")).expect("a");
        let json = serde_json::to_string(&graph).expect("serialize");
        let back: Graph = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, graph);
    }
}
