//! Sibling ordering under a parent.
//!
//! A child edge's effective order is its explicit `parent_child_order` when
//! present, otherwise the child's visual rank among all of the parent's
//! children (top, left, id). Children sort by (effective order, visual rank).
//! Structural commands only touch sibling sequence through
//! [`Graph::normalize_parent_child_order`], [`Graph::shift_parent_child_order`],
//! and [`Graph::next_parent_child_order`].

use std::cmp::Ordering;

use crate::error::GraphError;
use crate::ids::{EdgeId, NodeId};
use crate::model::{Edge, Graph, Node};

/// One child edge with its resolved effective order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedChild {
    pub edge_id: EdgeId,
    pub child_id: NodeId,
    pub effective_order: i64,
}

impl Graph {
    /// Parent-child edges leaving `parent`, in edge-id order.
    #[must_use]
    pub fn child_edges(&self, parent: &NodeId) -> Vec<&Edge> {
        self.edges
            .values()
            .filter(|edge| edge.is_parent_child() && &edge.from == parent)
            .collect()
    }

    /// Parent-child edges entering `child`, in edge-id order.
    #[must_use]
    pub fn parent_edges(&self, child: &NodeId) -> Vec<&Edge> {
        self.edges
            .values()
            .filter(|edge| edge.is_parent_child() && &edge.to == child)
            .collect()
    }

    /// The parent edge with the smallest edge id.
    ///
    /// A node may have several incoming parent-child edges; every hierarchy
    /// operation treats this one as "the" parent.
    #[must_use]
    pub fn primary_parent_edge(&self, child: &NodeId) -> Option<&Edge> {
        self.edges
            .values()
            .find(|edge| edge.is_parent_child() && &edge.to == child)
    }

    #[must_use]
    pub fn primary_parent(&self, child: &NodeId) -> Option<&NodeId> {
        self.primary_parent_edge(child).map(|edge| &edge.from)
    }

    /// The parent-child edge from `parent` to `child`, if any.
    #[must_use]
    pub fn parent_child_edge(&self, parent: &NodeId, child: &NodeId) -> Option<&Edge> {
        self.edges
            .values()
            .find(|edge| edge.is_parent_child() && &edge.from == parent && &edge.to == child)
    }

    /// Children of `parent` in effective order.
    #[must_use]
    pub fn ordered_child_entries(&self, parent: &NodeId) -> Vec<OrderedChild> {
        let edges = self.child_edges(parent);

        let mut visual = edges.clone();
        visual.sort_by(|a, b| self.visual_edge_cmp(a, b));
        let rank_of = |edge_id: &EdgeId| {
            visual
                .iter()
                .position(|edge| &edge.id == edge_id)
                .unwrap_or(visual.len()) as i64
        };

        let mut entries = edges
            .iter()
            .map(|edge| {
                let rank = rank_of(&edge.id);
                (
                    OrderedChild {
                        edge_id: edge.id.clone(),
                        child_id: edge.to.clone(),
                        effective_order: edge.parent_child_order.unwrap_or(rank),
                    },
                    rank,
                )
            })
            .collect::<Vec<_>>();
        entries.sort_by(|(a, a_rank), (b, b_rank)| {
            a.effective_order
                .cmp(&b.effective_order)
                .then_with(|| a_rank.cmp(b_rank))
        });
        entries.into_iter().map(|(entry, _)| entry).collect()
    }

    /// Child ids of `parent` in effective order.
    #[must_use]
    pub fn ordered_children(&self, parent: &NodeId) -> Vec<NodeId> {
        self.ordered_child_entries(parent)
            .into_iter()
            .map(|entry| entry.child_id)
            .collect()
    }

    /// Effective order of `child` under `parent`.
    #[must_use]
    pub fn child_order(&self, parent: &NodeId, child: &NodeId) -> Option<i64> {
        self.ordered_child_entries(parent)
            .into_iter()
            .find(|entry| &entry.child_id == child)
            .map(|entry| entry.effective_order)
    }

    /// Rewrite every child edge under `parent` to contiguous `0..n-1`.
    pub fn normalize_parent_child_order(&mut self, parent: &NodeId) -> Result<(), GraphError> {
        if !self.nodes.contains_key(parent) {
            return Err(GraphError::NodeNotFound {
                node_id: parent.clone(),
            });
        }
        let entries = self.ordered_child_entries(parent);
        for (index, entry) in entries.iter().enumerate() {
            if let Some(edge) = self.edges.get_mut(&entry.edge_id) {
                edge.parent_child_order = Some(index as i64);
            }
        }
        Ok(())
    }

    /// Normalize, then add `by` to every order at or after `at_or_after`.
    ///
    /// Used to open an insertion slot before creating a new child edge.
    pub fn shift_parent_child_order(
        &mut self,
        parent: &NodeId,
        at_or_after: i64,
        by: i64,
    ) -> Result<(), GraphError> {
        self.normalize_parent_child_order(parent)?;
        let edge_ids = self
            .child_edges(parent)
            .into_iter()
            .map(|edge| edge.id.clone())
            .collect::<Vec<_>>();
        for edge_id in edge_ids {
            if let Some(edge) = self.edges.get_mut(&edge_id)
                && let Some(order) = edge.parent_child_order
                && order >= at_or_after
            {
                edge.parent_child_order = Some(order + by);
            }
        }
        Ok(())
    }

    /// One past the largest effective order, or 0 for a childless parent.
    #[must_use]
    pub fn next_parent_child_order(&self, parent: &NodeId) -> i64 {
        self.ordered_child_entries(parent)
            .iter()
            .map(|entry| entry.effective_order)
            .max()
            .map_or(0, |max| max + 1)
    }

    /// Sibling immediately before `child` in effective order under its primary parent.
    #[must_use]
    pub fn previous_sibling(&self, child: &NodeId) -> Option<NodeId> {
        let parent = self.primary_parent(child)?;
        let siblings = self.ordered_children(parent);
        let index = siblings.iter().position(|id| id == child)?;
        index.checked_sub(1).map(|prev| siblings[prev].clone())
    }

    /// Sibling immediately after `child` in effective order under its primary parent.
    #[must_use]
    pub fn next_sibling(&self, child: &NodeId) -> Option<NodeId> {
        let parent = self.primary_parent(child)?;
        let siblings = self.ordered_children(parent);
        let index = siblings.iter().position(|id| id == child)?;
        siblings.get(index + 1).cloned()
    }

    /// Children of `parent` in visual order (top, left, id).
    #[must_use]
    pub fn visually_ordered_children(&self, parent: &NodeId) -> Vec<NodeId> {
        let mut children = self
            .child_edges(parent)
            .into_iter()
            .filter_map(|edge| self.nodes.get(&edge.to))
            .collect::<Vec<&Node>>();
        children.sort_by(|a, b| a.visual_cmp(b));
        children.dedup_by(|a, b| a.id == b.id);
        children.into_iter().map(|node| node.id.clone()).collect()
    }

    fn visual_edge_cmp(&self, a: &Edge, b: &Edge) -> Ordering {
        match (self.nodes.get(&a.to), self.nodes.get(&b.to)) {
            (Some(left), Some(right)) => left.visual_cmp(right),
            _ => a.to.cmp(&b.to),
        }
        .then_with(|| a.id.cmp(&b.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Area, EditingMode};
    use nodal_core::geometry::Rect;
    use proptest::prelude::*;

    fn node_at(id: &str, x: f64, y: f64) -> Node {
        Node::text(id, Rect::new(x, y, 100.0, 40.0))
    }

    /// Parent `p` with children `a` (y=200), `b` (y=100), `c` (y=0).
    fn fan() -> Graph {
        let mut graph = Graph::new();
        graph.create_node(node_at("p", 0.0, 0.0)).expect("p");
        graph.create_node(node_at("a", 200.0, 200.0)).expect("a");
        graph.create_node(node_at("b", 200.0, 100.0)).expect("b");
        graph.create_node(node_at("c", 200.0, 0.0)).expect("c");
        graph
            .create_area(Area::new("area", EditingMode::Tree).with_nodes(["p", "a", "b", "c"]))
            .expect("area");
        for (edge, child) in [("e1", "a"), ("e2", "b"), ("e3", "c")] {
            graph
                .create_edge(Edge::parent_child(edge, "p", child, None))
                .expect("edge");
        }
        graph
    }

    #[test]
    fn visual_fallback_orders_by_position() {
        let graph = fan();
        assert_eq!(
            graph.ordered_children(&"p".into()),
            vec![NodeId::from("c"), NodeId::from("b"), NodeId::from("a")]
        );
    }

    #[test]
    fn explicit_orders_win_over_position() {
        let mut graph = fan();
        graph.set_edge_order(&"e1".into(), 0).expect("order");
        // a: explicit 0, c: rank 0, b: rank 1 -> ties broken by visual rank.
        assert_eq!(
            graph.ordered_children(&"p".into()),
            vec![NodeId::from("c"), NodeId::from("a"), NodeId::from("b")]
        );
    }

    #[test]
    fn normalize_produces_contiguous_orders() {
        let mut graph = fan();
        graph.set_edge_order(&"e2".into(), 40).expect("order");
        graph
            .normalize_parent_child_order(&"p".into())
            .expect("normalize");
        let orders = graph
            .ordered_child_entries(&"p".into())
            .iter()
            .map(|entry| entry.effective_order)
            .collect::<Vec<_>>();
        assert_eq!(orders, vec![0, 1, 2]);
        assert_eq!(
            graph.ordered_children(&"p".into()),
            vec![NodeId::from("c"), NodeId::from("a"), NodeId::from("b")]
        );
    }

    #[test]
    fn shift_opens_a_slot() {
        let mut graph = fan();
        graph
            .shift_parent_child_order(&"p".into(), 1, 1)
            .expect("shift");
        assert_eq!(graph.child_order(&"p".into(), &"c".into()), Some(0));
        assert_eq!(graph.child_order(&"p".into(), &"b".into()), Some(2));
        assert_eq!(graph.child_order(&"p".into(), &"a".into()), Some(3));
    }

    #[test]
    fn next_order_for_childless_parent_is_zero() {
        let graph = fan();
        assert_eq!(graph.next_parent_child_order(&"a".into()), 0);
        assert_eq!(graph.next_parent_child_order(&"p".into()), 3);
    }

    #[test]
    fn primary_parent_is_smallest_edge_id() {
        let mut graph = fan();
        graph
            .create_edge(Edge::parent_child("e0", "b", "a", None))
            .expect("second parent");
        assert_eq!(graph.primary_parent(&"a".into()), Some(&NodeId::from("b")));
    }

    #[test]
    fn siblings_follow_effective_order() {
        let graph = fan();
        assert_eq!(graph.previous_sibling(&"b".into()), Some("c".into()));
        assert_eq!(graph.next_sibling(&"b".into()), Some("a".into()));
        assert_eq!(graph.previous_sibling(&"c".into()), None);
        assert_eq!(graph.previous_sibling(&"p".into()), None);
    }

    #[test]
    fn normalize_unknown_parent_fails() {
        let mut graph = fan();
        assert_eq!(
            graph
                .normalize_parent_child_order(&"ghost".into())
                .expect_err("missing"),
            GraphError::NodeNotFound {
                node_id: "ghost".into()
            }
        );
    }

    proptest! {
        #[test]
        fn normalization_always_yields_zero_to_n(
            explicit in proptest::collection::vec(proptest::option::of(-50i64..50), 1..8),
            ys in proptest::collection::vec(0i32..400, 8),
        ) {
            let mut graph = Graph::new();
            graph.create_node(node_at("p", 0.0, 0.0)).expect("p");
            let mut members = vec![NodeId::from("p")];
            for (index, order) in explicit.iter().enumerate() {
                let child = format!("c{index}");
                graph
                    .create_node(node_at(&child, 200.0, f64::from(ys[index])))
                    .expect("child");
                graph
                    .create_edge(Edge::parent_child(format!("e{index}"), "p", child.as_str(), *order))
                    .expect("edge");
                members.push(child.into());
            }
            graph
                .create_area(Area::new("area", EditingMode::Tree).with_nodes(members))
                .expect("area");

            let before = graph.ordered_children(&"p".into());
            graph.normalize_parent_child_order(&"p".into()).expect("normalize");
            let mut orders = graph
                .ordered_child_entries(&"p".into())
                .iter()
                .map(|entry| entry.effective_order)
                .collect::<Vec<_>>();
            orders.sort_unstable();
            let expected = (0..explicit.len() as i64).collect::<Vec<_>>();
            prop_assert_eq!(orders, expected);
            prop_assert_eq!(graph.ordered_children(&"p".into()), before);
        }
    }
}
