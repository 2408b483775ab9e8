//! Directional focus navigation.
//!
//! A candidate must lie strictly ahead of the focus along the requested
//! direction (center projection > 0). Among candidates the winner minimizes,
//! in order:
//!
//! 1. distance along the direction
//! 2. absolute offset on the perpendicular axis
//! 3. squared euclidean distance between centers
//! 4. node id
//!
//! Nodes hidden under a collapsed root are never candidates.

use std::cmp::Ordering;

use nodal_graph::{Graph, NodeId};

use crate::command::Direction;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Score {
    axis: f64,
    perpendicular: f64,
    distance_squared: f64,
}

impl Score {
    fn rank_cmp(&self, other: &Self) -> Ordering {
        self.axis
            .total_cmp(&other.axis)
            .then_with(|| self.perpendicular.total_cmp(&other.perpendicular))
            .then_with(|| self.distance_squared.total_cmp(&other.distance_squared))
    }
}

/// The node focus would move to from `from` in `direction`, if any.
#[must_use]
pub fn next_in_direction(graph: &Graph, from: &NodeId, direction: Direction) -> Option<NodeId> {
    let origin = graph.node(from)?.bounds.center();
    let unit = direction.unit();
    let perpendicular = direction.perpendicular();
    let hidden = graph.hidden_node_ids();

    graph
        .nodes()
        .values()
        .filter(|node| &node.id != from && !hidden.contains(&node.id))
        .filter_map(|node| {
            let center = node.bounds.center();
            let delta = center.offset_from(origin);
            let axis = delta.dot(unit);
            if axis <= 0.0 || !axis.is_finite() {
                return None;
            }
            let score = Score {
                axis,
                perpendicular: delta.dot(perpendicular).abs(),
                distance_squared: center.distance_squared(origin),
            };
            Some((score, &node.id))
        })
        .min_by(|(a, a_id), (b, b_id)| a.rank_cmp(b).then_with(|| a_id.cmp(b_id)))
        .map(|(_, id)| id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodal_graph::{Node, Rect};

    fn graph(nodes: &[(&str, f64, f64)]) -> Graph {
        let mut graph = Graph::new();
        for (id, x, y) in nodes {
            graph
                .create_node(Node::text(*id, Rect::new(*x, *y, 100.0, 50.0)))
                .expect("node");
        }
        graph
    }

    #[test]
    fn equal_axis_distance_prefers_alignment() {
        let graph = graph(&[
            ("origin", 0.0, 0.0),
            ("diagonal", 150.0, 40.0),
            ("aligned", 150.0, 0.0),
        ]);
        assert_eq!(
            next_in_direction(&graph, &"origin".into(), Direction::Right),
            Some(NodeId::from("aligned"))
        );
    }

    #[test]
    fn axis_distance_wins_over_perpendicular_offset() {
        let graph = graph(&[
            ("origin", 0.0, 0.0),
            ("near-offset", 120.0, 200.0),
            ("far-aligned", 400.0, 0.0),
        ]);
        assert_eq!(
            next_in_direction(&graph, &"origin".into(), Direction::Right),
            Some(NodeId::from("near-offset"))
        );
    }

    #[test]
    fn zero_projection_is_not_a_candidate() {
        let graph = graph(&[("origin", 0.0, 0.0), ("below", 0.0, 100.0)]);
        assert_eq!(
            next_in_direction(&graph, &"origin".into(), Direction::Right),
            None
        );
        assert_eq!(
            next_in_direction(&graph, &"origin".into(), Direction::Down),
            Some(NodeId::from("below"))
        );
        assert_eq!(
            next_in_direction(&graph, &"origin".into(), Direction::Up),
            None
        );
    }

    #[test]
    fn exact_ties_break_by_id() {
        let graph = graph(&[("origin", 0.0, 0.0), ("b", 200.0, 0.0), ("a", 200.0, 0.0)]);
        assert_eq!(
            next_in_direction(&graph, &"origin".into(), Direction::Right),
            Some(NodeId::from("a"))
        );
    }

    #[test]
    fn perpendicular_offset_is_absolute() {
        let graph = graph(&[
            ("origin", 0.0, 0.0),
            ("above", 200.0, -40.0),
            ("below", 200.0, 30.0),
        ]);
        assert_eq!(
            next_in_direction(&graph, &"origin".into(), Direction::Right),
            Some(NodeId::from("below"))
        );
    }

    #[test]
    fn missing_origin_yields_none() {
        let graph = graph(&[("a", 0.0, 0.0)]);
        assert_eq!(next_in_direction(&graph, &"ghost".into(), Direction::Left), None);
    }
}
