//! Overlap resolution between layout groups.
//!
//! A layout group is a rigid set of nodes that moves as one: each connected
//! hierarchy inside a tree-mode area, or a whole diagram-mode area. Groups
//! collide when their frames, grown by half the minimum spacing on every side,
//! overlap. Resolution runs breadth-first from a seed group: every group that
//! collides with a fixed group is pushed outward until it clears all fixed
//! groups, then becomes fixed itself. Groups that collide with nothing never
//! move.

use std::collections::{BTreeSet, VecDeque};

use nodal_core::geometry::{Point, Rect};
use nodal_graph::{AreaId, EditingMode, Graph, GraphError, NodeId};
use serde::{Deserialize, Serialize};

use crate::EPSILON;
use crate::hull;

/// Shape used for the collision test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaShape {
    /// Axis-aligned bounding box of the members.
    #[default]
    BoundingBox,
    /// Convex hull of member corners; a box collision is confirmed only when
    /// the hulls are also closer than the spacing.
    ConvexHull,
}

impl AreaShape {
    /// Parse the short names used in environment overrides.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bbox" | "bounding_box" | "box" => Some(Self::BoundingBox),
            "hull" | "convex_hull" => Some(Self::ConvexHull),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaLayoutConfig {
    /// Minimum distance kept between two groups.
    pub min_spacing: f64,
    pub shape: AreaShape,
}

impl Default for AreaLayoutConfig {
    fn default() -> Self {
        Self {
            min_spacing: 24.0,
            shape: AreaShape::BoundingBox,
        }
    }
}

impl AreaLayoutConfig {
    #[must_use]
    pub fn with_min_spacing(mut self, spacing: f64) -> Self {
        self.min_spacing = spacing;
        self
    }

    #[must_use]
    pub fn with_shape(mut self, shape: AreaShape) -> Self {
        self.shape = shape;
        self
    }
}

/// A rigid set of nodes moved as one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutGroup {
    /// Stable key: area id, plus the smallest member id for tree components.
    pub key: String,
    pub area_id: AreaId,
    pub node_ids: BTreeSet<NodeId>,
    pub frame: Rect,
    /// Empty unless the layout uses [`AreaShape::ConvexHull`].
    pub hull: Vec<Point>,
}

impl LayoutGroup {
    fn translated(&self, dx: f64, dy: f64) -> Self {
        Self {
            frame: self.frame.translated(dx, dy),
            hull: self
                .hull
                .iter()
                .map(|point| Point::new(point.x + dx, point.y + dy))
                .collect(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AreaLayoutStats {
    pub groups: usize,
    pub groups_moved: usize,
    pub nodes_moved: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Push {
    Left,
    Right,
    Up,
    Down,
}

impl Push {
    fn offset(self, distance: f64) -> (f64, f64) {
        match self {
            Self::Left => (-distance, 0.0),
            Self::Right => (distance, 0.0),
            Self::Up => (0.0, -distance),
            Self::Down => (0.0, distance),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AreaLayout {
    config: AreaLayoutConfig,
}

impl AreaLayout {
    #[must_use]
    pub fn new(config: AreaLayoutConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &AreaLayoutConfig {
        &self.config
    }

    /// Layout groups of `graph`, ordered by key.
    #[must_use]
    pub fn groups(&self, graph: &Graph) -> Vec<LayoutGroup> {
        let mut groups = Vec::new();
        for area in graph.areas().values() {
            let members = area
                .node_ids
                .iter()
                .filter(|id| graph.contains_node(id))
                .cloned()
                .collect::<BTreeSet<_>>();
            match area.mode {
                EditingMode::Tree => {
                    for component in graph.parent_child_components(&members) {
                        let key = match component.first() {
                            Some(first) => format!("{}/{first}", area.id),
                            None => continue,
                        };
                        groups.extend(self.group(graph, key, &area.id, component));
                    }
                }
                EditingMode::Diagram => {
                    groups.extend(self.group(graph, area.id.to_string(), &area.id, members));
                }
            }
        }
        groups.sort_by(|a, b| a.key.cmp(&b.key));
        groups
    }

    fn group(
        &self,
        graph: &Graph,
        key: String,
        area_id: &AreaId,
        node_ids: BTreeSet<NodeId>,
    ) -> Option<LayoutGroup> {
        let rects = node_ids
            .iter()
            .filter_map(|id| graph.bounds(id))
            .collect::<Vec<_>>();
        let frame = Rect::union_all(&rects)?;
        let hull = match self.config.shape {
            AreaShape::BoundingBox => Vec::new(),
            AreaShape::ConvexHull => hull::hull_of_rects(&rects),
        };
        Some(LayoutGroup {
            key,
            area_id: area_id.clone(),
            node_ids,
            frame,
            hull,
        })
    }

    /// Whether two groups sit closer than the minimum spacing.
    #[must_use]
    pub fn collides(&self, a: &LayoutGroup, b: &LayoutGroup) -> bool {
        let half = self.config.min_spacing / 2.0;
        let grown_a = a.frame.outset(half);
        let grown_b = b.frame.outset(half);
        let overlap_x = grown_a.right().min(grown_b.right()) - grown_a.left().max(grown_b.left());
        let overlap_y = grown_a.bottom().min(grown_b.bottom()) - grown_a.top().max(grown_b.top());
        if overlap_x <= EPSILON || overlap_y <= EPSILON {
            return false;
        }
        match self.config.shape {
            AreaShape::BoundingBox => true,
            AreaShape::ConvexHull => {
                hull::separation(&a.hull, &b.hull) < self.config.min_spacing - EPSILON
            }
        }
    }

    /// Resolve overlaps in place, seeded at the group that contains `seed`.
    ///
    /// Without a seed, or when the seed is in no group, every group seeds in
    /// turn, topmost-leftmost first.
    pub fn apply(
        &self,
        graph: &mut Graph,
        seed: Option<&NodeId>,
    ) -> Result<AreaLayoutStats, GraphError> {
        let mut groups = self.groups(graph);
        let seeds = self.seed_order(&groups, seed);

        let mut fixed = vec![false; groups.len()];
        let mut offsets = vec![(0.0_f64, 0.0_f64); groups.len()];
        let mut queue = VecDeque::new();
        for start in seeds {
            if fixed[start] {
                continue;
            }
            fixed[start] = true;
            queue.push_back(start);
            while let Some(current) = queue.pop_front() {
                for other in 0..groups.len() {
                    if fixed[other] || !self.collides(&groups[current], &groups[other]) {
                        continue;
                    }
                    let direction = self.push_direction(&groups[current].frame, &groups[other].frame);
                    let (dx, dy) = self.push_clear(&groups, &fixed, other, direction);
                    groups[other] = groups[other].translated(dx, dy);
                    offsets[other].0 += dx;
                    offsets[other].1 += dy;
                    fixed[other] = true;
                    queue.push_back(other);
                }
            }
        }

        let mut stats = AreaLayoutStats {
            groups: groups.len(),
            ..AreaLayoutStats::default()
        };
        for (group, (dx, dy)) in groups.iter().zip(offsets) {
            if dx == 0.0 && dy == 0.0 {
                continue;
            }
            stats.groups_moved += 1;
            for node_id in &group.node_ids {
                if let Some(bounds) = graph.bounds(node_id) {
                    graph.set_node_bounds(node_id, bounds.translated(dx, dy))?;
                    stats.nodes_moved += 1;
                }
            }
            nodal_core::trace!(group = %group.key, dx, dy, "layout group pushed");
        }
        nodal_core::debug!(
            groups = stats.groups,
            groups_moved = stats.groups_moved,
            "area layout applied"
        );
        Ok(stats)
    }

    fn seed_order(&self, groups: &[LayoutGroup], seed: Option<&NodeId>) -> Vec<usize> {
        if let Some(seed) = seed
            && let Some(index) = groups.iter().position(|group| group.node_ids.contains(seed))
        {
            return vec![index];
        }
        let mut order = (0..groups.len()).collect::<Vec<_>>();
        order.sort_by(|&a, &b| {
            groups[a]
                .frame
                .reading_cmp(&groups[b].frame)
                .then_with(|| groups[a].key.cmp(&groups[b].key))
        });
        order
    }

    /// Outward direction with the shorter travel; ties go vertical.
    fn push_direction(&self, fixed: &Rect, moving: &Rect) -> Push {
        let fixed_center = fixed.center();
        let moving_center = moving.center();
        let horizontal = if moving_center.x >= fixed_center.x {
            Push::Right
        } else {
            Push::Left
        };
        let vertical = if moving_center.y >= fixed_center.y {
            Push::Down
        } else {
            Push::Up
        };
        if self.clearance(fixed, moving, vertical) <= self.clearance(fixed, moving, horizontal) {
            vertical
        } else {
            horizontal
        }
    }

    /// Distance `moving` must travel along `direction` to sit `min_spacing` past `fixed`.
    fn clearance(&self, fixed: &Rect, moving: &Rect, direction: Push) -> f64 {
        let spacing = self.config.min_spacing;
        match direction {
            Push::Right => fixed.right() + spacing - moving.left(),
            Push::Left => moving.right() + spacing - fixed.left(),
            Push::Down => fixed.bottom() + spacing - moving.top(),
            Push::Up => moving.bottom() + spacing - fixed.top(),
        }
    }

    /// Keep moving `index` along `direction` until no fixed group collides.
    fn push_clear(
        &self,
        groups: &[LayoutGroup],
        fixed: &[bool],
        index: usize,
        direction: Push,
    ) -> (f64, f64) {
        let mut moving = groups[index].clone();
        let (mut total_x, mut total_y) = (0.0, 0.0);
        while let Some(blocker) = groups
            .iter()
            .enumerate()
            .find(|(other, group)| fixed[*other] && *other != index && self.collides(group, &moving))
            .map(|(_, group)| group)
        {
            let distance = self.clearance(&blocker.frame, &moving.frame, direction).max(EPSILON);
            let (dx, dy) = direction.offset(distance);
            moving = moving.translated(dx, dy);
            total_x += dx;
            total_y += dy;
        }
        (total_x, total_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodal_graph::{Area, Edge, Node};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn add_area(graph: &mut Graph, area: &str, mode: EditingMode, nodes: &[(&str, Rect)]) {
        for (id, rect) in nodes {
            graph.create_node(Node::text(*id, *rect)).expect("node");
        }
        graph
            .create_area(Area::new(area, mode).with_nodes(nodes.iter().map(|(id, _)| *id)))
            .expect("area");
    }

    #[test]
    fn colliding_group_is_pushed_to_the_spacing() {
        let mut graph = Graph::new();
        add_area(
            &mut graph,
            "a",
            EditingMode::Diagram,
            &[("a1", Rect::new(0.0, 0.0, 100.0, 100.0))],
        );
        add_area(
            &mut graph,
            "b",
            EditingMode::Diagram,
            &[("b1", Rect::new(20.0, 60.0, 100.0, 100.0))],
        );
        let stats = AreaLayout::default()
            .apply(&mut graph, Some(&"a1".into()))
            .expect("layout");
        assert_eq!(stats.groups_moved, 1);
        // Vertical travel (64) beats horizontal (104).
        assert_eq!(
            graph.bounds(&"b1".into()),
            Some(Rect::new(20.0, 124.0, 100.0, 100.0))
        );
        assert_eq!(
            graph.bounds(&"a1".into()),
            Some(Rect::new(0.0, 0.0, 100.0, 100.0))
        );
    }

    #[test]
    fn seed_group_stays_and_the_other_moves() {
        let mut graph = Graph::new();
        add_area(
            &mut graph,
            "a",
            EditingMode::Diagram,
            &[("a1", Rect::new(0.0, 0.0, 100.0, 100.0))],
        );
        add_area(
            &mut graph,
            "b",
            EditingMode::Diagram,
            &[("b1", Rect::new(20.0, 60.0, 100.0, 100.0))],
        );
        AreaLayout::default()
            .apply(&mut graph, Some(&"b1".into()))
            .expect("layout");
        assert_eq!(
            graph.bounds(&"b1".into()),
            Some(Rect::new(20.0, 60.0, 100.0, 100.0))
        );
        assert_eq!(
            graph.bounds(&"a1".into()),
            Some(Rect::new(0.0, -64.0, 100.0, 100.0))
        );
    }

    #[test]
    fn pushing_continues_past_other_fixed_groups() {
        let mut graph = Graph::new();
        add_area(
            &mut graph,
            "a",
            EditingMode::Diagram,
            &[("a1", Rect::new(0.0, 0.0, 100.0, 100.0))],
        );
        add_area(
            &mut graph,
            "b",
            EditingMode::Diagram,
            &[("b1", Rect::new(0.0, 90.0, 100.0, 100.0))],
        );
        add_area(
            &mut graph,
            "c",
            EditingMode::Diagram,
            &[("c1", Rect::new(0.0, 180.0, 100.0, 100.0))],
        );
        AreaLayout::default().apply(&mut graph, None).expect("layout");

        let groups = AreaLayout::default().groups(&graph);
        for (index, a) in groups.iter().enumerate() {
            for b in &groups[index + 1..] {
                assert!(!AreaLayout::default().collides(a, b), "{} vs {}", a.key, b.key);
            }
        }
    }

    #[test]
    fn tree_areas_split_into_hierarchy_components() {
        let mut graph = Graph::new();
        add_area(
            &mut graph,
            "t",
            EditingMode::Tree,
            &[
                ("r", Rect::new(0.0, 0.0, 50.0, 50.0)),
                ("c", Rect::new(100.0, 0.0, 50.0, 50.0)),
                ("loose", Rect::new(0.0, 500.0, 50.0, 50.0)),
            ],
        );
        graph
            .create_edge(Edge::parent_child("e", "r", "c", None))
            .expect("edge");
        let groups = AreaLayout::default().groups(&graph);
        let keys = groups.iter().map(|group| group.key.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, vec!["t/c", "t/loose"]);
        assert_eq!(groups[0].frame, Rect::new(0.0, 0.0, 150.0, 50.0));
    }

    #[test]
    fn hull_shape_lets_diagonal_groups_pack_tighter() {
        let mut graph = Graph::new();
        add_area(
            &mut graph,
            "a",
            EditingMode::Diagram,
            &[
                ("a1", Rect::new(0.0, 0.0, 100.0, 10.0)),
                ("a2", Rect::new(0.0, 0.0, 10.0, 100.0)),
            ],
        );
        add_area(
            &mut graph,
            "b",
            EditingMode::Diagram,
            &[
                ("b1", Rect::new(90.0, 190.0, 100.0, 10.0)),
                ("b2", Rect::new(180.0, 100.0, 10.0, 100.0)),
            ],
        );
        let before = graph.clone();

        let hull = AreaLayout::new(AreaLayoutConfig::default().with_shape(AreaShape::ConvexHull));
        let stats = hull.apply(&mut graph, Some(&"a1".into())).expect("hull");
        assert_eq!(stats.groups_moved, 0);
        assert_eq!(graph, before);

        let boxes = AreaLayout::default();
        let stats = boxes.apply(&mut graph, Some(&"a1".into())).expect("boxes");
        assert_eq!(stats.groups_moved, 1);
    }

    #[test]
    fn shape_names_parse() {
        assert_eq!(AreaShape::parse("hull"), Some(AreaShape::ConvexHull));
        assert_eq!(AreaShape::parse(" BBox "), Some(AreaShape::BoundingBox));
        assert_eq!(AreaShape::parse("circle"), None);
    }

    fn arbitrary_canvas() -> impl Strategy<Value = Graph> {
        proptest::collection::vec(
            (0usize..4, -200i32..400, -200i32..400, 10i32..150, 10i32..150),
            1..14,
        )
        .prop_map(|nodes| {
            let mut graph = Graph::new();
            let mut areas: Vec<Vec<(String, Rect)>> = vec![Vec::new(); 4];
            for (index, (area, x, y, w, h)) in nodes.into_iter().enumerate() {
                areas[area].push((
                    format!("n{index:02}"),
                    Rect::new(f64::from(x), f64::from(y), f64::from(w), f64::from(h)),
                ));
            }
            for (index, members) in areas.iter().enumerate() {
                if members.is_empty() {
                    continue;
                }
                let mode = if index % 2 == 0 {
                    EditingMode::Tree
                } else {
                    EditingMode::Diagram
                };
                let borrowed = members
                    .iter()
                    .map(|(id, rect)| (id.as_str(), *rect))
                    .collect::<Vec<_>>();
                add_area(&mut graph, &format!("area{index}"), mode, &borrowed);
                for pair in members.windows(2).step_by(2) {
                    graph
                        .create_edge(Edge::parent_child(
                            format!("e-{}", pair[1].0),
                            pair[0].0.as_str(),
                            pair[1].0.as_str(),
                            None,
                        ))
                        .expect("edge");
                }
            }
            graph
        })
    }

    proptest! {
        #[test]
        fn unseeded_resolution_is_idempotent(graph in arbitrary_canvas(), hull in any::<bool>()) {
            let shape = if hull { AreaShape::ConvexHull } else { AreaShape::BoundingBox };
            let layout = AreaLayout::new(AreaLayoutConfig::default().with_shape(shape));
            let mut once = graph.clone();
            layout.apply(&mut once, None).expect("first pass");
            let mut twice = once.clone();
            let stats = layout.apply(&mut twice, None).expect("second pass");
            prop_assert_eq!(stats.groups_moved, 0);
            prop_assert_eq!(twice, once);
        }

        #[test]
        fn seeded_resolution_is_idempotent(graph in arbitrary_canvas()) {
            let seed = graph.nodes().keys().next().cloned();
            let layout = AreaLayout::default();
            let mut once = graph.clone();
            layout.apply(&mut once, seed.as_ref()).expect("first pass");
            let mut twice = once.clone();
            layout.apply(&mut twice, seed.as_ref()).expect("second pass");
            prop_assert_eq!(twice, once);
        }
    }
}
