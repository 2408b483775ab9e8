//! Convex hulls and separating-axis gaps.

use nodal_core::geometry::{Point, Rect};

/// Convex hull of `points` in counter-clockwise order (monotone chain).
///
/// Collinear points are dropped. Fewer than three distinct points come back
/// as-is after sorting and dedup.
#[must_use]
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then_with(|| a.y.total_cmp(&b.y)));
    sorted.dedup();
    if sorted.len() < 3 {
        return sorted;
    }

    let mut lower: Vec<Point> = Vec::with_capacity(sorted.len());
    for point in &sorted {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], *point) <= 0.0
        {
            let _ = lower.pop();
        }
        lower.push(*point);
    }

    let mut upper: Vec<Point> = Vec::with_capacity(sorted.len());
    for point in sorted.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], *point) <= 0.0
        {
            let _ = upper.pop();
        }
        upper.push(*point);
    }

    let _ = lower.pop();
    let _ = upper.pop();
    lower.extend(upper);
    lower
}

/// Hull of the corners of every rectangle.
#[must_use]
pub fn hull_of_rects<'a>(rects: impl IntoIterator<Item = &'a Rect>) -> Vec<Point> {
    let corners = rects
        .into_iter()
        .flat_map(|rect| rect.corners())
        .collect::<Vec<_>>();
    convex_hull(&corners)
}

/// Largest gap between the projections of two convex polygons over the
/// candidate axes: both coordinate axes plus every edge normal.
///
/// Positive means separated by at least that distance along some axis; zero
/// or negative means no axis separates them.
#[must_use]
pub fn separation(a: &[Point], b: &[Point]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return f64::INFINITY;
    }
    let mut axes = vec![Point::new(1.0, 0.0), Point::new(0.0, 1.0)];
    axes.extend(edge_normals(a));
    axes.extend(edge_normals(b));

    axes.into_iter()
        .map(|axis| {
            let (a_min, a_max) = project(a, axis);
            let (b_min, b_max) = project(b, axis);
            (b_min - a_max).max(a_min - b_max)
        })
        .fold(f64::NEG_INFINITY, f64::max)
}

fn cross(origin: Point, a: Point, b: Point) -> f64 {
    (a.x - origin.x) * (b.y - origin.y) - (a.y - origin.y) * (b.x - origin.x)
}

fn edge_normals(polygon: &[Point]) -> Vec<Point> {
    if polygon.len() < 2 {
        return Vec::new();
    }
    (0..polygon.len())
        .filter_map(|index| {
            let start = polygon[index];
            let end = polygon[(index + 1) % polygon.len()];
            let edge = end.offset_from(start);
            let length = edge.dot(edge).sqrt();
            (length > 0.0).then(|| Point::new(-edge.y / length, edge.x / length))
        })
        .collect()
}

fn project(polygon: &[Point], axis: Point) -> (f64, f64) {
    polygon
        .iter()
        .map(|point| point.dot(axis))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), value| {
            (lo.min(value), hi.max(value))
        })
}
