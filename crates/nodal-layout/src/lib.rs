#![forbid(unsafe_code)]

//! Layout passes over a graph snapshot.
//!
//! - [`TreeLayout`] - positions tree-mode hierarchies from structure and fixed spacing.
//! - [`AreaLayout`] - pushes overlapping layout groups apart, seeded at one node.
//! - [`hull`] - convex hulls and separating-axis gaps for the tighter area shape.
//!
//! Both passes are deterministic and idempotent: running a pass on its own
//! output leaves the graph unchanged.

pub mod area;
pub mod hull;
pub mod tree;

pub use area::{AreaLayout, AreaLayoutConfig, AreaLayoutStats, AreaShape, LayoutGroup};
pub use tree::{TreeLayout, TreeLayoutConfig, TreeLayoutStats};

/// Slack used when comparing derived coordinates.
pub(crate) const EPSILON: f64 = 1e-6;
