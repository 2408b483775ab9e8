//! Engine configuration.
//!
//! Defaults reproduce the stock editor. [`EngineConfig::from_env`] overlays a
//! few environment variables:
//!
//! | Variable | Effect |
//! |---|---|
//! | `NODAL_HISTORY_DEPTH` | undo depth; `0` disables history |
//! | `NODAL_AREA_SPACING` | minimum gap between layout groups |
//! | `NODAL_AREA_SHAPE` | `bbox` or `hull` collision shape |
//!
//! Unparseable values are ignored.

use std::env;

use nodal_layout::{AreaLayoutConfig, AreaShape, TreeLayoutConfig};
use serde::{Deserialize, Serialize};

pub const ENV_HISTORY_DEPTH: &str = "NODAL_HISTORY_DEPTH";
pub const ENV_AREA_SPACING: &str = "NODAL_AREA_SPACING";
pub const ENV_AREA_SHAPE: &str = "NODAL_AREA_SHAPE";

/// Size and spacing of nodes created by add commands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub node_width: f64,
    pub node_height: f64,
    /// Position of the first node in an empty area.
    pub origin_x: f64,
    pub origin_y: f64,
    /// Vertical gap between a new node and the node it is placed below.
    pub gap: f64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            node_width: 220.0,
            node_height: 120.0,
            origin_x: 48.0,
            origin_y: 48.0,
            gap: 24.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tree_layout: TreeLayoutConfig,
    pub area_layout: AreaLayoutConfig,
    pub placement: PlacementConfig,
    /// Maximum undo depth. `0` disables history.
    pub history_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tree_layout: TreeLayoutConfig::default(),
            area_layout: AreaLayoutConfig::default(),
            placement: PlacementConfig::default(),
            history_depth: 100,
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with the `NODAL_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    /// Overlay values produced by `lookup` (keyed by variable name).
    #[must_use]
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(depth) = lookup(ENV_HISTORY_DEPTH).and_then(|v| v.trim().parse().ok()) {
            self.history_depth = depth;
        }
        if let Some(spacing) = lookup(ENV_AREA_SPACING)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|spacing| spacing.is_finite() && *spacing >= 0.0)
        {
            self.area_layout.min_spacing = spacing;
        }
        if let Some(shape) = lookup(ENV_AREA_SHAPE).and_then(|v| AreaShape::parse(&v)) {
            self.area_layout.shape = shape;
        }
        self
    }

    #[must_use]
    pub fn with_tree_layout(mut self, tree_layout: TreeLayoutConfig) -> Self {
        self.tree_layout = tree_layout;
        self
    }

    #[must_use]
    pub fn with_area_layout(mut self, area_layout: AreaLayoutConfig) -> Self {
        self.area_layout = area_layout;
        self
    }

    #[must_use]
    pub fn with_placement(mut self, placement: PlacementConfig) -> Self {
        self.placement = placement;
        self
    }

    #[must_use]
    pub fn with_history_depth(mut self, depth: usize) -> Self {
        self.history_depth = depth;
        self
    }
}
