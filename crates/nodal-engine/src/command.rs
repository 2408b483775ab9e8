//! The closed command set accepted by the engine.

use std::collections::BTreeSet;
use std::fmt;

use nodal_core::geometry::Point;
use nodal_graph::{AreaId, Attachment, EditingMode, NodeId};
use serde::{Deserialize, Serialize};

/// Cardinal direction for focus, selection, and structural moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Unit vector in canvas space (y grows downward).
    #[must_use]
    pub const fn unit(self) -> Point {
        match self {
            Self::Up => Point::new(0.0, -1.0),
            Self::Down => Point::new(0.0, 1.0),
            Self::Left => Point::new(-1.0, 0.0),
            Self::Right => Point::new(1.0, 0.0),
        }
    }

    /// Unit vector of the orthogonal axis.
    #[must_use]
    pub const fn perpendicular(self) -> Point {
        match self {
            Self::Up | Self::Down => Point::new(1.0, 0.0),
            Self::Left | Self::Right => Point::new(0.0, 1.0),
        }
    }
}

/// Where a new sibling goes relative to the focused node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiblingPosition {
    Above,
    Below,
}

/// Request for the rendering layer to adjust the viewport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum ViewportIntent {
    /// Scroll so the node is centered.
    CenterOnNode { node_id: NodeId },
    /// Drop any manual pan; emitted when undo/redo moves focus.
    ResetManualPan,
}

/// One editing command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    AddNode {
        #[serde(default)]
        area: Option<AreaId>,
    },
    AddChildNode,
    AddSiblingNode {
        position: SiblingPosition,
    },
    MoveFocus {
        direction: Direction,
    },
    MoveNode {
        direction: Direction,
    },
    ExtendSelection {
        direction: Direction,
    },
    ToggleFoldSubtree,
    CenterFocusedNode,
    DeleteFocusedNode,
    CopySubtree,
    CutSubtree,
    PasteSubtree,
    DuplicateSelectionAsSibling,
    SetNodeText {
        node_id: NodeId,
        text: String,
        measured_height: f64,
    },
    SetNodeImage {
        node_id: NodeId,
        path: String,
        measured_height: f64,
    },
    UpsertNodeAttachment {
        node_id: NodeId,
        attachment: Attachment,
        width: f64,
        height: f64,
    },
    ToggleMarkdownStyle,
    AlignParentNodesVertically,
    ConnectNodes {
        from: NodeId,
        to: NodeId,
    },
    FocusNode {
        node_id: NodeId,
    },
    CreateArea {
        area_id: AreaId,
        mode: EditingMode,
        node_ids: BTreeSet<NodeId>,
    },
    AssignNodesToArea {
        node_ids: BTreeSet<NodeId>,
        area_id: AreaId,
    },
    ConvertAreaMode {
        to: EditingMode,
    },
}

/// Payload-free discriminator of [`Command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    AddNode,
    AddChildNode,
    AddSiblingNode,
    MoveFocus,
    MoveNode,
    ExtendSelection,
    ToggleFoldSubtree,
    CenterFocusedNode,
    DeleteFocusedNode,
    CopySubtree,
    CutSubtree,
    PasteSubtree,
    DuplicateSelectionAsSibling,
    SetNodeText,
    SetNodeImage,
    UpsertNodeAttachment,
    ToggleMarkdownStyle,
    AlignParentNodesVertically,
    ConnectNodes,
    FocusNode,
    CreateArea,
    AssignNodesToArea,
    ConvertAreaMode,
}

impl CommandKind {
    /// Stable snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddNode => "add_node",
            Self::AddChildNode => "add_child_node",
            Self::AddSiblingNode => "add_sibling_node",
            Self::MoveFocus => "move_focus",
            Self::MoveNode => "move_node",
            Self::ExtendSelection => "extend_selection",
            Self::ToggleFoldSubtree => "toggle_fold_subtree",
            Self::CenterFocusedNode => "center_focused_node",
            Self::DeleteFocusedNode => "delete_focused_node",
            Self::CopySubtree => "copy_subtree",
            Self::CutSubtree => "cut_subtree",
            Self::PasteSubtree => "paste_subtree",
            Self::DuplicateSelectionAsSibling => "duplicate_selection_as_sibling",
            Self::SetNodeText => "set_node_text",
            Self::SetNodeImage => "set_node_image",
            Self::UpsertNodeAttachment => "upsert_node_attachment",
            Self::ToggleMarkdownStyle => "toggle_markdown_style",
            Self::AlignParentNodesVertically => "align_parent_nodes_vertically",
            Self::ConnectNodes => "connect_nodes",
            Self::FocusNode => "focus_node",
            Self::CreateArea => "create_area",
            Self::AssignNodesToArea => "assign_nodes_to_area",
            Self::ConvertAreaMode => "convert_area_mode",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Command {
    #[must_use]
    pub const fn kind(&self) -> CommandKind {
        match self {
            Self::AddNode { .. } => CommandKind::AddNode,
            Self::AddChildNode => CommandKind::AddChildNode,
            Self::AddSiblingNode { .. } => CommandKind::AddSiblingNode,
            Self::MoveFocus { .. } => CommandKind::MoveFocus,
            Self::MoveNode { .. } => CommandKind::MoveNode,
            Self::ExtendSelection { .. } => CommandKind::ExtendSelection,
            Self::ToggleFoldSubtree => CommandKind::ToggleFoldSubtree,
            Self::CenterFocusedNode => CommandKind::CenterFocusedNode,
            Self::DeleteFocusedNode => CommandKind::DeleteFocusedNode,
            Self::CopySubtree => CommandKind::CopySubtree,
            Self::CutSubtree => CommandKind::CutSubtree,
            Self::PasteSubtree => CommandKind::PasteSubtree,
            Self::DuplicateSelectionAsSibling => CommandKind::DuplicateSelectionAsSibling,
            Self::SetNodeText { .. } => CommandKind::SetNodeText,
            Self::SetNodeImage { .. } => CommandKind::SetNodeImage,
            Self::UpsertNodeAttachment { .. } => CommandKind::UpsertNodeAttachment,
            Self::ToggleMarkdownStyle => CommandKind::ToggleMarkdownStyle,
            Self::AlignParentNodesVertically => CommandKind::AlignParentNodesVertically,
            Self::ConnectNodes { .. } => CommandKind::ConnectNodes,
            Self::FocusNode { .. } => CommandKind::FocusNode,
            Self::CreateArea { .. } => CommandKind::CreateArea,
            Self::AssignNodesToArea { .. } => CommandKind::AssignNodesToArea,
            Self::ConvertAreaMode { .. } => CommandKind::ConvertAreaMode,
        }
    }

    /// Area named explicitly by the command's arguments.
    #[must_use]
    pub fn explicit_area(&self) -> Option<&AreaId> {
        match self {
            Self::AddNode { area } => area.as_ref(),
            Self::CreateArea { area_id, .. } | Self::AssignNodesToArea { area_id, .. } => {
                Some(area_id)
            }
            _ => None,
        }
    }

    /// Node addressed by the command's arguments, when it names one.
    #[must_use]
    pub fn addressed_node(&self) -> Option<&NodeId> {
        match self {
            Self::SetNodeText { node_id, .. }
            | Self::SetNodeImage { node_id, .. }
            | Self::UpsertNodeAttachment { node_id, .. }
            | Self::FocusNode { node_id } => Some(node_id),
            Self::ConnectNodes { from, .. } => Some(from),
            Self::CreateArea { node_ids, .. } | Self::AssignNodesToArea { node_ids, .. } => {
                node_ids.iter().next()
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_use_tagged_json() {
        let command = Command::MoveFocus {
            direction: Direction::Left,
        };
        let json = serde_json::to_string(&command).expect("serialize");
        assert_eq!(json, r#"{"type":"move_focus","direction":"left"}"#);
        let back: Command = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, command);
    }

    #[test]
    fn add_node_area_defaults_to_none() {
        let command: Command = serde_json::from_str(r#"{"type":"add_node"}"#).expect("parse");
        assert_eq!(command, Command::AddNode { area: None });
    }

    #[test]
    fn kind_names_match_serde_names() {
        let command = Command::DuplicateSelectionAsSibling;
        let json = serde_json::to_value(&command).expect("serialize");
        assert_eq!(json["type"], command.kind().as_str());
        let kind = serde_json::to_value(command.kind()).expect("serialize kind");
        assert_eq!(kind, command.kind().as_str());
    }

    #[test]
    fn perpendicular_is_orthogonal() {
        for direction in [Direction::Up, Direction::Down, Direction::Left, Direction::Right] {
            assert_eq!(direction.unit().dot(direction.perpendicular()), 0.0);
        }
    }
}
