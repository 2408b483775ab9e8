//! Per-mode command gate.
//!
//! Tree areas accept every command. Diagram areas accept a fixed subset.
//! Converting an area's mode is the one command that bypasses the gate.

use nodal_graph::{Area, EditingMode, Graph};

use crate::command::{Command, CommandKind};
use crate::error::CommandFailure;

/// Whether `mode` accepts `kind`.
#[must_use]
pub const fn supports(mode: EditingMode, kind: CommandKind) -> bool {
    match mode {
        EditingMode::Tree => true,
        EditingMode::Diagram => matches!(
            kind,
            CommandKind::MoveFocus
                | CommandKind::SetNodeText
                | CommandKind::CenterFocusedNode
                | CommandKind::ConnectNodes
        ),
    }
}

/// Area a command acts on.
///
/// An existing explicit area, else the area of the node the command
/// addresses, else the focused node's area. `AddNode` into an unknown area
/// targets nothing; with no area at all it falls back to the first area in id
/// order.
#[must_use]
pub fn target_area<'g>(graph: &'g Graph, command: &Command) -> Option<&'g Area> {
    if let Some(area_id) = command.explicit_area() {
        if let Some(area) = graph.area(area_id) {
            return Some(area);
        }
        if matches!(command, Command::AddNode { .. }) {
            return None;
        }
    }
    if let Some(node_id) = command.addressed_node()
        && let Some(area) = graph.area_of(node_id)
    {
        return Some(area);
    }
    if let Some(focus) = graph.focused_node_id()
        && let Some(area) = graph.area_of(focus)
    {
        return Some(area);
    }
    match command.kind() {
        CommandKind::AddNode => graph.areas().values().next(),
        _ => None,
    }
}

/// Reject `command` when the graph or its target area forbids it.
pub fn check(graph: &Graph, command: &Command) -> Result<(), CommandFailure> {
    if !graph.is_empty() && graph.areas().is_empty() {
        return Err(CommandFailure::AreaDataMissing);
    }
    let kind = command.kind();
    // Leaving diagram mode must stay possible.
    if kind == CommandKind::ConvertAreaMode {
        return Ok(());
    }
    match target_area(graph, command) {
        Some(area) if !supports(area.mode, kind) => Err(CommandFailure::UnsupportedCommandInMode {
            mode: area.mode,
            command: kind,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use crate::command::Direction;
    use nodal_graph::{Node, NodeId, Rect};

    fn two_areas() -> Graph {
        let mut graph = Graph::new();
        for (id, x) in [("t", 0.0), ("d", 500.0)] {
            graph
                .create_node(Node::text(id, Rect::new(x, 0.0, 100.0, 50.0)))
                .expect("node");
        }
        graph
            .create_area(nodal_graph::Area::new("tree", EditingMode::Tree).with_nodes(["t"]))
            .expect("tree area");
        graph
            .create_area(nodal_graph::Area::new("diagram", EditingMode::Diagram).with_nodes(["d"]))
            .expect("diagram area");
        graph
    }

    #[test]
    fn diagram_subset_is_fixed() {
        let allowed = [
            CommandKind::MoveFocus,
            CommandKind::SetNodeText,
            CommandKind::CenterFocusedNode,
            CommandKind::ConnectNodes,
        ];
        for kind in allowed {
            assert!(supports(EditingMode::Diagram, kind));
        }
        assert!(!supports(EditingMode::Diagram, CommandKind::AddChildNode));
        assert!(!supports(EditingMode::Diagram, CommandKind::DeleteFocusedNode));
        assert!(supports(EditingMode::Tree, CommandKind::DeleteFocusedNode));
    }

    #[test]
    fn focused_diagram_area_rejects_tree_commands() {
        let mut graph = two_areas();
        graph.set_focused_node_id(Some("d".into())).expect("focus");
        assert_eq!(
            check(&graph, &Command::AddChildNode),
            Err(CommandFailure::UnsupportedCommandInMode {
                mode: EditingMode::Diagram,
                command: CommandKind::AddChildNode,
            })
        );
        assert_eq!(
            check(
                &graph,
                &Command::MoveFocus {
                    direction: Direction::Left
                }
            ),
            Ok(())
        );
    }

    #[test]
    fn explicit_area_wins_over_focus() {
        let mut graph = two_areas();
        graph.set_focused_node_id(Some("t".into())).expect("focus");
        let command = Command::AddNode {
            area: Some("diagram".into()),
        };
        assert!(matches!(
            check(&graph, &command),
            Err(CommandFailure::UnsupportedCommandInMode { .. })
        ));
    }

    #[test]
    fn addressed_node_selects_its_area() {
        let mut graph = two_areas();
        graph.set_focused_node_id(Some("d".into())).expect("focus");
        let command = Command::SetNodeImage {
            node_id: NodeId::from("t"),
            path: "a.png".into(),
            measured_height: 10.0,
        };
        assert_eq!(check(&graph, &command), Ok(()));
    }

    #[test]
    fn nodes_without_areas_are_rejected() {
        let mut graph = Graph::new();
        graph
            .create_node(Node::text("lonely", Rect::new(0.0, 0.0, 1.0, 1.0)))
            .expect("node");
        assert_eq!(
            check(&graph, &Command::CenterFocusedNode),
            Err(CommandFailure::AreaDataMissing)
        );
    }

    fn rejected(command: CommandKind) -> Result<(), CommandFailure> {
        Err(CommandFailure::UnsupportedCommandInMode {
            mode: EditingMode::Diagram,
            command,
        })
    }

    #[test]
    fn focus_and_area_edits_are_gated_by_the_addressed_area() {
        let mut graph = two_areas();
        graph.set_focused_node_id(Some("t".into())).expect("focus");
        let focus_d = Command::FocusNode {
            node_id: NodeId::from("d"),
        };
        assert_eq!(check(&graph, &focus_d), rejected(CommandKind::FocusNode));

        let into_diagram = Command::AssignNodesToArea {
            node_ids: BTreeSet::from([NodeId::from("t")]),
            area_id: "diagram".into(),
        };
        assert_eq!(
            check(&graph, &into_diagram),
            rejected(CommandKind::AssignNodesToArea)
        );

        // A new area id falls back to the area of the listed nodes.
        let carve = Command::CreateArea {
            area_id: "fresh".into(),
            mode: EditingMode::Tree,
            node_ids: BTreeSet::from([NodeId::from("d")]),
        };
        assert_eq!(check(&graph, &carve), rejected(CommandKind::CreateArea));

        let focus_t = Command::FocusNode {
            node_id: NodeId::from("t"),
        };
        assert_eq!(check(&graph, &focus_t), Ok(()));
    }

    #[test]
    fn add_node_into_an_unknown_area_is_not_gated() {
        let mut graph = two_areas();
        graph.set_focused_node_id(Some("d".into())).expect("focus");
        let command = Command::AddNode {
            area: Some("elsewhere".into()),
        };
        assert_eq!(target_area(&graph, &command), None);
        assert_eq!(check(&graph, &command), Ok(()));
    }

    #[test]
    fn converting_mode_is_never_gated() {
        let mut graph = two_areas();
        graph.set_focused_node_id(Some("d".into())).expect("focus");
        assert_eq!(
            check(
                &graph,
                &Command::ConvertAreaMode {
                    to: EditingMode::Tree
                }
            ),
            Ok(())
        );
    }
}
