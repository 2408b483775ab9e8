//! Command and batch failures.

use std::fmt;

use nodal_graph::{EditingMode, GraphError, NodeId};

use crate::command::CommandKind;

/// Why a single command was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandFailure {
    /// The graph has nodes but no area records.
    AreaDataMissing,
    /// The target area's mode does not allow the command.
    UnsupportedCommandInMode {
        mode: EditingMode,
        command: CommandKind,
    },
    /// The command needs a focused node and there is none.
    FocusedNodeNotFound,
    /// A connection between these endpoints is not allowed.
    InvalidConnection { from: NodeId, to: NodeId },
    /// A graph primitive refused the mutation.
    Graph(GraphError),
}

impl fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AreaDataMissing => write!(f, "graph has nodes but no area data"),
            Self::UnsupportedCommandInMode { mode, command } => {
                write!(f, "{command} is not supported in {mode} mode")
            }
            Self::FocusedNodeNotFound => write!(f, "no focused node"),
            Self::InvalidConnection { from, to } => {
                write!(f, "cannot connect {from} to {to}")
            }
            Self::Graph(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for CommandFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Graph(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GraphError> for CommandFailure {
    fn from(err: GraphError) -> Self {
        Self::Graph(err)
    }
}

/// A failed batch. Nothing from the batch was committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchError {
    /// Position of the failing command; `None` when the commit itself failed.
    pub command_index: Option<usize>,
    pub command: Option<CommandKind>,
    pub reason: CommandFailure,
}

impl BatchError {
    #[must_use]
    pub fn at(command_index: usize, command: CommandKind, reason: CommandFailure) -> Self {
        Self {
            command_index: Some(command_index),
            command: Some(command),
            reason,
        }
    }

    /// Failure while laying out or validating the batch result.
    #[must_use]
    pub fn commit(reason: impl Into<CommandFailure>) -> Self {
        Self {
            command_index: None,
            command: None,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.command_index, self.command) {
            (Some(index), Some(command)) => {
                write!(f, "command {index} ({command}) failed: {}", self.reason)
            }
            _ => write!(f, "batch commit failed: {}", self.reason),
        }
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn batch_error_names_the_failing_command() {
        let err = BatchError::at(
            2,
            CommandKind::AddChildNode,
            CommandFailure::UnsupportedCommandInMode {
                mode: EditingMode::Diagram,
                command: CommandKind::AddChildNode,
            },
        );
        assert_eq!(
            err.to_string(),
            "command 2 (add_child_node) failed: add_child_node is not supported in diagram mode"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn graph_errors_chain_as_source() {
        let failure = CommandFailure::from(GraphError::NodeNotFound {
            node_id: "n".into(),
        });
        assert_eq!(failure.to_string(), "node n not found");
        assert!(failure.source().is_some());
        assert_eq!(
            BatchError::commit(failure).to_string(),
            "batch commit failed: node n not found"
        );
    }
}
