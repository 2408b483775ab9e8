//! Errors raised by graph primitives.

use std::fmt;

use crate::ids::{AreaId, EdgeId, NodeId};
use crate::invariants::InvariantReport;

/// Structured reasons a graph primitive refused to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    NodeNotFound {
        node_id: NodeId,
    },
    EdgeNotFound {
        edge_id: EdgeId,
    },
    AreaNotFound {
        area_id: AreaId,
    },
    /// An entity with this id already exists.
    DuplicateId {
        id: String,
    },
    /// An update tried to change the identity of the entity it targets.
    IdentityChange {
        expected: String,
        found: String,
    },
    /// The snapshot violates one or more structural invariants.
    Invariant(InvariantReport),
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeNotFound { node_id } => write!(f, "node {node_id} not found"),
            Self::EdgeNotFound { edge_id } => write!(f, "edge {edge_id} not found"),
            Self::AreaNotFound { area_id } => write!(f, "area {area_id} not found"),
            Self::DuplicateId { id } => write!(f, "id {id} already exists"),
            Self::IdentityChange { expected, found } => {
                write!(f, "update changed id from {expected} to {found}")
            }
            Self::Invariant(report) => {
                write!(f, "graph invariants violated: ")?;
                for (index, issue) in report.issues.iter().enumerate() {
                    if index > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{issue}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for GraphError {}
