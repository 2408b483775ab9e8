#![forbid(unsafe_code)]

//! Nodal public facade crate.
//!
//! Re-exports the graph model, layout passes, and command engine behind one
//! dependency, plus a prelude for embedding the engine in an editor.

use std::fmt;

// --- Graph re-exports ------------------------------------------------------

pub use nodal_graph::{
    Area, AreaId, Attachment, AttachmentKind, AttachmentPlacement, Edge, EdgeId, EditingMode,
    Graph, GraphError, InvariantCode, InvariantReport, Node, NodeId, NodeKind, Point, Rect,
    RelationType,
};

// --- Layout re-exports -----------------------------------------------------

pub use nodal_layout::{AreaLayout, AreaLayoutConfig, AreaShape, TreeLayout, TreeLayoutConfig};

// --- Engine re-exports -----------------------------------------------------

pub use nodal_engine::{
    ApplyOutcome, BatchError, Command, CommandFailure, CommandKind, Direction, Engine,
    EngineConfig, PlacementConfig, SharedEngine, SiblingPosition, SubtreePayload, ViewportIntent,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for nodal embedders.
#[derive(Debug)]
pub enum Error {
    /// A graph primitive or seed graph failed validation.
    Graph(GraphError),
    /// A command batch was rejected and rolled back.
    Batch(BatchError),
    /// A clipboard payload could not be encoded or decoded.
    Payload(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Graph(err) => write!(f, "{err}"),
            Self::Batch(err) => write!(f, "{err}"),
            Self::Payload(err) => write!(f, "clipboard payload: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Graph(err) => Some(err),
            Self::Batch(err) => Some(err),
            Self::Payload(err) => Some(err),
        }
    }
}

impl From<GraphError> for Error {
    fn from(err: GraphError) -> Self {
        Self::Graph(err)
    }
}

impl From<BatchError> for Error {
    fn from(err: BatchError) -> Self {
        Self::Batch(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Payload(err)
    }
}

/// Standard result type for nodal APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Command, Direction, EditingMode, Engine, EngineConfig, Error, Graph, Node, NodeId,
        Rect, Result, SharedEngine, SiblingPosition, ViewportIntent,
    };

    pub use crate::{core, engine, graph, layout};
}

pub use nodal_core as core;
pub use nodal_engine as engine;
pub use nodal_graph as graph;
pub use nodal_layout as layout;
