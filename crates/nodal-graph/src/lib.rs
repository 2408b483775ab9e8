#![forbid(unsafe_code)]

//! Graph snapshot model for the nodal canvas engine.
//!
//! - [`Graph`] - the sole unit of editor state: nodes, edges, focus, selection,
//!   fold state, and area membership.
//! - [`crud`] - create/update/delete primitives with referential-integrity checks.
//! - [`order`] - effective sibling order and the normalize/shift/next primitives.
//! - [`traverse`] - cycle-guarded descendant, ancestor, and visibility queries.
//! - [`invariants`] - structured invariant report used before every commit.

pub mod crud;
pub mod error;
pub mod ids;
pub mod invariants;
pub mod model;
pub mod order;
pub mod traverse;

pub use error::GraphError;
pub use ids::{AreaId, EdgeId, NodeId};
pub use invariants::{InvariantCode, InvariantIssue, InvariantReport, InvariantSeverity};
pub use model::{
    Area, Attachment, AttachmentKind, AttachmentPlacement, Edge, EditingMode, Graph, Node,
    NodeKind, RelationType,
};
pub use nodal_core::geometry::{Point, Rect};
pub use order::OrderedChild;
