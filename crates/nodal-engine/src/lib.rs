#![forbid(unsafe_code)]

//! Command engine for the nodal canvas.
//!
//! A batch of [`Command`]s runs against a working copy of the graph. Each
//! command passes the per-mode [`policy`] gate, runs its handler, and reports
//! [`MutationEffects`]. After the last command the [`Pipeline`] runs tree
//! layout, area overlap resolution, and focus normalization once, the result
//! is validated, and only then does the [`Engine`] commit and record history.
//!
//! # Example
//!
//! ```
//! use nodal_engine::{Command, Engine};
//!
//! let mut engine = Engine::default();
//! let outcome = engine
//!     .apply(&[Command::AddNode { area: None }, Command::AddChildNode])
//!     .expect("batch applies");
//! assert_eq!(outcome.graph.node_count(), 2);
//! assert!(outcome.can_undo);
//! ```

pub mod clipboard;
pub mod command;
pub mod config;
pub mod delete;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod focus;
pub mod handlers;
pub mod history;
pub mod pipeline;
pub mod policy;
pub mod shared;

pub use clipboard::{PastedSubtree, SubtreePayload};
pub use command::{Command, CommandKind, Direction, SiblingPosition, ViewportIntent};
pub use config::{EngineConfig, PlacementConfig};
pub use delete::DeleteOutcome;
pub use dispatch::dispatch;
pub use engine::{ApplyOutcome, Engine};
pub use error::{BatchError, CommandFailure};
pub use history::History;
pub use pipeline::{BatchEffects, MutationEffects, MutationResult, Pipeline};
pub use shared::SharedEngine;
