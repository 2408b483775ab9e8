#![forbid(unsafe_code)]

//! Core: canvas geometry and logging shared by the graph, layout, and engine crates.

pub mod geometry;
pub mod logging;

#[cfg(feature = "tracing")]
pub use logging::{debug, trace};
