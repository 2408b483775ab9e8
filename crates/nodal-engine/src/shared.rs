//! Thread-safe handle over one [`Engine`].
//!
//! Every entry point takes the same lock, so batches from different threads
//! are serialized and never interleave.

use std::sync::{Arc, Mutex, MutexGuard};

use nodal_graph::Graph;

use crate::command::Command;
use crate::engine::{ApplyOutcome, Engine};
use crate::error::BatchError;

/// Cloneable, shareable engine handle.
#[derive(Debug, Clone, Default)]
pub struct SharedEngine {
    inner: Arc<Mutex<Engine>>,
}

impl SharedEngine {
    #[must_use]
    pub fn new(engine: Engine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    // A panic inside a batch happens before commit, so the guarded engine
    // still holds the last committed state.
    fn lock(&self) -> MutexGuard<'_, Engine> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn apply(&self, commands: &[Command]) -> Result<ApplyOutcome, BatchError> {
        self.lock().apply(commands)
    }

    pub fn undo(&self) -> ApplyOutcome {
        self.lock().undo()
    }

    pub fn redo(&self) -> ApplyOutcome {
        self.lock().redo()
    }

    /// Snapshot of the committed graph.
    #[must_use]
    pub fn graph(&self) -> Graph {
        self.lock().graph().clone()
    }

    /// Run `f` with exclusive access to the engine.
    pub fn with<R>(&self, f: impl FnOnce(&mut Engine) -> R) -> R {
        f(&mut self.lock())
    }
}
