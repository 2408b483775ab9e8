//! The document engine: batch-atomic command application with history.

use nodal_graph::{Graph, GraphError};
use tracing::{debug, debug_span, trace};

use crate::clipboard::SubtreePayload;
use crate::command::{Command, ViewportIntent};
use crate::config::EngineConfig;
use crate::dispatch::dispatch;
use crate::error::{BatchError, CommandFailure};
use crate::handlers::CommandContext;
use crate::history::History;
use crate::pipeline::{BatchEffects, Pipeline};

/// What a caller sees after `apply`, `undo`, or `redo`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyOutcome {
    pub graph: Graph,
    pub can_undo: bool,
    pub can_redo: bool,
    pub viewport_intent: Option<ViewportIntent>,
}

/// Working copy for one batch.
///
/// Commands run against `working`; nothing reaches the engine until
/// `commit`. Dropping the transaction discards it.
#[derive(Debug, Clone)]
struct BatchTransaction {
    base: Graph,
    working: Graph,
    clipboard: Option<SubtreePayload>,
    effects: BatchEffects,
}

impl BatchTransaction {
    fn new(base: &Graph, clipboard: &Option<SubtreePayload>) -> Self {
        Self {
            base: base.clone(),
            working: base.clone(),
            clipboard: clipboard.clone(),
            effects: BatchEffects::default(),
        }
    }

    fn apply_command(
        &mut self,
        config: &EngineConfig,
        pipeline: &Pipeline,
        command: &Command,
    ) -> Result<(), CommandFailure> {
        let mut ctx = CommandContext {
            config,
            pipeline,
            clipboard: &mut self.clipboard,
        };
        let result = dispatch(&mut ctx, &self.working, command)?;
        self.effects.absorb(&result);
        self.working = result.after;
        Ok(())
    }

    /// Run the pipeline once for everything the batch asked for, then
    /// validate the result.
    fn finish(&mut self, pipeline: &Pipeline) -> Result<(), GraphError> {
        pipeline.run(&mut self.working, &self.effects)?;
        self.working.validate()
    }

    fn commit(self) -> CommittedBatch {
        let changed = self.working != self.base;
        CommittedBatch {
            record: self.effects.effects.did_mutate_graph && changed,
            before: self.base,
            after: self.working,
            clipboard: self.clipboard,
            viewport_intent: self.effects.viewport_intent,
        }
    }
}

struct CommittedBatch {
    record: bool,
    before: Graph,
    after: Graph,
    clipboard: Option<SubtreePayload>,
    viewport_intent: Option<ViewportIntent>,
}

/// Single-writer owner of one document.
#[derive(Debug, Clone)]
pub struct Engine {
    graph: Graph,
    clipboard: Option<SubtreePayload>,
    history: History,
    config: EngineConfig,
    pipeline: Pipeline,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    /// An engine over an empty graph.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            graph: Graph::new(),
            clipboard: None,
            history: History::new(config.history_depth),
            pipeline: Pipeline::new(&config),
            config,
        }
    }

    /// An engine over an existing graph, which must pass validation.
    pub fn with_graph(config: EngineConfig, graph: Graph) -> Result<Self, GraphError> {
        graph.validate()?;
        let mut engine = Self::new(config);
        engine.graph = graph;
        Ok(engine)
    }

    #[must_use]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    #[must_use]
    pub fn clipboard(&self) -> Option<&SubtreePayload> {
        self.clipboard.as_ref()
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn begin_batch(&self) -> BatchTransaction {
        BatchTransaction::new(&self.graph, &self.clipboard)
    }

    /// Apply `commands` as one atomic batch.
    ///
    /// On error the engine is exactly as it was before the call.
    pub fn apply(&mut self, commands: &[Command]) -> Result<ApplyOutcome, BatchError> {
        let _span = debug_span!("engine.apply", commands = commands.len()).entered();
        let mut transaction = self.begin_batch();
        for (index, command) in commands.iter().enumerate() {
            transaction
                .apply_command(&self.config, &self.pipeline, command)
                .map_err(|reason| BatchError::at(index, command.kind(), reason))?;
            trace!(index, command = %command.kind(), "command applied");
        }
        transaction
            .finish(&self.pipeline)
            .map_err(BatchError::commit)?;

        let committed = transaction.commit();
        if committed.record {
            self.history.record(committed.before);
        }
        debug!(
            recorded = committed.record,
            nodes = committed.after.node_count(),
            "batch committed"
        );
        self.graph = committed.after;
        self.clipboard = committed.clipboard;
        Ok(self.outcome(committed.viewport_intent))
    }

    /// Restore the previous snapshot. Without one this is a no-op.
    pub fn undo(&mut self) -> ApplyOutcome {
        let _span = debug_span!("engine.undo").entered();
        match self.history.undo(self.graph.clone()) {
            Some(restored) => self.restore(restored),
            None => self.outcome(None),
        }
    }

    /// Re-apply the most recently undone snapshot. Without one this is a no-op.
    pub fn redo(&mut self) -> ApplyOutcome {
        let _span = debug_span!("engine.redo").entered();
        match self.history.redo(self.graph.clone()) {
            Some(restored) => self.restore(restored),
            None => self.outcome(None),
        }
    }

    fn restore(&mut self, restored: Graph) -> ApplyOutcome {
        let focus_moved = restored.focused_node_id() != self.graph.focused_node_id();
        self.graph = restored;
        debug!(focus_moved, "snapshot restored");
        self.outcome(focus_moved.then_some(ViewportIntent::ResetManualPan))
    }

    fn outcome(&self, viewport_intent: Option<ViewportIntent>) -> ApplyOutcome {
        ApplyOutcome {
            graph: self.graph.clone(),
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
            viewport_intent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Direction;
    use nodal_graph::{NodeId, Rect};

    #[test]
    fn failed_batch_changes_nothing() {
        let mut engine = Engine::default();
        engine.apply(&[Command::AddNode { area: None }]).expect("seed");
        let before = engine.graph().clone();
        let err = engine
            .apply(&[
                Command::AddChildNode,
                Command::FocusNode {
                    node_id: NodeId::from("ghost"),
                },
            ])
            .expect_err("missing node");
        assert_eq!(err.command_index, Some(1));
        assert_eq!(engine.graph(), &before);
        assert!(engine.can_undo());
        let _ = engine.undo();
        assert!(engine.graph().is_empty());
    }

    #[test]
    fn focus_moves_are_not_recorded() {
        let mut engine = Engine::default();
        engine
            .apply(&[Command::AddNode { area: None }, Command::AddChildNode])
            .expect("seed");
        let depth_before = engine.history.undo_depth();
        engine
            .apply(&[Command::MoveFocus {
                direction: Direction::Left,
            }])
            .expect("move focus");
        assert_eq!(engine.history.undo_depth(), depth_before);
    }

    #[test]
    fn undo_reports_focus_change() {
        let mut engine = Engine::default();
        engine.apply(&[Command::AddNode { area: None }]).expect("one");
        engine.apply(&[Command::AddNode { area: None }]).expect("two");
        let outcome = engine.undo();
        assert_eq!(outcome.viewport_intent, Some(ViewportIntent::ResetManualPan));
        assert!(outcome.can_redo);
        let focus = outcome.graph.focused_node().expect("focus");
        assert_eq!(focus.bounds, Rect::new(48.0, 48.0, 220.0, 120.0));
    }

    #[test]
    fn undo_without_history_is_a_noop() {
        let mut engine = Engine::default();
        let outcome = engine.undo();
        assert!(!outcome.can_undo);
        assert!(!outcome.can_redo);
        assert_eq!(outcome.viewport_intent, None);
        assert!(outcome.graph.is_empty());
    }

    #[test]
    fn clipboard_survives_across_batches_but_not_failures() {
        let mut engine = Engine::default();
        engine.apply(&[Command::AddNode { area: None }]).expect("seed");
        let _ = engine
            .apply(&[
                Command::CopySubtree,
                Command::FocusNode {
                    node_id: "ghost".into(),
                },
            ])
            .expect_err("fails");
        assert!(engine.clipboard().is_none());
        engine.apply(&[Command::CopySubtree]).expect("copy");
        assert_eq!(engine.clipboard().map(SubtreePayload::node_count), Some(1));
    }

    #[test]
    fn invalid_seed_graph_is_rejected() {
        let mut graph = Graph::new();
        graph
            .create_node(nodal_graph::Node::text("a", Rect::new(0.0, 0.0, 1.0, 1.0)))
            .expect("node");
        assert!(Engine::with_graph(EngineConfig::default(), graph).is_err());
    }
}
