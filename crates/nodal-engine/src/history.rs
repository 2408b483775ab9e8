//! Bounded undo/redo of whole graph snapshots.

use std::collections::VecDeque;

use nodal_graph::Graph;

/// Past and future snapshots, each capped at `max_depth`.
#[derive(Debug, Clone, Default)]
pub struct History {
    past: VecDeque<Graph>,
    future: VecDeque<Graph>,
    max_depth: usize,
}

impl History {
    /// A history holding at most `max_depth` snapshots per direction.
    /// `0` disables recording.
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: VecDeque::new(),
            max_depth,
        }
    }

    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    /// Push the pre-commit snapshot and drop every redo entry.
    pub fn record(&mut self, before: Graph) {
        self.future.clear();
        push_bounded(&mut self.past, before, self.max_depth);
    }

    /// Step back: returns the snapshot to restore and stashes `current` for redo.
    pub fn undo(&mut self, current: Graph) -> Option<Graph> {
        let restored = self.past.pop_back()?;
        push_bounded(&mut self.future, current, self.max_depth);
        Some(restored)
    }

    /// Step forward: returns the snapshot to restore and stashes `current` for undo.
    pub fn redo(&mut self, current: Graph) -> Option<Graph> {
        let restored = self.future.pop_back()?;
        push_bounded(&mut self.past, current, self.max_depth);
        Some(restored)
    }
}

fn push_bounded(stack: &mut VecDeque<Graph>, graph: Graph, max_depth: usize) {
    if max_depth == 0 {
        return;
    }
    while stack.len() >= max_depth {
        let _ = stack.pop_front();
    }
    stack.push_back(graph);
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodal_graph::{Node, Rect};

    fn graph_with(ids: &[&str]) -> Graph {
        let mut graph = Graph::new();
        for id in ids {
            graph
                .create_node(Node::text(*id, Rect::new(0.0, 0.0, 10.0, 10.0)))
                .expect("node");
        }
        graph
    }

    #[test]
    fn undo_then_redo_round_trips() {
        let mut history = History::new(10);
        let before = graph_with(&["a"]);
        let after = graph_with(&["a", "b"]);
        history.record(before.clone());
        assert!(history.can_undo());

        let restored = history.undo(after.clone()).expect("undo");
        assert_eq!(restored, before);
        assert!(history.can_redo());

        let redone = history.redo(restored).expect("redo");
        assert_eq!(redone, after);
        assert!(!history.can_redo());
    }

    #[test]
    fn recording_clears_redo() {
        let mut history = History::new(10);
        history.record(graph_with(&[]));
        let _ = history.undo(graph_with(&["a"]));
        assert!(history.can_redo());
        history.record(graph_with(&[]));
        assert!(!history.can_redo());
    }

    #[test]
    fn oldest_entries_are_evicted() {
        let mut history = History::new(2);
        history.record(graph_with(&["1"]));
        history.record(graph_with(&["2"]));
        history.record(graph_with(&["3"]));
        assert_eq!(history.undo_depth(), 2);
        let newest = history.undo(Graph::new()).expect("undo");
        assert!(newest.contains_node(&"3".into()));
        let older = history.undo(Graph::new()).expect("undo");
        assert!(older.contains_node(&"2".into()));
        assert!(history.undo(Graph::new()).is_none());
    }

    #[test]
    fn zero_depth_disables_history() {
        let mut history = History::new(0);
        history.record(graph_with(&["a"]));
        assert!(!history.can_undo());
        assert!(history.undo(Graph::new()).is_none());
    }
}
