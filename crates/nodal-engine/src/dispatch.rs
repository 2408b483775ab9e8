//! Command routing: policy gate, then handler.

use nodal_graph::Graph;

use crate::command::Command;
use crate::error::CommandFailure;
use crate::handlers::{self, CommandContext};
use crate::pipeline::MutationResult;
use crate::policy;

/// Check `command` against the gate and run its handler on a copy of `graph`.
///
/// `graph` itself is never modified; the result carries both snapshots.
pub fn dispatch(
    ctx: &mut CommandContext<'_>,
    graph: &Graph,
    command: &Command,
) -> Result<MutationResult, CommandFailure> {
    policy::check(graph, command)?;
    let mut working = graph.clone();
    let outcome = handlers::handle(ctx, &mut working, command)?;
    Ok(MutationResult {
        before: graph.clone(),
        after: working,
        effects: outcome.effects,
        area_layout_seed: outcome.seed,
        viewport_intent: outcome.viewport_intent,
    })
}
