//! One handler per command.
//!
//! Handlers edit a working graph in place and report which pipeline stages
//! must run afterwards. They never lay out the graph themselves except where
//! a command needs final positions before it returns (add-child-node).

use std::collections::BTreeSet;

use nodal_core::geometry::Rect;
use nodal_graph::{
    Area, AreaId, Attachment, AttachmentKind, Edge, EditingMode, Graph, GraphError, Node, NodeId,
    RelationType,
};
use tracing::trace;

use crate::clipboard::{self, SubtreePayload};
use crate::command::{Command, Direction, SiblingPosition, ViewportIntent};
use crate::config::EngineConfig;
use crate::delete;
use crate::error::CommandFailure;
use crate::focus;
use crate::pipeline::{MutationEffects, Pipeline};

/// Engine state a handler may read or update besides the graph.
pub struct CommandContext<'a> {
    pub config: &'a EngineConfig,
    pub pipeline: &'a Pipeline,
    pub clipboard: &'a mut Option<SubtreePayload>,
}

/// What a handler did.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HandlerOutcome {
    pub effects: MutationEffects,
    pub seed: Option<NodeId>,
    pub viewport_intent: Option<ViewportIntent>,
}

impl HandlerOutcome {
    fn noop() -> Self {
        Self::default()
    }

    fn with(effects: MutationEffects, seed: Option<NodeId>) -> Self {
        Self {
            effects,
            seed,
            viewport_intent: None,
        }
    }

    fn structural(seed: NodeId) -> Self {
        Self::with(MutationEffects::STRUCTURAL, Some(seed))
    }
}

/// Flag-only edits: nothing moves.
const FLAG_ONLY: MutationEffects = MutationEffects {
    did_mutate_graph: true,
    needs_tree_layout: false,
    needs_area_layout: false,
    needs_focus_normalization: false,
};

type HandlerResult = Result<HandlerOutcome, CommandFailure>;

/// Run the handler for `command` against `graph`.
pub fn handle(
    ctx: &mut CommandContext<'_>,
    graph: &mut Graph,
    command: &Command,
) -> HandlerResult {
    trace!(command = %command.kind(), "handling command");
    match command {
        Command::AddNode { area } => add_node(ctx, graph, area.as_ref()),
        Command::AddChildNode => add_child_node(ctx, graph),
        Command::AddSiblingNode { position } => add_sibling_node(ctx, graph, *position),
        Command::MoveFocus { direction } => move_focus(graph, *direction),
        Command::MoveNode { direction } => move_node(ctx, graph, *direction),
        Command::ExtendSelection { direction } => extend_selection(graph, *direction),
        Command::ToggleFoldSubtree => toggle_fold_subtree(graph),
        Command::CenterFocusedNode => center_focused_node(graph),
        Command::DeleteFocusedNode => delete_focused_node(graph),
        Command::CopySubtree => copy_subtree(ctx, graph),
        Command::CutSubtree => {
            let _ = copy_subtree(ctx, graph)?;
            delete_focused_node(graph)
        }
        Command::PasteSubtree => paste_subtree(ctx, graph),
        Command::DuplicateSelectionAsSibling => duplicate_selection(ctx, graph),
        Command::SetNodeText {
            node_id,
            text,
            measured_height,
        } => set_node_text(graph, node_id, text, *measured_height),
        Command::SetNodeImage {
            node_id,
            path,
            measured_height,
        } => set_node_image(graph, node_id, path, *measured_height),
        Command::UpsertNodeAttachment {
            node_id,
            attachment,
            width,
            height,
        } => upsert_node_attachment(graph, node_id, attachment, *width, *height),
        Command::ToggleMarkdownStyle => toggle_markdown_style(graph),
        Command::AlignParentNodesVertically => align_parent_nodes_vertically(graph),
        Command::ConnectNodes { from, to } => connect_nodes(graph, from, to),
        Command::FocusNode { node_id } => focus_node(graph, node_id),
        Command::CreateArea {
            area_id,
            mode,
            node_ids,
        } => create_area(graph, area_id, *mode, node_ids),
        Command::AssignNodesToArea { node_ids, area_id } => {
            assign_nodes_to_area(graph, node_ids, area_id)
        }
        Command::ConvertAreaMode { to } => convert_area_mode(graph, *to),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// The focused node id, failing when focus is absent or stale.
fn require_focus(graph: &Graph) -> Result<NodeId, CommandFailure> {
    graph
        .focused_node()
        .map(|node| node.id.clone())
        .ok_or(CommandFailure::FocusedNodeNotFound)
}

fn require_node(graph: &Graph, node_id: &NodeId) -> Result<Node, CommandFailure> {
    graph.node(node_id).cloned().ok_or_else(|| {
        CommandFailure::Graph(GraphError::NodeNotFound {
            node_id: node_id.clone(),
        })
    })
}

/// Focus `node_id` and make it the only point of attention.
fn focus_alone(graph: &mut Graph, node_id: &NodeId) -> Result<(), GraphError> {
    graph.set_focused_node_id(Some(node_id.clone()))?;
    graph.set_selected_node_ids(std::iter::empty::<NodeId>())
}

/// Slide `rect` vertically until it overlaps no node, keeping `gap` from
/// every node it had to skip.
fn clear_vertically(graph: &Graph, mut rect: Rect, gap: f64, downward: bool) -> Rect {
    for _ in 0..=graph.node_count() {
        let blockers = graph
            .nodes()
            .values()
            .filter(|node| node.bounds.intersects(&rect))
            .map(|node| node.bounds);
        let next_y = if downward {
            blockers
                .map(|bounds| bounds.bottom() + gap)
                .reduce(f64::max)
        } else {
            blockers
                .map(|bounds| bounds.top() - gap - rect.height)
                .reduce(f64::min)
        };
        match next_y {
            Some(y) => rect = rect.with_origin(rect.x, y),
            None => break,
        }
    }
    rect
}

/// Create a node with the configured size at (`x`, `y`).
fn insert_node(
    ctx: &CommandContext<'_>,
    graph: &mut Graph,
    x: f64,
    y: f64,
) -> Result<NodeId, GraphError> {
    let node_id = graph.mint_node_id();
    let placement = &ctx.config.placement;
    graph.create_node(Node::text(
        node_id.clone(),
        Rect::new(x, y, placement.node_width, placement.node_height),
    ))?;
    Ok(node_id)
}

fn join_area_of(graph: &mut Graph, node_id: &NodeId, like: &NodeId) -> Result<(), GraphError> {
    match graph.area_of(like).map(|area| area.id.clone()) {
        Some(area_id) => graph.assign_node_to_area(node_id, &area_id),
        None => Ok(()),
    }
}

fn link_child(
    graph: &mut Graph,
    parent: &NodeId,
    child: &NodeId,
    order: i64,
) -> Result<(), GraphError> {
    let edge_id = graph.mint_edge_id();
    graph.create_edge(Edge::parent_child(
        edge_id,
        parent.clone(),
        child.clone(),
        Some(order),
    ))
}

/// Spacing that keeps two separate top-level subtrees out of each other's
/// collision margin.
fn root_gap(ctx: &CommandContext<'_>) -> f64 {
    ctx.config
        .placement
        .gap
        .max(ctx.config.area_layout.min_spacing)
}

/// Bounding band of `root` and its visible layout below it.
fn subtree_band(graph: &Graph, root: &NodeId) -> Option<Rect> {
    Rect::union_all(
        graph
            .descendants(root)
            .iter()
            .filter_map(|id| graph.node(id))
            .map(|node| &node.bounds),
    )
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

fn add_node(
    ctx: &mut CommandContext<'_>,
    graph: &mut Graph,
    area: Option<&AreaId>,
) -> HandlerResult {
    let area_id = match area {
        Some(area_id) => {
            if graph.area(area_id).is_none() {
                graph.create_area(Area::new(area_id.clone(), EditingMode::Tree))?;
            }
            area_id.clone()
        }
        None => match graph
            .focused_node_id()
            .and_then(|focus| graph.area_of(focus))
            .or_else(|| graph.areas().values().next())
        {
            Some(existing) => existing.id.clone(),
            None => {
                let area_id = graph.mint_area_id();
                graph.create_area(Area::new(area_id.clone(), EditingMode::Tree))?;
                area_id
            }
        },
    };

    let placement = ctx.config.placement;
    let gap = root_gap(ctx);
    let focus_in_area = graph
        .focused_node()
        .filter(|node| graph.area_of(&node.id).is_some_and(|area| area.id == area_id))
        .map(|node| node.bounds);
    let bottom_most = || {
        graph.area(&area_id).and_then(|area| {
            area.node_ids
                .iter()
                .filter_map(|id| graph.node(id))
                .max_by(|a, b| {
                    a.bounds
                        .bottom()
                        .total_cmp(&b.bounds.bottom())
                        .then_with(|| b.id.cmp(&a.id))
                })
                .map(|node| node.bounds)
        })
    };
    let (x, y) = match focus_in_area.or_else(bottom_most) {
        Some(anchor) => (anchor.x, anchor.bottom() + gap),
        None => (placement.origin_x, placement.origin_y),
    };
    let rect = clear_vertically(
        graph,
        Rect::new(x, y, placement.node_width, placement.node_height),
        gap,
        true,
    );

    let node_id = insert_node(ctx, graph, rect.x, rect.y)?;
    graph.assign_node_to_area(&node_id, &area_id)?;
    focus_alone(graph, &node_id)?;
    Ok(HandlerOutcome::structural(node_id))
}

fn add_child_node(ctx: &mut CommandContext<'_>, graph: &mut Graph) -> HandlerResult {
    let parent = require_focus(graph)?;
    let parent_bounds = require_node(graph, &parent)?.bounds;
    if graph.is_collapsed(&parent) {
        graph.set_collapsed(&parent, false)?;
    }
    let order = graph.next_parent_child_order(&parent);
    let x = parent_bounds.right() + ctx.config.tree_layout.horizontal_spacing;
    let child = insert_node(ctx, graph, x, parent_bounds.y)?;
    link_child(graph, &parent, &child, order)?;
    join_area_of(graph, &child, &parent)?;
    focus_alone(graph, &child)?;

    let stats = ctx.pipeline.tree_layout().apply(graph)?;
    trace!(nodes_moved = stats.nodes_moved, "inline tree layout");
    Ok(HandlerOutcome::structural(child))
}

fn add_sibling_node(
    ctx: &mut CommandContext<'_>,
    graph: &mut Graph,
    position: SiblingPosition,
) -> HandlerResult {
    let anchor = require_focus(graph)?;
    let anchor_bounds = require_node(graph, &anchor)?.bounds;
    let placement = ctx.config.placement;

    let sibling = match graph.primary_parent(&anchor).cloned() {
        Some(parent) => {
            graph.normalize_parent_child_order(&parent)?;
            let order = graph.child_order(&parent, &anchor).unwrap_or(0);
            let slot = match position {
                SiblingPosition::Above => order,
                SiblingPosition::Below => order + 1,
            };
            graph.shift_parent_child_order(&parent, slot, 1)?;
            let y = match position {
                SiblingPosition::Above => anchor_bounds.y - placement.gap - placement.node_height,
                SiblingPosition::Below => anchor_bounds.bottom() + placement.gap,
            };
            let sibling = insert_node(ctx, graph, anchor_bounds.x, y)?;
            link_child(graph, &parent, &sibling, slot)?;
            sibling
        }
        None => {
            let gap = root_gap(ctx);
            let band = subtree_band(graph, &anchor).unwrap_or(anchor_bounds);
            let (y, downward) = match position {
                SiblingPosition::Above => (band.top() - gap - placement.node_height, false),
                SiblingPosition::Below => (band.bottom() + gap, true),
            };
            let rect = clear_vertically(
                graph,
                Rect::new(anchor_bounds.x, y, placement.node_width, placement.node_height),
                gap,
                downward,
            );
            insert_node(ctx, graph, rect.x, rect.y)?
        }
    };
    join_area_of(graph, &sibling, &anchor)?;
    focus_alone(graph, &sibling)?;
    Ok(HandlerOutcome::structural(sibling))
}

// ---------------------------------------------------------------------------
// Focus and selection
// ---------------------------------------------------------------------------

fn move_focus(graph: &mut Graph, direction: Direction) -> HandlerResult {
    let current = require_focus(graph)?;
    let Some(next) = focus::next_in_direction(graph, &current, direction) else {
        return Ok(HandlerOutcome::noop());
    };
    focus_alone(graph, &next)?;
    Ok(HandlerOutcome::with(MutationEffects::FOCUS_ONLY, None))
}

fn extend_selection(graph: &mut Graph, direction: Direction) -> HandlerResult {
    let current = require_focus(graph)?;
    match focus::next_in_direction(graph, &current, direction) {
        Some(next) => {
            let mut selection = graph.selected_node_ids().clone();
            let _ = selection.insert(current);
            let _ = selection.insert(next.clone());
            graph.set_selected_node_ids(selection)?;
            graph.set_focused_node_id(Some(next))?;
        }
        None => {
            if graph.selected_node_ids().len() == 1 && graph.selected_node_ids().contains(&current)
            {
                return Ok(HandlerOutcome::noop());
            }
            graph.set_selected_node_ids([current])?;
        }
    }
    Ok(HandlerOutcome::with(MutationEffects::FOCUS_ONLY, None))
}

fn focus_node(graph: &mut Graph, node_id: &NodeId) -> HandlerResult {
    require_node(graph, node_id)?;
    if graph.focused_node_id() == Some(node_id) && graph.selected_node_ids().is_empty() {
        return Ok(HandlerOutcome::noop());
    }
    focus_alone(graph, node_id)?;
    Ok(HandlerOutcome::with(MutationEffects::FOCUS_ONLY, None))
}

fn center_focused_node(graph: &mut Graph) -> HandlerResult {
    let node_id = require_focus(graph)?;
    Ok(HandlerOutcome {
        viewport_intent: Some(ViewportIntent::CenterOnNode { node_id }),
        ..HandlerOutcome::noop()
    })
}

// ---------------------------------------------------------------------------
// Structure
// ---------------------------------------------------------------------------

fn move_node(
    ctx: &mut CommandContext<'_>,
    graph: &mut Graph,
    direction: Direction,
) -> HandlerResult {
    let node = require_focus(graph)?;
    let moved = match direction {
        Direction::Up | Direction::Down => swap_with_sibling(graph, &node, direction)?,
        Direction::Right => indent(graph, &node)?,
        Direction::Left => outdent(ctx, graph, &node)?,
    };
    Ok(if moved {
        HandlerOutcome::structural(node)
    } else {
        HandlerOutcome::noop()
    })
}

fn swap_with_sibling(
    graph: &mut Graph,
    node: &NodeId,
    direction: Direction,
) -> Result<bool, GraphError> {
    let Some(parent) = graph.primary_parent(node).cloned() else {
        return Ok(false);
    };
    graph.normalize_parent_child_order(&parent)?;
    let sibling = match direction {
        Direction::Up => graph.previous_sibling(node),
        _ => graph.next_sibling(node),
    };
    let Some(sibling) = sibling else {
        return Ok(false);
    };
    let (Some(own), Some(other)) = (
        graph.parent_child_edge(&parent, node).cloned(),
        graph.parent_child_edge(&parent, &sibling).cloned(),
    ) else {
        return Ok(false);
    };
    let own_order = own.parent_child_order.unwrap_or(0);
    let other_order = other.parent_child_order.unwrap_or(0);
    graph.set_edge_order(&own.id, other_order)?;
    graph.set_edge_order(&other.id, own_order)?;
    Ok(true)
}

/// Previous top-level node of `node`'s area in visual order.
fn previous_root(graph: &Graph, node: &NodeId) -> Option<NodeId> {
    let area = graph.area_of(node)?;
    let mut roots = graph
        .roots_within(&area.node_ids)
        .into_iter()
        .filter_map(|id| graph.node(&id))
        .collect::<Vec<_>>();
    roots.sort_by(|a, b| a.visual_cmp(b));
    let index = roots.iter().position(|root| &root.id == node)?;
    index.checked_sub(1).map(|prev| roots[prev].id.clone())
}

fn indent(graph: &mut Graph, node: &NodeId) -> Result<bool, GraphError> {
    let old_edge = graph.primary_parent_edge(node).cloned();
    let new_parent = match &old_edge {
        Some(_) => graph.previous_sibling(node),
        None => previous_root(graph, node),
    };
    let Some(new_parent) = new_parent else {
        return Ok(false);
    };
    if &new_parent == node || graph.is_ancestor(node, &new_parent) {
        return Ok(false);
    }
    if let Some(old_edge) = &old_edge {
        let _ = graph.delete_edge(&old_edge.id)?;
        graph.normalize_parent_child_order(&old_edge.from)?;
    }
    let order = graph.next_parent_child_order(&new_parent);
    link_child(graph, &new_parent, node, order)?;
    if graph.is_collapsed(&new_parent) {
        graph.set_collapsed(&new_parent, false)?;
    }
    Ok(true)
}

fn outdent(
    ctx: &CommandContext<'_>,
    graph: &mut Graph,
    node: &NodeId,
) -> Result<bool, GraphError> {
    let Some(old_edge) = graph.primary_parent_edge(node).cloned() else {
        return Ok(false);
    };
    let parent = old_edge.from.clone();
    match graph.primary_parent(&parent).cloned() {
        Some(grandparent) => {
            if &grandparent == node || graph.is_ancestor(node, &grandparent) {
                return Ok(false);
            }
            let _ = graph.delete_edge(&old_edge.id)?;
            graph.normalize_parent_child_order(&parent)?;
            graph.normalize_parent_child_order(&grandparent)?;
            let slot = graph
                .child_order(&grandparent, &parent)
                .map_or(0, |order| order + 1);
            graph.shift_parent_child_order(&grandparent, slot, 1)?;
            link_child(graph, &grandparent, node, slot)?;
        }
        None => {
            let _ = graph.delete_edge(&old_edge.id)?;
            graph.normalize_parent_child_order(&parent)?;
            // The detached subtree becomes a root below the old outline.
            let Some(band) = subtree_band(graph, &parent) else {
                return Ok(true);
            };
            let Some(bounds) = graph.bounds(node) else {
                return Ok(true);
            };
            let gap = root_gap(ctx);
            let target = clear_vertically(
                graph,
                bounds.with_origin(band.x, band.bottom() + gap),
                gap,
                true,
            );
            let (dx, dy) = (target.x - bounds.x, target.y - bounds.y);
            for member in graph.descendants(node) {
                if let Some(member_bounds) = graph.bounds(&member) {
                    graph.set_node_bounds(&member, member_bounds.translated(dx, dy))?;
                }
            }
        }
    }
    Ok(true)
}

fn toggle_fold_subtree(graph: &mut Graph) -> HandlerResult {
    let node = require_focus(graph)?;
    let has_children = !graph.child_edges(&node).is_empty();
    let collapsed = graph.is_collapsed(&node);
    if !has_children && !collapsed {
        return Ok(HandlerOutcome::noop());
    }
    graph.set_collapsed(&node, !collapsed)?;
    if !collapsed {
        let hidden = graph.hidden_node_ids();
        let selection = graph
            .selected_node_ids()
            .iter()
            .filter(|id| !hidden.contains(*id))
            .cloned()
            .collect::<Vec<_>>();
        graph.set_selected_node_ids(selection)?;
    }
    Ok(HandlerOutcome::structural(node))
}

fn delete_focused_node(graph: &mut Graph) -> HandlerResult {
    let node = require_focus(graph)?;
    let outcome = delete::delete_subtree(graph, &node)?;
    trace!(deleted = outcome.deleted.len(), "subtree deleted");
    graph.set_focused_node_id(outcome.next_focus.clone())?;
    graph.set_selected_node_ids(std::iter::empty::<NodeId>())?;
    Ok(HandlerOutcome {
        effects: MutationEffects::STRUCTURAL,
        seed: outcome.next_focus,
        viewport_intent: None,
    })
}

fn align_parent_nodes_vertically(graph: &mut Graph) -> HandlerResult {
    let focus = require_focus(graph)?;
    let Some(area) = graph.area_of(&focus).cloned() else {
        return Ok(HandlerOutcome::noop());
    };
    let roots = graph.roots_within(&area.node_ids);
    let Some(left) = roots
        .iter()
        .filter_map(|id| graph.bounds(id))
        .map(|bounds| bounds.x)
        .reduce(f64::min)
    else {
        return Ok(HandlerOutcome::noop());
    };
    let mut moved = false;
    for root in &roots {
        if let Some(bounds) = graph.bounds(root)
            && bounds.x != left
        {
            graph.set_node_bounds(root, bounds.with_origin(left, bounds.y))?;
            moved = true;
        }
    }
    Ok(if moved {
        HandlerOutcome::structural(focus)
    } else {
        HandlerOutcome::noop()
    })
}

fn connect_nodes(graph: &mut Graph, from: &NodeId, to: &NodeId) -> HandlerResult {
    if from == to {
        return Err(CommandFailure::InvalidConnection {
            from: from.clone(),
            to: to.clone(),
        });
    }
    require_node(graph, from)?;
    require_node(graph, to)?;
    let exists = graph.edges().values().any(|edge| {
        edge.relation == RelationType::Normal
            && ((&edge.from == from && &edge.to == to) || (&edge.from == to && &edge.to == from))
    });
    if exists {
        return Ok(HandlerOutcome::noop());
    }
    let edge_id = graph.mint_edge_id();
    graph.create_edge(Edge::normal(edge_id, from.clone(), to.clone()))?;
    Ok(HandlerOutcome::with(FLAG_ONLY, None))
}

// ---------------------------------------------------------------------------
// Clipboard
// ---------------------------------------------------------------------------

fn copy_subtree(ctx: &mut CommandContext<'_>, graph: &mut Graph) -> HandlerResult {
    let node = require_focus(graph)?;
    let payload = SubtreePayload::capture(graph, &node)?;
    trace!(nodes = payload.node_count(), "subtree copied");
    *ctx.clipboard = Some(payload);
    Ok(HandlerOutcome::noop())
}

fn paste_subtree(ctx: &mut CommandContext<'_>, graph: &mut Graph) -> HandlerResult {
    let parent = require_focus(graph)?;
    let Some(payload) = ctx.clipboard.as_ref() else {
        return Ok(HandlerOutcome::noop());
    };
    if graph.is_collapsed(&parent) {
        graph.set_collapsed(&parent, false)?;
    }
    let pasted = clipboard::paste_under(graph, payload, &parent, &ctx.config.placement)?;
    focus_alone(graph, &pasted.root)?;
    Ok(HandlerOutcome::structural(pasted.root))
}

fn duplicate_selection(ctx: &mut CommandContext<'_>, graph: &mut Graph) -> HandlerResult {
    let selection = if graph.selected_node_ids().is_empty() {
        BTreeSet::from([require_focus(graph)?])
    } else {
        graph.selected_node_ids().clone()
    };
    let clones = clipboard::duplicate_as_siblings(graph, &selection, root_gap(ctx))?;
    let Some(first) = clones.first().cloned() else {
        return Ok(HandlerOutcome::noop());
    };
    graph.set_focused_node_id(Some(first.clone()))?;
    graph.set_selected_node_ids(clones)?;
    Ok(HandlerOutcome::structural(first))
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

/// Measured sizes must be finite and positive to be stored.
fn measured(value: f64) -> Option<f64> {
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Apply `edit` to a copy of the node and store it if anything changed.
fn edit_node<F>(graph: &mut Graph, node_id: &NodeId, edit: F) -> HandlerResult
where
    F: FnOnce(&mut Node),
{
    let current = require_node(graph, node_id)?;
    let mut edited = current.clone();
    edit(&mut edited);
    if edited == current {
        return Ok(HandlerOutcome::noop());
    }
    graph.update_node(edited)?;
    Ok(HandlerOutcome::with(
        MutationEffects::CONTENT,
        Some(node_id.clone()),
    ))
}

fn set_node_text(
    graph: &mut Graph,
    node_id: &NodeId,
    text: &str,
    measured_height: f64,
) -> HandlerResult {
    edit_node(graph, node_id, |node| {
        node.text = Some(text.to_string());
        if let Some(height) = measured(measured_height) {
            node.bounds.height = height;
        }
    })
}

fn set_node_image(
    graph: &mut Graph,
    node_id: &NodeId,
    path: &str,
    measured_height: f64,
) -> HandlerResult {
    edit_node(graph, node_id, |node| {
        let image = AttachmentKind::Image {
            path: path.to_string(),
        };
        match node.attachments.iter().position(Attachment::is_image) {
            Some(index) => node.attachments[index].kind = image,
            None => {
                let id = fresh_attachment_id(node, "image");
                node.attachments.push(Attachment {
                    id,
                    kind: image,
                    placement: Default::default(),
                });
            }
        }
        if let Some(height) = measured(measured_height) {
            node.bounds.height = height;
        }
    })
}

fn fresh_attachment_id(node: &Node, prefix: &str) -> String {
    (1..)
        .map(|serial| format!("{prefix}-{serial}"))
        .find(|candidate| !node.attachments.iter().any(|a| &a.id == candidate))
        .unwrap_or_else(|| prefix.to_string())
}

fn upsert_node_attachment(
    graph: &mut Graph,
    node_id: &NodeId,
    attachment: &Attachment,
    width: f64,
    height: f64,
) -> HandlerResult {
    edit_node(graph, node_id, |node| {
        match node
            .attachments
            .iter()
            .position(|existing| existing.id == attachment.id)
        {
            Some(index) => node.attachments[index] = attachment.clone(),
            None => node.attachments.push(attachment.clone()),
        }
        if let Some(width) = measured(width) {
            node.bounds.width = width;
        }
        if let Some(height) = measured(height) {
            node.bounds.height = height;
        }
    })
}

fn toggle_markdown_style(graph: &mut Graph) -> HandlerResult {
    let node_id = require_focus(graph)?;
    graph.modify_node(&node_id, |node| {
        node.markdown_style_enabled = !node.markdown_style_enabled;
    })?;
    Ok(HandlerOutcome::with(FLAG_ONLY, Some(node_id)))
}

// ---------------------------------------------------------------------------
// Areas
// ---------------------------------------------------------------------------

fn create_area(
    graph: &mut Graph,
    area_id: &AreaId,
    mode: EditingMode,
    node_ids: &BTreeSet<NodeId>,
) -> HandlerResult {
    graph.create_area(Area {
        id: area_id.clone(),
        node_ids: node_ids.clone(),
        mode,
    })?;
    Ok(HandlerOutcome::with(
        MutationEffects::STRUCTURAL,
        node_ids.first().cloned(),
    ))
}

fn assign_nodes_to_area(
    graph: &mut Graph,
    node_ids: &BTreeSet<NodeId>,
    area_id: &AreaId,
) -> HandlerResult {
    let already = graph
        .area(area_id)
        .is_some_and(|area| node_ids.is_subset(&area.node_ids));
    graph.assign_nodes_to_area(node_ids, area_id)?;
    if already {
        return Ok(HandlerOutcome::noop());
    }
    Ok(HandlerOutcome::with(
        MutationEffects::STRUCTURAL,
        node_ids.first().cloned(),
    ))
}

fn convert_area_mode(graph: &mut Graph, to: EditingMode) -> HandlerResult {
    let focus = require_focus(graph)?;
    let Some(area) = graph.area_of(&focus) else {
        return Err(CommandFailure::AreaDataMissing);
    };
    if area.mode == to {
        return Ok(HandlerOutcome::noop());
    }
    let area_id = area.id.clone();
    graph.set_area_mode(&area_id, to)?;
    Ok(HandlerOutcome::structural(focus))
}
