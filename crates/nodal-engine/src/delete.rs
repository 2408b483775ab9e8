//! Subtree deletion with next-focus selection.

use nodal_graph::{Graph, GraphError, NodeId};

/// What [`delete_subtree`] removed and where focus should go next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// Removed node ids, in id order.
    pub deleted: Vec<NodeId>,
    pub next_focus: Option<NodeId>,
}

/// Delete `root` and everything below it.
///
/// Next focus, by priority:
///
/// 1. the sibling visually before `root` under its primary parent
/// 2. the primary parent
/// 3. the survivor nearest to `root`'s center, ties by (y, x, id)
///
/// Candidates 1 and 2 come from the graph as it was before the delete and
/// only count when they survive it.
pub fn delete_subtree(graph: &mut Graph, root: &NodeId) -> Result<DeleteOutcome, GraphError> {
    let Some(root_node) = graph.node(root) else {
        return Err(GraphError::NodeNotFound {
            node_id: root.clone(),
        });
    };
    let center = root_node.bounds.center();
    let parent = graph.primary_parent(root).cloned();
    let upper_sibling = parent.as_ref().and_then(|parent| {
        let siblings = graph.visually_ordered_children(parent);
        let index = siblings.iter().position(|id| id == root)?;
        index.checked_sub(1).map(|prev| siblings[prev].clone())
    });

    let mut deleted = graph.descendants(root);
    deleted.sort();
    for node_id in &deleted {
        let _ = graph.delete_node(node_id)?;
    }

    let next_focus = upper_sibling
        .filter(|id| graph.contains_node(id))
        .or_else(|| parent.filter(|id| graph.contains_node(id)))
        .or_else(|| {
            graph
                .nodes()
                .values()
                .min_by(|a, b| {
                    let da = a.bounds.center().distance_squared(center);
                    let db = b.bounds.center().distance_squared(center);
                    da.total_cmp(&db)
                        .then_with(|| a.bounds.y.total_cmp(&b.bounds.y))
                        .then_with(|| a.bounds.x.total_cmp(&b.bounds.x))
                        .then_with(|| a.id.cmp(&b.id))
                })
                .map(|node| node.id.clone())
        });

    Ok(DeleteOutcome {
        deleted,
        next_focus,
    })
}
