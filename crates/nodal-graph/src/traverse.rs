//! Hierarchy traversal.
//!
//! Parent-child edges are not guaranteed to form a forest: a node may have
//! several parents and a cycle may be introduced by a caller. Every walk here
//! keeps a visited set so it terminates on any input.

use std::collections::{BTreeSet, VecDeque};

use crate::ids::NodeId;
use crate::model::Graph;

impl Graph {
    /// `root` and everything reachable below it, preorder in effective sibling order.
    #[must_use]
    pub fn descendants(&self, root: &NodeId) -> Vec<NodeId> {
        if !self.nodes.contains_key(root) {
            return Vec::new();
        }
        let mut visited = BTreeSet::new();
        let mut out = Vec::new();
        let mut stack = vec![root.clone()];
        while let Some(current) = stack.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            let children = self.ordered_children(&current);
            out.push(current);
            for child in children.into_iter().rev() {
                if !visited.contains(&child) {
                    stack.push(child);
                }
            }
        }
        out
    }

    /// Descendants of `root`, excluding `root` itself.
    #[must_use]
    pub fn strict_descendants(&self, root: &NodeId) -> BTreeSet<NodeId> {
        let mut set = self.descendants(root).into_iter().collect::<BTreeSet<_>>();
        // A cycle through `root` would otherwise put it back in.
        let _ = set.remove(root);
        set
    }

    /// Whether `node` is reachable from `ancestor` through parent-child edges.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: &NodeId, node: &NodeId) -> bool {
        if ancestor == node {
            return false;
        }
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::from([ancestor.clone()]);
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.clone()) {
                continue;
            }
            for edge in self.child_edges(&current) {
                if &edge.to == node {
                    return true;
                }
                queue.push_back(edge.to.clone());
            }
        }
        false
    }

    /// Nodes hidden under a collapsed root. Collapsed roots themselves stay
    /// visible unless another collapsed root hides them.
    #[must_use]
    pub fn hidden_node_ids(&self) -> BTreeSet<NodeId> {
        self.collapsed_root_node_ids
            .iter()
            .filter(|root| self.nodes.contains_key(*root))
            .flat_map(|root| self.strict_descendants(root))
            .collect()
    }

    #[must_use]
    pub fn is_visible(&self, node_id: &NodeId) -> bool {
        self.nodes.contains_key(node_id) && !self.hidden_node_ids().contains(node_id)
    }

    /// The collapsed root hiding `node_id` that is not itself hidden.
    ///
    /// Falls back to the smallest-id collapsed ancestor when every candidate
    /// hides another (only possible with a cycle).
    #[must_use]
    pub fn outermost_collapsed_ancestor(&self, node_id: &NodeId) -> Option<NodeId> {
        let candidates = self
            .collapsed_root_node_ids
            .iter()
            .filter(|root| self.nodes.contains_key(*root) && self.is_ancestor(root, node_id))
            .collect::<Vec<_>>();
        candidates
            .iter()
            .find(|candidate| {
                !candidates
                    .iter()
                    .any(|other| other != *candidate && self.is_ancestor(other, candidate))
            })
            .or_else(|| candidates.first())
            .map(|root| (*root).clone())
    }

    /// Members of `node_ids` that are not below another member.
    ///
    /// Result is in visual order (top, left, id).
    #[must_use]
    pub fn subtree_roots(&self, node_ids: &BTreeSet<NodeId>) -> Vec<NodeId> {
        let mut roots = node_ids
            .iter()
            .filter(|candidate| self.nodes.contains_key(*candidate))
            .filter(|candidate| {
                !node_ids
                    .iter()
                    .any(|other| other != *candidate && self.is_ancestor(other, candidate))
            })
            .filter_map(|id| self.nodes.get(id))
            .collect::<Vec<_>>();
        roots.sort_by(|a, b| a.visual_cmp(b));
        roots.into_iter().map(|node| node.id.clone()).collect()
    }

    /// Members of `members` with no parent-child parent inside `members`.
    #[must_use]
    pub fn roots_within(&self, members: &BTreeSet<NodeId>) -> Vec<NodeId> {
        members
            .iter()
            .filter(|member| self.nodes.contains_key(*member))
            .filter(|member| {
                !self
                    .parent_edges(member)
                    .iter()
                    .any(|edge| members.contains(&edge.from))
            })
            .cloned()
            .collect()
    }

    /// Partition `members` into components connected by parent-child edges
    /// whose endpoints both lie in `members`. Components come out ordered by
    /// their smallest id.
    #[must_use]
    pub fn parent_child_components(&self, members: &BTreeSet<NodeId>) -> Vec<BTreeSet<NodeId>> {
        let mut assigned = BTreeSet::new();
        let mut components = Vec::new();
        for start in members {
            if assigned.contains(start) || !self.nodes.contains_key(start) {
                continue;
            }
            let mut component = BTreeSet::new();
            let mut queue = VecDeque::from([start.clone()]);
            while let Some(current) = queue.pop_front() {
                if !component.insert(current.clone()) {
                    continue;
                }
                for edge in self.edges.values() {
                    if !edge.is_parent_child() {
                        continue;
                    }
                    let neighbor = if edge.from == current {
                        &edge.to
                    } else if edge.to == current {
                        &edge.from
                    } else {
                        continue;
                    };
                    if members.contains(neighbor) && !component.contains(neighbor) {
                        queue.push_back(neighbor.clone());
                    }
                }
            }
            assigned.extend(component.iter().cloned());
            components.push(component);
        }
        components
    }
}
