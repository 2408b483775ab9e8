//! Create/update/delete primitives with referential-integrity checks.
//!
//! Every primitive validates first and mutates second: an `Err` return means
//! the graph was not touched.

use std::collections::BTreeSet;

use crate::error::GraphError;
use crate::ids::{AreaId, EdgeId, NodeId};
use crate::model::{Area, Edge, EditingMode, Graph, Node};

impl Graph {
    // --- Nodes -----------------------------------------------------------

    /// Insert a new node. Fails if the id is taken.
    pub fn create_node(&mut self, node: Node) -> Result<(), GraphError> {
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::DuplicateId {
                id: node.id.to_string(),
            });
        }
        let _ = self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Replace an existing node wholesale.
    pub fn update_node(&mut self, node: Node) -> Result<(), GraphError> {
        let Some(slot) = self.nodes.get_mut(&node.id) else {
            return Err(GraphError::NodeNotFound { node_id: node.id });
        };
        *slot = node;
        Ok(())
    }

    /// Edit a node in place through a closure. The closure may not change the id.
    pub fn modify_node<F>(&mut self, node_id: &NodeId, edit: F) -> Result<(), GraphError>
    where
        F: FnOnce(&mut Node),
    {
        let Some(current) = self.nodes.get(node_id) else {
            return Err(GraphError::NodeNotFound {
                node_id: node_id.clone(),
            });
        };
        let mut edited = current.clone();
        edit(&mut edited);
        if &edited.id != node_id {
            return Err(GraphError::IdentityChange {
                expected: node_id.to_string(),
                found: edited.id.to_string(),
            });
        }
        self.update_node(edited)
    }

    /// Move a node's bounds.
    pub fn set_node_bounds(
        &mut self,
        node_id: &NodeId,
        bounds: nodal_core::geometry::Rect,
    ) -> Result<(), GraphError> {
        match self.nodes.get_mut(node_id) {
            Some(node) => {
                node.bounds = bounds;
                Ok(())
            }
            None => Err(GraphError::NodeNotFound {
                node_id: node_id.clone(),
            }),
        }
    }

    /// Remove a node and every edge that references it.
    ///
    /// Focus, selection, fold state, and area membership drop the node too;
    /// areas left without members are removed.
    pub fn delete_node(&mut self, node_id: &NodeId) -> Result<Node, GraphError> {
        let Some(node) = self.nodes.remove(node_id) else {
            return Err(GraphError::NodeNotFound {
                node_id: node_id.clone(),
            });
        };
        self.edges.retain(|_, edge| !edge.touches(node_id));
        if self.focused_node_id.as_ref() == Some(node_id) {
            self.focused_node_id = None;
        }
        let _ = self.selected_node_ids.remove(node_id);
        let _ = self.collapsed_root_node_ids.remove(node_id);
        self.detach_from_areas(node_id);
        self.drop_empty_areas(None);
        Ok(node)
    }

    // --- Edges -----------------------------------------------------------

    /// Insert a new edge. Both endpoints must exist.
    ///
    /// Sibling order is discarded on normal edges.
    pub fn create_edge(&mut self, mut edge: Edge) -> Result<(), GraphError> {
        if self.edges.contains_key(&edge.id) {
            return Err(GraphError::DuplicateId {
                id: edge.id.to_string(),
            });
        }
        self.require_endpoints(&edge)?;
        if !edge.is_parent_child() {
            edge.parent_child_order = None;
        }
        let _ = self.edges.insert(edge.id.clone(), edge);
        Ok(())
    }

    /// Replace an existing edge wholesale.
    pub fn update_edge(&mut self, mut edge: Edge) -> Result<(), GraphError> {
        if !self.edges.contains_key(&edge.id) {
            return Err(GraphError::EdgeNotFound { edge_id: edge.id });
        }
        self.require_endpoints(&edge)?;
        if !edge.is_parent_child() {
            edge.parent_child_order = None;
        }
        let _ = self.edges.insert(edge.id.clone(), edge);
        Ok(())
    }

    pub fn delete_edge(&mut self, edge_id: &EdgeId) -> Result<Edge, GraphError> {
        self.edges
            .remove(edge_id)
            .ok_or_else(|| GraphError::EdgeNotFound {
                edge_id: edge_id.clone(),
            })
    }

    /// Set the explicit sibling order of a parent-child edge.
    pub fn set_edge_order(&mut self, edge_id: &EdgeId, order: i64) -> Result<(), GraphError> {
        match self.edges.get_mut(edge_id) {
            Some(edge) if edge.is_parent_child() => {
                edge.parent_child_order = Some(order);
                Ok(())
            }
            Some(_) => Ok(()),
            None => Err(GraphError::EdgeNotFound {
                edge_id: edge_id.clone(),
            }),
        }
    }

    fn require_endpoints(&self, edge: &Edge) -> Result<(), GraphError> {
        for endpoint in [&edge.from, &edge.to] {
            if !self.nodes.contains_key(endpoint) {
                return Err(GraphError::NodeNotFound {
                    node_id: endpoint.clone(),
                });
            }
        }
        Ok(())
    }

    // --- Areas -----------------------------------------------------------

    /// Insert a new area, moving its members out of their previous areas.
    pub fn create_area(&mut self, area: Area) -> Result<(), GraphError> {
        if self.areas.contains_key(&area.id) {
            return Err(GraphError::DuplicateId {
                id: area.id.to_string(),
            });
        }
        self.require_nodes(&area.node_ids)?;
        for node_id in &area.node_ids {
            self.detach_from_areas(node_id);
        }
        let area_id = area.id.clone();
        let _ = self.areas.insert(area_id.clone(), area);
        self.drop_empty_areas(Some(&area_id));
        Ok(())
    }

    /// Move nodes into an existing area.
    pub fn assign_nodes_to_area(
        &mut self,
        node_ids: &BTreeSet<NodeId>,
        area_id: &AreaId,
    ) -> Result<(), GraphError> {
        if !self.areas.contains_key(area_id) {
            return Err(GraphError::AreaNotFound {
                area_id: area_id.clone(),
            });
        }
        self.require_nodes(node_ids)?;
        for node_id in node_ids {
            self.detach_from_areas(node_id);
        }
        if let Some(area) = self.areas.get_mut(area_id) {
            area.node_ids.extend(node_ids.iter().cloned());
        }
        self.drop_empty_areas(Some(area_id));
        Ok(())
    }

    /// Move one node into an existing area.
    pub fn assign_node_to_area(
        &mut self,
        node_id: &NodeId,
        area_id: &AreaId,
    ) -> Result<(), GraphError> {
        self.assign_nodes_to_area(&BTreeSet::from([node_id.clone()]), area_id)
    }

    pub fn set_area_mode(&mut self, area_id: &AreaId, mode: EditingMode) -> Result<(), GraphError> {
        match self.areas.get_mut(area_id) {
            Some(area) => {
                area.mode = mode;
                Ok(())
            }
            None => Err(GraphError::AreaNotFound {
                area_id: area_id.clone(),
            }),
        }
    }

    fn require_nodes(&self, node_ids: &BTreeSet<NodeId>) -> Result<(), GraphError> {
        match node_ids.iter().find(|id| !self.nodes.contains_key(*id)) {
            Some(missing) => Err(GraphError::NodeNotFound {
                node_id: missing.clone(),
            }),
            None => Ok(()),
        }
    }

    fn detach_from_areas(&mut self, node_id: &NodeId) {
        for area in self.areas.values_mut() {
            let _ = area.node_ids.remove(node_id);
        }
    }

    fn drop_empty_areas(&mut self, keep: Option<&AreaId>) {
        self.areas
            .retain(|area_id, area| !area.node_ids.is_empty() || Some(area_id) == keep);
    }
}
