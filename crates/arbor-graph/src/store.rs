//! The write-locked aggregate: numbered tree, edge table and incidence
//! lists, with every structural transaction defined on it.
//!
//! Methods validate first and edit second. When a method returns an error
//! the store is exactly as it was; when it edits the structure it finishes
//! with a renumbering pass, so the numbering invariants hold between any
//! two public calls.

use std::collections::HashMap;

use tracing::debug;

use crate::error::GraphError;
use crate::model::{Attributes, Edge, EdgeId, EdgeKind, GraphMode, NodeId};
use crate::tree::TreeIndex;

// ─────────────────────────────────────────────
// GraphStore
// ─────────────────────────────────────────────

#[derive(Debug)]
pub struct GraphStore {
    tree: TreeIndex,
    edges: HashMap<EdgeId, Edge>,
    /// node → edges touching it (either endpoint, both kinds). Self-loops
    /// appear once.
    incidence: HashMap<NodeId, Vec<EdgeId>>,
    mode: GraphMode,
}

impl GraphStore {
    pub(crate) fn new(mode: GraphMode) -> Self {
        Self {
            tree: TreeIndex::new(),
            edges: HashMap::new(),
            incidence: HashMap::new(),
            mode,
        }
    }

    // ── Accessors ──────────────────────────────────────

    #[inline]
    pub fn tree(&self) -> &TreeIndex {
        &self.tree
    }

    #[inline]
    pub fn mode(&self) -> GraphMode {
        self.mode
    }

    #[inline]
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    /// Stored edge count, unfiltered.
    #[inline]
    pub fn edge_count_raw(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Edges touching `node`, in insertion order. Empty for stale ids.
    pub fn incident_edges(&self, node: NodeId) -> &[EdgeId] {
        self.incidence
            .get(&node)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    // ── Node transactions ──────────────────────────────

    /// Insert `id` under `parent` (the synthetic root when `None`).
    /// Returns `Ok(false)` when `id` is already tree-valid.
    pub(crate) fn add_node(
        &mut self,
        id: NodeId,
        parent: Option<NodeId>,
        attributes: Attributes,
    ) -> Result<bool, GraphError> {
        if self.tree.contains(id) {
            return Ok(false);
        }
        let parent = match parent {
            Some(p) => {
                if !self.tree.contains_proper(p) {
                    return Err(GraphError::InvalidNode(p));
                }
                p
            }
            None => self.tree.root(),
        };
        self.tree.insert(id, parent, attributes);
        self.tree.renumber();
        debug!(node = %id, "node added");
        Ok(true)
    }

    /// Delete `id`'s whole subtree and every edge touching a deleted node.
    /// Returns false when `id` is already stale.
    pub(crate) fn remove_node(&mut self, id: NodeId) -> bool {
        if !self.tree.contains_proper(id) {
            return false;
        }
        let removed = self.tree.remove_subtree(id);
        for rid in &removed {
            self.drop_incident_edges(*rid, None);
        }
        self.tree.renumber();
        debug!(node = %id, removed = removed.len(), "subtree removed");
        true
    }

    // ── Edge transactions ──────────────────────────────

    pub(crate) fn add_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        directed: bool,
        kind: EdgeKind,
        attributes: Attributes,
    ) -> Result<EdgeId, GraphError> {
        if !self.tree.contains_proper(source) {
            return Err(GraphError::InvalidNode(source));
        }
        if !self.tree.contains_proper(target) {
            return Err(GraphError::InvalidNode(target));
        }
        let mut edge = Edge::new(source, target, directed, kind);
        edge.attributes = attributes;
        let id = edge.id;

        self.incidence.entry(source).or_default().push(id);
        if target != source {
            self.incidence.entry(target).or_default().push(id);
        }
        self.edges.insert(id, edge);
        debug!(edge = %id, source = %source, target = %target, kind = ?kind, "edge added");
        Ok(id)
    }

    /// Returns false when the edge is already gone.
    pub(crate) fn remove_edge(&mut self, id: EdgeId) -> bool {
        let Some(edge) = self.edges.remove(&id) else {
            return false;
        };
        self.unlink_incidence(edge.source, id);
        if edge.target != edge.source {
            self.unlink_incidence(edge.target, id);
        }
        true
    }

    pub(crate) fn clear_edges(&mut self) {
        self.edges.clear();
        self.incidence.clear();
    }

    /// Remove every edge touching `node`, both kinds.
    pub(crate) fn clear_edges_of(&mut self, node: NodeId) -> Result<(), GraphError> {
        if !self.tree.contains_proper(node) {
            return Err(GraphError::InvalidNode(node));
        }
        let dropped = self.drop_incident_edges(node, None);
        debug!(node = %node, dropped, "incident edges cleared");
        Ok(())
    }

    /// Remove the meta edges touching `node`; proper edges stay.
    pub(crate) fn clear_meta_edges(&mut self, node: NodeId) -> Result<(), GraphError> {
        if !self.tree.contains_proper(node) {
            return Err(GraphError::InvalidNode(node));
        }
        let dropped = self.drop_incident_edges(node, Some(EdgeKind::Meta));
        debug!(node = %node, dropped, "meta edges cleared");
        Ok(())
    }

    // ── Grouping transactions ──────────────────────────

    /// Wrap `nodes` (which must all share one parent) in the fresh group
    /// node `group_id`, appended as the parent's last child.
    pub(crate) fn group_nodes(
        &mut self,
        group_id: NodeId,
        group_attributes: Attributes,
        nodes: &[NodeId],
    ) -> Result<(), GraphError> {
        if nodes.is_empty() {
            return Err(GraphError::EmptyGroup);
        }
        for &n in nodes {
            if !self.tree.contains_proper(n) {
                return Err(GraphError::InvalidNode(n));
            }
        }
        let Some(parent) = self.tree.node(nodes[0]).and_then(|n| n.parent) else {
            return Err(GraphError::InvalidNode(nodes[0]));
        };
        for &n in &nodes[1..] {
            if self.tree.node(n).and_then(|t| t.parent) != Some(parent) {
                return Err(GraphError::MixedParents);
            }
        }

        self.tree.insert(group_id, parent, group_attributes);
        for &n in nodes {
            self.tree.relocate(n, group_id);
        }
        self.tree.renumber();
        debug!(group = %group_id, members = nodes.len(), "nodes grouped");
        Ok(())
    }

    /// Dissolve `group`: its children move up to its parent in order, the
    /// group node itself is deleted along with its edges.
    pub(crate) fn ungroup_nodes(&mut self, group: NodeId) -> Result<(), GraphError> {
        if !self.tree.contains_proper(group) {
            return Err(GraphError::InvalidNode(group));
        }
        let children = match self.tree.node(group) {
            Some(n) if !n.children.is_empty() => n.children.clone(),
            Some(_) => return Err(GraphError::EmptyGroup),
            None => return Err(GraphError::InvalidNode(group)),
        };
        let Some(parent) = self.tree.node(group).and_then(|n| n.parent) else {
            return Err(GraphError::InvalidNode(group));
        };

        for &c in &children {
            self.tree.relocate(c, parent);
        }
        // group is a leaf now; drop it with whatever edges it carried
        for rid in self.tree.remove_subtree(group) {
            self.drop_incident_edges(rid, None);
        }
        self.tree.renumber();
        debug!(group = %group, children = children.len(), "group dissolved");
        Ok(())
    }

    /// Re-parent `node` (with its subtree) under `group`.
    pub(crate) fn move_to_group(&mut self, node: NodeId, group: NodeId) -> Result<(), GraphError> {
        if !self.tree.contains_proper(node) {
            return Err(GraphError::InvalidNode(node));
        }
        if !self.tree.contains_proper(group) {
            return Err(GraphError::InvalidNode(group));
        }
        if node == group || self.tree.is_descendant(group, node) {
            return Err(GraphError::CyclicGrouping { node, group });
        }
        self.tree.relocate(node, group);
        self.tree.renumber();
        debug!(node = %node, group = %group, "node moved");
        Ok(())
    }

    /// Move `node` out of its group, up to its grandparent.
    pub(crate) fn remove_from_group(&mut self, node: NodeId) -> Result<(), GraphError> {
        if !self.tree.contains_proper(node) {
            return Err(GraphError::InvalidNode(node));
        }
        let Some(parent) = self.tree.node(node).and_then(|n| n.parent) else {
            return Err(GraphError::InvalidNode(node));
        };
        if parent == self.tree.root() {
            return Err(GraphError::TopLevelParent(node));
        }
        let Some(grandparent) = self.tree.node(parent).and_then(|n| n.parent) else {
            return Err(GraphError::InvalidNode(parent));
        };
        self.tree.relocate(node, grandparent);
        self.tree.renumber();
        debug!(node = %node, "node lifted out of its group");
        Ok(())
    }

    // ── View transactions ──────────────────────────────

    /// Re-open a collapsed group. False when `id` is stale, childless or
    /// already expanded.
    pub(crate) fn expand(&mut self, id: NodeId) -> bool {
        let applies = matches!(self.tree.node(id), Some(n) if n.size > 0 && !n.enabled);
        if applies {
            self.tree.set_enabled(id, true);
            debug!(node = %id, "group expanded");
        }
        applies
    }

    /// Collapse a group out of the clustered view. False when `id` is
    /// stale, childless or already retracted. Numbering is untouched.
    pub(crate) fn retract(&mut self, id: NodeId) -> bool {
        let applies = matches!(self.tree.node(id), Some(n) if n.size > 0 && n.enabled);
        if applies {
            self.tree.set_enabled(id, false);
            debug!(node = %id, "group retracted");
        }
        applies
    }

    pub(crate) fn reset_view(&mut self) {
        self.tree.enable_all();
    }

    pub(crate) fn set_node_visible(&mut self, id: NodeId, visible: bool) -> Result<(), GraphError> {
        if !self.tree.contains_proper(id) {
            return Err(GraphError::InvalidNode(id));
        }
        self.tree.set_visible(id, visible);
        Ok(())
    }

    pub(crate) fn set_edge_visible(&mut self, id: EdgeId, visible: bool) -> Result<(), GraphError> {
        match self.edges.get_mut(&id) {
            Some(e) => {
                e.visible = visible;
                Ok(())
            }
            None => Err(GraphError::InvalidEdge(id)),
        }
    }

    /// Drop everything: nodes, edges, view toggles.
    pub(crate) fn clear(&mut self) {
        self.tree.clear();
        self.tree.renumber();
        self.edges.clear();
        self.incidence.clear();
        debug!("structure cleared");
    }

    // ── Internals ──────────────────────────────────────

    /// Remove edges touching `node`; when `kind` is given, only that kind.
    /// Returns how many edges went away.
    fn drop_incident_edges(&mut self, node: NodeId, kind: Option<EdgeKind>) -> usize {
        let ids = match self.incidence.get(&node) {
            Some(v) => v.clone(),
            None => return 0,
        };
        let mut dropped = 0;
        for eid in ids {
            let kind_matches = self
                .edges
                .get(&eid)
                .map(|e| kind.map_or(true, |k| e.kind == k))
                .unwrap_or(false);
            if kind_matches && self.remove_edge(eid) {
                dropped += 1;
            }
        }
        dropped
    }

    fn unlink_incidence(&mut self, node: NodeId, edge: EdgeId) {
        if let Some(list) = self.incidence.get_mut(&node) {
            list.retain(|&e| e != edge);
            if list.is_empty() {
                self.incidence.remove(&node);
            }
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
