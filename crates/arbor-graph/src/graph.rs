//! The public clustered-graph surface.
//!
//! A [`ClusteredGraph`] is a filtered view over one shared [`GraphStore`].
//! Views are cheap clones: they hold the same `Arc<RwLock<GraphStore>>` and
//! differ only in their filter pair and attribute factory. The usual
//! arrangement is one full-structure view (tautology filters, sees every
//! stored node and edge) plus a visible view produced by
//! [`ClusteredGraph::visible_view`], which applies the visibility flags and
//! the expand/retract state.
//!
//! Read methods hold the lock for the duration of the call; cursor-returning
//! methods hand the guard to the cursor, which keeps writers out until it is
//! dropped. Mutating the graph from the thread that still holds one of its
//! cursors deadlocks, so finish or drop the cursor first.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::GraphError;
use crate::filter::{EdgeFilter, Filter, NodeFilter};
use crate::model::{
    AttributeFactory, Attributes, DefaultAttributeFactory, EdgeId, EdgeKind, GraphMode, Node,
    NodeId,
};
use crate::store::GraphStore;
use crate::traversal::{ChildrenCursor, DescendantCursor, LevelCursor, TreeCursor};

// ─────────────────────────────────────────────
// ClusteredGraph
// ─────────────────────────────────────────────

#[derive(Clone)]
pub struct ClusteredGraph {
    store: Arc<RwLock<GraphStore>>,
    node_filter: NodeFilter,
    edge_filter: EdgeFilter,
    factory: Arc<dyn AttributeFactory>,
}

impl ClusteredGraph {
    // ── Construction and views ─────────────────────────

    /// Full-structure view over a fresh store.
    pub fn new(mode: GraphMode) -> Self {
        Self::with_factory(mode, Arc::new(DefaultAttributeFactory))
    }

    /// Full-structure view with an injected attribute factory. The factory
    /// fills in attributes whenever an insertion does not carry its own.
    pub fn with_factory(mode: GraphMode, factory: Arc<dyn AttributeFactory>) -> Self {
        Self {
            store: Arc::new(RwLock::new(GraphStore::new(mode))),
            node_filter: NodeFilter::All,
            edge_filter: EdgeFilter::All,
            factory,
        }
    }

    /// View over the same store that applies the visibility flags and the
    /// expand/retract state.
    pub fn visible_view(&self) -> Self {
        self.filtered_view(NodeFilter::Visible, EdgeFilter::Visible)
    }

    /// View over the same store with caller-chosen filters.
    pub fn filtered_view(&self, node_filter: NodeFilter, edge_filter: EdgeFilter) -> Self {
        Self {
            store: Arc::clone(&self.store),
            node_filter,
            edge_filter,
            factory: Arc::clone(&self.factory),
        }
    }

    // ── Node mutations ─────────────────────────────────

    /// Insert `node` under `parent`, or at the top level when `parent` is
    /// `None`. A duplicate id is a no-op `Ok(false)` and never reaches the
    /// attribute factory.
    pub fn add_node(&self, node: Node, parent: Option<NodeId>) -> Result<bool, GraphError> {
        let mut store = self.store.write();
        if store.tree().contains(node.id) {
            return Ok(false);
        }
        let attributes = node
            .attributes
            .unwrap_or_else(|| self.factory.node_attributes());
        store.add_node(node.id, parent, attributes)
    }

    /// Delete `id` with its whole subtree and every edge touching any
    /// deleted node. False when `id` is already gone.
    pub fn remove_node(&self, id: NodeId) -> bool {
        self.store.write().remove_node(id)
    }

    /// Drop every node and edge.
    pub fn clear(&self) {
        self.store.write().clear();
    }

    // ── Edge mutations ─────────────────────────────────

    /// Insert an edge; directedness follows the graph mode.
    pub fn add_edge(&self, source: NodeId, target: NodeId) -> Result<EdgeId, GraphError> {
        let mut store = self.store.write();
        let directed = !matches!(store.mode(), GraphMode::Undirected);
        store.add_edge(
            source,
            target,
            directed,
            EdgeKind::Proper,
            self.factory.edge_attributes(),
        )
    }

    /// Insert an edge with explicit directedness. Mixed-mode graphs only.
    pub fn add_edge_directed(
        &self,
        source: NodeId,
        target: NodeId,
        directed: bool,
    ) -> Result<EdgeId, GraphError> {
        let mut store = self.store.write();
        if !matches!(store.mode(), GraphMode::Mixed) {
            return Err(GraphError::MixedModeOnly);
        }
        store.add_edge(
            source,
            target,
            directed,
            EdgeKind::Proper,
            self.factory.edge_attributes(),
        )
    }

    /// Store a cluster-aggregated edge on behalf of the clustering
    /// collaborator. This engine never derives meta edges itself.
    pub fn add_meta_edge(&self, source: NodeId, target: NodeId) -> Result<EdgeId, GraphError> {
        let mut store = self.store.write();
        let directed = !matches!(store.mode(), GraphMode::Undirected);
        store.add_edge(
            source,
            target,
            directed,
            EdgeKind::Meta,
            self.factory.edge_attributes(),
        )
    }

    /// False when the edge is already gone.
    pub fn remove_edge(&self, id: EdgeId) -> bool {
        self.store.write().remove_edge(id)
    }

    /// Drop every edge, proper and meta alike.
    pub fn clear_edges(&self) {
        self.store.write().clear_edges();
    }

    /// Drop every edge touching `id`.
    pub fn clear_edges_of(&self, id: NodeId) -> Result<(), GraphError> {
        self.store.write().clear_edges_of(id)
    }

    /// Drop the meta edges touching `id`; proper edges stay.
    pub fn clear_meta_edges(&self, id: NodeId) -> Result<(), GraphError> {
        self.store.write().clear_meta_edges(id)
    }

    // ── Grouping ───────────────────────────────────────

    /// Wrap `nodes` (all sharing one parent) in a fresh factory-initialized
    /// group node and return the group's id.
    pub fn group_nodes(&self, nodes: &[NodeId]) -> Result<NodeId, GraphError> {
        let group = NodeId::new();
        self.store
            .write()
            .group_nodes(group, self.factory.group_attributes(), nodes)?;
        Ok(group)
    }

    /// Dissolve `group`: its children move up to its parent in order, then
    /// the group node is deleted.
    pub fn ungroup_nodes(&self, group: NodeId) -> Result<(), GraphError> {
        self.store.write().ungroup_nodes(group)
    }

    /// Re-parent `node` (with its subtree) under `group`. Fails when the
    /// target sits inside the moved subtree.
    pub fn move_to_group(&self, node: NodeId, group: NodeId) -> Result<(), GraphError> {
        self.store.write().move_to_group(node, group)
    }

    /// Move `node` out of its group, up to the grandparent.
    pub fn remove_from_group(&self, node: NodeId) -> Result<(), GraphError> {
        self.store.write().remove_from_group(node)
    }

    // ── Expand / retract ───────────────────────────────

    /// Re-open a collapsed group. False when `id` is stale, childless or
    /// already expanded.
    pub fn expand(&self, id: NodeId) -> bool {
        self.store.write().expand(id)
    }

    /// Collapse a group: its descendants leave the visible view, storage
    /// and numbering stay intact. False when `id` is stale, childless or
    /// already retracted.
    pub fn retract(&self, id: NodeId) -> bool {
        self.store.write().retract(id)
    }

    /// Expand everything.
    pub fn reset_view(&self) {
        self.store.write().reset_view();
    }

    // ── Visibility flags ───────────────────────────────

    pub fn set_node_visible(&self, id: NodeId, visible: bool) -> Result<(), GraphError> {
        self.store.write().set_node_visible(id, visible)
    }

    pub fn set_edge_visible(&self, id: EdgeId, visible: bool) -> Result<(), GraphError> {
        self.store.write().set_edge_visible(id, visible)
    }

    pub fn is_node_visible(&self, id: NodeId) -> Result<bool, GraphError> {
        let guard = self.store.read();
        let tree = guard.tree();
        match tree.node(id) {
            Some(n) if id != tree.root() => Ok(n.visible),
            _ => Err(GraphError::InvalidNode(id)),
        }
    }

    pub fn is_edge_visible(&self, id: EdgeId) -> Result<bool, GraphError> {
        let guard = self.store.read();
        match guard.edge(id) {
            Some(e) => Ok(e.visible),
            None => Err(GraphError::InvalidEdge(id)),
        }
    }

    /// True when every strict ancestor of `id` is expanded.
    pub fn is_in_view(&self, id: NodeId) -> Result<bool, GraphError> {
        let guard = self.store.read();
        if !guard.tree().contains_proper(id) {
            return Err(GraphError::InvalidNode(id));
        }
        Ok(guard.tree().is_in_view(id))
    }

    // ── Counting ───────────────────────────────────────

    /// Nodes this view admits. Under a tautology filter this is the stored
    /// node count, without enumeration.
    pub fn node_count(&self) -> usize {
        {
            let guard = self.store.read();
            if self.node_filter.is_tautology() {
                return guard.tree().tree_size() - 1;
            }
        }
        self.nodes().count()
    }

    /// Edges this view admits.
    pub fn edge_count(&self) -> usize {
        let guard = self.store.read();
        if self.edge_filter.is_tautology() {
            return guard.edge_count_raw();
        }
        guard
            .edges()
            .filter(|e| self.edge_filter.evaluate(&guard, e))
            .count()
    }

    /// Children of `id` this view admits.
    pub fn children_count(&self, id: NodeId) -> Result<usize, GraphError> {
        Ok(self.children(id)?.count())
    }

    /// Nodes at `level` this view admits.
    pub fn level_size(&self, level: usize) -> Result<usize, GraphError> {
        Ok(self.nodes_at_level(level)?.count())
    }

    // ── Cursors ────────────────────────────────────────

    /// Every node this view admits, in pre-order.
    pub fn nodes(&self) -> TreeCursor {
        TreeCursor::new(self.store.read_arc(), self.node_filter.clone())
    }

    /// The top-level nodes, in sibling order.
    pub fn top_nodes(&self) -> ChildrenCursor {
        let guard = self.store.read_arc();
        let root = guard.tree().root();
        ChildrenCursor::new(guard, self.node_filter.clone(), root)
    }

    /// Direct children of `id`, in sibling order.
    pub fn children(&self, id: NodeId) -> Result<ChildrenCursor, GraphError> {
        let guard = self.store.read_arc();
        if !guard.tree().contains_proper(id) {
            return Err(GraphError::InvalidNode(id));
        }
        Ok(ChildrenCursor::new(guard, self.node_filter.clone(), id))
    }

    /// Strict descendants of `id`, in pre-order.
    pub fn descendants(&self, id: NodeId) -> Result<DescendantCursor, GraphError> {
        let guard = self.store.read_arc();
        if !guard.tree().contains_proper(id) {
            return Err(GraphError::InvalidNode(id));
        }
        Ok(DescendantCursor::new(guard, self.node_filter.clone(), id))
    }

    /// Nodes at exactly `level` (top level is 0), in pre-order.
    pub fn nodes_at_level(&self, level: usize) -> Result<LevelCursor, GraphError> {
        let guard = self.store.read_arc();
        let internal_height = guard.tree().height();
        if level >= internal_height {
            return Err(GraphError::LevelOutOfRange {
                level,
                height: internal_height.saturating_sub(1),
            });
        }
        Ok(LevelCursor::new(guard, self.node_filter.clone(), level))
    }

    // ── Topology ───────────────────────────────────────

    /// Membership as this view sees it: tree-valid and admitted by the
    /// view's node filter. The full-structure view therefore answers plain
    /// tree validity; a filtered view answers `false` for nodes it hides.
    pub fn contains(&self, id: NodeId) -> bool {
        let guard = self.store.read();
        guard.tree().contains_proper(id) && self.node_filter.evaluate(&guard, &id)
    }

    /// Stored and admitted by the view's edge filter.
    pub fn contains_edge(&self, id: EdgeId) -> bool {
        let guard = self.store.read();
        match guard.edge(id) {
            Some(edge) => self.edge_filter.evaluate(&guard, edge),
            None => false,
        }
    }

    /// `id`'s parent, or `None` for top-level nodes.
    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, GraphError> {
        let guard = self.store.read();
        let tree = guard.tree();
        match tree.node(id) {
            Some(n) if id != tree.root() => Ok(n.parent.filter(|&p| p != tree.root())),
            _ => Err(GraphError::InvalidNode(id)),
        }
    }

    pub fn is_parent(&self, node: NodeId, parent: NodeId) -> Result<bool, GraphError> {
        let guard = self.store.read();
        let tree = guard.tree();
        if !tree.contains_proper(node) {
            return Err(GraphError::InvalidNode(node));
        }
        if !tree.contains_proper(parent) {
            return Err(GraphError::InvalidNode(parent));
        }
        Ok(tree.node(node).and_then(|n| n.parent) == Some(parent))
    }

    /// True iff `node` sits strictly inside `ancestor`'s subtree.
    pub fn is_descendant(&self, node: NodeId, ancestor: NodeId) -> Result<bool, GraphError> {
        let guard = self.store.read();
        let tree = guard.tree();
        if !tree.contains_proper(node) {
            return Err(GraphError::InvalidNode(node));
        }
        if !tree.contains_proper(ancestor) {
            return Err(GraphError::InvalidNode(ancestor));
        }
        Ok(tree.is_descendant(node, ancestor))
    }

    /// True iff `descendant` sits strictly inside `node`'s subtree.
    pub fn is_ancestor(&self, node: NodeId, descendant: NodeId) -> Result<bool, GraphError> {
        self.is_descendant(descendant, node)
    }

    /// True iff `other` comes after `node` and the two subtrees are
    /// disjoint.
    pub fn is_following(&self, node: NodeId, other: NodeId) -> Result<bool, GraphError> {
        let guard = self.store.read();
        let tree = guard.tree();
        if !tree.contains_proper(node) {
            return Err(GraphError::InvalidNode(node));
        }
        if !tree.contains_proper(other) {
            return Err(GraphError::InvalidNode(other));
        }
        Ok(tree.is_following(node, other))
    }

    /// True iff `other` comes before `node` and the two subtrees are
    /// disjoint.
    pub fn is_preceding(&self, node: NodeId, other: NodeId) -> Result<bool, GraphError> {
        self.is_following(other, node)
    }

    /// Depth of `id`; top-level nodes sit at level 0.
    pub fn level(&self, id: NodeId) -> Result<usize, GraphError> {
        let guard = self.store.read();
        let tree = guard.tree();
        match tree.node(id) {
            Some(n) if id != tree.root() => Ok(n.level - 1),
            _ => Err(GraphError::InvalidNode(id)),
        }
    }

    /// Deepest level in the tree; 0 for flat and empty graphs.
    pub fn height(&self) -> usize {
        self.store.read().tree().height().saturating_sub(1)
    }

    /// True when at least one node has children.
    pub fn is_clustered(&self) -> bool {
        self.height() > 0
    }

    // ── Edge queries ───────────────────────────────────

    pub fn edge_source(&self, id: EdgeId) -> Result<NodeId, GraphError> {
        let guard = self.store.read();
        match guard.edge(id) {
            Some(e) => Ok(e.source),
            None => Err(GraphError::InvalidEdge(id)),
        }
    }

    pub fn edge_target(&self, id: EdgeId) -> Result<NodeId, GraphError> {
        let guard = self.store.read();
        match guard.edge(id) {
            Some(e) => Ok(e.target),
            None => Err(GraphError::InvalidEdge(id)),
        }
    }

    pub fn is_self_loop(&self, id: EdgeId) -> Result<bool, GraphError> {
        let guard = self.store.read();
        match guard.edge(id) {
            Some(e) => Ok(e.is_self_loop()),
            None => Err(GraphError::InvalidEdge(id)),
        }
    }

    /// True iff the two edges share an endpoint. Testing an edge against
    /// itself is an error.
    pub fn is_adjacent(&self, e1: EdgeId, e2: EdgeId) -> Result<bool, GraphError> {
        if e1 == e2 {
            return Err(GraphError::SameEdge(e1));
        }
        let guard = self.store.read();
        let Some(a) = guard.edge(e1) else {
            return Err(GraphError::InvalidEdge(e1));
        };
        let Some(b) = guard.edge(e2) else {
            return Err(GraphError::InvalidEdge(e2));
        };
        Ok(a.shares_endpoint_with(b))
    }

    /// The endpoint of `edge` that is not `node`; `node` itself for self
    /// loops.
    pub fn opposite(&self, node: NodeId, edge: EdgeId) -> Result<NodeId, GraphError> {
        let guard = self.store.read();
        let Some(e) = guard.edge(edge) else {
            return Err(GraphError::InvalidEdge(edge));
        };
        e.opposite_of(node)
            .ok_or(GraphError::NotIncident { node, edge })
    }

    // ── Attributes ─────────────────────────────────────

    pub fn attributes(&self, id: NodeId) -> Result<Attributes, GraphError> {
        let guard = self.store.read();
        let tree = guard.tree();
        match tree.node(id) {
            Some(n) if id != tree.root() => Ok(n.attributes.clone()),
            _ => Err(GraphError::InvalidNode(id)),
        }
    }

    pub fn edge_attributes(&self, id: EdgeId) -> Result<Attributes, GraphError> {
        let guard = self.store.read();
        match guard.edge(id) {
            Some(e) => Ok(e.attributes.clone()),
            None => Err(GraphError::InvalidEdge(id)),
        }
    }

    // ── Mode ───────────────────────────────────────────

    pub fn mode(&self) -> GraphMode {
        self.store.read().mode()
    }

    pub fn is_directed(&self) -> bool {
        matches!(self.mode(), GraphMode::Directed)
    }

    pub fn is_undirected(&self) -> bool {
        matches!(self.mode(), GraphMode::Undirected)
    }

    pub fn is_mixed(&self) -> bool {
        matches!(self.mode(), GraphMode::Mixed)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
