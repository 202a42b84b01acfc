use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─────────────────────────────────────────────
// Identifiers
// ─────────────────────────────────────────────

/// Stable handle for a node (UUIDv4 underneath).
///
/// Survives any amount of renumbering; goes stale only when the node is
/// deleted, after which boolean operations report `false` and validated
/// operations reject it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[inline]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Stable handle for an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeId(Uuid);

impl EdgeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[inline]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ─────────────────────────────────────────────
// GraphMode / EdgeKind
// ─────────────────────────────────────────────

/// Edge orientation policy, fixed per graph at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GraphMode {
    /// Every edge carries a source → target orientation.
    Directed,
    /// No edge carries an orientation.
    Undirected,
    /// Orientation is chosen per edge at insertion.
    Mixed,
}

impl Default for GraphMode {
    fn default() -> Self {
        Self::Directed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Ordinary edge between two graph nodes.
    Proper,
    /// Aggregated cluster edge, produced and owned by an external
    /// clustering layer; stored and cleared here, never derived.
    Meta,
}

impl Default for EdgeKind {
    fn default() -> Self {
        Self::Proper
    }
}

// ─────────────────────────────────────────────
// Attributes
// ─────────────────────────────────────────────

/// Opaque key → value payload carried by nodes and edges. The engine stores
/// and returns it verbatim; it never interprets the contents.
pub type Attributes = HashMap<String, serde_json::Value>;

/// Supplies default attribute payloads at insertion time.
///
/// The engine never builds payload contents itself; callers inject an
/// implementation (or rely on [`DefaultAttributeFactory`]) the same way a
/// persistence or rendering layer would inject its own collaborator.
pub trait AttributeFactory: Send + Sync {
    /// Payload for a node inserted without attributes.
    fn node_attributes(&self) -> Attributes;

    /// Payload for a freshly created edge.
    fn edge_attributes(&self) -> Attributes;

    /// Payload for a group node created by grouping. Defaults to the plain
    /// node payload.
    fn group_attributes(&self) -> Attributes {
        self.node_attributes()
    }
}

/// Factory used when the caller injects nothing: empty payloads.
#[derive(Debug, Default)]
pub struct DefaultAttributeFactory;

impl AttributeFactory for DefaultAttributeFactory {
    fn node_attributes(&self) -> Attributes {
        Attributes::new()
    }

    fn edge_attributes(&self) -> Attributes {
        Attributes::new()
    }
}

// ─────────────────────────────────────────────
// Node
// ─────────────────────────────────────────────

/// Creation payload for a graph node.
///
/// Built by the caller and handed to the graph; the node becomes tree-valid
/// on insertion. Leaving `attributes` as `None` lets the graph's
/// [`AttributeFactory`] fill in the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier (UUIDv4).
    pub id: NodeId,

    /// Attribute payload; `None` means "factory decides".
    pub attributes: Option<Attributes>,
}

impl Node {
    pub fn new() -> Self {
        Self { id: NodeId::new(), attributes: None }
    }

    pub fn with_attributes(attributes: Attributes) -> Self {
        Self { id: NodeId::new(), attributes: Some(attributes) }
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────
// Edge
// ─────────────────────────────────────────────

/// A stored edge between two tree-valid nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// Unique identifier (UUIDv4).
    pub id: EdgeId,

    /// Source endpoint.
    pub source: NodeId,

    /// Target endpoint.
    pub target: NodeId,

    /// Whether source → target carries an orientation.
    pub directed: bool,

    /// Visibility flag consulted by the visible-view edge filter.
    pub visible: bool,

    /// Proper edge or aggregated meta edge.
    pub kind: EdgeKind,

    /// Opaque payload.
    pub attributes: Attributes,
}

impl Edge {
    pub fn new(source: NodeId, target: NodeId, directed: bool, kind: EdgeKind) -> Self {
        Self {
            id: EdgeId::new(),
            source,
            target,
            directed,
            visible: true,
            kind,
            attributes: Attributes::new(),
        }
    }

    /// True when both endpoints are the same node.
    #[inline]
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    /// The endpoint opposite to `node`, if `node` is an endpoint at all.
    #[inline]
    pub fn opposite_of(&self, node: NodeId) -> Option<NodeId> {
        if node == self.source {
            Some(self.target)
        } else if node == self.target {
            Some(self.source)
        } else {
            None
        }
    }

    /// True when the two edges share at least one endpoint.
    #[inline]
    pub fn shares_endpoint_with(&self, other: &Edge) -> bool {
        self.source == other.source
            || self.source == other.target
            || self.target == other.source
            || self.target == other.target
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ids_are_unique() {
        assert_ne!(NodeId::new(), NodeId::new());
    }

    #[test]
    fn edge_ids_are_unique() {
        let a = NodeId::new();
        let b = NodeId::new();
        let e1 = Edge::new(a, b, true, EdgeKind::Proper);
        let e2 = Edge::new(a, b, true, EdgeKind::Proper);
        assert_ne!(e1.id, e2.id);
    }

    #[test]
    fn self_loop_detection() {
        let a = NodeId::new();
        let b = NodeId::new();
        assert!(Edge::new(a, a, true, EdgeKind::Proper).is_self_loop());
        assert!(!Edge::new(a, b, true, EdgeKind::Proper).is_self_loop());
    }

    #[test]
    fn opposite_of_endpoints() {
        let a = NodeId::new();
        let b = NodeId::new();
        let c = NodeId::new();
        let e = Edge::new(a, b, true, EdgeKind::Proper);

        assert_eq!(e.opposite_of(a), Some(b));
        assert_eq!(e.opposite_of(b), Some(a));
        assert_eq!(e.opposite_of(c), None);
    }

    #[test]
    fn opposite_of_self_loop_is_the_node_itself() {
        let a = NodeId::new();
        let e = Edge::new(a, a, false, EdgeKind::Proper);
        assert_eq!(e.opposite_of(a), Some(a));
    }

    #[test]
    fn shared_endpoint_detection() {
        let a = NodeId::new();
        let b = NodeId::new();
        let c = NodeId::new();
        let d = NodeId::new();

        let ab = Edge::new(a, b, true, EdgeKind::Proper);
        let bc = Edge::new(b, c, true, EdgeKind::Proper);
        let cd = Edge::new(c, d, true, EdgeKind::Proper);

        assert!(ab.shares_endpoint_with(&bc));
        assert!(bc.shares_endpoint_with(&cd));
        assert!(!ab.shares_endpoint_with(&cd));
    }

    #[test]
    fn node_without_attributes_defers_to_factory() {
        assert!(Node::new().attributes.is_none());
        let n = Node::with_attributes(Attributes::new());
        assert!(n.attributes.is_some());
    }

    #[test]
    fn default_factory_produces_empty_payloads() {
        let f = DefaultAttributeFactory;
        assert!(f.node_attributes().is_empty());
        assert!(f.edge_attributes().is_empty());
        assert!(f.group_attributes().is_empty());
    }

    #[test]
    fn serde_roundtrip_node() {
        let mut attrs = Attributes::new();
        attrs.insert("label".into(), serde_json::json!("cluster 7"));
        let node = Node::with_attributes(attrs);

        let encoded = serde_json::to_string(&node).expect("serialize");
        let decoded: Node = serde_json::from_str(&encoded).expect("deserialize");
        assert_eq!(node.id, decoded.id);
        assert_eq!(node.attributes, decoded.attributes);
    }

    #[test]
    fn serde_roundtrip_edge() {
        let e = Edge::new(NodeId::new(), NodeId::new(), false, EdgeKind::Meta);
        let encoded = serde_json::to_string(&e).expect("serialize");
        let decoded: Edge = serde_json::from_str(&encoded).expect("deserialize");
        assert_eq!(e.id, decoded.id);
        assert_eq!(e.kind, decoded.kind);
        assert_eq!(e.directed, decoded.directed);
    }
}
