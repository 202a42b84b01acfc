//! # arbor-graph
//!
//! Clustered hierarchical graph engine.
//!
//! Provides a tree-indexed, filterable view over a node/edge graph:
//! - [`tree::TreeIndex`]       — pre/post-order numbered cluster tree (O(1) ordering queries)
//! - [`model::Node`] / [`model::Edge`] — graph payloads with opaque JSON attributes
//! - [`filter::NodeFilter`] / [`filter::EdgeFilter`] — traversal-time predicates
//! - [`traversal`]             — lock-guarded preorder cursors
//! - [`graph::ClusteredGraph`] — the public surface: grouping, expand/retract,
//!   topology queries and cheap filtered views over one shared store

pub mod error;
pub mod filter;
pub mod graph;
pub mod model;
pub mod store;
pub mod traversal;
pub mod tree;

pub use error::GraphError;
pub use filter::{EdgeFilter, Filter, NodeFilter};
pub use graph::ClusteredGraph;
pub use model::{
    AttributeFactory, Attributes, DefaultAttributeFactory, Edge, EdgeId, EdgeKind, GraphMode,
    Node, NodeId,
};
pub use store::GraphStore;
pub use traversal::{ChildrenCursor, DescendantCursor, LevelCursor, TreeCursor};
pub use tree::{TreeIndex, TreeNode};
