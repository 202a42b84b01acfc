use thiserror::Error;

use crate::model::{EdgeId, NodeId};

/// Failures surfaced by graph queries and mutations.
///
/// Stale-handle no-ops (removing an already removed node, expanding an
/// expanded group) are reported as `Ok(false)` by the operations themselves.
/// An error here always means the call was rejected up front and the
/// structure is exactly as it was.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("node not in structure: {0}")]
    InvalidNode(NodeId),

    #[error("edge not in structure: {0}")]
    InvalidEdge(EdgeId),

    #[error("level {level} out of range: tree height is {height}")]
    LevelOutOfRange { level: usize, height: usize },

    #[error("adjacency test of edge {0} against itself")]
    SameEdge(EdgeId),

    #[error("node {node} is not an endpoint of edge {edge}")]
    NotIncident { node: NodeId, edge: EdgeId },

    #[error("cannot move {node} under {group}: target lies inside the moved subtree")]
    CyclicGrouping { node: NodeId, group: NodeId },

    #[error("node {0} already sits at the top level")]
    TopLevelParent(NodeId),

    #[error("empty group: nothing to group or ungroup")]
    EmptyGroup,

    #[error("grouped nodes must share a single parent")]
    MixedParents,

    #[error("per-edge direction is only available in mixed mode")]
    MixedModeOnly,
}
