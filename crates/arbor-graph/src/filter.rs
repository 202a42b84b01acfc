//! View admission tests: which nodes and edges a graph view lets through.

use std::fmt;
use std::sync::Arc;

use crate::model::{Attributes, Edge, NodeId};
use crate::store::GraphStore;

// ─────────────────────────────────────────────
// Filter trait
// ─────────────────────────────────────────────

/// Boolean test applied during traversal and counting.
///
/// `is_tautology` lets counting paths answer from structure sizes without
/// enumerating when the filter can never reject.
pub trait Filter {
    type Item;

    fn evaluate(&self, store: &GraphStore, item: &Self::Item) -> bool;

    fn is_tautology(&self) -> bool;
}

// ─────────────────────────────────────────────
// NodeFilter
// ─────────────────────────────────────────────

/// Node admission test for a graph view.
#[derive(Clone)]
pub enum NodeFilter {
    /// Admit every tree-valid node.
    All,
    /// Admit nodes whose visibility flag is set and which are not hidden
    /// inside a collapsed group.
    Visible,
    /// Caller-supplied test over the node id and its attribute payload.
    Custom(Arc<dyn Fn(NodeId, &Attributes) -> bool + Send + Sync>),
}

impl Filter for NodeFilter {
    type Item = NodeId;

    fn evaluate(&self, store: &GraphStore, id: &NodeId) -> bool {
        match self {
            NodeFilter::All => true,
            NodeFilter::Visible => {
                let tree = store.tree();
                match tree.node(*id) {
                    Some(n) => n.visible && tree.is_in_view(*id),
                    None => false,
                }
            }
            NodeFilter::Custom(test) => match store.tree().node(*id) {
                Some(n) => test(*id, &n.attributes),
                None => false,
            },
        }
    }

    fn is_tautology(&self) -> bool {
        matches!(self, NodeFilter::All)
    }
}

impl fmt::Debug for NodeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeFilter::All => write!(f, "NodeFilter::All"),
            NodeFilter::Visible => write!(f, "NodeFilter::Visible"),
            NodeFilter::Custom(_) => write!(f, "NodeFilter::Custom(..)"),
        }
    }
}

// ─────────────────────────────────────────────
// EdgeFilter
// ─────────────────────────────────────────────

/// Edge admission test for a graph view.
///
/// `Visible` consults only the edge's own flag; an edge whose endpoints
/// sit inside a collapsed group still passes. Callers wanting endpoint
/// awareness compose a `Custom` filter.
#[derive(Clone)]
pub enum EdgeFilter {
    /// Admit every stored edge.
    All,
    /// Admit edges whose visibility flag is set.
    Visible,
    /// Caller-supplied test over the full edge record.
    Custom(Arc<dyn Fn(&Edge) -> bool + Send + Sync>),
}

impl Filter for EdgeFilter {
    type Item = Edge;

    fn evaluate(&self, _store: &GraphStore, edge: &Edge) -> bool {
        match self {
            EdgeFilter::All => true,
            EdgeFilter::Visible => edge.visible,
            EdgeFilter::Custom(test) => test(edge),
        }
    }

    fn is_tautology(&self) -> bool {
        matches!(self, EdgeFilter::All)
    }
}

impl fmt::Debug for EdgeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeFilter::All => write!(f, "EdgeFilter::All"),
            EdgeFilter::Visible => write!(f, "EdgeFilter::Visible"),
            EdgeFilter::Custom(_) => write!(f, "EdgeFilter::Custom(..)"),
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EdgeKind, GraphMode, Node};

    fn store_with_chain() -> (GraphStore, NodeId, NodeId) {
        let mut store = GraphStore::new(GraphMode::Directed);
        let a = Node::new().id;
        let b = Node::new().id;
        store
            .add_node(a, None, Attributes::new())
            .expect("top-level insert");
        store
            .add_node(b, Some(a), Attributes::new())
            .expect("child insert");
        (store, a, b)
    }

    #[test]
    fn only_all_is_a_tautology() {
        assert!(NodeFilter::All.is_tautology());
        assert!(!NodeFilter::Visible.is_tautology());
        assert!(!NodeFilter::Custom(Arc::new(|_, _| true)).is_tautology());

        assert!(EdgeFilter::All.is_tautology());
        assert!(!EdgeFilter::Visible.is_tautology());
    }

    #[test]
    fn visible_filter_tracks_the_flag() {
        let (mut store, _a, b) = store_with_chain();

        assert!(NodeFilter::Visible.evaluate(&store, &b));
        store.set_node_visible(b, false).expect("valid node");
        assert!(!NodeFilter::Visible.evaluate(&store, &b));
    }

    #[test]
    fn visible_filter_tracks_collapsed_ancestors() {
        let (mut store, a, b) = store_with_chain();

        assert!(store.retract(a));
        assert!(
            NodeFilter::Visible.evaluate(&store, &a),
            "the collapsed group itself stays admitted"
        );
        assert!(!NodeFilter::Visible.evaluate(&store, &b));

        assert!(store.expand(a));
        assert!(NodeFilter::Visible.evaluate(&store, &b));
    }

    #[test]
    fn visible_filter_rejects_stale_ids() {
        let (store, ..) = store_with_chain();
        assert!(!NodeFilter::Visible.evaluate(&store, &NodeId::new()));
    }

    #[test]
    fn custom_node_filter_sees_attributes() {
        let mut store = GraphStore::new(GraphMode::Directed);
        let tagged = Node::new().id;
        let plain = Node::new().id;

        let mut attrs = Attributes::new();
        attrs.insert("tag".into(), serde_json::json!(true));
        store.add_node(tagged, None, attrs).expect("insert");
        store
            .add_node(plain, None, Attributes::new())
            .expect("insert");

        let filter = NodeFilter::Custom(Arc::new(|_, attrs| attrs.contains_key("tag")));
        assert!(filter.evaluate(&store, &tagged));
        assert!(!filter.evaluate(&store, &plain));
    }

    #[test]
    fn edge_filters_consult_the_edge_record() {
        let (mut store, a, b) = store_with_chain();
        let eid = store
            .add_edge(a, b, true, EdgeKind::Proper, Attributes::new())
            .expect("edge insert");

        let edge = store.edge(eid).expect("edge present").clone();
        assert!(EdgeFilter::All.evaluate(&store, &edge));
        assert!(EdgeFilter::Visible.evaluate(&store, &edge));

        store.set_edge_visible(eid, false).expect("valid edge");
        let edge = store.edge(eid).expect("edge present").clone();
        assert!(!EdgeFilter::Visible.evaluate(&store, &edge));

        let meta_only = EdgeFilter::Custom(Arc::new(|e| e.kind == EdgeKind::Meta));
        assert!(!meta_only.evaluate(&store, &edge));
    }
}
