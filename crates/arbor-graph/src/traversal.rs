//! Lock-guarded cursors over the clustered structure.
//!
//! Every cursor owns an [`ArcRwLockReadGuard`] on the shared store, so the
//! structure cannot shift underneath an open iteration; writers queue up
//! until the cursor is dropped. Cursors yield plain [`NodeId`]s, which stay
//! meaningful after the guard is released.
//!
//! Iteration order is depth-first preorder over the numbered tree, which by
//! construction is ascending `pre` order.

use parking_lot::{ArcRwLockReadGuard, RawRwLock};

use crate::filter::{Filter, NodeFilter};
use crate::model::NodeId;
use crate::store::GraphStore;

/// Read guard shared by all cursors.
pub(crate) type StoreReadGuard = ArcRwLockReadGuard<RawRwLock, GraphStore>;

/// Pop the next id in preorder, descending through every proper node and
/// returning the ones the filter admits.
fn advance(store: &GraphStore, filter: &NodeFilter, stack: &mut Vec<NodeId>) -> Option<NodeId> {
    while let Some(id) = stack.pop() {
        if let Some(node) = store.tree().node(id) {
            stack.extend(node.children.iter().rev());
        }
        if filter.evaluate(store, &id) {
            return Some(id);
        }
    }
    None
}

fn seed_children(store: &GraphStore, of: NodeId) -> Vec<NodeId> {
    store
        .tree()
        .node(of)
        .map(|n| n.children.iter().rev().copied().collect())
        .unwrap_or_default()
}

// ─────────────────────────────────────────────
// TreeCursor
// ─────────────────────────────────────────────

/// Preorder cursor over every node the filter admits.
pub struct TreeCursor {
    guard: StoreReadGuard,
    filter: NodeFilter,
    stack: Vec<NodeId>,
}

impl TreeCursor {
    pub(crate) fn new(guard: StoreReadGuard, filter: NodeFilter) -> Self {
        let stack = seed_children(&guard, guard.tree().root());
        Self { guard, filter, stack }
    }
}

impl Iterator for TreeCursor {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        advance(&self.guard, &self.filter, &mut self.stack)
    }
}

// ─────────────────────────────────────────────
// ChildrenCursor
// ─────────────────────────────────────────────

/// Cursor over one node's direct children, in sibling order.
pub struct ChildrenCursor {
    guard: StoreReadGuard,
    filter: NodeFilter,
    children: Vec<NodeId>,
    at: usize,
}

impl ChildrenCursor {
    pub(crate) fn new(guard: StoreReadGuard, filter: NodeFilter, of: NodeId) -> Self {
        let children = guard
            .tree()
            .node(of)
            .map(|n| n.children.clone())
            .unwrap_or_default();
        Self { guard, filter, children, at: 0 }
    }
}

impl Iterator for ChildrenCursor {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(&id) = self.children.get(self.at) {
            self.at += 1;
            if self.filter.evaluate(&self.guard, &id) {
                return Some(id);
            }
        }
        None
    }
}

// ─────────────────────────────────────────────
// DescendantCursor
// ─────────────────────────────────────────────

/// Preorder cursor over the strict descendants of one node.
pub struct DescendantCursor {
    guard: StoreReadGuard,
    filter: NodeFilter,
    stack: Vec<NodeId>,
}

impl DescendantCursor {
    pub(crate) fn new(guard: StoreReadGuard, filter: NodeFilter, of: NodeId) -> Self {
        let stack = seed_children(&guard, of);
        Self { guard, filter, stack }
    }
}

impl Iterator for DescendantCursor {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        advance(&self.guard, &self.filter, &mut self.stack)
    }
}

// ─────────────────────────────────────────────
// LevelCursor
// ─────────────────────────────────────────────

/// Cursor over the nodes sitting at exactly one tree level. Descent stops
/// at the target level, so deeper subtrees are never walked.
pub struct LevelCursor {
    guard: StoreReadGuard,
    filter: NodeFilter,
    /// Internal level: the requested level plus one for the synthetic root.
    target: usize,
    stack: Vec<NodeId>,
}

impl LevelCursor {
    pub(crate) fn new(guard: StoreReadGuard, filter: NodeFilter, level: usize) -> Self {
        let stack = seed_children(&guard, guard.tree().root());
        Self { guard, filter, target: level + 1, stack }
    }
}

impl Iterator for LevelCursor {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(id) = self.stack.pop() {
            let Some(node) = self.guard.tree().node(id) else {
                continue;
            };
            if node.level < self.target {
                self.stack.extend(node.children.iter().rev());
                continue;
            }
            if node.level == self.target && self.filter.evaluate(&self.guard, &id) {
                return Some(id);
            }
        }
        None
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Attributes, GraphMode, Node};
    use parking_lot::RwLock;
    use std::sync::Arc;

    // ── helpers ──────────────────────────────────────────

    /// root → a → {b → d, c}, plus top-level e. Preorder: a b d c e.
    fn sample() -> (Arc<RwLock<GraphStore>>, [NodeId; 5]) {
        let mut s = GraphStore::new(GraphMode::Directed);
        let ids: [NodeId; 5] = std::array::from_fn(|_| Node::new().id);
        let [a, b, c, d, e] = ids;
        s.add_node(a, None, Attributes::new()).expect("a");
        s.add_node(b, Some(a), Attributes::new()).expect("b");
        s.add_node(c, Some(a), Attributes::new()).expect("c");
        s.add_node(d, Some(b), Attributes::new()).expect("d");
        s.add_node(e, None, Attributes::new()).expect("e");
        (Arc::new(RwLock::new(s)), ids)
    }

    #[test]
    fn tree_cursor_walks_preorder() {
        let (lock, [a, b, c, d, e]) = sample();
        let walked: Vec<_> = TreeCursor::new(lock.read_arc(), NodeFilter::All).collect();
        assert_eq!(walked, vec![a, b, d, c, e]);
    }

    #[test]
    fn tree_cursor_skips_out_of_view_nodes() {
        let (lock, [a, b, c, d, e]) = sample();
        lock.write().retract(b);

        let walked: Vec<_> = TreeCursor::new(lock.read_arc(), NodeFilter::Visible).collect();
        assert_eq!(walked, vec![a, b, c, e], "the retracted group stays, its contents drop");
        assert!(!walked.contains(&d));

        lock.write().set_node_visible(a, false).expect("valid");
        let walked: Vec<_> = TreeCursor::new(lock.read_arc(), NodeFilter::Visible).collect();
        assert_eq!(walked, vec![b, c, e], "hiding a node does not hide its subtree");
    }

    #[test]
    fn cursor_holds_the_read_lock_until_dropped() {
        let (lock, _) = sample();
        let mut cursor = TreeCursor::new(lock.read_arc(), NodeFilter::All);
        cursor.next();

        assert!(lock.try_write().is_none(), "writers wait on open cursors");
        drop(cursor);
        assert!(lock.try_write().is_some());
    }

    #[test]
    fn children_cursor_follows_sibling_order_and_filter() {
        let (lock, [a, b, c, _d, _e]) = sample();
        let walked: Vec<_> = ChildrenCursor::new(lock.read_arc(), NodeFilter::All, a).collect();
        assert_eq!(walked, vec![b, c]);

        lock.write().set_node_visible(b, false).expect("valid");
        let walked: Vec<_> =
            ChildrenCursor::new(lock.read_arc(), NodeFilter::Visible, a).collect();
        assert_eq!(walked, vec![c]);
    }

    #[test]
    fn children_cursor_on_a_stale_node_is_empty() {
        let (lock, [_a, b, ..]) = sample();
        lock.write().remove_node(b);
        let mut cursor = ChildrenCursor::new(lock.read_arc(), NodeFilter::All, b);
        assert_eq!(cursor.next(), None);
    }

    #[test]
    fn descendant_cursor_excludes_its_origin() {
        let (lock, [a, b, c, d, _e]) = sample();
        let walked: Vec<_> = DescendantCursor::new(lock.read_arc(), NodeFilter::All, a).collect();
        assert_eq!(walked, vec![b, d, c]);
    }

    #[test]
    fn level_cursor_picks_one_level() {
        let (lock, [a, b, c, d, e]) = sample();
        let at = |level| -> Vec<NodeId> {
            LevelCursor::new(lock.read_arc(), NodeFilter::All, level).collect()
        };
        assert_eq!(at(0), vec![a, e]);
        assert_eq!(at(1), vec![b, c]);
        assert_eq!(at(2), vec![d]);
        assert_eq!(at(3), Vec::<NodeId>::new());
    }
}
