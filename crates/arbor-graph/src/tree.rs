//! Pre/post-order numbered cluster tree.
//!
//! Every structural edit re-walks the tree once and reassigns four numbers
//! per node:
//!
//! ```text
//!     root (pre 0, post 3, size 3)
//!     └── a (pre 1, post 2, size 2)
//!         ├── b (pre 2, post 0)
//!         └── c (pre 3, post 1)
//! ```
//!
//! `pre` increments on entry, `post` on exit, as two independent counters.
//! Ordering queries then reduce to two integer comparisons each:
//!
//! - descendant: `ancestor.pre < node.pre && node.post < ancestor.post`
//! - following:  `other.pre > node.pre && other.post > node.post`
//!
//! Renumbering costs O(n) per edit; every ordering query afterwards is O(1).

use std::collections::HashMap;

use crate::model::{Attributes, NodeId};

// ─────────────────────────────────────────────
// TreeNode
// ─────────────────────────────────────────────

/// Tree-resident state of one node: its payload plus the numbers assigned
/// by the last [`TreeIndex::renumber`] pass.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub id: NodeId,

    /// Pre-order visit number. The synthetic root carries 0.
    pub pre: usize,

    /// Post-order visit number. The synthetic root closes the sequence.
    pub post: usize,

    /// Depth below the synthetic root (root 0, top-level nodes 1).
    pub level: usize,

    /// Number of nodes strictly inside this node's interval.
    pub size: usize,

    /// Expand/retract toggle. Disabled = the subtree is collapsed.
    pub enabled: bool,

    /// Visibility flag consulted by the visible-view node filter.
    pub visible: bool,

    /// `None` only for the synthetic root.
    pub parent: Option<NodeId>,

    /// Direct children in sibling order.
    pub children: Vec<NodeId>,

    /// Opaque payload.
    pub attributes: Attributes,
}

// ─────────────────────────────────────────────
// TreeIndex
// ─────────────────────────────────────────────

/// The numbered tree over all graph nodes.
///
/// One synthetic root (never exposed through the public surface) keeps the
/// structure a single tree even when callers build a forest of top-level
/// nodes. Mutation primitives here leave the numbers stale; callers finish
/// every structural edit with [`renumber`](TreeIndex::renumber).
#[derive(Debug)]
pub struct TreeIndex {
    nodes: HashMap<NodeId, TreeNode>,
    root: NodeId,
    /// Highest `level` assigned by the last renumbering (0 = root only).
    height: usize,
}

impl TreeIndex {
    pub fn new() -> Self {
        let root = NodeId::new();
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            TreeNode {
                id: root,
                pre: 0,
                post: 0,
                level: 0,
                size: 0,
                enabled: true,
                visible: true,
                parent: None,
                children: Vec::new(),
                attributes: Attributes::new(),
            },
        );
        Self { nodes, root, height: 0 }
    }

    // ── Queries ────────────────────────────────────────

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Total node count, synthetic root included.
    #[inline]
    pub fn tree_size(&self) -> usize {
        self.nodes.len()
    }

    /// Highest internal level (root = 0).
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// True for every tree-valid node, the synthetic root included.
    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// True for tree-valid nodes other than the synthetic root.
    #[inline]
    pub fn contains_proper(&self, id: NodeId) -> bool {
        id != self.root && self.nodes.contains_key(&id)
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(&id)
    }

    /// Containment test: `node` lies strictly inside `ancestor`'s interval.
    /// Stale ids never satisfy it.
    pub fn is_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        match (self.nodes.get(&node), self.nodes.get(&ancestor)) {
            (Some(n), Some(a)) => a.pre < n.pre && n.post < a.post,
            _ => false,
        }
    }

    /// Precedence test: `other`'s interval is disjoint from `node`'s and
    /// comes after it in traversal order.
    pub fn is_following(&self, node: NodeId, other: NodeId) -> bool {
        match (self.nodes.get(&node), self.nodes.get(&other)) {
            (Some(n), Some(o)) => o.pre > n.pre && o.post > n.post,
            _ => false,
        }
    }

    /// True when every strict ancestor of `id` is expanded. A retracted
    /// node is itself still in view; its descendants are not.
    pub fn is_in_view(&self, id: NodeId) -> bool {
        let mut cursor = match self.nodes.get(&id) {
            Some(n) => n.parent,
            None => return false,
        };
        while let Some(pid) = cursor {
            match self.nodes.get(&pid) {
                Some(p) if p.enabled => cursor = p.parent,
                _ => return false,
            }
        }
        true
    }

    // ── Mutations ──────────────────────────────────────

    /// Insert `id` as the last child of `parent`. Numbers stay stale until
    /// the next renumbering.
    pub(crate) fn insert(&mut self, id: NodeId, parent: NodeId, attributes: Attributes) {
        self.nodes.insert(
            id,
            TreeNode {
                id,
                pre: 0,
                post: 0,
                level: 0,
                size: 0,
                enabled: true,
                visible: true,
                parent: Some(parent),
                children: Vec::new(),
                attributes,
            },
        );
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
    }

    /// Detach `id` from its current parent and append it under
    /// `new_parent`. A move is always detach-then-reattach; sibling order
    /// at the destination is arrival order.
    pub(crate) fn relocate(&mut self, id: NodeId, new_parent: NodeId) {
        let old_parent = self.nodes.get(&id).and_then(|n| n.parent);
        if let Some(op) = old_parent {
            if let Some(p) = self.nodes.get_mut(&op) {
                p.children.retain(|&c| c != id);
            }
        }
        if let Some(n) = self.nodes.get_mut(&id) {
            n.parent = Some(new_parent);
        }
        if let Some(np) = self.nodes.get_mut(&new_parent) {
            np.children.push(id);
        }
    }

    /// Remove `id`'s whole subtree from the structure. Returns the removed
    /// ids, `id` first, in pre-order.
    pub(crate) fn remove_subtree(&mut self, id: NodeId) -> Vec<NodeId> {
        let removed = self.collect_subtree(id);
        let parent = self.nodes.get(&id).and_then(|n| n.parent);
        if let Some(pid) = parent {
            if let Some(p) = self.nodes.get_mut(&pid) {
                p.children.retain(|&c| c != id);
            }
        }
        for rid in &removed {
            self.nodes.remove(rid);
        }
        removed
    }

    /// Ids of `id`'s subtree, `id` first, in pre-order.
    pub(crate) fn collect_subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            if let Some(n) = self.nodes.get(&cur) {
                out.push(cur);
                for &c in n.children.iter().rev() {
                    stack.push(c);
                }
            }
        }
        out
    }

    pub(crate) fn set_enabled(&mut self, id: NodeId, enabled: bool) {
        if let Some(n) = self.nodes.get_mut(&id) {
            n.enabled = enabled;
        }
    }

    pub(crate) fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(n) = self.nodes.get_mut(&id) {
            n.visible = visible;
        }
    }

    /// Re-enable every node; undoes any retraction in one sweep.
    pub(crate) fn enable_all(&mut self) {
        for n in self.nodes.values_mut() {
            n.enabled = true;
        }
    }

    /// Drop everything except the synthetic root.
    pub(crate) fn clear(&mut self) {
        let root = self.root;
        self.nodes.retain(|&id, _| id == root);
        if let Some(r) = self.nodes.get_mut(&root) {
            r.children.clear();
        }
        self.height = 0;
    }

    /// Recompute `pre`, `post`, `level` and `size` for the whole tree in
    /// one depth-first pass, and refresh the cached height.
    pub(crate) fn renumber(&mut self) {
        let mut pre = 0usize;
        let mut post = 0usize;
        let mut height = 0usize;

        // (node, next child index); a node stays on the stack until its
        // subtree is exhausted, then receives its post number and size.
        let mut stack: Vec<(NodeId, usize)> = Vec::with_capacity(self.height + 2);

        let root = self.root;
        self.enter(root, 0, &mut pre, &mut height);
        stack.push((root, 0));

        while let Some(frame) = stack.last_mut() {
            let (id, next_child) = *frame;
            let child = self
                .nodes
                .get(&id)
                .and_then(|n| n.children.get(next_child).copied());

            match child {
                Some(c) => {
                    frame.1 += 1;
                    let level = self.nodes.get(&id).map_or(0, |n| n.level) + 1;
                    self.enter(c, level, &mut pre, &mut height);
                    stack.push((c, 0));
                }
                None => {
                    stack.pop();
                    if let Some(n) = self.nodes.get_mut(&id) {
                        n.post = post;
                        n.size = pre - n.pre - 1;
                    }
                    post += 1;
                }
            }
        }

        self.height = height;
    }

    fn enter(&mut self, id: NodeId, level: usize, pre: &mut usize, height: &mut usize) {
        if let Some(n) = self.nodes.get_mut(&id) {
            n.pre = *pre;
            n.level = level;
            *pre += 1;
            if level > *height {
                *height = level;
            }
        }
    }
}

impl Default for TreeIndex {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────
// Test-only invariant audit
// ─────────────────────────────────────────────

#[cfg(test)]
impl TreeIndex {
    /// Asserts every numbering invariant over the whole tree: pre and post
    /// form permutations of 0..n, child intervals nest strictly inside
    /// their parent's, siblings are ordered and disjoint, sizes match a
    /// fresh subtree walk and the cached height is the deepest level.
    pub(crate) fn assert_numbering(&self) {
        let n = self.nodes.len();
        let mut seen_pre = vec![false; n];
        let mut seen_post = vec![false; n];
        let mut max_level = 0;

        for node in self.nodes.values() {
            assert!(node.pre < n, "pre {} out of range (n={n})", node.pre);
            assert!(node.post < n, "post {} out of range (n={n})", node.post);
            assert!(!seen_pre[node.pre], "duplicate pre {}", node.pre);
            assert!(!seen_post[node.post], "duplicate post {}", node.post);
            seen_pre[node.pre] = true;
            seen_post[node.post] = true;
            max_level = max_level.max(node.level);

            match node.parent {
                Some(p) => {
                    let parent = self.nodes.get(&p).expect("parent present");
                    assert_eq!(node.level, parent.level + 1, "level chain broken");
                    assert!(
                        parent.pre < node.pre && node.post < parent.post,
                        "child interval escapes its parent"
                    );
                    assert!(
                        parent.children.contains(&node.id),
                        "parent/child links disagree"
                    );
                }
                None => assert_eq!(node.id, self.root, "only the root lacks a parent"),
            }

            assert_eq!(
                node.size,
                self.collect_subtree(node.id).len() - 1,
                "size disagrees with a fresh subtree walk"
            );

            for pair in node.children.windows(2) {
                assert!(self.is_following(pair[0], pair[1]), "sibling order violated");
            }
        }

        let root = self.nodes.get(&self.root).expect("root present");
        assert_eq!(root.pre, 0, "root must open the sequence");
        assert_eq!(root.post, n - 1, "root must close the sequence");
        assert!(root.enabled, "root is always enabled");
        assert_eq!(self.height, max_level, "cached height is stale");
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── helpers ──────────────────────────────────────────

    fn child(t: &mut TreeIndex, parent: Option<NodeId>) -> NodeId {
        let id = NodeId::new();
        let under = parent.unwrap_or_else(|| t.root());
        t.insert(id, under, Attributes::new());
        t.renumber();
        id
    }

    /// root → a → {b, c}
    fn two_level() -> (TreeIndex, NodeId, NodeId, NodeId) {
        let mut t = TreeIndex::new();
        let a = child(&mut t, None);
        let b = child(&mut t, Some(a));
        let c = child(&mut t, Some(a));
        (t, a, b, c)
    }

    fn numbers(t: &TreeIndex, id: NodeId) -> (usize, usize) {
        let n = t.node(id).expect("node present");
        (n.pre, n.post)
    }

    // ── Construction ─────────────────────────────────────

    #[test]
    fn fresh_index_has_only_the_root() {
        let t = TreeIndex::new();
        assert_eq!(t.tree_size(), 1);
        assert_eq!(t.height(), 0);
        assert!(t.contains(t.root()));
        assert!(!t.contains_proper(t.root()));
        t.assert_numbering();
    }

    // ── Numbering ────────────────────────────────────────

    #[test]
    fn two_level_numbering_matches_hand_computation() {
        let (t, a, b, c) = two_level();

        assert_eq!(numbers(&t, t.root()), (0, 3));
        assert_eq!(numbers(&t, a), (1, 2));
        assert_eq!(numbers(&t, b), (2, 0));
        assert_eq!(numbers(&t, c), (3, 1));

        assert_eq!(t.node(a).map(|n| n.size), Some(2));
        assert_eq!(t.node(b).map(|n| n.size), Some(0));
        assert_eq!(t.node(t.root()).map(|n| n.size), Some(3));

        assert_eq!(t.node(a).map(|n| n.level), Some(1));
        assert_eq!(t.node(b).map(|n| n.level), Some(2));
        assert_eq!(t.height(), 2);

        t.assert_numbering();
    }

    #[test]
    fn insert_appends_in_sibling_order() {
        let (t, a, b, c) = two_level();
        assert_eq!(t.node(a).map(|n| n.children.clone()), Some(vec![b, c]));
    }

    // ── Ordering laws ────────────────────────────────────

    #[test]
    fn containment_law() {
        let (t, a, b, c) = two_level();

        assert!(t.is_descendant(b, a));
        assert!(t.is_descendant(c, a));
        assert!(!t.is_descendant(a, b));
        assert!(!t.is_descendant(b, c));
        assert!(!t.is_descendant(a, a), "containment is strict");
    }

    #[test]
    fn following_law() {
        let (t, a, b, c) = two_level();

        assert!(t.is_following(b, c), "c comes after b");
        assert!(!t.is_following(c, b));
        // containment and precedence exclude each other
        assert!(!t.is_following(a, b));
        assert!(!t.is_following(b, a));
    }

    #[test]
    fn ordering_rejects_stale_ids() {
        let (mut t, a, b, _c) = two_level();
        t.remove_subtree(b);
        t.renumber();

        assert!(!t.is_descendant(b, a));
        assert!(!t.is_following(a, b));
        assert!(!t.contains(b));
    }

    // ── Structural edits ─────────────────────────────────

    #[test]
    fn remove_subtree_drops_whole_branch() {
        let (mut t, a, b, c) = two_level();
        let d = child(&mut t, Some(b));

        let removed = t.remove_subtree(b);
        t.renumber();

        assert_eq!(removed, vec![b, d]);
        assert!(!t.contains(b));
        assert!(!t.contains(d));
        assert!(t.contains(c));
        assert_eq!(t.node(a).map(|n| n.size), Some(1));
        t.assert_numbering();
    }

    #[test]
    fn relocate_carries_the_subtree_along() {
        let (mut t, a, b, c) = two_level();
        let d = child(&mut t, Some(b));

        t.relocate(b, c);
        t.renumber();

        assert!(t.is_descendant(b, c));
        assert!(t.is_descendant(d, c));
        assert!(t.is_descendant(d, a));
        assert_eq!(t.node(d).map(|n| n.level), Some(4));
        assert_eq!(t.height(), 4);
        t.assert_numbering();
    }

    #[test]
    fn clear_keeps_only_the_root() {
        let (mut t, ..) = two_level();
        t.clear();
        t.renumber();

        assert_eq!(t.tree_size(), 1);
        assert_eq!(t.height(), 0);
        t.assert_numbering();
    }

    // ── View toggles ─────────────────────────────────────

    #[test]
    fn in_view_follows_ancestor_toggles() {
        let mut t = TreeIndex::new();
        let a = child(&mut t, None);
        let b = child(&mut t, Some(a));
        let d = child(&mut t, Some(b));

        assert!(t.is_in_view(d));

        t.set_enabled(b, false);
        assert!(t.is_in_view(a));
        assert!(t.is_in_view(b), "a retracted node stays in view itself");
        assert!(!t.is_in_view(d));

        t.set_enabled(a, false);
        assert!(t.is_in_view(a));
        assert!(!t.is_in_view(b));
        assert!(!t.is_in_view(d));

        // nested toggles persist: re-enabling a does not re-open b
        t.set_enabled(a, true);
        assert!(t.is_in_view(b));
        assert!(!t.is_in_view(d));
    }

    #[test]
    fn enable_all_reopens_every_branch() {
        let mut t = TreeIndex::new();
        let a = child(&mut t, None);
        let b = child(&mut t, Some(a));
        let d = child(&mut t, Some(b));

        t.set_enabled(a, false);
        t.set_enabled(b, false);
        t.enable_all();

        assert!(t.is_in_view(d));
    }

    #[test]
    fn in_view_is_false_for_stale_ids() {
        let (mut t, _a, b, _c) = two_level();
        t.remove_subtree(b);
        t.renumber();
        assert!(!t.is_in_view(b));
    }

    // ── Invariants under churn ───────────────────────────

    #[test]
    fn numbering_survives_a_mutation_storm() {
        let mut t = TreeIndex::new();
        let mut ids: Vec<NodeId> = Vec::new();

        // grow a lopsided tree: every third node nests one level deeper
        for i in 0..30 {
            let parent = if i % 3 == 0 || ids.is_empty() {
                None
            } else {
                Some(ids[i / 2])
            };
            ids.push(child(&mut t, parent));
            t.assert_numbering();
        }

        // shuffle a few branches around
        t.relocate(ids[4], ids[20]);
        t.renumber();
        t.assert_numbering();

        t.relocate(ids[9], ids[0]);
        t.renumber();
        t.assert_numbering();

        // tear some down
        for &victim in &[ids[0], ids[15], ids[27]] {
            if t.contains(victim) {
                t.remove_subtree(victim);
                t.renumber();
                t.assert_numbering();
            }
        }
    }
}
