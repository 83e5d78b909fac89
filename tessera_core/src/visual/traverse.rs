// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use alloc::vec::Vec;

use super::id::{INVALID, VisualId};
use super::store::VisualTree;

/// An iterator over the direct children of a visual, in insertion order.
///
/// Created by [`VisualTree::children`].
#[derive(Debug)]
pub struct Children<'a> {
    tree: &'a VisualTree,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(tree: &'a VisualTree, first: u32) -> Self {
        Self {
            tree,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = VisualId;

    fn next(&mut self) -> Option<VisualId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.tree.next_sibling[idx as usize];
        Some(self.tree.id_at(idx))
    }
}

impl VisualTree {
    /// Collects the slots of the subtree rooted at `idx` in depth-first
    /// pre-order (insertion order, not z-order).
    pub(crate) fn collect_subtree(&self, idx: u32, out: &mut Vec<u32>) {
        out.push(idx);
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            self.collect_subtree(child, out);
            child = self.next_sibling[child as usize];
        }
    }

    /// Returns `true` if `ancestor` is `idx` or one of its ancestors.
    pub(crate) fn is_self_or_ancestor(&self, ancestor: u32, mut idx: u32) -> bool {
        while idx != INVALID {
            if idx == ancestor {
                return true;
            }
            idx = self.parent[idx as usize];
        }
        false
    }

    /// Returns `true` if `id` is `root` or lies in the subtree under `root`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    #[must_use]
    pub fn is_in_subtree(&self, root: VisualId, id: VisualId) -> bool {
        self.validate(root);
        self.validate(id);
        self.is_self_or_ancestor(root.idx, id.idx)
    }

    /// Returns the number of ancestors of a visual.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn depth(&self, id: VisualId) -> u32 {
        self.validate(id);
        let mut depth = 0;
        let mut p = self.parent[id.idx as usize];
        while p != INVALID {
            depth += 1;
            p = self.parent[p as usize];
        }
        depth
    }
}
