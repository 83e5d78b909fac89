// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Retained, z-ordered flattening of the visual tree.
//!
//! [`RetainedRenderList`] holds the paint order of a root's subtree: a
//! depth-first traversal in which siblings are visited by ascending z-index
//! (ties in insertion order) and every parent precedes its descendants. Each
//! entry records the extent of its subtree so a consumer can skip it in O(1).
//!
//! A full [`rebuild`](RetainedRenderList::rebuild) is needed whenever the
//! structure changes. When only render or layout state changed,
//! [`synchronize`](RetainedRenderList::synchronize) refreshes the affected
//! entries in place. It compares the tree's structure epoch against the one
//! recorded at the last rebuild and validates every handle it is given, so a
//! structural change it was not told about still forces a rebuild.

use alloc::vec::Vec;

use kurbo::Rect;
use smallvec::SmallVec;

use crate::visual::{INVALID, VisualId, VisualTree};

/// One slot in the flattened render list.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetainedVisualEntry {
    /// The visual this entry paints.
    pub visual: VisualId,
    /// Position in paint order.
    pub traversal_index: u32,
    /// Z-index among siblings at the time of the last rebuild.
    pub effective_z_index: i32,
    /// Number of ancestors below the list's root.
    pub depth: u32,
    /// Entry index of the parent, or [`INVALID`] for the root entry.
    pub parent_entry: u32,
    /// One past the last entry of this visual's subtree.
    pub subtree_end: u32,
    /// Bounds in root space, refreshed on rebuild and synchronize.
    pub bounds: Rect,
}

/// Why the list was rebuilt instead of synchronized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RebuildCause {
    /// The list had not been built yet.
    NeverBuilt,
    /// The list was built for a different root.
    RootChanged,
    /// The caller reported a structural change.
    TopologyChanged,
    /// The tree's structure epoch moved without the caller reporting it.
    StructureChanged,
    /// A handle passed to `synchronize`, or held by an entry, is stale.
    DanglingVisual,
    /// Retained ordering is turned off; every frame rebuilds.
    Disabled,
}

/// Result of [`RetainedRenderList::synchronize`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyncOutcome {
    /// Entries were refreshed in place.
    Synchronized {
        /// Number of entries whose recorded state was refreshed.
        refreshed: usize,
    },
    /// The list was rebuilt from scratch.
    Rebuilt(RebuildCause),
}

impl SyncOutcome {
    /// Returns `true` if the list was rebuilt.
    #[must_use]
    pub const fn is_rebuild(self) -> bool {
        matches!(self, Self::Rebuilt(_))
    }
}

/// Flattened, z-ordered view of one root's subtree.
#[derive(Clone, Debug, Default)]
pub struct RetainedRenderList {
    entries: Vec<RetainedVisualEntry>,
    /// Slot index → entry index, [`INVALID`] if the slot is not listed.
    slot_entry: Vec<u32>,
    root: Option<VisualId>,
    epoch: u64,
    rebuild_count: u64,
    sync_count: u64,
}

impl RetainedRenderList {
    /// Creates an empty, unbuilt list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the list from a full traversal of `root`'s subtree.
    ///
    /// # Panics
    ///
    /// Panics if `root` is stale.
    pub fn rebuild(&mut self, tree: &VisualTree, root: VisualId) {
        tree.validate(root);
        self.entries.clear();
        self.slot_entry.clear();
        self.slot_entry.resize(tree.slot_count() as usize, INVALID);
        self.collect(tree, root.idx, 0, INVALID);
        self.root = Some(root);
        self.epoch = tree.structure_epoch();
        self.rebuild_count += 1;
    }

    /// Refreshes the entries of `changed` visuals in place, or rebuilds when
    /// that would be unsound.
    ///
    /// `changed` visuals that are not part of the list (e.g. detached) are
    /// skipped.
    pub fn synchronize(
        &mut self,
        tree: &VisualTree,
        root: VisualId,
        changed: &[VisualId],
    ) -> SyncOutcome {
        if self.root.is_none() {
            return self.rebuild_for(tree, root, RebuildCause::NeverBuilt);
        }
        if self.root != Some(root) {
            return self.rebuild_for(tree, root, RebuildCause::RootChanged);
        }
        if changed.iter().any(|&id| !tree.is_alive(id)) {
            return self.rebuild_for(tree, root, RebuildCause::DanglingVisual);
        }
        if self.epoch != tree.structure_epoch() {
            return self.rebuild_for(tree, root, RebuildCause::StructureChanged);
        }

        let mut refreshed = 0;
        for &id in changed {
            let e = self
                .slot_entry
                .get(id.idx as usize)
                .copied()
                .unwrap_or(INVALID);
            if e == INVALID {
                continue;
            }
            let entry = &mut self.entries[e as usize];
            if entry.visual != id {
                return self.rebuild_for(tree, root, RebuildCause::DanglingVisual);
            }
            entry.bounds = tree.bounds[id.idx as usize];
            refreshed += 1;
        }
        self.sync_count += 1;
        SyncOutcome::Synchronized { refreshed }
    }

    /// Returns the index of the first entry whose visual is no longer alive.
    ///
    /// This is a full scan intended for diagnostics and tests; `synchronize`
    /// relies on the structure epoch instead.
    #[must_use]
    pub fn find_dangling(&self, tree: &VisualTree) -> Option<usize> {
        self.entries.iter().position(|e| !tree.is_alive(e.visual))
    }

    /// Returns the entries in paint order.
    #[must_use]
    pub fn entries(&self) -> &[RetainedVisualEntry] {
        &self.entries
    }

    /// Returns the visuals in paint order.
    pub fn ordered_visuals(&self) -> impl Iterator<Item = VisualId> + '_ {
        self.entries.iter().map(|e| e.visual)
    }

    /// Returns the entry for `id`, if it is listed.
    #[must_use]
    pub fn entry_for(&self, id: VisualId) -> Option<&RetainedVisualEntry> {
        let e = *self.slot_entry.get(id.idx as usize)?;
        if e == INVALID {
            return None;
        }
        let entry = &self.entries[e as usize];
        (entry.visual == id).then_some(entry)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the list has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the root the list was last built for.
    #[must_use]
    pub fn root(&self) -> Option<VisualId> {
        self.root
    }

    /// Returns how many times the list has been rebuilt.
    #[must_use]
    pub fn rebuild_count(&self) -> u64 {
        self.rebuild_count
    }

    /// Returns how many times the list was synchronized in place.
    #[must_use]
    pub fn sync_count(&self) -> u64 {
        self.sync_count
    }

    /// Forgets the list and its counters; the next `synchronize` rebuilds.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn rebuild_for(
        &mut self,
        tree: &VisualTree,
        root: VisualId,
        cause: RebuildCause,
    ) -> SyncOutcome {
        self.rebuild(tree, root);
        SyncOutcome::Rebuilt(cause)
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "entry count is bounded by the u32 slot space"
    )]
    fn collect(&mut self, tree: &VisualTree, idx: u32, depth: u32, parent_entry: u32) {
        let entry_idx = self.entries.len() as u32;
        self.entries.push(RetainedVisualEntry {
            visual: tree.id_at(idx),
            traversal_index: entry_idx,
            effective_z_index: tree.z_index[idx as usize],
            depth,
            parent_entry,
            subtree_end: entry_idx + 1,
            bounds: tree.bounds[idx as usize],
        });
        self.slot_entry[idx as usize] = entry_idx;

        let mut children: SmallVec<[u32; 8]> = SmallVec::new();
        let mut child = tree.first_child[idx as usize];
        while child != INVALID {
            children.push(child);
            child = tree.next_sibling[child as usize];
        }
        // Stable: equal z-indices keep insertion order.
        children.sort_by_key(|&c| tree.z_index[c as usize]);
        for child in children {
            self.collect(tree, child, depth + 1, entry_idx);
        }

        self.entries[entry_idx as usize].subtree_end = self.entries.len() as u32;
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn order(list: &RetainedRenderList) -> Vec<VisualId> {
        list.ordered_visuals().collect()
    }

    #[test]
    fn z_order_overrides_insertion_order() {
        let mut tree = VisualTree::new();
        let root = tree.create_visual();
        let a = tree.create_visual();
        let a1 = tree.create_visual();
        let b = tree.create_visual();
        tree.set_z_index(a, 0);
        tree.set_z_index(b, 10);
        // B inserted first.
        tree.add_child(root, b);
        tree.add_child(root, a);
        tree.add_child(a, a1);

        let mut list = RetainedRenderList::new();
        list.rebuild(&tree, root);
        assert_eq!(order(&list), vec![root, a, a1, b]);

        let ea = list.entry_for(a).unwrap();
        let eb = list.entry_for(b).unwrap();
        assert!(ea.traversal_index < eb.traversal_index);
    }

    #[test]
    fn equal_z_keeps_insertion_order() {
        let mut tree = VisualTree::new();
        let root = tree.create_visual();
        let kids: Vec<_> = (0..12).map(|_| tree.create_visual()).collect();
        for &k in &kids {
            tree.add_child(root, k);
        }
        let mut list = RetainedRenderList::new();
        list.rebuild(&tree, root);
        let mut expected = vec![root];
        expected.extend(&kids);
        assert_eq!(order(&list), expected);
    }

    #[test]
    fn negative_z_sorts_first() {
        let mut tree = VisualTree::new();
        let root = tree.create_visual();
        let a = tree.create_visual();
        let b = tree.create_visual();
        let c = tree.create_visual();
        tree.add_child(root, a);
        tree.add_child(root, b);
        tree.add_child(root, c);
        tree.set_z_index(c, -1);
        tree.set_z_index(a, 5);

        let mut list = RetainedRenderList::new();
        list.rebuild(&tree, root);
        assert_eq!(order(&list), vec![root, c, b, a]);
    }

    #[test]
    fn entries_record_depth_and_subtree_extent() {
        let mut tree = VisualTree::new();
        let root = tree.create_visual();
        let a = tree.create_visual();
        let a1 = tree.create_visual();
        let a2 = tree.create_visual();
        let b = tree.create_visual();
        tree.add_child(root, a);
        tree.add_child(a, a1);
        tree.add_child(a, a2);
        tree.add_child(root, b);

        let mut list = RetainedRenderList::new();
        list.rebuild(&tree, root);
        let e = list.entries();
        assert_eq!(e[0].subtree_end, 5);
        assert_eq!(e[0].parent_entry, INVALID);
        assert_eq!(e[1].visual, a);
        assert_eq!(e[1].subtree_end, 4);
        assert_eq!(e[2].depth, 2);
        assert_eq!(e[2].parent_entry, 1);
        assert_eq!(e[4].visual, b);
        assert_eq!(e[4].parent_entry, 0);
    }

    #[test]
    fn first_synchronize_builds() {
        let mut tree = VisualTree::new();
        let root = tree.create_visual();
        let mut list = RetainedRenderList::new();
        assert_eq!(
            list.synchronize(&tree, root, &[]),
            SyncOutcome::Rebuilt(RebuildCause::NeverBuilt)
        );
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn synchronize_refreshes_bounds_in_place() {
        let mut tree = VisualTree::new();
        let root = tree.create_visual();
        let a = tree.create_visual();
        tree.add_child(root, a);
        let mut list = RetainedRenderList::new();
        list.rebuild(&tree, root);

        let r = Rect::new(1.0, 2.0, 3.0, 4.0);
        tree.set_bounds(a, r);
        let outcome = list.synchronize(&tree, root, &[a]);
        assert_eq!(outcome, SyncOutcome::Synchronized { refreshed: 1 });
        assert_eq!(list.entry_for(a).unwrap().bounds, r);
        assert_eq!(list.rebuild_count(), 1);
        assert_eq!(list.sync_count(), 1);
    }

    #[test]
    fn detached_changes_are_skipped() {
        let mut tree = VisualTree::new();
        let root = tree.create_visual();
        let loose = tree.create_visual();
        let mut list = RetainedRenderList::new();
        list.rebuild(&tree, root);
        assert_eq!(
            list.synchronize(&tree, root, &[loose]),
            SyncOutcome::Synchronized { refreshed: 0 }
        );
    }

    #[test]
    fn unreported_structure_change_forces_rebuild() {
        let mut tree = VisualTree::new();
        let root = tree.create_visual();
        let a = tree.create_visual();
        let b = tree.create_visual();
        tree.add_child(root, a);
        let mut list = RetainedRenderList::new();
        list.rebuild(&tree, root);

        tree.add_child(root, b);
        assert_eq!(
            list.synchronize(&tree, root, &[]),
            SyncOutcome::Rebuilt(RebuildCause::StructureChanged)
        );
        assert_eq!(order(&list), vec![root, a, b]);
    }

    #[test]
    fn stale_handle_forces_rebuild() {
        let mut tree = VisualTree::new();
        let root = tree.create_visual();
        let a = tree.create_visual();
        tree.add_child(root, a);
        let mut list = RetainedRenderList::new();
        list.rebuild(&tree, root);

        tree.destroy_subtree(a);
        assert_eq!(list.find_dangling(&tree), Some(1));
        assert_eq!(
            list.synchronize(&tree, root, &[a]),
            SyncOutcome::Rebuilt(RebuildCause::DanglingVisual)
        );
        assert_eq!(order(&list), vec![root]);
        assert_eq!(list.find_dangling(&tree), None);
    }

    #[test]
    fn different_root_rebuilds() {
        let mut tree = VisualTree::new();
        let r1 = tree.create_visual();
        let r2 = tree.create_visual();
        let mut list = RetainedRenderList::new();
        list.rebuild(&tree, r1);
        assert_eq!(
            list.synchronize(&tree, r2, &[]),
            SyncOutcome::Rebuilt(RebuildCause::RootChanged)
        );
        assert_eq!(list.root(), Some(r2));
    }
}
