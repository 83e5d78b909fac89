// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Invalidation flag propagation and the pull-based change journal.

use alloc::vec::Vec;

use kurbo::Rect;

use super::id::{INVALID, VisualId};
use super::property::PropertyMetadata;
use super::state::{InvalidationCounters, InvalidationFlags};
use super::store::VisualTree;
use crate::dirty;

/// Visuals that requested layout since the previous drain.
///
/// Both lists are in ascending slot order and contain only live visuals.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LayoutRequests {
    /// Visuals whose measure was invalidated.
    pub measure: Vec<VisualId>,
    /// Visuals whose arrange was invalidated.
    pub arrange: Vec<VisualId>,
}

impl LayoutRequests {
    /// Returns `true` if no visual requested layout.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.measure.is_empty() && self.arrange.is_empty()
    }

    /// Drops every request that does not come from the subtree under `root`.
    pub fn retain_subtree(&mut self, tree: &VisualTree, root: VisualId) {
        self.measure.retain(|&id| tree.is_in_subtree(root, id));
        self.arrange.retain(|&id| tree.is_in_subtree(root, id));
    }
}

impl VisualTree {
    /// Invalidates a visual's measure (and therefore its arrange).
    ///
    /// Does not invalidate render. Repeated calls before the flags are cleared
    /// are coalesced.
    pub fn invalidate_measure(&mut self, id: VisualId) {
        self.validate(id);
        self.invalidate_measure_at(id.idx);
    }

    /// Invalidates a visual's arrange.
    pub fn invalidate_arrange(&mut self, id: VisualId) {
        self.validate(id);
        self.invalidate_arrange_at(id.idx);
    }

    /// Invalidates a visual's render output and bumps its render version.
    ///
    /// On the clean→dirty transition the visual's current bounds are added as
    /// damage.
    pub fn invalidate_render(&mut self, id: VisualId) {
        self.validate(id);
        self.invalidate_render_at(id.idx);
    }

    /// Raises the invalidations declared by `metadata` after a property of
    /// `id` changed.
    pub fn notify_property_changed(&mut self, id: VisualId, metadata: &PropertyMetadata) {
        self.validate(id);
        if metadata.affects_measure {
            self.invalidate_measure_at(id.idx);
        }
        if metadata.affects_arrange {
            self.invalidate_arrange_at(id.idx);
        }
        if metadata.affects_render {
            self.invalidate_render_at(id.idx);
        }
    }

    /// Clears `mask` from every visual in the subtree under `root`, then
    /// recomputes [`SUBTREE`](InvalidationFlags::SUBTREE) bottom-up.
    ///
    /// Only branches whose `SUBTREE` flag is set are visited.
    pub fn clear_invalidation(&mut self, root: VisualId, mask: InvalidationFlags) {
        self.validate(root);
        let mut mask = mask.own();
        if mask.contains(InvalidationFlags::RENDER) {
            mask |= InvalidationFlags::DESCENDANT_RENDER;
        }
        self.clear_flags_from(root.idx, mask);
    }

    /// Returns the invalidation counters.
    #[must_use]
    pub fn counters(&self) -> InvalidationCounters {
        self.counters
    }

    /// Zeroes the invalidation counters.
    pub fn reset_counters(&mut self) {
        self.counters = InvalidationCounters::default();
    }

    /// Returns the visuals that requested measure or arrange since the
    /// previous call.
    pub fn drain_layout_requests(&mut self) -> LayoutRequests {
        let measure: Vec<u32> = self
            .dirty
            .drain(dirty::MEASURE)
            .deterministic()
            .run()
            .collect();
        let arrange: Vec<u32> = self
            .dirty
            .drain(dirty::ARRANGE)
            .deterministic()
            .run()
            .collect();
        LayoutRequests {
            measure: self.live_ids(measure),
            arrange: self.live_ids(arrange),
        }
    }

    /// Returns the visuals whose render state or bounds changed since the
    /// previous call.
    pub fn drain_render_changes(&mut self) -> Vec<VisualId> {
        let changed: Vec<u32> = self
            .dirty
            .drain(dirty::RENDER)
            .deterministic()
            .run()
            .collect();
        self.live_ids(changed)
    }

    /// Returns `true` if any structural change was journaled since the
    /// previous call.
    pub fn drain_topology(&mut self) -> bool {
        self.dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .next()
            .is_some()
    }

    /// Takes the damage rectangles recorded since the previous call.
    pub fn take_pending_damage(&mut self) -> Vec<Rect> {
        core::mem::take(&mut self.pending_damage)
    }

    /// Returns `true` if damage is waiting to be collected.
    #[must_use]
    pub fn has_pending_damage(&self) -> bool {
        !self.pending_damage.is_empty()
    }

    // -- Internal helpers --

    pub(crate) fn invalidate_measure_at(&mut self, idx: u32) {
        if !self.flags[idx as usize].contains(InvalidationFlags::MEASURE) {
            self.flags[idx as usize].insert(InvalidationFlags::MEASURE);
            self.counters.measure += 1;
            self.dirty.mark(idx, dirty::MEASURE);
            self.mark_subtree_dirty(idx);
        }
        self.invalidate_arrange_at(idx);
    }

    pub(crate) fn invalidate_arrange_at(&mut self, idx: u32) {
        if self.flags[idx as usize].contains(InvalidationFlags::ARRANGE) {
            return;
        }
        self.flags[idx as usize].insert(InvalidationFlags::ARRANGE);
        self.counters.arrange += 1;
        self.dirty.mark(idx, dirty::ARRANGE);
        self.mark_subtree_dirty(idx);
    }

    pub(crate) fn invalidate_render_at(&mut self, idx: u32) {
        self.bump_render_version(idx);
        self.dirty.mark(idx, dirty::RENDER);
        self.mark_render_chain(idx);
        if self.flags[idx as usize].contains(InvalidationFlags::RENDER) {
            return;
        }
        self.flags[idx as usize].insert(InvalidationFlags::RENDER);
        self.counters.render += 1;
        let r = self.bounds[idx as usize];
        self.push_damage(r);
        self.mark_subtree_dirty(idx);
    }

    /// Sets `SUBTREE` on `idx` and walks up, stopping at the first ancestor
    /// that already has it. Each ancestor that flips gets a new render
    /// version so cached output containing this visual is invalidated.
    pub(crate) fn mark_subtree_dirty(&mut self, idx: u32) {
        if self.flags[idx as usize].contains(InvalidationFlags::SUBTREE) {
            return;
        }
        self.counters.dirty_chain_walks += 1;
        self.flags[idx as usize].insert(InvalidationFlags::SUBTREE);
        let mut p = self.parent[idx as usize];
        while p != INVALID {
            if self.flags[p as usize].contains(InvalidationFlags::SUBTREE) {
                break;
            }
            self.flags[p as usize].insert(InvalidationFlags::SUBTREE);
            self.bump_render_version(p);
            p = self.parent[p as usize];
        }
    }

    /// Marks the strict ancestors of `idx` with
    /// [`DESCENDANT_RENDER`](InvalidationFlags::DESCENDANT_RENDER), bumping
    /// the render version of each one that flips.
    ///
    /// Stops at the first ancestor already carrying `RENDER` or
    /// `DESCENDANT_RENDER`: it and its own ancestors were bumped after the
    /// last draw, so no cached snapshot matches them.
    /// Independent of `SUBTREE`, which outlives a draw while layout flags
    /// remain.
    pub(crate) fn mark_render_chain(&mut self, idx: u32) {
        let mut p = self.parent[idx as usize];
        while p != INVALID {
            let flags = &mut self.flags[p as usize];
            if flags.intersects(InvalidationFlags::RENDER | InvalidationFlags::DESCENDANT_RENDER) {
                break;
            }
            flags.insert(InvalidationFlags::DESCENDANT_RENDER | InvalidationFlags::SUBTREE);
            self.bump_render_version(p);
            p = self.parent[p as usize];
        }
    }

    pub(crate) fn bump_render_version(&mut self, idx: u32) {
        let v = &mut self.render_version[idx as usize];
        assert!(*v != u64::MAX, "render version counter exhausted");
        *v += 1;
    }

    pub(crate) fn bump_layout_version(&mut self, idx: u32) {
        let v = &mut self.layout_version[idx as usize];
        assert!(*v != u64::MAX, "layout version counter exhausted");
        *v += 1;
    }

    /// Returns whether anything under `idx` is still dirty after clearing.
    fn clear_flags_from(&mut self, idx: u32, mask: InvalidationFlags) -> bool {
        let flags = self.flags[idx as usize];
        if !flags.contains(InvalidationFlags::SUBTREE) {
            return false;
        }
        let own = flags.own().difference(mask);
        let mut child_dirty = false;
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            child_dirty |= self.clear_flags_from(child, mask);
            child = self.next_sibling[child as usize];
        }
        let still_dirty = !own.is_empty() || child_dirty;
        self.flags[idx as usize] = if still_dirty {
            own | InvalidationFlags::SUBTREE
        } else {
            own
        };
        still_dirty
    }

    fn live_ids(&self, mut slots: Vec<u32>) -> Vec<VisualId> {
        slots.sort_unstable();
        slots.dedup();
        slots
            .into_iter()
            .filter(|&idx| idx < self.len && self.alive[idx as usize])
            .map(|idx| self.id_at(idx))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use kurbo::Rect;

    use super::*;

    /// Builds root → a → b → c and clears everything.
    fn chain() -> (VisualTree, [VisualId; 4]) {
        let mut tree = VisualTree::new();
        let root = tree.create_visual();
        let a = tree.create_visual();
        let b = tree.create_visual();
        let c = tree.create_visual();
        tree.add_child(root, a);
        tree.add_child(a, b);
        tree.add_child(b, c);
        tree.clear_invalidation(root, InvalidationFlags::all());
        let _ = tree.drain_layout_requests();
        let _ = tree.drain_render_changes();
        let _ = tree.drain_topology();
        let _ = tree.take_pending_damage();
        tree.reset_counters();
        (tree, [root, a, b, c])
    }

    #[test]
    fn clear_leaves_tree_clean() {
        let (tree, ids) = chain();
        for id in ids {
            assert!(tree.flags(id).is_empty(), "{id:?} should be clean");
        }
    }

    #[test]
    fn measure_propagates_subtree_to_every_ancestor() {
        let (mut tree, [root, a, b, c]) = chain();
        tree.invalidate_measure(c);
        assert!(tree.flags(c).contains(InvalidationFlags::MEASURE));
        assert!(
            tree.flags(c).contains(InvalidationFlags::ARRANGE),
            "measure implies arrange"
        );
        assert!(
            !tree.flags(c).contains(InvalidationFlags::RENDER),
            "measure does not imply render"
        );
        for id in [root, a, b, c] {
            assert!(tree.flags(id).contains(InvalidationFlags::SUBTREE));
        }
        for id in [root, a, b] {
            assert!(tree.flags(id).own().is_empty(), "ancestors carry only SUBTREE");
        }
    }

    #[test]
    fn duplicate_invalidation_is_coalesced() {
        let (mut tree, [_, _, _, c]) = chain();
        tree.invalidate_render(c);
        tree.invalidate_render(c);
        let counters = tree.counters();
        assert_eq!(counters.render, 1);
        assert_eq!(counters.dirty_chain_walks, 1);

        tree.invalidate_measure(c);
        tree.invalidate_measure(c);
        let counters = tree.counters();
        assert_eq!(counters.measure, 1);
        assert_eq!(counters.arrange, 1);
        assert_eq!(
            counters.dirty_chain_walks, 1,
            "SUBTREE already set, no further walks"
        );
    }

    #[test]
    fn walk_stops_at_first_marked_ancestor() {
        let (mut tree, [root, a, b, c]) = chain();
        tree.invalidate_render(a);
        let root_v = tree.render_version(root);
        let a_v = tree.render_version(a);
        tree.invalidate_render(c);
        assert_eq!(tree.counters().dirty_chain_walks, 2);
        assert_eq!(
            tree.render_version(root),
            root_v,
            "walk stopped below root"
        );
        assert_eq!(tree.render_version(a), a_v, "walk stopped at a");
        assert!(tree.flags(b).contains(InvalidationFlags::SUBTREE));
    }

    #[test]
    fn subtree_flip_bumps_ancestor_render_versions() {
        let (mut tree, [root, a, b, c]) = chain();
        let before: Vec<u64> = [root, a, b].iter().map(|&id| tree.render_version(id)).collect();
        tree.invalidate_arrange(c);
        for (id, v) in [root, a, b].into_iter().zip(before) {
            assert!(tree.render_version(id) > v, "{id:?} should be bumped");
        }
    }

    #[test]
    fn render_chain_outlives_layout_flags_across_a_clear() {
        let (mut tree, [root, a, b, c]) = chain();
        // Layout flags survive the render clear, keeping SUBTREE set above c.
        tree.invalidate_measure(c);
        tree.clear_invalidation(root, InvalidationFlags::RENDER);
        assert!(tree.flags(a).contains(InvalidationFlags::SUBTREE));

        let before: Vec<u64> = [root, a, b].iter().map(|&id| tree.render_version(id)).collect();
        tree.set_bounds(c, Rect::new(1.0, 1.0, 5.0, 5.0));
        for (id, v) in [root, a, b].into_iter().zip(before) {
            assert!(tree.render_version(id) > v, "{id:?} should be bumped");
        }
        for id in [root, a, b] {
            assert!(tree.flags(id).contains(InvalidationFlags::DESCENDANT_RENDER));
        }

        let root_v = tree.render_version(root);
        tree.invalidate_render(c);
        assert_eq!(tree.render_version(root), root_v, "chain already marked");

        tree.clear_invalidation(root, InvalidationFlags::RENDER);
        for id in [root, a, b] {
            assert!(!tree.flags(id).contains(InvalidationFlags::DESCENDANT_RENDER));
        }
        tree.invalidate_render(c);
        assert!(tree.render_version(root) > root_v, "bumped again after a clear");
    }

    #[test]
    fn clearing_layout_keeps_render_dirty_chain() {
        let (mut tree, [root, a, b, c]) = chain();
        tree.invalidate_measure(b);
        tree.invalidate_render(c);
        tree.clear_invalidation(root, InvalidationFlags::LAYOUT);
        assert!(tree.flags(c).contains(InvalidationFlags::RENDER));
        assert_eq!(
            tree.flags(b).own(),
            InvalidationFlags::DESCENDANT_RENDER,
            "b keeps only the render chain"
        );
        for id in [root, a, b, c] {
            assert!(tree.flags(id).contains(InvalidationFlags::SUBTREE));
        }
        tree.clear_invalidation(root, InvalidationFlags::RENDER);
        for id in [root, a, b, c] {
            assert!(tree.flags(id).is_empty());
        }
    }

    #[test]
    fn attaching_dirty_subtree_propagates() {
        let (mut tree, [root, _, _, c]) = chain();
        let fresh = tree.create_visual();
        tree.add_child(c, fresh);
        assert!(tree.flags(root).contains(InvalidationFlags::SUBTREE));
        assert!(tree.flags(c).contains(InvalidationFlags::MEASURE));
    }

    #[test]
    fn property_metadata_drives_invalidation() {
        let (mut tree, [_, _, _, c]) = chain();
        tree.notify_property_changed(c, &PropertyMetadata::NONE);
        assert!(tree.flags(c).is_empty());

        tree.notify_property_changed(c, &PropertyMetadata::ARRANGE);
        assert_eq!(
            tree.flags(c).own(),
            InvalidationFlags::ARRANGE
        );

        tree.notify_property_changed(c, &PropertyMetadata::LAYOUT);
        assert_eq!(
            tree.flags(c).own(),
            InvalidationFlags::MEASURE | InvalidationFlags::ARRANGE | InvalidationFlags::RENDER
        );
    }

    #[test]
    fn render_transition_records_bounds_once() {
        let (mut tree, [_, _, _, c]) = chain();
        tree.set_bounds(c, Rect::new(0.0, 0.0, 4.0, 4.0));
        tree.clear_invalidation(c, InvalidationFlags::RENDER);
        let _ = tree.take_pending_damage();

        tree.invalidate_render(c);
        tree.invalidate_render(c);
        assert_eq!(tree.take_pending_damage(), vec![Rect::new(0.0, 0.0, 4.0, 4.0)]);
    }

    #[test]
    fn drains_are_pull_based_and_deterministic() {
        let (mut tree, [root, a, b, c]) = chain();
        tree.invalidate_measure(c);
        tree.invalidate_arrange(a);
        tree.invalidate_render(b);

        let requests = tree.drain_layout_requests();
        assert_eq!(requests.measure, vec![c]);
        let mut expected = vec![a, c];
        expected.sort_by_key(|id| id.index());
        assert_eq!(requests.arrange, expected);
        assert!(tree.drain_layout_requests().is_empty(), "drained");

        assert_eq!(tree.drain_render_changes(), vec![b]);
        assert!(tree.drain_render_changes().is_empty());

        assert!(!tree.drain_topology());
        tree.set_z_index(a, 1);
        assert!(tree.drain_topology());
        assert!(!tree.drain_topology());

        let mut requests = LayoutRequests {
            measure: vec![root],
            arrange: vec![],
        };
        let detached = tree.create_visual();
        requests.measure.push(detached);
        requests.retain_subtree(&tree, root);
        assert_eq!(requests.measure, vec![root]);
    }

    #[test]
    fn destroyed_visuals_leave_the_journal() {
        let (mut tree, [_, _, b, c]) = chain();
        tree.invalidate_render(c);
        tree.destroy_subtree(b);
        assert!(tree.drain_render_changes().is_empty());
    }

    #[test]
    #[should_panic(expected = "render version counter exhausted")]
    fn render_version_exhaustion_is_fatal() {
        let (mut tree, [_, _, _, c]) = chain();
        tree.render_version[c.index() as usize] = u64::MAX;
        tree.invalidate_render(c);
    }
}
