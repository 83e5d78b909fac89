// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays visual storage with allocation, topology, and property management.

use alloc::vec::Vec;

use kurbo::{Affine, Rect};
use understory_dirty::{CycleHandling, DirtyTracker};

use super::id::{INVALID, VisualId};
use super::property::PropertyMetadata;
use super::state::{InvalidationCounters, InvalidationFlags, RenderState, VisualTraits};
use super::traverse::Children;
use crate::dirty;
use crate::region::has_area;

/// Struct-of-arrays storage for a tree of visuals.
///
/// Visuals are addressed by [`VisualId`] handles. Each visual occupies a slot
/// in parallel arrays; destroyed visuals are recycled through a free list and
/// generation counters make stale handles fail validation.
///
/// A parent exclusively owns its children: destroying a visual destroys its
/// whole subtree. The `parent` link is a plain index used for ancestor
/// propagation and never keeps anything alive.
#[derive(Debug)]
pub struct VisualTree {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Layout output --
    pub(crate) bounds: Vec<Rect>,
    pub(crate) z_index: Vec<i32>,

    // -- Render-affecting state --
    pub(crate) render: Vec<RenderState>,
    pub(crate) traits: Vec<VisualTraits>,

    // -- Invalidation --
    pub(crate) flags: Vec<InvalidationFlags>,
    pub(crate) render_version: Vec<u64>,
    pub(crate) layout_version: Vec<u64>,
    pub(crate) counters: InvalidationCounters,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) alive: Vec<bool>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,
    pub(crate) live: u32,

    // -- Change journal --
    pub(crate) dirty: DirtyTracker<u32>,
    pub(crate) structure_epoch: u64,
    pub(crate) pending_damage: Vec<Rect>,
}

impl Default for VisualTree {
    fn default() -> Self {
        Self::new()
    }
}

impl VisualTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            bounds: Vec::new(),
            z_index: Vec::new(),
            render: Vec::new(),
            traits: Vec::new(),
            flags: Vec::new(),
            render_version: Vec::new(),
            layout_version: Vec::new(),
            counters: InvalidationCounters::default(),
            generation: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            live: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            structure_epoch: 0,
            pending_damage: Vec::new(),
        }
    }

    // -- Allocation API --

    /// Creates a new, detached visual and returns its handle.
    ///
    /// The visual starts fully dirty (measure, arrange, render) with empty
    /// bounds, z-index 0, and default [`RenderState`]. Both version stamps
    /// start at 1.
    pub fn create_visual(&mut self) -> VisualId {
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.bounds[i] = Rect::ZERO;
            self.z_index[i] = 0;
            self.render[i] = RenderState::default();
            self.traits[i] = VisualTraits::default();
            self.flags[i] = InvalidationFlags::FRESH;
            self.render_version[i] = 1;
            self.layout_version[i] = 1;
            self.alive[i] = true;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.bounds.push(Rect::ZERO);
            self.z_index.push(0);
            self.render.push(RenderState::default());
            self.traits.push(VisualTraits::default());
            self.flags.push(InvalidationFlags::FRESH);
            self.render_version.push(1);
            self.layout_version.push(1);
            self.generation.push(0);
            self.alive.push(true);
            idx
        };
        self.live += 1;

        self.dirty.mark(idx, dirty::MEASURE);
        self.dirty.mark(idx, dirty::ARRANGE);
        self.dirty.mark(idx, dirty::RENDER);

        self.id_at(idx)
    }

    /// Destroys a visual and its entire subtree, freeing their slots.
    ///
    /// If the visual is attached, its subtree's last known bounds become
    /// pending damage and the former parent is invalidated for measure.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn destroy_subtree(&mut self, id: VisualId) {
        self.validate(id);
        if self.parent[id.idx as usize] != INVALID {
            self.detach(id.idx);
        }

        let mut doomed = Vec::new();
        self.collect_subtree(id.idx, &mut doomed);
        for idx in doomed {
            let i = idx as usize;
            self.dirty.remove_key(idx);
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.flags[i] = InvalidationFlags::empty();
            // Bump generation so old handles immediately fail validation.
            self.generation[i] = self.generation[i].wrapping_add(1);
            self.alive[i] = false;
            self.free_list.push(idx);
            self.live -= 1;
        }
        self.structure_epoch += 1;
    }

    /// Returns whether the given handle refers to a live visual.
    #[must_use]
    pub fn is_alive(&self, id: VisualId) -> bool {
        id.idx < self.len
            && self.alive[id.idx as usize]
            && self.generation[id.idx as usize] == id.generation
    }

    /// Returns the number of live visuals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live as usize
    }

    /// Returns `true` if the tree holds no live visuals.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Returns the number of slots ever allocated (live or free).
    #[must_use]
    pub fn slot_count(&self) -> u32 {
        self.len
    }

    // -- Topology API --

    /// Adds `child` as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, if `child` already has a parent, or
    /// if `parent` lies inside `child`'s subtree.
    pub fn add_child(&mut self, parent: VisualId, child: VisualId) {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx;
        let c = child.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        assert!(
            !self.is_self_or_ancestor(c, p),
            "cannot attach a visual beneath itself"
        );

        self.link_last(p, c);
        self.after_attach(p, c);
    }

    /// Inserts `child` before `sibling` in the sibling list.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, if `child` already has a parent, if
    /// `sibling` has no parent, or if the insertion would create a cycle.
    pub fn insert_before(&mut self, child: VisualId, sibling: VisualId) {
        self.validate(child);
        self.validate(sibling);
        let c = child.idx;
        let s = sibling.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        let p = self.parent[s as usize];
        assert!(p != INVALID, "sibling has no parent");
        assert!(
            !self.is_self_or_ancestor(c, p),
            "cannot attach a visual beneath itself"
        );

        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = s;
        self.prev_sibling[c as usize] = self.prev_sibling[s as usize];
        if self.prev_sibling[s as usize] != INVALID {
            self.next_sibling[self.prev_sibling[s as usize] as usize] = c;
        } else {
            self.first_child[p as usize] = c;
        }
        self.prev_sibling[s as usize] = c;

        self.after_attach(p, c);
    }

    /// Removes `child` from its parent. The child's subtree stays alive.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the visual has no parent.
    pub fn remove_from_parent(&mut self, child: VisualId) {
        self.validate(child);
        assert!(
            self.parent[child.idx as usize] != INVALID,
            "visual has no parent"
        );
        self.detach(child.idx);
    }

    /// Moves `child` to be the last child of `new_parent`, detaching it
    /// first if needed.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale or if `new_parent` lies inside
    /// `child`'s subtree.
    pub fn reparent(&mut self, child: VisualId, new_parent: VisualId) {
        self.validate(child);
        self.validate(new_parent);
        let c = child.idx;
        let p = new_parent.idx;
        assert!(
            !self.is_self_or_ancestor(c, p),
            "cannot attach a visual beneath itself"
        );
        if self.parent[c as usize] != INVALID {
            self.detach(c);
        }
        self.link_last(p, c);
        self.after_attach(p, c);
    }

    /// Returns the parent of a visual, if any.
    #[must_use]
    pub fn parent(&self, id: VisualId) -> Option<VisualId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| self.id_at(p))
    }

    /// Returns an iterator over the direct children of a visual.
    #[must_use]
    pub fn children(&self, id: VisualId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns the number of direct children of a visual.
    #[must_use]
    pub fn child_count(&self, id: VisualId) -> u32 {
        self.validate(id);
        self.child_count_at(id.idx)
    }

    /// Returns a counter that increments on every structural change
    /// (attach, detach, destroy, z-index change).
    #[must_use]
    pub fn structure_epoch(&self) -> u64 {
        self.structure_epoch
    }

    // -- Property getters --

    /// Returns a visual's bounds in root space.
    #[must_use]
    pub fn bounds(&self, id: VisualId) -> Rect {
        self.validate(id);
        self.bounds[id.idx as usize]
    }

    /// Returns a visual's z-index among its siblings.
    #[must_use]
    pub fn z_index(&self, id: VisualId) -> i32 {
        self.validate(id);
        self.z_index[id.idx as usize]
    }

    /// Returns a visual's pixel-affecting state.
    #[must_use]
    pub fn render_state(&self, id: VisualId) -> RenderState {
        self.validate(id);
        self.render[id.idx as usize]
    }

    /// Returns a visual's cache-relevant traits.
    #[must_use]
    pub fn traits(&self, id: VisualId) -> VisualTraits {
        self.validate(id);
        self.traits[id.idx as usize]
    }

    /// Returns a visual's current invalidation flags.
    #[must_use]
    pub fn flags(&self, id: VisualId) -> InvalidationFlags {
        self.validate(id);
        self.flags[id.idx as usize]
    }

    /// Returns a visual's render version stamp.
    #[must_use]
    pub fn render_version(&self, id: VisualId) -> u64 {
        self.validate(id);
        self.render_version[id.idx as usize]
    }

    /// Returns a visual's layout version stamp.
    #[must_use]
    pub fn layout_version(&self, id: VisualId) -> u64 {
        self.validate(id);
        self.layout_version[id.idx as usize]
    }

    // -- Mutation API (auto-invalidates) --

    /// Records a visual's layout output in root space.
    ///
    /// Adds the union of the old and new bounds as damage, bumps the layout
    /// version, and invalidates render. Writing the current value is a no-op.
    pub fn set_bounds(&mut self, id: VisualId, bounds: Rect) {
        self.validate(id);
        let i = id.idx as usize;
        let bounds = bounds.abs();
        let old = self.bounds[i];
        if old == bounds {
            return;
        }
        match (has_area(&old), has_area(&bounds)) {
            (true, true) => self.push_damage(old.union(bounds)),
            (true, false) => self.push_damage(old),
            (false, _) => self.push_damage(bounds),
        }
        self.bounds[i] = bounds;
        self.bump_layout_version(id.idx);
        self.invalidate_render_at(id.idx);
    }

    /// Sets a visual's z-index among its siblings.
    ///
    /// This is a structural change: the retained render list must be rebuilt.
    pub fn set_z_index(&mut self, id: VisualId, z_index: i32) {
        self.validate(id);
        let idx = id.idx;
        if self.z_index[idx as usize] == z_index {
            return;
        }
        self.z_index[idx as usize] = z_index;
        self.structure_epoch += 1;
        let p = self.parent[idx as usize];
        if p != INVALID {
            self.dirty.mark(p, dirty::TOPOLOGY);
            self.bump_render_version(p);
        }
        self.push_subtree_damage(idx);
        self.invalidate_render_at(idx);
    }

    /// Sets a visual's opacity. Inherited by descendants.
    pub fn set_opacity(&mut self, id: VisualId, opacity: f32) {
        self.validate(id);
        if self.render[id.idx as usize].opacity == opacity {
            return;
        }
        self.render[id.idx as usize].opacity = opacity;
        self.push_subtree_damage(id.idx);
        self.notify_property_changed(id, &PropertyMetadata::RENDER);
    }

    /// Sets a visual's render transform.
    pub fn set_transform(&mut self, id: VisualId, transform: Affine) {
        self.validate(id);
        if self.render[id.idx as usize].transform == transform {
            return;
        }
        self.render[id.idx as usize].transform = transform;
        self.push_subtree_damage(id.idx);
        self.notify_property_changed(id, &PropertyMetadata::RENDER);
    }

    /// Sets a visual's clip rectangle.
    pub fn set_clip(&mut self, id: VisualId, clip: Option<Rect>) {
        self.validate(id);
        if self.render[id.idx as usize].clip == clip {
            return;
        }
        self.render[id.idx as usize].clip = clip;
        self.push_subtree_damage(id.idx);
        self.notify_property_changed(id, &PropertyMetadata::RENDER);
    }

    /// Sets a visual's brush key.
    pub fn set_brush(&mut self, id: VisualId, brush: u64) {
        self.validate(id);
        if self.render[id.idx as usize].brush == brush {
            return;
        }
        self.render[id.idx as usize].brush = brush;
        self.notify_property_changed(id, &PropertyMetadata::RENDER);
    }

    /// Shows or hides a visual and its subtree.
    pub fn set_visible(&mut self, id: VisualId, visible: bool) {
        self.validate(id);
        if self.render[id.idx as usize].visible == visible {
            return;
        }
        self.render[id.idx as usize].visible = visible;
        self.push_subtree_damage(id.idx);
        self.notify_property_changed(id, &PropertyMetadata::RENDER);
    }

    /// Sets a visual's relative draw cost, consulted by the cache policy.
    pub fn set_render_cost(&mut self, id: VisualId, cost: u32) {
        self.validate(id);
        self.traits[id.idx as usize].render_cost = cost;
    }

    /// Marks whether a visual draws differently while focused.
    pub fn set_focus_dependent_rendering(&mut self, id: VisualId, dependent: bool) {
        self.validate(id);
        self.traits[id.idx as usize].focus_dependent_rendering = dependent;
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: VisualId) {
        assert!(
            self.is_alive(id),
            "stale VisualId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    /// Builds a handle for a live slot.
    pub(crate) fn id_at(&self, idx: u32) -> VisualId {
        VisualId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    pub(crate) fn child_count_at(&self, idx: u32) -> u32 {
        let mut count = 0;
        let mut c = self.first_child[idx as usize];
        while c != INVALID {
            count += 1;
            c = self.next_sibling[c as usize];
        }
        count
    }

    /// Appends `c` to `p`'s child list.
    fn link_last(&mut self, p: u32, c: u32) {
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }
    }

    /// Bookkeeping shared by every attach operation.
    fn after_attach(&mut self, p: u32, c: u32) {
        self.structure_epoch += 1;
        self.dirty.mark(p, dirty::TOPOLOGY);
        self.bump_render_version(p);
        self.mark_render_chain(c);
        self.push_subtree_damage(c);
        if self.flags[c as usize].contains(InvalidationFlags::SUBTREE) {
            self.mark_subtree_dirty(p);
        }
        self.invalidate_measure_at(p);
    }

    /// Unlinks `c` from its parent, recording removal damage.
    fn detach(&mut self, c: u32) {
        let p = self.parent[c as usize];
        self.push_subtree_damage(c);
        self.mark_render_chain(c);
        self.unlink_from_parent(c);
        self.structure_epoch += 1;
        self.dirty.mark(p, dirty::TOPOLOGY);
        self.bump_render_version(p);
        self.invalidate_measure_at(p);
    }

    /// Removes `idx` from its parent's child list without touching dirty state.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            self.first_child[p as usize] = next;
        }
        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }

    pub(crate) fn push_damage(&mut self, rect: Rect) {
        if has_area(&rect) {
            self.pending_damage.push(rect);
        }
    }

    /// Adds the bounds of every visual in the subtree at `idx` as damage.
    pub(crate) fn push_subtree_damage(&mut self, idx: u32) {
        let r = self.bounds[idx as usize];
        self.push_damage(r);
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            self.push_subtree_damage(child);
            child = self.next_sibling[child as usize];
        }
    }
}
