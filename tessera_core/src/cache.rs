// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render cache admissibility.
//!
//! A [`RenderCachePolicy`] decides per visual whether its rendered subtree may
//! be cached ([`can_cache`](RenderCachePolicy::can_cache)) and whether an
//! existing cache must be regenerated
//! ([`should_rebuild_cache`](RenderCachePolicy::should_rebuild_cache)). The
//! scheduler depends only on these two methods.
//!
//! Cache validity is version-stamp equality: a [`RenderCacheSnapshot`] stays
//! reusable only while the visual's render version, layout version, and
//! render state signature all equal the recorded values. There is no partial
//! invalidation inside a cached subtree; any descendant change bumps the
//! ancestor's render version.

use alloc::vec::Vec;

use kurbo::Rect;

use crate::region::has_area;
use crate::visual::{VisualId, VisualTree};

/// What the policy knows about the visual itself.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CacheCandidate {
    /// The visual being considered.
    pub visual: VisualId,
    /// Bounds in root space, or `None` if the visual has no area yet.
    pub bounds: Option<Rect>,
    /// Current render version.
    pub render_version: u64,
    /// Current layout version.
    pub layout_version: u64,
    /// Current render state signature.
    pub render_state_signature: u64,
    /// Number of direct children.
    pub child_count: u32,
}

impl CacheCandidate {
    /// Reads the candidate's current state from the tree.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    #[must_use]
    pub fn from_tree(tree: &VisualTree, id: VisualId) -> Self {
        tree.validate(id);
        let i = id.idx as usize;
        let bounds = tree.bounds[i];
        Self {
            visual: id,
            bounds: has_area(&bounds).then_some(bounds),
            render_version: tree.render_version[i],
            layout_version: tree.layout_version[i],
            render_state_signature: tree.render[i].signature(),
            child_count: tree.child_count_at(id.idx),
        }
    }

    /// Captures a snapshot of the candidate as it is now.
    ///
    /// Returns `None` if the candidate has no bounds.
    #[must_use]
    pub fn snapshot(&self) -> Option<RenderCacheSnapshot> {
        Some(RenderCacheSnapshot {
            bounds: self.bounds?,
            render_version: self.render_version,
            layout_version: self.layout_version,
            render_state_signature: self.render_state_signature,
        })
    }
}

/// Frame-dependent facts about a visual and its subtree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheContext {
    /// The visual and all its ancestors are visible with nonzero opacity.
    pub effectively_visible: bool,
    /// The visual currently has keyboard focus.
    pub focused: bool,
    /// The visual draws differently while focused.
    pub focus_dependent_rendering: bool,
    /// The visual or a descendant has a non-identity render transform.
    pub has_transform: bool,
    /// The visual or a descendant has a clip.
    pub has_clip: bool,
    /// Number of visuals in the subtree, including the visual itself.
    pub subtree_visual_count: u32,
    /// Sum of render costs across the subtree.
    pub subtree_render_cost: u32,
}

/// Memoized description of what was last rendered for a visual.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderCacheSnapshot {
    /// Bounds the cached output covers.
    pub bounds: Rect,
    /// Render version at capture time.
    pub render_version: u64,
    /// Layout version at capture time.
    pub layout_version: u64,
    /// Render state signature at capture time.
    pub render_state_signature: u64,
}

impl RenderCacheSnapshot {
    /// Returns `true` if the candidate's stamps all equal the recorded ones.
    #[must_use]
    pub fn matches(&self, candidate: &CacheCandidate) -> bool {
        self.render_version == candidate.render_version
            && self.layout_version == candidate.layout_version
            && self.render_state_signature == candidate.render_state_signature
    }
}

/// Strategy deciding when a visual's rendered subtree may be reused.
pub trait RenderCachePolicy {
    /// Returns whether the visual may be rendered through a cache at all.
    fn can_cache(&self, candidate: &CacheCandidate, context: &CacheContext) -> bool;

    /// Returns whether the cached output described by `snapshot` is stale.
    fn should_rebuild_cache(
        &self,
        candidate: &CacheCandidate,
        context: &CacheContext,
        snapshot: &RenderCacheSnapshot,
    ) -> bool {
        _ = context;
        !snapshot.matches(candidate)
    }
}

/// The default heuristics.
///
/// A visual is never cached when it is not effectively visible, has no
/// bounds, or is focused and draws a focus-dependent state. Otherwise it is
/// cached when its subtree carries a transform or at least
/// `expensive_cost_threshold` of render cost. Containers with fewer than
/// `min_subtree_visuals` visuals and no transform or clip are drawn directly.
/// Everything else (leaves, large static subtrees) is cached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DefaultCachePolicy {
    /// Containers with fewer visuals than this are drawn directly.
    pub min_subtree_visuals: u32,
    /// Subtree render cost at or above which caching always pays off.
    pub expensive_cost_threshold: u32,
}

impl DefaultCachePolicy {
    /// Creates the policy with its default thresholds (8 visuals, cost 64).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            min_subtree_visuals: 8,
            expensive_cost_threshold: 64,
        }
    }
}

impl Default for DefaultCachePolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderCachePolicy for DefaultCachePolicy {
    fn can_cache(&self, candidate: &CacheCandidate, context: &CacheContext) -> bool {
        if !context.effectively_visible || candidate.bounds.is_none() {
            return false;
        }
        if context.focused && context.focus_dependent_rendering {
            return false;
        }
        if context.has_transform || context.subtree_render_cost >= self.expensive_cost_threshold {
            return true;
        }
        if candidate.child_count > 0
            && !context.has_clip
            && context.subtree_visual_count < self.min_subtree_visuals
        {
            return false;
        }
        true
    }
}

/// Caches every visual with bounds. Useful for headless tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AlwaysCachePolicy;

impl RenderCachePolicy for AlwaysCachePolicy {
    fn can_cache(&self, candidate: &CacheCandidate, context: &CacheContext) -> bool {
        context.effectively_visible && candidate.bounds.is_some()
    }
}

/// Never caches; every visual is drawn directly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NeverCachePolicy;

impl RenderCachePolicy for NeverCachePolicy {
    fn can_cache(&self, candidate: &CacheCandidate, context: &CacheContext) -> bool {
        _ = (candidate, context);
        false
    }
}

/// Snapshots keyed by visual slot.
///
/// A slot's snapshot is only returned for the exact [`VisualId`] it was
/// stored under, so a reused slot never inherits a stale cache.
#[derive(Clone, Debug, Default)]
pub struct RenderCacheStore {
    slots: Vec<Option<(VisualId, RenderCacheSnapshot)>>,
}

impl RenderCacheStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the snapshot stored for `id`.
    #[must_use]
    pub fn get(&self, id: VisualId) -> Option<&RenderCacheSnapshot> {
        match self.slots.get(id.idx as usize)? {
            Some((owner, snapshot)) if *owner == id => Some(snapshot),
            _ => None,
        }
    }

    /// Stores (or replaces) the snapshot for `id`.
    pub fn insert(&mut self, id: VisualId, snapshot: RenderCacheSnapshot) {
        let i = id.idx as usize;
        if self.slots.len() <= i {
            self.slots.resize(i + 1, None);
        }
        self.slots[i] = Some((id, snapshot));
    }

    /// Removes the snapshot for `id`.
    pub fn remove(&mut self, id: VisualId) -> Option<RenderCacheSnapshot> {
        let slot = self.slots.get_mut(id.idx as usize)?;
        if slot.is_some_and(|(owner, _)| owner == id) {
            slot.take().map(|(_, s)| s)
        } else {
            None
        }
    }

    /// Drops snapshots whose visual is no longer alive.
    pub fn prune(&mut self, tree: &VisualTree) {
        for slot in &mut self.slots {
            if slot.is_some_and(|(id, _)| !tree.is_alive(id)) {
                *slot = None;
            }
        }
    }

    /// Returns the number of stored snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Returns `true` if no snapshot is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every snapshot.
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Affine;

    use super::*;
    use crate::visual::InvalidationFlags;

    fn visible_ctx() -> CacheContext {
        CacheContext {
            effectively_visible: true,
            subtree_visual_count: 1,
            ..CacheContext::default()
        }
    }

    fn leaf(tree: &mut VisualTree) -> VisualId {
        let v = tree.create_visual();
        tree.set_bounds(v, Rect::new(0.0, 0.0, 10.0, 10.0));
        v
    }

    #[test]
    fn invisible_or_boundless_is_not_cached() {
        let mut tree = VisualTree::new();
        let v = leaf(&mut tree);
        let policy = DefaultCachePolicy::new();
        let cand = CacheCandidate::from_tree(&tree, v);
        assert!(policy.can_cache(&cand, &visible_ctx()));
        assert!(!policy.can_cache(&cand, &CacheContext::default()));

        let empty = tree.create_visual();
        let cand = CacheCandidate::from_tree(&tree, empty);
        assert_eq!(cand.bounds, None);
        assert!(!policy.can_cache(&cand, &visible_ctx()));
    }

    #[test]
    fn focused_caret_is_not_cached() {
        let mut tree = VisualTree::new();
        let v = leaf(&mut tree);
        let cand = CacheCandidate::from_tree(&tree, v);
        let ctx = CacheContext {
            focused: true,
            focus_dependent_rendering: true,
            ..visible_ctx()
        };
        assert!(!DefaultCachePolicy::new().can_cache(&cand, &ctx));
        let ctx = CacheContext {
            focused: true,
            ..visible_ctx()
        };
        assert!(DefaultCachePolicy::new().can_cache(&cand, &ctx));
    }

    #[test]
    fn small_plain_container_is_drawn_directly() {
        let mut tree = VisualTree::new();
        let parent = leaf(&mut tree);
        let child = leaf(&mut tree);
        tree.add_child(parent, child);
        let cand = CacheCandidate::from_tree(&tree, parent);
        let policy = DefaultCachePolicy::new();
        let ctx = CacheContext {
            subtree_visual_count: 2,
            ..visible_ctx()
        };
        assert!(!policy.can_cache(&cand, &ctx));

        let with_transform = CacheContext {
            has_transform: true,
            ..ctx
        };
        assert!(policy.can_cache(&cand, &with_transform));

        let with_clip = CacheContext {
            has_clip: true,
            ..ctx
        };
        assert!(policy.can_cache(&cand, &with_clip));

        let expensive = CacheContext {
            subtree_render_cost: 64,
            ..ctx
        };
        assert!(policy.can_cache(&cand, &expensive));

        let large = CacheContext {
            subtree_visual_count: 8,
            ..ctx
        };
        assert!(policy.can_cache(&cand, &large));
    }

    #[test]
    fn rebuild_after_render_invalidation() {
        let mut tree = VisualTree::new();
        let v = leaf(&mut tree);
        tree.clear_invalidation(v, InvalidationFlags::all());
        let policy = DefaultCachePolicy::new();
        let ctx = visible_ctx();

        let cand = CacheCandidate::from_tree(&tree, v);
        let snapshot = cand.snapshot().unwrap();
        assert!(!policy.should_rebuild_cache(&cand, &ctx, &snapshot));

        tree.invalidate_render(v);
        let cand = CacheCandidate::from_tree(&tree, v);
        assert!(policy.should_rebuild_cache(&cand, &ctx, &snapshot));
    }

    #[test]
    fn any_stamp_mismatch_rebuilds() {
        let mut tree = VisualTree::new();
        let v = leaf(&mut tree);
        let policy = AlwaysCachePolicy;
        let ctx = visible_ctx();
        let snapshot = CacheCandidate::from_tree(&tree, v).snapshot().unwrap();

        tree.set_bounds(v, Rect::new(0.0, 0.0, 20.0, 10.0));
        let cand = CacheCandidate::from_tree(&tree, v);
        assert!(policy.should_rebuild_cache(&cand, &ctx, &snapshot));

        let snapshot = cand.snapshot().unwrap();
        tree.set_transform(v, Affine::scale(2.0));
        let cand = CacheCandidate::from_tree(&tree, v);
        assert_ne!(cand.render_state_signature, snapshot.render_state_signature);
        assert!(policy.should_rebuild_cache(&cand, &ctx, &snapshot));
    }

    #[test]
    fn never_policy_rejects_everything() {
        let mut tree = VisualTree::new();
        let v = leaf(&mut tree);
        let cand = CacheCandidate::from_tree(&tree, v);
        assert!(!NeverCachePolicy.can_cache(&cand, &visible_ctx()));
        assert!(AlwaysCachePolicy.can_cache(&cand, &visible_ctx()));
    }

    #[test]
    fn store_ignores_reused_slots() {
        let mut tree = VisualTree::new();
        let v = leaf(&mut tree);
        let snapshot = CacheCandidate::from_tree(&tree, v).snapshot().unwrap();
        let mut store = RenderCacheStore::new();
        store.insert(v, snapshot);
        assert_eq!(store.get(v), Some(&snapshot));

        tree.destroy_subtree(v);
        let w = tree.create_visual();
        assert_eq!(w.index(), v.index());
        assert_eq!(store.get(w), None);

        store.prune(&tree);
        assert!(store.is_empty());
    }

    #[test]
    fn store_remove_checks_owner() {
        let mut tree = VisualTree::new();
        let v = leaf(&mut tree);
        let snapshot = CacheCandidate::from_tree(&tree, v).snapshot().unwrap();
        let mut store = RenderCacheStore::new();
        store.insert(v, snapshot);
        assert_eq!(store.remove(v), Some(snapshot));
        assert_eq!(store.remove(v), None);
        assert_eq!(store.len(), 0);
    }
}
