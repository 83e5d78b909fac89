// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Root-scoped focus, hover, and caret blink state.

use crate::scheduler::UiRedrawReason;
use crate::time::{Duration, HostTime};
use crate::visual::{VisualId, VisualTree};

/// Caret blink phase for the focused visual.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaretState {
    /// Whether the caret is currently drawn.
    pub visible: bool,
    /// When visibility last toggled (or focus last moved).
    pub last_toggle: Option<HostTime>,
}

impl Default for CaretState {
    fn default() -> Self {
        Self {
            visible: true,
            last_toggle: None,
        }
    }
}

/// Tracks which visual has keyboard focus and which is hovered.
///
/// Changing either invalidates render on the old and the new visual.
#[derive(Clone, Copy, Debug, Default)]
pub struct FocusManager {
    focused: Option<VisualId>,
    hovered: Option<VisualId>,
    caret: CaretState,
}

impl FocusManager {
    /// Creates a manager with nothing focused or hovered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the focused visual.
    #[must_use]
    pub fn focused(&self) -> Option<VisualId> {
        self.focused
    }

    /// Returns the hovered visual.
    #[must_use]
    pub fn hovered(&self) -> Option<VisualId> {
        self.hovered
    }

    /// Returns the caret blink state.
    #[must_use]
    pub fn caret(&self) -> CaretState {
        self.caret
    }

    /// Moves keyboard focus. Returns `true` if it changed.
    ///
    /// The caret restarts visible.
    ///
    /// # Panics
    ///
    /// Panics if `target` is a stale handle.
    pub fn set_focused(&mut self, tree: &mut VisualTree, target: Option<VisualId>) -> bool {
        if self.focused == target {
            return false;
        }
        Self::swap_invalidating(tree, &mut self.focused, target);
        self.caret = CaretState::default();
        true
    }

    /// Moves hover. Returns `true` if it changed.
    ///
    /// # Panics
    ///
    /// Panics if `target` is a stale handle.
    pub fn set_hovered(&mut self, tree: &mut VisualTree, target: Option<VisualId>) -> bool {
        if self.hovered == target {
            return false;
        }
        Self::swap_invalidating(tree, &mut self.hovered, target);
        true
    }

    /// Drops focus and hover targets that were destroyed.
    ///
    /// Returns the reasons raised by the change.
    pub fn prune(&mut self, tree: &VisualTree) -> UiRedrawReason {
        let mut reasons = UiRedrawReason::empty();
        if self.focused.is_some_and(|id| !tree.is_alive(id)) {
            self.focused = None;
            self.caret = CaretState::default();
            reasons |= UiRedrawReason::FOCUS_CHANGED;
        }
        if self.hovered.is_some_and(|id| !tree.is_alive(id)) {
            self.hovered = None;
            reasons |= UiRedrawReason::HOVER_CHANGED;
        }
        reasons
    }

    /// Advances the caret blink of a focused visual with focus-dependent
    /// rendering.
    ///
    /// Returns `true` when the caret toggled this call; the focused visual's
    /// render is then invalidated. A zero `interval` disables blinking.
    pub fn advance_caret(
        &mut self,
        now: HostTime,
        interval: Duration,
        tree: &mut VisualTree,
    ) -> bool {
        let Some(focused) = self.focused else {
            return false;
        };
        if interval == Duration::ZERO
            || !tree.is_alive(focused)
            || !tree.traits(focused).focus_dependent_rendering
        {
            return false;
        }
        let Some(last) = self.caret.last_toggle else {
            self.caret.last_toggle = Some(now);
            return false;
        };
        if now.saturating_duration_since(last) < interval {
            return false;
        }
        self.caret.visible = !self.caret.visible;
        self.caret.last_toggle = Some(now);
        tree.invalidate_render(focused);
        true
    }

    /// Clears focus, hover, and caret state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn swap_invalidating(
        tree: &mut VisualTree,
        slot: &mut Option<VisualId>,
        target: Option<VisualId>,
    ) {
        if let Some(old) = slot.take()
            && tree.is_alive(old)
        {
            tree.invalidate_render(old);
        }
        if let Some(new) = target {
            tree.invalidate_render(new);
        }
        *slot = target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visual::InvalidationFlags;

    fn clean_pair() -> (VisualTree, VisualId, VisualId) {
        let mut tree = VisualTree::new();
        let a = tree.create_visual();
        let b = tree.create_visual();
        tree.clear_invalidation(a, InvalidationFlags::all());
        tree.clear_invalidation(b, InvalidationFlags::all());
        (tree, a, b)
    }

    #[test]
    fn focus_change_invalidates_old_and_new() {
        let (mut tree, a, b) = clean_pair();
        let mut focus = FocusManager::new();
        assert!(focus.set_focused(&mut tree, Some(a)));
        assert!(tree.flags(a).contains(InvalidationFlags::RENDER));
        tree.clear_invalidation(a, InvalidationFlags::all());

        assert!(focus.set_focused(&mut tree, Some(b)));
        assert!(tree.flags(a).contains(InvalidationFlags::RENDER));
        assert!(tree.flags(b).contains(InvalidationFlags::RENDER));
        assert!(!focus.set_focused(&mut tree, Some(b)), "unchanged");
    }

    #[test]
    fn hover_tracks_independently() {
        let (mut tree, a, _) = clean_pair();
        let mut focus = FocusManager::new();
        assert!(focus.set_hovered(&mut tree, Some(a)));
        assert_eq!(focus.hovered(), Some(a));
        assert_eq!(focus.focused(), None);
        assert!(focus.set_hovered(&mut tree, None));
    }

    #[test]
    fn caret_toggles_on_interval() {
        let (mut tree, a, _) = clean_pair();
        tree.set_focus_dependent_rendering(a, true);
        let mut focus = FocusManager::new();
        focus.set_focused(&mut tree, Some(a));
        let interval = Duration::from_millis(500);

        assert!(!focus.advance_caret(HostTime(0), interval, &mut tree), "arms");
        assert!(!focus.advance_caret(
            HostTime(Duration::from_millis(499).nanos()),
            interval,
            &mut tree
        ));
        assert!(focus.caret().visible);
        assert!(focus.advance_caret(
            HostTime(Duration::from_millis(500).nanos()),
            interval,
            &mut tree
        ));
        assert!(!focus.caret().visible);
    }

    #[test]
    fn caret_needs_focus_dependent_rendering() {
        let (mut tree, a, _) = clean_pair();
        let mut focus = FocusManager::new();
        focus.set_focused(&mut tree, Some(a));
        let interval = Duration::from_millis(1);
        focus.advance_caret(HostTime(0), interval, &mut tree);
        assert!(!focus.advance_caret(HostTime(u64::MAX), interval, &mut tree));
    }

    #[test]
    fn prune_drops_destroyed_targets() {
        let (mut tree, a, b) = clean_pair();
        let mut focus = FocusManager::new();
        focus.set_focused(&mut tree, Some(a));
        focus.set_hovered(&mut tree, Some(b));
        tree.destroy_subtree(a);
        tree.destroy_subtree(b);
        let reasons = focus.prune(&tree);
        assert_eq!(
            reasons,
            UiRedrawReason::FOCUS_CHANGED | UiRedrawReason::HOVER_CHANGED
        );
        assert_eq!(focus.focused(), None);
        assert_eq!(focus.hovered(), None);
    }
}
