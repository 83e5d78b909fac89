// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Input collaborator contract.
//!
//! The input layer (hit testing, routing, text input) lives outside the
//! core. Once per frame, in the `InputAndEvents` phase, the scheduler asks
//! the [`InputSource`] to deliver whatever arrived since the last frame.
//! Hover and focus changes made through the [`InputContext`] become redraw
//! reasons of the same frame.

use crate::dispatcher::{DeferredContext, Dispatcher};
use crate::focus::FocusManager;
use crate::scheduler::UiRedrawReason;
use crate::time::HostTime;
use crate::visual::{VisualId, VisualTree};

/// What an input source may touch while delivering a frame's input.
#[derive(Debug)]
pub struct InputContext<'a> {
    now: HostTime,
    tree: &'a mut VisualTree,
    focus: &'a mut FocusManager,
    dispatcher: &'a mut Dispatcher,
    reasons: &'a mut UiRedrawReason,
}

impl<'a> InputContext<'a> {
    pub(crate) fn new(
        now: HostTime,
        tree: &'a mut VisualTree,
        focus: &'a mut FocusManager,
        dispatcher: &'a mut Dispatcher,
        reasons: &'a mut UiRedrawReason,
    ) -> Self {
        Self {
            now,
            tree,
            focus,
            dispatcher,
            reasons,
        }
    }

    /// Returns the frame time.
    #[must_use]
    pub fn now(&self) -> HostTime {
        self.now
    }

    /// Returns the visual tree.
    #[must_use]
    pub fn tree(&self) -> &VisualTree {
        &*self.tree
    }

    /// Returns the visual tree for mutation.
    pub fn tree_mut(&mut self) -> &mut VisualTree {
        &mut *self.tree
    }

    /// Returns the focused visual.
    #[must_use]
    pub fn focused(&self) -> Option<VisualId> {
        self.focus.focused()
    }

    /// Returns the hovered visual.
    #[must_use]
    pub fn hovered(&self) -> Option<VisualId> {
        self.focus.hovered()
    }

    /// Moves hover, raising `HOVER_CHANGED` if it changed.
    pub fn set_hovered(&mut self, target: Option<VisualId>) {
        if self.focus.set_hovered(self.tree, target) {
            *self.reasons |= UiRedrawReason::HOVER_CHANGED;
        }
    }

    /// Moves keyboard focus, raising `FOCUS_CHANGED` if it changed.
    pub fn set_focused(&mut self, target: Option<VisualId>) {
        if self.focus.set_focused(self.tree, target) {
            *self.reasons |= UiRedrawReason::FOCUS_CHANGED;
        }
    }

    /// Schedules a deferred operation. It runs later in this same frame.
    pub fn enqueue(&mut self, op: impl FnOnce(&mut DeferredContext<'_>) + 'static) {
        self.dispatcher.enqueue(op);
    }
}

/// Delivers input to the UI once per frame.
pub trait InputSource {
    /// Applies the input that arrived since the previous frame.
    fn dispatch(&mut self, now: HostTime, ctx: &mut InputContext<'_>);
}

/// An input source that never delivers anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoInput;

impl InputSource for NoInput {
    fn dispatch(&mut self, now: HostTime, ctx: &mut InputContext<'_>) {
        _ = (now, ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ClearHover;

    impl InputSource for ClearHover {
        fn dispatch(&mut self, _now: HostTime, ctx: &mut InputContext<'_>) {
            ctx.set_hovered(None);
        }
    }

    #[test]
    fn hover_change_raises_reason() {
        let mut tree = VisualTree::new();
        let v = tree.create_visual();
        let mut focus = FocusManager::new();
        let mut dispatcher = Dispatcher::new();
        let mut reasons = UiRedrawReason::empty();
        {
            let mut ctx = InputContext::new(
                HostTime(5),
                &mut tree,
                &mut focus,
                &mut dispatcher,
                &mut reasons,
            );
            assert_eq!(ctx.now(), HostTime(5));
            ctx.set_hovered(Some(v));
            ctx.set_hovered(Some(v));
            ctx.enqueue(|_| {});
        }
        assert_eq!(reasons, UiRedrawReason::HOVER_CHANGED);
        assert_eq!(focus.hovered(), Some(v));
        assert_eq!(dispatcher.pending(), 1);
    }

    #[test]
    fn unchanged_hover_raises_nothing() {
        let mut tree = VisualTree::new();
        let mut focus = FocusManager::new();
        let mut dispatcher = Dispatcher::new();
        let mut reasons = UiRedrawReason::empty();
        let mut ctx = InputContext::new(
            HostTime(0),
            &mut tree,
            &mut focus,
            &mut dispatcher,
            &mut reasons,
        );
        ClearHover.dispatch(HostTime(0), &mut ctx);
        assert!(reasons.is_empty());
    }
}
