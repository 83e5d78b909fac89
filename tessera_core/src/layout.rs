// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout collaborator contract.
//!
//! Measure and arrange algorithms belong to the widget layer. The scheduler
//! decides *whether* layout runs this frame and hands the work to a
//! [`LayoutHost`], which writes results back with
//! [`VisualTree::set_bounds`]. Once the host returns, the scheduler clears
//! measure and arrange flags across the root's subtree.

use crate::viewport::Viewport;
use crate::visual::{VisualId, VisualTree};

/// One layout pass worth of work.
#[derive(Clone, Copy, Debug)]
pub struct LayoutRequest<'a> {
    /// The viewport to lay out into.
    pub viewport: Viewport,
    /// The root visual.
    pub root: VisualId,
    /// The viewport differs from the previous frame's.
    pub viewport_changed: bool,
    /// Visuals under `root` whose measure was invalidated, in slot order.
    pub measure: &'a [VisualId],
    /// Visuals under `root` whose arrange was invalidated, in slot order.
    pub arrange: &'a [VisualId],
}

/// Performs measure and arrange for a visual tree.
pub trait LayoutHost {
    /// Lays out `request.root`'s subtree.
    fn layout(&mut self, tree: &mut VisualTree, request: &LayoutRequest<'_>);
}

/// A host that leaves bounds untouched.
///
/// For embedders that position visuals themselves.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoLayout;

impl LayoutHost for NoLayout {
    fn layout(&mut self, tree: &mut VisualTree, request: &LayoutRequest<'_>) {
        _ = (tree, request);
    }
}

/// A host that sizes the root to the viewport and leaves descendants alone.
#[derive(Clone, Copy, Debug, Default)]
pub struct RootFill;

impl LayoutHost for RootFill {
    fn layout(&mut self, tree: &mut VisualTree, request: &LayoutRequest<'_>) {
        tree.set_bounds(request.root, request.viewport.rect());
    }
}
