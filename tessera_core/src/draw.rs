// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Draw pass output.
//!
//! [`UiRoot::draw`](crate::scheduler::UiRoot::draw) produces a [`DrawPass`]:
//! the visuals to paint, in order, each tagged with how the render cache
//! treats it, plus the damage to repaint. Pixel production belongs to a
//! [`Renderer`].

use alloc::vec::Vec;

use kurbo::Rect;

use crate::render_list::SyncOutcome;
use crate::visual::{VisualId, VisualTree};

/// How a draw item is painted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DrawMode {
    /// Paint directly; the cache policy declined to cache this visual.
    Direct,
    /// Paint the subtree into a fresh cache, then composite it.
    RebuildCache,
    /// Composite the existing cache. Descendants are not emitted.
    ReuseCache,
}

/// One visual to paint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawItem {
    /// The visual.
    pub visual: VisualId,
    /// Bounds in root space.
    pub bounds: Rect,
    /// Z-index among siblings.
    pub z_index: i32,
    /// Depth below the root.
    pub depth: u32,
    /// Cache treatment.
    pub mode: DrawMode,
}

/// Area to repaint.
#[derive(Clone, Debug, PartialEq)]
pub enum Damage {
    /// Repaint the whole viewport.
    Full,
    /// Repaint only these viewport-local rectangles.
    Regions(Vec<Rect>),
    /// Nothing is damaged.
    None,
}

/// Payload-free discriminant of [`Damage`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DamageKind {
    /// See [`Damage::Full`].
    Full,
    /// See [`Damage::Regions`].
    Regions,
    /// See [`Damage::None`].
    None,
}

impl Damage {
    /// Returns the discriminant.
    #[must_use]
    pub fn kind(&self) -> DamageKind {
        match self {
            Self::Full => DamageKind::Full,
            Self::Regions(_) => DamageKind::Regions,
            Self::None => DamageKind::None,
        }
    }

    /// Returns the damage rectangles (empty for `Full` and `None`).
    #[must_use]
    pub fn rects(&self) -> &[Rect] {
        match self {
            Self::Regions(rects) => rects,
            Self::Full | Self::None => &[],
        }
    }
}

/// The output of one draw.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawPass {
    /// Index of the frame this pass belongs to.
    pub frame_index: u64,
    /// Visuals to paint, in paint order.
    pub items: Vec<DrawItem>,
    /// Area to repaint.
    pub damage: Damage,
    /// How the render list was brought up to date.
    pub render_list: SyncOutcome,
    /// Items painted from a valid cache.
    pub cache_hits: u32,
    /// Items whose cache had to be (re)built.
    pub cache_misses: u32,
    /// Items the policy refused to cache.
    pub cache_bypasses: u32,
}

impl DrawPass {
    /// Returns the item for `visual`, if it was emitted.
    #[must_use]
    pub fn item(&self, visual: VisualId) -> Option<&DrawItem> {
        self.items.iter().find(|i| i.visual == visual)
    }
}

/// Produces pixels from a draw pass.
pub trait Renderer {
    /// Paints `pass`, reading visual state from `tree`.
    fn render(&mut self, tree: &VisualTree, pass: &DrawPass);
}
