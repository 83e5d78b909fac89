// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-visual state records.

use bitflags::bitflags;
use kurbo::{Affine, Rect};

bitflags! {
    /// Invalidation state of a single visual.
    ///
    /// [`SUBTREE`](Self::SUBTREE) is set on a visual whenever it or any of its
    /// descendants carries one of the other flags. On the root it is the single
    /// "is anything dirty" signal.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct InvalidationFlags: u8 {
        /// Desired size must be recomputed.
        const MEASURE = 1 << 0;
        /// Final placement must be recomputed.
        const ARRANGE = 1 << 1;
        /// Pixels must be regenerated.
        const RENDER = 1 << 2;
        /// This visual or a descendant is dirty.
        const SUBTREE = 1 << 3;
        /// A descendant's pixels changed since render flags were last
        /// cleared, so output cached for this visual is stale. Cleared
        /// together with [`RENDER`](Self::RENDER).
        const DESCENDANT_RENDER = 1 << 4;

        /// Flags cleared by the layout phase.
        const LAYOUT = Self::MEASURE.bits() | Self::ARRANGE.bits();
        /// Flags carried by a freshly created visual.
        const FRESH = Self::MEASURE.bits()
            | Self::ARRANGE.bits()
            | Self::RENDER.bits()
            | Self::SUBTREE.bits();
    }
}

impl InvalidationFlags {
    /// Returns the visual's own flags, without [`SUBTREE`](Self::SUBTREE).
    #[inline]
    #[must_use]
    pub const fn own(self) -> Self {
        self.difference(Self::SUBTREE)
    }
}

/// Pixel-affecting state of a visual.
///
/// Everything here feeds [`signature`](Self::signature), which the render
/// cache compares against the snapshot taken when the cached output was built.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderState {
    /// Opacity in `[0, 1]`; children inherit it multiplicatively.
    pub opacity: f32,
    /// Render transform applied on top of layout placement.
    pub transform: Affine,
    /// Clip rectangle in root space, if any.
    pub clip: Option<Rect>,
    /// Opaque brush/material key resolved by the renderer.
    pub brush: u64,
    /// Whether the visual (and its subtree) is painted at all.
    pub visible: bool,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            transform: Affine::IDENTITY,
            clip: None,
            brush: 0,
            visible: true,
        }
    }
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

fn fnv_u64(mut hash: u64, value: u64) -> u64 {
    for byte in value.to_le_bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

impl RenderState {
    /// Returns a 64-bit FNV-1a hash of the pixel-affecting state.
    ///
    /// Floating-point fields are hashed by bit pattern, so `0.0` and `-0.0`
    /// hash differently.
    #[must_use]
    pub fn signature(&self) -> u64 {
        let mut h = FNV_OFFSET;
        h = fnv_u64(h, u64::from(self.opacity.to_bits()));
        for c in self.transform.as_coeffs() {
            h = fnv_u64(h, c.to_bits());
        }
        match self.clip {
            Some(r) => {
                h = fnv_u64(h, 1);
                h = fnv_u64(h, r.x0.to_bits());
                h = fnv_u64(h, r.y0.to_bits());
                h = fnv_u64(h, r.x1.to_bits());
                h = fnv_u64(h, r.y1.to_bits());
            }
            None => h = fnv_u64(h, 0),
        }
        h = fnv_u64(h, self.brush);
        fnv_u64(h, u64::from(self.visible))
    }
}

/// Cache-relevant traits of a visual that do not affect its pixels directly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct VisualTraits {
    /// Relative cost of drawing this visual alone (shaped text, paths).
    pub render_cost: u32,
    /// The visual draws differently while focused (e.g. a text caret).
    pub focus_dependent_rendering: bool,
}

/// Per-tree invalidation counters.
///
/// Each counter increments exactly once per clean→dirty transition;
/// coalesced duplicates are not counted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InvalidationCounters {
    /// Measure flag transitions.
    pub measure: u64,
    /// Arrange flag transitions.
    pub arrange: u64,
    /// Render flag transitions.
    pub render: u64,
    /// Ancestor walks performed to set `SUBTREE`.
    pub dirty_chain_walks: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_strips_subtree() {
        assert_eq!(
            InvalidationFlags::FRESH.own(),
            InvalidationFlags::MEASURE | InvalidationFlags::ARRANGE | InvalidationFlags::RENDER
        );
        assert!(InvalidationFlags::SUBTREE.own().is_empty());
    }

    #[test]
    fn signature_tracks_every_field() {
        let base = RenderState::default();
        let sig = base.signature();
        assert_eq!(sig, RenderState::default().signature(), "deterministic");

        let variants = [
            RenderState {
                opacity: 0.5,
                ..base
            },
            RenderState {
                transform: Affine::translate((1.0, 0.0)),
                ..base
            },
            RenderState {
                clip: Some(Rect::new(0.0, 0.0, 1.0, 1.0)),
                ..base
            },
            RenderState { brush: 7, ..base },
            RenderState {
                visible: false,
                ..base
            },
        ];
        for v in variants {
            assert_ne!(v.signature(), sig, "{v:?} should change the signature");
        }
    }
}
