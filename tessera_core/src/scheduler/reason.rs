// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Redraw reasons.

use bitflags::bitflags;

bitflags! {
    /// Why a frame must be drawn.
    ///
    /// The scheduler accumulates reasons across the phases of a frame. In
    /// conditional mode the frame draws iff the set is non-empty.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct UiRedrawReason: u32 {
        /// At least one animation clock ticked.
        const ANIMATION_ACTIVE = 1 << 0;
        /// The caret toggled visibility.
        const CARET_BLINK_ACTIVE = 1 << 1;
        /// The hovered visual changed.
        const HOVER_CHANGED = 1 << 2;
        /// The focused visual changed.
        const FOCUS_CHANGED = 1 << 3;
        /// The viewport size changed since the previous frame.
        const VIEWPORT_RESIZED = 1 << 4;
        /// The dirty region tracker holds regions.
        const DIRTY_REGIONS = 1 << 5;
        /// The whole frame is dirty.
        const FULL_FRAME_DIRTY = 1 << 6;
        /// A visual under the root has pending render invalidation.
        const RENDER_INVALIDATED = 1 << 7;
        /// First frame after construction or reset.
        const FIRST_FRAME = 1 << 8;
        /// Compatibility mode forces every frame.
        const ALWAYS_DRAW = 1 << 9;
        /// Conditional scheduling is off.
        const UNCONDITIONAL = 1 << 10;
    }
}

impl UiRedrawReason {
    /// No reason to draw.
    pub const NONE: Self = Self::empty();

    /// Reasons that force a draw independent of what changed.
    pub const FORCED: Self = Self::FIRST_FRAME
        .union(Self::ALWAYS_DRAW)
        .union(Self::UNCONDITIONAL);
}
