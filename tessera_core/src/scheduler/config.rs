// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scheduler configuration.

use crate::time::Duration;

/// Toggles for each optimization layer, plus tuning knobs.
///
/// Every layer can be turned off independently, which is how an incorrect
/// skip is traced back to the layer that caused it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Keep the render list between frames and synchronize it in place.
    /// When off, the list is rebuilt on every draw.
    pub use_retained_render_list: bool,
    /// Track dirty rectangles. When off, any damage escalates to a full
    /// frame redraw.
    pub use_dirty_region_rendering: bool,
    /// Skip frames with no redraw reason. When off, every frame draws.
    pub use_conditional_draw_scheduling: bool,
    /// Draw every frame regardless of all other settings.
    pub always_draw_compatibility_mode: bool,
    /// Region count above which the tracker escalates to a full frame.
    pub max_dirty_regions: usize,
    /// Caret blink half-period. Zero disables blinking.
    pub caret_blink_interval: Duration,
}

impl SchedulerConfig {
    /// Every optimization layer on.
    #[must_use]
    pub const fn optimized() -> Self {
        Self {
            use_retained_render_list: true,
            use_dirty_region_rendering: true,
            use_conditional_draw_scheduling: true,
            always_draw_compatibility_mode: false,
            max_dirty_regions: 8,
            caret_blink_interval: Duration::from_millis(530),
        }
    }

    /// Redraw the full frame every frame, rebuilding the render list each
    /// time.
    #[must_use]
    pub const fn legacy() -> Self {
        Self {
            use_retained_render_list: false,
            use_dirty_region_rendering: false,
            use_conditional_draw_scheduling: false,
            ..Self::optimized()
        }
    }

    /// [`optimized`](Self::optimized), but present every frame for renderers
    /// that need a guaranteed per-frame draw.
    #[must_use]
    pub const fn compatibility() -> Self {
        Self {
            always_draw_compatibility_mode: true,
            ..Self::optimized()
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::optimized()
    }
}
