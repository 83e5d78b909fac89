// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Phases, per-root frame state, and metrics.

use smallvec::SmallVec;

use super::UiRedrawReason;
use crate::time::HostTime;
use crate::viewport::Viewport;

/// One phase of a frame update.
///
/// Phases always run in the order of [`UiPhase::ALL`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UiPhase {
    /// Input delivery and caret blink.
    InputAndEvents,
    /// Deferred operations (binding propagation, scheduled callbacks).
    BindingAndDeferred,
    /// Measure and arrange.
    Layout,
    /// Animation clocks.
    Animation,
    /// Redraw reason aggregation and the draw decision.
    RenderScheduling,
}

impl UiPhase {
    /// Every phase, in execution order.
    pub const ALL: [Self; 5] = [
        Self::InputAndEvents,
        Self::BindingAndDeferred,
        Self::Layout,
        Self::Animation,
        Self::RenderScheduling,
    ];

    /// Returns the position of the phase in [`UiPhase::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::InputAndEvents => 0,
            Self::BindingAndDeferred => 1,
            Self::Layout => 2,
            Self::Animation => 3,
            Self::RenderScheduling => 4,
        }
    }

    /// Returns a stable display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::InputAndEvents => "InputAndEvents",
            Self::BindingAndDeferred => "BindingAndDeferred",
            Self::Layout => "Layout",
            Self::Animation => "Animation",
            Self::RenderScheduling => "RenderScheduling",
        }
    }
}

/// Read-only counters describing a root's scheduling history.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UiMetrics {
    /// Completed updates.
    pub frame_count: u64,
    /// Updates whose layout phase ran the layout host.
    pub layout_executed_frame_count: u64,
    /// Updates whose layout phase had nothing to do.
    pub layout_skipped_frame_count: u64,
    /// Draw passes produced.
    pub draw_executed_frame_count: u64,
    /// Updates that decided not to draw.
    pub draw_skipped_frame_count: u64,
    /// Times the dirty region tracker escalated to a full frame on overflow.
    pub full_redraw_fallback_count: u64,
    /// Draw items composited from a valid cache.
    pub cache_hit_count: u64,
    /// Draw items whose cache was (re)built.
    pub cache_miss_count: u64,
    /// Draw items the cache policy refused.
    pub cache_bypass_count: u64,
    /// Full render list rebuilds.
    pub render_list_rebuild_count: u64,
    /// Incremental render list synchronizations.
    pub render_list_sync_count: u64,
    /// Counted measure invalidations.
    pub measure_invalidation_count: u64,
    /// Counted arrange invalidations.
    pub arrange_invalidation_count: u64,
    /// Counted render invalidations.
    pub render_invalidation_count: u64,
    /// Deferred operations executed.
    pub deferred_operation_count: u64,
}

/// Root-scoped scheduling state.
#[derive(Clone, Debug, Default)]
pub(crate) struct FrameState {
    /// Phase currently running, `None` between updates.
    pub(crate) current_phase: Option<UiPhase>,
    /// Phases run by the latest update, in order.
    pub(crate) phase_log: SmallVec<[UiPhase; 5]>,
    /// Reasons aggregated by the latest update.
    pub(crate) last_reasons: UiRedrawReason,
    /// Frame time and decision of the latest update, cleared by a draw.
    pub(crate) decision: Option<(HostTime, bool)>,
    /// Reasons raised between updates, folded into the next one.
    pub(crate) external_reasons: UiRedrawReason,
    /// Viewport of the previous update.
    pub(crate) viewport: Option<Viewport>,
    /// Dirty region rendering was on during the previous update.
    pub(crate) regions_enabled: bool,
    pub(crate) frame_count: u64,
    pub(crate) layout_executed: u64,
    pub(crate) layout_skipped: u64,
    pub(crate) draw_executed: u64,
    pub(crate) draw_skipped: u64,
    pub(crate) cache_hits: u64,
    pub(crate) cache_misses: u64,
    pub(crate) cache_bypasses: u64,
}

impl FrameState {
    pub(crate) fn new() -> Self {
        Self {
            regions_enabled: true,
            ..Self::default()
        }
    }

    /// Returns `true` until the first update completes.
    pub(crate) fn is_first_frame(&self) -> bool {
        self.frame_count == 0
    }

    pub(crate) fn enter(&mut self, phase: UiPhase) {
        debug_assert!(
            self.phase_log.last().is_none_or(|p| p.index() < phase.index()),
            "phase {} entered out of order",
            phase.name()
        );
        self.current_phase = Some(phase);
        self.phase_log.push(phase);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_indices_follow_all() {
        for (i, phase) in UiPhase::ALL.iter().enumerate() {
            assert_eq!(phase.index(), i);
        }
        assert_eq!(UiPhase::Layout.name(), "Layout");
    }

    #[test]
    fn enter_logs_phases() {
        let mut state = FrameState::new();
        assert!(state.is_first_frame());
        for phase in UiPhase::ALL {
            state.enter(phase);
        }
        assert_eq!(state.phase_log.as_slice(), &UiPhase::ALL);
        assert_eq!(state.current_phase, Some(UiPhase::RenderScheduling));
    }
}
