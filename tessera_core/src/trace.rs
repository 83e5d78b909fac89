// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the frame update.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! scheduler calls at each stage of a frame. All method bodies default to
//! no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! [`FrameSummaryBuilder`] collects phase timestamps during an update and
//! produces a [`FrameSummary`] at the end.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates the dirty region event and the
//!   corresponding `TraceSink` method.

#[cfg(feature = "trace-rich")]
use kurbo::Rect;
use kurbo::Size;

use crate::draw::DamageKind;
use crate::render_list::SyncOutcome;
use crate::scheduler::{UiPhase, UiRedrawReason};
use crate::time::HostTime;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when an update starts.
#[derive(Clone, Copy, Debug)]
pub struct FrameBeginEvent {
    /// Monotonic frame counter.
    pub frame_index: u64,
    /// Frame time passed to the update.
    pub now: HostTime,
    /// Viewport size passed to the update.
    pub viewport: Size,
}

/// Marks the beginning of a phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which phase is starting.
    pub phase: UiPhase,
    /// Host time at the start of the phase.
    pub timestamp: HostTime,
}

/// Marks the end of a phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which phase is ending.
    pub phase: UiPhase,
    /// Host time at the end of the phase.
    pub timestamp: HostTime,
}

/// Emitted once the render scheduling phase reaches its decision.
#[derive(Clone, Copy, Debug)]
pub struct DrawDecisionEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Whether the frame will draw.
    pub should_draw: bool,
    /// Aggregated redraw reasons.
    pub reasons: UiRedrawReason,
}

/// Emitted after the render list is brought up to date for a draw.
#[derive(Clone, Copy, Debug)]
pub struct RenderListEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Rebuild or synchronize.
    pub outcome: SyncOutcome,
    /// Entries in the list afterwards.
    pub entries: u32,
}

/// Emitted when a draw pass is produced.
#[derive(Clone, Copy, Debug)]
pub struct DrawPassEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Items emitted.
    pub items: u32,
    /// Items composited from a valid cache.
    pub cache_hits: u32,
    /// Items whose cache was rebuilt.
    pub cache_misses: u32,
    /// Items drawn directly.
    pub cache_bypasses: u32,
    /// Kind of damage attached to the pass.
    pub damage: DamageKind,
}

/// Per-update timing summary produced by [`FrameSummaryBuilder`].
#[derive(Clone, Copy, Debug)]
pub struct FrameSummary {
    /// Frame counter.
    pub frame_index: u64,
    /// Frame time passed to the update.
    pub now: HostTime,
    /// Duration of each phase in nanoseconds, indexed by [`UiPhase::index`]
    /// (0 if not measured).
    pub phase_nanos: [u64; 5],
    /// Whether the frame will draw.
    pub should_draw: bool,
    /// Aggregated redraw reasons.
    pub reasons: UiRedrawReason,
}

impl FrameSummary {
    /// Returns the measured duration of `phase` in nanoseconds.
    #[must_use]
    pub fn phase_nanos(&self, phase: UiPhase) -> u64 {
        self.phase_nanos[phase.index()]
    }

    /// Returns the sum of all phase durations.
    #[must_use]
    pub fn total_nanos(&self) -> u64 {
        self.phase_nanos.iter().fold(0, |acc, &n| acc.saturating_add(n))
    }
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the scheduler.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when an update starts.
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        _ = e;
    }

    /// Called at the beginning of a phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called with the draw decision of an update.
    fn on_draw_decision(&mut self, e: &DrawDecisionEvent) {
        _ = e;
    }

    /// Called after the render list is rebuilt or synchronized.
    fn on_render_list(&mut self, e: &RenderListEvent) {
        _ = e;
    }

    /// Called when a draw pass is produced.
    fn on_draw_pass(&mut self, e: &DrawPassEvent) {
        _ = e;
    }

    /// Called with a per-update timing summary.
    fn on_frame_summary(&mut self, s: &FrameSummary) {
        _ = s;
    }

    /// Called with the dirty regions handed to the renderer (requires
    /// `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_dirty_regions(&mut self, frame_index: u64, rects: &[Rect]) {
        _ = (frame_index, rects);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`FrameBeginEvent`].
    #[inline]
    pub fn frame_begin(&mut self, e: &FrameBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DrawDecisionEvent`].
    #[inline]
    pub fn draw_decision(&mut self, e: &DrawDecisionEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_draw_decision(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RenderListEvent`].
    #[inline]
    pub fn render_list(&mut self, e: &RenderListEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_render_list(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DrawPassEvent`].
    #[inline]
    pub fn draw_pass(&mut self, e: &DrawPassEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_draw_pass(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameSummary`].
    #[inline]
    pub fn frame_summary(&mut self, s: &FrameSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_frame_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits dirty regions (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn dirty_regions(&mut self, frame_index: u64, rects: &[Rect]) {
        if let Some(s) = &mut self.sink {
            s.on_dirty_regions(frame_index, rects);
        }
    }
}

// ---------------------------------------------------------------------------
// FrameSummaryBuilder
// ---------------------------------------------------------------------------

/// Collects phase timestamps during an update and produces a
/// [`FrameSummary`].
#[derive(Debug)]
pub struct FrameSummaryBuilder {
    frame_index: u64,
    now: HostTime,
    phase_starts: [Option<HostTime>; 5],
    phase_ends: [Option<HostTime>; 5],
}

impl FrameSummaryBuilder {
    /// Starts building a summary for the given update.
    #[must_use]
    pub fn new(begin: &FrameBeginEvent) -> Self {
        Self {
            frame_index: begin.frame_index,
            now: begin.now,
            phase_starts: [None; 5],
            phase_ends: [None; 5],
        }
    }

    /// Records the start of a phase.
    pub fn phase_begin(&mut self, phase: UiPhase, t: HostTime) {
        self.phase_starts[phase.index()] = Some(t);
    }

    /// Records the end of a phase.
    pub fn phase_end(&mut self, phase: UiPhase, t: HostTime) {
        self.phase_ends[phase.index()] = Some(t);
    }

    /// Consumes the builder and produces the final [`FrameSummary`].
    #[must_use]
    pub fn finish(self, should_draw: bool, reasons: UiRedrawReason) -> FrameSummary {
        let mut phase_nanos = [0; 5];
        for phase in UiPhase::ALL {
            phase_nanos[phase.index()] = self.phase_duration(phase);
        }
        FrameSummary {
            frame_index: self.frame_index,
            now: self.now,
            phase_nanos,
            should_draw,
            reasons,
        }
    }

    fn phase_duration(&self, phase: UiPhase) -> u64 {
        let idx = phase.index();
        match (self.phase_starts[idx], self.phase_ends[idx]) {
            (Some(start), Some(end)) => end.saturating_duration_since(start).nanos(),
            _ => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_begin() -> FrameBeginEvent {
        FrameBeginEvent {
            frame_index: 42,
            now: HostTime(1_000_000),
            viewport: Size::new(800.0, 600.0),
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_frame_begin(&sample_begin());
        sink.on_draw_decision(&DrawDecisionEvent {
            frame_index: 0,
            should_draw: false,
            reasons: UiRedrawReason::NONE,
        });
        sink.on_draw_pass(&DrawPassEvent {
            frame_index: 0,
            items: 0,
            cache_hits: 0,
            cache_misses: 0,
            cache_bypasses: 0,
            damage: DamageKind::None,
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.frame_begin(&sample_begin());
        tracer.phase_begin(&PhaseBeginEvent {
            frame_index: 42,
            phase: UiPhase::Layout,
            timestamp: HostTime(0),
        });
    }

    #[test]
    fn summary_builder_computes_durations() {
        let mut builder = FrameSummaryBuilder::new(&sample_begin());
        builder.phase_begin(UiPhase::InputAndEvents, HostTime(1_000_000));
        builder.phase_end(UiPhase::InputAndEvents, HostTime(1_000_100));
        builder.phase_begin(UiPhase::Layout, HostTime(1_000_100));
        builder.phase_end(UiPhase::Layout, HostTime(1_000_500));
        builder.phase_begin(UiPhase::RenderScheduling, HostTime(1_000_500));
        builder.phase_end(UiPhase::RenderScheduling, HostTime(1_000_550));

        let summary = builder.finish(true, UiRedrawReason::FIRST_FRAME);
        assert_eq!(summary.frame_index, 42);
        assert_eq!(summary.phase_nanos(UiPhase::InputAndEvents), 100);
        assert_eq!(summary.phase_nanos(UiPhase::BindingAndDeferred), 0);
        assert_eq!(summary.phase_nanos(UiPhase::Layout), 400);
        assert_eq!(summary.phase_nanos(UiPhase::RenderScheduling), 50);
        assert_eq!(summary.total_nanos(), 550);
        assert!(summary.should_draw);
    }

    #[test]
    fn summary_builder_missing_phases_are_zero() {
        let summary =
            FrameSummaryBuilder::new(&sample_begin()).finish(false, UiRedrawReason::NONE);
        assert_eq!(summary.phase_nanos, [0; 5]);
        assert_eq!(summary.total_nanos(), 0);
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            phases: Vec<UiPhase>,
        }
        impl TraceSink for RecordingSink {
            fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
                self.phases.push(e.phase);
            }
        }

        let mut sink = RecordingSink { phases: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        tracer.phase_begin(&PhaseBeginEvent {
            frame_index: 1,
            phase: UiPhase::Animation,
            timestamp: HostTime(0),
        });
        drop(tracer);
        assert_eq!(sink.phases, &[UiPhase::Animation]);
    }
}
