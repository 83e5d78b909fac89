// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are printed in microseconds.

use std::io::Write;

use kurbo::Rect;
use tessera_core::render_list::SyncOutcome;
use tessera_core::time::HostTime;
use tessera_core::trace::{
    DrawDecisionEvent, DrawPassEvent, FrameBeginEvent, FrameSummary, PhaseBeginEvent,
    PhaseEndEvent, RenderListEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its writer.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer
    }
}

fn us(nanos: u64) -> f64 {
    nanos as f64 / 1000.0
}

fn host_us(t: HostTime) -> f64 {
    us(t.nanos())
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[frame] frame={} now={:.1}µs viewport={}x{}",
            e.frame_index,
            host_us(e.now),
            e.viewport.width,
            e.viewport.height,
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] frame={} {} at {:.1}µs",
            e.frame_index,
            e.phase.name(),
            host_us(e.timestamp),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] frame={} {} at {:.1}µs",
            e.frame_index,
            e.phase.name(),
            host_us(e.timestamp),
        );
    }

    fn on_draw_decision(&mut self, e: &DrawDecisionEvent) {
        let verdict = if e.should_draw { "DRAW" } else { "skip" };
        let _ = writeln!(
            self.writer,
            "[decision] frame={} {verdict} reasons={:?}",
            e.frame_index, e.reasons,
        );
    }

    fn on_render_list(&mut self, e: &RenderListEvent) {
        let outcome = match e.outcome {
            SyncOutcome::Synchronized { refreshed } => format!("sync refreshed={refreshed}"),
            SyncOutcome::Rebuilt(cause) => format!("rebuild cause={cause:?}"),
        };
        let _ = writeln!(
            self.writer,
            "[render-list] frame={} {outcome} entries={}",
            e.frame_index, e.entries,
        );
    }

    fn on_draw_pass(&mut self, e: &DrawPassEvent) {
        let _ = writeln!(
            self.writer,
            "[draw] frame={} items={} hits={} misses={} bypasses={} damage={:?}",
            e.frame_index, e.items, e.cache_hits, e.cache_misses, e.cache_bypasses, e.damage,
        );
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        let verdict = if s.should_draw { "DRAW" } else { "skip" };
        let _ = writeln!(
            self.writer,
            "[summary] frame={} input={:.1}µs deferred={:.1}µs layout={:.1}µs \
             animation={:.1}µs scheduling={:.1}µs {verdict}",
            s.frame_index,
            us(s.phase_nanos[0]),
            us(s.phase_nanos[1]),
            us(s.phase_nanos[2]),
            us(s.phase_nanos[3]),
            us(s.phase_nanos[4]),
        );
    }

    fn on_dirty_regions(&mut self, frame_index: u64, rects: &[Rect]) {
        let _ = writeln!(
            self.writer,
            "[regions] frame={frame_index} rects={}",
            rects.len(),
        );
    }
}
