// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! The dirty region event ([`on_dirty_regions`](TraceSink::on_dirty_regions))
//! stores only the count.

use kurbo::{Rect, Size};
use tessera_core::draw::DamageKind;
use tessera_core::render_list::{RebuildCause, SyncOutcome};
use tessera_core::scheduler::{UiPhase, UiRedrawReason};
use tessera_core::time::HostTime;
use tessera_core::trace::{
    DrawDecisionEvent, DrawPassEvent, FrameBeginEvent, FrameSummary, PhaseBeginEvent,
    PhaseEndEvent, RenderListEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_FRAME_BEGIN: u8 = 1;
const TAG_PHASE_BEGIN: u8 = 2;
const TAG_PHASE_END: u8 = 3;
const TAG_DRAW_DECISION: u8 = 4;
const TAG_RENDER_LIST: u8 = 5;
const TAG_DRAW_PASS: u8 = 6;
const TAG_FRAME_SUMMARY: u8 = 7;
const TAG_DIRTY_REGIONS_COUNT: u8 = 8;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    fn write_phase(&mut self, p: UiPhase) {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "there are five phases"
        )]
        self.write_u8(p.index() as u8);
    }

    fn write_outcome(&mut self, outcome: SyncOutcome) {
        match outcome {
            SyncOutcome::Synchronized { refreshed } => {
                self.write_u8(0);
                self.write_u64(refreshed as u64);
            }
            SyncOutcome::Rebuilt(cause) => {
                self.write_u8(1);
                self.write_u64(match cause {
                    RebuildCause::NeverBuilt => 0,
                    RebuildCause::RootChanged => 1,
                    RebuildCause::TopologyChanged => 2,
                    RebuildCause::StructureChanged => 3,
                    RebuildCause::DanglingVisual => 4,
                    RebuildCause::Disabled => 5,
                });
            }
        }
    }

    fn write_damage(&mut self, d: DamageKind) {
        self.write_u8(match d {
            DamageKind::None => 0,
            DamageKind::Regions => 1,
            DamageKind::Full => 2,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        self.write_u8(TAG_FRAME_BEGIN);
        self.write_u64(e.frame_index);
        self.write_u64(e.now.nanos());
        self.write_f64(e.viewport.width);
        self.write_f64(e.viewport.height);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.write_u8(TAG_PHASE_BEGIN);
        self.write_u64(e.frame_index);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.nanos());
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.write_u8(TAG_PHASE_END);
        self.write_u64(e.frame_index);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.nanos());
    }

    fn on_draw_decision(&mut self, e: &DrawDecisionEvent) {
        self.write_u8(TAG_DRAW_DECISION);
        self.write_u64(e.frame_index);
        self.write_u8(u8::from(e.should_draw));
        self.write_u32(e.reasons.bits());
    }

    fn on_render_list(&mut self, e: &RenderListEvent) {
        self.write_u8(TAG_RENDER_LIST);
        self.write_u64(e.frame_index);
        self.write_outcome(e.outcome);
        self.write_u32(e.entries);
    }

    fn on_draw_pass(&mut self, e: &DrawPassEvent) {
        self.write_u8(TAG_DRAW_PASS);
        self.write_u64(e.frame_index);
        self.write_u32(e.items);
        self.write_u32(e.cache_hits);
        self.write_u32(e.cache_misses);
        self.write_u32(e.cache_bypasses);
        self.write_damage(e.damage);
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.write_u8(TAG_FRAME_SUMMARY);
        self.write_u64(s.frame_index);
        self.write_u64(s.now.nanos());
        for nanos in s.phase_nanos {
            self.write_u64(nanos);
        }
        self.write_u8(u8::from(s.should_draw));
        self.write_u32(s.reasons.bits());
    }

    fn on_dirty_regions(&mut self, frame_index: u64, rects: &[Rect]) {
        self.write_u8(TAG_DIRTY_REGIONS_COUNT);
        self.write_u64(frame_index);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "region count capped at u32::MAX for recording"
        )]
        self.write_u32(rects.len().min(u32::MAX as usize) as u32);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`FrameBeginEvent`].
    FrameBegin(FrameBeginEvent),
    /// A [`PhaseBeginEvent`].
    PhaseBegin(PhaseBeginEvent),
    /// A [`PhaseEndEvent`].
    PhaseEnd(PhaseEndEvent),
    /// A [`DrawDecisionEvent`].
    DrawDecision(DrawDecisionEvent),
    /// A [`RenderListEvent`].
    RenderList(RenderListEvent),
    /// A [`DrawPassEvent`].
    DrawPass(DrawPassEvent),
    /// A [`FrameSummary`].
    FrameSummary(FrameSummary),
    /// Dirty region count for a frame.
    DirtyRegionsCount {
        /// Frame counter.
        frame_index: u64,
        /// Number of dirty regions.
        count: u32,
    },
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().ok()?);
        self.pos += 4;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_f64(&mut self) -> Option<f64> {
        self.read_u64().map(f64::from_bits)
    }

    fn read_phase(&mut self) -> Option<UiPhase> {
        UiPhase::ALL.get(usize::from(self.read_u8()?)).copied()
    }

    fn read_reasons(&mut self) -> Option<UiRedrawReason> {
        Some(UiRedrawReason::from_bits_truncate(self.read_u32()?))
    }

    fn read_outcome(&mut self) -> Option<SyncOutcome> {
        let kind = self.read_u8()?;
        let payload = self.read_u64()?;
        Some(match kind {
            0 => SyncOutcome::Synchronized {
                refreshed: usize::try_from(payload).ok()?,
            },
            _ => SyncOutcome::Rebuilt(match payload {
                0 => RebuildCause::NeverBuilt,
                1 => RebuildCause::RootChanged,
                2 => RebuildCause::TopologyChanged,
                3 => RebuildCause::StructureChanged,
                4 => RebuildCause::DanglingVisual,
                _ => RebuildCause::Disabled,
            }),
        })
    }

    fn read_damage(&mut self) -> Option<DamageKind> {
        Some(match self.read_u8()? {
            0 => DamageKind::None,
            1 => DamageKind::Regions,
            _ => DamageKind::Full,
        })
    }

    fn decode_frame_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameBegin(FrameBeginEvent {
            frame_index: self.read_u64()?,
            now: HostTime(self.read_u64()?),
            viewport: Size::new(self.read_f64()?, self.read_f64()?),
        }))
    }

    fn decode_phase_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseBegin(PhaseBeginEvent {
            frame_index: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: HostTime(self.read_u64()?),
        }))
    }

    fn decode_phase_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseEnd(PhaseEndEvent {
            frame_index: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: HostTime(self.read_u64()?),
        }))
    }

    fn decode_draw_decision(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::DrawDecision(DrawDecisionEvent {
            frame_index: self.read_u64()?,
            should_draw: self.read_u8()? != 0,
            reasons: self.read_reasons()?,
        }))
    }

    fn decode_render_list(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::RenderList(RenderListEvent {
            frame_index: self.read_u64()?,
            outcome: self.read_outcome()?,
            entries: self.read_u32()?,
        }))
    }

    fn decode_draw_pass(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::DrawPass(DrawPassEvent {
            frame_index: self.read_u64()?,
            items: self.read_u32()?,
            cache_hits: self.read_u32()?,
            cache_misses: self.read_u32()?,
            cache_bypasses: self.read_u32()?,
            damage: self.read_damage()?,
        }))
    }

    fn decode_frame_summary(&mut self) -> Option<RecordedEvent> {
        let frame_index = self.read_u64()?;
        let now = HostTime(self.read_u64()?);
        let mut phase_nanos = [0; 5];
        for slot in &mut phase_nanos {
            *slot = self.read_u64()?;
        }
        Some(RecordedEvent::FrameSummary(FrameSummary {
            frame_index,
            now,
            phase_nanos,
            should_draw: self.read_u8()? != 0,
            reasons: self.read_reasons()?,
        }))
    }

    fn decode_dirty_regions_count(&mut self) -> Option<RecordedEvent> {
        let frame_index = self.read_u64()?;
        let count = self.read_u32()?;
        Some(RecordedEvent::DirtyRegionsCount { frame_index, count })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_FRAME_BEGIN => self.decode_frame_begin(),
            TAG_PHASE_BEGIN => self.decode_phase_begin(),
            TAG_PHASE_END => self.decode_phase_end(),
            TAG_DRAW_DECISION => self.decode_draw_decision(),
            TAG_RENDER_LIST => self.decode_render_list(),
            TAG_DRAW_PASS => self.decode_draw_pass(),
            TAG_FRAME_SUMMARY => self.decode_frame_summary(),
            TAG_DIRTY_REGIONS_COUNT => self.decode_dirty_regions_count(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
