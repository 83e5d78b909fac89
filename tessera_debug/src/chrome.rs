// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Phases become duration slices; decisions, render list updates, and draw
//! passes become instant events stamped with the frame time of their update.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    // Instant events without their own timestamp use the latest frame time.
    let mut frame_ts = 0.0;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::FrameBegin(e) => {
                frame_ts = nanos_to_us(e.now.nanos());
                events.push(json!({
                    "ph": "i",
                    "name": "FrameBegin",
                    "cat": "Scheduler",
                    "ts": frame_ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "frame_index": e.frame_index,
                        "width": e.viewport.width,
                        "height": e.viewport.height,
                    }
                }));
            }
            RecordedEvent::PhaseBegin(e) => {
                events.push(json!({
                    "ph": "B",
                    "name": e.phase.name(),
                    "cat": "Phase",
                    "ts": nanos_to_us(e.timestamp.nanos()),
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "frame_index": e.frame_index,
                    }
                }));
            }
            RecordedEvent::PhaseEnd(e) => {
                events.push(json!({
                    "ph": "E",
                    "name": e.phase.name(),
                    "cat": "Phase",
                    "ts": nanos_to_us(e.timestamp.nanos()),
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "frame_index": e.frame_index,
                    }
                }));
            }
            RecordedEvent::DrawDecision(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": if e.should_draw { "Draw" } else { "Skip" },
                    "cat": "Scheduler",
                    "ts": frame_ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "reasons": format!("{:?}", e.reasons),
                    }
                }));
            }
            RecordedEvent::RenderList(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "RenderList",
                    "cat": "Draw",
                    "ts": frame_ts,
                    "pid": 0,
                    "tid": 1,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "outcome": format!("{:?}", e.outcome),
                        "entries": e.entries,
                    }
                }));
            }
            RecordedEvent::DrawPass(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "DrawPass",
                    "cat": "Draw",
                    "ts": frame_ts,
                    "pid": 0,
                    "tid": 1,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "items": e.items,
                        "cache_hits": e.cache_hits,
                        "cache_misses": e.cache_misses,
                        "cache_bypasses": e.cache_bypasses,
                        "damage": format!("{:?}", e.damage),
                    }
                }));
            }
            RecordedEvent::FrameSummary(s) => {
                events.push(json!({
                    "ph": "i",
                    "name": "FrameSummary",
                    "cat": "Summary",
                    "ts": nanos_to_us(s.now.nanos()),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "frame_index": s.frame_index,
                        "input_us": nanos_to_us(s.phase_nanos[0]),
                        "deferred_us": nanos_to_us(s.phase_nanos[1]),
                        "layout_us": nanos_to_us(s.phase_nanos[2]),
                        "animation_us": nanos_to_us(s.phase_nanos[3]),
                        "scheduling_us": nanos_to_us(s.phase_nanos[4]),
                        "should_draw": s.should_draw,
                        "reasons": format!("{:?}", s.reasons),
                    }
                }));
            }
            RecordedEvent::DirtyRegionsCount { frame_index, count } => {
                events.push(json!({
                    "ph": "i",
                    "name": "DirtyRegions",
                    "cat": "Rich",
                    "ts": frame_ts,
                    "pid": 0,
                    "tid": 1,
                    "s": "p",
                    "args": {
                        "frame_index": frame_index,
                        "count": count,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn nanos_to_us(nanos: u64) -> f64 {
    nanos as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use kurbo::Size;
    use tessera_core::scheduler::{UiPhase, UiRedrawReason};
    use tessera_core::time::HostTime;
    use tessera_core::trace::{
        DrawDecisionEvent, FrameBeginEvent, PhaseBeginEvent, PhaseEndEvent, TraceSink,
    };

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_frame_begin(&FrameBeginEvent {
            frame_index: 0,
            now: HostTime(1_000_000),
            viewport: Size::new(800.0, 600.0),
        });
        rec.on_phase_begin(&PhaseBeginEvent {
            frame_index: 0,
            phase: UiPhase::Layout,
            timestamp: HostTime(1_000_000),
        });
        rec.on_phase_end(&PhaseEndEvent {
            frame_index: 0,
            phase: UiPhase::Layout,
            timestamp: HostTime(1_000_100),
        });
        rec.on_draw_decision(&DrawDecisionEvent {
            frame_index: 0,
            should_draw: false,
            reasons: UiRedrawReason::NONE,
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 4);

        assert_eq!(parsed[0]["ph"], "i");
        assert_eq!(parsed[0]["name"], "FrameBegin");
        assert_eq!(parsed[0]["ts"], 1000.0);

        assert_eq!(parsed[1]["ph"], "B");
        assert_eq!(parsed[1]["name"], "Layout");

        assert_eq!(parsed[2]["ph"], "E");
        assert_eq!(parsed[2]["ts"], 1000.1);

        assert_eq!(parsed[3]["name"], "Skip");
        assert_eq!(parsed[3]["ts"], 1000.0, "instant uses the frame time");
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
