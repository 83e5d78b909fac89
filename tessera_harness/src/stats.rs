// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame efficiency statistics and grading.

use tessera_core::scheduler::UiRedrawReason;

use crate::FrameReport;

/// Letter grade for how reliably idle frames are skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EfficiencyGrade {
    /// Idle frames are (almost) always skipped.
    A,
    /// Most idle frames are skipped.
    B,
    /// About half of the idle frames are drawn anyway.
    C,
    /// Idle frames are mostly drawn.
    D,
}

impl EfficiencyGrade {
    /// Returns a short label for HUD rendering.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }

    fn for_idle_skip_ratio(ratio: f64) -> Self {
        if ratio >= 0.95 {
            Self::A
        } else if ratio >= 0.75 {
            Self::B
        } else if ratio >= 0.5 {
            Self::C
        } else {
            Self::D
        }
    }
}

/// Running draw/skip statistics over observed frames.
///
/// A frame is *idle* when none of its redraw reasons describes a change; a
/// frame drawn only because of `FIRST_FRAME`, `ALWAYS_DRAW`, or
/// `UNCONDITIONAL` is idle too.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    frames: u64,
    drawn: u64,
    idle_frames: u64,
    idle_skipped: u64,
    skip_streak: u64,
    longest_skip_streak: u64,
}

impl FrameStats {
    /// Creates empty statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one frame into the statistics.
    pub fn observe(&mut self, report: &FrameReport) {
        self.frames = self.frames.saturating_add(1);
        if report.drew {
            self.drawn = self.drawn.saturating_add(1);
            self.skip_streak = 0;
        } else {
            self.skip_streak = self.skip_streak.saturating_add(1);
            self.longest_skip_streak = self.longest_skip_streak.max(self.skip_streak);
        }
        if report.reasons.difference(UiRedrawReason::FORCED).is_empty() {
            self.idle_frames = self.idle_frames.saturating_add(1);
            if !report.drew {
                self.idle_skipped = self.idle_skipped.saturating_add(1);
            }
        }
    }

    /// Returns the number of observed frames.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Returns the number of drawn frames.
    #[must_use]
    pub fn drawn(&self) -> u64 {
        self.drawn
    }

    /// Returns the number of skipped frames.
    #[must_use]
    pub fn skipped(&self) -> u64 {
        self.frames - self.drawn
    }

    /// Returns the number of idle frames.
    #[must_use]
    pub fn idle_frames(&self) -> u64 {
        self.idle_frames
    }

    /// Returns the current run of consecutive skipped frames.
    #[must_use]
    pub fn skip_streak(&self) -> u64 {
        self.skip_streak
    }

    /// Returns the longest run of consecutive skipped frames.
    #[must_use]
    pub fn longest_skip_streak(&self) -> u64 {
        self.longest_skip_streak
    }

    /// Returns drawn frames over observed frames, or 0 before any frame.
    #[must_use]
    pub fn draw_ratio(&self) -> f64 {
        ratio(self.drawn, self.frames, 0.0)
    }

    /// Returns skipped idle frames over idle frames, or 1 when no frame was
    /// idle.
    #[must_use]
    pub fn idle_skip_ratio(&self) -> f64 {
        ratio(self.idle_skipped, self.idle_frames, 1.0)
    }

    /// Grades the idle skip ratio.
    #[must_use]
    pub fn grade(&self) -> EfficiencyGrade {
        EfficiencyGrade::for_idle_skip_ratio(self.idle_skip_ratio())
    }
}

fn ratio(part: u64, whole: u64, empty: f64) -> f64 {
    if whole == 0 {
        empty
    } else {
        part as f64 / whole as f64
    }
}
