// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-step headless frame driver.

use alloc::vec::Vec;

use tessera_core::draw::{Damage, DrawItem, Renderer};
use tessera_core::scheduler::{UiRedrawReason, UiRoot};
use tessera_core::time::{Duration, HostTime};
use tessera_core::viewport::Viewport;

use crate::FrameStats;

/// What happened in one driven frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    /// Zero-based index of the frame within the driver.
    pub frame_index: u64,
    /// Frame time.
    pub now: HostTime,
    /// Whether the frame was drawn.
    pub drew: bool,
    /// Redraw reasons aggregated by the update.
    pub reasons: UiRedrawReason,
    /// Draw items, empty when the frame was skipped.
    pub items: Vec<DrawItem>,
    /// Damage of the draw pass, [`Damage::None`] when skipped.
    pub damage: Damage,
}

/// Drives a [`UiRoot`] at a fixed frame step.
///
/// Each [`step`](Self::step) runs `update`, consults
/// `should_draw_this_frame`, draws if asked to, and advances the clock.
#[derive(Debug)]
pub struct FrameDriver {
    ui: UiRoot,
    viewport: Viewport,
    frame_step: Duration,
    now: HostTime,
    frame_index: u64,
    stats: FrameStats,
}

impl FrameDriver {
    /// Creates a driver starting at time zero.
    #[must_use]
    pub fn new(ui: UiRoot, viewport: Viewport, frame_step: Duration) -> Self {
        Self {
            ui,
            viewport,
            frame_step,
            now: HostTime::ZERO,
            frame_index: 0,
            stats: FrameStats::new(),
        }
    }

    /// Creates a driver stepping at roughly 60 frames per second.
    #[must_use]
    pub fn at_60hz(ui: UiRoot, viewport: Viewport) -> Self {
        Self::new(ui, viewport, Duration::from_micros(16_667))
    }

    /// Returns the driven root.
    #[must_use]
    pub fn ui(&self) -> &UiRoot {
        &self.ui
    }

    /// Returns the driven root for mutation between frames.
    pub fn ui_mut(&mut self) -> &mut UiRoot {
        &mut self.ui
    }

    /// Changes the viewport used from the next frame on.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Returns the time of the next frame.
    #[must_use]
    pub fn now(&self) -> HostTime {
        self.now
    }

    /// Returns the statistics accumulated so far.
    #[must_use]
    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Runs one frame without a renderer.
    pub fn step(&mut self) -> FrameReport {
        self.step_inner(None)
    }

    /// Runs one frame, handing the draw pass to `renderer` when it draws.
    pub fn step_with(&mut self, renderer: &mut dyn Renderer) -> FrameReport {
        self.step_inner(Some(renderer))
    }

    /// Runs `frames` frames and returns their reports.
    pub fn run(&mut self, frames: usize) -> Vec<FrameReport> {
        (0..frames).map(|_| self.step()).collect()
    }

    fn step_inner(&mut self, renderer: Option<&mut dyn Renderer>) -> FrameReport {
        let now = self.now;
        self.ui.update(now, self.viewport);
        let reasons = self.ui.last_should_draw_reasons();
        let drew = self.ui.should_draw_this_frame(now, self.viewport);
        let (items, damage) = if drew {
            let pass = self.ui.draw();
            if let Some(renderer) = renderer {
                renderer.render(self.ui.tree(), &pass);
            }
            (pass.items, pass.damage)
        } else {
            (Vec::new(), Damage::None)
        };

        let report = FrameReport {
            frame_index: self.frame_index,
            now,
            drew,
            reasons,
            items,
            damage,
        };
        self.stats.observe(&report);
        self.frame_index += 1;
        self.now = now + self.frame_step;
        report
    }
}
