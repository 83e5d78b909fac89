// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Root-scoped animation clocks.
//!
//! The animation system owns its own timelines; the scheduler only needs to
//! advance them once per frame and know whether any is still running. Each
//! [`AnimationClock`] writes its animated values straight into the
//! [`VisualTree`], which raises the usual invalidations.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::time::HostTime;
use crate::visual::VisualTree;

/// Whether a clock wants further ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClockState {
    /// The clock wrote a value and will tick again next frame.
    Running,
    /// The clock wrote its final value and can be dropped.
    Finished,
}

/// A running animation.
pub trait AnimationClock {
    /// Advances the animation to `now`, writing animated values into `tree`.
    fn tick(&mut self, now: HostTime, tree: &mut VisualTree) -> ClockState;
}

/// Handle to a clock registered with an [`AnimationManager`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClockId(pub u64);

struct ClockEntry {
    id: ClockId,
    clock: Box<dyn AnimationClock>,
}

/// The set of clocks running under one UI root.
#[derive(Default)]
pub struct AnimationManager {
    clocks: Vec<ClockEntry>,
    next_id: u64,
}

impl fmt::Debug for AnimationManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<ClockId> = self.clocks.iter().map(|e| e.id).collect();
        f.debug_struct("AnimationManager")
            .field("clocks", &ids)
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl AnimationManager {
    /// Creates a manager with no clocks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a clock. It first ticks in the next animation phase.
    pub fn start(&mut self, clock: impl AnimationClock + 'static) -> ClockId {
        let id = ClockId(self.next_id);
        self.next_id += 1;
        self.clocks.push(ClockEntry {
            id,
            clock: Box::new(clock),
        });
        id
    }

    /// Removes a clock without a final tick. Returns `false` if it was not
    /// running.
    pub fn stop(&mut self, id: ClockId) -> bool {
        let before = self.clocks.len();
        self.clocks.retain(|e| e.id != id);
        self.clocks.len() != before
    }

    /// Returns whether the clock is still registered.
    #[must_use]
    pub fn is_active(&self, id: ClockId) -> bool {
        self.clocks.iter().any(|e| e.id == id)
    }

    /// Returns the number of registered clocks.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.clocks.len()
    }

    /// Ticks every clock in registration order and drops the ones that
    /// finished.
    ///
    /// Returns the number of clocks ticked, including those that finished on
    /// this tick.
    pub fn tick(&mut self, now: HostTime, tree: &mut VisualTree) -> usize {
        let ticked = self.clocks.len();
        self.clocks
            .retain_mut(|e| e.clock.tick(now, tree) == ClockState::Running);
        ticked
    }

    /// Drops every clock. Ids are not reused.
    pub fn reset(&mut self) {
        self.clocks.clear();
    }
}
