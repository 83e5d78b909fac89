// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Root-scoped deferred operation queue.
//!
//! Data binding and scheduled callbacks enqueue closures here. The scheduler
//! runs them once per frame, in FIFO order, in the `BindingAndDeferred`
//! phase, so their property changes are picked up by the same frame's layout.
//!
//! An operation always runs exactly once. Operations enqueued while the queue
//! is draining wait for the next frame.

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use core::fmt;

use crate::focus::FocusManager;
use crate::scheduler::UiRedrawReason;
use crate::visual::{VisualId, VisualTree};

/// A queued mutation.
pub type DeferredOperation = Box<dyn FnOnce(&mut DeferredContext<'_>)>;

/// What a deferred operation may touch while it runs.
pub struct DeferredContext<'a> {
    tree: &'a mut VisualTree,
    focus: &'a mut FocusManager,
    reasons: &'a mut UiRedrawReason,
    next: &'a mut VecDeque<DeferredOperation>,
}

impl fmt::Debug for DeferredContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredContext")
            .field("queued_for_next_frame", &self.next.len())
            .finish_non_exhaustive()
    }
}

impl DeferredContext<'_> {
    /// Returns the visual tree.
    #[must_use]
    pub fn tree(&self) -> &VisualTree {
        &*self.tree
    }

    /// Returns the visual tree for mutation.
    pub fn tree_mut(&mut self) -> &mut VisualTree {
        &mut *self.tree
    }

    /// Moves keyboard focus, raising `FOCUS_CHANGED` if it changed.
    pub fn set_focused(&mut self, target: Option<VisualId>) {
        if self.focus.set_focused(self.tree, target) {
            *self.reasons |= UiRedrawReason::FOCUS_CHANGED;
        }
    }

    /// Schedules another operation. It runs in the next frame.
    pub fn enqueue(&mut self, op: impl FnOnce(&mut DeferredContext<'_>) + 'static) {
        self.next.push_back(Box::new(op));
    }
}

/// FIFO queue of deferred operations.
#[derive(Default)]
pub struct Dispatcher {
    queue: VecDeque<DeferredOperation>,
    executed: u64,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("pending", &self.queue.len())
            .field("executed", &self.executed)
            .finish()
    }
}

impl Dispatcher {
    /// Creates an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an operation to the queue.
    pub fn enqueue(&mut self, op: impl FnOnce(&mut DeferredContext<'_>) + 'static) {
        self.queue.push_back(Box::new(op));
    }

    /// Returns the number of operations waiting to run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Returns how many operations have run since the last
    /// [`reset`](Self::reset).
    #[must_use]
    pub fn executed_count(&self) -> u64 {
        self.executed
    }

    /// Clears the executed counter. Queued operations are kept and still run.
    pub fn reset(&mut self) {
        self.executed = 0;
    }

    /// Runs every operation queued before this call, in FIFO order.
    ///
    /// Returns the number of operations run.
    pub fn run(
        &mut self,
        tree: &mut VisualTree,
        focus: &mut FocusManager,
        reasons: &mut UiRedrawReason,
    ) -> usize {
        let batch = core::mem::take(&mut self.queue);
        let count = batch.len();
        for op in batch {
            let mut ctx = DeferredContext {
                tree: &mut *tree,
                focus: &mut *focus,
                reasons: &mut *reasons,
                next: &mut self.queue,
            };
            op(&mut ctx);
            self.executed += 1;
        }
        count
    }
}
