// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame-indexed scripted input.

use alloc::vec::Vec;

use tessera_core::input::{InputContext, InputSource};
use tessera_core::time::HostTime;
use tessera_core::visual::VisualId;

/// One scripted input effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputAction {
    /// Move the pointer over a visual, or off every visual.
    Hover(Option<VisualId>),
    /// Move keyboard focus.
    Focus(Option<VisualId>),
    /// Invalidate a visual's render, as a widget reacting to input would.
    Invalidate(VisualId),
}

/// Replays input actions on given frames.
///
/// Frames are counted per [`dispatch`](InputSource::dispatch) call starting
/// at 0, which matches the update count of the root the source is attached
/// to.
#[derive(Clone, Debug, Default)]
pub struct ScriptedInput {
    /// `(frame, action)`, sorted by frame, stable within a frame.
    script: Vec<(u64, InputAction)>,
    cursor: usize,
    frame: u64,
}

impl ScriptedInput {
    /// Creates an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `action` for `frame`.
    #[must_use]
    pub fn at(mut self, frame: u64, action: InputAction) -> Self {
        let pos = self.script.partition_point(|&(f, _)| f <= frame);
        self.script.insert(pos, (frame, action));
        self
    }

    /// Returns the number of actions not yet replayed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script.len() - self.cursor
    }
}

impl InputSource for ScriptedInput {
    fn dispatch(&mut self, now: HostTime, ctx: &mut InputContext<'_>) {
        _ = now;
        while let Some(&(frame, action)) = self.script.get(self.cursor) {
            if frame > self.frame {
                break;
            }
            self.cursor += 1;
            match action {
                InputAction::Hover(target) => ctx.set_hovered(target),
                InputAction::Focus(target) => ctx.set_focused(target),
                InputAction::Invalidate(target) => {
                    if ctx.tree().is_alive(target) {
                        ctx.tree_mut().invalidate_render(target);
                    }
                }
            }
        }
        self.frame += 1;
    }
}
