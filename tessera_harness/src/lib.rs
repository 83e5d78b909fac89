// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Headless frame driving and frame efficiency grading.
//!
//! [`FrameDriver`] steps a [`UiRoot`](tessera_core::scheduler::UiRoot) at a
//! fixed frame interval the way a game loop would: update, ask whether to
//! draw, draw if so. Every frame yields a [`FrameReport`], and
//! [`FrameStats`] grades how well the scheduler skipped frames that had
//! nothing to show.
//!
//! [`ScriptedClock`] and [`ScriptedInput`] stand in for the animation and
//! input layers with deterministic, frame-indexed behavior.

#![no_std]

extern crate alloc;

mod clock;
mod driver;
mod input;
mod stats;

pub use clock::ScriptedClock;
pub use driver::{FrameDriver, FrameReport};
pub use input::{InputAction, ScriptedInput};
pub use stats::{EfficiencyGrade, FrameStats};
