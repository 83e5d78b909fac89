// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-root frame scheduler.
//!
//! A [`UiRoot`] owns one visual tree and everything needed to schedule it:
//! dirty regions, the retained render list, render caches, and the
//! root-scoped services. Each call to [`UiRoot::update`] runs the phases of
//! [`UiPhase::ALL`] in order and ends with a draw decision justified by a
//! [`UiRedrawReason`] set. Each optimization layer can be switched off
//! through [`SchedulerConfig`].

mod config;
mod reason;
mod root;
mod state;

pub use config::SchedulerConfig;
pub use reason::UiRedrawReason;
pub use root::UiRoot;
pub use state::{UiMetrics, UiPhase};
