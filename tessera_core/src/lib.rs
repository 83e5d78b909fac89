// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Invalidation-driven frame scheduling for retained-mode game UI.
//!
//! `tessera_core` decides, once per frame, what must be re-measured,
//! re-arranged, and re-rendered, and whether the frame needs to be drawn at
//! all. It is `no_std` compatible (with `alloc`) and keeps the visual tree in
//! struct-of-arrays storage addressed by generational handles.
//!
//! # Architecture
//!
//! The game loop calls into a [`UiRoot`](scheduler::UiRoot) once per frame:
//!
//! ```text
//!   UiRoot::update(now, viewport)
//!       │
//!       ├─ InputAndEvents ──► InputSource, FocusManager (caret)
//!       ├─ BindingAndDeferred ──► Dispatcher (FIFO)
//!       ├─ Layout ──► LayoutHost (only when measure/arrange is pending)
//!       ├─ Animation ──► AnimationManager
//!       └─ RenderScheduling ──► DirtyRegionTracker ──► UiRedrawReason
//!                                                         │
//!   UiRoot::should_draw_this_frame() ◄────────────────────┘
//!       │ true
//!       ▼
//!   UiRoot::draw() ──► RetainedRenderList + RenderCachePolicy ──► DrawPass
//!                                                                   │
//!   Renderer::render(tree, pass) ◄──────────────────────────────────┘
//! ```
//!
//! **[`visual`]** — Struct-of-arrays visual tree with invalidation flags,
//! version stamps, and per-property invalidation metadata.
//!
//! **[`dirty`]** — Pull-based change journal channels via `understory_dirty`.
//!
//! **[`region`]** — Dirty region tracker with merge and full-frame fallback.
//!
//! **[`render_list`]** — Z-ordered flattening of the visual tree with
//! incremental resynchronization.
//!
//! **[`cache`]** — Render cache admissibility policy and snapshot store.
//!
//! **[`scheduler`]** — The per-root phase state machine, redraw reasons,
//! configuration, and metrics.
//!
//! **[`draw`]** — Draw pass output and the [`Renderer`](draw::Renderer)
//! contract.
//!
//! **[`layout`]**, **[`input`]**, **[`animation`]**, **[`focus`]**,
//! **[`dispatcher`]** — Collaborator contracts and root-scoped services.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types for
//! frame instrumentation, with a zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates the per-frame
//!   dirty region event.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod animation;
pub mod cache;
pub mod dirty;
pub mod dispatcher;
pub mod draw;
pub mod focus;
pub mod input;
pub mod layout;
pub mod region;
pub mod render_list;
pub mod scheduler;
pub mod time;
pub mod trace;
pub mod viewport;
pub mod visual;
