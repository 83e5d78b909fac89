// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visual tree data model.
//!
//! A *visual* is one element of the UI tree as seen by the scheduler. Each
//! visual has:
//!
//! - An identity ([`VisualId`]), a generational handle that becomes stale when
//!   the visual is destroyed.
//! - Topology: parent, first-child, and sibling links forming an ordered tree.
//!   Siblings are painted by ascending [`z_index`](VisualTree::z_index), ties
//!   in insertion order.
//! - Layout output: [`bounds`](VisualTree::bounds) in root space.
//! - Pixel state ([`RenderState`]) and cache traits ([`VisualTraits`]).
//! - [`InvalidationFlags`] plus monotonically increasing render and layout
//!   version stamps.
//!
//! # Invalidation
//!
//! [`invalidate_measure`](VisualTree::invalidate_measure),
//! [`invalidate_arrange`](VisualTree::invalidate_arrange), and
//! [`invalidate_render`](VisualTree::invalidate_render) set the visual's own
//! flag and `SUBTREE` on it and every ancestor. The ancestor walk stops at the
//! first ancestor already marked, so repeated invalidation is cheap and is
//! counted once.
//!
//! Built-in setters raise invalidations through the same
//! [`PropertyMetadata`] table that widgets use for their own properties.
//!
//! # Change journal
//!
//! Besides the flags, every invalidation is journaled in a
//! [`dirty`](crate::dirty) channel so the scheduler can ask which visuals
//! changed since it last looked
//! ([`drain_layout_requests`](VisualTree::drain_layout_requests),
//! [`drain_render_changes`](VisualTree::drain_render_changes),
//! [`drain_topology`](VisualTree::drain_topology)) without walking the tree.

mod id;
mod invalidate;
mod property;
mod state;
mod store;
mod traverse;

pub use id::{INVALID, VisualId};
pub use invalidate::LayoutRequests;
pub use property::PropertyMetadata;
pub use state::{InvalidationCounters, InvalidationFlags, RenderState, VisualTraits};
pub use store::VisualTree;
pub use traverse::Children;
