// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change-journal channel constants.
//!
//! Invalidation flags on a [`VisualTree`](crate::visual::VisualTree) answer
//! "is this visual dirty right now". The scheduler additionally needs to
//! know *which* visuals changed since it last looked, without walking the
//! tree. That pull-based journal is kept in an [`understory_dirty`] tracker
//! with one channel per category of change.
//!
//! All channels are local-only: a mark names exactly the visual that changed.
//! Ancestor propagation is handled by the invalidation flags themselves, which
//! stop at the first ancestor that is already marked.
//!
//! # Consumption
//!
//! - [`MEASURE`] / [`ARRANGE`] are drained at the start of the layout phase
//!   and handed to the [`LayoutHost`](crate::layout::LayoutHost).
//! - [`RENDER`] is drained by the draw pass and used to resynchronize the
//!   retained render list in place.
//! - [`TOPOLOGY`] is drained by the draw pass; a non-empty drain means the
//!   render list must be rebuilt.

use understory_dirty::Channel;

/// The visual's desired size must be recomputed.
pub const MEASURE: Channel = Channel::new(0);

/// The visual's final position must be recomputed.
pub const ARRANGE: Channel = Channel::new(1);

/// The visual's pixels (or bounds) changed.
pub const RENDER: Channel = Channel::new(2);

/// Children were added or removed, or a z-index changed.
pub const TOPOLOGY: Channel = Channel::new(3);
