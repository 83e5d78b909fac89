// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visual identity.

use core::fmt;

/// Sentinel value indicating "no visual" in index fields.
pub const INVALID: u32 = u32::MAX;

/// A handle to a visual in a [`VisualTree`](super::VisualTree).
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after a visual is destroyed and its slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisualId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl VisualId {
    /// Returns the raw slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for VisualId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VisualId({}@gen{})", self.idx, self.generation)
    }
}
