// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Validated viewport geometry.
//!
//! The scheduler assumes finite, positive viewport dimensions. Window-resize
//! requests coming from the windowing adapter are checked here, at the
//! boundary, so the core never sees degenerate geometry.

use core::fmt;

use kurbo::{Rect, Size};

/// Errors from [`Viewport::new`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ViewportError {
    /// A dimension was NaN or infinite.
    NonFinite {
        /// Requested width.
        width: f64,
        /// Requested height.
        height: f64,
    },
    /// A dimension was zero or negative.
    NonPositive {
        /// Requested width.
        width: f64,
        /// Requested height.
        height: f64,
    },
}

impl fmt::Display for ViewportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFinite { width, height } => {
                write!(f, "viewport dimensions must be finite (got {width}x{height})")
            }
            Self::NonPositive { width, height } => {
                write!(f, "viewport dimensions must be positive (got {width}x{height})")
            }
        }
    }
}

impl core::error::Error for ViewportError {}

/// The drawable area of a UI root, anchored at the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    size: Size,
}

impl Viewport {
    /// Creates a viewport of the given size.
    ///
    /// # Errors
    ///
    /// Returns [`ViewportError::NonFinite`] if either dimension is NaN or
    /// infinite, and [`ViewportError::NonPositive`] if either is `<= 0`.
    pub fn new(width: f64, height: f64) -> Result<Self, ViewportError> {
        if !width.is_finite() || !height.is_finite() {
            return Err(ViewportError::NonFinite { width, height });
        }
        if width <= 0.0 || height <= 0.0 {
            return Err(ViewportError::NonPositive { width, height });
        }
        Ok(Self {
            size: Size::new(width, height),
        })
    }

    /// Returns the viewport size.
    #[inline]
    #[must_use]
    pub const fn size(self) -> Size {
        self.size
    }

    /// Returns the viewport as a rectangle at the origin.
    #[inline]
    #[must_use]
    pub fn rect(self) -> Rect {
        Rect::from_origin_size((0.0, 0.0), self.size)
    }
}
