// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-property invalidation metadata.

/// Which invalidations a property write raises.
///
/// Widgets register one of these per property and pass it to
/// [`VisualTree::notify_property_changed`](super::VisualTree::notify_property_changed)
/// after the value changes. The built-in setters on
/// [`VisualTree`](super::VisualTree) use the same table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PropertyMetadata {
    /// The property changes the visual's desired size.
    pub affects_measure: bool,
    /// The property changes the visual's placement within its parent.
    pub affects_arrange: bool,
    /// The property changes the visual's pixels.
    pub affects_render: bool,
}

impl PropertyMetadata {
    /// Property with no layout or render effect (e.g. a tag or a name).
    pub const NONE: Self = Self {
        affects_measure: false,
        affects_arrange: false,
        affects_render: false,
    };

    /// Render-only property (opacity, brush, render transform).
    pub const RENDER: Self = Self {
        affects_measure: false,
        affects_arrange: false,
        affects_render: true,
    };

    /// Placement-only property (alignment).
    pub const ARRANGE: Self = Self {
        affects_measure: false,
        affects_arrange: true,
        affects_render: false,
    };

    /// Size-affecting property (width, border thickness, font size).
    ///
    /// Raises measure, arrange, and render together.
    pub const LAYOUT: Self = Self {
        affects_measure: true,
        affects_arrange: true,
        affects_render: true,
    };

    /// Returns `true` if the property raises no invalidation at all.
    #[inline]
    #[must_use]
    pub const fn is_inert(self) -> bool {
        !self.affects_measure && !self.affects_arrange && !self.affects_render
    }
}
