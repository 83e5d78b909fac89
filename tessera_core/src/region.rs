// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty region tracking with merge and full-frame escalation.
//!
//! [`DirtyRegionTracker`] accumulates the viewport areas that must be redrawn.
//! Each added rectangle is clipped to the viewport and merged with every
//! region it overlaps or shares an edge with, repeatedly, until no region can
//! be merged with the result. Merging takes the bounding rectangle, so the
//! tracked area is always a superset of what was invalidated.
//!
//! When merging leaves more than [`max_regions`](DirtyRegionTracker::max_regions)
//! regions, the tracker drops them all and reports the whole frame as dirty.
//! Full-frame state sticks until [`reset`](DirtyRegionTracker::reset), which
//! the scheduler calls after each completed draw.

use alloc::vec::Vec;

use kurbo::Rect;

/// Returns `true` if `r` has a strictly positive width and height.
pub(crate) fn has_area(r: &Rect) -> bool {
    r.width() > 0.0 && r.height() > 0.0
}

/// Returns `true` if two normalized rectangles overlap or share an edge.
///
/// Rectangles that meet only at a corner are not mergeable.
fn mergeable(a: &Rect, b: &Rect) -> bool {
    let touch_x = a.x0 <= b.x1 && b.x0 <= a.x1;
    let touch_y = a.y0 <= b.y1 && b.y0 <= a.y1;
    let overlap_x = a.x0 < b.x1 && b.x0 < a.x1;
    let overlap_y = a.y0 < b.y1 && b.y0 < a.y1;
    touch_x && touch_y && (overlap_x || overlap_y)
}

/// Accumulates dirty rectangles within a viewport.
#[derive(Clone, Debug)]
pub struct DirtyRegionTracker {
    viewport: Option<Rect>,
    regions: Vec<Rect>,
    full_frame: bool,
    max_regions: usize,
    fallback_count: u64,
}

impl DirtyRegionTracker {
    /// Creates an empty tracker that escalates past `max_regions` regions.
    ///
    /// No viewport is set, so rectangles are not clipped until
    /// [`set_viewport`](Self::set_viewport) is called.
    #[must_use]
    pub fn new(max_regions: usize) -> Self {
        Self {
            viewport: None,
            regions: Vec::new(),
            full_frame: false,
            max_regions,
            fallback_count: 0,
        }
    }

    /// Sets the clipping viewport and re-clips the current regions.
    pub fn set_viewport(&mut self, viewport: Rect) {
        let viewport = viewport.abs();
        self.viewport = Some(viewport);
        self.regions.retain_mut(|r| {
            *r = r.intersect(viewport);
            has_area(r)
        });
    }

    /// Returns the clipping viewport, if set.
    #[must_use]
    pub fn viewport(&self) -> Option<Rect> {
        self.viewport
    }

    /// Changes the region budget. Escalates immediately if the current
    /// regions no longer fit.
    pub fn set_max_regions(&mut self, max_regions: usize) {
        self.max_regions = max_regions;
        self.escalate_if_over_budget();
    }

    /// Returns the region budget.
    #[must_use]
    pub fn max_regions(&self) -> usize {
        self.max_regions
    }

    /// Adds a dirty rectangle.
    ///
    /// The rectangle is normalized and clipped to the viewport; zero-area
    /// results are ignored, as is everything while the frame is already
    /// fully dirty.
    pub fn add_region(&mut self, rect: Rect) {
        if self.full_frame {
            return;
        }
        let mut merged = rect.abs();
        if let Some(viewport) = self.viewport {
            merged = merged.intersect(viewport);
        }
        if !has_area(&merged) {
            return;
        }

        loop {
            let before = self.regions.len();
            self.regions.retain(|r| {
                if mergeable(r, &merged) {
                    merged = merged.union(*r);
                    false
                } else {
                    true
                }
            });
            if self.regions.len() == before {
                break;
            }
        }
        self.regions.push(merged);
        self.escalate_if_over_budget();
    }

    /// Marks the whole frame dirty. Does not count as a fallback.
    pub fn mark_full_frame(&mut self) {
        self.full_frame = true;
        self.regions.clear();
    }

    /// Returns whether the whole frame is dirty.
    #[must_use]
    pub fn is_full_frame(&self) -> bool {
        self.full_frame
    }

    /// Returns the current regions, in the order they were last merged.
    ///
    /// Empty while the frame is fully dirty.
    #[must_use]
    pub fn regions(&self) -> &[Rect] {
        &self.regions
    }

    /// Returns `true` if nothing needs to be redrawn.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !self.full_frame && self.regions.is_empty()
    }

    /// Returns the bounding rectangle of everything dirty.
    ///
    /// For a full-frame tracker this is the viewport (or `None` if no
    /// viewport is set).
    #[must_use]
    pub fn union_rect(&self) -> Option<Rect> {
        if self.full_frame {
            return self.viewport;
        }
        self.regions.iter().copied().reduce(|a, b| a.union(b))
    }

    /// Clears all regions and the full-frame flag.
    pub fn reset(&mut self) {
        self.regions.clear();
        self.full_frame = false;
    }

    /// Returns how many times the region budget forced a full-frame redraw.
    #[must_use]
    pub fn fallback_count(&self) -> u64 {
        self.fallback_count
    }

    /// Zeroes the fallback counter.
    pub fn reset_fallback_count(&mut self) {
        self.fallback_count = 0;
    }

    fn escalate_if_over_budget(&mut self) {
        if self.regions.len() > self.max_regions {
            self.regions.clear();
            self.full_frame = true;
            self.fallback_count += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Rect {
        Rect::from_origin_size((x, y), (w, h))
    }

    fn tracker() -> DirtyRegionTracker {
        let mut t = DirtyRegionTracker::new(8);
        t.set_viewport(rect(0.0, 0.0, 800.0, 600.0));
        t
    }

    #[test]
    fn overflow_escalates_to_full_frame() {
        let mut t = DirtyRegionTracker::new(2);
        t.set_viewport(rect(0.0, 0.0, 800.0, 600.0));
        t.add_region(rect(0.0, 0.0, 10.0, 10.0));
        t.add_region(rect(30.0, 0.0, 10.0, 10.0));
        assert!(!t.is_full_frame());
        assert_eq!(t.regions().len(), 2);
        t.add_region(rect(60.0, 0.0, 10.0, 10.0));
        assert!(t.is_full_frame());
        assert_eq!(t.fallback_count(), 1);
        assert!(t.regions().is_empty());
    }

    #[test]
    fn touching_edges_merge() {
        let mut t = tracker();
        t.add_region(rect(10.0, 10.0, 20.0, 20.0));
        t.add_region(rect(30.0, 10.0, 20.0, 20.0));
        assert_eq!(t.regions(), &[rect(10.0, 10.0, 40.0, 20.0)]);
    }

    #[test]
    fn corner_contact_does_not_merge() {
        let mut t = tracker();
        t.add_region(rect(0.0, 0.0, 10.0, 10.0));
        t.add_region(rect(10.0, 10.0, 10.0, 10.0));
        assert_eq!(t.regions().len(), 2);
    }

    #[test]
    fn merge_reaches_fixed_point() {
        let mut t = tracker();
        t.add_region(rect(25.0, 20.0, 5.0, 10.0));
        t.add_region(rect(20.0, 0.0, 25.0, 10.0));
        assert_eq!(t.regions().len(), 2);

        // Overlaps only the second region; that union then shares an edge
        // with the first.
        t.add_region(rect(40.0, 5.0, 15.0, 15.0));
        assert_eq!(t.regions(), &[rect(20.0, 0.0, 35.0, 30.0)]);
    }

    #[test]
    fn l_shaped_pair_merges_to_bounding_box() {
        let mut t = tracker();
        t.add_region(rect(0.0, 0.0, 100.0, 10.0));
        t.add_region(rect(0.0, 10.0, 10.0, 100.0));
        assert_eq!(t.regions(), &[rect(0.0, 0.0, 100.0, 110.0)]);
    }

    #[test]
    fn regions_are_clipped_to_viewport() {
        let mut t = DirtyRegionTracker::new(8);
        t.set_viewport(rect(0.0, 0.0, 100.0, 100.0));
        t.add_region(rect(90.0, 90.0, 50.0, 50.0));
        assert_eq!(t.regions(), &[rect(90.0, 90.0, 10.0, 10.0)]);

        t.add_region(rect(200.0, 200.0, 10.0, 10.0));
        assert_eq!(t.regions().len(), 1, "outside the viewport is ignored");
    }

    #[test]
    fn zero_area_is_a_no_op() {
        let mut t = tracker();
        t.add_region(rect(10.0, 10.0, 0.0, 20.0));
        t.add_region(rect(10.0, 10.0, 20.0, 0.0));
        assert!(t.is_clean());
    }

    #[test]
    fn negative_extent_is_normalized() {
        let mut t = tracker();
        t.add_region(Rect::new(30.0, 30.0, 10.0, 10.0));
        assert_eq!(t.regions(), &[Rect::new(10.0, 10.0, 30.0, 30.0)]);
    }

    #[test]
    fn full_frame_ignores_new_regions_until_reset() {
        let mut t = tracker();
        t.mark_full_frame();
        assert_eq!(t.fallback_count(), 0, "explicit full frame is not a fallback");
        t.add_region(rect(0.0, 0.0, 10.0, 10.0));
        assert!(t.regions().is_empty());
        assert_eq!(t.union_rect(), Some(rect(0.0, 0.0, 800.0, 600.0)));

        t.reset();
        assert!(t.is_clean());
        t.add_region(rect(0.0, 0.0, 10.0, 10.0));
        assert_eq!(t.regions().len(), 1);
    }

    #[test]
    fn viewport_change_reclips_existing_regions() {
        let mut t = tracker();
        t.add_region(rect(50.0, 50.0, 100.0, 100.0));
        t.add_region(rect(500.0, 500.0, 10.0, 10.0));
        t.set_viewport(rect(0.0, 0.0, 100.0, 100.0));
        assert_eq!(t.regions(), &[rect(50.0, 50.0, 50.0, 50.0)]);
    }

    #[test]
    fn shrinking_budget_escalates() {
        let mut t = tracker();
        t.add_region(rect(0.0, 0.0, 10.0, 10.0));
        t.add_region(rect(50.0, 0.0, 10.0, 10.0));
        t.set_max_regions(1);
        assert!(t.is_full_frame());
        assert_eq!(t.fallback_count(), 1);
    }

    #[test]
    fn union_rect_bounds_all_regions() {
        let mut t = tracker();
        assert_eq!(t.union_rect(), None);
        t.add_region(rect(0.0, 0.0, 10.0, 10.0));
        t.add_region(rect(50.0, 50.0, 10.0, 10.0));
        assert_eq!(t.union_rect(), Some(rect(0.0, 0.0, 60.0, 60.0)));
    }
}
