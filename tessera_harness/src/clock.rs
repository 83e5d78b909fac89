// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A deterministic animation clock.

use tessera_core::animation::{AnimationClock, ClockState};
use tessera_core::time::{Duration, HostTime};
use tessera_core::visual::{VisualId, VisualTree};

/// Animates a visual's opacity linearly over a fixed duration.
///
/// The clock starts on its first tick and finishes on the first tick at or
/// after `duration`, writing `to` exactly.
#[derive(Clone, Copy, Debug)]
pub struct ScriptedClock {
    target: VisualId,
    from: f32,
    to: f32,
    duration: Duration,
    start: Option<HostTime>,
}

impl ScriptedClock {
    /// Creates a clock fading `target` from `from` to `to` over `duration`.
    #[must_use]
    pub fn opacity(target: VisualId, from: f32, to: f32, duration: Duration) -> Self {
        Self {
            target,
            from,
            to,
            duration,
            start: None,
        }
    }

    /// Returns the animated visual.
    #[must_use]
    pub fn target(&self) -> VisualId {
        self.target
    }
}

impl AnimationClock for ScriptedClock {
    fn tick(&mut self, now: HostTime, tree: &mut VisualTree) -> ClockState {
        let start = *self.start.get_or_insert(now);
        let elapsed = now.saturating_duration_since(start);
        if !tree.is_alive(self.target) {
            return ClockState::Finished;
        }
        if elapsed >= self.duration {
            tree.set_opacity(self.target, self.to);
            return ClockState::Finished;
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "opacity progress only needs f32 precision"
        )]
        let t = (elapsed.nanos() as f64 / self.duration.nanos() as f64) as f32;
        tree.set_opacity(self.target, self.from + (self.to - self.from) * t);
        ClockState::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fades_linearly_then_finishes() {
        let mut tree = VisualTree::new();
        let v = tree.create_visual();
        let mut clock = ScriptedClock::opacity(v, 0.0, 1.0, Duration::from_millis(100));

        assert_eq!(clock.tick(HostTime(0), &mut tree), ClockState::Running);
        assert_eq!(tree.render_state(v).opacity, 0.0);

        let half = HostTime(0) + Duration::from_millis(50);
        assert_eq!(clock.tick(half, &mut tree), ClockState::Running);
        assert!((tree.render_state(v).opacity - 0.5).abs() < 1e-6);

        let end = HostTime(0) + Duration::from_millis(120);
        assert_eq!(clock.tick(end, &mut tree), ClockState::Finished);
        assert_eq!(tree.render_state(v).opacity, 1.0);
    }

    #[test]
    fn destroyed_target_finishes() {
        let mut tree = VisualTree::new();
        let v = tree.create_visual();
        tree.destroy_subtree(v);
        let mut clock = ScriptedClock::opacity(v, 0.0, 1.0, Duration::from_millis(100));
        assert_eq!(clock.tick(HostTime(0), &mut tree), ClockState::Finished);
    }
}
