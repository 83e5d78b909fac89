// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The UI root: phase state machine, draw decision, and draw pass.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Affine, Rect};

use super::state::{FrameState, UiMetrics, UiPhase};
use super::{SchedulerConfig, UiRedrawReason};
use crate::animation::AnimationManager;
use crate::cache::{
    CacheCandidate, CacheContext, DefaultCachePolicy, RenderCacheStore, RenderCachePolicy,
};
use crate::dispatcher::{DeferredContext, Dispatcher};
use crate::draw::{Damage, DrawItem, DrawMode, DrawPass};
use crate::focus::FocusManager;
use crate::input::{InputContext, InputSource, NoInput};
use crate::layout::{LayoutHost, LayoutRequest, NoLayout};
use crate::region::DirtyRegionTracker;
use crate::render_list::{RebuildCause, RetainedRenderList, SyncOutcome};
use crate::time::HostTime;
use crate::trace::{
    DrawDecisionEvent, DrawPassEvent, FrameBeginEvent, FrameSummaryBuilder, PhaseBeginEvent,
    PhaseEndEvent, RenderListEvent, Tracer,
};
use crate::viewport::Viewport;
use crate::visual::{INVALID, InvalidationFlags, VisualId, VisualTree};

/// One independently scheduled UI tree.
///
/// The game loop drives a root once per frame:
///
/// ```
/// use tessera_core::scheduler::{SchedulerConfig, UiRoot};
/// use tessera_core::time::HostTime;
/// use tessera_core::viewport::Viewport;
///
/// let mut ui = UiRoot::new(SchedulerConfig::optimized());
/// let viewport = Viewport::new(1280.0, 720.0).unwrap();
///
/// ui.update(HostTime(0), viewport);
/// assert!(ui.should_draw_this_frame(HostTime(0), viewport));
/// let pass = ui.draw();
/// assert_eq!(pass.items.len(), 1);
///
/// ui.update(HostTime(16_000_000), viewport);
/// assert!(!ui.should_draw_this_frame(HostTime(16_000_000), viewport));
/// ```
///
/// Roots share no state with each other.
pub struct UiRoot {
    tree: VisualTree,
    root: VisualId,
    config: SchedulerConfig,
    regions: DirtyRegionTracker,
    render_list: RetainedRenderList,
    cache_store: RenderCacheStore,
    cache_policy: Box<dyn RenderCachePolicy>,
    layout: Box<dyn LayoutHost>,
    input: Box<dyn InputSource>,
    animations: AnimationManager,
    focus: FocusManager,
    dispatcher: Dispatcher,
    state: FrameState,
    phase_clock: Option<fn() -> HostTime>,
    // -- Draw scratch, indexed by render list entry --
    visible: Vec<bool>,
    contexts: Vec<CacheContext>,
}

impl fmt::Debug for UiRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiRoot")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("visuals", &self.tree.len())
            .field("frame_count", &self.state.frame_count)
            .field("last_reasons", &self.state.last_reasons)
            .finish_non_exhaustive()
    }
}

impl UiRoot {
    /// Creates a root over a new tree containing only the root visual.
    #[must_use]
    pub fn new(config: SchedulerConfig) -> Self {
        let mut tree = VisualTree::new();
        let root = tree.create_visual();
        Self::from_tree(tree, root, config)
    }

    /// Creates a root over an existing tree.
    ///
    /// # Panics
    ///
    /// Panics if `root` is stale or has a parent.
    #[must_use]
    pub fn from_tree(tree: VisualTree, root: VisualId, config: SchedulerConfig) -> Self {
        tree.validate(root);
        assert!(tree.parent(root).is_none(), "root visual must not have a parent");
        Self {
            tree,
            root,
            config,
            regions: DirtyRegionTracker::new(config.max_dirty_regions),
            render_list: RetainedRenderList::new(),
            cache_store: RenderCacheStore::new(),
            cache_policy: Box::new(DefaultCachePolicy::new()),
            layout: Box::new(NoLayout),
            input: Box::new(NoInput),
            animations: AnimationManager::new(),
            focus: FocusManager::new(),
            dispatcher: Dispatcher::new(),
            state: FrameState::new(),
            phase_clock: None,
            visible: Vec::new(),
            contexts: Vec::new(),
        }
    }

    /// Replaces the layout host.
    #[must_use]
    pub fn with_layout_host(mut self, host: impl LayoutHost + 'static) -> Self {
        self.layout = Box::new(host);
        self
    }

    /// Replaces the input source.
    #[must_use]
    pub fn with_input_source(mut self, source: impl InputSource + 'static) -> Self {
        self.input = Box::new(source);
        self
    }

    /// Replaces the render cache policy.
    #[must_use]
    pub fn with_cache_policy(mut self, policy: impl RenderCachePolicy + 'static) -> Self {
        self.cache_policy = Box::new(policy);
        self
    }

    /// Sets the clock used to timestamp phase trace events.
    ///
    /// Without one, every phase is stamped with the frame time.
    #[must_use]
    pub fn with_phase_clock(mut self, clock: fn() -> HostTime) -> Self {
        self.phase_clock = Some(clock);
        self
    }

    // -- Accessors --

    /// Returns the visual tree.
    #[must_use]
    pub fn tree(&self) -> &VisualTree {
        &self.tree
    }

    /// Returns the visual tree for mutation.
    pub fn tree_mut(&mut self) -> &mut VisualTree {
        &mut self.tree
    }

    /// Returns the root visual.
    #[must_use]
    pub fn root(&self) -> VisualId {
        self.root
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Returns the configuration for mutation. Changes apply from the next
    /// update.
    pub fn config_mut(&mut self) -> &mut SchedulerConfig {
        &mut self.config
    }

    /// Returns the animation manager.
    #[must_use]
    pub fn animations(&self) -> &AnimationManager {
        &self.animations
    }

    /// Returns the animation manager for starting and stopping clocks.
    pub fn animations_mut(&mut self) -> &mut AnimationManager {
        &mut self.animations
    }

    /// Returns the focus manager.
    #[must_use]
    pub fn focus(&self) -> &FocusManager {
        &self.focus
    }

    /// Moves keyboard focus outside the input phase.
    ///
    /// The old and new targets get their render invalidated, and the next
    /// update reports [`FOCUS_CHANGED`](UiRedrawReason::FOCUS_CHANGED).
    /// Returns `true` if focus changed.
    pub fn set_focused(&mut self, target: Option<VisualId>) -> bool {
        let changed = self.focus.set_focused(&mut self.tree, target);
        if changed {
            self.state.external_reasons |= UiRedrawReason::FOCUS_CHANGED;
        }
        changed
    }

    /// Moves hover outside the input phase.
    ///
    /// The next update reports
    /// [`HOVER_CHANGED`](UiRedrawReason::HOVER_CHANGED). Returns `true` if
    /// hover changed.
    pub fn set_hovered(&mut self, target: Option<VisualId>) -> bool {
        let changed = self.focus.set_hovered(&mut self.tree, target);
        if changed {
            self.state.external_reasons |= UiRedrawReason::HOVER_CHANGED;
        }
        changed
    }

    /// Returns the deferred operation dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Returns the dirty region tracker.
    #[must_use]
    pub fn dirty_regions(&self) -> &DirtyRegionTracker {
        &self.regions
    }

    /// Returns the retained render list as of the latest draw.
    #[must_use]
    pub fn render_list(&self) -> &RetainedRenderList {
        &self.render_list
    }

    /// Returns the render cache snapshots.
    #[must_use]
    pub fn cache_store(&self) -> &RenderCacheStore {
        &self.cache_store
    }

    // -- External signals --

    /// Marks `rect` (viewport-local) as needing redraw, or the whole frame
    /// when `rect` is `None`.
    ///
    /// With dirty region rendering off, any rectangle escalates to a full
    /// frame.
    pub fn mark_visual_dirty(&mut self, rect: Option<Rect>) {
        match rect {
            Some(rect) if self.config.use_dirty_region_rendering => {
                self.regions.add_region(rect);
            }
            _ => self.regions.mark_full_frame(),
        }
    }

    /// Schedules `op` for the next `BindingAndDeferred` phase.
    ///
    /// Operations run exactly once, in the order they were enqueued.
    pub fn enqueue_deferred_operation(
        &mut self,
        op: impl FnOnce(&mut DeferredContext<'_>) + 'static,
    ) {
        self.dispatcher.enqueue(op);
    }

    // -- Frame update --

    /// Runs one frame update.
    ///
    /// # Panics
    ///
    /// Panics if the root visual was destroyed.
    pub fn update(&mut self, now: HostTime, viewport: Viewport) {
        self.update_traced(now, viewport, &mut Tracer::none());
    }

    /// Runs one frame update, reporting to `tracer`.
    ///
    /// # Panics
    ///
    /// Panics if the root visual was destroyed.
    pub fn update_traced(&mut self, now: HostTime, viewport: Viewport, tracer: &mut Tracer<'_>) {
        assert!(self.tree.is_alive(self.root), "root visual was destroyed");
        let frame_index = self.state.frame_count;
        let begin = FrameBeginEvent {
            frame_index,
            now,
            viewport: viewport.size(),
        };
        tracer.frame_begin(&begin);
        let mut summary = FrameSummaryBuilder::new(&begin);

        self.state.phase_log.clear();
        let mut reasons = core::mem::take(&mut self.state.external_reasons);
        for phase in UiPhase::ALL {
            let t = self.phase_time(now);
            self.state.enter(phase);
            summary.phase_begin(phase, t);
            tracer.phase_begin(&PhaseBeginEvent {
                frame_index,
                phase,
                timestamp: t,
            });

            match phase {
                UiPhase::InputAndEvents => self.run_input(now, &mut reasons),
                UiPhase::BindingAndDeferred => {
                    self.dispatcher
                        .run(&mut self.tree, &mut self.focus, &mut reasons);
                }
                UiPhase::Layout => self.run_layout(viewport, &mut reasons),
                UiPhase::Animation => {
                    if self.animations.tick(now, &mut self.tree) > 0 {
                        reasons |= UiRedrawReason::ANIMATION_ACTIVE;
                    }
                }
                UiPhase::RenderScheduling => self.schedule_render(&mut reasons),
            }

            let t = self.phase_time(now);
            summary.phase_end(phase, t);
            tracer.phase_end(&PhaseEndEvent {
                frame_index,
                phase,
                timestamp: t,
            });
        }
        self.state.current_phase = None;

        let should_draw = !reasons.is_empty();
        if !should_draw {
            self.state.draw_skipped += 1;
        }
        self.state.last_reasons = reasons;
        self.state.decision = Some((now, should_draw));
        self.state.frame_count += 1;

        tracer.draw_decision(&DrawDecisionEvent {
            frame_index,
            should_draw,
            reasons,
        });
        tracer.frame_summary(&summary.finish(should_draw, reasons));
    }

    /// Returns whether this frame must be drawn.
    ///
    /// Returns the decision of the latest [`update`](Self::update) if it ran
    /// for frame time `now` and nothing was drawn since. Otherwise runs an
    /// update with `now` and `viewport` first. Repeated calls within a frame
    /// share one update, so hosts driving frames only through this gate
    /// must advance `now` between frames.
    pub fn should_draw_this_frame(&mut self, now: HostTime, viewport: Viewport) -> bool {
        match self.state.decision {
            Some((at, should_draw)) if at == now => should_draw,
            _ => {
                self.update(now, viewport);
                !self.state.last_reasons.is_empty()
            }
        }
    }

    /// Returns the reasons aggregated by the latest update.
    #[must_use]
    pub fn last_should_draw_reasons(&self) -> UiRedrawReason {
        self.state.last_reasons
    }

    /// Returns the phases run by the latest update, in order.
    #[must_use]
    pub fn last_frame_phases(&self) -> &[UiPhase] {
        &self.state.phase_log
    }

    fn phase_time(&self, now: HostTime) -> HostTime {
        self.phase_clock.map_or(now, |clock| clock())
    }

    fn run_input(&mut self, now: HostTime, reasons: &mut UiRedrawReason) {
        *reasons |= self.focus.prune(&self.tree);
        let mut ctx = InputContext::new(
            now,
            &mut self.tree,
            &mut self.focus,
            &mut self.dispatcher,
            reasons,
        );
        self.input.dispatch(now, &mut ctx);
        if self
            .focus
            .advance_caret(now, self.config.caret_blink_interval, &mut self.tree)
        {
            *reasons |= UiRedrawReason::CARET_BLINK_ACTIVE;
        }
    }

    fn run_layout(&mut self, viewport: Viewport, reasons: &mut UiRedrawReason) {
        let viewport_changed = self.state.viewport != Some(viewport);
        if viewport_changed {
            if self.state.viewport.is_some() {
                *reasons |= UiRedrawReason::VIEWPORT_RESIZED;
            }
            self.state.viewport = Some(viewport);
            self.regions.set_viewport(viewport.rect());
            self.regions.mark_full_frame();
            self.tree.invalidate_measure(self.root);
        }

        let mut requests = self.tree.drain_layout_requests();
        requests.retain_subtree(&self.tree, self.root);
        if !viewport_changed && requests.is_empty() {
            self.state.layout_skipped += 1;
            return;
        }
        self.layout.layout(
            &mut self.tree,
            &LayoutRequest {
                viewport,
                root: self.root,
                viewport_changed,
                measure: &requests.measure,
                arrange: &requests.arrange,
            },
        );
        self.tree
            .clear_invalidation(self.root, InvalidationFlags::LAYOUT);
        self.state.layout_executed += 1;
    }

    fn schedule_render(&mut self, reasons: &mut UiRedrawReason) {
        self.collect_damage();

        if self.regions.is_full_frame() {
            *reasons |= UiRedrawReason::FULL_FRAME_DIRTY;
        } else if !self.regions.regions().is_empty() {
            *reasons |= UiRedrawReason::DIRTY_REGIONS;
        }
        if self
            .tree
            .flags(self.root)
            .intersects(InvalidationFlags::RENDER | InvalidationFlags::SUBTREE)
        {
            *reasons |= UiRedrawReason::RENDER_INVALIDATED;
        }
        if self.state.is_first_frame() {
            *reasons |= UiRedrawReason::FIRST_FRAME;
        }
        if self.config.always_draw_compatibility_mode {
            *reasons |= UiRedrawReason::ALWAYS_DRAW;
        }
        if !self.config.use_conditional_draw_scheduling {
            *reasons |= UiRedrawReason::UNCONDITIONAL;
        }
    }

    /// Moves the tree's pending damage into the region tracker.
    fn collect_damage(&mut self) {
        self.regions.set_max_regions(self.config.max_dirty_regions);
        let damage = self.tree.take_pending_damage();
        if self.config.use_dirty_region_rendering {
            for rect in damage {
                self.regions.add_region(rect);
            }
        } else if !damage.is_empty() || self.state.regions_enabled {
            self.regions.mark_full_frame();
        }
        self.state.regions_enabled = self.config.use_dirty_region_rendering;
    }

    // -- Draw --

    /// Produces the draw pass for the current state and clears render dirty
    /// state.
    ///
    /// # Panics
    ///
    /// Panics if the root visual was destroyed.
    pub fn draw(&mut self) -> DrawPass {
        self.draw_traced(&mut Tracer::none())
    }

    /// Produces the draw pass, reporting to `tracer`.
    ///
    /// # Panics
    ///
    /// Panics if the root visual was destroyed.
    pub fn draw_traced(&mut self, tracer: &mut Tracer<'_>) -> DrawPass {
        assert!(self.tree.is_alive(self.root), "root visual was destroyed");
        let frame_index = self.state.frame_count.saturating_sub(1);
        self.collect_damage();

        let outcome = self.sync_render_list();
        if outcome.is_rebuild() {
            self.cache_store.prune(&self.tree);
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "entry count is bounded by the u32 slot space"
        )]
        let entries = self.render_list.len() as u32;
        tracer.render_list(&RenderListEvent {
            frame_index,
            outcome,
            entries,
        });

        self.compute_contexts();
        let (items, cache_hits, cache_misses, cache_bypasses) = self.emit_items();
        self.state.cache_hits += u64::from(cache_hits);
        self.state.cache_misses += u64::from(cache_misses);
        self.state.cache_bypasses += u64::from(cache_bypasses);

        let damage = if self.regions.is_full_frame() {
            Damage::Full
        } else if self.regions.regions().is_empty() {
            Damage::None
        } else {
            Damage::Regions(self.regions.regions().to_vec())
        };
        #[cfg(feature = "trace-rich")]
        tracer.dirty_regions(frame_index, damage.rects());

        self.regions.reset();
        self.tree
            .clear_invalidation(self.root, InvalidationFlags::RENDER);
        self.state.decision = None;
        self.state.draw_executed += 1;

        let pass = DrawPass {
            frame_index,
            items,
            damage,
            render_list: outcome,
            cache_hits,
            cache_misses,
            cache_bypasses,
        };
        #[expect(
            clippy::cast_possible_truncation,
            reason = "item count is bounded by the u32 slot space"
        )]
        let item_count = pass.items.len() as u32;
        tracer.draw_pass(&DrawPassEvent {
            frame_index,
            items: item_count,
            cache_hits,
            cache_misses,
            cache_bypasses,
            damage: pass.damage.kind(),
        });
        pass
    }

    fn sync_render_list(&mut self) -> SyncOutcome {
        let changed = self.tree.drain_render_changes();
        let topology = self.tree.drain_topology();
        if !self.config.use_retained_render_list {
            self.render_list.rebuild(&self.tree, self.root);
            return SyncOutcome::Rebuilt(RebuildCause::Disabled);
        }
        if topology && self.render_list.root() == Some(self.root) {
            self.render_list.rebuild(&self.tree, self.root);
            return SyncOutcome::Rebuilt(RebuildCause::TopologyChanged);
        }
        self.render_list.synchronize(&self.tree, self.root, &changed)
    }

    /// Fills `visible` and `contexts` for every render list entry.
    fn compute_contexts(&mut self) {
        let entries = self.render_list.entries();
        let focused = self.focus.focused();
        self.visible.clear();
        self.contexts.clear();
        for e in entries {
            let i = e.visual.idx as usize;
            let render = &self.tree.render[i];
            let traits = self.tree.traits[i];
            let parent_visible =
                e.parent_entry == INVALID || self.visible[e.parent_entry as usize];
            let visible = parent_visible && render.visible && render.opacity > 0.0;
            self.visible.push(visible);
            self.contexts.push(CacheContext {
                effectively_visible: visible,
                focused: focused == Some(e.visual),
                focus_dependent_rendering: traits.focus_dependent_rendering,
                has_transform: render.transform != Affine::IDENTITY,
                has_clip: render.clip.is_some(),
                subtree_visual_count: 1,
                subtree_render_cost: traits.render_cost,
            });
        }
        // Children follow their parent, so a reverse walk sees every subtree
        // complete before folding it into the parent.
        for (i, e) in entries.iter().enumerate().rev() {
            if e.parent_entry == INVALID {
                continue;
            }
            let child = self.contexts[i];
            let parent = &mut self.contexts[e.parent_entry as usize];
            parent.subtree_visual_count = parent
                .subtree_visual_count
                .saturating_add(child.subtree_visual_count);
            parent.subtree_render_cost = parent
                .subtree_render_cost
                .saturating_add(child.subtree_render_cost);
            parent.has_transform |= child.has_transform;
            parent.has_clip |= child.has_clip;
        }
    }

    /// Walks the render list, consulting the cache policy per visual.
    fn emit_items(&mut self) -> (Vec<DrawItem>, u32, u32, u32) {
        let entries = self.render_list.entries();
        let mut items = Vec::with_capacity(entries.len());
        let (mut hits, mut misses, mut bypasses) = (0, 0, 0);
        let mut i = 0;
        while i < entries.len() {
            let e = &entries[i];
            if !self.visible[i] {
                i = e.subtree_end as usize;
                continue;
            }
            let candidate = CacheCandidate::from_tree(&self.tree, e.visual);
            let context = &self.contexts[i];
            let mode = if !self.cache_policy.can_cache(&candidate, context) {
                self.cache_store.remove(e.visual);
                bypasses += 1;
                DrawMode::Direct
            } else if let Some(snapshot) = self.cache_store.get(e.visual)
                && !self
                    .cache_policy
                    .should_rebuild_cache(&candidate, context, snapshot)
            {
                hits += 1;
                DrawMode::ReuseCache
            } else {
                if let Some(snapshot) = candidate.snapshot() {
                    self.cache_store.insert(e.visual, snapshot);
                }
                misses += 1;
                DrawMode::RebuildCache
            };
            items.push(DrawItem {
                visual: e.visual,
                bounds: e.bounds,
                z_index: e.effective_z_index,
                depth: e.depth,
                mode,
            });
            i = if mode == DrawMode::ReuseCache {
                e.subtree_end as usize
            } else {
                i + 1
            };
        }
        (items, hits, misses, bypasses)
    }

    // -- Metrics and lifecycle --

    /// Returns a snapshot of the scheduling counters.
    #[must_use]
    pub fn metrics(&self) -> UiMetrics {
        let counters = self.tree.counters();
        UiMetrics {
            frame_count: self.state.frame_count,
            layout_executed_frame_count: self.state.layout_executed,
            layout_skipped_frame_count: self.state.layout_skipped,
            draw_executed_frame_count: self.state.draw_executed,
            draw_skipped_frame_count: self.state.draw_skipped,
            full_redraw_fallback_count: self.regions.fallback_count(),
            cache_hit_count: self.state.cache_hits,
            cache_miss_count: self.state.cache_misses,
            cache_bypass_count: self.state.cache_bypasses,
            render_list_rebuild_count: self.render_list.rebuild_count(),
            render_list_sync_count: self.render_list.sync_count(),
            measure_invalidation_count: counters.measure,
            arrange_invalidation_count: counters.arrange,
            render_invalidation_count: counters.render,
            deferred_operation_count: self.dispatcher.executed_count(),
        }
    }

    /// Returns the root to its just-constructed scheduling state.
    ///
    /// The next update is treated as a first frame. The tree, services, and
    /// configuration are kept.
    pub fn reset_frame_state(&mut self) {
        self.state = FrameState::new();
        self.regions.reset();
        self.regions.reset_fallback_count();
        self.render_list.clear();
        self.cache_store.clear();
        self.tree.reset_counters();
    }

    /// Resets the animation, focus, and dispatcher services.
    pub fn reset_services(&mut self) {
        self.animations.reset();
        self.focus.reset();
        self.dispatcher.reset();
    }
}
